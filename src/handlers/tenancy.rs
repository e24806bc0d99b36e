// src/handlers/tenancy.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    common::error::AppError, config::AppState, middleware::auth::AuthSession,
    models::tenancy::Store, services::ScopeService,
};

#[utoipa::path(
    get,
    path = "/api/stores",
    tag = "Tenancy",
    responses(
        (status = 200, description = "Lojas do tenant efetivo", body = [Store])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_stores(
    State(app_state): State<AppState>,
    session: AuthSession,
) -> Result<impl IntoResponse, AppError> {
    let tenant_id = ScopeService::resolve_tenant(&session.identity, session.grant.as_ref())?;
    let stores = app_state.tenant_repo.list_stores(tenant_id).await?;
    Ok(Json(stores))
}
