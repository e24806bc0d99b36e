// src/handlers/inventory.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::validate_not_negative,
    middleware::auth::AuthSession,
    models::inventory::{LedgerQuery, StockEntryCause},
    services::{ScopeService, inventory_service::ProductRef},
};

// ---
// Payload: Ajuste Manual de Estoque
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockPayload {
    /// Id do produto OU código de barras; pelo menos um dos dois.
    pub product_id: Option<Uuid>,
    pub barcode: Option<String>,

    /// Sem loja informada, vale a loja padrão do tenant.
    pub store_id: Option<Uuid>,

    /// "IN", "OUT" ou "ADJUST".
    #[validate(length(min = 1, message = "O campo 'kind' é obrigatório."))]
    #[schema(example = "ADJUST")]
    pub kind: String,

    #[schema(example = "95.0")]
    pub quantity: Decimal,

    /// Padrão: RECONCILIATION para ADJUST, MANUAL para o resto.
    pub cause: Option<StockEntryCause>,

    /// Só tem significado em entradas (IN).
    #[validate(custom(function = "validate_not_negative"))]
    pub unit_cost: Option<Decimal>,

    pub reference_id: Option<Uuid>,
}

impl AdjustStockPayload {
    fn product_ref(&self) -> Result<ProductRef, ValidationError> {
        match (self.product_id, &self.barcode) {
            (Some(id), _) => Ok(ProductRef::Id(id)),
            (None, Some(code)) if !code.is_empty() => Ok(ProductRef::Barcode(code.clone())),
            _ => Err(ValidationError::new("ProductRefRequired")),
        }
    }
}

// ---
// Handler: adjust_stock
// ---
#[utoipa::path(
    post,
    path = "/api/inventory/adjust",
    tag = "Inventory",
    request_body = AdjustStockPayload,
    responses(
        (status = 201, description = "Movimento registrado no razão", body = crate::models::inventory::StockLedgerEntry),
        (status = 404, description = "Produto não encontrado"),
        (status = 422, description = "Pré-condição violada (saldo, quantidade)")
    ),
    security(("api_jwt" = []))
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    session: AuthSession,
    Json(payload): Json<AdjustStockPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let product_ref = payload.product_ref().map_err(|e| {
        let mut errors = validator::ValidationErrors::new();
        errors.add("productId", e);
        AppError::ValidationError(errors)
    })?;

    let tenant_id = ScopeService::resolve_tenant(&session.identity, session.grant.as_ref())?;
    let store = app_state
        .scope_service
        .resolve_store(tenant_id, payload.store_id)
        .await?
        .ok_or(AppError::StoreRequired)?;

    let entry = app_state
        .inventory_service
        .adjust(
            tenant_id,
            &product_ref,
            &store,
            &payload.kind,
            payload.quantity,
            payload.cause,
            payload.unit_cost,
            payload.reference_id,
            session.identity.user_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

// ---
// Handler: list_levels
// ---
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct LevelsQuery {
    pub store_id: Option<Uuid>,
}

#[utoipa::path(
    get,
    path = "/api/inventory/levels",
    tag = "Inventory",
    params(LevelsQuery),
    responses(
        (status = 200, description = "Saldos do tenant efetivo", body = [crate::models::inventory::StockLevel])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_levels(
    State(app_state): State<AppState>,
    session: AuthSession,
    Query(query): Query<LevelsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let tenant_id = ScopeService::resolve_tenant(&session.identity, session.grant.as_ref())?;

    // Loja informada precisa pertencer ao tenant; sem loja, lista todas.
    let store = match query.store_id {
        Some(id) => app_state.scope_service.resolve_store(tenant_id, Some(id)).await?,
        None => None,
    };

    let levels = app_state
        .inventory_service
        .list_levels(tenant_id, store.map(|s| s.id))
        .await?;
    Ok(Json(levels))
}

// ---
// Handler: ledger_history
// ---
#[utoipa::path(
    get,
    path = "/api/inventory/ledger",
    tag = "Inventory",
    params(LedgerQuery),
    responses(
        (status = 200, description = "Histórico de movimentações, mais recente primeiro", body = [crate::models::inventory::StockLedgerEntry])
    ),
    security(("api_jwt" = []))
)]
pub async fn ledger_history(
    State(app_state): State<AppState>,
    session: AuthSession,
    Query(query): Query<LedgerQuery>,
) -> Result<impl IntoResponse, AppError> {
    let tenant_id = ScopeService::resolve_tenant(&session.identity, session.grant.as_ref())?;
    let entries = app_state
        .inventory_service
        .ledger_history(tenant_id, &query)
        .await?;
    Ok(Json(entries))
}

// ---
// Handler: cost_history
// ---
#[utoipa::path(
    get,
    path = "/api/inventory/products/{product_id}/cost-history",
    tag = "Inventory",
    params(
        ("product_id" = Uuid, Path, description = "ID do produto")
    ),
    responses(
        (status = 200, description = "Trilha de mudanças de cost_basis", body = [crate::models::inventory::CostBasisEntry]),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn cost_history(
    State(app_state): State<AppState>,
    session: AuthSession,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tenant_id = ScopeService::resolve_tenant(&session.identity, session.grant.as_ref())?;
    let entries = app_state
        .inventory_service
        .cost_history(tenant_id, product_id)
        .await?;
    Ok(Json(entries))
}
