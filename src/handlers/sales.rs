// src/handlers/sales.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::validate_not_negative,
    middleware::auth::AuthSession,
    models::operations::SaleDetail,
    services::{ScopeService, sales_service::SaleLine},
};

// ---
// Payload: Checkout
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItemPayload {
    pub product_id: Uuid,
    #[schema(example = "12.0")]
    pub quantity: Decimal,
    /// Sem preço informado, vale o selling_price atual do produto.
    #[validate(custom(function = "validate_not_negative"))]
    pub unit_price: Option<Decimal>,
    // Desconto negativo inflaria o total da linha.
    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub discount: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    /// Sem loja informada, vale a loja padrão do tenant.
    pub store_id: Option<Uuid>,

    /// Desconto global da venda, por cima do subtotal das linhas.
    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub discount: Decimal,

    #[validate(nested)]
    pub items: Vec<CheckoutItemPayload>,
}

// ---
// Handler: checkout
// ---
#[utoipa::path(
    post,
    path = "/api/sales/checkout",
    tag = "Sales",
    request_body = CheckoutPayload,
    responses(
        (status = 201, description = "Venda cumprida; estoque baixado e razão gravado", body = SaleDetail),
        (status = 422, description = "Estoque insuficiente ou venda sem itens"),
        (status = 409, description = "Conflito com escrita concorrente; repetir a operação")
    ),
    security(("api_jwt" = []))
)]
pub async fn checkout(
    State(app_state): State<AppState>,
    session: AuthSession,
    Json(payload): Json<CheckoutPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let tenant_id = ScopeService::resolve_tenant(&session.identity, session.grant.as_ref())?;
    let store = app_state
        .scope_service
        .resolve_store(tenant_id, payload.store_id)
        .await?
        .ok_or(AppError::StoreRequired)?;

    let lines: Vec<SaleLine> = payload
        .items
        .iter()
        .map(|item| SaleLine {
            product_id: item.product_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            discount: item.discount,
        })
        .collect();

    let sale = app_state
        .sales_service
        .fulfill(
            tenant_id,
            &store,
            &lines,
            payload.discount,
            session.identity.user_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(sale)))
}
