// src/handlers/purchasing.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthSession,
    models::operations::PurchaseOrderDetail,
    services::{ScopeService, purchasing_service::LineReceipt},
};

// ---
// Payload: Recebimento de Pedido de Compra
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLinePayload {
    pub purchase_order_item_id: Uuid,
    #[schema(example = "60.0")]
    pub quantity: Decimal,
    /// Conferência opcional contra o código de barras do produto da linha.
    pub barcode: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveOrderPayload {
    /// A loja é obrigatória para receber: o estoque precisa entrar em um
    /// local específico. Sem storeId, vale a loja padrão do tenant, e a
    /// falta de ambas rejeita a operação.
    pub store_id: Option<Uuid>,

    pub lines: Vec<ReceiptLinePayload>,
}

// ---
// Handler: receive_order
// ---
#[utoipa::path(
    post,
    path = "/api/purchasing/orders/{order_id}/receive",
    tag = "Purchasing",
    request_body = ReceiveOrderPayload,
    params(
        ("order_id" = Uuid, Path, description = "ID do pedido de compra")
    ),
    responses(
        (status = 200, description = "Recebimento processado; pedido atualizado", body = PurchaseOrderDetail),
        (status = 404, description = "Pedido não encontrado"),
        (status = 409, description = "Pedido já totalmente recebido ou cancelado"),
        (status = 422, description = "Over-receipt, código de barras divergente ou loja ausente")
    ),
    security(("api_jwt" = []))
)]
pub async fn receive_order(
    State(app_state): State<AppState>,
    session: AuthSession,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<ReceiveOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    let tenant_id = ScopeService::resolve_tenant(&session.identity, session.grant.as_ref())?;
    let store = app_state
        .scope_service
        .resolve_store(tenant_id, payload.store_id)
        .await?;

    let receipts: Vec<LineReceipt> = payload
        .lines
        .iter()
        .map(|line| LineReceipt {
            purchase_order_item_id: line.purchase_order_item_id,
            quantity: line.quantity,
            barcode: line.barcode.clone(),
        })
        .collect();

    let order = app_state
        .purchasing_service
        .receive(
            tenant_id,
            store.as_ref(),
            order_id,
            &receipts,
            session.identity.user_id,
        )
        .await?;

    Ok(Json(order))
}
