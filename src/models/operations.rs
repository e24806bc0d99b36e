// src/models/operations.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Vendas ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub store_id: Uuid,
    #[schema(example = "150.50")]
    pub subtotal: Decimal,
    #[schema(example = "10.00")]
    pub discount: Decimal,
    #[schema(example = "140.50")]
    pub total: Decimal,
    pub sold_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub sale_id: Uuid,
    pub product_id: Uuid,
    #[schema(example = "2.0")]
    pub quantity: Decimal,
    #[schema(example = "50.00")]
    pub unit_price: Decimal,
    #[schema(example = "0.0")]
    pub discount: Decimal,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Venda completa (cabeçalho + itens), como devolvida pelo checkout.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    #[serde(flatten)]
    pub header: Sale,
    pub items: Vec<SaleItem>,
}

// --- Pedidos de Compra ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "purchase_order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Pending,
    Partial,
    Received,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrder {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "PC-2026-0042")]
    pub reference_code: Option<String>,
    pub status: PurchaseOrderStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderItem {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub purchase_order_id: Uuid,
    pub product_id: Uuid,
    #[schema(example = "100.0")]
    pub quantity_ordered: Decimal,
    #[schema(example = "60.0")]
    pub quantity_received: Decimal,
    pub unit_cost: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Pedido de compra completo, devolvido após um recebimento.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderDetail {
    #[serde(flatten)]
    pub header: PurchaseOrder,
    pub items: Vec<PurchaseOrderItem>,
}
