// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- 1. Produto (catálogo) ---
// SKU e código de barras são únicos DENTRO do tenant, não globalmente.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "CAFE-500G")]
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    /// Custo de referência atual. Só muda via entradas de estoque (IN).
    #[schema(example = "7.50")]
    pub cost_basis: Decimal,
    #[schema(example = "12.90")]
    pub selling_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 2. Saldo de Estoque ---
// Um registro por (produto, loja) que já foi estocado. Ausência = zero,
// mas o registro precisa existir antes de qualquer entrada apontar para ele.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub store_id: Uuid,
    /// Quantidade física atual. Nunca negativa.
    pub quantity: Decimal,
    pub minimum_threshold: Decimal,
    pub updated_at: DateTime<Utc>,
}

// --- 3. Movimentações (Livro-Razão) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_entry_kind", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum StockEntryKind {
    In,     // Soma a quantidade ao saldo
    Out,    // Subtrai (falha se ficar negativo)
    Adjust, // DEFINE o saldo no valor informado (reconciliação por contagem)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stock_entry_cause", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockEntryCause {
    Purchase,
    Sale,
    Damaged,
    Lost,
    Reconciliation,
    Return,
    Manual,
}

// --- Entrada do Livro-Razão ---
// Imutável depois de gravada. Correções geram uma NOVA entrada compensatória.
// Invariante: o quantity_after de uma entrada é o quantity_before da próxima
// entrada do mesmo (produto, loja), na ordem de commit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockLedgerEntry {
    pub id: Uuid,
    /// Posição na ordem de gravação; desempata timestamps iguais.
    pub seq: i64,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub store_id: Uuid,
    pub product_id: Uuid,
    pub kind: StockEntryKind,
    pub cause: StockEntryCause,
    /// Magnitude do movimento (sempre positiva; em ADJUST, o valor definido).
    pub quantity: Decimal,
    pub quantity_before: Decimal,
    pub quantity_after: Decimal,
    /// Só presente em entradas (IN).
    pub unit_cost: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    /// Referência externa: id da venda ou do pedido de compra.
    pub reference_id: Option<Uuid>,
    pub performed_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// --- 4. Trilha de Custo ---
// Gravada apenas quando uma entrada (IN) declara um custo unitário diferente
// do cost_basis atual do produto; na mesma transação do movimento.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostBasisEntry {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub old_cost: Decimal,
    pub new_cost: Decimal,
    pub ledger_entry_id: Uuid,
    #[schema(example = "Recebimento de pedido de compra")]
    pub reason: String,
    pub performed_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Filtros de consulta do histórico de movimentações.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LedgerQuery {
    pub product_id: Option<Uuid>,
    pub store_id: Option<Uuid>,
    pub kind: Option<StockEntryKind>,
    pub cause: Option<StockEntryCause>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
