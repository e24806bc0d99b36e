// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Tenant (Estabelecimento) ---
// Raiz de propriedade: tudo neste subsistema pertence a exatamente um tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    #[schema(example = "loja-centro")]
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// --- Store (Loja / Local físico) ---
// Pertence a exatamente um tenant; no máximo uma loja padrão por tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Loja Centro")]
    pub name: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}
