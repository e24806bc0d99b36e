// src/common/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Todas as variantes de validação são detectadas ANTES de qualquer escrita:
// a operação inteira é rejeitada sem mudança parcial de estado.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // --- Resolução de escopo ---
    #[error("A operação exige um tenant efetivo e nenhum pôde ser resolvido")]
    ScopeRequired,

    #[error("A loja informada não pertence ao tenant efetivo")]
    StoreMismatch,

    #[error("Esta operação exige uma loja; o estoque precisa entrar em um local específico")]
    StoreRequired,

    // --- Pré-condições das mutações ---
    #[error("O produto pertence a outro tenant")]
    CrossTenantProduct { product_id: Uuid },

    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Pedido de compra não encontrado")]
    PurchaseOrderNotFound,

    #[error("Estoque insuficiente: disponível {available}, solicitado {requested}")]
    InsufficientStock {
        product_id: Uuid,
        available: Decimal,
        requested: Decimal,
    },

    #[error("Recebimento excede o pedido: pedido {ordered}, já recebido {already_received}, tentado {attempted}")]
    OverReceipt {
        purchase_order_item_id: Uuid,
        ordered: Decimal,
        already_received: Decimal,
        attempted: Decimal,
    },

    #[error("O código de barras informado não confere com o produto da linha")]
    BarcodeMismatch { product_id: Uuid },

    #[error("O pedido de compra já foi totalmente recebido")]
    AlreadyFullyReceived,

    #[error("O pedido de compra foi cancelado e não aceita recebimentos")]
    PurchaseOrderCancelled,

    #[error("A venda precisa de pelo menos um item")]
    EmptyLineItems,

    #[error("Tipo de ajuste inválido: {0}")]
    InvalidAdjustmentKind(String),

    #[error("A quantidade precisa ser positiva")]
    NonPositiveQuantity,

    // --- Concorrência ---
    // Distinto das falhas de validação: o chamador PODE repetir a operação.
    // Nunca é reportado como InsufficientStock, mesmo que o sintoma pareça.
    #[error("Conflito com outra escrita concorrente no estoque; tente novamente")]
    StockConflict,

    // --- Autenticação ---
    #[error("Token inválido")]
    InvalidToken,

    // --- Infraestrutura ---
    #[error("Erro de banco de dados")]
    DatabaseError(sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

// Conversão manual (em vez de #[from]) para separar conflitos de
// serialização/deadlock (retryable) dos demais erros de banco.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if let Some(code) = db_err.code() {
                // 40001 = serialization_failure, 40P01 = deadlock_detected
                if code == "40001" || code == "40P01" {
                    return AppError::StockConflict;
                }
            }
        }
        AppError::DatabaseError(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::ScopeRequired => (
                StatusCode::FORBIDDEN,
                json!({ "error": self.to_string() }),
            ),
            AppError::StoreMismatch => (
                StatusCode::FORBIDDEN,
                json!({ "error": self.to_string() }),
            ),
            AppError::StoreRequired => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": self.to_string() }),
            ),

            // Cada rejeição nomeia a entidade ofensora e as quantidades
            // envolvidas, para o chamador reagir sem nova consulta.
            AppError::CrossTenantProduct { product_id } => (
                StatusCode::FORBIDDEN,
                json!({ "error": self.to_string(), "productId": product_id }),
            ),
            AppError::ProductNotFound | AppError::PurchaseOrderNotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": self.to_string() }),
            ),
            AppError::InsufficientStock {
                product_id,
                available,
                requested,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "Estoque insuficiente.",
                    "productId": product_id,
                    "available": available,
                    "requested": requested,
                }),
            ),
            AppError::OverReceipt {
                purchase_order_item_id,
                ordered,
                already_received,
                attempted,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "Recebimento excede a quantidade pedida.",
                    "purchaseOrderItemId": purchase_order_item_id,
                    "ordered": ordered,
                    "alreadyReceived": already_received,
                    "attempted": attempted,
                }),
            ),
            AppError::BarcodeMismatch { product_id } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": self.to_string(), "productId": product_id }),
            ),
            AppError::AlreadyFullyReceived | AppError::PurchaseOrderCancelled => (
                StatusCode::CONFLICT,
                json!({ "error": self.to_string() }),
            ),
            AppError::EmptyLineItems => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": self.to_string() }),
            ),
            AppError::InvalidAdjustmentKind(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string() }),
            ),
            AppError::NonPositiveQuantity => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": self.to_string() }),
            ),

            AppError::StockConflict => (
                StatusCode::CONFLICT,
                json!({ "error": self.to_string(), "retryable": true }),
            ),

            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Token de autenticação inválido ou ausente." }),
            ),

            // DatabaseError e InternalServerError viram 500 opacos.
            // O `tracing` registra a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro interno do servidor: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Ocorreu um erro inesperado." }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
