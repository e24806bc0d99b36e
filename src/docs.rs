// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Tenancy ---
        handlers::tenancy::list_stores,

        // --- INVENTORY ---
        handlers::inventory::list_levels,
        handlers::inventory::adjust_stock,
        handlers::inventory::ledger_history,
        handlers::inventory::cost_history,

        // --- SALES ---
        handlers::sales::checkout,

        // --- PURCHASING ---
        handlers::purchasing::receive_order,
    ),
    components(
        schemas(
            models::tenancy::Tenant,
            models::tenancy::Store,
            models::inventory::Product,
            models::inventory::StockLevel,
            models::inventory::StockEntryKind,
            models::inventory::StockEntryCause,
            models::inventory::StockLedgerEntry,
            models::inventory::CostBasisEntry,
            models::operations::Sale,
            models::operations::SaleItem,
            models::operations::SaleDetail,
            models::operations::PurchaseOrder,
            models::operations::PurchaseOrderItem,
            models::operations::PurchaseOrderStatus,
            models::operations::PurchaseOrderDetail,
            handlers::inventory::AdjustStockPayload,
            handlers::sales::CheckoutPayload,
            handlers::sales::CheckoutItemPayload,
            handlers::purchasing::ReceiveOrderPayload,
            handlers::purchasing::ReceiptLinePayload,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Tenancy", description = "Catálogo de lojas do tenant efetivo"),
        (name = "Inventory", description = "Saldos, ajustes e livro-razão de estoque"),
        (name = "Sales", description = "Checkout de venda com baixa de estoque"),
        (name = "Purchasing", description = "Recebimento de pedidos de compra"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_jwt",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
