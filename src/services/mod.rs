pub mod inventory_service;
pub mod purchasing_service;
pub mod sales_service;
pub mod scope_service;

pub use inventory_service::InventoryService;
pub use purchasing_service::PurchasingService;
pub use sales_service::SalesService;
pub use scope_service::ScopeService;
