pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod operations_repo;
pub use operations_repo::OperationsRepository;
