pub mod auth;
pub mod inventory;
pub mod operations;
pub mod tenancy;
