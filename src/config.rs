// src/config.rs

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, time::Duration};

use crate::{
    db::{InventoryRepository, OperationsRepository, TenantRepository},
    services::{InventoryService, PurchasingService, SalesService, ScopeService},
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub tenant_repo: TenantRepository,
    pub scope_service: ScopeService,
    pub inventory_service: InventoryService,
    pub sales_service: SalesService,
    pub purchasing_service: PurchasingService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, jwt_secret))
    }

    /// Monta o grafo de dependências a partir de uma pool já existente.
    /// Também é o caminho usado pelos testes de cenário.
    pub fn from_pool(db_pool: PgPool, jwt_secret: String) -> Self {
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let operations_repo = OperationsRepository::new(db_pool.clone());

        let scope_service = ScopeService::new(tenant_repo.clone(), db_pool.clone());
        let inventory_service = InventoryService::new(inventory_repo.clone(), db_pool.clone());
        let sales_service = SalesService::new(
            operations_repo.clone(),
            inventory_repo.clone(),
            inventory_service.clone(),
            db_pool.clone(),
        );
        let purchasing_service = PurchasingService::new(
            operations_repo,
            inventory_repo,
            inventory_service.clone(),
            db_pool.clone(),
        );

        Self {
            db_pool,
            jwt_secret,
            tenant_repo,
            scope_service,
            inventory_service,
            sales_service,
            purchasing_service,
        }
    }
}
