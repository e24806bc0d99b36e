// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::tenancy::{Store, Tenant},
};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Catálogo de lojas (leituras usadas pela resolução de escopo)
    // ---

    /// Busca uma loja JÁ filtrando pelo tenant efetivo. Uma loja de outro
    /// tenant simplesmente não é encontrada aqui.
    pub async fn find_store<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        store_id: Uuid,
    ) -> Result<Option<Store>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let store = sqlx::query_as::<_, Store>(
            "SELECT * FROM stores WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(store_id)
        .fetch_optional(executor)
        .await?;
        Ok(store)
    }

    /// A loja padrão do tenant, se houver (no máximo uma, por índice parcial).
    pub async fn find_default_store<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Option<Store>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let store = sqlx::query_as::<_, Store>(
            "SELECT * FROM stores WHERE tenant_id = $1 AND is_default",
        )
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(store)
    }

    pub async fn list_stores(&self, tenant_id: Uuid) -> Result<Vec<Store>, AppError> {
        let stores = sqlx::query_as::<_, Store>(
            "SELECT * FROM stores WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(stores)
    }

    // ---
    // Provisionamento (usado por operadores e pelos testes de cenário)
    // ---

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        code: &str,
        name: &str,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (code, name)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(code)
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(tenant)
    }

    pub async fn create_store<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        is_default: bool,
    ) -> Result<Store, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let store = sqlx::query_as::<_, Store>(
            r#"
            INSERT INTO stores (tenant_id, name, is_default)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(is_default)
        .fetch_one(executor)
        .await?;
        Ok(store)
    }
}
