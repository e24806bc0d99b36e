// src/db/inventory_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        CostBasisEntry, LedgerQuery, Product, StockEntryCause, StockEntryKind, StockLedgerEntry,
        StockLevel,
    },
};

// Teto de página do histórico; o chamador pagina com limit/offset.
const MAX_HISTORY_PAGE: i64 = 200;

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Produtos
    // ---

    /// Busca SEM filtro de tenant. Usada pelo caminho de venda para
    /// distinguir "não existe" de "pertence a outro tenant"; o serviço
    /// compara o dono antes de expor qualquer coisa.
    pub async fn find_product_any_tenant<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    pub async fn find_product<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(product_id)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    pub async fn find_product_by_barcode<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        barcode: &str,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE tenant_id = $1 AND barcode = $2",
        )
        .bind(tenant_id)
        .bind(barcode)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    /// Trava a linha do produto. Necessário em qualquer entrada (IN) que
    /// possa reescrever o cost_basis: duas entradas concorrentes em lojas
    /// diferentes disputam o MESMO produto.
    pub async fn get_product_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(product_id)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sku: &str,
        barcode: Option<&str>,
        name: &str,
        cost_basis: Decimal,
        selling_price: Decimal,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (tenant_id, sku, barcode, name, cost_basis, selling_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(sku)
        .bind(barcode)
        .bind(name)
        .bind(cost_basis)
        .bind(selling_price)
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    pub async fn update_product_cost<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        new_cost: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE products SET cost_basis = $3, updated_at = now() WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(new_cost)
        .execute(executor)
        .await?;
        Ok(())
    }

    // ---
    // Saldos de Estoque
    // ---

    /// Garante que o registro (produto, loja) exista, com saldo zero.
    /// Idempotente: se já existe, não toca em nada.
    pub async fn ensure_stock_level<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        store_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO stock_levels (tenant_id, product_id, store_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, product_id, store_id) DO NOTHING
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(store_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// O ponto de serialização de todo o subsistema: trava a linha do saldo
    /// (FOR UPDATE) para que a pré-condição seja avaliada contra o valor que
    /// será de fato sobrescrito, nunca contra um snapshot velho.
    pub async fn get_stock_level_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        store_id: Uuid,
    ) -> Result<Option<StockLevel>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let level = sqlx::query_as::<_, StockLevel>(
            r#"
            SELECT * FROM stock_levels
            WHERE tenant_id = $1 AND product_id = $2 AND store_id = $3
            FOR UPDATE
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(store_id)
        .fetch_optional(executor)
        .await?;
        Ok(level)
    }

    /// Grava a nova quantidade absoluta calculada sob a trava.
    pub async fn set_stock_level_quantity<'e, E>(
        &self,
        executor: E,
        level_id: Uuid,
        new_quantity: Decimal,
    ) -> Result<StockLevel, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let level = sqlx::query_as::<_, StockLevel>(
            r#"
            UPDATE stock_levels
            SET quantity = $2, updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(level_id)
        .bind(new_quantity)
        .fetch_one(executor)
        .await?;
        Ok(level)
    }

    /// Saldos do tenant, opcionalmente restritos a uma loja. Alimenta os
    /// gatilhos de estoque baixo definidos fora deste núcleo.
    pub async fn list_stock_levels(
        &self,
        tenant_id: Uuid,
        store_id: Option<Uuid>,
    ) -> Result<Vec<StockLevel>, AppError> {
        let levels = sqlx::query_as::<_, StockLevel>(
            r#"
            SELECT * FROM stock_levels
            WHERE tenant_id = $1 AND ($2::uuid IS NULL OR store_id = $2)
            ORDER BY updated_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(levels)
    }

    // ---
    // Livro-Razão (append-only)
    // ---

    /// Grava uma entrada do livro-razão. Chamada SOMENTE de dentro da
    /// transação de uma operação de mutação, logo após a escrita do saldo,
    /// com os before/after recém-calculados sob a trava.
    #[allow(clippy::too_many_arguments)]
    pub async fn append_ledger_entry<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        store_id: Uuid,
        product_id: Uuid,
        kind: StockEntryKind,
        cause: StockEntryCause,
        quantity: Decimal,
        quantity_before: Decimal,
        quantity_after: Decimal,
        unit_cost: Option<Decimal>,
        reference_id: Option<Uuid>,
        performed_by: Uuid,
    ) -> Result<StockLedgerEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total_cost = unit_cost.map(|c| c * quantity);
        let entry = sqlx::query_as::<_, StockLedgerEntry>(
            r#"
            INSERT INTO stock_ledger (
                tenant_id, store_id, product_id, kind, cause,
                quantity, quantity_before, quantity_after,
                unit_cost, total_cost, reference_id, performed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(store_id)
        .bind(product_id)
        .bind(kind)
        .bind(cause)
        .bind(quantity)
        .bind(quantity_before)
        .bind(quantity_after)
        .bind(unit_cost)
        .bind(total_cost)
        .bind(reference_id)
        .bind(performed_by)
        .fetch_one(executor)
        .await?;
        Ok(entry)
    }

    /// Histórico de movimentações, mais recente primeiro. Finito e
    /// reiniciável: a mesma consulta com os mesmos filtros repete a página.
    pub async fn ledger_history(
        &self,
        tenant_id: Uuid,
        query: &LedgerQuery,
    ) -> Result<Vec<StockLedgerEntry>, AppError> {
        let limit = query.limit.unwrap_or(50).clamp(1, MAX_HISTORY_PAGE);
        let offset = query.offset.unwrap_or(0).max(0);

        let entries = sqlx::query_as::<_, StockLedgerEntry>(
            r#"
            SELECT * FROM stock_ledger
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR product_id = $2)
              AND ($3::uuid IS NULL OR store_id = $3)
              AND ($4::stock_entry_kind IS NULL OR kind = $4)
              AND ($5::stock_entry_cause IS NULL OR cause = $5)
            ORDER BY seq DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(tenant_id)
        .bind(query.product_id)
        .bind(query.store_id)
        .bind(query.kind)
        .bind(query.cause)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    // ---
    // Trilha de Custo
    // ---

    #[allow(clippy::too_many_arguments)]
    pub async fn append_cost_basis_entry<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        product_id: Uuid,
        old_cost: Decimal,
        new_cost: Decimal,
        ledger_entry_id: Uuid,
        reason: &str,
        performed_by: Uuid,
    ) -> Result<CostBasisEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, CostBasisEntry>(
            r#"
            INSERT INTO cost_basis_entries (
                tenant_id, product_id, old_cost, new_cost,
                ledger_entry_id, reason, performed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .bind(old_cost)
        .bind(new_cost)
        .bind(ledger_entry_id)
        .bind(reason)
        .bind(performed_by)
        .fetch_one(executor)
        .await?;
        Ok(entry)
    }

    pub async fn cost_history(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<CostBasisEntry>, AppError> {
        let entries = sqlx::query_as::<_, CostBasisEntry>(
            r#"
            SELECT * FROM cost_basis_entries
            WHERE tenant_id = $1 AND product_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 200
            "#,
        )
        .bind(tenant_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
