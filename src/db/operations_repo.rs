// src/db/operations_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::operations::{
        PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus, Sale, SaleItem,
    },
};

#[derive(Clone)]
pub struct OperationsRepository {
    pool: PgPool,
}

impl OperationsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  VENDAS
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub async fn create_sale<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        store_id: Uuid,
        subtotal: Decimal,
        discount: Decimal,
        total: Decimal,
        sold_by: Uuid,
    ) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (tenant_id, store_id, subtotal, discount, total, sold_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(store_id)
        .bind(subtotal)
        .bind(discount)
        .bind(total)
        .bind(sold_by)
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn add_sale_item<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sale_id: Uuid,
        product_id: Uuid,
        quantity: Decimal,
        unit_price: Decimal,
        discount: Decimal,
        line_total: Decimal,
    ) -> Result<SaleItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, SaleItem>(
            r#"
            INSERT INTO sale_items (
                tenant_id, sale_id, product_id, quantity, unit_price, discount, line_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .bind(product_id)
        .bind(quantity)
        .bind(unit_price)
        .bind(discount)
        .bind(line_total)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    // =========================================================================
    //  PEDIDOS DE COMPRA
    // =========================================================================

    /// Trava o cabeçalho do pedido durante o recebimento, para que dois
    /// recebimentos concorrentes do mesmo pedido se serializem.
    pub async fn get_purchase_order_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        purchase_order_id: Uuid,
    ) -> Result<Option<PurchaseOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            "SELECT * FROM purchase_orders WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(purchase_order_id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    pub async fn list_order_items<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        purchase_order_id: Uuid,
    ) -> Result<Vec<PurchaseOrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, PurchaseOrderItem>(
            r#"
            SELECT * FROM purchase_order_items
            WHERE tenant_id = $1 AND purchase_order_id = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(purchase_order_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn update_item_received<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        item_id: Uuid,
        new_received: Decimal,
    ) -> Result<PurchaseOrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, PurchaseOrderItem>(
            r#"
            UPDATE purchase_order_items
            SET quantity_received = $3
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(item_id)
        .bind(new_received)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn update_order_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        purchase_order_id: Uuid,
        status: PurchaseOrderStatus,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            UPDATE purchase_orders
            SET status = $3, updated_at = now()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(purchase_order_id)
        .bind(status)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    // ---
    // Criação mínima de pedidos. O ciclo de vida completo (listagem,
    // cancelamento etc.) pertence aos módulos CRUD vizinhos.
    // ---

    pub async fn create_purchase_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        reference_code: Option<&str>,
        created_by: Uuid,
    ) -> Result<PurchaseOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, PurchaseOrder>(
            r#"
            INSERT INTO purchase_orders (tenant_id, reference_code, created_by)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(reference_code)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    pub async fn add_order_item<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        purchase_order_id: Uuid,
        product_id: Uuid,
        quantity_ordered: Decimal,
        unit_cost: Option<Decimal>,
    ) -> Result<PurchaseOrderItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, PurchaseOrderItem>(
            r#"
            INSERT INTO purchase_order_items (
                tenant_id, purchase_order_id, product_id, quantity_ordered, unit_cost
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(purchase_order_id)
        .bind(product_id)
        .bind(quantity_ordered)
        .bind(unit_cost)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }
}
