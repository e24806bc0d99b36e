// src/services/sales_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::{
    common::error::AppError,
    db::{InventoryRepository, OperationsRepository},
    models::{
        inventory::{Product, StockEntryCause, StockEntryKind},
        operations::SaleDetail,
        tenancy::Store,
    },
    services::inventory_service::InventoryService,
};

/// Item solicitado no checkout. Sem preço informado, vale o selling_price
/// atual do produto.
#[derive(Debug, Clone)]
pub struct SaleLine {
    pub product_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
    pub discount: Decimal,
}

#[derive(Clone)]
pub struct SalesService {
    operations_repo: OperationsRepository,
    inventory_repo: InventoryRepository,
    inventory_service: InventoryService,
    pool: PgPool,
}

impl SalesService {
    pub fn new(
        operations_repo: OperationsRepository,
        inventory_repo: InventoryRepository,
        inventory_service: InventoryService,
        pool: PgPool,
    ) -> Self {
        Self {
            operations_repo,
            inventory_repo,
            inventory_service,
            pool,
        }
    }

    /// Total de uma linha: preço unitário x quantidade, menos o desconto da
    /// própria linha.
    fn line_total(unit_price: Decimal, quantity: Decimal, discount: Decimal) -> Decimal {
        unit_price * quantity - discount
    }

    // ---
    // Checkout (Venda)
    // ---

    /// Cumpre uma venda de múltiplas linhas como UMA unidade atômica: ou
    /// todas as linhas baixam estoque e a venda é gravada com suas entradas
    /// no razão, ou nada persiste. Não existe cumprimento parcial.
    pub async fn fulfill(
        &self,
        tenant_id: Uuid,
        store: &Store,
        lines: &[SaleLine],
        sale_discount: Decimal,
        actor: Uuid,
    ) -> Result<SaleDetail, AppError> {
        if lines.is_empty() {
            return Err(AppError::EmptyLineItems);
        }

        let mut tx = self.pool.begin().await?;

        // 1. Valida a propriedade de cada produto e precifica as linhas.
        let mut priced: Vec<(Product, &SaleLine, Decimal, Decimal)> = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity < Decimal::ONE {
                return Err(AppError::NonPositiveQuantity);
            }

            // Busca sem filtro de tenant só para poder distinguir o produto
            // alheio; nada do outro tenant sai na resposta.
            let product = self
                .inventory_repo
                .find_product_any_tenant(&mut *tx, line.product_id)
                .await?
                .ok_or(AppError::ProductNotFound)?;
            if product.tenant_id != tenant_id {
                return Err(AppError::CrossTenantProduct {
                    product_id: line.product_id,
                });
            }

            let unit_price = line.unit_price.unwrap_or(product.selling_price);
            let total = Self::line_total(unit_price, line.quantity, line.discount);
            priced.push((product, line, unit_price, total));
        }

        let subtotal: Decimal = priced.iter().map(|(_, _, _, total)| *total).sum();

        // Desconto da venda limitado ao subtotal: o total nunca fica negativo.
        if sale_discount < Decimal::ZERO || sale_discount > subtotal {
            let mut errors = ValidationErrors::new();
            let mut err = ValidationError::new("range");
            err.message = Some("O desconto não pode ser negativo nem exceder o subtotal.".into());
            errors.add("discount", err);
            return Err(errors.into());
        }

        // 2. Cabeçalho da venda. O desconto da venda é aplicado por cima do
        //    subtotal das linhas: total = subtotal - desconto.
        let sale = self
            .operations_repo
            .create_sale(
                &mut *tx,
                tenant_id,
                store.id,
                subtotal,
                sale_discount,
                subtotal - sale_discount,
                actor,
            )
            .await?;

        // 3. Por linha: item da venda + baixa de estoque + entrada no razão,
        //    tudo dentro desta mesma transação.
        let mut items = Vec::with_capacity(priced.len());
        for (product, line, unit_price, total) in &priced {
            let item = self
                .operations_repo
                .add_sale_item(
                    &mut *tx,
                    tenant_id,
                    sale.id,
                    product.id,
                    line.quantity,
                    *unit_price,
                    line.discount,
                    *total,
                )
                .await?;

            self.inventory_service
                .register_movement(
                    &mut tx,
                    tenant_id,
                    store.id,
                    product.id,
                    StockEntryKind::Out,
                    StockEntryCause::Sale,
                    line.quantity,
                    None, // saída nunca carrega custo nem mexe no cost_basis
                    Some(sale.id),
                    actor,
                )
                .await?;

            items.push(item);
        }

        tx.commit().await?;

        tracing::info!(sale_id = %sale.id, %tenant_id, store_id = %store.id, "venda cumprida");
        Ok(SaleDetail {
            header: sale,
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn total_da_linha_desconta_apenas_a_propria_linha() {
        // 2 x 50.00 - 10.00 = 90.00
        let total = SalesService::line_total(dec(50), dec(2), dec(10));
        assert_eq!(total, dec(90));
    }

    #[test]
    fn total_da_linha_sem_desconto() {
        let total = SalesService::line_total(Decimal::new(1290, 2), dec(12), Decimal::ZERO);
        assert_eq!(total, Decimal::new(15480, 2));
    }
}
