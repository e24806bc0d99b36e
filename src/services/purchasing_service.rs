// src/services/purchasing_service.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InventoryRepository, OperationsRepository},
    models::{
        inventory::{StockEntryCause, StockEntryKind},
        operations::{PurchaseOrderDetail, PurchaseOrderItem, PurchaseOrderStatus},
        tenancy::Store,
    },
    services::inventory_service::InventoryService,
};

/// Linha de recebimento: quanto chegou de cada item do pedido. O código de
/// barras é opcional e serve só de conferência contra o produto da linha.
#[derive(Debug, Clone)]
pub struct LineReceipt {
    pub purchase_order_item_id: Uuid,
    pub quantity: Decimal,
    pub barcode: Option<String>,
}

#[derive(Clone)]
pub struct PurchasingService {
    operations_repo: OperationsRepository,
    inventory_repo: InventoryRepository,
    inventory_service: InventoryService,
    pool: PgPool,
}

impl PurchasingService {
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

    // ---
    // Núcleo puro
    // ---

    /// Limite de recebimento: já recebido + chegando agora nunca pode passar
    /// do pedido. Retorna o novo total recebido da linha.
    fn validate_line_receipt(
        item_id: Uuid,
        ordered: Decimal,
        already_received: Decimal,
        attempted: Decimal,
    ) -> Result<Decimal, AppError> {
        if attempted <= Decimal::ZERO {
            return Err(AppError::NonPositiveQuantity);
        }
        if already_received + attempted > ordered {
            return Err(AppError::OverReceipt {
                purchase_order_item_id: item_id,
                ordered,
                already_received,
                attempted,
            });
        }
        Ok(already_received + attempted)
    }

    /// Só pedidos PENDING ou PARTIAL aceitam recebimento.
    fn ensure_receivable(status: PurchaseOrderStatus) -> Result<(), AppError> {
        match status {
            PurchaseOrderStatus::Received => Err(AppError::AlreadyFullyReceived),
            PurchaseOrderStatus::Cancelled => Err(AppError::PurchaseOrderCancelled),
            PurchaseOrderStatus::Pending | PurchaseOrderStatus::Partial => Ok(()),
        }
    }

    /// Recalcula o status do pedido depois de processar as linhas:
    /// RECEIVED quando toda linha fechou, PARTIAL quando alguma já recebeu
    /// algo, senão o status fica como estava.
    fn recompute_status(
        items: &[PurchaseOrderItem],
        current: PurchaseOrderStatus,
    ) -> PurchaseOrderStatus {
        if !items.is_empty()
            && items
                .iter()
                .all(|i| i.quantity_received >= i.quantity_ordered)
        {
            PurchaseOrderStatus::Received
        } else if items.iter().any(|i| i.quantity_received > Decimal::ZERO) {
            PurchaseOrderStatus::Partial
        } else {
            current
        }
    }

    // ---
    // Recebimento (operação completa)
    // ---

    /// Recebe mercadoria contra um pedido de compra. Cada linha incrementa o
    /// recebido do item, credita o saldo (criando o registro zerado se a
    /// loja nunca estocou o produto) e grava uma entrada IN/PURCHASE no
    /// razão, tudo em uma transação; qualquer falha desfaz o recebimento
    /// inteiro.
    ///
    /// A loja é OBRIGATÓRIA aqui, diferente dos caminhos de leitura: o
    /// estoque precisa entrar em um local específico, nunca num padrão
    /// silencioso.
    pub async fn receive(
        &self,
        tenant_id: Uuid,
        store: Option<&Store>,
        purchase_order_id: Uuid,
        receipts: &[LineReceipt],
        actor: Uuid,
    ) -> Result<PurchaseOrderDetail, AppError> {
        let store = store.ok_or(AppError::StoreRequired)?;
        if receipts.is_empty() {
            return Err(AppError::EmptyLineItems);
        }

        let mut tx = self.pool.begin().await?;

        // 1. Trava o cabeçalho: dois recebimentos concorrentes do mesmo
        //    pedido se serializam aqui.
        let order = self
            .operations_repo
            .get_purchase_order_for_update(&mut *tx, tenant_id, purchase_order_id)
            .await?
            .ok_or(AppError::PurchaseOrderNotFound)?;
        Self::ensure_receivable(order.status)?;

        let items = self
            .operations_repo
            .list_order_items(&mut *tx, tenant_id, purchase_order_id)
            .await?;

        // Duas linhas do mesmo recebimento podem apontar para o mesmo item;
        // o acumulado da chamada conta para o limite de over-receipt.
        let mut received_in_call: HashMap<Uuid, Decimal> = HashMap::new();

        for receipt in receipts {
            let item = items
                .iter()
                .find(|i| i.id == receipt.purchase_order_item_id)
                .ok_or(AppError::PurchaseOrderNotFound)?;

            let product = self
                .inventory_repo
                .find_product(&mut *tx, tenant_id, item.product_id)
                .await?
                .ok_or(AppError::ProductNotFound)?;

            // Conferência opcional por código de barras.
            if let Some(code) = &receipt.barcode {
                if product.barcode.as_deref() != Some(code.as_str()) {
                    return Err(AppError::BarcodeMismatch {
                        product_id: product.id,
                    });
                }
            }

            let already = item.quantity_received
                + received_in_call
                    .get(&item.id)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
            let new_received = Self::validate_line_receipt(
                item.id,
                item.quantity_ordered,
                already,
                receipt.quantity,
            )?;
            received_in_call.insert(item.id, new_received - item.quantity_received);

            self.operations_repo
                .update_item_received(&mut *tx, tenant_id, item.id, new_received)
                .await?;

            // Custo unitário: o declarado na linha do pedido, ou o
            // cost_basis atual do produto quando a linha não declara.
            let unit_cost = item.unit_cost.unwrap_or(product.cost_basis);

            self.inventory_service
                .register_movement(
                    &mut tx,
                    tenant_id,
                    store.id,
                    product.id,
                    StockEntryKind::In,
                    StockEntryCause::Purchase,
                    receipt.quantity,
                    Some(unit_cost),
                    Some(purchase_order_id),
                    actor,
                )
                .await?;
        }

        // 2. Status recalculado a partir das linhas já atualizadas.
        let items = self
            .operations_repo
            .list_order_items(&mut *tx, tenant_id, purchase_order_id)
            .await?;
        let new_status = Self::recompute_status(&items, order.status);
        let order = if new_status != order.status {
            self.operations_repo
                .update_order_status(&mut *tx, tenant_id, purchase_order_id, new_status)
                .await?
        } else {
            order
        };

        tx.commit().await?;

        tracing::info!(
            %purchase_order_id,
            %tenant_id,
            store_id = %store.id,
            status = ?order.status,
            "recebimento de compra processado"
        );
        Ok(PurchaseOrderDetail {
            header: order,
            items,
        })
    }
}
