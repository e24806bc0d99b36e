// src/services/inventory_service.rs

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::InventoryRepository,
    models::{
        inventory::{
            CostBasisEntry, LedgerQuery, StockEntryCause, StockEntryKind, StockLedgerEntry,
            StockLevel,
        },
        tenancy::Store,
    },
};

/// Referência de produto aceita pelo ajuste manual: id direto ou busca por
/// código de barras, sempre escopada ao tenant efetivo.
#[derive(Debug, Clone)]
pub enum ProductRef {
    Id(Uuid),
    Barcode(String),
}

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, pool: PgPool) -> Self {
        Self {
            inventory_repo,
            pool,
        }
    }

    // ---
    // Núcleo puro
    // ---

    /// Semântica dos três tipos de movimento, concentrada em um único match
    /// exaustivo. Retorna (saldo_antes, saldo_depois).
    ///
    /// IN e OUT são deltas relativos; ADJUST DEFINE o saldo no valor
    /// informado (reconciliação a um valor contado), de propósito.
    fn apply_kind(
        product_id: Uuid,
        kind: StockEntryKind,
        current: Decimal,
        quantity: Decimal,
    ) -> Result<(Decimal, Decimal), AppError> {
        match kind {
            StockEntryKind::In => {
                if quantity <= Decimal::ZERO {
                    return Err(AppError::NonPositiveQuantity);
                }
                Ok((current, current + quantity))
            }
            StockEntryKind::Out => {
                if quantity <= Decimal::ZERO {
                    return Err(AppError::NonPositiveQuantity);
                }
                if current < quantity {
                    return Err(AppError::InsufficientStock {
                        product_id,
                        available: current,
                        requested: quantity,
                    });
                }
                Ok((current, current - quantity))
            }
            StockEntryKind::Adjust => {
                // Aqui zero é válido: "contei e não há nada".
                if quantity < Decimal::ZERO {
                    return Err(AppError::NonPositiveQuantity);
                }
                Ok((current, quantity))
            }
        }
    }

    /// Converte o tipo vindo da requisição ("IN" | "OUT" | "ADJUST").
    pub fn parse_kind(raw: &str) -> Result<StockEntryKind, AppError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(StockEntryKind::In),
            "OUT" => Ok(StockEntryKind::Out),
            "ADJUST" => Ok(StockEntryKind::Adjust),
            other => Err(AppError::InvalidAdjustmentKind(other.to_string())),
        }
    }

    /// Variação percentual do custo, para relatório/auditoria:
    /// `(novo-velho)/velho*100`; por definição 100 quando o velho é zero e o
    /// novo é positivo, e 0 quando ambos são zero.
    pub fn cost_percentage_change(old: Decimal, new: Decimal) -> Decimal {
        if old.is_zero() {
            if new > Decimal::ZERO {
                Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            }
        } else {
            (new - old) / old * Decimal::ONE_HUNDRED
        }
    }

    fn cost_reason(cause: StockEntryCause) -> &'static str {
        match cause {
            StockEntryCause::Purchase => "Recebimento de pedido de compra",
            StockEntryCause::Return => "Devolução com custo declarado",
            StockEntryCause::Reconciliation => "Reconciliação de estoque",
            StockEntryCause::Sale
            | StockEntryCause::Damaged
            | StockEntryCause::Lost
            | StockEntryCause::Manual => "Entrada manual de estoque",
        }
    }

    // ---
    // Porta de mutação de estoque
    // ---

    /// O ÚNICO caminho que altera um saldo e grava no livro-razão. Os módulos
    /// de venda e de compra chamam esta porta de dentro das SUAS transações
    /// (`conn` é a conexão da transação do chamador); saldo, entrada do razão
    /// e eventual trilha de custo commitam ou desfazem juntos.
    ///
    /// A trava de linha (FOR UPDATE) serializa o read-modify-write por
    /// (produto, loja): a pré-condição é avaliada contra o valor que será
    /// sobrescrito, nunca contra um snapshot velho.
    #[allow(clippy::too_many_arguments)]
    pub async fn register_movement(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        store_id: Uuid,
        product_id: Uuid,
        kind: StockEntryKind,
        cause: StockEntryCause,
        quantity: Decimal,
        unit_cost: Option<Decimal>,
        reference_id: Option<Uuid>,
        actor: Uuid,
    ) -> Result<StockLedgerEntry, AppError> {
        // Custo unitário só tem significado em entradas.
        let unit_cost = match kind {
            StockEntryKind::In => unit_cost,
            _ => None,
        };

        // 1. Garante o registro (produto, loja) com saldo zero e o trava.
        self.inventory_repo
            .ensure_stock_level(&mut *conn, tenant_id, product_id, store_id)
            .await?;
        let level = self
            .inventory_repo
            .get_stock_level_for_update(&mut *conn, tenant_id, product_id, store_id)
            .await?
            .ok_or_else(|| {
                AppError::from(anyhow::anyhow!(
                    "saldo recém-garantido ausente para ({product_id}, {store_id})"
                ))
            })?;

        // 2. Valida e calcula o novo saldo sob a trava.
        let (before, after) = Self::apply_kind(product_id, kind, level.quantity, quantity)?;

        // 3. Novo saldo + entrada do razão na MESMA transação, com os
        //    before/after recém-calculados (invariante da corrente).
        self.inventory_repo
            .set_stock_level_quantity(&mut *conn, level.id, after)
            .await?;
        let entry = self
            .inventory_repo
            .append_ledger_entry(
                &mut *conn,
                tenant_id,
                store_id,
                product_id,
                kind,
                cause,
                quantity,
                before,
                after,
                unit_cost,
                reference_id,
                actor,
            )
            .await?;

        // 4. Toda entrada (IN) com custo declarado passa pelo rastreador de
        //    custo; saídas nunca mexem no cost_basis.
        if let Some(cost) = unit_cost {
            self.track_cost_basis(
                &mut *conn,
                tenant_id,
                product_id,
                cost,
                entry.id,
                Self::cost_reason(cause),
                actor,
            )
            .await?;
        }

        Ok(entry)
    }

    // ---
    // Rastreador de Custo (interno)
    // ---

    /// Se o custo declarado difere do cost_basis atual, atualiza o produto e
    /// grava a entrada de auditoria ligada ao movimento que a disparou.
    /// Mesma transação do movimento; nunca eventualmente-consistente.
    #[allow(clippy::too_many_arguments)]
    async fn track_cost_basis(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        product_id: Uuid,
        declared_cost: Decimal,
        ledger_entry_id: Uuid,
        reason: &str,
        actor: Uuid,
    ) -> Result<Option<CostBasisEntry>, AppError> {
        // Reconfere sob trava de linha do produto: duas entradas concorrentes
        // em lojas diferentes disputam o mesmo cost_basis.
        let product = self
            .inventory_repo
            .get_product_for_update(&mut *conn, tenant_id, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;

        if declared_cost == product.cost_basis {
            return Ok(None);
        }

        self.inventory_repo
            .update_product_cost(&mut *conn, tenant_id, product_id, declared_cost)
            .await?;
        let entry = self
            .inventory_repo
            .append_cost_basis_entry(
                &mut *conn,
                tenant_id,
                product_id,
                product.cost_basis,
                declared_cost,
                ledger_entry_id,
                reason,
                actor,
            )
            .await?;

        tracing::info!(
            %product_id,
            old = %product.cost_basis,
            new = %declared_cost,
            change_pct = %Self::cost_percentage_change(product.cost_basis, declared_cost),
            "cost_basis atualizado"
        );

        Ok(Some(entry))
    }

    // ---
    // Ajuste Manual (operação completa)
    // ---

    /// Ajuste manual de estoque: uma entrada do razão por chamada, atômica
    /// com a escrita do saldo.
    #[allow(clippy::too_many_arguments)]
    pub async fn adjust(
        &self,
        tenant_id: Uuid,
        product_ref: &ProductRef,
        store: &Store,
        kind_raw: &str,
        quantity: Decimal,
        cause: Option<StockEntryCause>,
        unit_cost: Option<Decimal>,
        reference_id: Option<Uuid>,
        actor: Uuid,
    ) -> Result<StockLedgerEntry, AppError> {
        let kind = Self::parse_kind(kind_raw)?;
        // Causa padrão: ADJUST é reconciliação por contagem; o resto é manual.
        let cause = cause.unwrap_or(match kind {
            StockEntryKind::Adjust => StockEntryCause::Reconciliation,
            _ => StockEntryCause::Manual,
        });

        let mut tx = self.pool.begin().await?;

        // Busca escopada ao tenant: barcode que não acha = ProductNotFound.
        let product = match product_ref {
            ProductRef::Id(id) => {
                self.inventory_repo
                    .find_product(&mut *tx, tenant_id, *id)
                    .await?
            }
            ProductRef::Barcode(code) => {
                self.inventory_repo
                    .find_product_by_barcode(&mut *tx, tenant_id, code)
                    .await?
            }
        }
        .ok_or(AppError::ProductNotFound)?;

        let entry = self
            .register_movement(
                &mut tx,
                tenant_id,
                store.id,
                product.id,
                kind,
                cause,
                quantity,
                unit_cost,
                reference_id,
                actor,
            )
            .await?;

        tx.commit().await?;
        Ok(entry)
    }

    // ---
    // Leituras (alimentam relatórios e gatilhos definidos fora deste núcleo)
    // ---

    pub async fn ledger_history(
        &self,
        tenant_id: Uuid,
        query: &LedgerQuery,
    ) -> Result<Vec<StockLedgerEntry>, AppError> {
        self.inventory_repo.ledger_history(tenant_id, query).await
    }

    pub async fn list_levels(
        &self,
        tenant_id: Uuid,
        store_id: Option<Uuid>,
    ) -> Result<Vec<StockLevel>, AppError> {
        self.inventory_repo
            .list_stock_levels(tenant_id, store_id)
            .await
    }

    pub async fn cost_history(
        &self,
        tenant_id: Uuid,
        product_id: Uuid,
    ) -> Result<Vec<CostBasisEntry>, AppError> {
        // Garante que o produto pertence ao tenant antes de expor a trilha.
        self.inventory_repo
            .find_product(&self.pool, tenant_id, product_id)
            .await?
            .ok_or(AppError::ProductNotFound)?;
        self.inventory_repo.cost_history(tenant_id, product_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn entrada_soma_ao_saldo_atual() {
        let pid = Uuid::new_v4();
        let (before, after) =
            InventoryService::apply_kind(pid, StockEntryKind::In, dec(40), dec(60)).unwrap();
        assert_eq!(before, dec(40));
        assert_eq!(after, dec(100));
    }

    #[test]
    fn saida_subtrai_e_preserva_o_antes() {
        let pid = Uuid::new_v4();
        let (before, after) =
            InventoryService::apply_kind(pid, StockEntryKind::Out, dec(50), dec(12)).unwrap();
        assert_eq!(before, dec(50));
        assert_eq!(after, dec(38));
    }

    #[test]
    fn saida_maior_que_o_saldo_falha_nomeando_quantidades() {
        let pid = Uuid::new_v4();
        let err = InventoryService::apply_kind(pid, StockEntryKind::Out, dec(38), dec(999))
            .unwrap_err();
        match err {
            AppError::InsufficientStock {
                product_id,
                available,
                requested,
            } => {
                assert_eq!(product_id, pid);
                assert_eq!(available, dec(38));
                assert_eq!(requested, dec(999));
            }
            other => panic!("esperava InsufficientStock, veio {other:?}"),
        }
    }

    #[test]
    fn ajuste_define_o_saldo_em_valor_absoluto() {
        // Produto com 100 ajustado para 95: vira EXATAMENTE 95,
        // independente do valor anterior. Não é um delta de -5.
        let pid = Uuid::new_v4();
        let (before, after) =
            InventoryService::apply_kind(pid, StockEntryKind::Adjust, dec(100), dec(95)).unwrap();
        assert_eq!(before, dec(100));
        assert_eq!(after, dec(95));

        // O mesmo ajuste partindo de 7 também termina em 95.
        let (_, after) =
            InventoryService::apply_kind(pid, StockEntryKind::Adjust, dec(7), dec(95)).unwrap();
        assert_eq!(after, dec(95));
    }

    #[test]
    fn ajuste_para_zero_e_valido_mas_negativo_nao() {
        let pid = Uuid::new_v4();
        let (_, after) =
            InventoryService::apply_kind(pid, StockEntryKind::Adjust, dec(10), dec(0)).unwrap();
        assert_eq!(after, dec(0));

        let err = InventoryService::apply_kind(pid, StockEntryKind::Adjust, dec(10), dec(-1))
            .unwrap_err();
        assert!(matches!(err, AppError::NonPositiveQuantity));
    }

    #[test]
    fn entrada_e_saida_exigem_quantidade_positiva() {
        let pid = Uuid::new_v4();
        for kind in [StockEntryKind::In, StockEntryKind::Out] {
            let err = InventoryService::apply_kind(pid, kind, dec(10), dec(0)).unwrap_err();
            assert!(matches!(err, AppError::NonPositiveQuantity));
        }
    }

    #[test]
    fn parse_kind_aceita_os_tres_tipos_e_rejeita_o_resto() {
        assert_eq!(
            InventoryService::parse_kind("IN").unwrap(),
            StockEntryKind::In
        );
        assert_eq!(
            InventoryService::parse_kind("out").unwrap(),
            StockEntryKind::Out
        );
        assert_eq!(
            InventoryService::parse_kind(" Adjust ").unwrap(),
            StockEntryKind::Adjust
        );
        let err = InventoryService::parse_kind("TRANSFER").unwrap_err();
        assert!(matches!(err, AppError::InvalidAdjustmentKind(k) if k == "TRANSFER"));
    }

    #[test]
    fn variacao_percentual_de_custo() {
        // Caso normal: 7.50 -> 8.00 é +6.67% (arredondando em 2 casas).
        let old = Decimal::new(750, 2);
        let new = Decimal::new(800, 2);
        let pct = InventoryService::cost_percentage_change(old, new);
        assert_eq!(pct.round_dp(2), Decimal::new(667, 2));

        // Custo saindo do zero: 100% por definição.
        assert_eq!(
            InventoryService::cost_percentage_change(Decimal::ZERO, new),
            Decimal::ONE_HUNDRED
        );

        // Ambos zero: 0%.
        assert_eq!(
            InventoryService::cost_percentage_change(Decimal::ZERO, Decimal::ZERO),
            Decimal::ZERO
        );
    }
}
