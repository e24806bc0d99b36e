// tests/ledger_scenarios.rs
//
// Cenários de ponta a ponta do núcleo de estoque, contra um Postgres real.
// Rodam apenas sob demanda (`cargo test -- --ignored`) com DATABASE_URL
// apontando para um banco de teste.

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use varejo_backend::{
    common::error::AppError,
    config::AppState,
    db::{InventoryRepository, OperationsRepository},
    models::{
        inventory::{LedgerQuery, Product, StockEntryCause, StockEntryKind},
        operations::{PurchaseOrder, PurchaseOrderItem, PurchaseOrderStatus},
        tenancy::Store,
    },
    services::{
        inventory_service::ProductRef, purchasing_service::LineReceipt, sales_service::SaleLine,
    },
};

fn dec(v: i64) -> Decimal {
    Decimal::from(v)
}

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

async fn test_state() -> AppState {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL deve apontar para o banco de teste");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("falha ao conectar no banco de teste");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("falha ao rodar as migrações");
    AppState::from_pool(pool, "segredo-de-teste".to_string())
}

/// Tenant + loja padrão + um produto (custo 7.50, preço 12.90), isolados dos
/// demais testes por códigos/SKUs únicos.
async fn seed(state: &AppState) -> (Uuid, Store, Product) {
    let suffix = Uuid::new_v4().simple().to_string();
    let tenant = state
        .tenant_repo
        .create_tenant(&state.db_pool, &format!("t-{suffix}"), "Tenant de Teste")
        .await
        .unwrap();
    let store = state
        .tenant_repo
        .create_store(&state.db_pool, tenant.id, "Matriz", true)
        .await
        .unwrap();
    let product = InventoryRepository::new(state.db_pool.clone())
        .create_product(
            &state.db_pool,
            tenant.id,
            &format!("CAFE-{suffix}"),
            Some(&format!("789{suffix}")),
            "Café 500g",
            money(750),
            money(1290),
        )
        .await
        .unwrap();
    (tenant.id, store, product)
}

/// Leva o saldo de (produto, loja) a um valor conhecido via ajuste absoluto.
async fn stock_at(state: &AppState, tenant_id: Uuid, store: &Store, product: &Product, qty: i64) {
    state
        .inventory_service
        .adjust(
            tenant_id,
            &ProductRef::Id(product.id),
            store,
            "ADJUST",
            dec(qty),
            None,
            None,
            None,
            Uuid::new_v4(),
        )
        .await
        .unwrap();
}

/// Semeia um pedido de compra com um único item, direto pelo repositório.
async fn seed_order(
    state: &AppState,
    tenant_id: Uuid,
    product_id: Uuid,
    quantity_ordered: Decimal,
    unit_cost: Option<Decimal>,
    created_by: Uuid,
) -> (PurchaseOrder, PurchaseOrderItem) {
    let repo = OperationsRepository::new(state.db_pool.clone());
    let order = repo
        .create_purchase_order(&state.db_pool, tenant_id, Some("PC-TESTE"), created_by)
        .await
        .unwrap();
    let item = repo
        .add_order_item(
            &state.db_pool,
            tenant_id,
            order.id,
            product_id,
            quantity_ordered,
            unit_cost,
        )
        .await
        .unwrap();
    (order, item)
}

async fn level_of(state: &AppState, tenant_id: Uuid, store: &Store, product: &Product) -> Decimal {
    state
        .inventory_service
        .list_levels(tenant_id, Some(store.id))
        .await
        .unwrap()
        .into_iter()
        .find(|l| l.product_id == product.id)
        .map(|l| l.quantity)
        .unwrap_or(Decimal::ZERO)
}

// ---
// Cenário A: venda baixa o estoque e deixa rastro no razão
// ---
#[tokio::test]
#[ignore]
async fn venda_baixa_o_saldo_e_grava_saida_no_razao() {
    let state = test_state().await;
    let (tenant_id, store, product) = seed(&state).await;
    let operator = Uuid::new_v4();
    stock_at(&state, tenant_id, &store, &product, 50).await;

    let sale = state
        .sales_service
        .fulfill(
            tenant_id,
            &store,
            &[SaleLine {
                product_id: product.id,
                quantity: dec(12),
                unit_price: None,
                discount: Decimal::ZERO,
            }],
            Decimal::ZERO,
            operator,
        )
        .await
        .unwrap();

    // Preço de linha vem do selling_price quando não informado.
    assert_eq!(sale.items.len(), 1);
    assert_eq!(sale.items[0].unit_price, money(1290));
    assert_eq!(sale.header.total, money(1290) * dec(12));

    assert_eq!(level_of(&state, tenant_id, &store, &product).await, dec(38));

    let history = state
        .inventory_service
        .ledger_history(
            tenant_id,
            &LedgerQuery {
                product_id: Some(product.id),
                kind: Some(StockEntryKind::Out),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let entry = &history[0];
    assert_eq!(entry.cause, StockEntryCause::Sale);
    assert_eq!(entry.quantity, dec(12));
    assert_eq!(entry.quantity_before, dec(50));
    assert_eq!(entry.quantity_after, dec(38));
    assert_eq!(entry.reference_id, Some(sale.header.id));
    assert_eq!(entry.performed_by, operator);
    assert!(entry.unit_cost.is_none());
}

// ---
// Cenário B: estoque insuficiente desfaz a venda inteira
// ---
#[tokio::test]
#[ignore]
async fn venda_sem_saldo_falha_e_nao_deixa_rastro() {
    let state = test_state().await;
    let (tenant_id, store, product) = seed(&state).await;
    stock_at(&state, tenant_id, &store, &product, 38).await;

    let err = state
        .sales_service
        .fulfill(
            tenant_id,
            &store,
            &[SaleLine {
                product_id: product.id,
                quantity: dec(999),
                unit_price: None,
                discount: Decimal::ZERO,
            }],
            Decimal::ZERO,
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();

    match err {
        AppError::InsufficientStock {
            available,
            requested,
            ..
        } => {
            assert_eq!(available, dec(38));
            assert_eq!(requested, dec(999));
        }
        other => panic!("esperava InsufficientStock, veio {other:?}"),
    }

    // Saldo intacto, nenhuma venda e nenhuma saída no razão.
    assert_eq!(level_of(&state, tenant_id, &store, &product).await, dec(38));
    let sales: i64 =
        sqlx::query_scalar("SELECT count(*) FROM sales WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_one(&state.db_pool)
            .await
            .unwrap();
    assert_eq!(sales, 0);
    let outs = state
        .inventory_service
        .ledger_history(
            tenant_id,
            &LedgerQuery {
                kind: Some(StockEntryKind::Out),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(outs.is_empty());
}

// ---
// Cenário C: recebimento parcial, atualização de custo e over-receipt
// ---
#[tokio::test]
#[ignore]
async fn recebimento_parcial_atualiza_custo_e_fecha_o_pedido() {
    let state = test_state().await;
    let (tenant_id, store, product) = seed(&state).await;
    let operator = Uuid::new_v4();

    let (order, item) =
        seed_order(&state, tenant_id, product.id, dec(100), Some(money(800)), operator).await;
    let order_id = order.id;
    let item_id = item.id;

    // 1. Recebe 60 de 100: PARTIAL, saldo 60, custo 7.50 -> 8.00.
    let order = state
        .purchasing_service
        .receive(
            tenant_id,
            Some(&store),
            order_id,
            &[LineReceipt {
                purchase_order_item_id: item_id,
                quantity: dec(60),
                barcode: None,
            }],
            operator,
        )
        .await
        .unwrap();
    assert_eq!(order.header.status, PurchaseOrderStatus::Partial);
    assert_eq!(order.items[0].quantity_received, dec(60));
    assert_eq!(level_of(&state, tenant_id, &store, &product).await, dec(60));

    let costs = state
        .inventory_service
        .cost_history(tenant_id, product.id)
        .await
        .unwrap();
    assert_eq!(costs.len(), 1);
    assert_eq!(costs[0].old_cost, money(750));
    assert_eq!(costs[0].new_cost, money(800));

    // A entrada IN carrega o custo e aponta para o pedido.
    let ins = state
        .inventory_service
        .ledger_history(
            tenant_id,
            &LedgerQuery {
                kind: Some(StockEntryKind::In),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(ins[0].unit_cost, Some(money(800)));
    assert_eq!(ins[0].total_cost, Some(money(800) * dec(60)));
    assert_eq!(ins[0].reference_id, Some(order.header.id));

    // 2. Tentar receber 50 quando restam 40 é over-receipt; nada muda.
    let err = state
        .purchasing_service
        .receive(
            tenant_id,
            Some(&store),
            order.header.id,
            &[LineReceipt {
                purchase_order_item_id: item_id,
                quantity: dec(50),
                barcode: None,
            }],
            operator,
        )
        .await
        .unwrap_err();
    match err {
        AppError::OverReceipt {
            ordered,
            already_received,
            attempted,
            ..
        } => {
            assert_eq!(ordered, dec(100));
            assert_eq!(already_received, dec(60));
            assert_eq!(attempted, dec(50));
        }
        other => panic!("esperava OverReceipt, veio {other:?}"),
    }
    assert_eq!(level_of(&state, tenant_id, &store, &product).await, dec(60));

    // 3. Recebe os 40 restantes: RECEIVED, saldo 100.
    let order = state
        .purchasing_service
        .receive(
            tenant_id,
            Some(&store),
            order.header.id,
            &[LineReceipt {
                purchase_order_item_id: item_id,
                quantity: dec(40),
                barcode: None,
            }],
            operator,
        )
        .await
        .unwrap();
    assert_eq!(order.header.status, PurchaseOrderStatus::Received);
    assert_eq!(level_of(&state, tenant_id, &store, &product).await, dec(100));

    // 4. Pedido fechado não aceita mais recebimentos.
    let err = state
        .purchasing_service
        .receive(
            tenant_id,
            Some(&store),
            order.header.id,
            &[LineReceipt {
                purchase_order_item_id: item_id,
                quantity: dec(1),
                barcode: None,
            }],
            operator,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyFullyReceived));
}

#[tokio::test]
#[ignore]
async fn venda_sem_itens_e_rejeitada() {
    let state = test_state().await;
    let (tenant_id, store, _product) = seed(&state).await;

    let err = state
        .sales_service
        .fulfill(tenant_id, &store, &[], Decimal::ZERO, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyLineItems));
}

#[tokio::test]
#[ignore]
async fn desconto_maior_que_o_subtotal_e_rejeitado() {
    let state = test_state().await;
    let (tenant_id, store, product) = seed(&state).await;
    stock_at(&state, tenant_id, &store, &product, 10).await;

    // Subtotal: 2 x 12.90 = 25.80; desconto de 100.00 não cabe.
    let err = state
        .sales_service
        .fulfill(
            tenant_id,
            &store,
            &[SaleLine {
                product_id: product.id,
                quantity: dec(2),
                unit_price: None,
                discount: Decimal::ZERO,
            }],
            dec(100),
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(level_of(&state, tenant_id, &store, &product).await, dec(10));
}

#[tokio::test]
#[ignore]
async fn recebimento_sem_linhas_e_rejeitado() {
    let state = test_state().await;
    let (tenant_id, store, product) = seed(&state).await;
    let operator = Uuid::new_v4();
    let (order, _item) = seed_order(&state, tenant_id, product.id, dec(10), None, operator).await;

    let err = state
        .purchasing_service
        .receive(tenant_id, Some(&store), order.id, &[], operator)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EmptyLineItems));
}

#[tokio::test]
#[ignore]
async fn codigo_de_barras_divergente_rejeita_o_recebimento() {
    let state = test_state().await;
    let (tenant_id, store, product) = seed(&state).await;
    let operator = Uuid::new_v4();
    let (order, item) = seed_order(&state, tenant_id, product.id, dec(10), None, operator).await;

    let err = state
        .purchasing_service
        .receive(
            tenant_id,
            Some(&store),
            order.id,
            &[LineReceipt {
                purchase_order_item_id: item.id,
                quantity: dec(10),
                barcode: Some("000000000000".to_string()),
            }],
            operator,
        )
        .await
        .unwrap_err();
    match err {
        AppError::BarcodeMismatch { product_id } => assert_eq!(product_id, product.id),
        other => panic!("esperava BarcodeMismatch, veio {other:?}"),
    }

    // Nada foi recebido: saldo zerado e linha intacta.
    assert_eq!(
        level_of(&state, tenant_id, &store, &product).await,
        Decimal::ZERO
    );
    let repo = OperationsRepository::new(state.db_pool.clone());
    let items = repo
        .list_order_items(&state.db_pool, tenant_id, order.id)
        .await
        .unwrap();
    assert_eq!(items[0].quantity_received, Decimal::ZERO);
}

#[tokio::test]
#[ignore]
async fn pedido_cancelado_rejeita_recebimento() {
    let state = test_state().await;
    let (tenant_id, store, product) = seed(&state).await;
    let operator = Uuid::new_v4();
    let (order, item) = seed_order(&state, tenant_id, product.id, dec(10), None, operator).await;

    let repo = OperationsRepository::new(state.db_pool.clone());
    repo.update_order_status(
        &state.db_pool,
        tenant_id,
        order.id,
        PurchaseOrderStatus::Cancelled,
    )
    .await
    .unwrap();

    let err = state
        .purchasing_service
        .receive(
            tenant_id,
            Some(&store),
            order.id,
            &[LineReceipt {
                purchase_order_item_id: item.id,
                quantity: dec(10),
                barcode: None,
            }],
            operator,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PurchaseOrderCancelled));
    assert_eq!(
        level_of(&state, tenant_id, &store, &product).await,
        Decimal::ZERO
    );
}

#[tokio::test]
#[ignore]
async fn recebimento_sem_loja_resolvida_e_rejeitado() {
    let state = test_state().await;
    let (tenant_id, _store, product) = seed(&state).await;
    let operator = Uuid::new_v4();
    let (order, item) = seed_order(&state, tenant_id, product.id, dec(10), None, operator).await;

    let err = state
        .purchasing_service
        .receive(
            tenant_id,
            None,
            order.id,
            &[LineReceipt {
                purchase_order_item_id: item.id,
                quantity: dec(10),
                barcode: None,
            }],
            operator,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StoreRequired));
}

// ---
// Cenário D: ajuste absoluto e a corrente do razão
// ---
#[tokio::test]
#[ignore]
async fn ajuste_define_o_saldo_e_a_corrente_do_razao_fecha() {
    let state = test_state().await;
    let (tenant_id, store, product) = seed(&state).await;
    stock_at(&state, tenant_id, &store, &product, 100).await;
    stock_at(&state, tenant_id, &store, &product, 95).await;

    assert_eq!(level_of(&state, tenant_id, &store, &product).await, dec(95));

    // Do mais recente ao mais antigo: o quantity_before de cada entrada é o
    // quantity_after da anterior, e a última fecha com o saldo atual.
    let history = state
        .inventory_service
        .ledger_history(
            tenant_id,
            &LedgerQuery {
                product_id: Some(product.id),
                store_id: Some(store.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].quantity_after, dec(95));
    assert_eq!(history[0].quantity_before, history[1].quantity_after);
    assert_eq!(history[1].quantity_before, Decimal::ZERO);
    assert_eq!(history[0].cause, StockEntryCause::Reconciliation);
    // A sequência monotônica reflete a ordem de gravação mesmo quando os
    // timestamps empatam no mesmo microssegundo.
    assert!(history[0].seq > history[1].seq);
}

// ---
// Cenário E: duas vendas concorrentes disputando o mesmo saldo
// ---
#[tokio::test]
#[ignore]
async fn vendas_concorrentes_nao_vendem_alem_do_saldo() {
    let state = test_state().await;
    let (tenant_id, store, product) = seed(&state).await;
    stock_at(&state, tenant_id, &store, &product, 50).await;

    // Cada venda pede 30 de um saldo de 50: no máximo uma pode passar.
    let mut handles = Vec::new();
    for _ in 0..2 {
        let state = state.clone();
        let store = store.clone();
        let product_id = product.id;
        handles.push(tokio::spawn(async move {
            state
                .sales_service
                .fulfill(
                    tenant_id,
                    &store,
                    &[SaleLine {
                        product_id,
                        quantity: dec(30),
                        unit_price: None,
                        discount: Decimal::ZERO,
                    }],
                    Decimal::ZERO,
                    Uuid::new_v4(),
                )
                .await
        }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(AppError::InsufficientStock { .. }) | Err(AppError::StockConflict) => {}
            Err(other) => panic!("erro inesperado: {other:?}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(level_of(&state, tenant_id, &store, &product).await, dec(20));
}

// ---
// Cenário F: isolamento entre tenants
// ---
#[tokio::test]
#[ignore]
async fn venda_de_produto_de_outro_tenant_e_rejeitada() {
    let state = test_state().await;
    let (tenant_a, store_a, _product_a) = seed(&state).await;
    let (tenant_b, store_b, product_b) = seed(&state).await;
    stock_at(&state, tenant_b, &store_b, &product_b, 10).await;

    // Tenant A tenta vender o produto do tenant B: o produto existe, mas o
    // dono não bate.
    let err = state
        .sales_service
        .fulfill(
            tenant_a,
            &store_a,
            &[SaleLine {
                product_id: product_b.id,
                quantity: dec(1),
                unit_price: None,
                discount: Decimal::ZERO,
            }],
            Decimal::ZERO,
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CrossTenantProduct { product_id } if product_id == product_b.id));

    // E os saldos do tenant B não vazam nas leituras do tenant A.
    let levels = state
        .inventory_service
        .list_levels(tenant_a, None)
        .await
        .unwrap();
    assert!(levels.iter().all(|l| l.tenant_id == tenant_a));
}

#[tokio::test]
#[ignore]
async fn loja_de_outro_tenant_nao_resolve() {
    let state = test_state().await;
    let (tenant_a, _store_a, _) = seed(&state).await;
    let (_tenant_b, store_b, _) = seed(&state).await;

    let err = state
        .scope_service
        .resolve_store(tenant_a, Some(store_b.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StoreMismatch));
}
