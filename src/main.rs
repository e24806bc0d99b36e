//src/main.rs

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use varejo_backend::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

#[tokio::main]
async fn main() {
    // Inicializa o logger.
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let inventory_routes = Router::new()
        .route("/levels", get(handlers::inventory::list_levels))
        .route("/adjust", post(handlers::inventory::adjust_stock))
        .route("/ledger", get(handlers::inventory::ledger_history))
        .route(
            "/products/{product_id}/cost-history",
            get(handlers::inventory::cost_history),
        );

    let sales_routes = Router::new().route("/checkout", post(handlers::sales::checkout));

    let purchasing_routes = Router::new().route(
        "/orders/{order_id}/receive",
        post(handlers::purchasing::receive_order),
    );

    let store_routes = Router::new().route("/", get(handlers::tenancy::list_stores));

    // Tudo que toca dados de tenant passa pelo guard de autenticação;
    // o escopo efetivo é resolvido por requisição, dentro dos handlers.
    let protected = Router::new()
        .nest("/api/inventory", inventory_routes)
        .nest("/api/sales", sales_routes)
        .nest("/api/purchasing", purchasing_routes)
        .nest("/api/stores", store_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(protected)
        .with_state(app_state);

    // Inicia o servidor
    let addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
