//! # Server Configuration
//!
//! Router assembly, shared state and the HTTP server loop.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{TokenService, page_guard, session_middleware};
use crate::config::AppConfig;
use crate::error::{ApiError, ErrorType};
use crate::handlers::{self, auth, clients, dashboard, orders, products, transactions};
use crate::telemetry::trace_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let tokens = TokenService::from_config(&config);
        Self {
            config: Arc::new(config),
            db,
            tokens,
        }
    }
}

async fn route_not_found() -> ApiError {
    ErrorType::NotFound.with_message("Route not found")
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/clients",
            get(clients::list_clients).post(clients::create_client),
        )
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route(
            "/api/transactions",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route("/api/dashboard", get(dashboard::get_dashboard))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            session_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .merge(protected)
        .fallback(route_not_found)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(page_guard))
        .layer(middleware::from_fn(trace_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Binds the configured address and serves until Ctrl-C
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config
        .bind_addr()
        .with_context(|| format!("Invalid server address: {}", config.api_bind_addr))?;
    let profile = config.profile.clone();

    let app = create_app(AppState::new(config, db));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::me,
        crate::handlers::clients::list_clients,
        crate::handlers::clients::create_client,
        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::create_order,
        crate::handlers::transactions::list_transactions,
        crate::handlers::transactions::create_transaction,
        crate::handlers::dashboard::get_dashboard,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::OrderStatus,
            crate::models::TransactionType,
            crate::models::TransactionStatus,
            crate::error::ApiError,
            crate::handlers::types::Pagination,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and session"),
        (name = "clients", description = "Customers of the workspace"),
        (name = "products", description = "Catalogue and stock"),
        (name = "orders", description = "Quotes and sales"),
        (name = "transactions", description = "Receivables and payables"),
        (name = "dashboard", description = "Workspace aggregates"),
    ),
    info(
        title = "Maré ERP API",
        description = "Business management API: clients, products, orders and finances per workspace",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
