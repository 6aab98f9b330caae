use std::sync::Arc;

use axum::{
    routing::{get, MethodRouter},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;

use crate::config::{Config, StoreBackend};
use crate::db::{MemoryProductStore, MongoProductStore, ProductStore};
use crate::services::ProductService;

/// Shared application state, cheap to clone (the store sits behind an Arc).
#[derive(Clone)]
pub struct AppState {
    pub products: ProductService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,inventory_api=debug")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  API Estoque · Rust + Axum           ║");
    info!("╚══════════════════════════════════════╝");

    let store: Arc<dyn ProductStore> = match config.store {
        StoreBackend::Mongo => {
            info!("Connecting to MongoDB...");
            let database = db::connect(&config.mongodb_uri).await?;
            Arc::new(MongoProductStore::init(&database).await?)
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory product store; data is lost on exit");
            Arc::new(MemoryProductStore::new())
        }
    };

    let state = AppState {
        products: ProductService::new(store),
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `/products` and `/products/` answer the same way.
fn product_collection_routes() -> MethodRouter<AppState> {
    get(handlers::products::list_products)
        .post(handlers::products::create_product)
        .fallback(handlers::method_not_allowed)
}

fn build_router(state: AppState) -> Router {
    Router::new()
        // ── Health ──────────────────────────────────────────────────────────
        .route(
            "/",
            get(handlers::health).fallback(handlers::method_not_allowed),
        )

        // ── Products CRUD ───────────────────────────────────────────────────
        .route("/products", product_collection_routes())
        .route("/products/", product_collection_routes())
        .route(
            "/products/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .patch(handlers::products::update_product)
                .delete(handlers::products::delete_product)
                .fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::fallback)

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
