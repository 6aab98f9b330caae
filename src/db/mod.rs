pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use bson::doc;
use mongodb::{options::ClientOptions, Client, Database};
use tracing::info;

use crate::models::{NewProduct, Product, ProductChanges, ProductId};

pub use memory::MemoryProductStore;
pub use mongo::MongoProductStore;

/// Database used when the connection string does not name one.
pub const DEFAULT_DATABASE: &str = "estoque";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not connect to the document store: {0}")]
    Connection(String),

    #[error("document store operation failed: {0}")]
    Backend(#[from] mongodb::error::Error),
}

/// Persistence operations over Product records. Each call is one
/// independent round trip; nothing spans more than a single record.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: NewProduct) -> StoreResult<Product>;

    async fn find_all(&self) -> StoreResult<Vec<Product>>;

    async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>>;

    /// Returns the record as it is after the update, or `None` if `id` is absent.
    async fn update(&self, id: ProductId, changes: &ProductChanges) -> StoreResult<Option<Product>>;

    /// Returns `false` if nothing matched `id`.
    async fn delete(&self, id: ProductId) -> StoreResult<bool>;
}

// ── Connection ────────────────────────────────────────────────────────────────

/// Open a client for `uri` and confirm the server answers.
///
/// The driver connects lazily, so a `ping` is issued to surface an
/// unreachable server at startup instead of on the first request.
pub async fn connect(uri: &str) -> StoreResult<Database> {
    let mut options = ClientOptions::parse(uri)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;
    options.app_name = Some("inventory-api".to_string());

    let client = Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;
    let database = client
        .default_database()
        .unwrap_or_else(|| client.database(DEFAULT_DATABASE));

    database
        .run_command(doc! { "ping": 1 }, None)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

    info!(database = %database.name(), "Connected to MongoDB");
    Ok(database)
}
