use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::{
    db::ProductStore,
    error::{AppError, AppResult},
    models::{CreateProduct, Product, ProductId, UpdateProduct},
};

/// CRUD operations over products. Each call validates its input, then makes
/// exactly one store round trip.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
}

fn not_found(raw_id: &str) -> AppError {
    AppError::NotFound(format!("Product {} not found", raw_id))
}

/// Ids that are not well-formed cannot name a stored record.
fn parse_id(raw_id: &str) -> AppResult<ProductId> {
    ProductId::parse(raw_id).ok_or_else(|| not_found(raw_id))
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, payload: CreateProduct) -> AppResult<Product> {
        let new = payload.validate()?;

        let start = Instant::now();
        let product = self.store.insert(new).await?;

        info!(
            id = %product.id,
            name = %product.name,
            elapsed_ms = start.elapsed().as_millis(),
            "Created product"
        );
        Ok(product)
    }

    pub async fn list(&self) -> AppResult<Vec<Product>> {
        let start = Instant::now();
        let products = self.store.find_all().await?;

        info!(
            count = products.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Listed products"
        );
        Ok(products)
    }

    pub async fn get(&self, raw_id: &str) -> AppResult<Product> {
        let id = parse_id(raw_id)?;
        let product = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(raw_id))?;

        debug!(id = %id, "Fetched product");
        Ok(product)
    }

    /// Validation runs before the store is touched, so a rejected update
    /// leaves the record as it was.
    pub async fn update(&self, raw_id: &str, payload: UpdateProduct) -> AppResult<Product> {
        let id = parse_id(raw_id)?;
        let changes = payload.validate()?;
        if changes.is_empty() {
            debug!(id = %id, "Update carries no field changes, refreshing updatedAt only");
        }

        let start = Instant::now();
        let product = self
            .store
            .update(id, &changes)
            .await?
            .ok_or_else(|| not_found(raw_id))?;

        info!(id = %id, elapsed_ms = start.elapsed().as_millis(), "Updated product");
        Ok(product)
    }

    pub async fn delete(&self, raw_id: &str) -> AppResult<ProductId> {
        let id = parse_id(raw_id)?;
        if !self.store.delete(id).await? {
            return Err(not_found(raw_id));
        }

        info!(id = %id, "Deleted product");
        Ok(id)
    }
}
