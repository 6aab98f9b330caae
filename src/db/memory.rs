use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::{ProductStore, StoreResult};
use crate::models::{NewProduct, Product, ProductChanges, ProductId};

/// In-process store. Listing returns records in insertion order.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    products: RwLock<IndexMap<ProductId, Product>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn insert(&self, product: NewProduct) -> StoreResult<Product> {
        let product = Product::from_new(ProductId::new(), product, Utc::now());
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_all(&self) -> StoreResult<Vec<Product>> {
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn update(&self, id: ProductId, changes: &ProductChanges) -> StoreResult<Option<Product>> {
        let mut products = self.products.write().await;
        Ok(products.get_mut(&id).map(|product| {
            changes.apply_to(product, Utc::now());
            product.clone()
        }))
    }

    async fn delete(&self, id: ProductId) -> StoreResult<bool> {
        // shift_remove keeps the remaining records in insertion order
        Ok(self.products.write().await.shift_remove(&id).is_some())
    }
}
