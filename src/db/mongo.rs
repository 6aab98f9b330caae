use std::time::Instant;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    options::{FindOneAndUpdateOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ProductStore, StoreResult};
use crate::models::{NewProduct, Product, ProductChanges, ProductId};

pub const PRODUCTS_COLLECTION: &str = "products";

/// Stored shape of a product. Field names match what a mongoose model with
/// `timestamps: true` writes, so existing collections stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sku: Option<String>,
    price: f64,
    #[serde(default)]
    quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

impl ProductDocument {
    fn from_new(new: NewProduct, now: bson::DateTime) -> Self {
        Self {
            id: ObjectId::new(),
            name: new.name,
            sku: new.sku,
            price: new.price,
            quantity: new.quantity,
            category: new.category,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<ProductDocument> for Product {
    fn from(doc: ProductDocument) -> Self {
        Self {
            id: doc.id.into(),
            name: doc.name,
            sku: doc.sku,
            price: doc.price,
            quantity: doc.quantity,
            category: doc.category,
            created_at: doc.created_at.to_chrono(),
            updated_at: doc.updated_at.to_chrono(),
        }
    }
}

/// Build the `$set`/`$unset` modifier for a partial update.
fn update_document(changes: &ProductChanges, now: bson::DateTime) -> Document {
    let mut set = doc! { "updatedAt": now };
    let mut unset = Document::new();

    if let Some(name) = &changes.name {
        set.insert("name", name.as_str());
    }
    if let Some(price) = changes.price {
        set.insert("price", price);
    }
    if let Some(quantity) = changes.quantity {
        set.insert("quantity", quantity);
    }
    for (key, value) in [("sku", &changes.sku), ("category", &changes.category)] {
        match value {
            Some(Some(text)) => {
                set.insert(key, text.as_str());
            }
            Some(None) => {
                unset.insert(key, "");
            }
            None => {}
        }
    }

    let mut update = doc! { "$set": set };
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    update
}

pub struct MongoProductStore {
    collection: Collection<ProductDocument>,
}

impl MongoProductStore {
    /// Bind to the products collection and make sure the `sku` lookup index
    /// exists. The index is deliberately non-unique.
    pub async fn init(database: &Database) -> StoreResult<Self> {
        let collection = database.collection::<ProductDocument>(PRODUCTS_COLLECTION);

        let index = IndexModel::builder().keys(doc! { "sku": 1 }).build();
        let created = collection.create_index(index, None).await?;
        info!(index = %created.index_name, "Ensured products index");

        Ok(Self { collection })
    }
}

#[async_trait]
impl ProductStore for MongoProductStore {
    async fn insert(&self, product: NewProduct) -> StoreResult<Product> {
        let document = ProductDocument::from_new(product, bson::DateTime::from_chrono(Utc::now()));
        self.collection.insert_one(&document, None).await?;
        Ok(document.into())
    }

    async fn find_all(&self) -> StoreResult<Vec<Product>> {
        let start = Instant::now();
        let documents: Vec<ProductDocument> =
            self.collection.find(None, None).await?.try_collect().await?;
        debug!(
            count = documents.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Fetched products collection"
        );
        Ok(documents.into_iter().map(Product::from).collect())
    }

    async fn find_by_id(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let found = self
            .collection
            .find_one(doc! { "_id": id.object_id() }, None)
            .await?;
        Ok(found.map(Product::from))
    }

    async fn update(&self, id: ProductId, changes: &ProductChanges) -> StoreResult<Option<Product>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": id.object_id() },
                update_document(changes, bson::DateTime::from_chrono(Utc::now())),
                options,
            )
            .await?;
        Ok(updated.map(Product::from))
    }

    async fn delete(&self, id: ProductId) -> StoreResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.object_id() }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }
}
