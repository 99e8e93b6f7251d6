use async_trait::async_trait;
use thiserror::Error;

use crate::filter::ProductFilter;
use crate::models::{Category, NewProduct, Product, ProductChanges};

mod mem;
mod pg;

pub use mem::MemStore;
pub use pg::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Query(#[from] sqlx::Error),
}

/// The storage boundary consumed by the listers and handlers. `query` and
/// `count` take the already-built [`ProductFilter`]; rows always come back
/// `id DESC` so the keyset cursor bound stays meaningful.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn query(
        &self,
        filter: &ProductFilter,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Product>, StoreError>;

    // query without bounds, each row hydrated with imagenes/tallas
    async fn query_detailed(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError>;

    async fn count(&self, filter: &ProductFilter) -> Result<i64, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<Product>, StoreError>;

    async fn insert(&self, data: NewProduct) -> Result<Product, StoreError>;

    // Some(imagenes/tallas) replaces the owned set wholesale, None keeps it
    async fn update(&self, id: i64, changes: ProductChanges)
        -> Result<Option<Product>, StoreError>;

    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    async fn category_by_id(&self, id: i64) -> Result<Option<Category>, StoreError>;

    async fn category_by_name(&self, nombre: &str) -> Result<Option<Category>, StoreError>;
}
