use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use super::{ProductStore, StoreError};
use crate::filter::ProductFilter;
use crate::models::{Category, NewProduct, Product, ProductChanges};

#[derive(Default)]
struct Inner {
    products: Vec<Product>,
    categories: Vec<Category>,
    last_product_id: i64,
    last_category_id: i64,
}

/// In-memory store with the same contract as [`super::PgStore`]: ids are
/// monotonically increasing and never reused, rows come back `id DESC`.
/// Backs the test suite and local runs without a database.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_category(&self, nombre: &str) -> Category {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.last_category_id += 1;
        let category = Category {
            id: inner.last_category_id,
            nombre: nombre.to_string(),
        };
        inner.categories.push(category.clone());
        category
    }
}

fn bare(product: &Product) -> Product {
    Product {
        categoria: None,
        imagenes: None,
        tallas: None,
        ..product.clone()
    }
}

fn matching_desc(inner: &Inner, filter: &ProductFilter) -> Vec<Product> {
    let mut rows: Vec<Product> = inner
        .products
        .iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect();
    rows.sort_by_key(|p| std::cmp::Reverse(p.id));
    rows
}

#[async_trait]
impl ProductStore for MemStore {
    async fn query(
        &self,
        filter: &ProductFilter,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Product>, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        let rows = matching_desc(&inner, filter)
            .into_iter()
            .skip(offset.unwrap_or(0).max(0) as usize)
            .take(limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX))
            .map(|p| bare(&p))
            .collect();
        Ok(rows)
    }

    async fn query_detailed(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        let rows = matching_desc(&inner, filter)
            .into_iter()
            .map(|p| Product {
                categoria: None,
                ..p
            })
            .collect();
        Ok(rows)
    }

    async fn count(&self, filter: &ProductFilter) -> Result<i64, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.products.iter().filter(|p| filter.matches(p)).count() as i64)
    }

    async fn get(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        let product = inner.products.iter().find(|p| p.id == id).map(|p| {
            let categoria = p
                .categoria_id
                .and_then(|cid| inner.categories.iter().find(|c| c.id == cid).cloned());
            Product {
                categoria,
                ..p.clone()
            }
        });
        Ok(product)
    }

    async fn insert(&self, data: NewProduct) -> Result<Product, StoreError> {
        let id = {
            let mut inner = self.inner.write().expect("store lock poisoned");
            inner.last_product_id += 1;
            let product = Product {
                id: inner.last_product_id,
                nombre: data.nombre,
                descripcion: data.descripcion,
                precio: data.precio,
                color: data.color,
                created_at: Utc::now(),
                categoria_id: data.categoria_id,
                categoria: None,
                imagenes: Some(data.imagenes),
                tallas: Some(data.tallas),
            };
            inner.products.push(product);
            inner.last_product_id
        };
        self.get(id)
            .await?
            .ok_or(StoreError::Query(sqlx::Error::RowNotFound))
    }

    async fn update(
        &self,
        id: i64,
        changes: ProductChanges,
    ) -> Result<Option<Product>, StoreError> {
        {
            let mut inner = self.inner.write().expect("store lock poisoned");
            let Some(product) = inner.products.iter_mut().find(|p| p.id == id) else {
                return Ok(None);
            };
            product.nombre = changes.nombre;
            product.descripcion = changes.descripcion;
            product.precio = changes.precio;
            product.color = changes.color;
            product.categoria_id = changes.categoria_id;
            if let Some(imagenes) = changes.imagenes {
                product.imagenes = Some(imagenes);
            }
            if let Some(tallas) = changes.tallas {
                product.tallas = Some(tallas);
            }
        }
        self.get(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let before = inner.products.len();
        inner.products.retain(|p| p.id != id);
        Ok(inner.products.len() < before)
    }

    async fn category_by_id(&self, id: i64) -> Result<Option<Category>, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn category_by_name(&self, nombre: &str) -> Result<Option<Category>, StoreError> {
        let inner = self.inner.read().expect("store lock poisoned");
        Ok(inner.categories.iter().find(|c| c.nombre == nombre).cloned())
    }
}
