use async_trait::async_trait;
use futures::try_join;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{ProductStore, StoreError};
use crate::filter::ProductFilter;
use crate::models::{Category, NewProduct, Product, ProductChanges, Talla};

const PRODUCT_COLUMNS: &str = "id, nombre, descripcion, precio, color, created_at, categoria_id";

/// Postgres-backed store. The filter is rendered once here; everything else
/// is plain bound statements.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn imagenes_for(&self, product_id: i64) -> Result<Vec<String>, StoreError> {
        let urls = sqlx::query_scalar::<_, String>(
            "SELECT url FROM producto_imagenes WHERE product_id = $1 ORDER BY id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(urls)
    }

    async fn tallas_for(&self, product_id: i64) -> Result<Vec<Talla>, StoreError> {
        let tallas = sqlx::query_as::<_, Talla>(
            "SELECT talla, stock FROM producto_tallas WHERE product_id = $1 ORDER BY id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tallas)
    }

    async fn category_for(&self, categoria_id: Option<i64>) -> Result<Option<Category>, StoreError> {
        match categoria_id {
            Some(id) => self.category_by_id(id).await,
            None => Ok(None),
        }
    }
}

/// Appends the filter conditions; the leading `WHERE 1=1` is pushed by the
/// callers so every condition can start with `AND`.
fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(q) = filter.q() {
        let pattern = format!("%{}%", q);
        builder.push(" AND (nombre ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR descripcion ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(categoria_id) = filter.categoria_id() {
        builder.push(" AND categoria_id = ");
        builder.push_bind(categoria_id);
    }
    if let Some(before_id) = filter.before_id() {
        builder.push(" AND id < ");
        builder.push_bind(before_id);
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn query(
        &self,
        filter: &ProductFilter,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Product>, StoreError> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM productos WHERE 1=1"
        ));
        push_predicate(&mut builder, filter);
        builder.push(" ORDER BY id DESC");
        if let Some(limit) = limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }
        if let Some(offset) = offset {
            builder.push(" OFFSET ");
            builder.push_bind(offset);
        }
        let rows = builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn query_detailed(&self, filter: &ProductFilter) -> Result<Vec<Product>, StoreError> {
        let mut products = self.query(filter, None, None).await?;
        for product in &mut products {
            let (imagenes, tallas) =
                try_join!(self.imagenes_for(product.id), self.tallas_for(product.id))?;
            product.imagenes = Some(imagenes);
            product.tallas = Some(tallas);
        }
        Ok(products)
    }

    async fn count(&self, filter: &ProductFilter) -> Result<i64, StoreError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM productos WHERE 1=1");
        push_predicate(&mut builder, filter);
        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn get(&self, id: i64) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM productos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(mut product) = row else {
            return Ok(None);
        };
        let (imagenes, tallas, categoria) = try_join!(
            self.imagenes_for(id),
            self.tallas_for(id),
            self.category_for(product.categoria_id),
        )?;
        product.imagenes = Some(imagenes);
        product.tallas = Some(tallas);
        product.categoria = categoria;
        Ok(Some(product))
    }

    async fn insert(&self, data: NewProduct) -> Result<Product, StoreError> {
        let mut tx = self.pool.begin().await?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO productos (nombre, descripcion, precio, color, categoria_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&data.nombre)
        .bind(&data.descripcion)
        .bind(data.precio)
        .bind(&data.color)
        .bind(data.categoria_id)
        .fetch_one(&mut *tx)
        .await?;
        for url in &data.imagenes {
            sqlx::query("INSERT INTO producto_imagenes (product_id, url) VALUES ($1, $2)")
                .bind(id)
                .bind(url)
                .execute(&mut *tx)
                .await?;
        }
        for talla in &data.tallas {
            sqlx::query("INSERT INTO producto_tallas (product_id, talla, stock) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(&talla.talla)
                .bind(talla.stock)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        self.get(id)
            .await?
            .ok_or(StoreError::Query(sqlx::Error::RowNotFound))
    }

    async fn update(
        &self,
        id: i64,
        changes: ProductChanges,
    ) -> Result<Option<Product>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE productos SET nombre = $1, descripcion = $2, precio = $3, color = $4, \
             categoria_id = $5 WHERE id = $6",
        )
        .bind(&changes.nombre)
        .bind(&changes.descripcion)
        .bind(changes.precio)
        .bind(&changes.color)
        .bind(changes.categoria_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        if let Some(imagenes) = &changes.imagenes {
            sqlx::query("DELETE FROM producto_imagenes WHERE product_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for url in imagenes {
                sqlx::query("INSERT INTO producto_imagenes (product_id, url) VALUES ($1, $2)")
                    .bind(id)
                    .bind(url)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        if let Some(tallas) = &changes.tallas {
            sqlx::query("DELETE FROM producto_tallas WHERE product_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for talla in tallas {
                sqlx::query(
                    "INSERT INTO producto_tallas (product_id, talla, stock) VALUES ($1, $2, $3)",
                )
                .bind(id)
                .bind(&talla.talla)
                .bind(talla.stock)
                .execute(&mut *tx)
                .await?;
            }
        }
        tx.commit().await?;
        self.get(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM producto_imagenes WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM producto_tallas WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM productos WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() == 1)
    }

    async fn category_by_id(&self, id: i64) -> Result<Option<Category>, StoreError> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, nombre FROM categorias WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(category)
    }

    async fn category_by_name(&self, nombre: &str) -> Result<Option<Category>, StoreError> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, nombre FROM categorias WHERE nombre = $1")
                .bind(nombre)
                .fetch_optional(&self.pool)
                .await?;
        Ok(category)
    }
}
