use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::errors::ApiError;
use crate::filter::ProductFilter;
use crate::models::{Category, NewProduct, ProductChanges, ProductInput, SizePayload};
use crate::pagination::{self, DEFAULT_PAGE_SIZE};
use crate::store::{ProductStore, StoreError};

type Store = web::Data<dyn ProductStore>;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    limit: Option<i64>,
    cursor: Option<i64>,
    q: Option<String>,
    page: Option<i64>,
    #[serde(rename = "pageSize")]
    page_size: Option<i64>,
    categoria: Option<String>,
}

/// Resolves a category reference that may be an id or a name: lookup by id
/// first, then fall back to the name.
async fn resolve_category(
    store: &dyn ProductStore,
    key: &str,
) -> Result<Option<Category>, StoreError> {
    if let Ok(id) = key.parse::<i64>() {
        if let Some(category) = store.category_by_id(id).await? {
            return Ok(Some(category));
        }
    }
    store.category_by_name(key).await
}

/// `GET /products`: keyset listing by default; the presence of `page`
/// selects the offset mode instead.
async fn list_products(
    store: Store,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();

    let categoria_id = match query.categoria.as_deref() {
        Some(key) => match resolve_category(store.get_ref(), key)
            .await
            .map_err(ApiError::ListFailed)?
        {
            Some(category) => Some(category.id),
            None => return Err(ApiError::BadRequest("Categoria no valida".to_string())),
        },
        None => None,
    };
    let filter = ProductFilter::new(query.q.as_deref(), categoria_id);

    if let Some(page) = query.page {
        let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        let result = pagination::list_offset(store.get_ref(), filter, page, page_size).await?;
        Ok(HttpResponse::Ok().json(result))
    } else {
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let result = pagination::list_keyset(store.get_ref(), filter, query.cursor, limit).await?;
        Ok(HttpResponse::Ok().json(result))
    }
}

/// `GET /products/categoria/{nombre}`: legacy unpaginated listing for one
/// category, resolved by name. An empty category is a 200 with an empty
/// array; only an unknown category name is a 404.
async fn products_by_category(
    store: Store,
    nombre: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let category = store
        .category_by_name(&nombre)
        .await
        .map_err(ApiError::OpFailed)?
        .ok_or_else(|| ApiError::NotFound("Categoría no encontrada".to_string()))?;

    let filter = ProductFilter::new(None, Some(category.id));
    let productos = pagination::list_by_category(store.get_ref(), filter)
        .await
        .map_err(ApiError::OpFailed)?;
    Ok(HttpResponse::Ok().json(json!({ "status": "OK", "productos": productos })))
}

async fn get_product(store: Store, id: web::Path<i64>) -> Result<HttpResponse, ApiError> {
    let producto = store
        .get(id.into_inner())
        .await
        .map_err(ApiError::OpFailed)?
        .ok_or_else(|| ApiError::NotFound("Producto no encontrado".to_string()))?;
    Ok(HttpResponse::Ok().json(json!({ "status": "OK", "producto": producto })))
}

fn validated_price(precio: Option<f64>) -> Result<f64, ApiError> {
    match precio {
        Some(p) if p.is_finite() && p >= 0.0 => Ok(p),
        _ => Err(ApiError::Invalid("Precio inválido".to_string())),
    }
}

async fn create_product(
    store: Store,
    body: web::Json<ProductInput>,
) -> Result<HttpResponse, ApiError> {
    let input = body.into_inner();
    let precio = validated_price(input.precio)?;

    let categoria_id = match input.categoria.as_deref() {
        Some(key) => match resolve_category(store.get_ref(), key)
            .await
            .map_err(ApiError::OpFailed)?
        {
            Some(category) => Some(category.id),
            None => return Err(ApiError::Invalid("Categoria no valida".to_string())),
        },
        None => None,
    };

    let producto = store
        .insert(NewProduct {
            nombre: input.nombre,
            descripcion: input.descripcion,
            precio,
            color: input.color,
            categoria_id,
            imagenes: input.imagenes.unwrap_or_default(),
            tallas: input.tallas.map(SizePayload::normalize).unwrap_or_default(),
        })
        .await
        .map_err(ApiError::OpFailed)?;
    Ok(HttpResponse::Created().json(json!({ "status": "OK", "producto": producto })))
}

async fn update_product(
    store: Store,
    id: web::Path<i64>,
    body: web::Json<ProductInput>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let input = body.into_inner();

    let existing = store
        .get(id)
        .await
        .map_err(ApiError::OpFailed)?
        .ok_or_else(|| ApiError::NotFound("Producto no encontrado".to_string()))?;
    let precio = validated_price(input.precio)?;

    // No category in the request keeps the existing reference.
    let categoria_id = match input.categoria.as_deref() {
        Some(key) => match resolve_category(store.get_ref(), key)
            .await
            .map_err(ApiError::OpFailed)?
        {
            Some(category) => Some(category.id),
            None => return Err(ApiError::Invalid("Categoria no valida".to_string())),
        },
        None => existing.categoria_id,
    };

    // Owned sets are replaced wholesale, but only when the request actually
    // carries a non-empty replacement.
    let imagenes = input.imagenes.filter(|urls| !urls.is_empty());
    let tallas = input
        .tallas
        .map(SizePayload::normalize)
        .filter(|tallas| !tallas.is_empty());

    let producto = store
        .update(
            id,
            ProductChanges {
                nombre: input.nombre,
                descripcion: input.descripcion,
                precio,
                color: input.color,
                categoria_id,
                imagenes,
                tallas,
            },
        )
        .await
        .map_err(ApiError::OpFailed)?
        .ok_or_else(|| ApiError::NotFound("Producto no encontrado".to_string()))?;
    Ok(HttpResponse::Ok().json(json!({ "status": "OK", "producto": producto })))
}

async fn delete_product(store: Store, id: web::Path<i64>) -> Result<HttpResponse, ApiError> {
    let deleted = store
        .delete(id.into_inner())
        .await
        .map_err(ApiError::OpFailed)?;
    if !deleted {
        return Err(ApiError::NotFound("Producto no encontrado".to_string()));
    }
    Ok(HttpResponse::Ok().json(json!({ "status": "OK", "msg": "Producto eliminado correctamente" })))
}

/// Route table shared by `main` and the endpoint tests. Malformed query
/// values (a non-integer `cursor`, for instance) become a 400 with the
/// listing-contract `{ msg }` body.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(json!({ "msg": err.to_string() }));
        actix_web::error::InternalError::from_response(err, response).into()
    }))
    .route("/products", web::get().to(list_products))
    .route("/products", web::post().to(create_product))
    .route("/products/categoria/{nombre}", web::get().to(products_by_category))
    .route("/products/{id}", web::get().to(get_product))
    .route("/products/{id}", web::put().to(update_product))
    .route("/products/{id}", web::delete().to(delete_product));
}
