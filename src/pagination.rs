use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::ProductFilter;
use crate::models::Product;
use crate::store::{ProductStore, StoreError};

// Page size cap and the default used when the client sends none.
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_PAGE_SIZE: i64 = 25;

#[derive(Debug, Error)]
pub enum ListError {
    #[error("limit must be > 0")]
    InvalidLimit,
    #[error("page must be >= 1")]
    InvalidPage,
    #[error("pageSize must be > 0")]
    InvalidPageSize,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeysetPage {
    pub items: Vec<Product>,
    #[serde(rename = "nextCursor")]
    pub next_cursor: Option<i64>,
    #[serde(rename = "hasNext")]
    pub has_next: bool,
    pub limit: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OffsetPage {
    pub items: Vec<Product>,
    pub total: i64,
    pub page: i64,
    #[serde(rename = "pageSize")]
    pub page_size: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

/// Keyset (cursor) listing: rows with `id < cursor`, newest first. The
/// `limit + 1` probe answers "is there a next page" without a COUNT, and
/// the strict id bound keeps pages stable under concurrent inserts.
pub async fn list_keyset(
    store: &dyn ProductStore,
    filter: ProductFilter,
    cursor: Option<i64>,
    limit: i64,
) -> Result<KeysetPage, ListError> {
    if limit <= 0 {
        return Err(ListError::InvalidLimit);
    }
    let limit = limit.min(MAX_PAGE_SIZE);
    let filter = filter.before(cursor);
    let mut items = store.query(&filter, Some(limit + 1), None).await?;
    let has_next = items.len() as i64 > limit;
    let next_cursor = if has_next {
        items.pop();
        items.last().map(|p| p.id)
    } else {
        None
    };
    Ok(KeysetPage {
        items,
        next_cursor,
        has_next,
        limit,
    })
}

/// Offset listing: `COUNT` plus skip/take. Pages past the end come back
/// empty with the correct total; this mode drifts under concurrent writes
/// (see the drift test), which is accepted.
pub async fn list_offset(
    store: &dyn ProductStore,
    filter: ProductFilter,
    page: i64,
    page_size: i64,
) -> Result<OffsetPage, ListError> {
    if page < 1 {
        return Err(ListError::InvalidPage);
    }
    if page_size <= 0 {
        return Err(ListError::InvalidPageSize);
    }
    let page_size = page_size.min(MAX_PAGE_SIZE);
    let total = store.count(&filter).await?;
    // an offset too large for i64 is just another page past the end
    let items = match (page - 1).checked_mul(page_size) {
        Some(offset) => store.query(&filter, Some(page_size), Some(offset)).await?,
        None => Vec::new(),
    };
    let total_pages = ((total + page_size - 1) / page_size).max(1);
    Ok(OffsetPage {
        items,
        total,
        page,
        page_size,
        total_pages,
    })
}

/// Legacy category listing: the whole filtered set in one hydrated
/// response, same filter and ordering rules as the paginated modes.
pub async fn list_by_category(
    store: &dyn ProductStore,
    filter: ProductFilter,
) -> Result<Vec<Product>, StoreError> {
    store.query_detailed(&filter).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProduct;
    use crate::store::MemStore;

    fn new_product(nombre: &str) -> NewProduct {
        NewProduct {
            nombre: nombre.to_string(),
            descripcion: None,
            precio: 10.0,
            color: None,
            categoria_id: None,
            imagenes: Vec::new(),
            tallas: Vec::new(),
        }
    }

    async fn seed(store: &MemStore, count: usize) {
        for i in 1..=count {
            store
                .insert(new_product(&format!("producto {}", i)))
                .await
                .unwrap();
        }
    }

    fn ids(items: &[Product]) -> Vec<i64> {
        items.iter().map(|p| p.id).collect()
    }

    async fn collect_all_pages(store: &MemStore, limit: i64) -> Vec<i64> {
        let mut all = Vec::new();
        let mut cursor = None;
        loop {
            let page = list_keyset(store, ProductFilter::default(), cursor, limit)
                .await
                .unwrap();
            all.extend(ids(&page.items));
            if !page.has_next {
                assert_eq!(page.next_cursor, None);
                break;
            }
            assert!(page.next_cursor.is_some());
            cursor = page.next_cursor;
        }
        all
    }

    #[actix_web::test]
    async fn chained_pages_equal_one_unlimited_query() {
        let store = MemStore::new();
        seed(&store, 25).await;
        let full = ids(&store
            .query(&ProductFilter::default(), None, None)
            .await
            .unwrap());
        assert_eq!(full.len(), 25);
        for limit in [1, 3, 7, 25, 100] {
            let collected = collect_all_pages(&store, limit).await;
            assert_eq!(collected, full, "limit {}", limit);
            assert!(collected.windows(2).all(|w| w[0] > w[1]));
        }
    }

    #[actix_web::test]
    async fn non_positive_limit_is_rejected() {
        let store = MemStore::new();
        seed(&store, 3).await;
        for limit in [0, -1] {
            let err = list_keyset(&store, ProductFilter::default(), None, limit)
                .await
                .unwrap_err();
            assert!(matches!(err, ListError::InvalidLimit));
        }
    }

    #[actix_web::test]
    async fn oversized_limit_is_clamped_to_max() {
        let store = MemStore::new();
        seed(&store, 120).await;
        let page = list_keyset(&store, ProductFilter::default(), None, 1000)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 100);
        assert_eq!(page.limit, 100);
        assert!(page.has_next);
        assert_eq!(page.next_cursor, Some(21));
    }

    #[actix_web::test]
    async fn empty_set_is_a_valid_empty_page() {
        let store = MemStore::new();
        let page = list_keyset(&store, ProductFilter::default(), None, 10)
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_next);
        assert_eq!(page.next_cursor, None);
    }

    #[actix_web::test]
    async fn exact_fit_final_page_has_no_cursor() {
        let store = MemStore::new();
        seed(&store, 4).await;
        let page = list_keyset(&store, ProductFilter::default(), None, 4)
            .await
            .unwrap();
        assert_eq!(ids(&page.items), vec![4, 3, 2, 1]);
        assert!(!page.has_next);
        assert_eq!(page.next_cursor, None);
    }

    #[actix_web::test]
    async fn two_page_walk_over_ids_five_four_three() {
        let store = MemStore::new();
        seed(&store, 5).await;
        store.delete(1).await.unwrap();
        store.delete(2).await.unwrap();

        let first = list_keyset(&store, ProductFilter::default(), None, 2)
            .await
            .unwrap();
        assert_eq!(ids(&first.items), vec![5, 4]);
        assert!(first.has_next);
        assert_eq!(first.next_cursor, Some(4));

        let second = list_keyset(&store, ProductFilter::default(), Some(4), 2)
            .await
            .unwrap();
        assert_eq!(ids(&second.items), vec![3]);
        assert!(!second.has_next);
        assert_eq!(second.next_cursor, None);
    }

    #[actix_web::test]
    async fn same_cursor_rereads_identically() {
        let store = MemStore::new();
        seed(&store, 10).await;
        let first = list_keyset(&store, ProductFilter::default(), Some(8), 3)
            .await
            .unwrap();
        let second = list_keyset(&store, ProductFilter::default(), Some(8), 3)
            .await
            .unwrap();
        assert_eq!(ids(&first.items), ids(&second.items));
        assert_eq!(first.next_cursor, second.next_cursor);
    }

    #[actix_web::test]
    async fn keyset_page_is_stable_when_newer_rows_arrive() {
        let store = MemStore::new();
        seed(&store, 6).await;
        let before = list_keyset(&store, ProductFilter::default(), Some(5), 3)
            .await
            .unwrap();
        store.insert(new_product("recién llegado")).await.unwrap();
        let after = list_keyset(&store, ProductFilter::default(), Some(5), 3)
            .await
            .unwrap();
        assert_eq!(ids(&before.items), ids(&after.items));
    }

    #[actix_web::test]
    async fn cursor_at_deleted_id_still_bounds_the_scan() {
        let store = MemStore::new();
        seed(&store, 5).await;
        store.delete(3).await.unwrap();
        let page = list_keyset(&store, ProductFilter::default(), Some(3), 10)
            .await
            .unwrap();
        assert_eq!(ids(&page.items), vec![2, 1]);
    }

    #[actix_web::test]
    async fn offset_page_math_and_past_the_end() {
        let store = MemStore::new();
        seed(&store, 5).await;
        let page = list_offset(&store, ProductFilter::default(), 1, 2)
            .await
            .unwrap();
        assert_eq!(ids(&page.items), vec![5, 4]);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);

        let past = list_offset(&store, ProductFilter::default(), 9, 2)
            .await
            .unwrap();
        assert!(past.items.is_empty());
        assert_eq!(past.total, 5);
        assert_eq!(past.total_pages, 3);
    }

    #[actix_web::test]
    async fn offset_page_near_i64_max_is_past_the_end_not_a_panic() {
        let store = MemStore::new();
        seed(&store, 5).await;
        for page in [i64::MAX, i64::MAX - 1, i64::MAX / 2] {
            let result = list_offset(&store, ProductFilter::default(), page, 100)
                .await
                .unwrap();
            assert!(result.items.is_empty(), "page {}", page);
            assert_eq!(result.total, 5);
            assert_eq!(result.total_pages, 1);
        }
    }

    #[actix_web::test]
    async fn offset_total_pages_is_at_least_one() {
        let store = MemStore::new();
        let page = list_offset(&store, ProductFilter::default(), 1, 10)
            .await
            .unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 1);
    }

    #[actix_web::test]
    async fn offset_rejects_bad_page_and_page_size() {
        let store = MemStore::new();
        let err = list_offset(&store, ProductFilter::default(), 0, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, ListError::InvalidPage));
        let err = list_offset(&store, ProductFilter::default(), 1, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ListError::InvalidPageSize));
    }

    // Offset paging has no stability guarantee: a row inserted ahead of the
    // read window shifts the boundary item into the next page. This pins
    // the drift as expected behavior.
    #[actix_web::test]
    async fn offset_pages_drift_when_newer_rows_arrive() {
        let store = MemStore::new();
        seed(&store, 4).await;
        let first = list_offset(&store, ProductFilter::default(), 1, 2)
            .await
            .unwrap();
        assert_eq!(ids(&first.items), vec![4, 3]);

        store.insert(new_product("recién llegado")).await.unwrap();

        let second = list_offset(&store, ProductFilter::default(), 2, 2)
            .await
            .unwrap();
        // id 3 was already served on page 1 and shows up again.
        assert_eq!(ids(&second.items), vec![3, 2]);
    }

    #[actix_web::test]
    async fn category_listing_returns_full_hydrated_set() {
        let store = MemStore::new();
        let cat = store.add_category("remeras");
        for i in 1..=3 {
            let mut p = new_product(&format!("remera {}", i));
            p.categoria_id = Some(cat.id);
            p.imagenes = vec![format!("https://img/{}.jpg", i)];
            store.insert(p).await.unwrap();
        }
        store.insert(new_product("sin categoría")).await.unwrap();

        let filter = ProductFilter::new(None, Some(cat.id));
        let items = list_by_category(&store, filter).await.unwrap();
        assert_eq!(ids(&items), vec![3, 2, 1]);
        assert!(items.iter().all(|p| p.imagenes.is_some() && p.tallas.is_some()));
    }

    #[actix_web::test]
    async fn category_with_no_products_is_empty_not_an_error() {
        let store = MemStore::new();
        let cat = store.add_category("vacía");
        let items = list_by_category(&store, ProductFilter::new(None, Some(cat.id)))
            .await
            .unwrap();
        assert!(items.is_empty());
    }
}
