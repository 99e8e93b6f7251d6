use crate::models::Product;

/// The filter applied before ordering and pagination: an optional free-text
/// search over `nombre`/`descripcion`, an optional category scope, and an
/// optional exclusive id upper bound set by the keyset lister.
///
/// Building the filter has no side effects and cannot fail; resolving a
/// category name to an id is the caller's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    q: Option<String>,
    categoria_id: Option<i64>,
    before_id: Option<i64>,
}

impl ProductFilter {
    /// Builds a filter from the raw search string and an already-resolved
    /// category id. `q` is trimmed; an empty or whitespace-only string
    /// disables the text predicate entirely.
    pub fn new(q: Option<&str>, categoria_id: Option<i64>) -> Self {
        let q = q
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        ProductFilter {
            q,
            categoria_id,
            before_id: None,
        }
    }

    /// Adds the keyset bound: only rows with `id < before` qualify. The id
    /// does not need to reference an existing row.
    pub fn before(mut self, before: Option<i64>) -> Self {
        self.before_id = before;
        self
    }

    pub fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }

    pub fn categoria_id(&self) -> Option<i64> {
        self.categoria_id
    }

    pub fn before_id(&self) -> Option<i64> {
        self.before_id
    }

    /// In-memory evaluation of the predicate; the Postgres store renders
    /// the same condition as SQL.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(before) = self.before_id {
            if product.id >= before {
                return false;
            }
        }
        if let Some(categoria_id) = self.categoria_id {
            if product.categoria_id != Some(categoria_id) {
                return false;
            }
        }
        if let Some(q) = &self.q {
            let needle = q.to_lowercase();
            let in_nombre = product.nombre.to_lowercase().contains(&needle);
            let in_descripcion = product
                .descripcion
                .as_deref()
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_nombre && !in_descripcion {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: i64, nombre: &str, descripcion: Option<&str>, categoria_id: Option<i64>) -> Product {
        Product {
            id,
            nombre: nombre.to_string(),
            descripcion: descripcion.map(str::to_string),
            precio: 10.0,
            color: None,
            created_at: Utc::now(),
            categoria_id,
            categoria: None,
            imagenes: None,
            tallas: None,
        }
    }

    #[test]
    fn empty_or_whitespace_search_matches_everything() {
        for raw in [None, Some(""), Some("   ")] {
            let filter = ProductFilter::new(raw, None);
            assert_eq!(filter.q(), None);
            assert!(filter.matches(&product(1, "Remera", None, None)));
        }
    }

    #[test]
    fn search_is_case_insensitive_over_both_fields() {
        let filter = ProductFilter::new(Some("ROJO"), None);
        assert!(filter.matches(&product(1, "Remera roja", Some("color rojo"), None)));
        assert!(filter.matches(&product(2, "Pantalón", Some("Rojo intenso"), None)));
        assert!(filter.matches(&product(3, "Buzo rojo", None, None)));
        assert!(!filter.matches(&product(4, "Campera", Some("azul"), None)));
    }

    #[test]
    fn search_term_is_trimmed() {
        let filter = ProductFilter::new(Some("  gorra  "), None);
        assert_eq!(filter.q(), Some("gorra"));
        assert!(filter.matches(&product(1, "Gorra negra", None, None)));
    }

    #[test]
    fn category_scope_is_anded_with_search() {
        let filter = ProductFilter::new(Some("remera"), Some(7));
        assert!(filter.matches(&product(1, "Remera", None, Some(7))));
        assert!(!filter.matches(&product(2, "Remera", None, Some(8))));
        assert!(!filter.matches(&product(3, "Remera", None, None)));
        assert!(!filter.matches(&product(4, "Buzo", None, Some(7))));
    }

    #[test]
    fn before_bound_is_exclusive() {
        let filter = ProductFilter::new(None, None).before(Some(5));
        assert!(filter.matches(&product(4, "a", None, None)));
        assert!(!filter.matches(&product(5, "a", None, None)));
        assert!(!filter.matches(&product(6, "a", None, None)));
    }
}
