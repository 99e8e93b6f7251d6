use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A product row, optionally hydrated with its owned rows and category.
///
/// Listing endpoints return the bare row; the single-product and legacy
/// category endpoints fill `imagenes`/`tallas` (and `categoria` for the
/// single-product lookup). The hydrated fields are skipped on the wire
/// when absent.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: f64,
    pub color: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoria_id: Option<i64>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categoria: Option<Category>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imagenes: Option<Vec<String>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tallas: Option<Vec<Talla>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub nombre: String,
}

/// One size/stock pair owned by a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Talla {
    pub talla: String,
    #[serde(default)]
    pub stock: i32,
}

/// The `tallas` field of a product payload arrives either as a structured
/// list or as a JSON-encoded string (legacy multipart clients send the
/// latter).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SizePayload {
    Structured(Vec<Talla>),
    RawJson(String),
}

impl SizePayload {
    /// Normalizes to a plain list. A raw string that is not valid JSON
    /// yields an empty list instead of an error, matching the historical
    /// behavior clients depend on.
    pub fn normalize(self) -> Vec<Talla> {
        match self {
            SizePayload::Structured(tallas) => tallas,
            SizePayload::RawJson(raw) => serde_json::from_str(&raw).unwrap_or_default(),
        }
    }
}

/// Request body for product create/update.
#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Option<f64>,
    pub color: Option<String>,
    /// Category id or name; resolved id-first, then by name.
    pub categoria: Option<String>,
    pub imagenes: Option<Vec<String>>,
    pub tallas: Option<SizePayload>,
}

/// Validated internal form of a new product, produced at the boundary.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: f64,
    pub color: Option<String>,
    pub categoria_id: Option<i64>,
    pub imagenes: Vec<String>,
    pub tallas: Vec<Talla>,
}

/// Field changes for an update. `imagenes`/`tallas` of `None` leave the
/// stored sets untouched; `Some` replaces them wholesale.
#[derive(Debug, Clone)]
pub struct ProductChanges {
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: f64,
    pub color: Option<String>,
    pub categoria_id: Option<i64>,
    pub imagenes: Option<Vec<String>>,
    pub tallas: Option<Vec<Talla>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn talla(nombre: &str, stock: i32) -> Talla {
        Talla {
            talla: nombre.to_string(),
            stock,
        }
    }

    #[test]
    fn size_payload_structured_list_passes_through() {
        let payload: SizePayload =
            serde_json::from_str(r#"[{"talla":"M","stock":3},{"talla":"L","stock":0}]"#).unwrap();
        assert_eq!(payload.normalize(), vec![talla("M", 3), talla("L", 0)]);
    }

    #[test]
    fn size_payload_raw_json_string_is_parsed() {
        let payload: SizePayload =
            serde_json::from_str(r#""[{\"talla\":\"S\",\"stock\":7}]""#).unwrap();
        assert_eq!(payload.normalize(), vec![talla("S", 7)]);
    }

    #[test]
    fn size_payload_invalid_raw_json_becomes_empty_list() {
        let payload: SizePayload = serde_json::from_str(r#""not json at all""#).unwrap();
        assert_eq!(payload.normalize(), Vec::<Talla>::new());
    }

    #[test]
    fn talla_stock_defaults_to_zero() {
        let t: Talla = serde_json::from_str(r#"{"talla":"XL"}"#).unwrap();
        assert_eq!(t.stock, 0);
    }

    #[test]
    fn product_serializes_created_at_as_camel_case() {
        let p = Product {
            id: 1,
            nombre: "remera".into(),
            descripcion: None,
            precio: 10.0,
            color: None,
            created_at: Utc::now(),
            categoria_id: None,
            categoria: None,
            imagenes: None,
            tallas: None,
        };
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("imagenes").is_none());
    }
}
