use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::{domain::Product, errors::ServiceError};

#[derive(Debug, Deserialize)]
struct MenuDocument {
    products: Vec<Product>,
}

/// Read-only menu catalog, loaded once at startup from a static JSON document.
///
/// The cart subsystem never writes to it; products are handed out by value.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Loads the catalog from a `{"products": [...]}` document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            ServiceError::InternalError(format!("failed to read catalog {}: {e}", path.display()))
        })?;
        let catalog = Self::from_json(&raw)?;
        info!(
            products = catalog.products.len(),
            path = %path.display(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, ServiceError> {
        let doc: MenuDocument = serde_json::from_str(raw)
            .map_err(|e| ServiceError::InternalError(format!("invalid catalog document: {e}")))?;
        Ok(Self {
            products: doc.products,
        })
    }

    pub fn from_products(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn all(&self) -> &[Product] {
        &self.products
    }

    pub fn by_category(&self, category: &str) -> Vec<Product> {
        self.products
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }
}
