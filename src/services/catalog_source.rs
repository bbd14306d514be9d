//! Catalog snapshot sources
//!
//! The catalog is produced by an upstream preprocessing step and loaded
//! wholesale once per process. Sources only read; they never clean or
//! reorder records.

use std::path::PathBuf;

use crate::{
    error::{AppError, AppResult},
    models::CatalogItem,
};

/// Trait for anything that can hand over a complete catalog snapshot
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Loads every catalog record in its stored order
    async fn load(&self) -> AppResult<Vec<CatalogItem>>;

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Reads the preprocessed catalog from a JSON array on disk
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl CatalogSource for JsonFileCatalog {
    async fn load(&self) -> AppResult<Vec<CatalogItem>> {
        tracing::info!(path = %self.path.display(), "Loading catalog");

        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            AppError::CatalogLoad(format!("cannot read {}: {}", self.path.display(), e))
        })?;

        let items: Vec<CatalogItem> = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::CatalogLoad(format!("malformed catalog {}: {}", self.path.display(), e))
        })?;

        tracing::info!(items = items.len(), "Catalog loaded");

        Ok(items)
    }

    fn name(&self) -> &'static str {
        "json_file"
    }
}
