//! Static, file-backed taxonomy resolver

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, instrument};

use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::{CategoryMeta, FileSystem, TaxonomyResolver};

/// In-memory taxonomy: category key -> display name.
///
/// File format is a flat JSON object, e.g. `{"bluekai:671901": "Auto Intenders"}`.
#[derive(Debug, Clone, Default)]
pub struct StaticTaxonomy {
    names: HashMap<String, String>,
}

impl StaticTaxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, key: impl Into<String>, name: impl Into<String>) -> Self {
        self.names.insert(key.into(), name.into());
        self
    }

    #[instrument(level = "debug", skip(fs))]
    pub fn load(fs: &dyn FileSystem, path: &Path) -> InfraResult<Self> {
        let content = fs
            .read_to_string(path)
            .map_err(|e| InfraError::io(format!("read taxonomy {}", path.display()), e))?;
        let names: HashMap<String, String> =
            serde_json::from_str(&content).map_err(|e| InfraError::Taxonomy {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        debug!("taxonomy: {} categories from {}", names.len(), path.display());
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl TaxonomyResolver for StaticTaxonomy {
    fn resolve_category(&self, category_key: &str) -> Option<CategoryMeta> {
        self.names.get(category_key).map(|name| CategoryMeta { name: name.clone() })
    }
}
