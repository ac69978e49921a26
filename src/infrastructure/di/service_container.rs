//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::TargetingService;
use crate::config::Settings;
use crate::infrastructure::error::InfraResult;
use crate::infrastructure::taxonomy::StaticTaxonomy;
use crate::infrastructure::traits::{FileSystem, NoTaxonomy, RealFileSystem, TaxonomyResolver};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Category name lookup
    pub taxonomy: Arc<dyn TaxonomyResolver>,

    pub targeting: TargetingService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    ///
    /// Loads the configured taxonomy file, if any.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let taxonomy: Arc<dyn TaxonomyResolver> = match &settings.taxonomy_file {
            Some(path) => {
                let taxonomy = StaticTaxonomy::load(fs.as_ref(), path)?;
                debug!("taxonomy loaded: {} categories", taxonomy.len());
                Arc::new(taxonomy)
            }
            None => Arc::new(NoTaxonomy),
        };
        Ok(Self::with_deps(settings, fs, taxonomy))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        taxonomy: Arc<dyn TaxonomyResolver>,
    ) -> Self {
        let settings = Arc::new(settings);
        let targeting =
            TargetingService::new(Arc::clone(&fs), Arc::clone(&taxonomy), settings.grammar);

        Self {
            settings,
            fs,
            taxonomy,
            targeting,
        }
    }
}
