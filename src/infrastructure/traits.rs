//! I/O boundary traits for testability
//!
//! These traits abstract external collaborators (filesystem, taxonomy
//! lookup), allowing services to be tested with in-memory implementations.

use std::io;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace file content.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;
}

/// Display metadata the taxonomy provides for a category key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMeta {
    pub name: String,
}

/// Resolves category keys (`<provider>:<id>`) to display metadata.
///
/// Lookups are treated as already-available data; a `None` answer only
/// leaves a name unresolved and never affects the expression grammar.
pub trait TaxonomyResolver: Send + Sync {
    fn resolve_category(&self, category_key: &str) -> Option<CategoryMeta>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    /// Write via a temp file in the same directory, then rename over `path`.
    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Resolver used when no taxonomy is configured: nothing resolves.
#[derive(Debug, Default)]
pub struct NoTaxonomy;

impl TaxonomyResolver for NoTaxonomy {
    fn resolve_category(&self, _category_key: &str) -> Option<CategoryMeta> {
        None
    }
}
