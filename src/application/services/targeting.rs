//! Targeting service
//!
//! Loads owning-entity settings files, opens editor sessions on them and
//! writes edited expressions back.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationResult, EditorSession, IoResultExt};
use crate::domain::{EntitySettings, GrammarConfig};
use crate::infrastructure::traits::{FileSystem, TaxonomyResolver};

/// Service for editing the targeting expression stored in a settings file.
pub struct TargetingService {
    fs: Arc<dyn FileSystem>,
    resolver: Arc<dyn TaxonomyResolver>,
    grammar: GrammarConfig,
}

impl TargetingService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        resolver: Arc<dyn TaxonomyResolver>,
        grammar: GrammarConfig,
    ) -> Self {
        Self {
            fs,
            resolver,
            grammar,
        }
    }

    /// Read and deserialize an entity settings JSON file.
    #[instrument(level = "debug", skip(self))]
    pub fn load_settings(&self, path: &Path) -> ApplicationResult<EntitySettings> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read settings", path)?;
        let settings: EntitySettings =
            serde_json::from_str(&content).with_path_context("parse settings", path)?;
        debug!("load_settings: entity {}", settings.display_id());
        Ok(settings)
    }

    /// Load settings and return an initialized editor session.
    ///
    /// Fails when the stored expression is malformed.
    pub fn open_session(&self, path: &Path) -> ApplicationResult<EditorSession> {
        let settings = self.load_settings(path)?;
        let mut session =
            EditorSession::create_instance(settings, self.grammar, Arc::clone(&self.resolver));
        session.initialize()?;
        Ok(session)
    }

    /// Serialize the session's tree into its entity settings and write them.
    #[instrument(level = "debug", skip(self, session))]
    pub fn save_session(&self, path: &Path, session: &EditorSession) -> ApplicationResult<()> {
        let settings = session.to_settings();
        let mut content =
            serde_json::to_string_pretty(&settings).with_path_context("serialize settings", path)?;
        content.push('\n');
        self.fs
            .write(path, &content)
            .with_path_context("write settings", path)?;
        debug!("save_session: wrote entity {}", settings.display_id());
        Ok(())
    }
}
