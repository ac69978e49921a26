//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/audtarget/audtarget.toml`
//! 3. Local config: `<dir>/.audtarget.toml`
//! 4. Environment variables: `AUDTARGET_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::GrammarConfig;
use crate::util::path::expand_env_vars;

/// Raw grammar bounds for intermediate parsing (`None` → not specified).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawGrammarConfig {
    pub max_inclusion_groups: Option<usize>,
    pub max_exclusion_groups: Option<usize>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub provider: Option<String>,
    pub taxonomy_file: Option<PathBuf>,
    #[serde(default)]
    pub grammar: RawGrammarConfig,
}

/// Unified configuration for audtarget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Taxonomy provider prefixed to bare category ids (`<provider>:<id>`)
    pub provider: String,
    /// JSON file mapping category keys to display names
    pub taxonomy_file: Option<PathBuf>,
    /// Bounds of the editable grammar
    pub grammar: GrammarConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: "bluekai".into(),
            taxonomy_file: None,
            grammar: GrammarConfig::default(),
        }
    }
}

/// Get the XDG config directory for audtarget.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "audtarget").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("audtarget.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".audtarget.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Build a category key, prefixing bare ids with the configured provider.
    ///
    /// `"671901"` → `"bluekai:671901"`; keys that already carry a provider
    /// are returned unchanged.
    pub fn category_key(&self, id_or_key: &str) -> String {
        if id_or_key.contains(':') {
            id_or_key.to_string()
        } else {
            format!("{}:{}", self.provider, id_or_key)
        }
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(path) = &self.taxonomy_file {
            let expanded = expand_env_vars(path.to_string_lossy().as_ref());
            self.taxonomy_file = Some(PathBuf::from(expanded));
        }
    }

    /// Merge overlay config onto self (base): overlay wins where specified.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            provider: overlay
                .provider
                .clone()
                .unwrap_or_else(|| self.provider.clone()),
            taxonomy_file: overlay
                .taxonomy_file
                .clone()
                .or_else(|| self.taxonomy_file.clone()),
            grammar: GrammarConfig {
                max_inclusion_groups: overlay
                    .grammar
                    .max_inclusion_groups
                    .unwrap_or(self.grammar.max_inclusion_groups),
                max_exclusion_groups: overlay
                    .grammar
                    .max_exclusion_groups
                    .unwrap_or(self.grammar.max_exclusion_groups),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.audtarget.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/audtarget/audtarget.toml`
    /// 3. Local config: `<local_dir>/.audtarget.toml`
    /// 4. Environment variables: `AUDTARGET_*` prefix
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply AUDTARGET_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let builder = Config::builder().add_source(
            Environment::with_prefix("AUDTARGET")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("provider") {
            settings.provider = val;
        }
        if let Ok(val) = config.get_string("taxonomy_file") {
            settings.taxonomy_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get::<usize>("grammar.max_inclusion_groups") {
            settings.grammar.max_inclusion_groups = val;
        }
        if let Ok(val) = config.get::<usize>("grammar.max_exclusion_groups") {
            settings.grammar.max_exclusion_groups = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# audtarget configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/audtarget/audtarget.toml
#   Local:  ./.audtarget.toml
#   Env:    AUDTARGET_* environment variables (nested keys use "__",
#           e.g. AUDTARGET_GRAMMAR__MAX_INCLUSION_GROUPS=2)

# Taxonomy provider prefixed to bare category ids ("671901" -> "bluekai:671901")
# provider = "bluekai"

# JSON object mapping category keys to display names
# taxonomy_file = "~/.config/audtarget/taxonomy.json"

[grammar]
# Inclusion (OR) groups the editor may author under the root AND
# max_inclusion_groups = 2

# Exclusion (NOT -> OR) groups the editor may author under the root AND
# max_exclusion_groups = 1
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings = Settings::load(None).expect("load defaults");
        assert!(!settings.provider.is_empty());
        assert_eq!(settings.grammar.max_exclusion_groups, 1);
    }

    #[test]
    fn given_bare_id_when_building_category_key_then_prefixes_provider() {
        let settings = Settings::default();
        assert_eq!(settings.category_key("671901"), "bluekai:671901");
        assert_eq!(settings.category_key("lotame:42"), "lotame:42");
    }

    #[test]
    fn given_partial_overlay_when_merging_then_keeps_base_values() {
        let raw: RawSettings = toml::from_str(
            r#"
[grammar]
max_inclusion_groups = 3
"#,
        )
        .unwrap();
        let merged = Settings::default().merge_with(&raw);
        assert_eq!(merged.grammar.max_inclusion_groups, 3);
        assert_eq!(merged.grammar.max_exclusion_groups, 1);
        assert_eq!(merged.provider, "bluekai");
    }

    #[test]
    fn given_tilde_in_taxonomy_file_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            taxonomy_file: Some(PathBuf::from("~/taxonomy.json")),
            ..Settings::default()
        };
        settings.expand_paths();
        let path = settings.taxonomy_file.unwrap();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.to_string_lossy().ends_with("taxonomy.json"));
    }

    #[test]
    fn given_template_when_parsing_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("valid template");
        assert!(raw.provider.is_none());
    }
}
