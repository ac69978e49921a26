//! Bounds of the editable grammar, injected into parser and mutations.

use serde::{Deserialize, Serialize};

/// Shape limits of the restricted, editor-authorable grammar.
///
/// Passed explicitly to `is_editable` and the mutation functions instead of
/// being read from ambient constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GrammarConfig {
    /// Maximum number of `OR` inclusion groups under the root `AND`
    pub max_inclusion_groups: usize,
    /// Maximum number of `NOT` exclusion groups under the root `AND`
    pub max_exclusion_groups: usize,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            max_inclusion_groups: 2,
            max_exclusion_groups: 1,
        }
    }
}
