//! Domain entities: owning entity settings and descriptive targeting info

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Settings of an owning entity (e.g. an ad group).
///
/// Only the targeting expression is interpreted; every other field is kept
/// verbatim so a load/save cycle does not drop data written by other tools.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EntitySettings {
    /// Opaque identifier; numeric, string or absent
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Persisted expression, `None`/`null` when targeting was never set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience_targeting: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntitySettings {
    pub fn new(id: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_targeting(mut self, expression: Value) -> Self {
        self.audience_targeting = Some(expression);
        self
    }

    /// The id for log and terminal output: strings unquoted, `-` when absent.
    pub fn display_id(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            Value::Null => "-".to_string(),
            other => other.to_string(),
        }
    }

    /// The persisted expression with absent and `null` unified.
    pub fn targeting(&self) -> &Value {
        self.audience_targeting.as_ref().unwrap_or(&Value::Null)
    }
}

/// Display metadata of one category leaf.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryInfo {
    pub key: String,
    /// `None` while the taxonomy cannot resolve the key
    pub name: Option<String>,
}

/// Occupancy of one editable group.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GroupInfo {
    pub categories: Vec<String>,
}

impl GroupInfo {
    pub fn count(&self) -> usize {
        self.categories.len()
    }
}

/// Descriptive data for the view, rebuilt from the tree on demand.
///
/// Not load-bearing for the grammar: a tree with unresolved names behaves
/// exactly like a fully resolved one.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct TargetingInfo {
    /// Distinct categories in depth-first order
    pub categories: Vec<CategoryInfo>,
    /// Inclusion groups in order; empty for read-only trees
    pub inclusion: Vec<GroupInfo>,
    pub exclusion: Option<GroupInfo>,
    pub unresolved: usize,
}

impl TargetingInfo {
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn name_of(&self, key: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.key == key)
            .and_then(|c| c.name.as_deref())
    }
}
