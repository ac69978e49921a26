//! Parser and editability validator for serialized expressions.
//!
//! The persisted format is a nested JSON structure where every node is an
//! object with exactly one key:
//!
//! ```text
//! {"and": [..]}  {"or": [..]}  {"not": [..]}  {"category": "<provider>:<id>"}
//! ```
//!
//! Parsing only checks that shape. Whether the tree also fits the restricted
//! grammar the editor can author is a separate question answered by
//! [`is_editable`].

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::domain::arena::{ExpressionTree, NodeId, NodeKind};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::grammar::GrammarConfig;

/// Parse a serialized expression into a tree.
///
/// `null` yields an empty tree (no root).
#[instrument(level = "debug", skip(serialized))]
pub fn parse(serialized: &Value) -> DomainResult<ExpressionTree> {
    let mut tree = ExpressionTree::new();
    if serialized.is_null() {
        debug!("parse: absent expression, empty tree");
        return Ok(tree);
    }
    let root = parse_node(&mut tree, serialized, "")?;
    tree.set_root(root)?;
    debug!("parse: {} nodes, depth {}", tree.len(), tree.depth());
    Ok(tree)
}

fn parse_node(tree: &mut ExpressionTree, value: &Value, path: &str) -> DomainResult<NodeId> {
    let object = value.as_object().ok_or_else(|| {
        DomainError::malformed(path, format!("expected object, found {}", json_type(value)))
    })?;
    let (key, body) = single_entry(object, path)?;
    let path = format!("{}/{}", path, key);

    let kind = match key.as_str() {
        "and" => NodeKind::And,
        "or" => NodeKind::Or,
        "not" => NodeKind::Not,
        "category" => {
            let category = body.as_str().ok_or_else(|| {
                DomainError::malformed(
                    &path,
                    format!("category must be a string, found {}", json_type(body)),
                )
            })?;
            if category.is_empty() {
                return Err(DomainError::malformed(&path, "empty category key"));
            }
            return Ok(tree.create_node(NodeKind::Category(category.to_string())));
        }
        other => return Err(DomainError::malformed(&path, format!("unknown key '{}'", other))),
    };

    let items = body.as_array().ok_or_else(|| {
        DomainError::malformed(
            &path,
            format!("'{}' must hold an array, found {}", key, json_type(body)),
        )
    })?;
    let id = tree.create_node(kind);
    for (i, item) in items.iter().enumerate() {
        let child = parse_node(tree, item, &format!("{}/{}", path, i))?;
        tree.append_child(id, child)?;
    }
    Ok(id)
}

fn single_entry<'a>(
    object: &'a Map<String, Value>,
    path: &str,
) -> DomainResult<(&'a String, &'a Value)> {
    let mut entries = object.iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Ok(entry),
        (None, _) => Err(DomainError::malformed(path, "node has no key")),
        (Some(_), Some(_)) => {
            let keys: Vec<&str> = object.keys().map(String::as_str).collect();
            Err(DomainError::malformed(
                path,
                format!("node has more than one key: {}", keys.join(", ")),
            ))
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Check whether a tree fits the restricted grammar the editor can author.
///
/// Accepted shape: a root `AND` whose children are at most
/// `max_inclusion_groups` `OR` nodes and at most `max_exclusion_groups` `NOT`
/// nodes. Every `OR` holds only categories; every `NOT` holds exactly one
/// such `OR`. The empty tree is accepted.
#[instrument(level = "debug", skip(tree))]
pub fn is_editable(tree: &ExpressionTree, grammar: &GrammarConfig) -> bool {
    let Some(root) = tree.root() else {
        return true;
    };
    if !matches!(tree.kind(root), Ok(NodeKind::And)) {
        debug!("is_editable: root is not AND");
        return false;
    }

    let mut inclusions = 0;
    let mut exclusions = 0;
    for &child in tree.children(root) {
        let ok = match tree.kind(child) {
            Ok(NodeKind::Or) => {
                inclusions += 1;
                is_category_group(tree, child)
            }
            Ok(NodeKind::Not) => {
                exclusions += 1;
                matches!(tree.children(child), [only] if is_category_group(tree, *only))
            }
            _ => false,
        };
        if !ok {
            debug!("is_editable: unsupported group shape under root");
            return false;
        }
    }

    inclusions <= grammar.max_inclusion_groups && exclusions <= grammar.max_exclusion_groups
}

/// `OR` node whose children are all categories.
fn is_category_group(tree: &ExpressionTree, id: NodeId) -> bool {
    matches!(tree.kind(id), Ok(NodeKind::Or))
        && tree
            .children(id)
            .iter()
            .all(|&c| tree.kind(c).map(NodeKind::is_leaf).unwrap_or(false))
}
