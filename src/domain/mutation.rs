//! Grammar-preserving edits on an editable expression tree.
//!
//! Every function assumes the tree is in the editable grammar (or empty) and
//! keeps it there: inclusion groups are `OR` nodes under the root `AND`, the
//! exclusion group is a `NOT` wrapping a single `OR`.

use tracing::{debug, instrument};

use crate::domain::arena::{ExpressionTree, NodeId, NodeKind};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::grammar::GrammarConfig;

/// Create the root `AND` with a first, empty inclusion group.
///
/// Returns the root; an existing root is returned untouched.
#[instrument(level = "debug", skip(tree))]
pub fn enable_targeting(tree: &mut ExpressionTree) -> DomainResult<NodeId> {
    if let Some(root) = tree.root() {
        return Ok(root);
    }
    let root = tree.create_node(NodeKind::And);
    tree.set_root(root)?;
    let group = tree.create_node(NodeKind::Or);
    tree.append_child(root, group)?;
    debug!("enable_targeting: created root with one inclusion group");
    Ok(root)
}

/// `true` while the root holds fewer `OR` children than the grammar allows.
pub fn can_add_inclusion(tree: &ExpressionTree, root: NodeId, grammar: &GrammarConfig) -> bool {
    count_children(tree, root, &NodeKind::Or) < grammar.max_inclusion_groups
}

/// `true` while the root holds fewer `NOT` children than the grammar allows.
pub fn can_add_exclusion(tree: &ExpressionTree, root: NodeId, grammar: &GrammarConfig) -> bool {
    count_children(tree, root, &NodeKind::Not) < grammar.max_exclusion_groups
}

/// Append an empty `OR` inclusion group to the root.
///
/// Rejected with `GroupLimitReached` when [`can_add_inclusion`] is false.
#[instrument(level = "debug", skip(tree))]
pub fn add_inclusion_group(
    tree: &mut ExpressionTree,
    root: NodeId,
    grammar: &GrammarConfig,
) -> DomainResult<NodeId> {
    expect_kind(tree, root, &NodeKind::And, "add_inclusion_group")?;
    if !can_add_inclusion(tree, root, grammar) {
        return Err(DomainError::GroupLimitReached {
            group: "inclusion",
            limit: grammar.max_inclusion_groups,
        });
    }
    let group = tree.create_node(NodeKind::Or);
    tree.append_child(root, group)?;
    Ok(group)
}

/// Append a `NOT` exclusion group wrapping an empty `OR`.
///
/// Returns the inner `OR`, which is where categories go.
#[instrument(level = "debug", skip(tree))]
pub fn add_exclusion_group(
    tree: &mut ExpressionTree,
    root: NodeId,
    grammar: &GrammarConfig,
) -> DomainResult<NodeId> {
    expect_kind(tree, root, &NodeKind::And, "add_exclusion_group")?;
    if !can_add_exclusion(tree, root, grammar) {
        return Err(DomainError::GroupLimitReached {
            group: "exclusion",
            limit: grammar.max_exclusion_groups,
        });
    }
    let not = tree.create_node(NodeKind::Not);
    tree.append_child(root, not)?;
    let group = tree.create_node(NodeKind::Or);
    tree.append_child(not, group)?;
    Ok(group)
}

/// Append a category leaf to an `OR` group.
///
/// A key already present in the group is not duplicated; its leaf is returned.
#[instrument(level = "debug", skip(tree))]
pub fn add_category(
    tree: &mut ExpressionTree,
    group: NodeId,
    category_key: &str,
) -> DomainResult<NodeId> {
    expect_kind(tree, group, &NodeKind::Or, "add_category")?;
    if let Some(existing) = find_category(tree, group, category_key) {
        debug!("add_category: {} already in group", category_key);
        return Ok(existing);
    }
    let leaf = tree.create_node(NodeKind::Category(category_key.to_string()));
    tree.append_child(group, leaf)?;
    Ok(leaf)
}

/// Remove a category leaf from an `OR` group.
///
/// Returns `false` when the key is not in the group. A group emptied this way
/// stays in place.
#[instrument(level = "debug", skip(tree))]
pub fn remove_category(
    tree: &mut ExpressionTree,
    group: NodeId,
    category_key: &str,
) -> DomainResult<bool> {
    expect_kind(tree, group, &NodeKind::Or, "remove_category")?;
    match find_category(tree, group, category_key) {
        Some(leaf) => tree.remove_child(group, leaf),
        None => Ok(false),
    }
}

/// Remove a whole group on explicit request of the view.
///
/// `group` is an inclusion `OR` or the `OR` of the exclusion group; for the
/// latter the enclosing `NOT` goes too.
#[instrument(level = "debug", skip(tree))]
pub fn remove_group(tree: &mut ExpressionTree, group: NodeId) -> DomainResult<bool> {
    expect_kind(tree, group, &NodeKind::Or, "remove_group")?;
    let Some(parent) = tree.node(group)?.parent else {
        return Ok(false);
    };
    if !matches!(tree.kind(parent)?, NodeKind::Not) {
        return tree.remove_child(parent, group);
    }
    match tree.node(parent)?.parent {
        Some(root) => tree.remove_child(root, parent),
        None => Ok(false),
    }
}

/// `true` when some group holds at least one category.
pub fn is_enabled(tree: &ExpressionTree) -> bool {
    tree.root().is_some()
        && inclusion_groups(tree)
            .into_iter()
            .chain(exclusion_group(tree))
            .any(|group| !tree.children(group).is_empty())
}

/// Inclusion `OR` groups directly under the root, in order.
pub fn inclusion_groups(tree: &ExpressionTree) -> Vec<NodeId> {
    let Some(root) = tree.root() else {
        return Vec::new();
    };
    tree.children(root)
        .iter()
        .copied()
        .filter(|&c| matches!(tree.kind(c), Ok(NodeKind::Or)))
        .collect()
}

/// The `OR` wrapped by the root's first `NOT`, if any.
pub fn exclusion_group(tree: &ExpressionTree) -> Option<NodeId> {
    let root = tree.root()?;
    tree.children(root)
        .iter()
        .find(|&&c| matches!(tree.kind(c), Ok(NodeKind::Not)))
        .and_then(|&not| tree.children(not).first().copied())
        .filter(|&inner| matches!(tree.kind(inner), Ok(NodeKind::Or)))
}

/// Category keys of a group in order.
pub fn group_categories(tree: &ExpressionTree, group: NodeId) -> Vec<&str> {
    tree.children(group)
        .iter()
        .filter_map(|&c| tree.get_node(c).and_then(|n| n.kind.category_key()))
        .collect()
}

fn find_category(tree: &ExpressionTree, group: NodeId, category_key: &str) -> Option<NodeId> {
    tree.children(group)
        .iter()
        .copied()
        .find(|&c| matches!(tree.kind(c), Ok(NodeKind::Category(key)) if key == category_key))
}

fn count_children(tree: &ExpressionTree, parent: NodeId, kind: &NodeKind) -> usize {
    tree.children(parent)
        .iter()
        .filter(|&&c| tree.kind(c).map(|k| k == kind).unwrap_or(false))
        .count()
}

fn expect_kind(
    tree: &ExpressionTree,
    id: NodeId,
    expected: &NodeKind,
    operation: &'static str,
) -> DomainResult<()> {
    let found = tree.kind(id)?;
    if found != expected {
        return Err(DomainError::InvalidNodeKind {
            operation,
            expected: expected.tag(),
            found: found.tag(),
        });
    }
    Ok(())
}
