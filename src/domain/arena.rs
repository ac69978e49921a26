use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};

/// Stable identity of a node inside one [`ExpressionTree`].
///
/// Backed by a generational index: once a node is removed its id never
/// resolves again, even if the slot is reused.
pub type NodeId = Index;

/// Closed set of expression node kinds.
///
/// The category key lives in the `Category` variant, so a key exists
/// exactly when the node is a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    And,
    Or,
    Not,
    Category(String),
}

impl NodeKind {
    /// Serialized key of this kind (`and`, `or`, `not`, `category`).
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::And => "and",
            NodeKind::Or => "or",
            NodeKind::Not => "not",
            NodeKind::Category(_) => "category",
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeKind::Category(_))
    }

    pub fn category_key(&self) -> Option<&str> {
        match self {
            NodeKind::Category(key) => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Category(key) => write!(f, "CATEGORY {}", key),
            other => write!(f, "{}", other.tag().to_uppercase()),
        }
    }
}

/// Tree node in the arena-based expression structure.
#[derive(Debug, Clone)]
pub struct ExpressionNode {
    pub kind: NodeKind,
    /// Human readable category name, filled lazily from the taxonomy
    pub display_name: Option<String>,
    /// Navigation aid only, the parent owns the child via `children`
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl ExpressionNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            display_name: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Arena-based boolean expression tree.
///
/// Each tree is exclusively owned by one editor session; nodes are never
/// shared between trees.
#[derive(Debug, Clone, Default)]
pub struct ExpressionTree {
    arena: Arena<ExpressionNode>,
    root: Option<NodeId>,
}

impl ExpressionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new, parentless node with a fresh identity.
    #[instrument(level = "trace", skip(self))]
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        self.arena.insert(ExpressionNode::new(kind))
    }

    /// Make a parentless node the root of this tree.
    ///
    /// Any previous root subtree is released.
    #[instrument(level = "trace", skip(self))]
    pub fn set_root(&mut self, id: NodeId) -> DomainResult<()> {
        let node = self.node(id)?;
        if node.parent.is_some() {
            return Err(DomainError::NodeAlreadyAttached(id));
        }
        if let Some(old) = self.root.replace(id) {
            if old != id {
                self.release_subtree(old);
            }
        }
        Ok(())
    }

    /// Append `child` to the end of `parent`'s children.
    #[instrument(level = "trace", skip(self))]
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomainResult<()> {
        let parent_node = self.node(parent)?;
        if parent_node.kind.is_leaf() {
            return Err(DomainError::InvalidNodeKind {
                operation: "append_child",
                expected: "and, or or not",
                found: parent_node.kind.tag(),
            });
        }
        let child_node = self.node(child)?;
        if child_node.parent.is_some() || self.root == Some(child) {
            return Err(DomainError::NodeAlreadyAttached(child));
        }
        if self.ancestors_of(parent).any(|id| id == child) {
            return Err(DomainError::WouldCreateCycle(child));
        }

        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.push(child);
        }
        Ok(())
    }

    /// Remove `child` from `parent` and release its subtree.
    ///
    /// Removal is by identity. Returns `false` and leaves the tree untouched
    /// when `child` is not a child of `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomainResult<bool> {
        let parent_node = self
            .arena
            .get_mut(parent)
            .ok_or(DomainError::NodeNotFound(parent))?;
        let Some(pos) = parent_node.children.iter().position(|&c| c == child) else {
            return Ok(false);
        };
        parent_node.children.remove(pos);
        self.release_subtree(child);
        Ok(true)
    }

    /// `id` itself followed by its parent chain up to a parentless node.
    fn ancestors_of(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&current| {
            self.get_node(current).and_then(|n| n.parent)
        })
    }

    fn release_subtree(&mut self, id: NodeId) {
        let doomed: Vec<NodeId> = self.iter_postorder_from(id).map(|(idx, _)| idx).collect();
        for idx in doomed {
            self.arena.remove(idx);
        }
    }

    pub fn get_node(&self, id: NodeId) -> Option<&ExpressionNode> {
        self.arena.get(id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut ExpressionNode> {
        self.arena.get_mut(id)
    }

    /// Like [`get_node`](Self::get_node) but with a `NodeNotFound` error.
    pub fn node(&self, id: NodeId) -> DomainResult<&ExpressionNode> {
        self.arena.get(id).ok_or(DomainError::NodeNotFound(id))
    }

    pub fn kind(&self, id: NodeId) -> DomainResult<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of live nodes, detached ones included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Depth-first, pre-order walk from the root.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, self.root)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, self.root)
    }

    fn iter_postorder_from(&self, start: NodeId) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, Some(start))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        if let Some(root) = self.root {
            self.calculate_depth(root)
        } else {
            0
        }
    }

    fn calculate_depth(&self, node_idx: NodeId) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Category keys of all leaves in depth-first order.
    pub fn category_keys(&self) -> Vec<String> {
        self.iter()
            .filter_map(|(_, node)| node.kind.category_key().map(str::to_string))
            .collect()
    }

    /// Compare shape with another tree: kinds, child order and category keys.
    ///
    /// Node ids and display names are ignored.
    pub fn structurally_equal(&self, other: &ExpressionTree) -> bool {
        match (self.root, other.root) {
            (None, None) => true,
            (Some(a), Some(b)) => self.subtree_equal(a, other, b),
            _ => false,
        }
    }

    fn subtree_equal(&self, a: NodeId, other: &ExpressionTree, b: NodeId) -> bool {
        match (self.get_node(a), other.get_node(b)) {
            (Some(left), Some(right)) => {
                left.kind == right.kind
                    && left.children.len() == right.children.len()
                    && left
                        .children
                        .iter()
                        .zip(&right.children)
                        .all(|(&l, &r)| self.subtree_equal(l, other, r))
            }
            _ => false,
        }
    }
}

pub struct TreeIterator<'a> {
    tree: &'a ExpressionTree,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a ExpressionTree, start: Option<NodeId>) -> Self {
        Self {
            tree,
            stack: start.into_iter().collect(),
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeId, &'a ExpressionNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev());
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a ExpressionTree,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a ExpressionTree, start: Option<NodeId>) -> Self {
        Self {
            tree,
            stack: start.map(|idx| (idx, false)).into_iter().collect(),
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (NodeId, &'a ExpressionNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //      and
    //     /   \
    //    or   not
    //    |     |
    //  p:1    or
    //          |
    //         p:2
    fn sample() -> (ExpressionTree, NodeId, NodeId) {
        let mut tree = ExpressionTree::new();
        let root = tree.create_node(NodeKind::And);
        tree.set_root(root).unwrap();
        let or = tree.create_node(NodeKind::Or);
        tree.append_child(root, or).unwrap();
        let leaf = tree.create_node(NodeKind::Category("p:1".into()));
        tree.append_child(or, leaf).unwrap();
        let not = tree.create_node(NodeKind::Not);
        tree.append_child(root, not).unwrap();
        let excl = tree.create_node(NodeKind::Or);
        tree.append_child(not, excl).unwrap();
        let leaf2 = tree.create_node(NodeKind::Category("p:2".into()));
        tree.append_child(excl, leaf2).unwrap();
        (tree, root, not)
    }

    #[test]
    fn test_iter_is_preorder_left_to_right() {
        let (tree, _, _) = sample();
        let tags: Vec<&str> = tree.iter().map(|(_, n)| n.kind.tag()).collect();
        assert_eq!(tags, vec!["and", "or", "category", "not", "or", "category"]);
    }

    #[test]
    fn test_iter_postorder_visits_root_last() {
        let (tree, root, _) = sample();
        let order: Vec<NodeId> = tree.iter_postorder().map(|(idx, _)| idx).collect();
        assert_eq!(order.len(), 6);
        assert_eq!(order.last(), Some(&root));
    }

    #[test]
    fn test_depth_and_category_keys() {
        let (tree, _, _) = sample();
        assert_eq!(tree.depth(), 4);
        assert_eq!(tree.category_keys(), vec!["p:1", "p:2"]);
        assert_eq!(ExpressionTree::new().depth(), 0);
    }

    #[test]
    fn test_append_child_to_category_fails() {
        let mut tree = ExpressionTree::new();
        let leaf = tree.create_node(NodeKind::Category("p:1".into()));
        let other = tree.create_node(NodeKind::Or);
        let err = tree.append_child(leaf, other).unwrap_err();
        assert!(matches!(err, DomainError::InvalidNodeKind { found: "category", .. }));
    }

    #[test]
    fn test_append_attached_child_fails() {
        let (mut tree, root, not) = sample();
        assert_eq!(
            tree.append_child(root, not),
            Err(DomainError::NodeAlreadyAttached(not))
        );
    }

    #[test]
    fn test_append_ancestor_as_child_fails() {
        let mut tree = ExpressionTree::new();
        let a = tree.create_node(NodeKind::Or);
        let b = tree.create_node(NodeKind::Or);
        tree.append_child(a, b).unwrap();
        let c = tree.create_node(NodeKind::And);
        tree.append_child(b, c).unwrap();

        assert_eq!(tree.append_child(b, a), Err(DomainError::WouldCreateCycle(a)));
        assert_eq!(tree.append_child(c, a), Err(DomainError::WouldCreateCycle(a)));
        assert_eq!(tree.append_child(a, a), Err(DomainError::WouldCreateCycle(a)));
        assert!(tree.get_node(a).unwrap().parent.is_none());
        assert_eq!(tree.children(c).len(), 0);
        assert_eq!(tree.iter_postorder_from(a).count(), 3);
    }

    #[test]
    fn test_remove_child_releases_subtree_and_never_reuses_ids() {
        let (mut tree, root, not) = sample();
        assert!(tree.remove_child(root, not).unwrap());
        assert_eq!(tree.len(), 3);
        assert!(tree.get_node(not).is_none());

        let fresh = tree.create_node(NodeKind::Not);
        assert_ne!(fresh, not);
        assert!(tree.get_node(not).is_none());
    }

    #[test]
    fn test_remove_absent_child_is_noop() {
        let (mut tree, root, _) = sample();
        let stray = tree.create_node(NodeKind::Or);
        assert!(!tree.remove_child(root, stray).unwrap());
        assert_eq!(tree.children(root).len(), 2);
    }

    #[test]
    fn test_structural_equality_ignores_ids() {
        let (a, _, _) = sample();
        let (mut b, _, _) = sample();
        assert!(a.structurally_equal(&b));

        let root = b.root().unwrap();
        let extra = b.create_node(NodeKind::Or);
        b.append_child(root, extra).unwrap();
        assert!(!a.structurally_equal(&b));
    }
}
