use termtree::Tree;
use tracing::instrument;

use crate::domain::{ExpressionTree, NodeId, NodeKind};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for ExpressionTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        if let Some(root_idx) = self.root() {
            fn build_tree(tree: &ExpressionTree, node_idx: NodeId) -> Tree<String> {
                let mut node_tree = Tree::new(label(tree, node_idx));
                for &child_idx in tree.children(node_idx) {
                    node_tree.push(build_tree(tree, child_idx));
                }
                node_tree
            }

            build_tree(self, root_idx)
        } else {
            Tree::new("Empty expression".to_string())
        }
    }
}

fn label(tree: &ExpressionTree, idx: NodeId) -> String {
    match tree.get_node(idx) {
        Some(node) => match (&node.kind, &node.display_name) {
            (kind @ NodeKind::Category(_), Some(name)) => format!("{} ({})", kind, name),
            (kind, _) => kind.to_string(),
        },
        None => "?".to_string(),
    }
}
