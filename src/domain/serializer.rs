//! Serializer: expression tree back to the generic persisted format.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use tracing::instrument;

use crate::domain::arena::{ExpressionTree, NodeId, NodeKind};

/// Flatten a tree into its persisted form; an empty tree becomes `null`.
#[instrument(level = "debug", skip(tree))]
pub fn serialize(tree: &ExpressionTree) -> Value {
    tree.root()
        .map(|root| serialize_subtree(tree, root))
        .unwrap_or(Value::Null)
}

/// Serialize the subtree rooted at `id`; dangling ids become `null`.
pub fn serialize_subtree(tree: &ExpressionTree, id: NodeId) -> Value {
    let Some(node) = tree.get_node(id) else {
        return Value::Null;
    };
    match &node.kind {
        NodeKind::Category(key) => json!({ "category": key }),
        kind => {
            let children: Vec<Value> = node
                .children
                .iter()
                .map(|&child| serialize_subtree(tree, child))
                .collect();
            let mut object = Map::new();
            object.insert(kind.tag().to_string(), Value::Array(children));
            Value::Object(object)
        }
    }
}

/// Trees serialize to the persisted format, so snapshots can be dumped as JSON.
impl Serialize for ExpressionTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize(self).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parser::parse;

    #[test]
    fn test_empty_tree_serializes_to_null() {
        assert_eq!(serialize(&ExpressionTree::new()), Value::Null);
    }

    #[test]
    fn test_parsed_document_serializes_back_verbatim() {
        let doc = json!({"and": [
            {"or": [{"category": "p:1"}, {"and": [{"category": "p:2"}]}]},
            {"not": [{"category": "p:3"}, {"or": []}]}
        ]});
        let tree = parse(&doc).unwrap();
        assert_eq!(serialize(&tree), doc);
    }
}
