//! Editor session: the state container the view layer talks to
//!
//! One session per owning entity. `initialize()` parses the persisted
//! expression once; afterwards the tree is edited in place through the
//! mutation methods until the caller serializes it with `to_settings()`.

use std::sync::Arc;

use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    is_editable, mutation, parse, serialize, CategoryInfo, EntitySettings, ExpressionTree,
    GrammarConfig, GroupInfo, NodeId, TargetingInfo,
};
use crate::infrastructure::traits::TaxonomyResolver;

/// Snapshot of the session handed to the view layer.
///
/// Owned data: later mutations never show up in an earlier snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct EditorState {
    pub expression_tree: Option<ExpressionTree>,
    pub info: Option<TargetingInfo>,
    pub editable: bool,
}

/// Lifecycle position of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    /// No persisted expression, targeting can be enabled
    Empty,
    /// Editable tree, mutations allowed
    Composing,
    /// Well-formed tree outside the editable grammar
    ReadOnly,
}

pub struct EditorSession {
    settings: EntitySettings,
    grammar: GrammarConfig,
    resolver: Arc<dyn TaxonomyResolver>,
    tree: Option<ExpressionTree>,
    info: Option<TargetingInfo>,
    editable: bool,
    initialized: bool,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("entity", &self.settings.id)
            .field("phase", &self.phase())
            .finish()
    }
}

impl EditorSession {
    /// Create a session for one owning entity; nothing is parsed yet.
    pub fn create_instance(
        settings: EntitySettings,
        grammar: GrammarConfig,
        resolver: Arc<dyn TaxonomyResolver>,
    ) -> Self {
        Self {
            settings,
            grammar,
            resolver,
            tree: None,
            info: None,
            editable: false,
            initialized: false,
        }
    }

    /// Parse the entity's persisted expression and classify it.
    ///
    /// Malformed input is returned as an error and leaves the session
    /// uninitialized. Calling this again discards in-memory edits.
    #[instrument(
        level = "debug",
        skip(self),
        fields(entity = %self.settings.display_id())
    )]
    pub fn initialize(&mut self) -> ApplicationResult<()> {
        self.initialized = false;
        self.tree = None;
        self.info = None;
        self.editable = false;

        let tree = parse(self.settings.targeting())?;
        if tree.is_empty() {
            debug!("initialize: no persisted expression");
        } else {
            self.editable = is_editable(&tree, &self.grammar);
            info!(
                "initialize: {} categories, editable={}",
                tree.category_keys().len(),
                self.editable
            );
            self.tree = Some(tree);
            self.refresh_info();
        }
        self.initialized = true;
        Ok(())
    }

    pub fn get_state(&self) -> EditorState {
        EditorState {
            expression_tree: self.tree.clone(),
            info: self.info.clone(),
            editable: self.editable,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.tree, self.initialized) {
            (_, false) => SessionPhase::Uninitialized,
            (None, true) => SessionPhase::Empty,
            (Some(_), true) if self.editable => SessionPhase::Composing,
            (Some(_), true) => SessionPhase::ReadOnly,
        }
    }

    /// The owning entity's settings as loaded, without in-memory edits.
    pub fn settings(&self) -> &EntitySettings {
        &self.settings
    }

    pub fn tree(&self) -> Option<&ExpressionTree> {
        self.tree.as_ref()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.tree.as_ref().and_then(ExpressionTree::root)
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn grammar(&self) -> &GrammarConfig {
        &self.grammar
    }

    /// Create the root with a first inclusion group; no-op when a root exists.
    ///
    /// Allowed from the empty state, which then becomes editable.
    #[instrument(level = "debug", skip(self))]
    pub fn enable_targeting(&mut self) -> ApplicationResult<NodeId> {
        self.ensure_initialized()?;
        if self.tree.is_some() && !self.editable {
            return Err(ApplicationError::ReadOnly);
        }
        let tree = self.tree.get_or_insert_with(ExpressionTree::new);
        let root = mutation::enable_targeting(tree)?;
        self.editable = true;
        self.refresh_info();
        Ok(root)
    }

    pub fn can_add_inclusion(&self) -> bool {
        self.editable_parts()
            .map(|(tree, root)| mutation::can_add_inclusion(tree, root, &self.grammar))
            .unwrap_or(false)
    }

    pub fn can_add_exclusion(&self) -> bool {
        self.editable_parts()
            .map(|(tree, root)| mutation::can_add_exclusion(tree, root, &self.grammar))
            .unwrap_or(false)
    }

    pub fn add_inclusion_group(&mut self) -> ApplicationResult<NodeId> {
        let grammar = self.grammar;
        self.mutate(|tree, root| mutation::add_inclusion_group(tree, root, &grammar))
    }

    /// Returns the `OR` inside the new exclusion group.
    pub fn add_exclusion_group(&mut self) -> ApplicationResult<NodeId> {
        let grammar = self.grammar;
        self.mutate(|tree, root| mutation::add_exclusion_group(tree, root, &grammar))
    }

    pub fn add_category(&mut self, group: NodeId, category_key: &str) -> ApplicationResult<NodeId> {
        self.mutate(|tree, _| mutation::add_category(tree, group, category_key))
    }

    pub fn remove_category(
        &mut self,
        group: NodeId,
        category_key: &str,
    ) -> ApplicationResult<bool> {
        self.mutate(|tree, _| mutation::remove_category(tree, group, category_key))
    }

    /// Drop a whole group (and the `NOT` around an exclusion group).
    pub fn remove_group(&mut self, group: NodeId) -> ApplicationResult<bool> {
        self.mutate(|tree, _| mutation::remove_group(tree, group))
    }

    pub fn is_enabled(&self) -> bool {
        self.tree.as_ref().map(mutation::is_enabled).unwrap_or(false)
    }

    pub fn inclusion_groups(&self) -> Vec<NodeId> {
        self.tree
            .as_ref()
            .map(mutation::inclusion_groups)
            .unwrap_or_default()
    }

    pub fn exclusion_group(&self) -> Option<NodeId> {
        self.tree.as_ref().and_then(mutation::exclusion_group)
    }

    /// The entity's settings with the expression replaced by the current tree.
    ///
    /// The in-memory tree is left untouched.
    #[instrument(
        level = "debug",
        skip(self),
        fields(entity = %self.settings.display_id())
    )]
    pub fn to_settings(&self) -> EntitySettings {
        let mut settings = self.settings.clone();
        settings.audience_targeting = self.tree.as_ref().map(serialize).filter(|v| !v.is_null());
        settings
    }

    /// Resolve missing display names and rebuild `info` from the current tree.
    pub fn refresh_info(&mut self) {
        let Some(tree) = self.tree.as_mut() else {
            self.info = None;
            return;
        };
        resolve_display_names(tree, self.resolver.as_ref());
        self.info = Some(build_info(tree, self.editable));
    }

    fn ensure_initialized(&self) -> ApplicationResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(ApplicationError::NotInitialized)
        }
    }

    fn editable_parts(&self) -> Option<(&ExpressionTree, NodeId)> {
        if !self.initialized || !self.editable {
            return None;
        }
        let tree = self.tree.as_ref()?;
        Some((tree, tree.root()?))
    }

    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut ExpressionTree, NodeId) -> crate::domain::DomainResult<T>,
    ) -> ApplicationResult<T> {
        self.ensure_initialized()?;
        if !self.editable && self.tree.is_some() {
            return Err(ApplicationError::ReadOnly);
        }
        let tree = self
            .tree
            .as_mut()
            .ok_or(ApplicationError::TargetingNotEnabled)?;
        let root = tree.root().ok_or(ApplicationError::TargetingNotEnabled)?;
        let result = op(tree, root)?;
        self.refresh_info();
        Ok(result)
    }
}

fn resolve_display_names(tree: &mut ExpressionTree, resolver: &dyn TaxonomyResolver) {
    let leaves: Vec<(NodeId, String)> = tree
        .iter()
        .filter(|(_, node)| node.display_name.is_none())
        .filter_map(|(id, node)| node.kind.category_key().map(|key| (id, key.to_string())))
        .collect();
    for (id, key) in leaves {
        let name = resolver.resolve_category(&key).map(|meta| meta.name);
        if let Some(node) = tree.get_node_mut(id) {
            node.display_name = name;
        }
    }
}

fn build_info(tree: &ExpressionTree, editable: bool) -> TargetingInfo {
    let categories: Vec<CategoryInfo> = tree
        .iter()
        .filter_map(|(_, node)| {
            node.kind.category_key().map(|key| CategoryInfo {
                key: key.to_string(),
                name: node.display_name.clone(),
            })
        })
        .unique_by(|c| c.key.clone())
        .collect();
    let unresolved = categories.iter().filter(|c| c.name.is_none()).count();

    let group_info = |group: NodeId| GroupInfo {
        categories: mutation::group_categories(tree, group)
            .into_iter()
            .map(str::to_string)
            .collect(),
    };
    let (inclusion, exclusion) = if editable {
        (
            mutation::inclusion_groups(tree)
                .into_iter()
                .map(group_info)
                .collect(),
            mutation::exclusion_group(tree).map(group_info),
        )
    } else {
        (Vec::new(), None)
    };

    TargetingInfo {
        categories,
        inclusion,
        exclusion,
        unresolved,
    }
}
