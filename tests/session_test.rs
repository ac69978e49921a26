//! Tests for the editor session (state container)

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;

use audtarget::application::{ApplicationError, EditorSession, SessionPhase};
use audtarget::domain::{DomainError, EntitySettings, GrammarConfig};
use audtarget::infrastructure::traits::{NoTaxonomy, TaxonomyResolver};
use audtarget::infrastructure::StaticTaxonomy;
use audtarget::util::testing;

#[fixture]
fn taxonomy() -> Arc<dyn TaxonomyResolver> {
    testing::init_test_setup();
    Arc::new(
        StaticTaxonomy::new()
            .with_category("bluekai:1", "Auto Intenders")
            .with_category("bluekai:2", "Sports Fans"),
    )
}

fn session_for(settings: EntitySettings, taxonomy: Arc<dyn TaxonomyResolver>) -> EditorSession {
    let mut session = EditorSession::create_instance(settings, GrammarConfig::default(), taxonomy);
    session.initialize().expect("initialize");
    session
}

fn editable_settings() -> EntitySettings {
    EntitySettings::new("adgroup-1").with_targeting(json!({"and": [
        {"or": [{"category": "bluekai:1"}, {"category": "bluekai:2"}]},
        {"or": [{"category": "bluekai:3"}]},
        {"not": [{"or": [{"category": "bluekai:4"}]}]}
    ]}))
}

// ============================================================
// Initialize
// ============================================================

#[rstest]
fn given_absent_expression_when_initializing_then_state_is_empty_and_not_editable(
    taxonomy: Arc<dyn TaxonomyResolver>,
) {
    let session = session_for(EntitySettings::new("adgroup-1"), taxonomy);

    let state = session.get_state();
    assert!(state.expression_tree.is_none());
    assert!(state.info.is_none());
    assert!(!state.editable);
    assert_eq!(session.phase(), SessionPhase::Empty);
}

#[rstest]
fn given_explicit_null_when_initializing_then_same_as_absent(taxonomy: Arc<dyn TaxonomyResolver>) {
    let settings = EntitySettings::new("adgroup-1").with_targeting(serde_json::Value::Null);
    let session = session_for(settings, taxonomy);
    assert_eq!(session.phase(), SessionPhase::Empty);
    assert!(!session.get_state().editable);
}

#[rstest]
fn given_absent_expression_when_enabling_then_becomes_editable(
    taxonomy: Arc<dyn TaxonomyResolver>,
) {
    let mut session = session_for(EntitySettings::new("adgroup-1"), taxonomy);

    let root = session.enable_targeting().unwrap();

    assert_eq!(session.root(), Some(root));
    assert_eq!(session.phase(), SessionPhase::Composing);
    assert!(session.get_state().editable);
    assert_eq!(session.inclusion_groups().len(), 1);
    assert!(session.can_add_inclusion());
    assert!(session.can_add_exclusion());
}

#[rstest]
fn given_malformed_expression_when_initializing_then_error_surfaces(
    taxonomy: Arc<dyn TaxonomyResolver>,
) {
    let settings = EntitySettings::new("adgroup-1")
        .with_targeting(json!({"and": [{"category": "p:1", "or": []}]}));
    let mut session = EditorSession::create_instance(settings, GrammarConfig::default(), taxonomy);

    let result = session.initialize();

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::MalformedExpression { .. }))
    ));
    assert_eq!(session.phase(), SessionPhase::Uninitialized);
    assert!(session.get_state().expression_tree.is_none());
}

#[rstest]
fn given_editable_expression_when_initializing_then_info_has_names_and_groups(
    taxonomy: Arc<dyn TaxonomyResolver>,
) {
    let session = session_for(editable_settings(), taxonomy);

    let state = session.get_state();
    assert!(state.editable);
    let info = state.info.expect("info");
    assert_eq!(info.category_count(), 4);
    assert_eq!(info.unresolved, 2);
    assert_eq!(info.name_of("bluekai:1"), Some("Auto Intenders"));
    assert_eq!(info.name_of("bluekai:3"), None);
    assert_eq!(info.inclusion.len(), 2);
    assert_eq!(info.inclusion[0].count(), 2);
    assert_eq!(info.exclusion.map(|g| g.categories), Some(vec!["bluekai:4".to_string()]));
}

// ============================================================
// Read-only Trees
// ============================================================

#[rstest]
fn given_non_editable_expression_when_mutating_then_read_only(taxonomy: Arc<dyn TaxonomyResolver>) {
    let settings = EntitySettings::new("adgroup-1").with_targeting(json!({"and": [
        {"or": [{"category": "bluekai:1"}, {"and": [{"category": "bluekai:2"}]}]}
    ]}));
    let mut session = session_for(settings.clone(), taxonomy);

    assert_eq!(session.phase(), SessionPhase::ReadOnly);
    assert!(!session.can_add_inclusion());
    assert!(!session.can_add_exclusion());
    assert!(matches!(session.add_inclusion_group(), Err(ApplicationError::ReadOnly)));
    assert!(matches!(session.enable_targeting(), Err(ApplicationError::ReadOnly)));

    // info is still rendered for the read-only view
    let info = session.get_state().info.expect("info");
    assert_eq!(info.category_count(), 2);
    assert!(info.inclusion.is_empty());

    // saving writes back exactly what was loaded
    assert_eq!(session.to_settings(), settings);
}

// ============================================================
// Mutations
// ============================================================

#[rstest]
fn given_uninitialized_session_when_mutating_then_fails(taxonomy: Arc<dyn TaxonomyResolver>) {
    let mut session =
        EditorSession::create_instance(editable_settings(), GrammarConfig::default(), taxonomy);
    assert!(matches!(
        session.enable_targeting(),
        Err(ApplicationError::NotInitialized)
    ));
}

#[rstest]
fn given_empty_session_when_adding_group_then_targeting_not_enabled(
    taxonomy: Arc<dyn TaxonomyResolver>,
) {
    let mut session = session_for(EntitySettings::new("adgroup-1"), taxonomy);
    assert!(matches!(
        session.add_exclusion_group(),
        Err(ApplicationError::TargetingNotEnabled)
    ));
}

#[rstest]
fn given_composing_session_when_editing_then_snapshots_are_independent(
    taxonomy: Arc<dyn TaxonomyResolver>,
) {
    let mut session = session_for(EntitySettings::new("adgroup-1"), taxonomy);
    session.enable_targeting().unwrap();
    let before = session.get_state();

    let group = session.inclusion_groups()[0];
    session.add_category(group, "bluekai:2").unwrap();

    assert!(before.expression_tree.unwrap().category_keys().is_empty());
    let after = session.get_state();
    assert_eq!(after.info.unwrap().name_of("bluekai:2"), Some("Sports Fans"));
    assert!(session.is_enabled());
}

#[rstest]
fn given_full_session_when_adding_inclusion_then_limit_error(taxonomy: Arc<dyn TaxonomyResolver>) {
    let mut session = session_for(editable_settings(), taxonomy);

    assert!(!session.can_add_inclusion());
    let result = session.add_inclusion_group();

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::GroupLimitReached { limit: 2, .. }))
    ));
    assert_eq!(session.inclusion_groups().len(), 2);
}

#[rstest]
fn given_edits_when_saving_then_settings_hold_serialized_tree(taxonomy: Arc<dyn TaxonomyResolver>) {
    let mut session = session_for(EntitySettings::new("adgroup-1"), taxonomy);
    session.enable_targeting().unwrap();
    let incl = session.inclusion_groups()[0];
    session.add_category(incl, "bluekai:1").unwrap();
    let excl = session.add_exclusion_group().unwrap();
    session.add_category(excl, "bluekai:2").unwrap();

    let saved = session.to_settings();

    assert_eq!(
        saved.audience_targeting,
        Some(json!({"and": [
            {"or": [{"category": "bluekai:1"}]},
            {"not": [{"or": [{"category": "bluekai:2"}]}]}
        ]}))
    );
    // saving leaves the session as it was
    assert_eq!(session.phase(), SessionPhase::Composing);
    assert_eq!(session.exclusion_group(), Some(excl));
}

#[test]
fn given_no_taxonomy_when_editing_then_grammar_unaffected() {
    let mut session = session_for(editable_settings(), Arc::new(NoTaxonomy));

    let group = session.inclusion_groups()[1];
    assert!(session.remove_category(group, "bluekai:3").unwrap());
    assert!(!session.remove_category(group, "bluekai:3").unwrap());

    let info = session.get_state().info.unwrap();
    assert_eq!(info.unresolved, info.category_count());
    assert_eq!(info.inclusion[1].count(), 0);
    assert!(session.get_state().editable);
}
