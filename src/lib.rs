//! Audience targeting expressions.
//!
//! An owning entity (e.g. an ad group) persists its targeting rule as a
//! nested `and`/`or`/`not`/`category` JSON structure. This crate parses that
//! structure into an arena-backed tree, decides whether it fits the
//! restricted grammar an editor can author (up to two inclusion groups and
//! one exclusion group of categories), edits it without leaving that grammar
//! and serializes it back.
//!
//! Layers:
//! - [`domain`]: tree model, parser, serializer, grammar-preserving mutations
//! - [`application`]: the per-entity [`EditorSession`] and file-backed service
//! - [`infrastructure`]: filesystem and taxonomy boundaries, DI container
//! - [`cli`]: the `audtarget` command line

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;

pub use application::{EditorSession, EditorState, SessionPhase};
pub use domain::{
    is_editable, parse, serialize, DomainError, EntitySettings, ExpressionTree, GrammarConfig,
    NodeId, NodeKind,
};
