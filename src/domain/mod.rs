//! Domain layer: expression trees and their grammar
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod grammar;
pub mod mutation;
pub mod parser;
pub mod serializer;

pub use arena::{ExpressionNode, ExpressionTree, NodeId, NodeKind};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use grammar::GrammarConfig;
pub use parser::{is_editable, parse};
pub use serializer::serialize;
