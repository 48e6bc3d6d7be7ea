//! Syntax-directed semantic analysis: the symbol table, the semantic-
//! attribute side-table, and the checker rule table (spec §4.9-4.11).

pub mod checker;
pub mod error;
pub mod literals;
pub mod names;
pub mod shapes;
pub mod tree;

pub use checker::SemanticChecker;
pub use error::{render_production, Error};
pub use names::NonTerminalKind;
pub use tree::{render_annotated, Attributes, NodeId, SemanticTree};
