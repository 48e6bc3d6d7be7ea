//! Grammar loader, FIRST-set computation, canonical LR(1) table builder,
//! and the parser runtime (spec §4.5-§4.8).

pub mod error;
pub mod first;
pub mod grammar;
pub mod lr;
pub mod parser;
pub mod table_cache;
pub mod tree;

pub use error::{Error, GrammarError, TableError};
pub use first::FirstSets;
pub use grammar::{Grammar, GrammarLoader, Production, Symbol, AUGMENTED_START, END_OF_INPUT, EPSILON};
pub use lr::{Action, LRTableBuilder, LrTables};
pub use parser::LRParser;
pub use tree::{Node, ParseTree};
