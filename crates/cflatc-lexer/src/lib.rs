//! Regex compiler, automaton builder, and data-driven lexer generator and
//! runtime (spec §4.1-§4.4).
//!
//! A lexer specification text is parsed by [`generator::LexerGenerator`]
//! into a [`generator::LexerSpec`], compiled into one DFA per declared
//! state, and then driven by [`runtime::LexerRuntime`] against source text
//! to produce tokens.

pub mod automaton;
pub mod error;
pub mod generator;
pub mod regex;
pub mod runtime;

pub use automaton::{Accept, AutomatonBuilder, Dfa, DfaState};
pub use error::{Error, RegexError, SpecError};
pub use generator::{CompiledRule, LexerGenerator, LexerSpec, Rule, RuleAction};
pub use regex::{Fragment, NfaBuilder, RegexCompiler, StateId};
pub use runtime::{LexResult, LexerRuntime};
