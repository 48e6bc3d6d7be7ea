//! Errors for grammar loading, table construction, and parsing (spec §7).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("line {line}: malformed production: {message}")]
    MalformedProduction { line: usize, message: String },
    #[error("line {line}: unterminated non-terminal name, missing '>'")]
    UnterminatedNonTerminal { line: usize },
    #[error("grammar declares no productions")]
    EmptyGrammar,
    #[error("non-terminal '{0}' is used but never defined by a production")]
    UndefinedNonTerminal(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("CLOSURE did not reach a fixed point within 1000 passes")]
    ClosureOverflow,
    #[error("item-set collection exceeded 50000 states")]
    ItemSetOverflow,
    #[error("internal inconsistency: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(
        "syntax error at line {line}: unexpected {terminal} ('{lexeme}'); expected one of: {expected}"
    )]
    Syntax {
        line: usize,
        terminal: String,
        lexeme: String,
        expected: String,
    },
    #[error("internal parser error: {0}")]
    Internal(String),
}
