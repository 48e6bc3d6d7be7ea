//! The CLI's own error type. Every phase reports through its own typed
//! error; this just gives the driver one thing to match on before it
//! prints a message and picks an exit code (spec §7's propagation
//! policy: "a typed error value carrying the phase name and a user-
//! facing message").

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("lexer specification error: {0}")]
    LexerSpec(#[from] cflatc_lexer::SpecError),
    #[error("internal lexer error: {0}")]
    LexerRuntime(#[from] cflatc_lexer::Error),
    #[error("lexer specification error: no start state declared")]
    NoStartState,
    #[error("aborting: lexical errors were reported above")]
    LexicalErrors,
    #[error("grammar specification error: {0}")]
    Grammar(#[from] cflatc_parser::GrammarError),
    #[error(transparent)]
    Parser(#[from] cflatc_parser::Error),
    #[error(transparent)]
    Semantic(#[from] cflatc_semantic::Error),
    #[error(transparent)]
    Codegen(#[from] cflatc_codegen::Error),
}

impl Error {
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Read { path: path.into(), source }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Write { path: path.into(), source }
    }
}
