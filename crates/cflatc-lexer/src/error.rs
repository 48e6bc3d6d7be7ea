//! Errors for the lexer-generator and lexer-runtime phase (spec §7).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegexError {
    #[error("unmatched '(' at position {0}")]
    UnmatchedOpenParen(usize),
    #[error("unmatched ')' at position {0}")]
    UnmatchedCloseParen(usize),
    #[error("dangling '*' with nothing to repeat at position {0}")]
    DanglingStar(usize),
    #[error("unterminated escape sequence at position {0}")]
    UnterminatedEscape(usize),
    #[error("trailing input after a complete regex at position {0}")]
    TrailingInput(usize),
    #[error("empty regex")]
    EmptyRegex,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("line {line}: malformed macro definition")]
    MalformedMacro { line: usize },
    #[error("line {line}: macro '{name}' is not defined")]
    UndefinedMacro { line: usize, name: String },
    #[error("macro expansion did not reach a fixed point within 100 passes")]
    MacroExpansionOverflow,
    #[error("line {line}: malformed rule: {message}")]
    MalformedRule { line: usize, message: String },
    #[error("line {line}: a rule may contain at most one VRATI_SE action")]
    MultipleReturnActions { line: usize },
    #[error("line {line}: token name '{name}' collides with an action keyword")]
    TokenNameCollidesWithKeyword { line: usize, name: String },
    #[error("line {line}: rule references undeclared state '{state}'")]
    UndeclaredState { line: usize, state: String },
    #[error("no start state declared")]
    NoStartState,
    #[error("regex error on line {line}: {source}")]
    Regex {
        line: usize,
        #[source]
        source: RegexError,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Regex(#[from] RegexError),
    #[error("lexical error at line {line}, column {column}: {message}")]
    Lexical {
        line: usize,
        column: usize,
        message: String,
    },
    #[error("internal lexer error: {0}")]
    Internal(String),
}
