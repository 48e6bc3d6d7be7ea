//! Code-generator errors.
//!
//! The generator only ever runs over a tree that already passed semantic
//! analysis, so every condition caught here is an internal invariant
//! violation (spec §7: "fatal with an internal-error marker; these must
//! be impossible for well-formed inputs and indicate a bug in the
//! compiler"), never a user-facing diagnostic.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("internal codegen error: {0}")]
    Internal(String),
}

impl Error {
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal(message.into())
    }
}
