//! Assembly code generation over an already-checked parse tree (spec §4.12).

pub mod error;
pub mod frame;
pub mod generator;
pub mod isa;

pub use error::Error;
pub use generator::CodeGenerator;
