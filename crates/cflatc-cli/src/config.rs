//! Project-root discovery and configuration-file resolution (spec §6's
//! environment-variable overrides).
//!
//! Every phase's definition file is resolved the same way: an explicit
//! environment variable wins outright; otherwise the default lives under
//! `config/` at the discovered project root.

use std::env;
use std::path::{Path, PathBuf};

/// Where the three phase definition files and the output directory live.
pub struct Config {
    pub lexer_def_path: PathBuf,
    pub grammar_def_path: PathBuf,
    /// Resolved for interface symmetry with the other two phases (spec
    /// §6 names `SEMANTICS_DEFINITION_PATH` alongside
    /// `LEXER_DEFINITION_PATH`/`PARSER_DEFINITION_PATH`), but semantic
    /// analysis has no data-driven specification file to read: its rules
    /// are the fixed dispatch table in `cflatc_semantic::checker`. No
    /// phase ever opens this path.
    #[allow(dead_code)]
    pub semantics_def_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Config {
    pub fn resolve() -> Self {
        let root = find_project_root();
        Self {
            lexer_def_path: env_or_default("LEXER_DEFINITION_PATH", &root, "lexer.def"),
            grammar_def_path: env_or_default("PARSER_DEFINITION_PATH", &root, "grammar.def"),
            semantics_def_path: env_or_default("SEMANTICS_DEFINITION_PATH", &root, "semantics.def"),
            output_dir: root.join("compiler-bin"),
        }
    }
}

fn env_or_default(var: &str, root: &Path, file_name: &str) -> PathBuf {
    match env::var_os(var) {
        Some(value) => PathBuf::from(value),
        None => root.join("config").join(file_name),
    }
}

/// Walk up from the current directory looking for a `config/` directory.
/// Falls back to the current directory itself if none is found, so a
/// run outside any project tree still gets a well-defined (if empty)
/// set of default paths to fail on.
fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    for ancestor in cwd.ancestors() {
        if ancestor.join("config").is_dir() {
            return ancestor.to_path_buf();
        }
    }
    cwd
}
