use std::path::{Path, PathBuf};

use cflatc_codegen::CodeGenerator;
use cflatc_core::{Scope, ScopeId, SymbolEntry, SymbolTable};
use cflatc_semantic::{render_annotated, SemanticChecker};

use crate::config::Config;
use crate::error::Error;

use super::pipeline::write_output;
use super::syntax::run_syntax;

pub struct SemanticArgs {
    pub file: PathBuf,
}

pub fn run(args: SemanticArgs) {
    let config = Config::resolve();
    if let Err(e) = run_semantic(&config, &args.file) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run_semantic(config: &Config, file: &Path) -> Result<(), Error> {
    let tree = run_syntax(config, file)?;

    let (symbols, semantic_tree) = SemanticChecker::check(&tree)?;

    write_output(config, "tablica_simbola.txt", &render_symbol_table(&symbols))?;
    write_output(config, "semanticko_stablo.txt", &render_annotated(&tree, &semantic_tree))?;

    let (assembly, _symbols) = CodeGenerator::generate(&tree, symbols)?;
    write_output(config, &assembly_file_name(file), &assembly)?;

    Ok(())
}

fn assembly_file_name(source: &Path) -> String {
    let stem = source.file_stem().and_then(|s| s.to_str()).unwrap_or("izlaz");
    format!("{stem}.s")
}

/// Render the scope-nested symbol-table dump (spec §6's
/// `tablica_simbola.txt`): one indentation level per nested scope, a
/// `name : type` line per declared symbol, `[defined]` appended for
/// functions that have a body.
fn render_symbol_table(symbols: &SymbolTable) -> String {
    let mut lines = Vec::new();
    write_scope(symbols, symbols.root(), 0, &mut lines);
    lines.join("\n")
}

fn write_scope(symbols: &SymbolTable, id: ScopeId, depth: usize, lines: &mut Vec<String>) {
    let indent = "    ".repeat(depth);
    lines.push(format!("{indent}scope {id}"));
    let scope: &Scope = symbols.scope(id);
    for entry in scope.symbols() {
        lines.push(format!("{indent}    {}", render_entry(entry)));
    }
    for &child in &scope.children {
        write_scope(symbols, child, depth + 1, lines);
    }
}

fn render_entry(entry: &SymbolEntry) -> String {
    match entry {
        SymbolEntry::Variable { name, ty, is_const, .. } => {
            if *is_const {
                format!("{name} : const {ty}")
            } else {
                format!("{name} : {ty}")
            }
        }
        SymbolEntry::Function { name, signature, defined, .. } => {
            let ty = signature.as_type();
            if *defined {
                format!("{name} : {ty} [defined]")
            } else {
                format!("{name} : {ty}")
            }
        }
    }
}

#[cfg(test)]
mod semantic_tests {
    use std::fs;
    use std::io::Write;

    use super::*;

    fn workspace_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
    }

    fn test_config(output_dir: &Path) -> Config {
        let root = workspace_root();
        Config {
            lexer_def_path: root.join("config/lexer.def"),
            grammar_def_path: root.join("config/grammar.def"),
            semantics_def_path: PathBuf::new(),
            output_dir: output_dir.to_path_buf(),
        }
    }

    #[test]
    fn minimal_main_is_defined_in_the_symbol_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let mut source = tempfile::Builder::new()
            .suffix(".c")
            .tempfile_in(dir.path())
            .unwrap();
        source.write_all(b"int main(void) { return 0; }").unwrap();
        source.flush().unwrap();

        run_semantic(&config, source.path()).unwrap();

        let symbols = fs::read_to_string(dir.path().join("tablica_simbola.txt")).unwrap();
        assert!(symbols.contains("main : int() [defined]"));

        let asm_name = assembly_file_name(source.path());
        assert!(dir.path().join(&asm_name).is_file());
    }

    #[test]
    fn assembly_file_name_uses_the_source_stem() {
        assert_eq!(assembly_file_name(Path::new("/tmp/program.c")), "program.s");
        assert_eq!(assembly_file_name(Path::new("noext")), "noext.s");
    }
}
