//! Shared plumbing between the `lexer`/`syntax`/`semantic` verbs: loading
//! the data-driven specifications, running each phase, and rendering the
//! fixed output-file formats (spec §6).

use std::fs;
use std::path::Path;

use cflatc_core::Token;
use cflatc_lexer::{LexResult, LexerGenerator, LexerRuntime};
use cflatc_parser::{FirstSets, Grammar, GrammarLoader, LRTableBuilder, LrTables, table_cache};

use crate::config::Config;
use crate::error::Error;

/// Run the lexer over `source` using the specification at
/// `config.lexer_def_path`. Per-character lexical errors are carried
/// inside the returned `LexResult` (spec §7's "per-character recovery"),
/// not surfaced as an `Err` here; only specification/internal failures
/// are.
pub fn run_lexer(config: &Config, source: &str) -> Result<LexResult, Error> {
    let spec_text = fs::read_to_string(&config.lexer_def_path)
        .map_err(|e| Error::read(&config.lexer_def_path, e))?;
    let spec = LexerGenerator::parse_spec(&spec_text)?;
    let dfas = LexerGenerator::build(&spec)?;
    let start_state = spec.start_state().ok_or(Error::NoStartState)?;
    let runtime = LexerRuntime::new(&dfas, start_state);
    Ok(runtime.tokenize(source)?)
}

/// Load the grammar and its LR(1) tables, consulting the on-disk cache
/// under `compiler-bin/lr_table.cache` before rebuilding (spec §4.7).
pub fn load_grammar_and_tables(config: &Config) -> Result<(Grammar, LrTables), Error> {
    let grammar_text = fs::read_to_string(&config.grammar_def_path)
        .map_err(|e| Error::read(&config.grammar_def_path, e))?;
    let grammar = GrammarLoader::parse(&grammar_text)?;

    let cache_path = config.output_dir.join("lr_table.cache");
    let hash = table_cache::hash_grammar(&grammar_text);
    if let Some(tables) = table_cache::load(&cache_path, hash) {
        return Ok((grammar, tables));
    }

    let first_sets = FirstSets::compute(&grammar);
    let (tables, conflicts) = LRTableBuilder::build(&grammar, &first_sets)?;
    for line in &conflicts {
        eprintln!("warning: {line}");
    }
    let _ = table_cache::store(&cache_path, hash, &tables);
    Ok((grammar, tables))
}

/// Write `contents` to `name` under `config.output_dir`, creating the
/// directory if it does not exist yet (spec §6: "written under a
/// `compiler-bin/` directory created if absent").
pub fn write_output(config: &Config, name: &str, contents: &str) -> Result<(), Error> {
    fs::create_dir_all(&config.output_dir).map_err(|e| Error::write(&config.output_dir, e))?;
    let path = config.output_dir.join(name);
    fs::write(&path, contents).map_err(|e| Error::write(path, e))
}

/// Render `leksicke_jedinke.txt`: the "tablica znakova" (lexical symbol
/// table) section followed by the "niz uniformnih znakova" (uniform
/// token stream) section (spec §6).
pub fn render_lexical_output(result: &LexResult) -> String {
    let mut lines = Vec::new();
    lines.push("tablica znakova".to_string());
    for (index, (kind, text)) in result.symbols.entries().iter().enumerate() {
        lines.push(format!("{index} {kind} {text}"));
    }
    lines.push(String::new());
    lines.push("niz uniformnih znakova".to_string());
    for token in &result.tokens {
        lines.push(format!("{} {} {}", token.kind, token.line(), token.symbol_index));
    }
    lines.join("\n")
}

/// Load source text from `path`, reporting a readable error rather than
/// letting `main` unwrap a raw `io::Error`.
pub fn read_source(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|e| Error::read(path, e))
}

/// Render the lexer's diagnostics in the stable Croatian-language format
/// pinned by spec §6/§8's worked examples.
pub fn report_lexical_diagnostics(result: &LexResult) {
    for diagnostic in result.diagnostics.iter() {
        eprintln!(
            "Leksička greška na retku {}, stupcu {}: {}",
            diagnostic.line, diagnostic.column, diagnostic.message
        );
    }
}

pub fn print_token_dump(tokens: &[Token]) {
    for token in tokens {
        println!("{} {} {}", token.kind, token.lexeme, token.line());
    }
}

#[cfg(test)]
mod pipeline_tests {
    use std::path::PathBuf;

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
    fn run_lexer_tokenizes_minimal_main() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let result = run_lexer(&config, "int main(void) { return 0; }").unwrap();

        assert!(!result.has_errors());
        let kinds: Vec<&str> = result.tokens.iter().map(|t| t.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                "KR_INT",
                "IDN",
                "L_ZAGRADA",
                "KR_VOID",
                "D_ZAGRADA",
                "L_VIT_ZAGRADA",
                "KR_RETURN",
                "BROJ",
                "TOCKAZAREZ",
                "D_VIT_ZAGRADA",
            ]
        );
    }

    #[test]
    fn run_lexer_reports_unterminated_string() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let result = run_lexer(&config, "\"oops").unwrap();

        assert!(result.has_errors());
    }

    #[test]
    fn render_lexical_output_has_both_sections() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let result = run_lexer(&config, "int x;").unwrap();

        let rendered = render_lexical_output(&result);

        assert!(rendered.contains("tablica znakova"));
        assert!(rendered.contains("niz uniformnih znakova"));
    }

    #[test]
    fn read_source_reports_missing_file() {
        let missing = workspace_root().join("does-not-exist.c");
        let err = read_source(&missing).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
