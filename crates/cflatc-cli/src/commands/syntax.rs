use std::path::{Path, PathBuf};

use cflatc_parser::{LRParser, Node, ParseTree};

use crate::config::Config;
use crate::error::Error;

use super::pipeline::{
    load_grammar_and_tables, read_source, render_lexical_output, report_lexical_diagnostics,
    run_lexer, write_output,
};

pub struct SyntaxArgs {
    pub file: PathBuf,
}

pub fn run(args: SyntaxArgs) {
    let config = Config::resolve();
    if let Err(e) = run_syntax(&config, &args.file) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Run the lexer and parser and write the three tree/table dump files
/// under `compiler-bin/` (spec §6). Returns the parsed tree on success so
/// the `semantic` verb can reuse this stage without re-lexing.
pub fn run_syntax(config: &Config, file: &Path) -> Result<Node, Error> {
    let source = read_source(file)?;

    let lex_result = run_lexer(config, &source)?;
    report_lexical_diagnostics(&lex_result);
    write_output(config, "leksicke_jedinke.txt", &render_lexical_output(&lex_result))?;
    if lex_result.has_errors() {
        return Err(Error::LexicalErrors);
    }

    let (grammar, tables) = load_grammar_and_tables(config)?;
    let tree = LRParser::parse(&lex_result.tokens, &grammar, &tables)?;

    write_output(config, "generativno_stablo.txt", &ParseTree::render_generative(&tree))?;
    write_output(config, "sintaksno_stablo.txt", &ParseTree::render_syntax(&tree))?;

    Ok(tree)
}
