use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::Error;

use super::pipeline::{print_token_dump, read_source, report_lexical_diagnostics, run_lexer};

pub struct LexerArgs {
    pub file: PathBuf,
}

pub fn run(args: LexerArgs) {
    let config = Config::resolve();
    match run_lexer_command(&config, &args.file) {
        Ok(had_errors) => {
            if had_errors {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

fn run_lexer_command(config: &Config, file: &Path) -> Result<bool, Error> {
    let source = read_source(file)?;
    let result = run_lexer(config, &source)?;
    report_lexical_diagnostics(&result);
    print_token_dump(&result.tokens);
    Ok(result.has_errors())
}
