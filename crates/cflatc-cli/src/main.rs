mod commands;
mod config;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::lexer::LexerArgs;
use commands::semantic::SemanticArgs;
use commands::syntax::SyntaxArgs;

#[derive(Parser)]
#[command(name = "cflatc", bin_name = "cflatc")]
#[command(about = "Compiler driver for the cflatc source language")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Source file to compile; equivalent to `cflatc semantic <file>`.
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the lexer and print a token dump to stdout.
    Lexer { file: PathBuf },
    /// Run the lexer and parser, writing the tree/table dump files.
    Syntax { file: PathBuf },
    /// Run semantic analysis and code generation.
    Semantic { file: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Lexer { file }) => commands::lexer::run(LexerArgs { file }),
        Some(Command::Syntax { file }) => commands::syntax::run(SyntaxArgs { file }),
        Some(Command::Semantic { file }) => commands::semantic::run(SemanticArgs { file }),
        None => match cli.file {
            Some(file) => commands::semantic::run(SemanticArgs { file }),
            None => {
                eprintln!("error: no input file given");
                eprintln!();
                eprintln!("usage: cflatc [lexer|syntax|semantic] <file>");
                std::process::exit(1);
            }
        },
    }
}
