//! Semantic-analysis errors (spec §4.11's "Failure semantics").

use cflatc_parser::Node;

/// Render a node in the canonical production form from spec §4.11:
/// `<lhs> ::= symbol1 symbol2 ...` with terminals as `TERMINAL(line,lexeme)`
/// and non-terminals as their bare name.
pub fn render_production(node: &Node) -> String {
    match node {
        Node::Terminal { name, position, lexeme } => {
            format!("{name}({},{lexeme})", position.line)
        }
        Node::NonTerminal { name, children } => {
            let rhs = children
                .iter()
                .map(render_symbol)
                .collect::<Vec<_>>()
                .join(" ");
            format!("<{name}> ::= {rhs}")
        }
    }
}

fn render_symbol(node: &Node) -> String {
    match node {
        Node::Terminal { name, position, lexeme } => {
            format!("{name}({},{lexeme})", position.line)
        }
        Node::NonTerminal { name, .. } => format!("<{name}>"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{production}: {message}")]
    Semantic { production: String, message: String },
}

impl Error {
    pub fn at(node: &Node, message: impl Into<String>) -> Self {
        Error::Semantic {
            production: render_production(node),
            message: message.into(),
        }
    }
}
