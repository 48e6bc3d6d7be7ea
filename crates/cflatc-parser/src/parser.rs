//! Two-stack shift/reduce LR(1) parser (spec §4.8).

use cflatc_core::{Diagnostic, Diagnostics, Phase, Position, Token};

use crate::error::Error;
use crate::grammar::{Grammar, END_OF_INPUT};
use crate::lr::{Action, LrTables};
use crate::tree::Node;

pub struct LRParser;

impl LRParser {
    /// Single-shot-fatal parse: the first error aborts with the canonical
    /// diagnostic shape from spec §6 (line, offending terminal, sorted
    /// expected set). This is the default CLI behavior (spec §7).
    pub fn parse(tokens: &[Token], grammar: &Grammar, tables: &LrTables) -> Result<Node, Error> {
        let end_position = end_of_input_position(tokens);
        let mut states = vec![0usize];
        let mut nodes: Vec<Node> = Vec::new();
        let mut idx = 0usize;

        loop {
            let state = *states.last().expect("state stack is never empty");
            let (terminal, position, lexeme) = current_terminal(tokens, idx, end_position);

            match tables.action.get(&(state, terminal.clone())) {
                Some(Action::Shift(next)) => {
                    states.push(*next);
                    nodes.push(Node::Terminal {
                        name: terminal,
                        position,
                        lexeme,
                    });
                    idx += 1;
                }
                Some(Action::Reduce(prod)) => {
                    reduce(grammar, tables, &mut states, &mut nodes, *prod)?;
                }
                Some(Action::Accept) => {
                    return finish(nodes);
                }
                None => {
                    return Err(syntax_error(tables, state, terminal, position, lexeme));
                }
            }
        }
    }

    /// Panic-mode recovery (spec §4.8/§9's permitted extension): on error,
    /// pop the state stack until a state's ACTION admits a declared `%Syn`
    /// token, discard input up to a matching token, and resume. Every
    /// error is still recorded; the caller treats a non-empty
    /// `Diagnostics` as a failed run regardless of whether a tree comes
    /// back.
    pub fn parse_with_recovery(
        tokens: &[Token],
        grammar: &Grammar,
        tables: &LrTables,
    ) -> (Option<Node>, Diagnostics) {
        let end_position = end_of_input_position(tokens);
        let mut diagnostics = Diagnostics::new();
        let mut states = vec![0usize];
        let mut nodes: Vec<Node> = Vec::new();
        let mut idx = 0usize;

        loop {
            let state = *states.last().expect("state stack is never empty");
            let (terminal, position, lexeme) = current_terminal(tokens, idx, end_position);

            match tables.action.get(&(state, terminal.clone())) {
                Some(Action::Shift(next)) => {
                    states.push(*next);
                    nodes.push(Node::Terminal {
                        name: terminal,
                        position,
                        lexeme,
                    });
                    idx += 1;
                }
                Some(Action::Reduce(prod)) => {
                    if let Err(e) = reduce(grammar, tables, &mut states, &mut nodes, *prod) {
                        diagnostics.push(Diagnostic::error(
                            Phase::Parser,
                            position.line,
                            position.column,
                            e.to_string(),
                        ));
                        return (None, diagnostics);
                    }
                }
                Some(Action::Accept) => {
                    return match finish(nodes) {
                        Ok(tree) => (Some(tree), diagnostics),
                        Err(e) => {
                            diagnostics.push(Diagnostic::error(
                                Phase::Parser,
                                position.line,
                                position.column,
                                e.to_string(),
                            ));
                            (None, diagnostics)
                        }
                    };
                }
                None => {
                    let expected = expected_terminals(tables, state);
                    diagnostics.push(Diagnostic::error(
                        Phase::Parser,
                        position.line,
                        position.column,
                        format!(
                            "unexpected {terminal} ('{lexeme}'); expected one of: {}",
                            expected.join(", ")
                        ),
                    ));

                    let mut admits_sync = admits_any_sync_token(tables, grammar, *states.last().unwrap());
                    while !admits_sync && states.len() > 1 {
                        states.pop();
                        nodes.pop();
                        admits_sync = admits_any_sync_token(tables, grammar, *states.last().unwrap());
                    }
                    if !admits_sync {
                        return (None, diagnostics);
                    }

                    while idx < tokens.len() && !grammar.sync_tokens.iter().any(|s| s == &tokens[idx].kind) {
                        idx += 1;
                    }
                    if idx >= tokens.len() {
                        return (None, diagnostics);
                    }
                }
            }
        }
    }
}

fn reduce(
    grammar: &Grammar,
    tables: &LrTables,
    states: &mut Vec<usize>,
    nodes: &mut Vec<Node>,
    prod: usize,
) -> Result<(), Error> {
    let production = &grammar.productions[prod];
    let k = production.rhs.len();
    let mut children = Vec::with_capacity(k);
    for _ in 0..k {
        states.pop();
        children.push(
            nodes
                .pop()
                .ok_or_else(|| Error::Internal("parse-tree stack underflow during reduce".to_string()))?,
        );
    }
    children.reverse();

    let lhs = production.lhs.clone();
    nodes.push(Node::NonTerminal { name: lhs.clone(), children });

    let top = *states.last().expect("state stack is never empty");
    let next_state = *tables
        .goto
        .get(&(top, lhs.clone()))
        .ok_or_else(|| Error::Internal(format!("missing GOTO entry for state {top} on '{lhs}'")))?;
    states.push(next_state);
    Ok(())
}

fn finish(mut nodes: Vec<Node>) -> Result<Node, Error> {
    if nodes.len() != 1 {
        return Err(Error::Internal(
            "parse-tree stack imbalance at ACCEPT".to_string(),
        ));
    }
    Ok(nodes.pop().unwrap())
}

fn current_terminal(tokens: &[Token], idx: usize, end_position: Position) -> (String, Position, String) {
    if idx < tokens.len() {
        let token = &tokens[idx];
        (token.kind.clone(), token.position, token.lexeme.clone())
    } else {
        (END_OF_INPUT.to_string(), end_position, String::new())
    }
}

fn end_of_input_position(tokens: &[Token]) -> Position {
    match tokens.last() {
        Some(t) => Position::new(t.position.line, t.position.column + t.lexeme.chars().count()),
        None => Position::new(1, 1),
    }
}

fn expected_terminals(tables: &LrTables, state: usize) -> Vec<String> {
    let mut expected: Vec<String> = tables
        .action
        .keys()
        .filter(|(s, _)| *s == state)
        .map(|(_, t)| t.clone())
        .collect();
    expected.sort();
    expected.dedup();
    expected
}

fn admits_any_sync_token(tables: &LrTables, grammar: &Grammar, state: usize) -> bool {
    grammar
        .sync_tokens
        .iter()
        .any(|sync| tables.action.contains_key(&(state, sync.clone())))
}

fn syntax_error(tables: &LrTables, state: usize, terminal: String, position: Position, lexeme: String) -> Error {
    let expected = expected_terminals(tables, state);
    Error::Syntax {
        line: position.line,
        terminal,
        lexeme,
        expected: expected.join(", "),
    }
}

#[cfg(test)]
mod parser_tests {
    use super::*;
    use crate::first::FirstSets;
    use crate::grammar::GrammarLoader;
    use crate::lr::LRTableBuilder;

    fn token(kind: &str, lexeme: &str, line: usize, column: usize) -> Token {
        Token::new(kind, lexeme, Position::new(line, column))
    }

    #[test]
    fn accepts_a_well_formed_sum_and_builds_a_single_tree() {
        let grammar = GrammarLoader::parse("<e> ::= <e> plus <t>\n<e> ::= <t>\n<t> ::= id\n").unwrap();
        let first_sets = FirstSets::compute(&grammar);
        let (tables, diagnostics) = LRTableBuilder::build(&grammar, &first_sets).unwrap();
        assert!(diagnostics.is_empty());

        let tokens = vec![
            token("id", "a", 1, 1),
            token("plus", "+", 1, 2),
            token("id", "b", 1, 3),
        ];
        let tree = LRParser::parse(&tokens, &grammar, &tables).unwrap();
        assert_eq!(tree.name(), "__start__");
    }

    #[test]
    fn an_unexpected_token_produces_a_syntax_error_naming_the_expected_set() {
        let grammar = GrammarLoader::parse("<e> ::= <e> plus <t>\n<e> ::= <t>\n<t> ::= id\n").unwrap();
        let first_sets = FirstSets::compute(&grammar);
        let (tables, _) = LRTableBuilder::build(&grammar, &first_sets).unwrap();

        let tokens = vec![token("plus", "+", 1, 1)];
        let err = LRParser::parse(&tokens, &grammar, &tables).unwrap_err();
        match err {
            Error::Syntax { terminal, .. } => assert_eq!(terminal, "plus"),
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    #[test]
    fn recovery_resumes_after_a_declared_sync_token() {
        let text = "%Syn semi\n<prog> ::= <stmt>\n<prog> ::= <prog> <stmt>\n<stmt> ::= id semi\n";
        let grammar = GrammarLoader::parse(text).unwrap();
        let first_sets = FirstSets::compute(&grammar);
        let (tables, _) = LRTableBuilder::build(&grammar, &first_sets).unwrap();

        let tokens = vec![
            token("id", "a", 1, 1),
            token("semi", ";", 1, 2),
            token("plus", "+", 2, 1),
            token("semi", ";", 2, 2),
            token("id", "b", 3, 1),
            token("semi", ";", 3, 2),
        ];
        let (_, diagnostics) = LRParser::parse_with_recovery(&tokens, &grammar, &tables);
        assert_eq!(diagnostics.error_count(), 1);
    }
}
