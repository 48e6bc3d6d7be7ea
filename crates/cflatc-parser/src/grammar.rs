//! Grammar specification parser and start-symbol augmentation (spec §4.5).
//!
//! Recognises `%V` (non-terminal declarations), `%T` (terminal
//! declarations), `%Syn` (panic-mode recovery sync tokens), and production
//! lines `<lhs> ::= rhs`. An empty RHS or a bare `$` both denote an
//! ε-production.

use crate::error::GrammarError;

pub const EPSILON: &str = "$";
pub const END_OF_INPUT: &str = "#";
pub const AUGMENTED_START: &str = "__start__";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Terminal(String),
    NonTerminal(String),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(n) | Symbol::NonTerminal(n) => n,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }
}

/// A production `lhs -> rhs`, where an empty `rhs` is an ε-production.
/// The index of a `Production` within [`Grammar::productions`] is its
/// REDUCE identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: String,
    pub rhs: Vec<Symbol>,
}

#[derive(Debug, Clone, Default)]
pub struct Grammar {
    pub non_terminals: Vec<String>,
    pub terminals: Vec<String>,
    pub sync_tokens: Vec<String>,
    pub productions: Vec<Production>,
}

impl Grammar {
    /// Productions with `lhs == name`, in file order.
    pub fn productions_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = (usize, &'a Production)> + 'a {
        self.productions
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.lhs == name)
    }

    pub fn augmented_start(&self) -> &str {
        AUGMENTED_START
    }
}

pub struct GrammarLoader;

impl GrammarLoader {
    pub fn parse(text: &str) -> Result<Grammar, GrammarError> {
        let mut declared_non_terminals: Vec<String> = Vec::new();
        let mut declared_terminals: Vec<String> = Vec::new();
        let mut sync_tokens: Vec<String> = Vec::new();
        let mut productions: Vec<Production> = Vec::new();
        let mut seen_lhs: Vec<String> = Vec::new();

        for (line_no, raw_line) in text.lines().enumerate() {
            let line = line_no + 1;
            let trimmed = raw_line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix("%V") {
                push_unique(&mut declared_non_terminals, rest.split_whitespace());
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix("%T") {
                push_unique(&mut declared_terminals, rest.split_whitespace());
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix("%Syn") {
                push_unique(&mut sync_tokens, rest.split_whitespace());
                continue;
            }

            let (lhs_part, rhs_part) = trimmed.split_once("::=").ok_or_else(|| {
                GrammarError::MalformedProduction {
                    line,
                    message: "expected '<lhs> ::= rhs'".to_string(),
                }
            })?;
            let lhs = parse_non_terminal(lhs_part.trim(), line)?;
            if !seen_lhs.contains(&lhs) {
                seen_lhs.push(lhs.clone());
            }

            let rhs_tokens: Vec<&str> = rhs_part.split_whitespace().collect();
            let rhs = if rhs_tokens.is_empty() || rhs_tokens == [EPSILON] {
                Vec::new()
            } else {
                rhs_tokens
                    .into_iter()
                    .map(|tok| parse_symbol(tok))
                    .collect()
            };

            productions.push(Production { lhs, rhs });
        }

        if productions.is_empty() {
            return Err(GrammarError::EmptyGrammar);
        }

        let non_terminals = if declared_non_terminals.is_empty() {
            seen_lhs.clone()
        } else {
            declared_non_terminals
        };
        let original_start = non_terminals
            .first()
            .cloned()
            .ok_or(GrammarError::EmptyGrammar)?;

        let terminals = if declared_terminals.is_empty() {
            infer_terminals(&productions)
        } else {
            declared_terminals
        };

        let mut augmented_non_terminals = vec![AUGMENTED_START.to_string()];
        augmented_non_terminals.extend(non_terminals.iter().cloned());

        let mut augmented_productions = vec![Production {
            lhs: AUGMENTED_START.to_string(),
            rhs: vec![Symbol::NonTerminal(original_start)],
        }];
        augmented_productions.extend(productions);

        let grammar = Grammar {
            non_terminals: augmented_non_terminals,
            terminals,
            sync_tokens,
            productions: augmented_productions,
        };

        validate_non_terminals_defined(&grammar)?;
        Ok(grammar)
    }
}

fn push_unique<'a>(target: &mut Vec<String>, words: impl Iterator<Item = &'a str>) {
    for word in words {
        if !target.iter().any(|w| w == word) {
            target.push(word.to_string());
        }
    }
}

fn parse_non_terminal(text: &str, line: usize) -> Result<String, GrammarError> {
    let text = text.trim();
    if !text.starts_with('<') {
        return Err(GrammarError::MalformedProduction {
            line,
            message: format!("expected a non-terminal '<...>' on the left-hand side, got '{text}'"),
        });
    }
    let Some(inner) = text.strip_prefix('<').and_then(|s| s.strip_suffix('>')) else {
        return Err(GrammarError::UnterminatedNonTerminal { line });
    };
    Ok(inner.to_string())
}

fn parse_symbol(token: &str) -> Symbol {
    if let Some(inner) = token.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        Symbol::NonTerminal(inner.to_string())
    } else {
        Symbol::Terminal(token.to_string())
    }
}

fn infer_terminals(productions: &[Production]) -> Vec<String> {
    let mut terminals = Vec::new();
    for production in productions {
        for symbol in &production.rhs {
            if let Symbol::Terminal(name) = symbol {
                if !terminals.iter().any(|t| t == name) {
                    terminals.push(name.clone());
                }
            }
        }
    }
    terminals
}

fn validate_non_terminals_defined(grammar: &Grammar) -> Result<(), GrammarError> {
    for production in &grammar.productions {
        for symbol in &production.rhs {
            if let Symbol::NonTerminal(name) = symbol {
                if grammar.productions_for(name).next().is_none() {
                    return Err(GrammarError::UndefinedNonTerminal(name.clone()));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod grammar_tests {
    use super::*;

    fn sample() -> &'static str {
        r#"
%V program stmt
%T IDN TOCKAZAREZ

<program> ::= <stmt>
<stmt> ::= IDN TOCKAZAREZ
<stmt> ::= $
"#
    }

    #[test]
    fn augments_with_a_synthetic_start_production_at_index_zero() {
        let grammar = GrammarLoader::parse(sample()).unwrap();
        assert_eq!(grammar.productions[0].lhs, AUGMENTED_START);
        assert_eq!(
            grammar.productions[0].rhs,
            vec![Symbol::NonTerminal("program".to_string())]
        );
    }

    #[test]
    fn epsilon_production_has_an_empty_rhs() {
        let grammar = GrammarLoader::parse(sample()).unwrap();
        let epsilon = grammar
            .productions
            .iter()
            .find(|p| p.lhs == "stmt" && p.rhs.is_empty());
        assert!(epsilon.is_some());
    }

    #[test]
    fn terminals_fall_back_to_inference_when_undeclared() {
        let text = "<s> ::= a b\n";
        let grammar = GrammarLoader::parse(text).unwrap();
        assert_eq!(grammar.terminals, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn reference_to_an_undefined_non_terminal_is_rejected() {
        let text = "<s> ::= <missing>\n";
        let err = GrammarLoader::parse(text).unwrap_err();
        assert_eq!(err, GrammarError::UndefinedNonTerminal("missing".to_string()));
    }

    #[test]
    fn empty_grammar_is_rejected() {
        let err = GrammarLoader::parse("   \n\n").unwrap_err();
        assert_eq!(err, GrammarError::EmptyGrammar);
    }
}
