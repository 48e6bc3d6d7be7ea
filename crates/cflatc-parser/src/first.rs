//! FIRST-set computation (spec §4.6): a memoised fixed point over every
//! non-terminal's productions, exposed as `first(symbol)`,
//! `first(sequence)`, and `nullable(sequence)`.

use std::collections::{BTreeSet, HashMap};

use crate::grammar::{Grammar, Symbol, EPSILON};

#[derive(Debug, Clone, Default)]
pub struct FirstSets {
    table: HashMap<String, BTreeSet<String>>,
}

impl FirstSets {
    pub fn compute(grammar: &Grammar) -> Self {
        let mut table: HashMap<String, BTreeSet<String>> = grammar
            .non_terminals
            .iter()
            .map(|nt| (nt.clone(), BTreeSet::new()))
            .collect();

        let mut changed = true;
        while changed {
            changed = false;
            for production in &grammar.productions {
                let seq_first = Self::sequence_first(&production.rhs, &table);
                let entry = table.entry(production.lhs.clone()).or_default();
                for symbol in seq_first {
                    if entry.insert(symbol) {
                        changed = true;
                    }
                }
            }
        }

        Self { table }
    }

    pub fn first_symbol(&self, symbol: &Symbol) -> BTreeSet<String> {
        match symbol {
            Symbol::Terminal(name) => BTreeSet::from([name.clone()]),
            Symbol::NonTerminal(name) => self.table.get(name).cloned().unwrap_or_default(),
        }
    }

    pub fn first_sequence(&self, sequence: &[Symbol]) -> BTreeSet<String> {
        Self::sequence_first(sequence, &self.table)
    }

    pub fn nullable(&self, sequence: &[Symbol]) -> bool {
        self.first_sequence(sequence).contains(EPSILON)
    }

    fn sequence_first(
        sequence: &[Symbol],
        table: &HashMap<String, BTreeSet<String>>,
    ) -> BTreeSet<String> {
        if sequence.is_empty() {
            return BTreeSet::from([EPSILON.to_string()]);
        }

        let mut result = BTreeSet::new();
        for symbol in sequence {
            let symbol_first = match symbol {
                Symbol::Terminal(name) => BTreeSet::from([name.clone()]),
                Symbol::NonTerminal(name) => table.get(name).cloned().unwrap_or_default(),
            };
            let is_nullable = symbol_first.contains(EPSILON);
            result.extend(symbol_first.into_iter().filter(|s| s != EPSILON));
            if !is_nullable {
                return result;
            }
        }
        result.insert(EPSILON.to_string());
        result
    }
}

#[cfg(test)]
mod first_tests {
    use super::*;
    use crate::grammar::GrammarLoader;

    #[test]
    fn first_of_a_terminal_is_itself() {
        let grammar = GrammarLoader::parse("<s> ::= a\n").unwrap();
        let first = FirstSets::compute(&grammar);
        assert_eq!(
            first.first_symbol(&Symbol::Terminal("a".to_string())),
            BTreeSet::from(["a".to_string()])
        );
    }

    #[test]
    fn first_propagates_through_a_nullable_prefix() {
        let text = "<s> ::= <a> b\n<a> ::= $\n";
        let grammar = GrammarLoader::parse(text).unwrap();
        let first = FirstSets::compute(&grammar);
        let seq = vec![
            Symbol::NonTerminal("a".to_string()),
            Symbol::Terminal("b".to_string()),
        ];
        assert_eq!(first.first_sequence(&seq), BTreeSet::from(["b".to_string()]));
    }

    #[test]
    fn nullable_sequence_contains_epsilon_only_when_every_symbol_is_nullable() {
        let text = "<s> ::= <a> <b>\n<a> ::= $\n<b> ::= $\n";
        let grammar = GrammarLoader::parse(text).unwrap();
        let first = FirstSets::compute(&grammar);
        let seq = vec![
            Symbol::NonTerminal("a".to_string()),
            Symbol::NonTerminal("b".to_string()),
        ];
        assert!(first.nullable(&seq));
    }

    #[test]
    fn first_of_an_alternation_unions_every_alternative() {
        let text = "<s> ::= <a>\n<a> ::= x\n<a> ::= y\n";
        let grammar = GrammarLoader::parse(text).unwrap();
        let first = FirstSets::compute(&grammar);
        assert_eq!(
            first.first_symbol(&Symbol::NonTerminal("a".to_string())),
            BTreeSet::from(["x".to_string(), "y".to_string()])
        );
    }
}
