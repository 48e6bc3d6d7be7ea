//! Canonical LR(1) item-set construction and ACTION/GOTO table builder
//! (spec §4.7).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Error, TableError};
use crate::first::FirstSets;
use crate::grammar::{Grammar, Symbol, END_OF_INPUT, EPSILON};

const MAX_CLOSURE_PASSES: usize = 1_000;
const MAX_ITEM_SETS: usize = 50_000;

/// Item set keyed by `(production, dot)`, lookaheads merged per spec §4.7:
/// "if an item with the same (production, dot) already exists, union
/// lookaheads." A `BTreeMap` keeps iteration order canonical so two
/// equivalent item sets compare equal regardless of construction order.
type ItemSet = BTreeMap<(usize, usize), BTreeSet<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Shift(usize),
    Reduce(usize),
    Accept,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LrTables {
    pub state_count: usize,
    pub action: HashMap<(usize, String), Action>,
    pub goto: HashMap<(usize, String), usize>,
}

pub struct LRTableBuilder;

impl LRTableBuilder {
    /// Build the canonical LR(1) tables for `grammar`. Returns the tables
    /// plus human-readable conflict diagnostics (every conflict is
    /// resolved per spec §4.7, but always reported).
    pub fn build(grammar: &Grammar, first_sets: &FirstSets) -> Result<(LrTables, Vec<String>), Error> {
        let mut initial_core: ItemSet = BTreeMap::new();
        initial_core.insert((0, 0), BTreeSet::from([END_OF_INPUT.to_string()]));
        let initial = closure(grammar, first_sets, initial_core)?;

        let mut states: Vec<ItemSet> = vec![initial];
        let mut worklist: Vec<usize> = vec![0];
        let mut action: HashMap<(usize, String), Action> = HashMap::new();
        let mut goto_table: HashMap<(usize, String), usize> = HashMap::new();
        let mut diagnostics: Vec<String> = Vec::new();

        while let Some(state_idx) = worklist.pop() {
            let item_set = states[state_idx].clone();

            let mut symbols: BTreeSet<Symbol> = BTreeSet::new();
            for (&(prod, dot), _) in &item_set {
                let production = &grammar.productions[prod];
                if dot < production.rhs.len() {
                    symbols.insert(production.rhs[dot].clone());
                }
            }

            for symbol in &symbols {
                let target = goto(grammar, first_sets, &item_set, symbol)?;
                if target.is_empty() {
                    continue;
                }
                let target_idx = match states.iter().position(|s| s == &target) {
                    Some(idx) => idx,
                    None => {
                        states.push(target);
                        if states.len() > MAX_ITEM_SETS {
                            return Err(TableError::ItemSetOverflow.into());
                        }
                        let idx = states.len() - 1;
                        worklist.push(idx);
                        idx
                    }
                };

                match symbol {
                    Symbol::Terminal(t) => {
                        let key = (state_idx, t.clone());
                        match action.get(&key) {
                            Some(Action::Reduce(_)) => {
                                diagnostics.push(format!(
                                    "shift/reduce conflict in state {state_idx} on '{t}': resolved as shift"
                                ));
                                action.insert(key, Action::Shift(target_idx));
                            }
                            _ => {
                                action.insert(key, Action::Shift(target_idx));
                            }
                        }
                    }
                    Symbol::NonTerminal(n) => {
                        goto_table.insert((state_idx, n.clone()), target_idx);
                    }
                }
            }

            for (&(prod, dot), lookaheads) in &item_set {
                let production = &grammar.productions[prod];
                if dot != production.rhs.len() {
                    continue;
                }
                if prod == 0 {
                    action.insert((state_idx, END_OF_INPUT.to_string()), Action::Accept);
                    continue;
                }
                for la in lookaheads {
                    let key = (state_idx, la.clone());
                    match action.get(&key) {
                        Some(Action::Shift(_)) => {
                            diagnostics.push(format!(
                                "shift/reduce conflict in state {state_idx} on '{la}': resolved as shift"
                            ));
                        }
                        Some(Action::Reduce(existing)) => {
                            let existing = *existing;
                            if prod < existing {
                                diagnostics.push(format!(
                                    "reduce/reduce conflict in state {state_idx} on '{la}': resolved in favor of production {prod}"
                                ));
                                action.insert(key, Action::Reduce(prod));
                            } else if prod > existing {
                                diagnostics.push(format!(
                                    "reduce/reduce conflict in state {state_idx} on '{la}': resolved in favor of production {existing}"
                                ));
                            }
                        }
                        Some(Action::Accept) => {}
                        None => {
                            action.insert(key, Action::Reduce(prod));
                        }
                    }
                }
            }
        }

        Ok((
            LrTables {
                state_count: states.len(),
                action,
                goto: goto_table,
            },
            diagnostics,
        ))
    }
}

/// CLOSURE per spec §4.7: repeatedly add items for non-terminals
/// immediately after the dot, computing lookaheads from FIRST(βL).
fn closure(grammar: &Grammar, first_sets: &FirstSets, mut items: ItemSet) -> Result<ItemSet, Error> {
    for _ in 0..MAX_CLOSURE_PASSES {
        let mut changed = false;
        let snapshot: Vec<((usize, usize), BTreeSet<String>)> =
            items.iter().map(|(k, v)| (*k, v.clone())).collect();

        for ((prod, dot), lookaheads) in snapshot {
            let production = &grammar.productions[prod];
            if dot >= production.rhs.len() {
                continue;
            }
            let Symbol::NonTerminal(target) = &production.rhs[dot] else {
                continue;
            };
            let beta = &production.rhs[dot + 1..];
            let beta_first = first_sets.first_sequence(beta);
            let mut t: BTreeSet<String> = beta_first
                .iter()
                .filter(|s| s.as_str() != EPSILON)
                .cloned()
                .collect();
            if beta_first.contains(EPSILON) {
                t.extend(lookaheads.iter().cloned());
            }

            for (q, candidate) in grammar.productions.iter().enumerate() {
                if &candidate.lhs != target {
                    continue;
                }
                let entry = items.entry((q, 0)).or_default();
                for symbol in &t {
                    if entry.insert(symbol.clone()) {
                        changed = true;
                    }
                }
            }
        }

        if !changed {
            return Ok(items);
        }
    }
    Err(TableError::ClosureOverflow.into())
}

/// GOTO(I, X) per spec §4.7: advance the dot over `symbol`, then close.
fn goto(
    grammar: &Grammar,
    first_sets: &FirstSets,
    items: &ItemSet,
    symbol: &Symbol,
) -> Result<ItemSet, Error> {
    let mut moved: ItemSet = BTreeMap::new();
    for (&(prod, dot), lookaheads) in items {
        let production = &grammar.productions[prod];
        if dot < production.rhs.len() && &production.rhs[dot] == symbol {
            moved
                .entry((prod, dot + 1))
                .or_default()
                .extend(lookaheads.iter().cloned());
        }
    }
    if moved.is_empty() {
        return Ok(moved);
    }
    closure(grammar, first_sets, moved)
}

#[cfg(test)]
mod lr_tests {
    use super::*;
    use crate::grammar::GrammarLoader;

    /// Classic textbook grammar: E -> E + T | T ; T -> id
    fn arithmetic_grammar() -> &'static str {
        "<e> ::= <e> plus <t>\n<e> ::= <t>\n<t> ::= id\n"
    }

    #[test]
    fn builds_tables_that_accept_a_simple_sum() {
        let grammar = GrammarLoader::parse(arithmetic_grammar()).unwrap();
        let first_sets = FirstSets::compute(&grammar);
        let (tables, diagnostics) = LRTableBuilder::build(&grammar, &first_sets).unwrap();
        assert!(diagnostics.is_empty(), "unexpected conflicts: {diagnostics:?}");
        assert!(tables.state_count > 1);
        assert!(tables
            .action
            .values()
            .any(|a| matches!(a, Action::Accept)));
    }

    #[test]
    fn an_ambiguous_dangling_else_style_grammar_resolves_shift_reduce_as_shift() {
        let text = "<s> ::= if <s>\n<s> ::= if <s> else <s>\n<s> ::= other\n";
        let grammar = GrammarLoader::parse(text).unwrap();
        let first_sets = FirstSets::compute(&grammar);
        let (_, diagnostics) = LRTableBuilder::build(&grammar, &first_sets).unwrap();
        assert!(diagnostics.iter().any(|d| d.contains("shift/reduce")));
    }
}
