//! Regex compiler: Thompson construction (spec §4.1).
//!
//! A recursive-descent compiler over the supported subset: alphabet
//! characters, `$` (ε), concatenation, alternation (`|`), Kleene star
//! (`*`), grouping `(...)`, and the escapes `\n`, `\t`, `\_`, `\c`.
//! Precedence, highest to lowest: group > star > concatenation >
//! alternation.
//!
//! Per the "recursive regex descent" design note in spec §9, state IDs come
//! from a shared counter (`NfaBuilder`) threaded through the recursion by
//! `&mut` reference, so several patterns can be compiled into one shared
//! automaton (spec §4.3's per-state NFA union).

use std::collections::HashMap;

use crate::error::RegexError;

pub type StateId = u32;

/// Growable ε-NFA under construction. Multiple regex fragments can share
/// one builder so a lexer state's rules end up in a single automaton.
#[derive(Debug, Default, Clone)]
pub struct NfaBuilder {
    next_state: StateId,
    /// (state, symbol) -> destination states.
    pub transitions: HashMap<(StateId, char), Vec<StateId>>,
    /// state -> ε-destination states.
    pub epsilons: HashMap<StateId, Vec<StateId>>,
}

impl NfaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_state(&mut self) -> StateId {
        let id = self.next_state;
        self.next_state += 1;
        id
    }

    pub fn add_epsilon(&mut self, from: StateId, to: StateId) {
        self.epsilons.entry(from).or_default().push(to);
    }

    pub fn add_transition(&mut self, from: StateId, symbol: char, to: StateId) {
        self.transitions.entry((from, symbol)).or_default().push(to);
    }

    pub fn state_count(&self) -> usize {
        self.next_state as usize
    }
}

/// A compiled regex fragment: its start and accepting state within a
/// shared `NfaBuilder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment {
    pub start: StateId,
    pub accept: StateId,
}

pub struct RegexCompiler;

impl RegexCompiler {
    /// Compile `pattern` into a fresh fragment within `builder`.
    pub fn compile(builder: &mut NfaBuilder, pattern: &str) -> Result<Fragment, RegexError> {
        if pattern.is_empty() {
            return Err(RegexError::EmptyRegex);
        }
        let chars: Vec<char> = pattern.chars().collect();
        let mut pos = 0usize;
        let frag = parse_alternation(builder, &chars, &mut pos)?;
        if pos != chars.len() {
            return Err(RegexError::TrailingInput(pos));
        }
        Ok(frag)
    }
}

/// alternation := concatenation ('|' concatenation)*
fn parse_alternation(
    builder: &mut NfaBuilder,
    chars: &[char],
    pos: &mut usize,
) -> Result<Fragment, RegexError> {
    let mut branches = vec![parse_concatenation(builder, chars, pos)?];
    while *pos < chars.len() && chars[*pos] == '|' {
        *pos += 1;
        branches.push(parse_concatenation(builder, chars, pos)?);
    }
    if branches.len() == 1 {
        return Ok(branches.pop().unwrap());
    }
    let start = builder.new_state();
    let accept = builder.new_state();
    for branch in branches {
        builder.add_epsilon(start, branch.start);
        builder.add_epsilon(branch.accept, accept);
    }
    Ok(Fragment { start, accept })
}

/// concatenation := atom-with-star*
fn parse_concatenation(
    builder: &mut NfaBuilder,
    chars: &[char],
    pos: &mut usize,
) -> Result<Fragment, RegexError> {
    let mut pieces = Vec::new();
    while *pos < chars.len() && chars[*pos] != '|' && chars[*pos] != ')' {
        pieces.push(parse_starred_atom(builder, chars, pos)?);
    }
    match pieces.len() {
        0 => {
            // An empty concatenation behaves as ε.
            let s = builder.new_state();
            let a = builder.new_state();
            builder.add_epsilon(s, a);
            Ok(Fragment { start: s, accept: a })
        }
        1 => Ok(pieces.pop().unwrap()),
        _ => {
            for window in pieces.windows(2) {
                builder.add_epsilon(window[0].accept, window[1].start);
            }
            Ok(Fragment {
                start: pieces.first().unwrap().start,
                accept: pieces.last().unwrap().accept,
            })
        }
    }
}

/// atom-with-star := atom '*'?
fn parse_starred_atom(
    builder: &mut NfaBuilder,
    chars: &[char],
    pos: &mut usize,
) -> Result<Fragment, RegexError> {
    if chars[*pos] == '*' {
        return Err(RegexError::DanglingStar(*pos));
    }
    let atom = parse_atom(builder, chars, pos)?;
    if *pos < chars.len() && chars[*pos] == '*' {
        *pos += 1;
        return Ok(star_closure(builder, atom));
    }
    Ok(atom)
}

/// Standard Kleene-star subgraph: new start/accept, ε in four positions.
fn star_closure(builder: &mut NfaBuilder, frag: Fragment) -> Fragment {
    let start = builder.new_state();
    let accept = builder.new_state();
    builder.add_epsilon(start, frag.start);
    builder.add_epsilon(start, accept);
    builder.add_epsilon(frag.accept, frag.start);
    builder.add_epsilon(frag.accept, accept);
    Fragment { start, accept }
}

fn parse_atom(
    builder: &mut NfaBuilder,
    chars: &[char],
    pos: &mut usize,
) -> Result<Fragment, RegexError> {
    match chars[*pos] {
        '(' => {
            let open = *pos;
            *pos += 1;
            let inner = parse_alternation(builder, chars, pos)?;
            if *pos >= chars.len() || chars[*pos] != ')' {
                return Err(RegexError::UnmatchedOpenParen(open));
            }
            *pos += 1;
            Ok(inner)
        }
        ')' => Err(RegexError::UnmatchedCloseParen(*pos)),
        '$' => {
            *pos += 1;
            let s = builder.new_state();
            let a = builder.new_state();
            builder.add_epsilon(s, a);
            Ok(Fragment { start: s, accept: a })
        }
        '\\' => {
            let escape_pos = *pos;
            *pos += 1;
            if *pos >= chars.len() {
                return Err(RegexError::UnterminatedEscape(escape_pos));
            }
            let escaped = chars[*pos];
            *pos += 1;
            let literal = match escaped {
                'n' => '\n',
                't' => '\t',
                '_' => ' ',
                c => c,
            };
            Ok(literal_fragment(builder, literal))
        }
        c => {
            *pos += 1;
            Ok(literal_fragment(builder, c))
        }
    }
}

fn literal_fragment(builder: &mut NfaBuilder, c: char) -> Fragment {
    let s = builder.new_state();
    let a = builder.new_state();
    builder.add_transition(s, c, a);
    Fragment { start: s, accept: a }
}

#[cfg(test)]
mod regex_tests {
    use super::*;
    use crate::automaton::AutomatonBuilder;

    fn accepts(pattern: &str, input: &str) -> bool {
        let mut builder = NfaBuilder::new();
        let frag = RegexCompiler::compile(&mut builder, pattern).unwrap();
        let mut accepting = HashMap::new();
        accepting.insert(frag.accept, (0usize, ()));
        let dfa = AutomatonBuilder::build(&builder, frag.start, &accepting);
        dfa.run_to_completion(input)
    }

    #[test]
    fn literal_concatenation() {
        assert!(accepts("abc", "abc"));
        assert!(!accepts("abc", "abd"));
    }

    #[test]
    fn alternation() {
        assert!(accepts("a|b", "a"));
        assert!(accepts("a|b", "b"));
        assert!(!accepts("a|b", "c"));
    }

    #[test]
    fn kleene_star() {
        assert!(accepts("a*", ""));
        assert!(accepts("a*", "aaaa"));
        assert!(!accepts("a*", "aaab"));
    }

    #[test]
    fn grouping_changes_precedence() {
        assert!(accepts("(ab)*", "abab"));
        assert!(!accepts("(ab)*", "aba"));
    }

    #[test]
    fn escapes() {
        assert!(accepts(r"a\_b", "a b"));
        assert!(accepts(r"a\nb", "a\nb"));
        assert!(accepts(r"a\*b", "a*b"));
    }

    #[test]
    fn star_binds_tighter_than_concatenation() {
        // ab* means a(b*), not (ab)*
        assert!(accepts("ab*", "a"));
        assert!(accepts("ab*", "abbb"));
        assert!(!accepts("ab*", "ababab"));
    }

    #[test]
    fn concatenation_binds_tighter_than_alternation() {
        // ab|c means (ab)|c
        assert!(accepts("ab|c", "ab"));
        assert!(accepts("ab|c", "c"));
        assert!(!accepts("ab|c", "a"));
    }

    #[test]
    fn unmatched_paren_is_rejected() {
        let mut builder = NfaBuilder::new();
        assert!(RegexCompiler::compile(&mut builder, "(ab").is_err());
    }

    #[test]
    fn dangling_star_is_rejected() {
        let mut builder = NfaBuilder::new();
        assert!(RegexCompiler::compile(&mut builder, "*ab").is_err());
    }
}
