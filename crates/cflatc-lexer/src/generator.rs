//! Lexer specification parser and per-state DFA compiler (spec §4.3).
//!
//! The specification format recognises statements by their leading
//! character: `{name} pattern` (macro), `%X s1 s2 ...` (state
//! declaration), `%L T1 T2 ...` (token declaration), and
//! `<state>pattern { actions }` (a rule, whose action block may span
//! several lines with balanced braces).

use std::collections::HashMap;

use crate::automaton::{AutomatonBuilder, Dfa};
use crate::error::SpecError;
use crate::regex::{NfaBuilder, RegexCompiler};

const MAX_MACRO_PASSES: usize = 100;

/// A single action drawn from the closed vocabulary in spec §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAction {
    EnterState(String),
    ReturnChars(usize),
    NewLine,
    Token(String),
    Discard,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub state: String,
    pub pattern: String,
    pub actions: Vec<RuleAction>,
    pub priority: usize,
    pub line: usize,
}

/// The resolved per-rule payload attached to a DFA accepting state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    pub token: Option<String>,
    pub enter_state: Option<String>,
    pub return_chars: Option<usize>,
    pub newline: bool,
    pub priority: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LexerSpec {
    pub states: Vec<String>,
    pub tokens: Vec<String>,
    pub macros: Vec<(String, String)>,
    pub rules: Vec<Rule>,
}

impl LexerSpec {
    pub fn start_state(&self) -> Option<&str> {
        self.states.first().map(String::as_str)
    }
}

const ACTION_KEYWORDS: [&str; 3] = ["UDJI_U_STANJE", "VRATI_SE", "NOVI_REDAK"];

pub struct LexerGenerator;

impl LexerGenerator {
    /// Parse a lexer specification file into its structured form.
    pub fn parse_spec(text: &str) -> Result<LexerSpec, SpecError> {
        let mut spec = LexerSpec::default();
        let mut macro_table: HashMap<String, String> = HashMap::new();
        let mut rule_priority = 0usize;

        let chars: Vec<char> = text.chars().collect();
        let mut i = 0usize;
        let mut line = 1usize;

        while i < chars.len() {
            // Skip whitespace, tracking line numbers.
            while i < chars.len() && chars[i].is_whitespace() {
                if chars[i] == '\n' {
                    line += 1;
                }
                i += 1;
            }
            if i >= chars.len() {
                break;
            }

            match chars[i] {
                '{' => {
                    let start_line = line;
                    i += 1;
                    let name_start = i;
                    while i < chars.len() && chars[i] != '}' {
                        i += 1;
                    }
                    if i >= chars.len() {
                        return Err(SpecError::MalformedMacro { line: start_line });
                    }
                    let name: String = chars[name_start..i].iter().collect();
                    i += 1; // consume '}'
                    let (pattern, new_i, new_line) = read_rest_of_line(&chars, i, line);
                    i = new_i;
                    line = new_line;
                    let pattern = pattern.trim().to_string();
                    if name.is_empty() || pattern.is_empty() {
                        return Err(SpecError::MalformedMacro { line: start_line });
                    }
                    macro_table.insert(name.clone(), pattern.clone());
                    spec.macros.push((name, pattern));
                }
                '%' => {
                    let decl_line = line;
                    let (decl, new_i, new_line) = read_rest_of_line(&chars, i, line);
                    i = new_i;
                    line = new_line;
                    let mut words = decl.split_whitespace();
                    match words.next() {
                        Some("%X") => {
                            spec.states.extend(words.map(str::to_string));
                        }
                        Some("%L") => {
                            for name in words {
                                if ACTION_KEYWORDS.contains(&name) {
                                    return Err(SpecError::TokenNameCollidesWithKeyword {
                                        line: decl_line,
                                        name: name.to_string(),
                                    });
                                }
                                spec.tokens.push(name.to_string());
                            }
                        }
                        _ => {}
                    }
                }
                '<' => {
                    let start_line = line;
                    i += 1;
                    let state_start = i;
                    while i < chars.len() && chars[i] != '>' {
                        i += 1;
                    }
                    if i >= chars.len() {
                        return Err(SpecError::MalformedRule {
                            line: start_line,
                            message: "unterminated state marker".into(),
                        });
                    }
                    let state: String = chars[state_start..i].iter().collect();
                    i += 1; // consume '>'

                    let (raw_pattern, brace_index) = read_pattern_until_brace(&chars, i);
                    // Advance line counter across the pattern text.
                    for c in raw_pattern.chars() {
                        if c == '\n' {
                            line += 1;
                        }
                    }
                    i = brace_index;
                    if i >= chars.len() || chars[i] != '{' {
                        return Err(SpecError::MalformedRule {
                            line: start_line,
                            message: "expected '{' to start the action block".into(),
                        });
                    }
                    let (action_text, new_i, new_line) = read_balanced_braces(&chars, i, line)?;
                    i = new_i;
                    line = new_line;

                    let pattern = resolve_literal_or_regex(raw_pattern.trim());
                    let actions = parse_actions(&action_text, start_line)?;

                    spec.rules.push(Rule {
                        state,
                        pattern,
                        actions,
                        priority: rule_priority,
                        line: start_line,
                    });
                    rule_priority += 1;
                }
                _ => {
                    // Unrecognised statement: skip to end of line.
                    let (_, new_i, new_line) = read_rest_of_line(&chars, i, line);
                    i = new_i;
                    line = new_line;
                }
            }
        }

        if spec.states.is_empty() {
            return Err(SpecError::NoStartState);
        }
        for rule in &spec.rules {
            if !spec.states.contains(&rule.state) {
                return Err(SpecError::UndeclaredState {
                    line: rule.line,
                    state: rule.state.clone(),
                });
            }
            for action in &rule.actions {
                if let RuleAction::EnterState(target) = action {
                    if !spec.states.contains(target) {
                        return Err(SpecError::UndeclaredState {
                            line: rule.line,
                            state: target.clone(),
                        });
                    }
                }
            }
        }

        expand_macros(&mut spec, &macro_table)?;
        Ok(spec)
    }

    /// Compile every rule into one DFA per declared state (spec §4.3).
    pub fn build(spec: &LexerSpec) -> Result<HashMap<String, Dfa<CompiledRule>>, SpecError> {
        let mut result = HashMap::new();
        for state in &spec.states {
            let rules_for_state: Vec<&Rule> =
                spec.rules.iter().filter(|r| &r.state == state).collect();
            let mut builder = NfaBuilder::new();
            let shared_start = builder.new_state();
            let mut accepting = HashMap::new();

            for rule in &rules_for_state {
                let frag = RegexCompiler::compile(&mut builder, &rule.pattern).map_err(|e| {
                    SpecError::Regex {
                        line: rule.line,
                        source: e,
                    }
                })?;
                builder.add_epsilon(shared_start, frag.start);
                let compiled = compiled_rule_from(rule);
                accepting.insert(frag.accept, (rule.priority, compiled));
            }

            let dfa = AutomatonBuilder::build(&builder, shared_start, &accepting);
            result.insert(state.clone(), dfa);
        }
        Ok(result)
    }
}

fn compiled_rule_from(rule: &Rule) -> CompiledRule {
    let mut token = None;
    let mut enter_state = None;
    let mut return_chars = None;
    let mut newline = false;
    for action in &rule.actions {
        match action {
            RuleAction::Token(name) => token = Some(name.clone()),
            RuleAction::EnterState(s) => enter_state = Some(s.clone()),
            RuleAction::ReturnChars(n) => return_chars = Some(*n),
            RuleAction::NewLine => newline = true,
            RuleAction::Discard => {}
        }
    }
    CompiledRule {
        token,
        enter_state,
        return_chars,
        newline,
        priority: rule.priority,
    }
}

fn read_rest_of_line(chars: &[char], mut i: usize, mut line: usize) -> (String, usize, usize) {
    let start = i;
    while i < chars.len() && chars[i] != '\n' {
        i += 1;
    }
    let text: String = chars[start..i].iter().collect();
    if i < chars.len() {
        line += 1;
        i += 1;
    }
    (text, i, line)
}

/// Read the rule pattern up to (but not including) the `{` that starts the
/// action block, respecting double-quoted literals so a `{` inside a
/// quoted pattern does not terminate it early. A `{name}` macro reference
/// (identifier characters only, no whitespace) is distinguished from the
/// action block's opening brace and consumed as part of the pattern.
fn read_pattern_until_brace(chars: &[char], mut i: usize) -> (String, usize) {
    let start = i;
    let mut in_quotes = false;
    while i < chars.len() {
        match chars[i] {
            '"' => {
                in_quotes = !in_quotes;
                i += 1;
            }
            '{' if !in_quotes => {
                if let Some(close) = macro_reference_end(chars, i) {
                    i = close + 1;
                } else {
                    break;
                }
            }
            _ => i += 1,
        }
    }
    (chars[start..i].iter().collect(), i)
}

/// If `chars[open]` is `{` and the text up to the matching `}` is a bare
/// identifier with no whitespace, return the index of that `}`.
fn macro_reference_end(chars: &[char], open: usize) -> Option<usize> {
    let mut j = open + 1;
    if j >= chars.len() || chars[j] == '}' {
        return None;
    }
    while j < chars.len() && chars[j] != '}' {
        if chars[j].is_whitespace() {
            return None;
        }
        j += 1;
    }
    if j < chars.len() {
        Some(j)
    } else {
        None
    }
}

fn read_balanced_braces(
    chars: &[char],
    mut i: usize,
    mut line: usize,
) -> Result<(String, usize, usize), SpecError> {
    debug_assert_eq!(chars[i], '{');
    let open_line = line;
    let mut depth = 0usize;
    let start = i;
    loop {
        if i >= chars.len() {
            return Err(SpecError::MalformedRule {
                line: open_line,
                message: "unbalanced '{' in action block".into(),
            });
        }
        match chars[i] {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    i += 1;
                    break;
                }
            }
            '\n' => line += 1,
            _ => {}
        }
        i += 1;
    }
    let inner: String = chars[start + 1..i - 1].iter().collect();
    Ok((inner, i, line))
}

fn parse_actions(text: &str, line: usize) -> Result<Vec<RuleAction>, SpecError> {
    let mut actions = Vec::new();
    let mut words = text.split_whitespace().peekable();
    while let Some(word) = words.next() {
        match word {
            "UDJI_U_STANJE" => {
                let state = words.next().ok_or_else(|| SpecError::MalformedRule {
                    line,
                    message: "UDJI_U_STANJE requires a state name".into(),
                })?;
                actions.push(RuleAction::EnterState(state.to_string()));
            }
            "VRATI_SE" => {
                let n = words.next().ok_or_else(|| SpecError::MalformedRule {
                    line,
                    message: "VRATI_SE requires a character count".into(),
                })?;
                let n: usize = n.parse().map_err(|_| SpecError::MalformedRule {
                    line,
                    message: format!("VRATI_SE expects an integer, got '{n}'"),
                })?;
                actions.push(RuleAction::ReturnChars(n));
            }
            "NOVI_REDAK" => actions.push(RuleAction::NewLine),
            "-" => actions.push(RuleAction::Discard),
            name => actions.push(RuleAction::Token(name.to_string())),
        }
    }

    let return_count = actions
        .iter()
        .filter(|a| matches!(a, RuleAction::ReturnChars(_)))
        .count();
    if return_count > 1 {
        return Err(SpecError::MultipleReturnActions { line });
    }
    Ok(actions)
}

/// Discriminate a literal pattern from a regex pattern per spec §4.3: a
/// pattern beginning with `"` has its quotes stripped if the quoted
/// content contains no regex operators outside escapes; otherwise the
/// quotes are kept as literal characters of the pattern.
fn resolve_literal_or_regex(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        let inner = &raw[1..raw.len() - 1];
        if contains_unescaped_regex_operator(inner) {
            raw.to_string()
        } else {
            inner.to_string()
        }
    } else {
        raw.to_string()
    }
}

fn contains_unescaped_regex_operator(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.next();
            continue;
        }
        if matches!(c, '|' | '*' | '(' | ')' | '{' | '}') {
            return true;
        }
    }
    false
}

/// Expand `{name}` macro references to a fixed point, bounded at
/// `MAX_MACRO_PASSES` passes (spec §4.3, §5). Every expansion wraps the
/// substitution in parentheses to preserve operator precedence.
fn expand_macros(spec: &mut LexerSpec, macros: &HashMap<String, String>) -> Result<(), SpecError> {
    for rule in &mut spec.rules {
        rule.pattern = expand_one(&rule.pattern, macros, rule.line)?;
    }
    Ok(())
}

fn expand_one(pattern: &str, macros: &HashMap<String, String>, line: usize) -> Result<String, SpecError> {
    let mut current = pattern.to_string();
    for _ in 0..MAX_MACRO_PASSES {
        let (expanded, changed) = expand_pass(&current, macros, line)?;
        if !changed {
            return Ok(expanded);
        }
        current = expanded;
    }
    Err(SpecError::MacroExpansionOverflow)
}

fn expand_pass(
    pattern: &str,
    macros: &HashMap<String, String>,
    line: usize,
) -> Result<(String, bool), SpecError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0usize;
    let mut changed = false;
    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() {
            out.push(chars[i]);
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if chars[i] == '{' {
            let name_start = i + 1;
            let mut j = name_start;
            while j < chars.len() && chars[j] != '}' {
                j += 1;
            }
            if j < chars.len() {
                let name: String = chars[name_start..j].iter().collect();
                let replacement = macros
                    .get(&name)
                    .ok_or_else(|| SpecError::UndefinedMacro {
                        line,
                        name: name.clone(),
                    })?;
                out.push('(');
                out.push_str(replacement);
                out.push(')');
                i = j + 1;
                changed = true;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    Ok((out, changed))
}

#[cfg(test)]
mod generator_tests {
    use super::*;

    fn sample_spec() -> &'static str {
        r#"
{digit} 0|1|2|3|4|5|6|7|8|9
{digits} {digit}{digit}*

%X POCETNO
%L BROJ IDN KR_IF

<POCETNO>if { KR_IF }
<POCETNO>{digits} { BROJ }
<POCETNO>a|b|c|d|e|f|g|h|i|j|k|l|m|n|o|p|q|r|s|t|u|v|w|x|y|z { IDN }
<POCETNO>\_ { - }
"#
    }

    #[test]
    fn parses_macros_states_tokens_and_rules() {
        let spec = LexerGenerator::parse_spec(sample_spec()).unwrap();
        assert_eq!(spec.states, vec!["POCETNO".to_string()]);
        assert_eq!(spec.tokens, vec!["BROJ", "IDN", "KR_IF"]);
        assert_eq!(spec.rules.len(), 4);
        assert_eq!(spec.rules[0].pattern, "if");
    }

    #[test]
    fn macro_expansion_reaches_fixed_point() {
        let spec = LexerGenerator::parse_spec(sample_spec()).unwrap();
        let digits_rule = &spec.rules[1];
        assert!(digits_rule.pattern.contains('('));
    }

    #[test]
    fn rule_priority_follows_source_order() {
        let spec = LexerGenerator::parse_spec(sample_spec()).unwrap();
        assert_eq!(spec.rules[0].priority, 0);
        assert_eq!(spec.rules[1].priority, 1);
        assert_eq!(spec.rules[2].priority, 2);
    }

    #[test]
    fn declared_token_colliding_with_action_keyword_is_rejected() {
        let text = "%X S\n%L VRATI_SE\n<S>a { VRATI_SE 1 }\n";
        let err = LexerGenerator::parse_spec(text).unwrap_err();
        assert_eq!(
            err,
            SpecError::TokenNameCollidesWithKeyword {
                line: 2,
                name: "VRATI_SE".to_string(),
            }
        );
    }

    #[test]
    fn rule_in_undeclared_state_is_rejected() {
        let text = "%X S\n<OTHER>a { T }\n";
        let err = LexerGenerator::parse_spec(text).unwrap_err();
        assert_eq!(
            err,
            SpecError::UndeclaredState {
                line: 2,
                state: "OTHER".to_string(),
            }
        );
    }

    #[test]
    fn multiple_return_actions_are_rejected() {
        let text = "%X S\n<S>a { VRATI_SE 1 VRATI_SE 2 }\n";
        let err = LexerGenerator::parse_spec(text).unwrap_err();
        assert_eq!(err, SpecError::MultipleReturnActions { line: 2 });
    }

    #[test]
    fn literal_with_no_operators_has_quotes_stripped() {
        assert_eq!(resolve_literal_or_regex("\"if\""), "if");
    }

    #[test]
    fn literal_with_operators_keeps_quotes() {
        assert_eq!(resolve_literal_or_regex("\"a|b\""), "\"a|b\"");
    }

    #[test]
    fn build_compiles_one_dfa_per_state() {
        let spec = LexerGenerator::parse_spec(sample_spec()).unwrap();
        let dfas = LexerGenerator::build(&spec).unwrap();
        assert!(dfas.contains_key("POCETNO"));
    }
}
