//! Integer and character/string literal parsing shared by the checker and
//! the code generator — both need the exact same literal value, not just
//! a validity check (spec §4.11's literal rules).

/// Decimal, octal (`0...`), and `0x`/`0X` hexadecimal integer literals.
pub fn parse_c_integer(lexeme: &str) -> Option<i64> {
    if let Some(hex) = lexeme.strip_prefix("0x").or_else(|| lexeme.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else if lexeme.len() > 1 && lexeme.starts_with('0') {
        i64::from_str_radix(&lexeme[1..], 8).ok()
    } else {
        lexeme.parse().ok()
    }
}

/// Processes C-style escapes from {`\n`, `\t`, `\0`, `\'`, `\"`, `\\`};
/// any other backslash sequence is rejected (spec §4.11's character
/// literal rule). `s` is the literal's contents with the surrounding
/// quotes already stripped.
pub fn process_escapes(s: &str) -> Result<Vec<char>, String> {
    let mut out = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            let escaped = chars.next().ok_or_else(|| "unterminated escape sequence".to_string())?;
            let resolved = match escaped {
                'n' => '\n',
                't' => '\t',
                '0' => '\0',
                '\'' => '\'',
                '"' => '"',
                '\\' => '\\',
                other => return Err(format!("invalid escape sequence '\\{other}'")),
            };
            out.push(resolved);
        } else if c == '\'' || c == '\n' {
            return Err("unescaped quote or newline in literal".to_string());
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod literals_tests {
    use super::*;

    #[test]
    fn parses_decimal_octal_and_hex() {
        assert_eq!(parse_c_integer("42"), Some(42));
        assert_eq!(parse_c_integer("052"), Some(42));
        assert_eq!(parse_c_integer("0x2A"), Some(42));
    }

    #[test]
    fn rejects_unknown_escape_sequences() {
        assert!(process_escapes("a\\qb").is_err());
    }

    #[test]
    fn resolves_known_escapes() {
        assert_eq!(process_escapes("a\\nb").unwrap(), vec!['a', '\n', 'b']);
    }
}
