//! Rewrites the JavaScript array literals embedded in SAIH pages as JSON.
//!
//! The pages are produced by a template engine, not a JSON serializer, so
//! object keys may be bare identifiers, strings may use single quotes and
//! the last element may carry a trailing comma. Nothing is ever evaluated:
//! anything the rewrite does not understand is passed through and left for
//! `serde_json` to reject.

use serde_json::{Map, Value};

use crate::fetch_error::FetchError;

/// Decode an array of objects from a JavaScript-style literal
pub fn decode_object_array(literal: &str) -> Result<Vec<Map<String, Value>>, FetchError> {
    let json = to_json(literal)?;
    serde_json::from_str(&json).map_err(|e| FetchError::ChartDataDecode(e.to_string()))
}

/// Convert a relaxed JavaScript literal into strict JSON text
pub fn to_json(literal: &str) -> Result<String, FetchError> {
    let chars: Vec<char> = literal.chars().collect();
    let mut out = String::with_capacity(literal.len() + literal.len() / 4);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => {
                i = copy_string(&chars, i, &mut out)?;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                if i + 1 >= chars.len() {
                    return Err(FetchError::ChartDataDecode(
                        "unterminated comment".to_string(),
                    ));
                }
                i += 2;
            }
            ',' => {
                // Trailing comma before a closing bracket is dropped
                let next = next_significant(&chars, i + 1);
                if !matches!(next, Some(']') | Some('}')) {
                    out.push(',');
                }
                i += 1;
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_part(chars[i]) {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().collect();
                if next_significant(&chars, i) == Some(':') {
                    out.push('"');
                    out.push_str(&ident);
                    out.push('"');
                } else {
                    out.push_str(&ident);
                }
            }
            '.' => {
                // JSON needs digits on both sides of the point: .5 -> 0.5, 5. -> 5.0
                let digit_before = out.chars().last().is_some_and(|p| p.is_ascii_digit());
                let digit_after = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
                if digit_after && !digit_before {
                    out.push('0');
                }
                out.push('.');
                if digit_before && !digit_after {
                    out.push('0');
                }
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(out)
}

/// Copy a quoted string starting at `start` as a double-quoted JSON string,
/// returning the index just past the closing quote
fn copy_string(chars: &[char], start: usize, out: &mut String) -> Result<usize, FetchError> {
    let quote = chars[start];
    let mut i = start + 1;
    out.push('"');

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            let escaped = *chars.get(i + 1).ok_or_else(|| {
                FetchError::ChartDataDecode("unterminated escape sequence".to_string())
            })?;
            if escaped == '\'' {
                out.push('\'');
            } else {
                out.push('\\');
                out.push(escaped);
            }
            i += 2;
        } else if c == quote {
            out.push('"');
            return Ok(i + 1);
        } else if c == '"' {
            out.push_str("\\\"");
            i += 1;
        } else {
            out.push(c);
            i += 1;
        }
    }

    Err(FetchError::ChartDataDecode(
        "unterminated string literal".to_string(),
    ))
}

/// Next character that is neither whitespace nor inside a comment
fn next_significant(chars: &[char], from: usize) -> Option<char> {
    let mut i = from;
    while i < chars.len() {
        match (chars[i], chars.get(i + 1)) {
            (c, _) if c.is_whitespace() => i += 1,
            ('/', Some('/')) => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i += 2;
            }
            (c, _) => return Some(c),
        }
    }
    None
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
