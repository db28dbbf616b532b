//! Splitting DEFINE items into expression tokens.

use serde::{Deserialize, Serialize};

use super::enums::UdqTokenType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UdqToken {
    pub value: String,
    pub kind: UdqTokenType,
    /// Entity qualifiers of a quantity: well/group name, segment number.
    pub selector: Vec<String>,
}

impl UdqToken {
    fn new(value: String) -> Self {
        Self {
            kind: UdqTokenType::of(&value),
            value,
            selector: Vec::new(),
        }
    }

    /// The token as deck text, selector items quoted.
    pub fn to_text(&self) -> String {
        let mut text = self.value.clone();
        for item in &self.selector {
            text.push_str(&format!(" '{item}'"));
        }
        text
    }
}

enum Piece {
    Quoted(String),
    Plain(String),
}

/// Turn the DEFINE expression items into tokens.
///
/// Unquoted items are split at operator characters and parentheses, so
/// `(WOPR` and `2*FOPR` both split. Quoted items are never split. Names,
/// numbers and quoted items directly after a quantity become its selector.
pub fn tokenize(items: &[String]) -> Vec<UdqToken> {
    let mut pieces = Vec::new();
    for item in items {
        match item.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')) {
            Some(inner) => pieces.push(Piece::Quoted(inner.to_string())),
            None => split_item(item, &mut pieces),
        }
    }

    let mut tokens: Vec<UdqToken> = Vec::new();
    for piece in pieces {
        let after_quantity = tokens
            .last()
            .is_some_and(|last| last.kind == UdqTokenType::EclExpr);
        let (value, quoted) = match piece {
            Piece::Quoted(value) => (value, true),
            Piece::Plain(value) => (value, false),
        };
        let selector_like =
            quoted || matches!(UdqTokenType::of(&value), UdqTokenType::EclExpr | UdqTokenType::Number);

        if after_quantity && selector_like {
            if let Some(quantity) = tokens.last_mut() {
                quantity.selector.push(value);
            }
        } else if quoted {
            tokens.push(UdqToken {
                kind: UdqTokenType::EclExpr,
                value,
                selector: Vec::new(),
            });
        } else {
            tokens.push(UdqToken::new(value));
        }
    }
    tokens
}

fn split_item(item: &str, pieces: &mut Vec<Piece>) {
    let chars: Vec<char> = item.chars().collect();
    let mut current = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            if let Some(len) = chars[i + 1..].iter().position(|&q| q == '\'') {
                flush(&mut current, pieces);
                pieces.push(Piece::Quoted(chars[i + 1..i + 1 + len].iter().collect()));
                i += len + 2;
                continue;
            }
        }
        let is_exponent_sign = matches!(c, '+' | '-') && is_mantissa_with_exponent(&current);
        if is_exponent_sign || !is_operator_char(c) {
            current.push(c);
            i += 1;
            continue;
        }

        flush(&mut current, pieces);
        let two_char = matches!(c, '=' | '!' | '<' | '>') && chars.get(i + 1) == Some(&'=');
        if two_char {
            pieces.push(Piece::Plain(format!("{c}=")));
            i += 2;
        } else {
            pieces.push(Piece::Plain(c.to_string()));
            i += 1;
        }
    }
    flush(&mut current, pieces);
}

fn flush(current: &mut String, pieces: &mut Vec<Piece>) {
    if !current.is_empty() {
        pieces.push(Piece::Plain(std::mem::take(current)));
    }
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '^' | '(' | ')' | '=' | '!' | '<' | '>')
}

/// `1E` or `2.5e`: the sign that follows belongs to the number.
fn is_mantissa_with_exponent(current: &str) -> bool {
    let Some(mantissa) = current.strip_suffix(['E', 'e']) else {
        return false;
    };
    !mantissa.is_empty() && mantissa.parse::<f64>().is_ok()
}
