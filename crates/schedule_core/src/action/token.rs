//! Classification of ACTIONX condition tokens.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    Number,
    EclExpr,
    OpenParen,
    CloseParen,
    OpGt,
    OpGe,
    OpLt,
    OpLe,
    OpEq,
    OpNe,
    OpAnd,
    OpOr,
    End,
}

impl TokenType {
    pub fn is_comparator(self) -> bool {
        matches!(
            self,
            TokenType::OpGt
                | TokenType::OpGe
                | TokenType::OpLt
                | TokenType::OpLe
                | TokenType::OpEq
                | TokenType::OpNe
        )
    }
}

/// What kind of summary quantity a condition leaf refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuncType {
    None,
    Time,
    TimeMonth,
    Region,
    Field,
    Group,
    Well,
    WellSegment,
    WellConnection,
    Aquifer,
    Block,
}

/// Classify one raw token. Keywords and comparators are case-insensitive;
/// a token that parses completely as a float is a number.
pub fn token_type(raw: &str) -> TokenType {
    let lower = raw.to_ascii_lowercase();
    match lower.as_str() {
        "and" => TokenType::OpAnd,
        "or" => TokenType::OpOr,
        "(" => TokenType::OpenParen,
        ")" => TokenType::CloseParen,
        ">" | ".gt." => TokenType::OpGt,
        ">=" | ".ge." => TokenType::OpGe,
        "<" | ".lt." => TokenType::OpLt,
        "<=" | ".le." => TokenType::OpLe,
        "=" | ".eq." => TokenType::OpEq,
        "!=" | ".ne." => TokenType::OpNe,
        _ if lower.parse::<f64>().is_ok() => TokenType::Number,
        _ => TokenType::EclExpr,
    }
}

pub fn func_type(func: &str) -> FuncType {
    match func {
        "YEAR" | "DAY" => return FuncType::Time,
        "MNTH" => return FuncType::TimeMonth,
        _ => {}
    }
    match func.chars().next() {
        Some('F') => FuncType::Field,
        Some('W') => FuncType::Well,
        Some('G') => FuncType::Group,
        Some('R') => FuncType::Region,
        Some('B') => FuncType::Block,
        Some('A') => FuncType::Aquifer,
        Some('S') => FuncType::WellSegment,
        Some('C') => FuncType::WellConnection,
        _ => FuncType::None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode {
    pub kind: TokenType,
    pub value: String,
}

/// Cursor over a flat token list. Reading past the end yields `End`.
#[derive(Debug)]
pub struct Tokenizer<'a> {
    tokens: &'a [String],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(tokens: &'a [String]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn current(&self) -> ParseNode {
        match self.tokens.get(self.pos) {
            Some(raw) => ParseNode {
                kind: token_type(raw),
                value: raw.clone(),
            },
            None => ParseNode {
                kind: TokenType::End,
                value: String::new(),
            },
        }
    }

    pub fn advance(&mut self) -> ParseNode {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        self.current()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }
}
