//! Condition expressions used by `#if` / `#elif` directives.
//!
//! ```text
//! expr    := or
//! or      := and (("or" | "||") and)*
//! and     := not (("and" | "&&") not)*
//! not     := ("not" | "!") not | compare
//! compare := operand (cmp_op operand)?
//!          | operand ["not"] "in" ( "[" list "]" | "(" list ")" )
//! operand := string | number | bool | name | "(" expr ")"
//! ```
//!
//! Names resolve against the environment's constants. Evaluation is pure:
//! the same expression over the same constants always yields the same
//! answer, and `and` / `or` stop at the first deciding operand.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::error::ExpandError;

/// A condition that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseConditionError(pub String);

fn syntax(message: impl Into<String>) -> ParseConditionError {
    ParseConditionError(message.into())
}

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        f.write_str(s)
    }
}

/// A runtime value: constant text or a boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Bool(bool),
}

impl Value {
    /// `true`, or any non-empty text.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Text(s) => !s.is_empty(),
        }
    }

    fn text(&self) -> Cow<'_, str> {
        match self {
            Value::Text(s) => Cow::Borrowed(s),
            Value::Bool(b) => Cow::Owned(b.to_string()),
        }
    }
}

/// Parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    In {
        needle: Box<Expr>,
        haystack: Vec<Expr>,
        negated: bool,
    },
}

impl Expr {
    /// Parse a condition from directive text.
    pub fn parse(src: &str) -> Result<Expr, ParseConditionError> {
        let tokens = tokenize(src)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_or()?;
        match parser.peek() {
            None => Ok(expr),
            Some(tok) => Err(syntax(format!("unexpected {tok} after end of expression"))),
        }
    }

    /// Evaluate against `constants`, yielding the condition's truth value.
    pub fn evaluate(&self, constants: &BTreeMap<String, String>) -> Result<bool, ExpandError> {
        Ok(self.value(constants)?.truthy())
    }

    fn value(&self, constants: &BTreeMap<String, String>) -> Result<Value, ExpandError> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Name(name) => constants
                .get(name)
                .map(|s| Value::Text(s.clone()))
                .ok_or_else(|| ExpandError::UndefinedSymbol { name: name.clone() }),
            Expr::Not(inner) => Ok(Value::Bool(!inner.evaluate(constants)?)),
            Expr::And(lhs, rhs) => {
                Ok(Value::Bool(lhs.evaluate(constants)? && rhs.evaluate(constants)?))
            }
            Expr::Or(lhs, rhs) => {
                Ok(Value::Bool(lhs.evaluate(constants)? || rhs.evaluate(constants)?))
            }
            Expr::Compare { op, lhs, rhs } => {
                let l = lhs.value(constants)?;
                let r = rhs.value(constants)?;
                Ok(Value::Bool(compare(*op, &l, &r)))
            }
            Expr::In {
                needle,
                haystack,
                negated,
            } => {
                let needle = needle.value(constants)?;
                let mut found = false;
                for candidate in haystack {
                    if candidate.value(constants)? == needle {
                        found = true;
                        break;
                    }
                }
                Ok(Value::Bool(found != *negated))
            }
        }
    }
}

fn compare(op: CompareOp, l: &Value, r: &Value) -> bool {
    match op {
        CompareOp::Eq => l == r,
        CompareOp::Ne => l != r,
        CompareOp::Lt => order(l, r) == Ordering::Less,
        CompareOp::Le => order(l, r) != Ordering::Greater,
        CompareOp::Gt => order(l, r) == Ordering::Greater,
        CompareOp::Ge => order(l, r) != Ordering::Less,
    }
}

/// Numeric order when both sides look like numbers, text order otherwise.
fn order(l: &Value, r: &Value) -> Ordering {
    let (lt, rt) = (l.text(), r.text());
    match (as_number(&lt), as_number(&rt)) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => lt.cmp(&rt),
    }
}

fn as_number(s: &str) -> Option<f64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let looks_numeric = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|c| *c == '.').count() <= 1
        && digits.chars().any(|c| c.is_ascii_digit());
    if looks_numeric {
        s.parse().ok()
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Num(String),
    Ident(String),
    Bool(bool),
    Cmp(CompareOp),
    And,
    Or,
    Not,
    In,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Str(s) => write!(f, "string {s:?}"),
            Token::Num(n) => write!(f, "number {n}"),
            Token::Ident(i) => write!(f, "name `{i}`"),
            Token::Bool(b) => write!(f, "`{b}`"),
            Token::Cmp(op) => write!(f, "`{op}`"),
            Token::And => f.write_str("`and`"),
            Token::Or => f.write_str("`or`"),
            Token::Not => f.write_str("`not`"),
            Token::In => f.write_str("`in`"),
            Token::LParen => f.write_str("`(`"),
            Token::RParen => f.write_str("`)`"),
            Token::LBracket => f.write_str("`[`"),
            Token::RBracket => f.write_str("`]`"),
            Token::Comma => f.write_str("`,`"),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<Token>, ParseConditionError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        chars.next();
        let next = chars.peek().map(|&(_, n)| n);
        let token = match c {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            '=' if next == Some('=') => {
                chars.next();
                Token::Cmp(CompareOp::Eq)
            }
            '!' if next == Some('=') => {
                chars.next();
                Token::Cmp(CompareOp::Ne)
            }
            '!' => Token::Not,
            '<' if next == Some('=') => {
                chars.next();
                Token::Cmp(CompareOp::Le)
            }
            '<' => Token::Cmp(CompareOp::Lt),
            '>' if next == Some('=') => {
                chars.next();
                Token::Cmp(CompareOp::Ge)
            }
            '>' => Token::Cmp(CompareOp::Gt),
            '&' if next == Some('&') => {
                chars.next();
                Token::And
            }
            '|' if next == Some('|') => {
                chars.next();
                Token::Or
            }
            '"' | '\'' => {
                let mut text = String::new();
                let mut closed = false;
                while let Some((_, ch)) = chars.next() {
                    match ch {
                        '\\' => match chars.next() {
                            Some((_, escaped)) => text.push(escaped),
                            None => break,
                        },
                        ch if ch == c => {
                            closed = true;
                            break;
                        }
                        ch => text.push(ch),
                    }
                }
                if !closed {
                    return Err(syntax(format!("unterminated string starting at column {}", start + 1)));
                }
                Token::Str(text)
            }
            c if c.is_ascii_digit() || (c == '-' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, ch)) = chars.peek() {
                    if ch.is_ascii_digit() || ch == '.' {
                        end = i + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                Token::Num(src[start..end].to_string())
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, ch)) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                        end = i + ch.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                match &src[start..end] {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "in" => Token::In,
                    "true" | "True" => Token::Bool(true),
                    "false" | "False" => Token::Bool(false),
                    ident => Token::Ident(ident.to_string()),
                }
            }
            other => {
                return Err(syntax(format!("unexpected character '{other}' at column {}", start + 1)));
            }
        };
        tokens.push(token);
    }
    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: Token) -> Result<(), ParseConditionError> {
        match self.advance() {
            Some(tok) if tok == want => Ok(()),
            Some(tok) => Err(syntax(format!("expected {want}, found {tok}"))),
            None => Err(syntax(format!("expected {want}, found end of expression"))),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ParseConditionError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseConditionError> {
        let mut lhs = self.parse_not()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let rhs = self.parse_not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseConditionError> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> Result<Expr, ParseConditionError> {
        let lhs = self.parse_operand()?;
        match self.peek() {
            Some(Token::Cmp(op)) => {
                let op = *op;
                self.advance();
                let rhs = self.parse_operand()?;
                Ok(Expr::Compare {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                })
            }
            Some(Token::In) => {
                self.advance();
                self.parse_membership(lhs, false)
            }
            Some(Token::Not) if self.peek_nth(1) == Some(&Token::In) => {
                self.advance();
                self.advance();
                self.parse_membership(lhs, true)
            }
            _ => Ok(lhs),
        }
    }

    fn parse_membership(&mut self, needle: Expr, negated: bool) -> Result<Expr, ParseConditionError> {
        let close = match self.advance() {
            Some(Token::LBracket) => Token::RBracket,
            Some(Token::LParen) => Token::RParen,
            Some(tok) => return Err(syntax(format!("expected `[` after `in`, found {tok}"))),
            None => return Err(syntax("expected `[` after `in`, found end of expression")),
        };
        let mut haystack = Vec::new();
        if self.peek() != Some(&close) {
            loop {
                haystack.push(self.parse_operand()?);
                if self.peek() == Some(&Token::Comma) {
                    self.advance();
                    if self.peek() == Some(&close) {
                        break;
                    }
                } else {
                    break;
                }
            }
        }
        self.expect(close)?;
        Ok(Expr::In {
            needle: Box::new(needle),
            haystack,
            negated,
        })
    }

    fn parse_operand(&mut self) -> Result<Expr, ParseConditionError> {
        match self.advance() {
            Some(Token::Str(s)) | Some(Token::Num(s)) => Ok(Expr::Literal(Value::Text(s))),
            Some(Token::Bool(b)) => Ok(Expr::Literal(Value::Bool(b))),
            Some(Token::Ident(name)) => Ok(Expr::Name(name)),
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(tok) => Err(syntax(format!("expected a value, found {tok}"))),
            None => Err(syntax("expected a value, found end of expression")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
