// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boolean expressions over checker outputs.
//!
//! Grammar:
//!
//! ```text
//! expr    := and ("||" and)*
//! and     := unary ("&&" unary)*
//! unary   := "!" unary | primary
//! primary := "(" expr ")" | "true" | "false" | IDENT "." "eval" "(" ")"
//! ```
//!
//! Evaluation is three-valued: a checker whose output is not a boolean
//! yields "unknown", which propagates unless short-circuited away.

use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at offset {offset} in '{expr}'")]
    UnexpectedChar { expr: String, ch: char, offset: usize },
    #[error("unexpected {found} in '{expr}', expected {expected}")]
    UnexpectedToken {
        expr: String,
        found: String,
        expected: &'static str,
    },
    #[error("unsupported method '{method}' on '{id}', only eval() is allowed")]
    UnsupportedMethod { id: String, method: String },
    #[error("expression references unknown checker '{0}'")]
    UnknownChecker(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(bool),
    Checker(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            source,
            tokens,
            pos: 0,
        };
        let expr = parser.or()?;
        match parser.peek() {
            None => Ok(expr),
            Some(tok) => Err(parser.unexpected(tok.clone(), "end of expression")),
        }
    }

    /// Ids of every checker the expression reads.
    pub fn checker_ids(&self) -> BTreeSet<&str> {
        let mut ids = BTreeSet::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids<'a>(&'a self, ids: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Checker(id) => {
                ids.insert(id);
            }
            Expr::Not(inner) => inner.collect_ids(ids),
            Expr::And(l, r) | Expr::Or(l, r) => {
                l.collect_ids(ids);
                r.collect_ids(ids);
            }
        }
    }

    /// Evaluate with `lookup` resolving a checker id to its current output.
    ///
    /// Returns `Ok(None)` when the result is not a definite boolean.
    pub fn evaluate<E, F>(&self, lookup: &mut F) -> Result<Option<bool>, E>
    where
        F: FnMut(&str) -> Result<Value, E>,
    {
        Ok(match self {
            Expr::Literal(b) => Some(*b),
            Expr::Checker(id) => lookup(id)?.as_bool(),
            Expr::Not(inner) => inner.evaluate(lookup)?.map(|b| !b),
            Expr::And(l, r) => match l.evaluate(lookup)? {
                Some(false) => Some(false),
                left => match (left, r.evaluate(lookup)?) {
                    (_, Some(false)) => Some(false),
                    (Some(true), Some(true)) => Some(true),
                    _ => None,
                },
            },
            Expr::Or(l, r) => match l.evaluate(lookup)? {
                Some(true) => Some(true),
                left => match (left, r.evaluate(lookup)?) {
                    (_, Some(true)) => Some(true),
                    (Some(false), Some(false)) => Some(false),
                    _ => None,
                },
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Dot,
    LParen,
    RParen,
    And,
    Or,
    Not,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => format!("'{s}'"),
            Token::Dot => "'.'".to_string(),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::And => "'&&'".to_string(),
            Token::Or => "'||'".to_string(),
            Token::Not => "'!'".to_string(),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();
    while let Some((offset, ch)) = chars.next() {
        let unexpected = || ExprError::UnexpectedChar {
            expr: source.to_string(),
            ch,
            offset,
        };
        match ch {
            c if c.is_whitespace() => {}
            '.' => tokens.push(Token::Dot),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '!' => tokens.push(Token::Not),
            '&' => match chars.next() {
                Some((_, '&')) => tokens.push(Token::And),
                _ => return Err(unexpected()),
            },
            '|' => match chars.next() {
                Some((_, '|')) => tokens.push(Token::Or),
                _ => return Err(unexpected()),
            },
            c if c.is_alphanumeric() || c == '_' || c == '-' => {
                let mut ident = String::from(c);
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' || next == '-' {
                        ident.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            _ => return Err(unexpected()),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn unexpected(&self, found: Token, expected: &'static str) -> ExprError {
        ExprError::UnexpectedToken {
            expr: self.source.to_string(),
            found: found.describe(),
            expected,
        }
    }

    fn end_of_input(&self, expected: &'static str) -> ExprError {
        ExprError::UnexpectedToken {
            expr: self.source.to_string(),
            found: "end of expression".to_string(),
            expected,
        }
    }

    fn expect(&mut self, want: Token, expected: &'static str) -> Result<(), ExprError> {
        match self.advance() {
            Some(tok) if tok == want => Ok(()),
            Some(tok) => Err(self.unexpected(tok, expected)),
            None => Err(self.end_of_input(expected)),
        }
    }

    fn or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        const OPERAND: &str = "a checker call, literal or '('";
        match self.advance() {
            Some(Token::LParen) => {
                let inner = self.or()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(word)) if word == "true" => Ok(Expr::Literal(true)),
            Some(Token::Ident(word)) if word == "false" => Ok(Expr::Literal(false)),
            Some(Token::Ident(id)) => {
                self.expect(Token::Dot, "'.'")?;
                let method = match self.advance() {
                    Some(Token::Ident(method)) => method,
                    Some(tok) => return Err(self.unexpected(tok, "a method name")),
                    None => return Err(self.end_of_input("a method name")),
                };
                if method != "eval" {
                    return Err(ExprError::UnsupportedMethod { id, method });
                }
                self.expect(Token::LParen, "'('")?;
                self.expect(Token::RParen, "')'")?;
                Ok(Expr::Checker(id))
            }
            Some(tok) => Err(self.unexpected(tok, OPERAND)),
            None => Err(self.end_of_input(OPERAND)),
        }
    }
}

#[cfg(test)]
#[path = "expr_tests.rs"]
mod tests;
