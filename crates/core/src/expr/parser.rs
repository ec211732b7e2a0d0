//! Recursive descent parser for arithmetic formulas
//!
//! Grammar (Python operator precedence, so registry formulas written with
//! `**` read the same way they were authored):
//!
//! ```text
//! expr    = term (('+' | '-') term)*
//! term    = unary (('*' | '/') unary)*
//! unary   = ('-' | '+') unary | power
//! power   = primary (('^' | '**') unary)?
//! primary = number | ident | ident '(' expr ')' | '(' expr ')'
//! ```
//!
//! `-N**2` therefore parses as `-(N**2)` and `2**-1` as `2**(-1)`;
//! power is right-associative.

use super::lexer::{Spanned, Token};
use crate::error::{Error, Result};
use crate::value::BinaryOp;

/// A node in the expression tree
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Num(f64),
    Symbol(String),
    BinOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Neg(Box<Expr>),
    Call {
        name: String,
        arg: Box<Expr>,
    },
}

/// Deepest expression tree or parenthesis/sign nesting accepted.
///
/// Parsing, evaluation and dropping of the tree all recurse, so formulas
/// loaded from files are bounded here instead of on the stack.
pub(crate) const MAX_DEPTH: usize = 256;

/// A parsed subtree and its depth
type Node = (Expr, usize);

pub(crate) struct Parser<'a> {
    formula: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    nesting: usize,
}

impl<'a> Parser<'a> {
    pub fn new(formula: &'a str, tokens: Vec<Spanned>) -> Self {
        Self {
            formula,
            tokens,
            pos: 0,
            nesting: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).map(|s| s.token.clone());
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    /// Character offset of the current token, or the end of the formula
    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|s| s.pos)
            .unwrap_or_else(|| self.formula.chars().count())
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::Parse {
            formula: self.formula.to_string(),
            position: self.offset(),
            reason: reason.into(),
        }
    }

    fn too_deep(&self) -> Error {
        self.error("formula nested too deeply")
    }

    /// Build a node one level above its deepest child
    fn node(&self, expr: Expr, child_depth: usize) -> Result<Node> {
        let depth = child_depth + 1;
        if depth > MAX_DEPTH {
            return Err(self.too_deep());
        }
        Ok((expr, depth))
    }

    fn binary(&self, op: BinaryOp, (left, dl): Node, (right, dr): Node) -> Result<Node> {
        self.node(
            Expr::BinOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            dl.max(dr),
        )
    }

    /// Parse the whole token stream; trailing tokens are an error.
    pub fn parse(mut self) -> Result<Expr> {
        if self.tokens.is_empty() {
            return Err(self.error("empty formula"));
        }
        let (expr, _) = self.parse_expr()?;
        if let Some(tok) = self.peek() {
            return Err(self.error(format!("unexpected {:?} after expression", tok)));
        }
        Ok(expr)
    }

    fn parse_expr(&mut self) -> Result<Node> {
        let mut left = self.parse_term()?;

        while let Some(Token::Op(c @ ('+' | '-'))) = self.peek() {
            let op = if *c == '+' { BinaryOp::Add } else { BinaryOp::Subtract };
            self.advance();
            let right = self.parse_term()?;
            left = self.binary(op, left, right)?;
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Node> {
        let mut left = self.parse_unary()?;

        while let Some(Token::Op(c @ ('*' | '/'))) = self.peek() {
            let op = if *c == '*' { BinaryOp::Multiply } else { BinaryOp::Divide };
            self.advance();
            let right = self.parse_unary()?;
            left = self.binary(op, left, right)?;
        }

        Ok(left)
    }

    /// Every recursive path (signs, exponents, parentheses, call
    /// arguments) passes through here, so nesting is counted once.
    fn parse_unary(&mut self) -> Result<Node> {
        self.nesting += 1;
        let result = if self.nesting > MAX_DEPTH {
            Err(self.too_deep())
        } else {
            self.parse_signed()
        };
        self.nesting -= 1;
        result
    }

    fn parse_signed(&mut self) -> Result<Node> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.advance();
                let (inner, depth) = self.parse_unary()?;
                self.node(Expr::Neg(Box::new(inner)), depth)
            }
            Some(Token::Op('+')) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Node> {
        let base = self.parse_primary()?;

        if let Some(Token::Pow) = self.peek() {
            self.advance();
            let exponent = self.parse_unary()?;
            return self.binary(BinaryOp::Power, base, exponent);
        }

        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Node> {
        match self.peek().cloned() {
            Some(Token::Number(n)) => {
                self.advance();
                Ok((Expr::Num(n), 1))
            }
            Some(Token::Ident(name)) => {
                self.advance();
                if let Some(Token::LParen) = self.peek() {
                    self.advance();
                    let (arg, depth) = self.parse_expr()?;
                    self.expect_rparen()?;
                    self.node(
                        Expr::Call {
                            name,
                            arg: Box::new(arg),
                        },
                        depth,
                    )
                } else {
                    Ok((Expr::Symbol(name), 1))
                }
            }
            Some(Token::LParen) => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect_rparen()?;
                Ok(expr)
            }
            Some(other) => Err(self.error(format!("unexpected {:?}", other))),
            None => Err(self.error("unexpected end of formula")),
        }
    }

    fn expect_rparen(&mut self) -> Result<()> {
        match self.peek() {
            Some(Token::RParen) => {
                self.advance();
                Ok(())
            }
            _ => Err(self.error("expected closing parenthesis")),
        }
    }
}

/// Collect all symbol names referenced in an expression, in first-use order.
/// Function names are not symbols.
pub(crate) fn collect_symbols(expr: &Expr, names: &mut Vec<String>) {
    match expr {
        Expr::Symbol(name) => {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        Expr::BinOp { left, right, .. } => {
            collect_symbols(left, names);
            collect_symbols(right, names);
        }
        Expr::Neg(inner) => collect_symbols(inner, names),
        Expr::Call { arg, .. } => collect_symbols(arg, names),
        Expr::Num(_) => {}
    }
}
