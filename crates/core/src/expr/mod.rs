//! Arithmetic formulas
//!
//! A [`Formula`] is parsed once into an expression tree and can then be
//! evaluated any number of times against [`Bindings`] of any [`Operand`]
//! type. Supported syntax: `+`, `-`, `*`, `/`, `^` (or `**`), parentheses,
//! unary sign, numeric literals (including `1e-3`), identifiers, and calls
//! to functions injected through a [`Scope`].
//!
//! Example formulas:
//! - `"(N-R)/(N+R)"` → NDVI
//! - `"g*(N-R)/(N+C1*R-C2*B+L)"` → EVI
//! - `"exp((-1.0*(a-b)^2.0)/(2.0*sigma^2.0))"` → RBF kernel (needs `exp`)

mod eval;
mod lexer;
mod parser;

use std::fmt;
use std::str::FromStr;

use crate::bindings::Bindings;
use crate::error::{Error, Result};
use crate::value::Operand;

pub use eval::{Function, Scope};
use parser::{collect_symbols, Expr, Parser};

/// Remove all whitespace from a formula.
pub fn normalize(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// A parsed arithmetic formula
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    text: String,
    expr: Expr,
    symbols: Vec<String>,
}

impl Formula {
    /// Parse a formula.
    ///
    /// Whitespace separates tokens but is otherwise ignored; the stored
    /// text is whitespace-normalized. Parse error positions refer to
    /// `text` as given.
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = lexer::tokenize(text)?;
        let expr = Parser::new(text, tokens).parse()?;
        let mut symbols = Vec::new();
        collect_symbols(&expr, &mut symbols);
        Ok(Self {
            text: normalize(text),
            expr,
            symbols,
        })
    }

    /// Normalized formula text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Identifiers referenced by the formula, in first-use order
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Evaluate with the given bindings and no injected functions.
    pub fn evaluate<T: Operand>(&self, bindings: &Bindings<T>) -> Result<T> {
        self.evaluate_in(&Scope::new(bindings))
    }

    /// Evaluate inside an explicit scope.
    ///
    /// # Errors
    /// - [`Error::UndefinedSymbol`] if an identifier or function is not in scope
    /// - Whatever the operand type reports for incompatible operands
    pub fn evaluate_in<T: Operand>(&self, scope: &Scope<'_, T>) -> Result<T> {
        eval::eval(&self.expr, scope).map(|v| v.into_owned())
    }
}

impl FromStr for Formula {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Formula::parse(s)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
