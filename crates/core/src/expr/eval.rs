//! Expression tree evaluation over any [`Operand`]

use std::borrow::Cow;

use super::parser::Expr;
use crate::bindings::Bindings;
use crate::error::{Error, Result};
use crate::value::{Operand, UnaryOp};

/// Functions that may be injected into an evaluation scope.
///
/// Formulas have no implicit globals: a call such as `exp(x)` only
/// resolves when the function was explicitly placed in the [`Scope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    /// Elementwise natural exponential
    Exp,
}

impl Function {
    /// Name used to call the function inside a formula
    pub fn name(&self) -> &'static str {
        match self {
            Function::Exp => "exp",
        }
    }

    fn op(&self) -> UnaryOp {
        match self {
            Function::Exp => UnaryOp::Exp,
        }
    }
}

/// Names visible to one evaluation: the caller's bindings plus any
/// injected functions. The scope borrows the bindings and never writes
/// to them.
#[derive(Debug)]
pub struct Scope<'a, T> {
    bindings: &'a Bindings<T>,
    functions: &'a [Function],
}

impl<'a, T> Scope<'a, T> {
    /// Scope with bindings only
    pub fn new(bindings: &'a Bindings<T>) -> Self {
        Self {
            bindings,
            functions: &[],
        }
    }

    /// Inject functions into the scope
    pub fn with_functions(mut self, functions: &'a [Function]) -> Self {
        self.functions = functions;
        self
    }

    fn function(&self, name: &str) -> Option<Function> {
        self.functions.iter().copied().find(|f| f.name() == name)
    }
}

/// Evaluate an expression. Symbol leaves are borrowed from the bindings;
/// only intermediate results are owned.
pub(crate) fn eval<'a, T: Operand>(expr: &Expr, scope: &Scope<'a, T>) -> Result<Cow<'a, T>> {
    match expr {
        Expr::Num(n) => Ok(Cow::Owned(T::constant(*n))),
        Expr::Symbol(name) => scope
            .bindings
            .get(name)
            .map(Cow::Borrowed)
            .ok_or_else(|| Error::UndefinedSymbol(name.clone())),
        Expr::BinOp { op, left, right } => {
            let l = eval(left, scope)?;
            let r = eval(right, scope)?;
            Ok(Cow::Owned(l.binary(*op, &r)?))
        }
        Expr::Neg(inner) => {
            let v = eval(inner, scope)?;
            Ok(Cow::Owned(v.unary(UnaryOp::Negate)?))
        }
        Expr::Call { name, arg } => {
            let f = scope
                .function(name)
                .ok_or_else(|| Error::UndefinedSymbol(name.clone()))?;
            let v = eval(arg, scope)?;
            Ok(Cow::Owned(v.unary(f.op())?))
        }
    }
}
