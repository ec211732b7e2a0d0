//! Container values and the arithmetic capability formulas are evaluated over
//!
//! The expression evaluator only knows the [`Operand`] trait: a value that
//! can be built from a numeric literal and combined with `+ - * / ^`,
//! negated and exponentiated. Everything else about the concrete container
//! (shapes, labels, deferred graphs, remote handles) stays inside the
//! container's own implementation.
//!
//! [`Value`] is the closed set of container families understood by the
//! multi-result unifier:
//! - `Scalar`: a plain `f64`
//! - `Array`: homogeneous N-d numeric array (`ndarray::ArrayD`)
//! - `Series` / `Frame`: labeled 1-D tabular column / table of columns
//! - `DataArray`: labeled N-d array with named dimensions and coordinates
//! - `RemoteImage` / `RemoteNumber` / `RemoteList`: remote-execution handles
//!   that build a serializable expression graph instead of computing
//! - `LazyArray` / `LazySeries` / `LazyFrame`: chunked, deferred containers
//!   realized with `compute()`

mod array;
mod labeled;
mod lazy;
mod remote;
mod series;

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array1, ArrayD};

use crate::bindings::Bindings;
use crate::error::{Error, Result};

pub use labeled::DataArray;
pub use lazy::{LazyArray, LazyFrame, LazySeries};
pub use remote::{RemoteExpr, RemoteImage, RemoteList, RemoteNumber};
pub use series::{Frame, Series};

pub(crate) use array::zip_arrays;

/// Binary arithmetic operators available in formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOp {
    /// Apply to two scalars with plain IEEE-754 semantics: division by
    /// zero yields ±inf or NaN, a negative base with a fractional exponent
    /// yields NaN.
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            BinaryOp::Multiply => a * b,
            BinaryOp::Divide => a / b,
            BinaryOp::Power => a.powf(b),
        }
    }

    /// Operator symbol as written in formulas
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Power => "^",
        }
    }

    /// Method name used by remote-execution handles
    pub fn method_name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "subtract",
            BinaryOp::Multiply => "multiply",
            BinaryOp::Divide => "divide",
            BinaryOp::Power => "pow",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operations available in formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Exp,
}

impl UnaryOp {
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            UnaryOp::Negate => -x,
            UnaryOp::Exp => x.exp(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UnaryOp::Negate => "negate",
            UnaryOp::Exp => "exp",
        }
    }
}

/// Arithmetic capability required to evaluate a formula.
///
/// Implementations decide what each operator means for their container;
/// the evaluator never inspects the concrete type.
pub trait Operand: Clone + Sized {
    /// Value of a numeric literal appearing in a formula
    fn constant(value: f64) -> Self;

    /// `self <op> rhs`
    fn binary(&self, op: BinaryOp, rhs: &Self) -> Result<Self>;

    /// Negation or exponential
    fn unary(&self, op: UnaryOp) -> Result<Self>;

    /// Hook for backends with their own expression-building sublanguage.
    ///
    /// Returns `None` when the value evaluates formulas through the generic
    /// evaluator (the default), otherwise the result of handing `formula`
    /// and `bindings` to the backend.
    fn expression(&self, _formula: &str, _bindings: &Bindings<Self>) -> Option<Result<Self>> {
        None
    }
}

impl Operand for f64 {
    fn constant(value: f64) -> Self {
        value
    }

    fn binary(&self, op: BinaryOp, rhs: &Self) -> Result<Self> {
        Ok(op.apply(*self, *rhs))
    }

    fn unary(&self, op: UnaryOp) -> Result<Self> {
        Ok(op.apply(*self))
    }
}

/// Container family of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Scalar,
    Array,
    Series,
    Frame,
    DataArray,
    RemoteImage,
    RemoteNumber,
    RemoteList,
    LazyArray,
    LazySeries,
    LazyFrame,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContainerKind::Scalar => "scalar",
            ContainerKind::Array => "array",
            ContainerKind::Series => "series",
            ContainerKind::Frame => "frame",
            ContainerKind::DataArray => "labeled array",
            ContainerKind::RemoteImage => "remote image",
            ContainerKind::RemoteNumber => "remote number",
            ContainerKind::RemoteList => "remote list",
            ContainerKind::LazyArray => "lazy array",
            ContainerKind::LazySeries => "lazy series",
            ContainerKind::LazyFrame => "lazy frame",
        };
        f.write_str(name)
    }
}

/// A caller-supplied or computed value of one container family
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(f64),
    Array(ArrayD<f64>),
    Series(Series),
    Frame(Frame),
    DataArray(DataArray),
    RemoteImage(RemoteImage),
    RemoteNumber(RemoteNumber),
    RemoteList(RemoteList),
    LazyArray(LazyArray),
    LazySeries(LazySeries),
    LazyFrame(LazyFrame),
}

impl Value {
    /// Container family of this value
    pub fn kind(&self) -> ContainerKind {
        match self {
            Value::Scalar(_) => ContainerKind::Scalar,
            Value::Array(_) => ContainerKind::Array,
            Value::Series(_) => ContainerKind::Series,
            Value::Frame(_) => ContainerKind::Frame,
            Value::DataArray(_) => ContainerKind::DataArray,
            Value::RemoteImage(_) => ContainerKind::RemoteImage,
            Value::RemoteNumber(_) => ContainerKind::RemoteNumber,
            Value::RemoteList(_) => ContainerKind::RemoteList,
            Value::LazyArray(_) => ContainerKind::LazyArray,
            Value::LazySeries(_) => ContainerKind::LazySeries,
            Value::LazyFrame(_) => ContainerKind::LazyFrame,
        }
    }

    /// Whether this is a remote-execution handle that builds its own expressions
    pub fn is_remote(&self) -> bool {
        matches!(self, Value::RemoteImage(_) | Value::RemoteNumber(_))
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayD<f64>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Value::Series(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            Value::Frame(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_data_array(&self) -> Option<&DataArray> {
        match self {
            Value::DataArray(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_remote_image(&self) -> Option<&RemoteImage> {
        match self {
            Value::RemoteImage(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_remote_number(&self) -> Option<&RemoteNumber> {
        match self {
            Value::RemoteNumber(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_remote_list(&self) -> Option<&RemoteList> {
        match self {
            Value::RemoteList(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_lazy_array(&self) -> Option<&LazyArray> {
        match self {
            Value::LazyArray(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_lazy_series(&self) -> Option<&LazySeries> {
        match self {
            Value::LazySeries(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_lazy_frame(&self) -> Option<&LazyFrame> {
        match self {
            Value::LazyFrame(f) => Some(f),
            _ => None,
        }
    }

    /// Remote-graph form of a value usable inside a remote expression
    fn to_remote_expr(&self) -> Result<RemoteExpr> {
        match self {
            Value::Scalar(v) => Ok(RemoteExpr::constant(*v)),
            Value::RemoteImage(i) => Ok(i.expr().clone()),
            Value::RemoteNumber(n) => Ok(n.expr().clone()),
            other => Err(Error::UnsupportedOperation {
                op: "expression",
                kind: other.kind(),
            }),
        }
    }
}

impl Operand for Value {
    fn constant(value: f64) -> Self {
        Value::Scalar(value)
    }

    fn binary(&self, op: BinaryOp, rhs: &Self) -> Result<Self> {
        let f = move |a: f64, b: f64| op.apply(a, b);
        let r = move |a: f64, b: f64| op.apply(b, a);

        match (self, rhs) {
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(op.apply(*a, *b))),

            // Eager arrays
            (Value::Array(a), Value::Array(b)) => Ok(Value::Array(zip_arrays(a, b, f)?)),
            (Value::Array(a), Value::Scalar(s)) => Ok(Value::Array(a.mapv(|x| op.apply(x, *s)))),
            (Value::Scalar(s), Value::Array(a)) => Ok(Value::Array(a.mapv(|x| op.apply(*s, x)))),

            // Tabular columns
            (Value::Series(a), Value::Series(b)) => Ok(Value::Series(a.zip(b, f)?)),
            (Value::Series(a), Value::Scalar(s)) => Ok(Value::Series(a.map(|x| op.apply(x, *s)))),
            (Value::Scalar(s), Value::Series(a)) => Ok(Value::Series(a.map(|x| op.apply(*s, x)))),
            (Value::Series(a), Value::Array(b)) => Ok(Value::Series(a.zip_array(b, f)?)),
            (Value::Array(b), Value::Series(a)) => Ok(Value::Series(a.zip_array(b, r)?)),

            // Labeled arrays
            (Value::DataArray(a), Value::DataArray(b)) => Ok(Value::DataArray(a.zip(b, f)?)),
            (Value::DataArray(a), Value::Scalar(s)) => {
                Ok(Value::DataArray(a.map(|x| op.apply(x, *s))))
            }
            (Value::Scalar(s), Value::DataArray(a)) => {
                Ok(Value::DataArray(a.map(|x| op.apply(*s, x))))
            }
            (Value::DataArray(a), Value::Array(b)) => Ok(Value::DataArray(a.zip_array(b, f)?)),
            (Value::Array(b), Value::DataArray(a)) => Ok(Value::DataArray(a.zip_array(b, r)?)),

            // Remote handles
            (Value::RemoteImage(a), Value::RemoteImage(b)) => {
                Ok(Value::RemoteImage(a.op(op, b.expr())))
            }
            (Value::RemoteImage(a), Value::RemoteNumber(n)) => {
                Ok(Value::RemoteImage(a.op(op, n.expr())))
            }
            (Value::RemoteNumber(n), Value::RemoteImage(a)) => {
                Ok(Value::RemoteImage(a.rop(op, n.expr())))
            }
            (Value::RemoteImage(a), Value::Scalar(s)) => {
                Ok(Value::RemoteImage(a.op(op, &RemoteExpr::constant(*s))))
            }
            (Value::Scalar(s), Value::RemoteImage(a)) => {
                Ok(Value::RemoteImage(a.rop(op, &RemoteExpr::constant(*s))))
            }
            (Value::RemoteNumber(a), Value::RemoteNumber(b)) => {
                Ok(Value::RemoteNumber(a.op(op, b.expr())))
            }
            (Value::RemoteNumber(a), Value::Scalar(s)) => {
                Ok(Value::RemoteNumber(a.op(op, &RemoteExpr::constant(*s))))
            }
            (Value::Scalar(s), Value::RemoteNumber(a)) => {
                Ok(Value::RemoteNumber(a.rop(op, &RemoteExpr::constant(*s))))
            }

            // Deferred arrays
            (Value::LazyArray(a), Value::LazyArray(b)) => Ok(Value::LazyArray(a.op(op, b)?)),
            (Value::LazyArray(a), Value::Scalar(s)) => Ok(Value::LazyArray(a.op_scalar(op, *s))),
            (Value::Scalar(s), Value::LazyArray(a)) => Ok(Value::LazyArray(a.rop_scalar(op, *s))),
            (Value::LazyArray(a), Value::Array(b)) => Ok(Value::LazyArray(a.op_array(op, b)?)),
            (Value::Array(b), Value::LazyArray(a)) => Ok(Value::LazyArray(a.rop_array(op, b)?)),

            // Deferred columns
            (Value::LazySeries(a), Value::LazySeries(b)) => Ok(Value::LazySeries(a.op(op, b)?)),
            (Value::LazySeries(a), Value::Scalar(s)) => {
                Ok(Value::LazySeries(a.op_scalar(op, *s)))
            }
            (Value::Scalar(s), Value::LazySeries(a)) => {
                Ok(Value::LazySeries(a.rop_scalar(op, *s)))
            }
            (Value::LazySeries(a), Value::Series(b)) => Ok(Value::LazySeries(a.op_series(op, b)?)),
            (Value::Series(b), Value::LazySeries(a)) => {
                Ok(Value::LazySeries(a.rop_series(op, b)?))
            }

            (l, r) => Err(Error::IncompatibleOperands {
                op,
                lhs: l.kind(),
                rhs: r.kind(),
            }),
        }
    }

    fn unary(&self, op: UnaryOp) -> Result<Self> {
        let f = move |x: f64| op.apply(x);
        match self {
            Value::Scalar(v) => Ok(Value::Scalar(op.apply(*v))),
            Value::Array(a) => Ok(Value::Array(a.mapv(f))),
            Value::Series(s) => Ok(Value::Series(s.map(f))),
            Value::DataArray(d) => Ok(Value::DataArray(d.map(f))),
            Value::RemoteImage(i) => Ok(Value::RemoteImage(i.unary(op))),
            Value::RemoteNumber(n) => Ok(Value::RemoteNumber(n.unary(op))),
            Value::LazyArray(a) => Ok(Value::LazyArray(a.unary(op))),
            Value::LazySeries(s) => Ok(Value::LazySeries(s.unary(op))),
            other => Err(Error::UnsupportedOperation {
                op: op.name(),
                kind: other.kind(),
            }),
        }
    }

    fn expression(&self, formula: &str, bindings: &Bindings<Self>) -> Option<Result<Self>> {
        let vars = || -> Result<BTreeMap<String, RemoteExpr>> {
            bindings
                .iter()
                .map(|(k, v)| v.to_remote_expr().map(|e| (k.to_string(), e)))
                .collect()
        };

        match self {
            Value::RemoteImage(img) => {
                Some(vars().map(|vars| Value::RemoteImage(img.expression(formula, vars))))
            }
            // A number mixed with images yields an image, as in `binary`
            Value::RemoteNumber(num) => match first_remote_image(bindings) {
                Some(img) => {
                    Some(vars().map(|vars| Value::RemoteImage(img.expression(formula, vars))))
                }
                None => Some(vars().map(|vars| Value::RemoteNumber(num.expression(formula, vars)))),
            },
            _ => None,
        }
    }
}

/// Remote image bound to the alphabetically first symbol, if any
fn first_remote_image(bindings: &Bindings<Value>) -> Option<&RemoteImage> {
    bindings
        .symbols()
        .into_iter()
        .find_map(|s| bindings.get(s).and_then(Value::as_remote_image))
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

impl From<ArrayD<f64>> for Value {
    fn from(a: ArrayD<f64>) -> Self {
        Value::Array(a)
    }
}

impl From<Array1<f64>> for Value {
    fn from(a: Array1<f64>) -> Self {
        Value::Array(a.into_dyn())
    }
}

macro_rules! impl_from_container {
    ($($t:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$t(v)
                }
            }
        )*
    };
}

impl_from_container!(
    Series,
    Frame,
    DataArray,
    RemoteImage,
    RemoteNumber,
    RemoteList,
    LazyArray,
    LazySeries,
    LazyFrame,
);

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, IxDyn};

    #[test]
    fn test_scalar_broadcast_into_array() {
        let a = Value::from(array![1.0, 2.0, 4.0]);
        let out = Value::Scalar(1.0).binary(BinaryOp::Divide, &a).unwrap();
        assert_eq!(out.as_array().unwrap(), &array![1.0, 0.5, 0.25].into_dyn());
    }

    #[test]
    fn test_operand_order_is_respected() {
        let a = Value::from(array![10.0]);
        let l = a.binary(BinaryOp::Subtract, &Value::Scalar(1.0)).unwrap();
        let r = Value::Scalar(1.0).binary(BinaryOp::Subtract, &a).unwrap();
        assert_eq!(l.as_array().unwrap()[[0]], 9.0);
        assert_eq!(r.as_array().unwrap()[[0]], -9.0);
    }

    #[test]
    fn test_series_with_array_keeps_series() {
        let s = Series::new(vec![1.0, 2.0]).with_name("N");
        let arr = ArrayD::from_shape_vec(IxDyn(&[2]), vec![3.0, 4.0]).unwrap();
        let out = Value::Array(arr).binary(BinaryOp::Subtract, &Value::Series(s)).unwrap();
        let out = out.as_series().unwrap();
        assert_eq!(out.values().to_vec(), vec![2.0, 2.0]);
    }

    #[test]
    fn test_incompatible_families() {
        let s = Value::Series(Series::new(vec![1.0]));
        let img = Value::RemoteImage(RemoteImage::constant(1.0));
        match s.binary(BinaryOp::Add, &img) {
            Err(Error::IncompatibleOperands { lhs, rhs, .. }) => {
                assert_eq!(lhs, ContainerKind::Series);
                assert_eq!(rhs, ContainerKind::RemoteImage);
            }
            other => panic!("expected incompatible operands, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_on_frame_is_unsupported() {
        let frame = Frame::from_series(
            &["a".to_string()],
            vec![Series::new(vec![1.0])],
        )
        .unwrap();
        assert!(Value::Frame(frame).unary(UnaryOp::Exp).is_err());
    }

    #[test]
    fn test_expression_hook_only_for_remote() {
        let b: Bindings = Bindings::new().with("a", 1.0);
        assert!(Value::Scalar(1.0).expression("a", &b).is_none());
        assert!(Value::RemoteNumber(RemoteNumber::new(1.0))
            .expression("a", &b)
            .is_some());
    }

    #[test]
    fn test_number_expression_with_image_yields_image() {
        let b: Bindings = Bindings::new()
            .with("a", RemoteNumber::new(0.5))
            .with("b", RemoteImage::constant(0.1));
        let out = Value::RemoteNumber(RemoteNumber::new(0.5))
            .expression("a * b", &b)
            .unwrap()
            .unwrap();
        let img = out.as_remote_image().unwrap();
        assert_eq!(img.expr().function(), Some("Image.expression"));
        assert!(img.expr().argument("map").is_some());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ContainerKind::DataArray.to_string(), "labeled array");
        assert_eq!(Value::Scalar(0.0).kind(), ContainerKind::Scalar);
    }
}
