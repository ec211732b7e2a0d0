//! Batch index computation
//!
//! `compute_index` runs the whole pipeline for one call: resolve every
//! requested index, validate every binding set, evaluate (optionally in
//! parallel), then unify. Nothing is evaluated until all names and
//! bindings have been checked, so a failing batch never yields a partial
//! result.

use specidx_core::registry::IndexDefinition;
use specidx_core::{Bindings, Operand, ProcessingMode, Registry, Result, Value};
use specidx_parallel::ParallelStrategy;

use crate::unify::unify;
use crate::validate::validate_index;

/// Parameters for [`compute_index`]
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeParams {
    /// Combine several results into one container (default true)
    pub aggregate: bool,
    /// Name of the new dimension for labeled arrays (default `"index"`)
    pub axis: String,
    /// How indices of one batch are evaluated (default sequential)
    pub mode: ProcessingMode,
}

impl Default for ComputeParams {
    fn default() -> Self {
        Self {
            aggregate: true,
            axis: "index".to_string(),
            mode: ProcessingMode::Sequential,
        }
    }
}

impl ComputeParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate(mut self, aggregate: bool) -> Self {
        self.aggregate = aggregate;
        self
    }

    pub fn axis(mut self, axis: impl Into<String>) -> Self {
        self.axis = axis.into();
        self
    }

    pub fn mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }
}

/// One index name or an ordered list of them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexRequest {
    One(String),
    Many(Vec<String>),
}

impl IndexRequest {
    /// Requested names in order
    pub fn names(&self) -> &[String] {
        match self {
            IndexRequest::One(name) => std::slice::from_ref(name),
            IndexRequest::Many(names) => names,
        }
    }
}

impl From<&str> for IndexRequest {
    fn from(name: &str) -> Self {
        IndexRequest::One(name.to_string())
    }
}

impl From<String> for IndexRequest {
    fn from(name: String) -> Self {
        IndexRequest::One(name)
    }
}

impl From<&[&str]> for IndexRequest {
    fn from(names: &[&str]) -> Self {
        IndexRequest::Many(names.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for IndexRequest {
    fn from(names: [&str; N]) -> Self {
        IndexRequest::Many(names.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<String>> for IndexRequest {
    fn from(names: Vec<String>) -> Self {
        IndexRequest::Many(names)
    }
}

/// Output of [`compute_index`]
#[derive(Debug, Clone, PartialEq)]
pub enum Computed<T = Value> {
    /// One index, or several combined into one container
    Single(T),
    /// Per-index results in request order (aggregation disabled)
    List(Vec<T>),
}

impl<T> Computed<T> {
    pub fn as_single(&self) -> Option<&T> {
        match self {
            Computed::Single(v) => Some(v),
            Computed::List(_) => None,
        }
    }

    pub fn into_single(self) -> Option<T> {
        match self {
            Computed::Single(v) => Some(v),
            Computed::List(_) => None,
        }
    }

    /// Results as a list; a single value becomes a one-element list
    pub fn into_list(self) -> Vec<T> {
        match self {
            Computed::Single(v) => vec![v],
            Computed::List(values) => values,
        }
    }
}

/// Evaluate one index. Bindings are validated first.
pub fn evaluate_index<T: Operand>(def: &IndexDefinition, bindings: &Bindings<T>) -> Result<T> {
    validate_index(def, bindings)?;
    def.formula().evaluate(bindings)
}

/// Evaluate several indices against the same bindings, in request order.
///
/// All names are resolved before any binding is inspected, and all
/// bindings are validated before anything is evaluated.
///
/// # Errors
/// - [`Error::UnknownIndex`](specidx_core::Error::UnknownIndex) for the first unknown name
/// - [`Error::MissingSymbol`](specidx_core::Error::MissingSymbol) for the first index lacking a symbol
/// - Whatever the operand type reports during evaluation
pub fn evaluate_indices<T, S>(
    registry: &Registry,
    names: &[S],
    bindings: &Bindings<T>,
    mode: ProcessingMode,
) -> Result<Vec<T>>
where
    T: Operand + Send + Sync,
    S: AsRef<str>,
{
    let defs = names
        .iter()
        .map(|name| registry.index(name.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    for def in &defs {
        validate_index(def, bindings)?;
    }

    tracing::debug!(indices = defs.len(), mode = ?mode, "evaluating spectral indices");

    mode.par_map(0..defs.len(), |i| defs[i].formula().evaluate(bindings))
        .into_iter()
        .collect()
}

/// Compute one or several spectral indices.
///
/// A single name yields its value. Several names yield the ordered list
/// when `params.aggregate` is false, otherwise one container combining
/// all results (see [`unify`](crate::unify::unify)); a one-element list
/// yields its only value.
///
/// ```
/// use specidx_algorithms::{compute_index, ComputeParams};
/// use specidx_core::{Bindings, Registry};
///
/// let registry = Registry::builtin().unwrap();
/// let bindings: Bindings = Bindings::new().with("N", 0.643).with("R", 0.175);
/// let ndvi = compute_index(&registry, "NDVI", &bindings, &ComputeParams::default())
///     .unwrap()
///     .into_single()
///     .and_then(|v| v.as_scalar())
///     .unwrap();
/// assert!((ndvi - 0.5721271393643031).abs() < 1e-12);
/// ```
pub fn compute_index(
    registry: &Registry,
    request: impl Into<IndexRequest>,
    bindings: &Bindings,
    params: &ComputeParams,
) -> Result<Computed> {
    let request = request.into();
    let names = request.names();
    let mut results = evaluate_indices(registry, names, bindings, params.mode)?;

    match request {
        IndexRequest::One(_) => Ok(Computed::Single(results.remove(0))),
        IndexRequest::Many(_) if results.len() == 1 => Ok(Computed::Single(results.remove(0))),
        IndexRequest::Many(_) if !params.aggregate => Ok(Computed::List(results)),
        IndexRequest::Many(ref names) => Ok(Computed::Single(unify(results, names, &params.axis)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use specidx_core::Error;

    #[test]
    fn test_params_default() {
        let p = ComputeParams::default();
        assert!(p.aggregate);
        assert_eq!(p.axis, "index");
        assert_eq!(p.mode, ProcessingMode::Sequential);

        let p = ComputeParams::new().aggregate(false).axis("band").mode(ProcessingMode::Parallel);
        assert!(!p.aggregate);
        assert_eq!(p.axis, "band");
    }

    #[test]
    fn test_request_names() {
        assert_eq!(IndexRequest::from("NDVI").names(), &["NDVI".to_string()]);
        let many = IndexRequest::from(["NDVI", "SAVI"]);
        assert_eq!(many.names().len(), 2);
        assert!(matches!(many, IndexRequest::Many(_)));
    }

    #[test]
    fn test_evaluate_indices_generic_over_f64() {
        let registry = Registry::builtin().unwrap();
        let b: Bindings<f64> = Bindings::new().with("N", 0.643).with("R", 0.175).with("L", 0.5);
        let out = evaluate_indices(&registry, &["NDVI", "SAVI"], &b, ProcessingMode::Sequential).unwrap();
        assert_relative_eq!(out[0], 0.5721271393643031, epsilon = 1e-12);
        assert_relative_eq!(out[1], 0.5326251896813354, epsilon = 1e-12);
    }

    #[test]
    fn test_unknown_index_before_bindings() {
        let registry = Registry::builtin().unwrap();
        let empty: Bindings<f64> = Bindings::new();
        match evaluate_indices(&registry, &["NDVI", "NOPE"], &empty, ProcessingMode::Sequential) {
            Err(Error::UnknownIndex { name }) => assert_eq!(name, "NOPE"),
            other => panic!("expected UnknownIndex, got {:?}", other),
        }
    }

    #[test]
    fn test_computed_accessors() {
        let c: Computed<f64> = Computed::List(vec![1.0, 2.0]);
        assert!(c.as_single().is_none());
        assert_eq!(c.into_list(), vec![1.0, 2.0]);
        assert_eq!(Computed::Single(3.0).into_list(), vec![3.0]);
    }
}
