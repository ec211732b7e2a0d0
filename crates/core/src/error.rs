//! Error types for specidx

use crate::value::{BinaryOp, ContainerKind};
use thiserror::Error;

/// Main error type for specidx operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("'{name}' is not a valid spectral index")]
    UnknownIndex { name: String },

    #[error("'{symbol}' is missing in the parameters for {index} computation")]
    MissingSymbol { symbol: String, index: String },

    #[error("undefined symbol '{0}' in formula")]
    UndefinedSymbol(String),

    #[error("cannot combine results of container type {0}")]
    UnsupportedContainerType(ContainerKind),

    #[error("mixed container types: result {position} is {found}, expected {expected}")]
    MixedContainerKinds {
        expected: ContainerKind,
        found: ContainerKind,
        position: usize,
    },

    #[error("cannot apply '{op}' to {lhs} and {rhs}")]
    IncompatibleOperands {
        op: BinaryOp,
        lhs: ContainerKind,
        rhs: ContainerKind,
    },

    #[error("operation '{op}' is not supported on {kind}")]
    UnsupportedOperation { op: &'static str, kind: ContainerKind },

    #[error("shape mismatch: expected {expected:?}, got {found:?}")]
    ShapeMismatch { expected: Vec<usize>, found: Vec<usize> },

    #[error("row labels of tabular operands differ")]
    IndexMismatch,

    #[error("dimension mismatch: expected {expected:?}, got {found:?}")]
    DimensionMismatch { expected: Vec<String>, found: Vec<String> },

    #[error("coordinate '{dim}' differs between operands")]
    CoordinateMismatch { dim: String },

    #[error("unknown dimension '{0}'")]
    UnknownDimension(String),

    #[error("label '{label}' not found along dimension '{dim}'")]
    UnknownLabel { dim: String, label: String },

    #[error("expected {expected} labels, got {found}")]
    LabelCount { expected: usize, found: usize },

    #[error("invalid chunking: {0}")]
    InvalidChunks(String),

    #[error("at least {required} results are required, got {found}")]
    NotEnoughResults { required: usize, found: usize },

    #[error("invalid formula '{formula}' at position {position}: {reason}")]
    Parse {
        formula: String,
        position: usize,
        reason: String,
    },

    #[error("invalid registry: {0}")]
    InvalidRegistry(String),

    #[error("'{0}' is not a valid kernel, use one of 'linear', 'poly' or 'RBF'")]
    UnknownKernel(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Result type alias for specidx operations
pub type Result<T> = std::result::Result<T, Error>;
