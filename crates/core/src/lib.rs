//! # specidx core
//!
//! Core types for the specidx spectral index engine.
//!
//! This crate provides:
//! - `Formula`: arithmetic formulas parsed once into an expression tree
//! - `Operand`: the arithmetic capability formulas are evaluated over
//! - `Value`: the closed set of supported containers (scalars, arrays,
//!   labeled columns and arrays, remote handles, deferred arrays)
//! - `Bindings`: symbol → value maps supplied per computation
//! - `Registry`: index definitions, band/constant catalogues and kernels

pub mod bindings;
pub mod error;
pub mod expr;
pub mod registry;
pub mod value;

pub use bindings::Bindings;
pub use error::{Error, Result};
pub use expr::{Formula, Function, Scope};
pub use registry::{IndexDefinition, Kernel, Registry};
pub use value::{BinaryOp, ContainerKind, Operand, UnaryOp, Value};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::bindings::Bindings;
    pub use crate::error::{Error, Result};
    pub use crate::expr::{Formula, Function, Scope};
    pub use crate::registry::{IndexDefinition, Kernel, Registry};
    pub use crate::value::{
        BinaryOp, ContainerKind, DataArray, Frame, LazyArray, LazyFrame, LazySeries, Operand,
        RemoteImage, RemoteList, RemoteNumber, Series, UnaryOp, Value,
    };
}

pub use specidx_parallel::ProcessingMode;
