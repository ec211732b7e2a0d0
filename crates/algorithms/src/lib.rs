//! # specidx algorithms
//!
//! Spectral index computation on top of `specidx-core`.
//!
//! ## Pipeline
//!
//! - **validate**: required-symbol checks, one index at a time
//! - **compute**: batch evaluation of named indices (`compute_index`)
//! - **kernel**: linear / polynomial / RBF kernels for kernel indices
//! - **unify**: combination of per-index results into one container

pub mod compute;
pub mod kernel;
pub mod unify;
pub mod validate;

pub use compute::{compute_index, evaluate_index, evaluate_indices, ComputeParams, Computed, IndexRequest};
pub use kernel::compute_kernel;
pub use unify::unify;
pub use validate::{validate, validate_index};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::compute::{compute_index, evaluate_indices, ComputeParams, Computed, IndexRequest};
    pub use crate::kernel::compute_kernel;
    pub use crate::unify::unify;
    pub use specidx_core::prelude::*;
    pub use specidx_core::ProcessingMode;
}
