//! # specidx Parallel
//!
//! Processing strategies shared by the specidx crates.
//!
//! This crate provides:
//! - `ProcessingMode`: sequential, all-cores or fixed-size pool execution
//! - `ParallelStrategy`: order-preserving `par_map` over an index range
//!
//! With the `parallel` feature disabled (e.g. WASM builds) every mode runs
//! sequentially.

pub mod strategy;

pub use strategy::{num_threads, ParallelStrategy, ProcessingMode};
