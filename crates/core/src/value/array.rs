//! Elementwise helpers for `ndarray` arrays

use ndarray::{ArrayD, Zip};

use crate::error::{Error, Result};

/// Combine two arrays elementwise with NumPy-style broadcasting.
///
/// Equal shapes zip directly; otherwise the smaller operand is broadcast
/// to the other's shape. Shapes that cannot broadcast either way fail with
/// [`Error::ShapeMismatch`].
pub(crate) fn zip_arrays<F>(lhs: &ArrayD<f64>, rhs: &ArrayD<f64>, f: F) -> Result<ArrayD<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    if lhs.shape() == rhs.shape() {
        return Ok(Zip::from(lhs).and(rhs).map_collect(|&a, &b| f(a, b)));
    }
    if let Some(r) = rhs.broadcast(lhs.raw_dim()) {
        return Ok(Zip::from(lhs).and(&r).map_collect(|&a, &b| f(a, b)));
    }
    if let Some(l) = lhs.broadcast(rhs.raw_dim()) {
        return Ok(Zip::from(&l).and(rhs).map_collect(|&a, &b| f(a, b)));
    }
    Err(Error::ShapeMismatch {
        expected: lhs.shape().to_vec(),
        found: rhs.shape().to_vec(),
    })
}
