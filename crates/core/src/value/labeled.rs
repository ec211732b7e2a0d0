//! Labeled N-dimensional arrays

use std::collections::BTreeMap;

use ndarray::{ArrayD, Axis};

use super::zip_arrays;
use crate::error::{Error, Result};

/// An N-d array with named dimensions and optional coordinate labels.
///
/// Each dimension has a name; any dimension may carry one label per
/// position (its coordinate). Arithmetic between two labeled arrays
/// requires the same dimensions in the same order, the same shape, and
/// equal coordinates wherever both operands define one.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    name: Option<String>,
    dims: Vec<String>,
    coords: BTreeMap<String, Vec<String>>,
    data: ArrayD<f64>,
}

impl DataArray {
    /// Wrap an array, naming each of its axes
    pub fn new<S: Into<String>>(data: ArrayD<f64>, dims: impl IntoIterator<Item = S>) -> Result<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != data.ndim() {
            return Err(Error::DimensionMismatch {
                expected: (0..data.ndim()).map(|i| format!("dim_{}", i)).collect(),
                found: dims,
            });
        }
        Ok(Self {
            name: None,
            dims,
            coords: BTreeMap::new(),
            data,
        })
    }

    /// Attach coordinate labels to a dimension (replacing any existing ones)
    pub fn with_coord<S: Into<String>>(
        mut self,
        dim: &str,
        labels: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let axis = self.axis_of(dim)?;
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let len = self.data.len_of(Axis(axis));
        if labels.len() != len {
            return Err(Error::LabelCount {
                expected: len,
                found: labels.len(),
            });
        }
        self.coords.insert(dim.to_string(), labels);
        Ok(self)
    }

    /// Set the array name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Coordinate labels of a dimension, if it has any
    pub fn coord(&self, dim: &str) -> Option<&[String]> {
        self.coords.get(dim).map(Vec::as_slice)
    }

    fn axis_of(&self, dim: &str) -> Result<usize> {
        self.dims
            .iter()
            .position(|d| d == dim)
            .ok_or_else(|| Error::UnknownDimension(dim.to_string()))
    }

    /// Select one position along a labeled dimension, dropping that dimension
    pub fn sel(&self, dim: &str, label: &str) -> Result<DataArray> {
        let axis = self.axis_of(dim)?;
        let pos = self
            .coord(dim)
            .and_then(|c| c.iter().position(|l| l == label))
            .ok_or_else(|| Error::UnknownLabel {
                dim: dim.to_string(),
                label: label.to_string(),
            })?;

        let mut dims = self.dims.clone();
        dims.remove(axis);
        let mut coords = self.coords.clone();
        coords.remove(dim);

        Ok(DataArray {
            name: self.name.clone(),
            dims,
            coords,
            data: self.data.index_axis(Axis(axis), pos).to_owned(),
        })
    }

    /// Apply a function to every value, keeping labels
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self {
            name: self.name.clone(),
            dims: self.dims.clone(),
            coords: self.coords.clone(),
            data: self.data.mapv(f),
        }
    }

    /// Combine with another labeled array elementwise
    pub fn zip<F: Fn(f64, f64) -> f64>(&self, other: &DataArray, f: F) -> Result<Self> {
        if self.dims != other.dims {
            return Err(Error::DimensionMismatch {
                expected: self.dims.clone(),
                found: other.dims.clone(),
            });
        }
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape().to_vec(),
                found: other.shape().to_vec(),
            });
        }

        let mut coords = self.coords.clone();
        for (dim, labels) in &other.coords {
            match coords.get(dim) {
                Some(mine) if mine != labels => {
                    return Err(Error::CoordinateMismatch { dim: dim.clone() });
                }
                Some(_) => {}
                None => {
                    coords.insert(dim.clone(), labels.clone());
                }
            }
        }

        let name = if self.name == other.name {
            self.name.clone()
        } else {
            None
        };

        Ok(Self {
            name,
            dims: self.dims.clone(),
            coords,
            data: zip_arrays(&self.data, &other.data, f)?,
        })
    }

    /// Combine with a plain array of the same shape
    pub fn zip_array<F: Fn(f64, f64) -> f64>(&self, other: &ArrayD<f64>, f: F) -> Result<Self> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape().to_vec(),
                found: other.shape().to_vec(),
            });
        }
        Ok(Self {
            name: self.name.clone(),
            dims: self.dims.clone(),
            coords: self.coords.clone(),
            data: zip_arrays(&self.data, other, f)?,
        })
    }

    /// Concatenate arrays along `dim`.
    ///
    /// If `dim` is one of the arrays' dimensions they are joined along it;
    /// otherwise a new leading dimension named `dim` is created with one
    /// position per array. Coordinates of other dimensions are taken from
    /// the first array; the coordinate of `dim` is kept only when every
    /// input has one.
    pub fn concat(arrays: &[DataArray], dim: &str) -> Result<DataArray> {
        let first = arrays.first().ok_or(Error::NotEnoughResults {
            required: 1,
            found: 0,
        })?;
        for other in &arrays[1..] {
            if other.dims != first.dims {
                return Err(Error::DimensionMismatch {
                    expected: first.dims.clone(),
                    found: other.dims.clone(),
                });
            }
        }

        let views: Vec<_> = arrays.iter().map(|a| a.data.view()).collect();
        let mut coords = first.coords.clone();

        let (dims, data) = match first.dims.iter().position(|d| d == dim) {
            Some(axis) => {
                let data = ndarray::concatenate(Axis(axis), &views)?;
                let joined: Option<Vec<String>> = arrays
                    .iter()
                    .map(|a| a.coords.get(dim).cloned())
                    .collect::<Option<Vec<_>>>()
                    .map(|parts| parts.concat());
                match joined {
                    Some(labels) => coords.insert(dim.to_string(), labels),
                    None => coords.remove(dim),
                };
                (first.dims.clone(), data)
            }
            None => {
                let data = ndarray::stack(Axis(0), &views)?;
                let mut dims = Vec::with_capacity(first.dims.len() + 1);
                dims.push(dim.to_string());
                dims.extend(first.dims.iter().cloned());
                (dims, data)
            }
        };

        Ok(DataArray {
            name: None,
            dims,
            coords,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, ArrayD, IxDyn};

    fn cube() -> DataArray {
        let data = Array3::from_shape_fn((2, 3, 3), |(c, i, j)| (c * 100 + i * 10 + j) as f64);
        DataArray::new(data.into_dyn(), ["channel", "x", "y"])
            .unwrap()
            .with_coord("channel", ["N", "R"])
            .unwrap()
    }

    #[test]
    fn test_dims_must_match_ndim() {
        let data = ArrayD::zeros(IxDyn(&[2, 2]));
        assert!(DataArray::new(data, ["x"]).is_err());
    }

    #[test]
    fn test_sel_drops_dimension() {
        let n = cube().sel("channel", "N").unwrap();
        assert_eq!(n.dims(), &["x".to_string(), "y".to_string()]);
        assert_eq!(n.shape(), &[3, 3]);
        assert_eq!(n.data()[[1, 2]], 12.0);
        assert!(n.coord("channel").is_none());

        let r = cube().sel("channel", "R").unwrap();
        assert_eq!(r.data()[[0, 0]], 100.0);
    }

    #[test]
    fn test_sel_unknown_label() {
        assert!(matches!(
            cube().sel("channel", "G"),
            Err(Error::UnknownLabel { .. })
        ));
        assert!(matches!(
            cube().sel("band", "N"),
            Err(Error::UnknownDimension(_))
        ));
    }

    #[test]
    fn test_zip_checks_coordinates() {
        let a = cube();
        let b = cube().with_coord("channel", ["R", "N"]).unwrap();
        assert!(matches!(
            a.zip(&b, |x, y| x + y),
            Err(Error::CoordinateMismatch { .. })
        ));
        let sum = a.zip(&cube(), |x, y| x + y).unwrap();
        assert_eq!(sum.data()[[1, 0, 1]], 202.0);
        assert_eq!(sum.coord("channel").unwrap(), &["N".to_string(), "R".to_string()]);
    }

    #[test]
    fn test_concat_new_dimension() {
        let n = cube().sel("channel", "N").unwrap();
        let r = cube().sel("channel", "R").unwrap();
        let joined = DataArray::concat(&[n, r], "index").unwrap();
        assert_eq!(joined.dims()[0], "index");
        assert_eq!(joined.shape(), &[2, 3, 3]);
        assert_eq!(joined.data()[[1, 0, 0]], 100.0);
    }

    #[test]
    fn test_concat_existing_dimension() {
        let joined = DataArray::concat(&[cube(), cube()], "channel").unwrap();
        assert_eq!(joined.shape(), &[4, 3, 3]);
        assert_eq!(joined.coord("channel").unwrap().len(), 4);
    }
}
