//! Labeled tabular columns and tables

use ndarray::{Array1, ArrayD, Zip};

use super::zip_arrays;
use crate::error::{Error, Result};

fn default_index(len: usize) -> Vec<String> {
    (0..len).map(|i| i.to_string()).collect()
}

/// A labeled 1-D column: values plus one row label per value and an
/// optional column name.
///
/// Binary operations between two series require identical row labels;
/// there is no implicit realignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: Option<String>,
    index: Vec<String>,
    values: Array1<f64>,
}

impl Series {
    /// Create a series with the default `0..n` row labels
    pub fn new(values: impl Into<Array1<f64>>) -> Self {
        let values = values.into();
        Self {
            name: None,
            index: default_index(values.len()),
            values,
        }
    }

    /// Replace the row labels
    pub fn with_index<S: Into<String>>(mut self, index: impl IntoIterator<Item = S>) -> Result<Self> {
        let index: Vec<String> = index.into_iter().map(Into::into).collect();
        if index.len() != self.values.len() {
            return Err(Error::LabelCount {
                expected: self.values.len(),
                found: index.len(),
            });
        }
        self.index = index;
        Ok(self)
    }

    /// Set the column name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a row label
    pub fn get(&self, label: &str) -> Option<f64> {
        self.index
            .iter()
            .position(|l| l == label)
            .map(|i| self.values[i])
    }

    /// Apply a function to every value, keeping name and labels
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self {
            name: self.name.clone(),
            index: self.index.clone(),
            values: self.values.mapv(f),
        }
    }

    /// Combine with another series elementwise.
    ///
    /// The result keeps the name only when both operands share it.
    pub fn zip<F: Fn(f64, f64) -> f64>(&self, other: &Series, f: F) -> Result<Self> {
        if self.index != other.index {
            return Err(Error::IndexMismatch);
        }
        let name = if self.name == other.name {
            self.name.clone()
        } else {
            None
        };
        Ok(Self {
            name,
            index: self.index.clone(),
            values: Zip::from(&self.values)
                .and(&other.values)
                .map_collect(|&a, &b| f(a, b)),
        })
    }

    /// Combine with a plain array of broadcast-compatible shape
    pub fn zip_array<F: Fn(f64, f64) -> f64>(&self, other: &ArrayD<f64>, f: F) -> Result<Self> {
        let values = zip_arrays(&self.values.clone().into_dyn(), other, f)?;
        if values.ndim() != 1 || values.len() != self.len() {
            return Err(Error::ShapeMismatch {
                expected: vec![self.len()],
                found: other.shape().to_vec(),
            });
        }
        Ok(Self {
            name: self.name.clone(),
            index: self.index.clone(),
            values: values.into_dimensionality()?,
        })
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Series::new(values)
    }
}

/// A table of equally-labeled columns
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    index: Vec<String>,
    columns: Vec<String>,
    data: Vec<Array1<f64>>,
}

impl Frame {
    /// Assemble a table with one column per series, named by `labels`.
    ///
    /// All series must share the same row labels.
    pub fn from_series(labels: &[String], series: Vec<Series>) -> Result<Self> {
        if labels.len() != series.len() {
            return Err(Error::LabelCount {
                expected: series.len(),
                found: labels.len(),
            });
        }
        let index = series
            .first()
            .map(|s| s.index.clone())
            .unwrap_or_default();
        if series.iter().any(|s| s.index != index) {
            return Err(Error::IndexMismatch);
        }

        Ok(Self {
            index,
            columns: labels.to_vec(),
            data: series.into_iter().map(|s| s.values).collect(),
        })
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.index.len(), self.columns.len())
    }

    /// A column as a named series
    pub fn column(&self, name: &str) -> Option<Series> {
        let pos = self.columns.iter().position(|c| c == name)?;
        Some(Series {
            name: Some(name.to_string()),
            index: self.index.clone(),
            values: self.data[pos].clone(),
        })
    }
}
