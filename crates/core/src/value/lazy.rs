//! Chunked, deferred containers
//!
//! Operations on lazy containers record a task graph and return at once.
//! Nothing is computed until `compute()`, which evaluates the graph chunk
//! by chunk (chunks along the leading axis) under a [`ProcessingMode`] and
//! joins the blocks.

use std::sync::Arc;

use ndarray::{ArrayD, Axis, Ix1, IxDyn, Slice};
use specidx_parallel::{ParallelStrategy, ProcessingMode};

use super::{zip_arrays, BinaryOp, Frame, Series, UnaryOp};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
enum LazyNode {
    /// Materialized blocks, one per chunk
    Source(Arc<Vec<ArrayD<f64>>>),
    Constant(f64),
    Binary {
        op: BinaryOp,
        left: Arc<LazyNode>,
        right: Arc<LazyNode>,
    },
    Unary {
        op: UnaryOp,
        input: Arc<LazyNode>,
    },
    /// New leading axis; chunk `i` is the whole of input `i`
    Stack(Vec<LazyArray>),
}

/// Result of evaluating a node for one chunk
enum Block {
    Scalar(f64),
    Array(ArrayD<f64>),
}

fn chunk_sizes(len: usize, chunk_len: usize) -> Vec<usize> {
    if len == 0 {
        return vec![0];
    }
    let mut sizes = vec![chunk_len; len / chunk_len];
    if len % chunk_len != 0 {
        sizes.push(len % chunk_len);
    }
    sizes
}

fn split(array: &ArrayD<f64>, chunks: &[usize]) -> Vec<ArrayD<f64>> {
    let mut start = 0;
    chunks
        .iter()
        .map(|&len| {
            let block = array
                .slice_axis(Axis(0), Slice::from(start..start + len))
                .to_owned();
            start += len;
            block
        })
        .collect()
}

fn eval_block(node: &LazyNode, i: usize) -> Result<Block> {
    match node {
        LazyNode::Source(blocks) => Ok(Block::Array(blocks[i].clone())),
        LazyNode::Constant(v) => Ok(Block::Scalar(*v)),
        LazyNode::Binary { op, left, right } => {
            let l = eval_block(left, i)?;
            let r = eval_block(right, i)?;
            Ok(match (l, r) {
                (Block::Scalar(a), Block::Scalar(b)) => Block::Scalar(op.apply(a, b)),
                (Block::Array(a), Block::Scalar(b)) => Block::Array(a.mapv_into(|x| op.apply(x, b))),
                (Block::Scalar(a), Block::Array(b)) => Block::Array(b.mapv_into(|x| op.apply(a, x))),
                (Block::Array(a), Block::Array(b)) => {
                    Block::Array(zip_arrays(&a, &b, |x, y| op.apply(x, y))?)
                }
            })
        }
        LazyNode::Unary { op, input } => Ok(match eval_block(input, i)? {
            Block::Scalar(v) => Block::Scalar(op.apply(v)),
            Block::Array(a) => Block::Array(a.mapv_into(|x| op.apply(x))),
        }),
        LazyNode::Stack(inputs) => {
            // Nested graphs run sequentially inside the outer chunk task
            let full = inputs[i].compute_with(ProcessingMode::Sequential)?;
            Ok(Block::Array(full.insert_axis(Axis(0))))
        }
    }
}

/// A deferred N-d array chunked along its leading axis
#[derive(Debug, Clone, PartialEq)]
pub struct LazyArray {
    shape: Vec<usize>,
    chunks: Vec<usize>,
    node: Arc<LazyNode>,
}

impl LazyArray {
    /// Split an array into chunks of `chunk_len` positions along axis 0
    pub fn from_array(array: ArrayD<f64>, chunk_len: usize) -> Result<Self> {
        if array.ndim() == 0 {
            return Err(Error::InvalidChunks(
                "a 0-dimensional array has no axis to chunk".into(),
            ));
        }
        if chunk_len == 0 {
            return Err(Error::InvalidChunks("chunk length must be positive".into()));
        }
        let chunks = chunk_sizes(array.len_of(Axis(0)), chunk_len);
        let blocks = split(&array, &chunks);
        Ok(Self {
            shape: array.shape().to_vec(),
            chunks,
            node: Arc::new(LazyNode::Source(Arc::new(blocks))),
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Chunk sizes along the leading axis
    pub fn chunks(&self) -> &[usize] {
        &self.chunks
    }

    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    fn with_node(&self, node: LazyNode) -> Self {
        Self {
            shape: self.shape.clone(),
            chunks: self.chunks.clone(),
            node: Arc::new(node),
        }
    }

    fn binary_node(&self, op: BinaryOp, left: Arc<LazyNode>, right: Arc<LazyNode>) -> Self {
        self.with_node(LazyNode::Binary { op, left, right })
    }

    /// Materialize an eager array with this array's chunk layout
    fn source_like(&self, array: &ArrayD<f64>) -> Result<Arc<LazyNode>> {
        if array.shape() != self.shape.as_slice() {
            return Err(Error::ShapeMismatch {
                expected: self.shape.clone(),
                found: array.shape().to_vec(),
            });
        }
        Ok(Arc::new(LazyNode::Source(Arc::new(split(array, &self.chunks)))))
    }

    /// `self <op> rhs`; both must share shape and chunk layout
    pub fn op(&self, op: BinaryOp, rhs: &LazyArray) -> Result<Self> {
        if self.shape != rhs.shape {
            return Err(Error::ShapeMismatch {
                expected: self.shape.clone(),
                found: rhs.shape.clone(),
            });
        }
        if self.chunks != rhs.chunks {
            return Err(Error::InvalidChunks(format!(
                "chunk layouts differ: {:?} vs {:?}",
                self.chunks, rhs.chunks
            )));
        }
        Ok(self.binary_node(op, self.node.clone(), rhs.node.clone()))
    }

    /// `self <op> value`
    pub fn op_scalar(&self, op: BinaryOp, value: f64) -> Self {
        self.binary_node(op, self.node.clone(), Arc::new(LazyNode::Constant(value)))
    }

    /// `value <op> self`
    pub fn rop_scalar(&self, op: BinaryOp, value: f64) -> Self {
        self.binary_node(op, Arc::new(LazyNode::Constant(value)), self.node.clone())
    }

    /// `self <op> array`, the eager array having the same shape
    pub fn op_array(&self, op: BinaryOp, array: &ArrayD<f64>) -> Result<Self> {
        let source = self.source_like(array)?;
        Ok(self.binary_node(op, self.node.clone(), source))
    }

    /// `array <op> self`
    pub fn rop_array(&self, op: BinaryOp, array: &ArrayD<f64>) -> Result<Self> {
        let source = self.source_like(array)?;
        Ok(self.binary_node(op, source, self.node.clone()))
    }

    pub fn unary(&self, op: UnaryOp) -> Self {
        self.with_node(LazyNode::Unary {
            op,
            input: self.node.clone(),
        })
    }

    /// Stack same-shaped arrays along a new leading axis, one chunk per input
    pub fn stack(arrays: &[LazyArray]) -> Result<Self> {
        let first = arrays.first().ok_or(Error::NotEnoughResults {
            required: 1,
            found: 0,
        })?;
        if let Some(other) = arrays.iter().find(|a| a.shape != first.shape) {
            return Err(Error::ShapeMismatch {
                expected: first.shape.clone(),
                found: other.shape.clone(),
            });
        }

        let mut shape = Vec::with_capacity(first.shape.len() + 1);
        shape.push(arrays.len());
        shape.extend_from_slice(&first.shape);

        Ok(Self {
            shape,
            chunks: vec![1; arrays.len()],
            node: Arc::new(LazyNode::Stack(arrays.to_vec())),
        })
    }

    /// Evaluate the graph using all available cores
    pub fn compute(&self) -> Result<ArrayD<f64>> {
        self.compute_with(ProcessingMode::Parallel)
    }

    /// Evaluate the graph chunk by chunk under `mode`
    pub fn compute_with(&self, mode: ProcessingMode) -> Result<ArrayD<f64>> {
        tracing::trace!(chunks = self.chunks.len(), shape = ?self.shape, "computing deferred array");
        let blocks = mode
            .par_map(0..self.chunks.len(), |i| self.chunk(i))
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        let views: Vec<_> = blocks.iter().map(|b| b.view()).collect();
        Ok(ndarray::concatenate(Axis(0), &views)?)
    }

    fn chunk(&self, i: usize) -> Result<ArrayD<f64>> {
        match eval_block(&self.node, i)? {
            Block::Array(a) => Ok(a),
            Block::Scalar(v) => {
                let mut shape = self.shape.clone();
                shape[0] = self.chunks[i];
                Ok(ArrayD::from_elem(IxDyn(&shape), v))
            }
        }
    }
}

/// A deferred labeled column
#[derive(Debug, Clone, PartialEq)]
pub struct LazySeries {
    name: Option<String>,
    index: Vec<String>,
    values: LazyArray,
}

impl LazySeries {
    /// Chunk an eager series
    pub fn from_series(series: &Series, chunk_len: usize) -> Result<Self> {
        Ok(Self {
            name: series.name().map(str::to_string),
            index: series.index().to_vec(),
            values: LazyArray::from_array(series.values().clone().into_dyn(), chunk_len)?,
        })
    }

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

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn values(&self) -> &LazyArray {
        &self.values
    }

    fn derive(&self, name: Option<String>, values: LazyArray) -> Self {
        Self {
            name,
            index: self.index.clone(),
            values,
        }
    }

    pub fn op(&self, op: BinaryOp, rhs: &LazySeries) -> Result<Self> {
        if self.index != rhs.index {
            return Err(Error::IndexMismatch);
        }
        let name = if self.name == rhs.name {
            self.name.clone()
        } else {
            None
        };
        Ok(self.derive(name, self.values.op(op, &rhs.values)?))
    }

    pub fn op_scalar(&self, op: BinaryOp, value: f64) -> Self {
        self.derive(self.name.clone(), self.values.op_scalar(op, value))
    }

    pub fn rop_scalar(&self, op: BinaryOp, value: f64) -> Self {
        self.derive(self.name.clone(), self.values.rop_scalar(op, value))
    }

    /// `self <op> series` with an eager series carrying the same row labels
    pub fn op_series(&self, op: BinaryOp, rhs: &Series) -> Result<Self> {
        if self.index.as_slice() != rhs.index() {
            return Err(Error::IndexMismatch);
        }
        let values = self.values.op_array(op, &rhs.values().clone().into_dyn())?;
        Ok(self.derive(self.name.clone(), values))
    }

    /// `series <op> self`
    pub fn rop_series(&self, op: BinaryOp, lhs: &Series) -> Result<Self> {
        if self.index.as_slice() != lhs.index() {
            return Err(Error::IndexMismatch);
        }
        let values = self.values.rop_array(op, &lhs.values().clone().into_dyn())?;
        Ok(self.derive(self.name.clone(), values))
    }

    pub fn unary(&self, op: UnaryOp) -> Self {
        self.derive(self.name.clone(), self.values.unary(op))
    }

    pub fn compute(&self) -> Result<Series> {
        self.compute_with(ProcessingMode::Parallel)
    }

    pub fn compute_with(&self, mode: ProcessingMode) -> Result<Series> {
        let values = self.values.compute_with(mode)?.into_dimensionality::<Ix1>()?;
        let series = Series::new(values).with_index(self.index.iter().cloned())?;
        Ok(match &self.name {
            Some(name) => series.with_name(name.clone()),
            None => series,
        })
    }
}

/// A deferred table of equally-labeled columns
#[derive(Debug, Clone, PartialEq)]
pub struct LazyFrame {
    columns: Vec<String>,
    series: Vec<LazySeries>,
}

impl LazyFrame {
    /// Concatenate columns side by side. Columns are named after each
    /// series' name, or its position when unnamed.
    pub fn concat(series: &[LazySeries]) -> Result<Self> {
        if let Some(first) = series.first() {
            if series.iter().any(|s| s.index != first.index) {
                return Err(Error::IndexMismatch);
            }
        }
        let columns = series
            .iter()
            .enumerate()
            .map(|(i, s)| s.name.clone().unwrap_or_else(|| i.to_string()))
            .collect();
        Ok(Self {
            columns,
            series: series.to_vec(),
        })
    }

    /// Rename all columns; `labels` must have one entry per column
    pub fn rename<S: AsRef<str>>(mut self, labels: &[S]) -> Result<Self> {
        if labels.len() != self.columns.len() {
            return Err(Error::LabelCount {
                expected: self.columns.len(),
                found: labels.len(),
            });
        }
        self.columns = labels.iter().map(|l| l.as_ref().to_string()).collect();
        Ok(self)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&LazySeries> {
        let pos = self.columns.iter().position(|c| c == name)?;
        self.series.get(pos)
    }

    pub fn compute(&self) -> Result<Frame> {
        self.compute_with(ProcessingMode::Parallel)
    }

    pub fn compute_with(&self, mode: ProcessingMode) -> Result<Frame> {
        let series = self
            .series
            .iter()
            .map(|s| s.compute_with(mode))
            .collect::<Result<Vec<_>>>()?;
        Frame::from_series(&self.columns, series)
    }
}
