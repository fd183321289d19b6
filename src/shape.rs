//! Node shapes.
//!
//! Every node is tagged with exactly one of [`Lone`], [`Array`] or
//! [`Matrix`]. The tag is a type parameter of the node, so operations that
//! only make sense for one shape (rows and columns of a matrix, element
//! access of an array) are only defined on that shape and misuse is a
//! compile error. The set of shapes is closed.

use std::fmt::Debug;

use crate::index::{Index, Span};

mod private {
    pub trait Sealed {}

    impl Sealed for super::Lone {}
    impl Sealed for super::Array {}
    impl Sealed for super::Matrix {}
}

/// Storage layout of a node, fixed at construction.
pub trait Shape: private::Sealed + Copy + Debug + PartialEq + Send + Sync + 'static {
    /// The statically typed index for this shape.
    type Index: Copy + Debug;

    /// Number of scalar values stored.
    fn len(&self) -> usize;

    /// Flat offset of an index. Panics if the index is out of range.
    fn offset(&self, index: Self::Index) -> usize;

    /// Inverse of `offset`. Panics if the offset is out of range.
    fn unflatten(&self, offset: usize) -> Self::Index;

    /// Inverse of `offset`, returned as a dynamic index.
    fn index_at(&self, offset: usize) -> Index {
        Self::to_index(self.unflatten(offset))
    }

    /// Convert a typed index to its dynamic form.
    fn to_index(index: Self::Index) -> Index;

    fn layout(&self) -> Layout;

    fn span(&self) -> Span {
        Span::whole(self.len())
    }
}

/// A single scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lone;

/// A fixed-length vector of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Array {
    pub len: usize,
}

/// A fixed-size row-major matrix of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
}

impl Shape for Lone {
    type Index = ();

    fn len(&self) -> usize {
        1
    }

    fn offset(&self, _index: ()) -> usize {
        0
    }

    fn unflatten(&self, offset: usize) {
        assert!(offset == 0, "offset {offset} out of range for a lone node");
    }

    fn to_index(_index: ()) -> Index {
        Index::None
    }

    fn layout(&self) -> Layout {
        Layout::Lone
    }
}

impl Shape for Array {
    type Index = usize;

    fn len(&self) -> usize {
        self.len
    }

    fn offset(&self, index: usize) -> usize {
        assert!(
            index < self.len,
            "index {index} out of range for array of length {}",
            self.len
        );
        index
    }

    fn unflatten(&self, offset: usize) -> usize {
        assert!(offset < self.len, "offset {offset} out of range for array of length {}", self.len);
        offset
    }

    fn to_index(index: usize) -> Index {
        Index::Array(index)
    }

    fn layout(&self) -> Layout {
        Layout::Array(self.len)
    }
}

impl Shape for Matrix {
    type Index = (usize, usize);

    fn len(&self) -> usize {
        self.rows * self.cols
    }

    fn offset(&self, (i, j): (usize, usize)) -> usize {
        assert!(
            (i < self.rows) & (j < self.cols),
            "index ({i}, {j}) out of range for {}x{} matrix",
            self.rows,
            self.cols
        );
        i * self.cols + j
    }

    fn unflatten(&self, offset: usize) -> (usize, usize) {
        assert!(
            offset < self.len(),
            "offset {offset} out of range for {}x{} matrix",
            self.rows,
            self.cols
        );
        (offset / self.cols, offset % self.cols)
    }

    fn to_index((i, j): (usize, usize)) -> Index {
        Index::Matrix(i, j)
    }

    fn layout(&self) -> Layout {
        Layout::Matrix {
            rows: self.rows,
            cols: self.cols,
        }
    }
}

/// Runtime description of a shape.
///
/// Only used where the shape of a node cannot be known statically: when
/// validating parameter bindings and when resolving a dynamic [`Index`]
/// into a referenced node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Lone,
    Array(usize),
    Matrix { rows: usize, cols: usize },
}

impl Layout {
    pub fn len(&self) -> usize {
        match *self {
            Layout::Lone => 1,
            Layout::Array(n) => n,
            Layout::Matrix { rows, cols } => rows * cols,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat offset of a dynamic index, or `None` if the index does not fit.
    pub fn offset(&self, index: Index) -> Option<usize> {
        match (*self, index) {
            (Layout::Lone, Index::None) => Some(0),
            (Layout::Array(n), Index::Array(i)) if i < n => Some(i),
            (Layout::Matrix { rows, cols }, Index::Matrix(i, j)) if (i < rows) & (j < cols) => {
                Some(i * cols + j)
            }
            _ => None,
        }
    }
}
