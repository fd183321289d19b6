use std::fmt;

/// A position inside the storage of a node.
///
/// Lone nodes are addressed with `Index::None`, array nodes with
/// `Index::Array(i)` and matrix nodes with `Index::Matrix(row, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    None,
    Array(usize),
    Matrix(usize, usize),
}

impl Index {
    /// The row of a matrix index, or the position of an array index.
    pub fn row(&self) -> Option<usize> {
        match *self {
            Index::Array(i) | Index::Matrix(i, _) => Some(i),
            Index::None => None,
        }
    }

    /// The column of a matrix index.
    pub fn column(&self) -> Option<usize> {
        match *self {
            Index::Matrix(_, j) => Some(j),
            _ => None,
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Index::None => Ok(()),
            Index::Array(i) => write!(f, "[{i}]"),
            Index::Matrix(i, j) => write!(f, "[{i}, {j}]"),
        }
    }
}

/// A strided selection of offsets into the flat storage of a node.
///
/// Whole nodes, single elements, matrix rows and matrix columns are all
/// spans, which lets backup, restore, views and proposals share one
/// iteration scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub(crate) start: usize,
    pub(crate) step: usize,
    pub(crate) count: usize,
}

impl Span {
    pub(crate) fn whole(len: usize) -> Span {
        Span {
            start: 0,
            step: 1,
            count: len,
        }
    }

    pub(crate) fn single(offset: usize) -> Span {
        Span {
            start: offset,
            step: 1,
            count: 1,
        }
    }

    pub(crate) fn row(row: usize, cols: usize) -> Span {
        Span {
            start: row * cols,
            step: 1,
            count: cols,
        }
    }

    pub(crate) fn column(col: usize, rows: usize, cols: usize) -> Span {
        Span {
            start: col,
            step: cols,
            count: rows,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn offsets(&self) -> impl Iterator<Item = usize> + Clone {
        let Span { start, step, count } = *self;
        (0..count).map(move |k| start + k * step)
    }
}
