//! Selections of node values and the views that enumerate them.
//!
//! A subset is a cheap, copyable description of some values of one node:
//! the whole node (its handle), one element, one row or one column. Rows
//! and columns exist only for matrix nodes. Subsets are resolved against a
//! model into a [`Span`] when used, which is valid for the life of the
//! model because node shapes never change.

use std::fmt;

use crate::{
    distribution::{Distribution, ParamValues},
    index::{Index, Span},
    model::Model,
    node::{AnyNode, Node, NodeHandle},
    shape::{Array, Lone, Matrix, Shape},
};

/// Some values of one node.
pub trait Subset: Copy {
    type Dist: Distribution;
    type Shape: Shape;

    fn handle(&self) -> NodeHandle<Self::Dist, Self::Shape>;

    fn span(&self, model: &Model) -> Span;

    fn node_id(&self) -> usize {
        self.handle().id()
    }

    /// Enumerate the selected values with their resolved parameters.
    fn view<'m>(&self, model: &'m Model) -> View<'m, Self::Dist, Self::Shape> {
        let (node, upstream) = model.node_upstream(self.handle());
        View {
            node,
            upstream,
            span: self.span(model),
        }
    }
}

/// A subset that always selects exactly one value.
pub trait SingleSite: Subset {
    fn offset(&self, model: &Model) -> usize;
}

impl<D: Distribution, S: Shape> Subset for NodeHandle<D, S> {
    type Dist = D;
    type Shape = S;

    fn handle(&self) -> NodeHandle<D, S> {
        *self
    }

    fn span(&self, model: &Model) -> Span {
        model.node(*self).shape().span()
    }
}

impl<D: Distribution> SingleSite for NodeHandle<D, Lone> {
    fn offset(&self, _model: &Model) -> usize {
        0
    }
}

/// One element of an array or matrix node.
pub struct Element<D, S: Shape> {
    handle: NodeHandle<D, S>,
    index: S::Index,
}

impl<D, S: Shape> Element<D, S> {
    pub fn index(&self) -> Index {
        S::to_index(self.index)
    }
}

impl<D, S: Shape> Clone for Element<D, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D, S: Shape> Copy for Element<D, S> {}

impl<D, S: Shape> fmt::Debug for Element<D, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("node", &self.handle.id())
            .field("index", &self.index)
            .finish()
    }
}

impl<D: Distribution, S: Shape> Subset for Element<D, S> {
    type Dist = D;
    type Shape = S;

    fn handle(&self) -> NodeHandle<D, S> {
        self.handle
    }

    fn span(&self, model: &Model) -> Span {
        Span::single(self.offset(model))
    }
}

impl<D: Distribution, S: Shape> SingleSite for Element<D, S> {
    fn offset(&self, model: &Model) -> usize {
        model.node(self.handle).shape().offset(self.index)
    }
}

/// One row of a matrix node.
pub struct Row<D> {
    handle: NodeHandle<D, Matrix>,
    row: usize,
}

/// One column of a matrix node.
pub struct Column<D> {
    handle: NodeHandle<D, Matrix>,
    col: usize,
}

macro_rules! copy_subset {
    ($name:ident, $field:ident) => {
        impl<D> Clone for $name<D> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<D> Copy for $name<D> {}

        impl<D> fmt::Debug for $name<D> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("node", &self.handle.id())
                    .field(stringify!($field), &self.$field)
                    .finish()
            }
        }
    };
}

copy_subset!(Row, row);
copy_subset!(Column, col);

impl<D: Distribution> Subset for Row<D> {
    type Dist = D;
    type Shape = Matrix;

    fn handle(&self) -> NodeHandle<D, Matrix> {
        self.handle
    }

    fn span(&self, model: &Model) -> Span {
        let Matrix { rows, cols } = model.node(self.handle).shape();
        assert!(self.row < rows, "row {} out of range for {rows} rows", self.row);
        Span::row(self.row, cols)
    }
}

impl<D: Distribution> Subset for Column<D> {
    type Dist = D;
    type Shape = Matrix;

    fn handle(&self) -> NodeHandle<D, Matrix> {
        self.handle
    }

    fn span(&self, model: &Model) -> Span {
        let Matrix { rows, cols } = model.node(self.handle).shape();
        assert!(self.col < cols, "column {} out of range for {cols} columns", self.col);
        Span::column(self.col, rows, cols)
    }
}

impl<D, S: Shape> NodeHandle<D, S> {
    /// The element at a typed index of any shape.
    pub fn at(self, index: S::Index) -> Element<D, S> {
        Element {
            handle: self,
            index,
        }
    }
}

impl<D> NodeHandle<D, Array> {
    pub fn element(self, index: usize) -> Element<D, Array> {
        Element {
            handle: self,
            index,
        }
    }
}

impl<D> NodeHandle<D, Matrix> {
    pub fn cell(self, row: usize, col: usize) -> Element<D, Matrix> {
        Element {
            handle: self,
            index: (row, col),
        }
    }

    pub fn row(self, row: usize) -> Row<D> {
        Row { handle: self, row }
    }

    pub fn column(self, col: usize) -> Column<D> {
        Column { handle: self, col }
    }
}

/// A selected value together with its position and resolved parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Site<V> {
    pub index: Index,
    pub value: V,
    pub params: ParamValues,
}

/// Non-copying enumerator over the values of a subset.
///
/// A view borrows the model, so it cannot outlive a move step that
/// mutates the same node.
pub struct View<'m, D: Distribution, S: Shape> {
    node: &'m Node<D, S>,
    upstream: &'m [Box<dyn AnyNode>],
    span: Span,
}

impl<'m, D: Distribution, S: Shape> View<'m, D, S> {
    pub fn len(&self) -> usize {
        self.span.len()
    }

    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = D::Value> + 'm {
        let node = self.node;
        self.span.offsets().map(move |offset| node.values()[offset])
    }

    pub fn iter(&self) -> impl Iterator<Item = Site<D::Value>> + 'm {
        let (node, upstream) = (self.node, self.upstream);
        self.span.offsets().map(move |offset| Site {
            index: node.shape().index_at(offset),
            value: node.values()[offset],
            params: node.params_at(upstream, offset),
        })
    }

    /// Sum of the log-probabilities of the selected values.
    pub fn logprob(&self) -> f64 {
        self.span
            .offsets()
            .map(|offset| self.node.logprob_at(self.upstream, offset))
            .sum()
    }
}
