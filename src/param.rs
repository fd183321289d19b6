use std::fmt;

use crate::{
    error::ModelError,
    index::Index,
    node::{AnyNode, NodeHandle},
    shape::{Array, Layout, Lone, Shape},
};

/// How an element of a node reads a referenced node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Every element reads the same element of the referenced node.
    Shared(Index),
    /// Element `i` reads element `i` of a referenced node of the same layout.
    Elementwise,
    /// Cell `(i, j)` of a matrix node reads element `i` of an array node.
    Row,
    /// Cell `(i, j)` of a matrix node reads element `j` of an array node.
    Column,
}

impl Binding {
    fn forward(&self, at: Index) -> Index {
        match *self {
            Binding::Shared(index) => index,
            Binding::Elementwise => at,
            Binding::Row => Index::Array(at.row().expect("row binding on a matrix node")),
            Binding::Column => Index::Array(at.column().expect("column binding on a matrix node")),
        }
    }
}

/// A parameter of a node.
///
/// Parameters never own what they reference: a reference is the arena id of
/// an earlier node, so the model is a DAG rooted at constants.
pub enum Param {
    Const(f64),
    Ref {
        model: u64,
        node: usize,
        binding: Binding,
    },
    PerIndex(Box<dyn Fn(Index) -> f64>),
}

impl Param {
    pub fn constant(value: f64) -> Param {
        Param::Const(value)
    }

    /// Every element reads the value of a lone node.
    pub fn shared<D>(node: NodeHandle<D, Lone>) -> Param {
        Param::Ref {
            model: node.model(),
            node: node.id(),
            binding: Binding::Shared(Index::None),
        }
    }

    /// Every element reads one fixed element of `node`.
    pub fn at<D, S: Shape>(node: NodeHandle<D, S>, index: S::Index) -> Param {
        Param::Ref {
            model: node.model(),
            node: node.id(),
            binding: Binding::Shared(S::to_index(index)),
        }
    }

    /// Element `i` reads element `i` of `node`.
    pub fn elementwise<D, S: Shape>(node: NodeHandle<D, S>) -> Param {
        Param::Ref {
            model: node.model(),
            node: node.id(),
            binding: Binding::Elementwise,
        }
    }

    pub fn by_row<D>(node: NodeHandle<D, Array>) -> Param {
        Param::Ref {
            model: node.model(),
            node: node.id(),
            binding: Binding::Row,
        }
    }

    pub fn by_column<D>(node: NodeHandle<D, Array>) -> Param {
        Param::Ref {
            model: node.model(),
            node: node.id(),
            binding: Binding::Column,
        }
    }

    /// A value generated from the index of each element.
    pub fn per_index<F>(f: F) -> Param
    where
        F: Fn(Index) -> f64 + 'static,
    {
        Param::PerIndex(Box::new(f))
    }

    pub(crate) fn resolve(&self, upstream: &[Box<dyn AnyNode>], at: Index) -> f64 {
        match self {
            Param::Const(value) => *value,
            Param::Ref { node, binding, .. } => upstream[*node].read(binding.forward(at)),
            Param::PerIndex(f) => f(at),
        }
    }

    /// Check that the parameter can be resolved for every element of a node
    /// with layout `layout`, given the nodes built so far by the model
    /// stamped `stamp`.
    pub(crate) fn validate(
        &self,
        param: &str,
        stamp: u64,
        upstream: &[Box<dyn AnyNode>],
        layout: Layout,
    ) -> Result<(), ModelError> {
        let (node, binding) = match self {
            Param::Ref { model, node, binding } => {
                if *model != stamp {
                    return Err(ModelError::ForeignHandle {
                        param: param.to_string(),
                    });
                }
                (*node, *binding)
            }
            _ => return Ok(()),
        };
        let target = upstream.get(node).ok_or_else(|| ModelError::ForeignHandle {
            param: param.to_string(),
        })?;
        let found = target.layout();
        let mismatch = || ModelError::BindingShape {
            param: param.to_string(),
            expected: layout,
            found,
        };
        match (binding, layout) {
            (Binding::Shared(index), _) => {
                if found.offset(index).is_none() {
                    return Err(ModelError::InvalidIndex {
                        name: target.name().to_string(),
                        index,
                    });
                }
            }
            (Binding::Elementwise, _) => {
                if found != layout {
                    return Err(mismatch());
                }
            }
            (Binding::Row, Layout::Matrix { rows, .. }) => {
                if found != Layout::Array(rows) {
                    return Err(mismatch());
                }
            }
            (Binding::Column, Layout::Matrix { cols, .. }) => {
                if found != Layout::Array(cols) {
                    return Err(mismatch());
                }
            }
            (Binding::Row | Binding::Column, _) => return Err(mismatch()),
        }
        Ok(())
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Param {
        Param::Const(value)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Const(value) => f.debug_tuple("Const").field(value).finish(),
            Param::Ref { node, binding, .. } => f
                .debug_struct("Ref")
                .field("node", node)
                .field("binding", binding)
                .finish(),
            Param::PerIndex(_) => f.write_str("PerIndex(..)"),
        }
    }
}
