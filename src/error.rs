use thiserror::Error;

use crate::{index::Index, shape::Layout};

/// Errors while assembling a model or looking up its nodes.
///
/// Faults during sampling are not represented here: a mismatched restore,
/// an out-of-range index or an invalid distribution parameter is a bug in
/// the model and aborts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("a node named {name:?} already exists")]
    DuplicateName { name: String },
    #[error("no node named {name:?}")]
    UnknownNode { name: String },
    #[error("node {name:?} has a different distribution or shape than requested")]
    TypeMismatch { name: String },
    #[error("{dist} has no parameter named {param:?}")]
    UnknownParameter { dist: &'static str, param: String },
    #[error("parameter {param:?} of {dist} was not provided")]
    MissingParameter {
        dist: &'static str,
        param: &'static str,
    },
    #[error("parameter {param:?} of {dist} was provided more than once")]
    DuplicateParameter { dist: &'static str, param: String },
    #[error("parameter {param:?} references a node that is not part of this model")]
    ForeignHandle { param: String },
    #[error("parameter {param:?} cannot bind a node of layout {found:?} to a node of layout {expected:?}")]
    BindingShape {
        param: String,
        expected: Layout,
        found: Layout,
    },
    #[error("index {index:?} is not valid for node {name:?}")]
    InvalidIndex { name: String, index: Index },
    #[error("node {name:?} would have no elements")]
    EmptyShape { name: String },
}
