use std::{any::Any, fmt, marker::PhantomData};

use rand::RngCore;

use crate::{
    distribution::{Distribution, ParamValues, Scalar},
    index::{Index, Span},
    param::Param,
    shape::{Layout, Lone, Matrix, Shape},
};

/// A typed reference to a node in a [`Model`](crate::Model).
///
/// Handles are plain ids stamped with the model that issued them: they
/// borrow nothing and can be copied into closures freely. The distribution and shape are part of the type, so
/// shape-specific operations are checked by the compiler.
pub struct NodeHandle<D, S> {
    model: u64,
    id: usize,
    _marker: PhantomData<fn() -> (D, S)>,
}

impl<D, S> NodeHandle<D, S> {
    pub(crate) fn new(model: u64, id: usize) -> Self {
        NodeHandle {
            model,
            id,
            _marker: PhantomData,
        }
    }

    /// Position of the node in the model, in construction order.
    pub fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn model(&self) -> u64 {
        self.model
    }
}

impl<D, S> Clone for NodeHandle<D, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D, S> Copy for NodeHandle<D, S> {}

impl<D, S> PartialEq for NodeHandle<D, S> {
    fn eq(&self, other: &Self) -> bool {
        (self.model, self.id) == (other.model, other.id)
    }
}

impl<D, S> Eq for NodeHandle<D, S> {}

impl<D, S> fmt::Debug for NodeHandle<D, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("model", &self.model)
            .field("id", &self.id)
            .finish()
    }
}

/// A random variable: values, parameters, shape and distribution.
///
/// The shape is fixed when the node is built. Values change through moves,
/// draws and explicit sets, never in number.
pub struct Node<D: Distribution, S: Shape> {
    name: String,
    shape: S,
    values: Vec<D::Value>,
    params: Vec<Param>,
}

impl<D: Distribution, S: Shape> Node<D, S> {
    pub(crate) fn new(name: String, shape: S, params: Vec<Param>) -> Self {
        debug_assert_eq!(params.len(), D::PARAMS.len());
        Node {
            name,
            values: vec![D::Value::default(); shape.len()],
            shape,
            params,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> S {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[D::Value] {
        &self.values
    }

    pub fn get(&self, index: S::Index) -> D::Value {
        self.values[self.shape.offset(index)]
    }

    /// Overwrite one value, e.g. to clamp an observation.
    pub fn set(&mut self, index: S::Index, value: D::Value) {
        let offset = self.shape.offset(index);
        self.values[offset] = value;
    }

    pub fn fill(&mut self, value: D::Value) {
        self.values.fill(value);
    }

    /// Overwrite all values in storage order. Panics if `values` does not
    /// have exactly one entry per element.
    pub fn set_values(&mut self, values: &[D::Value]) {
        assert_eq!(
            values.len(),
            self.values.len(),
            "node {:?} holds {} values",
            self.name,
            self.values.len()
        );
        self.values.copy_from_slice(values);
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub(crate) fn values_mut(&mut self) -> &mut [D::Value] {
        &mut self.values
    }

    pub(crate) fn params_at(&self, upstream: &[Box<dyn AnyNode>], offset: usize) -> ParamValues {
        let at = self.shape.index_at(offset);
        self.params
            .iter()
            .map(|param| param.resolve(upstream, at))
            .collect()
    }

    pub(crate) fn logprob_at(&self, upstream: &[Box<dyn AnyNode>], offset: usize) -> f64 {
        D::logprob(self.values[offset], &self.params_at(upstream, offset))
    }
}

impl<D: Distribution> Node<D, Lone> {
    pub fn value(&self) -> D::Value {
        self.values[0]
    }

    pub fn set_value(&mut self, value: D::Value) {
        self.values[0] = value;
    }
}

impl<D: Distribution> Node<D, Matrix> {
    pub fn row(&self, row: usize) -> &[D::Value] {
        let cols = self.shape.cols;
        assert!(row < self.shape.rows);
        &self.values[row * cols..(row + 1) * cols]
    }
}

impl<D: Distribution, S: Shape> fmt::Debug for Node<D, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("distribution", &D::NAME)
            .field("shape", &self.shape)
            .field("values", &self.values)
            .field("params", &self.params)
            .finish()
    }
}

/// Type-erased view of a node, as stored in the model arena.
pub(crate) trait AnyNode: Any {
    fn name(&self) -> &str;
    fn distribution(&self) -> &'static str;
    fn layout(&self) -> Layout;
    fn read(&self, index: Index) -> f64;
    fn logprob_span(&self, upstream: &[Box<dyn AnyNode>], span: Span) -> f64;
    fn draw_span(&mut self, upstream: &[Box<dyn AnyNode>], span: Span, rng: &mut dyn RngCore);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<D: Distribution, S: Shape> AnyNode for Node<D, S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn distribution(&self) -> &'static str {
        D::NAME
    }

    fn layout(&self) -> Layout {
        self.shape.layout()
    }

    fn read(&self, index: Index) -> f64 {
        let offset = self.shape.layout().offset(index).unwrap_or_else(|| {
            panic!("index {index:?} is not valid for node {:?}", self.name)
        });
        self.values[offset].to_f64()
    }

    fn logprob_span(&self, upstream: &[Box<dyn AnyNode>], span: Span) -> f64 {
        span.offsets()
            .map(|offset| self.logprob_at(upstream, offset))
            .sum()
    }

    fn draw_span(&mut self, upstream: &[Box<dyn AnyNode>], span: Span, rng: &mut dyn RngCore) {
        for offset in span.offsets() {
            let params = self.params_at(upstream, offset);
            self.values[offset] = D::draw(&params, rng);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
