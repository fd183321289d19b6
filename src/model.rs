//! The model arena.
//!
//! A model is an ordered collection of named nodes. Nodes are only ever
//! appended, and parameters can only reference nodes that already exist,
//! so construction order is a topological order of the dependency graph.

use std::{
    collections::HashMap,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use rand::{Rng, RngCore};

use crate::{
    distribution::Distribution,
    error::ModelError,
    index::{Index, Span},
    node::{AnyNode, Node, NodeHandle},
    param::Param,
    shape::{Array, Layout, Lone, Matrix, Shape},
    subset::Subset,
};

const SCOPE_SEPARATOR: &str = "::";

static NEXT_MODEL: AtomicU64 = AtomicU64::new(0);

pub struct Model {
    /// Unique per model, copied into every handle the model hands out.
    stamp: u64,
    nodes: Vec<Box<dyn AnyNode>>,
    names: HashMap<String, usize>,
    scope: Vec<String>,
}

impl Default for Model {
    fn default() -> Model {
        Model {
            stamp: NEXT_MODEL.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
            names: HashMap::new(),
            scope: Vec::new(),
        }
    }
}

impl Model {
    pub fn new() -> Model {
        Model::default()
    }

    pub fn add_lone<'a, D: Distribution>(
        &mut self,
        name: &str,
        params: impl IntoIterator<Item = (&'a str, Param)>,
    ) -> Result<NodeHandle<D, Lone>, ModelError> {
        self.add(name, Lone, params)
    }

    pub fn add_array<'a, D: Distribution>(
        &mut self,
        name: &str,
        len: usize,
        params: impl IntoIterator<Item = (&'a str, Param)>,
    ) -> Result<NodeHandle<D, Array>, ModelError> {
        self.add(name, Array { len }, params)
    }

    pub fn add_matrix<'a, D: Distribution>(
        &mut self,
        name: &str,
        rows: usize,
        cols: usize,
        params: impl IntoIterator<Item = (&'a str, Param)>,
    ) -> Result<NodeHandle<D, Matrix>, ModelError> {
        self.add(name, Matrix { rows, cols }, params)
    }

    /// Append a node.
    ///
    /// `params` are matched to the distribution's declared parameters by
    /// name; every declared parameter must be given exactly once. Values
    /// start at the default of the value type, use [`Model::draw_all`] or
    /// explicit sets to initialize them.
    pub fn add<'a, D: Distribution, S: Shape>(
        &mut self,
        name: &str,
        shape: S,
        params: impl IntoIterator<Item = (&'a str, Param)>,
    ) -> Result<NodeHandle<D, S>, ModelError> {
        let name = self.qualify(name);
        if shape.len() == 0 {
            return Err(ModelError::EmptyShape { name });
        }
        if self.names.contains_key(&name) {
            return Err(ModelError::DuplicateName { name });
        }

        let mut slots: Vec<Option<Param>> = D::PARAMS.iter().map(|_| None).collect();
        for (param_name, param) in params {
            let position = D::PARAMS
                .iter()
                .position(|&declared| declared == param_name)
                .ok_or_else(|| ModelError::UnknownParameter {
                    dist: D::NAME,
                    param: param_name.to_string(),
                })?;
            if slots[position].is_some() {
                return Err(ModelError::DuplicateParameter {
                    dist: D::NAME,
                    param: param_name.to_string(),
                });
            }
            param.validate(param_name, self.stamp, &self.nodes, shape.layout())?;
            slots[position] = Some(param);
        }
        let params = slots
            .into_iter()
            .zip(D::PARAMS)
            .map(|(slot, &param)| {
                slot.ok_or(ModelError::MissingParameter {
                    dist: D::NAME,
                    param,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let id = self.nodes.len();
        log::debug!("adding {} node {name:?} with shape {shape:?}", D::NAME);
        self.nodes.push(Box::new(Node::<D, S>::new(name.clone(), shape, params)));
        self.names.insert(name, id);
        Ok(NodeHandle::new(self.stamp, id))
    }

    /// Build a sub-model whose node names are prefixed with `prefix::`.
    pub fn nested<T, F>(&mut self, prefix: &str, build: F) -> Result<T, ModelError>
    where
        F: FnOnce(&mut Model) -> Result<T, ModelError>,
    {
        self.scope.push(prefix.to_string());
        let out = build(self);
        self.scope.pop();
        out
    }

    fn qualify(&self, name: &str) -> String {
        if self.scope.is_empty() {
            name.to_string()
        } else {
            let mut full = self.scope.join(SCOPE_SEPARATOR);
            full.push_str(SCOPE_SEPARATOR);
            full.push_str(name);
            full
        }
    }

    /// Look up a node by its full name.
    pub fn handle<D: Distribution, S: Shape>(&self, name: &str) -> Result<NodeHandle<D, S>, ModelError> {
        let &id = self.names.get(name).ok_or_else(|| ModelError::UnknownNode {
            name: name.to_string(),
        })?;
        if !self.nodes[id].as_any().is::<Node<D, S>>() {
            return Err(ModelError::TypeMismatch {
                name: name.to_string(),
            });
        }
        Ok(NodeHandle::new(self.stamp, id))
    }

    /// Panics if the handle was created by a different model.
    pub fn node<D: Distribution, S: Shape>(&self, handle: NodeHandle<D, S>) -> &Node<D, S> {
        self.check_owner(handle);
        self.nodes
            .get(handle.id())
            .and_then(|node| node.as_any().downcast_ref())
            .unwrap_or_else(|| panic!("{handle:?} does not belong to this model"))
    }

    /// Mutable access to a node, e.g. to clamp observed values.
    ///
    /// Panics if the handle was created by a different model.
    pub fn node_mut<D: Distribution, S: Shape>(&mut self, handle: NodeHandle<D, S>) -> &mut Node<D, S> {
        self.check_owner(handle);
        self.nodes
            .get_mut(handle.id())
            .and_then(|node| node.as_any_mut().downcast_mut())
            .unwrap_or_else(|| panic!("{handle:?} does not belong to this model"))
    }

    fn check_owner<D, S>(&self, handle: NodeHandle<D, S>) {
        assert!(
            handle.model() == self.stamp,
            "{handle:?} does not belong to this model"
        );
    }

    /// A node together with the nodes its parameters may reference.
    pub(crate) fn node_upstream<D: Distribution, S: Shape>(
        &self,
        handle: NodeHandle<D, S>,
    ) -> (&Node<D, S>, &[Box<dyn AnyNode>]) {
        (self.node(handle), &self.nodes[..handle.id()])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in construction order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeInfo<'_>> + '_ {
        (0..self.nodes.len()).map(move |id| NodeInfo { model: self, id })
    }

    /// Redraw the selected values from their prior given current parameters.
    pub fn draw<T: Subset, R: Rng + ?Sized>(&mut self, target: T, rng: &mut R) {
        let span = target.span(self);
        self.draw_span(target.node_id(), span, rng);
    }

    /// Ancestral sampling of every node, in construction order.
    pub fn draw_all<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for id in 0..self.nodes.len() {
            let span = Span::whole(self.nodes[id].layout().len());
            self.draw_span(id, span, rng);
        }
    }

    fn draw_span<R: Rng + ?Sized>(&mut self, id: usize, span: Span, mut rng: &mut R) {
        let (upstream, rest) = self.nodes.split_at_mut(id);
        let rng: &mut dyn RngCore = &mut rng;
        rest[0].draw_span(upstream, span, rng);
    }

    /// Joint log-probability of all nodes.
    pub fn logprob(&self) -> f64 {
        self.nodes().map(|node| node.logprob()).sum()
    }

    pub(crate) fn logprob_span(&self, id: usize, span: Span) -> f64 {
        self.nodes[id].logprob_span(&self.nodes[..id], span)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.nodes.iter().map(|node| (node.name(), node.distribution(), node.layout())))
            .finish()
    }
}

/// Read access to one node without knowing its type.
#[derive(Clone, Copy)]
pub struct NodeInfo<'m> {
    model: &'m Model,
    id: usize,
}

impl<'m> NodeInfo<'m> {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &'m str {
        self.model.nodes[self.id].name()
    }

    pub fn distribution(&self) -> &'static str {
        self.model.nodes[self.id].distribution()
    }

    pub fn layout(&self) -> Layout {
        self.model.nodes[self.id].layout()
    }

    /// A value as a real number. Panics if `index` does not fit the layout.
    pub fn read(&self, index: Index) -> f64 {
        self.model.nodes[self.id].read(index)
    }

    pub fn logprob(&self) -> f64 {
        let span = Span::whole(self.layout().len());
        self.model.logprob_span(self.id, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distributions::{Bernoulli, Beta, Normal, Uniform};
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    fn unit_uniform() -> [(&'static str, Param); 2] {
        [("lower", 0.0.into()), ("upper", 1.0.into())]
    }

    #[test]
    fn build_and_lookup() -> Result<(), ModelError> {
        let mut model = Model::new();
        let p = model.add_lone::<Uniform>("p", unit_uniform())?;
        let x = model.add_array::<Bernoulli>("x", 3, [("p", Param::shared(p))])?;

        assert_eq!(model.len(), 2);
        assert_eq!(model.handle::<Bernoulli, Array>("x")?, x);
        assert_eq!(
            model.handle::<Bernoulli, Lone>("x"),
            Err(ModelError::TypeMismatch { name: "x".into() })
        );
        assert_eq!(
            model.handle::<Uniform, Lone>("q"),
            Err(ModelError::UnknownNode { name: "q".into() })
        );
        let names: Vec<_> = model.nodes().map(|n| n.name()).collect();
        assert_eq!(names, vec!["p", "x"]);
        Ok(())
    }

    #[test]
    fn parameter_validation() {
        let mut model = Model::new();
        let err = model
            .add_lone::<Uniform>("p", [("lower", 0.0.into())])
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingParameter {
                dist: "Uniform",
                param: "upper"
            }
        );

        let err = model
            .add_lone::<Bernoulli>("b", [("q", 0.5.into())])
            .unwrap_err();
        assert!(matches!(err, ModelError::UnknownParameter { .. }));

        let err = model
            .add_lone::<Bernoulli>("b", [("p", 0.5.into()), ("p", 0.2.into())])
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateParameter { .. }));

        let err = model
            .add_array::<Bernoulli>("e", 0, [("p", 0.5.into())])
            .unwrap_err();
        assert!(matches!(err, ModelError::EmptyShape { .. }));
    }

    #[test]
    fn binding_validation() -> Result<(), ModelError> {
        let mut model = Model::new();
        let means = model.add_array::<Normal>("means", 3, [("mean", 0.0.into()), ("sd", 1.0.into())])?;

        let err = model
            .add_array::<Normal>("y", 4, [("mean", Param::elementwise(means)), ("sd", 1.0.into())])
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::BindingShape {
                param: "mean".into(),
                expected: Layout::Array(4),
                found: Layout::Array(3),
            }
        );

        let err = model
            .add_array::<Normal>("z", 3, [("mean", Param::by_row(means)), ("sd", 1.0.into())])
            .unwrap_err();
        assert!(matches!(err, ModelError::BindingShape { .. }));

        model.add_matrix::<Normal>("m", 3, 2, [("mean", Param::by_row(means)), ("sd", 1.0.into())])?;

        let err = model
            .add_lone::<Normal>("w", [("mean", Param::at(means, 5)), ("sd", 1.0.into())])
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidIndex { .. }));

        let mut other = Model::new();
        let err = other
            .add_lone::<Normal>("v", [("mean", Param::at(means, 0)), ("sd", 1.0.into())])
            .unwrap_err();
        assert!(matches!(err, ModelError::ForeignHandle { .. }));
        Ok(())
    }

    #[test]
    fn handles_are_tied_to_their_model() -> Result<(), ModelError> {
        let mut a = Model::new();
        let a0 = a.add_lone::<Uniform>("a0", unit_uniform())?;
        let mut b = Model::new();
        let b0 = b.add_lone::<Uniform>("b0", unit_uniform())?;
        assert_eq!(a0.id(), b0.id());
        assert_ne!(a0, b0);

        let err = b
            .add_array::<Bernoulli>("x", 2, [("p", Param::shared(a0))])
            .unwrap_err();
        assert_eq!(err, ModelError::ForeignHandle { param: "p".into() });
        assert_eq!(b.len(), 1);

        // a handle found by name belongs to the model that found it
        assert_eq!(b.handle::<Uniform, Lone>("b0")?, b0);
        Ok(())
    }

    #[test]
    #[should_panic(expected = "does not belong to this model")]
    fn foreign_handle_with_a_valid_id_panics_on_access() {
        let mut a = Model::new();
        let a0 = a.add_lone::<Uniform>("a0", unit_uniform()).unwrap();
        let mut b = Model::new();
        b.add_lone::<Uniform>("b0", unit_uniform()).unwrap();
        b.node(a0);
    }

    #[test]
    fn nested_names() -> Result<(), ModelError> {
        let mut model = Model::new();
        let inner = model.nested("group", |m| {
            m.nested("sub", |m| m.add_lone::<Beta>("theta", [("alpha", 1.0.into()), ("beta", 1.0.into())]))
        })?;
        assert_eq!(model.node(inner).name(), "group::sub::theta");
        assert_eq!(model.handle::<Beta, Lone>("group::sub::theta")?, inner);
        assert!(matches!(
            model.add_lone::<Beta>("group::sub::theta", [("alpha", 1.0.into()), ("beta", 1.0.into())]),
            Err(ModelError::DuplicateName { .. })
        ));
        Ok(())
    }

    #[test]
    fn joint_logprob_and_draw() -> Result<(), ModelError> {
        let mut model = Model::new();
        let p = model.add_lone::<Uniform>("p", unit_uniform())?;
        let x = model.add_array::<Bernoulli>("x", 2, [("p", Param::shared(p))])?;
        model.node_mut(p).set_value(0.25);
        model.node_mut(x).set_values(&[true, false]);
        assert_abs_diff_eq!(model.logprob(), 0.25f64.ln() + 0.75f64.ln());

        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(5);
        model.draw_all(&mut rng);
        let p_value = model.node(p).value();
        assert!((0. ..=1.).contains(&p_value));
        assert!(model.logprob().is_finite());
        Ok(())
    }

    #[test]
    fn per_index_and_column_parameters() -> Result<(), ModelError> {
        let mut model = Model::new();
        let sds = model.add_array::<Uniform>("sds", 2, [("lower", 1.0.into()), ("upper", 2.0.into())])?;
        model.node_mut(sds).set_values(&[1.0, 2.0]);
        let m = model.add_matrix::<Normal>(
            "m",
            2,
            2,
            [
                ("mean", Param::per_index(|index| index.row().unwrap_or(0) as f64)),
                ("sd", Param::by_column(sds)),
            ],
        )?;
        model.node_mut(m).set_values(&[0., 0., 1., 1.]);
        let expected = 2. * Normal::logprob(0., &[0., 1.]) + 2. * Normal::logprob(0., &[0., 2.]);
        let info = model.nodes().nth(m.id()).unwrap();
        assert_abs_diff_eq!(info.logprob(), expected, epsilon = 1e-12);
        assert_eq!(info.read(Index::Matrix(1, 0)), 1.);
        Ok(())
    }
}
