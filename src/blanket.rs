//! Partial log-probabilities over caller-chosen sets of nodes.
//!
//! A move only needs the log-probability terms that change when its target
//! changes: the target's own term and the terms of every node that takes
//! the target as a parameter. That set is the blanket of the move and is
//! always assembled by the caller. Nothing checks that it is complete; a
//! missing dependent biases the acceptance ratio without any error.

use crate::{
    distribution::Distribution,
    index::Span,
    model::Model,
    node::NodeHandle,
    shape::Shape,
    subset::{Column, Element, Row, Subset},
};

/// Log-probability of the values selected by a subset or a tuple of subsets.
pub trait LogProb {
    fn logprob(&self, model: &Model) -> f64;
}

macro_rules! impl_logprob {
    ($($target:ty => [$($bounds:tt)*]),* $(,)?) => {
        $(
            impl<$($bounds)*> LogProb for $target {
                fn logprob(&self, model: &Model) -> f64 {
                    model.logprob_span(self.node_id(), self.span(model))
                }
            }
        )*
    };
}

impl_logprob!(
    NodeHandle<D, S> => [D: Distribution, S: Shape],
    Element<D, S> => [D: Distribution, S: Shape],
    Row<D> => [D: Distribution],
    Column<D> => [D: Distribution],
);

macro_rules! impl_logprob_tuple {
    ($($member:ident $idx:tt),+) => {
        impl<$($member: LogProb),+> LogProb for ($($member,)+) {
            fn logprob(&self, model: &Model) -> f64 {
                0. $(+ self.$idx.logprob(model))+
            }
        }
    };
}

impl_logprob_tuple!(A 0);
impl_logprob_tuple!(A 0, B 1);
impl_logprob_tuple!(A 0, B 1, C 2);
impl_logprob_tuple!(A 0, B 1, C 2, E 3);
impl_logprob_tuple!(A 0, B 1, C 2, E 3, F 4);
impl_logprob_tuple!(A 0, B 1, C 2, E 3, F 4, G 5);

/// A blanket assembled at runtime from subsets of any type.
///
/// Members are resolved to spans when added; shapes never change, so
/// they stay valid for the life of the model.
#[derive(Debug, Clone, Default)]
pub struct Blanket {
    members: Vec<(usize, Span)>,
}

impl Blanket {
    pub fn new() -> Blanket {
        Blanket::default()
    }

    pub fn with<T: Subset>(mut self, model: &Model, member: T) -> Blanket {
        self.push(model, member);
        self
    }

    pub fn push<T: Subset>(&mut self, model: &Model, member: T) {
        self.members.push((member.node_id(), member.span(model)));
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl LogProb for Blanket {
    fn logprob(&self, model: &Model) -> f64 {
        self.members
            .iter()
            .map(|&(node, span)| model.logprob_span(node, span))
            .sum()
    }
}

/// What a Metropolis-Hastings move evaluates before and after a proposal.
///
/// `update` runs after the proposal is applied and again after a rejected
/// proposal is restored. It is the place to refresh derived state such as
/// sufficient statistics that `score` depends on.
pub trait Score {
    fn score(&mut self, model: &Model) -> f64;

    fn update(&mut self, _model: &Model) {}
}

impl<F> Score for F
where
    F: FnMut(&Model) -> f64,
{
    fn score(&mut self, model: &Model) -> f64 {
        self(model)
    }
}

impl Score for Blanket {
    fn score(&mut self, model: &Model) -> f64 {
        self.logprob(model)
    }
}

/// The per-element counterpart of [`Score`] for elementwise sweeps.
///
/// `index` is the element being moved. `update` runs at the same points as
/// [`Score::update`], once per element.
pub trait ElementScore<I> {
    fn score(&mut self, model: &Model, index: I) -> f64;

    fn update(&mut self, _model: &Model, _index: I) {}
}

impl<I, F> ElementScore<I> for F
where
    F: FnMut(&Model, I) -> f64,
{
    fn score(&mut self, model: &Model, index: I) -> f64 {
        self(model, index)
    }
}

/// Scores a fixed [`LogProb`] target, e.g. a tuple of subsets.
#[derive(Debug, Clone, Copy)]
pub struct Terms<L>(pub L);

impl<L: LogProb> Score for Terms<L> {
    fn score(&mut self, model: &Model) -> f64 {
        self.0.logprob(model)
    }
}

/// A score with an update hook.
pub struct WithUpdate<S, U> {
    score: S,
    update: U,
}

/// Attach an update hook to a score.
pub fn with_update<S, U>(score: S, update: U) -> WithUpdate<S, U>
where
    S: Score,
    U: FnMut(&mut S, &Model),
{
    WithUpdate { score, update }
}

impl<S, U> WithUpdate<S, U> {
    pub fn into_inner(self) -> S {
        self.score
    }
}

impl<S, U> Score for WithUpdate<S, U>
where
    S: Score,
    U: FnMut(&mut S, &Model),
{
    fn score(&mut self, model: &Model) -> f64 {
        self.score.score(model)
    }

    fn update(&mut self, model: &Model) {
        (self.update)(&mut self.score, model);
        self.score.update(model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        distributions::{Bernoulli, Uniform},
        error::ModelError,
        param::Param,
    };
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[test]
    fn blanket_and_tuple_agree() -> Result<(), ModelError> {
        let mut model = Model::new();
        let p = model.add_lone::<Uniform>("p", [("lower", 0.0.into()), ("upper", 1.0.into())])?;
        let x = model.add_array::<Bernoulli>("x", 3, [("p", Param::shared(p))])?;
        let unrelated = model.add_lone::<Uniform>("q", [("lower", 0.0.into()), ("upper", 2.0.into())])?;
        model.node_mut(p).set_value(0.2);
        model.node_mut(x).set_values(&[true, true, false]);

        let mut blanket = Blanket::new().with(&model, p).with(&model, x);
        assert_eq!(blanket.len(), 2);
        let expected = 2. * 0.2f64.ln() + 0.8f64.ln();
        assert_abs_diff_eq!(blanket.score(&model), expected, epsilon = 1e-12);
        assert_abs_diff_eq!((p, x).logprob(&model), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(
            model.logprob() - unrelated.logprob(&model),
            expected,
            epsilon = 1e-12
        );

        let element = (p, x.element(2)).logprob(&model);
        assert_abs_diff_eq!(element, 0.8f64.ln(), epsilon = 1e-12);
        Ok(())
    }

    struct Logged<'l>(&'l RefCell<Vec<&'static str>>);

    impl Score for Logged<'_> {
        fn score(&mut self, _model: &Model) -> f64 {
            1.5
        }

        fn update(&mut self, _model: &Model) {
            self.0.borrow_mut().push("inner");
        }
    }

    #[test]
    fn update_hook_runs_before_inner_update() {
        let log = RefCell::new(Vec::new());
        let mut score = with_update(Logged(&log), |_: &mut _, _: &Model| {
            log.borrow_mut().push("outer")
        });
        let model = Model::new();
        assert_eq!(score.score(&model), 1.5);
        score.update(&model);
        score.update(&model);
        assert_eq!(*log.borrow(), vec!["outer", "inner", "outer", "inner"]);
    }
}
