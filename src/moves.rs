//! Metropolis-Hastings and Gibbs moves.

use std::fmt;

use rand::Rng;

use crate::{
    backup::{Backup, Transaction},
    blanket::{ElementScore, Score},
    distribution::{Conjugate, Distribution},
    model::Model,
    node::NodeHandle,
    proposal::Proposal,
    shape::Shape,
    subset::{SingleSite, Subset},
};

/// Outcome of one accept/reject test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    Rejected,
}

impl Decision {
    pub fn is_accepted(self) -> bool {
        matches!(self, Decision::Accepted)
    }
}

/// Running count of accepted proposals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Acceptance {
    pub accepted: u64,
    pub proposed: u64,
}

impl Acceptance {
    pub fn record(&mut self, decision: Decision) {
        self.proposed += 1;
        self.accepted += decision.is_accepted() as u64;
    }

    /// Fraction of accepted proposals. NaN before the first proposal.
    pub fn rate(&self) -> f64 {
        self.accepted as f64 / self.proposed as f64
    }

    pub fn merge(&mut self, other: &Acceptance) {
        self.accepted += other.accepted;
        self.proposed += other.proposed;
    }

    pub fn reset(&mut self) {
        *self = Acceptance::default();
    }
}

impl fmt::Display for Acceptance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} accepted", self.accepted, self.proposed)
    }
}

/// Generic Metropolis-Hastings step.
///
/// `perturb` changes the values covered by `target` and returns the log
/// Hastings ratio of what it did. The blanket is scored before and after,
/// and the move is accepted with probability
/// `min(1, exp(after - before + hastings))`. On rejection the target is
/// restored from its backup and the blanket's update hook runs again, so
/// derived state matches the restored values. A NaN ratio rejects.
pub fn metropolis_hastings<T, B, R, F>(
    model: &mut Model,
    target: T,
    blanket: &mut B,
    rng: &mut R,
    perturb: F,
) -> Decision
where
    T: Backup,
    B: Score + ?Sized,
    R: Rng + ?Sized,
    F: FnOnce(&mut Model, &mut R) -> f64,
{
    let before = blanket.score(model);
    let mut tx = Transaction::begin(model, target);
    let hastings = perturb(tx.model_mut(), rng);
    blanket.update(tx.model());
    let after = blanket.score(tx.model());

    let log_ratio = after - before + hastings;
    let accept = rng.random::<f64>() < log_ratio.exp();
    log::trace!(
        "mh: before {before:.6}, after {after:.6}, hastings {hastings:.6}, {}",
        if accept { "accepted" } else { "rejected" }
    );
    if accept {
        tx.commit();
        Decision::Accepted
    } else {
        tx.rollback();
        blanket.update(model);
        Decision::Rejected
    }
}

/// Metropolis-Hastings step that applies `proposal` to every value of
/// `target` and accepts or rejects them together.
pub fn mh_move<T, P, B, R>(
    model: &mut Model,
    target: T,
    proposal: &P,
    blanket: &mut B,
    rng: &mut R,
) -> Decision
where
    T: Subset + Backup,
    P: Proposal<<T::Dist as Distribution>::Value> + ?Sized,
    B: Score + ?Sized,
    R: Rng + ?Sized,
{
    metropolis_hastings(model, target, blanket, rng, |model, rng| {
        let span = target.span(model);
        let values = model.node_mut(target.handle()).values_mut();
        span.offsets()
            .map(|offset| proposal.propose(&mut values[offset], rng))
            .sum()
    })
}

/// Routes [`Score`] calls to one element of an [`ElementScore`].
struct AtIndex<'b, B: ?Sized, I> {
    blanket: &'b mut B,
    index: I,
}

impl<B, I> Score for AtIndex<'_, B, I>
where
    B: ElementScore<I> + ?Sized,
    I: Copy,
{
    fn score(&mut self, model: &Model) -> f64 {
        self.blanket.score(model, self.index)
    }

    fn update(&mut self, model: &Model) {
        self.blanket.update(model, self.index)
    }
}

/// One Metropolis-Hastings step per element of a node, in offset order.
///
/// `blanket` scores the terms that change with the element at `index`,
/// and its update hook runs after each element's proposal and rollback.
pub fn mh_move_elementwise<D, S, P, B, R>(
    model: &mut Model,
    handle: NodeHandle<D, S>,
    proposal: &P,
    blanket: &mut B,
    rng: &mut R,
) -> Acceptance
where
    D: Distribution,
    S: Shape,
    P: Proposal<D::Value> + ?Sized,
    B: ElementScore<S::Index> + ?Sized,
    R: Rng + ?Sized,
{
    let shape = model.node(handle).shape();
    let mut acceptance = Acceptance::default();
    for offset in 0..shape.len() {
        let index = shape.unflatten(offset);
        let mut score = AtIndex { blanket: &mut *blanket, index };
        let decision = mh_move(model, handle.at(index), proposal, &mut score, rng);
        acceptance.record(decision);
    }
    acceptance
}

/// Resample one value exactly from its conditional distribution.
///
/// `stat` summarises the children of the target and must be current. The
/// new value is always kept, so no backup is taken.
pub fn gibbs_move<T, S, R>(model: &mut Model, target: T, stat: &S, rng: &mut R)
where
    T: SingleSite,
    T::Dist: Conjugate<S>,
    S: fmt::Debug,
    R: Rng + ?Sized,
{
    let offset = target.offset(model);
    let params = {
        let (node, upstream) = model.node_upstream(target.handle());
        node.params_at(upstream, offset)
    };
    let value = <T::Dist as Conjugate<S>>::gibbs_resample(&params, stat, rng);
    let node = model.node_mut(target.handle());
    log::debug!("gibbs: {} = {value:?} given {stat:?}", node.name());
    node.values_mut()[offset] = value;
}
