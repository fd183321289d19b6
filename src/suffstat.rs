//! Cached sufficient statistics.
//!
//! A [`SuffStat`] summarises the values of one or more subsets of nodes
//! that share a [`Gather`] distribution. The summary is only recomputed by
//! an explicit [`SuffStat::gather`]. After any change to the summarised
//! values the cache is stale until the next gather, and evaluating from a
//! stale statistic gives silently wrong results. Keeping it fresh is the
//! caller's job, typically from the update hook of a move.

use crate::{
    distribution::Gather,
    model::Model,
    node::NodeHandle,
    shape::Shape,
    subset::{Column, Element, Row, Subset},
};

/// Fold the values of a target into a statistic of type `S`.
pub trait Accumulate<S> {
    fn accumulate(&self, model: &Model, stat: &mut S);
}

fn accumulate_subset<T>(target: &T, model: &Model, stat: &mut <T::Dist as Gather>::Stat)
where
    T: Subset,
    T::Dist: Gather,
{
    for site in target.view(model).iter() {
        <T::Dist as Gather>::accumulate(stat, site.value, &site.params);
    }
}

macro_rules! impl_accumulate {
    ($($target:ty => [$($bounds:tt)*]),* $(,)?) => {
        $(
            impl<$($bounds)*> Accumulate<D::Stat> for $target {
                fn accumulate(&self, model: &Model, stat: &mut D::Stat) {
                    accumulate_subset(self, model, stat)
                }
            }
        )*
    };
}

impl_accumulate!(
    NodeHandle<D, S> => [D: Gather, S: Shape],
    Element<D, S> => [D: Gather, S: Shape],
    Row<D> => [D: Gather],
    Column<D> => [D: Gather],
);

macro_rules! impl_accumulate_tuple {
    ($($member:ident $idx:tt),+) => {
        impl<Stat, $($member: Accumulate<Stat>),+> Accumulate<Stat> for ($($member,)+) {
            fn accumulate(&self, model: &Model, stat: &mut Stat) {
                $(self.$idx.accumulate(model, stat);)+
            }
        }
    };
}

impl_accumulate_tuple!(A 0);
impl_accumulate_tuple!(A 0, B 1);
impl_accumulate_tuple!(A 0, B 1, C 2);
impl_accumulate_tuple!(A 0, B 1, C 2, E 3);
impl_accumulate_tuple!(A 0, B 1, C 2, E 3, F 4);
impl_accumulate_tuple!(A 0, B 1, C 2, E 3, F 4, G 5);

/// A sufficient statistic of `target`, refreshed on demand.
#[derive(Debug, Clone)]
pub struct SuffStat<S, T> {
    target: T,
    value: S,
}

impl<S, T> SuffStat<S, T>
where
    S: Default,
    T: Accumulate<S>,
{
    /// A cache that holds the empty statistic until the first gather.
    pub fn new(target: T) -> Self {
        SuffStat {
            target,
            value: S::default(),
        }
    }

    /// Build the cache and gather once.
    pub fn gathered(target: T, model: &Model) -> Self {
        let mut stat = SuffStat::new(target);
        stat.gather(model);
        stat
    }

    /// Recompute the statistic from the current values of the target.
    pub fn gather(&mut self, model: &Model) -> &S {
        let mut value = S::default();
        self.target.accumulate(model, &mut value);
        self.value = value;
        &self.value
    }

    /// The statistic as of the last gather.
    pub fn get(&self) -> &S {
        &self.value
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// Collapsed log-likelihood of the summarised values given the
    /// parameters they share, evaluated from the cached statistic.
    pub fn logprob<D>(&self, params: &[f64]) -> f64
    where
        D: Gather<Stat = S>,
    {
        D::stat_logprob(&self.value, params)
    }
}

/// Summarise a single subset without caching.
pub fn gather<T>(target: T, model: &Model) -> <T::Dist as Gather>::Stat
where
    T: Subset,
    T::Dist: Gather,
{
    let mut stat = Default::default();
    accumulate_subset(&target, model, &mut stat);
    stat
}

/// Collapsed log-likelihood of a subset given its shared parameters.
pub fn collapsed_logprob<T>(target: T, model: &Model, params: &[f64]) -> f64
where
    T: Subset,
    T::Dist: Gather,
{
    <T::Dist as Gather>::stat_logprob(&gather(target, model), params)
}
