use std::fmt::Debug;

use rand::Rng;
use smallvec::SmallVec;

/// Parameter values of one node element, resolved in declaration order.
pub type ParamValues = SmallVec<[f64; 4]>;

/// Scalar types a node can store.
///
/// Parameters of distributions are always real-valued, so every value type
/// must be readable as `f64` when another node references it.
pub trait Scalar: Copy + Debug + PartialEq + Default + Send + Sync + 'static {
    fn to_f64(self) -> f64;
}

impl Scalar for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

impl Scalar for bool {
    fn to_f64(self) -> f64 {
        if self {
            1.
        } else {
            0.
        }
    }
}

impl Scalar for u64 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// A pluggable distribution module.
///
/// Implementations are stateless: parameters are resolved from the owning
/// node at every call and passed in the order of `PARAMS`. Whether a
/// parameter is shared by all elements of a node or forwarded per element
/// is decided when the node is built, never here.
pub trait Distribution: 'static {
    type Value: Scalar;

    /// Used in error messages.
    const NAME: &'static str;

    /// Ordered parameter names.
    const PARAMS: &'static [&'static str];

    fn draw<R: Rng + ?Sized>(params: &[f64], rng: &mut R) -> Self::Value;

    /// Log density (or mass) of `value`. Values outside the support
    /// give `f64::NEG_INFINITY`.
    fn logprob(value: Self::Value, params: &[f64]) -> f64;
}

/// A distribution whose values can be summarised by a sufficient statistic.
pub trait Gather: Distribution {
    type Stat: Clone + Debug + Default + PartialEq;

    /// Fold one value, together with its resolved parameters, into `stat`.
    fn accumulate(stat: &mut Self::Stat, value: Self::Value, params: &[f64]);

    /// Collapsed log-likelihood of all values summarised in `stat`, as a
    /// function of `params` (the parameters shared by the summarised values).
    ///
    /// Terms that do not depend on `params` are dropped, so only differences
    /// of this quantity are meaningful.
    fn stat_logprob(stat: &Self::Stat, params: &[f64]) -> f64;
}

/// A prior that can be resampled exactly from its conditional given the
/// sufficient statistic `S` of its children.
pub trait Conjugate<S>: Distribution {
    fn gibbs_resample<R: Rng + ?Sized>(params: &[f64], stat: &S, rng: &mut R) -> Self::Value;
}

/// Abort on parameter values outside the domain of a distribution.
///
/// Invalid parameters are a model construction bug, so there is nothing a
/// caller could do to recover.
#[inline]
pub(crate) fn check_domain<D: Distribution>(ok: bool, params: &[f64]) {
    assert!(
        ok,
        "{}: parameters {:?} are outside the domain of the distribution",
        D::NAME,
        params
    );
}
