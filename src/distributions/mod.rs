//! Bundled distribution modules.
//!
//! Nothing in the engine depends on these: any type implementing
//! [`Distribution`](crate::Distribution) can be used for a node.

mod conjugate;
mod continuous;
mod discrete;

pub use conjugate::{BinomialStat, NormalStat, PoissonStat};
pub use continuous::{Beta, Exponential, Gamma, Normal, Uniform};
pub use discrete::{Bernoulli, Binomial, Poisson};

/// `x * ln(y)` with the convention `0 * ln(0) = 0`.
#[inline]
pub(crate) fn xlogy(x: f64, y: f64) -> f64 {
    if x == 0. {
        0.
    } else {
        x * y.ln()
    }
}

/// `x * ln(1 - y)` with the convention `0 * ln(0) = 0`.
#[inline]
pub(crate) fn xlog1my(x: f64, y: f64) -> f64 {
    if x == 0. {
        0.
    } else {
        x * (-y).ln_1p()
    }
}
