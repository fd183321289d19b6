//! Proposal kernels for Metropolis-Hastings moves.
//!
//! A kernel perturbs one value in place and returns the log Hastings
//! ratio `log(q(old | new) / q(new | old))` of the move it made.

use rand::Rng;

/// Perturb a value of type `V` in place.
pub trait Proposal<V> {
    /// Returns the log Hastings ratio of the proposal.
    fn propose<R: Rng + ?Sized>(&self, value: &mut V, rng: &mut R) -> f64;
}

/// Multiplicative random walk in log space.
///
/// Keeps the sign of the value, so it suits strictly positive parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub tuning: f64,
}

/// Additive, symmetric random walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slide {
    pub tuning: f64,
}

/// Additive random walk reflected back into `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideConstrained {
    pub tuning: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Negate a boolean value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flip;

impl Default for Scale {
    fn default() -> Self {
        Scale { tuning: 1. }
    }
}

impl Default for Slide {
    fn default() -> Self {
        Slide { tuning: 1. }
    }
}

impl SlideConstrained {
    pub fn new(lower: f64, upper: f64) -> Self {
        SlideConstrained {
            tuning: 1.,
            lower,
            upper,
        }
    }

    pub fn with_tuning(self, tuning: f64) -> Self {
        SlideConstrained { tuning, ..self }
    }
}

impl Proposal<f64> for Scale {
    fn propose<R: Rng + ?Sized>(&self, value: &mut f64, rng: &mut R) -> f64 {
        scale(value, self.tuning, rng)
    }
}

impl Proposal<f64> for Slide {
    fn propose<R: Rng + ?Sized>(&self, value: &mut f64, rng: &mut R) -> f64 {
        slide(value, self.tuning, rng)
    }
}

impl Proposal<f64> for SlideConstrained {
    fn propose<R: Rng + ?Sized>(&self, value: &mut f64, rng: &mut R) -> f64 {
        slide_constrained(value, self.tuning, self.lower, self.upper, rng)
    }
}

impl Proposal<bool> for Flip {
    fn propose<R: Rng + ?Sized>(&self, value: &mut bool, _rng: &mut R) -> f64 {
        *value = !*value;
        0.
    }
}

/// `value *= exp(m)` with `m = tuning * (u - 0.5)`. Returns `m`.
#[inline]
pub fn scale<R: Rng + ?Sized>(value: &mut f64, tuning: f64, rng: &mut R) -> f64 {
    let m = tuning * (rng.random::<f64>() - 0.5);
    *value *= m.exp();
    m
}

/// `value += tuning * (u - 0.5)`. Returns 0.
#[inline]
pub fn slide<R: Rng + ?Sized>(value: &mut f64, tuning: f64, rng: &mut R) -> f64 {
    *value += tuning * (rng.random::<f64>() - 0.5);
    0.
}

/// Slide, then mirror at the bounds until the value is inside them.
///
/// The reflected walk is still symmetric, so this returns 0.
#[inline]
pub fn slide_constrained<R: Rng + ?Sized>(
    value: &mut f64,
    tuning: f64,
    lower: f64,
    upper: f64,
    rng: &mut R,
) -> f64 {
    slide(value, tuning, rng);
    *value = reflect(*value, lower, upper);
    0.
}

/// Mirror `x` at `lower` and `upper` until it lies in `[lower, upper]`.
///
/// Repeated mirroring is periodic with period `2 * (upper - lower)`, so it
/// is computed in closed form. That keeps the cost constant however far
/// out of range `x` lands.
pub fn reflect(x: f64, lower: f64, upper: f64) -> f64 {
    assert!(
        lower.is_finite() & upper.is_finite() & (lower < upper),
        "invalid reflection bounds [{lower}, {upper}]"
    );
    if (lower..=upper).contains(&x) {
        return x;
    }
    assert!(x.is_finite(), "cannot reflect non-finite value {x}");
    let width = upper - lower;
    let mut offset = (x - lower).rem_euclid(2. * width);
    if offset > width {
        offset = 2. * width - offset;
    }
    (lower + offset).clamp(lower, upper)
}
