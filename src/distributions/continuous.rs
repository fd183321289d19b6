use std::f64::consts::PI;

use rand::Rng;
use rand_distr::Distribution as _;
use statrs::function::{beta::ln_beta, gamma::ln_gamma};

use super::{xlog1my, xlogy};
use crate::distribution::{check_domain, Distribution};

/// Continuous uniform distribution on `[lower, upper]`.
#[derive(Debug, Clone, Copy)]
pub struct Uniform;

impl Distribution for Uniform {
    type Value = f64;
    const NAME: &'static str = "Uniform";
    const PARAMS: &'static [&'static str] = &["lower", "upper"];

    fn draw<R: Rng + ?Sized>(params: &[f64], rng: &mut R) -> f64 {
        let (lower, upper) = (params[0], params[1]);
        check_domain::<Self>(lower < upper, params);
        lower + (upper - lower) * rng.random::<f64>()
    }

    fn logprob(value: f64, params: &[f64]) -> f64 {
        let (lower, upper) = (params[0], params[1]);
        check_domain::<Self>(lower < upper, params);
        if (lower <= value) & (value <= upper) {
            -(upper - lower).ln()
        } else {
            f64::NEG_INFINITY
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Normal;

impl Distribution for Normal {
    type Value = f64;
    const NAME: &'static str = "Normal";
    const PARAMS: &'static [&'static str] = &["mean", "sd"];

    fn draw<R: Rng + ?Sized>(params: &[f64], rng: &mut R) -> f64 {
        check_domain::<Self>(params[1] > 0., params);
        rand_distr::Normal::new(params[0], params[1])
            .expect("Normal parameters were checked")
            .sample(rng)
    }

    fn logprob(value: f64, params: &[f64]) -> f64 {
        let (mean, sd) = (params[0], params[1]);
        check_domain::<Self>(sd > 0., params);
        let z = (value - mean) / sd;
        -0.5 * z * z - sd.ln() - 0.5 * (2. * PI).ln()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Exponential;

impl Distribution for Exponential {
    type Value = f64;
    const NAME: &'static str = "Exponential";
    const PARAMS: &'static [&'static str] = &["rate"];

    fn draw<R: Rng + ?Sized>(params: &[f64], rng: &mut R) -> f64 {
        check_domain::<Self>(params[0] > 0., params);
        rand_distr::Exp::new(params[0])
            .expect("Exponential rate was checked")
            .sample(rng)
    }

    fn logprob(value: f64, params: &[f64]) -> f64 {
        let rate = params[0];
        check_domain::<Self>(rate > 0., params);
        if value < 0. {
            return f64::NEG_INFINITY;
        }
        rate.ln() - rate * value
    }
}

/// Gamma distribution with shape `k` and scale `theta`.
#[derive(Debug, Clone, Copy)]
pub struct Gamma;

impl Distribution for Gamma {
    type Value = f64;
    const NAME: &'static str = "Gamma";
    const PARAMS: &'static [&'static str] = &["shape", "scale"];

    fn draw<R: Rng + ?Sized>(params: &[f64], rng: &mut R) -> f64 {
        check_domain::<Self>((params[0] > 0.) & (params[1] > 0.), params);
        rand_distr::Gamma::new(params[0], params[1])
            .expect("Gamma parameters were checked")
            .sample(rng)
    }

    fn logprob(value: f64, params: &[f64]) -> f64 {
        let (shape, scale) = (params[0], params[1]);
        check_domain::<Self>((shape > 0.) & (scale > 0.), params);
        if value <= 0. {
            return f64::NEG_INFINITY;
        }
        xlogy(shape - 1., value) - value / scale - ln_gamma(shape) - shape * scale.ln()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Beta;

impl Distribution for Beta {
    type Value = f64;
    const NAME: &'static str = "Beta";
    const PARAMS: &'static [&'static str] = &["alpha", "beta"];

    fn draw<R: Rng + ?Sized>(params: &[f64], rng: &mut R) -> f64 {
        check_domain::<Self>((params[0] > 0.) & (params[1] > 0.), params);
        rand_distr::Beta::new(params[0], params[1])
            .expect("Beta parameters were checked")
            .sample(rng)
    }

    fn logprob(value: f64, params: &[f64]) -> f64 {
        let (alpha, beta) = (params[0], params[1]);
        check_domain::<Self>((alpha > 0.) & (beta > 0.), params);
        if !((0. ..=1.).contains(&value)) {
            return f64::NEG_INFINITY;
        }
        xlogy(alpha - 1., value) + xlog1my(beta - 1., value) - ln_beta(alpha, beta)
    }
}
