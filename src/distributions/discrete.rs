use rand::Rng;
use rand_distr::Distribution as _;
use statrs::function::factorial::{ln_binomial, ln_factorial};

use super::{xlog1my, xlogy};
use crate::distribution::{check_domain, Distribution};

fn is_probability(p: f64) -> bool {
    (0. ..=1.).contains(&p)
}

fn is_count(n: f64) -> bool {
    (n >= 0.) & (n.fract() == 0.) & n.is_finite()
}

#[derive(Debug, Clone, Copy)]
pub struct Bernoulli;

impl Distribution for Bernoulli {
    type Value = bool;
    const NAME: &'static str = "Bernoulli";
    const PARAMS: &'static [&'static str] = &["p"];

    fn draw<R: Rng + ?Sized>(params: &[f64], rng: &mut R) -> bool {
        check_domain::<Self>(is_probability(params[0]), params);
        rng.random_bool(params[0])
    }

    fn logprob(value: bool, params: &[f64]) -> f64 {
        let p = params[0];
        check_domain::<Self>(is_probability(p), params);
        if value {
            p.ln()
        } else {
            (-p).ln_1p()
        }
    }
}

/// Number of successes in `n` independent trials with success probability `p`.
#[derive(Debug, Clone, Copy)]
pub struct Binomial;

impl Distribution for Binomial {
    type Value = u64;
    const NAME: &'static str = "Binomial";
    const PARAMS: &'static [&'static str] = &["n", "p"];

    fn draw<R: Rng + ?Sized>(params: &[f64], rng: &mut R) -> u64 {
        let (n, p) = (params[0], params[1]);
        check_domain::<Self>(is_count(n) & is_probability(p), params);
        rand_distr::Binomial::new(n as u64, p)
            .expect("Binomial parameters were checked")
            .sample(rng)
    }

    fn logprob(value: u64, params: &[f64]) -> f64 {
        let (n, p) = (params[0], params[1]);
        check_domain::<Self>(is_count(n) & is_probability(p), params);
        let trials = n as u64;
        if value > trials {
            return f64::NEG_INFINITY;
        }
        let k = value as f64;
        ln_binomial(trials, value) + xlogy(k, p) + xlog1my(n - k, p)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Poisson;

impl Distribution for Poisson {
    type Value = u64;
    const NAME: &'static str = "Poisson";
    const PARAMS: &'static [&'static str] = &["rate"];

    fn draw<R: Rng + ?Sized>(params: &[f64], rng: &mut R) -> u64 {
        let rate = params[0];
        check_domain::<Self>(rate >= 0., params);
        if rate == 0. {
            return 0;
        }
        let draw: f64 = rand_distr::Poisson::new(rate)
            .expect("Poisson rate was checked")
            .sample(rng);
        draw as u64
    }

    fn logprob(value: u64, params: &[f64]) -> f64 {
        let rate = params[0];
        check_domain::<Self>(rate >= 0., params);
        xlogy(value as f64, rate) - rate - ln_factorial(value)
    }
}
