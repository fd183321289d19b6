//! Sufficient statistics of the bundled distributions and the conjugate
//! priors that can be resampled from them.

use rand::Rng;
use rand_distr::Distribution as _;

use super::{xlog1my, xlogy, Bernoulli, Beta, Binomial, Gamma, Normal, Poisson};
use crate::distribution::{check_domain, Conjugate, Distribution, Gather};

/// Successes and trials of Bernoulli or Binomial values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinomialStat {
    pub successes: u64,
    pub trials: u64,
}

impl BinomialStat {
    pub fn failures(&self) -> u64 {
        self.trials - self.successes
    }

    fn loglik(&self, p: f64) -> f64 {
        xlogy(self.successes as f64, p) + xlog1my(self.failures() as f64, p)
    }
}

impl Gather for Bernoulli {
    type Stat = BinomialStat;

    fn accumulate(stat: &mut BinomialStat, value: bool, _params: &[f64]) {
        stat.trials += 1;
        stat.successes += value as u64;
    }

    fn stat_logprob(stat: &BinomialStat, params: &[f64]) -> f64 {
        stat.loglik(params[0])
    }
}

impl Gather for Binomial {
    type Stat = BinomialStat;

    fn accumulate(stat: &mut BinomialStat, value: u64, params: &[f64]) {
        stat.trials += params[0] as u64;
        stat.successes += value;
    }

    fn stat_logprob(stat: &BinomialStat, params: &[f64]) -> f64 {
        stat.loglik(params[1])
    }
}

impl Conjugate<BinomialStat> for Beta {
    fn gibbs_resample<R: Rng + ?Sized>(params: &[f64], stat: &BinomialStat, rng: &mut R) -> f64 {
        let alpha = params[0] + stat.successes as f64;
        let beta = params[1] + stat.failures() as f64;
        Beta::draw(&[alpha, beta], rng)
    }
}

/// Number and sum of Poisson counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoissonStat {
    pub count: u64,
    pub sum: u64,
}

impl Gather for Poisson {
    type Stat = PoissonStat;

    fn accumulate(stat: &mut PoissonStat, value: u64, _params: &[f64]) {
        stat.count += 1;
        stat.sum += value;
    }

    fn stat_logprob(stat: &PoissonStat, params: &[f64]) -> f64 {
        let rate = params[0];
        xlogy(stat.sum as f64, rate) - stat.count as f64 * rate
    }
}

impl Conjugate<PoissonStat> for Gamma {
    fn gibbs_resample<R: Rng + ?Sized>(params: &[f64], stat: &PoissonStat, rng: &mut R) -> f64 {
        let (shape, scale) = (params[0], params[1]);
        check_domain::<Gamma>((shape > 0.) & (scale > 0.), params);
        let shape = shape + stat.sum as f64;
        let scale = scale / (1. + stat.count as f64 * scale);
        Gamma::draw(&[shape, scale], rng)
    }
}

/// Precision-weighted moments of normal values.
///
/// Each value `x` with standard deviation `sd` contributes `w = 1 / sd^2`
/// to `precision`, `w * x` to `weighted_sum` and `w * x^2` to
/// `weighted_sq`. The standard deviations are folded in when gathering,
/// so the collapsed log-likelihood is a function of the mean only.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NormalStat {
    pub precision: f64,
    pub weighted_sum: f64,
    pub weighted_sq: f64,
}

impl Gather for Normal {
    type Stat = NormalStat;

    fn accumulate(stat: &mut NormalStat, value: f64, params: &[f64]) {
        let w = params[1].powi(2).recip();
        stat.precision += w;
        stat.weighted_sum += w * value;
        stat.weighted_sq += w * value * value;
    }

    fn stat_logprob(stat: &NormalStat, params: &[f64]) -> f64 {
        let mean = params[0];
        -0.5 * (stat.weighted_sq - 2. * mean * stat.weighted_sum + mean * mean * stat.precision)
    }
}

impl Conjugate<NormalStat> for Normal {
    fn gibbs_resample<R: Rng + ?Sized>(params: &[f64], stat: &NormalStat, rng: &mut R) -> f64 {
        let (mean, sd) = (params[0], params[1]);
        check_domain::<Normal>(sd > 0., params);
        let prior_precision = sd.powi(2).recip();
        let precision = prior_precision + stat.precision;
        let post_mean = (prior_precision * mean + stat.weighted_sum) / precision;
        rand_distr::Normal::new(post_mean, precision.sqrt().recip())
            .expect("posterior standard deviation is positive")
            .sample(rng)
    }
}
