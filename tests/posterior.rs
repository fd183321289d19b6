use anyhow::Result;
use approx::assert_abs_diff_eq;
use mcmc_nodes::{
    gibbs_move, mh_move, mh_move_elementwise, Array, Bernoulli, Beta, Binomial, BinomialStat,
    Blanket, ElementScore, LogProb, Lone, Model, NodeHandle, Normal, NormalStat, Param, Score,
    Slide, SlideConstrained, SuffStat, Uniform,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn mean_var(xs: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.);
    (mean, var)
}

#[test]
fn uniform_bernoulli_posterior_mean() -> Result<()> {
    let mut model = Model::new();
    let p = model.add_lone::<Uniform>("p", [("lower", 0.0.into()), ("upper", 1.0.into())])?;
    let x = model.add_array::<Bernoulli>("x", 2, [("p", Param::shared(p))])?;
    model.node_mut(x).fill(true);
    model.node_mut(p).set_value(0.5);

    let mut blanket = Blanket::new().with(&model, p).with(&model, x);
    let kernel = SlideConstrained::new(0., 1.);
    let mut rng = ChaCha8Rng::seed_from_u64(2024);

    let iterations = 100_000;
    let burn_in = iterations / 10;
    let mut draws = Vec::with_capacity(iterations - burn_in);
    for i in 0..iterations {
        mh_move(&mut model, p, &kernel, &mut blanket, &mut rng);
        if i >= burn_in {
            draws.push(model.node(p).value());
        }
    }
    let (mean, _) = mean_var(&draws);
    // Beta(3, 1)
    assert_abs_diff_eq!(mean, 0.75, epsilon = 0.02);
    Ok(())
}

struct BetaBinomial {
    model: Model,
    theta: NodeHandle<Beta, Lone>,
    y: NodeHandle<Binomial, Array>,
}

fn beta_binomial() -> Result<BetaBinomial> {
    let mut model = Model::new();
    let theta = model.add_lone::<Beta>("theta", [("alpha", 2.0.into()), ("beta", 3.0.into())])?;
    let y = model.add_array::<Binomial>("y", 4, [("n", 10.0.into()), ("p", Param::shared(theta))])?;
    model.node_mut(y).set_values(&[3, 5, 2, 7]);
    model.node_mut(theta).set_value(0.5);
    Ok(BetaBinomial { model, theta, y })
}

// Beta(2 + 17, 3 + 23)
const POST_MEAN: f64 = 19. / 45.;
const POST_VAR: f64 = 19. * 26. / (45. * 45. * 46.);

#[test]
fn beta_binomial_gibbs_matches_moments() -> Result<()> {
    let BetaBinomial { mut model, theta, y } = beta_binomial()?;
    let stat: SuffStat<BinomialStat, _> = SuffStat::gathered(y, &model);
    assert_eq!(stat.get(), &BinomialStat { successes: 17, trials: 40 });

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let draws: Vec<f64> = (0..20_000)
        .map(|_| {
            gibbs_move(&mut model, theta, stat.get(), &mut rng);
            model.node(theta).value()
        })
        .collect();
    let (mean, var) = mean_var(&draws);
    assert_abs_diff_eq!(mean, POST_MEAN, epsilon = 0.005);
    assert_abs_diff_eq!(var, POST_VAR, epsilon = 0.0005);
    Ok(())
}

#[test]
fn collapsed_mh_agrees_with_gibbs() -> Result<()> {
    let BetaBinomial { mut model, theta, y } = beta_binomial()?;
    // the observations never move, so one gather is enough
    let stat: SuffStat<BinomialStat, _> = SuffStat::gathered(y, &model);
    let mut score =
        |m: &Model| theta.logprob(m) + stat.logprob::<Binomial>(&[10., m.node(theta).value()]);
    let kernel = SlideConstrained::new(0., 1.).with_tuning(0.4);
    let mut rng = ChaCha8Rng::seed_from_u64(8);

    let mut draws = Vec::new();
    for i in 0..60_000 {
        mh_move(&mut model, theta, &kernel, &mut score, &mut rng);
        if i >= 5_000 {
            draws.push(model.node(theta).value());
        }
    }
    let (mean, var) = mean_var(&draws);
    assert_abs_diff_eq!(mean, POST_MEAN, epsilon = 0.01);
    assert_abs_diff_eq!(var, POST_VAR, epsilon = 0.001);
    Ok(())
}

/// Latent `z ~ Normal(0, 1)` with one observation `y ~ Normal(z, 1)` per
/// element, so `z[i] | y ~ Normal(y[i] / 2, 1 / 2)`.
fn latent_normals() -> Result<(Model, NodeHandle<Normal, Array>, NodeHandle<Normal, Array>)> {
    let mut model = Model::new();
    let z = model.add_array::<Normal>("z", 3, [("mean", 0.0.into()), ("sd", 1.0.into())])?;
    let y = model.add_array::<Normal>("y", 3, [("mean", Param::elementwise(z)), ("sd", 1.0.into())])?;
    model.node_mut(y).set_values(&[1., -1., 2.]);
    Ok((model, z, y))
}

fn check_latent(samples: &[Vec<f64>]) {
    for (i, expected) in [0.5, -0.5, 1.].into_iter().enumerate() {
        let column: Vec<f64> = samples.iter().map(|s| s[i]).collect();
        let (mean, var) = mean_var(&column);
        assert_abs_diff_eq!(mean, expected, epsilon = 0.05);
        assert_abs_diff_eq!(var, 0.5, epsilon = 0.05);
    }
}

#[test]
fn elementwise_and_block_moves_share_the_stationary_distribution() -> Result<()> {
    let kernel = Slide { tuning: 2. };

    let (mut model, z, y) = latent_normals()?;
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut elementwise = Vec::new();
    for i in 0..40_000 {
        let acceptance = mh_move_elementwise(
            &mut model,
            z,
            &kernel,
            &mut |m: &Model, i: usize| (z.element(i), y.element(i)).logprob(m),
            &mut rng,
        );
        assert_eq!(acceptance.proposed, 3);
        if i >= 2_000 {
            elementwise.push(model.node(z).values().to_vec());
        }
    }
    check_latent(&elementwise);

    let (mut model, z, y) = latent_normals()?;
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let mut blanket = Blanket::new().with(&model, z).with(&model, y);
    let kernel = Slide { tuning: 1.2 };
    let mut block = Vec::new();
    for i in 0..80_000 {
        mh_move(&mut model, z, &kernel, &mut blanket, &mut rng);
        if i >= 4_000 {
            block.push(model.node(z).values().to_vec());
        }
    }
    check_latent(&block);
    Ok(())
}

/// Scores moves on latent normals through their cached statistic, which
/// has to be regathered whenever the latents change.
struct CollapsedLatents {
    stat: SuffStat<NormalStat, NodeHandle<Normal, Array>>,
    mu: NodeHandle<Normal, Lone>,
    y: NodeHandle<Normal, Array>,
}

impl CollapsedLatents {
    fn prior(&self, model: &Model) -> f64 {
        let mu = model.node(self.mu).value();
        self.stat.logprob::<Normal>(&[mu])
    }
}

impl Score for CollapsedLatents {
    fn score(&mut self, model: &Model) -> f64 {
        self.prior(model) + self.y.logprob(model)
    }

    fn update(&mut self, model: &Model) {
        self.stat.gather(model);
    }
}

impl ElementScore<usize> for CollapsedLatents {
    fn score(&mut self, model: &Model, index: usize) -> f64 {
        self.prior(model) + self.y.element(index).logprob(model)
    }

    fn update(&mut self, model: &Model, _index: usize) {
        self.stat.gather(model);
    }
}

const OBSERVED: [f64; 5] = [1.0, 2.0, 0.5, 1.5, 1.0];

/// `mu ~ Normal(0, 10)`, `z[i] ~ Normal(mu, 1)`, `y[i] ~ Normal(z[i], 0.5)`.
fn hierarchical_normal() -> Result<(Model, NodeHandle<Normal, Lone>, NodeHandle<Normal, Array>, CollapsedLatents)> {
    let mut model = Model::new();
    let mu = model.add_lone::<Normal>("mu", [("mean", 0.0.into()), ("sd", 10.0.into())])?;
    let z = model.add_array::<Normal>("z", 5, [("mean", Param::shared(mu)), ("sd", 1.0.into())])?;
    let y = model.add_array::<Normal>("y", 5, [("mean", Param::elementwise(z)), ("sd", 0.5.into())])?;
    model.node_mut(y).set_values(&OBSERVED);
    model.node_mut(z).set_values(&OBSERVED);
    let latents = CollapsedLatents {
        stat: SuffStat::gathered(z, &model),
        mu,
        y,
    };
    Ok((model, mu, z, latents))
}

fn check_mu(draws: &[f64]) {
    // marginally y[i] ~ Normal(mu, sqrt(1.25))
    let precision = 0.01 + 5. / 1.25;
    let expected = (OBSERVED.iter().sum::<f64>() / 1.25) / precision;
    let (mean, var) = mean_var(draws);
    assert_abs_diff_eq!(mean, expected, epsilon = 0.1);
    assert_abs_diff_eq!(var, precision.recip(), epsilon = 0.05);
}

fn assert_fresh(latents: &CollapsedLatents, model: &Model, z: NodeHandle<Normal, Array>) {
    let fresh: SuffStat<NormalStat, _> = SuffStat::gathered(z, model);
    assert_abs_diff_eq!(latents.stat.get().weighted_sum, fresh.get().weighted_sum, epsilon = 1e-12);
}

#[test]
fn hierarchical_normal_with_cached_statistics() -> Result<()> {
    let (mut model, mu, z, mut latents) = hierarchical_normal()?;
    let kernel = Slide { tuning: 0.8 };
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let mut draws = Vec::new();
    for i in 0..40_000 {
        mh_move(&mut model, z, &kernel, &mut latents, &mut rng);
        gibbs_move(&mut model, mu, latents.stat.get(), &mut rng);
        if i >= 2_000 {
            draws.push(model.node(mu).value());
        }
    }
    check_mu(&draws);
    assert_fresh(&latents, &model, z);
    Ok(())
}

#[test]
fn elementwise_sweeps_keep_cached_statistics_current() -> Result<()> {
    let (mut model, mu, z, mut latents) = hierarchical_normal()?;
    let kernel = Slide { tuning: 1.5 };
    let mut rng = ChaCha8Rng::seed_from_u64(14);
    let mut draws = Vec::new();
    for i in 0..20_000 {
        let acceptance = mh_move_elementwise(&mut model, z, &kernel, &mut latents, &mut rng);
        assert_eq!(acceptance.proposed, 5);
        // the Gibbs draw below reads the cache, so it must match the latents
        assert_fresh(&latents, &model, z);
        gibbs_move(&mut model, mu, latents.stat.get(), &mut rng);
        if i >= 1_000 {
            draws.push(model.node(mu).value());
        }
    }
    check_mu(&draws);
    Ok(())
}
