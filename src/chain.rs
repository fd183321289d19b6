use std::collections::BTreeMap;

use anyhow::{ensure, Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{
    model::Model,
    moves::{Acceptance, Decision},
    trace::Trace,
};

/// Settings of a single chain.
#[derive(Debug, Clone, Copy)]
pub struct ChainSettings {
    /// Sweeps run before anything is recorded.
    pub num_burn_in: u64,
    /// Sweeps run after burn-in.
    pub num_draws: u64,
    /// Record every `thin`-th draw.
    pub thin: u64,
    pub seed: u64,
    /// Chains with the same seed but different ids use independent streams.
    pub chain: u64,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            num_burn_in: 1000,
            num_draws: 1000,
            thin: 1,
            seed: 0,
            chain: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Progress {
    pub draw: u64,
    pub chain: u64,
    pub burn_in: bool,
    pub total: u64,
}

/// Acceptance counts per named move.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveStats {
    moves: BTreeMap<String, Acceptance>,
}

impl MoveStats {
    pub fn record(&mut self, name: &str, decision: Decision) {
        self.entry(name).record(decision);
    }

    pub fn merge(&mut self, name: &str, acceptance: &Acceptance) {
        self.entry(name).merge(acceptance);
    }

    fn entry(&mut self, name: &str) -> &mut Acceptance {
        self.moves.entry(name.to_string()).or_default()
    }

    pub fn get(&self, name: &str) -> Option<&Acceptance> {
        self.moves.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Acceptance)> {
        self.moves.iter().map(|(name, acc)| (name.as_str(), acc))
    }

    pub fn reset(&mut self) {
        self.moves.clear();
    }
}

/// What a sweep closure gets to work with besides the model.
pub struct Sweep<'c> {
    rng: &'c mut ChaCha8Rng,
    stats: &'c mut MoveStats,
    progress: Progress,
}

impl Sweep<'_> {
    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut *self.rng
    }

    /// Count the outcome of a move under `name`.
    pub fn record(&mut self, name: &str, decision: Decision) -> Decision {
        self.stats.record(name, decision);
        decision
    }

    /// Count the outcomes of an elementwise move under `name`.
    pub fn record_all(&mut self, name: &str, acceptance: &Acceptance) {
        self.stats.merge(name, acceptance);
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn is_burn_in(&self) -> bool {
        self.progress.burn_in
    }
}

/// Drives the caller's sweep schedule over a model.
///
/// The engine itself has no notion of iterations; a chain just calls the
/// sweep closure `num_burn_in + num_draws` times with a seeded generator
/// and records the state after burn-in.
pub struct Chain {
    settings: ChainSettings,
    rng: ChaCha8Rng,
    stats: MoveStats,
}

impl Chain {
    pub fn new(settings: ChainSettings) -> Chain {
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
        rng.set_stream(settings.chain);
        Chain {
            settings,
            rng,
            stats: MoveStats::default(),
        }
    }

    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    /// Acceptance counts since the end of burn-in.
    pub fn stats(&self) -> &MoveStats {
        &self.stats
    }

    /// The chain's generator, e.g. to draw initial values.
    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    /// Run the chain.
    ///
    /// `sweep` performs one iteration of moves. `record` is called after
    /// every `thin`-th sweep past burn-in and appends the quantities of
    /// interest to the trace. The first failing sweep aborts the run.
    pub fn run<S, F>(&mut self, model: &mut Model, mut sweep: S, mut record: F) -> Result<Trace>
    where
        S: FnMut(&mut Model, &mut Sweep<'_>) -> Result<()>,
        F: FnMut(&Model, &mut Trace),
    {
        let ChainSettings {
            num_burn_in,
            num_draws,
            thin,
            chain,
            ..
        } = self.settings;
        ensure!(thin > 0, "thinning interval must be positive");
        let total = num_burn_in + num_draws;

        let mut trace = Trace::new();
        log::debug!("chain {chain}: {num_burn_in} burn-in sweeps");
        for draw in 0..total {
            let burn_in = draw < num_burn_in;
            if draw == num_burn_in {
                log::debug!("chain {chain}: burn-in done, {num_draws} draws");
                self.stats.reset();
            }
            let mut ctx = Sweep {
                rng: &mut self.rng,
                stats: &mut self.stats,
                progress: Progress {
                    draw,
                    chain,
                    burn_in,
                    total,
                },
            };
            sweep(model, &mut ctx).with_context(|| format!("sweep {draw} of chain {chain} failed"))?;
            if !burn_in && (draw - num_burn_in) % thin == 0 {
                record(model, &mut trace);
            }
        }

        for (name, acceptance) in self.stats.iter() {
            log::info!("chain {chain}: {name} {acceptance} ({:.3})", acceptance.rate());
        }
        log::info!("chain {chain}: finished {total} sweeps, {} recorded", trace.len());
        Ok(trace)
    }
}
