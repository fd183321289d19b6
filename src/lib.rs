//! Probabilistic graphical models for Markov chain Monte Carlo.
//!
//! A [`Model`] is built once from named nodes. Each node holds a lone
//! value, an array or a matrix of values drawn from a [`Distribution`],
//! with parameters that are constants or references to earlier nodes.
//! Inference then repeatedly mutates node values in place with
//! Metropolis-Hastings moves ([`mh_move`]) that back up and restore their
//! target, or with exact Gibbs moves ([`gibbs_move`]) driven by cached
//! sufficient statistics ([`SuffStat`]).
//!
//! Which log-probability terms a move evaluates is decided by the caller
//! through a blanket ([`Blanket`], a tuple of subsets, or any closure).
//!
//! ```
//! use mcmc_nodes::{mh_move, Bernoulli, Blanket, Model, Param, SlideConstrained, Uniform};
//! use rand::SeedableRng;
//!
//! # fn main() -> Result<(), mcmc_nodes::ModelError> {
//! let mut model = Model::new();
//! let p = model.add_lone::<Uniform>("p", [("lower", 0.0.into()), ("upper", 1.0.into())])?;
//! let x = model.add_array::<Bernoulli>("x", 2, [("p", Param::shared(p))])?;
//! model.node_mut(x).fill(true);
//! model.node_mut(p).set_value(0.5);
//!
//! let mut blanket = Blanket::new().with(&model, p).with(&model, x);
//! let kernel = SlideConstrained::new(0., 1.).with_tuning(0.3);
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
//! for _ in 0..100 {
//!     mh_move(&mut model, p, &kernel, &mut blanket, &mut rng);
//! }
//! assert!((0. ..=1.).contains(&model.node(p).value()));
//! # Ok(())
//! # }
//! ```

pub(crate) mod backup;
pub(crate) mod blanket;
pub(crate) mod chain;
pub(crate) mod distribution;
pub mod distributions;
pub(crate) mod error;
pub(crate) mod index;
pub(crate) mod model;
pub(crate) mod moves;
pub(crate) mod node;
pub(crate) mod param;
pub mod proposal;
pub(crate) mod shape;
pub(crate) mod subset;
pub(crate) mod suffstat;
pub(crate) mod trace;

pub use backup::{Backup, Snapshot, Transaction};
pub use blanket::{with_update, Blanket, ElementScore, LogProb, Score, Terms, WithUpdate};
pub use chain::{Chain, ChainSettings, MoveStats, Progress, Sweep};
pub use distribution::{Conjugate, Distribution, Gather, ParamValues, Scalar};
pub use distributions::{
    Bernoulli, Beta, Binomial, BinomialStat, Exponential, Gamma, Normal, NormalStat, Poisson,
    PoissonStat, Uniform,
};
pub use error::ModelError;
pub use index::{Index, Span};
pub use model::{Model, NodeInfo};
pub use moves::{gibbs_move, metropolis_hastings, mh_move, mh_move_elementwise, Acceptance, Decision};
pub use node::{Node, NodeHandle};
pub use param::{Binding, Param};
pub use proposal::{Flip, Proposal, Scale, Slide, SlideConstrained};
pub use shape::{Array, Layout, Lone, Matrix, Shape};
pub use subset::{Column, Element, Row, SingleSite, Site, Subset, View};
pub use suffstat::{collapsed_logprob, gather, Accumulate, SuffStat};
pub use trace::Trace;
