//! Probabilistic belief over which catalog entity is the hidden target.
//!
//! - `state`: the normalised distribution itself (`BeliefState`).
//! - `likelihood`: answer likelihoods and the Bayesian update built on them.

mod likelihood;
mod state;

pub use likelihood::{LikelihoodConfig, LikelihoodModel};
pub use state::BeliefState;
