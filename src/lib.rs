//! Tabular Q-learning
//!
//! A [`QAgent`](algo::QAgent) keeps a dense table of action values, picks actions with an
//! epsilon-greedy policy whose epsilon follows a [`decay`] schedule, and learns with the
//! one-step Q-learning update. The [`train`] module provides the loop that feeds it
//! transitions from an [`Environment`](env::Environment).

/// The agent contract
pub mod agent;

/// Implemented RL algorithms
pub mod algo;

/// Implementations of strategies for time-decaying hyperparameters
pub mod decay;

/// Environment
pub mod env;

/// Error types
pub mod error;

/// Exploration policies
pub mod exploration;

/// Dense action-value tables and their on-disk format
pub mod table;

/// Training loop
pub mod train;

/// Testing environments
#[cfg(feature = "gym")]
pub mod gym;

mod util;

pub use agent::{Action, Agent, State};
pub use algo::{QAgent, QAgentConfig};
pub use error::{Error, Result};
pub use table::QTable;
