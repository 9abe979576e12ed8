/// Tabular Q-learning
pub mod q_table;

pub use q_table::{QAgent, QAgentConfig};
