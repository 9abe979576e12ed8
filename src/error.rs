use std::path::PathBuf;

use thiserror::Error;

/// A specialized `Result` type for agent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by agents, tables and decay schedules
#[derive(Debug, Error)]
pub enum Error {
    /// A caller supplied an out-of-range index or an invalid parameter
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A Q-table file does not exist
    #[error("Q-table file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A Q-table file exists but could not be decoded
    #[error("malformed Q-table file {}: {reason}", path.display())]
    Format { path: PathBuf, reason: String },

    /// A table does not have the `[n_states, n_actions]` shape the agent was built with
    #[error("Q-table shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
