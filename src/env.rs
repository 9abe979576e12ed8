use crate::{
    agent::{Action, State},
    error::Result,
};

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
///
/// This base trait represents the common case of a discrete-time MDP with one agent
/// and finite state and action spaces, both addressed by index.
pub trait Environment {
    /// Number of states, every state index is in `[0, n_states)`
    fn n_states(&self) -> usize;

    /// Number of actions, every action index is in `[0, n_actions)`
    fn n_actions(&self) -> usize;

    /// Update the environment in response to an action taken by an agent
    ///
    /// **Returns** `(next_state, reward, done)`, where `done` marks the end of the episode.
    /// Fails if `action` is not in the action space.
    fn step(&mut self, action: Action) -> Result<(State, f64, bool)>;

    /// Reset the environment to an initial state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> State;
}
