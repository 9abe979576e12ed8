use std::path::Path;

use crate::error::Result;

/// Index of a state, in `[0, n_states)`
pub type State = usize;

/// Index of an action, in `[0, n_actions)`
pub type Action = usize;

/// The contract between a learning agent and the training loop driving it
///
/// The loop supplies state indices, rewards and termination flags, and decides how often
/// [`update_action_policy`](Agent::update_action_policy) is called.
pub trait Agent {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Pick an action for `state` under the current behaviour policy
    fn choose_action(&mut self, state: State) -> Result<Action>;

    /// Pick the best known action for `state`, without exploring
    fn greedy_action(&self, state: State) -> Result<Action>;

    /// Learn from one transition
    fn learn(
        &mut self,
        state: State,
        action: Action,
        reward: f64,
        new_state: State,
        done: bool,
    ) -> Result<()>;

    /// Advance the exploration schedule by one step
    fn update_action_policy(&mut self);

    /// Persist the learned values to `path`
    fn save(&self, path: &Path) -> Result<()>;

    /// Replace the learned values with the ones stored at `path`
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Human readable lines describing the current policy
    fn instruction_strings(&self) -> Vec<String>;
}
