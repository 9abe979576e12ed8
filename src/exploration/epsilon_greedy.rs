use rand::Rng;

use crate::{
    decay::{self, Decay},
    ensure_interval,
    error::{Error, Result},
};

use super::Choice;

/// Epsilon greedy exploration policy with time-decaying epsilon threshold
///
/// The policy keeps its own decay step counter. Each call to [`decay_step`](Self::decay_step)
/// advances the schedule by one, so the current epsilon is always `decay.evaluate(t)`.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy<D: Decay> {
    epsilon: D,
    t: u32,
}

impl<D: Decay> EpsilonGreedy<D> {
    /// Initialize epsilon greedy policy with a decay strategy
    ///
    /// Fails unless the schedule starts inside `[0, 1]`, never increases and has a
    /// floor inside `[0, 1]`
    pub fn new(decay: D) -> Result<Self> {
        let start = decay.evaluate(0.0);
        ensure_interval!(start, 0.0, 1.0);
        let floor = decay.floor();
        ensure_interval!(floor, 0.0, start);
        if !decay.is_non_increasing() {
            return Err(Error::InvalidArgument(format!(
                "epsilon schedule must not increase ({})",
                decay.describe()
            )));
        }
        Ok(Self {
            epsilon: decay,
            t: 0,
        })
    }

    /// Current exploration probability
    pub fn epsilon(&self) -> f64 {
        self.epsilon.evaluate(self.t as f64).clamp(0.0, 1.0)
    }

    /// Number of decay steps taken so far
    pub fn steps(&self) -> u32 {
        self.t
    }

    /// Advance the decay schedule by one step
    pub fn decay_step(&mut self) {
        self.t = self.t.saturating_add(1);
    }

    /// Label of the underlying decay schedule
    pub fn describe(&self) -> &'static str {
        self.epsilon.describe()
    }

    /// Invoke epsilon greedy policy at the current decay step
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Choice {
        if rng.gen::<f64>() < self.epsilon() {
            Choice::Explore
        } else {
            Choice::Exploit
        }
    }
}

impl Default for EpsilonGreedy<decay::Geometric> {
    fn default() -> Self {
        Self {
            epsilon: decay::Geometric::default(),
            t: 0,
        }
    }
}
