use std::path::Path;

use log::{debug, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    agent::{Action, Agent, State},
    decay::{self, Decay},
    ensure_interval,
    error::{Error, Result},
    exploration::{Choice, EpsilonGreedy},
    table::QTable,
};

/// Configuration for the [`QAgent`]
#[derive(Debug, Clone)]
pub struct QAgentConfig<D: Decay> {
    /// Name used in diagnostics
    ///
    /// **Default**: `"QAgent"`
    pub name: String,
    /// Learning rate, must be in `(0, 1]`
    ///
    /// **Default**: `0.05`
    pub lr: f64,
    /// Discount factor, must be in `[0, 1]`
    ///
    /// **Default**: `0.99`
    pub gamma: f64,
    /// Value every entry of a freshly allocated table starts at
    ///
    /// **Default**: `0.0`
    pub initial_q_value: f64,
    /// Exploration policy
    ///
    /// **Default**: epsilon starts at `1.0`, is multiplied by `0.995` on every
    /// [`update_action_policy`](Agent::update_action_policy) and never drops below `0.01`
    pub exploration: EpsilonGreedy<D>,
}

impl Default for QAgentConfig<decay::Geometric> {
    fn default() -> Self {
        Self {
            name: String::from("QAgent"),
            lr: 0.05,
            gamma: 0.99,
            initial_q_value: 0.0,
            exploration: EpsilonGreedy::default(),
        }
    }
}

/// A tabular Q-learning agent
///
/// The agent keeps one value per state-action pair in a dense [`QTable`] and updates it
/// with the one-step Q-learning rule:
///
/// Q(s,a) ← Q(s,a) + α(r + γ max<sub>a'</sub> Q(s',a') (1 - done) - Q(s,a))
///
/// Actions are chosen epsilon-greedily. Greedy ties resolve to the lowest action index.
///
/// ### Generics
/// - `D` - The [`Decay`] schedule of the exploration probability
/// - `R` - The random source used for exploration, seedable for reproducible runs
#[derive(Debug, Clone)]
pub struct QAgent<D: Decay = decay::Geometric, R: Rng = StdRng> {
    name: String,
    q_table: QTable,
    exploration: EpsilonGreedy<D>,
    lr: f64,    // learning rate
    gamma: f64, // discount factor
    rng: R,
}

impl<D: Decay> QAgent<D, StdRng> {
    /// Initialize a new `QAgent` with a fresh table filled with `config.initial_q_value`
    ///
    /// Fails if either dimension is zero, `initial_q_value` is not finite or a
    /// hyperparameter is out of range
    pub fn new(n_states: usize, n_actions: usize, config: QAgentConfig<D>) -> Result<Self> {
        let q_table = QTable::filled(n_states, n_actions, config.initial_q_value)?;
        Self::build(q_table, config)
    }

    /// Initialize a new `QAgent` around an existing table
    ///
    /// The table must have shape `[n_states, n_actions]`; `config.initial_q_value` is ignored
    pub fn from_table(
        n_states: usize,
        n_actions: usize,
        q_table: QTable,
        config: QAgentConfig<D>,
    ) -> Result<Self> {
        check_shape((n_states, n_actions), q_table.shape())?;
        Self::build(q_table, config)
    }

    fn build(q_table: QTable, config: QAgentConfig<D>) -> Result<Self> {
        let QAgentConfig {
            name,
            lr,
            gamma,
            exploration,
            ..
        } = config;
        if !(lr > 0.0 && lr <= 1.0) {
            return Err(Error::InvalidArgument(format!(
                "Invalid value for `lr`: {}. Must be in the interval (0, 1].",
                lr
            )));
        }
        ensure_interval!(gamma, 0.0, 1.0);

        debug!(
            "{}: created with Q-table {:?}, lr={}, gamma={}",
            name,
            q_table.shape(),
            lr,
            gamma
        );
        Ok(Self {
            name,
            q_table,
            exploration,
            lr,
            gamma,
            rng: StdRng::from_entropy(),
        })
    }
}

impl<D: Decay, R: Rng> QAgent<D, R> {
    /// Replace the random source, e.g. with a seeded generator for reproducible runs
    pub fn with_rng<R2: Rng>(self, rng: R2) -> QAgent<D, R2> {
        QAgent {
            name: self.name,
            q_table: self.q_table,
            exploration: self.exploration,
            lr: self.lr,
            gamma: self.gamma,
            rng,
        }
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn n_states(&self) -> usize {
        self.q_table.n_states()
    }

    pub fn n_actions(&self) -> usize {
        self.q_table.n_actions()
    }

    /// Current exploration probability
    pub fn epsilon(&self) -> f64 {
        self.exploration.epsilon()
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl<D: Decay, R: Rng> Agent for QAgent<D, R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_action(&mut self, state: State) -> Result<Action> {
        self.q_table.check_state(state)?;
        match self.exploration.choose(&mut self.rng) {
            Choice::Explore => Ok(self.rng.gen_range(0..self.q_table.n_actions())),
            Choice::Exploit => self.q_table.best_action(state),
        }
    }

    fn greedy_action(&self, state: State) -> Result<Action> {
        self.q_table.best_action(state)
    }

    fn learn(
        &mut self,
        state: State,
        action: Action,
        reward: f64,
        new_state: State,
        done: bool,
    ) -> Result<()> {
        let q_value = self.q_table.get(state, action)?;
        let best_next_value = self.q_table.best_value(new_state)?;

        let td_target = if done {
            reward
        } else {
            reward + self.gamma * best_next_value
        };
        let td_error = td_target - q_value;
        trace!(
            "{}: s={} a={} r={} s'={} done={} td_target={} td_error={}",
            self.name,
            state,
            action,
            reward,
            new_state,
            done,
            td_target,
            td_error
        );

        self.q_table
            .set(state, action, q_value + self.lr * td_error)
    }

    fn update_action_policy(&mut self) {
        self.exploration.decay_step();
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.q_table.save(path)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let q_table = QTable::load(path)?;
        check_shape(self.q_table.shape(), q_table.shape())?;
        self.q_table = q_table;
        debug!("{}: Q-table replaced from {}", self.name, path.display());
        Ok(())
    }

    fn instruction_strings(&self) -> Vec<String> {
        vec![format!(
            "{} eps-greedy: eps={:0.4}",
            self.exploration.describe(),
            self.exploration.epsilon()
        )]
    }
}

fn check_shape(expected: (usize, usize), found: (usize, usize)) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::ShapeMismatch { expected, found })
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use statrs::distribution::{ChiSquared, ContinuousCDF};

    use super::*;

    fn seeded<D: Decay>(agent: QAgent<D>) -> QAgent<D, StdRng> {
        agent.with_rng(StdRng::seed_from_u64(42))
    }

    fn greedy_config(lr: f64, gamma: f64) -> QAgentConfig<decay::Constant> {
        QAgentConfig {
            name: String::from("greedy"),
            lr,
            gamma,
            initial_q_value: 0.0,
            exploration: EpsilonGreedy::new(decay::Constant::new(0.0)).unwrap(),
        }
    }

    #[test]
    fn q_agent_defaults() {
        let agent = QAgent::new(4, 3, QAgentConfig::default()).unwrap();
        assert_eq!(agent.name(), "QAgent");
        assert_eq!(agent.lr(), 0.05);
        assert_eq!(agent.gamma(), 0.99);
        assert_eq!(agent.epsilon(), 1.0);
        assert_eq!(agent.q_table().shape(), (4, 3));
        assert!(agent.q_table().as_array().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn q_agent_construction_validates() {
        assert!(QAgent::new(0, 2, QAgentConfig::default()).is_err(), "no states");
        assert!(QAgent::new(2, 0, QAgentConfig::default()).is_err(), "no actions");

        let bad = [(0.0, 0.9), (1.5, 0.9), (0.1, -0.1), (0.1, 1.1)];
        for (lr, gamma) in bad {
            let config = QAgentConfig {
                lr,
                gamma,
                ..Default::default()
            };
            assert!(
                matches!(QAgent::new(2, 2, config), Err(Error::InvalidArgument(_))),
                "lr={} gamma={} rejected",
                lr,
                gamma
            );
        }

        match QAgent::new(2, 2, QAgentConfig { lr: 0.0, ..Default::default() }) {
            Err(Error::InvalidArgument(msg)) => assert_eq!(
                msg, "Invalid value for `lr`: 0. Must be in the interval (0, 1].",
                "one check, half-open interval"
            ),
            other => panic!("expected InvalidArgument, got {:?}", other.map(|_| ())),
        }

        let config = QAgentConfig {
            initial_q_value: f64::INFINITY,
            ..Default::default()
        };
        assert!(QAgent::new(2, 2, config).is_err(), "non-finite initial value");
    }

    #[test]
    fn q_agent_initial_value_and_supplied_table() {
        let config = QAgentConfig {
            initial_q_value: 2.5,
            ..Default::default()
        };
        let agent = QAgent::new(2, 2, config).unwrap();
        assert!(agent.q_table().as_array().iter().all(|&x| x == 2.5));

        let table = QTable::from_array(array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]).unwrap();
        let agent = QAgent::from_table(3, 2, table.clone(), QAgentConfig::default()).unwrap();
        assert_eq!(agent.q_table(), &table, "supplied table used as is");

        assert!(matches!(
            QAgent::from_table(2, 3, table, QAgentConfig::default()),
            Err(Error::ShapeMismatch {
                expected: (2, 3),
                found: (3, 2)
            })
        ));
    }

    #[test]
    fn choose_action_validates_state() {
        let mut agent = seeded(QAgent::new(3, 2, QAgentConfig::default()).unwrap());
        assert!(matches!(
            agent.choose_action(3),
            Err(Error::InvalidArgument(_))
        ));
        assert!(agent.greedy_action(3).is_err());
    }

    #[test]
    fn choose_action_stays_in_action_space() {
        let mut agent = seeded(QAgent::new(5, 4, QAgentConfig::default()).unwrap());
        for i in 0..2000 {
            let action = agent.choose_action(i % 5).unwrap();
            assert!(action < 4, "action {} out of range", action);
            agent.update_action_policy();
        }
    }

    #[test]
    fn zero_epsilon_is_greedy() {
        let table = QTable::from_array(array![[0.0, 1.0, 1.0], [3.0, -1.0, 2.0]]).unwrap();
        let mut agent = seeded(QAgent::from_table(2, 3, table, greedy_config(0.1, 0.9)).unwrap());
        for _ in 0..100 {
            assert_eq!(agent.choose_action(0).unwrap(), 1, "lowest index among ties");
            assert_eq!(agent.choose_action(1).unwrap(), 0);
        }
    }

    #[test]
    fn full_epsilon_is_uniform() {
        const N_ACTIONS: usize = 5;
        const TRIALS: usize = 50_000;

        let config = QAgentConfig {
            exploration: EpsilonGreedy::new(decay::Constant::new(1.0)).unwrap(),
            ..greedy_config(0.05, 0.99)
        };
        let table = QTable::from_array(array![[0.0, 0.0, 9.0, 0.0, 0.0]]).unwrap();
        let mut agent = seeded(QAgent::from_table(1, N_ACTIONS, table, config).unwrap());

        let mut counts = [0usize; N_ACTIONS];
        for _ in 0..TRIALS {
            counts[agent.choose_action(0).unwrap()] += 1;
        }

        let expected = TRIALS as f64 / N_ACTIONS as f64;
        let chi2: f64 = counts
            .iter()
            .map(|&c| (c as f64 - expected).powi(2) / expected)
            .sum();
        let critical = ChiSquared::new((N_ACTIONS - 1) as f64)
            .unwrap()
            .inverse_cdf(0.999);
        assert!(
            chi2 < critical,
            "chi2 {} exceeds critical value {} for counts {:?}",
            chi2,
            critical,
            counts
        );
    }

    #[test]
    fn update_action_policy_decays_geometrically() {
        let config = QAgentConfig {
            exploration: EpsilonGreedy::new(decay::Geometric::new(0.9, 0.8, 0.1).unwrap())
                .unwrap(),
            ..Default::default()
        };
        let mut agent = QAgent::new(1, 1, config).unwrap();

        let mut previous = agent.epsilon();
        for k in 1..=40 {
            agent.update_action_policy();
            let epsilon = agent.epsilon();
            assert_eq!(epsilon, (0.8 * 0.9f64.powf(k as f64)).max(0.1), "step {}", k);
            assert!(epsilon <= previous, "epsilon never increases");
            assert!(epsilon >= 0.1, "epsilon never drops below the floor");
            previous = epsilon;
        }
        assert_eq!(agent.epsilon(), 0.1, "floor reached");
    }

    fn assert_epsilon_decays<D: Decay>(exploration: EpsilonGreedy<D>, floor: f64) {
        let config = QAgentConfig {
            name: String::from("decay"),
            lr: 0.1,
            gamma: 0.9,
            initial_q_value: 0.0,
            exploration,
        };
        let mut agent = QAgent::new(1, 2, config).unwrap();
        let mut previous = agent.epsilon();
        for step in 1..=200 {
            agent.update_action_policy();
            let epsilon = agent.epsilon();
            assert!(
                epsilon <= previous,
                "{}: epsilon rose from {} to {} at step {}",
                agent.instruction_strings()[0],
                previous,
                epsilon,
                step
            );
            assert!(
                epsilon >= floor,
                "{}: epsilon {} below floor {} at step {}",
                agent.instruction_strings()[0],
                epsilon,
                floor,
                step
            );
            previous = epsilon;
        }
    }

    #[test]
    fn update_action_policy_never_raises_epsilon_or_undershoots_floor() {
        assert_epsilon_decays(EpsilonGreedy::new(decay::Constant::new(0.3)).unwrap(), 0.3);
        assert_epsilon_decays(
            EpsilonGreedy::new(decay::Geometric::new(0.9, 1.0, 0.05).unwrap()).unwrap(),
            0.05,
        );
        assert_epsilon_decays(
            EpsilonGreedy::new(decay::Exponential::new(0.3, 1.0, 0.1).unwrap()).unwrap(),
            0.1,
        );
        assert_epsilon_decays(
            EpsilonGreedy::new(decay::InverseTime::new(0.5, 1.0, 0.1).unwrap()).unwrap(),
            0.1,
        );
        assert_epsilon_decays(
            EpsilonGreedy::new(decay::Linear::new(0.05, 1.0, 0.1).unwrap()).unwrap(),
            0.1,
        );
        assert_epsilon_decays(
            EpsilonGreedy::new(decay::Step::new(0.5, 1.0, 0.1, 3.0).unwrap()).unwrap(),
            0.1,
        );

        assert!(
            decay::InverseTime::new(-0.5, 0.2, 1.0).is_err(),
            "schedule that would divide by zero"
        );
        assert!(
            EpsilonGreedy::new(decay::Exponential::new(-0.5, 0.2, 1.0).unwrap()).is_err(),
            "rising schedule"
        );
    }

    #[test]
    fn learn_mutates_only_one_cell() {
        let config = QAgentConfig {
            lr: 0.5,
            ..Default::default()
        };
        let table = QTable::from_array(array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]).unwrap();
        let mut agent = QAgent::from_table(3, 2, table.clone(), config).unwrap();

        agent.learn(2, 0, 1.0, 1, false).unwrap();

        let before = table.as_array();
        let after = agent.q_table().as_array();
        for ((idx, &b), &a) in before.indexed_iter().zip(after.iter()) {
            if idx == (2, 0) {
                assert_ne!(a, b, "target cell changed");
            } else {
                assert_eq!(a, b, "cell {:?} untouched", idx);
            }
        }
    }

    #[test]
    fn learn_on_terminal_transition_ignores_next_state() {
        let mut agent = QAgent::new(2, 2, greedy_config(1.0, 0.99)).unwrap();
        agent.learn(0, 0, 5.0, 1, true).unwrap();
        assert_eq!(agent.q_table().get(0, 0).unwrap(), 5.0, "td_target equals reward");

        let table = QTable::from_array(array![[0.0, 0.0], [100.0, 100.0]]).unwrap();
        let mut agent = QAgent::from_table(2, 2, table, greedy_config(1.0, 0.99)).unwrap();
        agent.learn(0, 1, 5.0, 1, true).unwrap();
        assert_eq!(
            agent.q_table().get(0, 1).unwrap(),
            5.0,
            "no bootstrapping across episode boundary"
        );
    }

    #[test]
    fn learn_bootstraps_from_best_next_value() {
        let table = QTable::from_array(array![[0.0, 0.0], [2.0, 3.0]]).unwrap();
        let mut agent = QAgent::from_table(2, 2, table, greedy_config(1.0, 0.9)).unwrap();
        agent.learn(0, 0, 1.0, 1, false).unwrap();
        let q = agent.q_table().get(0, 0).unwrap();
        assert!((q - 3.7).abs() < 1e-12, "td_target = 1 + 0.9 * 3, got {}", q);
    }

    #[test]
    fn learn_single_step_scenario() {
        let mut agent = QAgent::new(3, 2, greedy_config(0.1, 0.9)).unwrap();
        agent.learn(0, 1, 1.0, 1, false).unwrap();
        assert_eq!(agent.q_table().get(0, 1).unwrap(), 0.1);
    }

    #[test]
    fn learn_validates_indices() {
        let mut agent = QAgent::new(3, 2, QAgentConfig::default()).unwrap();
        let before = agent.q_table().clone();
        assert!(agent.learn(3, 0, 1.0, 0, false).is_err(), "state");
        assert!(agent.learn(0, 2, 1.0, 0, false).is_err(), "action");
        assert!(agent.learn(0, 0, 1.0, 3, false).is_err(), "new_state");
        assert_eq!(agent.q_table(), &before, "failed calls leave the table alone");
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents").join("q_agent.npy");

        let mut agent = seeded(QAgent::new(4, 3, QAgentConfig::default()).unwrap());
        let transitions = [
            (0, 1, 1.0, 1, false),
            (1, 2, -0.5, 2, false),
            (2, 0, 0.25, 3, true),
            (0, 1, 1.0, 1, false),
        ];
        for (s, a, r, s2, done) in transitions {
            agent.learn(s, a, r, s2, done).unwrap();
        }
        agent.save(&path).unwrap();

        let mut fresh = QAgent::new(4, 3, QAgentConfig::default()).unwrap();
        fresh.load(&path).unwrap();
        assert_eq!(fresh.q_table(), agent.q_table(), "bit-for-bit equal");
    }

    #[test]
    fn load_rejects_wrong_shape_and_keeps_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.npy");
        QAgent::new(2, 2, QAgentConfig::default())
            .unwrap()
            .save(&path)
            .unwrap();

        let mut agent = QAgent::new(3, 2, QAgentConfig::default()).unwrap();
        let before = agent.q_table().clone();
        assert!(matches!(
            agent.load(&path),
            Err(Error::ShapeMismatch {
                expected: (3, 2),
                found: (2, 2)
            })
        ));
        assert!(matches!(
            agent.load(&dir.path().join("nope.npy")),
            Err(Error::NotFound(_))
        ));
        assert_eq!(agent.q_table(), &before);
    }

    #[test]
    fn instruction_strings_report_epsilon() {
        let mut agent = QAgent::new(1, 1, QAgentConfig::default()).unwrap();
        assert_eq!(
            agent.instruction_strings(),
            vec![String::from("Geometrically decreasing eps-greedy: eps=1.0000")]
        );
        agent.update_action_policy();
        assert_eq!(
            agent.instruction_strings(),
            vec![String::from("Geometrically decreasing eps-greedy: eps=0.9950")]
        );
    }
}
