use log::{debug, info};

use crate::{agent::Agent, env::Environment, error::Result};

/// When the training loop advances the agent's exploration schedule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecayCadence {
    /// Call [`update_action_policy`](Agent::update_action_policy) after every environment step
    PerStep,
    /// Call [`update_action_policy`](Agent::update_action_policy) once when an episode ends
    #[default]
    PerEpisode,
}

/// Summary of a single episode
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EpisodeReport {
    pub total_reward: f64,
    pub steps: usize,
    /// `true` if the environment ended the episode, `false` if it was cut off at `max_steps`
    pub terminated: bool,
}

/// Run one episode, learning from every transition
pub fn run_episode<A, E>(
    agent: &mut A,
    env: &mut E,
    cadence: DecayCadence,
    max_steps: usize,
) -> Result<EpisodeReport>
where
    A: Agent + ?Sized,
    E: Environment,
{
    let mut report = EpisodeReport::default();
    let mut state = env.reset();

    while report.steps < max_steps {
        let action = agent.choose_action(state)?;
        let (next_state, reward, done) = env.step(action)?;
        agent.learn(state, action, reward, next_state, done)?;

        report.steps += 1;
        report.total_reward += reward;
        if cadence == DecayCadence::PerStep {
            agent.update_action_policy();
        }

        if done {
            report.terminated = true;
            break;
        }
        state = next_state;
    }

    if cadence == DecayCadence::PerEpisode {
        agent.update_action_policy();
    }
    if !report.terminated {
        debug!("{}: episode truncated after {} steps", agent.name(), max_steps);
    }

    Ok(report)
}

/// Configuration for the [`Trainer`]
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Number of episodes to train for
    ///
    /// **Default**: `1000`
    pub episodes: usize,
    /// Step limit per episode
    ///
    /// **Default**: `100`
    pub max_steps: usize,
    /// How often the exploration schedule advances
    ///
    /// **Default**: [`DecayCadence::PerEpisode`]
    pub cadence: DecayCadence,
    /// Log progress every `report_interval` episodes, `0` disables progress logs
    ///
    /// **Default**: `100`
    pub report_interval: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            episodes: 1000,
            max_steps: 100,
            cadence: DecayCadence::default(),
            report_interval: 100,
        }
    }
}

/// Drives an [`Agent`] through episodes of an [`Environment`]
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train `agent` for the configured number of episodes
    ///
    /// **Returns** one report per episode
    pub fn train<A, E>(&self, agent: &mut A, env: &mut E) -> Result<Vec<EpisodeReport>>
    where
        A: Agent + ?Sized,
        E: Environment,
    {
        let TrainerConfig {
            episodes,
            max_steps,
            cadence,
            report_interval,
        } = self.config;

        let mut reports = Vec::with_capacity(episodes);
        for episode in 0..episodes {
            reports.push(run_episode(agent, env, cadence, max_steps)?);

            if report_interval > 0 && (episode + 1) % report_interval == 0 {
                let window = &reports[reports.len() - report_interval..];
                let mean_reward =
                    window.iter().map(|r| r.total_reward).sum::<f64>() / window.len() as f64;
                info!(
                    "{}: episode {}/{} mean reward {:.4} | {}",
                    agent.name(),
                    episode + 1,
                    episodes,
                    mean_reward,
                    agent.instruction_strings().join(" ")
                );
            }
        }

        Ok(reports)
    }

    /// Run one episode following the greedy policy, without learning or decaying exploration
    pub fn evaluate<A, E>(&self, agent: &A, env: &mut E) -> Result<EpisodeReport>
    where
        A: Agent + ?Sized,
        E: Environment,
    {
        let mut report = EpisodeReport::default();
        let mut state = env.reset();

        while report.steps < self.config.max_steps {
            let (next_state, reward, done) = env.step(agent.greedy_action(state)?)?;
            report.steps += 1;
            report.total_reward += reward;
            if done {
                report.terminated = true;
                break;
            }
            state = next_state;
        }

        Ok(report)
    }
}
