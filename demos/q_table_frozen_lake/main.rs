use std::path::Path;

use log::info;
use qagent::{
    algo::{QAgent, QAgentConfig},
    env::Environment,
    gym::FrozenLake,
    train::{DecayCadence, Trainer, TrainerConfig},
    Agent,
};

const NUM_EPISODES: usize = 10000;
const TABLE_PATH: &str = "local/q_table_frozen_lake.npy";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut env = FrozenLake::new();
    let config = QAgentConfig {
        lr: 0.1,
        gamma: 0.95,
        ..Default::default()
    };
    let mut agent = QAgent::new(env.n_states(), env.n_actions(), config)?;

    let trainer = Trainer::new(TrainerConfig {
        episodes: NUM_EPISODES,
        cadence: DecayCadence::PerEpisode,
        report_interval: 1000,
        ..Default::default()
    });
    let reports = trainer.train(&mut agent, &mut env)?;
    let wins = reports.iter().filter(|r| r.total_reward > 0.0).count();
    info!("reached the goal in {}/{} episodes", wins, NUM_EPISODES);

    agent.save(Path::new(TABLE_PATH))?;

    let mut restored = QAgent::new(env.n_states(), env.n_actions(), QAgentConfig::default())?;
    restored.load(Path::new(TABLE_PATH))?;

    let report = trainer.evaluate(&restored, &mut env)?;
    info!(
        "greedy run with restored table: reward {} in {} steps",
        report.total_reward, report.steps
    );

    Ok(())
}
