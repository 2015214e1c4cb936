//! Play a few games of Catch with the latest trained model and record them
//! as PNG frames under `record_dir`.

use atari_dqn::agent::DqnAgent;
use atari_dqn::config::RunConfig;
use atari_dqn::env::Catch;
use atari_dqn::error::Result;
use atari_dqn::network::DuelingNetwork;
use atari_dqn::recording::PngSequenceWriter;

const CONFIG_PATH: &str = "dqn.yaml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RunConfig::load_or_default(CONFIG_PATH)?;
    let model = DuelingNetwork::new(config.network.clone(), &mut rand::thread_rng())?;
    let mut agent = DqnAgent::new(model, config.agent.clone(), config.trainer.clone())?;

    let latest = agent.checkpointer().latest_path();
    agent.try_restore(&latest);
    agent.set_epsilon(config.eval_epsilon);

    let mut env = Catch::new(config.catch.clone())?;
    let mut writer = PngSequenceWriter::create(&config.record_dir)?;
    agent.test(&mut env, config.test_games, &mut writer)?;

    log::info!("Recorded {} frames to {}", writer.frames_written(), writer.dir().display());
    Ok(())
}
