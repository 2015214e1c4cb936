//! Train a dueling DQN agent on Catch.
//!
//! Settings come from `dqn.yaml` in the working directory when present.
//! Models go to `trainer.checkpoint_dir`, plots and statistics to `plot_dir`.

use atari_dqn::agent::DqnAgent;
use atari_dqn::config::RunConfig;
use atari_dqn::env::Catch;
use atari_dqn::error::Result;
use atari_dqn::network::DuelingNetwork;
use atari_dqn::visualization::{export_statistics_csv, export_statistics_json, statistics_summary, LivePlot};
use rand::rngs::StdRng;
use rand::SeedableRng;

const CONFIG_PATH: &str = "dqn.yaml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RunConfig::load_or_default(CONFIG_PATH)?;
    let mut rng = match config.agent.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let model = DuelingNetwork::new(config.network.clone(), &mut rng)?;
    log::info!("Dueling network with {} parameters", model.num_parameters());

    let mut agent = DqnAgent::new(model, config.agent.clone(), config.trainer.clone())?;
    let mut env = Catch::new(config.catch.clone())?;
    let mut plotter = LivePlot::new(&config.plot_dir);

    let stats = agent.train(&mut env, config.epochs, &mut plotter)?;

    std::fs::create_dir_all(&config.plot_dir)?;
    export_statistics_json(&stats, config.plot_dir.join("statistics.json"))?;
    export_statistics_csv(&stats, config.trainer.checkpoint_every, config.plot_dir.join("statistics.csv"))?;
    println!("{}", statistics_summary(&stats));
    Ok(())
}
