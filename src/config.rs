//! Run configuration.
//!
//! Every section has defaults matching the classic Atari setup, so a YAML
//! file only needs the keys it changes:
//!
//! ```yaml
//! agent:
//!   nb_warmup: 500
//! epochs: 2000
//! ```
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::env::CatchConfig;
use crate::error::{DqnError, Result};
use crate::network::DuelingNetConfig;
use crate::replay_memory::DEFAULT_SAMPLE_RATIO;

/// Hyperparameters of the learning agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Exploration rate at the start of training
    pub initial_epsilon: f32,
    /// Floor the exploration rate decays towards
    pub min_epsilon: f32,
    /// Controls the decay speed: epsilon reaches its floor in roughly
    /// `nb_warmup / 2` episodes
    pub nb_warmup: usize,
    pub memory_capacity: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    /// Discount factor
    pub gamma: f32,
    /// Seeds exploration and replay sampling; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            initial_epsilon: 1.0,
            min_epsilon: 0.1,
            nb_warmup: 2000,
            memory_capacity: 80_000,
            batch_size: 32,
            learning_rate: 0.00025,
            gamma: 0.99,
            seed: None,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.initial_epsilon) {
            return Err(DqnError::invalid_parameter(
                "initial_epsilon".to_string(),
                format!("must be in [0, 1], got {}", self.initial_epsilon),
            ));
        }
        if !(0.0..=self.initial_epsilon).contains(&self.min_epsilon) {
            return Err(DqnError::invalid_parameter(
                "min_epsilon".to_string(),
                format!("must be in [0, initial_epsilon], got {}", self.min_epsilon),
            ));
        }
        if self.nb_warmup == 0 {
            return Err(DqnError::invalid_parameter("nb_warmup", "must be > 0"));
        }
        if self.batch_size == 0 {
            return Err(DqnError::invalid_parameter("batch_size", "must be > 0"));
        }
        // learning waits until the memory holds this many transitions
        let learn_threshold = DEFAULT_SAMPLE_RATIO * self.batch_size;
        if self.memory_capacity < learn_threshold {
            return Err(DqnError::invalid_parameter(
                "memory_capacity".to_string(),
                format!(
                    "must hold {} batches of {} ({} transitions) before learning can start, got {}",
                    DEFAULT_SAMPLE_RATIO, self.batch_size, learn_threshold, self.memory_capacity
                ),
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(DqnError::invalid_parameter("learning_rate", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(DqnError::invalid_parameter(
                "gamma".to_string(),
                format!("must be in [0, 1], got {}", self.gamma),
            ));
        }
        Ok(())
    }
}

/// Episode-boundary bookkeeping of the training loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Episodes between saves of the latest model, log lines and statistics checkpoints
    pub checkpoint_every: usize,
    /// Episodes between hard target-network synchronizations
    pub target_sync_every: usize,
    /// Episodes between plot refreshes
    pub plot_every: usize,
    /// Episodes between episode-indexed model snapshots
    pub snapshot_every: usize,
    /// Number of most recent returns averaged at each checkpoint
    pub avg_window: usize,
    /// Step limit of a single evaluation game
    pub test_max_steps: usize,
    pub checkpoint_dir: PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            checkpoint_every: 20,
            target_sync_every: 50,
            plot_every: 100,
            snapshot_every: 1000,
            avg_window: 100,
            test_max_steps: 1000,
            checkpoint_dir: PathBuf::from("models"),
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("checkpoint_every", self.checkpoint_every),
            ("target_sync_every", self.target_sync_every),
            ("plot_every", self.plot_every),
            ("snapshot_every", self.snapshot_every),
            ("avg_window", self.avg_window),
            ("test_max_steps", self.test_max_steps),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(DqnError::invalid_parameter(name, "must be > 0"));
            }
        }
        Ok(())
    }
}

/// Everything the `train` and `evaluate` binaries need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub agent: AgentConfig,
    pub trainer: TrainerConfig,
    pub network: DuelingNetConfig,
    pub catch: CatchConfig,
    /// Number of training episodes
    pub epochs: usize,
    /// Number of games played by `evaluate`
    pub test_games: usize,
    /// Exploration rate used while evaluating
    pub eval_epsilon: f32,
    pub plot_dir: PathBuf,
    pub record_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        let catch = CatchConfig::default();
        RunConfig {
            agent: AgentConfig::default(),
            trainer: TrainerConfig::default(),
            network: catch.network_config(),
            catch,
            epochs: 10_000,
            test_games: 1,
            eval_epsilon: 0.05,
            plot_dir: PathBuf::from("plots"),
            record_dir: PathBuf::from("videos"),
        }
    }
}

impl RunConfig {
    /// Constructs [`RunConfig`] from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let config: RunConfig = serde_yaml::from_reader(rdr)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            log::info!("Loading configuration from {}", path.display());
            Self::load(path)
        } else {
            log::info!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Saves [`RunConfig`] as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.agent.validate()?;
        self.trainer.validate()?;
        self.network.validate()?;
        self.catch.validate()?;

        if self.network.input_shape != self.catch.state_shape() {
            return Err(DqnError::Config(format!(
                "network input {:?} does not match environment states {:?}",
                self.network.input_shape,
                self.catch.state_shape()
            )));
        }
        if self.network.num_actions != crate::env::catch::NUM_ACTIONS {
            return Err(DqnError::Config(format!(
                "network has {} actions, environment has {}",
                self.network.num_actions,
                crate::env::catch::NUM_ACTIONS
            )));
        }
        if !(0.0..=1.0).contains(&self.eval_epsilon) {
            return Err(DqnError::invalid_parameter(
                "eval_epsilon".to_string(),
                format!("must be in [0, 1], got {}", self.eval_epsilon),
            ));
        }
        Ok(())
    }
}
