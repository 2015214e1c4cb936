//! # atari_dqn - Dueling Deep Q-Learning
//!
//! Trains an agent to play image-based games with Deep Q-Learning: a dueling
//! Q-network, experience replay and a periodically synchronized target
//! network.
//!
//! ## Key Features
//!
//! - **Replay memory**: bounded FIFO ring buffer with uniform sampling
//! - **Agent**: epsilon-greedy acting, TD learning with a target network,
//!   per-episode exploration decay
//! - **Dueling network**: convolutional features split into state value and
//!   action advantage heads, trained with Adam
//! - **Environments**: any type implementing [`env::Env`]; a small Catch game
//!   ships with the crate
//! - **Bookkeeping**: checkpoints, training statistics, ASCII plots and PNG
//!   frame recording
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use atari_dqn::agent::DqnAgent;
//! use atari_dqn::config::RunConfig;
//! use atari_dqn::env::Catch;
//! use atari_dqn::network::DuelingNetwork;
//! use atari_dqn::recording::PngSequenceWriter;
//! use atari_dqn::visualization::NullPlotter;
//!
//! let config = RunConfig::default();
//! let model = DuelingNetwork::new(config.network.clone(), &mut rand::thread_rng())?;
//! let mut agent = DqnAgent::new(model, config.agent.clone(), config.trainer.clone())?;
//!
//! let mut env = Catch::new(config.catch.clone())?;
//! agent.train(&mut env, config.epochs, &mut NullPlotter)?;
//!
//! let mut writer = PngSequenceWriter::create("videos")?;
//! agent.test(&mut Catch::new(config.catch.clone())?, 1, &mut writer)?;
//! # Ok::<(), atari_dqn::error::DqnError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`agent`] - The DQN agent, its training loop and exploration schedule
//! - [`replay_memory`] - Experience replay
//! - [`network`] - Q-network contract and the dueling network
//! - [`layers`], [`activations`], [`loss`], [`optimizer`] - Numerical building blocks
//! - [`env`] - Environment contract and the Catch game
//! - [`metrics`] - Training statistics
//! - [`visualization`] - Text plots and statistics export
//! - [`recording`] - Frame sinks for evaluation runs
//! - [`checkpoint`] - Model persistence
//! - [`config`] - YAML run configuration
//! - [`error`] - Error types and result handling

pub mod activations;
pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod env;
pub mod error;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod recording;
pub mod replay_memory;
pub mod visualization;

#[cfg(test)]
mod tests;
