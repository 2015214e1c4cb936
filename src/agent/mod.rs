//! # Deep Q-learning agent
//!
//! [`DqnAgent`] owns everything a training run mutates: the online and target
//! Q-networks, the Adam state, the replay memory and the exploration
//! schedule.
//!
//! ## Cycle
//!
//! 1. pick an action with [`DqnAgent::get_action`] (epsilon-greedy)
//! 2. store the transition in the replay memory
//! 3. once the memory holds enough transitions, [`DqnAgent::learn_step`]
//!    regresses `Q(s, a)` on `r + gamma * max_a' Q_target(s', a')`
//! 4. after every episode epsilon decays; on fixed episode boundaries the
//!    model is saved, statistics are checkpointed, the target network is
//!    synchronized and plots are refreshed
//!
//! [`DqnAgent::train`] runs the whole loop and [`DqnAgent::test`] plays
//! games without learning while recording frames.
//!
//! ## Example
//!
//! ```rust,no_run
//! use atari_dqn::agent::DqnAgent;
//! use atari_dqn::config::RunConfig;
//! use atari_dqn::env::Catch;
//! use atari_dqn::network::DuelingNetwork;
//! use atari_dqn::visualization::LivePlot;
//!
//! let config = RunConfig::default();
//! let model = DuelingNetwork::new(config.network.clone(), &mut rand::thread_rng()).unwrap();
//! let mut agent = DqnAgent::new(model, config.agent.clone(), config.trainer.clone()).unwrap();
//!
//! let mut env = Catch::new(config.catch.clone()).unwrap();
//! let mut plotter = LivePlot::new("plots");
//! let stats = agent.train(&mut env, 500, &mut plotter).unwrap();
//! println!("{:?}", stats.avg_returns);
//! ```

mod dqn;
mod epsilon;
mod training;

pub use dqn::{argmax, DqnAgent};
pub use epsilon::{EpsilonSchedule, EPSILON_DECAY_SPEEDUP};
