use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::checkpoint::{self, Checkpointer};
use crate::config::{AgentConfig, TrainerConfig};
use crate::env::State;
use crate::error::{CheckpointError, DqnError, Result};
use crate::loss::{Loss, MeanSquaredError};
use crate::network::QNetwork;
use crate::optimizer::{Adam, Optimizer};
use crate::replay_memory::{Batch, ReplayMemory, Transition};
use super::epsilon::EpsilonSchedule;

/// Deep Q-Network agent with experience replay and a target network.
///
/// The online model is the only one ever trained. The target model supplies
/// the bootstrap values of the TD targets and is overwritten wholesale from
/// the online model every `target_sync_every` episodes.
///
/// # Example
///
/// ```rust
/// use atari_dqn::agent::DqnAgent;
/// use atari_dqn::config::{AgentConfig, TrainerConfig};
/// use atari_dqn::env::{Catch, CatchConfig, Env};
/// use atari_dqn::network::DuelingNetwork;
///
/// let catch = CatchConfig { seed: Some(0), ..CatchConfig::default() };
/// let mut rng = rand::thread_rng();
/// let model = DuelingNetwork::new(catch.network_config(), &mut rng).unwrap();
/// let mut agent = DqnAgent::new(model, AgentConfig::default(), TrainerConfig::default()).unwrap();
///
/// let mut env = Catch::new(catch).unwrap();
/// let state = env.reset().unwrap();
/// let action = agent.get_action(&state).unwrap();
/// assert!(action < env.num_actions());
/// ```
pub struct DqnAgent<M: QNetwork> {
    online: M,
    target: M,
    optimizer: Adam,
    loss: MeanSquaredError,
    memory: ReplayMemory,
    epsilon: EpsilonSchedule,
    config: AgentConfig,
    pub(super) trainer: TrainerConfig,
    pub(super) checkpointer: Checkpointer,
    rng: StdRng,
    learn_steps: usize,
}

/// Index of the largest value; ties go to the lowest index.
pub fn argmax(values: ArrayView1<f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if !(v > b) => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

impl<M: QNetwork> DqnAgent<M> {
    /// Build an agent around `model`. The target network starts as an exact copy.
    pub fn new(model: M, config: AgentConfig, trainer: TrainerConfig) -> Result<Self> {
        config.validate()?;
        trainer.validate()?;

        let (memory, rng) = match config.seed {
            Some(seed) => (
                ReplayMemory::with_seed(config.memory_capacity, seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (ReplayMemory::new(config.memory_capacity), StdRng::from_entropy()),
        };
        let epsilon = EpsilonSchedule::from_config(&config);
        log::info!("Epsilon decay is {}", epsilon.decay_factor());

        Ok(DqnAgent {
            target: model.clone(),
            online: model,
            optimizer: Adam::with_learning_rate(config.learning_rate),
            loss: MeanSquaredError,
            memory,
            epsilon,
            checkpointer: Checkpointer::new(trainer.checkpoint_dir.clone()),
            config,
            trainer,
            rng,
            learn_steps: 0,
        })
    }

    /// Epsilon-greedy action for a single state.
    pub fn get_action(&mut self, state: &State) -> Result<usize> {
        if self.rng.gen::<f32>() < self.epsilon.value() {
            Ok(self.rng.gen_range(0..self.online.num_actions()))
        } else {
            self.greedy_action(state)
        }
    }

    /// Action with the highest online value, lowest index on ties.
    pub fn greedy_action(&self, state: &State) -> Result<usize> {
        let q_values = self.q_values(state)?;
        argmax(q_values.view()).ok_or_else(|| DqnError::Training("network produced no action values".to_string()))
    }

    /// Online action values of a single state.
    pub fn q_values(&self, state: &State) -> Result<Array1<f32>> {
        let batch = state.view().insert_axis(Axis(0));
        let q = self.online.forward(batch)?;
        Ok(q.index_axis_move(Axis(0), 0))
    }

    /// Store one transition in the replay memory. Actions outside the
    /// network's action space are rejected.
    pub fn remember(&mut self, transition: Transition) -> Result<()> {
        let num_actions = self.online.num_actions();
        if transition.action >= num_actions {
            return Err(DqnError::invalid_parameter(
                "action".to_string(),
                format!("must be < {}, got {}", num_actions, transition.action),
            ));
        }
        self.memory.insert(transition);
        Ok(())
    }

    pub fn can_learn(&self) -> bool {
        self.memory.can_sample(self.config.batch_size)
    }

    /// TD targets of `batch`: the reward alone for terminal transitions,
    /// `r + gamma * max_a' Q_target(s', a')` otherwise.
    pub fn compute_targets(&self, batch: &Batch) -> Result<Array1<f32>> {
        let next_q = self.target.forward(batch.next_states.view())?;
        let targets = batch
            .rewards
            .iter()
            .zip(&batch.dones)
            .zip(next_q.outer_iter())
            .map(|((&reward, &done), row)| {
                if done {
                    reward
                } else {
                    let best = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                    reward + self.config.gamma * best
                }
            })
            .collect();
        Ok(targets)
    }

    /// One gradient step on a sampled batch; returns the loss.
    ///
    /// # Panics
    ///
    /// Panics if the replay memory cannot provide a batch yet (see [`Self::can_learn`]).
    pub fn learn_step(&mut self) -> Result<f32> {
        let batch = self.memory.sample(self.config.batch_size);
        let targets = self.compute_targets(&batch)?;

        self.online.zero_grad();
        let q = self.online.forward_train(batch.states.view())?;
        let taken: Array1<f32> = batch
            .actions
            .iter()
            .enumerate()
            .map(|(i, &a)| q[[i, a]])
            .collect();

        let loss = self.loss.compute(taken.view(), targets.view());
        let grad_taken = self.loss.gradient(taken.view(), targets.view());

        // only the taken action contributes to the loss
        let mut grad_output = Array2::zeros(q.raw_dim());
        for (i, &a) in batch.actions.iter().enumerate() {
            grad_output[[i, a]] = grad_taken[i];
        }
        self.online.backward(grad_output.view())?;
        self.optimizer.step(self.online.parameters_mut());

        self.learn_steps += 1;
        Ok(loss)
    }

    /// Overwrite the target network with the online parameters.
    pub fn sync_target(&mut self) -> Result<()> {
        self.target.load_state_dict(&self.online.state_dict())
    }

    /// Load online parameters from `path` and copy them into the target network.
    pub fn restore_checkpoint(&mut self, path: impl AsRef<Path>) -> std::result::Result<(), CheckpointError> {
        let path = path.as_ref();
        checkpoint::load_model(&mut self.online, path)?;
        self.sync_target().map_err(|e| CheckpointError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Like [`Self::restore_checkpoint`], but any failure only gets logged and
    /// the current parameters are kept.
    pub fn try_restore(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.restore_checkpoint(path) {
            Ok(()) => {
                log::info!("Success! Loaded weights from {}", path.display());
                true
            }
            Err(e) => {
                log::warn!("No weights available ({}), starting from fresh parameters", e);
                false
            }
        }
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon.value()
    }

    pub fn set_epsilon(&mut self, value: f32) {
        self.epsilon.set_value(value);
    }

    /// Apply one episode of exploration decay.
    pub fn decay_epsilon(&mut self) {
        self.epsilon.step();
    }

    pub fn epsilon_schedule(&self) -> &EpsilonSchedule {
        &self.epsilon
    }

    pub fn online(&self) -> &M {
        &self.online
    }

    pub fn target(&self) -> &M {
        &self.target
    }

    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn trainer_config(&self) -> &TrainerConfig {
        &self.trainer
    }

    pub fn checkpointer(&self) -> &Checkpointer {
        &self.checkpointer
    }

    /// Number of gradient steps taken so far
    pub fn learn_steps(&self) -> usize {
        self.learn_steps
    }
}
