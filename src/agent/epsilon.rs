use serde::{Deserialize, Serialize};

use crate::config::AgentConfig;

/// How much faster than linear the exploration rate heads for its floor:
/// with a speedup of 2 it gets there in about `nb_warmup / 2` episodes.
pub const EPSILON_DECAY_SPEEDUP: f32 = 2.0;

/// Multiplicative per-episode exploration decay, floored at `min`.
///
/// ```rust
/// use atari_dqn::agent::EpsilonSchedule;
///
/// let mut schedule = EpsilonSchedule::new(1.0, 0.1, 1000);
/// assert!((schedule.decay_factor() - 0.9982).abs() < 1e-6);
/// schedule.step();
/// assert!((schedule.value() - 0.9982).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    value: f32,
    min: f32,
    decay: f32,
}

impl EpsilonSchedule {
    pub fn new(initial: f32, min: f32, nb_warmup: usize) -> Self {
        let decay = 1.0 - ((initial - min) / nb_warmup.max(1) as f32) * EPSILON_DECAY_SPEEDUP;
        Self::with_decay(initial, min, decay)
    }

    pub fn with_decay(initial: f32, min: f32, decay: f32) -> Self {
        EpsilonSchedule {
            value: initial.max(min),
            min,
            decay: decay.clamp(0.0, 1.0),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.initial_epsilon, config.min_epsilon, config.nb_warmup)
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn decay_factor(&self) -> f32 {
        self.decay
    }

    /// Apply one episode of decay. Never goes below the floor.
    pub fn step(&mut self) {
        if self.value > self.min {
            self.value = (self.value * self.decay).max(self.min);
        }
    }

    /// Override the current rate, e.g. to evaluate with little exploration.
    ///
    /// The override may go below `min`. [`Self::step`] never raises the rate,
    /// so it then stays at the overridden value until set again.
    pub fn set_value(&mut self, value: f32) {
        self.value = value.clamp(0.0, 1.0);
    }
}
