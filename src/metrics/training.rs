use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use super::summary::Summary;

/// Record of a training run.
///
/// `returns` gets one entry per finished episode. `avg_returns` and
/// `epsilon_checkpoints` get one entry each per statistics checkpoint and
/// always have the same length. Nothing is ever dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStatistics {
    /// Undiscounted return of every episode
    pub returns: Vec<f32>,

    /// Mean of the most recent returns, taken at each checkpoint
    pub avg_returns: Vec<f32>,

    /// Exploration rate at each checkpoint
    pub epsilon_checkpoints: Vec<f32>,

    /// Steps taken in every episode
    pub episode_lengths: Vec<usize>,

    /// Mean learn-step loss of every episode; `None` while the memory was
    /// still too small to learn
    pub episode_losses: Vec<Option<f32>>,
}

impl TrainingStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_episode(&mut self, episode_return: f32, length: usize, mean_loss: Option<f32>) {
        self.returns.push(episode_return);
        self.episode_lengths.push(length);
        self.episode_losses.push(mean_loss);
    }

    /// Push the mean of the last `window` returns and `epsilon`, returning the mean.
    pub fn checkpoint(&mut self, window: usize, epsilon: f32) -> f32 {
        let avg = self.average_return(window).unwrap_or(0.0);
        self.avg_returns.push(avg);
        self.epsilon_checkpoints.push(epsilon);
        avg
    }

    /// Mean of the last `window` returns (fewer if not that many exist yet).
    pub fn average_return(&self, window: usize) -> Option<f32> {
        if self.returns.is_empty() || window == 0 {
            return None;
        }
        let n = window.min(self.returns.len());
        let sum: f32 = self.returns.iter().rev().take(n).sum();
        Some(sum / n as f32)
    }

    pub fn episodes(&self) -> usize {
        self.returns.len()
    }

    pub fn num_checkpoints(&self) -> usize {
        self.avg_returns.len()
    }

    pub fn last_return(&self) -> Option<f32> {
        self.returns.last().copied()
    }

    pub fn return_summary(&self) -> Summary {
        Summary::from_slice(&self.returns)
    }

    /// Save as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
