//! # Q-value networks
//!
//! The agent only talks to its models through [`QNetwork`]: batched
//! evaluation to per-action values, a gradient path for the online model, and
//! a [`StateDict`] snapshot used both for target synchronization and for
//! checkpoints. [`DuelingNetwork`] is the concrete model shipped with the
//! crate.

pub mod config;
pub mod dueling;

use ndarray::{Array2, ArrayView2, ArrayView4};

use crate::error::Result;
use crate::layers::ParamSlot;

pub use crate::layers::StateDict;
pub use config::{ConvSpec, DuelingNetConfig};
pub use dueling::DuelingNetwork;

/// A differentiable function from a batch of states to per-action values.
pub trait QNetwork: Clone {
    /// Number of actions, i.e. the width of every output row
    fn num_actions(&self) -> usize;

    /// Evaluate `[batch, channels, height, width]` states to `[batch, num_actions]`
    /// values. Nothing is cached; this is the gradient-free path.
    fn forward(&self, states: ArrayView4<f32>) -> Result<Array2<f32>>;

    /// Same as `forward` but keeps the activations needed by `backward`.
    fn forward_train(&mut self, states: ArrayView4<f32>) -> Result<Array2<f32>>;

    /// Back-propagate dL/d output of the last `forward_train` call, accumulating
    /// parameter gradients.
    fn backward(&mut self, grad_output: ArrayView2<f32>) -> Result<()>;

    fn zero_grad(&mut self);

    /// Every trainable parameter, always in the same order
    fn parameters_mut(&mut self) -> Vec<ParamSlot<'_>>;

    fn state_dict(&self) -> StateDict;

    /// Overwrite all parameters from a snapshot taken from a model of the same
    /// architecture.
    fn load_state_dict(&mut self, dict: &StateDict) -> Result<()>;
}
