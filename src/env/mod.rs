//! # Environments
//!
//! The agent never sees how observations are produced. It drives any type
//! implementing [`Env`]: reset to a first state, step with an action index,
//! render frames for recording and close when done. Preprocessing such as
//! frame resizing or frame skipping belongs inside the implementation.
//!
//! [`Catch`] is a small built-in game with image-shaped states, used by the
//! binaries and the tests.

pub mod catch;

use ndarray::Array3;

use crate::error::Result;

pub use catch::{Catch, CatchConfig};

/// Observation shaped `[channels, height, width]`.
pub type State = Array3<f32>;

/// Rendered image shaped `[height, width, 3]`.
pub type Frame = Array3<u8>;

/// Auxiliary data reported with every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepInfo {
    /// Lives left after the step
    pub lives: u32,
}

/// Outcome of one action.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub next_state: State,
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// RGB image of the current screen
    RgbArray,
}

/// An episodic environment with a discrete action space.
///
/// Errors returned by any method are passed through the training and
/// evaluation loops unchanged.
pub trait Env {
    fn num_actions(&self) -> usize;

    /// Start a new episode and return its first state.
    fn reset(&mut self) -> Result<State>;

    /// Apply `action`, which must be below `num_actions()`.
    fn step(&mut self, action: usize) -> Result<Step>;

    fn render(&mut self, mode: RenderMode) -> Result<Frame>;

    /// Release resources. The environment is unusable afterwards.
    fn close(&mut self) -> Result<()>;
}

