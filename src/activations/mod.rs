//! # Activation Functions Module
//!
//! Element-wise non-linearities shared by the dense and convolutional layers.
//! Every function works on arrays of any dimensionality, so the same
//! [`Activation`] value drives `[batch, features]` and
//! `[batch, channels, height, width]` tensors alike.
//!
//! ## Available Activations
//!
//! - **ReLU**: `max(0, x)`, used by every hidden layer of the dueling network
//! - **Linear**: identity, used by the value and advantage output layers
//!
//! ## Usage Example
//!
//! ```rust
//! use atari_dqn::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.0, -0.5], [0.0, 2.0]];
//! Activation::Relu.apply(&mut data);
//! assert_eq!(data, array![[1.0, 0.0], [0.0, 2.0]]);
//! ```

pub mod functions;

pub use functions::Activation;
