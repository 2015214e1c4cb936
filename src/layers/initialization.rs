use ndarray::{Array, Dimension, ShapeBuilder};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;

/// Weight initialization strategies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeightInit {
    /// He/Kaiming uniform initialization (for ReLU)
    HeUniform,

    /// `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`, the usual default for linear outputs
    LecunUniform,
}

impl WeightInit {
    /// Draw a tensor of the given shape. `fan_in` counts the inputs feeding
    /// one unit (kernel area included for convolutions).
    pub fn initialize<D, Sh, R>(&self, shape: Sh, fan_in: usize, rng: &mut R) -> Array<f32, D>
    where
        D: Dimension,
        Sh: ShapeBuilder<Dim = D>,
        R: Rng + ?Sized,
    {
        let limit = match self {
            WeightInit::HeUniform => (6.0 / fan_in.max(1) as f32).sqrt(),
            WeightInit::LecunUniform => 1.0 / (fan_in.max(1) as f32).sqrt(),
        };
        Array::<f32, D>::random_using(shape, Uniform::new_inclusive(-limit, limit), rng)
    }

    /// Get the recommended initialization for an activation function
    pub fn for_activation(activation: &Activation) -> Self {
        match activation {
            Activation::Relu => WeightInit::HeUniform,
            Activation::Linear => WeightInit::LecunUniform,
        }
    }
}
