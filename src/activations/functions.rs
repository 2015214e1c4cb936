use ndarray::{Array, ArrayView, Dimension};
use serde::{Serialize, Deserialize};

/// An enumeration of the activation functions a layer can apply to its output.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum Activation {
    #[default]
    Relu,
    Linear,
}

impl Activation {
    /// Apply the activation function to an array in-place.
    pub fn apply<D: Dimension>(&self, input: &mut Array<f32, D>) {
        match self {
            Activation::Relu => {
                input.mapv_inplace(|v| v.max(0.0));
            }
            Activation::Linear => {}
        }
    }

    /// Compute the derivative of the activation function, evaluated at the
    /// pre-activation values.
    pub fn derivative<D: Dimension>(&self, pre_activation: ArrayView<f32, D>) -> Array<f32, D> {
        match self {
            Activation::Relu => {
                pre_activation.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
            }
            Activation::Linear => {
                Array::ones(pre_activation.raw_dim())
            }
        }
    }
}
