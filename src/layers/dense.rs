use ndarray::{Array2, ArrayView2, Axis, Ix1, Ix2};
use rand::Rng;

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use super::initialization::WeightInit;
use super::traits::{Layer as LayerTrait, ParamSlot, Parameter, StateDict};

/// A fully connected (dense) layer in a neural network
#[derive(Clone, Debug)]
pub struct DenseLayer {
    /// `[input_size, output_size]`
    pub weights: Parameter<Ix2>,
    pub biases: Parameter<Ix1>,
    pub activation: Activation,
    inputs: Option<Array2<f32>>,
    pre_activation_output: Option<Array2<f32>>,
}

impl DenseLayer {
    /// Create a new dense layer. Weights follow the initialization recommended
    /// for `activation`; biases start at zero.
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, activation: Activation, rng: &mut R) -> Self {
        let init = WeightInit::for_activation(&activation);
        Self::new_with_init(input_size, output_size, activation, init, rng)
    }

    pub fn new_with_init<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: WeightInit,
        rng: &mut R,
    ) -> Self {
        let weights = init.initialize((input_size, output_size), input_size, rng);
        let biases = ndarray::Array1::zeros(output_size);
        DenseLayer {
            weights: Parameter::new(weights),
            biases: Parameter::new(biases),
            activation,
            inputs: None,
            pre_activation_output: None,
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.value.shape()[0]
    }

    pub fn output_size(&self) -> usize {
        self.weights.value.shape()[1]
    }

    fn pre_activation(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        inputs.dot(&self.weights.value) + &self.biases.value
    }

    /// Forward pass for a batch `[batch, input_size]` without caching anything.
    pub fn forward(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = self.pre_activation(inputs);
        self.activation.apply(&mut outputs);
        outputs
    }

    /// Forward pass that keeps the inputs and pre-activations for `backward`.
    pub fn forward_train(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let pre_activation = self.pre_activation(inputs);
        let mut outputs = pre_activation.clone();
        self.activation.apply(&mut outputs);
        self.inputs = Some(inputs.to_owned());
        self.pre_activation_output = Some(pre_activation);
        outputs
    }

    /// Accumulate weight and bias gradients for `output_errors` (dL/d output)
    /// and return dL/d input.
    pub fn backward(&mut self, output_errors: ArrayView2<f32>) -> Result<Array2<f32>> {
        let (weight_gradients, bias_gradients, adjusted_error) = {
            let (inputs, pre_activation) = match (&self.inputs, &self.pre_activation_output) {
                (Some(inputs), Some(pre)) => (inputs, pre),
                _ => {
                    return Err(DqnError::Training(
                        "dense backward called before forward_train".to_string(),
                    ))
                }
            };
            let adjusted_error = &output_errors * &self.activation.derivative(pre_activation.view());
            (inputs.t().dot(&adjusted_error), adjusted_error.sum_axis(Axis(0)), adjusted_error)
        };

        self.weights.accumulate(&weight_gradients);
        self.biases.accumulate(&bias_gradients);
        Ok(adjusted_error.dot(&self.weights.value.t()))
    }
}

impl LayerTrait for DenseLayer {
    fn parameter_names(&self) -> &'static [&'static str] {
        &["weight", "bias"]
    }

    fn parameters_mut(&mut self) -> Vec<ParamSlot<'_>> {
        vec![self.weights.slot(), self.biases.slot()]
    }

    fn zero_grad(&mut self) {
        self.weights.zero_grad();
        self.biases.zero_grad();
    }

    fn export(&self, prefix: &str, dict: &mut StateDict) {
        self.weights.export(format!("{}.weight", prefix), dict);
        self.biases.export(format!("{}.bias", prefix), dict);
    }

    fn import(&mut self, prefix: &str, dict: &StateDict) -> Result<()> {
        self.weights.import(&format!("{}.weight", prefix), dict)?;
        self.biases.import(&format!("{}.bias", prefix), dict)
    }

    fn num_parameters(&self) -> usize {
        self.weights.value.len() + self.biases.value.len()
    }
}
