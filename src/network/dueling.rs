use ndarray::{Array2, Array4, ArrayView2, ArrayView4, Axis};
use rand::Rng;

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use crate::layers::{Conv2dLayer, DenseLayer, LayerTrait, ParamSlot, StateDict};
use super::config::DuelingNetConfig;
use super::QNetwork;

/// Dueling Q-network: a convolutional feature extractor followed by a state
/// value head and an action advantage head, combined per sample as
/// `Q(s, a) = V(s) + A(s, a) - mean_a' A(s, a')`.
///
/// # Example
///
/// ```rust
/// use atari_dqn::network::{DuelingNetConfig, DuelingNetwork, ConvSpec, QNetwork};
/// use ndarray::Array4;
/// use rand::SeedableRng;
///
/// let config = DuelingNetConfig {
///     input_shape: [1, 6, 6],
///     num_actions: 3,
///     conv_layers: vec![ConvSpec::new(4, 3, 1)],
///     hidden_sizes: vec![16],
/// };
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let network = DuelingNetwork::new(config, &mut rng).unwrap();
///
/// let states = Array4::zeros((2, 1, 6, 6));
/// let q_values = network.forward(states.view()).unwrap();
/// assert_eq!(q_values.dim(), (2, 3));
/// ```
#[derive(Clone, Debug)]
pub struct DuelingNetwork {
    config: DuelingNetConfig,
    convs: Vec<Conv2dLayer>,
    value_head: Vec<DenseLayer>,
    advantage_head: Vec<DenseLayer>,
    feature_shape: [usize; 3],
    trained_batch: Option<usize>,
}

fn build_head<R: Rng + ?Sized>(input: usize, hidden: &[usize], output: usize, rng: &mut R) -> Vec<DenseLayer> {
    let mut sizes = Vec::with_capacity(hidden.len() + 2);
    sizes.push(input);
    sizes.extend_from_slice(hidden);
    sizes.push(output);

    let last = sizes.len() - 2;
    sizes
        .windows(2)
        .enumerate()
        .map(|(i, window)| {
            let activation = if i == last { Activation::Linear } else { Activation::Relu };
            DenseLayer::new(window[0], window[1], activation, rng)
        })
        .collect()
}

/// Flatten `[batch, c, h, w]` into `[batch, c * h * w]` in row-major order.
fn flatten(images: &Array4<f32>) -> Array2<f32> {
    let (batch, c, h, w) = images.dim();
    let features = c * h * w;
    Array2::from_shape_fn((batch, features), |(b, i)| {
        images[[b, i / (h * w), (i / w) % h, i % w]]
    })
}

/// Inverse of [`flatten`].
fn unflatten(flat: &Array2<f32>, shape: [usize; 3]) -> Array4<f32> {
    let [c, h, w] = shape;
    Array4::from_shape_fn((flat.nrows(), c, h, w), |(b, ci, y, x)| {
        flat[[b, (ci * h + y) * w + x]]
    })
}

/// `V + (A - mean(A))`, with the mean taken over each sample's own actions.
fn combine(value: &Array2<f32>, advantage: &Array2<f32>) -> Array2<f32> {
    let num_actions = advantage.ncols().max(1) as f32;
    let mean = advantage.sum_axis(Axis(1)) / num_actions;
    advantage - &mean.insert_axis(Axis(1)) + value
}

impl DuelingNetwork {
    pub fn new<R: Rng + ?Sized>(config: DuelingNetConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let mut in_channels = config.input_shape[0];
        let mut convs = Vec::with_capacity(config.conv_layers.len());
        for spec in &config.conv_layers {
            convs.push(Conv2dLayer::new(
                in_channels,
                spec.out_channels,
                (spec.kernel_size, spec.kernel_size),
                (spec.stride, spec.stride),
                Activation::Relu,
                rng,
            ));
            in_channels = spec.out_channels;
        }

        let feature_shape = config.feature_shape()?;
        let features: usize = feature_shape.iter().product();
        let value_head = build_head(features, &config.hidden_sizes, 1, rng);
        let advantage_head = build_head(features, &config.hidden_sizes, config.num_actions, rng);

        Ok(DuelingNetwork {
            config,
            convs,
            value_head,
            advantage_head,
            feature_shape,
            trained_batch: None,
        })
    }

    pub fn config(&self) -> &DuelingNetConfig {
        &self.config
    }

    pub fn num_parameters(&self) -> usize {
        self.convs.iter().map(|l| l.num_parameters()).sum::<usize>()
            + self.value_head.iter().map(|l| l.num_parameters()).sum::<usize>()
            + self.advantage_head.iter().map(|l| l.num_parameters()).sum::<usize>()
    }

    fn check_input(&self, states: &ArrayView4<f32>) -> Result<()> {
        let (_, c, h, w) = states.dim();
        if [c, h, w] != self.config.input_shape {
            return Err(DqnError::dimension_mismatch(
                format!("states of shape {:?}", self.config.input_shape),
                format!("{:?}", [c, h, w]),
            ));
        }
        Ok(())
    }

    /// Every layer with its state-dict prefix, in parameter order.
    fn named_layers(&self) -> Vec<(String, &dyn LayerTrait)> {
        let mut layers: Vec<(String, &dyn LayerTrait)> = Vec::new();
        for (i, conv) in self.convs.iter().enumerate() {
            layers.push((format!("conv{}", i), conv as &dyn LayerTrait));
        }
        for (i, dense) in self.value_head.iter().enumerate() {
            layers.push((format!("value{}", i), dense as &dyn LayerTrait));
        }
        for (i, dense) in self.advantage_head.iter().enumerate() {
            layers.push((format!("advantage{}", i), dense as &dyn LayerTrait));
        }
        layers
    }
}

impl QNetwork for DuelingNetwork {
    fn num_actions(&self) -> usize {
        self.config.num_actions
    }

    fn forward(&self, states: ArrayView4<f32>) -> Result<Array2<f32>> {
        self.check_input(&states)?;

        let mut images = states.to_owned();
        for conv in &self.convs {
            images = conv.forward(images.view())?;
        }
        let features = flatten(&images);

        let mut value = features.clone();
        for layer in &self.value_head {
            value = layer.forward(value.view());
        }
        let mut advantage = features;
        for layer in &self.advantage_head {
            advantage = layer.forward(advantage.view());
        }
        Ok(combine(&value, &advantage))
    }

    fn forward_train(&mut self, states: ArrayView4<f32>) -> Result<Array2<f32>> {
        self.check_input(&states)?;

        let mut images = states.to_owned();
        for conv in &mut self.convs {
            images = conv.forward_train(images.view())?;
        }
        let features = flatten(&images);

        let mut value = features.clone();
        for layer in &mut self.value_head {
            value = layer.forward_train(value.view());
        }
        let mut advantage = features;
        for layer in &mut self.advantage_head {
            advantage = layer.forward_train(advantage.view());
        }

        self.trained_batch = Some(states.dim().0);
        Ok(combine(&value, &advantage))
    }

    fn backward(&mut self, grad_output: ArrayView2<f32>) -> Result<()> {
        let batch = self.trained_batch.ok_or_else(|| {
            DqnError::Training("backward called before forward_train".to_string())
        })?;
        if grad_output.dim() != (batch, self.config.num_actions) {
            return Err(DqnError::dimension_mismatch(
                format!("{:?}", (batch, self.config.num_actions)),
                format!("{:?}", grad_output.dim()),
            ));
        }

        // dQ/dV = 1 for every action; dQ/dA_j = delta_ij - 1/n
        let grad_value = grad_output.sum_axis(Axis(1)).insert_axis(Axis(1));
        let mean_grad = grad_output.sum_axis(Axis(1)) / self.config.num_actions as f32;
        let grad_advantage = &grad_output - &mean_grad.insert_axis(Axis(1));

        let mut grad_v = grad_value;
        for layer in self.value_head.iter_mut().rev() {
            grad_v = layer.backward(grad_v.view())?;
        }
        let mut grad_a = grad_advantage;
        for layer in self.advantage_head.iter_mut().rev() {
            grad_a = layer.backward(grad_a.view())?;
        }

        if !self.convs.is_empty() {
            let mut grad_images = unflatten(&(grad_v + grad_a), self.feature_shape);
            for conv in self.convs.iter_mut().rev() {
                grad_images = conv.backward(grad_images.view())?;
            }
        }
        Ok(())
    }

    fn zero_grad(&mut self) {
        self.convs.iter_mut().for_each(|l| l.zero_grad());
        self.value_head.iter_mut().for_each(|l| l.zero_grad());
        self.advantage_head.iter_mut().for_each(|l| l.zero_grad());
    }

    fn parameters_mut(&mut self) -> Vec<ParamSlot<'_>> {
        let mut slots = Vec::new();
        for conv in &mut self.convs {
            slots.extend(conv.parameters_mut());
        }
        for layer in &mut self.value_head {
            slots.extend(layer.parameters_mut());
        }
        for layer in &mut self.advantage_head {
            slots.extend(layer.parameters_mut());
        }
        slots
    }

    fn state_dict(&self) -> StateDict {
        let mut dict = StateDict::new();
        for (prefix, layer) in self.named_layers() {
            layer.export(&prefix, &mut dict);
        }
        dict
    }

    fn load_state_dict(&mut self, dict: &StateDict) -> Result<()> {
        let expected: usize = self
            .named_layers()
            .iter()
            .map(|(_, layer)| layer.parameter_names().len())
            .sum();
        if dict.len() != expected {
            return Err(DqnError::dimension_mismatch(
                format!("{} tensors", expected),
                format!("{} tensors", dict.len()),
            ));
        }

        // Validate everything against a scratch copy so a bad snapshot leaves
        // `self` untouched.
        let mut staged = self.clone();
        for (i, conv) in staged.convs.iter_mut().enumerate() {
            conv.import(&format!("conv{}", i), dict)?;
        }
        for (i, layer) in staged.value_head.iter_mut().enumerate() {
            layer.import(&format!("value{}", i), dict)?;
        }
        for (i, layer) in staged.advantage_head.iter_mut().enumerate() {
            layer.import(&format!("advantage{}", i), dict)?;
        }
        staged.trained_batch = None;
        *self = staged;
        Ok(())
    }
}
