//! 2D convolution for image-shaped states.
//!
//! Convolution is computed by unrolling every receptive field into a row of a
//! column matrix (im2col) and multiplying it with the flattened kernels, so
//! both passes reduce to a couple of matrix products.

use ndarray::{Array1, Array2, Array4, ArrayView4, Axis, Ix1, Ix2};
use rand::Rng;

use crate::activations::Activation;
use crate::error::{DqnError, Result};
use super::initialization::WeightInit;
use super::traits::{Layer as LayerTrait, ParamSlot, Parameter, StateDict};

/// 2D Convolutional Layer without padding.
///
/// Input and output are `[batch, channels, height, width]`.
#[derive(Clone, Debug)]
pub struct Conv2dLayer {
    /// Kernels flattened to `[out_channels, in_channels * kernel_h * kernel_w]`
    pub kernels: Parameter<Ix2>,

    /// Bias terms for each output channel
    pub biases: Parameter<Ix1>,

    pub activation: Activation,
    pub stride: (usize, usize),
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: (usize, usize),

    cache: Option<ConvCache>,
}

#[derive(Clone, Debug)]
struct ConvCache {
    columns: Array2<f32>,
    pre_activation: Array4<f32>,
    input_dim: (usize, usize, usize, usize),
}

impl Conv2dLayer {
    pub fn new<R: Rng + ?Sized>(
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize),
        stride: (usize, usize),
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let receptive_field = in_channels * kernel_size.0 * kernel_size.1;
        let kernels = WeightInit::for_activation(&activation).initialize(
            (out_channels, receptive_field),
            receptive_field,
            rng,
        );

        Conv2dLayer {
            kernels: Parameter::new(kernels),
            biases: Parameter::new(Array1::zeros(out_channels)),
            activation,
            stride,
            in_channels,
            out_channels,
            kernel_size,
            cache: None,
        }
    }

    /// Spatial output size for an input of `height x width`, or `None` when
    /// the kernel does not fit.
    pub fn output_size(&self, height: usize, width: usize) -> Option<(usize, usize)> {
        if height < self.kernel_size.0 || width < self.kernel_size.1 {
            return None;
        }
        Some((
            (height - self.kernel_size.0) / self.stride.0 + 1,
            (width - self.kernel_size.1) / self.stride.1 + 1,
        ))
    }

    fn checked_output_size(&self, input_dim: (usize, usize, usize, usize)) -> Result<(usize, usize)> {
        let (_, channels, height, width) = input_dim;
        if channels != self.in_channels {
            return Err(DqnError::dimension_mismatch(
                format!("{} input channels", self.in_channels),
                format!("{} channels", channels),
            ));
        }
        self.output_size(height, width).ok_or_else(|| {
            DqnError::dimension_mismatch(
                format!("input of at least {:?}", self.kernel_size),
                format!("{}x{}", height, width),
            )
        })
    }

    /// Unroll every receptive field of `input` into one row.
    fn im2col(&self, input: ArrayView4<f32>, out_h: usize, out_w: usize) -> Array2<f32> {
        let (batch, channels, _, _) = input.dim();
        let (kh, kw) = self.kernel_size;
        let mut columns = Array2::zeros((batch * out_h * out_w, channels * kh * kw));

        for b in 0..batch {
            for y in 0..out_h {
                for x in 0..out_w {
                    let row = (b * out_h + y) * out_w + x;
                    let (y0, x0) = (y * self.stride.0, x * self.stride.1);
                    let mut col = 0;
                    for c in 0..channels {
                        for ky in 0..kh {
                            for kx in 0..kw {
                                columns[[row, col]] = input[[b, c, y0 + ky, x0 + kx]];
                                col += 1;
                            }
                        }
                    }
                }
            }
        }
        columns
    }

    /// Scatter-add column gradients back onto the input grid.
    fn col2im(&self, columns: &Array2<f32>, input_dim: (usize, usize, usize, usize), out_h: usize, out_w: usize) -> Array4<f32> {
        let (batch, channels, _, _) = input_dim;
        let (kh, kw) = self.kernel_size;
        let mut grid = Array4::zeros(input_dim);

        for b in 0..batch {
            for y in 0..out_h {
                for x in 0..out_w {
                    let row = (b * out_h + y) * out_w + x;
                    let (y0, x0) = (y * self.stride.0, x * self.stride.1);
                    let mut col = 0;
                    for c in 0..channels {
                        for ky in 0..kh {
                            for kx in 0..kw {
                                grid[[b, c, y0 + ky, x0 + kx]] += columns[[row, col]];
                                col += 1;
                            }
                        }
                    }
                }
            }
        }
        grid
    }

    fn convolve(&self, input: ArrayView4<f32>) -> Result<(Array2<f32>, Array4<f32>)> {
        let (out_h, out_w) = self.checked_output_size(input.dim())?;
        let batch = input.dim().0;
        let columns = self.im2col(input, out_h, out_w);
        let flat = columns.dot(&self.kernels.value.t()) + &self.biases.value;

        let per_image = out_h * out_w;
        let pre_activation = Array4::from_shape_fn((batch, self.out_channels, out_h, out_w), |(b, o, y, x)| {
            flat[[b * per_image + y * out_w + x, o]]
        });
        Ok((columns, pre_activation))
    }

    /// Forward pass for a batch of images without caching anything.
    pub fn forward(&self, input: ArrayView4<f32>) -> Result<Array4<f32>> {
        let (_, mut output) = self.convolve(input)?;
        self.activation.apply(&mut output);
        Ok(output)
    }

    /// Forward pass that keeps what `backward` needs.
    pub fn forward_train(&mut self, input: ArrayView4<f32>) -> Result<Array4<f32>> {
        let (columns, pre_activation) = self.convolve(input)?;
        let mut output = pre_activation.clone();
        self.activation.apply(&mut output);
        self.cache = Some(ConvCache {
            columns,
            pre_activation,
            input_dim: input.dim(),
        });
        Ok(output)
    }

    /// Accumulate kernel and bias gradients and return dL/d input.
    pub fn backward(&mut self, output_gradient: ArrayView4<f32>) -> Result<Array4<f32>> {
        let cache = self.cache.as_ref().ok_or_else(|| {
            DqnError::Training("conv backward called before forward_train".to_string())
        })?;
        if output_gradient.dim() != cache.pre_activation.dim() {
            return Err(DqnError::dimension_mismatch(
                format!("{:?}", cache.pre_activation.dim()),
                format!("{:?}", output_gradient.dim()),
            ));
        }

        let (batch, _, out_h, out_w) = cache.pre_activation.dim();
        let adjusted = &output_gradient * &self.activation.derivative(cache.pre_activation.view());
        let per_image = out_h * out_w;
        let flat_grad = Array2::from_shape_fn((batch * per_image, self.out_channels), |(row, o)| {
            let rem = row % per_image;
            adjusted[[row / per_image, o, rem / out_w, rem % out_w]]
        });

        let kernel_gradients = flat_grad.t().dot(&cache.columns);
        let bias_gradients = flat_grad.sum_axis(Axis(0));
        let column_gradients = flat_grad.dot(&self.kernels.value);
        let input_gradients = self.col2im(&column_gradients, cache.input_dim, out_h, out_w);

        self.kernels.accumulate(&kernel_gradients);
        self.biases.accumulate(&bias_gradients);
        Ok(input_gradients)
    }
}

impl LayerTrait for Conv2dLayer {
    fn parameter_names(&self) -> &'static [&'static str] {
        &["weight", "bias"]
    }

    fn parameters_mut(&mut self) -> Vec<ParamSlot<'_>> {
        vec![self.kernels.slot(), self.biases.slot()]
    }

    fn zero_grad(&mut self) {
        self.kernels.zero_grad();
        self.biases.zero_grad();
    }

    fn export(&self, prefix: &str, dict: &mut StateDict) {
        self.kernels.export(format!("{}.weight", prefix), dict);
        self.biases.export(format!("{}.bias", prefix), dict);
    }

    fn import(&mut self, prefix: &str, dict: &StateDict) -> Result<()> {
        self.kernels.import(&format!("{}.weight", prefix), dict)?;
        self.biases.import(&format!("{}.bias", prefix), dict)
    }

    fn num_parameters(&self) -> usize {
        self.kernels.value.len() + self.biases.value.len()
    }
}
