use serde::{Serialize, Deserialize};

use crate::error::{DqnError, Result};

/// One square convolution of the feature extractor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvSpec {
    pub out_channels: usize,
    pub kernel_size: usize,
    pub stride: usize,
}

impl ConvSpec {
    pub fn new(out_channels: usize, kernel_size: usize, stride: usize) -> Self {
        ConvSpec { out_channels, kernel_size, stride }
    }
}

/// Layout of a [`DuelingNetwork`](super::DuelingNetwork).
///
/// States are `[channels, height, width]`. The convolutions run first (ReLU,
/// no padding); their flattened output feeds two heads of `hidden_sizes`
/// ReLU layers each, ending in a single state value and in one advantage per
/// action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelingNetConfig {
    pub input_shape: [usize; 3],
    pub num_actions: usize,
    pub conv_layers: Vec<ConvSpec>,
    pub hidden_sizes: Vec<usize>,
}

impl DuelingNetConfig {
    /// The classic layout for a single 84x84 grayscale frame.
    pub fn atari(num_actions: usize) -> Self {
        DuelingNetConfig {
            input_shape: [1, 84, 84],
            num_actions,
            conv_layers: vec![
                ConvSpec::new(32, 8, 4),
                ConvSpec::new(64, 4, 2),
                ConvSpec::new(64, 3, 1),
            ],
            hidden_sizes: vec![1024, 1024],
        }
    }

    /// Shape `[channels, height, width]` after the last convolution.
    pub fn feature_shape(&self) -> Result<[usize; 3]> {
        let [mut channels, mut height, mut width] = self.input_shape;
        for (i, conv) in self.conv_layers.iter().enumerate() {
            if conv.kernel_size == 0 || conv.stride == 0 || conv.out_channels == 0 {
                return Err(DqnError::invalid_parameter(
                    format!("conv_layers[{}]", i),
                    "kernel_size, stride and out_channels must be > 0".to_string(),
                ));
            }
            if height < conv.kernel_size || width < conv.kernel_size {
                return Err(DqnError::dimension_mismatch(
                    format!("conv_layers[{}] input of at least {}x{}", i, conv.kernel_size, conv.kernel_size),
                    format!("{}x{}", height, width),
                ));
            }
            height = (height - conv.kernel_size) / conv.stride + 1;
            width = (width - conv.kernel_size) / conv.stride + 1;
            channels = conv.out_channels;
        }
        Ok([channels, height, width])
    }

    /// Number of features entering each head.
    pub fn feature_size(&self) -> Result<usize> {
        Ok(self.feature_shape()?.iter().product())
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_shape.iter().any(|&d| d == 0) {
            return Err(DqnError::invalid_parameter(
                "input_shape".to_string(),
                format!("all dimensions must be > 0, got {:?}", self.input_shape),
            ));
        }
        if self.num_actions == 0 {
            return Err(DqnError::invalid_parameter("num_actions", "must be > 0"));
        }
        if self.hidden_sizes.iter().any(|&h| h == 0) {
            return Err(DqnError::invalid_parameter("hidden_sizes", "every layer must have > 0 units"));
        }
        self.feature_shape().map(|_| ())
    }
}
