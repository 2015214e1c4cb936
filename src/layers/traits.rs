use std::collections::BTreeMap;

use ndarray::{Array, ArrayD, ArrayViewD, ArrayViewMutD, Dimension};

use crate::error::{DqnError, Result};

/// Named parameter tensors of a model, keyed by `"<layer>.<param>"`.
///
/// This is the only snapshot format in the crate: target-network
/// synchronization and on-disk checkpoints both go through it.
pub type StateDict = BTreeMap<String, ArrayD<f32>>;

/// A trainable tensor together with its accumulated gradient.
#[derive(Clone, Debug)]
pub struct Parameter<D: Dimension> {
    pub value: Array<f32, D>,
    pub grad: Array<f32, D>,
}

/// Borrowed, dimension-erased view of a parameter handed to an optimizer.
pub struct ParamSlot<'a> {
    pub value: ArrayViewMutD<'a, f32>,
    pub grad: ArrayViewD<'a, f32>,
}

impl<D: Dimension> Parameter<D> {
    pub fn new(value: Array<f32, D>) -> Self {
        let grad = Array::zeros(value.raw_dim());
        Parameter { value, grad }
    }

    pub fn zero_grad(&mut self) {
        self.grad.fill(0.0);
    }

    /// Add `gradient` to the stored gradient (gradients accumulate until `zero_grad`).
    pub fn accumulate(&mut self, gradient: &Array<f32, D>) {
        self.grad += gradient;
    }

    pub fn slot(&mut self) -> ParamSlot<'_> {
        ParamSlot {
            value: self.value.view_mut().into_dyn(),
            grad: self.grad.view().into_dyn(),
        }
    }

    pub fn export(&self, name: String, dict: &mut StateDict) {
        dict.insert(name, self.value.clone().into_dyn());
    }

    /// Overwrite the value with the tensor stored under `name`.
    pub fn import(&mut self, name: &str, dict: &StateDict) -> Result<()> {
        let tensor = dict
            .get(name)
            .ok_or_else(|| DqnError::invalid_parameter(name, "missing from state dict"))?;
        if tensor.shape() != self.value.shape() {
            return Err(DqnError::dimension_mismatch(
                format!("{} with shape {:?}", name, self.value.shape()),
                format!("{:?}", tensor.shape()),
            ));
        }
        self.value.view_mut().into_dyn().assign(tensor);
        Ok(())
    }
}

/// Trait defining the parameter bookkeeping shared by every layer
pub trait Layer {
    /// Parameter names relative to the layer, in a fixed order
    fn parameter_names(&self) -> &'static [&'static str];

    /// Mutable views of all parameters, in `parameter_names` order
    fn parameters_mut(&mut self) -> Vec<ParamSlot<'_>>;

    /// Reset accumulated gradients to zero
    fn zero_grad(&mut self);

    /// Write every parameter into `dict` under `<prefix>.<name>`
    fn export(&self, prefix: &str, dict: &mut StateDict);

    /// Read every parameter from `dict`; fails on missing names or shape mismatches
    fn import(&mut self, prefix: &str, dict: &StateDict) -> Result<()>;

    /// Total number of scalar parameters
    fn num_parameters(&self) -> usize;
}
