use ndarray::{ArrayD, Zip};
use serde::{Serialize, Deserialize};

use crate::layers::ParamSlot;

/// Applies one update to a set of parameters from their accumulated gradients.
///
/// The slots must be passed in the same order on every call; per-parameter
/// state is matched by position.
pub trait Optimizer {
    fn step(&mut self, params: Vec<ParamSlot<'_>>);

    fn learning_rate(&self) -> f32;
}

/// Adam with bias-corrected first and second moment estimates
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Adam {
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    /// Number of steps taken so far
    pub t: u32,
    m: Vec<ArrayD<f32>>,
    v: Vec<ArrayD<f32>>,
}

impl Adam {
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    /// Adam with the usual `beta1 = 0.9`, `beta2 = 0.999`, `epsilon = 1e-8`
    pub fn with_learning_rate(learning_rate: f32) -> Self {
        Self::new(learning_rate, 0.9, 0.999, 1e-8)
    }

    fn ensure_state(&mut self, params: &[ParamSlot<'_>]) {
        let matches = self.m.len() == params.len()
            && self.m.iter().zip(params).all(|(m, p)| m.shape() == p.value.shape());
        if !matches {
            self.m = params.iter().map(|p| ArrayD::zeros(p.value.raw_dim())).collect();
            self.v = params.iter().map(|p| ArrayD::zeros(p.value.raw_dim())).collect();
            self.t = 0;
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, mut params: Vec<ParamSlot<'_>>) {
        self.ensure_state(&params);
        self.t += 1;

        let (beta1, beta2, eps, lr) = (self.beta1, self.beta2, self.epsilon, self.learning_rate);
        let bias1 = 1.0 - beta1.powi(self.t as i32);
        let bias2 = 1.0 - beta2.powi(self.t as i32);

        for ((slot, m), v) in params.iter_mut().zip(self.m.iter_mut()).zip(self.v.iter_mut()) {
            Zip::from(&mut slot.value)
                .and(&slot.grad)
                .and(m)
                .and(v)
                .for_each(|p, &g, m, v| {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    let m_hat = *m / bias1;
                    let v_hat = *v / bias2;
                    *p -= lr * m_hat / (v_hat.sqrt() + eps);
                });
        }
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}
