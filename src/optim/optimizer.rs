use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::optim::{adam::Adam, sgd::Sgd};

/// Applies parameter updates from the gradients stored in a network.
///
/// `step` is the only place parameters change. It fails with
/// `Error::NoGradients` when no backward pass has been accumulated since the
/// last `zero_grad`.
pub trait Optimizer {
    fn step(&mut self, network: &mut Network) -> Result<()>;

    fn learning_rate(&self) -> f64;
}

/// Serializable optimizer choice, as stored in run configs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizerConfig {
    Sgd {
        learning_rate: f64,
        #[serde(default)]
        momentum: f64,
    },
    Adam {
        learning_rate: f64,
    },
}

impl OptimizerConfig {
    pub fn learning_rate(&self) -> f64 {
        match *self {
            OptimizerConfig::Sgd { learning_rate, .. } => learning_rate,
            OptimizerConfig::Adam { learning_rate } => learning_rate,
        }
    }

    pub fn with_learning_rate(self, lr: f64) -> OptimizerConfig {
        match self {
            OptimizerConfig::Sgd { momentum, .. } => OptimizerConfig::Sgd { learning_rate: lr, momentum },
            OptimizerConfig::Adam { .. } => OptimizerConfig::Adam { learning_rate: lr },
        }
    }

    pub fn build(&self) -> Result<Box<dyn Optimizer>> {
        let lr = self.learning_rate();
        if !(lr > 0.0 && lr.is_finite()) {
            return Err(Error::InvalidConfig(format!("learning rate must be positive, got {}", lr)));
        }
        Ok(match *self {
            OptimizerConfig::Sgd { learning_rate, momentum } => {
                if !(0.0..1.0).contains(&momentum) {
                    return Err(Error::InvalidConfig(format!("momentum must lie in [0, 1), got {}", momentum)));
                }
                Box::new(Sgd::with_momentum(learning_rate, momentum))
            }
            OptimizerConfig::Adam { learning_rate } => Box::new(Adam::new(learning_rate)),
        })
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Adam { learning_rate: 0.003 }
    }
}

/// Computes one `(weights_delta, biases_delta)` pair per layer from the
/// stored gradients, then subtracts them from the parameters.
pub(crate) fn apply_with<F>(network: &mut Network, mut delta: F) -> Result<()>
where
    F: FnMut(usize, &Matrix, &Matrix) -> (Matrix, Matrix),
{
    let grads = network.gradients();
    if grads.is_empty() {
        return Err(Error::NoGradients);
    }

    let deltas: Vec<(Matrix, Matrix)> = grads
        .iter()
        .enumerate()
        .map(|(i, g)| delta(i, &g.weights, &g.biases))
        .collect();

    for (i, (w_delta, b_delta)) in deltas.iter().enumerate() {
        network.apply_update(i, w_delta, b_delta);
    }
    Ok(())
}

impl<O: Optimizer + ?Sized> Optimizer for Box<O> {
    fn step(&mut self, network: &mut Network) -> Result<()> {
        (**self).step(network)
    }

    fn learning_rate(&self) -> f64 {
        (**self).learning_rate()
    }
}
