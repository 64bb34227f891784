use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::loss::{cross_entropy::CrossEntropyLoss, loss_fn::Loss, nll::NllLoss};
use crate::math::matrix::Matrix;

/// Selects which loss function the training loop uses.
///
/// - `Nll`         : negative log-likelihood; pair with a LogSoftmax output.
/// - `CrossEntropy`: log-softmax + NLL on raw logits; pair with an Identity
///   output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Nll,
    CrossEntropy,
}

impl Loss for LossType {
    fn forward(&self, predictions: &Matrix, labels: &[usize]) -> Result<f64> {
        match self {
            LossType::Nll          => NllLoss.forward(predictions, labels),
            LossType::CrossEntropy => CrossEntropyLoss.forward(predictions, labels),
        }
    }

    fn backward(&self, predictions: &Matrix, labels: &[usize]) -> Result<Matrix> {
        match self {
            LossType::Nll          => NllLoss.backward(predictions, labels),
            LossType::CrossEntropy => CrossEntropyLoss.backward(predictions, labels),
        }
    }
}
