use log::debug;

use crate::data::loader::DataLoader;
use crate::error::{Error, Result};
use crate::layers::mode::Mode;
use crate::loss::loss_fn::Loss;
use crate::metric::accuracy::AccuracyMeter;
use crate::network::network::Network;
use crate::optim::optimizer::Optimizer;

/// Result of one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Mean of the per-batch losses.
    pub loss: f64,
    pub accuracy: AccuracyMeter,
}

/// Runs one full pass of mini-batch training and returns the mean of the
/// per-batch losses.
///
/// Per batch: tracked forward in `Mode::Train`, loss, `zero_grad`, backward,
/// optimizer step. Gradients are always cleared right before the backward
/// pass, so each step sees only its own batch.
pub fn train_epoch<O, L>(
    network: &mut Network,
    optimizer: &mut O,
    loss: &L,
    loader: &mut DataLoader<'_>,
    log_every: usize,
) -> Result<f64>
where
    O: Optimizer + ?Sized,
    L: Loss + ?Sized,
{
    let mut running_loss = 0.0;
    let mut n_batches = 0usize;

    for batch in loader.batches() {
        let output = network.forward(&batch.inputs, Mode::Train)?;
        let batch_loss = loss.forward(&output, &batch.labels)?;
        let grad_output = loss.backward(&output, &batch.labels)?;

        network.zero_grad();
        network.backward(&grad_output)?;
        optimizer.step(network)?;

        running_loss += batch_loss;
        n_batches += 1;

        if log_every > 0 && n_batches % log_every == 0 {
            debug!("batch {}: loss {:.4}", n_batches, batch_loss);
        }
    }

    if n_batches == 0 {
        return Err(Error::EmptyDataset);
    }
    Ok(running_loss / n_batches as f64)
}

/// Evaluates the network in `Mode::Eval` with gradient tracking disabled.
///
/// Losses are summed over batches and divided by the batch count; accuracy
/// is accumulated in an [`AccuracyMeter`]. Parameters are untouched.
pub fn evaluate<L>(network: &mut Network, loss: &L, loader: &mut DataLoader<'_>) -> Result<Evaluation>
where
    L: Loss + ?Sized,
{
    let mut scope = network.no_grad();
    let mut total_loss = 0.0;
    let mut n_batches = 0usize;
    let mut accuracy = AccuracyMeter::new();

    for batch in loader.batches() {
        let output = scope.forward(&batch.inputs, Mode::Eval)?;
        total_loss += loss.forward(&output, &batch.labels)?;
        accuracy.update(&output, &batch.labels)?;
        n_batches += 1;
    }

    if n_batches == 0 {
        return Err(Error::EmptyDataset);
    }
    Ok(Evaluation {
        loss: total_loss / n_batches as f64,
        accuracy,
    })
}
