use std::sync::mpsc;
use std::time::Instant;

use log::{info, warn};

use crate::data::loader::DataLoader;
use crate::error::Result;
use crate::loss::loss_fn::Loss;
use crate::network::network::Network;
use crate::optim::optimizer::Optimizer;
use crate::train::epoch_summary::{EpochSummary, TrainReport};
use crate::train::loop_fn::{evaluate, train_epoch, Evaluation};
use crate::train::train_config::TrainConfig;

/// Drives the epoch loop: a training pass followed by a validation pass,
/// then one [`EpochSummary`].
pub struct Trainer {
    pub config: TrainConfig,
    progress_tx: Option<mpsc::Sender<EpochSummary>>,
}

impl Trainer {
    pub fn new(config: TrainConfig) -> Trainer {
        Trainer { config, progress_tx: None }
    }

    /// Sends each epoch summary on `tx` as it is produced.
    pub fn with_progress(mut self, tx: mpsc::Sender<EpochSummary>) -> Trainer {
        self.progress_tx = Some(tx);
        self
    }

    /// Trains for `config.epochs` epochs and returns the summary history.
    /// The network keeps the final parameters.
    ///
    /// Any shape or label error aborts the run.
    pub fn fit<O, L>(
        &self,
        network: &mut Network,
        optimizer: &mut O,
        loss: &L,
        train: &mut DataLoader<'_>,
        valid: &mut DataLoader<'_>,
    ) -> Result<TrainReport>
    where
        O: Optimizer + ?Sized,
        L: Loss + ?Sized,
    {
        self.config.validate()?;
        let mut report = TrainReport::default();
        let mut progress = self.progress_tx.as_ref();

        info!(
            "training {} parameters for {} epochs ({} train / {} validation batches, lr {})",
            network.param_count(),
            self.config.epochs,
            train.num_batches(),
            valid.num_batches(),
            optimizer.learning_rate()
        );

        for epoch in 1..=self.config.epochs {
            let t_start = Instant::now();

            let train_loss = train_epoch(network, optimizer, loss, train, self.config.log_every)?;
            let Evaluation { loss: val_loss, accuracy } = evaluate(network, loss, valid)?;

            let summary = EpochSummary {
                epoch,
                total_epochs: self.config.epochs,
                train_loss,
                val_loss,
                val_accuracy: accuracy.mean_of_batches(),
                val_correct: accuracy.correct(),
                val_total: accuracy.total(),
                elapsed_ms: t_start.elapsed().as_millis() as u64,
            };

            info!(
                "Epoch: {}/{}.. Training Loss: {:.3}.. Test Loss: {:.3}.. Test Accuracy: {:.3}",
                summary.epoch, summary.total_epochs, summary.train_loss, summary.val_loss, summary.val_accuracy
            );

            publish(&mut progress, &summary);
            report.history.push(summary);
        }

        Ok(report)
    }

    /// Validation pass only.
    pub fn evaluate<L>(&self, network: &mut Network, loss: &L, loader: &mut DataLoader<'_>) -> Result<Evaluation>
    where
        L: Loss + ?Sized,
    {
        evaluate(network, loss, loader)
    }
}

/// Sends `summary` on the progress channel, if any. After the first failed
/// send the channel is forgotten, so a dropped receiver is reported once.
/// Returns true when this call is the one that gave up on the channel.
fn publish(progress: &mut Option<&mpsc::Sender<EpochSummary>>, summary: &EpochSummary) -> bool {
    match *progress {
        Some(tx) if tx.send(summary.clone()).is_err() => {
            warn!("progress receiver dropped; continuing without progress updates");
            *progress = None;
            true
        }
        _ => false,
    }
}
