use serde::{Serialize, Deserialize};

use crate::error::Result;

/// Per-epoch training statistics.
///
/// Created once at the end of each epoch and never modified afterwards.
/// When the trainer has a progress channel it also sends a copy there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean of the per-batch training losses.
    pub train_loss: f64,
    /// Mean of the per-batch validation losses.
    pub val_loss: f64,
    /// Mean of the per-batch validation accuracies, in [0, 1].
    pub val_accuracy: f64,
    /// Correctly classified validation examples.
    pub val_correct: usize,
    /// Validation examples seen.
    pub val_total: usize,
    /// Wall-clock duration of this epoch (training and validation) in milliseconds.
    pub elapsed_ms: u64,
}

impl EpochSummary {
    /// Exact `correct / total` validation accuracy. Differs from
    /// `val_accuracy` when the last validation batch is short.
    pub fn val_accuracy_exact(&self) -> f64 {
        if self.val_total == 0 {
            return 0.0;
        }
        self.val_correct as f64 / self.val_total as f64
    }
}

/// Outcome of `Trainer::fit`: one summary per completed epoch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub history: Vec<EpochSummary>,
}

impl TrainReport {
    pub fn last(&self) -> Option<&EpochSummary> {
        self.history.last()
    }

    /// Epoch with the lowest validation loss.
    pub fn best_by_val_loss(&self) -> Option<&EpochSummary> {
        self.history
            .iter()
            .min_by(|a, b| a.val_loss.partial_cmp(&b.val_loss).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}
