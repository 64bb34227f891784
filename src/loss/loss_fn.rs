use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// A classification loss over a batch of per-class predictions and integer
/// labels aligned by row.
pub trait Loss {
    /// Mean per-example loss.
    fn forward(&self, predictions: &Matrix, labels: &[usize]) -> Result<f64>;

    /// Gradient of the mean loss with respect to `predictions`.
    fn backward(&self, predictions: &Matrix, labels: &[usize]) -> Result<Matrix>;
}

/// Rejects empty batches, row/label count disagreement and labels outside
/// `0..predictions.cols`.
pub(crate) fn check_batch(predictions: &Matrix, labels: &[usize]) -> Result<()> {
    if labels.is_empty() || predictions.rows == 0 {
        return Err(Error::EmptyBatch);
    }
    if predictions.rows != labels.len() {
        return Err(Error::shape(
            "predictions vs labels",
            format!("{} rows", labels.len()),
            format!("{} rows", predictions.rows),
        ));
    }
    if let Some((index, &label)) = labels.iter().enumerate().find(|(_, label)| **label >= predictions.cols) {
        return Err(Error::LabelOutOfRange { index, label, n_classes: predictions.cols });
    }
    Ok(())
}
