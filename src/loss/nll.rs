use crate::error::Result;
use crate::loss::loss_fn::{check_batch, Loss};
use crate::math::matrix::Matrix;

/// Negative log-likelihood over log-probabilities.
pub struct NllLoss;

impl Loss for NllLoss {
    /// `L = -mean_i(pred[i, y_i])`
    fn forward(&self, predictions: &Matrix, labels: &[usize]) -> Result<f64> {
        check_batch(predictions, labels)?;
        let total: f64 = labels
            .iter()
            .enumerate()
            .map(|(i, &y)| -predictions.get(i, y))
            .sum();
        Ok(total / labels.len() as f64)
    }

    /// `-1/n` at each true class, zero elsewhere.
    fn backward(&self, predictions: &Matrix, labels: &[usize]) -> Result<Matrix> {
        check_batch(predictions, labels)?;
        let mut grad = Matrix::zeros(predictions.rows, predictions.cols);
        let scale = -1.0 / labels.len() as f64;
        for (i, &y) in labels.iter().enumerate() {
            grad.set(i, y, scale);
        }
        Ok(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use approx::assert_abs_diff_eq;

    #[test]
    fn picks_true_class_log_probability() {
        let preds = Matrix::from_rows(&[
            vec![0.5f64.ln(), 0.25f64.ln(), 0.25f64.ln()],
            vec![0.1f64.ln(), 0.8f64.ln(), 0.1f64.ln()],
        ]);
        let loss = NllLoss.forward(&preds, &[0, 1]).unwrap();
        assert_abs_diff_eq!(loss, -(0.5f64.ln() + 0.8f64.ln()) / 2.0, epsilon = 1e-12);
        assert!(loss >= 0.0);
    }

    #[test]
    fn gradient_only_touches_true_classes() {
        let preds = Matrix::zeros(2, 3);
        let grad = NllLoss.backward(&preds, &[2, 0]).unwrap();
        assert_eq!(grad.data, vec![0.0, 0.0, -0.5, -0.5, 0.0, 0.0]);
    }

    #[test]
    fn label_count_must_match_rows() {
        let preds = Matrix::zeros(3, 10);
        assert!(matches!(NllLoss.forward(&preds, &[1, 2]), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn labels_must_be_valid_class_indices() {
        let preds = Matrix::zeros(2, 10);
        match NllLoss.forward(&preds, &[3, 10]) {
            Err(Error::LabelOutOfRange { index, label, n_classes }) => {
                assert_eq!((index, label, n_classes), (1, 10, 10));
            }
            other => panic!("expected LabelOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(NllLoss.forward(&Matrix::zeros(0, 10), &[]), Err(Error::EmptyBatch)));
    }
}
