use crate::activation::activation::{log_sum_exp, softmax};
use crate::error::Result;
use crate::loss::loss_fn::{check_batch, Loss};
use crate::math::matrix::Matrix;

/// Categorical cross-entropy over raw logits: a numerically stable
/// log-softmax followed by negative log-likelihood.
pub struct CrossEntropyLoss;

impl Loss for CrossEntropyLoss {
    /// `L = mean_i(logsumexp(z_i) - z_i[y_i])`
    fn forward(&self, predictions: &Matrix, labels: &[usize]) -> Result<f64> {
        check_batch(predictions, labels)?;
        let total: f64 = predictions
            .rows_iter()
            .zip(labels)
            .map(|(row, &y)| log_sum_exp(row) - row[y])
            .sum();
        Ok(total / labels.len() as f64)
    }

    /// With softmax and NLL composed the gradient simplifies to
    /// `(softmax(z) - onehot(y)) / n`.
    fn backward(&self, predictions: &Matrix, labels: &[usize]) -> Result<Matrix> {
        check_batch(predictions, labels)?;
        let inv_n = 1.0 / labels.len() as f64;
        let mut grad = Matrix::zeros(predictions.rows, predictions.cols);
        for (i, (row, &y)) in predictions.rows_iter().zip(labels).enumerate() {
            let probs = softmax(row);
            for (j, p) in probs.into_iter().enumerate() {
                let target = if j == y { 1.0 } else { 0.0 };
                grad.set(i, j, (p - target) * inv_n);
            }
        }
        Ok(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::loss::nll::NllLoss;
    use approx::assert_abs_diff_eq;

    #[test]
    fn equals_nll_of_log_softmax() {
        let logits = Matrix::from_rows(&[vec![2.0, -1.0, 0.5], vec![0.0, 0.0, 3.0]]);
        let labels = [0, 1];
        let log_probs = ActivationFunction::LogSoftmax.forward(&logits);

        let ce = CrossEntropyLoss.forward(&logits, &labels).unwrap();
        let nll = NllLoss.forward(&log_probs, &labels).unwrap();
        assert_abs_diff_eq!(ce, nll, epsilon = 1e-12);
    }

    #[test]
    fn uniform_logits_give_log_n_classes() {
        let logits = Matrix::zeros(4, 10);
        let loss = CrossEntropyLoss.forward(&logits, &[0, 3, 7, 9]).unwrap();
        assert_abs_diff_eq!(loss, 10f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let logits = Matrix::from_rows(&[vec![0.3, -0.7, 1.1], vec![-0.2, 0.4, 0.0]]);
        let labels = [2, 0];
        let grad = CrossEntropyLoss.backward(&logits, &labels).unwrap();

        let h = 1e-6;
        for i in 0..2 {
            for j in 0..3 {
                let mut plus = logits.clone();
                plus.set(i, j, logits.get(i, j) + h);
                let mut minus = logits.clone();
                minus.set(i, j, logits.get(i, j) - h);
                let numeric = (CrossEntropyLoss.forward(&plus, &labels).unwrap()
                    - CrossEntropyLoss.forward(&minus, &labels).unwrap())
                    / (2.0 * h);
                assert_abs_diff_eq!(grad.get(i, j), numeric, epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn huge_logits_stay_finite() {
        let logits = Matrix::from_rows(&[vec![1000.0, -1000.0]]);
        let loss = CrossEntropyLoss.forward(&logits, &[1]).unwrap();
        assert!(loss.is_finite());
        assert_abs_diff_eq!(loss, 2000.0, epsilon = 1e-9);
    }
}
