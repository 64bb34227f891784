//! Top-1 accuracy over batches of per-class scores.
//!
//! Scores can be probabilities, log-probabilities or logits: each is a
//! monotonic transform of the others, so the argmax is the same.

use crate::error::Result;
use crate::loss::loss_fn::check_batch;
use crate::math::matrix::Matrix;

/// Index of the maximum element. Ties resolve to the first maximal index;
/// NaNs are never selected unless every entry is NaN. Returns 0 for an empty
/// slice.
pub fn argmax(v: &[f64]) -> usize {
    let mut best = 0;
    for (i, &x) in v.iter().enumerate() {
        if x > v[best] || (v[best].is_nan() && !x.is_nan()) {
            best = i;
        }
    }
    best
}

/// Ordering key for scores: NaN sorts below every number.
fn rank_key(x: f64) -> f64 {
    if x.is_nan() { f64::NEG_INFINITY } else { x }
}

/// Per-row `k` largest values and their column indices, descending. Equal
/// values keep their column order and NaNs come last, so `top_k(scores, 1)`
/// agrees with [`top1`].
pub fn top_k(scores: &Matrix, k: usize) -> (Matrix, Vec<Vec<usize>>) {
    let k = k.min(scores.cols);
    let mut values = Matrix::zeros(scores.rows, k);
    let mut indices = Vec::with_capacity(scores.rows);

    for (r, row) in scores.rows_iter().enumerate() {
        let mut order: Vec<usize> = (0..row.len()).collect();
        // Stable sort, so ties keep ascending column order.
        order.sort_by(|&a, &b| rank_key(row[b]).total_cmp(&rank_key(row[a])));
        order.truncate(k);
        for (c, &idx) in order.iter().enumerate() {
            values.set(r, c, row[idx]);
        }
        indices.push(order);
    }

    (values, indices)
}

/// Predicted class per row.
pub fn top1(scores: &Matrix) -> Vec<usize> {
    scores.rows_iter().map(argmax).collect()
}

/// Element-wise `predicted == labels`.
pub fn equals(predicted: &[usize], labels: &[usize]) -> Vec<bool> {
    predicted.iter().zip(labels).map(|(p, l)| p == l).collect()
}

/// Mean of a boolean vector after mapping `true → 1.0`, `false → 0.0`.
/// An empty vector has mean 0.
pub fn mean_bool(matches: &[bool]) -> f64 {
    if matches.is_empty() {
        return 0.0;
    }
    let ones: f64 = matches.iter().map(|&m| if m { 1.0 } else { 0.0 }).sum();
    ones / matches.len() as f64
}

/// Fraction of rows whose top-1 class equals the label, in `[0, 1]`.
pub fn batch_accuracy(scores: &Matrix, labels: &[usize]) -> Result<f64> {
    check_batch(scores, labels)?;
    Ok(mean_bool(&equals(&top1(scores), labels)))
}

/// Accumulates accuracy across the batches of one evaluation pass.
///
/// Two epoch-level figures are available. `mean_of_batches()` averages the
/// per-batch accuracies, which weights a short final batch as heavily as a
/// full one. `global()` is the exact `correct / total` ratio. The two agree
/// whenever every batch has the same size.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccuracyMeter {
    batch_sum: f64,
    batches: usize,
    correct: usize,
    total: usize,
}

impl AccuracyMeter {
    pub fn new() -> AccuracyMeter {
        AccuracyMeter::default()
    }

    /// Scores one batch and returns its accuracy.
    pub fn update(&mut self, scores: &Matrix, labels: &[usize]) -> Result<f64> {
        check_batch(scores, labels)?;
        let matches = equals(&top1(scores), labels);
        let accuracy = mean_bool(&matches);

        self.batch_sum += accuracy;
        self.batches += 1;
        self.correct += matches.iter().filter(|&&m| m).count();
        self.total += matches.len();
        Ok(accuracy)
    }

    pub fn mean_of_batches(&self) -> f64 {
        if self.batches == 0 {
            return 0.0;
        }
        self.batch_sum / self.batches as f64
    }

    pub fn global(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.correct as f64 / self.total as f64
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn batches(&self) -> usize {
        self.batches
    }
}
