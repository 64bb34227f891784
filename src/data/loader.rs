use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::dataset::Dataset;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Inputs `(n, n_features)` and the `n` labels aligned with them by row.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub inputs: Matrix,
    pub labels: Vec<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Restartable source of fixed-size batches over a dataset.
///
/// Every call to [`DataLoader::batches`] is one full pass. With `shuffle`
/// on, each pass draws a fresh permutation; the final batch holds the
/// remainder and may be shorter than `batch_size`.
pub struct DataLoader<'a> {
    dataset: &'a Dataset,
    batch_size: usize,
    shuffle: bool,
    rng: StdRng,
}

impl<'a> DataLoader<'a> {
    pub fn new(dataset: &'a Dataset, batch_size: usize, shuffle: bool, seed: u64) -> Result<DataLoader<'a>> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".to_owned()));
        }
        if dataset.is_empty() {
            return Err(Error::EmptyDataset);
        }
        Ok(DataLoader {
            dataset,
            batch_size,
            shuffle,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Batches per pass: `ceil(len / batch_size)`.
    pub fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    /// Starts a new pass.
    pub fn batches(&mut self) -> Batches<'a> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            order.shuffle(&mut self.rng);
        }
        Batches {
            dataset: self.dataset,
            order,
            batch_size: self.batch_size,
            cursor: 0,
        }
    }
}

/// One pass over a [`DataLoader`].
pub struct Batches<'a> {
    dataset: &'a Dataset,
    order: Vec<usize>,
    batch_size: usize,
    cursor: usize,
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = self.cursor + self.batch_size.min(self.order.len() - self.cursor);
        let indices = &self.order[self.cursor..end];
        self.cursor = end;

        let n_features = self.dataset.n_features();
        let mut data = Vec::with_capacity(indices.len() * n_features);
        let mut labels = Vec::with_capacity(indices.len());
        for &idx in indices {
            data.extend_from_slice(self.dataset.features(idx));
            labels.push(self.dataset.label(idx));
        }

        Some(Batch {
            inputs: Matrix::from_vec(indices.len(), n_features, data),
            labels,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.order.len() - self.cursor;
        let n = remaining.div_ceil(self.batch_size);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Batches<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_dataset(n: usize) -> Dataset {
        let inputs: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64]).collect();
        let labels: Vec<usize> = (0..n).map(|i| i % 10).collect();
        Dataset::from_examples(&inputs, &labels, 10).unwrap()
    }

    #[test]
    fn last_batch_holds_the_remainder() {
        let ds = counting_dataset(150);
        let mut loader = DataLoader::new(&ds, 64, false, 0).unwrap();
        let sizes: Vec<usize> = loader.batches().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![64, 64, 22]);
        assert_eq!(loader.num_batches(), 3);
        assert_eq!(loader.batches().len(), 3);
    }

    #[test]
    fn unshuffled_passes_are_identical_and_ordered() {
        let ds = counting_dataset(10);
        let mut loader = DataLoader::new(&ds, 4, false, 0).unwrap();
        let first: Vec<Batch> = loader.batches().collect();
        let second: Vec<Batch> = loader.batches().collect();
        assert_eq!(first, second);
        assert_eq!(first[0].inputs.data, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn shuffled_passes_cover_every_example_once_in_new_orders() {
        let ds = counting_dataset(200);
        let mut loader = DataLoader::new(&ds, 32, true, 7).unwrap();

        fn pass(loader: &mut DataLoader<'_>) -> Vec<f64> {
            loader.batches().flat_map(|b| b.inputs.data).collect()
        }
        let a = pass(&mut loader);
        let b = pass(&mut loader);
        assert_ne!(a, b);

        let mut sorted = a.clone();
        sorted.sort_by(|x, y| x.partial_cmp(y).unwrap());
        assert_eq!(sorted, (0..200).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn labels_stay_aligned_with_inputs() {
        let ds = counting_dataset(50);
        let mut loader = DataLoader::new(&ds, 8, true, 3).unwrap();
        for batch in loader.batches() {
            for (row, &label) in batch.inputs.rows_iter().zip(&batch.labels) {
                assert_eq!(row[0] as usize % 10, label);
            }
        }
    }

    #[test]
    fn oversized_batch_yields_one_batch() {
        let ds = counting_dataset(5);
        for batch_size in [6, usize::MAX] {
            let mut loader = DataLoader::new(&ds, batch_size, true, 2).unwrap();
            assert_eq!(loader.num_batches(), 1);
            let batches = loader.batches();
            assert_eq!(batches.len(), 1);
            let sizes: Vec<usize> = batches.map(|b| b.len()).collect();
            assert_eq!(sizes, vec![5]);
        }
    }

    #[test]
    fn rejects_zero_batch_size_and_empty_data() {
        let ds = counting_dataset(3);
        assert!(DataLoader::new(&ds, 0, false, 0).is_err());
        let empty = Dataset::from_examples(&[], &[], 10).unwrap();
        assert!(matches!(DataLoader::new(&empty, 4, false, 0), Err(Error::EmptyDataset)));
    }
}
