use serde::{Serialize, Deserialize};

use crate::data::{dataset::Dataset, loader::DataLoader};
use crate::error::{Error, Result};

/// Hyperparameters of the training loop itself.
///
/// # Fields
/// - `epochs`    : total number of full passes over the training data
/// - `batch_size`: examples per mini-batch; the last batch may be shorter
/// - `shuffle`   : whether loaders built by `train_loader`/`valid_loader`
///                  draw a fresh order on every pass
/// - `seed`      : seeds those loaders; the CLI and demos also hand it to
///                  `Network::from_spec` for initialization and dropout
/// - `log_every` : emit a debug line every this many training batches
///                  (`0` disables it)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub shuffle: bool,
    pub seed: u64,
    pub log_every: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: 30,
            batch_size: 64,
            shuffle: true,
            seed: 42,
            log_every: 0,
        }
    }
}

impl TrainConfig {
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig { epochs, batch_size, ..TrainConfig::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".to_owned()));
        }
        Ok(())
    }

    /// Loader over the training split, seeded with `seed`.
    pub fn train_loader<'a>(&self, dataset: &'a Dataset) -> Result<DataLoader<'a>> {
        DataLoader::new(dataset, self.batch_size, self.shuffle, self.seed)
    }

    /// Loader over the validation split. Uses `seed + 1` so its order is
    /// independent of the training loader's.
    pub fn valid_loader<'a>(&self, dataset: &'a Dataset) -> Result<DataLoader<'a>> {
        DataLoader::new(dataset, self.batch_size, self.shuffle, self.seed.wrapping_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: TrainConfig = serde_json::from_str(r#"{ "epochs": 3 }"#).unwrap();
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.batch_size, 64);
        assert!(cfg.shuffle);
    }

    #[test]
    fn loaders_follow_batch_size_and_shuffle() {
        let inputs: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let labels: Vec<usize> = (0..20).map(|i| i % 2).collect();
        let ds = Dataset::from_examples(&inputs, &labels, 2).unwrap();

        let ordered = TrainConfig { shuffle: false, ..TrainConfig::new(1, 8) };
        let mut loader = ordered.train_loader(&ds).unwrap();
        assert_eq!(loader.num_batches(), 3);
        let first = loader.batches().next().unwrap();
        assert_eq!(first.inputs.data, (0..8).map(|i| i as f64).collect::<Vec<_>>());

        let shuffled = TrainConfig::new(1, 8);
        fn order(loader: &mut DataLoader<'_>) -> Vec<f64> {
            loader.batches().flat_map(|b| b.inputs.data).collect()
        }
        let a = order(&mut shuffled.train_loader(&ds).unwrap());
        let b = order(&mut shuffled.train_loader(&ds).unwrap());
        let c = order(&mut shuffled.valid_loader(&ds).unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn zero_batch_size_is_invalid() {
        assert!(TrainConfig::new(1, 0).validate().is_err());
        assert!(TrainConfig::default().validate().is_ok());
    }
}
