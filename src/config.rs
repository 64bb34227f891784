//! Run configuration: architecture, loop hyperparameters, optimizer and
//! input normalization in one serde document.

use serde::{Serialize, Deserialize};

use crate::data::dataset::Normalize;
use crate::error::Result;
use crate::network::spec::NetworkSpec;
use crate::optim::optimizer::OptimizerConfig;
use crate::train::train_config::TrainConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub network: NetworkSpec,
    pub train: TrainConfig,
    pub optimizer: OptimizerConfig,
    pub normalize: Normalize,
    /// Use only the first N training examples.
    pub train_limit: Option<usize>,
    /// Use only the first N validation examples.
    pub test_limit: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig::fashion_mnist()
    }
}

impl RunConfig {
    /// Log-probability MLP with dropout 0.2, NLL loss, Adam at 0.003,
    /// 30 epochs of batch 64.
    pub fn fashion_mnist() -> RunConfig {
        RunConfig {
            network: NetworkSpec::fashion_mnist(0.2),
            train: TrainConfig::default(),
            optimizer: OptimizerConfig::Adam { learning_rate: 0.003 },
            normalize: Normalize::default(),
            train_limit: None,
            test_limit: None,
        }
    }

    /// Logit MLP with cross-entropy, plain SGD at 0.003, 5 epochs.
    pub fn mnist() -> RunConfig {
        RunConfig {
            network: NetworkSpec::mnist(),
            train: TrainConfig { epochs: 5, ..TrainConfig::default() },
            optimizer: OptimizerConfig::Sgd { learning_rate: 0.003, momentum: 0.0 },
            normalize: Normalize::default(),
            train_limit: None,
            test_limit: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.train.validate()?;
        self.optimizer.build()?;
        Ok(())
    }

    pub fn load_json(path: &str) -> Result<RunConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::loss_type::LossType;

    #[test]
    fn presets_validate() {
        RunConfig::fashion_mnist().validate().unwrap();
        RunConfig::mnist().validate().unwrap();
    }

    #[test]
    fn partial_json_overrides_defaults() {
        let json = r#"{
            "train": { "epochs": 2, "batch_size": 32 },
            "optimizer": { "kind": "sgd", "learning_rate": 0.05 }
        }"#;
        let cfg: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.train.epochs, 2);
        assert_eq!(cfg.train.batch_size, 32);
        assert_eq!(cfg.optimizer, OptimizerConfig::Sgd { learning_rate: 0.05, momentum: 0.0 });
        assert_eq!(cfg.network.loss, LossType::Nll);
        cfg.validate().unwrap();
    }

    #[test]
    fn negative_learning_rate_is_rejected() {
        let mut cfg = RunConfig::mnist();
        cfg.optimizer = cfg.optimizer.with_learning_rate(-1.0);
        assert!(cfg.validate().is_err());
    }
}
