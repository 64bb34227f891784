pub mod math;
pub mod activation;
pub mod layers;
pub mod autograd;
pub mod network;
pub mod loss;
pub mod metric;
pub mod optim;
pub mod data;
pub mod train;
pub mod config;
pub mod image_input;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::{Dropout, Layer, Mode};
pub use autograd::{Gradients, NoGrad};
pub use network::{ModelMetadata, Network, NetworkSpec, LayerSpec, OutputKind};
pub use loss::{CrossEntropyLoss, Loss, LossType, NllLoss};
pub use metric::AccuracyMeter;
pub use optim::{Adam, Optimizer, OptimizerConfig, Sgd};
pub use data::{Batch, DataLoader, Dataset, Normalize, Split};
pub use train::{EpochSummary, TrainConfig, TrainReport, Trainer};
pub use config::RunConfig;
pub use error::{Error, Result};
