pub mod epoch_summary;
pub mod loop_fn;
pub mod train_config;
pub mod trainer;

pub use epoch_summary::{EpochSummary, TrainReport};
pub use loop_fn::{evaluate, train_epoch, Evaluation};
pub use train_config::TrainConfig;
pub use trainer::Trainer;
