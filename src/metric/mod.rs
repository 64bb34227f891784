pub mod accuracy;

pub use accuracy::{argmax, batch_accuracy, equals, mean_bool, top1, top_k, AccuracyMeter};
