/// Fashion-MNIST clothing classification.
///
/// Architecture: 784 → 256 → 128 → 64 (ReLU, dropout 0.2) → 10 (LogSoftmax)
/// Loss:         NLL on log-probabilities
/// Optimizer:    Adam, lr = 0.003
/// Batch size:   64
/// Epochs:       30
///
/// Run with:
///   cargo run --example fashion_mnist --release -- data/FashionMNIST/raw
///
/// The directory must hold the four uncompressed IDX files.

use std::sync::mpsc;
use std::thread;

use mlp_classify::{Dataset, Network, RunConfig, Split, Trainer};

fn main() -> mlp_classify::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let data_dir = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/FashionMNIST/raw".to_owned());
    let cfg = RunConfig::fashion_mnist();

    println!("Loading Fashion-MNIST from {}...", data_dir);
    let train_set = Dataset::load_dir(&data_dir, Split::Train, cfg.normalize)?;
    let test_set = Dataset::load_dir(&data_dir, Split::Test, cfg.normalize)?;
    println!("  Training set: {} images", train_set.len());
    println!("  Test set:     {} images", test_set.len());

    let mut network = Network::from_spec(&cfg.network, cfg.train.seed)?;
    network.metadata.get_or_insert_with(Default::default).normalize = Some(cfg.normalize);
    println!("\nNetwork: {} trainable parameters", network.param_count());

    let mut optimizer = cfg.optimizer.build()?;
    let mut train_loader = cfg.train.train_loader(&train_set)?;
    let mut test_loader = cfg.train.valid_loader(&test_set)?;

    // Loss curves are collected on a separate thread as epochs finish.
    let (tx, rx) = mpsc::channel::<mlp_classify::EpochSummary>();
    let collector = thread::spawn(move || {
        let mut curves = Vec::new();
        for summary in rx {
            curves.push((summary.train_loss, summary.val_loss));
        }
        curves
    });

    let trainer = Trainer::new(cfg.train.clone()).with_progress(tx);
    let report = trainer.fit(
        &mut network,
        &mut optimizer,
        &cfg.network.loss,
        &mut train_loader,
        &mut test_loader,
    )?;
    drop(trainer);
    let curves = collector.join().unwrap_or_default();

    println!("\n{:>6}  {:>10}  {:>10}", "Epoch", "Train", "Test");
    println!("{}", "-".repeat(30));
    for (epoch, (train, test)) in curves.iter().enumerate() {
        println!("{:>6}  {:>10.4}  {:>10.4}", epoch + 1, train, test);
    }
    if let Some(best) = report.best_by_val_loss() {
        println!("\nLowest test loss {:.4} at epoch {}", best.val_loss, best.epoch);
    }

    // Class probabilities for one test image.
    let metadata = network.metadata.clone().unwrap_or_default();
    let (predicted, probs) = network.predict(test_set.features(0))?;
    println!("\nTest image 0 (label: {}):", metadata.class_name(test_set.label(0)));
    for (class, p) in probs.iter().enumerate() {
        println!("{:>12}  {:<40} {:.3}", metadata.class_name(class), "#".repeat((p * 40.0).round() as usize), p);
    }
    println!("Predicted: {}", metadata.class_name(predicted));
    Ok(())
}
