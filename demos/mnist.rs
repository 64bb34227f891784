/// MNIST digit classification.
///
/// Architecture: 784 → 128 → 64 (ReLU) → 10 (raw logits)
/// Loss:         cross-entropy on logits
/// Optimizer:    SGD, lr = 0.003
/// Batch size:   64
///
/// Run with:
///   cargo run --example mnist --release -- data/MNIST/raw [epochs]

use mlp_classify::{Dataset, Network, RunConfig, Split, Trainer};

fn main() -> mlp_classify::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let data_dir = args.next().unwrap_or_else(|| "data/MNIST/raw".to_owned());
    let mut cfg = RunConfig::mnist();
    if let Some(epochs) = args.next().and_then(|s| s.parse().ok()) {
        cfg.train.epochs = epochs;
    }

    println!("Loading MNIST from {}...", data_dir);
    let train_set = Dataset::load_dir(&data_dir, Split::Train, cfg.normalize)?;
    let test_set = Dataset::load_dir(&data_dir, Split::Test, cfg.normalize)?;

    let mut network = Network::from_spec(&cfg.network, cfg.train.seed)?;
    let mut optimizer = cfg.optimizer.build()?;
    let mut train_loader = cfg.train.train_loader(&train_set)?;
    let mut test_loader = cfg.train.valid_loader(&test_set)?;

    let trainer = Trainer::new(cfg.train.clone());

    // Pre-training baseline, expected near 10% for ten balanced classes.
    let baseline = trainer.evaluate(&mut network, &cfg.network.loss, &mut test_loader)?;
    println!(
        "Untrained: loss {:.3}, accuracy {:.2}%",
        baseline.loss,
        baseline.accuracy.mean_of_batches() * 100.0
    );

    let report = trainer.fit(
        &mut network,
        &mut optimizer,
        &cfg.network.loss,
        &mut train_loader,
        &mut test_loader,
    )?;

    if let Some(last) = report.last() {
        println!("  Correct: {}/{}", last.val_correct, last.val_total);
        println!("  Test accuracy: {:.2}%", last.val_accuracy_exact() * 100.0);
    }

    println!("\nSample predictions (first 10 test images):");
    println!("{:>12}  {:>12}", "True Label", "Predicted");
    println!("{}", "-".repeat(27));
    for i in 0..test_set.len().min(10) {
        let (predicted, _) = network.predict(test_set.features(i))?;
        println!("{:>12}  {:>12}", test_set.label(i), predicted);
    }
    Ok(())
}
