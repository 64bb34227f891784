use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};

use mlp_classify::image_input::load_grayscale_input;
use mlp_classify::{Dataset, Error, Network, RunConfig, Split, Trainer};

#[derive(Parser)]
#[command(name = "mlp-classify", version, about = "Train and validate MLP classifiers on MNIST-style data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Log-probability MLP with dropout, NLL loss, Adam.
    Fashion,
    /// Logit MLP, cross-entropy loss, SGD.
    Mnist,
}

impl Preset {
    fn config(self) -> RunConfig {
        match self {
            Preset::Fashion => RunConfig::fashion_mnist(),
            Preset::Mnist => RunConfig::mnist(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Train a network and report per-epoch validation loss and accuracy.
    Train {
        /// Directory holding the four IDX files.
        #[arg(long)]
        data_dir: PathBuf,
        #[arg(long, value_enum, default_value = "fashion")]
        preset: Preset,
        /// JSON run config; replaces the preset.
        #[arg(long)]
        config: Option<String>,
        #[arg(long)]
        epochs: Option<usize>,
        #[arg(long)]
        batch_size: Option<usize>,
        #[arg(long)]
        lr: Option<f64>,
        /// Dropout probability for every hidden layer that has dropout.
        #[arg(long)]
        dropout: Option<f64>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        train_limit: Option<usize>,
        #[arg(long)]
        test_limit: Option<usize>,
        /// Where to write the trained network as JSON.
        #[arg(long)]
        save_model: Option<String>,
        /// Where to write the epoch history as JSON.
        #[arg(long)]
        save_history: Option<String>,
    },
    /// Print the class probabilities a trained network assigns to one example.
    Predict {
        #[arg(long)]
        model: String,
        /// Image file (PNG/JPEG/BMP/GIF), resized to 28x28 grayscale.
        #[arg(long, conflicts_with_all = ["data_dir", "index"])]
        image: Option<String>,
        /// Treat the image as dark-on-light and invert it.
        #[arg(long)]
        invert: bool,
        /// Read the example from the test split of this directory instead.
        #[arg(long, requires = "index")]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        index: Option<usize>,
    },
    /// Write a preset run config as JSON, as a starting point for --config.
    InitConfig {
        #[arg(long, value_enum, default_value = "fashion")]
        preset: Preset,
        #[arg(long)]
        out: String,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Train {
            data_dir,
            preset,
            config,
            epochs,
            batch_size,
            lr,
            dropout,
            seed,
            train_limit,
            test_limit,
            save_model,
            save_history,
        } => {
            let cfg = match config {
                Some(path) => RunConfig::load_json(&path),
                None => Ok(preset.config()),
            };
            cfg.and_then(|mut cfg| {
                cfg.train.epochs = epochs.unwrap_or(cfg.train.epochs);
                cfg.train.batch_size = batch_size.unwrap_or(cfg.train.batch_size);
                cfg.train.seed = seed.unwrap_or(cfg.train.seed);
                if let Some(lr) = lr {
                    cfg.optimizer = cfg.optimizer.with_learning_rate(lr);
                }
                if let Some(p) = dropout {
                    for layer in cfg.network.layers.iter_mut().filter(|l| l.dropout.is_some()) {
                        layer.dropout = Some(p);
                    }
                }
                cfg.train_limit = train_limit.or(cfg.train_limit);
                cfg.test_limit = test_limit.or(cfg.test_limit);
                run_train(&cfg, &data_dir, save_model.as_deref(), save_history.as_deref())
            })
        }
        Command::Predict { model, image, invert, data_dir, index } => {
            run_predict(&model, image.as_deref(), invert, data_dir, index)
        }
        Command::InitConfig { preset, out } => preset.config().save_json(&out).map(|_| {
            info!("wrote run config to {}", out);
        }),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_train(
    cfg: &RunConfig,
    data_dir: &Path,
    save_model: Option<&str>,
    save_history: Option<&str>,
) -> mlp_classify::Result<()> {
    cfg.validate()?;

    let mut train_set = Dataset::load_dir(data_dir, Split::Train, cfg.normalize)?;
    let mut test_set = Dataset::load_dir(data_dir, Split::Test, cfg.normalize)?;
    if let Some(n) = cfg.train_limit {
        train_set.truncate(n);
    }
    if let Some(n) = cfg.test_limit {
        test_set.truncate(n);
    }

    let mut network = Network::from_spec(&cfg.network, cfg.train.seed)?;
    network.metadata.get_or_insert_with(Default::default).normalize = Some(cfg.normalize);
    let mut optimizer = cfg.optimizer.build()?;
    let loss = cfg.network.loss;

    let mut train_loader = cfg.train.train_loader(&train_set)?;
    let mut test_loader = cfg.train.valid_loader(&test_set)?;

    let report = Trainer::new(cfg.train.clone()).fit(
        &mut network,
        &mut optimizer,
        &loss,
        &mut train_loader,
        &mut test_loader,
    )?;

    if let Some(last) = report.last() {
        info!(
            "final validation accuracy {:.4} (exact {}/{} = {:.4})",
            last.val_accuracy,
            last.val_correct,
            last.val_total,
            last.val_accuracy_exact()
        );
    }
    if let Some(path) = save_model {
        network.save_json(path)?;
        info!("model saved to {}", path);
    }
    if let Some(path) = save_history {
        report.save_json(path)?;
        info!("history saved to {}", path);
    }
    Ok(())
}

fn run_predict(
    model: &str,
    image: Option<&str>,
    invert: bool,
    data_dir: Option<PathBuf>,
    index: Option<usize>,
) -> mlp_classify::Result<()> {
    let mut network = Network::load_json(model)?;
    let metadata = network.metadata.clone().unwrap_or_default();
    let normalize = metadata.normalize.unwrap_or_default();

    let (example, truth) = match (image, data_dir, index) {
        (Some(path), _, _) => (load_grayscale_input(path, 28, 28, normalize, invert)?, None),
        (None, Some(dir), Some(i)) => {
            let test_set = Dataset::load_dir(dir, Split::Test, normalize)?;
            if i >= test_set.len() {
                return Err(Error::InvalidConfig(format!(
                    "index {} is out of range for {} test examples",
                    i,
                    test_set.len()
                )));
            }
            (test_set.features(i).to_vec(), Some(test_set.label(i)))
        }
        _ => {
            return Err(Error::InvalidConfig(
                "pass either --image or --data-dir with --index".to_owned(),
            ))
        }
    };

    let (predicted, probs) = network.predict(&example)?;
    for (class, p) in probs.iter().enumerate() {
        println!("{:>12}  {:.4}", metadata.class_name(class), p);
    }
    println!("predicted: {}", metadata.class_name(predicted));
    if let Some(label) = truth {
        println!("label:     {}", metadata.class_name(label));
    }
    Ok(())
}
