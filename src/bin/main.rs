//! mcsvm Command Line Interface
//!
//! Train one-vs-one SVM models on LibSVM data, evaluate them and predict
//! labels for new instances.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info};
use mcsvm::api::SVM;
use mcsvm::core::{Result, SVMError, WorkingSetStrategy};
use mcsvm::kernel::{KernelKind, PolynomialKernel, RBFKernel, SigmoidKernel};
use mcsvm::persistence::SerializableModel;
use mcsvm::predict::DEFAULT_BATCH_SIZE;
use mcsvm::{Classifier, TrainedModel};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "mcsvm")]
#[command(about = "Multi-class Support Vector Machine training and prediction")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new SVM model
    Train(TrainArgs),
    /// Make predictions using a trained model
    Predict(PredictArgs),
    /// Evaluate a model on labeled data
    Evaluate(EvaluateArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (LibSVM format)
    #[arg(long)]
    data: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// Kernel family
    #[arg(short, long, value_enum, default_value = "rbf")]
    kernel: CliKernel,

    /// Kernel coefficient for rbf, polynomial and sigmoid
    #[arg(short, long, default_value = "1.0")]
    gamma: f64,

    /// Polynomial degree
    #[arg(long, default_value = "3")]
    degree: u32,

    /// Independent term for polynomial and sigmoid
    #[arg(long, default_value = "0.0")]
    coef0: f64,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Convergence tolerance
    #[arg(short, long, default_value = "0.001")]
    epsilon: f64,

    /// Maximum iterations per pairwise model
    #[arg(short, long, default_value = "100000")]
    max_iterations: usize,

    /// Kernel cache size in MB, per pairwise model
    #[arg(long, default_value = "100")]
    cache_size: usize,

    /// Working set selection strategy
    #[arg(long, value_enum, default_value = "second-order")]
    working_set_strategy: CliWorkingSetStrategy,

    /// Enable the shrinking heuristic
    #[arg(long)]
    shrinking: bool,

    /// Worker threads (0 = all cores, 1 = sequential)
    #[arg(short, long, default_value = "0")]
    threads: usize,

    /// Declared number of features; wider instances are rejected
    #[arg(long)]
    n_features: Option<usize>,

    /// Report accuracy on the training data after fitting
    #[arg(long)]
    evaluate_training: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernel {
    Linear,
    Polynomial,
    Rbf,
    Sigmoid,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliWorkingSetStrategy {
    /// Maximal violating pair
    #[value(name = "first-order")]
    FirstOrder,
    /// Largest objective gain using curvature (default)
    #[value(name = "second-order")]
    SecondOrder,
}

impl From<CliWorkingSetStrategy> for WorkingSetStrategy {
    fn from(cli_strategy: CliWorkingSetStrategy) -> Self {
        match cli_strategy {
            CliWorkingSetStrategy::FirstOrder => WorkingSetStrategy::FirstOrder,
            CliWorkingSetStrategy::SecondOrder => WorkingSetStrategy::SecondOrder,
        }
    }
}

impl TrainArgs {
    fn kernel(&self) -> Result<KernelKind> {
        Ok(match self.kernel {
            CliKernel::Linear => KernelKind::Linear,
            CliKernel::Polynomial => KernelKind::Polynomial(PolynomialKernel::try_new(
                self.degree,
                self.gamma,
                self.coef0,
            )?),
            CliKernel::Rbf => KernelKind::Rbf(RBFKernel::try_new(self.gamma)?),
            CliKernel::Sigmoid => {
                KernelKind::Sigmoid(SigmoidKernel::try_new(self.gamma, self.coef0)?)
            }
        })
    }
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input data file (LibSVM format; labels are ignored)
    #[arg(long)]
    data: PathBuf,

    /// Output predictions file (prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Instances scored per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Labeled test data file
    #[arg(long)]
    data: PathBuf,

    /// Instances scored per batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn train_command(args: TrainArgs) -> Result<()> {
    let kernel = args.kernel()?;
    info!("Training SVM model on {:?}", args.data);
    info!(
        "Parameters: kernel={}, C={}, epsilon={}, max_iter={}",
        kernel, args.c, args.epsilon, args.max_iterations
    );

    let cache_bytes = args.cache_size.checked_mul(1024 * 1024).ok_or_else(|| {
        SVMError::InvalidParameter(format!("cache size of {} MB is too large", args.cache_size))
    })?;

    let mut svm = SVM::new()
        .with_kernel(kernel)
        .with_c(args.c)
        .with_epsilon(args.epsilon)
        .with_max_iterations(args.max_iterations)
        .with_cache_size(cache_bytes)
        .with_working_set_strategy(args.working_set_strategy.into())
        .with_shrinking(args.shrinking)
        .with_threads(args.threads);
    if let Some(n_features) = args.n_features {
        svm = svm.with_n_features(n_features);
    }

    let model = svm.train_from_file(&args.data)?;
    let report = model.report();
    print!("{}", report.timings);
    println!(
        "Trained {} pairwise models for {} classes, {} support vectors, {} iterations",
        model.models().len(),
        model.n_classes(),
        model.n_support_vectors(),
        report.iterations
    );
    if report.unconverged_pairs > 0 {
        println!(
            "Warning: {} pairwise models stopped at the iteration limit",
            report.unconverged_pairs
        );
    }

    SerializableModel::from_trained_model(&model).save_to_file(&args.output)?;
    info!("Model saved to: {:?}", args.output);

    if args.evaluate_training {
        let (report, confusion) = model.evaluate_file(&args.data, DEFAULT_BATCH_SIZE)?;
        println!("Training set:");
        println!("{report}");
        print!("{}", confusion.format_with_labels(model.labels()));
    }

    Ok(())
}

fn load_model(path: &Path) -> Result<(SerializableModel, TrainedModel)> {
    info!("Loading model from: {path:?}");
    let stored = SerializableModel::load_from_file(path)?;
    let model = stored.to_trained_model()?;
    Ok((stored, model))
}

fn check_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(SVMError::InvalidParameter(
            "batch size must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn predict_command(args: PredictArgs) -> Result<()> {
    check_batch_size(args.batch_size)?;
    let (_, model) = load_model(&args.model)?;
    let labels = model.predict_file(&args.data, args.batch_size)?;

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);
    for label in &labels {
        writeln!(writer, "{label}")?;
    }
    writer.flush()?;

    if let Some(path) = &args.output {
        info!("{} predictions saved to: {path:?}", labels.len());
    }
    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    check_batch_size(args.batch_size)?;
    let (_, model) = load_model(&args.model)?;
    let (report, confusion) = model.evaluate_file(&args.data, args.batch_size)?;

    println!("{report}");
    println!("Confusion matrix (rows: true class, columns: predicted class):");
    print!("{}", confusion.format_with_labels(model.labels()));
    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    let (stored, _) = load_model(&args.model)?;
    println!("{stored}");

    println!("\nPairwise Models:");
    for pair in &stored.pairs {
        println!(
            "  ({}, {}): {} support vectors, bias {:.6}, {:?}",
            stored.labels[pair.class_a],
            stored.labels[pair.class_b],
            pair.support_vectors.len(),
            pair.bias,
            pair.status
        );
    }
    Ok(())
}
