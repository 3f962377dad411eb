//! pso-engine - command-line driver
//!
//! Runs a benchmark objective through the parallel swarm engine and prints
//! the optimum found.
//!
//! ```text
//! pso-engine --objective rastrigin --dimensions 10 --threads 8 --phrase demo
//! pso-engine --config run.json --objective target --target 0.3,0.7 --json
//! ```

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use pso_engine_core::{
    Fitness, FitnessError, ParallelDriver, Progress, RngBackend, RunConfig, RunSummary, Swarm,
};
use serde::Serialize;
use std::f64::consts::PI;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
enum Objective {
    /// Sum of squares
    Sphere,
    /// Rosenbrock's banana valley
    Rosenbrock,
    /// Rastrigin's multimodal bowl
    Rastrigin,
    /// Squared distance to --target
    Target,
}

#[derive(Debug, Parser)]
#[command(name = "pso-engine", version, about = "Thread-parallel particle swarm optimizer")]
struct Cli {
    /// JSON run configuration; missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed passphrase (omit to seed from the OS)
    #[arg(long)]
    phrase: Option<String>,

    /// Benchmark function to minimize
    #[arg(long, value_enum, default_value_t = Objective::Sphere)]
    objective: Objective,

    /// Comma-separated point for the target objective
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    target: Vec<f64>,

    /// Worker threads
    #[arg(long)]
    threads: Option<usize>,

    /// Number of particles
    #[arg(long)]
    size: Option<usize>,

    /// Random informants per particle
    #[arg(long)]
    neighbors: Option<usize>,

    /// Fitness evaluation budget
    #[arg(long)]
    evaluations: Option<usize>,

    /// Entropy backend (xorshift, urandom, or a backend uid)
    #[arg(long)]
    backend: Option<RngBackend>,

    /// Dimensions when the configuration carries no bounds
    #[arg(long, default_value_t = 2)]
    dimensions: usize,

    /// Lower bound applied to every dimension when the configuration carries no bounds
    #[arg(long, default_value_t = -5.12, allow_hyphen_values = true)]
    lower: f64,

    /// Upper bound applied to every dimension when the configuration carries no bounds
    #[arg(long, default_value_t = 5.12, allow_hyphen_values = true)]
    upper: f64,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// A benchmark objective bound to its parameters
struct Benchmark {
    objective: Objective,
    target: Vec<f64>,
}

impl Fitness for Benchmark {
    fn evaluate(&self, x: &[f64]) -> Result<f64, FitnessError> {
        let value = match self.objective {
            Objective::Sphere => x.iter().map(|v| v * v).sum(),
            Objective::Rosenbrock => x
                .windows(2)
                .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (1.0 - w[0]).powi(2))
                .sum(),
            Objective::Rastrigin => {
                10.0 * x.len() as f64
                    + x.iter()
                        .map(|v| v * v - 10.0 * (2.0 * PI * v).cos())
                        .sum::<f64>()
            }
            Objective::Target => x
                .iter()
                .zip(&self.target)
                .map(|(v, t)| (v - t) * (v - t))
                .sum(),
        };
        Ok(value)
    }
}

#[derive(Serialize)]
struct Report<'a> {
    objective: Objective,
    backend: RngBackend,
    workers: usize,
    fingerprint: &'a str,
    #[serde(flatten)]
    summary: &'a RunSummary,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A second init (e.g. under a test harness) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Merge the optional config file with command-line overrides
fn resolve_config(cli: &Cli) -> Result<RunConfig> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => RunConfig::default(),
    };

    if config.swarm.lower.is_empty() && config.swarm.upper.is_empty() {
        let d = if cli.objective == Objective::Target && !cli.target.is_empty() {
            cli.target.len()
        } else {
            cli.dimensions
        };
        config.swarm.lower = vec![cli.lower; d];
        config.swarm.upper = vec![cli.upper; d];
    }

    if let Some(threads) = cli.threads {
        config.driver.workers = threads;
    }
    if let Some(size) = cli.size {
        config.swarm.size = size;
    }
    if let Some(neighbors) = cli.neighbors {
        config.swarm.neighbors = neighbors;
    }
    if let Some(evaluations) = cli.evaluations {
        config.swarm.max_evaluations = evaluations;
    }
    if let Some(backend) = cli.backend {
        config.swarm.backend = backend;
    }

    Ok(config)
}

/// Prints `Progress: NN%` to stderr whenever the percentage changes
fn progress_printer() -> impl FnMut(&Progress) {
    let mut last = None;
    move |progress: &Progress| {
        let percent = (progress.fraction_complete * 100.0).floor() as u32;
        if last != Some(percent) {
            last = Some(percent);
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "\rProgress: {:2}%", percent);
            let _ = stderr.flush();
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let d = config.swarm.dimensions();

    if cli.objective == Objective::Target && cli.target.len() != d {
        bail!(
            "target objective needs --target with {} coordinates, got {}",
            d,
            cli.target.len()
        );
    }

    let fingerprint = config
        .swarm
        .fingerprint()
        .context("fingerprinting configuration")?;
    tracing::info!(%fingerprint, objective = ?cli.objective, "configuration resolved");

    let driver = ParallelDriver::new(config.driver.clone())?;
    let benchmark = Benchmark {
        objective: cli.objective,
        target: cli.target.clone(),
    };

    let mut swarm = Swarm::initialize(benchmark, &config.swarm, cli.phrase.as_deref())
        .context("initializing swarm")?;

    let summary = driver
        .run_with_progress(&mut swarm, progress_printer())
        .context("running swarm")?;
    eprintln!("\rProgress: 100%");

    if cli.json {
        let report = Report {
            objective: cli.objective,
            backend: config.swarm.backend,
            workers: driver.workers(),
            fingerprint: &fingerprint,
            summary: &summary,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Objective:   {:?}", cli.objective);
        println!("Fitness:     {:e}", summary.optimum.fitness);
        println!("Position:    {:?}", summary.optimum.position);
        println!("Iterations:  {}", summary.iterations);
        println!("Evaluations: {}", summary.evaluations);
        println!("Config:      {}", fingerprint);
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(1)
        }
    }
}
