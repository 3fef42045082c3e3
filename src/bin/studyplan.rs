use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;
use u_studyplan::{
    build_profiles, plan_batch, Catalog, CatalogOptions, ExamRecord, FailurePolicy, LearnerProfile,
    LearnerState, PlanConfig, PlanRunner, ProfileConfig,
};

/// Study path planner
#[derive(Parser)]
#[command(name = "studyplan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Plans prerequisite-respecting study orders and time budgets", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build learner profiles from exam records
    Profiles {
        /// JSON array of exam records
        #[arg(long)]
        input: PathBuf,
        /// Output JSON file
        #[arg(long, default_value = "profiles.json")]
        output: PathBuf,
        /// Sigmoid slope for topic mastery
        #[arg(long, default_value = "1.2")]
        gamma: f64,
        /// Daily decay of older exams
        #[arg(long, default_value = "0.003")]
        decay_lambda: f64,
        /// Ability scale
        #[arg(long, default_value = "0.3")]
        kappa: f64,
    },

    /// Plan every learner of a profiles file
    Plan {
        /// JSON array of learner profiles
        #[arg(long)]
        profiles: PathBuf,
        /// JSON reference catalog (defaults to the built-in mathematics table)
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Directory for summary.json, time_allocation.json and path_edges.json
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,
        /// Total study budget
        #[arg(long, default_value = "90")]
        budget: f64,
        /// Minimum time per topic
        #[arg(long, default_value = "2")]
        min_time: f64,
        #[arg(long, default_value = "30")]
        ants: usize,
        #[arg(long, default_value = "80")]
        iters: usize,
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Base time unit of the built-in catalog
        #[arg(long, default_value = "6")]
        base_unit: f64,
        /// Mastery assumed for topics missing from a profile
        #[arg(long, default_value = "0.5")]
        fill_mastery: f64,
        /// Skip learners that cannot be planned instead of failing
        #[arg(long)]
        skip_failures: bool,
        /// Evaluate in parallel (requires the `parallel` feature)
        #[arg(long)]
        parallel: bool,
    },

    /// Plan one illustrative learner on the built-in catalog
    Demo {
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Profiles {
            input,
            output,
            gamma,
            decay_lambda,
            kappa,
        } => {
            let records: Vec<ExamRecord> = read_json(&input)?;
            let config = ProfileConfig::default()
                .with_gamma(gamma)
                .with_decay_lambda(decay_lambda)
                .with_kappa(kappa);
            let profiles = build_profiles(&records, &config)?;
            write_json(&output, &profiles)?;
            info!(
                records = records.len(),
                learners = profiles.len(),
                output = %output.display(),
                "profiles written"
            );
        }
        Commands::Plan {
            profiles,
            catalog,
            out_dir,
            budget,
            min_time,
            ants,
            iters,
            seed,
            base_unit,
            fill_mastery,
            skip_failures,
            parallel,
        } => {
            let learners: Vec<LearnerProfile> = read_json(&profiles)?;
            let catalog = match catalog {
                Some(path) => read_json::<Catalog>(&path)?,
                None => Catalog::high_school_math(base_unit),
            };
            let options = CatalogOptions::default().with_fill_mastery(fill_mastery);
            let config = PlanConfig::default()
                .with_total_time(budget)
                .with_min_time(min_time)
                .with_ants(ants)
                .with_iterations(iters)
                .with_seed(seed)
                .with_parallel(parallel);
            let policy = if skip_failures {
                FailurePolicy::Skip
            } else {
                FailurePolicy::Abort
            };

            let outcome = plan_batch(&catalog, &learners, &options, &config, policy)?;

            fs::create_dir_all(&out_dir)
                .with_context(|| format!("creating {}", out_dir.display()))?;
            write_json(&out_dir.join("summary.json"), &outcome.report.summaries)?;
            write_json(&out_dir.join("time_allocation.json"), &outcome.report.allocations)?;
            write_json(&out_dir.join("path_edges.json"), &outcome.report.edges)?;

            for (student, err) in &outcome.failures {
                eprintln!("skipped {student}: {err}");
            }
            info!(
                planned = outcome.planned(),
                skipped = outcome.failures.len(),
                out_dir = %out_dir.display(),
                "plans written"
            );
        }
        Commands::Demo { seed } => demo(seed)?,
    }

    Ok(())
}

fn demo(seed: u64) -> Result<()> {
    let catalog = Catalog::high_school_math(6.0);
    let masteries: HashMap<String, f64> = [
        ("Sets and Logic", 0.8),
        ("Function Concepts and Properties", 0.6),
        ("Trigonometric Functions", 0.4),
        ("Derivatives and Applications", 0.2),
        ("Plane Analytic Geometry", 0.3),
    ]
    .into_iter()
    .map(|(name, m)| (name.to_string(), m))
    .collect();

    let topics = catalog.topic_set(&masteries, &CatalogOptions::default())?;
    let config = PlanConfig::default().with_total_time(120.0).with_seed(seed);
    let result = PlanRunner::run(&topics, &LearnerState::new(1.0), &config)?;
    let best = &result.best;

    println!(
        "utility {:.4}  loss {:.4}  quality {:.4}  lambda {:.3e}  (best at iteration {})",
        best.utility, best.loss, best.quality, best.lambda, result.best_iteration
    );
    for (step, id) in best.path.iter().enumerate() {
        let name = topics.get(*id).map(|t| t.name.as_str()).unwrap_or("?");
        let time = best.time_of(*id).unwrap_or(0.0);
        println!("{:>2}. {:<36} {:>7.2}", step + 1, name, time);
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}
