use anyhow::Result;
use clap::{Parser, Subcommand};
use peptoforge_core::{analysis::SimilarityMethod, optimizer::Solver};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

mod config;
mod report;
mod request;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Peptone recommendation and blend optimization for growth media")]
struct Cli {
    /// Knowledge-base directory holding strains/, peptones/ and optional requirements/
    #[arg(long, global = true, default_value = "./data/knowledge_base")]
    kb: PathBuf,

    /// Directory that receives one timestamped folder per run
    #[arg(long, global = true, default_value = "./data/runs")]
    output: PathBuf,

    /// Manufacturer whose products count as reference products
    #[arg(long, global = true, default_value = "Sempio")]
    reference_manufacturer: String,

    /// Only recommend reference products
    #[arg(long, global = true)]
    reference_only: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank single peptones for a strain
    Single {
        strain_id: String,
        #[arg(long, default_value_t = 10)]
        top_n: usize,
    },
    /// Rank blends of the best singles on fixed ratio grids
    Blend {
        strain_id: String,
        #[arg(long, default_value_t = 3)]
        max_components: usize,
        #[arg(long, default_value_t = 10)]
        top_n: usize,
    },
    /// Rank blends whose ratios are optimized for the strain
    Optimize {
        strain_id: String,
        #[arg(long, default_value_t = 3)]
        max_components: usize,
        #[arg(long, default_value_t = 10)]
        top_n: usize,
        /// local (projected gradient) or global (differential evolution)
        #[arg(long, default_value = "local")]
        solver: Solver,
        /// Evaluate a fixed ratio grid instead of running the optimizer
        #[arg(long)]
        no_optimizer: bool,
    },
    /// Find the ratios of given peptones that best match a target feature vector
    Target {
        /// YAML request with peptones, target, and optional weights, solver and initial ratios
        request: PathBuf,
    },
    /// Rank blend partners for a peptone
    Complement {
        peptone: String,
        #[arg(long, default_value_t = 5)]
        top_n: usize,
    },
    /// Find products with a similar composition
    Similar {
        peptone: String,
        #[arg(long, default_value_t = 5)]
        top_n: usize,
        /// cosine or euclidean
        #[arg(long, default_value = "cosine")]
        method: SimilarityMethod,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);
    Registry::default().with(filter).with(fmt_layer).init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    println!("--- Peptoforge ---");

    let kb = config::KnowledgeBase::load(&cli.kb, &cli.reference_manufacturer)?;
    let (use_optimizer, solver) = match &cli.command {
        Command::Optimize { solver, no_optimizer, .. } => (!no_optimizer, *solver),
        _ => (true, Solver::Local),
    };
    let options = workflow::RunOptions {
        output_root: cli.output.clone(),
        reference_only: cli.reference_only,
        use_optimizer,
        solver,
    };
    let recommender = workflow::build_recommender(kb, &options)?;

    let output_dir = match &cli.command {
        Command::Single { strain_id, top_n } => workflow::run_single(&recommender, strain_id, *top_n, &options)?,
        Command::Blend { strain_id, max_components, top_n } => {
            workflow::run_blend(&recommender, strain_id, *max_components, *top_n, &options)?
        }
        Command::Optimize { strain_id, max_components, top_n, .. } => {
            workflow::run_optimized(&recommender, strain_id, *max_components, *top_n, &options)?
        }
        Command::Target { request } => workflow::run_target(&recommender, request, &options)?,
        Command::Complement { peptone, top_n } => workflow::run_complement(&recommender, peptone, *top_n, &options)?,
        Command::Similar { peptone, top_n, method } => {
            workflow::run_similar(&recommender, peptone, *top_n, *method, &options)?
        }
    };

    println!("\nRun complete. Results are in '{}'", output_dir.display());
    Ok(())
}
