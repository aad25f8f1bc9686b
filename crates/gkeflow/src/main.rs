mod commands;
mod utils;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gkeflow")]
#[command(about = "Shared VPC networking and GKE clusters, declared per stack", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Stack selection shared by every command
#[derive(Args, Debug, Clone)]
pub struct StackArgs {
    /// Stack name (dev, prod, or org/project/stack)
    #[arg(short, long, env = "GKEFLOW_STACK")]
    pub stack: String,

    /// Directory holding the local engine's state
    #[arg(long, env = "GKEFLOW_STATE_DIR", default_value = ".gkeflow")]
    pub state_dir: PathBuf,
}

/// Options of a deployment run
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Project id the local engine derives identifiers from
    #[arg(long, env = "GKEFLOW_PROJECT")]
    pub project: Option<String>,

    /// Compute the plan without writing state
    #[arg(long)]
    pub preview: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Declare the shared VPC networking of a stack
    Network {
        #[command(flatten)]
        stack: StackArgs,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Declare a GKE cluster attached to a networking stack
    Cluster {
        #[command(flatten)]
        stack: StackArgs,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Print the exported outputs of a stack as JSON
    Outputs {
        #[command(flatten)]
        stack: StackArgs,
    },
    /// Show version information
    Version,
}

fn init_tracing() {
    // Logs go to stderr so `outputs` keeps stdout clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("gkeflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_tracing();

    match cli.command {
        Commands::Network { stack, run } => commands::network::handle(&stack, &run).await,
        Commands::Cluster { stack, run } => commands::cluster::handle(&stack, &run).await,
        Commands::Outputs { stack } => commands::outputs::handle(&stack).await,
        Commands::Version => unreachable!("Version is handled before logging is set up"),
    }
}
