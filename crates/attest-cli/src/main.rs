use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "attest")]
#[command(about = "Attest - guided compliance intake", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the guided intake flow for a product
    Run(commands::run::RunArgs),
    /// Clear the cached report and answers for a product
    Reset(commands::reset::ResetArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => commands::run::run(args).await,
        Commands::Reset(args) => commands::reset::run(args).await,
    }
}
