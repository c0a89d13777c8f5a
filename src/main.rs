use anyhow::Result;
use clap::{Parser, Subcommand};
use varcat::engine;

#[derive(Parser)]
#[command(name = "varcat")]
#[command(version = "0.1.0")]
#[command(about = "Builds a consolidated allele/proteoform catalog from per-sample variant calls", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate per-sample variant calls into a catalog document
    Build(engine::BuildArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => {
            engine::run(args)?;
        }
    }
    Ok(())
}
