use anyhow::Result;
use clap::{Parser, Subcommand};
use rummer::commands::{mums, nucmer};

#[derive(Parser)]
#[command(name = "rummer")]
#[command(version = "0.1.0")]
#[command(about = "Anchored alignment of long nucleotide sequences", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List maximal unique matches per query
    Mums(mums::MumsArgs),

    /// Cluster matches and align every cluster region
    Nucmer(nucmer::NucmerArgs),
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Mums(args) => {
            mums::run(args)?;
        }
        Commands::Nucmer(args) => {
            nucmer::run(args)?;
        }
    }
    Ok(())
}
