use graph_attest::{
    cli::{
        self,
        commands::{SbomCommands, SlsaCommands},
    },
    error::Result,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// SBOM attestation commands (SPDX or CycloneDX)
    Sbom {
        #[command(subcommand)]
        command: SbomCommands,
    },
    /// SLSA provenance attestation commands
    Slsa {
        #[command(subcommand)]
        command: SlsaCommands,
    },
}

fn main() -> Result<()> {
    graph_attest::init_logging()?;

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sbom { command } => cli::handlers::handle_sbom_command(command),
        Commands::Slsa { command } => cli::handlers::handle_slsa_command(command),
    };

    if let Err(ref e) = result {
        eprintln!("{}", cli::format_error(e));
    }

    result
}
