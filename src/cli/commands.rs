use clap::Subcommand;
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
pub enum SbomCommands {
    /// Generate an SBOM attestation from a graph snapshot
    Generate {
        /// Path to the graph snapshot (JSON)
        #[arg(long = "snapshot")]
        snapshot: PathBuf,

        /// URI of the SBOM to compile, required when the snapshot holds several
        #[arg(long = "uri")]
        uri: Option<String>,

        /// Output format (json or cbor)
        #[arg(long = "format", default_value = "json")]
        format: String,

        /// Sort packages, components and edges by identifier
        #[arg(long = "sorted")]
        sorted: bool,

        /// Write the statement to this file instead of stdout
        #[arg(long = "output")]
        output: Option<PathBuf>,
    },
    /// List the SBOMs contained in a graph snapshot
    List {
        /// Path to the graph snapshot (JSON)
        #[arg(long = "snapshot")]
        snapshot: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum SlsaCommands {
    /// Generate a SLSA provenance attestation from a graph snapshot
    Generate {
        /// Path to the graph snapshot (JSON)
        #[arg(long = "snapshot")]
        snapshot: PathBuf,

        /// Package URL of the attested package
        #[arg(long = "purl")]
        purl: String,

        /// Index of the SLSA node, required when the snapshot holds several
        #[arg(long = "index")]
        index: Option<usize>,

        /// Output format (json or cbor)
        #[arg(long = "format", default_value = "json")]
        format: String,

        /// Write the statement to this file instead of stdout
        #[arg(long = "output")]
        output: Option<PathBuf>,
    },
}
