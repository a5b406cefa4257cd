//! # graph-attest
//!
//! Compiles software supply-chain graph query results into in-toto
//! attestation statements.
//!
//! Three kinds of statement can be produced:
//!
//! - SBOM statements with an SPDX 2.3 document as predicate
//! - SBOM statements with a CycloneDX 1.6 BOM as predicate, including the VEX
//!   statements made about the SBOM subject
//! - SLSA provenance statements rebuilt from flat key/value predicates
//!
//! ## Quick Start
//!
//! Compile the only SBOM of a graph snapshot:
//! ```bash
//! graph-attest sbom generate --snapshot snapshot.json
//! ```
//!
//! Compile a SLSA node of the same snapshot for a package:
//! ```bash
//! graph-attest slsa generate --snapshot snapshot.json --purl pkg:pypi/requests@2.31.0
//! ```
//!
//! ## Library use
//!
//! ```
//! use graph_attest::graph::lookup::Cancellation;
//! use graph_attest::sbom::{sbom_attestation, SbomConfig};
//! use graph_attest::snapshot::GraphSnapshot;
//!
//! let snapshot = GraphSnapshot::from_json(r#"{
//!     "hasSbom": [{
//!         "uri": "https://example.com/spdx/app",
//!         "knownSince": "2024-01-15T08:00:00Z",
//!         "subject": {
//!             "__typename": "Artifact",
//!             "id": "art-1",
//!             "algorithm": "sha256",
//!             "digest": "abc"
//!         }
//!     }]
//! }"#).unwrap();
//!
//! let sbom = snapshot.sbom(None).unwrap();
//! let statement = sbom_attestation(
//!     sbom,
//!     &snapshot.vex_statements,
//!     &snapshot,
//!     &SbomConfig::default(),
//!     &Cancellation::new(),
//! ).unwrap();
//!
//! assert_eq!(statement.predicate_type, "https://spdx.dev/Document");
//! ```

pub mod cli;
pub mod error;
pub mod graph;
pub mod in_toto;
pub mod keypath;
pub mod sbom;
pub mod slsa;
pub mod snapshot;
pub mod subject;
#[cfg(test)]
mod tests;

// Re-export error types
pub use error::{Error, Result};

/// Initialize logging for the CLI
///
/// # Examples
///
/// ```
/// use graph_attest::init_logging;
///
/// // Might fail if a logger is already installed
/// let result = init_logging();
/// assert!(result.is_ok() || result.is_err());
/// ```
pub fn init_logging() -> Result<()> {
    env_logger::try_init().map_err(|e| Error::InitializationError(e.to_string()))
}

pub use graph::lookup::{Cancellation, MetadataLookup};
pub use snapshot::GraphSnapshot;
pub use subject::Subject;
