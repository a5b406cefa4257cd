use crate::cli::commands::{SbomCommands, SlsaCommands};
use crate::error::{Error, Result};
use crate::graph::lookup::Cancellation;
use crate::in_toto::statement_to_json;
use crate::sbom::{self, SbomConfig, SbomFormat};
use crate::slsa;
use crate::snapshot::GraphSnapshot;

use in_toto_attestation::v1::statement::Statement;
use std::fs;
use std::path::Path;

pub fn handle_sbom_command(cmd: SbomCommands) -> Result<()> {
    match cmd {
        SbomCommands::Generate {
            snapshot,
            uri,
            format,
            sorted,
            output,
        } => {
            let snapshot = GraphSnapshot::load(&snapshot)?;
            let node = snapshot.sbom(uri.as_deref())?;
            let config = SbomConfig::default().sorted(sorted);

            let statement = sbom::sbom_attestation(
                node,
                &snapshot.vex_statements,
                &snapshot,
                &config,
                &Cancellation::new(),
            )?;

            emit(&render_statement(&statement, &format)?, output.as_deref())
        }
        SbomCommands::List { snapshot } => {
            let snapshot = GraphSnapshot::load(&snapshot)?;

            if snapshot.has_sbom.is_empty() {
                println!("No SBOMs found");
                return Ok(());
            }

            for node in &snapshot.has_sbom {
                println!("{}\t{}", SbomFormat::from_uri(&node.uri), node.uri);
            }

            Ok(())
        }
    }
}

pub fn handle_slsa_command(cmd: SlsaCommands) -> Result<()> {
    match cmd {
        SlsaCommands::Generate {
            snapshot,
            purl,
            index,
            format,
            output,
        } => {
            let snapshot = GraphSnapshot::load(&snapshot)?;
            let node = snapshot.slsa(index)?;
            let statement = slsa::slsa_attestation(node, &purl)?;

            emit(&render_statement(&statement, &format)?, output.as_deref())
        }
    }
}

/// Renders a statement as pretty JSON or as hex-encoded CBOR.
pub fn render_statement(statement: &Statement, format: &str) -> Result<String> {
    let json: serde_json::Value = serde_json::from_str(&statement_to_json(statement)?)?;

    match format.to_lowercase().as_str() {
        "json" => Ok(serde_json::to_string_pretty(&json)?),
        "cbor" => {
            let cbor =
                serde_cbor::to_vec(&json).map_err(|e| Error::EncodingFailure(e.to_string()))?;
            Ok(hex::encode(cbor))
        }
        _ => Err(Error::Validation(format!(
            "Invalid output format '{format}'. Valid options are: json, cbor"
        ))),
    }
}

fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            log::info!("statement written to {}", path.display());
        }
        None => println!("{content}"),
    }

    Ok(())
}
