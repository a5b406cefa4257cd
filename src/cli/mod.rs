pub mod commands;
pub mod handlers;
use crate::error::Error;

pub use commands::{SbomCommands, SlsaCommands};
pub use handlers::{handle_sbom_command, handle_slsa_command};

pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CLI_NAME: &str = "graph-attest";

pub fn format_error(error: &Error) -> String {
    match error {
        Error::MalformedSubject(msg) => format!("Malformed subject: {msg}"),
        Error::LookupFailure(msg) => format!("Lookup failed: {msg}"),
        Error::EncodingFailure(msg) => format!("Encoding error: {msg}"),
        Error::Cancelled => "Operation cancelled".to_string(),
        Error::Validation(msg) => format!("Validation error: {msg}"),
        Error::InitializationError(msg) => format!("Initialization error: {msg}"),
        Error::Io(err) => format!("IO error: {err}"),
        Error::Json(err) => format!("JSON error: {err}"),
    }
}
