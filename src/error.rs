use thiserror::Error;

/// Errors produced while compiling graph data into attestations.
///
/// A build never recovers locally: the first error aborts it and is returned
/// to the caller unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// The subject node lacks a type discriminator or part of its
    /// namespace/name/version chain, or an artifact has no digest.
    #[error("Malformed subject: {0}")]
    MalformedSubject(String),

    /// An external lookup collaborator call failed.
    #[error("Lookup failure: {0}")]
    LookupFailure(String),

    /// Converting a built document to its wire representation failed.
    #[error("Encoding failure: {0}")]
    EncodingFailure(String),

    /// The build was cancelled while waiting on an external lookup.
    #[error("Build cancelled")]
    Cancelled,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
