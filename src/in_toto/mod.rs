//! # in-toto Statement Assembly
//!
//! This module wraps built predicates into in-toto attestation statements. A
//! statement carries a statement type URI, a list of resource descriptors
//! naming the attested subjects, a predicate type URI and the predicate body
//! as a protobuf `Struct`.
//!
//! ## Key Components
//!
//! - **Resource Descriptors**: subject entries, by name/URI for packages or by
//!   digest for artifacts
//! - **Struct Conversion**: any serde-serializable document to a protobuf
//!   `Struct`, through its JSON form
//! - **Statement Assembly**: filling the statement fields and printing the
//!   result as JSON
//!
//! ## Examples
//!
//! ```
//! use graph_attest::in_toto::{
//!     assemble_statement, json_to_struct_proto, make_minimal_resource_descriptor,
//!     STATEMENT_TYPE_V1,
//! };
//!
//! let subject = make_minimal_resource_descriptor("app", "sha256", "abc123");
//! let predicate = json_to_struct_proto(r#"{"buildType": "make"}"#).unwrap();
//!
//! let statement = assemble_statement(
//!     STATEMENT_TYPE_V1,
//!     vec![subject],
//!     "https://slsa.dev/provenance/v1",
//!     predicate,
//! );
//!
//! assert_eq!(statement.predicate_type, "https://slsa.dev/provenance/v1");
//! assert_eq!(statement.subject.len(), 1);
//! ```

use crate::error::{Error, Result};
use crate::subject::Subject;

use in_toto_attestation::v1::resource_descriptor::ResourceDescriptor;
use in_toto_attestation::v1::statement::Statement;
use protobuf::MessageField;
use protobuf::well_known_types::struct_::Struct;
use protobuf_json_mapping::{parse_from_str, print_to_string};
use serde::Serialize;
use std::collections::HashMap;

/// Legacy in-toto statement type, used for SBOM and pre-v1 SLSA statements.
pub const STATEMENT_TYPE_V01: &str = "https://in-toto.io/Statement/v0.1";

pub const STATEMENT_TYPE_V1: &str = "https://in-toto.io/Statement/v1";

pub const PREDICATE_TYPE_SPDX: &str = "https://spdx.dev/Document";

pub const PREDICATE_TYPE_CYCLONEDX: &str = "https://cyclonedx.org/bom";

/// Converts a JSON string to a protobuf Struct.
///
/// The input must be a JSON object; any other JSON value, or invalid JSON,
/// fails with [`Error::EncodingFailure`].
///
/// # Examples
///
/// ```
/// use graph_attest::in_toto::json_to_struct_proto;
///
/// let json_data = r#"{"name": "test", "version": "1.0"}"#;
/// let struct_proto = json_to_struct_proto(json_data).unwrap();
///
/// assert!(!struct_proto.fields.is_empty());
/// ```
pub fn json_to_struct_proto(json_str: &str) -> Result<Struct> {
    let msg_struct = parse_from_str::<Struct>(json_str).map_err(|e| {
        Error::EncodingFailure(format!("Failed to convert predicate to Struct: {}", e))
    })?;

    Ok(msg_struct)
}

/// Converts any serializable document to a protobuf Struct.
pub fn to_struct_proto<T: Serialize>(document: &T) -> Result<Struct> {
    let json = serde_json::to_string(document)
        .map_err(|e| Error::EncodingFailure(format!("Failed to serialize predicate: {}", e)))?;

    json_to_struct_proto(&json)
}

/// Creates a minimal resource descriptor with name and digest information.
///
/// # Examples
///
/// ```
/// use graph_attest::in_toto::make_minimal_resource_descriptor;
///
/// let descriptor = make_minimal_resource_descriptor("model.onnx", "sha384", "a1b2c3");
///
/// assert_eq!(descriptor.name, "model.onnx");
/// assert!(descriptor.digest.contains_key("sha384"));
/// ```
pub fn make_minimal_resource_descriptor(name: &str, alg: &str, digest: &str) -> ResourceDescriptor {
    let mut rd = make_digest_resource_descriptor(alg, digest);
    rd.name = name.to_string();

    rd
}

/// Creates a resource descriptor identified only by its digest.
pub fn make_digest_resource_descriptor(alg: &str, digest: &str) -> ResourceDescriptor {
    let digest_set = HashMap::from([(alg.to_string(), digest.to_string())]);

    let mut rd = ResourceDescriptor::new();
    rd.digest = digest_set;

    rd
}

/// Creates a resource descriptor for a package, identified by name and purl.
pub fn make_package_resource_descriptor(name: &str, purl: &str) -> ResourceDescriptor {
    let mut rd = ResourceDescriptor::new();
    rd.name = name.to_string();
    rd.uri = purl.to_string();

    rd
}

/// The statement subject entry for a resolved subject.
pub fn subject_resource_descriptor(subject: &Subject) -> ResourceDescriptor {
    match subject {
        Subject::Package(pkg) => make_package_resource_descriptor(&pkg.name, &pkg.purl),
        Subject::Artifact(artifact) => {
            make_digest_resource_descriptor(&artifact.algorithm, &artifact.digest)
        }
    }
}

pub fn assemble_statement(
    statement_type: &str,
    subject: Vec<ResourceDescriptor>,
    predicate_type: &str,
    predicate: Struct,
) -> Statement {
    let mut statement = Statement::new();
    statement.type_ = statement_type.to_string();
    statement.subject = subject;
    statement.predicate_type = predicate_type.to_string();
    statement.predicate = MessageField::some(predicate);

    statement
}

/// Prints a statement in its protobuf JSON form.
pub fn statement_to_json(statement: &Statement) -> Result<String> {
    print_to_string(statement).map_err(|e| Error::EncodingFailure(e.to_string()))
}

/// Prints only the predicate body of a statement as JSON.
pub fn predicate_to_json(statement: &Statement) -> Result<String> {
    let predicate: &Struct = &statement.predicate;
    print_to_string(predicate).map_err(|e| Error::EncodingFailure(e.to_string()))
}
