//! # SLSA Provenance Attestations
//!
//! The graph keeps a SLSA predicate as a flat list of dotted key paths
//! (`slsa.buildDefinition.buildType`, `slsa.runDetails.byproducts.0.name`,
//! ...). This module rebuilds the tree with [`crate::keypath`], takes the
//! `slsa` subtree as the predicate body, and picks statement and predicate
//! types from the declared SLSA version.
//!
//! ## Examples
//!
//! ```
//! use graph_attest::graph::{ArtifactNode, HasSlsa, SlsaNode, SlsaPredicateEntry};
//! use graph_attest::slsa::{slsa_attestation, BUILD_PROVENANCE_PREDICATE_TYPE_V1};
//!
//! let node = HasSlsa {
//!     id: "slsa-1".to_string(),
//!     subject: ArtifactNode {
//!         id: "art-1".to_string(),
//!         algorithm: "sha256".to_string(),
//!         digest: "abc".to_string(),
//!     },
//!     slsa: SlsaNode {
//!         slsa_version: BUILD_PROVENANCE_PREDICATE_TYPE_V1.to_string(),
//!         slsa_predicate: vec![SlsaPredicateEntry {
//!             key: "slsa.buildDefinition.buildType".to_string(),
//!             value: "https://example.com/build".to_string(),
//!         }],
//!     },
//! };
//!
//! let statement = slsa_attestation(&node, "pkg:test/a@1").unwrap();
//! assert_eq!(statement.type_, "https://in-toto.io/Statement/v1");
//! assert_eq!(statement.subject[0].name, "a");
//! ```

use crate::error::{Error, Result};
use crate::graph::{HasSlsa, SlsaPredicateEntry};
use crate::in_toto::{self, STATEMENT_TYPE_V01, STATEMENT_TYPE_V1};
use crate::keypath::{self, FlatKeyValue, Scalar, Value};
use crate::subject::purl_name;

use in_toto_attestation::v1::statement::Statement;
use protobuf::well_known_types::struct_::Struct;

/// The SLSA v1 build provenance predicate type URI.
pub const BUILD_PROVENANCE_PREDICATE_TYPE_V1: &str = "https://slsa.dev/provenance/v1";

/// Predicate type used when the declared version is not a provenance URI.
pub const BUILD_PROVENANCE_PREDICATE_TYPE_V02: &str = "https://slsa.dev/provenance/v0.2";

const PROVENANCE_URI_PREFIX: &str = "https://slsa.dev/provenance/";

/// Root key holding the predicate body.
const PREDICATE_ROOT: &str = "slsa";

/// Statement and predicate types selected by a declared SLSA version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlsaVersion {
    pub statement_type: &'static str,
    pub predicate_type: String,
}

impl SlsaVersion {
    pub fn from_declared(declared: &str) -> Self {
        if declared == BUILD_PROVENANCE_PREDICATE_TYPE_V1 {
            return Self {
                statement_type: STATEMENT_TYPE_V1,
                predicate_type: BUILD_PROVENANCE_PREDICATE_TYPE_V1.to_string(),
            };
        }

        let predicate_type = if declared.starts_with(PROVENANCE_URI_PREFIX) {
            declared.to_string()
        } else {
            log::debug!("unrecognized SLSA version {declared:?}, using v0.2 predicate type");
            BUILD_PROVENANCE_PREDICATE_TYPE_V02.to_string()
        };

        Self {
            statement_type: STATEMENT_TYPE_V01,
            predicate_type,
        }
    }
}

/// Rebuilds the nested predicate from its flat entries and returns the
/// `slsa` subtree.
///
/// A missing subtree gives an empty predicate. A subtree that is not an
/// object cannot become a predicate and fails with
/// [`Error::EncodingFailure`].
pub fn build_provenance_predicate(entries: &[SlsaPredicateEntry]) -> Result<Value> {
    let flat: Vec<FlatKeyValue> = entries
        .iter()
        .map(|entry| FlatKeyValue::new(entry.key.as_str(), Scalar::infer(&entry.value)))
        .collect();

    let tree = keypath::reconstruct(&flat);

    match tree.get(PREDICATE_ROOT) {
        Some(predicate) if predicate.is_map() => Ok(predicate.clone()),
        Some(_) => Err(Error::EncodingFailure(format!(
            "SLSA `{PREDICATE_ROOT}` entry is not an object"
        ))),
        None => {
            log::warn!(
                "SLSA predicate has no `{PREDICATE_ROOT}` entries among {} keys",
                entries.len()
            );
            Ok(Value::Map(Default::default()))
        }
    }
}

/// Compiles a SLSA node into a statement whose subject is `purl` with the
/// node's artifact digest.
pub fn slsa_attestation(node: &HasSlsa, purl: &str) -> Result<Statement> {
    let version = SlsaVersion::from_declared(&node.slsa.slsa_version);
    let predicate = build_provenance_predicate(&node.slsa.slsa_predicate)?;
    let predicate: Struct = in_toto::to_struct_proto(&predicate)?;

    let mut subject = in_toto::make_minimal_resource_descriptor(
        &purl_name(purl),
        &node.subject.algorithm,
        &node.subject.digest,
    );
    subject.uri = purl.to_string();

    log::debug!(
        "assembled SLSA predicate {} for {} from {} entries",
        version.predicate_type,
        purl,
        node.slsa.slsa_predicate.len()
    );

    Ok(in_toto::assemble_statement(
        version.statement_type,
        vec![subject],
        &version.predicate_type,
        predicate,
    ))
}
