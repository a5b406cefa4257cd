//! # Graph Query Model
//!
//! Types describing what the graph service returns when asked for the
//! neighbors of an SBOM or SLSA node. They mirror the JSON shape of the query
//! results (camelCase fields, `__typename` discriminator) so a result set can
//! be deserialized directly.
//!
//! A package is stored as a chain of levels, each with its own node id:
//!
//! ```text
//! Package(type) -> namespaces[0] -> names[0] -> versions[0] (id, version, purl, qualifiers)
//! ```
//!
//! The version level's id is the package's identity everywhere else in the
//! crate. Turning a [`GraphNode`] into something typed is the job of
//! [`crate::subject::resolve`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod lookup;

/// Value of the `__typename` discriminator on a software node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Package,
    Artifact,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Qualifier {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageVersion {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub purl: String,
    #[serde(default)]
    pub qualifiers: Vec<Qualifier>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageName {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub versions: Vec<PackageVersion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageNamespace {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub names: Vec<PackageName>,
}

/// A software node: either a package trie or an artifact.
///
/// Only the fields of the variant named by `typename` are meaningful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    #[serde(rename = "__typename", default)]
    pub typename: Option<NodeKind>,
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub package_type: String,
    #[serde(default)]
    pub namespaces: Vec<PackageNamespace>,
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub digest: String,
}

impl GraphNode {
    pub fn is_package(&self) -> bool {
        self.typename == Some(NodeKind::Package)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactNode {
    pub id: String,
    pub algorithm: String,
    pub digest: String,
}

/// Asserts that `subject` has the checksum held by `artifact`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceEdge {
    pub subject: GraphNode,
    pub artifact: ArtifactNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependencyKind {
    Direct,
    Indirect,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    pub package: GraphNode,
    pub dependency_package: GraphNode,
    #[serde(default)]
    pub dependency_type: DependencyKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityId {
    pub id: String,
    #[serde(rename = "vulnerabilityID")]
    pub vulnerability_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub vulnerability_type: String,
    #[serde(rename = "vulnerabilityIDs", default)]
    pub vulnerability_ids: Vec<VulnerabilityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VexStatus {
    NotAffected,
    Affected,
    Fixed,
    UnderInvestigation,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VexJustification {
    ComponentNotPresent,
    VulnerableCodeNotPresent,
    VulnerableCodeNotInExecutePath,
    VulnerableCodeCannotBeControlledByAdversary,
    InlineMitigationsAlreadyExist,
    #[default]
    NotProvided,
    #[serde(other)]
    Unknown,
}

/// A VEX statement about one subject and one vulnerability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VexStatement {
    #[serde(default)]
    pub id: String,
    pub subject: GraphNode,
    pub vulnerability: VulnerabilityNode,
    pub status: VexStatus,
    #[serde(default)]
    pub vex_justification: VexJustification,
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub status_notes: String,
    pub known_since: DateTime<Utc>,
}

/// An SBOM node together with the graph slices scoped to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HasSbom {
    #[serde(default)]
    pub id: String,
    pub subject: GraphNode,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub digest: String,
    #[serde(default)]
    pub download_location: String,
    pub known_since: DateTime<Utc>,
    #[serde(default)]
    pub included_software: Vec<GraphNode>,
    #[serde(default)]
    pub included_occurrences: Vec<OccurrenceEdge>,
    #[serde(default)]
    pub included_dependencies: Vec<DependencyEdge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlsaPredicateEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlsaNode {
    #[serde(default)]
    pub slsa_version: String,
    #[serde(default)]
    pub slsa_predicate: Vec<SlsaPredicateEntry>,
}

/// A SLSA attestation node: the built artifact and its flattened predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HasSlsa {
    #[serde(default)]
    pub id: String,
    pub subject: ArtifactNode,
    pub slsa: SlsaNode,
}
