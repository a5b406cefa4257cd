use crate::error::{Error, Result};
use crate::graph::lookup::{
    Cancellation, LegalInfo, MetadataEntry, MetadataLookup, VulnerabilityRating,
};
use crate::graph::{
    ArtifactNode, DependencyEdge, DependencyKind, GraphNode, HasSbom, HasSlsa, NodeKind,
    OccurrenceEdge, PackageName, PackageNamespace, PackageVersion, Qualifier, SlsaNode,
    SlsaPredicateEntry, VexJustification, VexStatement, VexStatus, VulnerabilityId,
    VulnerabilityNode,
};
use crate::snapshot::GraphSnapshot;
use crate::subject::{FILENAME_QUALIFIER, FILES_NAMESPACE};
use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

/// Lookup answering from in-memory tables and recording every call.
#[derive(Default)]
pub struct MockLookup {
    legal: Vec<(String, LegalInfo)>,
    metadata: Vec<(String, MetadataEntry)>,
    ratings: Vec<(String, VulnerabilityRating)>,
    fail: bool,
    cancel_on_call: Option<Cancellation>,
    calls: Mutex<Vec<String>>,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_legal(
        mut self,
        package_id: &str,
        declared: &str,
        discovered: &str,
        attribution: &str,
    ) -> Self {
        self.legal.push((
            package_id.to_string(),
            LegalInfo {
                declared_license: declared.to_string(),
                discovered_license: discovered.to_string(),
                attribution: attribution.to_string(),
            },
        ));
        self
    }

    pub fn with_metadata(mut self, package_id: &str, key: &str, value: &str) -> Self {
        self.metadata.push((
            package_id.to_string(),
            MetadataEntry {
                key: key.to_string(),
                value: value.to_string(),
            },
        ));
        self
    }

    pub fn with_rating(self, vulnerability_id: &str, score: f64, score_type: &str) -> Self {
        self.with_foreign_rating(vulnerability_id, vulnerability_id, score, score_type)
    }

    /// Answers queries for `queried_id` with a rating recorded against `rated_id`.
    pub fn with_foreign_rating(
        mut self,
        queried_id: &str,
        rated_id: &str,
        score: f64,
        score_type: &str,
    ) -> Self {
        self.ratings.push((
            queried_id.to_string(),
            VulnerabilityRating {
                vulnerability_id: rated_id.to_string(),
                score_value: score,
                score_type: score_type.to_string(),
            },
        ));
        self
    }

    /// Every lookup fails with [`Error::LookupFailure`].
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Each lookup cancels `cancel` before answering.
    pub fn cancelling(mut self, cancel: Cancellation) -> Self {
        self.cancel_on_call = Some(cancel);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str, id: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{call}:{id}"));
        if let Some(cancel) = &self.cancel_on_call {
            cancel.cancel();
        }
        if self.fail {
            return Err(Error::LookupFailure(format!("{call} unavailable for {id}")));
        }
        Ok(())
    }
}

fn matching<T: Clone>(rows: &[(String, T)], id: &str) -> Vec<T> {
    rows.iter()
        .filter(|(key, _)| key == id)
        .map(|(_, row)| row.clone())
        .collect()
}

impl MetadataLookup for MockLookup {
    fn legal_info(&self, package_id: &str, _cancel: &Cancellation) -> Result<Vec<LegalInfo>> {
        self.record("legal_info", package_id)?;
        Ok(matching(&self.legal, package_id))
    }

    fn metadata(&self, package_id: &str, _cancel: &Cancellation) -> Result<Vec<MetadataEntry>> {
        self.record("metadata", package_id)?;
        Ok(matching(&self.metadata, package_id))
    }

    fn vulnerability_ratings(
        &self,
        vulnerability_id: &str,
        _cancel: &Cancellation,
    ) -> Result<Vec<VulnerabilityRating>> {
        self.record("vulnerability_ratings", vulnerability_id)?;
        Ok(matching(&self.ratings, vulnerability_id))
    }
}

pub fn known_since() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap()
}

pub fn cyclonedx_uri() -> String {
    format!("urn:uuid:{}", Uuid::new_v4())
}

pub fn artifact(id: &str, algorithm: &str, digest: &str) -> ArtifactNode {
    ArtifactNode {
        id: id.to_string(),
        algorithm: algorithm.to_string(),
        digest: digest.to_string(),
    }
}

pub fn artifact_node(id: &str, algorithm: &str, digest: &str) -> GraphNode {
    GraphNode {
        typename: Some(NodeKind::Artifact),
        id: id.to_string(),
        algorithm: algorithm.to_string(),
        digest: digest.to_string(),
        ..Default::default()
    }
}

fn package_trie(
    id: &str,
    package_type: &str,
    namespace: &str,
    name: &str,
    version: PackageVersion,
) -> GraphNode {
    GraphNode {
        typename: Some(NodeKind::Package),
        id: format!("{id}-type"),
        package_type: package_type.to_string(),
        namespaces: vec![PackageNamespace {
            id: format!("{id}-ns"),
            namespace: namespace.to_string(),
            names: vec![PackageName {
                id: format!("{id}-name"),
                name: name.to_string(),
                versions: vec![version],
            }],
        }],
        ..Default::default()
    }
}

/// A package node whose version level has id `id` and purl
/// `pkg:{package_type}/{name}@{version}`.
pub fn package_node(id: &str, package_type: &str, name: &str, version: &str) -> GraphNode {
    package_trie(
        id,
        package_type,
        "",
        name,
        PackageVersion {
            id: id.to_string(),
            version: version.to_string(),
            purl: format!("pkg:{package_type}/{name}@{version}"),
            qualifiers: vec![],
        },
    )
}

/// A file pseudo-package, optionally carrying a `filename` qualifier.
pub fn file_node(id: &str, name: &str, filename: Option<&str>) -> GraphNode {
    let (purl, qualifiers) = match filename {
        Some(filename) => (
            format!("pkg:guac/{FILES_NAMESPACE}/{name}?{FILENAME_QUALIFIER}={filename}"),
            vec![Qualifier {
                key: FILENAME_QUALIFIER.to_string(),
                value: filename.to_string(),
            }],
        ),
        None => (format!("pkg:guac/{FILES_NAMESPACE}/{name}"), vec![]),
    };

    package_trie(
        id,
        "guac",
        FILES_NAMESPACE,
        name,
        PackageVersion {
            id: id.to_string(),
            version: String::new(),
            purl,
            qualifiers,
        },
    )
}

pub fn occurrence(subject: GraphNode, artifact: ArtifactNode) -> OccurrenceEdge {
    OccurrenceEdge { subject, artifact }
}

pub fn dependency(
    package: GraphNode,
    dependency: GraphNode,
    kind: DependencyKind,
) -> DependencyEdge {
    DependencyEdge {
        package,
        dependency_package: dependency,
        dependency_type: kind,
    }
}

pub fn sbom(subject: GraphNode, uri: &str) -> HasSbom {
    HasSbom {
        id: format!("sbom-{}", subject.id),
        subject,
        uri: uri.to_string(),
        algorithm: "sha256".to_string(),
        digest: "feed".to_string(),
        download_location: String::new(),
        known_since: known_since(),
        included_software: vec![],
        included_occurrences: vec![],
        included_dependencies: vec![],
    }
}

/// A NOT_AFFECTED statement about `subject`, justified as not in the execute path.
pub fn vex(
    subject: GraphNode,
    vulnerability_node_id: &str,
    vulnerability_id: &str,
) -> VexStatement {
    VexStatement {
        id: format!("vex-{vulnerability_node_id}"),
        subject,
        vulnerability: VulnerabilityNode {
            id: vulnerability_node_id.to_string(),
            vulnerability_type: "cve".to_string(),
            vulnerability_ids: vec![VulnerabilityId {
                id: format!("{vulnerability_node_id}-id"),
                vulnerability_id: vulnerability_id.to_string(),
            }],
        },
        status: VexStatus::NotAffected,
        vex_justification: VexJustification::VulnerableCodeNotInExecutePath,
        statement: "not reachable from entry points".to_string(),
        status_notes: "checked by hand".to_string(),
        known_since: known_since(),
    }
}

pub fn slsa_node(subject: ArtifactNode, version: &str, entries: &[(&str, &str)]) -> HasSlsa {
    HasSlsa {
        id: format!("slsa-{}", subject.id),
        subject,
        slsa: SlsaNode {
            slsa_version: version.to_string(),
            slsa_predicate: entries
                .iter()
                .map(|(key, value)| SlsaPredicateEntry {
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        },
    }
}

/// A snapshot with an SPDX SBOM, a CycloneDX SBOM and one v1 SLSA node.
pub fn snapshot() -> GraphSnapshot {
    let mut spdx = sbom(package_node("p-1", "test", "a", "1"), "https://example.com/spdx/a");
    spdx.included_software = vec![package_node("p-2", "test", "b", "1")];
    spdx.included_dependencies = vec![dependency(
        package_node("p-1", "test", "a", "1"),
        package_node("p-2", "test", "b", "1"),
        DependencyKind::Direct,
    )];

    let cyclonedx = sbom(package_node("p-1", "test", "a", "1"), &cyclonedx_uri());

    GraphSnapshot {
        has_sbom: vec![spdx, cyclonedx],
        has_slsa: vec![slsa_node(
            artifact("art-1", "sha256", "abc"),
            "https://slsa.dev/provenance/v1",
            &[
                ("slsa.buildDefinition.buildType", "https://example.com/make"),
                ("slsa.runDetails.builder.id", "https://ci.example.com"),
            ],
        )],
        vex_statements: vec![vex(
            package_node("p-1", "test", "a", "1"),
            "vuln-1",
            "CVE-2024-0001",
        )],
        ..Default::default()
    }
}

/// Writes [`snapshot`] to `dir/snapshot.json`.
pub fn write_snapshot(dir: &Path) -> PathBuf {
    let path = dir.join("snapshot.json");
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot()).unwrap()).unwrap();
    path
}
