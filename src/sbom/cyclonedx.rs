//! CycloneDX 1.6 predicate generation
//!
//! Besides components and dependencies, the BOM carries a vulnerability
//! section built from the VEX statements made about the SBOM subject.

use super::{SbomConfig, TrackedSubject, format_timestamp};
use crate::error::{Error, Result};
use crate::graph::lookup::{Cancellation, MetadataLookup, VulnerabilityRating};
use crate::graph::{
    ArtifactNode, DependencyEdge, DependencyKind, GraphNode, HasSbom, OccurrenceEdge,
    VexJustification, VexStatement, VexStatus,
};
use crate::subject::{self, Subject};

use serde::Serialize;
use std::collections::HashMap;

pub const BOM_FORMAT: &str = "CycloneDX";
pub const SPEC_VERSION: &str = "1.6";
pub const BOM_VERSION: u32 = 1;

const COMPONENT_TYPE_LIBRARY: &str = "library";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycloneDxBom {
    pub bom_format: String,
    pub spec_version: String,
    pub serial_number: String,
    pub version: u32,
    pub metadata: CycloneDxMetadata,
    pub components: Vec<CycloneDxComponent>,
    pub dependencies: Vec<CycloneDxDependency>,
    pub vulnerabilities: Vec<CycloneDxVulnerability>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycloneDxMetadata {
    pub timestamp: String,
    pub component: CycloneDxComponent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycloneDxComponent {
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(rename = "bom-ref", skip_serializing_if = "String::is_empty")]
    pub bom_ref: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub purl: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hashes: Vec<CycloneDxHash>,
}

impl CycloneDxComponent {
    fn library() -> Self {
        Self {
            component_type: COMPONENT_TYPE_LIBRARY.to_string(),
            bom_ref: String::new(),
            name: String::new(),
            version: String::new(),
            purl: String::new(),
            hashes: Vec::new(),
        }
    }

    fn for_package(name: &str, version: &str, purl: &str) -> Self {
        Self {
            bom_ref: purl.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            purl: purl.to_string(),
            ..Self::library()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycloneDxHash {
    pub alg: String,
    pub content: String,
}

impl CycloneDxHash {
    fn new(algorithm: &str, digest: &str) -> Self {
        Self {
            alg: hash_algorithm(algorithm),
            content: digest.to_string(),
        }
    }

    fn from_artifact(artifact: &ArtifactNode) -> Self {
        Self::new(&artifact.algorithm, &artifact.digest)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycloneDxDependency {
    #[serde(rename = "ref")]
    pub reference: String,
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycloneDxVulnerability {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
    pub published: String,
    pub analysis: CycloneDxAnalysis,
    pub ratings: Vec<CycloneDxRating>,
    pub affects: Vec<CycloneDxAffects>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycloneDxAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycloneDxRating {
    pub score: f64,
    pub method: String,
}

impl From<VulnerabilityRating> for CycloneDxRating {
    fn from(rating: VulnerabilityRating) -> Self {
        Self {
            score: rating.score_value,
            method: scoring_method(&rating.score_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycloneDxAffects {
    #[serde(rename = "ref")]
    pub reference: String,
}

/// CycloneDX hash algorithm names (`sha256` -> `SHA-256`).
fn hash_algorithm(algorithm: &str) -> String {
    let canonical = match algorithm.to_ascii_lowercase().replace('_', "-").as_str() {
        "md5" => "MD5",
        "sha1" | "sha-1" => "SHA-1",
        "sha256" | "sha-256" => "SHA-256",
        "sha384" | "sha-384" => "SHA-384",
        "sha512" | "sha-512" => "SHA-512",
        "sha3-256" => "SHA3-256",
        "sha3-384" => "SHA3-384",
        "sha3-512" => "SHA3-512",
        "blake2b-256" => "BLAKE2b-256",
        "blake2b-384" => "BLAKE2b-384",
        "blake2b-512" => "BLAKE2b-512",
        "blake3" => "BLAKE3",
        _ => return algorithm.to_ascii_uppercase(),
    };
    canonical.to_string()
}

fn scoring_method(score_type: &str) -> String {
    const METHODS: [&str; 6] = ["CVSSv2", "CVSSv3", "CVSSv31", "CVSSv4", "OWASP", "SSVC"];

    METHODS
        .iter()
        .find(|method| method.eq_ignore_ascii_case(score_type))
        .map_or_else(|| "other".to_string(), |method| method.to_string())
}

fn analysis_state(status: VexStatus) -> Option<String> {
    let state = match status {
        VexStatus::NotAffected => "not_affected",
        VexStatus::Affected => "exploitable",
        VexStatus::Fixed => "resolved",
        VexStatus::UnderInvestigation => "in_triage",
        VexStatus::Unknown => return None,
    };
    Some(state.to_string())
}

fn analysis_justification(justification: VexJustification) -> Option<String> {
    let justification = match justification {
        VexJustification::ComponentNotPresent => "requires_dependency",
        VexJustification::VulnerableCodeNotPresent => "code_not_present",
        VexJustification::VulnerableCodeNotInExecutePath => "code_not_reachable",
        VexJustification::VulnerableCodeCannotBeControlledByAdversary => "requires_environment",
        VexJustification::InlineMitigationsAlreadyExist => "protected_by_mitigating_control",
        VexJustification::NotProvided | VexJustification::Unknown => return None,
    };
    Some(justification.to_string())
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// Index maps owned by one build.
struct CycloneDxBuildContext<'a> {
    tracked: &'a TrackedSubject,
    metadata_component: CycloneDxComponent,
    components: Vec<CycloneDxComponent>,
    // node id -> component; several nodes may share one purl.
    component_index: HashMap<String, usize>,
    ref_index: HashMap<String, usize>,
    hashes: HashMap<String, Vec<CycloneDxHash>>,
    dependencies: Vec<CycloneDxDependency>,
    vulnerabilities: Vec<CycloneDxVulnerability>,
}

impl<'a> CycloneDxBuildContext<'a> {
    fn new(tracked: &'a TrackedSubject) -> Self {
        let mut metadata_component = match &tracked.package {
            Some(pkg) => CycloneDxComponent::for_package(&pkg.name, &pkg.version, &pkg.purl),
            None => CycloneDxComponent::library(),
        };
        if let Some(artifact) = tracked.artifact() {
            metadata_component
                .hashes
                .push(CycloneDxHash::new(&artifact.algorithm, &artifact.digest));
        }

        Self {
            tracked,
            metadata_component,
            components: Vec::new(),
            component_index: HashMap::new(),
            ref_index: HashMap::new(),
            hashes: HashMap::new(),
            dependencies: Vec::new(),
            vulnerabilities: Vec::new(),
        }
    }

    fn add_components(&mut self, software: &[GraphNode]) -> Result<()> {
        for node in software {
            if !node.is_package() {
                continue;
            }
            let pkg = subject::resolve_package(node)?;
            if pkg.is_file() || self.component_index.contains_key(&pkg.id) {
                continue;
            }

            if let Some(&idx) = self.ref_index.get(&pkg.purl) {
                log::debug!("package {} shares bom-ref {}", pkg.id, pkg.purl);
                self.component_index.insert(pkg.id, idx);
                continue;
            }

            let idx = self.components.len();
            self.components
                .push(CycloneDxComponent::for_package(&pkg.name, &pkg.version, &pkg.purl));
            self.component_index.insert(pkg.id, idx);
            if !pkg.purl.is_empty() {
                self.ref_index.insert(pkg.purl, idx);
            }
        }

        Ok(())
    }

    fn add_occurrences(&mut self, occurrences: &[OccurrenceEdge]) -> Result<()> {
        for occurrence in occurrences {
            let pkg = match subject::resolve(&occurrence.subject)? {
                Subject::Package(pkg) => pkg,
                Subject::Artifact(artifact) => {
                    log::debug!("skipping occurrence on artifact {}", artifact.id);
                    continue;
                }
            };
            if self.tracked.is_binding(&occurrence.artifact, &pkg) {
                continue;
            }
            let hash = CycloneDxHash::from_artifact(&occurrence.artifact);

            if self.tracked.package_id() == Some(pkg.id.as_str()) {
                push_unique(&mut self.metadata_component.hashes, hash);
            } else {
                push_unique(self.hashes.entry(pkg.id).or_default(), hash);
            }
        }

        Ok(())
    }

    fn apply_hashes(&mut self) {
        for (node_id, hashes) in std::mem::take(&mut self.hashes) {
            let Some(&idx) = self.component_index.get(&node_id) else {
                continue;
            };
            for hash in hashes {
                push_unique(&mut self.components[idx].hashes, hash);
            }
        }
    }

    fn add_dependencies(&mut self, edges: &[DependencyEdge]) -> Result<()> {
        let mut index: HashMap<String, usize> = HashMap::new();

        for edge in edges {
            if edge.dependency_type != DependencyKind::Direct {
                continue;
            }
            let package = subject::resolve_package(&edge.package)?;
            let dependency = subject::resolve_package(&edge.dependency_package)?;
            if package.purl == dependency.purl || package.id == dependency.id {
                log::debug!("dropping self dependency on {}", package.purl);
                continue;
            }

            let idx = *index.entry(package.purl.clone()).or_insert_with(|| {
                self.dependencies.push(CycloneDxDependency {
                    reference: package.purl.clone(),
                    depends_on: Vec::new(),
                });
                self.dependencies.len() - 1
            });
            push_unique(&mut self.dependencies[idx].depends_on, dependency.purl);
        }

        Ok(())
    }

    fn add_vulnerabilities(
        &mut self,
        vex: &[VexStatement],
        serial_number: &str,
        lookup: &dyn MetadataLookup,
        cancel: &Cancellation,
    ) -> Result<()> {
        for statement in vex {
            let about = subject::resolve(&statement.subject)?;
            if !self.tracked.matches_vex_subject(&about) {
                log::debug!("VEX statement {} is about another subject", statement.id);
                continue;
            }

            let vulnerability = &statement.vulnerability;
            let id = vulnerability
                .vulnerability_ids
                .first()
                .map(|v| v.vulnerability_id.clone())
                .ok_or_else(|| {
                    Error::Validation(format!(
                        "vulnerability node {} has no vulnerability ID",
                        vulnerability.id
                    ))
                })?;

            cancel.check()?;
            let ratings = lookup
                .vulnerability_ratings(&vulnerability.id, cancel)?
                .into_iter()
                .filter(|rating| rating.vulnerability_id == vulnerability.id)
                .map(CycloneDxRating::from)
                .collect();

            self.vulnerabilities.push(CycloneDxVulnerability {
                id,
                description: statement.statement.clone(),
                detail: statement.status_notes.clone(),
                published: format_timestamp(&statement.known_since),
                analysis: CycloneDxAnalysis {
                    state: analysis_state(statement.status),
                    justification: analysis_justification(statement.vex_justification),
                    detail: statement.status_notes.clone(),
                },
                ratings,
                affects: vec![CycloneDxAffects {
                    reference: format!("{}#{}", serial_number, self.metadata_component.bom_ref),
                }],
            });
        }

        Ok(())
    }

    /// Components without the subject's own entry.
    fn emitted_components(&self) -> Vec<CycloneDxComponent> {
        let subject_ref = &self.metadata_component.bom_ref;
        self.components
            .iter()
            .filter(|c| subject_ref.is_empty() || &c.bom_ref != subject_ref)
            .cloned()
            .collect()
    }

    fn into_bom(self, sbom: &HasSbom, sorted: bool) -> CycloneDxBom {
        let mut components = self.emitted_components();
        let mut dependencies = self.dependencies;
        let mut vulnerabilities = self.vulnerabilities;

        if sorted {
            components.sort_by(|a, b| a.bom_ref.cmp(&b.bom_ref));
            dependencies.sort_by(|a, b| a.reference.cmp(&b.reference));
            for dependency in &mut dependencies {
                dependency.depends_on.sort();
            }
            vulnerabilities.sort_by(|a, b| a.id.cmp(&b.id));
        }

        CycloneDxBom {
            bom_format: BOM_FORMAT.to_string(),
            spec_version: SPEC_VERSION.to_string(),
            serial_number: sbom.uri.clone(),
            version: BOM_VERSION,
            metadata: CycloneDxMetadata {
                timestamp: format_timestamp(&sbom.known_since),
                component: self.metadata_component,
            },
            components,
            dependencies,
            vulnerabilities,
        }
    }
}

/// Builds the CycloneDX BOM for `sbom`, whose already resolved subject is
/// `subject`.
pub fn build(
    sbom: &HasSbom,
    subject: &Subject,
    vex: &[VexStatement],
    lookup: &dyn MetadataLookup,
    config: &SbomConfig,
    cancel: &Cancellation,
) -> Result<CycloneDxBom> {
    let tracked = TrackedSubject::new(subject.clone(), &sbom.included_occurrences)?;
    let mut ctx = CycloneDxBuildContext::new(&tracked);

    ctx.add_components(&sbom.included_software)?;
    ctx.add_occurrences(&sbom.included_occurrences)?;
    ctx.apply_hashes();
    ctx.add_dependencies(&sbom.included_dependencies)?;
    ctx.add_vulnerabilities(vex, &sbom.uri, lookup, cancel)?;

    log::debug!(
        "CycloneDX BOM {}: {} components, {} dependencies, {} vulnerabilities",
        sbom.uri,
        ctx.components.len(),
        ctx.dependencies.len(),
        ctx.vulnerabilities.len()
    );

    Ok(ctx.into_bom(sbom, config.sorted))
}
