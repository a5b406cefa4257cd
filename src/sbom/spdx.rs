//! SPDX 2.3 predicate generation
//!
//! Packages come from the included software, their checksums from the
//! included occurrences, and relationships from the included dependencies.
//! File pseudo-packages (namespace `files`) become SPDX file entries.

use super::{SbomConfig, TrackedSubject, format_timestamp};
use crate::cli::CLI_NAME;
use crate::error::Result;
use crate::graph::lookup::{Cancellation, LegalInfo, MetadataLookup};
use crate::graph::{ArtifactNode, DependencyEdge, GraphNode, HasSbom, OccurrenceEdge};
use crate::subject::{self, FILENAME_QUALIFIER, PackageSubject, Subject};

use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub const SPDX_VERSION: &str = "SPDX-2.3";
pub const DATA_LICENSE: &str = "CC0-1.0";
pub const DOCUMENT_SPDX_ID: &str = "SPDXRef-DOCUMENT";

const NOASSERTION: &str = "NOASSERTION";
const CATEGORY_PACKAGE_MANAGER: &str = "PACKAGE-MANAGER";
const CATEGORY_SECURITY: &str = "SECURITY";
const REF_TYPE_PURL: &str = "purl";
const REF_TYPE_CPE23: &str = "cpe23Type";
const RELATIONSHIP_OTHER: &str = "OTHER";

/// Metadata key whose values become CPE external references.
pub const CPE_METADATA_KEY: &str = "cpe";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxDocument {
    pub spdx_version: String,
    #[serde(rename = "SPDXID")]
    pub spdx_id: String,
    pub name: String,
    pub data_license: String,
    pub document_namespace: String,
    pub creation_info: SpdxCreationInfo,
    pub document_describes: Vec<String>,
    /// The attested subject itself; never repeated in `packages`.
    pub document_subject: SpdxDocumentSubject,
    pub packages: Vec<SpdxPackage>,
    pub files: Vec<SpdxFile>,
    pub relationships: Vec<SpdxRelationship>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpdxCreationInfo {
    pub created: String,
    pub creators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxDocumentSubject {
    #[serde(rename = "SPDXID")]
    pub spdx_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version_info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checksums: Vec<SpdxChecksum>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxPackage {
    #[serde(rename = "SPDXID")]
    pub spdx_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version_info: String,
    pub download_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_declared: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_concluded: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright_text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_refs: Vec<SpdxExternalRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checksums: Vec<SpdxChecksum>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxExternalRef {
    pub reference_category: String,
    pub reference_type: String,
    pub reference_locator: String,
}

impl SpdxExternalRef {
    fn purl(purl: &str) -> Self {
        Self {
            reference_category: CATEGORY_PACKAGE_MANAGER.to_string(),
            reference_type: REF_TYPE_PURL.to_string(),
            reference_locator: purl.to_string(),
        }
    }

    fn cpe(cpe: &str) -> Self {
        Self {
            reference_category: CATEGORY_SECURITY.to_string(),
            reference_type: REF_TYPE_CPE23.to_string(),
            reference_locator: cpe.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxChecksum {
    pub algorithm: String,
    pub checksum_value: String,
}

impl SpdxChecksum {
    fn new(algorithm: &str, value: &str) -> Self {
        Self {
            algorithm: checksum_algorithm(algorithm),
            checksum_value: value.to_string(),
        }
    }

    fn from_artifact(artifact: &ArtifactNode) -> Self {
        Self::new(&artifact.algorithm, &artifact.digest)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxFile {
    #[serde(rename = "SPDXID")]
    pub spdx_id: String,
    pub file_name: String,
    pub checksums: Vec<SpdxChecksum>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxRelationship {
    pub spdx_element_id: String,
    pub related_spdx_element: String,
    pub relationship_type: String,
}

/// SPDX spells algorithms upper-case without hyphens (`SHA256`), except
/// for the SHA-3 and BLAKE families.
fn checksum_algorithm(algorithm: &str) -> String {
    let upper = algorithm.to_ascii_uppercase();
    if upper.starts_with("SHA3") || upper.starts_with("BLAKE") {
        upper
    } else {
        upper.replace('-', "")
    }
}

fn element_id(node_id: &str) -> String {
    format!("SPDXRef-{node_id}")
}

fn push_unique(checksums: &mut Vec<SpdxChecksum>, checksum: SpdxChecksum) {
    if !checksums.contains(&checksum) {
        checksums.push(checksum);
    }
}

/// Index maps owned by one build.
struct SpdxBuildContext<'a> {
    tracked: &'a TrackedSubject,
    packages: Vec<SpdxPackage>,
    package_index: HashMap<String, usize>,
    files: Vec<SpdxFile>,
    // (declared name, filename qualifier): one conceptual file may appear as
    // several nodes, one per checksum.
    file_index: HashMap<(String, String), usize>,
    subject_checksums: Vec<SpdxChecksum>,
    relationships: Vec<SpdxRelationship>,
}

impl<'a> SpdxBuildContext<'a> {
    fn new(tracked: &'a TrackedSubject) -> Self {
        let subject_checksums = tracked
            .artifact()
            .map(|artifact| vec![SpdxChecksum::new(&artifact.algorithm, &artifact.digest)])
            .unwrap_or_default();

        Self {
            tracked,
            packages: Vec::new(),
            package_index: HashMap::new(),
            files: Vec::new(),
            file_index: HashMap::new(),
            subject_checksums,
            relationships: Vec::new(),
        }
    }

    fn add_packages(
        &mut self,
        software: &[GraphNode],
        lookup: &dyn MetadataLookup,
        cancel: &Cancellation,
    ) -> Result<()> {
        for node in software {
            if !node.is_package() {
                continue;
            }
            let pkg = subject::resolve_package(node)?;
            if pkg.is_file() || self.tracked.is_self(&pkg) {
                continue;
            }
            if self.package_index.contains_key(&pkg.id) {
                log::debug!("package {} listed more than once", pkg.id);
                continue;
            }

            let package = package_record(&pkg, lookup, cancel)?;
            self.package_index.insert(pkg.id.clone(), self.packages.len());
            self.packages.push(package);
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
            let checksum = SpdxChecksum::from_artifact(&occurrence.artifact);

            if pkg.is_file() {
                self.add_file(&pkg, checksum);
            } else if self.tracked.package_id() == Some(pkg.id.as_str()) {
                push_unique(&mut self.subject_checksums, checksum);
            } else if let Some(&idx) = self.package_index.get(&pkg.id) {
                push_unique(&mut self.packages[idx].checksums, checksum);
            } else {
                log::debug!("occurrence refers to package {} outside the SBOM", pkg.id);
            }
        }

        Ok(())
    }

    fn add_file(&mut self, pkg: &PackageSubject, checksum: SpdxChecksum) {
        let filename = pkg.qualifier(FILENAME_QUALIFIER).unwrap_or_default();
        let key = (pkg.name.clone(), filename.to_string());

        if let Some(&idx) = self.file_index.get(&key) {
            push_unique(&mut self.files[idx].checksums, checksum);
            return;
        }

        let file_name = if filename.is_empty() {
            pkg.name.clone()
        } else {
            filename.to_string()
        };
        self.file_index.insert(key, self.files.len());
        self.files.push(SpdxFile {
            spdx_id: element_id(&pkg.id),
            file_name,
            checksums: vec![checksum],
        });
    }

    /// One `OTHER` relationship per dependency edge. Self edges (same id or
    /// purl) are dropped, and a (package, dependency) pair repeated in the
    /// input is emitted once.
    fn add_relationships(&mut self, dependencies: &[DependencyEdge]) -> Result<()> {
        let mut seen = HashSet::new();

        for edge in dependencies {
            let package = subject::resolve_package(&edge.package)?;
            let dependency = subject::resolve_package(&edge.dependency_package)?;
            if package.purl == dependency.purl || package.id == dependency.id {
                log::debug!("dropping self relationship on {}", package.purl);
                continue;
            }
            if !seen.insert((package.id.clone(), dependency.id.clone())) {
                continue;
            }

            self.relationships.push(SpdxRelationship {
                spdx_element_id: element_id(&package.id),
                related_spdx_element: element_id(&dependency.id),
                relationship_type: RELATIONSHIP_OTHER.to_string(),
            });
        }

        Ok(())
    }

    fn sort(&mut self) {
        self.packages.sort_by(|a, b| a.spdx_id.cmp(&b.spdx_id));
        self.files.sort_by(|a, b| a.spdx_id.cmp(&b.spdx_id));
        self.relationships.sort_by(|a, b| {
            (&a.spdx_element_id, &a.related_spdx_element)
                .cmp(&(&b.spdx_element_id, &b.related_spdx_element))
        });
    }

    fn into_document(self, sbom: &HasSbom, config: &SbomConfig) -> SpdxDocument {
        let subject_id = element_id(
            self.tracked
                .package_id()
                .unwrap_or_else(|| self.tracked.subject.node_id()),
        );
        let name = self.tracked.name();

        let document_namespace = if sbom.uri.is_empty() {
            format!("https://{CLI_NAME}.dev/spdx/{}", uuid::Uuid::new_v4())
        } else {
            sbom.uri.clone()
        };

        SpdxDocument {
            spdx_version: SPDX_VERSION.to_string(),
            spdx_id: DOCUMENT_SPDX_ID.to_string(),
            name: name.clone(),
            data_license: DATA_LICENSE.to_string(),
            document_namespace,
            creation_info: SpdxCreationInfo {
                created: format_timestamp(&sbom.known_since),
                creators: config.creators.clone(),
            },
            document_describes: vec![subject_id.clone()],
            document_subject: SpdxDocumentSubject {
                spdx_id: subject_id,
                name,
                version_info: self
                    .tracked
                    .package
                    .as_ref()
                    .map(|pkg| pkg.version.clone())
                    .unwrap_or_default(),
                purl: self.tracked.purl().map(str::to_string),
                checksums: self.subject_checksums,
            },
            packages: self.packages,
            files: self.files,
            relationships: self.relationships,
        }
    }
}

fn package_record(
    pkg: &PackageSubject,
    lookup: &dyn MetadataLookup,
    cancel: &Cancellation,
) -> Result<SpdxPackage> {
    cancel.check()?;
    let legal: Option<LegalInfo> = lookup.legal_info(&pkg.id, cancel)?.into_iter().next();

    cancel.check()?;
    let metadata = lookup.metadata(&pkg.id, cancel)?;

    let mut external_refs = vec![SpdxExternalRef::purl(&pkg.purl)];
    external_refs.extend(
        metadata
            .iter()
            .filter(|entry| entry.key == CPE_METADATA_KEY)
            .map(|entry| SpdxExternalRef::cpe(&entry.value)),
    );

    let non_empty = |value: &str| Some(value.to_string()).filter(|v| !v.is_empty());

    Ok(SpdxPackage {
        spdx_id: element_id(&pkg.id),
        name: pkg.name.clone(),
        version_info: pkg.version.clone(),
        download_location: NOASSERTION.to_string(),
        license_declared: legal.as_ref().and_then(|l| non_empty(&l.declared_license)),
        license_concluded: legal.as_ref().and_then(|l| non_empty(&l.discovered_license)),
        copyright_text: legal.as_ref().and_then(|l| non_empty(&l.attribution)),
        external_refs,
        checksums: Vec::new(),
    })
}

/// Builds the SPDX document for `sbom`, whose already resolved subject is `subject`.
pub fn build(
    sbom: &HasSbom,
    subject: &Subject,
    lookup: &dyn MetadataLookup,
    config: &SbomConfig,
    cancel: &Cancellation,
) -> Result<SpdxDocument> {
    let tracked = TrackedSubject::new(subject.clone(), &sbom.included_occurrences)?;
    let mut ctx = SpdxBuildContext::new(&tracked);

    ctx.add_packages(&sbom.included_software, lookup, cancel)?;
    ctx.add_occurrences(&sbom.included_occurrences)?;
    ctx.add_relationships(&sbom.included_dependencies)?;
    if config.sorted {
        ctx.sort();
    }

    log::debug!(
        "SPDX document for {}: {} packages, {} files, {} relationships",
        sbom.uri,
        ctx.packages.len(),
        ctx.files.len(),
        ctx.relationships.len()
    );

    Ok(ctx.into_document(sbom, config))
}
