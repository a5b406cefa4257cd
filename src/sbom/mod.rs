//! # SBOM Attestations
//!
//! Compiles an SBOM node and its included software, occurrences and
//! dependencies into an in-toto statement carrying either an SPDX or a
//! CycloneDX predicate.
//!
//! ## Architecture
//!
//! ```text
//! HasSbom.subject --> subject::resolve --> TrackedSubject
//!                                               |
//!                       uri "urn:uuid:..." ? ---+--- otherwise
//!                              |                       |
//!                     cyclonedx::build            spdx::build
//!                              |                       |
//!                         CycloneDxBom            SpdxDocument
//!                              +-----------+-----------+
//!                                          |
//!                              in_toto::assemble_statement
//! ```
//!
//! Each build owns its index maps; nothing is shared between calls.

pub mod config;
pub mod cyclonedx;
pub mod spdx;

use crate::error::Result;
use crate::graph::lookup::{Cancellation, MetadataLookup};
use crate::graph::{ArtifactNode, HasSbom, OccurrenceEdge, VexStatement};
use crate::in_toto::{self, PREDICATE_TYPE_CYCLONEDX, PREDICATE_TYPE_SPDX, STATEMENT_TYPE_V01};
use crate::subject::{self, ArtifactSubject, PackageSubject, Subject};

use chrono::{DateTime, SecondsFormat, Utc};
use in_toto_attestation::v1::statement::Statement;
use protobuf::well_known_types::struct_::Struct;
use std::fmt;

pub use config::SbomConfig;

/// CycloneDX serial numbers are UUID URNs; SPDX namespaces are URLs.
const CYCLONEDX_URI_PREFIX: &str = "urn:uuid:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SbomFormat {
    Spdx,
    CycloneDx,
}

impl SbomFormat {
    pub fn from_uri(uri: &str) -> Self {
        if uri.starts_with(CYCLONEDX_URI_PREFIX) {
            SbomFormat::CycloneDx
        } else {
            SbomFormat::Spdx
        }
    }

    pub fn predicate_type(&self) -> &'static str {
        match self {
            SbomFormat::Spdx => PREDICATE_TYPE_SPDX,
            SbomFormat::CycloneDx => PREDICATE_TYPE_CYCLONEDX,
        }
    }
}

impl fmt::Display for SbomFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SbomFormat::Spdx => write!(f, "SPDX"),
            SbomFormat::CycloneDx => write!(f, "CycloneDX"),
        }
    }
}

/// The SBOM subject together with the package it stands for.
///
/// A package subject stands for itself. An artifact subject stands for the
/// package whose occurrence carries the artifact's id, if the SBOM has one.
#[derive(Debug, Clone)]
pub(crate) struct TrackedSubject {
    pub subject: Subject,
    pub package: Option<PackageSubject>,
}

impl TrackedSubject {
    pub fn new(subject: Subject, occurrences: &[OccurrenceEdge]) -> Result<Self> {
        let package = match &subject {
            Subject::Package(pkg) => Some(pkg.clone()),
            Subject::Artifact(artifact) => bound_package(artifact, occurrences)?,
        };

        Ok(Self { subject, package })
    }

    pub fn artifact(&self) -> Option<&ArtifactSubject> {
        match &self.subject {
            Subject::Artifact(artifact) => Some(artifact),
            Subject::Package(_) => None,
        }
    }

    pub fn package_id(&self) -> Option<&str> {
        self.package.as_ref().map(|pkg| pkg.id.as_str())
    }

    pub fn purl(&self) -> Option<&str> {
        self.package
            .as_ref()
            .map(|pkg| pkg.purl.as_str())
            .filter(|purl| !purl.is_empty())
    }

    /// True if `pkg` is the subject's own package entry.
    pub fn is_self(&self, pkg: &PackageSubject) -> bool {
        self.package_id() == Some(pkg.id.as_str()) || self.purl() == Some(pkg.purl.as_str())
    }

    /// True if an occurrence of `artifact` on `pkg` is the one binding the
    /// artifact subject to its package. Other packages carrying the same
    /// artifact keep their own checksum.
    pub fn is_binding(&self, artifact: &ArtifactNode, pkg: &PackageSubject) -> bool {
        self.artifact().is_some_and(|own| own.id == artifact.id)
            && self.package_id() == Some(pkg.id.as_str())
    }

    pub fn name(&self) -> String {
        match (&self.package, &self.subject) {
            (Some(pkg), _) => pkg.name.clone(),
            (None, Subject::Artifact(artifact)) => {
                format!("{}:{}", artifact.algorithm, artifact.digest)
            }
            (None, Subject::Package(pkg)) => pkg.name.clone(),
        }
    }

    /// Whether a VEX statement about `subject` concerns this SBOM subject.
    pub fn matches_vex_subject(&self, subject: &Subject) -> bool {
        match subject {
            Subject::Package(pkg) => self.package_id() == Some(pkg.id.as_str()),
            Subject::Artifact(artifact) => self
                .artifact()
                .is_some_and(|own| own.id == artifact.id),
        }
    }
}

fn bound_package(
    artifact: &ArtifactSubject,
    occurrences: &[OccurrenceEdge],
) -> Result<Option<PackageSubject>> {
    for occurrence in occurrences {
        if occurrence.artifact.id != artifact.id {
            continue;
        }
        if let Subject::Package(pkg) = subject::resolve(&occurrence.subject)? {
            log::debug!("artifact subject {} bound to package {}", artifact.id, pkg.purl);
            return Ok(Some(pkg));
        }
    }

    Ok(None)
}

/// RFC 3339 with second precision and a `Z` suffix.
pub(crate) fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Builds the predicate for `sbom` in the format its uri implies.
pub fn build_sbom_predicate(
    sbom: &HasSbom,
    vex: &[VexStatement],
    lookup: &dyn MetadataLookup,
    config: &SbomConfig,
    cancel: &Cancellation,
) -> Result<(SbomFormat, Struct)> {
    let subject = subject::resolve(&sbom.subject)?;
    build_predicate(sbom, &subject, vex, lookup, config, cancel)
}

fn build_predicate(
    sbom: &HasSbom,
    subject: &Subject,
    vex: &[VexStatement],
    lookup: &dyn MetadataLookup,
    config: &SbomConfig,
    cancel: &Cancellation,
) -> Result<(SbomFormat, Struct)> {
    let format = SbomFormat::from_uri(&sbom.uri);

    let predicate = match format {
        SbomFormat::Spdx => {
            let doc = spdx::build(sbom, subject, lookup, config, cancel)?;
            in_toto::to_struct_proto(&doc)?
        }
        SbomFormat::CycloneDx => {
            let bom = cyclonedx::build(sbom, subject, vex, lookup, config, cancel)?;
            in_toto::to_struct_proto(&bom)?
        }
    };

    Ok((format, predicate))
}

/// Compiles `sbom` into a complete attestation statement.
///
/// `vex` is only consulted for CycloneDX output.
pub fn sbom_attestation(
    sbom: &HasSbom,
    vex: &[VexStatement],
    lookup: &dyn MetadataLookup,
    config: &SbomConfig,
    cancel: &Cancellation,
) -> Result<Statement> {
    let subject = subject::resolve(&sbom.subject)?;
    let (format, predicate) = build_predicate(sbom, &subject, vex, lookup, config, cancel)?;

    log::debug!("assembled {} predicate for {}", format, sbom.uri);

    Ok(in_toto::assemble_statement(
        STATEMENT_TYPE_V01,
        vec![in_toto::subject_resource_descriptor(&subject)],
        format.predicate_type(),
        predicate,
    ))
}
