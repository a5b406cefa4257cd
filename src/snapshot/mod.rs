//! # Graph Snapshots
//!
//! A snapshot is a JSON export of the graph query results needed to build
//! attestations offline:
//!
//! ```json
//! {
//!   "hasSbom": [],
//!   "hasSlsa": [],
//!   "vexStatements": [],
//!   "certifyLegal": [{"packageId": "p-1", "declaredLicense": "MIT"}],
//!   "hasMetadata": [{"packageId": "p-1", "key": "cpe", "value": "cpe:2.3:..."}],
//!   "vulnerabilityMetadata": [
//!     {"vulnerabilityId": "v-1", "scoreValue": 9.8, "scoreType": "CVSSv31"}
//!   ]
//! }
//! ```
//!
//! Every list is optional. The snapshot answers the builders' metadata
//! lookups from its last three lists.

use crate::error::{Error, Result};
use crate::graph::lookup::{
    Cancellation, LegalInfo, MetadataEntry, MetadataLookup, VulnerabilityRating,
};
use crate::graph::{HasSbom, HasSlsa, VexStatement};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertifyLegalRecord {
    pub package_id: String,
    #[serde(flatten)]
    pub legal: LegalInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HasMetadataRecord {
    pub package_id: String,
    #[serde(flatten)]
    pub entry: MetadataEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    #[serde(default)]
    pub has_sbom: Vec<HasSbom>,
    #[serde(default)]
    pub has_slsa: Vec<HasSlsa>,
    #[serde(default)]
    pub vex_statements: Vec<VexStatement>,
    #[serde(default)]
    pub certify_legal: Vec<CertifyLegalRecord>,
    #[serde(default)]
    pub has_metadata: Vec<HasMetadataRecord>,
    #[serde(default)]
    pub vulnerability_metadata: Vec<VulnerabilityRating>,
}

impl GraphSnapshot {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let snapshot = Self::from_json(&content)?;

        log::debug!(
            "loaded snapshot {}: {} SBOMs, {} SLSA nodes, {} VEX statements",
            path.display(),
            snapshot.has_sbom.len(),
            snapshot.has_slsa.len(),
            snapshot.vex_statements.len()
        );

        Ok(snapshot)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Selects the SBOM with `uri`, or the only SBOM when no uri is given.
    pub fn sbom(&self, uri: Option<&str>) -> Result<&HasSbom> {
        let mut matches = self
            .has_sbom
            .iter()
            .filter(|sbom| uri.is_none_or(|uri| sbom.uri == uri));

        let selected = matches.next().ok_or_else(|| match uri {
            Some(uri) => Error::Validation(format!("no SBOM with uri {uri} in snapshot")),
            None => Error::Validation("snapshot contains no SBOM".to_string()),
        })?;

        if matches.next().is_some() {
            return Err(Error::Validation(match uri {
                Some(uri) => format!("several SBOMs share uri {uri}"),
                None => "snapshot contains several SBOMs, select one with --uri".to_string(),
            }));
        }

        Ok(selected)
    }

    /// Selects the SLSA node at `index`, or the only one when no index is given.
    pub fn slsa(&self, index: Option<usize>) -> Result<&HasSlsa> {
        match index {
            Some(index) => self.has_slsa.get(index).ok_or_else(|| {
                Error::Validation(format!(
                    "SLSA index {index} out of range, snapshot has {}",
                    self.has_slsa.len()
                ))
            }),
            None => match self.has_slsa.as_slice() {
                [only] => Ok(only),
                [] => Err(Error::Validation("snapshot contains no SLSA node".to_string())),
                _ => Err(Error::Validation(
                    "snapshot contains several SLSA nodes, select one with --index".to_string(),
                )),
            },
        }
    }
}

impl MetadataLookup for GraphSnapshot {
    fn legal_info(&self, package_id: &str, cancel: &Cancellation) -> Result<Vec<LegalInfo>> {
        cancel.check()?;
        Ok(self
            .certify_legal
            .iter()
            .filter(|record| record.package_id == package_id)
            .map(|record| record.legal.clone())
            .collect())
    }

    fn metadata(&self, package_id: &str, cancel: &Cancellation) -> Result<Vec<MetadataEntry>> {
        cancel.check()?;
        Ok(self
            .has_metadata
            .iter()
            .filter(|record| record.package_id == package_id)
            .map(|record| record.entry.clone())
            .collect())
    }

    fn vulnerability_ratings(
        &self,
        vulnerability_id: &str,
        cancel: &Cancellation,
    ) -> Result<Vec<VulnerabilityRating>> {
        cancel.check()?;
        Ok(self
            .vulnerability_metadata
            .iter()
            .filter(|rating| rating.vulnerability_id == vulnerability_id)
            .cloned()
            .collect())
    }
}
