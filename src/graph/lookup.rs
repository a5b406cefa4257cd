//! External lookups issued while a document is built.
//!
//! The builders call these one at a time, in traversal order, and never cache
//! or retry them. Implementations must be safe to share across threads if the
//! caller runs builds in parallel.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// License and attribution facts recorded for a package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalInfo {
    #[serde(default)]
    pub declared_license: String,
    #[serde(default)]
    pub discovered_license: String,
    #[serde(default)]
    pub attribution: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

/// A severity score recorded against a vulnerability node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityRating {
    pub vulnerability_id: String,
    pub score_value: f64,
    pub score_type: String,
}

pub trait MetadataLookup {
    fn legal_info(&self, package_id: &str, cancel: &Cancellation) -> Result<Vec<LegalInfo>>;
    fn metadata(&self, package_id: &str, cancel: &Cancellation) -> Result<Vec<MetadataEntry>>;
    fn vulnerability_ratings(
        &self,
        vulnerability_id: &str,
        cancel: &Cancellation,
    ) -> Result<Vec<VulnerabilityRating>>;
}

/// Cancellation signal shared between a caller and an in-progress build.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fails with [`Error::Cancelled`] once [`cancel`](Self::cancel) was called.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}
