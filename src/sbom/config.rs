use crate::cli::{CLI_NAME, CLI_VERSION};

/// Options shared by the SPDX and CycloneDX builders.
#[derive(Debug, Clone)]
pub struct SbomConfig {
    /// SPDX `creationInfo.creators` entries.
    pub creators: Vec<String>,
    /// Sort packages, files, components and edges by identifier instead of
    /// keeping graph traversal order.
    pub sorted: bool,
}

impl Default for SbomConfig {
    fn default() -> Self {
        Self {
            creators: vec![format!("Tool: {CLI_NAME}-{CLI_VERSION}")],
            sorted: false,
        }
    }
}

impl SbomConfig {
    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }
}
