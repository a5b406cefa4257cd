//! # Subject Resolution
//!
//! Normalizes a [`GraphNode`] into a [`Subject`]. The type discriminator is
//! inspected here and nowhere else: every builder downstream matches on the
//! variant.
//!
//! ## Examples
//!
//! ```
//! use graph_attest::graph::{GraphNode, NodeKind};
//! use graph_attest::subject::{resolve, Subject};
//!
//! let node = GraphNode {
//!     typename: Some(NodeKind::Artifact),
//!     id: "art-1".to_string(),
//!     algorithm: "sha256".to_string(),
//!     digest: "abc".to_string(),
//!     ..Default::default()
//! };
//!
//! match resolve(&node).unwrap() {
//!     Subject::Artifact(artifact) => assert_eq!(artifact.digest, "abc"),
//!     Subject::Package(_) => unreachable!(),
//! }
//! ```

use crate::error::{Error, Result};
use crate::graph::{GraphNode, NodeKind};

/// Namespace the graph uses for file pseudo-packages.
pub const FILES_NAMESPACE: &str = "files";

/// Qualifier holding a file pseudo-package's path.
pub const FILENAME_QUALIFIER: &str = "filename";

#[derive(Debug, Clone, PartialEq)]
pub struct PackageSubject {
    /// Id of the version level, the package's identity.
    pub id: String,
    pub package_type: String,
    pub namespace: String,
    pub name: String,
    pub version: String,
    pub purl: String,
    pub qualifiers: Vec<(String, String)>,
}

impl PackageSubject {
    pub fn is_file(&self) -> bool {
        self.namespace == FILES_NAMESPACE
    }

    /// Value of the last qualifier named `key`.
    pub fn qualifier(&self, key: &str) -> Option<&str> {
        self.qualifiers
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSubject {
    pub id: String,
    pub algorithm: String,
    pub digest: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    Package(PackageSubject),
    Artifact(ArtifactSubject),
}

impl Subject {
    pub fn node_id(&self) -> &str {
        match self {
            Subject::Package(pkg) => &pkg.id,
            Subject::Artifact(artifact) => &artifact.id,
        }
    }
}

pub fn resolve(node: &GraphNode) -> Result<Subject> {
    match node.typename {
        None => Err(Error::MalformedSubject(format!(
            "node {} has no type discriminator",
            node.id
        ))),
        Some(NodeKind::Package) => resolve_package_levels(node).map(Subject::Package),
        Some(NodeKind::Artifact) => {
            if node.algorithm.is_empty() || node.digest.is_empty() {
                return Err(Error::MalformedSubject(format!(
                    "artifact node {} has an empty algorithm or digest",
                    node.id
                )));
            }
            Ok(Subject::Artifact(ArtifactSubject {
                id: node.id.clone(),
                algorithm: node.algorithm.clone(),
                digest: node.digest.clone(),
            }))
        }
        Some(NodeKind::Unknown) => Err(Error::MalformedSubject(format!(
            "node {} is neither a package nor an artifact",
            node.id
        ))),
    }
}

/// Resolves a node that must be a package, such as a dependency endpoint.
pub fn resolve_package(node: &GraphNode) -> Result<PackageSubject> {
    match resolve(node)? {
        Subject::Package(pkg) => Ok(pkg),
        Subject::Artifact(artifact) => Err(Error::MalformedSubject(format!(
            "expected a package node, found artifact {}",
            artifact.id
        ))),
    }
}

fn resolve_package_levels(node: &GraphNode) -> Result<PackageSubject> {
    let missing = |level: &str| {
        Error::MalformedSubject(format!("package node {} has no {level}", node.id))
    };

    let namespace = node.namespaces.first().ok_or_else(|| missing("namespace"))?;
    let name = namespace.names.first().ok_or_else(|| missing("name"))?;
    let version = name.versions.first().ok_or_else(|| missing("version"))?;

    Ok(PackageSubject {
        id: version.id.clone(),
        package_type: node.package_type.clone(),
        namespace: namespace.namespace.clone(),
        name: name.name.clone(),
        version: version.version.clone(),
        purl: version.purl.clone(),
        qualifiers: version
            .qualifiers
            .iter()
            .map(|q| (q.key.clone(), q.value.clone()))
            .collect(),
    })
}

/// Derives a display name from a package URL.
///
/// `pkg:type/namespace/name@version?qualifiers#subpath` yields `name`.
/// Anything that is not a package URL is returned unchanged.
pub fn purl_name(purl: &str) -> String {
    let Some(rest) = purl.strip_prefix("pkg:") else {
        return purl.to_string();
    };

    let rest = rest.split('#').next().unwrap_or(rest);
    let rest = rest.split('?').next().unwrap_or(rest);
    let rest = rest.rsplit_once('@').map_or(rest, |(path, _)| path);

    match rest.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => name.to_string(),
        _ => rest.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{PackageName, PackageNamespace, PackageVersion, Qualifier};

    fn package_node() -> GraphNode {
        GraphNode {
            typename: Some(NodeKind::Package),
            id: "type-1".to_string(),
            package_type: "guac".to_string(),
            namespaces: vec![PackageNamespace {
                id: "ns-1".to_string(),
                namespace: FILES_NAMESPACE.to_string(),
                names: vec![PackageName {
                    id: "name-1".to_string(),
                    name: "sha256:abc".to_string(),
                    versions: vec![PackageVersion {
                        id: "ver-1".to_string(),
                        version: "".to_string(),
                        purl: "pkg:guac/files/sha256:abc?filename=bin/app".to_string(),
                        qualifiers: vec![Qualifier {
                            key: FILENAME_QUALIFIER.to_string(),
                            value: "bin/app".to_string(),
                        }],
                    }],
                }],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_package() {
        let subject = resolve(&package_node()).unwrap();
        let Subject::Package(pkg) = subject else {
            panic!("expected package subject");
        };
        assert_eq!(pkg.id, "ver-1");
        assert_eq!(pkg.package_type, "guac");
        assert!(pkg.is_file());
        assert_eq!(pkg.qualifier(FILENAME_QUALIFIER), Some("bin/app"));
        assert_eq!(pkg.qualifier("arch"), None);
    }

    #[test]
    fn test_resolve_missing_discriminator() {
        let mut node = package_node();
        node.typename = None;
        assert!(matches!(resolve(&node), Err(Error::MalformedSubject(_))));
    }

    #[test]
    fn test_resolve_missing_levels() {
        let mut no_namespace = package_node();
        no_namespace.namespaces.clear();
        assert!(matches!(resolve(&no_namespace), Err(Error::MalformedSubject(_))));

        let mut no_name = package_node();
        no_name.namespaces[0].names.clear();
        assert!(matches!(resolve(&no_name), Err(Error::MalformedSubject(_))));

        let mut no_version = package_node();
        no_version.namespaces[0].names[0].versions.clear();
        let err = resolve(&no_version).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_resolve_artifact_requires_digest() {
        let node = GraphNode {
            typename: Some(NodeKind::Artifact),
            id: "art-1".to_string(),
            algorithm: "sha256".to_string(),
            ..Default::default()
        };
        assert!(matches!(resolve(&node), Err(Error::MalformedSubject(_))));
    }

    #[test]
    fn test_resolve_unknown_kind() {
        let node = GraphNode {
            typename: Some(NodeKind::Unknown),
            ..Default::default()
        };
        assert!(resolve(&node).is_err());
    }

    #[test]
    fn test_resolve_package_rejects_artifact() {
        let node = GraphNode {
            typename: Some(NodeKind::Artifact),
            id: "art-1".to_string(),
            algorithm: "sha256".to_string(),
            digest: "abc".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            resolve_package(&node),
            Err(Error::MalformedSubject(_))
        ));
    }

    #[test]
    fn test_subject_node_id() {
        let subject = resolve(&package_node()).unwrap();
        assert_eq!(subject.node_id(), "ver-1");
    }

    #[test]
    fn test_purl_name() {
        assert_eq!(purl_name("pkg:test/a@1"), "a");
        assert_eq!(purl_name("pkg:npm/%40scope/left-pad@1.3.0"), "left-pad");
        assert_eq!(purl_name("pkg:pypi/django@1.11.1?arch=x86#sub/dir"), "django");
        assert_eq!(purl_name("pkg:generic/tool"), "tool");
        assert_eq!(purl_name("not-a-purl"), "not-a-purl");
    }
}
