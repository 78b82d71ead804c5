//! Graph integrity checks and the deterministic graph fingerprint

use modmap_core::error::{Error, Result};
use modmap_core::registry::{ComponentRegistry, DependencyGraph};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

/// Result of checking a proposed id list against the registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreflightReport {
    /// Ids not present in the registry
    pub missing: Vec<String>,
    /// Proposed ids that exist, in their original order
    pub retained: Vec<String>,
}

impl PreflightReport {
    /// Whether every proposed id exists
    pub fn passed(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Result of checking a dependency graph against the registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostBuildReport {
    /// Graph nodes not present in the registry
    pub missing_nodes: Vec<String>,
    /// Edges whose target is not present in the registry
    pub broken_edges: Vec<(String, String)>,
}

impl PostBuildReport {
    pub fn passed(&self) -> bool {
        self.missing_nodes.is_empty() && self.broken_edges.is_empty()
    }
}

/// Validator for component references.
///
/// In non-strict mode dangling references are reported and filtered; in
/// strict mode they abort with [`Error::GraphIntegrity`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphValidator {
    strict: bool,
}

impl GraphValidator {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Check that every proposed id exists before it is handed to clustering
    pub fn preflight(&self, registry: &ComponentRegistry, proposed: &[String]) -> Result<PreflightReport> {
        let (retained, missing): (Vec<String>, Vec<String>) = proposed
            .iter()
            .cloned()
            .partition(|id| registry.contains(id));
        let report = PreflightReport { missing, retained };

        if !report.passed() {
            if self.strict {
                return Err(Error::GraphIntegrity {
                    missing: report.missing.len(),
                    broken_edges: 0,
                });
            }
            warn!(
                missing = report.missing.len(),
                sample = ?report.missing.iter().take(5).collect::<Vec<_>>(),
                "Pre-flight found ids absent from the registry, filtering them"
            );
        }
        Ok(report)
    }

    /// Check that every graph node and edge target exists in the registry
    pub fn post_build(
        &self,
        registry: &ComponentRegistry,
        graph: &DependencyGraph,
    ) -> Result<PostBuildReport> {
        let mut report = PostBuildReport::default();
        for (node, targets) in graph {
            if !registry.contains(node) {
                report.missing_nodes.push(node.clone());
            }
            for target in targets {
                if !registry.contains(target) {
                    report.broken_edges.push((node.clone(), target.clone()));
                }
            }
        }

        if !report.passed() {
            if self.strict {
                return Err(Error::GraphIntegrity {
                    missing: report.missing_nodes.len(),
                    broken_edges: report.broken_edges.len(),
                });
            }
            warn!(
                missing_nodes = report.missing_nodes.len(),
                broken_edges = report.broken_edges.len(),
                "Dependency graph references components outside the registry"
            );
        } else {
            info!(nodes = graph.len(), "Dependency graph passed integrity checks");
        }
        Ok(report)
    }
}

/// SHA-256 over the canonical JSON form of the graph.
///
/// Node ids and each node's edges are already sorted in a [`DependencyGraph`],
/// so equal graphs always produce equal digests.
pub fn fingerprint(graph: &DependencyGraph) -> Result<String> {
    let canonical = serde_json::to_vec(graph)?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use modmap_core::entities::{Component, ComponentKind};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn registry(ids: &[&str]) -> ComponentRegistry {
        ids.iter()
            .map(|id| {
                Component::builder()
                    .id(*id)
                    .name(*id)
                    .kind(ComponentKind::Class)
                    .relative_path("x.py")
                    .file_path(PathBuf::from("/x.py"))
                    .short_id(*id)
                    .namespace("ns")
                    .build()
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_preflight_filters_missing_in_lenient_mode() {
        let validator = GraphValidator::new(false);
        let report = validator
            .preflight(&registry(&["x"]), &["x".to_string(), "missing".to_string()])
            .unwrap();
        assert!(!report.passed());
        assert_eq!(report.retained, vec!["x".to_string()]);
        assert_eq!(report.missing, vec!["missing".to_string()]);
    }

    #[test]
    fn test_preflight_aborts_in_strict_mode() {
        let validator = GraphValidator::new(true);
        let result = validator.preflight(&registry(&["x"]), &["x".to_string(), "missing".to_string()]);
        assert!(matches!(
            result,
            Err(Error::GraphIntegrity { missing: 1, broken_edges: 0 })
        ));
    }

    #[test]
    fn test_post_build_reports_broken_edges() {
        let mut graph = DependencyGraph::new();
        graph.insert("x".into(), BTreeSet::from(["y".to_string(), "gone".to_string()]));
        graph.insert("ghost".into(), BTreeSet::new());

        let report = GraphValidator::new(false)
            .post_build(&registry(&["x", "y"]), &graph)
            .unwrap();
        assert_eq!(report.missing_nodes, vec!["ghost".to_string()]);
        assert_eq!(report.broken_edges, vec![("x".to_string(), "gone".to_string())]);

        let strict = GraphValidator::new(true).post_build(&registry(&["x", "y"]), &graph);
        assert!(strict.is_err());
    }

    #[test]
    fn test_fingerprint_is_stable_and_content_sensitive() {
        let mut a = DependencyGraph::new();
        a.insert("n1".into(), BTreeSet::from(["n2".to_string(), "n3".to_string()]));
        a.insert("n2".into(), BTreeSet::new());

        let mut b = DependencyGraph::new();
        b.insert("n2".into(), BTreeSet::new());
        b.insert("n1".into(), BTreeSet::from(["n3".to_string(), "n2".to_string()]));

        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
        assert_eq!(fingerprint(&a).unwrap().len(), 64);

        b.insert("n3".into(), BTreeSet::new());
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }
}
