//! FQDN namespacing of per-root analysis output
//!
//! Every source root gets a namespace derived from its directory name, and
//! each symbol found under it is registered as `{namespace}.{local_id}`.
//! Roots are analyzed concurrently; merging happens afterwards on a single
//! task, in root order, into a registry keyed by sorted FQDN so the result
//! does not depend on completion order.

use crate::analyzer::{AnalysisOutput, FilePatterns, RawEdge, RawSymbol, SourceAnalyzer};
use futures::stream::{self, StreamExt};
use modmap_core::entities::{Component, ComponentKind};
use modmap_core::error::{Error, Result};
use modmap_core::fqdn;
use modmap_core::registry::{ComponentRegistry, InsertOutcome};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fallback namespace for roots without a usable directory name
const FALLBACK_NAMESPACE: &str = "repo";

/// A source root with its assigned namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    pub path: PathBuf,
    pub namespace: String,
    pub is_primary: bool,
}

/// Analysis output of one root after namespacing
#[derive(Debug, Clone)]
pub struct RootGraph {
    pub root: SourceRoot,
    /// Root-local id -> canonical id, for every symbol registered from this root
    pub local_ids: BTreeMap<String, String>,
    /// Raw edges as reported by the analyzer, still in local ids
    pub edges: Vec<RawEdge>,
}

/// Merged registry of every analyzed root
#[derive(Debug, Clone, Default)]
pub struct NamespacedGraph {
    pub registry: ComponentRegistry,
    pub roots: Vec<RootGraph>,
    /// Paths of roots that failed or yielded no symbols
    pub skipped_roots: Vec<PathBuf>,
}

impl NamespacedGraph {
    /// Namespace of the first root, whether or not it yielded symbols
    pub fn primary_namespace(&self) -> Option<&str> {
        self.roots
            .iter()
            .find(|r| r.root.is_primary)
            .map(|r| r.root.namespace.as_str())
    }
}

fn root_basename(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .or_else(|| {
            std::fs::canonicalize(path)
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        });
    match name {
        // A dot would make the namespace indistinguishable from an id prefix
        Some(name) if !name.is_empty() => name.replace('.', "_"),
        _ => FALLBACK_NAMESPACE.to_string(),
    }
}

/// Assign a namespace to every root.
///
/// The namespace is the root's directory name with dots replaced by `_`, so the
/// first segment of a canonical id always names its root. Roots sharing a name
/// get `_2`, `_3`, ... suffixes in the order given, so canonical ids stay unique
/// across roots. The first root is the primary one.
pub fn assign_namespaces(roots: &[PathBuf]) -> Vec<SourceRoot> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut assigned = Vec::with_capacity(roots.len());

    for (index, path) in roots.iter().enumerate() {
        let base = root_basename(path);
        let mut namespace = base.clone();
        let mut counter = 1;
        while taken.contains(&namespace) {
            counter += 1;
            namespace = format!("{base}_{counter}");
        }
        if namespace != base {
            warn!(
                root = %path.display(),
                namespace = %namespace,
                "Namespace '{base}' already used by another root, renamed"
            );
        }
        taken.insert(namespace.clone());
        assigned.push(SourceRoot {
            path: path.clone(),
            namespace,
            is_primary: index == 0,
        });
    }

    assigned
}

fn to_component(root: &SourceRoot, symbol: RawSymbol) -> Result<Component> {
    let id = fqdn::compose(&root.namespace, &symbol.local_id);
    Component::builder()
        .id(id)
        .name(symbol.name)
        .kind(ComponentKind::from_raw(&symbol.kind))
        .relative_path(symbol.relative_path)
        .file_path(symbol.file_path)
        .source_text(symbol.source_text)
        .start_line(symbol.start_line)
        .end_line(symbol.end_line)
        .docstring(symbol.docstring)
        .parameters(symbol.parameters)
        .base_classes(symbol.base_classes)
        .short_id(symbol.local_id)
        .namespace(root.namespace.clone())
        .is_external(!root.is_primary)
        .build()
        .map_err(|e| Error::invalid_input(format!("Failed to build component: {e}")))
}

/// Runs the source analyzer over every root and namespaces the results
pub struct Namespacer {
    analyzer: Arc<dyn SourceAnalyzer>,
    patterns: FilePatterns,
    max_concurrent_roots: usize,
}

impl Namespacer {
    pub fn new(
        analyzer: Arc<dyn SourceAnalyzer>,
        patterns: FilePatterns,
        max_concurrent_roots: usize,
    ) -> Self {
        Self {
            analyzer,
            patterns,
            max_concurrent_roots: max_concurrent_roots.max(1),
        }
    }

    /// Analyze all roots and merge them into one registry.
    ///
    /// A root whose analysis fails or yields no symbols is logged and skipped.
    pub async fn namespace(&self, roots: &[PathBuf]) -> Result<NamespacedGraph> {
        if roots.is_empty() {
            return Err(Error::invalid_input("at least one source root is required"));
        }

        let assigned = assign_namespaces(roots);
        info!(
            "Analyzing {} source root(s) with concurrency {}",
            assigned.len(),
            self.max_concurrent_roots
        );

        let analyzer = &self.analyzer;
        let patterns = &self.patterns;
        let mut results = stream::iter(assigned.into_iter().enumerate())
            .map(|(index, root)| async move {
                let output = analyzer.analyze(&root.path, patterns).await;
                (index, root, output)
            })
            .buffer_unordered(self.max_concurrent_roots)
            .collect::<Vec<_>>()
            .await;
        results.sort_by_key(|(index, _, _)| *index);

        let mut graph = NamespacedGraph::default();
        for (_, root, output) in results {
            match output {
                Ok(output) if !output.is_empty() => {
                    let root_graph = self.merge_root(&mut graph.registry, root, output)?;
                    graph.roots.push(root_graph);
                }
                Ok(_) => {
                    warn!(
                        root = %root.path.display(),
                        "Source root yielded no symbols, skipping"
                    );
                    graph.skipped_roots.push(root.path.clone());
                    graph.roots.push(RootGraph {
                        root,
                        local_ids: BTreeMap::new(),
                        edges: Vec::new(),
                    });
                }
                Err(e) => {
                    let failure = Error::source_analysis(root.path.display().to_string(), e.to_string());
                    warn!("{failure}, skipping root");
                    graph.skipped_roots.push(root.path.clone());
                    graph.roots.push(RootGraph {
                        root,
                        local_ids: BTreeMap::new(),
                        edges: Vec::new(),
                    });
                }
            }
        }

        info!(
            "Registered {} components from {} root(s), {} skipped",
            graph.registry.len(),
            graph.roots.len() - graph.skipped_roots.len(),
            graph.skipped_roots.len()
        );
        Ok(graph)
    }

    fn merge_root(
        &self,
        registry: &mut ComponentRegistry,
        root: SourceRoot,
        output: AnalysisOutput,
    ) -> Result<RootGraph> {
        let mut local_ids = BTreeMap::new();
        let mut kinds: BTreeMap<ComponentKind, usize> = BTreeMap::new();
        let mut duplicates = 0usize;

        for symbol in output.symbols {
            let local_id = symbol.local_id.clone();
            let component = to_component(&root, symbol)?;
            let id = component.id.clone();
            let kind = component.kind;
            match registry.insert(component) {
                InsertOutcome::Inserted => {
                    *kinds.entry(kind).or_insert(0) += 1;
                    local_ids.insert(local_id, id);
                }
                InsertOutcome::Duplicate => {
                    duplicates += 1;
                    match registry.get(&id) {
                        Some(kept) if kept.namespace != root.namespace => warn!(
                            id = %id,
                            kept_namespace = %kept.namespace,
                            namespace = %root.namespace,
                            "Canonical id collides with another root, keeping first record"
                        ),
                        _ => debug!(id = %id, "Duplicate symbol id in root, keeping first record"),
                    }
                }
            }
        }

        let breakdown = kinds
            .iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect::<Vec<_>>()
            .join(", ");
        info!(
            namespace = %root.namespace,
            external = !root.is_primary,
            duplicates,
            "Namespaced {} components ({breakdown})",
            local_ids.len()
        );

        Ok(RootGraph {
            root,
            local_ids,
            edges: output.edges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_namespaces_uses_basename() {
        let roots = vec![PathBuf::from("/work/main-app"), PathBuf::from("/vendor/libfoo")];
        let assigned = assign_namespaces(&roots);
        assert_eq!(assigned[0].namespace, "main-app");
        assert!(assigned[0].is_primary);
        assert_eq!(assigned[1].namespace, "libfoo");
        assert!(!assigned[1].is_primary);
    }

    #[test]
    fn test_assign_namespaces_renames_collisions() {
        let roots = vec![
            PathBuf::from("/a/service"),
            PathBuf::from("/b/service"),
            PathBuf::from("/c/service"),
        ];
        let namespaces: Vec<String> = assign_namespaces(&roots)
            .into_iter()
            .map(|r| r.namespace)
            .collect();
        assert_eq!(namespaces, vec!["service", "service_2", "service_3"]);
    }

    #[test]
    fn test_assign_namespaces_strips_dots() {
        let roots = vec![
            PathBuf::from("/x/a"),
            PathBuf::from("/y/a.b"),
            PathBuf::from("/z/a_b"),
        ];
        let namespaces: Vec<String> = assign_namespaces(&roots)
            .into_iter()
            .map(|r| r.namespace)
            .collect();
        assert_eq!(namespaces, vec!["a", "a_b", "a_b_2"]);
    }

    #[test]
    fn test_to_component_sets_identity_fields() {
        let root = SourceRoot {
            path: PathBuf::from("/deps/b"),
            namespace: "b".into(),
            is_primary: false,
        };
        let symbol = RawSymbol {
            local_id: "pkg.Baz".into(),
            name: "Baz".into(),
            kind: "Class".into(),
            file_path: PathBuf::from("/deps/b/pkg/baz.py"),
            relative_path: "pkg/baz.py".into(),
            source_text: "class Baz: pass".into(),
            start_line: 1,
            end_line: 1,
            docstring: None,
            parameters: vec![],
            base_classes: vec![],
        };
        let component = to_component(&root, symbol).unwrap();
        assert_eq!(component.id, "b.pkg.Baz");
        assert_eq!(component.short_id, "pkg.Baz");
        assert_eq!(component.namespace, "b");
        assert_eq!(component.kind, ComponentKind::Class);
        assert!(component.is_external);
    }
}
