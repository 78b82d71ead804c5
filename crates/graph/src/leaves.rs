//! Leaf component extraction
//!
//! Cycles are collapsed into strongly-connected components first. Every member
//! of a component that nothing outside it depends on is a candidate; the
//! candidates are then filtered down to registered components of an accepted
//! kind.

use modmap_core::entities::ComponentKind;
use modmap_core::registry::{ComponentRegistry, DependencyGraph};
use petgraph::algo::condensation;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use tracing::{debug, info};

/// Substrings marking analyzer error placeholders rather than real ids
const ERROR_MARKERS: [&str; 4] = ["error", "exception", "failed", "invalid"];

/// Per-reason counts of rejected candidates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeafRejections {
    /// Empty ids or ids carrying an error marker
    pub invalid_identifier: usize,
    /// Ids absent from the registry
    pub not_in_registry: usize,
    /// Components whose kind is not accepted
    pub rejected_kind: usize,
}

impl LeafRejections {
    pub fn total(&self) -> usize {
        self.invalid_identifier + self.not_in_registry + self.rejected_kind
    }
}

/// Leaves selected for clustering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafSet {
    /// Accepted leaf ids, sorted
    pub leaves: Vec<String>,
    /// Number of candidates produced by the structural detector
    pub candidates: usize,
    pub rejections: LeafRejections,
    /// Kinds a leaf was allowed to have
    pub accepted_kinds: Vec<ComponentKind>,
}

impl LeafSet {
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

fn is_invalid_identifier(id: &str) -> bool {
    if id.trim().is_empty() {
        return true;
    }
    let lowered = id.to_lowercase();
    ERROR_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Kinds accepted as leaves for this registry.
///
/// Class, interface and struct by default; functions are accepted as well only
/// when the registry holds none of those three kinds.
pub fn accepted_kinds(registry: &ComponentRegistry) -> Vec<ComponentKind> {
    let mut kinds = ComponentKind::OBJECT_ORIENTED.to_vec();
    if !registry.has_any_kind(&ComponentKind::OBJECT_ORIENTED) {
        kinds.push(ComponentKind::Function);
    }
    kinds
}

/// Structural leaf candidates: members of strongly-connected components with
/// no incoming edge from another component. Returned sorted.
pub fn structural_candidates(graph: &DependencyGraph) -> Vec<String> {
    let mut digraph: DiGraph<&str, ()> = DiGraph::new();
    let mut indices: HashMap<&str, NodeIndex> = HashMap::new();
    for (node, targets) in graph {
        for id in std::iter::once(node).chain(targets) {
            indices
                .entry(id.as_str())
                .or_insert_with(|| digraph.add_node(id.as_str()));
        }
    }
    for (node, targets) in graph {
        let from = indices[node.as_str()];
        for target in targets {
            digraph.add_edge(from, indices[target.as_str()], ());
        }
    }

    // Cycles become single nodes; edges inside a cycle are dropped
    let condensed = condensation(digraph, true);
    let mut candidates: Vec<String> = condensed
        .node_indices()
        .filter(|&scc| {
            condensed
                .neighbors_directed(scc, Direction::Incoming)
                .next()
                .is_none()
        })
        .flat_map(|scc| condensed[scc].iter().map(|id| id.to_string()))
        .collect();
    candidates.sort_unstable();
    candidates
}

/// Compute the analyzable leaves of the graph
pub fn extract_leaves(registry: &ComponentRegistry, graph: &DependencyGraph) -> LeafSet {
    let candidates = structural_candidates(graph);
    let accepted = accepted_kinds(registry);
    let mut rejections = LeafRejections::default();
    let mut leaves = Vec::new();

    for candidate in &candidates {
        if is_invalid_identifier(candidate) {
            rejections.invalid_identifier += 1;
            debug!(id = %candidate, "Skipping invalid leaf identifier");
            continue;
        }
        let Some(component) = registry.get(candidate) else {
            rejections.not_in_registry += 1;
            debug!(id = %candidate, "Leaf candidate not found in registry");
            continue;
        };
        if !accepted.contains(&component.kind) {
            rejections.rejected_kind += 1;
            continue;
        }
        leaves.push(candidate.clone());
    }

    info!(
        candidates = candidates.len(),
        kept = leaves.len(),
        invalid = rejections.invalid_identifier,
        unknown = rejections.not_in_registry,
        wrong_kind = rejections.rejected_kind,
        "Leaf extraction finished"
    );

    LeafSet {
        leaves,
        candidates: candidates.len(),
        rejections,
        accepted_kinds: accepted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modmap_core::entities::Component;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    fn component(id: &str, kind: ComponentKind) -> Component {
        Component::builder()
            .id(id)
            .name(id)
            .kind(kind)
            .relative_path("x.py")
            .file_path(PathBuf::from("/x.py"))
            .short_id(id)
            .namespace("a")
            .build()
            .unwrap()
    }

    fn graph(edges: &[(&str, &[&str])]) -> DependencyGraph {
        edges
            .iter()
            .map(|(node, targets)| {
                (
                    node.to_string(),
                    targets.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
                )
            })
            .collect()
    }

    #[test]
    fn test_candidates_are_not_depended_upon() {
        let g = graph(&[("a.Top", &["a.Mid"]), ("a.Mid", &["a.Low"]), ("a.Low", &[]), ("a.Alone", &[])]);
        assert_eq!(structural_candidates(&g), vec!["a.Alone", "a.Top"]);
    }

    #[test]
    fn test_cycles_collapse_into_one_candidate_group() {
        let g = graph(&[("a.X", &["a.Y"]), ("a.Y", &["a.X", "a.Z"]), ("a.Z", &[])]);
        assert_eq!(structural_candidates(&g), vec!["a.X", "a.Y"]);

        let cycle_with_entry = graph(&[("a.E", &["a.X"]), ("a.X", &["a.Y"]), ("a.Y", &["a.X"])]);
        assert_eq!(structural_candidates(&cycle_with_entry), vec!["a.E"]);
    }

    #[test]
    fn test_self_reference_does_not_hide_a_leaf() {
        let g = graph(&[("a.Node", &["a.Node", "a.Value"]), ("a.Value", &[])]);
        assert_eq!(structural_candidates(&g), vec!["a.Node"]);

        let diamond = graph(&[
            ("a.Top", &["a.L", "a.R"]),
            ("a.L", &["a.Bottom"]),
            ("a.R", &["a.Bottom"]),
            ("a.Bottom", &[]),
        ]);
        assert_eq!(structural_candidates(&diamond), vec!["a.Top"]);
    }

    #[test]
    fn test_extract_filters_by_reason() {
        let registry: ComponentRegistry = vec![
            component("a.Service", ComponentKind::Class),
            component("a.helper", ComponentKind::Function),
            component("a.ParseError", ComponentKind::Class),
        ]
        .into_iter()
        .collect();
        let g = graph(&[("a.Service", &[]), ("a.helper", &[]), ("a.ParseError", &[]), ("a.Ghost", &[])]);

        let leaves = extract_leaves(&registry, &g);
        assert_eq!(leaves.leaves, vec!["a.Service".to_string()]);
        assert_eq!(leaves.candidates, 4);
        assert_eq!(
            leaves.rejections,
            LeafRejections {
                invalid_identifier: 1,
                not_in_registry: 1,
                rejected_kind: 1,
            }
        );
    }

    #[test]
    fn test_functions_accepted_without_object_oriented_kinds() {
        let registry: ComponentRegistry = vec![
            component("c.main", ComponentKind::Function),
            component("c.parse", ComponentKind::Function),
        ]
        .into_iter()
        .collect();
        let g = graph(&[("c.main", &["c.parse"]), ("c.parse", &[])]);

        let leaves = extract_leaves(&registry, &g);
        assert!(leaves.accepted_kinds.contains(&ComponentKind::Function));
        assert_eq!(leaves.leaves, vec!["c.main".to_string()]);
    }
}
