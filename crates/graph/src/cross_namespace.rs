//! Dependency edge resolution across namespaces
//!
//! Edges arrive in root-local ids. The callee is looked up in the caller's own
//! root first; failing that, any registered component whose last dotted
//! segment equals the callee's is accepted, taking the smallest id when
//! several match. That fallback can bind a call to the wrong same-named
//! symbol of another namespace, so every such binding is logged.

use crate::namespacer::RootGraph;
use modmap_core::fqdn;
use modmap_core::registry::ComponentRegistry;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Counters describing one edge resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeResolutionStats {
    /// Edges bound within the caller's own root
    pub local: usize,
    /// Edges bound through the last-segment fallback
    pub cross_namespace: usize,
    /// Edges dropped because the callee could not be found
    pub unresolved: usize,
    /// Edges dropped because the caller is not registered
    pub unknown_caller: usize,
    /// Edges pointing back at the caller itself
    pub self_edges: usize,
    /// Edges already recorded by an earlier duplicate
    pub duplicates: usize,
}

impl EdgeResolutionStats {
    pub fn recorded(&self) -> usize {
        self.local + self.cross_namespace
    }
}

/// Index of registered ids by their last dotted segment, ids kept sorted
fn last_segment_index(registry: &ComponentRegistry) -> BTreeMap<String, Vec<String>> {
    let mut index: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for id in registry.ids() {
        index
            .entry(fqdn::last_dotted_segment(id).to_string())
            .or_default()
            .push(id.to_string());
    }
    index
}

/// Resolve every raw edge onto the callers' `depends_on` sets.
///
/// Never fails. Edges whose callee cannot be found anywhere are dropped, so
/// every recorded target is a registry key.
pub fn resolve_edges(registry: &mut ComponentRegistry, roots: &[RootGraph]) -> EdgeResolutionStats {
    let index = last_segment_index(registry);
    let mut stats = EdgeResolutionStats::default();

    for root in roots {
        for edge in &root.edges {
            let Some(caller) = root.local_ids.get(&edge.caller_local_id) else {
                stats.unknown_caller += 1;
                trace!(
                    namespace = %root.root.namespace,
                    caller = %edge.caller_local_id,
                    "Dropping edge from unregistered caller"
                );
                continue;
            };

            let (callee, cross) = match root.local_ids.get(&edge.callee_local_id) {
                Some(callee) => (callee.clone(), false),
                None => {
                    let segment = fqdn::last_dotted_segment(&edge.callee_local_id);
                    let candidate = index
                        .get(segment)
                        .and_then(|ids| ids.iter().find(|id| *id != caller));
                    match candidate {
                        Some(callee) => (callee.clone(), true),
                        None => {
                            stats.unresolved += 1;
                            debug!(
                                caller = %caller,
                                callee = %edge.callee_local_id,
                                analyzer_resolved = edge.resolved,
                                "Dropping unresolved dependency edge"
                            );
                            continue;
                        }
                    }
                }
            };

            if &callee == caller {
                stats.self_edges += 1;
                continue;
            }

            if !registry.add_dependency(caller, &callee) {
                stats.duplicates += 1;
                continue;
            }

            if cross {
                stats.cross_namespace += 1;
                debug!(
                    caller = %caller,
                    callee = %callee,
                    token = %edge.callee_local_id,
                    "Bound edge by last-segment match"
                );
            } else {
                stats.local += 1;
            }
        }
    }

    debug!(?stats, "Edge resolution finished");
    stats
}
