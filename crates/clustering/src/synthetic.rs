//! Deterministic fallback grouping used when clustering yields no module

use modmap_core::config::SyntheticGrouping;
use modmap_core::module_tree::{ModuleNode, ModuleTree};
use modmap_core::registry::ComponentRegistry;
use std::collections::BTreeMap;

/// Module name used for files directly under a source root
pub const ROOT_GROUP: &str = "root";

fn group_name(segment: &str) -> String {
    segment.replace(['-', '.'], "_")
}

/// First directory of the component's relative path, if it has one
fn top_level_directory(relative_path: &str) -> Option<&str> {
    let mut parts = relative_path.split(['/', '\\']).filter(|p| !p.is_empty());
    let first = parts.next()?;
    parts.next().map(|_| first)
}

fn by_top_level_directory(leaves: &[String], registry: &ComponentRegistry) -> ModuleTree {
    let mut groups: BTreeMap<String, (String, Vec<String>)> = BTreeMap::new();
    for id in leaves {
        let directory = registry
            .get(id)
            .and_then(|c| top_level_directory(&c.relative_path));
        let (name, path) = match directory {
            Some(dir) => (group_name(dir), dir.to_string()),
            None => (ROOT_GROUP.to_string(), String::new()),
        };
        let entry = groups.entry(name).or_insert_with(|| (path, Vec::new()));
        if !entry.1.contains(id) {
            entry.1.push(id.clone());
        }
    }

    groups
        .into_iter()
        .map(|(name, (path, members))| ModuleNode::new(name, path, members))
        .collect()
}

fn by_fixed_batches(leaves: &[String], batch_size: usize) -> ModuleTree {
    let batches: Vec<&[String]> = leaves.chunks(batch_size.max(1)).collect();
    let width = batches.len().to_string().len();
    batches
        .into_iter()
        .enumerate()
        .map(|(i, batch)| ModuleNode::new(format!("batch_{:0width$}", i + 1), "", batch.to_vec()))
        .collect()
}

/// Group `leaves` without the oracle.
///
/// Every leaf lands in exactly one module, keeping leaf order inside each
/// module. Returns an empty tree only for an empty leaf set.
pub fn synthetic_grouping(
    leaves: &[String],
    registry: &ComponentRegistry,
    strategy: SyntheticGrouping,
    batch_size: usize,
) -> ModuleTree {
    match strategy {
        SyntheticGrouping::TopLevelDirectory => by_top_level_directory(leaves, registry),
        SyntheticGrouping::FixedBatches => by_fixed_batches(leaves, batch_size),
    }
}
