//! Full component and edge dump
//!
//! Written as `{sanitized-repo-name}_dependency_graph.json`: a JSON object
//! keyed by canonical id, keys sorted, every component carrying its sorted
//! `depends_on` set.

use modmap_core::entities::Component;
use modmap_core::error::Result;
use modmap_core::fqdn::sanitize_name;
use modmap_core::persist::write_json_atomic;
use modmap_core::registry::ComponentRegistry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Suffix of the dependency graph dump file name
pub const DEPENDENCY_GRAPH_SUFFIX: &str = "_dependency_graph.json";

/// File name of the dump for a repository
pub fn dependency_graph_file_name(repo_name: &str) -> String {
    format!("{}{DEPENDENCY_GRAPH_SUFFIX}", sanitize_name(repo_name))
}

/// Write the registry to `output_dir`, returning the written path
pub fn write_dependency_graph(
    registry: &ComponentRegistry,
    output_dir: &Path,
    repo_name: &str,
) -> Result<PathBuf> {
    let path = output_dir.join(dependency_graph_file_name(repo_name));
    let dump: BTreeMap<&str, &Component> = registry.iter().collect();
    write_json_atomic(&path, &dump)?;
    info!(
        path = %path.display(),
        components = dump.len(),
        "Wrote dependency graph"
    );
    Ok(path)
}
