//! End-to-end graph construction for one run

use crate::analyzer::{FilePatterns, SourceAnalyzer};
use crate::cross_namespace::{resolve_edges, EdgeResolutionStats};
use crate::leaves::{extract_leaves, LeafSet};
use crate::namespacer::Namespacer;
use crate::validation::{fingerprint, GraphValidator};
use modmap_core::config::AnalysisConfig;
use modmap_core::error::{Error, Result};
use modmap_core::registry::{ComponentRegistry, DependencyGraph};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Everything produced by graph construction
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub registry: ComponentRegistry,
    pub graph: DependencyGraph,
    pub leaves: LeafSet,
    /// SHA-256 digest of the canonical dependency graph
    pub fingerprint: String,
    pub edge_stats: EdgeResolutionStats,
    /// Namespace of the primary root
    pub primary_namespace: String,
    pub skipped_roots: Vec<PathBuf>,
}

/// Builds the namespaced, validated dependency graph and its leaf set
pub struct GraphBuilder {
    namespacer: Namespacer,
    roots: Vec<PathBuf>,
    validator: GraphValidator,
}

impl GraphBuilder {
    /// Create a builder for the roots listed in `config`
    pub fn new(
        analyzer: Arc<dyn SourceAnalyzer>,
        config: &AnalysisConfig,
        validator: GraphValidator,
    ) -> Result<Self> {
        if config.source_roots.is_empty() {
            return Err(Error::config("analysis.source_roots must not be empty"));
        }
        let patterns = FilePatterns::new(
            config.include_patterns.clone(),
            config.exclude_patterns.clone(),
        )?;
        Ok(Self {
            namespacer: Namespacer::new(analyzer, patterns, config.max_concurrent_roots),
            roots: config.source_roots.clone(),
            validator,
        })
    }

    pub async fn build(&self) -> Result<BuiltGraph> {
        let namespaced = self.namespacer.namespace(&self.roots).await?;
        let primary_namespace = namespaced
            .primary_namespace()
            .map(str::to_string)
            .unwrap_or_default();

        let mut registry = namespaced.registry;
        let edge_stats = resolve_edges(&mut registry, &namespaced.roots);
        let graph = registry.dependency_graph();
        self.validator.post_build(&registry, &graph)?;

        let digest = fingerprint(&graph)?;
        let leaves = extract_leaves(&registry, &graph);

        info!(
            components = registry.len(),
            edges = edge_stats.recorded(),
            cross_namespace = edge_stats.cross_namespace,
            leaves = leaves.leaves.len(),
            fingerprint = %digest,
            "Dependency graph built"
        );

        Ok(BuiltGraph {
            registry,
            graph,
            leaves,
            fingerprint: digest,
            edge_stats,
            primary_namespace,
            skipped_roots: namespaced.skipped_roots,
        })
    }
}
