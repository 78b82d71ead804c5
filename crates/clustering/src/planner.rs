//! Top-level run: graph, leaves, module tree, persisted outputs

use crate::context::{ClusteringContext, StatsSnapshot};
use crate::engine::ClusteringEngine;
use crate::oracle::Oracle;
use crate::store::TreeStore;
use crate::synthetic::synthetic_grouping;
use modmap_core::config::Config;
use modmap_core::error::{Error, Result};
use modmap_core::module_tree::{ModulePath, ModuleTree};
use modmap_core::registry::ComponentRegistry;
use modmap_graph::analyzer::SourceAnalyzer;
use modmap_graph::dump::write_dependency_graph;
use modmap_graph::validation::GraphValidator;
use modmap_graph::GraphBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Where the returned tree came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeSource {
    /// Loaded from the seed tree of a previous run
    Seed,
    /// Proposed by the oracle during this run
    Clustered,
    /// Built without the oracle because clustering produced no module
    Synthetic,
}

/// Result of one planning run
#[derive(Debug, Clone)]
pub struct PlannedTree {
    pub tree: ModuleTree,
    pub source: TreeSource,
    pub registry: Arc<ComponentRegistry>,
    pub leaves: Vec<String>,
    pub fingerprint: String,
    /// Module paths children-first, the order downstream generation walks them
    pub processing_order: Vec<ModulePath>,
    /// Leaf modules larger than the per-leaf-module budget
    pub oversized_leaf_modules: Vec<ModulePath>,
    pub dependency_graph_path: PathBuf,
    pub stats: StatsSnapshot,
}

/// Builds the module tree of a repository, reusing the seed tree when present
pub struct ModuleTreePlanner {
    analyzer: Arc<dyn SourceAnalyzer>,
    oracle: Arc<dyn Oracle>,
    config: Config,
}

impl ModuleTreePlanner {
    /// Create a planner; fails when `config` does not validate
    pub fn new(analyzer: Arc<dyn SourceAnalyzer>, oracle: Arc<dyn Oracle>, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            analyzer,
            oracle,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the whole pipeline.
    ///
    /// Nothing is written when the run is cancelled or fails. The seed tree is
    /// written before the dependency graph dump and the working tree.
    pub async fn plan(&self, ctx: &ClusteringContext) -> Result<PlannedTree> {
        ctx.check_cancelled()?;

        let validator = GraphValidator::new(self.config.validation.strict);
        let built = GraphBuilder::new(self.analyzer.clone(), &self.config.analysis, validator)?
            .build()
            .await?;
        if built.leaves.is_empty() {
            return Err(Error::NoAnalyzableLeaves);
        }

        let registry = Arc::new(built.registry);
        let leaves = built.leaves.leaves;
        let store = TreeStore::new(&self.config.output.output_dir);

        let engine = ClusteringEngine::new(
            self.oracle.clone(),
            registry.clone(),
            validator,
            self.config.clustering.clone(),
        );

        let (tree, source) = match store.load_seed()? {
            Some(seed) => {
                let seed = self.revalidate_seed(seed, &registry, validator)?;
                if seed.component_ids().is_empty() {
                    warn!(leaves = leaves.len(), "Seed module tree has no components, regrouping leaves");
                    let synthetic = self.synthetic_tree(&leaves, &registry);
                    ctx.check_cancelled()?;
                    store.replace_seed(&synthetic)?;
                    (synthetic, TreeSource::Synthetic)
                } else {
                    (seed, TreeSource::Seed)
                }
            }
            None => {
                let clustered = engine
                    .cluster(ctx, &leaves, &ModuleTree::new(), &ModulePath::root())
                    .await?;
                ctx.check_cancelled()?;

                let planned = if clustered.is_empty() {
                    info!(leaves = leaves.len(), "No modules from clustering, using synthetic grouping");
                    (self.synthetic_tree(&leaves, &registry), TreeSource::Synthetic)
                } else {
                    (clustered, TreeSource::Clustered)
                };
                store.save_seed(&planned.0)?;
                planned
            }
        };

        ctx.check_cancelled()?;
        let repo_name = if built.primary_namespace.is_empty() {
            "repo"
        } else {
            built.primary_namespace.as_str()
        };
        let dependency_graph_path = write_dependency_graph(&registry, store.output_dir(), repo_name)?;
        store.save_working(&tree)?;

        let stats = ctx.stats().snapshot();
        info!(
            source = ?source,
            modules = tree.module_count(),
            depth = tree.depth(),
            leaves = leaves.len(),
            oracle_calls = stats.oracle_calls,
            unresolved_tokens = stats.unresolved_tokens,
            "Module tree ready"
        );

        Ok(PlannedTree {
            processing_order: tree.processing_order(),
            oversized_leaf_modules: oversized_leaf_modules(&engine, &tree),
            tree,
            source,
            registry,
            leaves,
            fingerprint: built.fingerprint,
            dependency_graph_path,
            stats,
        })
    }

    fn synthetic_tree(&self, leaves: &[String], registry: &ComponentRegistry) -> ModuleTree {
        synthetic_grouping(
            leaves,
            registry,
            self.config.clustering.synthetic_grouping,
            self.config.clustering.synthetic_batch_size,
        )
    }

    /// Drop seed ids that no longer exist in the registry.
    ///
    /// Strict mode refuses a seed with dangling ids instead.
    fn revalidate_seed(
        &self,
        mut seed: ModuleTree,
        registry: &ComponentRegistry,
        validator: GraphValidator,
    ) -> Result<ModuleTree> {
        let removed = seed.retain_components(&|id: &str| registry.contains(id));
        if !removed.is_empty() {
            if validator.is_strict() {
                return Err(Error::GraphIntegrity {
                    missing: removed.len(),
                    broken_edges: 0,
                });
            }
            warn!(
                removed = removed.len(),
                sample = ?removed.iter().take(5).collect::<Vec<_>>(),
                "Seed module tree references unknown components, dropping them"
            );
        }
        Ok(seed)
    }
}

/// Leaf modules whose components exceed `max_tokens_per_leaf_module`
fn oversized_leaf_modules(engine: &ClusteringEngine, tree: &ModuleTree) -> Vec<ModulePath> {
    let budget = engine.config().max_tokens_per_leaf_module;
    tree.processing_order()
        .into_iter()
        .filter(|path| {
            let Some(node) = tree.node_at(path).filter(|node| node.is_leaf()) else {
                return false;
            };
            match engine.estimate_size(&node.components) {
                Ok(size) => size > budget,
                Err(e) => {
                    warn!(path = %path, error = %e, "Could not size leaf module");
                    false
                }
            }
        })
        .collect()
}
