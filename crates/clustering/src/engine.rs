//! Hierarchical clustering of leaf components into a module tree
//!
//! Each level runs the same sequence: pre-flight the leaf set, stop if it
//! already fits the size budget, ask the oracle for a partition, decode and
//! normalize the answer, attach the groups, then recurse into every group
//! concurrently. A malformed, failed or degenerate answer stops that level
//! without touching the tree.

use crate::context::ClusteringContext;
use crate::identifiers::{IdentifierMap, IdentifierResolver, Resolution};
use crate::oracle::Oracle;
use crate::prompt::{format_cluster_prompt, format_component_listing};
use crate::response::{parse_grouping, ProposedGrouping};
use futures::future::{join_all, BoxFuture, FutureExt};
use modmap_core::config::ClusteringConfig;
use modmap_core::error::{Error, Result};
use modmap_core::module_tree::{ModuleNode, ModulePath, ModuleTree};
use modmap_core::registry::ComponentRegistry;
use modmap_graph::validation::GraphValidator;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// How a single level ended
#[derive(Debug, Clone, PartialEq)]
pub enum LevelOutcome {
    /// The leaves fit the budget; the level stays one undivided module
    FitsBudget,
    /// The oracle proposed at least two non-empty groups
    Split(ModuleTree),
    /// The response had no decodable grouping block
    Malformed,
    /// The oracle collaborator failed to answer
    OracleFailed,
    /// Fewer than two non-empty groups survived normalization
    Degenerate,
}

/// Recursive clustering driver shared by every level of one run
pub struct ClusteringEngine {
    oracle: Arc<dyn Oracle>,
    registry: Arc<ComponentRegistry>,
    validator: GraphValidator,
    config: ClusteringConfig,
    concurrency_limiter: Arc<Semaphore>,
}

impl ClusteringEngine {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        registry: Arc<ComponentRegistry>,
        validator: GraphValidator,
        config: ClusteringConfig,
    ) -> Self {
        let permits = config.max_concurrent_oracle_calls.max(1);
        Self {
            oracle,
            registry,
            validator,
            config,
            concurrency_limiter: Arc::new(Semaphore::new(permits)),
        }
    }

    /// Cluster `leaves` below `path`.
    ///
    /// Returns `tree` with the new modules attached at `path`, or `tree`
    /// unchanged when the level was not split. Only cancellation and strict
    /// integrity violations are errors.
    pub async fn cluster(
        &self,
        ctx: &ClusteringContext,
        leaves: &[String],
        tree: &ModuleTree,
        path: &ModulePath,
    ) -> Result<ModuleTree> {
        let delta = self.cluster_level(ctx, leaves, tree, path.clone()).await?;
        if delta.is_empty() {
            return Ok(tree.clone());
        }
        info!(
            path = %path,
            modules = delta.module_count(),
            depth = delta.depth(),
            "Clustering produced new modules"
        );
        Ok(tree.grafted(path, delta))
    }

    /// Subtree produced for `leaves` at `path`, children included
    fn cluster_level<'a>(
        &'a self,
        ctx: &'a ClusteringContext,
        leaves: &'a [String],
        tree: &'a ModuleTree,
        path: ModulePath,
    ) -> BoxFuture<'a, Result<ModuleTree>> {
        async move {
            ctx.check_cancelled()?;

            let retained = self.validator.preflight(&self.registry, leaves)?.retained;
            if retained.is_empty() {
                debug!(path = %path, "No known components left at this level");
                return Ok(ModuleTree::new());
            }

            if self.config.enforce_max_depth && path.depth() >= self.config.max_depth {
                debug!(path = %path, max_depth = self.config.max_depth, "Maximum depth reached");
                return Ok(ModuleTree::new());
            }

            let mut delta = match self.split_level(ctx, &retained, tree, &path).await? {
                LevelOutcome::Split(delta) => delta,
                outcome => {
                    debug!(path = %path, outcome = ?outcome, "Level not split");
                    return Ok(ModuleTree::new());
                }
            };

            let context_tree = tree.grafted(&path, delta.clone());
            let recursable: Vec<(String, Vec<String>)> = delta
                .iter()
                .filter(|(_, node)| node.components.len() > 1 && node.components.len() < retained.len())
                .map(|(name, node)| (name.to_string(), node.components.clone()))
                .collect();

            let children = join_all(recursable.iter().map(|(name, members)| {
                self.cluster_level(ctx, members, &context_tree, path.child(name.clone()))
            }))
            .await;

            for ((name, _), child) in recursable.iter().zip(children) {
                let child = child?;
                if let Some(node) = delta.get_mut(name) {
                    node.children = child;
                }
            }
            Ok(delta)
        }
        .boxed()
    }

    /// Size of `components` with their source text, in the oracle's unit
    pub fn estimate_size(&self, components: &[String]) -> Result<usize> {
        let map = IdentifierMap::new(components);
        let listing = format_component_listing(&map, &self.registry);
        self.oracle.estimate_size(&listing.listing_with_source)
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Run one level of the state machine without recursing
    pub async fn split_level(
        &self,
        ctx: &ClusteringContext,
        leaves: &[String],
        tree: &ModuleTree,
        path: &ModulePath,
    ) -> Result<LevelOutcome> {
        let map = IdentifierMap::new(leaves);
        let listing = format_component_listing(&map, &self.registry);

        match self.oracle.estimate_size(&listing.listing_with_source) {
            Ok(size) if size <= self.config.max_tokens_per_module => {
                debug!(
                    path = %path,
                    size,
                    budget = self.config.max_tokens_per_module,
                    "Components fit in one module"
                );
                ctx.stats().record_within_budget();
                return Ok(LevelOutcome::FitsBudget);
            }
            Ok(size) => debug!(path = %path, size, leaves = map.len(), "Splitting level"),
            Err(e) => warn!(path = %path, error = %e, "Size estimation failed, asking oracle to split"),
        }

        let body = if self.config.include_source_in_prompt {
            &listing.listing_with_source
        } else {
            &listing.listing
        };
        let prompt = format_cluster_prompt(body, tree, path.leaf_name());

        let response = match self.call_oracle(ctx, &prompt).await? {
            Ok(response) => response,
            Err(e) => {
                warn!(path = %path, error = %e, "Oracle call failed, keeping level undivided");
                ctx.stats().record_oracle_failure();
                return Ok(LevelOutcome::OracleFailed);
            }
        };

        let proposed = match parse_grouping(&response) {
            Ok(proposed) => proposed,
            Err(e) => {
                warn!(path = %path, error = %e, "Discarding oracle response");
                ctx.stats().record_malformed();
                return Ok(LevelOutcome::Malformed);
            }
        };

        let delta = self.normalize(ctx, &map, proposed);
        if delta.len() <= 1 {
            debug!(path = %path, groups = delta.len(), "Degenerate grouping");
            ctx.stats().record_degenerate();
            return Ok(LevelOutcome::Degenerate);
        }
        Ok(LevelOutcome::Split(delta))
    }

    /// Bounded, cancellable oracle call.
    ///
    /// The outer result carries cancellation, the inner one the oracle's own
    /// failure.
    async fn call_oracle(&self, ctx: &ClusteringContext, prompt: &str) -> Result<Result<String>> {
        let _permit = tokio::select! {
            biased;
            _ = ctx.cancel_token().cancelled() => return Err(Error::Cancelled),
            permit = self.concurrency_limiter.acquire() => permit.map_err(|e| {
                Error::oracle(format!("Failed to acquire concurrency permit: {e}"))
            })?,
        };

        ctx.stats().record_oracle_call();
        tokio::select! {
            biased;
            _ = ctx.cancel_token().cancelled() => Err(Error::Cancelled),
            response = self.oracle.propose_grouping(prompt) => Ok(response),
        }
    }

    /// Resolve every proposed token and build the candidate delta.
    ///
    /// Unresolved tokens and duplicates within a group are dropped; groups
    /// left empty are dropped too.
    fn normalize(&self, ctx: &ClusteringContext, map: &IdentifierMap, proposed: ProposedGrouping) -> ModuleTree {
        let resolver = IdentifierResolver::new(map, &self.registry, &self.config.noise_prefixes);
        let mut delta = ModuleTree::new();

        for (name, group) in proposed {
            let mut seen = HashSet::new();
            let mut members = Vec::new();
            for token in &group.components {
                match resolver.resolve(token) {
                    Resolution::Resolved { fqdn, strategy } => {
                        ctx.stats().record_resolved(strategy);
                        if seen.insert(fqdn.clone()) {
                            members.push(fqdn);
                        }
                    }
                    Resolution::Unresolved(_) => ctx.stats().record_unresolved(),
                }
            }

            if members.is_empty() {
                debug!(group = %name, "Dropping group with no resolvable members");
                continue;
            }
            delta.insert(ModuleNode::new(name, group.path, members));
        }
        delta
    }
}
