//! Configuration module for modmap
//!
//! Configuration can be loaded from a TOML file and/or environment variables.
//! Every section and field has a default, so an empty file is a valid config.

mod defaults;
mod loading;

pub use loading::STRICT_MODE_ENV;

#[cfg(test)]
mod tests;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use defaults::*;

/// File name looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILENAME: &str = "modmap.toml";

/// Source analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Source roots to analyze; the first one is the primary root
    #[serde(default)]
    pub source_roots: Vec<PathBuf>,

    /// Glob patterns of files to include, passed to the source analyzer as-is
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Glob patterns of files to exclude, passed to the source analyzer as-is
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Maximum number of source roots analyzed concurrently
    #[serde(default = "default_max_concurrent_roots")]
    pub max_concurrent_roots: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            source_roots: Vec::new(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            max_concurrent_roots: default_max_concurrent_roots(),
        }
    }
}

/// How leaves are grouped when clustering produced no module at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticGrouping {
    /// One module per top-level directory of the leaves' relative paths
    TopLevelDirectory,
    /// Fixed-size batches in leaf order
    FixedBatches,
}

/// Hierarchical clustering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Size budget of one module, in the oracle's size unit
    #[serde(default = "default_max_tokens_per_module")]
    pub max_tokens_per_module: usize,

    /// Size budget of a leaf module; not used by clustering itself
    #[serde(default = "default_max_tokens_per_leaf_module")]
    pub max_tokens_per_leaf_module: usize,

    /// Advisory maximum tree depth
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Stop recursing once `max_depth` levels exist
    #[serde(default)]
    pub enforce_max_depth: bool,

    /// Maximum number of oracle calls in flight
    #[serde(default = "default_max_concurrent_oracle_calls")]
    pub max_concurrent_oracle_calls: usize,

    /// Append component source text to the clustering prompt
    #[serde(default = "default_include_source_in_prompt")]
    pub include_source_in_prompt: bool,

    /// Prefixes the oracle is known to inject in front of identifiers
    #[serde(default = "default_noise_prefixes")]
    pub noise_prefixes: Vec<String>,

    /// Fallback grouping used when clustering yields no module
    #[serde(default = "default_synthetic_grouping")]
    pub synthetic_grouping: SyntheticGrouping,

    /// Batch size for [`SyntheticGrouping::FixedBatches`]
    #[serde(default = "default_synthetic_batch_size")]
    pub synthetic_batch_size: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_module: default_max_tokens_per_module(),
            max_tokens_per_leaf_module: default_max_tokens_per_leaf_module(),
            max_depth: default_max_depth(),
            enforce_max_depth: false,
            max_concurrent_oracle_calls: default_max_concurrent_oracle_calls(),
            include_source_in_prompt: default_include_source_in_prompt(),
            noise_prefixes: default_noise_prefixes(),
            synthetic_grouping: default_synthetic_grouping(),
            synthetic_batch_size: default_synthetic_batch_size(),
        }
    }
}

/// Graph validation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Abort on dangling component references instead of filtering them
    #[serde(default)]
    pub strict: bool,
}

/// Output location configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the module trees and the dependency graph dump
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub clustering: ClusteringConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.analysis.max_concurrent_roots == 0 {
            return Err(Error::config(
                "analysis.max_concurrent_roots must be greater than 0",
            ));
        }

        for pattern in self
            .analysis
            .include_patterns
            .iter()
            .chain(self.analysis.exclude_patterns.iter())
        {
            glob::Pattern::new(pattern).map_err(|e| {
                Error::config(format!("Invalid glob pattern '{pattern}': {e}"))
            })?;
        }

        if self.clustering.max_tokens_per_module == 0 {
            return Err(Error::config(
                "clustering.max_tokens_per_module must be greater than 0",
            ));
        }
        if self.clustering.max_tokens_per_leaf_module == 0 {
            return Err(Error::config(
                "clustering.max_tokens_per_leaf_module must be greater than 0",
            ));
        }
        if self.clustering.max_concurrent_oracle_calls == 0 {
            return Err(Error::config(
                "clustering.max_concurrent_oracle_calls must be greater than 0",
            ));
        }
        if self.clustering.synthetic_batch_size == 0 {
            return Err(Error::config(
                "clustering.synthetic_batch_size must be greater than 0",
            ));
        }
        if self.clustering.enforce_max_depth && self.clustering.max_depth == 0 {
            return Err(Error::config(
                "clustering.max_depth must be greater than 0 when enforce_max_depth is set",
            ));
        }

        Ok(())
    }
}
