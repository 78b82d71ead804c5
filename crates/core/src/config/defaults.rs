//! Default values and functions for configuration

use super::SyntheticGrouping;
use std::path::PathBuf;

// Default constants
pub(crate) const DEFAULT_MAX_TOKENS_PER_MODULE: usize = 36_369;
pub(crate) const DEFAULT_MAX_TOKENS_PER_LEAF_MODULE: usize = 16_000;
pub(crate) const DEFAULT_MAX_DEPTH: usize = 2;
pub(crate) const DEFAULT_OUTPUT_DIR: &str = "output";
pub(crate) const DEFAULT_NOISE_PREFIX: &str = "deps.";

pub(crate) fn default_max_concurrent_roots() -> usize {
    4
}

pub(crate) fn default_max_tokens_per_module() -> usize {
    DEFAULT_MAX_TOKENS_PER_MODULE
}

pub(crate) fn default_max_tokens_per_leaf_module() -> usize {
    DEFAULT_MAX_TOKENS_PER_LEAF_MODULE
}

pub(crate) fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

pub(crate) fn default_max_concurrent_oracle_calls() -> usize {
    4
}

pub(crate) fn default_include_source_in_prompt() -> bool {
    true
}

pub(crate) fn default_noise_prefixes() -> Vec<String> {
    vec![DEFAULT_NOISE_PREFIX.to_string()]
}

pub(crate) fn default_synthetic_grouping() -> SyntheticGrouping {
    SyntheticGrouping::TopLevelDirectory
}

pub(crate) fn default_synthetic_batch_size() -> usize {
    25
}

pub(crate) fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}
