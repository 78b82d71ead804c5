//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::defaults::*;
use super::{Config, DEFAULT_CONFIG_FILENAME};

/// Environment variable accepted as a shorthand for `validation.strict`
pub const STRICT_MODE_ENV: &str = "MODMAP_STRICT_MODE";

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `MODMAP_` and use double underscores
    /// for nested values. For example:
    /// - `MODMAP_CLUSTERING__MAX_TOKENS_PER_MODULE=20000`
    /// - `MODMAP_ANALYSIS__EXCLUDE_PATTERNS=**/tests/**,**/*_test.py`
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        let builder = set_config_default(
            builder,
            "clustering.max_tokens_per_module",
            DEFAULT_MAX_TOKENS_PER_MODULE as i64,
        )?;
        let builder = set_config_default(
            builder,
            "clustering.max_tokens_per_leaf_module",
            DEFAULT_MAX_TOKENS_PER_LEAF_MODULE as i64,
        )?;
        let builder =
            set_config_default(builder, "clustering.max_depth", DEFAULT_MAX_DEPTH as i64)?;
        let mut builder = set_config_default(builder, "validation.strict", false)?;

        // Add the config file if it exists
        if path.exists() {
            debug!(path = %path.display(), "Reading config file");
            builder = builder.add_source(File::from(path));
        } else {
            debug!(path = %path.display(), "No config file, using defaults and environment");
        }

        builder = builder.add_source(
            Environment::with_prefix("MODMAP")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("analysis.source_roots")
                .with_list_parse_key("analysis.include_patterns")
                .with_list_parse_key("analysis.exclude_patterns")
                .with_list_parse_key("clustering.noise_prefixes")
                .try_parsing(true),
        );

        if let Ok(strict) = std::env::var(STRICT_MODE_ENV) {
            builder = builder
                .set_override("validation.strict", strict.eq_ignore_ascii_case("true"))
                .map_err(|e| Error::config(format!("Failed to set {STRICT_MODE_ENV}: {e}")))?;
        }

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load and validate configuration
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (`./modmap.toml` or the given path)
    /// 3. Environment variables (`MODMAP_*`)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILENAME),
        };
        let config = Self::from_file(&path)?;
        config.validate()?;
        info!(
            roots = config.analysis.source_roots.len(),
            strict = config.validation.strict,
            output_dir = %config.output.output_dir.display(),
            "Configuration loaded"
        );
        Ok(config)
    }
}
