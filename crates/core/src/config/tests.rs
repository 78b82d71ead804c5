//! Tests for configuration module

use super::*;
use crate::error::{Error, Result};
use std::io::Write;
use tempfile::NamedTempFile;

fn create_temp_config_file(content: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .map_err(|e| Error::config(format!("Failed to create temp file: {e}")))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::config(format!("Failed to write temp file: {e}")))?;
    file.flush()
        .map_err(|e| Error::config(format!("Failed to flush temp file: {e}")))?;
    Ok(file)
}

fn with_env_var<F, T>(key: &str, value: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    std::env::set_var(key, value);
    let result = f();
    std::env::remove_var(key);
    result
}

#[test]
fn test_from_toml_str_valid() {
    let toml = r#"
        [analysis]
        source_roots = ["/repo/main", "/repo/deps"]
        exclude_patterns = ["**/tests/**"]

        [clustering]
        max_tokens_per_module = 20000
        synthetic_grouping = "fixed_batches"
        synthetic_batch_size = 10

        [validation]
        strict = true
    "#;

    let config = Config::from_toml_str(toml).expect("Failed to parse valid TOML");
    assert_eq!(config.analysis.source_roots.len(), 2);
    assert_eq!(config.clustering.max_tokens_per_module, 20000);
    assert_eq!(
        config.clustering.synthetic_grouping,
        SyntheticGrouping::FixedBatches
    );
    assert_eq!(config.clustering.synthetic_batch_size, 10);
    assert!(config.validation.strict);
}

#[test]
fn test_from_toml_str_minimal() {
    let config = Config::from_toml_str("").expect("Failed to parse empty TOML");

    assert_eq!(config.clustering.max_tokens_per_module, 36_369);
    assert_eq!(config.clustering.max_tokens_per_leaf_module, 16_000);
    assert_eq!(config.clustering.max_depth, 2);
    assert!(!config.clustering.enforce_max_depth);
    assert_eq!(config.clustering.noise_prefixes, vec!["deps.".to_string()]);
    assert_eq!(
        config.clustering.synthetic_grouping,
        SyntheticGrouping::TopLevelDirectory
    );
    assert!(!config.validation.strict);
    assert_eq!(config.output.output_dir, PathBuf::from("output"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_toml_str_invalid_syntax() {
    let toml = r#"
        [clustering
        max_depth = 3
    "#;

    let result = Config::from_toml_str(toml);
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Failed to parse TOML"));
}

#[test]
fn test_validate_rejects_zero_budget() {
    let mut config = Config::default();
    config.clustering.max_tokens_per_module = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("max_tokens_per_module"));
}

#[test]
fn test_validate_rejects_zero_concurrency() {
    let mut config = Config::default();
    config.clustering.max_concurrent_oracle_calls = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.analysis.max_concurrent_roots = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_glob() {
    let mut config = Config::default();
    config.analysis.include_patterns = vec!["src/[".to_string()];
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Invalid glob pattern"));
}

#[test]
fn test_from_file_reads_values() {
    let file = create_temp_config_file(
        r#"
        [clustering]
        max_depth = 4
        enforce_max_depth = true

        [output]
        output_dir = "/tmp/modmap-out"
    "#,
    )
    .expect("temp file");

    let config = Config::from_file(file.path()).expect("load config");
    assert_eq!(config.clustering.max_depth, 4);
    assert!(config.clustering.enforce_max_depth);
    assert_eq!(config.output.output_dir, PathBuf::from("/tmp/modmap-out"));
}

#[test]
fn test_from_file_missing_uses_defaults() {
    let config = Config::from_file(std::path::Path::new("/nonexistent/modmap.toml"))
        .expect("missing file falls back to defaults");
    assert_eq!(config.clustering.max_tokens_per_module, 36_369);
}

#[test]
fn test_env_override_nested_value() {
    let file = create_temp_config_file("[clustering]\nmax_tokens_per_leaf_module = 9000\n")
        .expect("temp file");

    let config = with_env_var("MODMAP_CLUSTERING__MAX_TOKENS_PER_LEAF_MODULE", "12000", || {
        Config::from_file(file.path())
    })
    .expect("load config");
    assert_eq!(config.clustering.max_tokens_per_leaf_module, 12000);
}

#[test]
fn test_strict_mode_shorthand() {
    let file = create_temp_config_file("[validation]\nstrict = false\n").expect("temp file");

    let config = with_env_var(STRICT_MODE_ENV, "TRUE", || {
        Config::from_file(file.path())
    })
    .expect("load config");
    assert!(config.validation.strict);
}

#[test]
fn test_load_validates() {
    let file =
        create_temp_config_file("[clustering]\nsynthetic_batch_size = 0\n").expect("temp file");
    let result = Config::load(Some(file.path()));
    assert!(matches!(result, Err(Error::Config(_))));
}
