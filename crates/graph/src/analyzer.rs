//! Seam to the per-language source analyzer
//!
//! Parsing source files is delegated to a [`SourceAnalyzer`] implementation.
//! It turns one source root into raw symbol and edge records expressed in
//! root-local ids; everything downstream works on those records only.

use async_trait::async_trait;
use modmap_core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A symbol reported by the analyzer, keyed by its root-local id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSymbol {
    pub local_id: String,
    pub name: String,
    /// Free-form kind string, mapped onto `ComponentKind` when namespaced
    pub kind: String,
    pub file_path: PathBuf,
    pub relative_path: String,
    #[serde(default)]
    pub source_text: String,
    #[serde(default)]
    pub start_line: usize,
    #[serde(default)]
    pub end_line: usize,
    #[serde(default)]
    pub docstring: Option<String>,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub base_classes: Vec<String>,
}

/// A dependency between two root-local ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEdge {
    pub caller_local_id: String,
    pub callee_local_id: String,
    /// Whether the analyzer bound the callee to a symbol of the same root
    #[serde(default)]
    pub resolved: bool,
}

impl RawEdge {
    pub fn new(caller: impl Into<String>, callee: impl Into<String>, resolved: bool) -> Self {
        Self {
            caller_local_id: caller.into(),
            callee_local_id: callee.into(),
            resolved,
        }
    }
}

/// Everything the analyzer found under one source root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub symbols: Vec<RawSymbol>,
    pub edges: Vec<RawEdge>,
}

impl AnalysisOutput {
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Include/exclude glob patterns handed to the analyzer unmodified
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePatterns {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl FilePatterns {
    /// Build a pattern set, rejecting patterns that are not valid globs
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Result<Self> {
        for pattern in include.iter().chain(exclude.iter()) {
            glob::Pattern::new(pattern).map_err(|e| {
                Error::invalid_input(format!("Invalid glob pattern '{pattern}': {e}"))
            })?;
        }
        Ok(Self { include, exclude })
    }

    pub fn include(&self) -> Option<&[String]> {
        (!self.include.is_empty()).then_some(self.include.as_slice())
    }

    pub fn exclude(&self) -> Option<&[String]> {
        (!self.exclude.is_empty()).then_some(self.exclude.as_slice())
    }
}

/// Trait for per-language source analyzers
///
/// Implementations must be deterministic for a fixed source tree: the same
/// root and patterns yield the same records.
#[async_trait]
pub trait SourceAnalyzer: Send + Sync {
    /// Analyze every matching file under `root`
    ///
    /// # Arguments
    /// * `root` - Source root to analyze
    /// * `patterns` - Include/exclude globs, applied by the analyzer
    ///
    /// # Returns
    /// Raw symbols and edges expressed in ids local to `root`
    async fn analyze(&self, root: &Path, patterns: &FilePatterns) -> Result<AnalysisOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_patterns_reject_invalid_glob() {
        let err = FilePatterns::new(vec!["src/[".into()], vec![]).unwrap_err();
        assert!(err.to_string().contains("Invalid glob pattern"));
    }

    #[test]
    fn test_file_patterns_empty_lists_are_absent() {
        let patterns = FilePatterns::new(vec![], vec!["**/tests/**".into()]).unwrap();
        assert!(patterns.include().is_none());
        assert_eq!(patterns.exclude().map(<[String]>::len), Some(1));
    }

    #[test]
    fn test_raw_symbol_optional_fields_default() {
        let symbol: RawSymbol = serde_json::from_value(serde_json::json!({
            "local_id": "pkg.Foo",
            "name": "Foo",
            "kind": "class",
            "file_path": "/repo/pkg/foo.py",
            "relative_path": "pkg/foo.py"
        }))
        .unwrap();
        assert!(symbol.docstring.is_none());
        assert!(symbol.parameters.is_empty());
        assert_eq!(symbol.start_line, 0);
    }
}
