use thiserror::Error;

/// Result type for modmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for modmap operations
///
/// Only failures that must stop a run (or a whole source root) are errors.
/// Per-token and per-level soft failures are modelled as enum variants by the
/// components that produce them.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source root could not be analyzed
    #[error("Source analysis failed for {root}: {message}")]
    SourceAnalysis { root: String, message: String },

    /// Dangling component references found while strict mode is enabled
    #[error(
        "Graph integrity violation: {missing} missing components, {broken_edges} broken edges"
    )]
    GraphIntegrity { missing: usize, broken_edges: usize },

    /// The oracle answered, but the answer could not be decoded
    #[error("Malformed oracle response: {0}")]
    OracleMalformed(String),

    /// The oracle collaborator failed to answer
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// The graph contained no component that can be clustered
    #[error("No analyzable leaf components found")]
    NoAnalyzableLeaves,

    /// The run was cancelled before it completed
    #[error("Operation cancelled")]
    Cancelled,

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Creates a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a source analysis error
    pub fn source_analysis(root: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceAnalysis {
            root: root.into(),
            message: message.into(),
        }
    }

    /// Creates an oracle transport error
    pub fn oracle(msg: impl Into<String>) -> Self {
        Self::Oracle(msg.into())
    }

    /// Creates a malformed oracle response error
    pub fn oracle_malformed(msg: impl Into<String>) -> Self {
        Self::OracleMalformed(msg.into())
    }

    /// Creates an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Adds context to any error
    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::with_context(context, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_integrity_message() {
        let err = Error::GraphIntegrity {
            missing: 2,
            broken_edges: 3,
        };
        assert_eq!(
            err.to_string(),
            "Graph integrity violation: 2 missing components, 3 broken edges"
        );
    }

    #[test]
    fn test_context_wraps_source() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        let err = io.context("reading seed tree").unwrap_err();
        assert_eq!(err.to_string(), "reading seed tree: gone");
    }
}
