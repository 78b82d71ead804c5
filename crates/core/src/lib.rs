//! Core types for the modmap repository-structuring system
//!
//! This crate provides the foundational abstractions shared by the graph
//! builder and the clustering engine, including:
//!
//! - **Entities**: Code components and their kinds
//! - **Registry**: The FQDN-keyed component registry and its dependency edges
//! - **Module tree**: The hierarchical module tree and immutable module paths
//! - **Configuration**: System configuration management
//! - **Error handling**: Unified error types
//!

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod config;
pub mod entities;
pub mod error;
pub mod fqdn;
pub mod module_tree;
pub mod persist;
pub mod registry;

// Re-export main types for convenience
pub use config::{
    AnalysisConfig, ClusteringConfig, Config, OutputConfig, SyntheticGrouping, ValidationConfig,
};
pub use entities::{Component, ComponentBuilder, ComponentKind};
pub use error::{Error, Result, ResultExt};
pub use module_tree::{ModuleNode, ModulePath, ModuleTree};
pub use registry::{ComponentRegistry, DependencyGraph, InsertOutcome};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::entities::{Component, ComponentKind};
    pub use crate::error::{Result, ResultExt};
    pub use crate::module_tree::{ModulePath, ModuleTree};
    pub use crate::registry::ComponentRegistry;
}
