//! Dependency graph construction for modmap
//!
//! Turns one or more source roots into a namespaced component registry with
//! resolved dependency edges, validates it, and extracts the leaf components
//! handed to clustering.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod analyzer;
mod builder;
pub mod cross_namespace;
pub mod dump;
pub mod leaves;
pub mod namespacer;
pub mod validation;

pub use analyzer::{AnalysisOutput, FilePatterns, RawEdge, RawSymbol, SourceAnalyzer};
pub use builder::{BuiltGraph, GraphBuilder};
pub use cross_namespace::{resolve_edges, EdgeResolutionStats};
pub use dump::{dependency_graph_file_name, write_dependency_graph};
pub use leaves::{extract_leaves, LeafRejections, LeafSet};
pub use namespacer::{assign_namespaces, NamespacedGraph, Namespacer, RootGraph, SourceRoot};
pub use validation::{fingerprint, GraphValidator, PostBuildReport, PreflightReport};
