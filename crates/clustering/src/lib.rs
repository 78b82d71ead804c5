//! Oracle-driven hierarchical clustering for modmap
//!
//! Splits the leaf components of a dependency graph into a tree of modules.
//! Groupings are proposed by an untrusted [`Oracle`]; every member it names is
//! mapped back to a canonical component id before it reaches the tree.
//!
//! ```ignore
//! let planner = ModuleTreePlanner::new(analyzer, oracle, config)?;
//! let planned = planner.plan(&ClusteringContext::new()).await?;
//! for path in &planned.processing_order {
//!     // children before parents
//! }
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod context;
pub mod engine;
pub mod hints;
pub mod identifiers;
pub mod oracle;
pub mod planner;
pub mod prompt;
pub mod response;
pub mod store;
pub mod synthetic;
pub mod token;

pub use context::{ClusteringContext, ClusteringStats, StatsSnapshot};
pub use engine::{ClusteringEngine, LevelOutcome};
pub use identifiers::{IdentifierMap, IdentifierResolver, Resolution, Strategy, UnresolvedDiagnostics};
pub use oracle::Oracle;
pub use planner::{ModuleTreePlanner, PlannedTree, TreeSource};
pub use response::{parse_grouping, ProposedGroup, ProposedGrouping, ProposedToken};
pub use store::{TreeStore, FIRST_MODULE_TREE, MODULE_TREE};
pub use synthetic::synthetic_grouping;
pub use token::count_tokens;
