//! resolve
//!
//! Turn a configured command and runtime values into a launch record.
//!
//! # Architecture
//!
//! - [`tree`] - Resolved input trees as produced by the engine
//! - [`flatten`] - Depth-first flattening and legacy value partitions
//! - [`command`] - The `ResolvedCommand` transport record
//! - [`engine`] - Collaborator traits (`CommandResolutionEngine`, `CommandCatalog`)
//! - [`factory`] - Checks and assembly of the final record
//! - [`errors`] - `ResolutionError`
//!
//! # Flow
//!
//! ```text
//! raw values -> illegal-string check -> engine trees -> flatten
//!            -> required check -> command line, mounts, setup,
//!               outputs, wrapup, secrets -> ResolvedCommand
//! ```
//!
//! Any step failing aborts the launch; no partial record is returned.

pub mod command;
pub mod engine;
pub mod errors;
pub mod factory;
pub mod flatten;
pub mod tree;

pub use command::{ResolvedCommand, ResolvedMount, ResolvedOutput, StagingPaths};
pub use engine::{CommandCatalog, CommandResolutionEngine, InMemoryCatalog, Stage};
pub use errors::ResolutionError;
pub use factory::{assemble, resolve, Collaborators};
pub use flatten::{FlattenedInputs, LegacyInputValue, LegacyInputValues};
pub use tree::{ResolvedInputTreeNode, ResolvedInputValue, ValueAndChildren};
