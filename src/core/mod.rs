//! core
//!
//! Core domain types and schemas for command definitions.
//!
//! # Modules
//!
//! - [`types`] - Strong types: InputName, ImageRef, SetupCommandRef
//! - [`kinds`] - Open string enumerations used in documents
//! - [`command`] - Command and wrapper document schema
//! - [`validate`] - Structural validation of command documents
//! - [`graph`] - Dependency ordering of derived inputs and output handlers
//! - [`permissions`] - Permissions a wrapper needs to launch
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Documents round-trip: unknown enumeration values are preserved
//! - Validation reports every problem instead of stopping at the first
//! - All ordering is deterministic

pub mod command;
pub mod config;
pub mod graph;
pub mod kinds;
pub mod permissions;
pub mod types;
pub mod validate;
