//! resolve::engine
//!
//! Collaborator traits for resolution.
//!
//! # Design
//!
//! Matching runtime objects against wrapper inputs, substituting values
//! into the command-line template, and translating paths are the job of a
//! [`CommandResolutionEngine`] supplied by the host system. Setup and
//! wrapup commands are looked up through a [`CommandCatalog`].
//!
//! This crate only assembles what those collaborators return; see
//! [`crate::resolve::factory`].

use std::collections::BTreeMap;

use super::command::{ResolvedMount, StagingPaths};
use super::errors::ResolutionError;
use super::flatten::FlattenedInputs;
use super::tree::ResolvedInputTreeNode;
use crate::core::command::{Command, ConfiguredCommand};
use crate::core::types::SetupCommandRef;

/// Which kind of helper command a staging area is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Setup,
    Wrapup,
}

/// Resolves runtime values for one configured command.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait CommandResolutionEngine: Send + Sync {
    /// Match raw runtime values against the wrapper's inputs.
    ///
    /// Returns one tree per external input, with derived and command inputs
    /// beneath the values they were derived from.
    fn resolve_input_trees(
        &self,
        configured: &ConfiguredCommand,
        raw_values: &BTreeMap<String, String>,
        user: &str,
    ) -> Result<Vec<ResolvedInputTreeNode>, ResolutionError>;

    /// Substitute flattened input values into the command-line template.
    fn resolve_command_line(
        &self,
        configured: &ConfiguredCommand,
        inputs: &FlattenedInputs,
    ) -> Result<String, ResolutionError>;

    /// Resolve the command's mounts to host paths.
    fn resolve_mounts(
        &self,
        configured: &ConfiguredCommand,
        inputs: &FlattenedInputs,
    ) -> Result<Vec<ResolvedMount>, ResolutionError>;

    /// Host paths for a setup or wrapup command working for
    /// `source_object_name` (a wrapper input or an output handler).
    fn staging_paths(
        &self,
        stage: Stage,
        source_object_name: &str,
    ) -> Result<StagingPaths, ResolutionError>;
}

/// Lookup of installed commands by `image:tag:name` reference.
pub trait CommandCatalog: Send + Sync {
    /// Find the command a reference points to.
    fn find(&self, reference: &SetupCommandRef) -> Option<Command>;
}

/// An in-memory [`CommandCatalog`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    commands: Vec<Command>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command; it is found by its image and name.
    pub fn insert(&mut self, command: Command) {
        self.commands.push(command);
    }
}

impl FromIterator<Command> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

impl CommandCatalog for InMemoryCatalog {
    fn find(&self, reference: &SetupCommandRef) -> Option<Command> {
        let image = reference.image().to_string();
        self.commands
            .iter()
            .find(|c| c.image == image && c.name == reference.command_name())
            .cloned()
    }
}
