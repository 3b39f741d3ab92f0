//! core::command
//!
//! Command definition model: commands, mounts, inputs, outputs, wrappers
//! and output handlers.
//!
//! # Modules
//!
//! - [`schema`] - `Command`, its creation form, mounts, inputs and outputs
//! - [`wrapper`] - `CommandWrapper`, wrapper inputs and output handlers
//!
//! # Example
//!
//! ```
//! use cmdwrap::core::command::parse_command;
//!
//! let json = r#"{
//!     "name": "dcm2niix",
//!     "image": "xnat/dcm2niix",
//!     "command-line": "dcm2niix [ARGS]"
//! }"#;
//!
//! let command = parse_command(json).unwrap();
//! assert_eq!(command.image, "xnat/dcm2niix:latest");
//! assert!(command.mounts.is_empty());
//! ```

pub mod schema;
pub mod wrapper;

pub use schema::{
    Command, CommandCreation, CommandInput, CommandMount, CommandOutput, ContainerOptions,
    ResourceConstraints, Secret, SecretDestination, SecretSource,
};
pub use wrapper::{
    CommandWrapper, DerivedInput, ExternalInput, Input, InputBase, InputKind, OutputHandler,
    WrapperInput,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::Config;
use crate::core::types::DEFAULT_IMAGE_TAG;

/// Errors from reading command documents.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to parse command: {0}")]
    ParseError(String),

    #[error("failed to serialize command: {0}")]
    SerializeError(String),

    #[error("command '{command}' has no wrapper named '{wrapper}'")]
    UnknownWrapper { command: String, wrapper: String },
}

/// Parse a command document and canonicalize it.
///
/// The document is read as a [`CommandCreation`], so any field may be
/// missing. Untagged images get the default tag.
///
/// # Errors
///
/// Returns `CommandError::ParseError` if the JSON is malformed or a field
/// has the wrong shape. Semantic problems are left to the validator.
pub fn parse_command(json: &str) -> Result<Command, CommandError> {
    parse_command_with_tag(json, DEFAULT_IMAGE_TAG)
}

/// Parse a command document, defaulting untagged images to `default_tag`.
pub fn parse_command_with_tag(json: &str, default_tag: &str) -> Result<Command, CommandError> {
    let creation: CommandCreation =
        serde_json::from_str(json).map_err(|e| CommandError::ParseError(e.to_string()))?;
    Ok(Command::from_creation_with_tag(creation, default_tag))
}

/// Parse a command document using the configured default image tag.
pub fn parse_command_with_config(json: &str, config: &Config) -> Result<Command, CommandError> {
    parse_command_with_tag(json, config.default_image_tag())
}

/// Serialize a command to pretty JSON.
pub fn to_json_pretty(command: &Command) -> Result<String, CommandError> {
    serde_json::to_string_pretty(command).map_err(|e| CommandError::SerializeError(e.to_string()))
}

/// A command paired with the single wrapper it will be launched through.
///
/// The embedded command carries no wrappers of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfiguredCommand {
    pub command: Command,
    pub wrapper: CommandWrapper,
}

impl ConfiguredCommand {
    /// Select `wrapper_name` from `command`.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::UnknownWrapper` if the command has no such wrapper.
    pub fn select(command: &Command, wrapper_name: &str) -> Result<Self, CommandError> {
        let wrapper = command
            .wrapper(wrapper_name)
            .cloned()
            .ok_or_else(|| CommandError::UnknownWrapper {
                command: command.name.clone(),
                wrapper: wrapper_name.to_string(),
            })?;
        let mut command = command.clone();
        command.wrappers.clear();
        Ok(Self { command, wrapper })
    }
}
