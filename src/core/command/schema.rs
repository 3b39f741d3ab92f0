//! core::command::schema
//!
//! Command definition schema.
//!
//! # Canonical vs Creation
//!
//! - [`CommandCreation`] is what operators submit: every field is optional.
//! - [`Command`] is the canonical form: defaults are applied and collections
//!   are always present.
//!
//! [`Command::from_creation`] converts one into the other and is idempotent:
//! converting a canonical command back into a creation and canonicalizing it
//! again yields an identical command.
//!
//! # Wire Format
//!
//! JSON with kebab-case keys (`command-line`, `override-entrypoint`, ...).
//! Optional scalar fields are omitted when absent. The wrapper list is
//! stored under the `xnat` key and also accepted as `wrappers`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::wrapper::{CommandWrapper, InputBase};
use crate::core::kinds::{CommandInputType, CommandType, MultipleDelimiter};
use crate::core::types::{ImageRef, DEFAULT_IMAGE_TAG};

/// A runnable containerized command (canonical form).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Command {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_url: Option<String>,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(rename = "type", default)]
    pub command_type: CommandType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,
    #[serde(default)]
    pub override_entrypoint: bool,
    #[serde(default)]
    pub mounts: Vec<CommandMount>,
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,
    #[serde(default)]
    pub ports: BTreeMap<String, String>,
    #[serde(default)]
    pub inputs: Vec<CommandInput>,
    #[serde(default)]
    pub outputs: Vec<CommandOutput>,
    #[serde(default, rename = "xnat", alias = "wrappers")]
    pub wrappers: Vec<CommandWrapper>,
    #[serde(flatten)]
    pub resources: ResourceConstraints,
    #[serde(flatten)]
    pub container: ContainerOptions,
    #[serde(default)]
    pub secrets: Vec<Secret>,
}

impl Command {
    /// Create a minimal `docker` command with the given name and image.
    ///
    /// The image is stored as given; use [`Command::from_creation`] to get tag
    /// defaulting.
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            label: None,
            description: None,
            version: None,
            schema_version: None,
            info_url: None,
            image: image.into(),
            container_name: None,
            command_type: CommandType::Docker,
            index: None,
            hash: None,
            working_directory: None,
            command_line: None,
            override_entrypoint: false,
            mounts: Vec::new(),
            environment_variables: BTreeMap::new(),
            ports: BTreeMap::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            wrappers: Vec::new(),
            resources: ResourceConstraints::default(),
            container: ContainerOptions::default(),
            secrets: Vec::new(),
        }
    }

    /// Canonicalize a creation document using the default image tag.
    pub fn from_creation(creation: CommandCreation) -> Self {
        Self::from_creation_with_tag(creation, DEFAULT_IMAGE_TAG)
    }

    /// Canonicalize a creation document.
    ///
    /// Applies `default_tag` to untagged images and replaces missing
    /// collections with empty ones.
    pub fn from_creation_with_tag(creation: CommandCreation, default_tag: &str) -> Self {
        let image = creation
            .image
            .map(|image| ImageRef::with_default_tag(&image, default_tag))
            .unwrap_or_default();

        Self {
            id: creation.id.unwrap_or(0),
            name: creation.name.unwrap_or_default(),
            label: creation.label,
            description: creation.description,
            version: creation.version,
            schema_version: creation.schema_version,
            info_url: creation.info_url,
            image,
            container_name: creation.container_name,
            command_type: creation.command_type.unwrap_or_default(),
            index: creation.index,
            hash: creation.hash,
            working_directory: creation.working_directory,
            command_line: creation.command_line,
            override_entrypoint: creation.override_entrypoint.unwrap_or(false),
            mounts: creation.mounts.unwrap_or_default(),
            environment_variables: creation.environment_variables.unwrap_or_default(),
            ports: creation.ports.unwrap_or_default(),
            inputs: creation.inputs.unwrap_or_default(),
            outputs: creation.outputs.unwrap_or_default(),
            wrappers: creation.wrappers.unwrap_or_default(),
            resources: creation.resources,
            container: creation.container,
            secrets: creation.secrets.unwrap_or_default(),
        }
    }

    /// Find a wrapper by name.
    pub fn wrapper(&self, name: &str) -> Option<&CommandWrapper> {
        self.wrappers.iter().find(|w| w.name == name)
    }

    /// Find a command input by name.
    pub fn input(&self, name: &str) -> Option<&CommandInput> {
        self.inputs.iter().find(|i| i.base.name == name)
    }

    /// Find a mount by name.
    pub fn mount(&self, name: &str) -> Option<&CommandMount> {
        self.mounts.iter().find(|m| m.name == name)
    }

    /// Find an output by name.
    pub fn output(&self, name: &str) -> Option<&CommandOutput> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

/// A command as submitted for creation; every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandCreation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub command_type: Option<CommandType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_entrypoint: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mounts: Option<Vec<CommandMount>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_variables: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Vec<CommandInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<CommandOutput>>,
    #[serde(
        default,
        rename = "xnat",
        alias = "wrappers",
        skip_serializing_if = "Option::is_none"
    )]
    pub wrappers: Option<Vec<CommandWrapper>>,
    #[serde(flatten)]
    pub resources: ResourceConstraints,
    #[serde(flatten)]
    pub container: ContainerOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<Secret>>,
}

impl From<Command> for CommandCreation {
    fn from(command: Command) -> Self {
        Self {
            id: Some(command.id),
            name: Some(command.name),
            label: command.label,
            description: command.description,
            version: command.version,
            schema_version: command.schema_version,
            info_url: command.info_url,
            image: Some(command.image),
            container_name: command.container_name,
            command_type: Some(command.command_type),
            index: command.index,
            hash: command.hash,
            working_directory: command.working_directory,
            command_line: command.command_line,
            override_entrypoint: Some(command.override_entrypoint),
            mounts: Some(command.mounts),
            environment_variables: Some(command.environment_variables),
            ports: Some(command.ports),
            inputs: Some(command.inputs),
            outputs: Some(command.outputs),
            wrappers: Some(command.wrappers),
            resources: command.resources,
            container: command.container,
            secrets: Some(command.secrets),
        }
    }
}

/// Resource limits for the container.
///
/// `generic-resources` and `ulimits` distinguish an absent map from an
/// empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResourceConstraints {
    /// Memory reservation in MB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve_memory: Option<i64>,
    /// Memory limit in MB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_memory: Option<i64>,
    /// CPU limit (fractional cores)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit_cpu: Option<f64>,
    /// GPU request, e.g. `"all"` or a count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic_resources: Option<BTreeMap<String, String>>,
    /// Name to `soft[:hard]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ulimits: Option<BTreeMap<String, String>>,
    /// Shared memory size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shm_size: Option<i64>,
}

/// Runtime options passed through to the container backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ContainerOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipc_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_remove: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_labels: Option<BTreeMap<String, String>>,
}

/// A path inside the container that files are mounted into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandMount {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub writable: bool,
    #[serde(default)]
    pub path: String,
}

impl CommandMount {
    /// Create a read-only mount.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            writable: false,
            path: path.into(),
        }
    }

    /// Create a writable mount.
    pub fn writable(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            writable: true,
            ..Self::new(name, path)
        }
    }
}

/// An input to the command line template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandInput {
    #[serde(flatten)]
    pub base: InputBase<CommandInputType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line_flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line_separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_value: Option<String>,
    #[serde(default)]
    pub select_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_delimiter: Option<MultipleDelimiter>,
}

impl CommandInput {
    /// Create an optional command input.
    pub fn new(name: impl Into<String>, input_type: CommandInputType) -> Self {
        Self {
            base: InputBase::new(name, input_type),
            command_line_flag: None,
            command_line_separator: None,
            true_value: None,
            false_value: None,
            select_values: Vec::new(),
            multiple_delimiter: None,
        }
    }

    /// The input's name.
    pub fn name(&self) -> &str {
        &self.base.name
    }
}

/// A file or directory the command produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandOutput {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub required: bool,
    /// Name of the mount the output is written to
    #[serde(default)]
    pub mount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob: Option<String>,
}

impl CommandOutput {
    /// Create a required output written to `mount`.
    pub fn new(name: impl Into<String>, mount: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            required: true,
            mount: mount.into(),
            path: None,
            glob: None,
        }
    }
}

/// A secret made available to the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Secret {
    pub source: SecretSource,
    pub destination: SecretDestination,
}

/// Where a secret value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SecretSource {
    #[serde(rename = "type")]
    pub source_type: String,
    pub identifier: String,
}

/// Where a secret value is placed in the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SecretDestination {
    /// `environment-variable` or `file`
    #[serde(rename = "type")]
    pub destination_type: String,
    pub identifier: String,
}

pub(crate) fn default_true() -> bool {
    true
}
