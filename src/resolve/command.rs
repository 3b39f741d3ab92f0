//! resolve::command
//!
//! The launch-ready transport record.
//!
//! # Wire Format
//!
//! Kebab-case JSON like the definition documents. Resource constraints
//! and container options are flattened into the top level. Setup and
//! wrapup commands nest as complete records of their own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::flatten::LegacyInputValue;
use super::tree::ResolvedInputTreeNode;
use crate::core::command::{Command, ContainerOptions, ResourceConstraints};
use crate::core::config::Config;
use crate::core::kinds::{CommandType, OutputHandlerType};
use crate::core::types::ImageRef;
use crate::secrets::ResolvedSecret;

/// Name of the synthetic input mount of setup and wrapup commands.
pub const SETUP_INPUT_MOUNT: &str = "input";

/// Name of the synthetic output mount of setup and wrapup commands.
pub const SETUP_OUTPUT_MOUNT: &str = "output";

/// A mount with its host path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedMount {
    pub name: String,
    #[serde(default)]
    pub writable: bool,
    pub container_path: String,
    pub host_path: String,
    /// Wrapper input whose files are mounted here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_wrapper_input: Option<String>,
    /// Setup command that prepared the files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via_setup_command: Option<String>,
    /// Persistent volume claim backing the host path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pvc_name: Option<String>,
}

impl ResolvedMount {
    pub fn new(
        name: impl Into<String>,
        container_path: impl Into<String>,
        host_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            writable: false,
            container_path: container_path.into(),
            host_path: host_path.into(),
            from_wrapper_input: None,
            via_setup_command: None,
            pvc_name: None,
        }
    }
}

/// A command output joined with the handler that uploads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedOutput {
    pub name: String,
    pub from_command_output: String,
    pub from_output_handler: String,
    #[serde(rename = "type")]
    pub handler_type: OutputHandlerType,
    pub required: bool,
    pub mount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xsi_type: Option<String>,
    /// Wrapper input or handler the created object goes under
    pub handled_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via_wrapup_command: Option<String>,
}

/// Host locations for a setup or wrapup command's two mounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StagingPaths {
    pub input_host_path: String,
    pub output_host_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_pvc_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_pvc_name: Option<String>,
}

/// A fully resolved launch.
///
/// Built once per launch attempt and not changed afterwards. Setup and
/// wrapup records belong to their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedCommand {
    /// Wrapper id, 0 for setup and wrapup commands
    #[serde(default)]
    pub wrapper_id: i64,
    #[serde(default)]
    pub wrapper_name: String,
    #[serde(default)]
    pub command_id: i64,
    pub command_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_description: Option<String>,
    pub image: String,
    #[serde(rename = "type", default)]
    pub command_type: CommandType,
    #[serde(default)]
    pub command_line: String,
    #[serde(default)]
    pub override_entrypoint: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,
    #[serde(default)]
    pub ports: BTreeMap<String, String>,
    #[serde(default)]
    pub mounts: Vec<ResolvedMount>,
    #[serde(default)]
    pub outputs: Vec<ResolvedOutput>,
    #[serde(flatten)]
    pub resources: ResourceConstraints,
    #[serde(flatten)]
    pub container: ContainerOptions,
    #[serde(default)]
    pub secrets: Vec<ResolvedSecret>,
    #[serde(default)]
    pub raw_input_values: BTreeMap<String, String>,
    #[serde(default)]
    pub flat_input_values: Vec<ResolvedInputTreeNode>,
    #[serde(default)]
    pub external_wrapper_input_values: Vec<LegacyInputValue>,
    #[serde(default)]
    pub derived_input_values: Vec<LegacyInputValue>,
    #[serde(default)]
    pub command_input_values: Vec<LegacyInputValue>,
    #[serde(default)]
    pub setup_commands: Vec<ResolvedCommand>,
    #[serde(default)]
    pub wrapup_commands: Vec<ResolvedCommand>,
    /// Input or handler a setup or wrapup command works for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_source_object_name: Option<String>,
}

impl ResolvedCommand {
    /// A record carrying the command's static fields and nothing resolved.
    ///
    /// The image gets the configured default tag if it has none.
    pub fn from_command(command: &Command, config: &Config) -> Self {
        Self {
            wrapper_id: 0,
            wrapper_name: String::new(),
            command_id: command.id,
            command_name: command.name.clone(),
            command_description: command.description.clone(),
            image: ImageRef::with_default_tag(&command.image, config.default_image_tag()),
            command_type: command.command_type.clone(),
            command_line: command.command_line.clone().unwrap_or_default(),
            override_entrypoint: command.override_entrypoint,
            working_directory: command.working_directory.clone(),
            environment_variables: command.environment_variables.clone(),
            ports: command.ports.clone(),
            mounts: Vec::new(),
            outputs: Vec::new(),
            resources: command.resources.clone(),
            container: command.container.clone(),
            secrets: Vec::new(),
            raw_input_values: BTreeMap::new(),
            flat_input_values: Vec::new(),
            external_wrapper_input_values: Vec::new(),
            derived_input_values: Vec::new(),
            command_input_values: Vec::new(),
            setup_commands: Vec::new(),
            wrapup_commands: Vec::new(),
            parent_source_object_name: None,
        }
    }

    /// Build the record for a setup or wrapup command.
    ///
    /// Whatever mounts the parent uses, the command gets one read-only
    /// `input` mount and one writable `output` mount at the configured
    /// container paths (`/input` and `/output` by default).
    pub fn from_setup_or_wrapup(
        command: &Command,
        staging: &StagingPaths,
        parent_source_object_name: &str,
        config: &Config,
    ) -> Self {
        let input = ResolvedMount {
            pvc_name: staging.input_pvc_name.clone(),
            ..ResolvedMount::new(
                SETUP_INPUT_MOUNT,
                config.setup_input_path(),
                &staging.input_host_path,
            )
        };
        let output = ResolvedMount {
            writable: true,
            pvc_name: staging.output_pvc_name.clone(),
            ..ResolvedMount::new(
                SETUP_OUTPUT_MOUNT,
                config.setup_output_path(),
                &staging.output_host_path,
            )
        };

        Self {
            mounts: vec![input, output],
            parent_source_object_name: Some(parent_source_object_name.to_string()),
            ..Self::from_command(command, config)
        }
    }

    /// Find a mount by name.
    pub fn mount(&self, name: &str) -> Option<&ResolvedMount> {
        self.mounts.iter().find(|m| m.name == name)
    }
}
