//! resolve::factory
//!
//! Assemble a [`ResolvedCommand`] for one launch.
//!
//! # Steps
//!
//! 1. Reject raw values containing illegal strings
//! 2. Flatten the resolved input trees (strictly)
//! 3. Check every required input has a value
//! 4. Ask the engine for the command line and mounts
//! 5. Build setup commands for wrapper inputs with `via-setup-command`,
//!    pointing the mounts they feed at the setup output
//! 6. Join command outputs with their handlers and build wrapup commands
//! 7. Resolve secrets
//!
//! Any failure aborts the launch attempt.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::command::{ResolvedCommand, ResolvedMount, ResolvedOutput};
use super::engine::{CommandCatalog, CommandResolutionEngine, Stage};
use super::errors::ResolutionError;
use super::flatten::FlattenedInputs;
use super::tree::ResolvedInputTreeNode;
use crate::core::command::ConfiguredCommand;
use crate::core::config::Config;
use crate::core::types::SetupCommandRef;
use crate::secrets::SecretResolver;

/// The collaborators an assembly needs.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub engine: &'a dyn CommandResolutionEngine,
    pub catalog: &'a dyn CommandCatalog,
    pub secrets: &'a dyn SecretResolver,
}

/// Reject raw values that contain a configured illegal string.
///
/// # Errors
///
/// Returns `ResolutionError::IllegalInput` for the first offending value,
/// by input name.
pub fn check_illegal_values(
    raw_values: &BTreeMap<String, String>,
    config: &Config,
) -> Result<(), ResolutionError> {
    let illegal = config.illegal_strings();
    for (name, value) in raw_values {
        if let Some(fragment) = illegal.iter().find(|s| value.contains(**s)) {
            warn!(input = %name, fragment = %fragment, "rejected illegal input value");
            return Err(ResolutionError::IllegalInput {
                input: name.clone(),
                fragment: fragment.to_string(),
            });
        }
    }
    Ok(())
}

/// Check every required input in `flat` has a non-blank value.
///
/// # Errors
///
/// Returns `ResolutionError::MissingRequiredInputs` naming every input
/// without a value, in flat-sequence order.
pub fn check_required_inputs(flat: &[ResolvedInputTreeNode]) -> Result<(), ResolutionError> {
    let mut missing: Vec<String> = Vec::new();
    for node in flat.iter().filter(|n| n.input.required()) {
        let name = node.name();
        let has_value = flat.iter().any(|n| n.name() == name && n.has_value());
        if !has_value && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ResolutionError::MissingRequiredInputs { names: missing })
    }
}

/// Resolve a launch end to end: engine resolution, then [`assemble`].
///
/// # Errors
///
/// Any [`ResolutionError`] from the checks, the engine, the catalog or the
/// secret resolver.
pub fn resolve(
    configured: &ConfiguredCommand,
    raw_values: &BTreeMap<String, String>,
    user: &str,
    collaborators: Collaborators<'_>,
    config: &Config,
) -> Result<ResolvedCommand, ResolutionError> {
    check_illegal_values(raw_values, config)?;
    let trees = collaborators
        .engine
        .resolve_input_trees(configured, raw_values, user)?;
    assemble_checked(configured, raw_values, &trees, collaborators, config)
}

/// Assemble the launch record from already-resolved input trees.
///
/// # Errors
///
/// Any [`ResolutionError`] from the checks, the engine, the catalog or the
/// secret resolver.
pub fn assemble(
    configured: &ConfiguredCommand,
    raw_values: &BTreeMap<String, String>,
    trees: &[ResolvedInputTreeNode],
    collaborators: Collaborators<'_>,
    config: &Config,
) -> Result<ResolvedCommand, ResolutionError> {
    check_illegal_values(raw_values, config)?;
    assemble_checked(configured, raw_values, trees, collaborators, config)
}

/// Steps 2 to 7. The caller has already run [`check_illegal_values`].
fn assemble_checked(
    configured: &ConfiguredCommand,
    raw_values: &BTreeMap<String, String>,
    trees: &[ResolvedInputTreeNode],
    collaborators: Collaborators<'_>,
    config: &Config,
) -> Result<ResolvedCommand, ResolutionError> {
    let inputs = FlattenedInputs::strict(trees)?;
    check_required_inputs(&inputs.flat)?;

    let engine = collaborators.engine;
    let command_line = engine.resolve_command_line(configured, &inputs)?;
    let mut mounts = engine.resolve_mounts(configured, &inputs)?;
    let setup_commands = build_setup_commands(configured, &inputs, &mut mounts, collaborators, config)?;
    let (outputs, wrapup_commands) = build_outputs(configured, collaborators, config)?;
    let secrets = collaborators.secrets.resolve(&configured.command.secrets)?;

    debug!(
        command = %configured.command.name,
        wrapper = %configured.wrapper.name,
        setup = setup_commands.len(),
        wrapup = wrapup_commands.len(),
        "assembled resolved command"
    );

    let FlattenedInputs { flat, legacy } = inputs;
    Ok(ResolvedCommand {
        wrapper_id: configured.wrapper.id,
        wrapper_name: configured.wrapper.name.clone(),
        command_line,
        mounts,
        outputs,
        secrets,
        raw_input_values: raw_values.clone(),
        flat_input_values: flat,
        external_wrapper_input_values: legacy.external,
        derived_input_values: legacy.derived,
        command_input_values: legacy.command,
        setup_commands,
        wrapup_commands,
        ..ResolvedCommand::from_command(&configured.command, config)
    })
}

fn build_setup_commands(
    configured: &ConfiguredCommand,
    inputs: &FlattenedInputs,
    mounts: &mut [ResolvedMount],
    collaborators: Collaborators<'_>,
    config: &Config,
) -> Result<Vec<ResolvedCommand>, ResolutionError> {
    let mut setup_commands = Vec::new();

    for input in configured.wrapper.wrapper_inputs() {
        let Some(reference) = &input.via_setup_command else {
            continue;
        };
        let name = input.base.name.as_str();
        if inputs.value_of(name).map_or(true, |v| v.trim().is_empty()) {
            debug!(input = name, "no value, skipping setup command");
            continue;
        }

        let unknown = || ResolutionError::UnknownSetupCommand {
            reference: reference.clone(),
        };
        let parsed = SetupCommandRef::parse_with_default(reference, config.default_image_tag())
            .map_err(|_| unknown())?;
        let setup = collaborators.catalog.find(&parsed).ok_or_else(unknown)?;
        let staging = collaborators.engine.staging_paths(Stage::Setup, name)?;

        if let Some(mount_name) = &input.provides_files_for_command_mount {
            if let Some(mount) = mounts.iter_mut().find(|m| &m.name == mount_name) {
                mount.host_path = staging.output_host_path.clone();
                mount.pvc_name = staging.output_pvc_name.clone();
                mount.from_wrapper_input = Some(name.to_string());
                mount.via_setup_command = Some(reference.clone());
            }
        }

        setup_commands.push(ResolvedCommand::from_setup_or_wrapup(
            &setup, &staging, name, config,
        ));
    }

    Ok(setup_commands)
}

fn build_outputs(
    configured: &ConfiguredCommand,
    collaborators: Collaborators<'_>,
    config: &Config,
) -> Result<(Vec<ResolvedOutput>, Vec<ResolvedCommand>), ResolutionError> {
    let command = &configured.command;
    let mut outputs = Vec::new();
    let mut wrapup_commands = Vec::new();

    for handler in &configured.wrapper.output_handlers {
        let Some(output) = command.output(&handler.accepts_command_output) else {
            warn!(
                handler = %handler.name,
                output = %handler.accepts_command_output,
                "output handler refers to unknown output"
            );
            continue;
        };

        if let Some(reference) = &handler.via_wrapup_command {
            let unknown = || ResolutionError::UnknownWrapupCommand {
                reference: reference.clone(),
            };
            let parsed = SetupCommandRef::parse_with_default(reference, config.default_image_tag())
                .map_err(|_| unknown())?;
            let wrapup = collaborators.catalog.find(&parsed).ok_or_else(unknown)?;
            let staging = collaborators
                .engine
                .staging_paths(Stage::Wrapup, &handler.name)?;
            wrapup_commands.push(ResolvedCommand::from_setup_or_wrapup(
                &wrapup,
                &staging,
                &handler.name,
                config,
            ));
        }

        outputs.push(ResolvedOutput {
            name: format!("{}:{}", output.name, handler.name),
            from_command_output: output.name.clone(),
            from_output_handler: handler.name.clone(),
            handler_type: handler.handler_type.clone(),
            required: output.required,
            mount: output.mount.clone(),
            path: output.path.clone(),
            glob: output.glob.clone(),
            label: handler.label.clone(),
            format: handler.format.clone(),
            description: handler.description.clone(),
            content: handler.content.clone(),
            tags: handler.tags.clone(),
            xsi_type: handler.xsi_type.clone(),
            handled_by: handler.as_a_child_of.clone(),
            via_wrapup_command: handler.via_wrapup_command.clone(),
        });
    }

    Ok((outputs, wrapup_commands))
}
