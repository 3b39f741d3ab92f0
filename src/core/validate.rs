//! core::validate
//!
//! Structural validation of command definitions.
//!
//! # Contract
//!
//! [`validate`] never fails: it returns every problem found as a
//! human-readable message, and an empty list means the command is valid.
//! Unknown `type` strings are reported here rather than rejected by the
//! parser.
//!
//! Messages are prefixed with the command name, and with the wrapper name
//! for problems inside a wrapper:
//!
//! ```text
//! Command "dcm2niix" - image cannot be blank.
//! Command "dcm2niix" wrapper "session" - duplicate input name "scan".
//! ```
//!
//! # Invariants
//!
//! - Never mutates the command
//! - Must be deterministic: the same command yields the same messages in
//!   the same order

use std::collections::{HashMap, HashSet};
use std::fmt::Display;

use tracing::debug;

use super::command::{
    Command, CommandInput, CommandWrapper, DerivedInput, OutputHandler, WrapperInput,
};
use super::graph::order_derived_inputs;
use super::kinds::{
    CommandInputType, CommandType, MultipleDelimiter, OutputHandlerType, WrapperInputType,
};
use super::types::{ImageRef, InputName, SetupCommandRef};

/// Collects messages under a common prefix.
struct Report<'a> {
    prefix: String,
    errors: &'a mut Vec<String>,
}

impl Report<'_> {
    fn error(&mut self, message: impl Display) {
        self.errors.push(format!("{}{}", self.prefix, message));
    }

    fn nested(&mut self, prefix: String) -> Report<'_> {
        Report {
            prefix,
            errors: &mut *self.errors,
        }
    }
}

/// Validate a command and all of its wrappers.
///
/// # Example
///
/// ```
/// use cmdwrap::core::command::Command;
/// use cmdwrap::core::validate::validate;
///
/// let command = Command::new("tool", "xnat/tool:1.0");
/// assert!(validate(&command).is_empty());
///
/// let command = Command::new("", "xnat/tool");
/// let errors = validate(&command);
/// assert_eq!(errors.len(), 2);
/// ```
pub fn validate(command: &Command) -> Vec<String> {
    let mut errors = Vec::new();
    let mut report = Report {
        prefix: format!("Command \"{}\" - ", command.name),
        errors: &mut errors,
    };

    check_command_fields(command, &mut report);
    check_mounts(command, &mut report);
    check_command_inputs(command, &mut report);
    check_outputs(command, &mut report);

    let mut wrapper_names = HashSet::new();
    for wrapper in &command.wrappers {
        if !wrapper_names.insert(wrapper.name.as_str()) {
            report.error(format_args!("duplicate wrapper name \"{}\".", wrapper.name));
        }
        let mut nested =
            report.nested(format!("Command \"{}\" wrapper \"{}\" - ", command.name, wrapper.name));
        check_wrapper(command, wrapper, &mut nested);
    }

    debug!(command = %command.name, errors = errors.len(), "validated command");
    errors
}

fn check_command_fields(command: &Command, report: &mut Report<'_>) {
    if command.name.trim().is_empty() {
        report.error("name cannot be blank.");
    }

    if command.image.trim().is_empty() {
        report.error("image cannot be blank.");
    } else if let Err(e) = ImageRef::parse(&command.image) {
        report.error(format_args!("{e}."));
    }

    if let CommandType::Unknown(raw) = &command.command_type {
        report.error(unknown_type(raw, CommandType::KNOWN));
    }

    if command.command_type.is_setup_or_wrapup() {
        let kind = command.command_type.as_str();
        let declared = [
            ("mounts", command.mounts.is_empty()),
            ("inputs", command.inputs.is_empty()),
            ("outputs", command.outputs.is_empty()),
            ("wrappers", command.wrappers.is_empty()),
            (
                "environment variables",
                command.environment_variables.is_empty(),
            ),
            ("ports", command.ports.is_empty()),
        ];
        for (category, empty) in declared {
            if !empty {
                report.error(format_args!("{kind} commands cannot declare {category}."));
            }
        }
    }
}

fn check_mounts(command: &Command, report: &mut Report<'_>) {
    let mut names = HashSet::new();
    for mount in &command.mounts {
        if mount.name.trim().is_empty() {
            report.error("mount name cannot be blank.");
        } else if !names.insert(mount.name.as_str()) {
            report.error(format_args!("duplicate mount name \"{}\".", mount.name));
        }
        if mount.path.trim().is_empty() {
            report.error(format_args!("mount \"{}\" path cannot be blank.", mount.name));
        }
    }
}

fn check_command_inputs(command: &Command, report: &mut Report<'_>) {
    let mut names = HashSet::new();
    for input in &command.inputs {
        let name = input.name();
        if let Err(e) = InputName::new(name) {
            report.error(format_args!("{e}."));
        } else if !names.insert(name) {
            report.error(format_args!("duplicate input name \"{name}\"."));
        }
        check_command_input(input, report);
    }
}

fn check_command_input(input: &CommandInput, report: &mut Report<'_>) {
    let name = input.name();
    let input_type = &input.base.input_type;

    if let CommandInputType::Unknown(raw) = input_type {
        report.error(format_args!(
            "input \"{name}\": {}",
            unknown_type(raw, CommandInputType::KNOWN)
        ));
    }

    if input_type.is_select() {
        if input.select_values.is_empty() {
            report.error(format_args!(
                "input \"{name}\" of type \"{input_type}\" must have select-values."
            ));
        }
    } else if !input.select_values.is_empty() {
        report.error(format_args!(
            "input \"{name}\" of type \"{input_type}\" cannot have select-values."
        ));
    }

    if let Some(default) = &input.base.default_value {
        if !input.select_values.is_empty() {
            let defaults = match input_type {
                CommandInputType::MultiSelect => serde_json::from_str::<Vec<String>>(default)
                    .unwrap_or_else(|_| vec![default.clone()]),
                _ => vec![default.clone()],
            };
            for value in defaults {
                if !input.select_values.contains(&value) {
                    report.error(format_args!(
                        "input \"{name}\" default value \"{value}\" is not one of the select-values."
                    ));
                }
            }
        }
    }

    if let Some(MultipleDelimiter::Unknown(raw)) = &input.multiple_delimiter {
        report.error(format_args!(
            "input \"{name}\": unknown multiple-delimiter \"{raw}\". Known values: {}",
            MultipleDelimiter::KNOWN.join(", ")
        ));
    }
}

fn check_outputs(command: &Command, report: &mut Report<'_>) {
    let mut names = HashSet::new();
    for output in &command.outputs {
        if output.name.trim().is_empty() {
            report.error("output name cannot be blank.");
        } else if !names.insert(output.name.as_str()) {
            report.error(format_args!("duplicate output name \"{}\".", output.name));
        }
        if command.mount(&output.mount).is_none() {
            report.error(format_args!(
                "output \"{}\" refers to unknown mount \"{}\".",
                output.name, output.mount
            ));
        }
    }
}

fn check_wrapper(command: &Command, wrapper: &CommandWrapper, report: &mut Report<'_>) {
    if wrapper.name.trim().is_empty() {
        report.error("name cannot be blank.");
    }

    let mut names = HashSet::new();
    for input in wrapper.wrapper_inputs() {
        let name = input.base.name.as_str();
        if let Err(e) = InputName::new(name) {
            report.error(format_args!("{e}."));
        } else if !names.insert(name) {
            report.error(format_args!("duplicate input name \"{name}\"."));
        }
        check_wrapper_input(command, input, report);
    }

    for derived in &wrapper.derived_inputs {
        check_derived_input(wrapper, derived, report);
    }
    if let Err(cycle) = order_derived_inputs(&wrapper.derived_inputs) {
        report.error(format_args!(
            "derived inputs form a dependency cycle: {}.",
            cycle.members.join(", ")
        ));
    }

    check_output_handlers(command, wrapper, report);
}

fn check_wrapper_input(command: &Command, input: &WrapperInput, report: &mut Report<'_>) {
    let name = input.base.name.as_str();

    if let WrapperInputType::Unknown(raw) = &input.base.input_type {
        report.error(format_args!(
            "input \"{name}\": {}",
            unknown_type(raw, WrapperInputType::KNOWN)
        ));
    }

    if let Some(target) = &input.provides_value_for_command_input {
        if command.input(target).is_none() {
            report.error(format_args!(
                "input \"{name}\" provides a value for unknown command input \"{target}\"."
            ));
        }
    }

    if let Some(mount) = &input.provides_files_for_command_mount {
        if command.mount(mount).is_none() {
            report.error(format_args!(
                "input \"{name}\" provides files for unknown mount \"{mount}\"."
            ));
        }
    }

    if let Some(setup) = &input.via_setup_command {
        if input.provides_files_for_command_mount.is_none() {
            report.error(format_args!(
                "input \"{name}\" has via-setup-command \"{setup}\" but does not provide files for a mount."
            ));
        }
        if let Err(e) = SetupCommandRef::parse(setup) {
            report.error(format_args!("input \"{name}\": {e}."));
        }
    }
}

fn check_derived_input(wrapper: &CommandWrapper, derived: &DerivedInput, report: &mut Report<'_>) {
    let name = derived.name();
    let parent = derived.derived_from_wrapper_input.as_str();

    if parent.trim().is_empty() {
        report.error(format_args!(
            "derived input \"{name}\" must set derived-from-wrapper-input."
        ));
    } else if parent == name {
        report.error(format_args!(
            "derived input \"{name}\" cannot be derived from itself."
        ));
    } else if wrapper.wrapper_input(parent).is_none() {
        report.error(format_args!(
            "derived input \"{name}\" is derived from unknown input \"{parent}\"."
        ));
    }

    if derived.multiple {
        if derived.input.provides_files_for_command_mount.is_some() {
            report.error(format_args!(
                "derived input \"{name}\" allows multiple values and cannot provide files for a mount."
            ));
        }
        if derived.input.provides_value_for_command_input.is_none() {
            report.error(format_args!(
                "derived input \"{name}\" allows multiple values and must provide a value for a command input."
            ));
        }
    }
}

fn check_output_handlers(command: &Command, wrapper: &CommandWrapper, report: &mut Report<'_>) {
    let mut handler_names: HashSet<&str> = HashSet::new();
    let mut handlers_by_output: HashMap<&str, Vec<&str>> = HashMap::new();

    for handler in &wrapper.output_handlers {
        let name = handler.name.as_str();
        if name.trim().is_empty() {
            report.error("output handler name cannot be blank.");
        } else if handler_names.contains(name) {
            report.error(format_args!("duplicate output handler name \"{name}\"."));
        }

        let output = handler.accepts_command_output.as_str();
        if command.output(output).is_none() {
            report.error(format_args!(
                "output handler \"{name}\" accepts unknown command output \"{output}\"."
            ));
        }
        handlers_by_output.entry(output).or_default().push(name);

        check_handler_fields(handler, report);
        check_handler_target(wrapper, handler, &handler_names, report);

        handler_names.insert(name);
    }

    for output in &command.outputs {
        match handlers_by_output.get(output.name.as_str()) {
            None => report.error(format_args!(
                "command output \"{}\" is not handled by any output handler.",
                output.name
            )),
            Some(handlers) if handlers.len() > 1 => report.error(format_args!(
                "command output \"{}\" is handled by multiple output handlers: {}.",
                output.name,
                handlers.join(", ")
            )),
            Some(_) => {}
        }
    }
}

fn check_handler_fields(handler: &OutputHandler, report: &mut Report<'_>) {
    let name = handler.name.as_str();
    match &handler.handler_type {
        OutputHandlerType::Unknown(raw) => report.error(format_args!(
            "output handler \"{name}\": {}",
            unknown_type(raw, OutputHandlerType::KNOWN)
        )),
        OutputHandlerType::Assessor if is_blank(&handler.xsi_type) => report.error(format_args!(
            "output handler \"{name}\" of type \"assessor\" must set xsi-type."
        )),
        OutputHandlerType::Resource if is_blank(&handler.label) => report.error(format_args!(
            "output handler \"{name}\" of type \"resource\" must set a label."
        )),
        _ => {}
    }

    if let Some(wrapup) = &handler.via_wrapup_command {
        if let Err(e) = SetupCommandRef::parse(wrapup) {
            report.error(format_args!("output handler \"{name}\": {e}."));
        }
    }
}

fn check_handler_target(
    wrapper: &CommandWrapper,
    handler: &OutputHandler,
    earlier_handlers: &HashSet<&str>,
    report: &mut Report<'_>,
) {
    let name = handler.name.as_str();
    let target = handler.as_a_child_of.as_str();

    if let Some(derived) = wrapper.derived_input(target) {
        if derived.multiple {
            report.error(format_args!(
                "output handler \"{name}\" cannot target \"{target}\", which allows multiple values."
            ));
        }
        if !derived.resolves_to_uri() {
            report.error(format_args!(
                "output handler \"{name}\" cannot target \"{target}\", whose value is not a URI."
            ));
        }
    } else if wrapper.wrapper_input(target).is_none() && !earlier_handlers.contains(target) {
        report.error(format_args!(
            "output handler \"{name}\" targets \"{target}\", which is neither a wrapper input nor an earlier output handler."
        ));
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn unknown_type(raw: &str, known: &[&str]) -> String {
    format!("unknown type \"{raw}\". Known values: {}", known.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::{CommandMount, CommandOutput, ExternalInput};

    fn base_command() -> Command {
        Command::new("tool", "xnat/tool:1.0")
    }

    fn session_wrapper() -> CommandWrapper {
        let mut wrapper = CommandWrapper::new("w");
        wrapper
            .external_inputs
            .push(ExternalInput::new("session", WrapperInputType::Session));
        wrapper
    }

    fn assert_has(errors: &[String], needle: &str) {
        assert!(
            errors.iter().any(|e| e.contains(needle)),
            "no error containing {needle:?} in {errors:#?}"
        );
    }

    mod command_fields {
        use super::*;

        #[test]
        fn valid_minimal_command() {
            assert!(validate(&base_command()).is_empty());
        }

        #[test]
        fn blank_name_and_untagged_image() {
            let command = Command::new(" ", "xnat/tool");
            let errors = validate(&command);
            assert_eq!(errors.len(), 2);
            assert_has(&errors, "name cannot be blank");
            assert_has(&errors, "':tag' suffix");
        }

        #[test]
        fn blank_image() {
            let command = Command::new("tool", "");
            assert_eq!(
                validate(&command),
                vec!["Command \"tool\" - image cannot be blank.".to_string()]
            );
        }

        #[test]
        fn unknown_command_type() {
            let mut command = base_command();
            command.command_type = CommandType::parse("podman");
            let errors = validate(&command);
            assert_eq!(errors.len(), 1);
            assert_has(&errors, "unknown type \"podman\"");
        }

        #[test]
        fn setup_command_restrictions() {
            let mut command = base_command();
            command.command_type = CommandType::DockerSetup;
            command.mounts.push(CommandMount::new("in", "/input"));
            command
                .inputs
                .push(CommandInput::new("x", CommandInputType::String));
            command.outputs.push(CommandOutput::new("o", "in"));
            command.wrappers.push(CommandWrapper::new("w"));
            command
                .environment_variables
                .insert("A".into(), "1".into());
            command.ports.insert("80".into(), "8080".into());

            let errors: Vec<_> = validate(&command)
                .into_iter()
                .filter(|e| e.contains("docker-setup commands cannot declare"))
                .collect();
            assert_eq!(errors.len(), 6);
            for category in [
                "mounts",
                "inputs",
                "outputs",
                "wrappers",
                "environment variables",
                "ports",
            ] {
                assert_has(&errors, &format!("cannot declare {category}."));
            }
        }

        #[test]
        fn empty_wrapup_command_is_valid() {
            let mut command = base_command();
            command.command_type = CommandType::DockerWrapup;
            assert!(validate(&command).is_empty());
        }
    }

    mod mounts_and_inputs {
        use super::*;

        #[test]
        fn duplicate_and_blank_mounts() {
            let mut command = base_command();
            command.mounts.push(CommandMount::new("in", "/input"));
            command.mounts.push(CommandMount::new("in", "/other"));
            command.mounts.push(CommandMount::new("", ""));
            let errors = validate(&command);
            assert_has(&errors, "duplicate mount name \"in\"");
            assert_has(&errors, "mount name cannot be blank");
            assert_has(&errors, "path cannot be blank");
        }

        #[test]
        fn input_name_pattern() {
            let mut command = base_command();
            command
                .inputs
                .push(CommandInput::new("bad name", CommandInputType::String));
            assert_has(&validate(&command), "cannot contain ' '");
        }

        #[test]
        fn select_requires_values() {
            let mut command = base_command();
            command
                .inputs
                .push(CommandInput::new("choice", CommandInputType::Select));
            assert_has(&validate(&command), "must have select-values");
        }

        #[test]
        fn non_select_forbids_values() {
            let mut command = base_command();
            let mut input = CommandInput::new("text", CommandInputType::String);
            input.select_values = vec!["a".into()];
            command.inputs.push(input);
            assert_has(&validate(&command), "cannot have select-values");
        }

        #[test]
        fn select_default_must_be_a_value() {
            let mut command = base_command();
            let mut input = CommandInput::new("choice", CommandInputType::Select);
            input.select_values = vec!["a".into(), "b".into()];
            input.base.default_value = Some("c".into());
            command.inputs.push(input);
            assert_has(&validate(&command), "default value \"c\" is not one of");
        }

        #[test]
        fn multiselect_default_is_subset() {
            let mut command = base_command();
            let mut input = CommandInput::new("many", CommandInputType::MultiSelect);
            input.select_values = vec!["a".into(), "b".into()];
            input.base.default_value = Some(r#"["a", "b"]"#.into());
            command.inputs.push(input.clone());
            assert!(validate(&command).is_empty());

            command.inputs[0].base.default_value = Some(r#"["a", "z"]"#.into());
            let errors = validate(&command);
            assert_eq!(errors.len(), 1);
            assert_has(&errors, "default value \"z\"");
        }

        #[test]
        fn unknown_delimiter() {
            let mut command = base_command();
            let mut input = CommandInput::new("x", CommandInputType::String);
            input.multiple_delimiter = Some(MultipleDelimiter::parse("tab"));
            command.inputs.push(input);
            assert_has(&validate(&command), "unknown multiple-delimiter \"tab\"");
        }

        #[test]
        fn output_mount_must_exist() {
            let mut command = base_command();
            command.outputs.push(CommandOutput::new("o", "nowhere"));
            assert_has(&validate(&command), "unknown mount \"nowhere\"");
        }
    }

    mod wrappers {
        use super::*;

        #[test]
        fn prefix_names_wrapper() {
            let mut command = base_command();
            let mut wrapper = session_wrapper();
            wrapper
                .external_inputs
                .push(ExternalInput::new("session", WrapperInputType::Session));
            command.wrappers.push(wrapper);
            assert_eq!(
                validate(&command),
                vec!["Command \"tool\" wrapper \"w\" - duplicate input name \"session\".".to_string()]
            );
        }

        #[test]
        fn duplicate_wrapper_names() {
            let mut command = base_command();
            command.wrappers.push(CommandWrapper::new("w"));
            command.wrappers.push(CommandWrapper::new("w"));
            assert_has(&validate(&command), "duplicate wrapper name \"w\"");
        }

        #[test]
        fn unknown_wrapper_input_type() {
            let mut command = base_command();
            let mut wrapper = CommandWrapper::new("w");
            wrapper
                .external_inputs
                .push(ExternalInput::new("x", WrapperInputType::parse("Widget")));
            command.wrappers.push(wrapper);
            assert_has(&validate(&command), "unknown type \"Widget\"");
        }

        #[test]
        fn references_must_exist() {
            let mut command = base_command();
            let mut wrapper = session_wrapper();
            wrapper.external_inputs[0].input.provides_value_for_command_input =
                Some("missing-input".into());
            wrapper.external_inputs[0].input.provides_files_for_command_mount =
                Some("missing-mount".into());
            command.wrappers.push(wrapper);
            let errors = validate(&command);
            assert_has(&errors, "unknown command input \"missing-input\"");
            assert_has(&errors, "unknown mount \"missing-mount\"");
        }

        #[test]
        fn setup_command_requires_mount() {
            let mut command = base_command();
            let mut wrapper = session_wrapper();
            wrapper.external_inputs[0].input.via_setup_command =
                Some("xnat/unzip:1.0:unzip".into());
            command.wrappers.push(wrapper);
            let errors = validate(&command);
            assert_eq!(errors.len(), 1);
            assert_has(&errors, "does not provide files for a mount");
        }

        #[test]
        fn unparseable_setup_reference() {
            let mut command = base_command();
            command.mounts.push(CommandMount::new("in", "/input"));
            let mut wrapper = session_wrapper();
            wrapper.external_inputs[0].input.provides_files_for_command_mount = Some("in".into());
            wrapper.external_inputs[0].input.via_setup_command = Some("unzip".into());
            command.wrappers.push(wrapper);
            assert_has(&validate(&command), "invalid command reference");
        }
    }

    mod derived_inputs {
        use super::*;

        fn command_with(derived: Vec<DerivedInput>) -> Command {
            let mut command = base_command();
            command
                .inputs
                .push(CommandInput::new("scan-ids", CommandInputType::String));
            command.mounts.push(CommandMount::new("in", "/input"));
            let mut wrapper = session_wrapper();
            wrapper.derived_inputs = derived;
            command.wrappers.push(wrapper);
            command
        }

        #[test]
        fn self_reference() {
            let command = command_with(vec![DerivedInput::new("a", WrapperInputType::Scan, "a")]);
            let errors = validate(&command);
            assert_eq!(errors.len(), 1);
            assert_has(&errors, "cannot be derived from itself");
        }

        #[test]
        fn unknown_parent() {
            let command =
                command_with(vec![DerivedInput::new("a", WrapperInputType::Scan, "nope")]);
            assert_has(&validate(&command), "derived from unknown input \"nope\"");
        }

        #[test]
        fn longer_cycle_reported() {
            let command = command_with(vec![
                DerivedInput::new("a", WrapperInputType::Scan, "b"),
                DerivedInput::new("b", WrapperInputType::Scan, "a"),
            ]);
            let errors = validate(&command);
            assert_eq!(errors.len(), 1);
            assert_has(&errors, "dependency cycle: a, b");
        }

        #[test]
        fn multiple_rules() {
            let mut bad = DerivedInput::new("scans", WrapperInputType::Scan, "session");
            bad.multiple = true;
            bad.input.provides_files_for_command_mount = Some("in".into());
            let errors = validate(&command_with(vec![bad]));
            assert_has(&errors, "cannot provide files for a mount");
            assert_has(&errors, "must provide a value for a command input");

            let mut good = DerivedInput::new("scans", WrapperInputType::Scan, "session");
            good.multiple = true;
            good.input.provides_value_for_command_input = Some("scan-ids".into());
            assert!(validate(&command_with(vec![good])).is_empty());
        }
    }

    mod output_handlers {
        use super::*;

        fn command_with(outputs: &[&str], handlers: Vec<OutputHandler>) -> Command {
            let mut command = base_command();
            command.mounts.push(CommandMount::writable("out", "/output"));
            for output in outputs {
                command.outputs.push(CommandOutput::new(*output, "out"));
            }
            let mut wrapper = session_wrapper();
            wrapper.output_handlers = handlers;
            command.wrappers.push(wrapper);
            command
        }

        #[test]
        fn unhandled_output_named() {
            let command = command_with(
                &["nifti", "report"],
                vec![OutputHandler::resource("h", "nifti", "session", "NIFTI")],
            );
            assert_eq!(
                validate(&command),
                vec![
                    "Command \"tool\" wrapper \"w\" - command output \"report\" is not handled by any output handler."
                        .to_string()
                ]
            );
        }

        #[test]
        fn output_handled_twice() {
            let command = command_with(
                &["nifti"],
                vec![
                    OutputHandler::resource("a", "nifti", "session", "A"),
                    OutputHandler::resource("b", "nifti", "session", "B"),
                ],
            );
            assert_has(&validate(&command), "handled by multiple output handlers: a, b");
        }

        #[test]
        fn unknown_output() {
            let command = command_with(
                &[],
                vec![OutputHandler::resource("h", "ghost", "session", "X")],
            );
            assert_has(&validate(&command), "unknown command output \"ghost\"");
        }

        #[test]
        fn type_specific_fields() {
            let mut assessor = OutputHandler::assessor("a", "x", "session", "");
            assessor.xsi_type = None;
            let mut resource = OutputHandler::resource("r", "y", "session", "");
            resource.label = None;
            let errors = validate(&command_with(&["x", "y"], vec![assessor, resource]));
            assert_has(&errors, "must set xsi-type");
            assert_has(&errors, "must set a label");
        }

        #[test]
        fn target_rules() {
            let handlers = vec![
                OutputHandler::resource("later", "a", "earlier", "A"),
                OutputHandler::assessor("earlier", "b", "session", "xnat:qcAssessmentData"),
                OutputHandler::resource("orphan", "c", "nowhere", "C"),
            ];
            let errors = validate(&command_with(&["a", "b", "c"], handlers));
            assert_eq!(errors.len(), 2);
            assert_has(&errors, "\"later\" targets \"earlier\"");
            assert_has(&errors, "\"orphan\" targets \"nowhere\"");
        }

        #[test]
        fn handler_on_earlier_handler() {
            let handlers = vec![
                OutputHandler::assessor("qc", "xml", "session", "xnat:qcAssessmentData"),
                OutputHandler::resource("report", "pdf", "qc", "REPORT"),
            ];
            assert!(validate(&command_with(&["xml", "pdf"], handlers)).is_empty());
        }

        #[test]
        fn derived_target_rules() {
            let mut command =
                command_with(&["a"], vec![OutputHandler::resource("h", "a", "label", "A")]);
            let mut label = DerivedInput::new("label", WrapperInputType::String, "session");
            label.derived_from_object_property = Some("label".into());
            command.wrappers[0].derived_inputs.push(label);
            assert_has(&validate(&command), "whose value is not a URI");

            command.wrappers[0].derived_inputs[0].derived_from_object_property =
                Some("uri".into());
            assert!(validate(&command).is_empty());
        }

        #[test]
        fn multiple_derived_target() {
            let mut command =
                command_with(&["a"], vec![OutputHandler::resource("h", "a", "scans", "A")]);
            command.inputs.push(CommandInput::new("ids", CommandInputType::String));
            let mut scans = DerivedInput::new("scans", WrapperInputType::Scan, "session");
            scans.multiple = true;
            scans.input.provides_value_for_command_input = Some("ids".into());
            command.wrappers[0].derived_inputs.push(scans);
            let errors = validate(&command);
            assert_eq!(errors.len(), 1);
            assert_has(&errors, "allows multiple values");
        }
    }
}
