//! core::command::wrapper
//!
//! Wrapper schema: the ways a command can be invoked against external
//! objects.
//!
//! # Inputs
//!
//! All inputs share an [`InputBase`] record. The concrete kinds are:
//!
//! - [`CommandInput`] - a value for the command line template
//! - [`ExternalInput`] - the root object the wrapper is launched on
//! - [`DerivedInput`] - a value computed from another wrapper input
//!
//! [`Input`] is the closed sum over the three kinds, used wherever code has
//! to handle any of them (notably the resolved input tree).
//!
//! # Output Handlers
//!
//! An [`OutputHandler`] turns one command output into an object created
//! under a wrapper input or under the object created by an earlier handler.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::schema::{default_true, CommandInput};
use crate::core::kinds::{CommandInputType, OutputHandlerType, WrapperInputType};

/// Object property whose value is an upload target.
pub const URI_PROPERTY: &str = "uri";

/// Per-kind defaults for the shared input record.
pub trait InputTypeDefaults: Default {
    /// Default for the `required` flag.
    fn default_required() -> bool;
}

impl InputTypeDefaults for CommandInputType {
    fn default_required() -> bool {
        false
    }
}

impl InputTypeDefaults for WrapperInputType {
    fn default_required() -> bool {
        true
    }
}

/// Fields shared by every kind of input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InputBase<T: InputTypeDefaults> {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub input_type: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default = "T::default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement_key: Option<String>,
    #[serde(default)]
    pub sensitive: bool,
}

impl<T: InputTypeDefaults> InputBase<T> {
    /// Create a base record with the kind's default `required` flag.
    pub fn new(name: impl Into<String>, input_type: T) -> Self {
        Self {
            name: name.into(),
            label: None,
            description: None,
            input_type,
            matcher: None,
            default_value: None,
            required: T::default_required(),
            replacement_key: None,
            sensitive: false,
        }
    }
}

/// Fields shared by external and derived wrapper inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WrapperInput {
    #[serde(flatten)]
    pub base: InputBase<WrapperInputType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provides_value_for_command_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provides_files_for_command_mount: Option<String>,
    /// `image:tag:name` of a setup command that prepares the mounted files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via_setup_command: Option<String>,
    #[serde(default = "default_true")]
    pub user_settable: bool,
    #[serde(default = "default_true")]
    pub load_children: bool,
}

impl WrapperInput {
    /// Create a required wrapper input.
    pub fn new(name: impl Into<String>, input_type: WrapperInputType) -> Self {
        Self {
            base: InputBase::new(name, input_type),
            provides_value_for_command_input: None,
            provides_files_for_command_mount: None,
            via_setup_command: None,
            user_settable: true,
            load_children: true,
        }
    }
}

/// The root object a wrapper is launched against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalInput {
    pub input: WrapperInput,
}

impl ExternalInput {
    /// Create a required external input.
    pub fn new(name: impl Into<String>, input_type: WrapperInputType) -> Self {
        Self {
            input: WrapperInput::new(name, input_type),
        }
    }

    /// The input's name.
    pub fn name(&self) -> &str {
        &self.input.base.name
    }

    /// The input's declared type.
    pub fn input_type(&self) -> &WrapperInputType {
        &self.input.base.input_type
    }
}

/// A wrapper input whose value is derived from another wrapper input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DerivedInput {
    #[serde(flatten)]
    pub input: WrapperInput,
    #[serde(default)]
    pub derived_from_wrapper_input: String,
    #[serde(
        default,
        alias = "derived-from-xnat-object-property",
        skip_serializing_if = "Option::is_none"
    )]
    pub derived_from_object_property: Option<String>,
    /// Allow the input to fan out to many values
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
}

impl DerivedInput {
    /// Create a required single-valued derived input.
    pub fn new(
        name: impl Into<String>,
        input_type: WrapperInputType,
        derived_from: impl Into<String>,
    ) -> Self {
        Self {
            input: WrapperInput::new(name, input_type),
            derived_from_wrapper_input: derived_from.into(),
            derived_from_object_property: None,
            multiple: false,
            parser: None,
        }
    }

    /// The input's name.
    pub fn name(&self) -> &str {
        &self.input.base.name
    }

    /// The input's declared type.
    pub fn input_type(&self) -> &WrapperInputType {
        &self.input.base.input_type
    }

    /// Object type a user must be able to read for this input to resolve,
    /// given the object type its parent input requires.
    ///
    /// Projects and subjects have a single concrete type. Scans and resources
    /// are readable whenever their parent is. Everything else (sessions,
    /// assessors, files, strings, ...) cannot be pinned down without looking
    /// at live data, and yields `None`.
    pub fn permission_type_for(&self, parent_type: Option<&str>) -> Option<String> {
        match self.input_type() {
            WrapperInputType::Project | WrapperInputType::Subject => self
                .input_type()
                .concrete_object_type()
                .map(str::to_string),
            WrapperInputType::Scan | WrapperInputType::Resource => {
                parent_type.map(str::to_string)
            }
            _ => None,
        }
    }

    /// Whether the resolved value is the object's URI.
    pub fn resolves_to_uri(&self) -> bool {
        self.derived_from_object_property
            .as_deref()
            .map_or(true, |p| p == URI_PROPERTY)
    }
}

/// Turns a command output into a created object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputHandler {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub accepts_command_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via_wrapup_command: Option<String>,
    /// A wrapper input name or the name of an earlier handler
    #[serde(default)]
    pub as_a_child_of: String,
    #[serde(rename = "type", default)]
    pub handler_type: OutputHandlerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xsi_type: Option<String>,
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
}

impl OutputHandler {
    /// Create a resource handler.
    pub fn resource(
        name: impl Into<String>,
        accepts_command_output: impl Into<String>,
        as_a_child_of: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            accepts_command_output: accepts_command_output.into(),
            via_wrapup_command: None,
            as_a_child_of: as_a_child_of.into(),
            handler_type: OutputHandlerType::Resource,
            xsi_type: None,
            label: Some(label.into()),
            format: None,
            description: None,
            content: None,
            tags: Vec::new(),
        }
    }

    /// Create an assessor handler creating objects of `xsi_type`.
    pub fn assessor(
        name: impl Into<String>,
        accepts_command_output: impl Into<String>,
        as_a_child_of: impl Into<String>,
        xsi_type: impl Into<String>,
    ) -> Self {
        Self {
            handler_type: OutputHandlerType::Assessor,
            xsi_type: Some(xsi_type.into()),
            label: None,
            ..Self::resource(name, accepts_command_output, as_a_child_of, "")
        }
    }

    /// Object type a user must be able to edit to run this handler, given
    /// the object type of its target.
    ///
    /// Creating an assessor needs permission on the created type itself;
    /// everything else is created inside the target.
    pub fn edit_permission_type_for(&self, parent_type: Option<&str>) -> Option<String> {
        match self.handler_type {
            OutputHandlerType::Assessor => self.xsi_type.clone(),
            _ => parent_type.map(str::to_string),
        }
    }
}

/// A way of invoking a command against external objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandWrapper {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Object types the wrapper can be launched on
    #[serde(default)]
    pub contexts: BTreeSet<String>,
    #[serde(default)]
    pub external_inputs: Vec<ExternalInput>,
    #[serde(default)]
    pub derived_inputs: Vec<DerivedInput>,
    #[serde(default)]
    pub output_handlers: Vec<OutputHandler>,
}

impl CommandWrapper {
    /// Create an empty wrapper.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Iterate over external then derived inputs.
    pub fn wrapper_inputs(&self) -> impl Iterator<Item = &WrapperInput> {
        self.external_inputs
            .iter()
            .map(|e| &e.input)
            .chain(self.derived_inputs.iter().map(|d| &d.input))
    }

    /// Find a wrapper input (external or derived) by name.
    pub fn wrapper_input(&self, name: &str) -> Option<&WrapperInput> {
        self.wrapper_inputs().find(|i| i.base.name == name)
    }

    /// Find a derived input by name.
    pub fn derived_input(&self, name: &str) -> Option<&DerivedInput> {
        self.derived_inputs.iter().find(|d| d.name() == name)
    }

    /// Find an output handler by name.
    pub fn output_handler(&self, name: &str) -> Option<&OutputHandler> {
        self.output_handlers.iter().find(|h| h.name == name)
    }
}

/// Kind tag of an [`Input`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Command,
    External,
    Derived,
}

/// Any input definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "input", rename_all = "kebab-case")]
pub enum Input {
    Command(CommandInput),
    External(ExternalInput),
    Derived(DerivedInput),
}

impl Input {
    /// The kind tag.
    pub fn kind(&self) -> InputKind {
        match self {
            Input::Command(_) => InputKind::Command,
            Input::External(_) => InputKind::External,
            Input::Derived(_) => InputKind::Derived,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Input::Command(i) => &i.base.name,
            Input::External(i) => &i.input.base.name,
            Input::Derived(i) => &i.input.base.name,
        }
    }

    pub fn required(&self) -> bool {
        match self {
            Input::Command(i) => i.base.required,
            Input::External(i) => i.input.base.required,
            Input::Derived(i) => i.input.base.required,
        }
    }

    pub fn sensitive(&self) -> bool {
        match self {
            Input::Command(i) => i.base.sensitive,
            Input::External(i) => i.input.base.sensitive,
            Input::Derived(i) => i.input.base.sensitive,
        }
    }

    /// Wire name of the declared type.
    pub fn type_name(&self) -> &str {
        match self {
            Input::Command(i) => i.base.input_type.as_str(),
            Input::External(i) => i.input.base.input_type.as_str(),
            Input::Derived(i) => i.input.base.input_type.as_str(),
        }
    }

    /// Whether this is a derived input allowed to fan out.
    pub fn is_multiple_derived(&self) -> bool {
        matches!(self, Input::Derived(d) if d.multiple)
    }
}

impl From<CommandInput> for Input {
    fn from(input: CommandInput) -> Self {
        Input::Command(input)
    }
}

impl From<ExternalInput> for Input {
    fn from(input: ExternalInput) -> Self {
        Input::External(input)
    }
}

impl From<DerivedInput> for Input {
    fn from(input: DerivedInput) -> Self {
        Input::Derived(input)
    }
}
