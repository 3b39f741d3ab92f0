//! core::permissions
//!
//! Infer which permissions a user needs to launch a wrapper.
//!
//! # Algorithm
//!
//! Permissions are derived from the wrapper declaration alone, without
//! looking at live objects:
//!
//! 1. Each external input needs `read` on the object the wrapper is
//!    launched against, whatever the input's declared type. That object's
//!    type is only known at launch time, so it is recorded as the
//!    [`CONTEXT_PLACEHOLDER`] type.
//! 2. Derived inputs, in dependency order, need `read` on the type given by
//!    [`DerivedInput::permission_type_for`] applied to their parent's type.
//! 3. Output handlers, in dependency order, need `edit` on the type given by
//!    [`OutputHandler::edit_permission_type_for`] applied to their target's
//!    type. A handler's target may be another handler, whose type is the
//!    one computed for it in this step.
//! 4. The placeholder is replaced by the caller's context type.
//!
//! Inputs whose type cannot be pinned down from the declaration (a session
//! derived from a subject, say) contribute nothing here; they are checked
//! against live data during resolution.
//!
//! # Caching
//!
//! [`WrapperAnalysis`] borrows a wrapper and memoizes the orderings and the
//! placeholder permission set in `OnceLock`s. The borrow keeps the wrapper
//! unchanged for as long as the cache lives. Only the placeholder form is
//! cached; substitution runs on every call because the context varies by
//! caller.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::command::{CommandWrapper, DerivedInput, ExternalInput, OutputHandler};
use super::graph::{order_derived_inputs, order_output_handlers, CycleError};

/// Stand-in for the type of the object a wrapper is launched against.
pub const CONTEXT_PLACEHOLDER: &str = "context";

/// Kind of access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    Read,
    Edit,
}

/// An action on an object type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Permission {
    pub action: PermissionAction,
    pub object_type: String,
}

impl Permission {
    pub fn read(object_type: impl Into<String>) -> Self {
        Self {
            action: PermissionAction::Read,
            object_type: object_type.into(),
        }
    }

    pub fn edit(object_type: impl Into<String>) -> Self {
        Self {
            action: PermissionAction::Edit,
            object_type: object_type.into(),
        }
    }

    fn is_placeholder(&self) -> bool {
        self.object_type == CONTEXT_PLACEHOLDER
    }
}

/// Compute the permissions needed to launch `wrapper` on an object of
/// `context_type`.
///
/// # Errors
///
/// Returns [`CycleError`] if the wrapper's derived inputs or output handlers
/// depend on each other in a cycle.
///
/// # Example
///
/// ```
/// use cmdwrap::core::command::{CommandWrapper, ExternalInput, OutputHandler};
/// use cmdwrap::core::kinds::WrapperInputType;
/// use cmdwrap::core::permissions::{required_permissions, Permission};
///
/// let mut wrapper = CommandWrapper::new("qc");
/// wrapper.external_inputs.push(ExternalInput::new("session", WrapperInputType::Session));
/// wrapper.output_handlers.push(OutputHandler::assessor(
///     "qc-assessor", "qc", "session", "xnat:qcManualAssessorData",
/// ));
///
/// let permissions = required_permissions(&wrapper, "xnat:mrSessionData").unwrap();
/// assert!(permissions.contains(&Permission::read("xnat:mrSessionData")));
/// assert!(permissions.contains(&Permission::edit("xnat:qcManualAssessorData")));
/// assert_eq!(permissions.len(), 2);
/// ```
pub fn required_permissions(
    wrapper: &CommandWrapper,
    context_type: &str,
) -> Result<BTreeSet<Permission>, CycleError> {
    WrapperAnalysis::new(wrapper).required_permissions(context_type)
}

/// Memoized analysis of one wrapper.
///
/// Safe to share between threads: every cell is computed at most once and
/// recomputing would give the same value.
#[derive(Debug)]
pub struct WrapperAnalysis<'a> {
    wrapper: &'a CommandWrapper,
    derived_order: OnceLock<Result<Vec<&'a DerivedInput>, CycleError>>,
    handler_order: OnceLock<Result<Vec<&'a OutputHandler>, CycleError>>,
    permissions: OnceLock<Result<BTreeSet<Permission>, CycleError>>,
}

impl<'a> WrapperAnalysis<'a> {
    /// Start an analysis of `wrapper`. Nothing is computed until asked for.
    pub fn new(wrapper: &'a CommandWrapper) -> Self {
        Self {
            wrapper,
            derived_order: OnceLock::new(),
            handler_order: OnceLock::new(),
            permissions: OnceLock::new(),
        }
    }

    /// The analysed wrapper.
    pub fn wrapper(&self) -> &'a CommandWrapper {
        self.wrapper
    }

    /// Derived inputs in dependency order.
    pub fn derived_input_order(&self) -> Result<&[&'a DerivedInput], CycleError> {
        self.derived_order
            .get_or_init(|| order_derived_inputs(&self.wrapper.derived_inputs))
            .as_deref()
            .map_err(Clone::clone)
    }

    /// Output handlers in dependency order.
    pub fn output_handler_order(&self) -> Result<&[&'a OutputHandler], CycleError> {
        self.handler_order
            .get_or_init(|| order_output_handlers(&self.wrapper.output_handlers))
            .as_deref()
            .map_err(Clone::clone)
    }

    /// Permissions with the launch object's type left as [`CONTEXT_PLACEHOLDER`].
    pub fn placeholder_permissions(&self) -> Result<&BTreeSet<Permission>, CycleError> {
        self.permissions
            .get_or_init(|| {
                let derived = self.derived_input_order()?;
                let handlers = self.output_handler_order()?;
                let permissions =
                    infer_placeholder_permissions(&self.wrapper.external_inputs, derived, handlers);
                debug!(
                    wrapper = %self.wrapper.name,
                    count = permissions.len(),
                    "inferred wrapper permissions"
                );
                Ok(permissions)
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Permissions needed to launch on an object of `context_type`.
    pub fn required_permissions(
        &self,
        context_type: &str,
    ) -> Result<BTreeSet<Permission>, CycleError> {
        let placeholder = self.placeholder_permissions()?;
        Ok(substitute_context(placeholder, context_type))
    }
}

fn infer_placeholder_permissions(
    external_inputs: &[ExternalInput],
    derived_inputs: &[&DerivedInput],
    output_handlers: &[&OutputHandler],
) -> BTreeSet<Permission> {
    let mut permissions = BTreeSet::new();
    let mut input_types: HashMap<&str, Option<String>> = HashMap::new();
    let mut handler_types: HashMap<&str, Option<String>> = HashMap::new();

    for external in external_inputs {
        permissions.insert(Permission::read(CONTEXT_PLACEHOLDER));
        input_types.insert(external.name(), Some(CONTEXT_PLACEHOLDER.to_string()));
    }

    for derived in derived_inputs {
        let parent_type = input_types
            .get(derived.derived_from_wrapper_input.as_str())
            .cloned()
            .flatten();
        let object_type = derived.permission_type_for(parent_type.as_deref());
        if let Some(object_type) = &object_type {
            permissions.insert(Permission::read(object_type.clone()));
        }
        input_types.insert(derived.name(), object_type);
    }

    for handler in output_handlers {
        let target = handler.as_a_child_of.as_str();
        let parent_type = input_types
            .get(target)
            .or_else(|| handler_types.get(target))
            .cloned()
            .flatten();
        let object_type = handler.edit_permission_type_for(parent_type.as_deref());
        if let Some(object_type) = &object_type {
            permissions.insert(Permission::edit(object_type.clone()));
        }
        handler_types.insert(handler.name.as_str(), object_type);
    }

    permissions
}

fn substitute_context(permissions: &BTreeSet<Permission>, context_type: &str) -> BTreeSet<Permission> {
    permissions
        .iter()
        .map(|p| {
            if p.is_placeholder() {
                Permission {
                    action: p.action,
                    object_type: context_type.to_string(),
                }
            } else {
                p.clone()
            }
        })
        .collect()
}
