//! resolve::flatten
//!
//! Collapse resolved input trees into a flat sequence for templating.
//!
//! # Algorithm
//!
//! Nodes are visited depth-first and always emitted before their
//! descendants. Then, depending on the node's values:
//!
//! - **Exactly one value**: the children of that value are flattened in
//!   turn. A uniquely resolved input passes its children through.
//! - **A `multiple` derived input**: every value must have exactly one child,
//!   a command input with exactly one value. Those values (blank ones
//!   skipped) are joined with a space into a single synthesized command
//!   input node.
//! - **Otherwise**: children are not flattened, there is no single value to
//!   extend the sequence with.
//!
//! A shape violation in the `multiple` case aborts the synthesis. In strict
//! mode ([`flatten`]) it is an error when the input is required; in
//! tolerant mode ([`flatten_tolerant`], used for previews) it is only logged.
//!
//! # Legacy partitions
//!
//! [`partition`] splits the flat sequence by input kind into records of
//! `(name, value, type, sensitive)`, duplicates removed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::errors::ResolutionError;
use super::tree::{ResolvedInputTreeNode, ResolvedInputValue};
use crate::core::command::{CommandInput, Input, InputKind};

/// Value used in legacy records for inputs that resolved to nothing.
pub const NULL_VALUE: &str = "null";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Strict,
    Tolerant,
}

/// Flatten `roots`, failing on shape violations of required inputs.
///
/// # Errors
///
/// Returns `ResolutionError::InputShape` if a required `multiple` derived
/// input's children cannot be collapsed into one command input.
pub fn flatten(
    roots: &[ResolvedInputTreeNode],
) -> Result<Vec<ResolvedInputTreeNode>, ResolutionError> {
    let mut out = Vec::new();
    for root in roots {
        flatten_node(root, Mode::Strict, &mut out)?;
    }
    Ok(out)
}

/// Flatten `roots`, skipping any synthesis that fails.
pub fn flatten_tolerant(roots: &[ResolvedInputTreeNode]) -> Vec<ResolvedInputTreeNode> {
    let mut out = Vec::new();
    for root in roots {
        // Tolerant mode never returns an error.
        let _ = flatten_node(root, Mode::Tolerant, &mut out);
    }
    out
}

fn flatten_node(
    node: &ResolvedInputTreeNode,
    mode: Mode,
    out: &mut Vec<ResolvedInputTreeNode>,
) -> Result<(), ResolutionError> {
    out.push(node.clone());

    match node.values_and_children.as_slice() {
        [] => {}
        [single] => {
            for child in &single.children {
                flatten_node(child, mode, out)?;
            }
        }
        _ if node.input.is_multiple_derived() => match synthesize(node) {
            Ok(synthesized) => out.push(synthesized),
            Err(reason) => {
                if mode == Mode::Strict && node.input.required() {
                    return Err(ResolutionError::InputShape {
                        input: node.name().to_string(),
                        reason,
                    });
                }
                warn!(input = node.name(), %reason, "skipping multiple-value input");
            }
        },
        _ => {}
    }
    Ok(())
}

/// Join the single command-input child of every value into one node.
fn synthesize(node: &ResolvedInputTreeNode) -> Result<ResolvedInputTreeNode, String> {
    let mut command_input: Option<&CommandInput> = None;
    let mut values = Vec::new();

    for (i, entry) in node.values_and_children.iter().enumerate() {
        let [child] = entry.children.as_slice() else {
            return Err(format!(
                "value {} has {} children, expected one command input",
                i + 1,
                entry.children.len()
            ));
        };
        let Input::Command(input) = &child.input else {
            return Err(format!(
                "value {} has child \"{}\", which is not a command input",
                i + 1,
                child.name()
            ));
        };
        let [only] = child.values_and_children.as_slice() else {
            return Err(format!(
                "command input \"{}\" under value {} has {} values, expected one",
                child.name(),
                i + 1,
                child.values_and_children.len()
            ));
        };
        command_input.get_or_insert(input);
        if let Some(value) = only.resolved_value.non_blank() {
            values.push(value);
        }
    }

    let input = command_input.ok_or_else(|| "no values".to_string())?;
    debug!(
        input = node.name(),
        command_input = input.name(),
        count = values.len(),
        "synthesized multiple-value command input"
    );
    Ok(ResolvedInputTreeNode::new(input.clone())
        .with_value(ResolvedInputValue::new(values.join(" ")), Vec::new()))
}

/// One input value in the legacy partitioned form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LegacyInputValue {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub input_type: String,
    #[serde(default)]
    pub sensitive: bool,
}

/// Flat values split by input kind, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LegacyInputValues {
    #[serde(default)]
    pub external: Vec<LegacyInputValue>,
    #[serde(default)]
    pub derived: Vec<LegacyInputValue>,
    #[serde(default)]
    pub command: Vec<LegacyInputValue>,
}

/// Split a flat sequence into external, derived and command input values.
///
/// Each node contributes its first value, or [`NULL_VALUE`] if it has none.
/// A `multiple` derived input with several values contributes all of them
/// joined with `", "`.
pub fn partition(flat: &[ResolvedInputTreeNode]) -> LegacyInputValues {
    let mut values = LegacyInputValues::default();
    let mut seen = HashSet::new();

    for node in flat {
        let value = if node.input.is_multiple_derived() && node.values_and_children.len() > 1 {
            node.values()
                .map(|v| v.value.as_deref().unwrap_or(NULL_VALUE))
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            node.first_value().unwrap_or(NULL_VALUE).to_string()
        };

        let record = LegacyInputValue {
            name: node.name().to_string(),
            value,
            input_type: node.input.type_name().to_string(),
            sensitive: node.input.sensitive(),
        };
        if !seen.insert(record.clone()) {
            continue;
        }
        match node.input.kind() {
            InputKind::External => values.external.push(record),
            InputKind::Derived => values.derived.push(record),
            InputKind::Command => values.command.push(record),
        }
    }

    values
}

/// A flat sequence together with its legacy partitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FlattenedInputs {
    pub flat: Vec<ResolvedInputTreeNode>,
    pub legacy: LegacyInputValues,
}

impl FlattenedInputs {
    /// Flatten strictly and partition.
    ///
    /// # Errors
    ///
    /// See [`flatten`].
    pub fn strict(roots: &[ResolvedInputTreeNode]) -> Result<Self, ResolutionError> {
        Ok(Self::from_flat(flatten(roots)?))
    }

    /// Flatten tolerantly and partition.
    pub fn tolerant(roots: &[ResolvedInputTreeNode]) -> Self {
        Self::from_flat(flatten_tolerant(roots))
    }

    fn from_flat(flat: Vec<ResolvedInputTreeNode>) -> Self {
        let legacy = partition(&flat);
        Self { flat, legacy }
    }

    /// First value of the first flat node named `name`.
    ///
    /// Later nodes with the same name (a synthesized node, say) are
    /// reachable through [`FlattenedInputs::last_value_of`].
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.flat
            .iter()
            .find(|n| n.name() == name)
            .and_then(|n| n.first_value())
    }

    /// First value of the last flat node named `name`.
    pub fn last_value_of(&self, name: &str) -> Option<&str> {
        self.flat
            .iter()
            .rev()
            .find(|n| n.name() == name)
            .and_then(|n| n.first_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::{DerivedInput, ExternalInput};
    use crate::core::kinds::{CommandInputType, WrapperInputType};

    fn command_leaf(name: &str, values: &[&str]) -> ResolvedInputTreeNode {
        ResolvedInputTreeNode::leaf(
            CommandInput::new(name, CommandInputType::String),
            values.iter().copied(),
        )
    }

    fn multiple_scans(required: bool) -> DerivedInput {
        let mut scans = DerivedInput::new("scans", WrapperInputType::Scan, "session");
        scans.multiple = true;
        scans.input.base.required = required;
        scans
    }

    fn names(flat: &[ResolvedInputTreeNode]) -> Vec<&str> {
        flat.iter().map(|n| n.name()).collect()
    }

    mod flattening {
        use super::*;

        #[test]
        fn single_value_passes_children_through() {
            let scan = ResolvedInputTreeNode::new(DerivedInput::new(
                "scan",
                WrapperInputType::Scan,
                "session",
            ))
            .with_value(
                ResolvedInputValue::new("/scans/1"),
                vec![command_leaf("scan-id", &["1"])],
            );
            let session =
                ResolvedInputTreeNode::new(ExternalInput::new("session", WrapperInputType::Session))
                    .with_value(ResolvedInputValue::new("/experiments/E1"), vec![scan]);

            let flat = flatten(&[session]).unwrap();
            assert_eq!(names(&flat), vec!["session", "scan", "scan-id"]);
        }

        #[test]
        fn multiple_derived_values_joined() {
            let mut node = ResolvedInputTreeNode::new(multiple_scans(true));
            for (uri, id) in [("/s/1", "a"), ("/s/2", "b"), ("/s/3", "c")] {
                node = node.with_value(ResolvedInputValue::new(uri), vec![command_leaf("ids", &[id])]);
            }

            let flat = flatten(&[node]).unwrap();
            assert_eq!(names(&flat), vec!["scans", "ids"]);
            let synthesized = &flat[1];
            assert!(matches!(synthesized.input, Input::Command(_)));
            assert_eq!(synthesized.first_value(), Some("a b c"));
            assert_eq!(synthesized.values_and_children.len(), 1);
            assert!(synthesized.values_and_children[0].children.is_empty());
        }

        #[test]
        fn blank_values_skipped_in_join() {
            let node = ResolvedInputTreeNode::new(multiple_scans(true))
                .with_value(ResolvedInputValue::new("/s/1"), vec![command_leaf("ids", &["a"])])
                .with_value(ResolvedInputValue::new("/s/2"), vec![command_leaf("ids", &[" "])])
                .with_value(ResolvedInputValue::new("/s/3"), vec![command_leaf("ids", &["c"])]);
            let flat = flatten(&[node]).unwrap();
            assert_eq!(flat[1].first_value(), Some("a c"));
        }

        #[test]
        fn several_values_without_multiple_stop() {
            let scan = DerivedInput::new("scan", WrapperInputType::Scan, "session");
            let node = ResolvedInputTreeNode::new(scan)
                .with_value(ResolvedInputValue::new("/s/1"), vec![command_leaf("id", &["1"])])
                .with_value(ResolvedInputValue::new("/s/2"), vec![command_leaf("id", &["2"])]);
            let flat = flatten(&[node]).unwrap();
            assert_eq!(names(&flat), vec!["scan"]);
        }

        #[test]
        fn zero_values_emit_only_the_node() {
            let flat = flatten(&[ResolvedInputTreeNode::new(multiple_scans(true))]).unwrap();
            assert_eq!(names(&flat), vec!["scans"]);
        }

        #[test]
        fn shape_violation_required_is_error() {
            let node = ResolvedInputTreeNode::new(multiple_scans(true))
                .with_value(ResolvedInputValue::new("/s/1"), vec![command_leaf("ids", &["a"])])
                .with_value(ResolvedInputValue::new("/s/2"), Vec::new());
            let err = flatten(&[node]).unwrap_err();
            match err {
                ResolutionError::InputShape { input, reason } => {
                    assert_eq!(input, "scans");
                    assert!(reason.contains("0 children"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn shape_violation_optional_is_skipped() {
            let node = ResolvedInputTreeNode::new(multiple_scans(false))
                .with_value(ResolvedInputValue::new("/s/1"), vec![command_leaf("ids", &["a"])])
                .with_value(ResolvedInputValue::new("/s/2"), vec![command_leaf("ids", &["b", "c"])]);
            let flat = flatten(&[node]).unwrap();
            assert_eq!(names(&flat), vec!["scans"]);
        }

        #[test]
        fn non_command_child_is_violation() {
            let file = ResolvedInputTreeNode::leaf(
                DerivedInput::new("file", WrapperInputType::File, "scans"),
                ["/f"],
            );
            let node = ResolvedInputTreeNode::new(multiple_scans(true))
                .with_value(ResolvedInputValue::new("/s/1"), vec![file.clone()])
                .with_value(ResolvedInputValue::new("/s/2"), vec![file]);
            assert!(matches!(
                flatten(std::slice::from_ref(&node)),
                Err(ResolutionError::InputShape { .. })
            ));
            assert_eq!(names(&flatten_tolerant(&[node])), vec!["scans"]);
        }
    }

    mod partitioning {
        use super::*;

        #[test]
        fn split_by_kind() {
            let flat = vec![
                ResolvedInputTreeNode::leaf(
                    ExternalInput::new("session", WrapperInputType::Session),
                    ["/e/1"],
                ),
                ResolvedInputTreeNode::leaf(
                    DerivedInput::new("scan", WrapperInputType::Scan, "session"),
                    ["/s/1"],
                ),
                command_leaf("id", &["1"]),
            ];
            let legacy = partition(&flat);
            assert_eq!(legacy.external.len(), 1);
            assert_eq!(legacy.external[0].value, "/e/1");
            assert_eq!(legacy.external[0].input_type, "Session");
            assert_eq!(legacy.derived[0].name, "scan");
            assert_eq!(legacy.command[0].value, "1");
        }

        #[test]
        fn missing_value_is_null() {
            let legacy = partition(&[command_leaf("id", &[])]);
            assert_eq!(legacy.command[0].value, NULL_VALUE);
        }

        #[test]
        fn multiple_values_joined_with_comma() {
            let node = ResolvedInputTreeNode::leaf(multiple_scans(true), ["/s/1", "/s/2"]);
            let legacy = partition(&[node]);
            assert_eq!(legacy.derived[0].value, "/s/1, /s/2");
        }

        #[test]
        fn duplicates_suppressed() {
            let legacy = partition(&[
                command_leaf("id", &["1"]),
                command_leaf("id", &["1"]),
                command_leaf("id", &["2"]),
            ]);
            let values: Vec<_> = legacy.command.iter().map(|v| v.value.as_str()).collect();
            assert_eq!(values, vec!["1", "2"]);
        }

        #[test]
        fn sensitivity_distinguishes_records() {
            let mut secret = CommandInput::new("id", CommandInputType::String);
            secret.base.sensitive = true;
            let legacy = partition(&[
                command_leaf("id", &["1"]),
                ResolvedInputTreeNode::leaf(secret, ["1"]),
            ]);
            assert_eq!(legacy.command.len(), 2);
            assert!(legacy.command[1].sensitive);
        }
    }

    #[test]
    fn flattened_inputs_lookup() {
        let mut node = ResolvedInputTreeNode::new(multiple_scans(true));
        for id in ["a", "b"] {
            node = node.with_value(ResolvedInputValue::new("/s"), vec![command_leaf("ids", &[id])]);
        }
        let inputs = FlattenedInputs::strict(&[command_leaf("ids", &["x"]), node]).unwrap();
        assert_eq!(inputs.value_of("ids"), Some("x"));
        assert_eq!(inputs.last_value_of("ids"), Some("a b"));
        assert_eq!(inputs.value_of("missing"), None);
        assert_eq!(inputs.legacy.command.len(), 2);
    }
}
