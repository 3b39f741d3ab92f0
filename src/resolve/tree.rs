//! resolve::tree
//!
//! Resolved input trees.
//!
//! A wrapper's inputs resolve to a forest: each node pairs an input
//! definition with every runtime value it resolved to, and each value
//! carries the subtrees of inputs derived from that particular value.
//!
//! ```text
//! session = "/experiments/E1"
//! └── scan = "/experiments/E1/scans/1"
//!     └── scan-id (command input) = "1"
//! ```
//!
//! Trees are built by the resolution engine and only read here.

use serde::{Deserialize, Serialize};

use crate::core::command::Input;

/// One runtime value an input resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedInputValue {
    /// `None` when the input resolved but carries no value
    pub value: Option<String>,
    /// Display label for the value (an object label, say)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_label: Option<String>,
}

impl ResolvedInputValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            value_label: None,
        }
    }

    /// A value that resolved to nothing.
    pub fn null() -> Self {
        Self {
            value: None,
            value_label: None,
        }
    }

    /// Attach a display label.
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.value_label = Some(label.into());
        self
    }

    /// The value, if present and not blank.
    pub fn non_blank(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.trim().is_empty())
    }
}

/// A resolved value and the inputs derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ValueAndChildren {
    pub resolved_value: ResolvedInputValue,
    #[serde(default)]
    pub children: Vec<ResolvedInputTreeNode>,
}

/// An input definition with everything it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedInputTreeNode {
    pub input: Input,
    #[serde(default)]
    pub values_and_children: Vec<ValueAndChildren>,
}

impl ResolvedInputTreeNode {
    /// A node that resolved to no values.
    pub fn new(input: impl Into<Input>) -> Self {
        Self {
            input: input.into(),
            values_and_children: Vec::new(),
        }
    }

    /// A node with one value per item and no children.
    pub fn leaf<I, S>(input: impl Into<Input>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values
            .into_iter()
            .fold(Self::new(input), |node, v| {
                node.with_value(ResolvedInputValue::new(v), Vec::new())
            })
    }

    /// Append a value and the subtrees derived from it.
    pub fn with_value(
        mut self,
        resolved_value: ResolvedInputValue,
        children: Vec<ResolvedInputTreeNode>,
    ) -> Self {
        self.values_and_children.push(ValueAndChildren {
            resolved_value,
            children,
        });
        self
    }

    /// The input's name.
    pub fn name(&self) -> &str {
        self.input.name()
    }

    /// Iterate over the resolved values in order.
    pub fn values(&self) -> impl Iterator<Item = &ResolvedInputValue> {
        self.values_and_children.iter().map(|v| &v.resolved_value)
    }

    /// The first resolved value, if any.
    pub fn first_value(&self) -> Option<&str> {
        self.values_and_children
            .first()
            .and_then(|v| v.resolved_value.value.as_deref())
    }

    /// Whether some value is present and not blank.
    pub fn has_value(&self) -> bool {
        self.values().any(|v| v.non_blank().is_some())
    }
}
