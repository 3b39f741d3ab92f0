//! core::graph
//!
//! Dependency ordering for wrapper inputs and output handlers.
//!
//! # Architecture
//!
//! Both orderings are the same algorithm over a different edge:
//! - Derived inputs: `derived-from-wrapper-input -> derived input`
//! - Output handlers: `as-a-child-of -> handler`
//!
//! Items whose target is not another item in the same list (a derived
//! input derived from an external input, a handler attached to a wrapper
//! input) have no edge.
//!
//! # Invariants
//!
//! - For every item X depending on item Y, Y is ordered before X
//! - Items with no relative dependency keep their declaration order
//! - A cycle is reported, never silently dropped

use std::collections::HashMap;
use std::hash::Hash;

use thiserror::Error;
use tracing::debug;

use super::command::{DerivedInput, OutputHandler};

/// A dependency cycle prevented ordering.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("dependency cycle among: {}", .members.join(", "))]
pub struct CycleError {
    /// Keys of the items that could not be placed, in declaration order
    pub members: Vec<String>,
}

/// Order `items` so that every item comes after the item it depends on.
///
/// `key_of` names an item; `target_of` names the item it depends on, if
/// any. Returns indices into `items`.
///
/// The result is filled from the tail: on each pass the last remaining
/// item that no remaining item depends on is placed in the last free
/// slot. Scanning back to front keeps declaration order stable. The
/// worst case is O(n²).
///
/// # Errors
///
/// Returns [`CycleError`] if some items depend on each other in a cycle.
///
/// # Example
///
/// ```
/// use cmdwrap::core::graph::topological_order;
///
/// // (name, depends on)
/// let items = [("scan", Some("session")), ("session", None), ("file", Some("scan"))];
/// let order = topological_order(&items, |i| i.0, |i| i.1).unwrap();
/// let names: Vec<_> = order.iter().map(|&i| items[i].0).collect();
/// assert_eq!(names, vec!["session", "scan", "file"]);
/// ```
pub fn topological_order<'a, T, K, F, G>(
    items: &'a [T],
    key_of: F,
    target_of: G,
) -> Result<Vec<usize>, CycleError>
where
    K: Eq + Hash + ToString,
    F: Fn(&'a T) -> K,
    G: Fn(&'a T) -> Option<K>,
{
    // First declaration wins if keys repeat; the validator reports duplicates.
    let mut index_of: HashMap<K, usize> = HashMap::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        index_of.entry(key_of(item)).or_insert(i);
    }

    // Edge i -> target index, only for targets inside `items`.
    let targets: Vec<Option<usize>> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            target_of(item)
                .and_then(|target| index_of.get(&target).copied())
                .filter(|&t| t != i)
        })
        .collect();

    let mut dependents = vec![0usize; items.len()];
    for target in targets.iter().flatten() {
        dependents[*target] += 1;
    }

    let mut remaining: Vec<usize> = (0..items.len()).collect();
    let mut ordered = vec![0usize; items.len()];
    let mut tail = items.len();

    while tail > 0 {
        let pos = remaining
            .iter()
            .rposition(|&i| dependents[i] == 0)
            .ok_or_else(|| CycleError {
                members: remaining
                    .iter()
                    .map(|&i| key_of(&items[i]).to_string())
                    .collect(),
            })?;
        let placed = remaining.remove(pos);
        tail -= 1;
        ordered[tail] = placed;
        if let Some(target) = targets[placed] {
            dependents[target] -= 1;
        }
    }

    Ok(ordered)
}

/// Order derived inputs so each follows the input it is derived from.
pub fn order_derived_inputs(inputs: &[DerivedInput]) -> Result<Vec<&DerivedInput>, CycleError> {
    let order = topological_order(
        inputs,
        |d| d.name(),
        |d| Some(d.derived_from_wrapper_input.as_str()),
    )?;
    debug!(count = order.len(), "ordered derived inputs");
    Ok(order.into_iter().map(|i| &inputs[i]).collect())
}

/// Order output handlers so each follows the handler it is attached to.
pub fn order_output_handlers(
    handlers: &[OutputHandler],
) -> Result<Vec<&OutputHandler>, CycleError> {
    let order = topological_order(
        handlers,
        |h| h.name.as_str(),
        |h| Some(h.as_a_child_of.as_str()),
    )?;
    debug!(count = order.len(), "ordered output handlers");
    Ok(order.into_iter().map(|i| &handlers[i]).collect())
}
