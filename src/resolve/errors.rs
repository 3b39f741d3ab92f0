//! resolve::errors
//!
//! Errors raised while resolving a single launch.

use thiserror::Error;

use crate::secrets::SecretError;

/// A launch attempt could not be resolved.
///
/// None of these are retried here; the caller decides.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Required inputs ended up with no value.
    #[error("Missing values for required inputs: {}.", .names.join(", "))]
    MissingRequiredInputs { names: Vec<String> },

    /// A `multiple` derived input's resolved children have the wrong shape.
    #[error("input \"{input}\" could not be flattened: {reason}")]
    InputShape { input: String, reason: String },

    /// A raw runtime value contains a disallowed substring.
    ///
    /// The value itself is never included, it may be sensitive.
    #[error("value of input \"{input}\" contains illegal string \"{fragment}\"")]
    IllegalInput { input: String, fragment: String },

    #[error("setup command \"{reference}\" not found")]
    UnknownSetupCommand { reference: String },

    #[error("wrapup command \"{reference}\" not found")]
    UnknownWrapupCommand { reference: String },

    /// Failure reported by the resolution engine.
    #[error("resolution engine error: {0}")]
    Engine(String),

    #[error(transparent)]
    Secret(#[from] SecretError),
}

impl ResolutionError {
    /// Whether this error is the illegal-input security boundary rather
    /// than a data problem.
    pub fn is_illegal_input(&self) -> bool {
        matches!(self, ResolutionError::IllegalInput { .. })
    }

    /// Name of the input the error is about, if it concerns a single input.
    pub fn input_name(&self) -> Option<&str> {
        match self {
            ResolutionError::InputShape { input, .. }
            | ResolutionError::IllegalInput { input, .. } => Some(input),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_message() {
        let err = ResolutionError::MissingRequiredInputs {
            names: vec!["REQUIRED_NO_FLAG".into(), "REQUIRED_WITH_FLAG".into()],
        };
        assert_eq!(
            err.to_string(),
            "Missing values for required inputs: REQUIRED_NO_FLAG, REQUIRED_WITH_FLAG."
        );
    }

    #[test]
    fn illegal_input_is_distinct() {
        let err = ResolutionError::IllegalInput {
            input: "label".into(),
            fragment: ";".into(),
        };
        assert!(err.is_illegal_input());
        assert_eq!(err.input_name(), Some("label"));
        assert!(!ResolutionError::Engine("boom".into()).is_illegal_input());
    }

    #[test]
    fn secret_errors_convert() {
        let err: ResolutionError = SecretError::NotFound("TOKEN".into()).into();
        assert!(matches!(err, ResolutionError::Secret(_)));
        assert_eq!(err.to_string(), "secret not found: TOKEN");
    }
}
