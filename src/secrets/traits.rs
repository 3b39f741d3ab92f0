//! secrets::traits
//!
//! Secret resolution trait definition.
//!
//! # Design
//!
//! A command declares [`Secret`]s: a source (where the value lives) and a
//! destination (how the container receives it). A `SecretResolver` turns
//! each declaration into a [`ResolvedSecret`] carrying the actual value.
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include secret values in error messages
//! - Be thread-safe (Send + Sync)

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::command::{Secret, SecretDestination};

/// Errors from secret resolution.
///
/// Note: Error messages intentionally do not include secret values.
#[derive(Debug, Error)]
pub enum SecretError {
    /// No value exists for the source identifier.
    #[error("secret not found: {0}")]
    NotFound(String),

    /// The resolver cannot read this kind of source.
    #[error("unsupported secret source type: {0}")]
    UnsupportedSource(String),

    /// The source exists but could not be read.
    #[error("failed to read secret: {0}")]
    ReadError(String),
}

/// A secret with its value, ready to hand to the container backend.
///
/// `Debug` redacts the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedSecret {
    pub destination: SecretDestination,
    pub value: String,
}

impl fmt::Debug for ResolvedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSecret")
            .field("destination", &self.destination)
            .field("value", &"<redacted>")
            .finish()
    }
}

/// Trait for secret resolution providers.
///
/// Implementations must be thread-safe (Send + Sync) and must never
/// log, print, or include secret values in error messages.
pub trait SecretResolver: Send + Sync {
    /// Resolve a single secret declaration.
    ///
    /// # Security
    ///
    /// The returned value is the raw secret. Do not log or print it.
    fn resolve_one(&self, secret: &Secret) -> Result<ResolvedSecret, SecretError>;

    /// Resolve every declaration, failing on the first that cannot be read.
    ///
    /// Default implementation calls `resolve_one()` in order.
    fn resolve(&self, secrets: &[Secret]) -> Result<Vec<ResolvedSecret>, SecretError> {
        secrets.iter().map(|s| self.resolve_one(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::SecretSource;

    struct Fixed;

    impl SecretResolver for Fixed {
        fn resolve_one(&self, secret: &Secret) -> Result<ResolvedSecret, SecretError> {
            if secret.source.identifier == "missing" {
                return Err(SecretError::NotFound(secret.source.identifier.clone()));
            }
            Ok(ResolvedSecret {
                destination: secret.destination.clone(),
                value: "hunter2".into(),
            })
        }
    }

    fn secret(identifier: &str) -> Secret {
        Secret {
            source: SecretSource {
                source_type: "fixed".into(),
                identifier: identifier.into(),
            },
            destination: SecretDestination {
                destination_type: "environment-variable".into(),
                identifier: "TOKEN".into(),
            },
        }
    }

    #[test]
    fn debug_redacts_value() {
        let resolved = Fixed.resolve_one(&secret("a")).unwrap();
        let debug = format!("{resolved:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn resolve_all_stops_at_first_error() {
        assert_eq!(Fixed.resolve(&[secret("a"), secret("b")]).unwrap().len(), 2);
        assert!(matches!(
            Fixed.resolve(&[secret("a"), secret("missing")]),
            Err(SecretError::NotFound(id)) if id == "missing"
        ));
    }

    #[test]
    fn error_display_formatting() {
        let err = SecretError::NotFound("API_TOKEN".into());
        assert!(err.to_string().contains("API_TOKEN"));
        assert!(err.to_string().contains("not found"));

        let err = SecretError::UnsupportedSource("vault".into());
        assert!(err.to_string().contains("vault"));

        let err = SecretError::ReadError("not unicode".into());
        assert!(err.to_string().contains("read"));
    }
}
