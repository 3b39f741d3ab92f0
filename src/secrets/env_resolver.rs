//! secrets::env_resolver
//!
//! Secrets read from environment variables.

use std::collections::HashMap;
use std::env::VarError;

use tracing::debug;

use super::traits::{ResolvedSecret, SecretError, SecretResolver};
use crate::core::command::Secret;

/// Source type handled by [`EnvSecretResolver`].
pub const ENV_SOURCE_TYPE: &str = "environment-variable";

/// Resolves `environment-variable` sources from the process environment.
///
/// Tests can inject a fixed map with [`EnvSecretResolver::with_values`]
/// instead of touching the real environment.
#[derive(Debug, Default)]
pub struct EnvSecretResolver {
    values: Option<HashMap<String, String>>,
}

impl EnvSecretResolver {
    /// Read from the process environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from `values` instead of the process environment.
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self {
            values: Some(values),
        }
    }

    fn lookup(&self, name: &str) -> Result<String, SecretError> {
        match &self.values {
            Some(values) => values
                .get(name)
                .cloned()
                .ok_or_else(|| SecretError::NotFound(name.to_string())),
            None => std::env::var(name).map_err(|e| match e {
                VarError::NotPresent => SecretError::NotFound(name.to_string()),
                VarError::NotUnicode(_) => {
                    SecretError::ReadError(format!("{name} is not valid unicode"))
                }
            }),
        }
    }
}

impl SecretResolver for EnvSecretResolver {
    fn resolve_one(&self, secret: &Secret) -> Result<ResolvedSecret, SecretError> {
        if secret.source.source_type != ENV_SOURCE_TYPE {
            return Err(SecretError::UnsupportedSource(
                secret.source.source_type.clone(),
            ));
        }
        let value = self.lookup(&secret.source.identifier)?;
        debug!(
            source = %secret.source.identifier,
            destination = %secret.destination.identifier,
            "resolved secret"
        );
        Ok(ResolvedSecret {
            destination: secret.destination.clone(),
            value,
        })
    }
}
