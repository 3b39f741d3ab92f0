//! secrets
//!
//! Secret resolution for command launches.
//!
//! # Architecture
//!
//! Secret values are read through the `SecretResolver` trait. The bundled
//! implementation is:
//!
//! - [`EnvSecretResolver`]: Reads `environment-variable` sources
//!
//! Other source kinds are provided by the host system through its own
//! `SecretResolver` implementation.
//!
//! # Security
//!
//! All resolver implementations follow these security rules:
//!
//! - Secret values are **never** logged or included in error messages
//! - `ResolvedSecret`'s `Debug` output redacts the value
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use cmdwrap::core::command::{Secret, SecretDestination, SecretSource};
//! use cmdwrap::secrets::{EnvSecretResolver, SecretResolver};
//!
//! let resolver = EnvSecretResolver::with_values(HashMap::from([
//!     ("API_TOKEN".to_string(), "value".to_string()),
//! ]));
//! let secret = Secret {
//!     source: SecretSource {
//!         source_type: "environment-variable".into(),
//!         identifier: "API_TOKEN".into(),
//!     },
//!     destination: SecretDestination {
//!         destination_type: "environment-variable".into(),
//!         identifier: "TOKEN".into(),
//!     },
//! };
//!
//! let resolved = resolver.resolve(&[secret]).unwrap();
//! assert_eq!(resolved[0].destination.identifier, "TOKEN");
//! ```

mod env_resolver;
mod traits;

pub use env_resolver::{EnvSecretResolver, ENV_SOURCE_TYPE};
pub use traits::{ResolvedSecret, SecretError, SecretResolver};
