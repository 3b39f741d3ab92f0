//! core::types
//!
//! Strong types for validated strings in command definitions.
//!
//! # Types
//!
//! - [`InputName`] - Name of a command input or wrapper input
//! - [`ImageRef`] - Container image reference with a mandatory tag
//! - [`SetupCommandRef`] - `image:tag:name` reference to a setup or wrapup command
//!
//! # Validation
//!
//! Definition documents keep plain strings so that a single invalid name
//! does not prevent the rest of a document from being inspected. The
//! validator uses these types to decide whether a string is acceptable.
//!
//! # Examples
//!
//! ```
//! use cmdwrap::core::types::{ImageRef, InputName};
//!
//! assert!(InputName::new("session-id").is_ok());
//! assert!(InputName::new("has space").is_err());
//!
//! let image = ImageRef::parse_with_default("foo/bar", "latest").unwrap();
//! assert_eq!(image.to_string(), "foo/bar:latest");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tag applied to images that carry none.
pub const DEFAULT_IMAGE_TAG: &str = "latest";

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid input name: {0}")]
    InvalidInputName(String),

    #[error("invalid image reference: {0}")]
    InvalidImage(String),

    #[error("invalid command reference: {0}")]
    InvalidCommandRef(String),
}

/// A validated input name.
///
/// Names may only contain ASCII letters, digits, `_` and `-`, and
/// cannot be empty.
///
/// # Example
///
/// ```
/// use cmdwrap::core::types::InputName;
///
/// let name = InputName::new("T1_scan").unwrap();
/// assert_eq!(name.as_str(), "T1_scan");
///
/// assert!(InputName::new("").is_err());
/// assert!(InputName::new("bad.name").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InputName(String);

impl InputName {
    /// Create a new validated input name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidInputName` if the name is empty or contains
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidInputName(
                "input name cannot be empty".into(),
            ));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(TypeError::InvalidInputName(format!(
                "input name '{name}' cannot contain '{c}'"
            )));
        }
        Ok(())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for InputName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<InputName> for String {
    fn from(name: InputName) -> Self {
        name.0
    }
}

impl AsRef<str> for InputName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InputName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A container image reference split into repository and tag.
///
/// The tag is whatever follows the last `:` of the final path component,
/// so registry ports (`host:5000/img`) are not mistaken for tags. Digest
/// references (`img@sha256:...`) count as tagged.
///
/// # Example
///
/// ```
/// use cmdwrap::core::types::ImageRef;
///
/// let image = ImageRef::parse("registry:5000/team/tool:1.2").unwrap();
/// assert_eq!(image.repository(), "registry:5000/team/tool");
/// assert_eq!(image.tag(), "1.2");
///
/// assert!(ImageRef::parse("registry:5000/team/tool").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    repository: String,
    tag: String,
}

impl ImageRef {
    /// Parse an image reference that must already carry a tag.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidImage` if the reference is blank or untagged.
    pub fn parse(image: &str) -> Result<Self, TypeError> {
        let image = image.trim();
        if image.is_empty() {
            return Err(TypeError::InvalidImage("image cannot be blank".into()));
        }
        match Self::split_tag(image) {
            Some((repository, tag)) if !repository.is_empty() && !tag.is_empty() => Ok(Self {
                repository: repository.to_string(),
                tag: tag.to_string(),
            }),
            _ => Err(TypeError::InvalidImage(format!(
                "image '{image}' must include a ':tag' suffix"
            ))),
        }
    }

    /// Parse an image reference, applying `default_tag` when no tag is present.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidImage` if the reference is blank.
    pub fn parse_with_default(image: &str, default_tag: &str) -> Result<Self, TypeError> {
        let trimmed = image.trim();
        if trimmed.is_empty() {
            return Err(TypeError::InvalidImage("image cannot be blank".into()));
        }
        if Self::has_tag(trimmed) {
            Self::parse(trimmed)
        } else {
            Ok(Self {
                repository: trimmed.to_string(),
                tag: default_tag.to_string(),
            })
        }
    }

    /// Return `image` with `default_tag` appended when it carries no tag.
    ///
    /// Blank images are returned unchanged so the validator can report them.
    pub fn with_default_tag(image: &str, default_tag: &str) -> String {
        match Self::parse_with_default(image, default_tag) {
            Ok(parsed) => parsed.to_string(),
            Err(_) => image.to_string(),
        }
    }

    /// Check whether the final path component of `image` carries a tag.
    pub fn has_tag(image: &str) -> bool {
        Self::split_tag(image).is_some()
    }

    fn split_tag(image: &str) -> Option<(&str, &str)> {
        let last_component_start = image.rfind('/').map_or(0, |i| i + 1);
        if let Some(at) = image[last_component_start..].find('@') {
            let split = last_component_start + at;
            return Some((&image[..split], &image[split + 1..]));
        }
        let colon = image[last_component_start..].rfind(':')?;
        let split = last_component_start + colon;
        Some((&image[..split], &image[split + 1..]))
    }

    /// The repository part, without tag.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// The tag (or digest).
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.tag.contains(':') {
            write!(f, "{}@{}", self.repository, self.tag)
        } else {
            write!(f, "{}:{}", self.repository, self.tag)
        }
    }
}

/// Reference to a setup or wrapup command: `image:tag:command-name`.
///
/// The tag may be omitted (`image:command-name`), in which case
/// [`DEFAULT_IMAGE_TAG`] is used.
///
/// # Example
///
/// ```
/// use cmdwrap::core::types::SetupCommandRef;
///
/// let r = SetupCommandRef::parse("xnat/dcm2niix-setup:1.0:unzip").unwrap();
/// assert_eq!(r.image().to_string(), "xnat/dcm2niix-setup:1.0");
/// assert_eq!(r.command_name(), "unzip");
///
/// let r = SetupCommandRef::parse("xnat/unzip:unzip").unwrap();
/// assert_eq!(r.image().to_string(), "xnat/unzip:latest");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SetupCommandRef {
    image: ImageRef,
    command_name: String,
}

impl SetupCommandRef {
    /// Parse a setup/wrapup command reference, defaulting an absent tag to
    /// `latest`.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidCommandRef` if the reference does not have
    /// an image part and a non-empty command name.
    pub fn parse(reference: &str) -> Result<Self, TypeError> {
        Self::parse_with_default(reference, DEFAULT_IMAGE_TAG)
    }

    /// Parse a setup/wrapup command reference, applying `default_tag` when
    /// the image part carries no tag.
    ///
    /// # Errors
    ///
    /// Same as [`SetupCommandRef::parse`].
    pub fn parse_with_default(reference: &str, default_tag: &str) -> Result<Self, TypeError> {
        let reference = reference.trim();
        let (image_part, command_name) = reference.rsplit_once(':').ok_or_else(|| {
            TypeError::InvalidCommandRef(format!(
                "'{reference}' must have the form image:tag:command-name"
            ))
        })?;
        if command_name.is_empty() || command_name.contains('/') {
            return Err(TypeError::InvalidCommandRef(format!(
                "'{reference}' does not name a command"
            )));
        }
        let image = ImageRef::parse_with_default(image_part, default_tag)
            .map_err(|e| TypeError::InvalidCommandRef(format!("'{reference}': {e}")))?;
        Ok(Self {
            image,
            command_name: command_name.to_string(),
        })
    }

    /// The image the referenced command lives in.
    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    /// The referenced command's name.
    pub fn command_name(&self) -> &str {
        &self.command_name
    }
}

impl std::fmt::Display for SetupCommandRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.image, self.command_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod input_name {
        use super::*;

        #[test]
        fn valid_names() {
            assert!(InputName::new("session").is_ok());
            assert!(InputName::new("T1-scan_2").is_ok());
            assert!(InputName::new("X").is_ok());
        }

        #[test]
        fn empty_rejected() {
            assert!(InputName::new("").is_err());
        }

        #[test]
        fn special_chars_rejected() {
            assert!(InputName::new("has space").is_err());
            assert!(InputName::new("dot.ted").is_err());
            assert!(InputName::new("slash/ed").is_err());
            assert!(InputName::new("dollar$").is_err());
        }

        #[test]
        fn serde_roundtrip() {
            let name = InputName::new("scan-id").unwrap();
            let json = serde_json::to_string(&name).unwrap();
            let parsed: InputName = serde_json::from_str(&json).unwrap();
            assert_eq!(name, parsed);
        }

        #[test]
        fn serde_rejects_invalid() {
            let parsed: Result<InputName, _> = serde_json::from_str("\"no spaces\"");
            assert!(parsed.is_err());
        }
    }

    mod image_ref {
        use super::*;

        #[test]
        fn tag_defaulted() {
            assert_eq!(ImageRef::with_default_tag("foo/bar", "latest"), "foo/bar:latest");
        }

        #[test]
        fn existing_tag_kept() {
            assert_eq!(ImageRef::with_default_tag("foo/bar:1.0", "latest"), "foo/bar:1.0");
        }

        #[test]
        fn registry_port_is_not_a_tag() {
            assert!(!ImageRef::has_tag("localhost:5000/foo"));
            assert_eq!(
                ImageRef::with_default_tag("localhost:5000/foo", "latest"),
                "localhost:5000/foo:latest"
            );
        }

        #[test]
        fn digest_counts_as_tag() {
            let image = ImageRef::parse("foo/bar@sha256:abcdef").unwrap();
            assert_eq!(image.repository(), "foo/bar");
            assert_eq!(image.tag(), "sha256:abcdef");
            assert_eq!(image.to_string(), "foo/bar@sha256:abcdef");
        }

        #[test]
        fn blank_rejected() {
            assert!(ImageRef::parse("").is_err());
            assert!(ImageRef::parse_with_default("  ", "latest").is_err());
            assert_eq!(ImageRef::with_default_tag("", "latest"), "");
        }

        #[test]
        fn untagged_rejected_by_strict_parse() {
            assert!(ImageRef::parse("foo/bar").is_err());
            assert!(ImageRef::parse("foo/bar:").is_err());
        }

        #[test]
        fn defaulting_is_idempotent() {
            let once = ImageRef::with_default_tag("foo", "latest");
            let twice = ImageRef::with_default_tag(&once, "latest");
            assert_eq!(once, twice);
        }
    }

    mod setup_command_ref {
        use super::*;

        #[test]
        fn full_form() {
            let r = SetupCommandRef::parse("org/setup:2.1:prepare").unwrap();
            assert_eq!(r.image().repository(), "org/setup");
            assert_eq!(r.image().tag(), "2.1");
            assert_eq!(r.command_name(), "prepare");
            assert_eq!(r.to_string(), "org/setup:2.1:prepare");
        }

        #[test]
        fn tag_defaulted() {
            let r = SetupCommandRef::parse("org/setup:prepare").unwrap();
            assert_eq!(r.image().tag(), DEFAULT_IMAGE_TAG);
        }

        #[test]
        fn configured_tag_defaulted() {
            let r = SetupCommandRef::parse_with_default("org/setup:prepare", "stable").unwrap();
            assert_eq!(r.image().to_string(), "org/setup:stable");

            let explicit = SetupCommandRef::parse_with_default("org/setup:2.1:prepare", "stable");
            assert_eq!(explicit.unwrap().image().tag(), "2.1");
        }

        #[test]
        fn missing_name_rejected() {
            assert!(SetupCommandRef::parse("org/setup").is_err());
            assert!(SetupCommandRef::parse("org/setup:1.0:").is_err());
            assert!(SetupCommandRef::parse(":name").is_err());
        }
    }
}
