//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Values are validated after parsing: the default image tag must be a
//! bare tag, container paths must be absolute, and illegal strings must be
//! non-empty.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Top-level configuration file.
///
/// # Example
///
/// ```toml
/// default_image_tag = "latest"
///
/// [resolution]
/// illegal_strings = ["`", "$(", "&&", "||", ";"]
/// setup_input_path = "/input"
/// setup_output_path = "/output"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Tag applied to images declared without one
    pub default_image_tag: Option<String>,

    /// Runtime value resolution settings
    pub resolution: Option<ResolutionConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tag) = &self.default_image_tag {
            if tag.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "default_image_tag cannot be blank".to_string(),
                ));
            }
            if tag.contains(':') || tag.contains('/') {
                return Err(ConfigError::InvalidValue(format!(
                    "default_image_tag '{tag}' must be a bare tag"
                )));
            }
        }

        if let Some(resolution) = &self.resolution {
            resolution.validate()?;
        }

        Ok(())
    }
}

/// Settings used while resolving runtime values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolutionConfig {
    /// Substrings rejected in raw runtime values
    pub illegal_strings: Option<Vec<String>>,

    /// Container path of a setup command's input mount
    pub setup_input_path: Option<String>,

    /// Container path of a setup or wrapup command's output mount
    pub setup_output_path: Option<String>,
}

impl ResolutionConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(strings) = &self.illegal_strings {
            if strings.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "illegal_strings cannot be empty".to_string(),
                ));
            }
            if strings.iter().any(String::is_empty) {
                return Err(ConfigError::InvalidValue(
                    "illegal_strings cannot contain an empty string".to_string(),
                ));
            }
        }

        for (key, path) in [
            ("setup_input_path", &self.setup_input_path),
            ("setup_output_path", &self.setup_output_path),
        ] {
            if let Some(path) = path {
                if !path.starts_with('/') {
                    return Err(ConfigError::InvalidValue(format!(
                        "{key} '{path}' must be an absolute container path"
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(ConfigFile::default().validate().is_ok());
    }

    #[test]
    fn parse_full_file() {
        let toml = r#"
            default_image_tag = "stable"

            [resolution]
            illegal_strings = [";", "|"]
            setup_input_path = "/in"
            setup_output_path = "/out"
        "#;
        let file: ConfigFile = toml::from_str(toml).unwrap();
        assert_eq!(file.default_image_tag.as_deref(), Some("stable"));
        let resolution = file.resolution.unwrap();
        assert_eq!(
            resolution.illegal_strings,
            Some(vec![";".to_string(), "|".to_string()])
        );
        assert_eq!(resolution.setup_input_path.as_deref(), Some("/in"));
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(toml::from_str::<ConfigFile>("image_tag = \"x\"").is_err());
        assert!(toml::from_str::<ConfigFile>("[resolution]\nillegal = []").is_err());
    }

    mod image_tag {
        use super::*;

        fn with_tag(tag: &str) -> ConfigFile {
            ConfigFile {
                default_image_tag: Some(tag.to_string()),
                ..Default::default()
            }
        }

        #[test]
        fn bare_tag_accepted() {
            assert!(with_tag("1.0").validate().is_ok());
        }

        #[test]
        fn blank_rejected() {
            assert!(with_tag("  ").validate().is_err());
        }

        #[test]
        fn qualified_rejected() {
            assert!(with_tag("repo:1.0").validate().is_err());
            assert!(with_tag("a/b").validate().is_err());
        }
    }

    mod resolution {
        use super::*;

        #[test]
        fn relative_path_rejected() {
            let resolution = ResolutionConfig {
                setup_output_path: Some("output".into()),
                ..Default::default()
            };
            let err = resolution.validate().unwrap_err();
            assert!(err.to_string().contains("setup_output_path"));
        }

        #[test]
        fn empty_illegal_string_rejected() {
            let resolution = ResolutionConfig {
                illegal_strings: Some(vec![";".into(), String::new()]),
                ..Default::default()
            };
            assert!(resolution.validate().is_err());
        }

        #[test]
        fn empty_list_rejected() {
            let resolution = ResolutionConfig {
                illegal_strings: Some(vec![]),
                ..Default::default()
            };
            assert!(matches!(
                resolution.validate(),
                Err(ConfigError::InvalidValue(msg)) if msg.contains("cannot be empty")
            ));
        }
    }
}
