//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. The explicit path passed to [`Config::load`], if any
//! 2. `$CMDWRAP_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/cmdwrap/config.toml`
//! 4. `~/.cmdwrap/config.toml`
//! 5. `~/.cmdwrap.toml` (compatibility, warns)
//!
//! A missing file is not an error: every setting has a default, and
//! `Config::default()` behaves exactly like an empty file.
//!
//! # Example
//!
//! ```no_run
//! use cmdwrap::core::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! let config = result.config;
//!
//! println!("Default tag: {}", config.default_image_tag());
//! println!("Setup input path: {}", config.setup_input_path());
//! ```

pub mod schema;

pub use schema::{ConfigFile, ResolutionConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::types::DEFAULT_IMAGE_TAG;

/// Substrings rejected in runtime values unless configured otherwise.
pub const DEFAULT_ILLEGAL_STRINGS: &[&str] = &["`", "$(", "&&", "||", ";"];

/// Container path of a setup command's input mount unless configured otherwise.
pub const DEFAULT_SETUP_INPUT_PATH: &str = "/input";

/// Container path of a setup or wrapup command's output mount unless
/// configured otherwise.
pub const DEFAULT_SETUP_OUTPUT_PATH: &str = "/output";

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "CMDWRAP_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Loaded configuration.
///
/// Accessor methods apply defaults for unset values.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub file: ConfigFile,
    /// Path the file was loaded from, if any
    path: Option<PathBuf>,
}

struct Candidate {
    path: PathBuf,
    compat: bool,
}

impl Config {
    /// Build a configuration from already-parsed contents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn new(file: ConfigFile) -> Result<Self, ConfigError> {
        file.validate()?;
        Ok(Self { file, path: None })
    }

    /// Load configuration from `explicit` or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file cannot be read, or if the file
    /// found cannot be parsed or holds invalid values. Missing files in the
    /// default locations are not an error.
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_with(explicit, |key| std::env::var(key).ok(), dirs::home_dir())
    }

    fn load_with(
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
        home: Option<PathBuf>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        if let Some(path) = explicit {
            let config = Self::read_config(path)?;
            return Ok(ConfigLoadResult { config, warnings });
        }

        for candidate in Self::candidates(&env, home.as_deref()) {
            if !candidate.path.exists() {
                continue;
            }
            if candidate.compat {
                warn!(path = %candidate.path.display(), "loading config from compatibility location");
                warnings.push(ConfigWarning {
                    message: "Using deprecated config location. Please move to '~/.cmdwrap/config.toml'"
                        .to_string(),
                    path: candidate.path.clone(),
                });
            }
            let config = Self::read_config(&candidate.path)?;
            return Ok(ConfigLoadResult { config, warnings });
        }

        debug!("no config file found, using defaults");
        Ok(ConfigLoadResult {
            config: Config::default(),
            warnings,
        })
    }

    fn candidates(env: &impl Fn(&str) -> Option<String>, home: Option<&Path>) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        if let Some(path) = env(CONFIG_ENV_VAR) {
            candidates.push(Candidate {
                path: PathBuf::from(path),
                compat: false,
            });
        }
        if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
            candidates.push(Candidate {
                path: PathBuf::from(xdg_home).join("cmdwrap/config.toml"),
                compat: false,
            });
        }
        if let Some(home) = home {
            candidates.push(Candidate {
                path: home.join(".cmdwrap/config.toml"),
                compat: false,
            });
            candidates.push(Candidate {
                path: home.join(".cmdwrap.toml"),
                compat: true,
            });
        }
        candidates
    }

    /// Read, parse and validate a config file.
    fn read_config(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        debug!(path = %path.display(), "loaded config");
        Ok(Config {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Tag applied to untagged images.
    ///
    /// Defaults to `latest`.
    pub fn default_image_tag(&self) -> &str {
        self.file
            .default_image_tag
            .as_deref()
            .unwrap_or(DEFAULT_IMAGE_TAG)
    }

    /// Substrings rejected in raw runtime values.
    ///
    /// Defaults to [`DEFAULT_ILLEGAL_STRINGS`].
    pub fn illegal_strings(&self) -> Vec<&str> {
        match self.resolution().and_then(|r| r.illegal_strings.as_ref()) {
            Some(strings) => strings.iter().map(String::as_str).collect(),
            None => DEFAULT_ILLEGAL_STRINGS.to_vec(),
        }
    }

    /// Container path of a setup command's input mount.
    ///
    /// Defaults to `/input`.
    pub fn setup_input_path(&self) -> &str {
        self.resolution()
            .and_then(|r| r.setup_input_path.as_deref())
            .unwrap_or(DEFAULT_SETUP_INPUT_PATH)
    }

    /// Container path of a setup or wrapup command's output mount.
    ///
    /// Defaults to `/output`.
    pub fn setup_output_path(&self) -> &str {
        self.resolution()
            .and_then(|r| r.setup_output_path.as_deref())
            .unwrap_or(DEFAULT_SETUP_OUTPUT_PATH)
    }

    /// Get the path the config was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn resolution(&self) -> Option<&ResolutionConfig> {
        self.file.resolution.as_ref()
    }
}
