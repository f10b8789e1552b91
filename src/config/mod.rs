//! Verification configuration (rc-verify.toml)
//!
//! Every external tool invocation and every success marker is
//! configurable, with built-in defaults matching a Maven project
//! published to an Apache-style dist tree and verified on a Debian-style
//! host. Layering is defaults → optional TOML file → CLI flags.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::fetch::DEFAULT_EXCLUDES;
use crate::tool::ToolCommand;

/// Default config file consulted when no --config flag is given
pub const DEFAULT_CONFIG_FILE: &str = "rc-verify.toml";

/// Error types for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Success markers scanned for in tool output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Marker the validator emits on a clean pass
    pub validation: String,

    /// Marker the build tool emits on a successful build
    pub build: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            validation: "SUCCESSFUL VALIDATION".to_string(),
            build: "BUILD SUCCESS".to_string(),
        }
    }
}

/// External tool invocations, overridable per concern
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Commands {
    /// Recursive mirroring client; cut-dirs, reject pattern, target
    /// directory, and URL are appended per run
    pub fetch: ToolCommand,

    /// Validator, run in the staging directory
    pub validate: ToolCommand,

    /// Lists registered toolchain alternatives, one path per line
    pub list_alternatives: ToolCommand,

    /// Reports the currently selected alternative (`Value: <path>`)
    pub query_alternatives: ToolCommand,

    /// Switches the active alternative; the compiler path is appended
    pub set_alternative: ToolCommand,

    /// Reports the toolchain version for the version log
    pub toolchain_version: ToolCommand,

    /// Reports the build tool version for the version log
    pub build_version: ToolCommand,

    /// The project build, run from the extracted project root
    pub build: ToolCommand,
}

impl Default for Commands {
    fn default() -> Self {
        Self {
            fetch: ToolCommand::new(
                "wget",
                &[
                    "--recursive",
                    "--no-parent",
                    "--no-host-directories",
                    "--execute",
                    "robots=off",
                    "--quiet",
                ],
            ),
            validate: ToolCommand::new("sh", &["verify-release.sh"]),
            list_alternatives: ToolCommand::new("update-alternatives", &["--list", "javac"]),
            query_alternatives: ToolCommand::new("update-alternatives", &["--query", "javac"]),
            set_alternative: ToolCommand::new("sudo", &["update-alternatives", "--set", "javac"]),
            toolchain_version: ToolCommand::new("java", &["-version"]),
            build_version: ToolCommand::new("mvn", &["-version"]),
            build: ToolCommand::new("mvn", &["clean", "install", "site"]),
        }
    }
}

/// Full verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Staging directory, wiped at the start of every run
    pub staging_dir: PathBuf,

    /// Subdirectory of the mirror holding the source distribution
    pub source_subdir: String,

    /// Validator script that must exist in the mirror after fetching
    pub validator_script: String,

    /// Glob selecting the source tarball inside the source subdirectory
    pub archive_glob: String,

    /// Reject pattern handed to the mirroring client
    pub fetch_reject_pattern: String,

    /// Glob patterns pruned from the staged tree after fetching
    pub exclude_globs: Vec<String>,

    /// Lines of a failed build log echoed for diagnosis
    pub tail_lines: usize,

    pub markers: Markers,

    pub commands: Commands,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("rc-staging"),
            source_subdir: "source".to_string(),
            validator_script: "verify-release.sh".to_string(),
            archive_glob: "*.tar.gz".to_string(),
            fetch_reject_pattern: "/site/".to_string(),
            exclude_globs: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            tail_lines: 50,
            markers: Markers::default(),
            commands: Commands::default(),
        }
    }
}

impl VerifyConfig {
    /// Load and parse config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse config from a TOML string
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: VerifyConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, overlaid with an explicit config file or, absent that,
    /// the default file when it exists
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.markers.validation.is_empty() {
            return Err(ConfigError::Validation(
                "markers.validation must not be empty".to_string(),
            ));
        }
        if self.markers.build.is_empty() {
            return Err(ConfigError::Validation(
                "markers.build must not be empty".to_string(),
            ));
        }
        if self.archive_glob.is_empty() {
            return Err(ConfigError::Validation(
                "archive_glob must not be empty".to_string(),
            ));
        }
        if self.validator_script.is_empty() {
            return Err(ConfigError::Validation(
                "validator_script must not be empty".to_string(),
            ));
        }
        if self.tail_lines == 0 {
            return Err(ConfigError::Validation(
                "tail_lines must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
