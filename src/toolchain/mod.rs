//! Build toolchain enumeration and selection
//!
//! The host may carry several interchangeable toolchain installations
//! registered with an alternatives mechanism. Enumeration lists them;
//! when the host has none registered (or the command is unavailable) a
//! single synthetic `Default` environment stands in for whatever is
//! currently active, so the pipeline stays usable on minimal hosts.
//!
//! Switching the active alternative mutates host-global state, so the
//! switcher captures the prior selection once, before the first switch,
//! and restores it when dropped.

use std::path::{Path, PathBuf};

use regex_lite::Regex;

use crate::tool::{ToolCommand, ToolError};

/// Errors from toolchain selection
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    #[error("failed to switch toolchain alternative to {path}: {detail}")]
    SwitchFailed { path: PathBuf, detail: String },

    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// One installed build toolchain variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEnvironment {
    /// The currently active toolchain; no switching performed
    Default,

    /// A registered alternative, identified by its compiler executable
    Alternative { compiler: PathBuf },
}

impl BuildEnvironment {
    pub fn is_default(&self) -> bool {
        matches!(self, BuildEnvironment::Default)
    }

    /// Human-readable name used for log naming.
    ///
    /// Derived from the directory two levels above the compiler binary:
    /// `/usr/lib/jvm/jdk-17/bin/javac` names the environment `jdk-17`.
    pub fn name(&self) -> String {
        match self {
            BuildEnvironment::Default => "default".to_string(),
            BuildEnvironment::Alternative { compiler } => {
                let from_home = compiler
                    .parent()
                    .and_then(Path::parent)
                    .and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned());
                let raw = from_home.unwrap_or_else(|| {
                    compiler
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "unknown".to_string())
                });
                sanitize(&raw)
            }
        }
    }

    /// Toolchain home directory, exported as JAVA_HOME for the build.
    ///
    /// Two levels up from the compiler binary; `None` for the default
    /// environment, which inherits the ambient value.
    pub fn home_dir(&self) -> Option<PathBuf> {
        match self {
            BuildEnvironment::Default => None,
            BuildEnvironment::Alternative { compiler } => {
                compiler.parent().and_then(Path::parent).map(Path::to_path_buf)
            }
        }
    }
}

/// Keep names safe for file naming
fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Enumerate registered toolchain alternatives.
///
/// Returns one `Alternative` per listed executable path, or the single
/// synthetic `Default` environment when the command is unavailable,
/// fails, or lists nothing.
pub fn enumerate(list_command: &ToolCommand) -> Vec<BuildEnvironment> {
    let environments: Vec<BuildEnvironment> = match list_command.run(&[], None, &[]) {
        Ok(output) if output.success => output
            .text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| BuildEnvironment::Alternative {
                compiler: PathBuf::from(line),
            })
            .collect(),
        _ => Vec::new(),
    };

    if environments.is_empty() {
        vec![BuildEnvironment::Default]
    } else {
        environments
    }
}

/// Pull a dotted version label out of tool version output
/// (e.g. `openjdk version "17.0.2"` yields `17.0.2`).
pub fn extract_version_label(text: &str) -> Option<String> {
    let re = Regex::new(r"(\d+(?:\.\d+)+(?:_\d+)?)").ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Switches the host-wide active toolchain alternative, restoring the
/// prior selection on drop
pub struct ToolchainSwitcher {
    set_command: ToolCommand,
    query_command: ToolCommand,
    initial: Option<PathBuf>,
    switched: bool,
}

impl ToolchainSwitcher {
    pub fn new(set_command: ToolCommand, query_command: ToolCommand) -> Self {
        Self {
            set_command,
            query_command,
            initial: None,
            switched: false,
        }
    }

    /// Make `compiler` the active alternative.
    ///
    /// The prior selection is captured before the first switch so it can
    /// be restored when the switcher drops.
    pub fn select(&mut self, compiler: &Path) -> Result<(), ToolchainError> {
        if !self.switched {
            self.initial = self.current();
            self.switched = true;
        }

        let output = self
            .set_command
            .run(&[compiler.to_string_lossy().into_owned()], None, &[])?;

        if !output.success {
            return Err(ToolchainError::SwitchFailed {
                path: compiler.to_path_buf(),
                detail: crate::classifier::tail(&output.text, 5),
            });
        }

        Ok(())
    }

    /// Currently selected alternative, from the query command's
    /// `Value: <path>` line
    fn current(&self) -> Option<PathBuf> {
        let output = self.query_command.run(&[], None, &[]).ok()?;
        if !output.success {
            return None;
        }
        output
            .text
            .lines()
            .find_map(|line| line.strip_prefix("Value:"))
            .map(|rest| PathBuf::from(rest.trim()))
    }

    /// Restore the selection captured before the first switch
    pub fn restore(&mut self) -> Result<(), ToolchainError> {
        if let Some(initial) = self.initial.take() {
            let output = self
                .set_command
                .run(&[initial.to_string_lossy().into_owned()], None, &[])?;
            if !output.success {
                return Err(ToolchainError::SwitchFailed {
                    path: initial,
                    detail: crate::classifier::tail(&output.text, 5),
                });
            }
        }
        Ok(())
    }
}

impl Drop for ToolchainSwitcher {
    fn drop(&mut self) {
        if self.initial.is_some() {
            if let Err(e) = self.restore() {
                eprintln!("warning: could not restore prior toolchain alternative: {}", e);
            }
        }
    }
}
