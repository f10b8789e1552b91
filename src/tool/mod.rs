//! External tool invocation
//!
//! Every long-running collaborator (fetcher, validator, alternatives
//! commands, build tool) is an opaque external process. `ToolCommand` is
//! the configurable seam: a program plus fixed arguments, with per-call
//! extra arguments, working directory, and environment overrides. Output
//! is captured as combined stdout+stderr text so callers can scan it for
//! success markers and persist it as a log.

use std::io;
use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

/// Errors from launching an external tool
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// A configurable external command: program plus fixed arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    /// Program name or path
    pub program: String,

    /// Fixed arguments always passed before any per-call arguments
    #[serde(default)]
    pub args: Vec<String>,
}

/// Captured result of one tool invocation
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Whether the process exited with status zero
    pub success: bool,

    /// Raw exit code, if the process exited normally
    pub code: Option<i32>,

    /// Combined stdout and stderr, lossily decoded
    pub text: String,
}

impl ToolCommand {
    /// Create a command from a program and fixed arguments
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Run the command to completion, capturing combined output.
    ///
    /// `extra_args` are appended after the fixed arguments. `cwd` sets the
    /// working directory. `envs` are added to the inherited environment.
    pub fn run(
        &self,
        extra_args: &[String],
        cwd: Option<&Path>,
        envs: &[(&str, String)],
    ) -> Result<ToolOutput, ToolError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).args(extra_args);

        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in envs {
            cmd.env(key, value);
        }

        let output = cmd.output().map_err(|source| ToolError::Launch {
            program: self.program.clone(),
            source,
        })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&stderr);
        }

        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            text,
        })
    }

    /// Render the command line for diagnostics
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}
