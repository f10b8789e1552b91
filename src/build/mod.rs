//! Multi-environment build execution
//!
//! Runs the project build once per enumerated environment. Each
//! iteration walks a fixed sequence: select the toolchain alternative
//! (skipped for the default environment), capture version metadata into
//! the version log, run the build with the environment's home directory
//! exported, and classify the captured output.
//!
//! Failure isolation is the central property here: any fault in any step
//! of one iteration is converted into a failed outcome for that
//! environment alone, and the loop moves on to the next one. Nothing an
//! individual environment does can abort the run.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::classifier::{tail, MarkerClassifier, Outcome};
use crate::signal::SignalState;
use crate::staging::StagingArea;
use crate::summary::EnvOutcome;
use crate::tool::{ToolCommand, ToolError};
use crate::toolchain::{
    extract_version_label, BuildEnvironment, ToolchainError, ToolchainSwitcher,
};

/// Faults inside one environment iteration; converted into a failed
/// outcome, never propagated out of the loop
#[derive(Debug, thiserror::Error)]
enum EnvFault {
    #[error("toolchain selection failed: {0}")]
    Toolchain(#[from] ToolchainError),

    #[error("tool invocation failed: {0}")]
    Tool(#[from] ToolError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Runs the build across every enumerated environment
pub struct BuildRunner<'a> {
    staging: &'a StagingArea,
    switcher: ToolchainSwitcher,
    toolchain_version: ToolCommand,
    build_version: ToolCommand,
    build: ToolCommand,
    classifier: MarkerClassifier,
    tail_lines: usize,
    signal: Arc<SignalState>,
    verbose: bool,
}

impl<'a> BuildRunner<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        staging: &'a StagingArea,
        switcher: ToolchainSwitcher,
        toolchain_version: ToolCommand,
        build_version: ToolCommand,
        build: ToolCommand,
        classifier: MarkerClassifier,
        tail_lines: usize,
        signal: Arc<SignalState>,
        verbose: bool,
    ) -> Self {
        Self {
            staging,
            switcher,
            toolchain_version,
            build_version,
            build,
            classifier,
            tail_lines,
            signal,
            verbose,
        }
    }

    /// Build the project once per environment, collecting one outcome
    /// each. An interrupt stops the loop between iterations.
    pub fn run_all(
        &mut self,
        environments: &[BuildEnvironment],
        project_dir: &Path,
    ) -> Vec<EnvOutcome> {
        let mut outcomes = Vec::with_capacity(environments.len());

        for environment in environments {
            if self.signal.is_stop_requested() {
                eprintln!("Stopping: interrupt received before {}", environment.name());
                break;
            }

            let name = environment.name();
            if self.verbose {
                eprintln!("Building with environment {}...", name);
            }

            let started = Instant::now();
            let outcome = match self.run_environment(environment, &name, project_dir) {
                Ok(outcome) => outcome,
                Err(fault) => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    eprintln!("Environment {} failed: {}", name, fault);
                    EnvOutcome::failed(name.as_str(), fault.to_string(), None, duration_ms)
                }
            };

            outcomes.push(outcome);
        }

        outcomes
    }

    /// One full iteration: SELECT_ENV, CAPTURE_VERSION, BUILD, CLASSIFY
    fn run_environment(
        &mut self,
        environment: &BuildEnvironment,
        name: &str,
        project_dir: &Path,
    ) -> Result<EnvOutcome, EnvFault> {
        let started = Instant::now();

        // SELECT_ENV
        if let BuildEnvironment::Alternative { compiler } = environment {
            self.switcher.select(compiler)?;
        }
        let envs: Vec<(&str, String)> = match environment.home_dir() {
            Some(home) => vec![("JAVA_HOME", home.to_string_lossy().into_owned())],
            None => Vec::new(),
        };

        // CAPTURE_VERSION
        self.capture_versions(name, &envs)?;

        // BUILD
        let output = self.build.run(&[], Some(project_dir), &envs)?;
        let log_path = self.staging.build_log(name);
        fs::write(&log_path, &output.text)?;

        // CLASSIFY
        let duration_ms = started.elapsed().as_millis() as u64;
        match self.classifier.classify(&output.text, output.success) {
            Outcome::Success => Ok(EnvOutcome::success(name, log_path, duration_ms)),
            outcome => {
                let detail = match outcome {
                    Outcome::Indeterminate => {
                        "build exited cleanly but the success marker was not found".to_string()
                    }
                    _ => format!(
                        "success marker {:?} not found in build output",
                        self.classifier.marker()
                    ),
                };
                eprintln!(
                    "Build failed for {}; last {} line(s) of {}:",
                    name,
                    self.tail_lines,
                    log_path.display()
                );
                eprintln!("{}", tail(&output.text, self.tail_lines));
                Ok(EnvOutcome::failed(name, detail, Some(log_path), duration_ms))
            }
        }
    }

    /// Append toolchain and build tool versions to the version log
    fn capture_versions(&self, name: &str, envs: &[(&str, String)]) -> Result<(), EnvFault> {
        let toolchain = self.toolchain_version.run(&[], None, envs)?;
        let build_tool = self.build_version.run(&[], None, envs)?;

        let header = match extract_version_label(&toolchain.text) {
            Some(label) => format!("=== {} ({}) ===", name, label),
            None => format!("=== {} ===", name),
        };

        let block = format!(
            "{}\n{}\n{}",
            header,
            toolchain.text.trim_end(),
            build_tool.text.trim_end()
        );
        self.staging.append_versions(&block)?;

        Ok(())
    }
}
