//! Run summary aggregation (run_summary.json)
//!
//! Per-environment outcomes are recorded once, never mutated, and
//! aggregated into a single run summary with a human-readable line and
//! the pipeline's final exit code.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::Outcome;

/// Schema version for run_summary.json
pub const SUMMARY_SCHEMA_VERSION: u32 = 1;

/// Schema identifier for run_summary.json
pub const SUMMARY_SCHEMA_ID: &str = "rc-verify/run_summary@1";

/// Status of one environment's build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Failed,
}

/// Recorded result for one build environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvOutcome {
    /// Environment identifier (e.g. "jdk-17", "default")
    pub environment: String,

    /// Build status
    pub status: Status,

    /// Failure detail, when status is failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Per-environment build log, when the build ran far enough to
    /// produce one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// Wall-clock duration of this environment's iteration
    pub duration_ms: u64,
}

impl EnvOutcome {
    pub fn success(environment: impl Into<String>, log_path: PathBuf, duration_ms: u64) -> Self {
        Self {
            environment: environment.into(),
            status: Status::Success,
            detail: None,
            log_path: Some(log_path),
            duration_ms,
        }
    }

    pub fn failed(
        environment: impl Into<String>,
        detail: impl Into<String>,
        log_path: Option<PathBuf>,
        duration_ms: u64,
    ) -> Self {
        Self {
            environment: environment.into(),
            status: Status::Failed,
            detail: Some(detail.into()),
            log_path,
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Identity of the extracted source archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveInfo {
    pub file_name: String,
    pub root_dir: String,
    pub sha256: String,
}

/// Aggregate record of one verification run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// Run identifier
    pub run_id: String,

    /// When the summary was created
    pub created_at: DateTime<Utc>,

    /// Normalized base location the artifacts were fetched from
    pub base_url: String,

    /// Outcome of the integrity validation stage
    pub validation: Outcome,

    /// Extracted source archive, when the run got that far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveInfo>,

    /// Per-environment outcomes, in execution order
    pub environments: Vec<EnvOutcome>,

    /// Count of environments attempted
    pub environment_count: usize,

    /// Count of successful builds
    pub succeeded: usize,

    /// Count of failed builds
    pub failed: usize,

    /// Whether the environment loop was stopped by an interrupt
    pub interrupted: bool,

    /// Wall-clock duration of the entire run
    pub duration_ms: u64,

    /// Human-readable one-line summary
    pub human_summary: String,
}

impl RunSummary {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_id: String,
        base_url: String,
        validation: Outcome,
        archive: Option<ArchiveInfo>,
        environments: Vec<EnvOutcome>,
        interrupted: bool,
        duration_ms: u64,
    ) -> Self {
        let succeeded = environments.iter().filter(|o| o.is_success()).count();
        let failed = environments.len() - succeeded;
        let human_summary =
            Self::generate_human_summary(validation, &environments, failed, interrupted);

        Self {
            schema_version: SUMMARY_SCHEMA_VERSION,
            schema_id: SUMMARY_SCHEMA_ID.to_string(),
            run_id,
            created_at: Utc::now(),
            base_url,
            validation,
            archive,
            environment_count: environments.len(),
            succeeded,
            failed,
            environments,
            interrupted,
            duration_ms,
            human_summary,
        }
    }

    /// Identifiers of failed environments, in execution order
    pub fn failed_environments(&self) -> Vec<&str> {
        self.environments
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.environment.as_str())
            .collect()
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0 && !self.validation.is_failure() && !self.interrupted
    }

    /// Final process exit code: zero only when validation did not fail
    /// and every environment built successfully
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }

    fn generate_human_summary(
        validation: Outcome,
        environments: &[EnvOutcome],
        failed: usize,
        interrupted: bool,
    ) -> String {
        let mut line = if failed == 0 {
            format!(
                "All {} environment(s) passed",
                environments.len()
            )
        } else {
            let names: Vec<&str> = environments
                .iter()
                .filter(|o| !o.is_success())
                .map(|o| o.environment.as_str())
                .collect();
            format!(
                "{} of {} environment(s) failed: {}",
                failed,
                environments.len(),
                names.join(", ")
            )
        };

        if validation.is_failure() {
            line.push_str("; integrity validation FAILED");
        } else if validation == Outcome::Indeterminate {
            line.push_str("; integrity validation inconclusive");
        }
        if interrupted {
            line.push_str("; run interrupted before all environments were attempted");
        }

        line
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e))
        })?;
        fs::write(path, json)
    }

    /// Load from file
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("JSON error: {}", e)))
    }
}
