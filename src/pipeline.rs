//! Verification pipeline
//!
//! One run walks a fixed stage sequence: prepare the staging area, mirror
//! the release-candidate tree, run the integrity validator, locate and
//! extract the single source archive, enumerate build environments, build
//! once per environment, and aggregate everything into a run summary.
//!
//! Stage failures split into two classes. Faults before the environment
//! loop (fetch, extraction) abort the run because nothing downstream can
//! produce a meaningful result without them. A failed integrity
//! validation and individual environment failures are recorded in the
//! summary instead; the run keeps going so the operator gets the full
//! picture in one pass.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::archive::{self, ArchiveError};
use crate::build::BuildRunner;
use crate::classifier::MarkerClassifier;
use crate::config::{ConfigError, VerifyConfig};
use crate::fetch::{ExcludeError, ExcludeRules, FetchError, Fetcher};
use crate::signal::SignalState;
use crate::staging::StagingArea;
use crate::summary::{ArchiveInfo, RunSummary};
use crate::toolchain::{self, ToolchainSwitcher};
use crate::validate::{IntegrityValidator, ValidateError};

/// Error types for pipeline operations
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("exclusion rules error: {0}")]
    Exclude(#[from] ExcludeError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("validation stage failed: {0}")]
    Validate(#[from] ValidateError),

    #[error("source extraction failed: {0}")]
    Archive(#[from] ArchiveError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Process exit code for a run aborted by this error
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// One-shot release-candidate verification run
pub struct Pipeline {
    config: VerifyConfig,
    base_url: String,
    signal: Arc<SignalState>,
    verbose: bool,
}

impl Pipeline {
    pub fn new(config: VerifyConfig, base_url: impl Into<String>) -> Self {
        Self {
            config,
            base_url: base_url.into(),
            signal: Arc::new(SignalState::new()),
            verbose: false,
        }
    }

    /// Thread in externally-installed interrupt state
    pub fn with_signal_state(mut self, signal: Arc<SignalState>) -> Self {
        self.signal = signal;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn log(&self, message: &str) {
        if self.verbose {
            eprintln!("{}", message);
        }
    }

    /// Run the full pipeline and persist the run summary.
    ///
    /// Returns the summary for both passing and failing runs; the
    /// summary's own exit code distinguishes them. Errors are reserved
    /// for faults that prevent the run from producing results at all.
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let started = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        let base_url = crate::fetch::normalize_base_url(&self.base_url);

        self.log(&format!("Run {} verifying {}", run_id, base_url));

        let staging = StagingArea::new(
            self.config.staging_dir.clone(),
            self.config.source_subdir.clone(),
        );
        staging.prepare()?;
        self.log(&format!("Staging area: {}", staging.root().display()));

        // Mirror the remote tree
        let fetcher = Fetcher::new(
            self.config.commands.fetch.clone(),
            self.config.fetch_reject_pattern.clone(),
            ExcludeRules::from_patterns(self.config.exclude_globs.iter().map(String::as_str))?,
            self.config.validator_script.clone(),
        );
        let fetch_report = fetcher.fetch(&base_url, &staging)?;
        if !fetch_report.clean_exit {
            eprintln!("warning: mirroring client exited nonzero; continuing with staged files");
        }
        self.log(&format!(
            "Fetch complete ({} excluded entries pruned)",
            fetch_report.pruned
        ));

        // Integrity validation is advisory for control flow but counts
        // toward the final exit code
        let validator = IntegrityValidator::new(
            self.config.commands.validate.clone(),
            MarkerClassifier::new(self.config.markers.validation.clone()),
        );
        let validation = validator.run(&staging)?;
        self.log(&format!("Validation outcome: {}", validation.outcome));
        if validation.outcome.is_failure() {
            eprintln!(
                "Integrity validation FAILED; full log ({}):",
                validation.log_path.display()
            );
            eprintln!("{}", validation.log);
        }

        // Locate and extract the single source archive
        let archive_path = archive::locate(&staging.source_dir(), &self.config.archive_glob)?;
        self.log(&format!("Source archive: {}", archive_path.display()));
        let source = archive::extract(&archive_path)?;
        self.log(&format!(
            "Extracted {} (sha256 {})",
            source.project_dir.display(),
            source.sha256
        ));
        let archive_info = ArchiveInfo {
            file_name: source
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            root_dir: source.root_dir.clone(),
            sha256: source.sha256.clone(),
        };

        // Enumerate environments and build in each
        let environments = toolchain::enumerate(&self.config.commands.list_alternatives);
        self.log(&format!("Building in {} environment(s)", environments.len()));

        let switcher = ToolchainSwitcher::new(
            self.config.commands.set_alternative.clone(),
            self.config.commands.query_alternatives.clone(),
        );
        let mut runner = BuildRunner::new(
            &staging,
            switcher,
            self.config.commands.toolchain_version.clone(),
            self.config.commands.build_version.clone(),
            self.config.commands.build.clone(),
            MarkerClassifier::new(self.config.markers.build.clone()),
            self.config.tail_lines,
            Arc::clone(&self.signal),
            self.verbose,
        );
        let outcomes = runner.run_all(&environments, &source.project_dir);
        drop(runner); // restores the prior toolchain selection

        // Aggregate and report
        let versions = staging.read_versions()?;
        if !versions.trim().is_empty() {
            println!("{}", versions.trim_end());
            println!();
        }

        let summary = RunSummary::new(
            run_id,
            base_url,
            validation.outcome,
            Some(archive_info),
            outcomes,
            self.signal.is_stop_requested(),
            started.elapsed().as_millis() as u64,
        );
        summary.write_to_file(&staging.summary_path())?;

        println!("{}", summary.human_summary);
        for outcome in &summary.environments {
            if !outcome.is_success() {
                match &outcome.log_path {
                    Some(log) => println!(
                        "  {}: failed (see {})",
                        outcome.environment,
                        log.display()
                    ),
                    None => println!(
                        "  {}: failed ({})",
                        outcome.environment,
                        outcome.detail.as_deref().unwrap_or("no detail")
                    ),
                }
            }
        }
        self.log(&format!(
            "Run summary written to {}",
            staging.summary_path().display()
        ));

        Ok(summary)
    }
}

/// Staging directory resolved from config plus CLI override
pub fn resolve_staging_dir(config: &VerifyConfig, override_dir: Option<PathBuf>) -> PathBuf {
    override_dir.unwrap_or_else(|| config.staging_dir.clone())
}
