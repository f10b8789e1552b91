//! Artifact fetching
//!
//! Mirrors the remote release-candidate tree into the staging area via an
//! external recursive fetcher (wget-style). The base location is
//! normalized to end with exactly one separator, the leading path
//! segments are stripped with a derived cut-dirs count, and a reject
//! pattern keeps documentation/site trees out of the mirror. The fetcher
//! tolerates a nonzero exit from the mirroring client (partial mirrors
//! are common); what it does not tolerate is the validator script being
//! absent afterwards, which means the download is unusable.

mod exclude;

pub use exclude::{ExcludeError, ExcludeRules, DEFAULT_EXCLUDES};

use std::io;

use crate::staging::StagingArea;
use crate::tool::{ToolCommand, ToolError};

/// Errors from the fetch stage
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Exclude(#[from] ExcludeError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("download incomplete: {0} not found in staging area")]
    Incomplete(String),
}

/// Result of a completed fetch
#[derive(Debug)]
pub struct FetchReport {
    /// Whether the mirroring client itself exited zero
    pub clean_exit: bool,

    /// Number of excluded entries pruned locally after the fetch
    pub pruned: usize,
}

/// Normalize a base location to end with exactly one `/`
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    format!("{}/", trimmed)
}

/// Number of leading path segments to strip when mirroring.
///
/// `https://dist.example.org/proj/1.0-RC1/` has two segments after the
/// host (`proj`, `1.0-RC1`), so mirrored files land directly in the
/// staging root rather than under `proj/1.0-RC1/`.
pub fn cut_dirs(url: &str) -> usize {
    let without_scheme = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    };
    without_scheme
        .split('/')
        .skip(1) // host
        .filter(|seg| !seg.is_empty())
        .count()
}

/// Mirrors the remote artifact tree into the staging area
pub struct Fetcher {
    command: ToolCommand,
    reject_pattern: String,
    rules: ExcludeRules,
    validator_script: String,
}

impl Fetcher {
    pub fn new(
        command: ToolCommand,
        reject_pattern: impl Into<String>,
        rules: ExcludeRules,
        validator_script: impl Into<String>,
    ) -> Self {
        Self {
            command,
            reject_pattern: reject_pattern.into(),
            rules,
            validator_script: validator_script.into(),
        }
    }

    /// Fetch everything under `base_url` into the staging area.
    ///
    /// Fails with [`FetchError::Incomplete`] when the validator script is
    /// absent from the staged tree afterwards; a nonzero exit from the
    /// mirroring client alone is reported but not fatal.
    pub fn fetch(&self, base_url: &str, staging: &StagingArea) -> Result<FetchReport, FetchError> {
        let url = normalize_base_url(base_url);
        let extra = [
            format!("--cut-dirs={}", cut_dirs(&url)),
            "--reject-regex".to_string(),
            self.reject_pattern.clone(),
            "-P".to_string(),
            staging.root().to_string_lossy().into_owned(),
            url,
        ];

        let output = self.command.run(&extra, None, &[])?;

        let pruned = self.rules.prune(staging.root())?;

        if staging.find_file(&self.validator_script).is_none() {
            return Err(FetchError::Incomplete(self.validator_script.clone()));
        }

        Ok(FetchReport {
            clean_exit: output.success,
            pruned,
        })
    }
}
