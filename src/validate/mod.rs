//! Integrity validation
//!
//! Runs the staged signature/checksum validator once, in the staging
//! directory, capturing its combined output to `validation.log` and
//! classifying the result by marker plus exit status. The stage is
//! advisory: a failed validation is reported (with the full log) but the
//! pipeline keeps going so the operator sees build results too.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::classifier::{MarkerClassifier, Outcome};
use crate::staging::StagingArea;
use crate::tool::{ToolCommand, ToolError};

/// Errors from the validation stage
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result of one validator invocation
#[derive(Debug)]
pub struct ValidationReport {
    /// Classified outcome
    pub outcome: Outcome,

    /// Where the captured output was persisted
    pub log_path: PathBuf,

    /// Full captured output, for echoing on failure
    pub log: String,
}

/// Invokes the external validator and classifies its output
pub struct IntegrityValidator {
    command: ToolCommand,
    classifier: MarkerClassifier,
}

impl IntegrityValidator {
    pub fn new(command: ToolCommand, classifier: MarkerClassifier) -> Self {
        Self {
            command,
            classifier,
        }
    }

    /// Run the validator in the staging directory
    pub fn run(&self, staging: &StagingArea) -> Result<ValidationReport, ValidateError> {
        let output = self.command.run(&[], Some(staging.root()), &[])?;

        let log_path = staging.validation_log();
        fs::write(&log_path, &output.text)?;

        let outcome = self.classifier.classify(&output.text, output.success);

        Ok(ValidationReport {
            outcome,
            log_path,
            log: output.text,
        })
    }
}
