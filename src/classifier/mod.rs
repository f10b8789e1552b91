//! Pass/fail classification of opaque tool output
//!
//! External tools signal success with a literal marker string in their
//! output. Marker scanning alone is fragile, so classification also
//! consults the exit status: marker present is success, marker absent
//! with a nonzero exit is failure, and marker absent with a zero exit is
//! indeterminate (the caller decides how strict to be).

use serde::{Deserialize, Serialize};

/// Classification of one external tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Success marker found in output
    Success,

    /// Marker absent and the tool reported failure
    Failure,

    /// Marker absent but the tool exited zero
    Indeterminate,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Indeterminate => "indeterminate",
        };
        f.write_str(s)
    }
}

/// Classifies tool output by scanning for a configurable success marker
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    marker: String,
}

impl MarkerClassifier {
    /// Create a classifier for the given literal marker
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// The marker this classifier scans for
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Classify captured output together with the tool's exit status
    pub fn classify(&self, output: &str, exit_ok: bool) -> Outcome {
        if output.contains(&self.marker) {
            Outcome::Success
        } else if !exit_ok {
            Outcome::Failure
        } else {
            Outcome::Indeterminate
        }
    }
}

/// Last `n` lines of `text`, for fast local diagnosis of a failed tool
pub fn tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
