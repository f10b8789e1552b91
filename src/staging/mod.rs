//! Staging area lifecycle and layout
//!
//! One pipeline run owns one staging directory exclusively. It is wiped
//! and recreated at run start (never reused with prior contents) and left
//! in place afterwards for post-run inspection. The staging area also
//! owns the canonical names of every durable artifact a run produces:
//! the mirrored tree, the `source/` subdirectory, the validation log, the
//! append-only version log, one build log per environment, and the run
//! summary.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// File name of the validator output log
pub const VALIDATION_LOG: &str = "validation.log";

/// File name of the per-run version log
pub const VERSIONS_LOG: &str = "versions.log";

/// File name of the persisted run summary
pub const RUN_SUMMARY: &str = "run_summary.json";

/// Filesystem location owned exclusively by one pipeline run
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
    source_subdir: String,
}

impl StagingArea {
    /// Create a staging area handle rooted at `root`
    pub fn new(root: PathBuf, source_subdir: impl Into<String>) -> Self {
        Self {
            root,
            source_subdir: source_subdir.into(),
        }
    }

    /// Wipe any prior run's contents and recreate the staging directory.
    ///
    /// The version log is created empty so each run starts with a
    /// truncated record.
    pub fn prepare(&self) -> io::Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)?;
        fs::write(self.versions_log(), "")?;
        Ok(())
    }

    /// Root of the staging tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Subdirectory holding the source distribution archive
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.source_subdir)
    }

    /// Path of the validator output log
    pub fn validation_log(&self) -> PathBuf {
        self.root.join(VALIDATION_LOG)
    }

    /// Path of the append-only version log
    pub fn versions_log(&self) -> PathBuf {
        self.root.join(VERSIONS_LOG)
    }

    /// Path of the build log for one environment
    pub fn build_log(&self, environment: &str) -> PathBuf {
        self.root.join(format!("build-{}.log", environment))
    }

    /// Path of the persisted run summary
    pub fn summary_path(&self) -> PathBuf {
        self.root.join(RUN_SUMMARY)
    }

    /// Append one block to the version log
    pub fn append_versions(&self, block: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.versions_log())?;
        file.write_all(block.as_bytes())?;
        if !block.ends_with('\n') {
            file.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Read the full version log
    pub fn read_versions(&self) -> io::Result<String> {
        fs::read_to_string(self.versions_log())
    }

    /// Find a file by name anywhere under the staging root
    pub fn find_file(&self, name: &str) -> Option<PathBuf> {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .find(|e| e.file_type().is_file() && e.file_name() == name)
            .map(|e| e.into_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn staging_in(dir: &TempDir) -> StagingArea {
        StagingArea::new(dir.path().join("staging"), "source")
    }

    #[test]
    fn test_prepare_creates_fresh_tree() {
        let dir = TempDir::new().unwrap();
        let staging = staging_in(&dir);

        staging.prepare().unwrap();

        assert!(staging.root().is_dir());
        assert!(staging.versions_log().is_file());
        assert_eq!(staging.read_versions().unwrap(), "");
    }

    #[test]
    fn test_prepare_wipes_prior_run() {
        let dir = TempDir::new().unwrap();
        let staging = staging_in(&dir);

        staging.prepare().unwrap();
        fs::create_dir_all(staging.source_dir()).unwrap();
        fs::write(staging.source_dir().join("stale.tar.gz"), b"old").unwrap();
        staging.append_versions("old block").unwrap();

        staging.prepare().unwrap();

        assert!(!staging.source_dir().join("stale.tar.gz").exists());
        assert_eq!(staging.read_versions().unwrap(), "");
    }

    #[test]
    fn test_layout_paths() {
        let staging = StagingArea::new(PathBuf::from("/tmp/rc"), "source");

        assert_eq!(staging.source_dir(), PathBuf::from("/tmp/rc/source"));
        assert_eq!(
            staging.validation_log(),
            PathBuf::from("/tmp/rc/validation.log")
        );
        assert_eq!(
            staging.build_log("jdk-17"),
            PathBuf::from("/tmp/rc/build-jdk-17.log")
        );
        assert_eq!(
            staging.summary_path(),
            PathBuf::from("/tmp/rc/run_summary.json")
        );
    }

    #[test]
    fn test_append_versions_accumulates() {
        let dir = TempDir::new().unwrap();
        let staging = staging_in(&dir);
        staging.prepare().unwrap();

        staging.append_versions("=== jdk-11 ===\njavac 11.0.2").unwrap();
        staging.append_versions("=== jdk-17 ===\njavac 17.0.2\n").unwrap();

        let log = staging.read_versions().unwrap();
        assert!(log.contains("=== jdk-11 ==="));
        assert!(log.contains("=== jdk-17 ==="));
        // Appended blocks stay newline-separated
        assert!(log.contains("11.0.2\n=== jdk-17"));
    }

    #[test]
    fn test_find_file_searches_nested_dirs() {
        let dir = TempDir::new().unwrap();
        let staging = staging_in(&dir);
        staging.prepare().unwrap();

        let nested = staging.root().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("verify-release.sh"), b"#!/bin/sh").unwrap();

        let found = staging.find_file("verify-release.sh").unwrap();
        assert!(found.ends_with("a/b/verify-release.sh"));

        assert!(staging.find_file("missing.sh").is_none());
    }
}
