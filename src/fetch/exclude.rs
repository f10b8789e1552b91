//! Exclusion rules for mirrored artifact trees
//!
//! The fetcher is handed a reject pattern, but mirroring clients differ
//! in how faithfully they honor it, so the same exclusions are applied
//! locally: after the fetch returns, anything in the staging tree that
//! matches is pruned.

use std::fs;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

/// Default patterns to exclude from the mirrored tree
pub const DEFAULT_EXCLUDES: &[&str] = &["site", "**/site", "**/site/**"];

/// Errors for exclusion rules
#[derive(Debug, thiserror::Error)]
pub enum ExcludeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("glob pattern error: {0}")]
    Glob(#[from] globset::Error),
}

/// Exclusion rules applied to staged paths (relative to the staging root)
#[derive(Debug)]
pub struct ExcludeRules {
    glob_set: GlobSet,
}

impl ExcludeRules {
    /// Create rules from the default patterns
    pub fn new() -> Result<Self, ExcludeError> {
        Self::from_patterns(DEFAULT_EXCLUDES)
    }

    /// Create rules from explicit patterns
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, ExcludeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if !pattern.is_empty() {
                builder.add(Glob::new(pattern)?);
            }
        }
        Ok(Self {
            glob_set: builder.build()?,
        })
    }

    /// Check if a staging-relative path is excluded
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.glob_set.is_match(path_str.as_ref())
    }

    /// Remove every matching entry under `root`.
    ///
    /// Returns the number of entries removed. Matching directories are
    /// removed whole; entries already gone (children of a removed
    /// directory) are skipped.
    pub fn prune(&self, root: &Path) -> Result<usize, ExcludeError> {
        let mut matches: Vec<std::path::PathBuf> = Vec::new();

        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if entry.path() == root {
                continue;
            }
            let rel = match entry.path().strip_prefix(root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            if self.is_excluded(rel) {
                matches.push(entry.into_path());
            }
        }

        // Shallowest first so directories go before their contents
        matches.sort_by_key(|path| path.components().count());

        let mut removed = 0;
        for path in matches {
            if !path.exists() {
                continue;
            }
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
            removed += 1;
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_excludes_site_segments() {
        let rules = ExcludeRules::new().unwrap();

        assert!(rules.is_excluded(Path::new("site")));
        assert!(rules.is_excluded(Path::new("site/index.html")));
        assert!(rules.is_excluded(Path::new("docs/site")));
        assert!(rules.is_excluded(Path::new("docs/site/css/style.css")));
    }

    #[test]
    fn test_normal_paths_not_excluded() {
        let rules = ExcludeRules::new().unwrap();

        assert!(!rules.is_excluded(Path::new("source/proj-1.0-src.tar.gz")));
        assert!(!rules.is_excluded(Path::new("verify-release.sh")));
        assert!(!rules.is_excluded(Path::new("binaries/proj-1.0-bin.zip")));
        // "website" contains "site" as a substring but is not a segment
        assert!(!rules.is_excluded(Path::new("website/index.html")));
    }

    #[test]
    fn test_custom_patterns() {
        let rules = ExcludeRules::from_patterns(["**/*.asc.md5", "tmp/**"]).unwrap();

        assert!(rules.is_excluded(Path::new("source/x.asc.md5")));
        assert!(rules.is_excluded(Path::new("tmp/scratch")));
        assert!(!rules.is_excluded(Path::new("site/index.html")));
    }

    #[test]
    fn test_empty_patterns_skipped() {
        let rules = ExcludeRules::from_patterns(["", "*.log"]).unwrap();

        assert!(rules.is_excluded(Path::new("build.log")));
        assert!(!rules.is_excluded(Path::new("file.txt")));
    }

    #[test]
    fn test_prune_removes_matching_tree() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        std::fs::create_dir_all(root.join("site/css")).unwrap();
        std::fs::write(root.join("site/index.html"), b"x").unwrap();
        std::fs::write(root.join("site/css/style.css"), b"x").unwrap();
        std::fs::create_dir_all(root.join("source")).unwrap();
        std::fs::write(root.join("source/proj-src.tar.gz"), b"x").unwrap();

        let rules = ExcludeRules::new().unwrap();
        let removed = rules.prune(root).unwrap();

        assert_eq!(removed, 1); // the site/ directory, removed whole
        assert!(!root.join("site").exists());
        assert!(root.join("source/proj-src.tar.gz").exists());
    }

    #[test]
    fn test_prune_nothing_to_remove() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("keep.txt"), b"x").unwrap();

        let rules = ExcludeRules::new().unwrap();
        let removed = rules.prune(dir.path()).unwrap();

        assert_eq!(removed, 0);
        assert!(dir.path().join("keep.txt").exists());
    }
}
