//! Source archive location and extraction
//!
//! The staged `source/` subdirectory must hold exactly one compressed
//! source tarball. Zero matches and multiple matches are both hard
//! failures; silently picking one of several archives would make runs
//! nondeterministic. The archive's first entry names the project root
//! directory, which must exist after extraction.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use globset::Glob;
use sha2::{Digest, Sha256};

/// Errors from the extraction stage
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("no source archive matching {pattern} under {dir}")]
    Missing { pattern: String, dir: PathBuf },

    #[error("ambiguous source archives matching {pattern}: {}", candidates.join(", "))]
    Ambiguous {
        pattern: String,
        candidates: Vec<String>,
    },

    #[error("archive {0} has no entries")]
    Empty(PathBuf),

    #[error("extraction of {archive} did not produce directory {root_dir}")]
    Corrupt { archive: PathBuf, root_dir: String },

    #[error("glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// A located, extracted source distribution
#[derive(Debug, Clone)]
pub struct SourceArchive {
    /// Path of the tarball itself
    pub path: PathBuf,

    /// Top-level directory name inside the archive
    pub root_dir: String,

    /// Directory the archive extracted into (parent of the tarball joined
    /// with `root_dir`); builds run from here
    pub project_dir: PathBuf,

    /// SHA-256 of the tarball, hex encoded
    pub sha256: String,
}

/// Locate the single archive matching `pattern` directly under `dir`
pub fn locate(dir: &Path, pattern: &str) -> Result<PathBuf, ArchiveError> {
    let matcher = Glob::new(pattern)?.compile_matcher();

    let mut candidates: Vec<PathBuf> = Vec::new();
    if dir.is_dir() {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if matcher.is_match(entry.file_name()) {
                candidates.push(entry.path());
            }
        }
    }
    candidates.sort();

    match candidates.len() {
        0 => Err(ArchiveError::Missing {
            pattern: pattern.to_string(),
            dir: dir.to_path_buf(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(ArchiveError::Ambiguous {
            pattern: pattern.to_string(),
            candidates: candidates
                .iter()
                .map(|p| {
                    p.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default()
                })
                .collect(),
        }),
    }
}

/// Extract the archive in place and resolve its project directory
pub fn extract(path: &Path) -> Result<SourceArchive, ArchiveError> {
    let root_dir = root_entry_dir(path)?;

    let dest = path.parent().unwrap_or_else(|| Path::new("."));
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(File::open(path)?)));
    archive.unpack(dest)?;

    let project_dir = dest.join(&root_dir);
    if !project_dir.is_dir() {
        return Err(ArchiveError::Corrupt {
            archive: path.to_path_buf(),
            root_dir,
        });
    }

    Ok(SourceArchive {
        path: path.to_path_buf(),
        root_dir,
        project_dir,
        sha256: sha256_hex(path)?,
    })
}

/// First path segment of the archive's first entry
fn root_entry_dir(path: &Path) -> Result<String, ArchiveError> {
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(File::open(path)?)));
    let mut entries = archive.entries()?;

    let first = match entries.next() {
        Some(entry) => entry?,
        None => return Err(ArchiveError::Empty(path.to_path_buf())),
    };

    let entry_path = first.path()?;
    let root = entry_path
        .components()
        .next()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .ok_or_else(|| ArchiveError::Empty(path.to_path_buf()))?;

    Ok(root)
}

/// Streaming SHA-256 of a file, hex encoded
pub fn sha256_hex(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    /// Build a small .tar.gz with the given root directory and one file
    fn make_archive(dir: &Path, name: &str, root: &str) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let enc = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(enc);

        let content = b"<project/>";
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{}/pom.xml", root), &content[..])
            .unwrap();

        builder.into_inner().unwrap().finish().unwrap();
        path
    }

    #[test]
    fn test_locate_single_archive() {
        let dir = TempDir::new().unwrap();
        let path = make_archive(dir.path(), "proj-1.0-src.tar.gz", "proj-1.0");

        let found = locate(dir.path(), "*.tar.gz").unwrap();
        assert_eq!(found, path);
    }

    #[test]
    fn test_locate_zero_matches_is_missing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let err = locate(dir.path(), "*.tar.gz").unwrap_err();
        assert!(matches!(err, ArchiveError::Missing { .. }));
    }

    #[test]
    fn test_locate_missing_dir_is_missing() {
        let dir = TempDir::new().unwrap();
        let err = locate(&dir.path().join("nope"), "*.tar.gz").unwrap_err();
        assert!(matches!(err, ArchiveError::Missing { .. }));
    }

    #[test]
    fn test_locate_multiple_matches_is_ambiguous() {
        let dir = TempDir::new().unwrap();
        make_archive(dir.path(), "proj-1.0-src.tar.gz", "proj-1.0");
        make_archive(dir.path(), "proj-1.1-src.tar.gz", "proj-1.1");

        let err = locate(dir.path(), "*.tar.gz").unwrap_err();
        match err {
            ArchiveError::Ambiguous { candidates, .. } => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates.contains(&"proj-1.0-src.tar.gz".to_string()));
                assert!(candidates.contains(&"proj-1.1-src.tar.gz".to_string()));
            }
            other => panic!("expected Ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_locate_ignores_subdirectories() {
        let dir = TempDir::new().unwrap();
        make_archive(dir.path(), "proj-src.tar.gz", "proj");
        let sub = dir.path().join("nested");
        std::fs::create_dir(&sub).unwrap();
        make_archive(&sub, "other-src.tar.gz", "other");

        let found = locate(dir.path(), "*.tar.gz").unwrap();
        assert!(found.ends_with("proj-src.tar.gz"));
    }

    #[test]
    fn test_extract_resolves_root_dir() {
        let dir = TempDir::new().unwrap();
        let path = make_archive(dir.path(), "proj-1.0-src.tar.gz", "proj-1.0");

        let archive = extract(&path).unwrap();

        assert_eq!(archive.root_dir, "proj-1.0");
        assert_eq!(archive.project_dir, dir.path().join("proj-1.0"));
        assert!(archive.project_dir.join("pom.xml").is_file());
        assert_eq!(archive.sha256.len(), 64);
    }

    #[test]
    fn test_extract_truncated_archive_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken-src.tar.gz");
        std::fs::write(&path, b"\x1f\x8b\x08\x00garbage").unwrap();

        assert!(extract(&path).is_err());
    }

    #[test]
    fn test_sha256_matches_known_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"abc").unwrap();

        assert_eq!(
            sha256_hex(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
