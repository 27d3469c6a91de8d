use crate::error::ScopeError;
use crate::ignore::IgnorePolicy;
use crate::security;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCandidate {
    /// Repo-relative, `/`-separated.
    pub path: String,
    #[serde(skip)]
    pub absolute_path: PathBuf,
    pub size_bytes: u64,
    pub extension: Option<String>,
}

impl FileCandidate {
    /// Builds a candidate for a single known file under `root`.
    pub fn from_relative(root: &Path, path: &str) -> std::io::Result<Self> {
        let absolute_path = root.join(path);
        let metadata = fs::metadata(&absolute_path)?;
        Ok(FileCandidate {
            path: path.to_string(),
            extension: extension_of(&absolute_path),
            absolute_path,
            size_bytes: metadata.len(),
        })
    }

    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Default)]
pub struct WalkReport {
    pub candidates: Vec<FileCandidate>,
    /// Entries below the root that could not be read.
    pub skipped: Vec<String>,
}

/// Walks `root` without following symlinks, pruning sensitive and ignored
/// directories before descending. Candidates come back sorted by path.
pub fn walk(root: &Path, ignore: &IgnorePolicy) -> Result<WalkReport, ScopeError> {
    fs::read_dir(root).map_err(|source| ScopeError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    })?;

    let mut report = WalkReport::default();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || admit(root, entry, ignore));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if e.depth() == 0 {
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("walk failed at root"));
                    return Err(ScopeError::RootUnreadable {
                        path: root.to_path_buf(),
                        source,
                    });
                }
                let path = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                warn!(%path, error = %e, "skipping unreadable entry");
                report.skipped.push(path);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let Some(path) = relative_path(root, entry.path()) else {
            continue;
        };
        let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);

        report.candidates.push(FileCandidate {
            path,
            extension: extension_of(entry.path()),
            absolute_path: entry.path().to_path_buf(),
            size_bytes,
        });
    }

    report.candidates.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(count = report.candidates.len(), "walk complete");
    Ok(report)
}

fn admit(root: &Path, entry: &DirEntry, ignore: &IgnorePolicy) -> bool {
    let Some(path) = relative_path(root, entry.path()) else {
        return false;
    };
    let name = entry.file_name().to_str().unwrap_or("");
    if security::is_sensitive_name(name) {
        debug!(%path, "pruned sensitive entry");
        return false;
    }
    if ignore.matches(&path, entry.file_type().is_dir()) {
        debug!(%path, "pruned ignored entry");
        return false;
    }
    true
}

/// Repo-relative path with `/` separators; `None` for non-UTF-8 names.
pub fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_walk_prunes_and_sorts() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "src/b.ts", "export const b = 1;\n");
        touch(root, "src/a.ts", "import { b } from './b';\n");
        touch(root, "README.md", "# hi\n");
        touch(root, "secrets/.env", "TOKEN=abc\n");
        touch(root, "config/.env.local", "TOKEN=abc\n");
        touch(root, "node_modules/x/index.js", "module.exports = 1;\n");
        touch(root, ".git/HEAD", "ref: refs/heads/main\n");

        let ignore = IgnorePolicy::load(root, &[]);
        let report = walk(root, &ignore).unwrap();
        let paths: Vec<&str> = report.candidates.iter().map(|c| c.path.as_str()).collect();

        assert_eq!(paths, vec!["README.md", "src/a.ts", "src/b.ts"]);
        assert_eq!(report.candidates[1].extension.as_deref(), Some("ts"));
        assert_eq!(report.candidates[0].size_bytes, 5);
    }

    #[test]
    fn test_walk_applies_extra_globs() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/a.ts", "");
        touch(dir.path(), "src/a.generated.ts", "");

        let ignore = IgnorePolicy::load(dir.path(), &["*.generated.ts".to_string()]);
        let report = walk(dir.path(), &ignore).unwrap();
        assert_eq!(report.candidates.len(), 1);
        assert_eq!(report.candidates[0].path, "src/a.ts");
    }

    #[test]
    fn test_walk_missing_root_is_fatal() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = walk(&missing, &IgnorePolicy::default()).unwrap_err();
        assert!(matches!(err, ScopeError::RootUnreadable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_does_not_follow_symlinks() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/a.ts", "");
        std::os::unix::fs::symlink(dir.path(), dir.path().join("src/loop")).unwrap();

        let report = walk(dir.path(), &IgnorePolicy::default()).unwrap();
        assert_eq!(report.candidates.len(), 1);
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_path(root, Path::new("/repo/src/lib/a.ts")).as_deref(),
            Some("src/lib/a.ts")
        );
        assert_eq!(relative_path(root, Path::new("/elsewhere/a.ts")), None);
    }
}
