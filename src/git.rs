use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git is not installed")]
    NotInstalled,
    #[error("not a git repository")]
    NotARepo,
    #[error("git command failed: {0}")]
    CommandFailed(String),
}

/// Source of version-control change information for a directory.
///
/// Paths are relative to the `root` passed in, `/`-separated.
pub trait ChangeSource {
    /// Files modified or added relative to `HEAD`, plus untracked files.
    fn changed_paths(&self, root: &Path) -> Result<BTreeSet<String>, GitError>;

    /// Files with staged or unstaged edits.
    fn activity_paths(&self, root: &Path) -> Result<BTreeSet<String>, GitError>;
}

/// [`ChangeSource`] backed by the `git` binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

impl ChangeSource for GitCli {
    fn changed_paths(&self, root: &Path) -> Result<BTreeSet<String>, GitError> {
        let mut paths = lines(&run(
            root,
            &["diff", "--name-only", "--relative", "--diff-filter=ACMR", "HEAD"],
        )?);
        paths.extend(lines(&run(
            root,
            &["ls-files", "--others", "--exclude-standard"],
        )?));
        Ok(paths)
    }

    fn activity_paths(&self, root: &Path) -> Result<BTreeSet<String>, GitError> {
        let mut paths = lines(&run(root, &["diff", "--name-only", "--relative"])?);
        paths.extend(lines(&run(
            root,
            &["diff", "--name-only", "--relative", "--cached"],
        )?));
        Ok(paths)
    }
}

fn run(root: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .map_err(|_| GitError::NotInstalled)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("not a git repository") {
            return Err(GitError::NotARepo);
        }
        return Err(GitError::CommandFailed(stderr.trim().to_string()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn lines(stdout: &str) -> BTreeSet<String> {
    stdout
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.replace('\\', "/"))
        .collect()
}
