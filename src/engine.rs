use crate::deps;
use crate::error::{ScopeError, ScopeWarning};
use crate::git::{ChangeSource, GitCli};
use crate::ignore::IgnorePolicy;
use crate::profile::{self, StyleProfile};
use crate::ranker;
use crate::scope::{self, ScopeInputs, ScopedFile, ScopingDirectives};
use crate::security;
use crate::walker::{self, FileCandidate};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// Request-scoped state for scoping one repository: the canonical root,
/// its compiled ignore rules and the change collaborator.
pub struct ScopeContext {
    root: PathBuf,
    ignore: IgnorePolicy,
    changes: Box<dyn ChangeSource + Send + Sync>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeOutcome {
    /// Final ordered set, already ranked and truncated.
    pub files: Vec<ScopedFile>,
    pub profile: StyleProfile,
    pub warnings: Vec<ScopeWarning>,
    /// Files with uncommitted edits when `git_aware` was requested.
    pub activity: Vec<String>,
}

impl ScopeContext {
    /// Canonicalizes `root` and compiles its ignore rules plus
    /// `extra_globs`. Changes come from the `git` binary by default.
    pub fn open(root: &Path, extra_globs: &[String]) -> Result<Self, ScopeError> {
        let root = fs::canonicalize(root).map_err(|source| ScopeError::RootUnreadable {
            path: root.to_path_buf(),
            source,
        })?;
        let ignore = IgnorePolicy::load(&root, extra_globs);
        Ok(ScopeContext {
            root,
            ignore,
            changes: Box::new(GitCli),
        })
    }

    pub fn with_change_source(mut self, changes: Box<dyn ChangeSource + Send + Sync>) -> Self {
        self.changes = changes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run(&self, directives: &ScopingDirectives) -> Result<ScopeOutcome, ScopeError> {
        let report = walker::walk(&self.root, &self.ignore)?;
        let candidates = report.candidates;
        let mut warnings: Vec<ScopeWarning> = report
            .skipped
            .into_iter()
            .map(ScopeWarning::UnreadableEntry)
            .collect();
        info!(root = %self.root.display(), candidates = candidates.len(), "walked repository");

        let (target, resolved) = match directives.target_path.as_deref() {
            Some(raw) => {
                let (candidate, resolved) = self.locate_target(raw, &candidates)?;
                (Some(candidate), Some(resolved))
            }
            None => (None, None),
        };
        // Symlinks are read through, so the link's destination counts too.
        let withheld = target.as_ref().map(|t| security::is_sensitive(&t.path)).unwrap_or(false)
            || resolved.as_deref().map(security::is_sensitive).unwrap_or(false);
        if let (true, Some(t)) = (withheld, &target) {
            warn!(path = %t.path, "target matches the sensitive-file denylist; withholding it");
            warnings.push(ScopeWarning::SensitiveTarget(t.path.clone()));
        }

        let changed = if directives.changed_only {
            match self.changes.changed_paths(&self.root) {
                Ok(paths) => Some(paths),
                Err(e) => {
                    warn!(error = %e, "changed files unavailable; not filtering by change");
                    warnings.push(ScopeWarning::ChangesUnavailable(e.to_string()));
                    None
                }
            }
        } else {
            None
        };

        let activity: Option<BTreeSet<String>> = if directives.git_aware {
            match self.changes.activity_paths(&self.root) {
                Ok(paths) => Some(
                    paths
                        .into_iter()
                        .filter(|p| !security::is_sensitive(p))
                        .collect(),
                ),
                Err(e) => {
                    warn!(error = %e, "git activity unavailable");
                    warnings.push(ScopeWarning::ActivityUnavailable(e.to_string()));
                    None
                }
            }
        } else {
            None
        };

        let dependencies: Option<Vec<FileCandidate>> = match (&target, directives.tree_shake) {
            (Some(_), true) if withheld => Some(Vec::new()),
            (Some(t), true) => Some(deps::dependencies_of(t, &candidates)),
            _ => None,
        };
        if let Some(deps) = &dependencies {
            debug!(count = deps.len(), "resolved target dependencies");
        }

        let inputs = ScopeInputs {
            candidates: &candidates,
            target: target.as_ref(),
            dependencies: dependencies.as_deref(),
            changed: changed.as_ref(),
            activity: activity.as_ref(),
            withhold_target: withheld,
        };
        let resolution = scope::resolve(&inputs, directives);
        warnings.extend(resolution.warnings);

        let files = ranker::rank(resolution.files, directives.max_files);
        let profile = profile::profile(&candidates);

        Ok(ScopeOutcome {
            files,
            profile,
            warnings,
            activity: activity.map(|a| a.into_iter().collect()).unwrap_or_default(),
        })
    }

    /// Resolves a root-relative (or absolute) target to a candidate plus the
    /// root-relative path of the file it really names once symlinks are
    /// followed. Ignored but existing files are still accepted; the caller
    /// decides about sensitive ones.
    fn locate_target(
        &self,
        raw: &str,
        candidates: &[FileCandidate],
    ) -> Result<(FileCandidate, String), ScopeError> {
        let raw_path = Path::new(raw);
        let joined = if raw_path.is_absolute() {
            raw_path.to_path_buf()
        } else {
            self.root.join(raw_path)
        };
        let lexical = normalize(&joined);
        if !lexical.starts_with(&self.root) {
            return Err(ScopeError::TargetOutsideRoot(raw.to_string()));
        }

        let canonical = fs::canonicalize(&lexical)
            .map_err(|_| ScopeError::TargetNotFound(raw.to_string()))?;
        if !canonical.starts_with(&self.root) {
            return Err(ScopeError::TargetOutsideRoot(raw.to_string()));
        }
        if !canonical.is_file() {
            return Err(ScopeError::TargetNotFound(raw.to_string()));
        }

        let relative = walker::relative_path(&self.root, &lexical)
            .ok_or_else(|| ScopeError::TargetNotFound(raw.to_string()))?;
        let resolved = walker::relative_path(&self.root, &canonical)
            .ok_or_else(|| ScopeError::TargetNotFound(raw.to_string()))?;
        if let Some(found) = candidates.iter().find(|c| c.path == relative) {
            return Ok((found.clone(), resolved));
        }
        debug!(
            path = %relative,
            %resolved,
            ignored = self.ignore.is_ignored(&relative, false),
            "target is outside the walked set; loading directly"
        );
        Ok((FileCandidate::from_relative(&self.root, &relative)?, resolved))
    }
}

/// Folds `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitError;
    use crate::scope::{FileRole, RenderMode};
    use tempfile::tempdir;

    struct FixedChanges {
        changed: Option<Vec<&'static str>>,
    }

    impl ChangeSource for FixedChanges {
        fn changed_paths(&self, _root: &Path) -> Result<BTreeSet<String>, GitError> {
            match &self.changed {
                Some(paths) => Ok(paths.iter().map(|p| p.to_string()).collect()),
                None => Err(GitError::NotARepo),
            }
        }

        fn activity_paths(&self, root: &Path) -> Result<BTreeSet<String>, GitError> {
            self.changed_paths(root)
        }
    }

    fn touch(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn paths(outcome: &ScopeOutcome) -> Vec<&str> {
        outcome.files.iter().map(|f| f.path()).collect()
    }

    #[test]
    fn test_target_errors() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/a.ts", "");
        let ctx = ScopeContext::open(dir.path(), &[]).unwrap();

        let missing = ScopingDirectives {
            target_path: Some("src/nope.ts".to_string()),
            ..Default::default()
        };
        assert!(matches!(ctx.run(&missing), Err(ScopeError::TargetNotFound(_))));

        let outside = ScopingDirectives {
            target_path: Some("../elsewhere.ts".to_string()),
            ..Default::default()
        };
        assert!(matches!(ctx.run(&outside), Err(ScopeError::TargetOutsideRoot(_))));

        let directory = ScopingDirectives {
            target_path: Some("src".to_string()),
            ..Default::default()
        };
        assert!(matches!(ctx.run(&directory), Err(ScopeError::TargetNotFound(_))));
    }

    #[test]
    fn test_ignored_target_is_still_included() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "dist/bundle.js", "export const x = 1;\n");
        touch(dir.path(), "src/a.ts", "");
        let ctx = ScopeContext::open(dir.path(), &[]).unwrap();
        let outcome = ctx
            .run(&ScopingDirectives {
                target_path: Some("./dist/bundle.js".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(paths(&outcome), vec!["dist/bundle.js", "src/a.ts"]);
        assert_eq!(outcome.files[0].role, FileRole::Target);
    }

    #[test]
    fn test_changed_only_with_fake_source() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/a.ts", "");
        touch(dir.path(), "src/b.ts", "");
        let ctx = ScopeContext::open(dir.path(), &[])
            .unwrap()
            .with_change_source(Box::new(FixedChanges {
                changed: Some(vec!["src/b.ts"]),
            }));
        let outcome = ctx
            .run(&ScopingDirectives {
                changed_only: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(paths(&outcome), vec!["src/b.ts"]);
        assert_eq!(outcome.files[0].role, FileRole::Changed);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_changed_only_falls_back_when_unavailable() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "src/a.ts", "");
        touch(dir.path(), "src/b.ts", "");
        let ctx = ScopeContext::open(dir.path(), &[])
            .unwrap()
            .with_change_source(Box::new(FixedChanges { changed: None }));
        let outcome = ctx
            .run(&ScopingDirectives {
                changed_only: true,
                git_aware: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(paths(&outcome), vec!["src/a.ts", "src/b.ts"]);
        assert!(matches!(outcome.warnings[0], ScopeWarning::ChangesUnavailable(_)));
        assert!(matches!(outcome.warnings[1], ScopeWarning::ActivityUnavailable(_)));
    }

    #[test]
    fn test_git_aware_reports_activity() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "server/app.ts", "");
        touch(dir.path(), "src/pages/index.tsx", "");
        let ctx = ScopeContext::open(dir.path(), &[])
            .unwrap()
            .with_change_source(Box::new(FixedChanges {
                changed: Some(vec!["server/app.ts", ".env"]),
            }));
        let outcome = ctx
            .run(&ScopingDirectives {
                git_aware: true,
                focus_area: crate::scope::FocusArea::Frontend,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(outcome.activity, vec!["server/app.ts".to_string()]);
        assert_eq!(paths(&outcome), vec!["server/app.ts", "src/pages/index.tsx"]);
    }

    #[test]
    fn test_sensitive_target_with_tree_shake() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "config/.env", "TOKEN=abc\nimport './a';\n");
        touch(dir.path(), "config/a.ts", "");
        let ctx = ScopeContext::open(dir.path(), &[]).unwrap();
        let outcome = ctx
            .run(&ScopingDirectives {
                target_path: Some("config/.env".to_string()),
                tree_shake: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(paths(&outcome), vec!["config/.env"]);
        assert_eq!(outcome.files[0].render_mode, RenderMode::Excluded);
        assert_eq!(
            outcome.warnings,
            vec![ScopeWarning::SensitiveTarget("config/.env".to_string())]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_sensitive_target_is_withheld() {
        let dir = tempdir().unwrap();
        touch(dir.path(), ".env", "API_KEY=hunter2\n");
        touch(dir.path(), "src/a.ts", "");
        std::os::unix::fs::symlink(dir.path().join(".env"), dir.path().join("src/settings.ts"))
            .unwrap();
        let ctx = ScopeContext::open(dir.path(), &[]).unwrap();
        let outcome = ctx
            .run(&ScopingDirectives {
                target_path: Some("src/settings.ts".to_string()),
                ..Default::default()
            })
            .unwrap();

        let target = &outcome.files[0];
        assert_eq!(target.path(), "src/settings.ts");
        assert_eq!(target.role, FileRole::Target);
        assert_eq!(target.render_mode, RenderMode::Excluded);
        assert_eq!(
            outcome.warnings,
            vec![ScopeWarning::SensitiveTarget("src/settings.ts".to_string())]
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize(Path::new("/repo/src/../lib/./a.ts")),
            PathBuf::from("/repo/lib/a.ts")
        );
    }
}
