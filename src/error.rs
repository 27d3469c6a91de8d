use std::path::PathBuf;
use thiserror::Error;

/// Conditions that stop a scoping run.
///
/// Anything recoverable (missing git metadata, unresolvable imports,
/// unbalanced brackets) is reported as a [`ScopeWarning`] instead.
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("cannot read repository root {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("target file not found: {0}")]
    TargetNotFound(String),

    #[error("target file is outside the repository root: {0}")]
    TargetOutsideRoot(String),

    #[error("invalid directives: {0}")]
    InvalidDirectives(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Degradations surfaced to the caller alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeWarning {
    /// The target matched the security denylist and was withheld.
    SensitiveTarget(String),
    /// `changed_only` was requested but the diff collaborator failed.
    ChangesUnavailable(String),
    /// `git_aware` was requested but activity could not be read.
    ActivityUnavailable(String),
    /// A directive had no effect in this combination.
    DirectiveIgnored(&'static str),
    /// The focus area filter removed every candidate.
    NoFocusMatches(String),
    /// A directory below the root could not be read and was skipped.
    UnreadableEntry(String),
}

impl std::fmt::Display for ScopeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScopeWarning::SensitiveTarget(path) => write!(
                f,
                "target {} looks like a secret or credential file; it was not included",
                path
            ),
            ScopeWarning::ChangesUnavailable(msg) => write!(
                f,
                "changed files unavailable ({}); using all eligible files",
                msg
            ),
            ScopeWarning::ActivityUnavailable(msg) => {
                write!(f, "git activity unavailable ({})", msg)
            }
            ScopeWarning::DirectiveIgnored(flag) => {
                write!(f, "{} has no effect without a target file", flag)
            }
            ScopeWarning::NoFocusMatches(area) => {
                write!(f, "no files matched focus area '{}'", area)
            }
            ScopeWarning::UnreadableEntry(path) => write!(f, "skipped unreadable entry {}", path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_errors_are_distinct() {
        let missing = ScopeError::TargetNotFound("src/nope.ts".to_string());
        let outside = ScopeError::TargetOutsideRoot("../etc/passwd".to_string());
        assert!(missing.to_string().contains("not found"));
        assert!(outside.to_string().contains("outside"));
    }

    #[test]
    fn test_warning_display() {
        let w = ScopeWarning::NoFocusMatches("database".to_string());
        assert_eq!(w.to_string(), "no files matched focus area 'database'");

        let w = ScopeWarning::DirectiveIgnored("--tree-shake");
        assert!(w.to_string().starts_with("--tree-shake"));
    }
}
