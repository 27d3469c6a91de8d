pub mod bundle;
pub mod config;
pub mod constraints;
pub mod content;
pub mod deps;
pub mod engine;
pub mod error;
pub mod git;
pub mod ignore;
pub mod output;
pub mod profile;
pub mod ranker;
pub mod scope;
pub mod security;
pub mod skeleton;
pub mod tokens;
pub mod tree;
pub mod walker;

pub use bundle::{build_bundle, BundleOptions, ContextBundle};
pub use engine::{ScopeContext, ScopeOutcome};
pub use error::{ScopeError, ScopeWarning};
pub use git::{ChangeSource, GitCli, GitError};
pub use output::OutputFormat;
pub use scope::{FileRole, FocusArea, RenderMode, ScopedFile, ScopingDirectives};

use std::path::Path;

/// Scopes `root` with the `git` binary as change source. Directive
/// combinations that make no sense are reported as warnings, not errors.
pub fn scope_context(
    root: &Path,
    directives: &ScopingDirectives,
) -> Result<ScopeOutcome, ScopeError> {
    let ctx = ScopeContext::open(root, &directives.extra_exclude_globs)?;
    ctx.run(directives)
}
