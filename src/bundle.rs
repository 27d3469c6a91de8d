use crate::constraints::{self, Constraints};
use crate::content::{self, LoadOptions, RenderedFile, SkippedFile};
use crate::engine::ScopeOutcome;
use crate::profile::StyleProfile;
use crate::scope::{FileRole, ScopingDirectives};
use serde::Serialize;
use std::path::Path;

/// Everything the prompt layer receives from one scoping run.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ContextBundle {
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<StyleProfile>,
    #[serde(skip_serializing_if = "Constraints::is_empty")]
    pub constraints: Constraints,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_function: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub activity: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub files_shown: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFile>,
    pub total_lines: usize,
    pub files: Vec<RenderedFile>,
}

#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    pub request: Option<String>,
    pub include_profile: bool,
    /// Read environment pins from the manifests.
    pub hard_lock: bool,
    pub negative_context: bool,
    pub load: LoadOptions,
}

pub fn build_bundle(
    root: &Path,
    outcome: ScopeOutcome,
    directives: &ScopingDirectives,
    options: &BundleOptions,
) -> ContextBundle {
    let loaded = content::load(&outcome.files, options.load);

    let target = outcome
        .files
        .iter()
        .find(|f| f.role == FileRole::Target)
        .map(|f| f.path());
    let constraints = Constraints {
        tech: if options.hard_lock {
            constraints::tech_constraints(root)
        } else {
            Vec::new()
        },
        negative: if options.negative_context {
            constraints::negative_constraints(target, directives.scope_function.as_deref())
        } else {
            Vec::new()
        },
    };

    let profile = if options.include_profile && !outcome.profile.is_empty() {
        Some(outcome.profile)
    } else {
        None
    };

    ContextBundle {
        project: project_name(root),
        request: options.request.clone(),
        profile,
        constraints,
        scope_function: directives.scope_function.clone(),
        activity: outcome.activity,
        warnings: outcome
            .warnings
            .iter()
            .map(|w| w.to_string())
            .chain(loaded.warnings)
            .collect(),
        files_shown: loaded.files.len(),
        skipped: loaded.skipped,
        total_lines: loaded.files.iter().map(|f| f.lines).sum(),
        files: loaded.files,
    }
}

pub fn project_name(root: &Path) -> String {
    root.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("project")
        .to_string()
}
