use crate::error::{ScopeError, ScopeWarning};
use crate::security;
use crate::walker::FileCandidate;
use lazy_static::lazy_static;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_MAX_FILES: usize = 30;

lazy_static! {
    static ref CONFIG_FILES: HashSet<&'static str> = [
        "package.json",
        "tsconfig.json",
        "jsconfig.json",
        "vite.config.js",
        "vite.config.ts",
        "next.config.js",
        "next.config.mjs",
        "tailwind.config.js",
        "tailwind.config.ts",
        "webpack.config.js",
        "Cargo.toml",
        "go.mod",
        "requirements.txt",
        "pyproject.toml",
        "setup.py",
        "Pipfile",
        "Gemfile",
        "pom.xml",
        "build.gradle",
        "build.gradle.kts",
        "composer.json",
        "Dockerfile",
        "docker-compose.yml",
        "Makefile",
        "CMakeLists.txt",
    ]
    .into_iter()
    .collect();
    static ref TEST_DIRS: Vec<&'static str> = vec!["test", "tests", "spec", "__tests__", "e2e"];
}

struct FocusSignature {
    dirs: &'static [&'static str],
    extensions: &'static [&'static str],
    names: &'static [&'static str],
}

const FRONTEND: FocusSignature = FocusSignature {
    dirs: &[
        "frontend",
        "client",
        "components",
        "pages",
        "app",
        "public",
        "styles",
        "views",
        "layouts",
        "hooks",
        "ui",
        "assets",
    ],
    extensions: &["css", "scss", "sass", "less", "vue", "svelte", "jsx", "tsx", "html"],
    names: &[],
};

const BACKEND: FocusSignature = FocusSignature {
    dirs: &[
        "backend",
        "server",
        "api",
        "routes",
        "controllers",
        "services",
        "models",
        "handlers",
        "middleware",
    ],
    extensions: &[],
    names: &[],
};

const DATABASE: FocusSignature = FocusSignature {
    dirs: &["prisma", "migrations", "schema", "db", "database", "sql"],
    extensions: &["sql", "prisma"],
    names: &["schema.rb", "models.py", "knexfile.js"],
};

const CONFIG: FocusSignature = FocusSignature {
    dirs: &["config", "configs", ".github"],
    extensions: &[],
    names: &[".eslintrc", ".eslintrc.js", ".eslintrc.json", ".prettierrc", ".babelrc"],
};

/// Coarse repository area a request is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusArea {
    #[default]
    None,
    Frontend,
    Backend,
    Database,
    Config,
    Tests,
}

impl FocusArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusArea::None => "none",
            FocusArea::Frontend => "frontend",
            FocusArea::Backend => "backend",
            FocusArea::Database => "database",
            FocusArea::Config => "config",
            FocusArea::Tests => "tests",
        }
    }

    /// Whether a repo-relative path belongs to this area. `None` admits
    /// everything.
    pub fn matches(&self, path: &str) -> bool {
        let signature = match self {
            FocusArea::None => return true,
            FocusArea::Tests => return is_test_path(path),
            FocusArea::Frontend => &FRONTEND,
            FocusArea::Backend => &BACKEND,
            FocusArea::Database => &DATABASE,
            FocusArea::Config => {
                if is_config_file(path) || is_tool_config(file_name(path)) {
                    return true;
                }
                &CONFIG
            }
        };
        signature_matches(signature, path)
    }
}

impl fmt::Display for FocusArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FocusArea {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(FocusArea::None),
            "frontend" => Ok(FocusArea::Frontend),
            "backend" => Ok(FocusArea::Backend),
            "database" | "db" => Ok(FocusArea::Database),
            "config" => Ok(FocusArea::Config),
            "tests" | "test" => Ok(FocusArea::Tests),
            _ => Err(format!(
                "Invalid focus: {}. Use frontend, backend, database, config, tests, or none",
                s
            )),
        }
    }
}

fn signature_matches(signature: &FocusSignature, path: &str) -> bool {
    let name = file_name(path);
    let in_dir = path
        .split('/')
        .rev()
        .skip(1)
        .any(|dir| signature.dirs.contains(&dir));
    let ext_match = name
        .rsplit_once('.')
        .map(|(_, ext)| signature.extensions.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    in_dir || ext_match || signature.names.contains(&name)
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn is_test_path(path: &str) -> bool {
    let name = file_name(path);
    if name.starts_with("test_")
        || name.contains("_test.")
        || name.contains(".test.")
        || name.contains(".spec.")
    {
        return true;
    }
    path.split('/')
        .rev()
        .skip(1)
        .any(|dir| TEST_DIRS.contains(&dir))
}

fn is_tool_config(name: &str) -> bool {
    // vite.config.ts, jest.config.js, babel.config.cjs, ...
    name.split('.').nth(1) == Some("config")
}

/// Well-known build and project manifests, at any depth.
pub fn is_config_file(path: &str) -> bool {
    CONFIG_FILES.contains(file_name(path))
}

/// Caller-supplied knobs for one scoping run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopingDirectives {
    pub focus_area: FocusArea,
    pub changed_only: bool,
    /// Pull in files with staged or unstaged edits alongside the scoped set.
    pub git_aware: bool,
    pub target_path: Option<String>,
    pub tree_shake: bool,
    pub skeleton_context: bool,
    pub scope_function: Option<String>,
    pub max_files: usize,
    pub extra_exclude_globs: Vec<String>,
}

impl Default for ScopingDirectives {
    fn default() -> Self {
        ScopingDirectives {
            focus_area: FocusArea::None,
            changed_only: false,
            git_aware: false,
            target_path: None,
            tree_shake: false,
            skeleton_context: false,
            scope_function: None,
            max_files: DEFAULT_MAX_FILES,
            extra_exclude_globs: Vec::new(),
        }
    }
}

impl ScopingDirectives {
    /// Strict check used by front ends. The engine itself tolerates these
    /// combinations and reports them as warnings.
    pub fn validate(&self) -> Result<(), ScopeError> {
        if self.max_files == 0 {
            return Err(ScopeError::InvalidDirectives(
                "max files must be at least 1".to_string(),
            ));
        }
        if self.target_path.is_none() {
            if self.tree_shake {
                return Err(ScopeError::InvalidDirectives(
                    "--tree-shake requires --target".to_string(),
                ));
            }
            if self.skeleton_context {
                return Err(ScopeError::InvalidDirectives(
                    "--skeleton-context requires --target".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Why a file made it into the scoped set. Declaration order is priority
/// order: lower sorts first and is dropped last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    Target,
    Dependency,
    Changed,
    Config,
    Normal,
}

impl FileRole {
    /// Roles the file budget never truncates.
    pub fn is_required(&self) -> bool {
        matches!(self, FileRole::Target | FileRole::Dependency)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileRole::Target => "target",
            FileRole::Dependency => "dependency",
            FileRole::Changed => "changed",
            FileRole::Config => "config",
            FileRole::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Full,
    Skeleton,
    /// Listed but never read.
    Excluded,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Full => "full",
            RenderMode::Skeleton => "skeleton",
            RenderMode::Excluded => "excluded",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedFile {
    pub candidate: FileCandidate,
    pub role: FileRole,
    pub render_mode: RenderMode,
}

impl ScopedFile {
    pub fn path(&self) -> &str {
        &self.candidate.path
    }
}

/// Everything the resolver needs besides the directives.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScopeInputs<'a> {
    /// Walked candidates, already free of ignored and sensitive paths.
    pub candidates: &'a [FileCandidate],
    pub target: Option<&'a FileCandidate>,
    /// Direct dependencies of the target; `Some` only when tree shaking.
    pub dependencies: Option<&'a [FileCandidate]>,
    /// `None` when no change filter applies.
    pub changed: Option<&'a BTreeSet<String>>,
    /// Files with uncommitted edits, admitted regardless of filters.
    pub activity: Option<&'a BTreeSet<String>>,
    /// The target resolves to a sensitive file under another name.
    pub withhold_target: bool,
}

#[derive(Debug, Default)]
pub struct Resolution {
    pub files: Vec<ScopedFile>,
    pub warnings: Vec<ScopeWarning>,
}

/// Applies focus, change and target directives to the candidate set.
///
/// Output is sorted by path, holds each path at most once, and never
/// contains a sensitive path except a withheld target.
pub fn resolve(inputs: &ScopeInputs, directives: &ScopingDirectives) -> Resolution {
    let mut resolution = Resolution::default();
    let target = inputs.target;

    if target.is_none() {
        if directives.tree_shake {
            resolution
                .warnings
                .push(ScopeWarning::DirectiveIgnored("tree shaking"));
        }
        if directives.skeleton_context {
            resolution
                .warnings
                .push(ScopeWarning::DirectiveIgnored("skeleton context"));
        }
    }

    let context_mode = if target.is_some() && directives.skeleton_context {
        RenderMode::Skeleton
    } else {
        RenderMode::Full
    };

    if let Some(target) = target {
        let render_mode = if inputs.withhold_target || security::is_sensitive(&target.path) {
            RenderMode::Excluded
        } else {
            RenderMode::Full
        };
        resolution.files.push(ScopedFile {
            candidate: target.clone(),
            role: FileRole::Target,
            render_mode,
        });
    }
    let target_path = target.map(|t| t.path.as_str());

    if let (Some(_), Some(dependencies)) = (target, inputs.dependencies) {
        for dep in dependencies {
            if Some(dep.path.as_str()) == target_path || security::is_sensitive(&dep.path) {
                continue;
            }
            resolution.files.push(ScopedFile {
                candidate: dep.clone(),
                role: FileRole::Dependency,
                render_mode: context_mode,
            });
        }
        finish(&mut resolution.files);
        debug!(count = resolution.files.len(), "resolved tree-shaken scope");
        return resolution;
    }

    let activity = inputs.activity;
    let mut focus_hits = 0usize;
    for candidate in inputs.candidates {
        let path = candidate.path.as_str();
        if Some(path) == target_path || security::is_sensitive(path) {
            continue;
        }

        let active = activity.map(|a| a.contains(path)).unwrap_or(false);
        let focused = directives.focus_area.matches(path);
        if focused {
            focus_hits += 1;
        }
        let changed = match inputs.changed {
            Some(set) => set.contains(path),
            None => true,
        };
        if !active && !(focused && changed) {
            continue;
        }

        let role = if active || (inputs.changed.is_some() && changed) {
            FileRole::Changed
        } else if is_config_file(path) {
            FileRole::Config
        } else {
            FileRole::Normal
        };
        resolution.files.push(ScopedFile {
            candidate: candidate.clone(),
            role,
            render_mode: context_mode,
        });
    }

    if directives.focus_area != FocusArea::None && focus_hits == 0 && !inputs.candidates.is_empty()
    {
        resolution.warnings.push(ScopeWarning::NoFocusMatches(
            directives.focus_area.to_string(),
        ));
    }

    finish(&mut resolution.files);
    debug!(count = resolution.files.len(), "resolved scope");
    resolution
}

fn finish(files: &mut Vec<ScopedFile>) {
    files.sort_by(|a, b| a.candidate.path.cmp(&b.candidate.path));
    files.dedup_by(|a, b| a.candidate.path == b.candidate.path);
}
