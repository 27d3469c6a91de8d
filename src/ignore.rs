use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const TOOL_IGNORE_FILE: &str = ".contextifyignore";

const BUILTIN_RULES: &str = r#"# Dependency directories
node_modules/
bower_components/
vendor/
venv/
env/
__pycache__/

# Build output
dist/
build/
out/
target/
coverage/

# Lock files and generated output
*.lock
package-lock.json
pnpm-lock.yaml
*.min.js
*.min.css
*.map
*.pyc
"#;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct IgnoreRule {
    pattern: Pattern,
    negated: bool,
    dir_only: bool,
    /// Path of the scanned root relative to the directory holding the
    /// ignore file; empty when they coincide.
    base: String,
}

impl IgnoreRule {
    fn parse(line: &str, base: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let body = body.strip_prefix('\\').unwrap_or(body);

        let dir_only = body.ends_with('/');
        let body = body.trim_end_matches('/');
        if body.is_empty() {
            return None;
        }

        let glob = if body.starts_with("**/") {
            body.to_string()
        } else if let Some(anchored) = body.strip_prefix('/') {
            anchored.to_string()
        } else if body.contains('/') {
            body.to_string()
        } else {
            format!("**/{}", body)
        };

        match Pattern::new(&glob) {
            Ok(pattern) => Some(IgnoreRule {
                pattern,
                negated,
                dir_only,
                base: base.to_string(),
            }),
            Err(e) => {
                debug!(line, error = %e, "skipping malformed ignore pattern");
                None
            }
        }
    }

    fn matches(&self, path: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        if self.base.is_empty() {
            self.pattern.matches_with(path, MATCH_OPTIONS)
        } else {
            let full = format!("{}/{}", self.base, path);
            self.pattern.matches_with(&full, MATCH_OPTIONS)
        }
    }
}

/// Union of built-in exclusions, version-control ignore files and
/// user-supplied globs, compiled once per scoping run.
#[derive(Debug, Clone, Default)]
pub struct IgnorePolicy {
    /// Built-in and user rules: any match ignores.
    always: Vec<IgnoreRule>,
    /// Ignore-file rules: last match wins, `!` re-includes.
    layered: Vec<IgnoreRule>,
}

impl IgnorePolicy {
    pub fn load(root: &Path, extra_globs: &[String]) -> Self {
        let mut policy = IgnorePolicy::default();

        policy.always.extend(parse_lines(BUILTIN_RULES, ""));
        for glob in extra_globs {
            policy
                .always
                .extend(IgnoreRule::parse(glob, "").filter(|r| !r.negated));
        }

        for (file, base) in vcs_ignore_files(root) {
            if let Ok(content) = fs::read_to_string(&file) {
                debug!(file = %file.display(), "loaded ignore file");
                policy.layered.extend(parse_lines(&content, &base));
            }
        }

        if let Some(home) = dirs::home_dir() {
            if let Ok(content) = fs::read_to_string(home.join(TOOL_IGNORE_FILE)) {
                policy.layered.extend(parse_lines(&content, ""));
            }
        }
        if let Ok(content) = fs::read_to_string(root.join(TOOL_IGNORE_FILE)) {
            policy.layered.extend(parse_lines(&content, ""));
        }

        policy
    }

    /// Full-path check for callers outside the walk: `path` and each of its
    /// ancestor directories are tested. `path` is repo-relative with `/`
    /// separators.
    pub fn is_ignored(&self, path: &str, is_dir: bool) -> bool {
        let mut end = 0;
        while let Some(pos) = path[end..].find('/') {
            let ancestor = &path[..end + pos];
            if self.matches(ancestor, true) {
                return true;
            }
            end += pos + 1;
        }
        self.matches(path, is_dir)
    }

    /// Checks `path` alone, assuming its ancestors were already admitted.
    /// The walker uses this while descending.
    pub fn matches(&self, path: &str, is_dir: bool) -> bool {
        if is_dir && is_hidden(path) {
            return true;
        }
        if self.always.iter().any(|r| r.matches(path, is_dir)) {
            return true;
        }

        let mut ignored = false;
        for rule in &self.layered {
            if rule.matches(path, is_dir) {
                ignored = !rule.negated;
            }
        }
        ignored
    }
}

fn is_hidden(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .map(|name| name.starts_with('.') && name != "." && name != "..")
        .unwrap_or(false)
}

fn parse_lines(content: &str, base: &str) -> Vec<IgnoreRule> {
    content
        .lines()
        .filter_map(|line| IgnoreRule::parse(line, base))
        .collect()
}

/// Ignore files from the repository top down to `root`, outermost first so
/// that rules closer to the root take precedence.
fn vcs_ignore_files(root: &Path) -> Vec<(PathBuf, String)> {
    let mut found = Vec::new();
    let mut components: Vec<String> = Vec::new();
    let mut dir = root.to_path_buf();
    let mut reached_repo_top = false;

    loop {
        let base = components.join("/");
        let gitignore = dir.join(".gitignore");
        if gitignore.is_file() {
            found.push((gitignore, base.clone()));
        }
        if dir.join(".git").exists() {
            let exclude = dir.join(".git").join("info").join("exclude");
            if exclude.is_file() {
                found.push((exclude, base));
            }
            reached_repo_top = true;
            break;
        }

        let name = match dir.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => break,
        };
        match dir.parent() {
            Some(parent) => {
                components.insert(0, name);
                dir = parent.to_path_buf();
            }
            None => break,
        }
    }

    if !reached_repo_top {
        // Outside a repository only the root's own ignore file applies.
        found.retain(|(_, base)| base.is_empty());
    }

    found.reverse();
    found
}
