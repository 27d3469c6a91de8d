//! One-hop import extraction for tree shaking.
//!
//! Each supported language contributes an [`ImportStrategy`] that turns file
//! text into candidate paths. Candidates resolve only against the walked
//! file set, so ignored, sensitive and external modules drop out silently.

use crate::walker::FileCandidate;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use tracing::debug;

/// Import text resolved against one or more base locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Repo-relative base paths to try, in order, before extension and
    /// index probing.
    pub bases: Vec<String>,
}

pub trait ImportStrategy: Sync {
    /// References found in `text` of the file at repo-relative `path`.
    fn references(&self, path: &str, text: &str) -> Vec<Reference>;

    /// Extensions appended to a base that has no exact match.
    fn extensions(&self) -> &'static [&'static str];

    /// File names tried when a base names a directory.
    fn index_files(&self) -> Vec<String>;
}

const SCRIPT_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "vue", "svelte", "json", "css", "scss", "sass", "less",
];

lazy_static! {
    static ref SCRIPT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r#"\bfrom\s*['"]([^'"\n]+)['"]"#).unwrap(),
        Regex::new(r#"\bimport\s*['"]([^'"\n]+)['"]"#).unwrap(),
        Regex::new(r#"\brequire\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#).unwrap(),
        Regex::new(r#"\bimport\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#).unwrap(),
    ];
    static ref PY_FROM: Regex =
        Regex::new(r"(?m)^[ \t]*from[ \t]+(\.*)([\w.]*)[ \t]+import[ \t]+\(?([\w \t,]+)").unwrap();
    static ref PY_IMPORT: Regex =
        Regex::new(r"(?m)^[ \t]*import[ \t]+([\w.]+(?:[ \t]+as[ \t]+\w+)?(?:[ \t]*,[ \t]*[\w.]+(?:[ \t]+as[ \t]+\w+)?)*)").unwrap();
    static ref C_INCLUDE: Regex = Regex::new(r#"(?m)^[ \t]*#[ \t]*include[ \t]*"([^"\n]+)""#).unwrap();
    static ref CSS_IMPORT: Regex =
        Regex::new(r#"@(?:import|use|forward)\s+(?:url\(\s*)?['"]([^'"\n]+)['"]"#).unwrap();
    static ref RUST_MOD: Regex =
        Regex::new(r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?[ \t]+)?mod[ \t]+(\w+)[ \t]*;").unwrap();
}

struct ScriptImports;
struct PythonImports;
struct CIncludes;
struct CssImports;
struct RustModules;

impl ImportStrategy for ScriptImports {
    fn references(&self, path: &str, text: &str) -> Vec<Reference> {
        let dir = parent_dir(path);
        let mut refs = Vec::new();
        for pattern in SCRIPT_PATTERNS.iter() {
            for caps in pattern.captures_iter(text) {
                let spec = &caps[1];
                if spec.starts_with('.') {
                    refs.extend(join(dir, spec).map(|base| Reference { bases: vec![base] }));
                } else if let Some(rest) = spec.strip_prefix("@/").or_else(|| spec.strip_prefix("~/")) {
                    // Common bundler alias for the source root.
                    let bases = [format!("src/{}", rest), rest.to_string()]
                        .into_iter()
                        .filter_map(|b| normalize(&b))
                        .collect();
                    refs.push(Reference { bases });
                }
            }
        }
        refs
    }

    fn extensions(&self) -> &'static [&'static str] {
        SCRIPT_EXTENSIONS
    }

    fn index_files(&self) -> Vec<String> {
        SCRIPT_EXTENSIONS
            .iter()
            .map(|ext| format!("index.{}", ext))
            .collect()
    }
}

impl ImportStrategy for PythonImports {
    fn references(&self, path: &str, text: &str) -> Vec<Reference> {
        let dir = parent_dir(path);
        let mut refs = Vec::new();

        for caps in PY_FROM.captures_iter(text) {
            let dots = caps[1].len();
            let module = caps[2].replace('.', "/");
            let names: Vec<&str> = caps[3]
                .split(',')
                .filter_map(|n| n.split_whitespace().next())
                .collect();

            if dots > 0 {
                let mut base = dir.to_string();
                for _ in 1..dots {
                    base = parent_dir(&base).to_string();
                }
                let package = if module.is_empty() {
                    base
                } else {
                    join_dir(&base, &module)
                };
                if !module.is_empty() {
                    refs.push(Reference {
                        bases: vec![package.clone()],
                    });
                }
                for name in &names {
                    refs.push(Reference {
                        bases: vec![join_dir(&package, name)],
                    });
                }
            } else if !module.is_empty() {
                refs.push(Reference {
                    bases: vec![module.clone(), join_dir(dir, &module)],
                });
                for name in &names {
                    let sub = format!("{}/{}", module, name);
                    refs.push(Reference {
                        bases: vec![sub.clone(), join_dir(dir, &sub)],
                    });
                }
            }
        }

        for caps in PY_IMPORT.captures_iter(text) {
            for item in caps[1].split(',') {
                let Some(module) = item.split_whitespace().next() else {
                    continue;
                };
                let module = module.replace('.', "/");
                refs.push(Reference {
                    bases: vec![module.clone(), join_dir(dir, &module)],
                });
            }
        }

        refs
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn index_files(&self) -> Vec<String> {
        vec!["__init__.py".to_string()]
    }
}

impl ImportStrategy for CIncludes {
    fn references(&self, path: &str, text: &str) -> Vec<Reference> {
        let dir = parent_dir(path);
        C_INCLUDE
            .captures_iter(text)
            .map(|caps| {
                let spec = &caps[1];
                let bases = [join(dir, spec), normalize(spec), normalize(&format!("include/{}", spec))]
                    .into_iter()
                    .flatten()
                    .collect();
                Reference { bases }
            })
            .collect()
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[]
    }

    fn index_files(&self) -> Vec<String> {
        Vec::new()
    }
}

impl ImportStrategy for CssImports {
    fn references(&self, path: &str, text: &str) -> Vec<Reference> {
        let dir = parent_dir(path);
        let mut refs = Vec::new();
        for caps in CSS_IMPORT.captures_iter(text) {
            let spec = &caps[1];
            if spec.contains("://") {
                continue;
            }
            let mut bases: Vec<String> = join(dir, spec).into_iter().collect();
            // Sass partials: `@use 'colors'` may live in `_colors.scss`.
            if let Some(base) = join(dir, spec) {
                let (parent, name) = match base.rsplit_once('/') {
                    Some((p, n)) => (format!("{}/", p), n.to_string()),
                    None => (String::new(), base.clone()),
                };
                bases.push(format!("{}_{}", parent, name));
            }
            refs.push(Reference { bases });
        }
        refs
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["css", "scss", "sass", "less"]
    }

    fn index_files(&self) -> Vec<String> {
        vec!["_index.scss".to_string(), "index.css".to_string()]
    }
}

impl ImportStrategy for RustModules {
    fn references(&self, path: &str, text: &str) -> Vec<Reference> {
        let dir = parent_dir(path);
        let name = path.rsplit('/').next().unwrap_or(path);
        let module_dir = match name {
            "lib.rs" | "main.rs" | "mod.rs" => dir.to_string(),
            _ => join_dir(dir, name.trim_end_matches(".rs")),
        };
        RUST_MOD
            .captures_iter(text)
            .map(|caps| Reference {
                bases: vec![join_dir(&module_dir, &caps[1])],
            })
            .collect()
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn index_files(&self) -> Vec<String> {
        vec!["mod.rs".to_string()]
    }
}

/// Strategy for a lowercase file extension.
pub fn strategy_for(extension: &str) -> Option<&'static dyn ImportStrategy> {
    match extension {
        "ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs" | "mts" | "cts" | "vue" | "svelte" => {
            Some(&ScriptImports)
        }
        "py" | "pyi" => Some(&PythonImports),
        "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" | "m" | "mm" => Some(&CIncludes),
        "css" | "scss" | "sass" | "less" => Some(&CssImports),
        "rs" => Some(&RustModules),
        _ => None,
    }
}

/// Direct dependencies of `target` among `candidates`, sorted by path.
///
/// Unreadable targets, unsupported languages and unresolvable imports all
/// yield fewer results rather than an error.
pub fn dependencies_of(target: &FileCandidate, candidates: &[FileCandidate]) -> Vec<FileCandidate> {
    let Some(strategy) = target.extension.as_deref().and_then(strategy_for) else {
        debug!(path = %target.path, "no import strategy for target");
        return Vec::new();
    };
    let text = match fs::read(&target.absolute_path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!(path = %target.path, error = %e, "cannot read target for imports");
            return Vec::new();
        }
    };

    let index: BTreeMap<&str, &FileCandidate> =
        candidates.iter().map(|c| (c.path.as_str(), c)).collect();
    let mut found = BTreeSet::new();
    for reference in strategy.references(&target.path, &text) {
        match resolve(&reference, strategy, &index) {
            Some(path) if path != target.path => {
                found.insert(path);
            }
            Some(_) => {}
            None => debug!(bases = ?reference.bases, "unresolved import"),
        }
    }

    found
        .iter()
        .filter_map(|p| index.get(p.as_str()).map(|c| (*c).clone()))
        .collect()
}

fn resolve(
    reference: &Reference,
    strategy: &dyn ImportStrategy,
    index: &BTreeMap<&str, &FileCandidate>,
) -> Option<String> {
    for base in &reference.bases {
        if base.is_empty() {
            continue;
        }
        if index.contains_key(base.as_str()) {
            return Some(base.clone());
        }
        for ext in strategy.extensions() {
            let candidate = format!("{}.{}", base, ext);
            if index.contains_key(candidate.as_str()) {
                return Some(candidate);
            }
        }
        for file in strategy.index_files() {
            let candidate = format!("{}/{}", base, file);
            if index.contains_key(candidate.as_str()) {
                return Some(candidate);
            }
        }
    }
    None
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

fn join_dir(dir: &str, rest: &str) -> String {
    if dir.is_empty() {
        rest.to_string()
    } else {
        format!("{}/{}", dir, rest)
    }
}

/// Joins `spec` onto `dir`, folding `.` and `..`; `None` if it climbs above
/// the root.
fn join(dir: &str, spec: &str) -> Option<String> {
    normalize(&join_dir(dir, spec))
}

fn normalize(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) -> FileCandidate {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        FileCandidate::from_relative(root, rel).unwrap()
    }

    fn dep_paths(deps: &[FileCandidate]) -> Vec<&str> {
        deps.iter().map(|d| d.path.as_str()).collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("src/./a/../b").as_deref(), Some("src/b"));
        assert_eq!(normalize("../x"), None);
        assert_eq!(join("src/lib", "../util").as_deref(), Some("src/util"));
    }

    #[test]
    fn test_script_imports_resolve_extensions_and_index() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let target = write(
            root,
            "src/a.ts",
            "import { b } from './b';\nimport './styles.css';\nconst c = require(\"../lib/c\");\nimport React from 'react';\nconst lazy = import('./widgets');\n",
        );
        let candidates = vec![
            target.clone(),
            write(root, "src/b.ts", "export const b = 1;\n"),
            write(root, "src/styles.css", "body {}\n"),
            write(root, "lib/c.js", "module.exports = 1;\n"),
            write(root, "src/widgets/index.tsx", "export {};\n"),
            write(root, "src/unused.ts", "export {};\n"),
        ];

        let deps = dependencies_of(&target, &candidates);
        assert_eq!(
            dep_paths(&deps),
            vec!["lib/c.js", "src/b.ts", "src/styles.css", "src/widgets/index.tsx"]
        );
    }

    #[test]
    fn test_multiline_import() {
        let dir = tempdir().unwrap();
        let target = write(dir.path(), "a.ts", "import {\n  x,\n  y,\n} from './b';\n");
        let candidates = vec![target.clone(), write(dir.path(), "b.ts", "")];
        assert_eq!(dep_paths(&dependencies_of(&target, &candidates)), vec!["b.ts"]);
    }

    #[test]
    fn test_alias_imports() {
        let dir = tempdir().unwrap();
        let target = write(dir.path(), "src/pages/index.tsx", "import Nav from '@/components/Nav';\n");
        let candidates = vec![target.clone(), write(dir.path(), "src/components/Nav.tsx", "")];
        assert_eq!(
            dep_paths(&dependencies_of(&target, &candidates)),
            vec!["src/components/Nav.tsx"]
        );
    }

    #[test]
    fn test_unresolvable_and_outside_candidates_are_dropped() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let target = write(root, "src/a.ts", "import x from './missing';\nimport y from '../../outside';\nimport z from './ignored';\n");
        write(root, "src/ignored.ts", "");
        let candidates = vec![target.clone()];
        assert!(dependencies_of(&target, &candidates).is_empty());
    }

    #[test]
    fn test_python_imports() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let target = write(
            root,
            "app/views.py",
            "import os\nfrom . import forms\nfrom .models import User\nfrom app.services import billing\nimport app.utils as u\n",
        );
        let candidates = vec![
            target.clone(),
            write(root, "app/__init__.py", ""),
            write(root, "app/forms.py", ""),
            write(root, "app/models.py", ""),
            write(root, "app/services/__init__.py", ""),
            write(root, "app/services/billing.py", ""),
            write(root, "app/utils.py", ""),
        ];
        let deps = dependencies_of(&target, &candidates);
        assert_eq!(
            dep_paths(&deps),
            vec![
                "app/forms.py",
                "app/models.py",
                "app/services/__init__.py",
                "app/services/billing.py",
                "app/utils.py"
            ]
        );
    }

    #[test]
    fn test_rust_modules() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let target = write(root, "src/lib.rs", "pub mod engine;\nmod util;\nmod tests {\n}\n");
        let candidates = vec![
            target.clone(),
            write(root, "src/engine.rs", ""),
            write(root, "src/util/mod.rs", ""),
        ];
        assert_eq!(
            dep_paths(&dependencies_of(&target, &candidates)),
            vec!["src/engine.rs", "src/util/mod.rs"]
        );
    }

    #[test]
    fn test_c_includes_and_css_imports() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let c = write(root, "src/main.c", "#include <stdio.h>\n#include \"util.h\"\n");
        let scss = write(root, "styles/app.scss", "@use 'colors';\n@import url('https://fonts.example/x.css');\n");
        let candidates = vec![
            c.clone(),
            scss.clone(),
            write(root, "src/util.h", ""),
            write(root, "styles/_colors.scss", ""),
        ];
        assert_eq!(dep_paths(&dependencies_of(&c, &candidates)), vec!["src/util.h"]);
        assert_eq!(
            dep_paths(&dependencies_of(&scss, &candidates)),
            vec!["styles/_colors.scss"]
        );
    }

    #[test]
    fn test_unsupported_extension_has_no_dependencies() {
        let dir = tempdir().unwrap();
        let target = write(dir.path(), "README.md", "see ./other.md\n");
        assert!(dependencies_of(&target, &[target.clone()]).is_empty());
    }
}
