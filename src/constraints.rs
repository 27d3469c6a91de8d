//! Guard rails handed to the prompt layer alongside the scoped files.
//!
//! Tech constraints pin the versions a change must stay compatible with;
//! negative constraints say what a change must not touch.

use crate::profile::package_dependencies;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

const PINNED_PACKAGES: &[(&str, &str)] = &[
    ("next", "Framework (Next.js)"),
    ("react", "Library (React)"),
    ("tailwindcss", "Styling (Tailwind CSS)"),
    ("typescript", "Language (TypeScript)"),
];

const TEST_MARKERS: &[&str] = &["test", "spec", "__tests__", "e2e"];
const LEGACY_MARKERS: &[&str] = &["legacy", "deprecated", "old"];

lazy_static! {
    static ref MAJOR_VERSION: Regex = Regex::new(r"(\d+)").unwrap();
    static ref REQUIRES_PYTHON: Regex =
        Regex::new(r#"requires-python\s*=\s*['"]([^'"]+)['"]"#).unwrap();
}

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints {
    /// Environment pins read from manifests ("hard lock").
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tech: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub negative: Vec<String>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.tech.is_empty() && self.negative.is_empty()
    }
}

/// Version pins from the manifests at `root`. Unreadable or malformed
/// manifests contribute nothing.
pub fn tech_constraints(root: &Path) -> Vec<String> {
    let mut constraints = Vec::new();

    if let Ok(text) = fs::read_to_string(root.join("package.json")) {
        let deps = package_dependencies(&text);
        for (name, label) in PINNED_PACKAGES {
            if let Some(version) = deps.get(*name) {
                constraints.push(format!("{}: {}", label, version));
            }
        }
        if major_version(deps.get("next")).is_some_and(|major| major < 13) {
            constraints.push("Do NOT use Next 13+ App Router features".to_string());
        }
        if major_version(deps.get("tailwindcss")).is_some_and(|major| major < 3) {
            constraints
                .push("Do NOT use Tailwind v3-only features (e.g., arbitrary values)".to_string());
        }
        if deps.contains_key("typescript") {
            constraints.push("Avoid TypeScript features beyond the installed version".to_string());
        }
    }

    if let Ok(text) = fs::read_to_string(root.join("requirements.txt")) {
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let lower = line.to_lowercase();
            if lower.contains("django") {
                constraints.push(format!("Framework (Django): {}", line));
            }
            if lower.contains("flask") {
                constraints.push(format!("Framework (Flask): {}", line));
            }
        }
    }

    if let Ok(text) = fs::read_to_string(root.join("pyproject.toml")) {
        if let Some(caps) = REQUIRES_PYTHON.captures(&text) {
            constraints.push(format!("Python Version: {}", &caps[1]));
        }
    }

    if let Ok(text) = fs::read_to_string(root.join("Cargo.toml")) {
        match text.parse::<toml::Table>() {
            Ok(manifest) => {
                let package = manifest.get("package").and_then(|p| p.as_table());
                if let Some(edition) = package.and_then(|p| p.get("edition")).and_then(|e| e.as_str()) {
                    constraints.push(format!("Rust Edition: {}", edition));
                }
                if let Some(msrv) = package
                    .and_then(|p| p.get("rust-version"))
                    .and_then(|v| v.as_str())
                {
                    constraints.push(format!("Minimum Rust Version: {}", msrv));
                }
            }
            Err(e) => debug!(error = %e, "unparseable Cargo.toml"),
        }
    }

    constraints
}

/// What a change to `target` must leave alone.
pub fn negative_constraints(target: Option<&str>, scope_function: Option<&str>) -> Vec<String> {
    let mut constraints = Vec::new();

    if let Some(target) = target {
        let path = target.replace('\\', "/").to_lowercase();
        if TEST_MARKERS.iter().any(|m| path.contains(m)) {
            constraints.push("Test file: Do NOT change the testing library or framework".to_string());
        }
        if path_words(target).any(|w| LEGACY_MARKERS.contains(&w.as_str())) {
            constraints.push(
                "Legacy file: Do NOT refactor names or restructure existing code".to_string(),
            );
        }
    }

    if let Some(name) = scope_function {
        constraints.push(format!(
            "Scope: ONLY modify the `{}` function. Leave the rest unchanged",
            name
        ));
    }

    constraints
}

/// Lowercase words of `path`, split at separators and camelCase humps, so
/// `src/oldApi/x_deprecated.ts` yields `old`, `api`, `x`, `deprecated`.
fn path_words(path: &str) -> impl Iterator<Item = String> + '_ {
    path.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .flat_map(|part| {
            let mut words = Vec::new();
            let mut current = String::new();
            let mut prev_lower = false;
            for c in part.chars() {
                if c.is_uppercase() && prev_lower && !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                prev_lower = c.is_lowercase() || c.is_ascii_digit();
                current.extend(c.to_lowercase());
            }
            words.push(current);
            words
        })
}

fn major_version(version: Option<&String>) -> Option<u32> {
    let version = version?;
    MAJOR_VERSION
        .captures(version)
        .and_then(|caps| caps[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_package_json_pins() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies": {"next": "^12.3.0", "react": "18.2.0"}, "devDependencies": {"tailwindcss": "~2.2.0", "typescript": "5.4.0"}}"#,
        )
        .unwrap();

        let constraints = tech_constraints(dir.path());
        assert_eq!(
            constraints,
            vec![
                "Framework (Next.js): ^12.3.0",
                "Library (React): 18.2.0",
                "Styling (Tailwind CSS): ~2.2.0",
                "Language (TypeScript): 5.4.0",
                "Do NOT use Next 13+ App Router features",
                "Do NOT use Tailwind v3-only features (e.g., arbitrary values)",
                "Avoid TypeScript features beyond the installed version",
            ]
        );
    }

    #[test]
    fn test_python_pins() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("requirements.txt"),
            "# web\nDjango==4.2\nrequests\nFlask-Login==0.6\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nrequires-python = \">=3.10\"\n",
        )
        .unwrap();

        let constraints = tech_constraints(dir.path());
        assert_eq!(
            constraints,
            vec![
                "Framework (Django): Django==4.2",
                "Framework (Flask): Flask-Login==0.6",
                "Python Version: >=3.10",
            ]
        );
    }

    #[test]
    fn test_cargo_pins() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"x\"\nedition = \"2021\"\nrust-version = \"1.74\"\n",
        )
        .unwrap();
        assert_eq!(
            tech_constraints(dir.path()),
            vec!["Rust Edition: 2021", "Minimum Rust Version: 1.74"]
        );
    }

    #[test]
    fn test_malformed_manifests_are_ignored() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{ not json").unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package\n").unwrap();
        assert!(tech_constraints(dir.path()).is_empty());
    }

    #[test]
    fn test_negative_constraints() {
        assert_eq!(
            negative_constraints(Some("src/__tests__/auth.test.ts"), None),
            vec!["Test file: Do NOT change the testing library or framework"]
        );
        assert_eq!(
            negative_constraints(Some("src/legacy/Billing.js"), Some("charge")),
            vec![
                "Legacy file: Do NOT refactor names or restructure existing code",
                "Scope: ONLY modify the `charge` function. Leave the rest unchanged",
            ]
        );
        assert!(negative_constraints(Some("src/app.ts"), None).is_empty());
        assert!(negative_constraints(Some("lib/oldApi.ts"), None)[0].starts_with("Legacy file"));
        assert!(negative_constraints(None, None).is_empty());
    }

    #[test]
    fn test_legacy_needs_a_whole_word() {
        for path in ["src/folder/x.ts", "src/placeholder.ts", "src/golden.ts", "src/bold-text.tsx"] {
            assert!(negative_constraints(Some(path), None).is_empty(), "{}", path);
        }
        for path in ["src/legacy/billing.ts", "src/old/api.ts", "src/user_deprecated.py", "src/Old.Client.cs"] {
            assert_eq!(
                negative_constraints(Some(path), None),
                vec!["Legacy file: Do NOT refactor names or restructure existing code"],
                "{}",
                path
            );
        }
    }
}
