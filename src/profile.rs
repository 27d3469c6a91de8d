//! Best-effort detection of the project's stack from manifests and file
//! extensions. Nothing here fails: missing signals leave fields unset.

use crate::walker::FileCandidate;
use lazy_static::lazy_static;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StyleProfile {
    pub language: Option<String>,
    pub framework: Option<String>,
    pub styling: Option<String>,
    pub validation: Option<String>,
    pub testing: Option<String>,
    pub patterns: BTreeSet<String>,
}

impl StyleProfile {
    pub fn is_empty(&self) -> bool {
        self.language.is_none()
            && self.framework.is_none()
            && self.styling.is_none()
            && self.validation.is_none()
            && self.testing.is_none()
            && self.patterns.is_empty()
    }
}

lazy_static! {
    static ref EXTENSION_LANGUAGES: BTreeMap<&'static str, &'static str> = {
        let mut m = BTreeMap::new();
        m.insert("ts", "typescript");
        m.insert("tsx", "typescript");
        m.insert("js", "javascript");
        m.insert("jsx", "javascript");
        m.insert("mjs", "javascript");
        m.insert("cjs", "javascript");
        m.insert("py", "python");
        m.insert("rs", "rust");
        m.insert("go", "go");
        m.insert("java", "java");
        m.insert("kt", "kotlin");
        m.insert("rb", "ruby");
        m.insert("php", "php");
        m.insert("cs", "csharp");
        m.insert("swift", "swift");
        m.insert("c", "c");
        m.insert("h", "c");
        m.insert("cpp", "c++");
        m.insert("cc", "c++");
        m.insert("hpp", "c++");
        m
    };
}

// First match wins within each table.
const JS_FRAMEWORKS: &[(&str, &str)] = &[
    ("next", "Next.js"),
    ("nuxt", "Nuxt"),
    ("@angular/core", "Angular"),
    ("@sveltejs/kit", "SvelteKit"),
    ("svelte", "Svelte"),
    ("vue", "Vue"),
    ("react", "React"),
    ("@nestjs/core", "NestJS"),
    ("express", "Express"),
    ("fastify", "Fastify"),
];
const JS_STYLING: &[(&str, &str)] = &[
    ("tailwindcss", "Tailwind CSS"),
    ("styled-components", "styled-components"),
    ("@emotion/react", "Emotion"),
    ("sass", "Sass"),
];
const JS_VALIDATION: &[(&str, &str)] = &[
    ("zod", "Zod"),
    ("yup", "Yup"),
    ("joi", "Joi"),
    ("class-validator", "class-validator"),
];
const JS_TESTING: &[(&str, &str)] = &[
    ("jest", "jest"),
    ("vitest", "vitest"),
    ("mocha", "mocha"),
    ("@playwright/test", "playwright"),
    ("cypress", "cypress"),
];
const PY_FRAMEWORKS: &[(&str, &str)] = &[
    ("django", "Django"),
    ("fastapi", "FastAPI"),
    ("flask", "Flask"),
];
const RUST_FRAMEWORKS: &[(&str, &str)] = &[
    ("axum", "Axum"),
    ("actix-web", "Actix Web"),
    ("rocket", "Rocket"),
    ("warp", "Warp"),
];
const GO_FRAMEWORKS: &[(&str, &str)] = &[
    ("github.com/gin-gonic/gin", "Gin"),
    ("github.com/labstack/echo", "Echo"),
    ("github.com/gofiber/fiber", "Fiber"),
];

const MAX_PATTERN_SAMPLES: usize = 10;

#[derive(Default)]
struct Signals {
    languages: Vec<&'static str>,
    profile: StyleProfile,
}

impl Signals {
    fn language(&mut self, lang: &'static str) {
        if !self.languages.contains(&lang) {
            self.languages.push(lang);
        }
    }

    fn set_once(field: &mut Option<String>, value: Option<&str>) {
        if field.is_none() {
            *field = value.map(String::from);
        }
    }
}

pub fn profile(candidates: &[FileCandidate]) -> StyleProfile {
    let manifests: BTreeMap<&str, &FileCandidate> = candidates
        .iter()
        .filter(|c| !c.path.contains('/'))
        .map(|c| (c.path.as_str(), c))
        .collect();

    let mut signals = Signals::default();

    if let Some(text) = manifests.get("package.json").and_then(|c| read(c)) {
        inspect_package_json(&text, &mut signals);
    }
    for name in ["requirements.txt", "pyproject.toml", "setup.py", "Pipfile"] {
        if let Some(text) = manifests.get(name).and_then(|c| read(c)) {
            inspect_python_manifest(&text, &mut signals);
        }
    }
    if let Some(text) = manifests.get("Cargo.toml").and_then(|c| read(c)) {
        inspect_cargo_toml(&text, &mut signals);
    }
    if let Some(text) = manifests.get("go.mod").and_then(|c| read(c)) {
        signals.language("go");
        let found = first_match(GO_FRAMEWORKS, |dep| text.contains(dep));
        Signals::set_once(&mut signals.profile.framework, found);
    }
    for name in ["pom.xml", "build.gradle", "build.gradle.kts"] {
        if let Some(text) = manifests.get(name).and_then(|c| read(c)) {
            signals.language(if name.ends_with(".kts") { "kotlin" } else { "java" });
            if text.contains("spring-boot") {
                Signals::set_once(&mut signals.profile.framework, Some("Spring Boot"));
            }
        }
    }
    if let Some(text) = manifests.get("Gemfile").and_then(|c| read(c)) {
        signals.language("ruby");
        if text.contains("rails") {
            Signals::set_once(&mut signals.profile.framework, Some("Rails"));
        }
    }

    let histogram = language_histogram(candidates);
    let language = match signals.languages.as_slice() {
        [] => most_common(&histogram),
        [only] => Some(*only),
        several => several
            .iter()
            .copied()
            .max_by(|a, b| {
                let ca = histogram.get(a).copied().unwrap_or(0);
                let cb = histogram.get(b).copied().unwrap_or(0);
                // Ties resolve to the earlier manifest.
                ca.cmp(&cb).then(std::cmp::Ordering::Greater)
            }),
    };

    let mut profile = signals.profile;
    profile.language = language.map(String::from);
    detect_patterns(candidates, &mut profile);

    debug!(?profile, "style profile");
    profile
}

fn read(candidate: &FileCandidate) -> Option<String> {
    fs::read_to_string(&candidate.absolute_path).ok()
}

fn first_match<'a>(
    table: &'a [(&'a str, &'a str)],
    mut present: impl FnMut(&str) -> bool,
) -> Option<&'a str> {
    table
        .iter()
        .find(|(dep, _)| present(dep))
        .map(|(_, label)| *label)
}

/// `dependencies` and `devDependencies` of a package.json, merged.
pub fn package_dependencies(text: &str) -> BTreeMap<String, String> {
    let mut deps = BTreeMap::new();
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return deps;
    };
    for key in ["dependencies", "devDependencies"] {
        if let Some(table) = value.get(key).and_then(|v| v.as_object()) {
            for (name, version) in table {
                let version = version.as_str().unwrap_or("").to_string();
                deps.insert(name.clone(), version);
            }
        }
    }
    deps
}

fn inspect_package_json(text: &str, signals: &mut Signals) {
    let deps = package_dependencies(text);
    signals.language(if deps.contains_key("typescript") {
        "typescript"
    } else {
        "javascript"
    });

    let has = |dep: &str| deps.contains_key(dep);
    let profile = &mut signals.profile;
    Signals::set_once(&mut profile.framework, first_match(JS_FRAMEWORKS, has));
    Signals::set_once(&mut profile.styling, first_match(JS_STYLING, has));
    Signals::set_once(&mut profile.validation, first_match(JS_VALIDATION, has));
    Signals::set_once(&mut profile.testing, first_match(JS_TESTING, has));
}

fn inspect_python_manifest(text: &str, signals: &mut Signals) {
    signals.language("python");
    let lower = text.to_lowercase();
    let profile = &mut signals.profile;
    let found = first_match(PY_FRAMEWORKS, |dep| lower.contains(dep));
    Signals::set_once(&mut profile.framework, found);
    if lower.contains("pydantic") {
        Signals::set_once(&mut profile.validation, Some("Pydantic"));
    }
    if lower.contains("pytest") {
        Signals::set_once(&mut profile.testing, Some("pytest"));
    }
}

fn inspect_cargo_toml(text: &str, signals: &mut Signals) {
    signals.language("rust");
    let Ok(value) = text.parse::<toml::Table>() else {
        return;
    };
    let mut deps = BTreeSet::new();
    for key in ["dependencies", "dev-dependencies"] {
        if let Some(table) = value.get(key).and_then(|v| v.as_table()) {
            deps.extend(table.keys().cloned());
        }
    }

    let profile = &mut signals.profile;
    let found = first_match(RUST_FRAMEWORKS, |dep| deps.contains(dep));
    Signals::set_once(&mut profile.framework, found);
    if deps.contains("validator") {
        Signals::set_once(&mut profile.validation, Some("validator"));
    }
    if deps.contains("proptest") {
        Signals::set_once(&mut profile.testing, Some("proptest"));
    }
}

fn language_histogram(candidates: &[FileCandidate]) -> BTreeMap<&'static str, usize> {
    let mut histogram = BTreeMap::new();
    for candidate in candidates {
        let Some(ext) = candidate.extension.as_deref() else {
            continue;
        };
        if let Some(lang) = EXTENSION_LANGUAGES.get(ext) {
            *histogram.entry(*lang).or_insert(0) += 1;
        }
    }
    histogram
}

fn most_common(histogram: &BTreeMap<&'static str, usize>) -> Option<&'static str> {
    let mut best: Option<(&'static str, usize)> = None;
    for (lang, count) in histogram {
        if best.map(|(_, c)| *count > c).unwrap_or(true) {
            best = Some((*lang, *count));
        }
    }
    best.map(|(lang, _)| lang)
}

fn detect_patterns(candidates: &[FileCandidate], profile: &mut StyleProfile) {
    let mut arrows = 0;
    let mut functions = 0;
    let samples = candidates
        .iter()
        .filter(|c| matches!(c.extension.as_deref(), Some("ts" | "tsx" | "js" | "jsx")))
        .take(MAX_PATTERN_SAMPLES);

    for candidate in samples {
        if let Some(text) = read(candidate) {
            arrows += text.matches("=>").count();
            functions += text.matches("function ").count();
        }
    }

    if arrows > 0 && arrows > functions * 2 {
        profile.patterns.insert("Prefers arrow functions".to_string());
    }
}
