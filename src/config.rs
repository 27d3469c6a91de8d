use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const REPO_CONFIG_FILE: &str = ".contextify.toml";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub max_files: Option<usize>,
    pub exclude: Option<Vec<String>>,
    pub format: Option<String>,
    pub no_color: Option<bool>,
    pub jobs: Option<usize>,
    pub tokens: Option<bool>,
}

impl Config {
    pub fn merge(&mut self, other: Config) {
        if other.max_files.is_some() {
            self.max_files = other.max_files;
        }
        if other.exclude.is_some() {
            self.exclude = other.exclude;
        }
        if other.format.is_some() {
            self.format = other.format;
        }
        if other.no_color.is_some() {
            self.no_color = other.no_color;
        }
        if other.jobs.is_some() {
            self.jobs = other.jobs;
        }
        if other.tokens.is_some() {
            self.tokens = other.tokens;
        }
    }
}

pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".contextify").join("config.toml"))
}

/// Global `~/.contextify/config.toml`, then `<root>/.contextify.toml`.
/// Later layers override earlier ones field by field; unreadable or
/// malformed files are skipped.
pub fn load_config(root: &Path) -> Config {
    let mut config = Config::default();
    let layers = [global_config_path(), Some(root.join(REPO_CONFIG_FILE))];
    for path in layers.into_iter().flatten() {
        if let Some(layer) = read_layer(&path) {
            config.merge(layer);
        }
    }
    config
}

fn read_layer(path: &Path) -> Option<Config> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str::<Config>(&content) {
        Ok(config) => {
            debug!(path = %path.display(), "loaded config");
            Some(config)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed config");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_parsing() {
        let toml_str = r#"
            max_files = 12
            exclude = ["*.snap", "fixtures/"]
            format = "json"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_files, Some(12));
        assert_eq!(
            config.exclude,
            Some(vec!["*.snap".to_string(), "fixtures/".to_string()])
        );
        assert_eq!(config.format.as_deref(), Some("json"));
        assert_eq!(config.tokens, None);
    }

    #[test]
    fn test_config_merge() {
        let mut c1 = Config {
            max_files: Some(30),
            jobs: Some(4),
            ..Config::default()
        };
        let c2 = Config {
            max_files: Some(8),
            ..Config::default()
        };
        c1.merge(c2);
        assert_eq!(c1.max_files, Some(8));
        assert_eq!(c1.jobs, Some(4));
    }

    #[test]
    fn test_repo_layer_and_malformed_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(REPO_CONFIG_FILE), "no_color = true\n").unwrap();
        let config = load_config(dir.path());
        assert_eq!(config.no_color, Some(true));

        fs::write(dir.path().join(REPO_CONFIG_FILE), "max_files = \"many\"\n").unwrap();
        assert!(read_layer(&dir.path().join(REPO_CONFIG_FILE)).is_none());
    }
}
