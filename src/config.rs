use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the current directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = ".pr-fixtures.toml";

/// Where the fixture lands when neither the CLI nor the config names a path.
pub const DEFAULT_OUTPUT: &str = "fixtures/branches.json";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-fixtures.toml.
/// All fields are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Repository passed to `gh --repo` (e.g. "org/repo"). Defaults to the
    /// repository of the current directory.
    pub repo: Option<String>,

    /// Fixture output path
    pub output: Option<PathBuf>,

    /// PR numbers to export when none are given on the command line
    #[serde(default)]
    pub pr_numbers: Vec<u64>,

    /// Chat-completion settings used by `--summarize`
    #[serde(default)]
    pub openai: OpenAiConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiConfig {
    /// API key. If None, falls back to OPENAI_API_KEY env var.
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from `path`, or from .pr-fixtures.toml in the current
    /// directory. A missing default file yields the default config; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::load_from(path)?
                } else {
                    Config::default()
                }
            }
        };

        if config.openai.api_key.is_none() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                config.openai.api_key = Some(key);
            }
        }

        Ok(config)
    }

    /// Load from a specific path without consulting the environment.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
    }

    pub fn model(&self) -> &str {
        self.openai.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn base_url(&self) -> &str {
        self.openai.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.repo.is_none());
        assert!(config.pr_numbers.is_empty());
        assert!(config.openai.api_key.is_none());
        assert_eq!(config.output_path(), PathBuf::from("fixtures/branches.json"));
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
repo = "org/repo"
output = "out/fixture.json"
pr_numbers = [12, 15, 31]

[openai]
model = "gpt-4o"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.repo.as_deref(), Some("org/repo"));
        assert_eq!(config.pr_numbers, vec![12, 15, 31]);
        assert_eq!(config.output_path(), PathBuf::from("out/fixture.json"));
        assert_eq!(config.model(), "gpt-4o");
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "pr_numbers = [7]\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.pr_numbers, vec![7]);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            Config::load(Some(path.as_path())),
            Err(ConfigError::FileRead(_))
        ));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "pr_numbers = \"nope\"\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }
}
