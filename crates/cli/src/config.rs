use std::path::{Path, PathBuf};

use confparts_validator::ValidatorConfig;
use directories::ProjectDirs;
use eyre::Result;
use serde::{Deserialize, Serialize};
use tokio::fs;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub optional_parts: OptionalPartsConfig,
    #[serde(default)]
    pub validator: ValidatorConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = eyre::Report;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "filesystem" => Ok(StorageBackend::Filesystem),
            "postgres" => Ok(StorageBackend::Postgres),
            other => Err(eyre::eyre!("Unknown storage backend: {}", other)),
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Filesystem => f.write_str("filesystem"),
            StorageBackend::Postgres => f.write_str("postgres"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    pub path: String,
    #[serde(default)]
    pub postgres_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OptionalPartsConfig {
    pub directory: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: get_default_data_dir()
                .join("distributed-files")
                .to_string_lossy()
                .to_string(),
            postgres_url: None,
        }
    }
}

impl Default for OptionalPartsConfig {
    fn default() -> Self {
        Self {
            directory: get_default_config_dir()
                .join("optional-parts")
                .to_string_lossy()
                .to_string(),
        }
    }
}

impl Config {
    pub fn get_config_path() -> PathBuf {
        get_default_config_dir().join("config.json")
    }

    /// Load the configuration, writing the defaults if the file does not exist yet.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map_or_else(Self::get_config_path, Path::to_path_buf);

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save(Some(&config_path)).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&config_path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub async fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = path.map_or_else(Self::get_config_path, Path::to_path_buf);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, content).await?;
        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["storage", "backend"] => {
                self.storage.backend = value.parse()?;
            }
            ["storage", "path"] => {
                self.storage.path = value.to_string();
            }
            ["storage", "postgres_url"] => {
                self.storage.postgres_url = optional(value);
            }
            ["optional_parts", "directory"] => {
                self.optional_parts.directory = value.to_string();
            }
            ["validator", "timeout_secs"] => {
                self.validator.timeout_secs = if value.is_empty() {
                    None
                } else {
                    Some(
                        value
                            .parse::<u64>()
                            .map_err(|_| eyre::eyre!("Invalid number of seconds: {}", value))?,
                    )
                };
            }
            ["validator", "result_path"] => {
                self.validator.result_path = optional(value).map(PathBuf::from);
            }
            _ => {
                return Err(eyre::eyre!("Unknown configuration key: {}", key));
            }
        }

        Ok(())
    }

    pub fn show_all(&self) -> String {
        format!(
            "Configuration:\n\
             Storage:\n\
             ├─ backend: {}\n\
             ├─ path: {}\n\
             └─ postgres_url: {}\n\
             Optional parts:\n\
             └─ directory: {}\n\
             Validator:\n\
             ├─ timeout_secs: {}\n\
             └─ result_path: {}",
            self.storage.backend,
            self.storage.path,
            self.storage.postgres_url.as_deref().unwrap_or("(not set)"),
            self.optional_parts.directory,
            self.validator
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map_or_else(|| "(no timeout)".to_string(), |secs| secs.to_string()),
            self.validator
                .result_path
                .as_ref()
                .map_or_else(|| "(not set)".to_string(), |p| p.display().to_string()),
        )
    }
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Get the default configuration directory
fn get_default_config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("org", "confparts", "confparts") {
        proj_dirs.config_dir().to_path_buf()
    } else {
        PathBuf::from(".confparts").join("config")
    }
}

/// Get the default data directory
fn get_default_data_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("org", "confparts", "confparts") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        PathBuf::from(".confparts").join("data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_value() {
        let mut config = Config::default();

        config.set_value("storage.backend", "Postgres").unwrap();
        config.set_value("storage.postgres_url", "postgres://localhost/conf").unwrap();
        config.set_value("optional_parts.directory", "/etc/parts").unwrap();
        config.set_value("validator.timeout_secs", "15").unwrap();
        config.set_value("validator.result_path", "/tmp/validated").unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(
            config.storage.postgres_url.as_deref(),
            Some("postgres://localhost/conf")
        );
        assert_eq!(config.optional_parts.directory, "/etc/parts");
        assert_eq!(config.validator.timeout_secs, Some(15));
        assert_eq!(
            config.validator.result_path,
            Some(PathBuf::from("/tmp/validated"))
        );

        config.set_value("validator.timeout_secs", "").unwrap();
        assert_eq!(config.validator.timeout_secs, None);
    }

    #[test]
    fn test_set_value_rejects_bad_input() {
        let mut config = Config::default();

        assert!(config.set_value("storage.backend", "sqlite").is_err());
        assert!(config.set_value("validator.timeout_secs", "soon").is_err());
        assert!(config.set_value("export.format", "epub").is_err());
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"storage": {"path": "/var/lib/confparts"}}"#).unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Filesystem);
        assert_eq!(config.storage.path, "/var/lib/confparts");
        assert_eq!(config.validator.timeout_secs, Some(300));
    }

    #[tokio::test]
    async fn test_load_creates_default_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");

        let mut config = Config::load(Some(path.as_path())).await.unwrap();
        assert!(path.exists());

        config.set_value("storage.path", "/srv/confparts").unwrap();
        config.save(Some(path.as_path())).await.unwrap();

        let reloaded = Config::load(Some(path.as_path())).await.unwrap();
        assert_eq!(reloaded.storage.path, "/srv/confparts");
    }
}
