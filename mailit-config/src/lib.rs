// Settings management for mailit

pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use settings::{Contact, MailSettings, Site};
pub use validation::{ConfigValidator, Validate};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Layered key/value store that settings are deserialized from.
///
/// Later loads overwrite earlier keys, so load files first and the
/// environment last.
#[derive(Clone)]
pub struct ConfigManager {
    config: Arc<RwLock<HashMap<String, serde_json::Value>>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(HashMap::new())),
            env_prefix: None,
        }
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: String) -> Self {
        Self {
            config: Arc::new(RwLock::new(HashMap::new())),
            env_prefix: Some(prefix),
        }
    }

    /// Load configuration from environment variables
    pub fn load_env(&self) -> Result<()> {
        let loader = EnvLoader::new(self.env_prefix.clone());
        let env_vars = loader.load()?;

        let mut config = self.config.write();
        for (key, value) in env_vars {
            config.insert(key, serde_json::Value::String(value));
        }

        Ok(())
    }

    /// Load configuration from .env file, then the environment
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        if let Some(path) = path {
            dotenvy::from_path(path).map_err(|e| ConfigError::Load(e.to_string()))?;
        } else {
            dotenvy::dotenv().ok();
        }
        self.load_env()
    }

    /// Load configuration from file
    pub fn load_file(&self, path: impl AsRef<Path>, format: FileFormat) -> Result<()> {
        let loader = ConfigLoader::new(format);
        let data = loader.load_file(path)?;

        if let serde_json::Value::Object(map) = data {
            let mut config = self.config.write();
            for (key, value) in map {
                config.insert(key, value);
            }
        }

        Ok(())
    }

    /// Deserialize everything loaded so far into `T` and validate it
    pub fn load_validated<T: DeserializeOwned + Validate>(&self) -> Result<T> {
        let json_value = serde_json::Value::Object(
            self.config
                .read()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );

        let validated: T = serde_json::from_value(json_value)
            .map_err(|e| ConfigError::Malformed(e.to_string()))?;

        validated.validate()?;

        Ok(validated)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn settings_file(ext: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{}", ext))
            .tempfile()
            .unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_validated_settings() {
        let file = settings_file("json", r#"{"api_key": "secret", "site_domain": "example.org"}"#);
        let manager = ConfigManager::new();
        manager.load_file(file.path(), FileFormat::Json).unwrap();

        let settings: MailSettings = manager.load_validated().unwrap();
        assert_eq!(settings.api_key, "secret");
        assert_eq!(settings.site().domain, "example.org");
    }

    #[test]
    fn test_later_loads_overwrite_keys() {
        let base = settings_file("json", r#"{"api_key": "old", "ip_pool": "Bulk"}"#);
        let overrides = settings_file("toml", r#"api_key = "new""#);

        let manager = ConfigManager::new();
        manager.load_file(base.path(), FileFormat::Json).unwrap();
        manager.load_file(overrides.path(), FileFormat::Toml).unwrap();

        let settings: MailSettings = manager.load_validated().unwrap();
        assert_eq!(settings.api_key, "new");
        assert_eq!(settings.ip_pool, "Bulk");
    }

    #[test]
    fn test_load_validated_rejects_invalid() {
        let file = settings_file("json", r#"{"api_key": "secret", "protocol": "gopher"}"#);
        let manager = ConfigManager::new();
        manager.load_file(file.path(), FileFormat::Json).unwrap();

        let err = manager.load_validated::<MailSettings>().unwrap_err();
        assert_eq!(err.field(), Some("protocol"));
    }

    #[test]
    fn test_missing_dotenv_file() {
        let manager = ConfigManager::new();
        let err = manager
            .load_dotenv(Some(Path::new("/nonexistent/mailit.env")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
