// Settings file loaders

use crate::{ConfigError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Supported settings file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }
}

/// Settings file loader
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Pick the format from the file extension.
    pub fn auto(path: impl AsRef<Path>) -> Result<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::Load("No file extension found".to_string()))?;

        let format = FileFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::Load(format!("Unsupported format: {}", ext)))?;

        Ok(Self::new(format))
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Load settings from a file. The top level must be a table/object.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::Load(format!("Failed to read {}: {}", path.display(), e))
        })?;

        self.parse(&content)
    }

    /// Parse settings from a string
    pub fn parse(&self, content: &str) -> Result<Value> {
        let value = match self.format {
            FileFormat::Json => parse_json(content)?,
            FileFormat::Toml => parse_toml(content)?,
            FileFormat::Env => parse_env(content),
        };

        if !value.is_object() {
            return Err(ConfigError::Parse(
                "top level of a settings file must be a table".to_string(),
            ));
        }

        Ok(value)
    }
}

fn parse_json(content: &str) -> Result<Value> {
    serde_json::from_str(content)
        .map_err(|e| ConfigError::Parse(format!("JSON parse error: {}", e)))
}

fn parse_toml(content: &str) -> Result<Value> {
    let toml_value: toml::Table = toml::from_str(content)
        .map_err(|e| ConfigError::Parse(format!("TOML parse error: {}", e)))?;

    serde_json::to_value(toml_value)
        .map_err(|e| ConfigError::Parse(format!("TOML to JSON conversion error: {}", e)))
}

fn parse_env(content: &str) -> Value {
    let mut map = serde_json::Map::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim().to_lowercase();
            let value = value.trim().trim_matches('"').trim_matches('\'');
            map.insert(key, Value::String(value.to_string()));
        }
    }

    Value::Object(map)
}
