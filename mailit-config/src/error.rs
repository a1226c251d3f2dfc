// Errors raised while loading mail settings

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A settings or `.env` file could not be found or read.
    #[error("Failed to load settings: {0}")]
    Load(String),

    /// A settings file is not valid JSON, TOML or env syntax.
    #[error("Failed to parse settings: {0}")]
    Parse(String),

    /// Loaded keys do not deserialize into the settings type.
    #[error("Malformed settings: {0}")]
    Malformed(String),

    /// A setting has a value outside what the mailer accepts.
    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// The offending key for validation failures.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Invalid { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_display_names_field() {
        let err = ConfigError::invalid("protocol", "must be one of [\"http\", \"https\"]");
        assert_eq!(err.field(), Some("protocol"));
        assert!(err.to_string().starts_with("Invalid setting protocol:"));
    }

    #[test]
    fn test_field_only_for_validation() {
        assert_eq!(ConfigError::Parse("bad toml".to_string()).field(), None);
    }
}
