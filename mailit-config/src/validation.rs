// Settings validation

use crate::{ConfigError, Result};

/// Trait for validating loaded settings
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Validation rules shared by settings types
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::invalid(field, "cannot be empty"));
        }
        Ok(())
    }

    /// Validate that a value is in a list of allowed values
    pub fn one_of<T: PartialEq + std::fmt::Debug>(value: &T, allowed: &[T], field: &str) -> Result<()> {
        if !allowed.contains(value) {
            return Err(ConfigError::invalid(
                field,
                format!("must be one of {:?}, got {:?}", allowed, value),
            ));
        }
        Ok(())
    }

    /// Validate URL format
    pub fn is_url(value: &str, field: &str) -> Result<()> {
        if !value.starts_with("http://") && !value.starts_with("https://") {
            return Err(ConfigError::invalid(field, "must be an http(s) URL"));
        }
        Ok(())
    }

    /// Validate an email address, optionally in `Name <addr>` form.
    ///
    /// Single-label domains such as `localhost` are accepted.
    pub fn is_email(value: &str, field: &str) -> Result<()> {
        let addr = match (value.find('<'), value.rfind('>')) {
            (Some(start), Some(end)) if start < end => &value[start + 1..end],
            _ => value,
        };

        let valid = matches!(
            addr.trim().split_once('@'),
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        );

        if !valid {
            return Err(ConfigError::invalid(
                field,
                format!("must be a valid email, got {:?}", value),
            ));
        }
        Ok(())
    }

    /// Validate port number
    pub fn is_port(value: u16, field: &str) -> Result<()> {
        if value == 0 {
            return Err(ConfigError::invalid(field, "must be a valid port number"));
        }
        Ok(())
    }
}
