//! Mail error types.

use thiserror::Error;

/// Result type for mail operations.
pub type Result<T> = std::result::Result<T, MailError>;

/// Mail errors.
#[derive(Debug, Error)]
pub enum MailError {
    /// No candidate template exists.
    #[error("Template does not exist: {0}")]
    TemplateNotFound(String),

    /// Template failed to compile or render.
    #[error("Template error: {0}")]
    Template(String),

    /// The delivery provider rejected the call.
    #[error("Provider error ({kind}): {message}")]
    Provider { kind: String, message: String },

    /// The provider could not be reached.
    #[error("Network error: {0}")]
    Network(String),

    /// SMTP delivery or message building failed.
    #[error("SMTP error: {0}")]
    Smtp(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Missing required field.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// CSS inlining failed.
    #[error("Inline error: {0}")]
    Inline(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MailError {
    /// Short name of the error kind, used as a log field.
    pub fn kind(&self) -> &str {
        match self {
            Self::TemplateNotFound(_) => "template_not_found",
            Self::Template(_) => "template",
            Self::Provider { kind, .. } => kind,
            Self::Network(_) => "network",
            Self::Smtp(_) => "smtp",
            Self::InvalidAddress(_) => "invalid_address",
            Self::MissingField(_) => "missing_field",
            Self::Inline(_) => "inline",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}

impl From<lettre::transport::smtp::Error> for MailError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        Self::Smtp(err.to_string())
    }
}

impl From<lettre::address::AddressError> for MailError {
    fn from(err: lettre::address::AddressError) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

impl From<lettre::error::Error> for MailError {
    fn from(err: lettre::error::Error) -> Self {
        Self::Smtp(err.to_string())
    }
}

impl From<serde_json::Error> for MailError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<handlebars::RenderError> for MailError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for MailError {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<css_inline::InlineError> for MailError {
    fn from(err: css_inline::InlineError) -> Self {
        Self::Inline(err.to_string())
    }
}

impl From<url::ParseError> for MailError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid base URL: {}", err))
    }
}

impl From<mailit_config::ConfigError> for MailError {
    fn from(err: mailit_config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(feature = "mandrill")]
impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
