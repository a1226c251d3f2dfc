//! Fallback mail transport.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
    transport::smtp::authentication::Credentials,
};
use mailit_config::MailSettings;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::{Email, MailError, Result};

/// Delivers standard [`Email`]s. Used when the provider API fails.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send an email.
    async fn send(&self, email: &Email) -> Result<()>;
}

/// SMTP security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmtpSecurity {
    /// No encryption (port 25).
    #[default]
    None,
    /// STARTTLS upgrade (port 587).
    StartTls,
    /// Implicit TLS (port 465).
    Tls,
}

impl FromStr for SmtpSecurity {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "starttls" => Ok(Self::StartTls),
            "tls" => Ok(Self::Tls),
            other => Err(MailError::Config(format!("unknown SMTP security: {}", other))),
        }
    }
}

/// SMTP configuration.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server host.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Security mode.
    pub security: SmtpSecurity,
    /// Username for authentication.
    pub username: Option<String>,
    /// Password for authentication.
    pub password: Option<String>,
    /// Connection timeout.
    pub timeout: Duration,
}

impl SmtpConfig {
    /// Create a new SMTP configuration.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 25,
            security: SmtpSecurity::None,
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Build from the `smtp_*` settings keys.
    pub fn from_settings(settings: &MailSettings) -> Result<Self> {
        let mut config = Self::new(&settings.smtp_host);
        config.security = settings.smtp_security.parse()?;
        config.port = settings.smtp_port;
        if let (Some(username), Some(password)) = (&settings.smtp_username, &settings.smtp_password) {
            config = config.credentials(username, password);
        }
        Ok(config)
    }

    /// Set credentials.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Use STARTTLS security (port 587).
    pub fn starttls(mut self) -> Self {
        self.security = SmtpSecurity::StartTls;
        self.port = 587;
        self
    }

    /// Use implicit TLS security (port 465).
    pub fn tls(mut self) -> Self {
        self.security = SmtpSecurity::Tls;
        self.port = 465;
        self
    }

    /// Set the connection timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// SMTP transport.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: SmtpConfig,
}

impl SmtpTransport {
    /// Create a new SMTP transport. No connection is made until the first send.
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let mut builder = match config.security {
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            }
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            }
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
        };

        builder = builder.port(config.port).timeout(Some(config.timeout));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let transport = builder.build();

        info!(
            host = %config.host,
            port = config.port,
            security = ?config.security,
            "SMTP transport initialized"
        );

        Ok(Self { transport, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &SmtpConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(&self, email: &Email) -> Result<()> {
        let message = email.to_lettre()?;

        debug!(
            to = ?email.to.iter().map(|a| &a.email).collect::<Vec<_>>(),
            subject = ?email.subject,
            "Sending email via SMTP"
        );

        self.transport.send(message).await?;

        debug!("Email sent successfully");
        Ok(())
    }
}
