//! Typed mail settings.
//!
//! Every key can come from the environment (`MAILIT_*`), so list and number
//! fields also accept their string spellings: `admins = "a@x.com, Ops <b@x.com>"`
//! and `smtp_port = "587"` both deserialize.

use crate::{ConfigLoader, ConfigManager, ConfigValidator, Result, Validate};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_API_ENDPOINT: &str = "https://mandrillapp.com/api/1.0";
pub const DEFAULT_IP_POOL: &str = "Main Pool";
pub const DEFAULT_FROM_EMAIL: &str = "webmaster@localhost";
pub const DEFAULT_LANGUAGE_CODE: &str = "en-us";
pub const DEFAULT_PROTOCOL: &str = "https";

const PROTOCOLS: [&str; 2] = ["http", "https"];
const SMTP_SECURITY: [&str; 3] = ["none", "starttls", "tls"];

/// The site emails are sent on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub domain: String,
}

impl Site {
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
        }
    }

    /// `{protocol}://{domain}`
    pub fn base_url(&self, protocol: &str) -> String {
        format!("{}://{}", protocol, self.domain)
    }
}

/// A named address from the admin/manager lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
}

impl Contact {
    /// Parse `Name <addr>` or a bare address.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match (value.find('<'), value.rfind('>')) {
            (Some(start), Some(end)) if start < end => Self {
                name: value[..start].trim().trim_matches('"').to_string(),
                email: value[start + 1..end].trim().to_string(),
            },
            _ => Self {
                name: String::new(),
                email: value.to_string(),
            },
        }
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.email)
        } else {
            write!(f, "{} <{}>", self.name, self.email)
        }
    }
}

impl<'de> Deserialize<'de> for Contact {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Pair(String, String),
            Named { name: String, email: String },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Contact::parse(&s),
            Raw::Pair(name, email) | Raw::Named { name, email } => Contact { name, email },
        })
    }
}

/// Settings read once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSettings {
    /// Mandrill API key.
    pub api_key: String,
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    /// Remote template used when a request names none.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub default_template: Option<String>,
    #[serde(default = "default_ip_pool")]
    pub ip_pool: String,
    #[serde(default = "default_from_email")]
    pub default_from_email: String,
    #[serde(default = "default_language_code")]
    pub language_code: String,
    /// Scheme of the site base URL used to absolutize links in HTML bodies.
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_site")]
    pub site_name: String,
    #[serde(default = "default_site")]
    pub site_domain: String,
    #[serde(default, deserialize_with = "contact_list")]
    pub admins: Vec<Contact>,
    #[serde(default, deserialize_with = "contact_list")]
    pub managers: Vec<Contact>,
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port", deserialize_with = "port")]
    pub smtp_port: u16,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub smtp_username: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub smtp_password: Option<String>,
    #[serde(default = "default_smtp_security")]
    pub smtp_security: String,
}

impl MailSettings {
    /// Settings with every optional key at its default.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_endpoint: default_api_endpoint(),
            default_template: None,
            ip_pool: default_ip_pool(),
            default_from_email: default_from_email(),
            language_code: default_language_code(),
            protocol: default_protocol(),
            site_name: default_site(),
            site_domain: default_site(),
            admins: Vec::new(),
            managers: Vec::new(),
            templates_dir: default_templates_dir(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            smtp_security: default_smtp_security(),
        }
    }

    /// Load from `.env` (if present) and `MAILIT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let manager = ConfigManager::with_prefix(crate::env::DEFAULT_PREFIX.to_string());
        manager.load_dotenv(None)?;
        manager.load_validated()
    }

    /// Load from a JSON, TOML or env file; `MAILIT_*` variables take precedence.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigLoader::auto(path)?.format();

        let manager = ConfigManager::with_prefix(crate::env::DEFAULT_PREFIX.to_string());
        manager.load_file(path, format)?;
        manager.load_env()?;
        manager.load_validated()
    }

    /// The configured current site.
    pub fn site(&self) -> Site {
        Site::new(&self.site_name, &self.site_domain)
    }

    pub fn admin_emails(&self) -> Vec<String> {
        self.admins.iter().map(|c| c.email.clone()).collect()
    }

    pub fn manager_emails(&self) -> Vec<String> {
        self.managers.iter().map(|c| c.email.clone()).collect()
    }

    /// Set the current site.
    pub fn with_site(mut self, site: &Site) -> Self {
        self.site_name = site.name.clone();
        self.site_domain = site.domain.clone();
        self
    }

    pub fn with_admins<I, S>(mut self, admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.admins = admins.into_iter().map(|a| Contact::parse(a.as_ref())).collect();
        self
    }

    pub fn with_managers<I, S>(mut self, managers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.managers = managers
            .into_iter()
            .map(|m| Contact::parse(m.as_ref()))
            .collect();
        self
    }
}

impl Validate for MailSettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty(&self.api_key, "api_key")?;
        ConfigValidator::is_url(&self.api_endpoint, "api_endpoint")?;
        ConfigValidator::not_empty(&self.ip_pool, "ip_pool")?;
        ConfigValidator::is_email(&self.default_from_email, "default_from_email")?;
        ConfigValidator::not_empty(&self.language_code, "language_code")?;
        ConfigValidator::one_of(&self.protocol.as_str(), &PROTOCOLS, "protocol")?;
        ConfigValidator::not_empty(&self.site_domain, "site_domain")?;
        for contact in self.admins.iter().chain(&self.managers) {
            ConfigValidator::is_email(&contact.email, "admins/managers")?;
        }
        ConfigValidator::not_empty(&self.smtp_host, "smtp_host")?;
        ConfigValidator::is_port(self.smtp_port, "smtp_port")?;
        ConfigValidator::one_of(&self.smtp_security.as_str(), &SMTP_SECURITY, "smtp_security")?;
        Ok(())
    }
}

fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_ip_pool() -> String {
    DEFAULT_IP_POOL.to_string()
}

fn default_from_email() -> String {
    DEFAULT_FROM_EMAIL.to_string()
}

fn default_language_code() -> String {
    DEFAULT_LANGUAGE_CODE.to_string()
}

fn default_protocol() -> String {
    DEFAULT_PROTOCOL.to_string()
}

fn default_site() -> String {
    "example.com".to_string()
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    25
}

fn default_smtp_security() -> String {
    "none".to_string()
}

fn empty_as_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn contact_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<Contact>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<Contact>),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::List(list) => list,
        Raw::Text(text) => text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Contact::parse)
            .collect(),
    })
}

fn port<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u16, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u16),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
