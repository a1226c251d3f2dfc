//! Email address types.

use crate::{MailError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Email address with optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// The email address.
    pub email: String,
    /// Optional display name.
    pub name: Option<String>,
}

impl Address {
    /// Create a new address with just an email.
    pub fn new(email: impl Into<String>) -> Result<Self> {
        let email = email.into();
        validate_email(&email)?;
        Ok(Self { email, name: None })
    }

    /// Create a new address with a display name.
    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let email = email.into();
        validate_email(&email)?;
        Ok(Self {
            email,
            name: Some(name.into()),
        })
    }

    /// Parse an address from a string like "Name <email@example.com>" or "email@example.com".
    ///
    /// An empty or quoted-empty display name yields `name: None`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some(start) = s.find('<')
            && let Some(end) = s.rfind('>')
            && start < end
        {
            let name = s[..start].trim().trim_matches('"').trim();
            let email = s[start + 1..end].trim();

            if name.is_empty() {
                return Self::new(email);
            } else {
                return Self::with_name(email, name);
            }
        }

        Self::new(s)
    }

    /// Get the email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Get the display name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Display name, or the empty string when there is none.
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Convert to a lettre address.
    pub(crate) fn to_lettre(&self) -> Result<lettre::Address> {
        self.email
            .parse()
            .map_err(|_| MailError::InvalidAddress(self.email.clone()))
    }

    /// Convert to a lettre mailbox.
    pub(crate) fn to_mailbox(&self) -> Result<lettre::message::Mailbox> {
        Ok(lettre::message::Mailbox::new(
            self.name.clone(),
            self.to_lettre()?,
        ))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => write!(f, "{}", self.email),
        }
    }
}

/// Basic shape check: one `@` with something on each side.
///
/// Single-label domains (`addr@x`, `root@localhost`) are allowed.
fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(MailError::InvalidAddress(
            "Email cannot be empty".to_string(),
        ));
    }

    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err(MailError::InvalidAddress(format!(
            "Invalid email format: {}",
            email
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse() {
        let addr = Address::parse("addr@x").unwrap();
        assert_eq!(addr.email, "addr@x");
        assert_eq!(addr.name_or_empty(), "");

        let addr = Address::parse("Name <addr@x>").unwrap();
        assert_eq!(addr.email, "addr@x");
        assert_eq!(addr.name(), Some("Name"));
    }

    #[test]
    fn test_address_parse_quoted_and_empty_names() {
        let addr = Address::parse("\"Doe, John\" <john@example.com>").unwrap();
        assert_eq!(addr.name(), Some("Doe, John"));

        let addr = Address::parse("<john@example.com>").unwrap();
        assert!(addr.name.is_none());

        let addr = Address::parse("  Jane Roe   <jane@example.com>  ").unwrap();
        assert_eq!(addr.name(), Some("Jane Roe"));
        assert_eq!(addr.email(), "jane@example.com");
    }

    #[test]
    fn test_address_display() {
        let addr = Address::new("test@example.com").unwrap();
        assert_eq!(format!("{}", addr), "test@example.com");

        let addr = Address::with_name("test@example.com", "John").unwrap();
        assert_eq!(format!("{}", addr), "John <test@example.com>");
    }

    #[test]
    fn test_invalid_email() {
        assert!(Address::new("invalid").is_err());
        assert!(Address::new("@example.com").is_err());
        assert!(Address::new("test@").is_err());
        assert!(Address::new("a@b@c").is_err());
        assert!(Address::new("two words@example.com").is_err());
        assert!(Address::parse("").is_err());
    }

    #[test]
    fn test_to_mailbox() {
        let mailbox = Address::parse("John <john@example.com>")
            .unwrap()
            .to_mailbox()
            .unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("John"));
        assert_eq!(mailbox.email.to_string(), "john@example.com");
    }
}
