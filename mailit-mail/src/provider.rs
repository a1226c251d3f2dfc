//! Delivery provider abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{ProviderMessage, Result};

/// Per-call delivery options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendOptions {
    #[serde(rename = "async")]
    pub async_send: bool,
    pub ip_pool: String,
}

impl SendOptions {
    pub fn new(ip_pool: impl Into<String>) -> Self {
        Self {
            async_send: false,
            ip_pool: ip_pool.into(),
        }
    }
}

/// Named content block for a remote template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateContent {
    pub name: String,
    pub content: String,
}

impl TemplateContent {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Per-recipient result reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendStatus {
    pub email: String,
    /// `sent`, `queued`, `scheduled`, `rejected` or `invalid`.
    pub status: String,
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub reject_reason: Option<String>,
}

impl SendStatus {
    pub fn is_rejected(&self) -> bool {
        matches!(self.status.as_str(), "rejected" | "invalid")
    }
}

/// A transactional email API.
///
/// Errors are reported as [`crate::MailError::Provider`] or
/// [`crate::MailError::Network`]; the mailer treats either as a signal to
/// fall back to SMTP.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Send a fully rendered message.
    async fn send(&self, message: &ProviderMessage, options: &SendOptions) -> Result<Vec<SendStatus>>;

    /// Send through a template stored at the provider.
    async fn send_template(
        &self,
        template_name: &str,
        content: &[TemplateContent],
        message: &ProviderMessage,
        options: &SendOptions,
    ) -> Result<Vec<SendStatus>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_send_options_wire_shape() {
        let options = SendOptions::new("Main Pool");
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({"async": false, "ip_pool": "Main Pool"})
        );
    }

    #[test]
    fn test_send_status_parse() {
        let statuses: Vec<SendStatus> = serde_json::from_value(json!([
            {"email": "a@x.com", "status": "sent", "_id": "abc", "reject_reason": null},
            {"email": "b@x.com", "status": "rejected", "_id": "def", "reject_reason": "hard-bounce"}
        ]))
        .unwrap();

        assert_eq!(statuses[0].id, "abc");
        assert!(!statuses[0].is_rejected());
        assert!(statuses[1].is_rejected());
        assert_eq!(statuses[1].reject_reason.as_deref(), Some("hard-bounce"));
    }
}
