//! Mandrill API provider.

use async_trait::async_trait;
use mailit_config::MailSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    MailError, Provider, ProviderMessage, Result, SendOptions, SendStatus, TemplateContent,
};

/// Mandrill configuration.
#[derive(Debug, Clone)]
pub struct MandrillConfig {
    /// API key.
    pub api_key: String,
    /// API base URL (defaults to production).
    pub endpoint: String,
}

impl MandrillConfig {
    /// Create a new Mandrill configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: mailit_config::settings::DEFAULT_API_ENDPOINT.to_string(),
        }
    }

    pub fn from_settings(settings: &MailSettings) -> Self {
        Self::new(&settings.api_key).endpoint(&settings.api_endpoint)
    }

    /// Set a custom endpoint (for testing).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn url(&self, call: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), call)
    }
}

/// Mandrill provider.
pub struct MandrillProvider {
    client: Client,
    config: MandrillConfig,
}

impl MandrillProvider {
    /// Create a new Mandrill provider.
    pub fn new(config: MandrillConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn config(&self) -> &MandrillConfig {
        &self.config
    }

    async fn call<P: Serialize>(&self, call: &str, payload: &P) -> Result<Vec<SendStatus>> {
        let response = self
            .client
            .post(self.config.url(call))
            .json(payload)
            .send()
            .await
            .map_err(|e| MailError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MailError::Network(e.to_string()))?;

        if status.is_success() {
            let statuses: Vec<SendStatus> = serde_json::from_str(&body)?;
            debug!(call, accepted = statuses.len(), "Mandrill call succeeded");
            Ok(statuses)
        } else {
            Err(api_error(status.as_u16(), &body))
        }
    }
}

#[async_trait]
impl Provider for MandrillProvider {
    async fn send(&self, message: &ProviderMessage, options: &SendOptions) -> Result<Vec<SendStatus>> {
        debug!(
            to = ?message.to.iter().map(|r| &r.email).collect::<Vec<_>>(),
            subject = %message.subject,
            "Sending email via Mandrill"
        );

        let payload = SendPayload {
            key: &self.config.api_key,
            message,
            options,
        };
        self.call("messages/send.json", &payload).await
    }

    async fn send_template(
        &self,
        template_name: &str,
        content: &[TemplateContent],
        message: &ProviderMessage,
        options: &SendOptions,
    ) -> Result<Vec<SendStatus>> {
        debug!(
            template = template_name,
            to = ?message.to.iter().map(|r| &r.email).collect::<Vec<_>>(),
            "Sending templated email via Mandrill"
        );

        let payload = TemplatePayload {
            key: &self.config.api_key,
            template_name,
            template_content: content,
            message,
            options,
        };
        self.call("messages/send-template.json", &payload).await
    }
}

#[derive(Serialize)]
struct SendPayload<'a> {
    key: &'a str,
    message: &'a ProviderMessage,
    #[serde(flatten)]
    options: &'a SendOptions,
}

#[derive(Serialize)]
struct TemplatePayload<'a> {
    key: &'a str,
    template_name: &'a str,
    template_content: &'a [TemplateContent],
    message: &'a ProviderMessage,
    #[serde(flatten)]
    options: &'a SendOptions,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiError {
    name: String,
    message: String,
}

fn api_error(status: u16, body: &str) -> MailError {
    match serde_json::from_str::<ApiError>(body) {
        Ok(err) => MailError::Provider {
            kind: err.name,
            message: err.message,
        },
        Err(_) => MailError::Provider {
            kind: format!("HTTP {}", status),
            message: body.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Recipient, RecipientKind};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> ProviderMessage {
        ProviderMessage {
            to: vec![Recipient {
                email: "a@x.com".to_string(),
                name: String::new(),
                kind: RecipientKind::To,
            }],
            from_email: "noreply@example.com".to_string(),
            from_name: "Example".to_string(),
            subject: "Hi Bob".to_string(),
            text: "Welcome, Bob!".to_string(),
            html: "<p>Welcome, Bob!</p>".to_string(),
            headers: Default::default(),
            full_html: None,
        }
    }

    fn provider(server: &MockServer) -> MandrillProvider {
        MandrillProvider::new(MandrillConfig::new("test-key").endpoint(server.uri()))
    }

    #[test]
    fn test_url_joins_endpoint() {
        let config = MandrillConfig::new("k").endpoint("http://localhost:1234/api/1.0/");
        assert_eq!(
            config.url("messages/send.json"),
            "http://localhost:1234/api/1.0/messages/send.json"
        );
        assert_eq!(
            MandrillConfig::new("k").url("messages/send.json"),
            "https://mandrillapp.com/api/1.0/messages/send.json"
        );
    }

    #[tokio::test]
    async fn test_send_posts_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages/send.json"))
            .and(body_partial_json(json!({
                "key": "test-key",
                "async": false,
                "ip_pool": "Main Pool",
                "message": {
                    "subject": "Hi Bob",
                    "to": [{"email": "a@x.com", "name": "", "type": "to"}]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"email": "a@x.com", "status": "sent", "_id": "abc123", "reject_reason": null}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let statuses = provider(&server)
            .send(&message(), &SendOptions::new("Main Pool"))
            .await
            .unwrap();

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].status, "sent");
        assert_eq!(statuses[0].id, "abc123");
    }

    #[tokio::test]
    async fn test_send_template_posts_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages/send-template.json"))
            .and(body_partial_json(json!({
                "template_name": "base",
                "template_content": [{"name": "main", "content": "<p>Welcome, Bob!</p>"}],
                "ip_pool": "Transactional"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"email": "a@x.com", "status": "queued", "_id": "q1"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let content = [TemplateContent::new("main", "<p>Welcome, Bob!</p>")];
        let statuses = provider(&server)
            .send_template("base", &content, &message(), &SendOptions::new("Transactional"))
            .await
            .unwrap();

        assert_eq!(statuses[0].status, "queued");
        assert!(statuses[0].reject_reason.is_none());
    }

    #[tokio::test]
    async fn test_api_error_maps_to_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages/send.json"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "status": "error",
                "code": -1,
                "name": "Invalid_Key",
                "message": "Invalid API key"
            })))
            .mount(&server)
            .await;

        let err = provider(&server)
            .send(&message(), &SendOptions::new("Main Pool"))
            .await
            .unwrap_err();

        match err {
            MailError::Provider { kind, message } => {
                assert_eq!(kind, "Invalid_Key");
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unstructured_error_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .send(&message(), &SendOptions::new("Main Pool"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "HTTP 502");
        assert!(err.to_string().contains("bad gateway"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let provider = MandrillProvider::new(MandrillConfig::new("k").endpoint("http://127.0.0.1:1"));

        let err = provider
            .send(&message(), &SendOptions::new("Main Pool"))
            .await
            .unwrap_err();

        assert!(matches!(err, MailError::Network(_)));
    }
}
