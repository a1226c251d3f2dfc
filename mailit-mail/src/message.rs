//! Requests and the provider-native message shape.

use mailit_config::Site;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{RenderContext, TemplateOverrides};

/// Template base used when a request does not name one.
pub const DEFAULT_TEMPLATE_BASE: &str = "mailit/email";

/// One or many recipient strings, each `addr` or `Name <addr>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients(pub Vec<String>);

impl From<&str> for Recipients {
    fn from(recipient: &str) -> Self {
        Self(vec![recipient.to_string()])
    }
}

impl From<String> for Recipients {
    fn from(recipient: String) -> Self {
        Self(vec![recipient])
    }
}

impl From<Vec<String>> for Recipients {
    fn from(recipients: Vec<String>) -> Self {
        Self(recipients)
    }
}

impl From<Vec<&str>> for Recipients {
    fn from(recipients: Vec<&str>) -> Self {
        Self(recipients.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Recipients {
    fn from(recipients: &[&str]) -> Self {
        Self(recipients.iter().map(|r| r.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Recipients {
    fn from(recipients: [&str; N]) -> Self {
        Self(recipients.iter().map(|r| r.to_string()).collect())
    }
}

/// Everything needed to render and send one email.
///
/// The same request is rendered twice when the provider fails: once into a
/// [`ProviderMessage`] and once into a standard [`crate::Email`].
#[derive(Debug, Clone, Default)]
pub struct MailRequest {
    pub recipients: Vec<String>,
    pub context: RenderContext,
    pub template_base: String,
    /// Used verbatim (after normalization) instead of rendering a subject template.
    pub subject: Option<String>,
    /// Exposed to templates as `message`.
    pub message: Option<Value>,
    /// Defaults to the configured current site.
    pub site: Option<Site>,
    pub templates: TemplateOverrides,
    /// `addr` or `Name <addr>`; defaults to the configured sender.
    pub from_email: Option<String>,
    /// Defaults to the thread's active language, then the configured one.
    pub language: Option<String>,
    /// Remote template to send through; defaults to the configured one.
    pub provider_template: Option<String>,
    /// `addr` or `Name <addr>` replies should go to.
    pub reply_to: Option<String>,
}

impl MailRequest {
    pub fn new(recipients: impl Into<Recipients>, template_base: impl Into<String>) -> Self {
        Self {
            recipients: recipients.into().0,
            template_base: template_base.into(),
            ..Default::default()
        }
    }

    /// A request for the default template base.
    pub fn to(recipients: impl Into<Recipients>) -> Self {
        Self::new(recipients, DEFAULT_TEMPLATE_BASE)
    }

    /// Replace the whole render context.
    pub fn context(mut self, context: RenderContext) -> Self {
        self.context = context;
        self
    }

    /// Set one context variable.
    pub fn var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn message(mut self, message: impl Into<Value>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn site(mut self, site: Site) -> Self {
        self.site = Some(site);
        self
    }

    pub fn subject_templates(mut self, names: Vec<String>) -> Self {
        self.templates.subject = Some(names);
        self
    }

    pub fn body_templates(mut self, names: Vec<String>) -> Self {
        self.templates.text = Some(names);
        self
    }

    pub fn html_templates(mut self, names: Vec<String>) -> Self {
        self.templates.html = Some(names);
        self
    }

    pub fn from_email(mut self, from_email: impl Into<String>) -> Self {
        self.from_email = Some(from_email.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn provider_template(mut self, name: impl Into<String>) -> Self {
        self.provider_template = Some(name.into());
        self
    }

    pub fn reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Same request for a different recipient list.
    pub fn with_recipients(mut self, recipients: impl Into<Recipients>) -> Self {
        self.recipients = recipients.into().0;
        self
    }
}

/// Recipient header a [`Recipient`] is delivered under. Only `to` is sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientKind {
    #[default]
    To,
}

/// A provider-native recipient entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    /// Empty when the input had no display name.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RecipientKind,
}

/// Provider-native message.
///
/// `full_html` is the CSS-inlined variant of `html`. It is never sent as
/// its own field: a direct send swaps it into `html`, a templated send
/// drops it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub to: Vec<Recipient>,
    pub from_email: String,
    pub from_name: String,
    pub subject: String,
    pub text: String,
    pub html: String,
    /// Extra headers such as `Reply-To`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(skip)]
    pub full_html: Option<String>,
}

impl ProviderMessage {
    /// Payload for a direct send: `html` carries the inlined variant.
    pub fn into_direct(mut self) -> Self {
        if let Some(full_html) = self.full_html.take() {
            self.html = full_html;
        }
        self
    }

    /// Payload for a templated send: the inlined variant is discarded, since
    /// remote templates carry their own layout.
    pub fn into_templated(mut self) -> Self {
        self.full_html = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

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
            headers: BTreeMap::new(),
            full_html: Some("<p style=\"margin: 0\">Welcome, Bob!</p>".to_string()),
        }
    }

    #[test]
    fn test_recipients_normalization() {
        assert_eq!(Recipients::from("a@x.com").0, vec!["a@x.com"]);
        assert_eq!(Recipients::from(["a@x.com", "b@x.com"]).0.len(), 2);
        assert_eq!(
            Recipients::from(vec!["A <a@x.com>".to_string()]).0,
            vec!["A <a@x.com>"]
        );
    }

    #[test]
    fn test_request_builder() {
        let request = MailRequest::new("a@x.com", "welcome")
            .var("name", "Bob")
            .language("de")
            .html_templates(vec!["custom.html".to_string()]);

        assert_eq!(request.recipients, vec!["a@x.com"]);
        assert_eq!(request.context["name"], "Bob");
        assert_eq!(request.language.as_deref(), Some("de"));
        assert_eq!(request.templates.html, Some(vec!["custom.html".to_string()]));
        assert_eq!(MailRequest::to("a@x.com").template_base, DEFAULT_TEMPLATE_BASE);
    }

    #[test]
    fn test_wire_shape() {
        let value = serde_json::to_value(message()).unwrap();

        assert_eq!(value["to"], json!([{"email": "a@x.com", "name": "", "type": "to"}]));
        assert_eq!(value["from_name"], "Example");
        assert!(value.get("full_html").is_none());
        assert!(value.get("headers").is_none());
    }

    #[test]
    fn test_into_direct_swaps_inlined_html() {
        let direct = message().into_direct();
        assert_eq!(direct.html, "<p style=\"margin: 0\">Welcome, Bob!</p>");
        assert!(direct.full_html.is_none());
    }

    #[test]
    fn test_into_templated_keeps_rendered_html() {
        let templated = message().into_templated();
        assert_eq!(templated.html, "<p>Welcome, Bob!</p>");
        assert!(templated.full_html.is_none());
    }
}
