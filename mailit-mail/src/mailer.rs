//! High-level mailer: renders requests and dispatches them through the
//! provider, falling back to SMTP when the provider fails.

use mailit_config::{MailSettings, Site};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::{
    Address, CssInliner, Email, HtmlInliner, MailError, MailRequest, Provider, ProviderMessage,
    Recipient, RecipientKind, RenderContext, Result, SendOptions, SendStatus, TemplateContent,
    TemplateEngine, TemplateNameSet, Transport, linebreaks, locale,
};

/// Content block a remote template receives the rendered HTML under.
const MAIN_CONTENT_BLOCK: &str = "main";

const REPLY_TO_HEADER: &str = "Reply-To";

/// Output of the shared rendering step.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTemplate {
    /// Normalized subject line.
    pub subject: String,
    /// Plain text body; `None` when no text template exists.
    pub text: Option<String>,
    /// Raw HTML body; `None` when no HTML template exists.
    pub html: Option<String>,
    pub site: Site,
    /// `{protocol}://{domain}` of `site`.
    pub base_url: String,
}

/// How a [`Mailer::send_mail`] call was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted by the provider, with its per-recipient statuses.
    Provider(Vec<SendStatus>),
    /// Sent over SMTP after the provider failed.
    Fallback,
}

/// High-level mailer for sending templated emails.
pub struct Mailer {
    settings: Arc<MailSettings>,
    templates: Arc<dyn TemplateEngine>,
    inliner: Arc<dyn HtmlInliner>,
    provider: Arc<dyn Provider>,
    fallback: Arc<dyn Transport>,
}

impl Mailer {
    /// Create a mailer from its parts. HTML is inlined with [`CssInliner`].
    pub fn new(
        settings: MailSettings,
        templates: impl TemplateEngine + 'static,
        provider: impl Provider + 'static,
        fallback: impl Transport + 'static,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            templates: Arc::new(templates),
            inliner: Arc::new(CssInliner::new()),
            provider: Arc::new(provider),
            fallback: Arc::new(fallback),
        }
    }

    /// Handlebars templates from `templates_dir`, Mandrill delivery and an
    /// SMTP fallback, all taken from `settings`.
    #[cfg(feature = "mandrill")]
    pub fn from_settings(settings: MailSettings) -> Result<Self> {
        let templates = crate::HandlebarsEngine::from_directory(&settings.templates_dir)?;
        let provider =
            crate::MandrillProvider::new(crate::MandrillConfig::from_settings(&settings));
        let fallback = crate::SmtpTransport::new(crate::SmtpConfig::from_settings(&settings)?)?;

        Ok(Self::new(settings, templates, provider, fallback))
    }

    /// Replace the HTML inliner.
    pub fn with_inliner(mut self, inliner: impl HtmlInliner + 'static) -> Self {
        self.inliner = Arc::new(inliner);
        self
    }

    pub fn settings(&self) -> &MailSettings {
        &self.settings
    }

    /// Render subject and bodies for `request` under its language.
    pub fn render(&self, request: &MailRequest) -> Result<RenderedTemplate> {
        let language = request
            .language
            .clone()
            .or_else(locale::get_language)
            .unwrap_or_else(|| self.settings.language_code.clone());

        let _guard = locale::force_language(&language);

        let names = TemplateNameSet::resolve(&language, &request.template_base)
            .with_overrides(&request.templates);

        let site = request.site.clone().unwrap_or_else(|| self.settings.site());
        let base_url = site.base_url(&self.settings.protocol);

        let mut context = request.context.clone();
        context.insert("site".to_string(), serde_json::to_value(&site)?);
        context.insert("site_name".to_string(), site.name.clone().into());
        if let Some(message) = &request.message {
            context.insert("message".to_string(), message.clone());
        }

        let subject = match request.subject.as_deref().filter(|s| !s.is_empty()) {
            Some(subject) => subject.to_string(),
            None => self.templates.render_first(&names.subject, &context)?,
        };
        let subject = normalize_subject(&subject);
        if subject.is_empty() {
            return Err(MailError::MissingField("subject"));
        }
        context.insert("subject".to_string(), subject.clone().into());

        let text = self.render_optional(&names.text, &context)?;
        let html = self.render_optional(&names.html, &context)?;

        if is_blank(&text) && is_blank(&html) {
            let candidates: Vec<String> = names.html.iter().chain(&names.text).cloned().collect();
            return Err(MailError::TemplateNotFound(candidates.join(", ")));
        }

        debug!(
            language = %language,
            template_base = %request.template_base,
            has_text = text.is_some(),
            has_html = html.is_some(),
            "Rendered email templates"
        );

        Ok(RenderedTemplate {
            subject,
            text,
            html,
            site,
            base_url,
        })
    }

    /// Build the provider-native message for `request`.
    pub fn construct_message(&self, request: &MailRequest) -> Result<ProviderMessage> {
        let to = request
            .recipients
            .iter()
            .map(|r| {
                let addr = Address::parse(r)?;
                Ok(Recipient {
                    name: addr.name_or_empty().to_string(),
                    email: addr.email,
                    kind: RecipientKind::To,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if to.is_empty() {
            return Err(MailError::MissingField("to"));
        }

        let from = Address::parse(self.from_email(request))?;
        let rendered = self.render(request)?;

        let text = rendered.text.unwrap_or_default();
        let html = rendered.html.unwrap_or_else(|| linebreaks(&text));
        let full_html = if html.is_empty() {
            String::new()
        } else {
            self.inliner.inline(&html, &rendered.base_url)?
        };

        let from_name = from
            .name()
            .map_or_else(|| rendered.site.name.clone(), str::to_string);

        let mut headers = BTreeMap::new();
        if let Some(reply_to) = self.reply_to(request)? {
            headers.insert(REPLY_TO_HEADER.to_string(), reply_to.to_string());
        }

        Ok(ProviderMessage {
            to,
            from_email: from.email,
            from_name,
            subject: rendered.subject,
            text,
            html,
            headers,
            full_html: Some(full_html),
        })
    }

    /// Build the standard multi-part email for `request`.
    ///
    /// Unlike [`Mailer::construct_message`], the HTML alternative is only
    /// attached when an HTML template rendered.
    pub fn construct_email(&self, request: &MailRequest) -> Result<Email> {
        let to = request
            .recipients
            .iter()
            .map(|r| Address::parse(r))
            .collect::<Result<Vec<_>>>()?;
        if to.is_empty() {
            return Err(MailError::MissingField("to"));
        }

        let from = Address::parse(self.from_email(request))?;
        let rendered = self.render(request)?;

        let html = match rendered.html.filter(|h| !h.is_empty()) {
            Some(html) => Some(self.inliner.inline(&html, &rendered.base_url)?),
            None => None,
        };

        Ok(Email {
            from: Some(from),
            to,
            subject: Some(rendered.subject),
            text: Some(rendered.text.unwrap_or_default()),
            html,
            reply_to: self.reply_to(request)?,
        })
    }

    /// Hand a constructed message to the provider.
    ///
    /// With a template name the message is sent through that remote template
    /// with the rendered HTML as its `main` block; otherwise the inlined HTML
    /// is sent directly.
    pub async fn send_constructed(
        &self,
        message: ProviderMessage,
        template_name: Option<&str>,
    ) -> Result<Vec<SendStatus>> {
        let options = SendOptions::new(&self.settings.ip_pool);

        match template_name {
            Some(template_name) => {
                let message = message.into_templated();
                let content = [TemplateContent::new(MAIN_CONTENT_BLOCK, &message.html)];
                self.provider
                    .send_template(template_name, &content, &message, &options)
                    .await
            }
            None => self.provider.send(&message.into_direct(), &options).await,
        }
    }

    /// Render and send `request`, falling back to SMTP if the provider fails.
    ///
    /// Rendering errors are returned before any delivery is attempted. A
    /// provider failure is logged and never returned; a fallback failure is.
    /// A provider response listing no recipients counts as a failure.
    pub async fn send_mail(&self, request: MailRequest) -> Result<Delivery> {
        let message = self.construct_message(&request)?;
        let template_name = request
            .provider_template
            .as_deref()
            .or(self.settings.default_template.as_deref());

        let outcome = match self.send_constructed(message, template_name).await {
            Ok(statuses) if statuses.is_empty() => Err(MailError::Provider {
                kind: "empty_response".to_string(),
                message: "provider reported no recipients".to_string(),
            }),
            other => other,
        };

        match outcome {
            Ok(statuses) => Ok(Delivery::Provider(statuses)),
            Err(e) => {
                error!(kind = e.kind(), error = %e, "Provider delivery failed");
                warn!(to = ?request.recipients, "Falling back to SMTP delivery");

                let email = self.construct_email(&request)?;
                self.fallback.send(&email).await?;
                Ok(Delivery::Fallback)
            }
        }
    }

    /// Send `request` to the configured administrators.
    pub async fn mail_admins(&self, request: MailRequest) -> Result<Delivery> {
        let admins = self.settings.admin_emails();
        self.send_mail(request.with_recipients(admins)).await
    }

    /// Send `request` to the configured managers.
    pub async fn mail_managers(&self, request: MailRequest) -> Result<Delivery> {
        let managers = self.settings.manager_emails();
        self.send_mail(request.with_recipients(managers)).await
    }

    fn from_email<'a>(&'a self, request: &'a MailRequest) -> &'a str {
        request
            .from_email
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(&self.settings.default_from_email)
    }

    fn reply_to(&self, request: &MailRequest) -> Result<Option<Address>> {
        request
            .reply_to
            .as_deref()
            .filter(|r| !r.is_empty())
            .map(Address::parse)
            .transpose()
    }

    fn render_optional(&self, candidates: &[String], context: &RenderContext) -> Result<Option<String>> {
        match self.templates.render_first(candidates, context) {
            Ok(out) => Ok(Some(out)),
            Err(MailError::TemplateNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Strip line breaks and surrounding whitespace from a subject line.
pub(crate) fn normalize_subject(subject: &str) -> String {
    subject.replace(['\r', '\n'], "").trim().to_string()
}

fn is_blank(part: &Option<String>) -> bool {
    part.as_deref().is_none_or(str::is_empty)
}
