//! # Mailit Mail
//!
//! Templated transactional email sent through the Mandrill API, with an SMTP
//! fallback when the provider fails.
//!
//! ## Features
//!
//! - **Template resolution**: language-qualified subject, text and HTML
//!   templates with generic fallbacks
//! - **Handlebars rendering** with an active-language helper
//! - **CSS inlining** and relative URL absolutization for HTML bodies
//! - **Mandrill delivery** (`mandrill` feature) through direct or remote
//!   template sends
//! - **SMTP fallback** through lettre
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mailit_mail::{MailRequest, MailSettings, Mailer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = MailSettings::from_env()?;
//!     let mailer = Mailer::from_settings(settings)?;
//!
//!     let request = MailRequest::new("Bob <bob@example.com>", "accounts/welcome")
//!         .var("name", "Bob");
//!
//!     mailer.send_mail(request).await?;
//!     Ok(())
//! }
//! ```
//!
//! Templates are looked up relative to `templates_dir`:
//!
//! ```text
//! accounts/welcome.en-us.subject.txt
//! accounts/welcome.subject.txt
//! accounts/welcome.body.txt
//! accounts/welcome.body.html
//! ```

mod address;
mod email;
mod error;
mod inline;
mod mailer;
mod message;
mod provider;
mod resolver;
mod template_handlebars;
mod transport;

pub mod locale;

#[cfg(feature = "mandrill")]
mod mandrill;

pub use address::Address;
pub use email::Email;
pub use error::{MailError, Result};
pub use inline::{CssInliner, HtmlInliner, absolutize_urls, linebreaks};
pub use mailer::{Delivery, Mailer, RenderedTemplate};
pub use message::{
    DEFAULT_TEMPLATE_BASE, MailRequest, ProviderMessage, Recipient, RecipientKind, Recipients,
};
pub use provider::{Provider, SendOptions, SendStatus, TemplateContent};
pub use resolver::{Format, Part, TemplateNameSet, TemplateOverrides, template_names};
pub use template_handlebars::HandlebarsEngine;
pub use transport::{SmtpConfig, SmtpSecurity, SmtpTransport, Transport};

#[cfg(feature = "mandrill")]
pub use mandrill::{MandrillConfig, MandrillProvider};

pub use mailit_config::{Contact, MailSettings, Site};

/// Variables handed to templates.
pub type RenderContext = serde_json::Map<String, serde_json::Value>;

/// Template engine trait for rendering email templates.
pub trait TemplateEngine: Send + Sync {
    /// Render a template with the given name and context.
    ///
    /// Fails with [`MailError::TemplateNotFound`] when no such template exists.
    fn render(&self, name: &str, context: &RenderContext) -> Result<String>;

    /// Check if a template exists.
    fn has_template(&self, name: &str) -> bool;

    /// Register a template from a string.
    fn register_template(&mut self, name: &str, content: &str) -> Result<()>;

    /// Render the first candidate that exists.
    fn render_first(&self, candidates: &[String], context: &RenderContext) -> Result<String> {
        match candidates.iter().find(|name| self.has_template(name)) {
            Some(name) => self.render(name, context),
            None => Err(MailError::TemplateNotFound(candidates.join(", "))),
        }
    }
}

/// Prelude for common imports.
///
/// ```
/// use mailit_mail::prelude::*;
/// ```
pub mod prelude {
    pub use crate::address::Address;
    pub use crate::email::Email;
    pub use crate::error::{MailError, Result};
    pub use crate::mailer::{Delivery, Mailer};
    pub use crate::message::{MailRequest, ProviderMessage};
    pub use crate::provider::{Provider, SendOptions, SendStatus};
    pub use crate::transport::{SmtpConfig, SmtpSecurity, SmtpTransport, Transport};
    pub use crate::{HandlebarsEngine, RenderContext, TemplateEngine};
    pub use mailit_config::{MailSettings, Site};

    #[cfg(feature = "mandrill")]
    pub use crate::mandrill::{MandrillConfig, MandrillProvider};
}
