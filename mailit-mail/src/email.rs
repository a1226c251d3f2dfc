//! Standard multi-part email, the form delivered over SMTP.

use lettre::message::{MultiPart, SinglePart};
use serde::{Deserialize, Serialize};

use crate::{Address, MailError, Result};

/// Email message: a plain-text body with an optional HTML alternative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Email {
    /// Sender address.
    pub from: Option<Address>,
    /// To recipients.
    pub to: Vec<Address>,
    /// Email subject.
    pub subject: Option<String>,
    /// Plain text body.
    pub text: Option<String>,
    /// HTML alternative.
    pub html: Option<String>,
    /// Reply-To address.
    pub reply_to: Option<Address>,
}

impl Email {
    /// Validate the email.
    pub fn validate(&self) -> Result<()> {
        if self.from.is_none() {
            return Err(MailError::MissingField("from"));
        }
        if self.to.is_empty() {
            return Err(MailError::MissingField("to"));
        }
        if self.subject.as_deref().is_none_or(str::is_empty) {
            return Err(MailError::MissingField("subject"));
        }
        if self.text.is_none() && self.html.is_none() {
            return Err(MailError::MissingField("text/html body"));
        }
        Ok(())
    }

    /// Build a lettre message.
    ///
    /// Without an HTML alternative the message is a single `text/plain` part.
    pub(crate) fn to_lettre(&self) -> Result<lettre::Message> {
        self.validate()?;

        let from = self
            .from
            .as_ref()
            .ok_or(MailError::MissingField("from"))?
            .to_mailbox()?;

        let mut builder = lettre::Message::builder()
            .from(from)
            .subject(self.subject.as_deref().unwrap_or_default());

        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.to_mailbox()?);
        }

        for addr in &self.to {
            builder = builder.to(addr.to_mailbox()?);
        }

        let text = self.text.clone().unwrap_or_default();
        let message = match &self.html {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(text, html.clone())),
            None => builder.singlepart(SinglePart::plain(text)),
        };

        message.map_err(|e| MailError::Smtp(e.to_string()))
    }
}
