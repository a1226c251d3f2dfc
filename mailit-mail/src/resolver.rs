//! Template name resolution.
//!
//! A template base such as `myapp/emails/welcome` names a family of
//! per-part templates. Candidates are ordered most specific first:
//!
//! ```text
//! myapp/emails/welcome.de.subject.txt
//! myapp/emails/welcome.subject.txt
//! ```

use std::fmt;

/// Which part of the email a template renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    Subject,
    Body,
}

impl Part {
    pub fn as_str(&self) -> &'static str {
        match self {
            Part::Subject => "subject",
            Part::Body => "body",
        }
    }
}

/// Output format of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Txt,
    Html,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Txt => "txt",
            Format::Html => "html",
        }
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate template names, language-qualified first.
pub fn template_names(language: &str, template_base: &str, part: Part, format: Format) -> Vec<String> {
    vec![
        format!("{template_base}.{language}.{part}.{format}"),
        format!("{template_base}.{part}.{format}"),
    ]
}

/// Candidate lists for the three parts of one email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateNameSet {
    pub subject: Vec<String>,
    pub text: Vec<String>,
    pub html: Vec<String>,
}

impl TemplateNameSet {
    pub fn resolve(language: &str, template_base: &str) -> Self {
        Self {
            subject: template_names(language, template_base, Part::Subject, Format::Txt),
            text: template_names(language, template_base, Part::Body, Format::Txt),
            html: template_names(language, template_base, Part::Body, Format::Html),
        }
    }

    /// Replace any part whose override is present.
    pub fn with_overrides(mut self, overrides: &TemplateOverrides) -> Self {
        if let Some(subject) = &overrides.subject {
            self.subject = subject.clone();
        }
        if let Some(text) = &overrides.text {
            self.text = text.clone();
        }
        if let Some(html) = &overrides.html {
            self.html = html.clone();
        }
        self
    }
}

/// Caller-supplied candidate lists that bypass resolution for a part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateOverrides {
    pub subject: Option<Vec<String>>,
    pub text: Option<Vec<String>>,
    pub html: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_qualified_first() {
        for part in [Part::Subject, Part::Body] {
            for format in [Format::Txt, Format::Html] {
                for language in ["en", "de", "pt-br"] {
                    let names = template_names(language, "welcome", part, format);
                    assert_eq!(names[0], format!("welcome.{language}.{part}.{format}"));
                    assert_eq!(names[1], format!("welcome.{part}.{format}"));
                }
            }
        }
    }

    #[test]
    fn test_resolve_name_set() {
        let set = TemplateNameSet::resolve("fr", "myapp/emails/notify");

        assert_eq!(
            set.subject,
            vec!["myapp/emails/notify.fr.subject.txt", "myapp/emails/notify.subject.txt"]
        );
        assert_eq!(
            set.text,
            vec!["myapp/emails/notify.fr.body.txt", "myapp/emails/notify.body.txt"]
        );
        assert_eq!(
            set.html,
            vec!["myapp/emails/notify.fr.body.html", "myapp/emails/notify.body.html"]
        );
    }

    #[test]
    fn test_overrides_replace_only_given_parts() {
        let overrides = TemplateOverrides {
            html: Some(vec!["custom.html".to_string()]),
            ..Default::default()
        };
        let set = TemplateNameSet::resolve("en", "welcome").with_overrides(&overrides);

        assert_eq!(set.html, vec!["custom.html"]);
        assert_eq!(set.text[1], "welcome.body.txt");
    }
}
