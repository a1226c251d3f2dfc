//! HTML post-processing for email bodies.

use handlebars::html_escape;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

use crate::Result;

/// Rewrites an HTML document for email clients.
pub trait HtmlInliner: Send + Sync {
    /// Inline `<style>` rules and resolve relative links against `base_url`.
    fn inline(&self, html: &str, base_url: &str) -> Result<String>;
}

/// [`HtmlInliner`] backed by `css-inline`.
///
/// Remote stylesheets are not fetched; only `<style>` blocks are inlined.
/// Relative `href`, `src` and `background` attributes become absolute.
#[derive(Debug, Clone, Default)]
pub struct CssInliner {
    keep_style_tags: bool,
}

impl CssInliner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `<style>` blocks after inlining, for clients that honour media queries.
    pub fn keep_style_tags(mut self, keep: bool) -> Self {
        self.keep_style_tags = keep;
        self
    }
}

impl HtmlInliner for CssInliner {
    fn inline(&self, html: &str, base_url: &str) -> Result<String> {
        let base = Url::parse(base_url)?;
        let inliner = css_inline::CSSInliner::options()
            .base_url(Some(base.clone()))
            .load_remote_stylesheets(false)
            .keep_style_tags(self.keep_style_tags)
            .build();

        let inlined = inliner.inline(html)?;
        Ok(absolutize_urls(&inlined, &base))
    }
}

static URL_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(\s(?:href|src|background)\s*=\s*)(?:"([^"]*)"|'([^']*)')"#)
        .expect("static regex")
});

/// Resolve relative URL attributes against `base`.
///
/// Fragments, template placeholders and URLs that already carry a scheme
/// are left alone.
pub fn absolutize_urls(html: &str, base: &Url) -> String {
    URL_ATTR
        .replace_all(html, |caps: &Captures<'_>| {
            let prefix = &caps[1];
            let (value, quote) = match (caps.get(2), caps.get(3)) {
                (Some(v), _) => (v.as_str(), '"'),
                (None, Some(v)) => (v.as_str(), '\''),
                (None, None) => return caps[0].to_string(),
            };

            let keep = value.is_empty()
                || value.starts_with('#')
                || value.contains("{{")
                || Url::parse(value).is_ok();

            let resolved = if keep {
                value.to_string()
            } else {
                base.join(value)
                    .map(String::from)
                    .unwrap_or_else(|_| value.to_string())
            };

            format!("{prefix}{quote}{resolved}{quote}")
        })
        .into_owned()
}

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").expect("static regex"));

/// Plain text to HTML: blank-line separated paragraphs become `<p>`
/// elements, remaining newlines become `<br>`. The text is HTML-escaped.
///
/// Blank input yields an empty string.
pub fn linebreaks(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return String::new();
    }

    PARAGRAPH_BREAK
        .split(normalized)
        .map(|para| format!("<p>{}</p>", html_escape(para).replace('\n', "<br>")))
        .collect::<Vec<_>>()
        .join("\n\n")
}
