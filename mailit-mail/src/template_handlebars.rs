//! Handlebars template engine integration.

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext as HelperRenderContext,
    no_escape,
};
use std::path::Path;
use tracing::debug;

use crate::{MailError, RenderContext, Result, TemplateEngine, locale};

/// Handlebars-based template engine for emails.
///
/// Templates are addressed by their full name including the format suffix
/// (`welcome.en.body.html`). Names ending in `.html` are HTML-escaped; all
/// others render verbatim.
pub struct HandlebarsEngine {
    html: Handlebars<'static>,
    text: Handlebars<'static>,
}

fn current_language(
    _: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut HelperRenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    out.write(&locale::get_language().unwrap_or_default())?;
    Ok(())
}

fn is_html(name: &str) -> bool {
    name.ends_with(".html")
}

impl HandlebarsEngine {
    /// Create a new Handlebars engine.
    pub fn new() -> Self {
        let mut html = Handlebars::new();
        html.register_helper("current_language", Box::new(current_language));

        let mut text = Handlebars::new();
        text.register_escape_fn(no_escape);
        text.register_helper("current_language", Box::new(current_language));

        Self { html, text }
    }

    /// Load every file under `path`, named by its path relative to `path`.
    ///
    /// ```text
    /// templates/
    ///   myapp/emails/welcome.subject.txt      -> "myapp/emails/welcome.subject.txt"
    ///   myapp/emails/welcome.de.body.html     -> "myapp/emails/welcome.de.body.html"
    /// ```
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self> {
        let mut engine = Self::new();
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(MailError::Config(format!(
                "Template directory not found: {}",
                path.display()
            )));
        }

        engine.load_dir(path, path)?;
        Ok(engine)
    }

    fn load_dir(&mut self, root: &Path, dir: &Path) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry_path = entry?.path();

            let hidden = entry_path
                .file_name()
                .and_then(|n| n.to_str())
                .is_none_or(|n| n.starts_with('.'));
            if hidden {
                continue;
            }

            if entry_path.is_dir() {
                self.load_dir(root, &entry_path)?;
                continue;
            }

            let name = entry_path
                .strip_prefix(root)
                .map_err(|_| MailError::Config("template outside root".to_string()))?
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let content = std::fs::read_to_string(&entry_path)?;
            self.register_template(&name, &content)?;
            debug!(template = %name, "Loaded email template");
        }

        Ok(())
    }

    /// Fail rendering on missing variables instead of rendering them empty.
    pub fn strict(mut self, strict: bool) -> Self {
        self.html.set_strict_mode(strict);
        self.text.set_strict_mode(strict);
        self
    }

    /// Register a partial usable from both HTML and text templates.
    pub fn register_partial(mut self, name: &str, content: &str) -> Result<Self> {
        self.html.register_partial(name, content)?;
        self.text.register_partial(name, content)?;
        Ok(self)
    }

    fn registry(&self, name: &str) -> &Handlebars<'static> {
        if is_html(name) { &self.html } else { &self.text }
    }
}

impl Default for HandlebarsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for HandlebarsEngine {
    fn render(&self, name: &str, context: &RenderContext) -> Result<String> {
        let registry = self.registry(name);
        if !registry.has_template(name) {
            return Err(MailError::TemplateNotFound(name.to_string()));
        }
        Ok(registry.render(name, context)?)
    }

    fn has_template(&self, name: &str) -> bool {
        self.registry(name).has_template(name)
    }

    fn register_template(&mut self, name: &str, content: &str) -> Result<()> {
        if is_html(name) {
            self.html.register_template_string(name, content)?;
        } else {
            self.text.register_template_string(name, content)?;
        }
        Ok(())
    }
}
