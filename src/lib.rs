// Mailit - templated transactional email through Mandrill with SMTP fallback
//
// Rendering and delivery live in `mailit-mail`; settings loading lives in
// `mailit-config`. This crate re-exports both.

// Re-export core functionality
pub use mailit_mail::*;

// Re-export the configuration crate
pub use mailit_config;

// Re-export for building template contexts
pub use serde_json;

// Prelude for common imports
pub mod prelude {
    pub use mailit_mail::prelude::*;
    pub use mailit_mail::{Contact, RenderContext, locale};
}
