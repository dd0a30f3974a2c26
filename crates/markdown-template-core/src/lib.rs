//! Template store, validation and Markdown composition.
//!
//! A [`TemplateStore`] indexes JSON template files from a directory,
//! [`compose`] turns a [`Template`] into Markdown, and [`TemplateEngine`]
//! ties both to a loaded [`Config`] for request-style rendering and saving.

pub mod compose;
pub mod diff;
pub mod document;
pub mod engine;
pub mod error;
pub mod fs;
pub mod locale;
pub mod model;
pub mod render;
pub mod store;
pub mod validate;

pub use compose::{compose, compose_enhanced, fit_placeholder, padding, resolve_title, RenderOptions};
pub use document::{count_words, DocumentStats, GeneratedDocument};
pub use engine::{RenderRequest, RenderResponse, RequestOptions, SaveRequest, TemplateEngine};
pub use error::{TemplateError, TemplateResult};
pub use markdown_template_config::{Config, Locale, OutputFormat};
pub use markdown_template_format::Metadata;
pub use model::{
    CodeSection, HeadingSection, ImageSection, ListSection, ParagraphSection, QuoteSection,
    Section, TableSection, Template,
};
pub use render::render_section;
pub use store::{SkippedFile, TemplateStore};
pub use validate::{is_valid, validate, Violation, Violations};
