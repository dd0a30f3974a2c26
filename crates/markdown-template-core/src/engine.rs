use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use markdown_template_config::{Config, OutputFormat};
use markdown_template_format::convert;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::compose::{compose, compose_enhanced, RenderOptions};
use crate::document::{DocumentStats, GeneratedDocument};
use crate::error::{TemplateError, TemplateResult};
use crate::fs::write_atomic;
use crate::store::TemplateStore;

/// A request to render one stored template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub template_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RequestOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced: Option<bool>,
}

impl RenderRequest {
    pub fn new(template_name: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            ..Self::default()
        }
    }
}

/// Per-request overrides of the configured render settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    pub content: String,
    /// Present only for enhanced renders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<DocumentStats>,
}

/// Already rendered content to be written under the output directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub content: String,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,
}

/// Configuration plus the template store loaded from it.
#[derive(Debug)]
pub struct TemplateEngine {
    config: Config,
    store: TemplateStore,
}

impl TemplateEngine {
    /// Load the store from the configured template directory.
    pub fn bootstrap(config: Config) -> Self {
        let store = TemplateStore::load(config.templates.dir.clone());
        Self { config, store }
    }

    pub fn with_store(config: Config, store: TemplateStore) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TemplateStore {
        &mut self.store
    }

    /// Configured render settings with any request overrides applied.
    pub fn render_options(&self, overrides: Option<&RequestOptions>) -> RenderOptions {
        let mut options = RenderOptions::from(&self.config.render);
        if let Some(overrides) = overrides {
            if let Some(word_count) = overrides.word_count {
                options = options.with_max_words(word_count);
            }
            if let Some(expand) = overrides.expand {
                options.expand = expand;
            }
        }
        options
    }

    /// Compose the named template, appending metadata when `enhanced`.
    pub fn generate(
        &self,
        name: &str,
        title: Option<&str>,
        options: &RenderOptions,
        enhanced: bool,
    ) -> TemplateResult<GeneratedDocument> {
        let template = self.store.require(name)?;
        debug!(template = %name, enhanced, "generating document");
        if enhanced {
            Ok(compose_enhanced(template, title, options, Utc::now()))
        } else {
            Ok(GeneratedDocument::plain(compose(template, title, options)))
        }
    }

    pub fn render(&self, request: &RenderRequest) -> TemplateResult<RenderResponse> {
        if request.template_name.trim().is_empty() {
            return Err(TemplateError::InvalidRequest(
                "templateName must not be empty".into(),
            ));
        }
        let enhanced = request.enhanced.unwrap_or(self.config.render.enhanced);
        let options = self.render_options(request.options.as_ref());
        let document = self.generate(
            &request.template_name,
            request.title.as_deref(),
            &options,
            enhanced,
        )?;
        let stats = enhanced.then(|| document.stats());
        Ok(RenderResponse {
            content: document.content,
            stats,
        })
    }

    /// Convert and write `request.content` into the output directory,
    /// returning the path written.
    pub fn save(&self, request: &SaveRequest) -> TemplateResult<PathBuf> {
        check_plain_file_name(&request.filename)?;
        let format = request.format.unwrap_or(self.config.output.format);
        let contents = convert(format, &request.content, None)?;
        let path = self.config.output.dir.join(&request.filename);
        write_atomic(&path, &contents)?;
        info!(path = %path.display(), format = %format, "saved document");
        Ok(path)
    }

    /// Write `document` to `path` in `format`.
    pub fn write_document(
        &self,
        document: &GeneratedDocument,
        path: &Path,
        format: OutputFormat,
    ) -> TemplateResult<()> {
        let contents = document.render_as(format)?;
        write_atomic(path, &contents)?;
        info!(path = %path.display(), format = %format, "wrote document");
        Ok(())
    }
}

fn check_plain_file_name(filename: &str) -> TemplateResult<()> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !filename.contains(['/', '\\']) => Ok(()),
        _ => Err(TemplateError::InvalidRequest(format!(
            "filename '{filename}' must be a plain file name without directories"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_file_names_only() {
        assert!(check_plain_file_name("post.md").is_ok());
        for name in ["", "..", "../post.md", "dir/post.md", "/tmp/post.md", "a\\b.md"] {
            assert!(
                matches!(
                    check_plain_file_name(name),
                    Err(TemplateError::InvalidRequest(_))
                ),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn request_uses_camel_case() {
        let request: RenderRequest = serde_json::from_str(
            r#"{ "templateName": "blog-post", "options": { "wordCount": 50, "expand": true }, "enhanced": true }"#,
        )
        .unwrap();
        assert_eq!(request.template_name, "blog-post");
        assert_eq!(
            request.options,
            Some(RequestOptions {
                word_count: Some(50),
                expand: Some(true),
            })
        );
        assert_eq!(request.enhanced, Some(true));
    }

    #[test]
    fn response_omits_missing_stats() {
        let response = RenderResponse {
            content: "# T\n\n".into(),
            stats: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("stats").is_none());
    }
}
