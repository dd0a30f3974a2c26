use std::io;
use std::path::PathBuf;

use markdown_template_config::ConfigError;
use thiserror::Error;

use crate::validate::Violations;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template '{name}' is invalid:\n{violations}")]
    Validation { name: String, violations: Violations },

    #[error("template '{name}' not found{}", suggestion_hint(.suggestion))]
    NotFound {
        name: String,
        suggestion: Option<String>,
    },

    #[error("i/o error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to serialise output: {0}")]
    Format(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TemplateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|name| format!(" (did you mean '{name}'?)"))
        .unwrap_or_default()
}

pub type TemplateResult<T> = Result<T, TemplateError>;
