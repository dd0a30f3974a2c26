//! Output formatters for generated documents.
//!
//! Composed Markdown can be emitted as-is, converted to a standalone HTML page
//! with [`to_html`], or wrapped together with its [`Metadata`] in a JSON
//! envelope with [`to_json`].

mod html;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

pub use html::to_html;
pub use markdown_template_config::OutputFormat;

/// Facts recorded about a document produced in enhanced mode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    pub template: String,
    pub title: String,
    pub word_count: usize,
}

impl Metadata {
    /// ISO-8601 timestamp with millisecond precision, e.g. `2024-05-01T08:30:00.000Z`.
    pub fn created_at_iso(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

fn serialize_timestamp<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[derive(Serialize)]
struct Envelope<'a> {
    metadata: Option<&'a Metadata>,
    content: &'a str,
}

/// Serialise `{ metadata, content }` as pretty-printed JSON.
pub fn to_json(metadata: Option<&Metadata>, content: &str) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Envelope { metadata, content })
}

/// Convert composed Markdown into the requested output format.
pub fn convert(
    format: OutputFormat,
    content: &str,
    metadata: Option<&Metadata>,
) -> serde_json::Result<String> {
    match format {
        OutputFormat::Markdown => Ok(content.to_owned()),
        OutputFormat::Html => Ok(to_html(content)),
        OutputFormat::Json => to_json(metadata, content),
    }
}
