use markdown_template_config::OutputFormat;
use markdown_template_format::{convert, Metadata};
use serde::{Deserialize, Serialize};

use crate::error::TemplateResult;

/// Markdown produced from a template, plus metadata when composed in enhanced mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub content: String,
    pub metadata: Option<Metadata>,
}

impl GeneratedDocument {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: None,
        }
    }

    pub fn stats(&self) -> DocumentStats {
        DocumentStats::from_document(self)
    }

    /// The document as it would be written in `format`.
    pub fn render_as(&self, format: OutputFormat) -> TemplateResult<String> {
        Ok(convert(format, &self.content, self.metadata.as_ref())?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub word_count: usize,
    pub line_count: usize,
    pub character_count: usize,
    /// Minutes, at 200 words per minute, rounded up.
    pub reading_time: usize,
}

impl DocumentStats {
    pub const WORDS_PER_MINUTE: usize = 200;

    pub fn from_document(document: &GeneratedDocument) -> Self {
        let content = &document.content;
        let word_count = document
            .metadata
            .as_ref()
            .map_or_else(|| count_words(content), |metadata| metadata.word_count);
        Self {
            word_count,
            line_count: content.matches('\n').count() + 1,
            character_count: content.chars().count(),
            reading_time: word_count.div_ceil(Self::WORDS_PER_MINUTE),
        }
    }
}

/// Whitespace-delimited word count.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn counts_words_across_any_whitespace() {
        assert_eq!(count_words("  one\ttwo\n\nthree  "), 3);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn stats_for_plain_document() {
        let stats = GeneratedDocument::plain("# 标题\n\nbody text\n").stats();
        assert_eq!(
            stats,
            DocumentStats {
                word_count: 4,
                line_count: 4,
                character_count: 16,
                reading_time: 1,
            }
        );
    }

    #[test]
    fn stats_prefer_recorded_word_count() {
        let document = GeneratedDocument {
            content: "short".into(),
            metadata: Some(Metadata {
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                template: "t".into(),
                title: "T".into(),
                word_count: 401,
            }),
        };
        let stats = document.stats();
        assert_eq!(stats.word_count, 401);
        assert_eq!(stats.reading_time, 3);
    }

    #[test]
    fn empty_document_has_one_line_and_no_reading_time() {
        let stats = GeneratedDocument::plain("").stats();
        assert_eq!(stats.line_count, 1);
        assert_eq!(stats.reading_time, 0);
    }

    #[test]
    fn stats_serialise_in_camel_case() {
        let value = serde_json::to_value(GeneratedDocument::plain("a b").stats()).unwrap();
        assert_eq!(value["wordCount"], 2);
        assert_eq!(value["readingTime"], 1);
        assert!(value.get("characterCount").is_some());
    }
}
