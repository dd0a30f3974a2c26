//! Whole-document composition: title, sections, optional metadata block.

use chrono::{DateTime, Utc};
use markdown_template_config::{Locale, RenderSettings};
use markdown_template_format::Metadata;
use tracing::debug;

use crate::document::{count_words, GeneratedDocument};
use crate::locale::text_for;
use crate::model::{Section, Template};
use crate::render::{render_paragraph, render_section};

/// Knobs for placeholder fitting and locale defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Target word count for placeholder paragraphs. `None` leaves them alone.
    pub max_words: Option<usize>,
    /// Pad short placeholders up to `max_words`.
    pub expand: bool,
    pub locale: Locale,
}

impl RenderOptions {
    pub fn with_locale(locale: Locale) -> Self {
        Self {
            locale,
            ..Self::default()
        }
    }

    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = Some(max_words).filter(|limit| *limit > 0);
        self
    }

    pub fn with_expand(mut self, expand: bool) -> Self {
        self.expand = expand;
        self
    }
}

impl From<&RenderSettings> for RenderOptions {
    fn from(settings: &RenderSettings) -> Self {
        Self {
            max_words: settings.max_words,
            expand: settings.expand,
            locale: settings.locale,
        }
    }
}

/// Title precedence: explicit argument, then the template's own, then the locale default.
pub fn resolve_title<'a>(template: &'a Template, title: Option<&'a str>, locale: Locale) -> &'a str {
    title
        .filter(|title| !title.is_empty())
        .or_else(|| template.title.as_deref().filter(|title| !title.is_empty()))
        .unwrap_or(text_for(locale).default_title)
}

pub fn compose(template: &Template, title: Option<&str>, options: &RenderOptions) -> String {
    let title = resolve_title(template, title, options.locale);
    let mut out = format!("# {title}\n\n");

    for section in &template.sections {
        match section {
            Section::Paragraph(paragraph) => match paragraph.placeholder_in_use() {
                Some(placeholder) => {
                    out.push_str(&render_paragraph(&fit_placeholder(placeholder, options)))
                }
                None => out.push_str(&render_section(section, options.locale)),
            },
            _ => out.push_str(&render_section(section, options.locale)),
        }
    }

    debug!(
        template = %template.name,
        sections = template.sections.len(),
        bytes = out.len(),
        "composed document"
    );
    out
}

/// Compose and append the metadata block, recording the facts in `metadata`.
pub fn compose_enhanced(
    template: &Template,
    title: Option<&str>,
    options: &RenderOptions,
    created_at: DateTime<Utc>,
) -> GeneratedDocument {
    let mut content = compose(template, title, options);
    let metadata = Metadata {
        created_at,
        template: template.name.clone(),
        title: resolve_title(template, title, options.locale).to_owned(),
        word_count: count_words(&content),
    };
    content.push_str(&metadata_block(&metadata, options.locale));
    GeneratedDocument {
        content,
        metadata: Some(metadata),
    }
}

/// Truncate or pad a placeholder to `options.max_words`.
pub fn fit_placeholder(placeholder: &str, options: &RenderOptions) -> String {
    let Some(limit) = options.max_words.filter(|limit| *limit > 0) else {
        return placeholder.to_owned();
    };

    let words: Vec<&str> = placeholder.split_whitespace().collect();
    if words.len() > limit {
        format!("{}...", words[..limit].join(" "))
    } else if options.expand && words.len() < limit {
        format!(
            "{placeholder} {}",
            padding(limit - words.len(), options.locale)
        )
    } else {
        placeholder.to_owned()
    }
}

/// Up to `count` words from the locale vocabulary, with a `", "` break before every fifth.
pub fn padding(count: usize, locale: Locale) -> String {
    let text = text_for(locale);
    let mut out = String::new();
    for (idx, word) in text.padding.iter().take(count).enumerate() {
        if idx > 0 {
            out.push_str(if idx % 5 == 0 { ", " } else { text.separator });
        }
        out.push_str(word);
    }
    out
}

fn metadata_block(metadata: &Metadata, locale: Locale) -> String {
    let text = text_for(locale);
    format!(
        "---\n{}: {}\n{}: {}\n{}: {}\n{}: {}\n---\n",
        text.label_created,
        metadata.created_at_iso(),
        text.label_template,
        metadata.template,
        text.label_title,
        metadata.title,
        text.label_words,
        metadata.word_count,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HeadingSection, ParagraphSection};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn placeholder_template(placeholder: &str) -> Template {
        Template::new("t")
            .with_title("T")
            .with_section(Section::Paragraph(ParagraphSection {
                text: None,
                placeholder: Some(placeholder.into()),
            }))
    }

    #[test]
    fn title_precedence() {
        let template = Template::new("t").with_title("From template");
        assert_eq!(resolve_title(&template, Some("Given"), Locale::Zh), "Given");
        assert_eq!(resolve_title(&template, Some(""), Locale::Zh), "From template");
        assert_eq!(resolve_title(&Template::new("t"), None, Locale::Zh), "新文章");
        assert_eq!(resolve_title(&Template::new("t"), None, Locale::En), "New Article");
    }

    #[test]
    fn composes_title_then_sections_in_order() {
        let template = Template::new("t")
            .with_section(Section::Heading(HeadingSection {
                level: Some(2),
                text: Some("Intro".into()),
            }))
            .with_section(Section::Paragraph(ParagraphSection {
                text: Some("Body".into()),
                placeholder: None,
            }));

        assert_eq!(
            compose(&template, Some("Doc"), &RenderOptions::default()),
            "# Doc\n\n## Intro\n\nBody\n\n"
        );
    }

    #[test]
    fn truncates_long_placeholders() {
        let options = RenderOptions::with_locale(Locale::En).with_max_words(3);
        assert_eq!(fit_placeholder("one two  three four", &options), "one two three...");
    }

    #[test]
    fn leaves_placeholders_alone_without_limit() {
        let options = RenderOptions::with_locale(Locale::En).with_expand(true);
        assert_eq!(fit_placeholder("one two", &options), "one two");
        assert_eq!(RenderOptions::default().with_max_words(0).max_words, None);
    }

    #[test]
    fn short_placeholders_are_kept_without_expand() {
        let options = RenderOptions::with_locale(Locale::En).with_max_words(10);
        assert_eq!(fit_placeholder("one two", &options), "one two");
    }

    #[test]
    fn expands_with_locale_vocabulary() {
        let options = RenderOptions::with_locale(Locale::Zh)
            .with_max_words(8)
            .with_expand(true);
        assert_eq!(
            fit_placeholder("引言", &options),
            "引言 这是一个很好的补充说明可以帮助, 读者更好地"
        );

        let options = RenderOptions::with_locale(Locale::En)
            .with_max_words(4)
            .with_expand(true);
        assert_eq!(fit_placeholder("Start", &options), "Start this is a");
    }

    #[test]
    fn padding_stops_when_vocabulary_runs_out() {
        let zh = padding(100, Locale::Zh);
        assert!(zh.ends_with("阅读体验"));
        assert_eq!(zh.matches(", ").count(), 5);
        assert_eq!(padding(0, Locale::En), "");
    }

    #[test]
    fn explicit_paragraph_text_is_never_fitted() {
        let template = Template::new("t").with_section(Section::Paragraph(ParagraphSection {
            text: Some("one two three".into()),
            placeholder: Some("ignored".into()),
        }));
        let options = RenderOptions::with_locale(Locale::En).with_max_words(1);
        assert_eq!(
            compose(&template, Some("T"), &options),
            "# T\n\none two three\n\n"
        );
    }

    #[test]
    fn enhanced_appends_metadata_block() {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let document = compose_enhanced(
            &placeholder_template("a b c"),
            None,
            &RenderOptions::with_locale(Locale::En),
            created_at,
        );

        let metadata = document.metadata.as_ref().unwrap();
        assert_eq!(metadata.title, "T");
        assert_eq!(metadata.word_count, 5);
        assert_eq!(
            document.content,
            "# T\n\na b c\n\n---\nCreated: 2024-05-01T08:30:00.000Z\nTemplate: t\nTitle: T\nWords: 5\n---\n"
        );
    }

    #[test]
    fn enhanced_uses_chinese_labels_by_default() {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let document = compose_enhanced(
            &placeholder_template("x"),
            Some("标题一"),
            &RenderOptions::default(),
            created_at,
        );
        assert!(document.content.contains("\n生成时间: 2024-05-01T08:30:00.000Z\n"));
        assert!(document.content.contains("\n标题: 标题一\n"));
        assert!(document.content.ends_with("字数: 3\n---\n"));
    }
}
