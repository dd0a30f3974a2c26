use markdown_template_core::{
    compose, compose_enhanced, Locale, RenderOptions, Section, Template, TemplateStore,
};
use markdown_template_test_support::{sample_template, words};
use pretty_assertions::assert_eq;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use serde_json::json;

fn template_from(value: serde_json::Value) -> Template {
    Template::from_value(value).unwrap()
}

fn starts(markdown: &str) -> Vec<String> {
    Parser::new_ext(markdown, Options::ENABLE_TABLES)
        .filter_map(|event| match event {
            Event::Start(tag) => Some(describe(&tag)),
            _ => None,
        })
        .collect()
}

fn describe(tag: &Tag<'_>) -> String {
    match tag {
        Tag::Heading(level, ..) => format!("heading:{}", heading_number(*level)),
        Tag::Paragraph => "paragraph".into(),
        Tag::List(None) => "ul".into(),
        Tag::List(Some(start)) => format!("ol:{start}"),
        Tag::Item => "item".into(),
        Tag::CodeBlock(CodeBlockKind::Fenced(lang)) => format!("code:{lang}"),
        Tag::CodeBlock(CodeBlockKind::Indented) => "code".into(),
        Tag::BlockQuote => "quote".into(),
        Tag::Image(..) => "image".into(),
        Tag::Table(_) => "table".into(),
        Tag::TableHead => "thead".into(),
        Tag::TableRow => "row".into(),
        Tag::TableCell => "cell".into(),
        other => format!("{other:?}"),
    }
}

fn heading_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[test]
fn document_starts_with_resolved_title() {
    let template = template_from(sample_template());
    let options = RenderOptions::default();

    assert!(compose(&template, Some("Given"), &options).starts_with("# Given\n\n"));
    assert!(compose(&template, None, &options).starts_with("# Sample Post\n\n"));

    let untitled = Template::new("bare");
    assert_eq!(compose(&untitled, None, &options), "# 新文章\n\n");
    assert_eq!(
        compose(&untitled, None, &RenderOptions::with_locale(Locale::En)),
        "# New Article\n\n"
    );
}

#[test]
fn sample_template_renders_every_section_kind() {
    let template = template_from(sample_template());
    let markdown = compose(&template, None, &RenderOptions::with_locale(Locale::En));

    assert_eq!(
        markdown,
        "# Sample Post\n\n\
         Opening thoughts about the topic\n\n\
         ## Details\n\n\
         - first\n- second\n\n\
         ```rust\nfn main() {}\n```\n\n\
         > Less is more\n— Mies\n\n\
         ![Diagram](diagram.png)\n\nFigure 1\n\n\
         | A | B |\n| --- | --- |\n| 1 | 2 |\n\n"
    );
}

#[test]
fn generated_markdown_parses_into_expected_blocks() {
    let template = template_from(sample_template());
    let markdown = compose(&template, None, &RenderOptions::default());

    assert_eq!(
        starts(&markdown),
        vec![
            "heading:1",
            "paragraph",
            "heading:2",
            "ul",
            "item",
            "item",
            "code:rust",
            "quote",
            "paragraph",
            "paragraph",
            "image",
            "paragraph",
            "table",
            "thead",
            "cell",
            "cell",
            "row",
            "cell",
            "cell",
        ]
    );
}

#[test]
fn ordered_lists_parse_as_numbered_lists() {
    let template = template_from(json!({
        "name": "steps",
        "sections": [{ "type": "list", "items": ["install", "run"], "ordered": true }]
    }));
    let markdown = compose(&template, Some("Steps"), &RenderOptions::default());

    assert_eq!(markdown, "# Steps\n\n1. install\n2. run\n\n");
    assert_eq!(starts(&markdown), vec!["heading:1", "ol:1", "item", "item"]);
}

#[test]
fn long_placeholder_is_truncated_to_word_limit() {
    let template = template_from(json!({
        "name": "long",
        "sections": [{ "type": "paragraph", "placeholder": words(20) }]
    }));
    let options = RenderOptions::with_locale(Locale::En).with_max_words(5);

    let markdown = compose(&template, Some("T"), &options);

    assert_eq!(markdown, "# T\n\nw1 w2 w3 w4 w5...\n\n");
}

#[test]
fn short_placeholder_is_padded_when_expanding() {
    let template = template_from(json!({
        "name": "short",
        "sections": [{ "type": "paragraph", "placeholder": words(2) }]
    }));
    let options = RenderOptions::with_locale(Locale::En)
        .with_max_words(9)
        .with_expand(true);

    let markdown = compose(&template, Some("T"), &options);

    assert_eq!(
        markdown,
        "# T\n\nw1 w2 this is a helpful note, that can\n\n"
    );
}

#[test]
fn unknown_sections_contribute_nothing() {
    let template = template_from(json!({
        "name": "future",
        "sections": [
            { "type": "timeline", "events": [1, 2] },
            { "type": "paragraph", "text": "kept" }
        ]
    }));
    assert!(matches!(template.sections[0], Section::Other { .. }));
    assert_eq!(
        compose(&template, Some("T"), &RenderOptions::default()),
        "# T\n\nkept\n\n"
    );
}

#[test]
fn enhanced_document_ends_with_metadata_block() {
    let template = Template::default_article();
    let created_at = chrono::DateTime::parse_from_rfc3339("2024-03-04T05:06:07.089Z")
        .unwrap()
        .with_timezone(&chrono::Utc);

    let document = compose_enhanced(&template, None, &RenderOptions::default(), created_at);

    assert!(document.content.starts_with("# 文章标题\n\n这是引言部分...\n\n## 主要观点\n\n"));
    assert!(document.content.ends_with(
        "---\n生成时间: 2024-03-04T05:06:07.089Z\n模板: default-article\n标题: 文章标题\n字数: 6\n---\n"
    ));
    let stats = document.stats();
    assert_eq!(stats.word_count, 6);
    assert_eq!(stats.reading_time, 1);
}

#[test]
fn rendering_a_stored_template_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TemplateStore::empty(dir.path());
    store.add(sample_template()).unwrap();

    let template = store.get("blog-post").unwrap();
    let first = compose(template, None, &RenderOptions::default());
    let second = compose(template, None, &RenderOptions::default());
    assert_eq!(first, second);
}
