//! Section-to-Markdown rendering.
//!
//! Every rendered block carries its own trailing blank line, so documents are
//! assembled by plain concatenation. Values are emitted verbatim; nothing is
//! escaped.

use std::fmt::Write as _;

use markdown_template_config::Locale;

use crate::locale::text_for;
use crate::model::{
    CodeSection, HeadingSection, ImageSection, ListSection, QuoteSection, Section, TableSection,
};

pub fn render_section(section: &Section, locale: Locale) -> String {
    match section {
        Section::Heading(heading) => render_heading(heading, locale),
        Section::Paragraph(paragraph) => render_paragraph(paragraph.resolved_text()),
        Section::List(list) => render_list(list),
        Section::Code(code) => render_code(code),
        Section::Quote(quote) => render_quote(quote),
        Section::Image(image) => render_image(image, locale),
        Section::Table(table) => render_table(table),
        Section::Other { .. } => String::new(),
    }
}

/// A paragraph body followed by its blank line.
pub fn render_paragraph(text: &str) -> String {
    format!("{text}\n\n")
}

fn render_heading(heading: &HeadingSection, locale: Locale) -> String {
    let level = usize::from(heading.level.unwrap_or(1).clamp(1, 6));
    let text = non_empty(heading.text.as_deref()).unwrap_or(text_for(locale).default_heading);
    format!("{} {text}\n\n", "#".repeat(level))
}

fn render_list(list: &ListSection) -> String {
    let Some(items) = list.items.as_deref() else {
        return String::new();
    };

    let mut out = String::new();
    for (idx, item) in items.iter().enumerate() {
        if list.ordered {
            let _ = writeln!(out, "{}. {item}", idx + 1);
        } else {
            let _ = writeln!(out, "- {item}");
        }
    }
    out.push('\n');
    out
}

fn render_code(code: &CodeSection) -> String {
    format!(
        "```{}\n{}\n```\n\n",
        code.language.as_deref().unwrap_or(""),
        code.code.as_deref().unwrap_or("")
    )
}

fn render_quote(quote: &QuoteSection) -> String {
    let mut out = format!("> {}", quote.text.as_deref().unwrap_or(""));
    if let Some(author) = non_empty(quote.author.as_deref()) {
        let _ = write!(out, "\n— {author}");
    }
    out.push_str("\n\n");
    out
}

fn render_image(image: &ImageSection, locale: Locale) -> String {
    let alt = non_empty(image.alt.as_deref()).unwrap_or(text_for(locale).default_image_alt);
    let url = non_empty(image.url.as_deref()).unwrap_or("#");
    let mut out = format!("![{alt}]({url})\n");
    if let Some(caption) = non_empty(image.caption.as_deref()) {
        let _ = writeln!(out, "\n{caption}");
    }
    out.push('\n');
    out
}

fn render_table(table: &TableSection) -> String {
    let (headers, rows) = match (table.headers.as_deref(), table.rows.as_deref()) {
        (Some(headers), Some(rows)) if !headers.is_empty() => (headers, rows),
        _ => return String::new(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "| {} |", headers.join(" | "));
    let _ = writeln!(out, "| {} |", vec!["---"; headers.len()].join(" | "));
    for row in rows {
        let _ = writeln!(out, "| {} |", row.join(" | "));
    }
    out.push('\n');
    out
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}
