//! Best-effort Markdown → HTML conversion.
//!
//! A small line/block scanner tuned to the Markdown this toolkit generates.
//! It is not a CommonMark implementation: nested blocks, setext headings,
//! indented code and reference links are not recognised, plain text is
//! passed through unescaped, and the output does not round-trip.

const DEFAULT_TITLE: &str = "Generated Content";

#[derive(Debug, PartialEq)]
enum Block {
    Heading(usize, String),
    Paragraph(Vec<String>),
    Code {
        language: Option<String>,
        body: Vec<String>,
    },
    List {
        ordered: bool,
        items: Vec<String>,
    },
    Quote(Vec<String>),
    Table(Vec<Vec<String>>),
    Rule,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum LineKind<'a> {
    Blank,
    Fence(&'a str),
    Heading(usize, &'a str),
    Rule,
    Bullet(&'a str),
    Numbered(&'a str),
    Quote(&'a str),
    TableRow(&'a str),
    Text(&'a str),
}

/// Convert `markdown` into a minimal standalone HTML document.
pub fn to_html(markdown: &str) -> String {
    let blocks = scan_blocks(markdown);

    let title = blocks
        .iter()
        .find_map(|block| match block {
            Block::Heading(1, text) => Some(escape_html(text)),
            _ => None,
        })
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let body = blocks
        .iter()
        .map(render_block)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{title}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

fn classify(line: &str) -> LineKind<'_> {
    let line = line.trim_end();
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    if let Some(info) = line.strip_prefix("```") {
        return LineKind::Fence(info.trim());
    }

    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if (1..=6).contains(&hashes) {
        let rest = &line[hashes..];
        if rest.is_empty() || rest.starts_with(' ') {
            return LineKind::Heading(hashes, rest.trim());
        }
    }

    let compact = line.trim();
    if compact.len() >= 3 && compact.bytes().all(|b| b == b'-') {
        return LineKind::Rule;
    }

    for marker in ["- ", "* ", "+ "] {
        if let Some(item) = line.strip_prefix(marker) {
            return LineKind::Bullet(item.trim());
        }
    }

    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        if let Some(item) = line[digits..].strip_prefix(". ") {
            return LineKind::Numbered(item.trim());
        }
    }

    if let Some(quoted) = line.strip_prefix('>') {
        return LineKind::Quote(quoted.strip_prefix(' ').unwrap_or(quoted));
    }

    if line.starts_with('|') {
        return LineKind::TableRow(line);
    }

    LineKind::Text(line)
}

fn scan_blocks(markdown: &str) -> Vec<Block> {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut blocks = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let kind = classify(lines[idx]);
        idx += 1;

        match kind {
            LineKind::Blank => {}
            LineKind::Fence(info) => {
                let mut body = Vec::new();
                while idx < lines.len() {
                    let line = lines[idx];
                    idx += 1;
                    if line.trim() == "```" {
                        break;
                    }
                    body.push(line.to_string());
                }
                let language = (!info.is_empty()).then(|| info.to_string());
                blocks.push(Block::Code { language, body });
            }
            LineKind::Heading(level, text) => blocks.push(Block::Heading(level, text.to_string())),
            LineKind::Rule => blocks.push(Block::Rule),
            LineKind::Bullet(first) | LineKind::Numbered(first) => {
                let ordered = matches!(kind, LineKind::Numbered(_));
                let mut items = vec![first.to_string()];
                while let Some(next) = lines.get(idx).map(|line| classify(line)) {
                    match next {
                        LineKind::Bullet(item) if !ordered => items.push(item.to_string()),
                        LineKind::Numbered(item) if ordered => items.push(item.to_string()),
                        _ => break,
                    }
                    idx += 1;
                }
                blocks.push(Block::List { ordered, items });
            }
            LineKind::Quote(first) => {
                let mut quoted = vec![first.to_string()];
                while let Some(LineKind::Quote(text)) = lines.get(idx).map(|line| classify(line)) {
                    quoted.push(text.to_string());
                    idx += 1;
                }
                blocks.push(Block::Quote(quoted));
            }
            LineKind::TableRow(first) => {
                let mut rows = vec![split_row(first)];
                while let Some(LineKind::TableRow(row)) = lines.get(idx).map(|line| classify(line)) {
                    rows.push(split_row(row));
                    idx += 1;
                }
                blocks.push(Block::Table(rows));
            }
            LineKind::Text(first) => {
                let mut paragraph = vec![first.to_string()];
                while let Some(LineKind::Text(text)) = lines.get(idx).map(|line| classify(line)) {
                    paragraph.push(text.to_string());
                    idx += 1;
                }
                blocks.push(Block::Paragraph(paragraph));
            }
        }
    }

    blocks
}

fn split_row(line: &str) -> Vec<String> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn is_separator_row(row: &[String]) -> bool {
    !row.is_empty()
        && row
            .iter()
            .all(|cell| !cell.is_empty() && cell.chars().all(|ch| ch == '-' || ch == ':'))
}

fn render_block(block: &Block) -> String {
    match block {
        Block::Heading(level, text) => format!("<h{level}>{}</h{level}>", render_inline(text)),
        Block::Paragraph(lines) => {
            let text = lines
                .iter()
                .map(|line| render_inline(line))
                .collect::<Vec<_>>()
                .join("\n");
            format!("<p>{text}</p>")
        }
        Block::Code { language, body } => {
            let class = language
                .as_ref()
                .map(|lang| format!(" class=\"language-{}\"", escape_html(lang)))
                .unwrap_or_default();
            format!(
                "<pre><code{class}>{}</code></pre>",
                escape_html(&body.join("\n"))
            )
        }
        Block::List { ordered, items } => {
            let tag = if *ordered { "ol" } else { "ul" };
            let mut html = format!("<{tag}>\n");
            for item in items {
                html.push_str(&format!("<li>{}</li>\n", render_inline(item)));
            }
            html.push_str(&format!("</{tag}>"));
            html
        }
        Block::Quote(lines) => {
            let text = lines
                .iter()
                .map(|line| render_inline(line))
                .collect::<Vec<_>>()
                .join("\n");
            format!("<blockquote>{text}</blockquote>")
        }
        Block::Table(rows) => render_table(rows),
        Block::Rule => "<hr>".to_string(),
    }
}

fn render_table(rows: &[Vec<String>]) -> String {
    let has_header = rows.len() > 1 && is_separator_row(&rows[1]);
    let mut html = String::from("<table>\n");

    let body_rows = if has_header {
        html.push_str("<thead><tr>");
        for cell in &rows[0] {
            html.push_str(&format!("<th>{}</th>", render_inline(cell)));
        }
        html.push_str("</tr></thead>\n");
        &rows[2..]
    } else {
        rows
    };

    html.push_str("<tbody>\n");
    for row in body_rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", render_inline(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");
    html
}

fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        match ch {
            '`' => {
                let run = rest.bytes().take_while(|b| *b == b'`').count();
                match code_span(rest, run) {
                    Some((code, tail)) => {
                        out.push_str("<code>");
                        out.push_str(&escape_html(code));
                        out.push_str("</code>");
                        rest = tail;
                    }
                    None => {
                        out.push_str(&rest[..run]);
                        rest = &rest[run..];
                    }
                }
                continue;
            }
            '*' => {
                if let Some((inner, tail, strong)) = emphasis(rest) {
                    let tag = if strong { "strong" } else { "em" };
                    out.push_str(&format!("<{tag}>{}</{tag}>", render_inline(inner)));
                    rest = tail;
                    continue;
                }
            }
            '!' => {
                if let Some((alt, url, tail)) = link(&rest[1..]) {
                    out.push_str(&format!(
                        "<img src=\"{}\" alt=\"{}\">",
                        escape_html(url),
                        escape_html(alt)
                    ));
                    rest = tail;
                    continue;
                }
            }
            '[' => {
                if let Some((label, url, tail)) = link(rest) {
                    out.push_str(&format!(
                        "<a href=\"{}\">{}</a>",
                        escape_html(url),
                        render_inline(label)
                    ));
                    rest = tail;
                    continue;
                }
            }
            _ => {}
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

/// Match a code span opened by `run` backticks; the closing run must have the same length.
fn code_span(text: &str, run: usize) -> Option<(&str, &str)> {
    let fence = &text[..run];
    let body = &text[run..];
    let mut search = 0;

    while let Some(pos) = body[search..].find(fence) {
        let start = search + pos;
        let closing = body[start..].bytes().take_while(|b| *b == b'`').count();
        if closing == run {
            let code = &body[..start];
            let code = if code.len() >= 2
                && code.starts_with(' ')
                && code.ends_with(' ')
                && !code.trim().is_empty()
            {
                &code[1..code.len() - 1]
            } else {
                code
            };
            return Some((code, &body[start + run..]));
        }
        search = start + closing;
    }

    None
}

/// Returns `(inner, tail, is_strong)` for `**strong**` or `*em*` at the start of `text`.
fn emphasis(text: &str) -> Option<(&str, &str, bool)> {
    if let Some(body) = text.strip_prefix("**") {
        if let Some(mut end) = body.find("**") {
            // `***x***` closes the strong run at the last pair of stars.
            while body[end + 2..].starts_with('*') {
                end += 1;
            }
            if end > 0 {
                return Some((&body[..end], &body[end + 2..], true));
            }
        }
    }

    let body = text.strip_prefix('*')?;
    if body.starts_with(char::is_whitespace) || body.starts_with('*') {
        return None;
    }
    let end = body.match_indices('*').map(|(idx, _)| idx).find(|&idx| {
        idx > 0
            && !body[..idx].ends_with(char::is_whitespace)
            && !body[idx + 1..].starts_with('*')
    })?;
    Some((&body[..end], &body[end + 1..], false))
}

/// Returns `(label, url, tail)` for `[label](url)` at the start of `text`.
fn link(text: &str) -> Option<(&str, &str, &str)> {
    let body = text.strip_prefix('[')?;
    let close = body.find("](")?;
    let after = &body[close + 2..];
    let end = after.find(')')?;
    Some((&body[..close], &after[..end], &after[end + 1..]))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn body_of(html: &str) -> &str {
        let start = html.find("<body>\n").unwrap() + "<body>\n".len();
        let end = html.rfind("\n</body>").unwrap();
        &html[start..end]
    }

    #[test]
    fn converts_headings_paragraphs_and_lists() {
        let markdown = "# Title\n\nIntro line\nsecond line\n\n## Points\n\n- one\n- two\n\n";
        let html = to_html(markdown);

        assert_eq!(
            body_of(&html),
            "<h1>Title</h1>\n<p>Intro line\nsecond line</p>\n<h2>Points</h2>\n<ul>\n<li>one</li>\n<li>two</li>\n</ul>"
        );
        assert!(html.contains("<title>Title</title>"));
        assert!(html.starts_with("<!DOCTYPE html>"));
    }

    #[test]
    fn falls_back_to_default_title_without_h1() {
        let html = to_html("## Only a subheading\n");
        assert!(html.contains("<title>Generated Content</title>"));
    }

    #[test]
    fn fenced_code_is_escaped_and_not_scanned() {
        let markdown = "```rust\nlet a = 1 < 2;\n# not a heading\n- not a list\n```\n\n";
        assert_eq!(
            body_of(&to_html(markdown)),
            "<pre><code class=\"language-rust\">let a = 1 &lt; 2;\n# not a heading\n- not a list</code></pre>"
        );
    }

    #[test]
    fn code_spans_suppress_emphasis() {
        assert_eq!(
            render_inline("use `a*b*c` here"),
            "use <code>a*b*c</code> here"
        );
    }

    #[test]
    fn code_spans_may_contain_backticks() {
        assert_eq!(
            render_inline("``a ` b`` and `x`"),
            "<code>a ` b</code> and <code>x</code>"
        );
        assert_eq!(render_inline("`` ` ``"), "<code>`</code>");
    }

    #[test]
    fn unmatched_backticks_stay_literal() {
        assert_eq!(render_inline("a `` b ` c"), "a `` b ` c");
    }

    #[test]
    fn strong_and_emphasis_nest() {
        assert_eq!(
            render_inline("**bold with *em* inside** and *plain*"),
            "<strong>bold with <em>em</em> inside</strong> and <em>plain</em>"
        );
        assert_eq!(
            render_inline("***both***"),
            "<strong><em>both</em></strong>"
        );
    }

    #[test]
    fn lone_stars_are_not_emphasis() {
        assert_eq!(render_inline("2 * 3 * 4"), "2 * 3 * 4");
        assert_eq!(render_inline("*open only"), "*open only");
    }

    #[test]
    fn images_and_links() {
        assert_eq!(
            render_inline("![Diagram](img/a.png) see [docs](https://example.com)"),
            "<img src=\"img/a.png\" alt=\"Diagram\"> see <a href=\"https://example.com\">docs</a>"
        );
    }

    #[test]
    fn quotes_rules_and_ordered_lists() {
        let markdown = "> quoted\n> more\n\n---\n\n1. first\n2. second\n";
        assert_eq!(
            body_of(&to_html(markdown)),
            "<blockquote>quoted\nmore</blockquote>\n<hr>\n<ol>\n<li>first</li>\n<li>second</li>\n</ol>"
        );
    }

    #[test]
    fn tables_with_header_row() {
        let markdown = "| A | B |\n| --- | --- |\n| 1 | **2** |\n\n";
        assert_eq!(
            body_of(&to_html(markdown)),
            "<table>\n<thead><tr><th>A</th><th>B</th></tr></thead>\n<tbody>\n<tr><td>1</td><td><strong>2</strong></td></tr>\n</tbody>\n</table>"
        );
    }

    #[test]
    fn metadata_block_becomes_rules_and_paragraph() {
        let markdown = "# T\n\n---\nTemplate: x\nWords: 3\n---\n";
        assert_eq!(
            body_of(&to_html(markdown)),
            "<h1>T</h1>\n<hr>\n<p>Template: x\nWords: 3</p>\n<hr>"
        );
    }
}
