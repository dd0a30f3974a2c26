//! Shared test harness utilities for markdown-template crates.

use std::fs;
use std::path::{Path, PathBuf};

use markdown_template_config::Config;
use serde_json::{json, Value};

/// Baseline configuration rooted at `root`: templates in `root/templates`,
/// output in `root/output`.
pub fn test_config(root: &Path) -> Config {
    Config::defaults_in(root)
}

/// A template exercising every section kind, plus one the renderer does not know.
pub fn sample_template() -> Value {
    json!({
        "name": "blog-post",
        "title": "Sample Post",
        "sections": [
            { "type": "paragraph", "placeholder": "Opening thoughts about the topic" },
            { "type": "heading", "level": 2, "text": "Details" },
            { "type": "list", "items": ["first", "second"] },
            { "type": "code", "language": "rust", "code": "fn main() {}" },
            { "type": "quote", "text": "Less is more", "author": "Mies" },
            { "type": "image", "url": "diagram.png", "alt": "Diagram", "caption": "Figure 1" },
            { "type": "table", "headers": ["A", "B"], "rows": [["1", "2"]] },
            { "type": "timeline", "events": [] }
        ]
    })
}

/// Write `contents` to `dir/file`, creating `dir` if needed.
pub fn write_template(dir: &Path, file: &str, contents: &str) -> PathBuf {
    fs::create_dir_all(dir).expect("create template dir");
    let path = dir.join(file);
    fs::write(&path, contents).expect("write template");
    path
}

/// `count` numbered words joined by single spaces: `w1 w2 ... wN`.
pub fn words(count: usize) -> String {
    (1..=count)
        .map(|idx| format!("w{idx}"))
        .collect::<Vec<_>>()
        .join(" ")
}
