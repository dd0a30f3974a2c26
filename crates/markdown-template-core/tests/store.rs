use std::fs;

use markdown_template_core::{Section, Template, TemplateError, TemplateStore};
use markdown_template_test_support::{sample_template, write_template};
use serde_json::json;
use tempfile::tempdir;

#[test]
fn missing_directory_loads_empty() {
    let dir = tempdir().unwrap();
    let store = TemplateStore::load(dir.path().join("absent"));
    assert!(store.is_empty());
    assert!(store.skipped().is_empty());
}

#[test]
fn load_indexes_valid_files_and_skips_the_rest() {
    let dir = tempdir().unwrap();
    write_template(dir.path(), "a.json", r#"{ "name": "alpha", "sections": [] }"#);
    write_template(dir.path(), "b.json", "{ not json");
    write_template(dir.path(), "c.json", r#"{ "sections": [] }"#);
    write_template(dir.path(), "d.json", r#"{ "name": "delta", "sections": [{ "type": "heading", "level": 9 }] }"#);
    write_template(dir.path(), "notes.txt", r#"{ "name": "ignored", "sections": [] }"#);
    write_template(&dir.path().join("nested"), "e.json", r#"{ "name": "nested", "sections": [] }"#);

    let store = TemplateStore::load(dir.path());

    assert_eq!(store.list(), vec!["alpha"]);
    let skipped: Vec<_> = store
        .skipped()
        .iter()
        .map(|skipped| skipped.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(skipped, vec!["b.json", "c.json", "d.json"]);
    assert!(store.skipped()[2].reason.contains("sections[0].level"));
}

#[test]
fn later_file_wins_on_duplicate_names() {
    let dir = tempdir().unwrap();
    write_template(dir.path(), "1-first.json", r#"{ "name": "dup", "title": "First", "sections": [] }"#);
    write_template(dir.path(), "2-second.json", r#"{ "name": "dup", "title": "Second", "sections": [] }"#);

    let store = TemplateStore::load(dir.path());

    assert_eq!(store.len(), 1);
    assert_eq!(store.get("dup").unwrap().title.as_deref(), Some("Second"));
    assert!(store.path_of("dup").unwrap().ends_with("2-second.json"));
}

#[test]
fn add_persists_and_indexes() {
    let dir = tempdir().unwrap();
    let mut store = TemplateStore::load(dir.path().join("templates"));

    let path = store.add(sample_template()).unwrap();

    assert_eq!(path, dir.path().join("templates/blog-post.json"));
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.ends_with("}\n"));
    assert!(written.contains("\"timeline\""));

    let reloaded = TemplateStore::load(dir.path().join("templates"));
    assert_eq!(reloaded.get("blog-post"), store.get("blog-post"));
    assert_eq!(reloaded.get("blog-post").unwrap().sections.len(), 8);
}

#[test]
fn add_overwrites_the_file_that_backs_the_name() {
    let dir = tempdir().unwrap();
    write_template(dir.path(), "custom-file.json", r#"{ "name": "guide", "sections": [] }"#);
    let mut store = TemplateStore::load(dir.path());

    let path = store
        .add(json!({ "name": "guide", "title": "Updated", "sections": [] }))
        .unwrap();

    assert!(path.ends_with("custom-file.json"));
    assert!(!dir.path().join("guide.json").exists());
    assert_eq!(store.get("guide").unwrap().title.as_deref(), Some("Updated"));
}

#[test]
fn add_refuses_a_file_that_backs_another_template() {
    let dir = tempdir().unwrap();
    let path = write_template(dir.path(), "guide.json", r#"{ "name": "other", "sections": [] }"#);
    let mut store = TemplateStore::load(dir.path());

    let err = store
        .add(json!({ "name": "guide", "sections": [] }))
        .unwrap_err();

    match &err {
        TemplateError::Validation { violations, .. } => assert_eq!(violations.len(), 1),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("already backs template 'other'"));
    assert_eq!(store.list(), vec!["other"]);
    assert!(fs::read_to_string(&path).unwrap().contains("\"other\""));

    store.remove("other").unwrap();
    assert!(!path.exists());
}

#[test]
fn add_rejects_invalid_candidates_without_writing() {
    let dir = tempdir().unwrap();
    let mut store = TemplateStore::empty(dir.path());

    let err = store.add(json!({ "sections": "nope" })).unwrap_err();
    match err {
        TemplateError::Validation { violations, .. } => assert_eq!(violations.len(), 2),
        other => panic!("unexpected error: {other}"),
    }

    let err = store
        .add(json!({ "name": "../escape", "sections": [] }))
        .unwrap_err();
    assert!(matches!(err, TemplateError::Validation { .. }));

    assert!(store.is_empty());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn add_from_path_reports_parse_errors() {
    let dir = tempdir().unwrap();
    let source = write_template(&dir.path().join("incoming"), "broken.json", "[1,");
    let mut store = TemplateStore::empty(dir.path().join("templates"));

    let err = store.add_from_path(&source).unwrap_err();
    assert!(matches!(err, TemplateError::Parse { .. }));

    let err = store
        .add_from_path(&dir.path().join("incoming/missing.json"))
        .unwrap_err();
    assert!(matches!(err, TemplateError::Io { .. }));
}

#[test]
fn add_template_round_trips_the_model() {
    let dir = tempdir().unwrap();
    let mut store = TemplateStore::empty(dir.path());

    store.add_template(&Template::default_article()).unwrap();

    let reloaded = TemplateStore::load(dir.path());
    let article = reloaded.get("default-article").unwrap();
    assert_eq!(article, &Template::default_article());
    assert!(matches!(article.sections[1], Section::Heading(_)));
}

#[test]
fn remove_unknown_name_leaves_store_unchanged() {
    let dir = tempdir().unwrap();
    write_template(dir.path(), "blog-post.json", r#"{ "name": "blog-post", "sections": [] }"#);
    let mut store = TemplateStore::load(dir.path());

    let err = store.remove("blog-pst").unwrap_err();

    match &err {
        TemplateError::NotFound { name, suggestion } => {
            assert_eq!(name, "blog-pst");
            assert_eq!(suggestion.as_deref(), Some("blog-post"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("did you mean 'blog-post'"));
    assert_eq!(store.list(), vec!["blog-post"]);
    assert!(dir.path().join("blog-post.json").exists());
}

#[test]
fn remove_deletes_the_backing_file() {
    let dir = tempdir().unwrap();
    write_template(dir.path(), "x.json", r#"{ "name": "guide", "sections": [] }"#);
    let mut store = TemplateStore::load(dir.path());

    let removed = store.remove("guide").unwrap();

    assert_eq!(removed.name, "guide");
    assert!(store.is_empty());
    assert!(!dir.path().join("x.json").exists());
}

#[test]
fn remove_tolerates_an_already_deleted_file() {
    let dir = tempdir().unwrap();
    let path = write_template(dir.path(), "gone.json", r#"{ "name": "gone", "sections": [] }"#);
    let mut store = TemplateStore::load(dir.path());
    fs::remove_file(path).unwrap();

    store.remove("gone").unwrap();

    assert!(!store.contains("gone"));
}

#[test]
fn bundled_templates_load_cleanly() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates");
    let store = TemplateStore::load(dir);

    assert!(store.skipped().is_empty(), "{:?}", store.skipped());
    assert_eq!(store.list(), vec!["blog-post", "technical-guide"]);
}
