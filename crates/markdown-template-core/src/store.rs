//! Directory-backed template store.
//!
//! Each template lives in its own `*.json` file. The store indexes them by
//! name and remembers which file backs each entry, so updates and removals
//! touch the file the template actually came from.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use strsim::normalized_levenshtein;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{TemplateError, TemplateResult};
use crate::fs::write_atomic;
use crate::model::Template;
use crate::validate::{validate, Violations};

const SUGGESTION_THRESHOLD: f64 = 0.6;

#[derive(Clone, Debug)]
struct StoredTemplate {
    template: Template,
    path: PathBuf,
}

/// A file that was present in the store directory but could not be loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Clone, Debug)]
pub struct TemplateStore {
    dir: PathBuf,
    entries: BTreeMap<String, StoredTemplate>,
    skipped: Vec<SkippedFile>,
}

impl TemplateStore {
    /// A store with no entries that will persist into `dir`.
    pub fn empty(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: BTreeMap::new(),
            skipped: Vec::new(),
        }
    }

    /// Index every `*.json` file directly inside `dir`.
    ///
    /// Files that cannot be read, parsed, validated or decoded are skipped with
    /// a warning and reported by [`TemplateStore::skipped`]. A missing
    /// directory yields an empty store.
    pub fn load(dir: impl Into<PathBuf>) -> Self {
        let mut store = Self::empty(dir);
        if !store.dir.is_dir() {
            info!(dir = %store.dir.display(), "template directory does not exist; starting empty");
            return store;
        }

        let walker = WalkDir::new(&store.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    store.skip(path, err.to_string());
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || !has_json_extension(path) {
                continue;
            }

            match read_template(path) {
                Ok(template) => store.index(template, path.to_path_buf()),
                Err(err) => store.skip(path.to_path_buf(), err.to_string()),
            }
        }

        info!(
            dir = %store.dir.display(),
            loaded = store.entries.len(),
            skipped = store.skipped.len(),
            "loaded templates"
        );
        store
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Template names in sorted order.
    pub fn list(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.entries.get(name).map(|entry| &entry.template)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The file backing `name`, if it is stored.
    pub fn path_of(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(|entry| entry.path.as_path())
    }

    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    /// Like [`TemplateStore::get`], but a missing name is an error with a suggestion.
    pub fn require(&self, name: &str) -> TemplateResult<&Template> {
        self.get(name).ok_or_else(|| self.not_found(name))
    }

    /// Validate `candidate`, persist it and index it, replacing any template
    /// with the same name. Returns the file it was written to.
    pub fn add(&mut self, candidate: Value) -> TemplateResult<PathBuf> {
        let name = candidate
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>")
            .to_owned();

        validate(&candidate).map_err(|violations| TemplateError::Validation {
            name: name.clone(),
            violations,
        })?;
        if !is_file_name_safe(&name) {
            return Err(TemplateError::Validation {
                name,
                violations: Violations::single("name", "must be usable as a file name"),
            });
        }

        let template =
            Template::from_value(candidate.clone()).map_err(|err| TemplateError::Validation {
                name: name.clone(),
                violations: Violations::single("$", err.to_string()),
            })?;

        let path = self
            .path_of(&name)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.dir.join(file_name_for(&name)));
        if let Some(owner) = self
            .entries
            .iter()
            .find(|(other, entry)| other.as_str() != name && entry.path == path)
            .map(|(other, _)| other.clone())
        {
            return Err(TemplateError::Validation {
                name,
                violations: Violations::single(
                    "name",
                    format!("file {} already backs template '{owner}'", path.display()),
                ),
            });
        }
        let mut contents = serde_json::to_string_pretty(&candidate)?;
        contents.push('\n');
        write_atomic(&path, &contents)?;

        info!(template = %name, path = %path.display(), "stored template");
        self.entries.insert(
            name,
            StoredTemplate {
                template,
                path: path.clone(),
            },
        );
        Ok(path)
    }

    /// Read a JSON template file from anywhere and add it to the store.
    pub fn add_from_path(&mut self, path: &Path) -> TemplateResult<PathBuf> {
        let candidate = read_json(path)?;
        self.add(candidate)
    }

    pub fn add_template(&mut self, template: &Template) -> TemplateResult<PathBuf> {
        self.add(template.to_value()?)
    }

    /// Delete the backing file and drop the entry.
    ///
    /// A file that has already disappeared is not an error; any other I/O
    /// failure leaves the store untouched.
    pub fn remove(&mut self, name: &str) -> TemplateResult<Template> {
        let Some(entry) = self.entries.get(name) else {
            return Err(self.not_found(name));
        };

        match fs::remove_file(&entry.path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(
                    template = %name,
                    path = %entry.path.display(),
                    "template file already removed"
                );
            }
            Err(err) => return Err(TemplateError::io(&entry.path, err)),
        }

        info!(template = %name, "removed template");
        self.entries
            .remove(name)
            .map(|entry| entry.template)
            .ok_or_else(|| self.not_found(name))
    }

    pub(crate) fn not_found(&self, name: &str) -> TemplateError {
        TemplateError::NotFound {
            name: name.to_owned(),
            suggestion: closest_name(name, self.entries.keys().map(String::as_str)),
        }
    }

    fn index(&mut self, template: Template, path: PathBuf) {
        let name = template.name.clone();
        if let Some(previous) = self.entries.insert(name.clone(), StoredTemplate { template, path }) {
            warn!(
                template = %name,
                replaced = %previous.path.display(),
                "duplicate template name; the later file wins"
            );
        }
    }

    fn skip(&mut self, path: PathBuf, reason: String) {
        warn!(path = %path.display(), %reason, "skipping template file");
        self.skipped.push(SkippedFile { path, reason });
    }
}

/// `<name>.json`, the file a new template is written to.
pub fn file_name_for(name: &str) -> String {
    format!("{name}.json")
}

fn is_file_name_safe(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn read_json(path: &Path) -> TemplateResult<Value> {
    let raw = fs::read_to_string(path).map_err(|err| TemplateError::io(path, err))?;
    serde_json::from_str(&raw).map_err(|source| TemplateError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_template(path: &Path) -> TemplateResult<Template> {
    let candidate = read_json(path)?;
    let name = candidate
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_default();

    validate(&candidate).map_err(|violations| TemplateError::Validation {
        name: name.clone(),
        violations,
    })?;
    Template::from_value(candidate).map_err(|err| TemplateError::Validation {
        name,
        violations: Violations::single("$", err.to_string()),
    })
}

fn closest_name<'a>(name: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    candidates
        .map(|candidate| (candidate, normalized_levenshtein(name, candidate)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(candidate, _)| candidate.to_owned())
}
