//! Structural checks applied to candidate templates before they are stored.
//!
//! Validation runs on the raw JSON so every problem can be reported with its
//! location, not just the first one a typed decoder trips over. Section kinds
//! the renderer does not know are accepted; they render to nothing.

use std::fmt;

use serde_json::{Map, Value};

/// One failed rule, located by a JSON-path-like string such as `sections[2].level`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Non-empty list of violations, formatted as a bullet list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub(crate) fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![Violation::new(path, message)])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, violation) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {violation}")?;
        }
        Ok(())
    }
}

/// Check `candidate` against the template rules, collecting every violation.
pub fn validate(candidate: &Value) -> Result<(), Violations> {
    let Some(root) = candidate.as_object() else {
        return Err(Violations::single("$", "template must be a JSON object"));
    };

    let mut violations = Vec::new();

    match root.get("name") {
        Some(Value::String(name)) if !name.is_empty() => {}
        Some(Value::String(_)) => violations.push(Violation::new("name", "must not be empty")),
        Some(_) => violations.push(Violation::new("name", "must be a string")),
        None => violations.push(Violation::new("name", "is required")),
    }

    if !is_absent(root.get("title")) && !root["title"].is_string() {
        violations.push(Violation::new("title", "must be a string"));
    }

    match root.get("sections") {
        Some(Value::Array(sections)) => {
            for (idx, section) in sections.iter().enumerate() {
                check_section(idx, section, &mut violations);
            }
        }
        Some(_) => violations.push(Violation::new("sections", "must be an array")),
        None => violations.push(Violation::new("sections", "is required")),
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(Violations(violations))
    }
}

pub fn is_valid(candidate: &Value) -> bool {
    validate(candidate).is_ok()
}

fn check_section(idx: usize, section: &Value, violations: &mut Vec<Violation>) {
    let path = format!("sections[{idx}]");
    let Some(fields) = section.as_object() else {
        violations.push(Violation::new(path, "must be an object"));
        return;
    };

    let kind = match fields.get("type") {
        Some(Value::String(kind)) => kind.as_str(),
        _ => {
            violations.push(Violation::new(format!("{path}.type"), "must be a string"));
            return;
        }
    };

    match kind {
        "heading" => {
            if let Some(level) = present(fields, "level") {
                if !matches!(level.as_u64(), Some(1..=6)) {
                    violations.push(Violation::new(
                        format!("{path}.level"),
                        "must be an integer between 1 and 6",
                    ));
                }
            }
        }
        "paragraph" | "quote" => expect_string(fields, &path, "text", violations),
        "list" => {
            if present(fields, "items").is_some_and(|items| !items.is_array()) {
                violations.push(Violation::new(format!("{path}.items"), "must be an array"));
            }
        }
        "code" => expect_string(fields, &path, "code", violations),
        _ => {}
    }
}

fn expect_string(
    fields: &Map<String, Value>,
    path: &str,
    key: &str,
    violations: &mut Vec<Violation>,
) {
    if present(fields, key).is_some_and(|value| !value.is_string()) {
        violations.push(Violation::new(format!("{path}.{key}"), "must be a string"));
    }
}

fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|value| !value.is_null())
}

fn is_absent(value: Option<&Value>) -> bool {
    value.map_or(true, Value::is_null)
}
