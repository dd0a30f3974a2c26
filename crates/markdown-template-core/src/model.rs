//! Template data model.
//!
//! Sections are a closed enum over the kinds this crate knows how to render.
//! Anything else decodes into [`Section::Other`], which keeps the raw fields so
//! that a template written by a newer tool survives a load/save cycle intact.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named, ordered list of sections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            sections: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_section(mut self, section: Section) -> Self {
        self.sections.push(section);
        self
    }

    /// Decode an already validated JSON candidate.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// The template every fresh workspace starts with.
    pub fn default_article() -> Self {
        Template::new("default-article")
            .with_title("文章标题")
            .with_section(Section::Paragraph(ParagraphSection {
                text: None,
                placeholder: Some("这是引言部分...".into()),
            }))
            .with_section(Section::Heading(HeadingSection {
                level: Some(2),
                text: Some("主要观点".into()),
            }))
            .with_section(Section::Paragraph(ParagraphSection {
                text: None,
                placeholder: Some("在这里详细描述你的主要观点...".into()),
            }))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl ParagraphSection {
    /// The placeholder, when it is what the paragraph will actually show.
    pub fn placeholder_in_use(&self) -> Option<&str> {
        if self.text.as_deref().is_some_and(|text| !text.is_empty()) {
            return None;
        }
        self.placeholder
            .as_deref()
            .filter(|placeholder| !placeholder.is_empty())
    }

    /// Explicit text, falling back to the placeholder, falling back to nothing.
    pub fn resolved_text(&self) -> &str {
        match self.text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => self.placeholder_in_use().unwrap_or(""),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ordered: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Rows are not required to match the header width.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Vec<String>>>,
}

/// One typed block of a template, tagged by its `type` field in JSON.
#[derive(Clone, Debug, PartialEq)]
pub enum Section {
    Heading(HeadingSection),
    Paragraph(ParagraphSection),
    List(ListSection),
    Code(CodeSection),
    Quote(QuoteSection),
    Image(ImageSection),
    Table(TableSection),
    /// A kind this version cannot render; `fields` still holds the `type` key.
    Other {
        kind: String,
        fields: Map<String, Value>,
    },
}

impl Section {
    pub fn kind(&self) -> &str {
        match self {
            Section::Heading(_) => "heading",
            Section::Paragraph(_) => "paragraph",
            Section::List(_) => "list",
            Section::Code(_) => "code",
            Section::Quote(_) => "quote",
            Section::Image(_) => "image",
            Section::Table(_) => "table",
            Section::Other { kind, .. } => kind,
        }
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = match self {
            Section::Heading(section) => serde_json::to_value(section),
            Section::Paragraph(section) => serde_json::to_value(section),
            Section::List(section) => serde_json::to_value(section),
            Section::Code(section) => serde_json::to_value(section),
            Section::Quote(section) => serde_json::to_value(section),
            Section::Image(section) => serde_json::to_value(section),
            Section::Table(section) => serde_json::to_value(section),
            Section::Other { fields, .. } => Ok(Value::Object(fields.clone())),
        }
        .map_err(ser::Error::custom)?;

        if let Value::Object(map) = &mut value {
            map.insert("type".into(), Value::String(self.kind().to_owned()));
        }
        value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Section {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Value::Object(fields) = Value::deserialize(deserializer)? else {
            return Err(de::Error::custom("section must be a JSON object"));
        };
        let kind = match fields.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            Some(_) => return Err(de::Error::custom("section `type` must be a string")),
            None => return Err(de::Error::missing_field("type")),
        };

        match kind.as_str() {
            "heading" => decode(fields).map(Section::Heading),
            "paragraph" => decode(fields).map(Section::Paragraph),
            "list" => decode(fields).map(Section::List),
            "code" => decode(fields).map(Section::Code),
            "quote" => decode(fields).map(Section::Quote),
            "image" => decode(fields).map(Section::Image),
            "table" => decode(fields).map(Section::Table),
            _ => Ok(Section::Other { kind, fields }),
        }
    }
}

fn decode<T, E>(fields: Map<String, Value>) -> Result<T, E>
where
    T: DeserializeOwned,
    E: de::Error,
{
    serde_json::from_value(Value::Object(fields)).map_err(E::custom)
}
