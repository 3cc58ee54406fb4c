//! CSL-JSON citation entries

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// One bibliographic record in CSL-JSON form
///
/// `title`, `author` and `issued` are kept as raw JSON so that a malformed
/// shape in one entry never fails the whole load. Use
/// [`CitationEntry::title`], [`CitationEntry::surnames`] and
/// [`CitationEntry::year`] to read them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CitationEntry {
    /// Citation key
    #[serde(default, deserialize_with = "string_or_empty")]
    pub id: String,

    /// Citation type tag (article, book, ...)
    #[serde(rename = "type", default, deserialize_with = "string_or_empty")]
    pub kind: String,

    #[serde(default)]
    pub title: Value,

    #[serde(default)]
    pub author: Value,

    #[serde(default)]
    pub issued: Value,

    /// Any other CSL fields, passed through unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// Set for array items that are not objects; written back out verbatim
    #[serde(skip)]
    opaque: Option<Value>,
}

/// A `{family, given}` name pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Name {
    pub family: Option<String>,
    pub given: Option<String>,
}

impl CitationEntry {
    /// Create a bare entry with only a key and type
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            title: Value::Null,
            author: Value::Null,
            issued: Value::Null,
            extra: Map::new(),
            opaque: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Value::String(title.into());
        self
    }

    /// Build an entry from one item of the bibliography array
    ///
    /// Objects are read field by field. Anything else becomes an entry with
    /// every field empty that still serializes back to the original value.
    pub fn from_value(value: Value) -> Self {
        if value.is_object() {
            if let Ok(entry) = serde_json::from_value::<CitationEntry>(value.clone()) {
                return entry;
            }
        }
        Self {
            opaque: Some(value),
            ..Self::new("", "")
        }
    }

    /// True for an item that was not a JSON object
    pub fn is_opaque(&self) -> bool {
        self.opaque.is_some()
    }

    /// The title when it is a string
    pub fn title(&self) -> Option<&str> {
        self.title.as_str()
    }

    /// Author names, or empty when `author` is not an array
    pub fn authors(&self) -> Vec<Name> {
        let Some(list) = self.author.as_array() else {
            return Vec::new();
        };
        list.iter()
            .map(|a| Name {
                family: a.get("family").and_then(Value::as_str).map(str::to_string),
                given: a.get("given").and_then(Value::as_str).map(str::to_string),
            })
            .collect()
    }

    /// Family names joined by single spaces; a missing family contributes an empty slot
    pub fn surnames(&self) -> String {
        let Some(list) = self.author.as_array() else {
            return String::new();
        };
        list.iter()
            .map(|a| text_or_empty(a.get("family")))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Publication year from `issued.date-parts[0][0]`
    pub fn year(&self) -> Option<String> {
        let first = self
            .issued
            .get("date-parts")?
            .as_array()?
            .first()?
            .as_array()?
            .first()?;
        Some(value_text(first))
    }

    /// Title text for display and matching
    pub fn title_text(&self) -> String {
        text_or_empty(Some(&self.title))
    }

    /// Flattened text the fuzzy matcher scores against
    pub fn search_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.year().unwrap_or_default(),
            self.surnames(),
            self.title_text(),
            self.id
        )
    }
}

impl Serialize for CitationEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(raw) = &self.opaque {
            return raw.serialize(serializer);
        }
        EntryFields {
            id: &self.id,
            kind: &self.kind,
            title: &self.title,
            author: &self.author,
            issued: &self.issued,
            extra: &self.extra,
        }
        .serialize(serializer)
    }
}

#[derive(Serialize)]
struct EntryFields<'a> {
    #[serde(skip_serializing_if = "is_empty")]
    id: &'a str,
    #[serde(rename = "type", skip_serializing_if = "is_empty")]
    kind: &'a str,
    #[serde(skip_serializing_if = "is_null")]
    title: &'a Value,
    #[serde(skip_serializing_if = "is_null")]
    author: &'a Value,
    #[serde(skip_serializing_if = "is_null")]
    issued: &'a Value,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

fn is_empty(s: &&str) -> bool {
    s.is_empty()
}

fn is_null(v: &&Value) -> bool {
    v.is_null()
}

/// Strings verbatim, everything else as its JSON text (`null` included)
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Like [`value_text`], but absent, `null`, `false`, `0` and `""` read as empty
fn text_or_empty(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(other) => value_text(other),
    }
}

fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}
