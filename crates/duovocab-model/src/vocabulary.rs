use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use unicode_normalization::UnicodeNormalization;

/// Open attribute map as returned by the vocabulary service.
///
/// The service decides which keys exist, so records are kept as JSON maps
/// rather than fixed structs.
pub type Attributes = Map<String, Value>;

/// Placeholder written for a selected field that resolved to nothing.
pub const EMPTY_CELL: &str = "None";

/// One entry of a learner's vocabulary overview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VocabularyItem {
    /// Stable lexeme identifier; unique within one learner's vocabulary.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Every other attribute the overview carried (word, strength, ...).
    #[serde(flatten)]
    pub attributes: Attributes,
}

/// The full detail record for a single lexeme id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct WordDefinition {
    pub fields: Attributes,
}

impl VocabularyItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    /// Builder-style attribute setter, mostly useful for fixtures.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// The word's display text, if the overview carried one.
    pub fn word(&self) -> Option<&str> {
        word_text(&self.attributes)
    }

    /// True if every named field is present on the overview record, so no
    /// detail lookup is needed to fill a row.
    pub fn covers(&self, fields: &[String]) -> bool {
        fields
            .iter()
            .all(|f| f == "id" || self.attributes.contains_key(f.as_str()))
    }

    /// Overview attributes overlaid with the detail record, plus the `id`.
    ///
    /// Detail values win where both records carry the same key.
    pub fn merged_with(&self, definition: Option<&WordDefinition>) -> Attributes {
        let mut merged = Attributes::new();
        merged.insert("id".to_string(), Value::String(self.id.clone()));
        for (k, v) in &self.attributes {
            merged.insert(k.clone(), v.clone());
        }
        if let Some(def) = definition {
            for (k, v) in &def.fields {
                merged.insert(k.clone(), v.clone());
            }
        }
        merged
    }
}

/// Lexeme ids are strings on the wire, but tolerate numeric ids too.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Word text of a record: `word` on detail records, `word_string` on
/// overview records.
pub fn word_text(record: &Attributes) -> Option<&str> {
    ["word", "word_string"]
        .iter()
        .filter_map(|k| record.get(*k).and_then(Value::as_str))
        .find(|w| !w.trim().is_empty())
}

/// True for values that count as "no value": absent, null, "", [] and {}.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

/// Render a field value as a single table cell.
///
/// Arrays are joined with ", ", empty values become [`EMPTY_CELL`].
pub fn render_cell(value: Option<&Value>) -> String {
    let value = match value {
        Some(v) if !is_empty_value(Some(v)) => v,
        _ => return EMPTY_CELL.to_string(),
    };
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    };
    let cell = normalize_cell(&raw);
    if cell.is_empty() {
        EMPTY_CELL.to_string()
    } else {
        cell
    }
}

/// NFC-normalize cell text and fold tabs and line breaks into single spaces
/// so each row stays on one physical line.
pub fn normalize_cell(input: &str) -> String {
    let nfc: String = input.nfc().collect();
    nfc.split(['\t', '\n', '\r'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
