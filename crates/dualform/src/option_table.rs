//! Category → option lookup table.
//!
//! The host embeds this table as JSON next to the form:
//!
//! ```json
//! {
//!   "age": [["00-04", "00-04"], ["05-11", "05-11"]],
//!   "geography": { "Nation": [["England", "England"]] }
//! }
//! ```
//!
//! Every key maps to a flat list of `[value, label]` pairs, except the
//! geography key whose lists are grouped by geography type.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::FormConfig;
use crate::error::FormError;

/// One selectable choice. Serialized as a `[value, label]` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct OptionEntry {
    pub value: String,
    pub label: String,
}

impl OptionEntry {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

impl From<(String, String)> for OptionEntry {
    fn from((value, label): (String, String)) -> Self {
        Self { value, label }
    }
}

impl From<OptionEntry> for (String, String) {
    fn from(entry: OptionEntry) -> Self {
        (entry.value, entry.label)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Choices {
    Flat(Vec<OptionEntry>),
    ByGeographyType(BTreeMap<String, Vec<OptionEntry>>),
}

/// A key whose stored shape does not match how it must be looked up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub key: String,
    pub expected_grouped: bool,
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected = if self.expected_grouped {
            "grouped by geography type"
        } else {
            "a flat list"
        };
        write!(f, "Subcategory data for '{}' is not {}", self.key, expected)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionTable {
    categories: BTreeMap<String, Choices>,
}

impl OptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, FormError> {
        serde_json::from_str(text).map_err(|error| FormError::MalformedPayload {
            reason: error.to_string(),
            text: text.to_string(),
        })
    }

    pub fn insert(&mut self, key: impl Into<String>, choices: Choices) -> Option<Choices> {
        self.categories.insert(key.into(), choices)
    }

    pub fn get(&self, key: &str) -> Option<&Choices> {
        self.categories.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Options offered for `key`.
    ///
    /// An empty key, an unknown key, and an absent or empty geography type all
    /// resolve to no options. `Err` means the key exists but holds the wrong
    /// shape for how it is looked up.
    pub fn lookup(
        &self,
        key: &str,
        geography_key: &str,
        geography_type: Option<&str>,
    ) -> Result<&[OptionEntry], ShapeMismatch> {
        const NONE: &[OptionEntry] = &[];
        if key.is_empty() {
            return Ok(NONE);
        }
        let grouped = key == geography_key;
        match self.categories.get(key) {
            None => Ok(NONE),
            Some(Choices::Flat(entries)) if !grouped => Ok(entries.as_slice()),
            Some(Choices::ByGeographyType(by_type)) if grouped => Ok(geography_type
                .filter(|geography_type| !geography_type.is_empty())
                .and_then(|geography_type| by_type.get(geography_type))
                .map(Vec::as_slice)
                .unwrap_or(NONE)),
            Some(_) => Err(ShapeMismatch {
                key: key.to_string(),
                expected_grouped: grouped,
            }),
        }
    }

    /// Every distinct option across all keys and geography types, first-seen order.
    ///
    /// This is the choice set a host preloads into the value fields so that
    /// any dynamically offered value passes server-side validation.
    pub fn all_entries(&self) -> Vec<OptionEntry> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for choices in self.categories.values() {
            let lists: Vec<&Vec<OptionEntry>> = match choices {
                Choices::Flat(entries) => vec![entries],
                Choices::ByGeographyType(by_type) => by_type.values().collect(),
            };
            for entry in lists.into_iter().flatten() {
                if seen.insert(entry.value.as_str()) {
                    entries.push(entry.clone());
                }
            }
        }
        entries
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// The `<script>` element a host renders beside the form to carry the table.
pub fn render_data_script(prefix: &str, table: &OptionTable, config: &FormConfig) -> serde_json::Result<String> {
    let json = table.to_json()?;
    let mut escaped = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => escaped.push_str("\\u003C"),
            '>' => escaped.push_str("\\u003E"),
            '&' => escaped.push_str("\\u0026"),
            _ => escaped.push(c),
        }
    }
    Ok(format!(
        "<script type=\"application/json\" id=\"{}\">{}</script>",
        config.data_script_id(prefix),
        escaped
    ))
}
