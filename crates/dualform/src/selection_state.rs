//! Last-known selections for the primary field and each segment's secondary field.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::PLACEHOLDER_VALUE;
use crate::error::FormError;
use crate::field::SelectField;

/// Initial block value supplied by the host when the form is rendered.
///
/// Only the keys the controller reads are modelled; everything else in the
/// host object is ignored. A key holding an unexpected shape reads as absent
/// instead of failing the whole object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostState {
    #[serde(default, deserialize_with = "lenient")]
    pub x_axis: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub second_category: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub static_fields: Option<StaticFields>,
    #[serde(default, deserialize_with = "lenient")]
    pub primary_field_values: Option<SavedValues>,
    #[serde(default, deserialize_with = "lenient_segments")]
    pub segments: Option<Vec<HostSegment>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticFields {
    #[serde(default, deserialize_with = "lenient")]
    pub geography_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSegment {
    #[serde(default, deserialize_with = "lenient")]
    pub value: Option<SegmentValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentValue {
    #[serde(default, deserialize_with = "lenient")]
    pub secondary_field_value: Option<SavedValues>,
}

/// A field's saved value: one value, or several.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavedValues {
    One(String),
    Many(#[serde(deserialize_with = "strings_only")] Vec<String>),
}

impl SavedValues {
    fn to_set(&self) -> BTreeSet<String> {
        match self {
            SavedValues::One(value) if value.is_empty() => BTreeSet::new(),
            SavedValues::One(value) => BTreeSet::from([value.clone()]),
            SavedValues::Many(values) => values.iter().filter(|value| !value.is_empty()).cloned().collect(),
        }
    }
}

/// `None` when the value does not have the expected shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Unreadable segments become empty ones so later indices keep their place.
fn lenient_segments<'de, D>(deserializer: D) -> Result<Option<Vec<HostSegment>>, D::Error>
where
    D: Deserializer<'de>,
{
    let serde_json::Value::Array(items) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(Some(
        items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect(),
    ))
}

fn strings_only<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            serde_json::Value::String(value) => Some(value),
            _ => None,
        })
        .collect())
}

impl HostState {
    /// Parse the host's initial state. `null` means no state was supplied.
    ///
    /// Only text that is not JSON, or JSON that is not an object, fails.
    pub fn parse(json: &str) -> Result<Option<Self>, FormError> {
        serde_json::from_str(json).map_err(|error| FormError::InvalidHostState(error.to_string()))
    }

    pub fn with_primary_values<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.primary_field_values = Some(SavedValues::Many(values.into_iter().map(Into::into).collect()));
        self
    }

    /// Append a segment whose secondary field holds `values`.
    pub fn with_segment<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        let value = SavedValues::Many(values.into_iter().map(Into::into).collect());
        self.segments.get_or_insert_with(Vec::new).push(HostSegment {
            value: Some(SegmentValue {
                secondary_field_value: Some(value),
            }),
        });
        self
    }

    pub fn geography_type(&self) -> Option<&str> {
        self.static_fields.as_ref()?.geography_type.as_deref()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.as_ref().map_or(0, Vec::len)
    }

    /// Saved primary values.
    pub fn primary_values(&self) -> BTreeSet<String> {
        self.primary_field_values
            .as_ref()
            .map(SavedValues::to_set)
            .unwrap_or_default()
    }

    /// Saved secondary values per segment, index-aligned with `segments`.
    pub fn secondary_values(&self) -> Vec<BTreeSet<String>> {
        self.segments
            .iter()
            .flatten()
            .map(|segment| {
                segment
                    .value
                    .as_ref()
                    .and_then(|value| value.secondary_field_value.as_ref())
                    .map(SavedValues::to_set)
                    .unwrap_or_default()
            })
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionStateStore {
    primary: BTreeSet<String>,
    secondary: Vec<BTreeSet<String>>,
}

impl SelectionStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load selections from the host state. Absent host state leaves the store untouched.
    pub fn initialize(&mut self, host_state: Option<&HostState>) {
        let Some(host_state) = host_state else {
            return;
        };
        self.primary = host_state.primary_values();
        self.secondary = host_state.secondary_values();
    }

    pub fn clear_primary(&mut self) {
        self.primary.clear();
    }

    pub fn clear_secondary(&mut self) {
        self.secondary.clear();
    }

    /// Replace secondary state with what each field currently has selected.
    pub fn snapshot_secondary<F: SelectField>(&mut self, fields: Option<&[F]>) {
        let Some(fields) = fields else {
            return;
        };
        self.secondary = fields
            .iter()
            .map(|field| {
                field
                    .selected_values()
                    .into_iter()
                    .filter(|value| value != PLACEHOLDER_VALUE)
                    .collect()
            })
            .collect();
    }

    /// Re-key secondary state after the segment list changed shape.
    ///
    /// `previous_positions[i]` is where segment `i` sat when the state was
    /// captured, `None` for a segment that did not exist then.
    pub fn realign_secondary(&mut self, previous_positions: &[Option<usize>]) {
        let previous = std::mem::take(&mut self.secondary);
        self.secondary = previous_positions
            .iter()
            .map(|position| {
                position
                    .and_then(|position| previous.get(position).cloned())
                    .unwrap_or_default()
            })
            .collect();
    }

    pub fn is_primary_selected(&self, value: &str) -> bool {
        self.primary.contains(value)
    }

    pub fn is_secondary_selected(&self, value: &str, segment_index: usize) -> bool {
        self.secondary
            .get(segment_index)
            .is_some_and(|selected| selected.contains(value))
    }

    pub fn primary(&self) -> &BTreeSet<String> {
        &self.primary
    }

    pub fn secondary(&self) -> &[BTreeSet<String>] {
        &self.secondary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::MemorySelect;

    #[test]
    fn initialize_reads_primary_and_segment_values() {
        let state = HostState::parse(
            r#"{
                "x_axis": "age",
                "primary_field_values": ["00-04", "05-11"],
                "segments": [
                    {"type": "item", "id": "a1", "value": {"secondary_field_value": ["m"], "colour": "BLUE"}},
                    {"type": "item", "id": "a2", "value": {"secondary_field_value": "f"}},
                    {"type": "item", "id": "a3", "value": {}},
                    {"type": "item", "id": "a4"}
                ]
            }"#,
        )
        .unwrap();

        let mut store = SelectionStateStore::new();
        store.initialize(state.as_ref());

        assert!(store.is_primary_selected("00-04"));
        assert!(store.is_primary_selected("05-11"));
        assert!(!store.is_primary_selected("12-17"));
        assert_eq!(store.secondary().len(), 4);
        assert!(store.is_secondary_selected("m", 0));
        assert!(store.is_secondary_selected("f", 1));
        assert!(!store.is_secondary_selected("f", 2));
        assert!(!store.is_secondary_selected("f", 3));
    }

    #[test]
    fn single_string_secondary_value_is_exact_membership() {
        let state = HostState::parse(
            r#"{"segments": [{"value": {"secondary_field_value": "05-11"}}, {"value": {"secondary_field_value": ""}}]}"#,
        )
        .unwrap();

        let mut store = SelectionStateStore::new();
        store.initialize(state.as_ref());

        assert!(store.is_secondary_selected("05-11", 0));
        assert!(!store.is_secondary_selected("05", 0));
        assert!(!store.is_secondary_selected("", 0));
        assert!(store.secondary()[1].is_empty());
    }

    #[test]
    fn unexpected_shapes_read_as_absent() {
        let state = HostState::parse(
            r#"{
                "x_axis": 3,
                "second_category": ["sex"],
                "static_fields": "region",
                "primary_field_values": ["m", null, 4, ""],
                "segments": [null, {"value": {"secondary_field_value": ["x"]}}, {"value": 7}]
            }"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(state.x_axis, None);
        assert_eq!(state.second_category, None);
        assert_eq!(state.geography_type(), None);
        assert_eq!(state.primary_values(), BTreeSet::from(["m".to_string()]));
        assert_eq!(
            state.secondary_values(),
            [BTreeSet::new(), BTreeSet::from(["x".to_string()]), BTreeSet::new()]
        );

        let single = HostState::parse(r#"{"primary_field_values": "m", "segments": {"0": {}}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(single.primary_values(), BTreeSet::from(["m".to_string()]));
        assert_eq!(single.segment_count(), 0);
    }

    #[test]
    fn non_json_and_scalar_text_fails_to_parse() {
        for text in ["[1", "\"text\"", "42"] {
            assert!(matches!(HostState::parse(text), Err(FormError::InvalidHostState(_))), "{}", text);
        }
    }

    #[test]
    fn missing_keys_default_to_empty() {
        let state = HostState::parse("{}").unwrap();
        let mut store = SelectionStateStore::new();
        store.initialize(state.as_ref());
        assert!(store.primary().is_empty());
        assert!(store.secondary().is_empty());
    }

    #[test]
    fn absent_host_state_is_a_no_op() {
        let mut store = SelectionStateStore::new();
        store.initialize(Some(&HostState::default().with_primary_values(["a"]).with_segment(["x"])));

        let state = HostState::parse("null").unwrap();
        assert!(state.is_none());
        store.initialize(state.as_ref());

        assert!(store.is_primary_selected("a"));
        assert!(store.is_secondary_selected("x", 0));
    }

    #[test]
    fn out_of_range_segment_is_not_selected() {
        let mut store = SelectionStateStore::new();
        assert!(!store.is_secondary_selected("x", 0));
        store.initialize(Some(&HostState::default().with_segment(["x"])));
        assert!(!store.is_secondary_selected("x", 1));
        assert!(!store.is_secondary_selected("x", usize::MAX));
    }

    #[test]
    fn clearing_is_independent() {
        let mut store = SelectionStateStore::new();
        store.initialize(Some(&HostState::default().with_primary_values(["a"]).with_segment(["x"])));

        store.clear_primary();
        assert!(!store.is_primary_selected("a"));
        assert!(store.is_secondary_selected("x", 0));

        store.clear_secondary();
        assert!(store.secondary().is_empty());
    }

    #[test]
    fn snapshot_excludes_placeholder_and_keeps_order() {
        let first = MemorySelect::detached();
        first.reset_to_placeholder("-----");
        first.append_option(&crate::OptionEntry::new("x", "X"), true);
        first.append_option(&crate::OptionEntry::new("z", "Z"), false);
        let second = MemorySelect::detached();
        second.reset_to_placeholder("-----");
        second.select_values([""]);

        let mut store = SelectionStateStore::new();
        store.snapshot_secondary(Some(&[first, second][..]));

        assert_eq!(store.secondary().len(), 2);
        assert!(store.is_secondary_selected("x", 0));
        assert!(!store.is_secondary_selected("z", 0));
        assert!(store.secondary()[1].is_empty());
    }

    #[test]
    fn realign_moves_selections_with_their_segments() {
        let mut store = SelectionStateStore::new();
        store.initialize(Some(&HostState::default().with_segment(["x"]).with_segment(["y"])));

        // A segment inserted between the two existing ones.
        store.realign_secondary(&[Some(0), None, Some(1)]);

        assert_eq!(store.secondary().len(), 3);
        assert!(store.is_secondary_selected("x", 0));
        assert!(store.secondary()[1].is_empty());
        assert!(store.is_secondary_selected("y", 2));
    }

    #[test]
    fn snapshot_without_fields_is_a_no_op() {
        let mut store = SelectionStateStore::new();
        store.initialize(Some(&HostState::default().with_segment(["x"])));
        store.snapshot_secondary::<MemorySelect>(None);
        assert!(store.is_secondary_selected("x", 0));
    }
}
