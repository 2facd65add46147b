//! Static configuration for locating form fields.
//!
//! Element ids are built as `"{prefix}-{suffix}"`, where the prefix is the
//! per-instance form prefix handed out by the host.

use serde::{Deserialize, Serialize};

use crate::error::FormError;
use crate::events::CategoryField;

/// Value of the placeholder option. Never stored as a selection.
pub const PLACEHOLDER_VALUE: &str = "";

/// Field-name suffixes appended to the form prefix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSuffixes {
    pub x_axis: String,
    pub geography_type: String,
    pub secondary_category: String,
    pub primary_values: String,
    pub data_script: String,
    pub segments: String,
}

impl Default for FieldSuffixes {
    fn default() -> Self {
        Self {
            x_axis: "x_axis".to_string(),
            geography_type: "static_fields-geography_type".to_string(),
            secondary_category: "second_category".to_string(),
            primary_values: "primary_field_values".to_string(),
            data_script: "subcategory-data".to_string(),
            segments: "segments".to_string(),
        }
    }
}

/// Selectors used for the segment list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Container whose subtree gains a node per inserted segment.
    pub segments_container: String,
    /// Class carried by each segment item node.
    pub segment_item_class: String,
    /// Trailing part of every secondary value field id.
    pub secondary_value_id_suffix: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            segments_container: "[class=\"dual-category-chart-card\"] [data-streamfield-list-container]"
                .to_string(),
            segment_item_class: "dual-category-chart-card__segments".to_string(),
            secondary_value_id_suffix: "secondary_field_value".to_string(),
        }
    }
}

/// Immutable configuration shared by every controller of a block type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub block_type: String,
    /// Category key whose options are grouped by geography type.
    pub geography_key: String,
    pub placeholder_label: String,
    pub suffixes: FieldSuffixes,
    pub selectors: Selectors,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            block_type: "cms.dynamic_content.cards.DualCategoryChartCard".to_string(),
            geography_key: "geography".to_string(),
            placeholder_label: "-----".to_string(),
            suffixes: FieldSuffixes::default(),
            selectors: Selectors::default(),
        }
    }
}

impl FormConfig {
    /// Parse a TOML override. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, FormError> {
        toml::from_str(text).map_err(|error| FormError::InvalidConfig(error.to_string()))
    }

    pub fn element_id(&self, prefix: &str, suffix: &str) -> String {
        format!("{}-{}", prefix, suffix)
    }

    pub fn category_field_id(&self, prefix: &str, field: CategoryField) -> String {
        let suffix = match field {
            CategoryField::PrimaryCategory => &self.suffixes.x_axis,
            CategoryField::SecondaryCategory => &self.suffixes.secondary_category,
            CategoryField::GeographyType => &self.suffixes.geography_type,
        };
        self.element_id(prefix, suffix)
    }

    pub fn primary_values_id(&self, prefix: &str) -> String {
        self.element_id(prefix, &self.suffixes.primary_values)
    }

    pub fn data_script_id(&self, prefix: &str) -> String {
        self.element_id(prefix, &self.suffixes.data_script)
    }

    /// Id prefix shared by every secondary value field of this form instance.
    pub fn segments_id_prefix(&self, prefix: &str) -> String {
        format!("{}-{}-", prefix, self.suffixes.segments)
    }

    /// Id of the secondary value field for the segment with the given host index.
    pub fn secondary_value_id(&self, prefix: &str, segment_index: usize) -> String {
        format!(
            "{}{}-value-{}",
            self.segments_id_prefix(prefix),
            segment_index,
            self.selectors.secondary_value_id_suffix
        )
    }
}
