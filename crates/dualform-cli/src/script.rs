//! Parser for simulate scripts (TOML format)
//!
//! ```toml
//! [[step]]
//! action = "set_category"
//! field = "x_axis"
//! value = "age"
//!
//! [[step]]
//! action = "add_segment"
//! ```

use std::path::Path;

use anyhow::{Context, Result, bail, ensure};
use dualform::CategoryField;
use dualform::platform::memory::MemoryForm;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Script {
    /// Steps run in order against the mounted form
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// One user interaction
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Pick a value in a category field (fires `change`)
    SetCategory { field: CategoryField, value: String },
    /// Select values in the primary values field
    SelectPrimary { values: Vec<String> },
    /// Select values in one segment's secondary field
    SelectSecondary { segment: usize, values: Vec<String> },
    /// Add a segment, appended unless a position is given
    AddSegment {
        #[serde(default)]
        position: Option<usize>,
    },
    RemoveSegment { segment: usize },
}

impl Script {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid simulate script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }
}

impl Step {
    pub fn apply(&self, form: &mut MemoryForm) -> Result<()> {
        log::debug!("step: {:?}", self);
        match self {
            Step::SetCategory { field, value } => {
                if !form.change(*field, value) {
                    bail!("{} field is not rendered", field.name());
                }
            }
            Step::SelectPrimary { values } => {
                ensure!(form.select_primary(values), "primary values field is not rendered");
            }
            Step::SelectSecondary { segment, values } => {
                ensure!(form.select_secondary(*segment, values), "no segment at position {}", segment);
            }
            Step::AddSegment { position } => match position {
                Some(position) => form.insert_segment(*position),
                None => form.add_segment(),
            },
            Step::RemoveSegment { segment } => {
                ensure!(form.remove_segment(*segment), "no segment at position {}", segment);
            }
        }
        Ok(())
    }
}
