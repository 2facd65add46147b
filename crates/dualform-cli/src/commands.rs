//! Command implementations, kept free of clap so tests can call them directly.

use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use dualform::platform::memory::{FormSnapshot, MemoryForm, MemoryStructBlock};
use dualform::{Choices, FormConfig, HostState, OptionEntry, OptionTable};
use serde::Serialize;

use crate::script::Script;

pub fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn load_config(path: Option<&Path>) -> Result<FormConfig> {
    match path {
        Some(path) => FormConfig::from_toml_str(&read_file(path)?).with_context(|| format!("in {}", path.display())),
        None => Ok(FormConfig::default()),
    }
}

pub fn load_state(path: Option<&Path>) -> Result<Option<HostState>> {
    match path {
        Some(path) => HostState::parse(&read_file(path)?).with_context(|| format!("in {}", path.display())),
        None => Ok(None),
    }
}

/// Options offered for `key`, as the controller would resolve them.
pub fn resolve(table_text: &str, config: &FormConfig, key: &str, geography_type: Option<&str>) -> Result<Vec<OptionEntry>> {
    let table = OptionTable::parse(table_text)?;
    let entries = table
        .lookup(key, &config.geography_key, geography_type)
        .map_err(|mismatch| anyhow!("{}", mismatch))?;
    if entries.is_empty() {
        log::warn!("no options for '{}'", key);
    }
    Ok(entries.to_vec())
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub keys: usize,
    pub grouped_keys: usize,
    pub geography_types: usize,
    /// Size of the preload union
    pub distinct_values: usize,
}

pub fn check(table_text: &str) -> Result<CheckReport> {
    let table = OptionTable::parse(table_text)?;
    let mut report = CheckReport {
        keys: table.len(),
        grouped_keys: 0,
        geography_types: 0,
        distinct_values: table.all_entries().len(),
    };
    for key in table.keys() {
        if let Some(Choices::ByGeographyType(by_type)) = table.get(key) {
            report.grouped_keys += 1;
            report.geography_types += by_type.len();
        }
    }
    Ok(report)
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub form: FormSnapshot,
    pub diagnostics: Vec<String>,
}

pub struct Simulation {
    pub table_text: String,
    pub state: Option<HostState>,
    /// Minimum number of segments rendered up front
    pub segments: usize,
    pub config: Rc<FormConfig>,
    pub prefix: String,
}

impl Simulation {
    /// Mount the form and run the script's steps in order.
    pub fn run(self, script: &Script) -> Result<SimulationReport> {
        let mut state = self.state.unwrap_or_default();
        while state.segment_count() < self.segments {
            state = state.with_segment(Vec::<String>::new());
        }
        let base = MemoryStructBlock::new()
            .with_config(Rc::clone(&self.config))
            .with_table(self.table_text);
        let mut form = MemoryForm::mount(base, &self.prefix, Some(&state));

        log::info!("running {} steps", script.steps.len());
        for (index, step) in script.steps.iter().enumerate() {
            step.apply(&mut form)
                .with_context(|| format!("step {} ({:?}) failed", index + 1, step))?;
        }

        let diagnostics = form
            .controller()
            .diagnostics()
            .entries()
            .iter()
            .map(|entry| format!("{:?} {:?}: {}", entry.severity, entry.kind, entry.message))
            .collect();
        Ok(SimulationReport {
            form: form.snapshot(),
            diagnostics,
        })
    }
}
