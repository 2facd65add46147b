//! Keeps value fields consistent with their category fields.
//!
//! # Fields
//!
//! ```text
//! x_axis ──────────────┐
//!                      ├──► primary_field_values
//! geography_type ──────┤
//!                      ├──► segments-N-…-secondary_field_value  (one per segment)
//! second_category ─────┘
//! ```
//!
//! Every rebuild clears a value field down to the placeholder and repopulates
//! it from the option table, marking an option selected only when the
//! [`SelectionStateStore`] still holds its value. Values that are no longer
//! offered simply stop being selected.
//!
//! The controller is driven synchronously: one event in, one complete rebuild
//! out. It holds no locks; the platform layer must deliver events from a
//! single thread.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::config::FormConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics, Severity};
use crate::error::FormError;
use crate::events::{CategoryField, FormEvent, MutationKind, MutationRecord};
use crate::field::{FormDom, SelectField};
use crate::option_table::{Choices, OptionEntry, OptionTable};
use crate::selection_state::{HostState, SelectionStateStore};

pub struct DependencyController<D: FormDom> {
    dom: D,
    config: Rc<FormConfig>,
    prefix: String,
    store: SelectionStateStore,
    table: OptionTable,
    // Category fields
    x_axis: Option<D::Field>,
    geography_type: Option<D::Field>,
    secondary_category: Option<D::Field>,
    // Value fields
    primary_values: Option<D::Field>,
    secondary_values: Vec<D::Field>,
    listeners: BTreeSet<CategoryField>,
    watching: bool,
    diagnostics: Diagnostics,
}

impl<D: FormDom> DependencyController<D> {
    pub fn new(dom: D, config: Rc<FormConfig>, prefix: impl Into<String>) -> Self {
        Self {
            dom,
            config,
            prefix: prefix.into(),
            store: SelectionStateStore::new(),
            table: OptionTable::new(),
            x_axis: None,
            geography_type: None,
            secondary_category: None,
            primary_values: None,
            secondary_values: Vec::new(),
            listeners: BTreeSet::new(),
            watching: false,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Full mount sequence, run once after the host has rendered the block.
    pub fn initialize(&mut self, host_state: Option<&HostState>) {
        self.store.initialize(host_state);
        self.load_option_table();
        self.locate_category_fields();
        self.locate_value_fields();
        self.initial_populate();
        self.watch_segments();
        self.install_listeners();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Setup
    // ═══════════════════════════════════════════════════════════════════════

    /// Record host state text that could not be read. The block is mounted
    /// without saved selections instead.
    pub fn report_unreadable_state(&mut self, error: &FormError, text: &str) {
        self.diagnostics
            .record(DiagnosticKind::MalformedData, Severity::Error, format!("{} (text: {:?})", error, text));
    }

    /// Read the option table from the embedded data script.
    ///
    /// A missing script or unparsable payload leaves an empty table, so every
    /// value field ends up placeholder-only but the form stays usable.
    pub fn load_option_table(&mut self) {
        let script_id = self.config.data_script_id(&self.prefix);
        let Some(text) = self.dom.text_content(&script_id) else {
            self.diagnostics.record(
                DiagnosticKind::MissingNode,
                Severity::Error,
                format!("Subcategory data script not found with ID: {}", script_id),
            );
            self.table = OptionTable::new();
            return;
        };
        self.table = match OptionTable::parse(&text) {
            Ok(table) => table,
            Err(error) => {
                self.diagnostics.record(
                    DiagnosticKind::MalformedData,
                    Severity::Error,
                    format!("{} (text: {:?})", error, text),
                );
                OptionTable::new()
            }
        };
    }

    pub fn locate_category_fields(&mut self) {
        self.x_axis = self.find_category_field(CategoryField::PrimaryCategory);
        self.geography_type = self.find_category_field(CategoryField::GeographyType);
        self.secondary_category = self.find_category_field(CategoryField::SecondaryCategory);

        let missing: Vec<&str> = CategoryField::ALL
            .into_iter()
            .filter(|field| self.category_field(*field).is_none())
            .map(|field| field.name())
            .collect();
        if !missing.is_empty() {
            self.diagnostics.record(
                DiagnosticKind::MissingNode,
                Severity::Error,
                format!("Category form fields not found: {} (prefix: {})", missing.join(", "), self.prefix),
            );
        }
    }

    pub fn locate_value_fields(&mut self) {
        let primary_id = self.config.primary_values_id(&self.prefix);
        self.primary_values = self.dom.field_by_id(&primary_id);
        if self.primary_values.is_none() {
            self.diagnostics.record(
                DiagnosticKind::MissingNode,
                Severity::Error,
                format!(
                    "Sub-category form fields not found: {} (prefix: {})",
                    self.config.suffixes.primary_values, self.prefix
                ),
            );
        }
        self.refresh_secondary_fields();
    }

    /// Re-query the secondary value fields; there may be none.
    fn refresh_secondary_fields(&mut self) {
        let id_prefix = self.config.segments_id_prefix(&self.prefix);
        self.secondary_values = self
            .dom
            .fields_matching(&id_prefix, &self.config.selectors.secondary_value_id_suffix);
    }

    fn find_category_field(&self, field: CategoryField) -> Option<D::Field> {
        self.dom.field_by_id(&self.config.category_field_id(&self.prefix, field))
    }

    /// Start reacting to segment insertions. Returns whether the container exists.
    pub fn watch_segments(&mut self) -> bool {
        self.watching = self.dom.has_container(&self.config.selectors.segments_container);
        if !self.watching {
            self.diagnostics.record(
                DiagnosticKind::MissingContainer,
                Severity::Warning,
                "Segments container not found - observer disabled",
            );
        }
        self.watching
    }

    /// Listen for changes on every category field that was found.
    pub fn install_listeners(&mut self) {
        let present: BTreeSet<CategoryField> = CategoryField::ALL
            .into_iter()
            .filter(|field| self.category_field(*field).is_some())
            .collect();
        self.listeners = present;
    }

    /// Stop reacting to events. The platform detaches its own callbacks.
    pub fn teardown(&mut self) {
        self.listeners.clear();
        self.watching = false;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Option resolution and rebuilds
    // ═══════════════════════════════════════════════════════════════════════

    /// Options currently legal for `category_key`.
    pub fn resolve_options(&mut self, category_key: &str) -> Vec<OptionEntry> {
        if category_key.is_empty() {
            return Vec::new();
        }
        let geography_type = if category_key == self.config.geography_key {
            match &self.geography_type {
                Some(field) => Some(field.value()),
                None => {
                    self.diagnostics.record(
                        DiagnosticKind::MissingNode,
                        Severity::Notice,
                        format!("No geography type field; '{}' offers no options", category_key),
                    );
                    return Vec::new();
                }
            }
        } else {
            None
        };
        match self
            .table
            .lookup(category_key, &self.config.geography_key, geography_type.as_deref())
        {
            Ok(entries) if !entries.is_empty() => entries.to_vec(),
            Ok(_) => {
                self.note_missing_options(category_key, geography_type.as_deref());
                Vec::new()
            }
            Err(mismatch) => {
                self.diagnostics
                    .record(DiagnosticKind::InconsistentTable, Severity::Warning, mismatch.to_string());
                Vec::new()
            }
        }
    }

    /// An empty table was already reported when it was loaded.
    fn note_missing_options(&mut self, category_key: &str, geography_type: Option<&str>) {
        if self.table.is_empty() {
            return;
        }
        let message = match (self.table.get(category_key), geography_type) {
            (None, _) => format!("No subcategory data for '{}'", category_key),
            (Some(Choices::ByGeographyType(by_type)), Some(geography_type))
                if !geography_type.is_empty() && !by_type.contains_key(geography_type) =>
            {
                format!("No '{}' options for geography type '{}'", category_key, geography_type)
            }
            _ => return,
        };
        self.diagnostics
            .record(DiagnosticKind::MissingOptions, Severity::Notice, message);
    }

    pub fn rebuild_primary_options(&mut self, category_key: &str) {
        let Some(field) = self.primary_values.clone() else {
            log::debug!("[dualform] no primary values field, skipping rebuild");
            return;
        };
        let options = self.resolve_options(category_key);
        field.reset_to_placeholder(&self.config.placeholder_label);
        for entry in &options {
            field.append_option(entry, self.store.is_primary_selected(&entry.value));
        }
        log::debug!("[dualform] primary options rebuilt for '{}': {}", category_key, options.len());
    }

    /// Every segment gets the same options; selections stay per segment.
    pub fn rebuild_secondary_options(&mut self, category_key: &str) {
        if self.secondary_values.is_empty() {
            return;
        }
        let options = self.resolve_options(category_key);
        for (segment_index, field) in self.secondary_values.iter().enumerate() {
            field.reset_to_placeholder(&self.config.placeholder_label);
            for entry in &options {
                field.append_option(entry, self.store.is_secondary_selected(&entry.value, segment_index));
            }
        }
        log::debug!(
            "[dualform] secondary options rebuilt for '{}': {} options x {} segments",
            category_key,
            options.len(),
            self.secondary_values.len()
        );
    }

    /// First population after render, so nothing stale is visible before the user interacts.
    pub fn initial_populate(&mut self) {
        if let Some(field) = self.primary_values.clone() {
            match non_empty_value(self.x_axis.as_ref()) {
                Some(category_key) => self.rebuild_primary_options(&category_key),
                None => field.reset_to_placeholder(&self.config.placeholder_label),
            }
        }
        match non_empty_value(self.secondary_category.as_ref()) {
            Some(category_key) => self.rebuild_secondary_options(&category_key),
            None => {
                for field in &self.secondary_values {
                    field.reset_to_placeholder(&self.config.placeholder_label);
                }
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Events
    // ═══════════════════════════════════════════════════════════════════════

    pub fn handle_event(&mut self, event: &FormEvent) {
        match event {
            FormEvent::Change { field, value } => {
                if self.listeners.contains(field) {
                    self.on_category_change(*field, value);
                }
            }
            FormEvent::Mutations(records) => {
                if self.watching {
                    self.on_mutations(records);
                }
            }
        }
    }

    fn on_category_change(&mut self, field: CategoryField, value: &str) {
        match field {
            // Old selections belong to the old category.
            CategoryField::PrimaryCategory => {
                self.store.clear_primary();
                self.rebuild_primary_options(value);
            }
            CategoryField::SecondaryCategory => {
                self.store.clear_secondary();
                self.rebuild_secondary_options(value);
            }
            CategoryField::GeographyType => {
                let config = Rc::clone(&self.config);
                let primary_key = field_value(self.x_axis.as_ref());
                if primary_key == config.geography_key {
                    self.store.clear_primary();
                    self.rebuild_primary_options(&primary_key);
                }
                let secondary_key = field_value(self.secondary_category.as_ref());
                if secondary_key == config.geography_key {
                    self.store.clear_secondary();
                    self.rebuild_secondary_options(&secondary_key);
                }
            }
        }
    }

    fn on_mutations(&mut self, records: &[MutationRecord]) {
        let config = Rc::clone(&self.config);
        let item_class = config.selectors.segment_item_class.as_str();
        for record in records.iter().filter(|record| record.kind == MutationKind::ChildList) {
            for node in &record.added_nodes {
                if node.is_element && node.has_class(item_class) {
                    self.on_segment_inserted();
                }
            }
            for node in &record.removed_nodes {
                if node.is_element && node.has_class(item_class) {
                    self.on_segment_removed();
                }
            }
        }
    }

    /// Capture selections from the fields as they were, pick up the new
    /// segment's field and repopulate every segment.
    ///
    /// Without a secondary category the new field is cut down to the
    /// placeholder and the existing ones are left alone.
    pub fn on_segment_inserted(&mut self) {
        let previous = self.secondary_values.clone();
        self.store.snapshot_secondary(Some(previous.as_slice()));
        self.locate_value_fields();
        let positions = self.realign_to(&previous);

        match non_empty_value(self.secondary_category.as_ref()) {
            Some(category_key) => self.rebuild_secondary_options(&category_key),
            None => {
                let added = self
                    .secondary_values
                    .iter()
                    .zip(&positions)
                    .filter(|(_, position)| position.is_none());
                for (field, _) in added {
                    field.reset_to_placeholder(&self.config.placeholder_label);
                }
            }
        }
    }

    /// Drop the removed segment's handle and state so indices match the document again.
    pub fn on_segment_removed(&mut self) {
        self.refresh_secondary_fields();
        self.store.snapshot_secondary(Some(self.secondary_values.as_slice()));
    }

    fn realign_to(&mut self, previous: &[D::Field]) -> Vec<Option<usize>> {
        let positions: Vec<Option<usize>> = self
            .secondary_values
            .iter()
            .map(|field| previous.iter().position(|old| old == field))
            .collect();
        self.store.realign_secondary(&positions);
        positions
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    pub fn category_field(&self, field: CategoryField) -> Option<&D::Field> {
        match field {
            CategoryField::PrimaryCategory => self.x_axis.as_ref(),
            CategoryField::SecondaryCategory => self.secondary_category.as_ref(),
            CategoryField::GeographyType => self.geography_type.as_ref(),
        }
    }

    pub fn primary_values_field(&self) -> Option<&D::Field> {
        self.primary_values.as_ref()
    }

    pub fn secondary_value_fields(&self) -> &[D::Field] {
        &self.secondary_values
    }

    pub fn listened_fields(&self) -> Vec<CategoryField> {
        self.listeners.iter().copied().collect()
    }

    pub fn is_watching(&self) -> bool {
        self.watching
    }

    pub fn store(&self) -> &SelectionStateStore {
        &self.store
    }

    pub fn table(&self) -> &OptionTable {
        &self.table
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }
}

fn field_value<F: SelectField>(field: Option<&F>) -> String {
    field.map(SelectField::value).unwrap_or_default()
}

fn non_empty_value<F: SelectField>(field: Option<&F>) -> Option<String> {
    Some(field_value(field)).filter(|value| !value.is_empty())
}
