//! In-process form model.
//!
//! Stands in for the browser document: select fields are shared cells, the
//! segment list reports insertions and removals as mutation records, and
//! [`MemoryForm`] delivers events to the controller the way the browser event
//! loop would (change listener first-come, observer callback per mutation).

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use serde::Serialize;

use crate::block::{BaseBlock, DualCategoryChartBlock};
use crate::config::{FormConfig, PLACEHOLDER_VALUE};
use crate::controller::DependencyController;
use crate::events::{CategoryField, FormEvent, MutationNode, MutationRecord};
use crate::field::{FormDom, SelectField};
use crate::option_table::OptionEntry;
use crate::selection_state::HostState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MemoryOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Shared handle to one select field.
#[derive(Clone, Debug, Default)]
pub struct MemorySelect {
    options: Rc<RefCell<Vec<MemoryOption>>>,
}

impl PartialEq for MemorySelect {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.options, &other.options)
    }
}

impl MemorySelect {
    /// A field that belongs to no document.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Select exactly `value`, adding it as an option if it is not offered.
    pub fn set_value(&self, value: &str) {
        let mut options = self.options.borrow_mut();
        for option in options.iter_mut() {
            option.selected = false;
        }
        match options.iter_mut().find(|option| option.value == value) {
            Some(option) => option.selected = true,
            None => options.push(MemoryOption {
                value: value.to_string(),
                label: value.to_string(),
                selected: true,
            }),
        }
    }

    /// User selection on a multi-select: exactly the offered options among `values`.
    pub fn select_values<S: AsRef<str>>(&self, values: impl IntoIterator<Item = S>) {
        let wanted: BTreeSet<String> = values.into_iter().map(|v| v.as_ref().to_string()).collect();
        for option in self.options.borrow_mut().iter_mut() {
            option.selected = wanted.contains(&option.value);
        }
    }

    pub fn options(&self) -> Vec<MemoryOption> {
        self.options.borrow().clone()
    }

    pub fn option_values(&self) -> Vec<String> {
        self.options.borrow().iter().map(|option| option.value.clone()).collect()
    }
}

impl SelectField for MemorySelect {
    fn value(&self) -> String {
        self.options
            .borrow()
            .iter()
            .find(|option| option.selected)
            .map(|option| option.value.clone())
            .unwrap_or_default()
    }

    fn selected_values(&self) -> Vec<String> {
        self.options
            .borrow()
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.value.clone())
            .collect()
    }

    fn reset_to_placeholder(&self, label: &str) {
        *self.options.borrow_mut() = vec![MemoryOption {
            value: PLACEHOLDER_VALUE.to_string(),
            label: label.to_string(),
            selected: false,
        }];
    }

    fn append_option(&self, entry: &OptionEntry, selected: bool) {
        self.options.borrow_mut().push(MemoryOption {
            value: entry.value.clone(),
            label: entry.label.clone(),
            selected,
        });
    }
}

#[derive(Debug)]
enum MemoryNode {
    Select { id: String, select: MemorySelect },
    Script { id: String, text: String },
}

impl MemoryNode {
    fn id(&self) -> &str {
        match self {
            MemoryNode::Select { id, .. } | MemoryNode::Script { id, .. } => id,
        }
    }
}

#[derive(Debug, Default)]
struct DomState {
    nodes: Vec<MemoryNode>,
    containers: BTreeSet<String>,
}

/// Shared handle to an in-process document. Clones see the same nodes.
#[derive(Clone, Debug, Default)]
pub struct MemoryDom {
    state: Rc<RefCell<DomState>>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_select(&self, id: impl Into<String>) -> MemorySelect {
        let select = MemorySelect::default();
        self.state.borrow_mut().nodes.push(MemoryNode::Select {
            id: id.into(),
            select: select.clone(),
        });
        select
    }

    pub fn add_script(&self, id: impl Into<String>, text: impl Into<String>) {
        self.state.borrow_mut().nodes.push(MemoryNode::Script {
            id: id.into(),
            text: text.into(),
        });
    }

    pub fn add_container(&self, selector: impl Into<String>) {
        self.state.borrow_mut().containers.insert(selector.into());
    }

    pub fn select(&self, id: &str) -> Option<MemorySelect> {
        self.state.borrow().nodes.iter().find_map(|node| match node {
            MemoryNode::Select { id: node_id, select } if node_id == id => Some(select.clone()),
            _ => None,
        })
    }

    /// Positions in `nodes` of the secondary value fields, document order.
    fn segment_node_indices(&self, config: &FormConfig, prefix: &str) -> Vec<usize> {
        let id_prefix = config.segments_id_prefix(prefix);
        let id_suffix = config.selectors.secondary_value_id_suffix.as_str();
        self.state
            .borrow()
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches_segment(node.id(), &id_prefix, id_suffix))
            .map(|(index, _)| index)
            .collect()
    }

    /// One past the highest segment index in use.
    fn next_segment_index(&self, config: &FormConfig, prefix: &str) -> usize {
        let id_prefix = config.segments_id_prefix(prefix);
        self.state
            .borrow()
            .nodes
            .iter()
            .filter_map(|node| node.id().strip_prefix(id_prefix.as_str()))
            .filter_map(|rest| rest.split('-').next()?.parse::<usize>().ok())
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Insert a segment at `position` (appended when out of range).
    pub fn insert_segment(&self, config: &FormConfig, prefix: &str, position: usize) -> MutationRecord {
        let id = config.secondary_value_id(prefix, self.next_segment_index(config, prefix));
        let segment_nodes = self.segment_node_indices(config, prefix);
        let at = match segment_nodes.get(position) {
            Some(index) => *index,
            None => segment_nodes.last().map_or(self.state.borrow().nodes.len(), |last| last + 1),
        };
        self.state.borrow_mut().nodes.insert(
            at,
            MemoryNode::Select {
                id,
                select: MemorySelect::default(),
            },
        );
        MutationRecord::added(vec![
            MutationNode::element(["w-panel", config.selectors.segment_item_class.as_str()]),
            MutationNode::text(),
        ])
    }

    pub fn remove_segment(&self, config: &FormConfig, prefix: &str, position: usize) -> Option<MutationRecord> {
        let index = *self.segment_node_indices(config, prefix).get(position)?;
        self.state.borrow_mut().nodes.remove(index);
        Some(MutationRecord::removed(vec![MutationNode::element([
            "w-panel",
            config.selectors.segment_item_class.as_str(),
        ])]))
    }
}

fn matches_segment(id: &str, id_prefix: &str, id_suffix: &str) -> bool {
    id.starts_with(id_prefix) && id.ends_with(id_suffix)
}

impl FormDom for MemoryDom {
    type Field = MemorySelect;

    fn field_by_id(&self, id: &str) -> Option<MemorySelect> {
        self.select(id)
    }

    fn fields_matching(&self, id_prefix: &str, id_suffix: &str) -> Vec<MemorySelect> {
        self.state
            .borrow()
            .nodes
            .iter()
            .filter_map(|node| match node {
                MemoryNode::Select { id, select } if matches_segment(id, id_prefix, id_suffix) => {
                    Some(select.clone())
                }
                _ => None,
            })
            .collect()
    }

    fn text_content(&self, id: &str) -> Option<String> {
        self.state.borrow().nodes.iter().find_map(|node| match node {
            MemoryNode::Script { id: node_id, text } if node_id == id => Some(text.clone()),
            _ => None,
        })
    }

    fn has_container(&self, selector: &str) -> bool {
        self.state.borrow().containers.contains(selector)
    }
}

/// The host's base rendering of the block's fields into a [`MemoryDom`].
#[derive(Clone, Debug)]
pub struct MemoryStructBlock {
    config: Rc<FormConfig>,
    table: Option<String>,
    omitted: Vec<String>,
    container: bool,
}

impl Default for MemoryStructBlock {
    fn default() -> Self {
        Self {
            config: Rc::new(FormConfig::default()),
            table: None,
            omitted: Vec::new(),
            container: true,
        }
    }
}

impl MemoryStructBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: Rc<FormConfig>) -> Self {
        self.config = config;
        self
    }

    /// Text of the embedded subcategory data script. Without it no script is rendered.
    pub fn with_table(mut self, payload: impl Into<String>) -> Self {
        self.table = Some(payload.into());
        self
    }

    /// Skip rendering the element with this suffix (e.g. `"x_axis"`).
    pub fn without(mut self, suffix: impl Into<String>) -> Self {
        self.omitted.push(suffix.into());
        self
    }

    pub fn without_container(mut self) -> Self {
        self.container = false;
        self
    }

    pub fn config(&self) -> &Rc<FormConfig> {
        &self.config
    }

    fn renders(&self, suffix: &str) -> bool {
        !self.omitted.iter().any(|omitted| omitted == suffix)
    }

    fn render_select(&self, dom: &MemoryDom, prefix: &str, suffix: &str, values: &[String]) {
        if !self.renders(suffix) {
            return;
        }
        let select = dom.add_select(self.config.element_id(prefix, suffix));
        for value in values {
            select.append_option(&OptionEntry::new(value.as_str(), value.as_str()), true);
        }
    }
}

impl BaseBlock<MemoryDom> for MemoryStructBlock {
    fn render(&self, dom: &MemoryDom, prefix: &str, initial_state: Option<&HostState>) {
        let state = initial_state.cloned().unwrap_or_default();
        let suffixes = &self.config.suffixes;
        let single = |value: Option<&str>| value.filter(|v| !v.is_empty()).map(str::to_string).into_iter().collect::<Vec<_>>();

        self.render_select(dom, prefix, &suffixes.x_axis, &single(state.x_axis.as_deref()));
        self.render_select(dom, prefix, &suffixes.geography_type, &single(state.geography_type()));
        self.render_select(dom, prefix, &suffixes.secondary_category, &single(state.second_category.as_deref()));
        self.render_select(
            dom,
            prefix,
            &suffixes.primary_values,
            &state.primary_values().into_iter().collect::<Vec<_>>(),
        );
        if let Some(table) = &self.table {
            if self.renders(&suffixes.data_script) {
                dom.add_script(self.config.data_script_id(prefix), table.clone());
            }
        }
        if self.container {
            dom.add_container(self.config.selectors.segments_container.clone());
        }
        for (index, values) in state.secondary_values().into_iter().enumerate() {
            let select = dom.add_select(self.config.secondary_value_id(prefix, index));
            for value in values {
                select.append_option(&OptionEntry::new(value.as_str(), value.as_str()), true);
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldSnapshot {
    pub options: Vec<MemoryOption>,
    pub selected: Vec<String>,
}

impl FieldSnapshot {
    fn of(select: &MemorySelect) -> Self {
        Self {
            options: select.options(),
            selected: select.selected_values(),
        }
    }
}

/// Rendered state of every field, for printing and comparisons.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FormSnapshot {
    pub categories: BTreeMap<String, String>,
    pub primary_values: Option<FieldSnapshot>,
    pub segments: Vec<FieldSnapshot>,
}

/// A mounted dual category block plus the document it lives in.
pub struct MemoryForm {
    dom: MemoryDom,
    config: Rc<FormConfig>,
    prefix: String,
    controller: DependencyController<MemoryDom>,
}

impl MemoryForm {
    pub fn mount(base: MemoryStructBlock, prefix: &str, host_state: Option<&HostState>) -> Self {
        Self::mount_with(base, prefix, |block, dom| block.mount(dom, prefix, host_state))
    }

    /// Mount from the host's raw initial state JSON, as a page would.
    pub fn mount_json(base: MemoryStructBlock, prefix: &str, initial_state: &str) -> Self {
        Self::mount_with(base, prefix, |block, dom| block.mount_json(dom, prefix, initial_state))
    }

    fn mount_with(
        base: MemoryStructBlock,
        prefix: &str,
        mount: impl FnOnce(&DualCategoryChartBlock<MemoryStructBlock>, MemoryDom) -> DependencyController<MemoryDom>,
    ) -> Self {
        let config = Rc::clone(base.config());
        let dom = MemoryDom::new();
        let block = DualCategoryChartBlock::new(base, Rc::clone(&config));
        let controller = mount(&block, dom.clone());
        Self {
            dom,
            config,
            prefix: prefix.to_string(),
            controller,
        }
    }

    /// User picks `value` in a category field; `change` fires if the field exists.
    pub fn change(&mut self, field: CategoryField, value: &str) -> bool {
        let Some(select) = self.dom.select(&self.config.category_field_id(&self.prefix, field)) else {
            return false;
        };
        select.set_value(value);
        self.controller.handle_event(&FormEvent::Change {
            field,
            value: value.to_string(),
        });
        true
    }

    /// User selection in the primary values field. Does not fire an event.
    pub fn select_primary<S: AsRef<str>>(&self, values: impl IntoIterator<Item = S>) -> bool {
        match self.primary_values() {
            Some(select) => {
                select.select_values(values);
                true
            }
            None => false,
        }
    }

    /// User selection in one segment's secondary field. Does not fire an event.
    pub fn select_secondary<S: AsRef<str>>(&self, segment: usize, values: impl IntoIterator<Item = S>) -> bool {
        match self.segment(segment) {
            Some(select) => {
                select.select_values(values);
                true
            }
            None => false,
        }
    }

    pub fn add_segment(&mut self) {
        let position = self.segment_count();
        self.insert_segment(position);
    }

    pub fn insert_segment(&mut self, position: usize) {
        let record = self.dom.insert_segment(&self.config, &self.prefix, position);
        self.controller.handle_event(&FormEvent::Mutations(vec![record]));
    }

    pub fn remove_segment(&mut self, position: usize) -> bool {
        match self.dom.remove_segment(&self.config, &self.prefix, position) {
            Some(record) => {
                self.controller.handle_event(&FormEvent::Mutations(vec![record]));
                true
            }
            None => false,
        }
    }

    pub fn primary_values(&self) -> Option<MemorySelect> {
        self.dom.select(&self.config.primary_values_id(&self.prefix))
    }

    pub fn segment(&self, position: usize) -> Option<MemorySelect> {
        self.segments().into_iter().nth(position)
    }

    /// Live secondary value fields, document order.
    pub fn segments(&self) -> Vec<MemorySelect> {
        self.dom.fields_matching(
            &self.config.segments_id_prefix(&self.prefix),
            &self.config.selectors.secondary_value_id_suffix,
        )
    }

    pub fn segment_count(&self) -> usize {
        self.segments().len()
    }

    pub fn primary_selected(&self) -> Vec<String> {
        self.primary_values().map(|select| select.selected_values()).unwrap_or_default()
    }

    pub fn secondary_selected(&self, segment: usize) -> Vec<String> {
        self.segment(segment).map(|select| select.selected_values()).unwrap_or_default()
    }

    pub fn secondary_option_values(&self, segment: usize) -> Vec<String> {
        self.segment(segment).map(|select| select.option_values()).unwrap_or_default()
    }

    pub fn snapshot(&self) -> FormSnapshot {
        let categories = CategoryField::ALL
            .into_iter()
            .filter_map(|field| {
                let select = self.dom.select(&self.config.category_field_id(&self.prefix, field))?;
                Some((field.name().to_string(), select.value()))
            })
            .collect();
        FormSnapshot {
            categories,
            primary_values: self.primary_values().as_ref().map(FieldSnapshot::of),
            segments: self.segments().iter().map(FieldSnapshot::of).collect(),
        }
    }

    pub fn dom(&self) -> &MemoryDom {
        &self.dom
    }

    pub fn controller(&self) -> &DependencyController<MemoryDom> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut DependencyController<MemoryDom> {
        &mut self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_value_selects_exclusively() {
        let select = MemorySelect::detached();
        select.append_option(&OptionEntry::new("a", "A"), true);
        select.append_option(&OptionEntry::new("b", "B"), false);

        select.set_value("b");
        assert_eq!(select.selected_values(), ["b"]);

        select.set_value("c");
        assert_eq!(select.value(), "c");
        assert_eq!(select.option_values(), ["a", "b", "c"]);
    }

    #[test]
    fn handles_compare_by_identity() {
        let a = MemorySelect::detached();
        let b = MemorySelect::detached();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn segments_keep_document_order_and_fresh_ids() {
        let config = FormConfig::default();
        let dom = MemoryDom::new();
        dom.add_select("card-x_axis");
        dom.add_select(config.secondary_value_id("card", 0));
        dom.add_select(config.secondary_value_id("card", 1));
        dom.add_select("card-y_axis");

        let first = dom.select(&config.secondary_value_id("card", 0)).unwrap();
        let second = dom.select(&config.secondary_value_id("card", 1)).unwrap();

        dom.insert_segment(&config, "card", 1);
        let inserted = dom.select(&config.secondary_value_id("card", 2)).unwrap();
        let fields = dom.fields_matching(&config.segments_id_prefix("card"), "secondary_field_value");
        assert_eq!(fields, [first.clone(), inserted, second.clone()]);

        let record = dom.remove_segment(&config, "card", 1).unwrap();
        assert!(record.removed_nodes[0].has_class("dual-category-chart-card__segments"));
        let fields = dom.fields_matching(&config.segments_id_prefix("card"), "secondary_field_value");
        assert_eq!(fields, [first, second]);

        dom.insert_segment(&config, "card", 10);
        let appended = dom.select(&config.secondary_value_id("card", 2)).unwrap();
        let fields = dom.fields_matching(&config.segments_id_prefix("card"), "secondary_field_value");
        assert_eq!(fields.last(), Some(&appended));
        assert!(dom.remove_segment(&config, "card", 5).is_none());
    }
}
