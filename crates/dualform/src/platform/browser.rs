//! Live DOM adapter and the wasm entry points the host page calls.
//!
//! The host renders a block, then calls [`render_block`] with the block type,
//! form prefix and initial state JSON. The returned handle keeps the change
//! listeners and the segment observer alive until [`unmount_block`].

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlOptionElement, HtmlSelectElement, MutationObserver, MutationObserverInit, NodeList};
use zoon::{eprintln, println};

use crate::block::RenderedBlock;
use crate::config::{FormConfig, PLACEHOLDER_VALUE};
use crate::events::{CategoryField, FormEvent, MutationKind, MutationNode, MutationRecord};
use crate::field::{FormDom, SelectField};
use crate::option_table::OptionEntry;
use crate::registry::{BlockRegistry, register_dual_category_block};

#[derive(Clone, Debug)]
pub struct WebSelect(HtmlSelectElement);

impl PartialEq for WebSelect {
    fn eq(&self, other: &Self) -> bool {
        self.0.is_same_node(Some(&other.0))
    }
}

impl WebSelect {
    pub fn element(&self) -> &HtmlSelectElement {
        &self.0
    }
}

impl SelectField for WebSelect {
    fn value(&self) -> String {
        self.0.value()
    }

    fn selected_values(&self) -> Vec<String> {
        let options = self.0.selected_options();
        (0..options.length())
            .filter_map(|index| options.item(index))
            .filter_map(|element| element.dyn_into::<HtmlOptionElement>().ok())
            .map(|option| option.value())
            .collect()
    }

    fn reset_to_placeholder(&self, label: &str) {
        self.0.set_length(0);
        match HtmlOptionElement::new_with_text_and_value(label, PLACEHOLDER_VALUE) {
            Ok(option) => self.add(&option),
            Err(error) => log::error!("[dualform] failed to create placeholder option: {:?}", error),
        }
    }

    fn append_option(&self, entry: &OptionEntry, selected: bool) {
        match HtmlOptionElement::new_with_text_and_value_and_default_selected_and_selected(
            &entry.label,
            &entry.value,
            false,
            selected,
        ) {
            Ok(option) => self.add(&option),
            Err(error) => log::error!("[dualform] failed to create option '{}': {:?}", entry.value, error),
        }
    }
}

impl WebSelect {
    fn add(&self, option: &HtmlOptionElement) {
        if let Err(error) = self.0.add_with_html_option_element(option) {
            log::error!("[dualform] failed to append option: {:?}", error);
        }
    }
}

#[derive(Clone, Debug)]
pub struct WebDom(Document);

impl WebDom {
    pub fn new(document: Document) -> Self {
        Self(document)
    }

    /// The page's document, if running in a window.
    pub fn current() -> Option<Self> {
        web_sys::window()?.document().map(Self)
    }

    fn query(&self, selector: &str) -> Option<Element> {
        self.0.query_selector(selector).ok().flatten()
    }
}

impl FormDom for WebDom {
    type Field = WebSelect;

    fn field_by_id(&self, id: &str) -> Option<WebSelect> {
        self.0
            .get_element_by_id(id)?
            .dyn_into::<HtmlSelectElement>()
            .ok()
            .map(WebSelect)
    }

    fn fields_matching(&self, id_prefix: &str, id_suffix: &str) -> Vec<WebSelect> {
        let selector = format!("select[id^=\"{}\"][id$=\"{}\"]", id_prefix, id_suffix);
        let Ok(list) = self.0.query_selector_all(&selector) else {
            log::error!("[dualform] invalid selector: {}", selector);
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|index| list.item(index))
            .filter_map(|node| node.dyn_into::<HtmlSelectElement>().ok())
            .map(WebSelect)
            .collect()
    }

    fn text_content(&self, id: &str) -> Option<String> {
        self.0.get_element_by_id(id)?.text_content()
    }

    fn has_container(&self, selector: &str) -> bool {
        self.query(selector).is_some()
    }
}

// ---------------------------------------------------------------------------
// Console logging
// ---------------------------------------------------------------------------

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            log::Level::Error | log::Level::Warn => eprintln!("{}", record.args()),
            _ => println!("{}", record.args()),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Route `log` output to the browser console. Later calls only change the level.
#[wasm_bindgen]
pub fn init_logging(level: &str) {
    let level = level.parse().unwrap_or(log::LevelFilter::Info);
    log::set_max_level(level);
    if log::set_logger(&LOGGER).is_err() {
        log::debug!("[dualform] logger already installed, level set to {}", level);
    }
}

// ---------------------------------------------------------------------------
// Mounted blocks
// ---------------------------------------------------------------------------

type SharedBlock = Rc<RefCell<Box<dyn RenderedBlock>>>;
type ChangeClosure = Closure<dyn FnMut(Event)>;
type ObserverClosure = Closure<dyn FnMut(js_sys::Array, MutationObserver)>;

struct MountedBlock {
    block: SharedBlock,
    listeners: Vec<(HtmlSelectElement, ChangeClosure)>,
    observer: Option<(MutationObserver, ObserverClosure)>,
}

impl Drop for MountedBlock {
    fn drop(&mut self) {
        for (element, closure) in &self.listeners {
            if let Err(error) = element.remove_event_listener_with_callback("change", closure.as_ref().unchecked_ref()) {
                log::debug!("[dualform] failed to remove change listener: {:?}", error);
            }
        }
        if let Some((observer, _)) = &self.observer {
            observer.disconnect();
        }
        if let Ok(mut block) = self.block.try_borrow_mut() {
            block.teardown();
        }
    }
}

thread_local! {
    static CONFIG: RefCell<Rc<FormConfig>> = RefCell::new(Rc::new(FormConfig::default()));
    static REGISTRY: RefCell<BlockRegistry<WebDom>> = RefCell::new(registry_for(Rc::new(FormConfig::default())));
    static MOUNTED: RefCell<BTreeMap<u32, MountedBlock>> = const { RefCell::new(BTreeMap::new()) };
    static NEXT_HANDLE: Cell<u32> = const { Cell::new(1) };
}

fn registry_for(config: Rc<FormConfig>) -> BlockRegistry<WebDom> {
    let mut registry = BlockRegistry::new();
    // The host has already rendered the fields by the time it calls us.
    register_dual_category_block(&mut registry, (), config);
    registry
}

fn to_js(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Replace the configuration used by blocks rendered from now on.
#[wasm_bindgen]
pub fn configure(config_toml: &str) -> Result<(), JsValue> {
    let config = Rc::new(FormConfig::from_toml_str(config_toml).map_err(to_js)?);
    REGISTRY.with(|registry| *registry.borrow_mut() = registry_for(Rc::clone(&config)));
    CONFIG.with(|current| *current.borrow_mut() = config);
    Ok(())
}

/// Mount a block over already rendered fields. Returns a handle for [`unmount_block`].
///
/// Unreadable initial state is logged and the block mounts without saved
/// selections. Only an unknown block type or a missing document is an error.
#[wasm_bindgen]
pub fn render_block(block_type: &str, prefix: &str, initial_state: &str) -> Result<u32, JsValue> {
    let dom = WebDom::current().ok_or_else(|| to_js("no document available"))?;
    let config = CONFIG.with(|config| Rc::clone(&config.borrow()));

    let block = REGISTRY
        .with(|registry| {
            registry
                .borrow()
                .render_json(block_type, dom.clone(), prefix, initial_state)
        })
        .map_err(to_js)?;
    let block: SharedBlock = Rc::new(RefCell::new(block));

    let mounted = MountedBlock {
        listeners: attach_listeners(&dom, &block, &config, prefix),
        observer: observe_segments(&dom, &block, &config),
        block,
    };
    let handle = NEXT_HANDLE.with(|next| {
        let handle = next.get();
        next.set(handle.wrapping_add(1));
        handle
    });
    MOUNTED.with(|blocks| blocks.borrow_mut().insert(handle, mounted));
    log::info!("[dualform] mounted '{}' as {}", prefix, handle);
    Ok(handle)
}

/// Detach listeners and the observer. Returns whether the handle was mounted.
#[wasm_bindgen]
pub fn unmount_block(handle: u32) -> bool {
    let removed = MOUNTED.with(|blocks| blocks.borrow_mut().remove(&handle));
    removed.is_some()
}

fn dispatch(block: &SharedBlock, event: FormEvent) {
    match block.try_borrow_mut() {
        Ok(mut block) => block.handle_event(&event),
        Err(_) => log::warn!("[dualform] block busy, dropped {:?}", event),
    }
}

fn attach_listeners(
    dom: &WebDom,
    block: &SharedBlock,
    config: &FormConfig,
    prefix: &str,
) -> Vec<(HtmlSelectElement, ChangeClosure)> {
    let fields: Vec<CategoryField> = block.borrow().listened_fields();
    fields
        .into_iter()
        .filter_map(|field| {
            let select = dom.field_by_id(&config.category_field_id(prefix, field))?.0;
            let closure: ChangeClosure = Closure::new({
                let block = Rc::clone(block);
                move |event: Event| {
                    let value = event
                        .target()
                        .and_then(|target| target.dyn_into::<HtmlSelectElement>().ok())
                        .map(|select| select.value())
                        .unwrap_or_default();
                    dispatch(&block, FormEvent::Change { field, value });
                }
            });
            match select.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref()) {
                Ok(()) => Some((select, closure)),
                Err(error) => {
                    log::error!("[dualform] failed to listen on {}: {:?}", field.name(), error);
                    None
                }
            }
        })
        .collect()
}

fn observe_segments(dom: &WebDom, block: &SharedBlock, config: &FormConfig) -> Option<(MutationObserver, ObserverClosure)> {
    if !block.borrow().watches_segments() {
        return None;
    }
    let container = dom.query(&config.selectors.segments_container)?;
    let callback: ObserverClosure = Closure::new({
        let block = Rc::clone(block);
        move |records: js_sys::Array, _observer: MutationObserver| {
            let records = records
                .iter()
                .filter_map(|record| record.dyn_into::<web_sys::MutationRecord>().ok())
                .map(|record| convert_record(&record))
                .collect();
            dispatch(&block, FormEvent::Mutations(records));
        }
    });
    let observer = match MutationObserver::new(callback.as_ref().unchecked_ref()) {
        Ok(observer) => observer,
        Err(error) => {
            log::error!("[dualform] failed to create segment observer: {:?}", error);
            return None;
        }
    };
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_attributes(true);
    init.set_subtree(true);
    if let Err(error) = observer.observe_with_options(&container, &init) {
        log::error!("[dualform] failed to observe segments: {:?}", error);
        return None;
    }
    Some((observer, callback))
}

fn convert_record(record: &web_sys::MutationRecord) -> MutationRecord {
    let kind = match record.type_().as_str() {
        "childList" => MutationKind::ChildList,
        "attributes" => MutationKind::Attributes,
        _ => MutationKind::CharacterData,
    };
    MutationRecord {
        kind,
        added_nodes: convert_nodes(&record.added_nodes()),
        removed_nodes: convert_nodes(&record.removed_nodes()),
    }
}

fn convert_nodes(list: &NodeList) -> Vec<MutationNode> {
    (0..list.length())
        .filter_map(|index| list.item(index))
        .map(|node| match node.dyn_into::<Element>() {
            Ok(element) => MutationNode::element(element.class_name().split_whitespace()),
            Err(_) => MutationNode::text(),
        })
        .collect()
}
