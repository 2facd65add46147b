//! Live DOM adapter, run with `wasm-pack test --headless --firefox -- --features browser`.

#![cfg(all(target_arch = "wasm32", feature = "browser"))]

use std::rc::Rc;

use dualform::platform::browser::{WebDom, render_block, unmount_block};
use dualform::{DependencyController, FormConfig, HostState, SelectField};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Document, Element, Event, HtmlOptionElement, HtmlSelectElement};

wasm_bindgen_test_configure!(run_in_browser);

const TABLE: &str = r#"{"sex": [["f", "Female"], ["m", "Male"]], "age": [["00-04", "0 to 4"]]}"#;

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn add_select(document: &Document, parent: &Element, id: &str, selected: &[&str]) -> HtmlSelectElement {
    let select: HtmlSelectElement = document.create_element("select").unwrap().dyn_into().unwrap();
    select.set_id(id);
    select.set_multiple(selected.len() > 1);
    for value in selected {
        let option = HtmlOptionElement::new_with_text_and_value_and_default_selected_and_selected(value, value, false, true)
            .unwrap();
        select.add_with_html_option_element(&option).unwrap();
    }
    parent.append_child(&select).unwrap();
    select
}

fn render_form(prefix: &str, x_axis: &str) -> Element {
    let document = document();
    let form = document.create_element("form").unwrap();
    add_select(&document, &form, &format!("{}-x_axis", prefix), &[x_axis]);
    add_select(&document, &form, &format!("{}-static_fields-geography_type", prefix), &[]);
    add_select(&document, &form, &format!("{}-second_category", prefix), &[]);
    let primary = add_select(&document, &form, &format!("{}-primary_field_values", prefix), &[]);
    primary.set_multiple(true);
    let script = document.create_element("script").unwrap();
    script.set_attribute("type", "application/json").unwrap();
    script.set_id(&format!("{}-subcategory-data", prefix));
    script.set_text_content(Some(TABLE));
    form.append_child(&script).unwrap();
    document.body().unwrap().append_child(&form).unwrap();
    form
}

#[wasm_bindgen_test]
fn controller_rebuilds_live_select() {
    render_form("browser-a", "sex");

    let dom = WebDom::new(document());
    let mut controller = DependencyController::new(dom, Rc::new(FormConfig::default()), "browser-a");
    controller.initialize(Some(&HostState::default().with_primary_values(["m"])));

    let primary = controller.primary_values_field().unwrap();
    assert_eq!(primary.element().length(), 3);
    assert_eq!(primary.selected_values(), ["m"]);
    // No segments container was rendered.
    assert!(!controller.is_watching());
}

#[wasm_bindgen_test]
fn mounted_block_follows_change_events() {
    render_form("browser-b", "age");

    let handle = render_block("cms.dynamic_content.cards.DualCategoryChartCard", "browser-b", "null").unwrap();
    let document = document();
    let x_axis: HtmlSelectElement = document
        .get_element_by_id("browser-b-x_axis")
        .unwrap()
        .dyn_into()
        .unwrap();
    let option = HtmlOptionElement::new_with_text_and_value("sex", "sex").unwrap();
    x_axis.add_with_html_option_element(&option).unwrap();
    x_axis.set_value("sex");
    x_axis.dispatch_event(&Event::new("change").unwrap()).unwrap();

    let primary: HtmlSelectElement = document
        .get_element_by_id("browser-b-primary_field_values")
        .unwrap()
        .dyn_into()
        .unwrap();
    assert_eq!(primary.length(), 3);

    assert!(unmount_block(handle));
    assert!(!unmount_block(handle));
}

#[wasm_bindgen_test]
fn unknown_block_type_is_rejected() {
    assert!(render_block("cms.dynamic_content.cards.ChartCard", "browser-c", "null").is_err());
}

#[wasm_bindgen_test]
fn unreadable_initial_state_still_mounts() {
    render_form("browser-d", "sex");

    let handle = render_block("cms.dynamic_content.cards.DualCategoryChartCard", "browser-d", "{\"x_axis\": 3").unwrap();
    assert!(unmount_block(handle));
}
