//! Secondary value fields across the repeatable segment list.

mod common;

use common::{mount, strings};
use dualform::CategoryField;

const TWO_SEGMENTS: &str = r#"{
    "second_category": "letters",
    "segments": [
        {"type": "item", "value": {"secondary_field_value": ["x"]}},
        {"type": "item", "value": {"secondary_field_value": "y"}}
    ]
}"#;

#[test]
fn segments_share_options_but_not_selections() {
    let form = mount(TWO_SEGMENTS);

    assert_eq!(form.segment_count(), 2);
    for segment in 0..2 {
        assert_eq!(form.secondary_option_values(segment), strings(&["", "x", "y", "z"]));
    }
    assert_eq!(form.secondary_selected(0), strings(&["x"]));
    assert_eq!(form.secondary_selected(1), strings(&["y"]));
}

#[test]
fn appended_segment_keeps_siblings() {
    let mut form = mount(TWO_SEGMENTS);

    form.add_segment();

    assert_eq!(form.segment_count(), 3);
    assert_eq!(form.secondary_selected(0), strings(&["x"]));
    assert_eq!(form.secondary_selected(1), strings(&["y"]));
    assert_eq!(form.secondary_option_values(2), strings(&["", "x", "y", "z"]));
    assert!(form.secondary_selected(2).is_empty());
}

#[test]
fn in_progress_selection_survives_insertion() {
    let mut form = mount(TWO_SEGMENTS);
    form.select_secondary(0, ["z"]);

    form.add_segment();

    assert_eq!(form.secondary_selected(0), strings(&["z"]));
    assert_eq!(form.secondary_selected(1), strings(&["y"]));
}

#[test]
fn segment_inserted_in_the_middle_keeps_neighbours() {
    let mut form = mount(TWO_SEGMENTS);

    form.insert_segment(1);

    assert_eq!(form.segment_count(), 3);
    assert_eq!(form.secondary_selected(0), strings(&["x"]));
    assert!(form.secondary_selected(1).is_empty());
    assert_eq!(form.secondary_option_values(1), strings(&["", "x", "y", "z"]));
    assert_eq!(form.secondary_selected(2), strings(&["y"]));
}

#[test]
fn new_segment_without_category_is_placeholder_only() {
    let mut form = mount(r#"{"segments": [{"value": {"secondary_field_value": ["x"]}}]}"#);
    assert_eq!(form.secondary_option_values(0), strings(&[""]));

    form.add_segment();

    assert_eq!(form.secondary_option_values(1), strings(&[""]));
    assert!(form.secondary_selected(1).is_empty());
}

#[test]
fn removal_realigns_selection_state() {
    let mut form = mount(TWO_SEGMENTS);

    assert!(form.remove_segment(0));
    assert_eq!(form.segment_count(), 1);
    let store = form.controller().store();
    assert_eq!(store.secondary().len(), 1);
    assert!(store.is_secondary_selected("y", 0));

    form.add_segment();
    assert_eq!(form.secondary_selected(0), strings(&["y"]));
    assert!(form.secondary_selected(1).is_empty());

    assert!(!form.remove_segment(5));
}

#[test]
fn secondary_category_change_clears_every_segment() {
    let mut form = mount(TWO_SEGMENTS);

    form.change(CategoryField::SecondaryCategory, "sex");

    for segment in 0..2 {
        assert_eq!(form.secondary_option_values(segment), strings(&["", "f", "m"]));
        assert!(form.secondary_selected(segment).is_empty());
    }

    form.change(CategoryField::SecondaryCategory, "letters");
    assert!(form.secondary_selected(0).is_empty());
}

#[test]
fn geography_type_change_rebuilds_secondary_only_when_geography() {
    let mut form = mount(
        r#"{
            "x_axis": "age",
            "primary_field_values": ["00-04"],
            "second_category": "geography",
            "static_fields": {"geography_type": "region"},
            "segments": [{"value": {"secondary_field_value": ["south"]}}]
        }"#,
    );
    assert_eq!(form.secondary_selected(0), strings(&["south"]));

    form.change(CategoryField::GeographyType, "county");

    assert_eq!(form.secondary_option_values(0), strings(&["", "kent"]));
    assert!(form.secondary_selected(0).is_empty());
    assert_eq!(form.primary_selected(), strings(&["00-04"]));
}

#[test]
fn geography_type_change_rebuilds_both_fields() {
    let mut form = mount(
        r#"{
            "x_axis": "geography",
            "second_category": "geography",
            "static_fields": {"geography_type": "county"},
            "segments": [{"value": {}}]
        }"#,
    );

    form.change(CategoryField::GeographyType, "region");

    assert_eq!(form.primary_values().unwrap().option_values(), strings(&["", "north", "south"]));
    assert_eq!(form.secondary_option_values(0), strings(&["", "north", "south"]));
}

#[test]
fn snapshot_lists_every_field() {
    let mut form = mount(TWO_SEGMENTS);
    form.add_segment();

    let snapshot = form.snapshot();

    assert_eq!(snapshot.categories["second_category"], "letters");
    assert_eq!(snapshot.segments.len(), 3);
    assert_eq!(snapshot.segments[1].selected, strings(&["y"]));
    assert!(snapshot.primary_values.is_some());
}
