//! Shared fixtures for the form scenario tests.

#![allow(dead_code)]

use dualform::HostState;
use dualform::platform::memory::{MemoryForm, MemoryStructBlock};

pub const PREFIX: &str = "card";

pub const TABLE: &str = r#"{
    "age": [["00-04", "0 to 4"], ["05-11", "5 to 11"], ["12-17", "12 to 17"]],
    "sex": [["f", "Female"], ["m", "Male"]],
    "ethnicity": [["a", "Asian"], ["b", "Black"], ["m", "Mixed"]],
    "letters": [["x", "X"], ["y", "Y"], ["z", "Z"]],
    "geography": {
        "region": [["north", "North"], ["south", "South"]],
        "county": [["kent", "Kent"]]
    }
}"#;

pub fn host_state(json: &str) -> HostState {
    HostState::parse(json).unwrap().unwrap()
}

pub fn mount(json: &str) -> MemoryForm {
    mount_with(MemoryStructBlock::new().with_table(TABLE), json)
}

pub fn mount_with(base: MemoryStructBlock, json: &str) -> MemoryForm {
    MemoryForm::mount(base, PREFIX, Some(&host_state(json)))
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
