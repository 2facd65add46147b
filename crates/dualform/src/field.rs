//! Seams between the controller and whatever document holds the form.
//!
//! Handles are cheap clones that refer to a live element; mutating through a
//! shared handle is visible to every other clone of it.

use crate::option_table::OptionEntry;

/// A `<select>`-like field: a category field or a value field.
///
/// Equality is element identity, not equal contents.
pub trait SelectField: Clone + PartialEq {
    /// Current value, `""` when nothing is selected.
    fn value(&self) -> String;

    /// Values of every selected option, in option order.
    fn selected_values(&self) -> Vec<String>;

    /// Drop every option and leave a single placeholder with an empty value.
    fn reset_to_placeholder(&self, label: &str);

    fn append_option(&self, entry: &OptionEntry, selected: bool);
}

/// Read access to the rendered form.
pub trait FormDom {
    type Field: SelectField;

    fn field_by_id(&self, id: &str) -> Option<Self::Field>;

    /// Fields whose id starts with `id_prefix` and ends with `id_suffix`, in document order.
    fn fields_matching(&self, id_prefix: &str, id_suffix: &str) -> Vec<Self::Field>;

    /// Text content of the element with this id.
    fn text_content(&self, id: &str) -> Option<String>;

    fn has_container(&self, selector: &str) -> bool;
}
