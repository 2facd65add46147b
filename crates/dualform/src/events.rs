//! Events delivered to a mounted block.
//!
//! Change events come from the three category fields; mutation records come
//! from the watcher on the segments container. Both are produced by the
//! platform layer and consumed synchronously by the controller.

use serde::{Deserialize, Serialize};

/// The fields whose value decides which options a value field may offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryField {
    /// `x_axis`: drives the primary values field.
    #[serde(alias = "primary", alias = "x_axis")]
    PrimaryCategory,
    /// `second_category`: drives every segment's secondary value field.
    #[serde(alias = "secondary", alias = "second_category")]
    SecondaryCategory,
    /// Refines the geography key into a concrete list of geographies.
    #[serde(alias = "geography")]
    GeographyType,
}

impl CategoryField {
    pub const ALL: [CategoryField; 3] = [
        CategoryField::PrimaryCategory,
        CategoryField::GeographyType,
        CategoryField::SecondaryCategory,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::PrimaryCategory => "x_axis",
            Self::SecondaryCategory => "second_category",
            Self::GeographyType => "geography_type",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

/// A node reported as added to or removed from the observed subtree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationNode {
    pub is_element: bool,
    pub classes: Vec<String>,
}

impl MutationNode {
    pub fn element<S: Into<String>>(classes: impl IntoIterator<Item = S>) -> Self {
        Self {
            is_element: true,
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn text() -> Self {
        Self {
            is_element: false,
            classes: Vec::new(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord {
    pub kind: MutationKind,
    pub added_nodes: Vec<MutationNode>,
    pub removed_nodes: Vec<MutationNode>,
}

impl MutationRecord {
    pub fn added(nodes: Vec<MutationNode>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            added_nodes: nodes,
            removed_nodes: Vec::new(),
        }
    }

    pub fn removed(nodes: Vec<MutationNode>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            added_nodes: Vec::new(),
            removed_nodes: nodes,
        }
    }

    pub fn attributes() -> Self {
        Self {
            kind: MutationKind::Attributes,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormEvent {
    /// A category field fired `change`; `value` is the field's new value.
    Change { field: CategoryField, value: String },
    /// One observer callback's worth of mutation records.
    Mutations(Vec<MutationRecord>),
}
