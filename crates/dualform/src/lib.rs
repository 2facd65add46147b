//! Dependent select-field reconciliation for the dual category chart form.
//!
//! A category field (e.g. `x_axis = age`) decides which options its value
//! field may offer. The [`controller::DependencyController`] rebuilds those
//! option lists whenever a category changes or the repeatable segment list
//! grows, re-selecting whatever the [`selection_state::SelectionStateStore`]
//! still remembers.

pub mod block;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod field;
pub mod option_table;
pub mod platform;
pub mod registry;
pub mod selection_state;

pub use block::{BaseBlock, BlockDefinition, DualCategoryChartBlock, RenderedBlock};
pub use config::FormConfig;
pub use controller::DependencyController;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::FormError;
pub use events::{CategoryField, FormEvent, MutationKind, MutationNode, MutationRecord};
pub use field::{FormDom, SelectField};
pub use option_table::{Choices, OptionEntry, OptionTable, ShapeMismatch, render_data_script};
pub use registry::BlockRegistry;
pub use selection_state::{HostState, SavedValues, SelectionStateStore};
