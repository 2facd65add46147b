//! Platform adapters implementing [`crate::FormDom`].
//!
//! - `memory` - in-process form used by tests and the CLI
//! - `browser` - live DOM through web-sys (feature `browser`)

pub mod memory;

#[cfg(feature = "browser")]
pub mod browser;
