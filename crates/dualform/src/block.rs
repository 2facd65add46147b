//! Block definitions the host form framework instantiates.
//!
//! The host owns a base struct block that renders the plain fields. The dual
//! category block wraps that base by composition: base render first, then a
//! [`DependencyController`] takes over the rendered fields.

use std::rc::Rc;

use crate::config::FormConfig;
use crate::controller::DependencyController;
use crate::events::{CategoryField, FormEvent};
use crate::field::FormDom;
use crate::selection_state::HostState;

/// The host's own rendering of a block's fields.
pub trait BaseBlock<D> {
    fn render(&self, dom: &D, prefix: &str, initial_state: Option<&HostState>);
}

/// Base for hosts that render the fields before the block is mounted.
impl<D> BaseBlock<D> for () {
    fn render(&self, _dom: &D, _prefix: &str, _initial_state: Option<&HostState>) {}
}

/// A block instance after render.
pub trait RenderedBlock {
    fn block_type(&self) -> &str;
    fn prefix(&self) -> &str;
    fn handle_event(&mut self, event: &FormEvent);
    /// Category fields the platform should forward `change` events from.
    fn listened_fields(&self) -> Vec<CategoryField>;
    /// Whether the platform should observe the segments container.
    fn watches_segments(&self) -> bool;
    fn teardown(&mut self);
}

/// Capability the host looks up by block type.
pub trait BlockDefinition<D> {
    fn block_type(&self) -> &str;
    fn render(&self, dom: D, prefix: &str, initial_state: Option<&HostState>) -> Box<dyn RenderedBlock>;
    /// Render from the host's raw initial state JSON. Unreadable state is
    /// reported by the block and treated as absent.
    fn render_json(&self, dom: D, prefix: &str, initial_state: &str) -> Box<dyn RenderedBlock>;
}

pub struct DualCategoryChartBlock<B> {
    base: B,
    config: Rc<FormConfig>,
}

impl<B> DualCategoryChartBlock<B> {
    pub fn new(base: B, config: Rc<FormConfig>) -> Self {
        Self { base, config }
    }

    pub fn config(&self) -> &Rc<FormConfig> {
        &self.config
    }

    /// Render the base fields and hand them to a fresh controller.
    pub fn mount<D>(&self, dom: D, prefix: &str, initial_state: Option<&HostState>) -> DependencyController<D>
    where
        D: FormDom,
        B: BaseBlock<D>,
    {
        self.base.render(&dom, prefix, initial_state);
        let mut controller = DependencyController::new(dom, Rc::clone(&self.config), prefix);
        controller.initialize(initial_state);
        controller
    }

    /// [`Self::mount`] from the host's raw initial state JSON.
    pub fn mount_json<D>(&self, dom: D, prefix: &str, initial_state: &str) -> DependencyController<D>
    where
        D: FormDom,
        B: BaseBlock<D>,
    {
        match HostState::parse(initial_state) {
            Ok(host_state) => self.mount(dom, prefix, host_state.as_ref()),
            Err(error) => {
                let mut controller = self.mount(dom, prefix, None);
                controller.report_unreadable_state(&error, initial_state);
                controller
            }
        }
    }
}

impl<D, B> BlockDefinition<D> for DualCategoryChartBlock<B>
where
    D: FormDom + 'static,
    D::Field: 'static,
    B: BaseBlock<D>,
{
    fn block_type(&self) -> &str {
        &self.config.block_type
    }

    fn render(&self, dom: D, prefix: &str, initial_state: Option<&HostState>) -> Box<dyn RenderedBlock> {
        Box::new(self.mount(dom, prefix, initial_state))
    }

    fn render_json(&self, dom: D, prefix: &str, initial_state: &str) -> Box<dyn RenderedBlock> {
        Box::new(self.mount_json(dom, prefix, initial_state))
    }
}

impl<D: FormDom> RenderedBlock for DependencyController<D> {
    fn block_type(&self) -> &str {
        &self.config().block_type
    }

    fn prefix(&self) -> &str {
        DependencyController::prefix(self)
    }

    fn handle_event(&mut self, event: &FormEvent) {
        DependencyController::handle_event(self, event)
    }

    fn listened_fields(&self) -> Vec<CategoryField> {
        DependencyController::listened_fields(self)
    }

    fn watches_segments(&self) -> bool {
        self.is_watching()
    }

    fn teardown(&mut self) {
        DependencyController::teardown(self)
    }
}
