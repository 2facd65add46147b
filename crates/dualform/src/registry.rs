//! Extension-point registry keyed by block type.

use std::collections::HashMap;
use std::rc::Rc;

use crate::block::{BaseBlock, BlockDefinition, DualCategoryChartBlock, RenderedBlock};
use crate::config::FormConfig;
use crate::error::FormError;
use crate::field::FormDom;
use crate::selection_state::HostState;

pub struct BlockRegistry<D> {
    definitions: HashMap<String, Rc<dyn BlockDefinition<D>>>,
}

impl<D> Default for BlockRegistry<D> {
    fn default() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }
}

impl<D> BlockRegistry<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the definition's own block type, replacing any earlier one.
    pub fn register(&mut self, definition: Rc<dyn BlockDefinition<D>>) -> Option<Rc<dyn BlockDefinition<D>>> {
        let block_type = definition.block_type().to_string();
        self.definitions.insert(block_type, definition)
    }

    pub fn contains(&self, block_type: &str) -> bool {
        self.definitions.contains_key(block_type)
    }

    pub fn block_types(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn render(
        &self,
        block_type: &str,
        dom: D,
        prefix: &str,
        initial_state: Option<&HostState>,
    ) -> Result<Box<dyn RenderedBlock>, FormError> {
        Ok(self.definition(block_type)?.render(dom, prefix, initial_state))
    }

    pub fn render_json(
        &self,
        block_type: &str,
        dom: D,
        prefix: &str,
        initial_state: &str,
    ) -> Result<Box<dyn RenderedBlock>, FormError> {
        Ok(self.definition(block_type)?.render_json(dom, prefix, initial_state))
    }

    fn definition(&self, block_type: &str) -> Result<&Rc<dyn BlockDefinition<D>>, FormError> {
        self.definitions
            .get(block_type)
            .ok_or_else(|| FormError::UnknownBlockType(block_type.to_string()))
    }
}

/// Register the dual category chart block under `config.block_type`.
pub fn register_dual_category_block<D, B>(registry: &mut BlockRegistry<D>, base: B, config: Rc<FormConfig>)
where
    D: FormDom + 'static,
    D::Field: 'static,
    B: BaseBlock<D> + 'static,
{
    registry.register(Rc::new(DualCategoryChartBlock::new(base, config)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CategoryField, FormEvent};
    use crate::platform::memory::{MemoryDom, MemoryStructBlock};

    const BLOCK_TYPE: &str = "cms.dynamic_content.cards.DualCategoryChartCard";

    #[test]
    fn renders_registered_block_by_type() {
        let mut registry = BlockRegistry::new();
        register_dual_category_block(
            &mut registry,
            MemoryStructBlock::new().with_table(r#"{"sex": [["f", "f"], ["m", "m"]]}"#),
            Rc::new(FormConfig::default()),
        );
        assert!(registry.contains(BLOCK_TYPE));

        let dom = MemoryDom::new();
        let mut block = registry.render(BLOCK_TYPE, dom.clone(), "card", None).unwrap();
        assert_eq!(block.block_type(), BLOCK_TYPE);
        assert_eq!(block.prefix(), "card");
        assert!(block.watches_segments());

        dom.select("card-x_axis").unwrap().set_value("sex");
        block.handle_event(&FormEvent::Change {
            field: CategoryField::PrimaryCategory,
            value: "sex".to_string(),
        });
        assert_eq!(dom.select("card-primary_field_values").unwrap().option_values(), ["", "f", "m"]);
    }

    #[test]
    fn unreadable_initial_state_still_renders() {
        let mut registry = BlockRegistry::new();
        register_dual_category_block(
            &mut registry,
            MemoryStructBlock::new().with_table(r#"{"sex": [["f", "f"], ["m", "m"]]}"#),
            Rc::new(FormConfig::default()),
        );

        let dom = MemoryDom::new();
        let mut block = registry.render_json(BLOCK_TYPE, dom.clone(), "card", "{\"x_axis\"").unwrap();
        dom.select("card-x_axis").unwrap().set_value("sex");
        block.handle_event(&FormEvent::Change {
            field: CategoryField::PrimaryCategory,
            value: "sex".to_string(),
        });
        assert_eq!(dom.select("card-primary_field_values").unwrap().option_values(), ["", "f", "m"]);

        let error = registry
            .render_json("cms.dynamic_content.cards.ChartCard", MemoryDom::new(), "card", "{}")
            .err()
            .unwrap();
        assert!(matches!(error, FormError::UnknownBlockType(_)));
    }

    #[test]
    fn unknown_block_type_is_an_error() {
        let registry: BlockRegistry<MemoryDom> = BlockRegistry::new();
        let error = registry
            .render("cms.dynamic_content.cards.ChartCard", MemoryDom::new(), "card", None)
            .err()
            .unwrap();
        assert_eq!(error, FormError::UnknownBlockType("cms.dynamic_content.cards.ChartCard".to_string()));
    }
}
