//! The `defaults` stage: lowest precedence, writes definition defaults.

use crate::error::LacquerError;
use crate::layers::LayerSet;
use crate::layers::parsed::{ParsedLayers, SourceTag};
use crate::middleware::{Middleware, WriteMode, write_value};

/// Writes every definition default as its parameter's effective value.
///
/// Runs first in the canonical pipeline, so any later stage overrides it.
#[derive(Clone, Copy, Debug, Default)]
pub struct SetFromDefaults;

impl SetFromDefaults {
    /// Create the stage.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Middleware for SetFromDefaults {
    fn source(&self) -> SourceTag {
        SourceTag::Defaults
    }

    fn apply(&self, layers: &LayerSet, parsed: &mut ParsedLayers) -> Result<(), LacquerError> {
        let tag = self.source();
        for layer in layers.iter() {
            for definition in layer.definitions() {
                if let Some(default) = &definition.default {
                    write_value(layer, definition, parsed, &tag, default, WriteMode::Override)?;
                }
            }
        }
        Ok(())
    }
}
