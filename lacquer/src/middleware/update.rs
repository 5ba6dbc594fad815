//! Map-driven stages: CLI flag values and programmatic overrides.

use serde_json::Value;
use tracing::debug;

use crate::error::LacquerError;
use crate::layers::LayerSet;
use crate::layers::parsed::{ParsedLayers, SourceTag};
use crate::middleware::{Middleware, WriteMode, write_value};

/// Writes values from a `{layer-slug: {parameter-name: value}}` map.
///
/// Layers absent from the layer set and names absent from their layer are
/// skipped, so the same map can safely be scoped by the restriction
/// combinators. The source tag distinguishes the canonical uses: `flags` for
/// values gathered by the host CLI framework, `programmatic` for explicit
/// caller overrides, or any custom tag for escape-hatch stages.
pub struct UpdateFromMap {
    tag: SourceTag,
    map: Value,
    mode: WriteMode,
}

impl UpdateFromMap {
    /// Create a stage with a caller-defined source tag.
    #[must_use]
    pub const fn new(tag: SourceTag, map: Value) -> Self {
        Self {
            tag,
            map,
            mode: WriteMode::Override,
        }
    }

    /// Stage carrying values from the host CLI framework parse phase.
    #[must_use]
    pub const fn flags(map: Value) -> Self {
        Self::new(SourceTag::Flags, map)
    }

    /// Stage carrying explicit programmatic overrides (highest canonical
    /// precedence).
    #[must_use]
    pub const fn programmatic(map: Value) -> Self {
        Self::new(SourceTag::Programmatic, map)
    }

    /// Switch to overlay mode: only write parameters that are still unset.
    #[must_use]
    pub const fn as_default(mut self) -> Self {
        self.mode = WriteMode::Overlay;
        self
    }
}

impl Middleware for UpdateFromMap {
    fn source(&self) -> SourceTag {
        self.tag.clone()
    }

    fn apply(&self, layers: &LayerSet, parsed: &mut ParsedLayers) -> Result<(), LacquerError> {
        apply_slug_map(layers, parsed, &self.tag, &self.map, self.mode)
    }
}

/// Shared application of a `{slug: {name: value}}` JSON map, used by the
/// map, profile, and config-file stages.
pub(crate) fn apply_slug_map(
    layers: &LayerSet,
    parsed: &mut ParsedLayers,
    tag: &SourceTag,
    map: &Value,
    mode: WriteMode,
) -> Result<(), LacquerError> {
    let Some(entries) = map.as_object() else {
        return Ok(());
    };
    for (slug, values) in entries {
        let Some(layer) = layers.get(slug) else {
            debug!(slug, source = %tag, "skipping unknown layer");
            continue;
        };
        let Some(values) = values.as_object() else {
            continue;
        };
        for (name, raw) in values {
            let Some(definition) = layer.get(name) else {
                debug!(slug, name, source = %tag, "skipping unknown parameter");
                continue;
            };
            write_value(layer, definition, parsed, tag, raw, mode)?;
        }
    }
    Ok(())
}
