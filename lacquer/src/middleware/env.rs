//! The `env` stage: reads parameters from environment variables.

use std::collections::HashMap;

use tracing::trace;

use crate::error::LacquerError;
use crate::layers::LayerSet;
use crate::layers::parsed::{ParsedLayers, SourceTag};
use crate::middleware::Middleware;

/// Reads `${PREFIX}_${NAME}` environment variables, where `NAME` is the
/// layer-prefixed parameter name uppercased with dashes mapped to
/// underscores.
///
/// Booleans accept `true/false/yes/no/1/0`; list types accept
/// comma-separated values. Only variables matching a known definition are
/// considered.
pub struct GatherFromEnv {
    prefix: String,
    vars: Option<HashMap<String, String>>,
}

impl GatherFromEnv {
    /// Read from the process environment using `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            vars: None,
        }
    }

    /// Read from a fixed map instead of the process environment.
    #[must_use]
    pub fn from_map(prefix: impl Into<String>, vars: HashMap<String, String>) -> Self {
        Self {
            prefix: prefix.into(),
            vars: Some(vars),
        }
    }

    /// Environment key for a parameter's full (layer-prefixed) name.
    #[must_use]
    pub fn key_for(&self, full_name: &str) -> String {
        let name = full_name.to_ascii_uppercase().replace('-', "_");
        if self.prefix.is_empty() {
            name
        } else {
            format!("{}_{}", self.prefix.to_ascii_uppercase(), name)
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        match &self.vars {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        }
    }
}

impl Middleware for GatherFromEnv {
    fn source(&self) -> SourceTag {
        SourceTag::Env
    }

    fn apply(&self, layers: &LayerSet, parsed: &mut ParsedLayers) -> Result<(), LacquerError> {
        let tag = self.source();
        for layer in layers.iter() {
            for definition in layer.definitions() {
                let key = self.key_for(&layer.full_name(&definition.name));
                let Some(raw) = self.lookup(&key) else {
                    continue;
                };
                trace!(key, layer = layer.slug(), name = %definition.name, "found environment value");
                let value = definition
                    .parse_from_string(&raw)
                    .and_then(|value| {
                        definition.validate(&value)?;
                        Ok(value)
                    })
                    .map_err(|cause| {
                        LacquerError::resolution(layer.slug(), &definition.name, tag.clone(), cause)
                    })?;
                parsed
                    .get_or_create(layer.slug())
                    .set(&definition.name, tag.clone(), value);
            }
        }
        Ok(())
    }
}
