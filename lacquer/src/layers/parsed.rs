//! Resolved parameter values with per-value provenance trails.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::bind::Settings;
use crate::error::LacquerError;

/// Label describing which pipeline stage wrote a value.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum SourceTag {
    /// Definition defaults.
    Defaults,
    /// Values loaded from configuration files.
    ConfigFile,
    /// Values applied from the active profile.
    Profile,
    /// Values read from environment variables.
    Env,
    /// Values supplied by the host CLI framework.
    Flags,
    /// Explicit programmatic overrides.
    Programmatic,
    /// Caller-defined middleware tag.
    Custom(String),
}

impl SourceTag {
    /// Canonical name of the tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Defaults => "defaults",
            Self::ConfigFile => "config-file",
            Self::Profile => "profile",
            Self::Env => "env",
            Self::Flags => "flags",
            Self::Programmatic => "programmatic",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a provenance trail: the stage that wrote, and what it wrote.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseStep {
    /// Stage label.
    pub source: SourceTag,
    /// Value written by the stage.
    pub raw: Value,
}

/// A resolved value together with its full provenance trail.
///
/// Writes only ever append; the last trail entry designates the effective
/// source.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedValue {
    layer: String,
    name: String,
    value: Value,
    trail: Vec<ParseStep>,
}

impl ParsedValue {
    /// Create a value with its first provenance entry.
    #[must_use]
    pub fn new(
        layer: impl Into<String>,
        name: impl Into<String>,
        source: SourceTag,
        value: Value,
    ) -> Self {
        Self {
            layer: layer.into(),
            name: name.into(),
            value: value.clone(),
            trail: vec![ParseStep { source, raw: value }],
        }
    }

    /// Slug of the owning layer.
    #[must_use]
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// Parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current value.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Full provenance trail, oldest entry first.
    #[must_use]
    pub fn trail(&self) -> &[ParseStep] {
        &self.trail
    }

    /// Source tag of the last write.
    #[must_use]
    pub fn effective_source(&self) -> Option<&SourceTag> {
        self.trail.last().map(|step| &step.source)
    }

    /// Replace the effective value, appending a provenance entry.
    pub fn set(&mut self, source: SourceTag, value: Value) {
        self.value = value.clone();
        self.trail.push(ParseStep { source, raw: value });
    }
}

/// Resolved values for one layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedLayer {
    slug: String,
    values: IndexMap<String, ParsedValue>,
}

impl ParsedLayer {
    /// Create an empty parsed layer for `slug`.
    #[must_use]
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            values: IndexMap::new(),
        }
    }

    /// Slug of the layer.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Look up a parsed value by parameter name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParsedValue> {
        self.values.get(name)
    }

    /// Current value of a parameter, if set.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name).map(ParsedValue::value)
    }

    /// String value of a parameter, if set and a string.
    #[must_use]
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.value(name).and_then(Value::as_str)
    }

    /// Integer value of a parameter, if set and an integer.
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(Value::as_i64)
    }

    /// Float value of a parameter, if set and numeric.
    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.value(name).and_then(Value::as_f64)
    }

    /// Boolean value of a parameter, if set and boolean.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(Value::as_bool)
    }

    /// Write a value unconditionally, appending to the provenance trail.
    pub fn set(&mut self, name: impl Into<String>, source: SourceTag, value: Value) {
        let name = name.into();
        match self.values.get_mut(&name) {
            Some(existing) => existing.set(source, value),
            None => {
                let slug = self.slug.clone();
                self.values
                    .insert(name.clone(), ParsedValue::new(slug, name, source, value));
            }
        }
    }

    /// Write a value only when the parameter is currently unset (overlay
    /// mode). Returns whether a write happened.
    pub fn set_default(&mut self, name: impl Into<String>, source: SourceTag, value: Value) -> bool {
        let name = name.into();
        if self.values.contains_key(&name) {
            return false;
        }
        self.set(name, source, value);
        true
    }

    /// Iterate values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ParsedValue> {
        self.values.values()
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the layer has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Export the layer as a `{name: value}` JSON map.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(name, parsed)| (name.clone(), parsed.value().clone()))
            .collect()
    }
}

/// Resolved values for an entire layer set, keyed by slug.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedLayers {
    layers: IndexMap<String, ParsedLayer>,
}

impl ParsedLayers {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the parsed layer for `slug`.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<&ParsedLayer> {
        self.layers.get(slug)
    }

    /// Get or create the parsed layer for `slug`.
    pub fn get_or_create(&mut self, slug: &str) -> &mut ParsedLayer {
        self.layers
            .entry(slug.to_owned())
            .or_insert_with(|| ParsedLayer::new(slug))
    }

    /// Write a value into a layer, creating the layer as needed.
    pub fn set(&mut self, slug: &str, name: impl Into<String>, source: SourceTag, value: Value) {
        self.get_or_create(slug).set(name, source, value);
    }

    /// Iterate parsed layers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ParsedLayer> {
        self.layers.values()
    }

    /// Export all layers as a `{slug: {name: value}}` JSON value, for
    /// debugging and `--print-parsed-parameters` style tooling.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let map = self
            .layers
            .iter()
            .map(|(slug, layer)| (slug.clone(), Value::Object(layer.to_map())))
            .collect();
        Value::Object(map)
    }

    /// Bind the parsed layer for `slug` into a settings struct.
    ///
    /// # Errors
    ///
    /// Returns [`LacquerError::UnknownLayer`] when the slug has no parsed
    /// layer, or a binding error from the settings implementation.
    pub fn initialize_settings<T: Settings>(&self, slug: &str) -> Result<T, LacquerError> {
        let layer = self
            .layers
            .get(slug)
            .ok_or_else(|| LacquerError::UnknownLayer(slug.to_owned()))?;
        T::from_parsed_layer(layer)
    }
}
