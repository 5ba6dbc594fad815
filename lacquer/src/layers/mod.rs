//! Parameter layers: named groups of definitions, and layer sets.

pub mod parsed;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::LacquerError;
use crate::params::definition::ParameterDefinition;

/// A named group of parameter definitions.
///
/// Layers are created once at startup and immutable afterwards. The optional
/// prefix is prepended to parameter names when they are exposed as CLI flags
/// or environment keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterLayer {
    slug: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
    #[serde(
        serialize_with = "serialize_definitions",
        deserialize_with = "deserialize_definitions"
    )]
    definitions: IndexMap<String, ParameterDefinition>,
}

impl ParameterLayer {
    /// Create an empty layer.
    #[must_use]
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            description: String::new(),
            prefix: None,
            definitions: IndexMap::new(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set a prefix for CLI flags and environment keys.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Add a batch of definitions, rejecting duplicates and invalid
    /// definitions.
    ///
    /// # Errors
    ///
    /// Returns [`LacquerError::DuplicateParameter`] or a definition error.
    pub fn with_definitions(
        mut self,
        definitions: Vec<ParameterDefinition>,
    ) -> Result<Self, LacquerError> {
        for definition in definitions {
            self.add_definition(definition)?;
        }
        Ok(self)
    }

    /// Add one definition.
    ///
    /// # Errors
    ///
    /// Returns [`LacquerError::DuplicateParameter`] when the name is taken,
    /// or a definition error when the definition is invalid.
    pub fn add_definition(&mut self, definition: ParameterDefinition) -> Result<(), LacquerError> {
        definition.check_validity()?;
        if self.definitions.contains_key(&definition.name) {
            return Err(LacquerError::DuplicateParameter {
                layer: self.slug.clone(),
                name: definition.name,
            });
        }
        self.definitions.insert(definition.name.clone(), definition);
        Ok(())
    }

    /// Process-wide identifier of the layer.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Human-readable title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Longer description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Prefix prepended to flag and environment key names, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Look up a definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterDefinition> {
        self.definitions.get(name)
    }

    /// Iterate definitions in declaration order.
    pub fn definitions(&self) -> impl Iterator<Item = &ParameterDefinition> {
        self.definitions.values()
    }

    /// Number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the layer has no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Full external name of a parameter: layer prefix plus parameter name.
    #[must_use]
    pub fn full_name(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name.to_owned(),
        }
    }
}

/// An ordered mapping from slug to layer; the unit the pipeline runs over.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerSet {
    layers: IndexMap<String, ParameterLayer>,
}

impl LayerSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set from a list of layers.
    ///
    /// # Errors
    ///
    /// Returns [`LacquerError::DuplicateSlug`] when two layers share a slug.
    pub fn with_layers(layers: Vec<ParameterLayer>) -> Result<Self, LacquerError> {
        let mut set = Self::new();
        for layer in layers {
            set.add(layer)?;
        }
        Ok(set)
    }

    /// Add a layer, rejecting duplicate slugs.
    ///
    /// # Errors
    ///
    /// Returns [`LacquerError::DuplicateSlug`].
    pub fn add(&mut self, layer: ParameterLayer) -> Result<(), LacquerError> {
        if self.layers.contains_key(layer.slug()) {
            return Err(LacquerError::DuplicateSlug(layer.slug().to_owned()));
        }
        self.layers.insert(layer.slug().to_owned(), layer);
        Ok(())
    }

    /// Look up a layer by slug.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<&ParameterLayer> {
        self.layers.get(slug)
    }

    /// Iterate layers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterLayer> {
        self.layers.values()
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Build a reduced set containing only the named slugs, in set order.
    #[must_use]
    pub fn subset(&self, slugs: &[String]) -> Self {
        let layers = self
            .layers
            .iter()
            .filter(|(slug, _)| slugs.iter().any(|s| s == *slug))
            .map(|(slug, layer)| (slug.clone(), layer.clone()))
            .collect();
        Self { layers }
    }
}

fn serialize_definitions<S>(
    definitions: &IndexMap<String, ParameterDefinition>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(definitions.values())
}

fn deserialize_definitions<'de, D>(
    deserializer: D,
) -> Result<IndexMap<String, ParameterDefinition>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let definitions = Vec::<ParameterDefinition>::deserialize(deserializer)?;
    let mut map = IndexMap::with_capacity(definitions.len());
    for definition in definitions {
        if map.insert(definition.name.clone(), definition).is_some() {
            return Err(serde::de::Error::custom("duplicate parameter name"));
        }
    }
    Ok(map)
}
