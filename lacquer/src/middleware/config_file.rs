//! The `config-file` stage: loads YAML/JSON configuration files.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::LacquerError;
use crate::layers::LayerSet;
use crate::layers::parsed::{ParsedLayers, SourceTag};
use crate::middleware::update::apply_slug_map;
use crate::middleware::{Middleware, WriteMode};

/// One configuration file plus its missing-file policy.
///
/// Files handed over explicitly (a `--config` flag, say) are hard
/// requirements; files found by search-path heuristics are soft, and
/// skipped when absent.
#[derive(Clone, Debug)]
pub struct ConfigSource {
    path: Utf8PathBuf,
    required: bool,
}

impl ConfigSource {
    /// A file the caller named explicitly; missing is an error.
    #[must_use]
    pub fn explicit(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
        }
    }

    /// A file found by search-path heuristics; missing is skipped.
    #[must_use]
    pub fn discovered(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: false,
        }
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

/// Loads configuration files in order; later files override earlier ones.
///
/// Top-level keys match layer slugs and map to `{parameter-name: value}`
/// tables. Flat non-mapping keys are treated as parameters of a designated
/// default layer, supporting legacy single-layer files.
pub struct LoadFromConfigFiles {
    files: Vec<ConfigSource>,
    default_layer: Option<String>,
}

impl LoadFromConfigFiles {
    /// Create the stage from an ordered file list.
    #[must_use]
    pub fn new(files: Vec<ConfigSource>) -> Self {
        Self {
            files,
            default_layer: None,
        }
    }

    /// Route legacy flat keys into the named layer.
    #[must_use]
    pub fn with_default_layer(mut self, slug: impl Into<String>) -> Self {
        self.default_layer = Some(slug.into());
        self
    }
}

impl Middleware for LoadFromConfigFiles {
    fn source(&self) -> SourceTag {
        SourceTag::ConfigFile
    }

    fn apply(&self, layers: &LayerSet, parsed: &mut ParsedLayers) -> Result<(), LacquerError> {
        let tag = self.source();
        for file in &self.files {
            let Some(document) = load_config_document(file)? else {
                continue;
            };
            let map = split_document(&document, self.default_layer.as_deref());
            apply_slug_map(layers, parsed, &tag, &Value::Object(map), WriteMode::Override)?;
        }
        Ok(())
    }
}

/// Read and parse one config file, honoring its missing-file policy.
///
/// Returns `None` when a soft file is absent.
pub(crate) fn load_config_document(file: &ConfigSource) -> Result<Option<Value>, LacquerError> {
    let content = match std::fs::read_to_string(file.path()) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !file.required => {
            debug!(path = %file.path(), "skipping absent config file");
            return Ok(None);
        }
        Err(err) => {
            return Err(LacquerError::config_file(file.path(), err.to_string()));
        }
    };
    let document: Value = serde_yaml::from_str(&content)
        .map_err(|err| LacquerError::config_file(file.path(), err.to_string()))?;
    if !document.is_object() {
        return Err(LacquerError::config_file(
            file.path(),
            "top level must be a mapping",
        ));
    }
    Ok(Some(document))
}

/// Split a config document into a `{slug: {name: value}}` map, routing flat
/// keys to the default layer when configured.
fn split_document(document: &Value, default_layer: Option<&str>) -> Map<String, Value> {
    let mut out: Map<String, Value> = Map::new();
    let Some(entries) = document.as_object() else {
        return out;
    };
    for (key, value) in entries {
        if key == "profile-settings" {
            // Consumed by the profile resolver, never a layer.
            continue;
        }
        if value.is_object() {
            out.insert(key.clone(), value.clone());
        } else if let Some(slug) = default_layer {
            let layer = out
                .entry(slug.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(layer) = layer.as_object_mut() {
                layer.insert(key.clone(), value.clone());
            }
        } else {
            debug!(key, "ignoring flat config key without a default layer");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use serde_json::json;

    use super::{ConfigSource, LoadFromConfigFiles};
    use crate::layers::parsed::SourceTag;
    use crate::layers::{LayerSet, ParameterLayer};
    use crate::middleware::{Pipeline, SetFromDefaults};
    use crate::params::definition::ParameterDefinition;
    use crate::params::types::ParameterType;

    fn layers() -> LayerSet {
        LayerSet::with_layers(vec![ParameterLayer::new("redis", "Redis")
            .with_definitions(vec![
                ParameterDefinition::new("host", ParameterType::String).with_default("localhost"),
                ParameterDefinition::new("port", ParameterType::Integer).with_default(6379),
            ])
            .unwrap()])
        .unwrap()
    }

    fn write_config(dir: &tempfile::TempDir, name: &str, content: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn later_files_override_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_config(&dir, "a.yaml", "redis:\n  host: first\n  port: 1\n");
        let second = write_config(&dir, "b.yaml", "redis:\n  host: second\n");

        let parsed = Pipeline::new()
            .push(SetFromDefaults::new())
            .push(LoadFromConfigFiles::new(vec![
                ConfigSource::explicit(first),
                ConfigSource::explicit(second),
            ]))
            .run(&layers())
            .unwrap();
        let layer = parsed.get("redis").unwrap();
        assert_eq!(layer.get_string("host"), Some("second"));
        assert_eq!(layer.get_i64("port"), Some(1));
        assert_eq!(
            layer.get("host").unwrap().effective_source(),
            Some(&SourceTag::ConfigFile)
        );
        // default, then a.yaml, then b.yaml
        assert_eq!(layer.get("host").unwrap().trail().len(), 3);
    }

    #[test]
    fn flat_keys_route_to_the_default_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "flat.yaml", "host: flat\n");

        let parsed = Pipeline::new()
            .push(
                LoadFromConfigFiles::new(vec![ConfigSource::explicit(path)])
                    .with_default_layer("redis"),
            )
            .run(&layers())
            .unwrap();
        assert_eq!(parsed.get("redis").unwrap().get_string("host"), Some("flat"));
    }

    #[test]
    fn missing_file_policy_depends_on_discovery() {
        let missing = Utf8PathBuf::from("/nonexistent/config.yaml");

        let soft = Pipeline::new()
            .push(LoadFromConfigFiles::new(vec![ConfigSource::discovered(
                missing.clone(),
            )]))
            .run(&layers());
        assert!(soft.is_ok());

        let hard = Pipeline::new()
            .push(LoadFromConfigFiles::new(vec![ConfigSource::explicit(missing)]))
            .run(&layers());
        assert!(hard.is_err());
    }

    #[test]
    fn json_files_parse_too() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "c.json", r#"{"redis": {"port": 9}}"#);

        let parsed = Pipeline::new()
            .push(LoadFromConfigFiles::new(vec![ConfigSource::explicit(path)]))
            .run(&layers())
            .unwrap();
        assert_eq!(parsed.get("redis").unwrap().value("port"), Some(&json!(9)));
    }
}
