//! The middleware resolution pipeline.
//!
//! A pipeline is an ordered list of stages. Stages run in list order, each
//! fully completing before the next begins; every write appends to the
//! provenance trail of the touched value, so later stages can observe what
//! earlier ones did. Stage order expresses precedence low-to-high: whichever
//! stage writes last wins. On the first stage error the pipeline aborts and
//! the partial result is discarded.

mod config_file;
mod defaults;
mod env;
mod profiles;
mod update;

pub use config_file::{ConfigSource, LoadFromConfigFiles};
pub use defaults::SetFromDefaults;
pub use env::GatherFromEnv;
pub use profiles::GatherFromProfiles;
pub use update::UpdateFromMap;

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::LacquerError;
use crate::layers::parsed::{ParsedLayers, SourceTag};
use crate::layers::{LayerSet, ParameterLayer};
use crate::params::definition::ParameterDefinition;

/// One stage of the resolution pipeline.
///
/// Implementations perform zero or more writes into `parsed`, parsing and
/// validating every value through the matching definition. Stages never
/// delete values; they only append writes.
pub trait Middleware {
    /// Source tag attached to this stage's provenance entries.
    fn source(&self) -> SourceTag;

    /// Apply the stage.
    ///
    /// # Errors
    ///
    /// Returns a [`LacquerError`] carrying layer, parameter, and source
    /// context; the pipeline aborts on the first error.
    fn apply(&self, layers: &LayerSet, parsed: &mut ParsedLayers) -> Result<(), LacquerError>;
}

/// Whether a stage writes unconditionally or only into unset slots.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WriteMode {
    /// Write unconditionally, replacing the effective value.
    #[default]
    Override,
    /// Write only when the target is currently unset.
    Overlay,
}

/// An ordered, composable resolution pipeline.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Middleware>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage. Stages appended later run later, and therefore take
    /// precedence over earlier ones.
    #[must_use]
    pub fn push(mut self, stage: impl Middleware + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Run all stages in order and enforce `required` definitions.
    ///
    /// # Errors
    ///
    /// Returns the first stage error, or [`LacquerError::MissingRequired`]
    /// when a required parameter has no value after all stages ran. Partial
    /// results are never exposed.
    pub fn run(&self, layers: &LayerSet) -> Result<ParsedLayers, LacquerError> {
        let mut parsed = ParsedLayers::new();
        for stage in &self.stages {
            debug!(stage = %stage.source(), "running pipeline stage");
            stage.apply(layers, &mut parsed)?;
        }
        check_required(layers, &parsed)?;
        Ok(parsed)
    }
}

fn check_required(layers: &LayerSet, parsed: &ParsedLayers) -> Result<(), LacquerError> {
    for layer in layers.iter() {
        for definition in layer.definitions() {
            if !definition.required {
                continue;
            }
            let present = parsed
                .get(layer.slug())
                .and_then(|l| l.get(&definition.name))
                .is_some();
            if !present {
                return Err(LacquerError::MissingRequired {
                    layer: layer.slug().to_owned(),
                    name: definition.name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Restrict a stage to a subset of layers.
pub struct RestrictLayers<M> {
    inner: M,
    slugs: Vec<String>,
}

impl<M: Middleware> Middleware for RestrictLayers<M> {
    fn source(&self) -> SourceTag {
        self.inner.source()
    }

    fn apply(&self, layers: &LayerSet, parsed: &mut ParsedLayers) -> Result<(), LacquerError> {
        let subset = layers.subset(&self.slugs);
        self.inner.apply(&subset, parsed)
    }
}

/// Restrict a stage to specific parameter names within one layer.
pub struct RestrictParameters<M> {
    inner: M,
    slug: String,
    names: Vec<String>,
}

impl<M: Middleware> Middleware for RestrictParameters<M> {
    fn source(&self) -> SourceTag {
        self.inner.source()
    }

    fn apply(&self, layers: &LayerSet, parsed: &mut ParsedLayers) -> Result<(), LacquerError> {
        let Some(layer) = layers.get(&self.slug) else {
            return Ok(());
        };
        let mut reduced = ParameterLayer::new(layer.slug(), layer.title());
        if let Some(prefix) = layer.prefix() {
            reduced = reduced.with_prefix(prefix);
        }
        for definition in layer.definitions() {
            if self.names.iter().any(|n| n == &definition.name) {
                reduced.add_definition(definition.clone())?;
            }
        }
        let subset = LayerSet::with_layers(vec![reduced])?;
        self.inner.apply(&subset, parsed)
    }
}

/// Scoping combinators available on every stage.
pub trait MiddlewareExt: Middleware + Sized {
    /// Only touch the named layers.
    fn restrict_layers<I, S>(self, slugs: I) -> RestrictLayers<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RestrictLayers {
            inner: self,
            slugs: slugs.into_iter().map(Into::into).collect(),
        }
    }

    /// Only touch the named parameters of one layer.
    fn restrict_parameters<I, S>(self, slug: impl Into<String>, names: I) -> RestrictParameters<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RestrictParameters {
            inner: self,
            slug: slug.into(),
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl<M: Middleware + Sized> MiddlewareExt for M {}

/// Parse, validate, and write one structured value, wrapping failures with
/// layer, parameter, and source context.
pub(crate) fn write_value(
    layer: &ParameterLayer,
    definition: &ParameterDefinition,
    parsed: &mut ParsedLayers,
    tag: &SourceTag,
    raw: &Value,
    mode: WriteMode,
) -> Result<(), LacquerError> {
    let value = definition
        .parse_from_value(raw)
        .and_then(|value| {
            definition.validate(&value)?;
            Ok(value)
        })
        .map_err(|cause| {
            LacquerError::resolution(layer.slug(), &definition.name, tag.clone(), cause)
        })?;
    trace!(
        layer = layer.slug(),
        name = %definition.name,
        source = %tag,
        "writing parameter value"
    );
    let target = parsed.get_or_create(layer.slug());
    match mode {
        WriteMode::Override => target.set(&definition.name, tag.clone(), value),
        WriteMode::Overlay => {
            target.set_default(&definition.name, tag.clone(), value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Middleware, MiddlewareExt, Pipeline, SetFromDefaults, UpdateFromMap};
    use crate::error::LacquerError;
    use crate::layers::parsed::{ParsedLayers, SourceTag};
    use crate::layers::{LayerSet, ParameterLayer};
    use crate::params::definition::ParameterDefinition;
    use crate::params::types::ParameterType;

    fn layers() -> LayerSet {
        LayerSet::with_layers(vec![
            ParameterLayer::new("redis", "Redis")
                .with_definitions(vec![
                    ParameterDefinition::new("host", ParameterType::String)
                        .with_default("localhost"),
                    ParameterDefinition::new("port", ParameterType::Integer).with_default(6379),
                ])
                .unwrap(),
            ParameterLayer::new("output", "Output")
                .with_definitions(vec![
                    ParameterDefinition::new("format", ParameterType::Choice)
                        .with_choices(["json", "csv"])
                        .with_default("json"),
                ])
                .unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn stages_run_in_order_and_later_wins() {
        let parsed = Pipeline::new()
            .push(SetFromDefaults::new())
            .push(UpdateFromMap::programmatic(json!({
                "redis": {"host": "override"}
            })))
            .run(&layers())
            .unwrap();

        let host = parsed.get("redis").unwrap().get("host").unwrap();
        assert_eq!(host.value(), &json!("override"));
        assert_eq!(host.effective_source(), Some(&SourceTag::Programmatic));
        assert_eq!(host.trail().len(), 2);
    }

    #[test]
    fn pipeline_is_idempotent() {
        let pipeline = Pipeline::new()
            .push(SetFromDefaults::new())
            .push(UpdateFromMap::flags(json!({"redis": {"port": 6380}})));
        let first = pipeline.run(&layers()).unwrap();
        let second = pipeline.run(&layers()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn stage_error_aborts_the_pipeline() {
        struct Never;
        impl Middleware for Never {
            fn source(&self) -> SourceTag {
                SourceTag::Custom("never".to_owned())
            }
            fn apply(&self, _: &LayerSet, _: &mut ParsedLayers) -> Result<(), LacquerError> {
                unreachable!("must not run after a failed stage");
            }
        }

        let err = Pipeline::new()
            .push(UpdateFromMap::programmatic(json!({
                "output": {"format": "xml"}
            })))
            .push(Never)
            .run(&layers())
            .unwrap_err();
        assert!(matches!(err, LacquerError::Resolution { .. }));
    }

    #[test]
    fn missing_required_is_reported_after_all_stages() {
        let layers = LayerSet::with_layers(vec![ParameterLayer::new("api", "Api")
            .with_definitions(vec![
                ParameterDefinition::new("token", ParameterType::Secret).required(),
            ])
            .unwrap()])
        .unwrap();

        let err = Pipeline::new().push(SetFromDefaults::new()).run(&layers).unwrap_err();
        match err {
            LacquerError::MissingRequired { layer, name } => {
                assert_eq!(layer, "api");
                assert_eq!(name, "token");
            }
            other => panic!("unexpected error: {other}"),
        }

        let parsed = Pipeline::new()
            .push(SetFromDefaults::new())
            .push(UpdateFromMap::flags(json!({"api": {"token": "t"}})))
            .run(&layers)
            .unwrap();
        assert_eq!(parsed.get("api").unwrap().get_string("token"), Some("t"));
    }

    #[test]
    fn restrict_layers_scopes_the_stage() {
        let stage = UpdateFromMap::programmatic(json!({
            "redis": {"host": "a"},
            "output": {"format": "csv"}
        }))
        .restrict_layers(["output"]);

        let parsed = Pipeline::new()
            .push(SetFromDefaults::new())
            .push(stage)
            .run(&layers())
            .unwrap();
        // redis untouched by the scoped stage
        assert_eq!(parsed.get("redis").unwrap().get_string("host"), Some("localhost"));
        assert_eq!(parsed.get("output").unwrap().get_string("format"), Some("csv"));
    }

    #[test]
    fn restrict_parameters_scopes_to_names() {
        let stage = UpdateFromMap::programmatic(json!({
            "redis": {"host": "a", "port": 1}
        }))
        .restrict_parameters("redis", ["port"]);

        let parsed = Pipeline::new()
            .push(SetFromDefaults::new())
            .push(stage)
            .run(&layers())
            .unwrap();
        assert_eq!(parsed.get("redis").unwrap().get_string("host"), Some("localhost"));
        assert_eq!(parsed.get("redis").unwrap().get_i64("port"), Some(1));
    }
}
