//! Binding parameter layers to a `clap` command line.
//!
//! [`build_command`] registers one flag per definition; [`gather_matches`]
//! turns the parsed matches back into the `{slug: {name: raw}}` map the
//! `flags` pipeline stage consumes. Only values the user actually typed
//! are gathered, so defaults keep their own provenance entry.

pub mod help_command;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::{Map, Value};

use crate::layers::LayerSet;
use crate::params::types::ParameterType;

/// Register every layer's definitions as flags on a command.
///
/// The long flag is the prefixed kebab name; requiredness is not enforced
/// here, the pipeline reports missing required parameters with layer
/// context instead.
#[must_use]
pub fn build_command(mut cmd: Command, layers: &LayerSet) -> Command {
    for layer in layers.iter() {
        for definition in layer.definitions() {
            let long = layer.full_name(&definition.name);
            let mut arg = Arg::new(long.clone())
                .long(long)
                .help(definition.help.clone())
                .help_heading(layer.title().to_owned());
            if let Some(short) = definition.short_flag {
                arg = arg.short(short);
            }
            arg = match definition.parameter_type {
                ParameterType::Bool => arg.action(ArgAction::SetTrue),
                kind if kind.is_list() => arg.action(ArgAction::Append),
                _ => arg.action(ArgAction::Set),
            };
            cmd = cmd.arg(arg);
        }
    }
    cmd
}

/// Collect user-provided flag values into a slug-keyed map.
///
/// Values a flag's default produced are skipped; the map holds raw strings
/// (or string arrays for list flags) for the `flags` stage to parse.
#[must_use]
pub fn gather_matches(matches: &ArgMatches, layers: &LayerSet) -> Value {
    let mut out: Map<String, Value> = Map::new();
    for layer in layers.iter() {
        let mut values: Map<String, Value> = Map::new();
        for definition in layer.definitions() {
            let id = layer.full_name(&definition.name);
            if matches.value_source(&id) != Some(ValueSource::CommandLine) {
                continue;
            }
            let raw = match definition.parameter_type {
                ParameterType::Bool => Value::Bool(matches.get_flag(&id)),
                kind if kind.is_list() => {
                    let items = matches
                        .get_many::<String>(&id)
                        .map(|occurrences| {
                            occurrences
                                .map(|item| Value::String(item.clone()))
                                .collect()
                        })
                        .unwrap_or_default();
                    Value::Array(items)
                }
                _ => match matches.get_one::<String>(&id) {
                    Some(value) => Value::String(value.clone()),
                    None => continue,
                },
            };
            values.insert(definition.name.clone(), raw);
        }
        if !values.is_empty() {
            out.insert(layer.slug().to_owned(), Value::Object(values));
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use clap::Command;
    use serde_json::json;

    use super::{build_command, gather_matches};
    use crate::layers::{LayerSet, ParameterLayer};
    use crate::middleware::{Pipeline, SetFromDefaults, UpdateFromMap};
    use crate::params::definition::ParameterDefinition;
    use crate::params::types::ParameterType;

    fn layers() -> LayerSet {
        LayerSet::with_layers(vec![
            ParameterLayer::new("redis", "Redis")
                .with_definitions(vec![
                    ParameterDefinition::new("host", ParameterType::String)
                        .with_default("localhost")
                        .with_short_flag('H'),
                    ParameterDefinition::new("verbose", ParameterType::Bool),
                    ParameterDefinition::new("tags", ParameterType::StringList),
                ])
                .unwrap(),
            ParameterLayer::new("output", "Output")
                .with_prefix("out-")
                .with_definitions(vec![ParameterDefinition::new(
                    "format",
                    ParameterType::String,
                )])
                .unwrap(),
        ])
        .unwrap()
    }

    fn matches(argv: &[&str]) -> clap::ArgMatches {
        build_command(Command::new("app"), &layers())
            .try_get_matches_from(argv)
            .unwrap()
    }

    #[test]
    fn typed_flags_end_up_in_their_layer() {
        let gathered = gather_matches(
            &matches(&["app", "--host", "example.com", "--out-format", "yaml"]),
            &layers(),
        );
        assert_eq!(
            gathered,
            json!({
                "redis": {"host": "example.com"},
                "output": {"format": "yaml"},
            })
        );
    }

    #[test]
    fn untyped_flags_are_not_gathered() {
        let gathered = gather_matches(&matches(&["app"]), &layers());
        assert_eq!(gathered, json!({}));
    }

    #[test]
    fn short_flags_and_booleans_work() {
        let gathered = gather_matches(&matches(&["app", "-H", "h", "--verbose"]), &layers());
        assert_eq!(
            gathered,
            json!({"redis": {"host": "h", "verbose": true}})
        );
    }

    #[test]
    fn repeated_list_flags_accumulate() {
        let gathered = gather_matches(
            &matches(&["app", "--tags", "a", "--tags", "b"]),
            &layers(),
        );
        assert_eq!(gathered, json!({"redis": {"tags": ["a", "b"]}}));
    }

    #[test]
    fn gathered_map_feeds_the_flags_stage() {
        let layers = layers();
        let gathered = gather_matches(&matches(&["app", "--host", "flagged"]), &layers);
        let parsed = Pipeline::new()
            .push(SetFromDefaults::new())
            .push(UpdateFromMap::flags(gathered))
            .run(&layers)
            .unwrap();
        assert_eq!(
            parsed.get("redis").unwrap().get_string("host"),
            Some("flagged")
        );
    }
}
