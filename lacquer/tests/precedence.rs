//! End-to-end precedence across the canonical pipeline stages.

use anyhow::Result;
use camino::Utf8PathBuf;
use lacquer::middleware::{
    ConfigSource, GatherFromEnv, GatherFromProfiles, LoadFromConfigFiles, Pipeline,
    SetFromDefaults, UpdateFromMap,
};
use lacquer::{LayerSet, ParameterDefinition, ParameterLayer, ParameterType, SourceTag};
use serde_json::json;
use serial_test::serial;

fn redis_layers() -> Result<LayerSet> {
    Ok(LayerSet::with_layers(vec![
        ParameterLayer::new("redis", "Redis").with_definitions(vec![
            ParameterDefinition::new("host", ParameterType::String).with_default("from-default"),
        ])?,
    ])?)
}

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> Result<Utf8PathBuf> {
    let path = Utf8PathBuf::from_path_buf(dir.path().join(name))
        .map_err(|path| anyhow::anyhow!("non-utf8 temp path: {}", path.display()))?;
    std::fs::write(&path, content)?;
    Ok(path)
}

#[test]
#[serial]
fn flags_win_over_env_over_file_over_default() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = write_file(&dir, "config.yaml", "redis:\n  host: from-file\n")?;
    std::env::set_var("PRECEDENCE_HOST", "from-env");

    let parsed = Pipeline::new()
        .push(SetFromDefaults::new())
        .push(LoadFromConfigFiles::new(vec![ConfigSource::explicit(config)]))
        .push(GatherFromEnv::new("PRECEDENCE"))
        .push(UpdateFromMap::flags(json!({
            "redis": {"host": "from-flag"}
        })))
        .run(&redis_layers()?)?;
    std::env::remove_var("PRECEDENCE_HOST");

    let layer = parsed.get("redis").expect("redis layer resolved");
    assert_eq!(layer.get_string("host"), Some("from-flag"));

    let value = layer.get("host").expect("host value present");
    assert_eq!(value.effective_source(), Some(&SourceTag::Flags));
    let sources: Vec<&SourceTag> = value.trail().iter().map(|step| &step.source).collect();
    assert_eq!(
        sources,
        [
            &SourceTag::Defaults,
            &SourceTag::ConfigFile,
            &SourceTag::Env,
            &SourceTag::Flags
        ]
    );
    Ok(())
}

#[test]
#[serial]
fn profile_from_env_overrides_config_but_not_flags() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let profiles = write_file(
        &dir,
        "profiles.yaml",
        "default:\n  redis:\n    host: from-profile-default\n\
         prod:\n  redis:\n    host: from-profile-prod\n",
    )?;
    std::env::set_var("PRECEDENCE_PROFILE", "prod");

    let layers = redis_layers()?;
    let profile_stage = || {
        GatherFromProfiles::new("PRECEDENCE", profiles.clone())
    };

    let parsed = Pipeline::new()
        .push(SetFromDefaults::new())
        .push(profile_stage())
        .run(&layers)?;
    assert_eq!(
        parsed.get("redis").and_then(|layer| layer.get_string("host")),
        Some("from-profile-prod")
    );

    let parsed = Pipeline::new()
        .push(SetFromDefaults::new())
        .push(profile_stage())
        .push(UpdateFromMap::flags(json!({
            "redis": {"host": "explicit"}
        })))
        .run(&layers)?;
    std::env::remove_var("PRECEDENCE_PROFILE");
    assert_eq!(
        parsed.get("redis").and_then(|layer| layer.get_string("host")),
        Some("explicit")
    );
    Ok(())
}

#[test]
fn running_the_pipeline_twice_is_idempotent() -> Result<()> {
    let layers = redis_layers()?;
    let run = || {
        Pipeline::new()
            .push(SetFromDefaults::new())
            .push(UpdateFromMap::programmatic(json!({
                "redis": {"host": "fixed"}
            })))
            .run(&layers)
    };
    let first = run()?;
    let second = run()?;
    assert_eq!(first.to_value(), second.to_value());
    Ok(())
}
