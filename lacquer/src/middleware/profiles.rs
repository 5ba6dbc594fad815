//! The `profile` stage: named value sets from a profiles file.
//!
//! A profiles file is a YAML mapping of profile names to slug-keyed
//! parameter maps:
//!
//! ```yaml
//! default:
//!   redis:
//!     host: localhost
//! production:
//!   redis:
//!     host: redis.internal
//! ```

use std::collections::HashMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use tracing::debug;

use crate::error::LacquerError;
use crate::layers::LayerSet;
use crate::layers::parsed::{ParsedLayers, SourceTag};
use crate::middleware::config_file::{ConfigSource, load_config_document};
use crate::middleware::update::apply_slug_map;
use crate::middleware::{Middleware, WriteMode};

/// Resolves and applies the active profile.
///
/// The profile name is chosen in order: an explicit flag value, the
/// `${PREFIX}_PROFILE` environment variable, a `profile-settings.profile`
/// key inside one of the loaded config files, then `"default"`. The
/// profiles file itself follows the same pattern with an explicit flag,
/// `${PREFIX}_PROFILE_FILE`, then the application's default path.
pub struct GatherFromProfiles {
    default_profile_file: Utf8PathBuf,
    profile_file: Option<Utf8PathBuf>,
    profile_flag: Option<String>,
    env_prefix: String,
    config_files: Vec<ConfigSource>,
    env: Option<HashMap<String, String>>,
}

impl GatherFromProfiles {
    /// Create the stage with the application's default profiles path.
    #[must_use]
    pub fn new(env_prefix: impl Into<String>, default_profile_file: impl Into<Utf8PathBuf>) -> Self {
        Self {
            default_profile_file: default_profile_file.into(),
            profile_file: None,
            profile_flag: None,
            env_prefix: env_prefix.into(),
            config_files: Vec::new(),
            env: None,
        }
    }

    /// Use an explicitly requested profiles file; missing becomes an error.
    #[must_use]
    pub fn with_profile_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.profile_file = Some(path.into());
        self
    }

    /// Select a profile explicitly, overriding env and config keys.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile_flag = Some(profile.into());
        self
    }

    /// Config files to consult for a `profile-settings.profile` key.
    #[must_use]
    pub fn with_config_files(mut self, files: Vec<ConfigSource>) -> Self {
        self.config_files = files;
        self
    }

    /// Use a fixed environment map instead of the process environment.
    #[must_use]
    pub fn with_env_map(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    fn env_var(&self, suffix: &str) -> Option<String> {
        let key = format!("{}_{suffix}", self.env_prefix.to_uppercase());
        match &self.env {
            Some(map) => map.get(&key).cloned(),
            None => std::env::var(&key).ok(),
        }
    }

    fn resolve_profile_name(&self) -> Result<String, LacquerError> {
        if let Some(profile) = &self.profile_flag {
            return Ok(profile.clone());
        }
        if let Some(profile) = self.env_var("PROFILE") {
            return Ok(profile);
        }
        for file in &self.config_files {
            let Some(document) = load_config_document(file)? else {
                continue;
            };
            if let Some(profile) = document
                .get("profile-settings")
                .and_then(|settings| settings.get("profile"))
                .and_then(Value::as_str)
            {
                return Ok(profile.to_owned());
            }
        }
        Ok("default".to_owned())
    }

    fn resolve_profile_file(&self) -> (Utf8PathBuf, bool) {
        if let Some(path) = &self.profile_file {
            return (path.clone(), true);
        }
        if let Some(path) = self.env_var("PROFILE_FILE") {
            return (Utf8PathBuf::from(path), true);
        }
        (self.default_profile_file.clone(), false)
    }
}

impl Middleware for GatherFromProfiles {
    fn source(&self) -> SourceTag {
        SourceTag::Profile
    }

    fn apply(&self, layers: &LayerSet, parsed: &mut ParsedLayers) -> Result<(), LacquerError> {
        let profile = self.resolve_profile_name()?;
        let (path, explicit) = self.resolve_profile_file();
        let document = match load_profiles_file(&path) {
            Ok(document) => document,
            Err(LacquerError::ProfileFileMissing { .. }) if !explicit && profile == "default" => {
                debug!(path = %path, "no profiles file; default profile is a no-op");
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        let Some(map) = document.get(&profile) else {
            // The implicit default profile does not have to be declared.
            if profile == "default" {
                debug!(path = %path, "profiles file has no default profile; nothing to apply");
                return Ok(());
            }
            return Err(LacquerError::ProfileNotFound { profile, path });
        };
        debug!(profile, path = %path, "applying profile");
        apply_slug_map(layers, parsed, &self.source(), map, WriteMode::Override)?;
        Ok(())
    }
}

fn load_profiles_file(path: &Utf8Path) -> Result<Value, LacquerError> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            LacquerError::ProfileFileMissing {
                path: path.to_owned(),
            }
        } else {
            LacquerError::config_file(path, err.to_string())
        }
    })?;
    let document: Value = serde_yaml::from_str(&content)
        .map_err(|err| LacquerError::config_file(path, err.to_string()))?;
    if !document.is_object() {
        return Err(LacquerError::config_file(path, "top level must be a mapping"));
    }
    Ok(document)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use camino::Utf8PathBuf;

    use super::GatherFromProfiles;
    use crate::error::LacquerError;
    use crate::layers::parsed::SourceTag;
    use crate::layers::{LayerSet, ParameterLayer};
    use crate::middleware::Pipeline;
    use crate::middleware::config_file::ConfigSource;
    use crate::params::definition::ParameterDefinition;
    use crate::params::types::ParameterType;

    const PROFILES: &str = "\
default:
  redis:
    host: localhost
production:
  redis:
    host: redis.internal
";

    fn layers() -> LayerSet {
        LayerSet::with_layers(vec![ParameterLayer::new("redis", "Redis")
            .with_definitions(vec![ParameterDefinition::new(
                "host",
                ParameterType::String,
            )])
            .unwrap()])
        .unwrap()
    }

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn explicit_profile_flag_selects_the_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "profiles.yaml", PROFILES);

        let parsed = Pipeline::new()
            .push(
                GatherFromProfiles::new("APP", path)
                    .with_profile("production")
                    .with_env_map(HashMap::new()),
            )
            .run(&layers())
            .unwrap();
        let layer = parsed.get("redis").unwrap();
        assert_eq!(layer.get_string("host"), Some("redis.internal"));
        assert_eq!(
            layer.get("host").unwrap().effective_source(),
            Some(&SourceTag::Profile)
        );
    }

    #[test]
    fn env_variable_selects_profile_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "profiles.yaml", PROFILES);
        let env = HashMap::from([
            ("APP_PROFILE".to_owned(), "production".to_owned()),
            ("APP_PROFILE_FILE".to_owned(), path.to_string()),
        ]);

        let parsed = Pipeline::new()
            .push(
                GatherFromProfiles::new("APP", "/nonexistent/profiles.yaml").with_env_map(env),
            )
            .run(&layers())
            .unwrap();
        assert_eq!(
            parsed.get("redis").unwrap().get_string("host"),
            Some("redis.internal")
        );
    }

    #[test]
    fn config_file_key_selects_the_profile() {
        let dir = tempfile::tempdir().unwrap();
        let profiles = write(&dir, "profiles.yaml", PROFILES);
        let config = write(
            &dir,
            "config.yaml",
            "profile-settings:\n  profile: production\n",
        );

        let parsed = Pipeline::new()
            .push(
                GatherFromProfiles::new("APP", profiles)
                    .with_config_files(vec![ConfigSource::explicit(config)])
                    .with_env_map(HashMap::new()),
            )
            .run(&layers())
            .unwrap();
        assert_eq!(
            parsed.get("redis").unwrap().get_string("host"),
            Some("redis.internal")
        );
    }

    #[test]
    fn missing_default_file_is_a_no_op_for_the_default_profile() {
        let result = Pipeline::new()
            .push(
                GatherFromProfiles::new("APP", "/nonexistent/profiles.yaml")
                    .with_env_map(HashMap::new()),
            )
            .run(&layers());
        assert!(result.is_ok());
    }

    #[test]
    fn undeclared_default_profile_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "profiles.yaml",
            "production:\n  redis:\n    host: redis.internal\n",
        );

        let parsed = Pipeline::new()
            .push(GatherFromProfiles::new("APP", path).with_env_map(HashMap::new()))
            .run(&layers())
            .unwrap();
        assert!(parsed.get("redis").is_none());
    }

    #[test]
    fn missing_default_file_errors_for_a_named_profile() {
        let result = Pipeline::new()
            .push(
                GatherFromProfiles::new("APP", "/nonexistent/profiles.yaml")
                    .with_profile("production")
                    .with_env_map(HashMap::new()),
            )
            .run(&layers());
        assert!(matches!(
            result,
            Err(LacquerError::ProfileFileMissing { .. })
        ));
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "profiles.yaml", PROFILES);

        let result = Pipeline::new()
            .push(
                GatherFromProfiles::new("APP", path)
                    .with_profile("staging")
                    .with_env_map(HashMap::new()),
            )
            .run(&layers());
        assert!(matches!(
            result,
            Err(LacquerError::ProfileNotFound { profile, .. }) if profile == "staging"
        ));
    }
}
