//! Error types for the parameter, pipeline, and binding subsystems.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::layers::parsed::SourceTag;
use crate::params::types::ParameterType;

/// Errors raised while parsing or validating a single parameter value.
///
/// These carry no layer context of their own; the pipeline wraps them into
/// [`LacquerError::Resolution`] with the layer, parameter, and source tag
/// that triggered the write.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParameterError {
    /// The raw input could not be parsed as the declared type.
    #[error("cannot parse {raw:?} as {parameter_type}: {message}")]
    TypeMismatch {
        /// Declared type of the parameter.
        parameter_type: ParameterType,
        /// Offending raw input, rendered for diagnostics.
        raw: String,
        /// Explanation of the failure.
        message: String,
    },

    /// The parsed value is not one of the declared choices.
    #[error("invalid choice {value:?}, expected one of: {choices}")]
    InvalidChoice {
        /// Offending value.
        value: String,
        /// Comma-separated list of valid choices.
        choices: String,
    },

    /// A file referenced by the value could not be read.
    #[error("failed to read '{path}': {source}")]
    FileRead {
        /// Path that failed to load.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// File content could not be parsed into the expected structure.
    #[error("failed to parse '{path}': {message}")]
    FileParse {
        /// Path whose content failed to parse.
        path: Utf8PathBuf,
        /// Explanation of the failure.
        message: String,
    },
}

/// Errors that can occur while building layers or resolving parameters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LacquerError {
    /// A parameter type name outside the closed set.
    #[error("unknown parameter type '{0}'")]
    UnknownParameterType(String),

    /// A definition that cannot be used as declared.
    #[error("invalid definition for parameter '{name}': {message}")]
    Definition {
        /// Parameter name.
        name: String,
        /// Explanation of the failure.
        message: String,
    },

    /// Two layers share a slug within one layer set.
    #[error("duplicate layer slug '{0}'")]
    DuplicateSlug(String),

    /// Two definitions share a name within one layer.
    #[error("duplicate parameter '{name}' in layer '{layer}'")]
    DuplicateParameter {
        /// Layer slug.
        layer: String,
        /// Parameter name.
        name: String,
    },

    /// A pipeline stage failed to parse or validate a value.
    #[error("failed to resolve {layer}.{name} from {tag}: {cause}")]
    Resolution {
        /// Layer slug.
        layer: String,
        /// Parameter name.
        name: String,
        /// Source tag of the stage performing the write.
        tag: SourceTag,
        /// Underlying parameter error.
        #[source]
        cause: ParameterError,
    },

    /// A required parameter has no value after the pipeline ran.
    #[error("missing required parameter {layer}.{name}")]
    MissingRequired {
        /// Layer slug.
        layer: String,
        /// Parameter name.
        name: String,
    },

    /// A caller referenced a layer slug the set does not contain.
    #[error("unknown layer '{0}'")]
    UnknownLayer(String),

    /// A configuration file could not be read or parsed.
    #[error("configuration file error in '{path}': {message}")]
    ConfigFile {
        /// Path that triggered the failure.
        path: Utf8PathBuf,
        /// Explanation of the failure.
        message: String,
    },

    /// The selected profile does not exist in the profile file.
    #[error("profile '{profile}' not found in '{path}'")]
    ProfileNotFound {
        /// Requested profile name.
        profile: String,
        /// Profile file that was searched.
        path: Utf8PathBuf,
    },

    /// An explicitly requested profile file does not exist.
    #[error("profile file '{path}' does not exist")]
    ProfileFileMissing {
        /// Missing path.
        path: Utf8PathBuf,
    },

    /// A struct field could not be bound from a parsed layer.
    #[error("failed to bind field '{field}' (expected {expected}): {message}")]
    Binding {
        /// Destination field name.
        field: String,
        /// Expected Rust type of the field.
        expected: &'static str,
        /// Explanation of the failure, including the offending value.
        message: String,
    },
}

impl LacquerError {
    /// Wrap a [`ParameterError`] with the layer, parameter, and source
    /// context of the write that failed.
    #[must_use]
    pub fn resolution(
        layer: impl Into<String>,
        name: impl Into<String>,
        tag: SourceTag,
        cause: ParameterError,
    ) -> Self {
        Self::Resolution {
            layer: layer.into(),
            name: name.into(),
            tag,
            cause,
        }
    }

    /// Construct a configuration file error for `path`.
    #[must_use]
    pub fn config_file(path: impl Into<Utf8PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigFile {
            path: path.into(),
            message: message.into(),
        }
    }
}
