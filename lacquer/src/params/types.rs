//! The closed set of semantic parameter types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LacquerError;

/// Semantic type of a parameter.
///
/// Each type defines how raw input is parsed into a value, how a value is
/// rendered for display, and whether the parameter is multi-valued. The set
/// is closed; dispatch happens on the variant, never on the shape of the
/// value alone.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParameterType {
    /// Free-form string.
    String,
    /// String whose rendered form is always masked.
    Secret,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit IEEE-754 float.
    Float,
    /// Boolean, accepting `true/false/yes/no/1/0` tokens.
    Bool,
    /// Date, parsed from RFC-3339 and a permissive format set.
    Date,
    /// Single value out of a declared choice list.
    Choice,
    /// Multiple values out of a declared choice list.
    ChoiceList,
    /// List of strings.
    StringList,
    /// List of integers.
    IntegerList,
    /// List of floats.
    FloatList,
    /// String-to-string mapping from `key:value` tokens or an `@file`.
    KeyValue,
    /// File metadata handle (path, size, digest, content).
    File,
    /// List of file metadata handles.
    FileList,
    /// String loaded from a file.
    StringFromFile,
    /// Concatenation of several files into one string.
    StringFromFiles,
    /// List of strings loaded from one file.
    StringListFromFile,
    /// List of strings concatenated from several files.
    StringListFromFiles,
    /// Mapping with arbitrary value types loaded from a file.
    ObjectFromFile,
    /// List of objects loaded from one file.
    ObjectListFromFile,
    /// List of objects merged from several files in input order.
    ObjectListFromFiles,
}

impl ParameterType {
    /// Canonical kebab-case name of the type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Secret => "secret",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Choice => "choice",
            Self::ChoiceList => "choice-list",
            Self::StringList => "string-list",
            Self::IntegerList => "integer-list",
            Self::FloatList => "float-list",
            Self::KeyValue => "key-value",
            Self::File => "file",
            Self::FileList => "file-list",
            Self::StringFromFile => "string-from-file",
            Self::StringFromFiles => "string-from-files",
            Self::StringListFromFile => "string-list-from-file",
            Self::StringListFromFiles => "string-list-from-files",
            Self::ObjectFromFile => "object-from-file",
            Self::ObjectListFromFile => "object-list-from-file",
            Self::ObjectListFromFiles => "object-list-from-files",
        }
    }

    /// Whether the parameter is gathered from a list of raw inputs.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(
            self,
            Self::ChoiceList
                | Self::StringList
                | Self::IntegerList
                | Self::FloatList
                | Self::KeyValue
                | Self::FileList
                | Self::StringFromFiles
                | Self::StringListFromFile
                | Self::StringListFromFiles
                | Self::ObjectListFromFile
                | Self::ObjectListFromFiles
        )
    }

    /// Whether the value is a mapping.
    #[must_use]
    pub const fn is_object(self) -> bool {
        matches!(
            self,
            Self::ObjectFromFile | Self::ObjectListFromFile | Self::ObjectListFromFiles
        )
    }

    /// Whether the value is a string-to-string mapping.
    #[must_use]
    pub const fn is_key_value(self) -> bool {
        matches!(self, Self::KeyValue)
    }

    /// Whether parsing `raw` for this type reads a file.
    ///
    /// `key-value` parameters only load a file when the raw input starts
    /// with `@`, hence the value-dependent signature.
    #[must_use]
    pub fn is_file_loading(self, raw: &str) -> bool {
        match self {
            Self::File
            | Self::FileList
            | Self::StringFromFile
            | Self::StringFromFiles
            | Self::StringListFromFile
            | Self::StringListFromFiles
            | Self::ObjectFromFile
            | Self::ObjectListFromFile
            | Self::ObjectListFromFiles => true,
            Self::KeyValue => raw.starts_with('@'),
            _ => false,
        }
    }

    /// Whether the type requires a non-empty `choices` list.
    #[must_use]
    pub const fn needs_choices(self) -> bool {
        matches!(self, Self::Choice | Self::ChoiceList)
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterType {
    type Err = LacquerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Self::String),
            "secret" => Ok(Self::Secret),
            "integer" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "bool" => Ok(Self::Bool),
            "date" => Ok(Self::Date),
            "choice" => Ok(Self::Choice),
            "choice-list" => Ok(Self::ChoiceList),
            "string-list" => Ok(Self::StringList),
            "integer-list" => Ok(Self::IntegerList),
            "float-list" => Ok(Self::FloatList),
            "key-value" => Ok(Self::KeyValue),
            "file" => Ok(Self::File),
            "file-list" => Ok(Self::FileList),
            "string-from-file" => Ok(Self::StringFromFile),
            "string-from-files" => Ok(Self::StringFromFiles),
            "string-list-from-file" => Ok(Self::StringListFromFile),
            "string-list-from-files" => Ok(Self::StringListFromFiles),
            "object-from-file" => Ok(Self::ObjectFromFile),
            "object-list-from-file" => Ok(Self::ObjectListFromFile),
            "object-list-from-files" => Ok(Self::ObjectListFromFiles),
            other => Err(LacquerError::UnknownParameterType(other.to_owned())),
        }
    }
}
