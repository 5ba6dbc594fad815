//! Parameter definitions: schema, parsing, validation, and rendering.

use camino::Utf8Path;
use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{LacquerError, ParameterError};
use crate::params::files::{self, FileHandle};
use crate::params::types::ParameterType;

/// Mask used when rendering `secret` values.
pub const SECRET_MASK: &str = "****";

/// Declarative schema for one parameter.
///
/// Definitions are built once at startup and are immutable afterwards. All
/// raw input, whatever its source, flows through [`parse_from_value`] or
/// [`parse_from_string`] and is checked by [`validate`] before it lands in a
/// parsed layer.
///
/// [`parse_from_value`]: ParameterDefinition::parse_from_value
/// [`parse_from_string`]: ParameterDefinition::parse_from_string
/// [`validate`]: ParameterDefinition::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    /// Name, unique within its layer.
    pub name: String,
    /// Semantic type.
    #[serde(rename = "type")]
    pub parameter_type: ParameterType,
    /// One-line help text.
    #[serde(default)]
    pub help: String,
    /// Default value, written by the `defaults` pipeline stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Valid values for `choice` and `choice-list` types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    /// Optional single-character CLI flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_flag: Option<char>,
    /// Whether the pipeline must produce a value for this parameter.
    #[serde(default)]
    pub required: bool,
}

impl ParameterDefinition {
    /// Create a definition with the given name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, parameter_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            parameter_type,
            help: String::new(),
            default: None,
            choices: Vec::new(),
            short_flag: None,
            required: false,
        }
    }

    /// Set the help text.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Set the default value.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the valid choices for `choice` and `choice-list` types.
    #[must_use]
    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Set a single-character CLI flag.
    #[must_use]
    pub const fn with_short_flag(mut self, flag: char) -> Self {
        self.short_flag = Some(flag);
        self
    }

    /// Mark the parameter as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Check the invariants that make the definition usable.
    ///
    /// # Errors
    ///
    /// Returns [`LacquerError::Definition`] when the name is empty, a choice
    /// type has no choices, or the default value is not assignable to the
    /// declared type. File-loading defaults are checked for shape only; the
    /// referenced file is read at pipeline time.
    pub fn check_validity(&self) -> Result<(), LacquerError> {
        if self.name.is_empty() {
            return Err(LacquerError::Definition {
                name: self.name.clone(),
                message: "parameter name must not be empty".to_owned(),
            });
        }
        if self.parameter_type.needs_choices() && self.choices.is_empty() {
            return Err(LacquerError::Definition {
                name: self.name.clone(),
                message: format!("type {} requires a non-empty choice list", self.parameter_type),
            });
        }
        if let Some(default) = &self.default {
            if self.parameter_type.is_file_loading(default.as_str().unwrap_or("")) {
                // Path-shaped defaults resolve when the defaults stage runs.
                return Ok(());
            }
            let parsed = self.parse_from_value(default).map_err(|err| LacquerError::Definition {
                name: self.name.clone(),
                message: format!("default value is not assignable: {err}"),
            })?;
            self.validate(&parsed).map_err(|err| LacquerError::Definition {
                name: self.name.clone(),
                message: format!("default value is invalid: {err}"),
            })?;
        }
        Ok(())
    }

    /// Parse a raw string into a typed value.
    ///
    /// List types treat the string as a comma-separated list; `key-value`
    /// accepts `key:value` tokens or an `@file` reference.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::TypeMismatch`] when the input cannot be
    /// parsed, or a file error for file-bearing types.
    pub fn parse_from_string(&self, raw: &str) -> Result<Value, ParameterError> {
        match self.parameter_type {
            ParameterType::String | ParameterType::Secret | ParameterType::Choice => {
                Ok(Value::String(raw.to_owned()))
            }
            ParameterType::Integer => self.parse_integer(raw).map(Value::from),
            ParameterType::Float => self.parse_float(raw),
            ParameterType::Bool => self.parse_bool(raw).map(Value::from),
            ParameterType::Date => self.parse_date(raw).map(Value::String),
            ParameterType::StringList | ParameterType::ChoiceList => Ok(Value::Array(
                split_list(raw).map(|s| Value::String(s.to_owned())).collect(),
            )),
            ParameterType::IntegerList => split_list(raw)
                .map(|s| self.parse_integer(s).map(Value::from))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            ParameterType::FloatList => split_list(raw)
                .map(|s| self.parse_float(s))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            ParameterType::KeyValue => self.parse_key_value(raw, &mut Map::new()),
            ParameterType::File => {
                let handle = FileHandle::load(Utf8Path::new(raw))?;
                Ok(to_value(&handle))
            }
            ParameterType::FileList => {
                let handle = FileHandle::load(Utf8Path::new(raw))?;
                Ok(Value::Array(vec![to_value(&handle)]))
            }
            ParameterType::StringFromFile | ParameterType::StringFromFiles => {
                files::read_to_string(Utf8Path::new(raw)).map(Value::String)
            }
            ParameterType::StringListFromFile | ParameterType::StringListFromFiles => {
                self.parse_string_list_file(Utf8Path::new(raw))
            }
            ParameterType::ObjectFromFile => {
                let value = files::read_structured(Utf8Path::new(raw))?;
                self.expect_object(value, raw)
            }
            ParameterType::ObjectListFromFile | ParameterType::ObjectListFromFiles => {
                let value = files::read_structured(Utf8Path::new(raw))?;
                self.expect_object_list(value, raw)
            }
        }
    }

    /// Parse a sequence of raw strings, one per occurrence, into a typed
    /// value. Multi-file types merge contents in input order.
    ///
    /// # Errors
    ///
    /// Returns an error when the type is not multi-valued or any element
    /// fails to parse.
    pub fn parse_from_strings<'a, I>(&self, raws: I) -> Result<Value, ParameterError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let raws: Vec<&str> = raws.into_iter().collect();
        if !self.parameter_type.is_list() {
            return match raws.as_slice() {
                [single] => self.parse_from_string(single),
                _ => Err(self.mismatch(&raws.join(","), "expected a single value")),
            };
        }
        match self.parameter_type {
            ParameterType::KeyValue => {
                let mut acc = Map::new();
                for raw in raws {
                    self.parse_key_value(raw, &mut acc)?;
                }
                Ok(Value::Object(acc))
            }
            ParameterType::StringFromFiles => {
                let mut content = String::new();
                for raw in raws {
                    content.push_str(&files::read_to_string(Utf8Path::new(raw))?);
                }
                Ok(Value::String(content))
            }
            _ => {
                let mut items = Vec::new();
                for raw in raws {
                    match self.parse_from_string(raw)? {
                        Value::Array(mut chunk) => items.append(&mut chunk),
                        other => items.push(other),
                    }
                }
                Ok(Value::Array(items))
            }
        }
    }

    /// Parse structured input (from config files, profiles, or programmatic
    /// maps) into a typed value.
    ///
    /// Strings are routed through [`parse_from_string`], so a string input
    /// for a file-bearing type is a path. Arrays and mappings are taken as
    /// the natural encoding of list, key-value, and object types.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::TypeMismatch`] when the shape does not fit
    /// the declared type.
    ///
    /// [`parse_from_string`]: ParameterDefinition::parse_from_string
    pub fn parse_from_value(&self, raw: &Value) -> Result<Value, ParameterError> {
        match raw {
            Value::String(s) => self.parse_from_string(s),
            Value::Number(n) => match self.parameter_type {
                ParameterType::Integer => n
                    .as_i64()
                    .map(Value::from)
                    .ok_or_else(|| self.mismatch(&n.to_string(), "not a 64-bit integer")),
                ParameterType::Float => n
                    .as_f64()
                    .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
                    .ok_or_else(|| self.mismatch(&n.to_string(), "not a finite float")),
                _ => Err(self.mismatch(&n.to_string(), "expected a string input")),
            },
            Value::Bool(b) => match self.parameter_type {
                ParameterType::Bool => Ok(Value::Bool(*b)),
                _ => Err(self.mismatch(&b.to_string(), "expected a string input")),
            },
            Value::Array(items) => self.parse_array(items),
            Value::Object(map) => self.parse_object(map),
            Value::Null => Err(self.mismatch("null", "value must not be null")),
        }
    }

    /// Check that `value` satisfies the definition: shape matches the type
    /// and choice membership holds.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::TypeMismatch`] or
    /// [`ParameterError::InvalidChoice`].
    pub fn validate(&self, value: &Value) -> Result<(), ParameterError> {
        let shape_ok = match self.parameter_type {
            ParameterType::String
            | ParameterType::Secret
            | ParameterType::Choice
            | ParameterType::Date
            | ParameterType::StringFromFile
            | ParameterType::StringFromFiles => value.is_string(),
            ParameterType::Integer => value.as_i64().is_some(),
            ParameterType::Float => value.as_f64().is_some(),
            ParameterType::Bool => value.is_boolean(),
            ParameterType::StringList
            | ParameterType::ChoiceList
            | ParameterType::StringListFromFile
            | ParameterType::StringListFromFiles => {
                value.as_array().is_some_and(|items| items.iter().all(Value::is_string))
            }
            ParameterType::IntegerList => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| v.as_i64().is_some())),
            ParameterType::FloatList => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| v.as_f64().is_some())),
            ParameterType::KeyValue => value
                .as_object()
                .is_some_and(|map| map.values().all(Value::is_string)),
            ParameterType::File | ParameterType::ObjectFromFile => value.is_object(),
            ParameterType::FileList
            | ParameterType::ObjectListFromFile
            | ParameterType::ObjectListFromFiles => {
                value.as_array().is_some_and(|items| items.iter().all(Value::is_object))
            }
        };
        if !shape_ok {
            return Err(self.mismatch(&value.to_string(), "value shape does not match type"));
        }
        match self.parameter_type {
            ParameterType::Choice => self.check_choice(value)?,
            ParameterType::ChoiceList => {
                for item in value.as_array().into_iter().flatten() {
                    self.check_choice(item)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Render a value for display. Secrets render as a fixed mask.
    #[must_use]
    pub fn render(&self, value: &Value) -> String {
        if self.parameter_type == ParameterType::Secret {
            return SECRET_MASK.to_owned();
        }
        render_value(value)
    }

    fn check_choice(&self, value: &Value) -> Result<(), ParameterError> {
        let text = value.as_str().unwrap_or_default();
        if self.choices.iter().any(|c| c == text) {
            Ok(())
        } else {
            Err(ParameterError::InvalidChoice {
                value: text.to_owned(),
                choices: self.choices.join(", "),
            })
        }
    }

    fn parse_array(&self, items: &[Value]) -> Result<Value, ParameterError> {
        match self.parameter_type {
            ParameterType::StringList | ParameterType::ChoiceList => items
                .iter()
                .map(|v| self.coerce_string(v))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            ParameterType::IntegerList => items
                .iter()
                .map(|v| match v {
                    Value::Number(n) => n
                        .as_i64()
                        .map(Value::from)
                        .ok_or_else(|| self.mismatch(&n.to_string(), "not a 64-bit integer")),
                    Value::String(s) => self.parse_integer(s).map(Value::from),
                    other => Err(self.mismatch(&other.to_string(), "expected an integer")),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            ParameterType::FloatList => items
                .iter()
                .map(|v| match v {
                    Value::Number(n) => n
                        .as_f64()
                        .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
                        .ok_or_else(|| self.mismatch(&n.to_string(), "not a finite float")),
                    Value::String(s) => self.parse_float(s),
                    other => Err(self.mismatch(&other.to_string(), "expected a float")),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            ParameterType::FileList => items
                .iter()
                .map(|v| match v {
                    Value::String(path) => {
                        FileHandle::load(Utf8Path::new(path)).map(|h| to_value(&h))
                    }
                    other => Err(self.mismatch(&other.to_string(), "expected a file path")),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            ParameterType::ObjectListFromFile | ParameterType::ObjectListFromFiles => {
                if items.iter().all(Value::is_object) {
                    Ok(Value::Array(items.to_vec()))
                } else {
                    // A list of path strings loads and concatenates the files.
                    let raws: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                    if raws.len() == items.len() {
                        self.parse_from_strings(raws)
                    } else {
                        Err(self.mismatch(
                            &Value::Array(items.to_vec()).to_string(),
                            "expected objects or file paths",
                        ))
                    }
                }
            }
            ParameterType::StringFromFiles
            | ParameterType::StringListFromFiles
            | ParameterType::StringListFromFile => {
                let raws: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
                if raws.len() == items.len() {
                    self.parse_from_strings(raws)
                } else {
                    Err(self.mismatch(
                        &Value::Array(items.to_vec()).to_string(),
                        "expected a list of file paths",
                    ))
                }
            }
            _ => Err(self.mismatch(
                &Value::Array(items.to_vec()).to_string(),
                "type is not list-valued",
            )),
        }
    }

    fn parse_object(&self, map: &Map<String, Value>) -> Result<Value, ParameterError> {
        match self.parameter_type {
            ParameterType::KeyValue => {
                let mut out = Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), self.coerce_string(value)?);
                }
                Ok(Value::Object(out))
            }
            ParameterType::ObjectFromFile => Ok(Value::Object(map.clone())),
            ParameterType::ObjectListFromFile | ParameterType::ObjectListFromFiles => {
                Ok(Value::Array(vec![Value::Object(map.clone())]))
            }
            _ => Err(self.mismatch(
                &Value::Object(map.clone()).to_string(),
                "type is not object-valued",
            )),
        }
    }

    fn coerce_string(&self, value: &Value) -> Result<Value, ParameterError> {
        match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(self.mismatch(&other.to_string(), "expected a string")),
        }
    }

    fn parse_integer(&self, raw: &str) -> Result<i64, ParameterError> {
        raw.trim()
            .parse::<i64>()
            .map_err(|err| self.mismatch(raw, &err.to_string()))
    }

    fn parse_float(&self, raw: &str) -> Result<Value, ParameterError> {
        let parsed = raw
            .trim()
            .parse::<f64>()
            .map_err(|err| self.mismatch(raw, &err.to_string()))?;
        serde_json::Number::from_f64(parsed)
            .map(Value::Number)
            .ok_or_else(|| self.mismatch(raw, "not a finite float"))
    }

    fn parse_bool(&self, raw: &str) -> Result<bool, ParameterError> {
        parse_bool_token(raw).ok_or_else(|| self.mismatch(raw, "expected true/false/yes/no/1/0"))
    }

    /// Parse a date, accepting RFC-3339 plus a permissive format set, and
    /// normalize it to an RFC-3339 string.
    fn parse_date(&self, raw: &str) -> Result<String, ParameterError> {
        let trimmed = raw.trim();
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.to_rfc3339());
        }
        let today = Utc::now().date_naive();
        let date = match trimmed.to_ascii_lowercase().as_str() {
            "today" => Some(today),
            "yesterday" => today.pred_opt(),
            "tomorrow" => today.succ_opt(),
            _ => ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%B %d, %Y", "%d %B %Y"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok()),
        };
        let date = date.ok_or_else(|| self.mismatch(raw, "unrecognized date"))?;
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| self.mismatch(raw, "unrepresentable date"))?;
        Ok(Utc.from_utc_datetime(&midnight).to_rfc3339())
    }

    /// Parse one `key-value` raw input into `acc`: either comma-separated
    /// `key:value` tokens or an `@file` reference whose content is a map.
    fn parse_key_value(&self, raw: &str, acc: &mut Map<String, Value>) -> Result<Value, ParameterError> {
        if let Some(path) = raw.strip_prefix('@') {
            let value = files::read_structured(Utf8Path::new(path))?;
            let map = value
                .as_object()
                .ok_or_else(|| self.mismatch(raw, "file content is not a map"))?;
            for (key, value) in map {
                acc.insert(key.clone(), self.coerce_string(value)?);
            }
        } else {
            for token in split_list(raw) {
                let (key, value) = token
                    .split_once(':')
                    .ok_or_else(|| self.mismatch(token, "expected key:value"))?;
                acc.insert(key.trim().to_owned(), Value::String(value.trim().to_owned()));
            }
        }
        Ok(Value::Object(acc.clone()))
    }

    fn parse_string_list_file(&self, path: &Utf8Path) -> Result<Value, ParameterError> {
        let content = files::read_to_string(path)?;
        // Structured files provide a list directly; plain text is one entry
        // per line.
        if matches!(path.extension(), Some("yaml" | "yml" | "json")) {
            let value: Value = serde_yaml::from_str(&content).map_err(|err| {
                ParameterError::FileParse {
                    path: path.to_owned(),
                    message: err.to_string(),
                }
            })?;
            return match value {
                Value::Array(items) => items
                    .iter()
                    .map(|v| self.coerce_string(v))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                other => Err(self.mismatch(&other.to_string(), "file content is not a list")),
            };
        }
        Ok(Value::Array(
            content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| Value::String(line.to_owned()))
                .collect(),
        ))
    }

    fn expect_object(&self, value: Value, raw: &str) -> Result<Value, ParameterError> {
        if value.is_object() {
            Ok(value)
        } else {
            Err(self.mismatch(raw, "file content is not a map"))
        }
    }

    fn expect_object_list(&self, value: Value, raw: &str) -> Result<Value, ParameterError> {
        match value {
            Value::Array(items) if items.iter().all(Value::is_object) => Ok(Value::Array(items)),
            Value::Object(map) => Ok(Value::Array(vec![Value::Object(map)])),
            _ => Err(self.mismatch(raw, "file content is not a list of maps")),
        }
    }

    fn mismatch(&self, raw: &str, message: &str) -> ParameterError {
        ParameterError::TypeMismatch {
            parameter_type: self.parameter_type,
            raw: truncate(raw, 120),
            message: message.to_owned(),
        }
    }
}

/// Parse a boolean token as accepted everywhere booleans appear:
/// `true/false/yes/no/1/0`, case-insensitive.
#[must_use]
pub(crate) fn parse_bool_token(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Render a value for display, without masking.
pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn to_value(handle: &FileHandle) -> Value {
    serde_json::to_value(handle).unwrap_or(Value::Null)
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_owned()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}
