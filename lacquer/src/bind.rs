//! Binding parsed layers into caller-supplied settings structs.
//!
//! The [`Settings`] trait is usually implemented through the derive macro:
//!
//! ```
//! use lacquer::{ParsedLayers, Settings, SourceTag};
//! use serde_json::json;
//!
//! #[derive(Settings, Default)]
//! struct RedisSettings {
//!     #[parameter("host")]
//!     host: String,
//!     #[parameter("port")]
//!     port: i64,
//!     // untagged: stays zero-valued
//!     note: Option<String>,
//! }
//!
//! let mut parsed = ParsedLayers::new();
//! parsed.set("redis", "host", SourceTag::Defaults, json!("localhost"));
//! parsed.set("redis", "port", SourceTag::Defaults, json!(6379));
//!
//! let settings: RedisSettings = parsed.initialize_settings("redis").unwrap();
//! assert_eq!(settings.host, "localhost");
//! assert_eq!(settings.port, 6379);
//! assert_eq!(settings.note, None);
//! ```

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::LacquerError;
use crate::layers::parsed::ParsedLayer;

/// Types that can be populated from a parsed layer.
///
/// Derived implementations read `#[parameter("name")]` field attributes and
/// assign the matching parsed value to each tagged field; untagged fields
/// keep their `Default` value.
pub trait Settings: Sized {
    /// Build the settings struct from `layer`.
    ///
    /// # Errors
    ///
    /// Returns [`LacquerError::Binding`] when a tagged field cannot be
    /// filled from the layer.
    fn from_parsed_layer(layer: &ParsedLayer) -> Result<Self, LacquerError>;
}

/// Deserialize the parsed value named `name` into a field of type `T`.
///
/// Unset parameters bind as JSON `null`, so `Option<T>` fields become
/// `None` while non-optional fields fail with a binding error naming the
/// field, the expected type, and the actual value.
///
/// # Errors
///
/// Returns [`LacquerError::Binding`] on conversion failure.
pub fn bind_field<T: DeserializeOwned>(layer: &ParsedLayer, name: &str) -> Result<T, LacquerError> {
    let value = layer.value(name).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value.clone()).map_err(|err| LacquerError::Binding {
        field: name.to_owned(),
        expected: std::any::type_name::<T>(),
        message: format!("{err} (value: {value})"),
    })
}
