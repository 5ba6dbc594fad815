//! File metadata handles for file-bearing parameter types.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::ParameterError;

/// Metadata handle for a file referenced by a `file` or `file-list`
/// parameter.
///
/// The content is retained when it is valid UTF-8; binary files keep only
/// path, size, and digest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    /// Path as given by the caller.
    pub path: Utf8PathBuf,
    /// Base name of the file.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 digest of the content.
    pub sha256: String,
    /// UTF-8 content, when decodable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl FileHandle {
    /// Load metadata (and UTF-8 content when possible) for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::FileRead`] when the file cannot be read.
    pub fn load(path: &Utf8Path) -> Result<Self, ParameterError> {
        let bytes = std::fs::read(path).map_err(|source| ParameterError::FileRead {
            path: path.to_owned(),
            source,
        })?;
        let digest = Sha256::digest(&bytes);
        let sha256 = digest.iter().map(|b| format!("{b:02x}")).collect();
        let size = bytes.len() as u64;
        let content = String::from_utf8(bytes).ok();
        Ok(Self {
            path: path.to_owned(),
            name: path.file_name().unwrap_or_default().to_owned(),
            size,
            sha256,
            content,
        })
    }
}

/// Read a file to a string, mapping I/O failures to [`ParameterError`].
pub(crate) fn read_to_string(path: &Utf8Path) -> Result<String, ParameterError> {
    std::fs::read_to_string(path).map_err(|source| ParameterError::FileRead {
        path: path.to_owned(),
        source,
    })
}

/// Parse a file as structured data.
///
/// YAML is a superset of JSON, so a single parser covers both encodings
/// regardless of extension.
pub(crate) fn read_structured(path: &Utf8Path) -> Result<Value, ParameterError> {
    let content = read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|err| ParameterError::FileParse {
        path: path.to_owned(),
        message: err.to_string(),
    })
}
