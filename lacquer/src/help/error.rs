//! Errors produced by the help subsystem.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors from the help store, the query DSL, and the loader.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HelpError {
    /// Malformed query syntax.
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        /// 1-based line of the offending token.
        line: u32,
        /// 1-based column of the offending token.
        column: u32,
        /// What went wrong.
        message: String,
    },

    /// A field predicate outside the closed field set.
    #[error("unknown field '{field}'")]
    UnknownField {
        /// The field as written.
        field: String,
    },

    /// A `type:` value outside the section-type enum.
    #[error("unknown section type '{value}'")]
    UnknownType {
        /// The value as written.
        value: String,
    },

    /// A non-boolean value in a boolean field predicate.
    #[error("invalid boolean '{value}' for field '{field}' (use true/false)")]
    InvalidBoolean {
        /// The boolean field.
        field: String,
        /// The value as written.
        value: String,
    },

    /// No section with the requested slug.
    #[error("no help section with slug '{slug}'")]
    NotFound {
        /// The requested slug.
        slug: String,
    },

    /// A section failed validation before a write.
    #[error("invalid section '{slug}': {message}")]
    InvalidSection {
        /// Slug of the offending section, possibly empty.
        slug: String,
        /// What is invalid about it.
        message: String,
    },

    /// The caller's cancellation token fired or its deadline passed.
    #[error("operation cancelled")]
    Cancelled,

    /// Malformed YAML front-matter in a markdown source.
    #[error("invalid front-matter in '{path}': {message}")]
    FrontMatter {
        /// Source file, or `<inline>` for in-memory documents.
        path: Utf8PathBuf,
        /// What went wrong.
        message: String,
    },

    /// Reading a markdown source failed.
    #[error("failed to read '{path}'")]
    Io {
        /// The path that could not be read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An underlying database error.
    #[error("help store error")]
    Sqlite(#[from] rusqlite::Error),
}

impl HelpError {
    /// Build a parse error from a token position.
    #[must_use]
    pub fn parse(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    /// Build an invalid-section error.
    #[must_use]
    pub fn invalid_section(slug: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSection {
            slug: slug.into(),
            message: message.into(),
        }
    }

    /// True when the error came from the query text rather than the store.
    #[must_use]
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. }
                | Self::UnknownField { .. }
                | Self::UnknownType { .. }
                | Self::InvalidBoolean { .. }
        )
    }
}
