//! Typed parameter schema: semantic types, definitions, and file handles.

pub mod definition;
pub mod files;
pub mod types;
