//! An indexed help system: sections with metadata, a query DSL, and a
//! markdown renderer over an embedded SQLite store.
//!
//! Sections are markdown documents with YAML front-matter ([`loader`]),
//! kept in a full-text-indexed store ([`store`]) and selected with a small
//! boolean query language ([`dsl`]). The [`render`] module turns query
//! results back into a composed markdown page.

pub mod cancel;
pub mod dsl;
mod error;
pub mod loader;
pub mod model;
pub mod render;
pub mod store;

pub use cancel::Cancellation;
pub use dsl::parse_query;
pub use error::HelpError;
pub use loader::{load_section_from_markdown, load_sections_from_dir};
pub use model::{Section, SectionType};
pub use render::{CommandContext, RenderOptions, help_completions, render_help};
pub use store::query::{OrderBy, Predicate};
pub use store::{HelpStore, StoreStats};
