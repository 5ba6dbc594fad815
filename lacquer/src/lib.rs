//! Core crate for the `lacquer` command-line tooling framework.
//!
//! `lacquer` helps build data-producing command-line tools. It provides two
//! tightly coupled subsystems:
//!
//! - a declarative **parameter layer** model: typed parameter definitions
//!   grouped into named layers, resolved through an ordered middleware
//!   pipeline that merges defaults, config files, profiles, environment
//!   variables, CLI flags, and programmatic overrides while recording a
//!   provenance trail for every value;
//! - a **help system**: structured help sections stored in an embedded
//!   SQLite database with a full-text index, queried through a small
//!   predicate DSL and rendered as markdown.
//!
//! The [`Settings`] derive (from the companion `lacquer_macros` crate) binds
//! a resolved [`ParsedLayer`] into a caller-supplied struct via
//! `#[parameter("...")]` field attributes.
//!
//! ```no_run
//! use lacquer::middleware::{GatherFromEnv, Pipeline, SetFromDefaults};
//! use lacquer::{LayerSet, ParameterDefinition, ParameterLayer, ParameterType};
//!
//! # fn main() -> Result<(), lacquer::LacquerError> {
//! let layer = ParameterLayer::new("redis", "Redis")
//!     .with_definitions(vec![
//!         ParameterDefinition::new("host", ParameterType::String)
//!             .with_help("Redis host")
//!             .with_default("localhost"),
//!         ParameterDefinition::new("port", ParameterType::Integer).with_default(6379),
//!     ])?;
//! let layers = LayerSet::with_layers(vec![layer])?;
//!
//! let parsed = Pipeline::new()
//!     .push(SetFromDefaults::new())
//!     .push(GatherFromEnv::new("APP"))
//!     .run(&layers)?;
//! assert!(parsed.get("redis").is_some());
//! # Ok(())
//! # }
//! ```

// Lets the derive macro's `::lacquer` paths resolve inside this crate's own
// tests and doctests.
extern crate self as lacquer;

pub mod bind;
pub mod cli;
mod error;
pub mod help;
pub mod layers;
pub mod middleware;
pub mod params;

pub use bind::Settings;
pub use error::{LacquerError, ParameterError};
pub use lacquer_macros::Settings;
pub use layers::parsed::{ParseStep, ParsedLayer, ParsedLayers, ParsedValue, SourceTag};
pub use layers::{LayerSet, ParameterLayer};
pub use params::definition::ParameterDefinition;
pub use params::files::FileHandle;
pub use params::types::ParameterType;
