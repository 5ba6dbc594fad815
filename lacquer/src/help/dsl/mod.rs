//! The help query language.
//!
//! A small boolean expression language over section metadata and
//! full-text content:
//!
//! ```text
//! (type:example OR type:tutorial) AND topic:templates
//! NOT flag:--output
//! "template pipeline"
//! ```
//!
//! [`parse_query`] runs the whole pipeline: tokenize, parse, compile to a
//! store [`Predicate`]. An empty query matches every section.

pub mod compiler;
pub mod lexer;
pub mod parser;

pub use compiler::{FIELDS, compile, suggestions};
pub use parser::{Expr, parse};

use crate::help::error::HelpError;
use crate::help::store::query::Predicate;

/// Parse and compile a query in one step.
pub fn parse_query(input: &str) -> Result<Predicate, HelpError> {
    match parse(input)? {
        Some(expr) => compile(&expr),
        None => Ok(Predicate::match_all()),
    }
}

/// One-line usage hint appended to query diagnostics.
#[must_use]
pub fn usage_reminder() -> String {
    format!(
        "query syntax: field:value, \"phrase\", AND/OR/NOT, parentheses; {}",
        suggestions()
    )
}
