//! Compiled query predicates over the help store.
//!
//! A [`Predicate`] is an opaque WHERE fragment plus its parameter
//! bindings. Association and full-text conditions compile to
//! subqueries against `section_topics`/`section_flags`/
//! `section_commands`/`sections_fts`, so negation and disjunction
//! compose without join bookkeeping.

use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};

use crate::help::model::SectionType;

/// Result ordering for `list` and `find`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OrderBy {
    /// `(ord ASC, title ASC)`, the canonical listing order.
    #[default]
    Default,
    /// Ascending slug, used for completion.
    Slug,
    /// Ascending title.
    Title,
    /// Ascending `ord` only.
    Order,
}

impl OrderBy {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Self::Default => "s.ord ASC, s.title ASC",
            Self::Slug => "s.slug ASC",
            Self::Title => "s.title ASC",
            Self::Order => "s.ord ASC",
        }
    }
}

/// An owned SQL parameter binding.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SqlParam {
    Text(String),
    Int(i64),
}

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Text(text) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes()))),
            Self::Int(value) => Ok(ToSqlOutput::Owned(Value::Integer(*value))),
        }
    }
}

/// A compiled query fragment: a WHERE clause, its bindings, and an order.
#[derive(Clone, Debug)]
pub struct Predicate {
    clause: String,
    params: Vec<SqlParam>,
    order: OrderBy,
}

impl Predicate {
    fn new(clause: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            clause: clause.into(),
            params,
            order: OrderBy::Default,
        }
    }

    /// Matches every section; the compilation of an empty query.
    #[must_use]
    pub fn match_all() -> Self {
        Self::new("1 = 1", Vec::new())
    }

    /// Sections of the given type.
    #[must_use]
    pub fn is_type(section_type: SectionType) -> Self {
        Self::new(
            "s.section_type = ?",
            vec![SqlParam::Int(section_type.code())],
        )
    }

    /// Sections tagged with the topic.
    #[must_use]
    pub fn has_topic(topic: impl Into<String>) -> Self {
        Self::new(
            "s.id IN (SELECT section_id FROM section_topics WHERE topic = ?)",
            vec![SqlParam::Text(topic.into())],
        )
    }

    /// Sections documenting the flag, matched verbatim.
    #[must_use]
    pub fn has_flag(flag: impl Into<String>) -> Self {
        Self::new(
            "s.id IN (SELECT section_id FROM section_flags WHERE flag = ?)",
            vec![SqlParam::Text(flag.into())],
        )
    }

    /// Sections associated with the command.
    #[must_use]
    pub fn has_command(command: impl Into<String>) -> Self {
        Self::new(
            "s.id IN (SELECT section_id FROM section_commands WHERE command = ?)",
            vec![SqlParam::Text(command.into())],
        )
    }

    /// The section with the given slug.
    #[must_use]
    pub fn slug_is(slug: impl Into<String>) -> Self {
        Self::new("s.slug = ?", vec![SqlParam::Text(slug.into())])
    }

    /// Sections flagged top-level.
    #[must_use]
    pub fn top_level() -> Self {
        Self::new("s.is_top_level = 1", Vec::new())
    }

    /// Sections shown without `--all`.
    #[must_use]
    pub fn shown_by_default() -> Self {
        Self::new("s.show_per_default = 1", Vec::new())
    }

    /// Sections whose content is a template.
    #[must_use]
    pub fn is_template() -> Self {
        Self::new("s.is_template = 1", Vec::new())
    }

    /// Full-text match of a phrase over slug/title/subtitle/short/content.
    #[must_use]
    pub fn text_search(phrase: &str) -> Self {
        Self::new(
            "s.id IN (SELECT rowid FROM sections_fts WHERE sections_fts MATCH ?)",
            vec![SqlParam::Text(fts_phrase(phrase))],
        )
    }

    /// Conjunction; keeps the left operand's ordering.
    #[must_use]
    pub fn and(left: Self, right: Self) -> Self {
        let mut params = left.params;
        params.extend(right.params);
        Self {
            clause: format!("({}) AND ({})", left.clause, right.clause),
            params,
            order: left.order,
        }
    }

    /// Disjunction; keeps the left operand's ordering.
    #[must_use]
    pub fn or(left: Self, right: Self) -> Self {
        let mut params = left.params;
        params.extend(right.params);
        Self {
            clause: format!("({}) OR ({})", left.clause, right.clause),
            params,
            order: left.order,
        }
    }

    /// Negation.
    #[must_use]
    pub fn not(inner: Self) -> Self {
        Self {
            clause: format!("NOT ({})", inner.clause),
            params: inner.params,
            order: inner.order,
        }
    }

    /// Override the result ordering.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order = order;
        self
    }

    pub(crate) fn params(&self) -> &[SqlParam] {
        &self.params
    }

    pub(crate) fn select_sql(&self) -> String {
        format!(
            "SELECT s.id, s.slug, s.section_type, s.title, s.subtitle, s.short, s.content, \
             s.is_top_level, s.is_template, s.show_per_default, s.ord \
             FROM sections s WHERE {} ORDER BY {}",
            self.clause,
            self.order.sql()
        )
    }

    /// Render the full query for debugging (`--print-sql`).
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut out = self.select_sql();
        if !self.params.is_empty() {
            out.push_str("\n-- parameters: ");
            for (index, param) in self.params.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                match param {
                    SqlParam::Text(text) => out.push_str(&format!("'{text}'")),
                    SqlParam::Int(value) => out.push_str(&value.to_string()),
                }
            }
        }
        out
    }
}

/// Quote a phrase for FTS5 so its words match adjacently and operator
/// characters lose their meaning.
fn fts_phrase(phrase: &str) -> String {
    format!("\"{}\"", phrase.replace('"', "\"\""))
}
