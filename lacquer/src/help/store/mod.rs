//! SQLite-backed storage for help sections.
//!
//! One connection behind a mutex: writes are serialized, and every write
//! runs in a transaction so readers only ever observe complete sections.
//! The full-text index is external-content FTS5 kept in sync by triggers
//! (see [`schema`]); the upsert protocol never touches it directly.

pub mod query;
mod schema;

use std::sync::{Mutex, MutexGuard, PoisonError};

use camino::Utf8Path;
use indexmap::IndexMap;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use tracing::debug;

use crate::help::cancel::Cancellation;
use crate::help::error::HelpError;
use crate::help::model::{Section, SectionType};
use query::{OrderBy, Predicate};

/// Counts of stored sections, grouped the way `stats` commands report them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Total number of sections.
    pub total: u64,
    /// Sections per type, in stable type order.
    pub by_type: IndexMap<SectionType, u64>,
    /// Sections flagged top-level.
    pub top_level: u64,
    /// Sections whose content is a template.
    pub templates: u64,
    /// Sections shown without `--all`.
    pub shown_per_default: u64,
}

/// The help store: sections, associations, and a full-text index.
///
/// Open once per process and share by reference. All operations take a
/// [`Cancellation`] token honored between statements.
pub struct HelpStore {
    conn: Mutex<Connection>,
}

impl HelpStore {
    /// Open (and if necessary initialize) a store at the given path.
    pub fn open(path: &Utf8Path) -> Result<Self, HelpError> {
        Self::from_connection(Connection::open(path.as_std_path())?)
    }

    /// An in-memory store, used by tests and ephemeral tooling.
    pub fn in_memory() -> Result<Self, HelpError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, HelpError> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(schema::SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new section; a duplicate slug is an error.
    pub fn insert(&self, section: &mut Section, cancel: &Cancellation) -> Result<(), HelpError> {
        section.validate()?;
        cancel.check()?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO sections (slug, section_type, title, subtitle, short, content, \
             is_top_level, is_template, show_per_default, ord) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            section_params(section),
        )?;
        let id = tx.last_insert_rowid();
        cancel.check()?;
        insert_associations(&tx, id, section, cancel)?;
        tx.commit()?;
        debug!(slug = %section.slug, id, "inserted help section");
        Ok(())
    }

    /// Insert or replace a section by slug, resetting its associations.
    ///
    /// Atomic per section: on failure or cancellation the transaction
    /// rolls back and the pre-call state is preserved, index included.
    pub fn upsert(&self, section: &mut Section, cancel: &Cancellation) -> Result<(), HelpError> {
        section.validate()?;
        cancel.check()?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO sections (slug, section_type, title, subtitle, short, content, \
             is_top_level, is_template, show_per_default, ord) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(slug) DO UPDATE SET \
             section_type = excluded.section_type, title = excluded.title, \
             subtitle = excluded.subtitle, short = excluded.short, \
             content = excluded.content, is_top_level = excluded.is_top_level, \
             is_template = excluded.is_template, \
             show_per_default = excluded.show_per_default, ord = excluded.ord",
            section_params(section),
        )?;
        cancel.check()?;
        let id: i64 = tx.query_row(
            "SELECT id FROM sections WHERE slug = ?",
            params![section.slug],
            |row| row.get(0),
        )?;
        for table in ["section_topics", "section_flags", "section_commands"] {
            cancel.check()?;
            tx.execute(&format!("DELETE FROM {table} WHERE section_id = ?"), params![id])?;
        }
        insert_associations(&tx, id, section, cancel)?;
        tx.commit()?;
        debug!(slug = %section.slug, id, "upserted help section");
        Ok(())
    }

    /// Delete a section by slug; associations and index row go with it.
    pub fn delete(&self, slug: &str, cancel: &Cancellation) -> Result<(), HelpError> {
        cancel.check()?;
        let conn = self.lock();
        let deleted = conn.execute("DELETE FROM sections WHERE slug = ?", params![slug])?;
        if deleted == 0 {
            return Err(HelpError::NotFound {
                slug: slug.to_owned(),
            });
        }
        debug!(slug, "deleted help section");
        Ok(())
    }

    /// Fetch one section by slug.
    pub fn get(&self, slug: &str, cancel: &Cancellation) -> Result<Section, HelpError> {
        cancel.check()?;
        let conn = self.lock();
        let row = conn
            .query_row(
                "SELECT id, slug, section_type, title, subtitle, short, content, \
                 is_top_level, is_template, show_per_default, ord \
                 FROM sections s WHERE slug = ?",
                params![slug],
                section_from_row,
            )
            .optional()?;
        let Some((id, mut section)) = row else {
            return Err(HelpError::NotFound {
                slug: slug.to_owned(),
            });
        };
        cancel.check()?;
        load_associations(&conn, id, &mut section)?;
        Ok(section)
    }

    /// All sections in the given order.
    pub fn list(&self, order: OrderBy, cancel: &Cancellation) -> Result<Vec<Section>, HelpError> {
        self.find(&Predicate::match_all().order_by(order), cancel)
    }

    /// Sections matched by a compiled predicate, in its order.
    pub fn find(
        &self,
        predicate: &Predicate,
        cancel: &Cancellation,
    ) -> Result<Vec<Section>, HelpError> {
        cancel.check()?;
        let conn = self.lock();
        let mut stmt = conn.prepare(&predicate.select_sql())?;
        let rows = stmt.query_map(params_from_iter(predicate.params()), section_from_row)?;
        let mut sections = Vec::new();
        for row in rows {
            cancel.check()?;
            sections.push(row?);
        }
        drop(stmt);
        let mut out = Vec::with_capacity(sections.len());
        for (id, mut section) in sections {
            cancel.check()?;
            load_associations(&conn, id, &mut section)?;
            out.push(section);
        }
        Ok(out)
    }

    /// Number of stored sections.
    pub fn count(&self, cancel: &Cancellation) -> Result<u64, HelpError> {
        cancel.check()?;
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sections", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Counts grouped by type and by the boolean flags.
    pub fn stats(&self, cancel: &Cancellation) -> Result<StoreStats, HelpError> {
        cancel.check()?;
        let conn = self.lock();
        let mut stats = StoreStats::default();
        for section_type in SectionType::ALL {
            stats.by_type.insert(section_type, 0);
        }
        let mut stmt =
            conn.prepare("SELECT section_type, COUNT(*) FROM sections GROUP BY section_type")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
        for row in rows {
            let (code, count) = row?;
            let count = u64::try_from(count).unwrap_or(0);
            stats.total += count;
            if let Some(section_type) = SectionType::from_code(code) {
                stats.by_type.insert(section_type, count);
            }
        }
        drop(stmt);
        cancel.check()?;
        let (top_level, templates, shown): (i64, i64, i64) = conn.query_row(
            "SELECT COALESCE(SUM(is_top_level), 0), COALESCE(SUM(is_template), 0), \
             COALESCE(SUM(show_per_default), 0) FROM sections",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        stats.top_level = u64::try_from(top_level).unwrap_or(0);
        stats.templates = u64::try_from(templates).unwrap_or(0);
        stats.shown_per_default = u64::try_from(shown).unwrap_or(0);
        Ok(stats)
    }
}

fn section_params(section: &Section) -> impl rusqlite::Params + '_ {
    (
        &section.slug,
        section.section_type.code(),
        &section.title,
        &section.subtitle,
        &section.short,
        &section.content,
        section.is_top_level,
        section.is_template,
        section.show_per_default,
        section.order,
    )
}

fn section_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, Section)> {
    let id: i64 = row.get(0)?;
    // Unknown codes cannot be written through this store.
    let section_type = SectionType::from_code(row.get(2)?).unwrap_or_default();
    let section = Section {
        slug: row.get(1)?,
        section_type,
        title: row.get(3)?,
        subtitle: row.get(4)?,
        short: row.get(5)?,
        content: row.get(6)?,
        topics: Vec::new(),
        flags: Vec::new(),
        commands: Vec::new(),
        is_top_level: row.get(7)?,
        is_template: row.get(8)?,
        show_per_default: row.get(9)?,
        order: row.get(10)?,
    };
    Ok((id, section))
}

fn insert_associations(
    conn: &Connection,
    id: i64,
    section: &Section,
    cancel: &Cancellation,
) -> Result<(), HelpError> {
    let groups: [(&str, &[String]); 3] = [
        ("INSERT INTO section_topics (section_id, topic) VALUES (?, ?)", &section.topics),
        ("INSERT INTO section_flags (section_id, flag) VALUES (?, ?)", &section.flags),
        (
            "INSERT INTO section_commands (section_id, command) VALUES (?, ?)",
            &section.commands,
        ),
    ];
    for (sql, values) in groups {
        cancel.check()?;
        let mut stmt = conn.prepare(sql)?;
        for value in values {
            stmt.execute(params![id, value])?;
        }
    }
    Ok(())
}

fn load_associations(conn: &Connection, id: i64, section: &mut Section) -> Result<(), HelpError> {
    section.topics = load_values(
        conn,
        "SELECT topic FROM section_topics WHERE section_id = ? ORDER BY topic",
        id,
    )?;
    section.flags = load_values(
        conn,
        "SELECT flag FROM section_flags WHERE section_id = ? ORDER BY flag",
        id,
    )?;
    section.commands = load_values(
        conn,
        "SELECT command FROM section_commands WHERE section_id = ? ORDER BY command",
        id,
    )?;
    Ok(())
}

fn load_values(conn: &Connection, sql: &str, id: i64) -> Result<Vec<String>, HelpError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![id], |row| row.get::<_, String>(0))?;
    let mut values = Vec::new();
    for row in rows {
        values.push(row?);
    }
    Ok(values)
}
