//! DDL for the help store.
//!
//! `sections_fts` is an external-content FTS5 table over the text columns
//! of `sections`; the three triggers keep it in sync, so every write path
//! through `sections` maintains exactly one index row per section.

pub(crate) const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL UNIQUE,
    section_type INTEGER NOT NULL DEFAULT 0,
    title TEXT NOT NULL,
    subtitle TEXT NOT NULL DEFAULT '',
    short TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '',
    is_top_level INTEGER NOT NULL DEFAULT 0,
    is_template INTEGER NOT NULL DEFAULT 0,
    show_per_default INTEGER NOT NULL DEFAULT 0,
    ord INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS section_topics (
    section_id INTEGER NOT NULL,
    topic TEXT NOT NULL,
    FOREIGN KEY (section_id) REFERENCES sections(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS section_flags (
    section_id INTEGER NOT NULL,
    flag TEXT NOT NULL,
    FOREIGN KEY (section_id) REFERENCES sections(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS section_commands (
    section_id INTEGER NOT NULL,
    command TEXT NOT NULL,
    FOREIGN KEY (section_id) REFERENCES sections(id) ON DELETE CASCADE
);

CREATE VIRTUAL TABLE IF NOT EXISTS sections_fts USING fts5(
    slug, title, subtitle, short, content,
    content='sections', content_rowid='id'
);

CREATE INDEX IF NOT EXISTS idx_sections_type ON sections(section_type);
CREATE INDEX IF NOT EXISTS idx_sections_top_level ON sections(is_top_level);
CREATE INDEX IF NOT EXISTS idx_sections_show_default ON sections(show_per_default);
CREATE INDEX IF NOT EXISTS idx_sections_ord ON sections(ord);

CREATE INDEX IF NOT EXISTS idx_topics_section_id ON section_topics(section_id);
CREATE INDEX IF NOT EXISTS idx_topics_topic ON section_topics(topic);
CREATE INDEX IF NOT EXISTS idx_flags_section_id ON section_flags(section_id);
CREATE INDEX IF NOT EXISTS idx_flags_flag ON section_flags(flag);
CREATE INDEX IF NOT EXISTS idx_commands_section_id ON section_commands(section_id);
CREATE INDEX IF NOT EXISTS idx_commands_command ON section_commands(command);

CREATE TRIGGER IF NOT EXISTS sections_fts_insert AFTER INSERT ON sections BEGIN
    INSERT INTO sections_fts(rowid, slug, title, subtitle, short, content)
    VALUES (new.id, new.slug, new.title, new.subtitle, new.short, new.content);
END;

CREATE TRIGGER IF NOT EXISTS sections_fts_delete AFTER DELETE ON sections BEGIN
    INSERT INTO sections_fts(sections_fts, rowid, slug, title, subtitle, short, content)
    VALUES ('delete', old.id, old.slug, old.title, old.subtitle, old.short, old.content);
END;

CREATE TRIGGER IF NOT EXISTS sections_fts_update AFTER UPDATE ON sections BEGIN
    INSERT INTO sections_fts(sections_fts, rowid, slug, title, subtitle, short, content)
    VALUES ('delete', old.id, old.slug, old.title, old.subtitle, old.short, old.content);
    INSERT INTO sections_fts(rowid, slug, title, subtitle, short, content)
    VALUES (new.id, new.slug, new.title, new.subtitle, new.short, new.content);
END;
";
