//! Loading help sections from markdown files with YAML front-matter.
//!
//! ```markdown
//! ---
//! slug: templates
//! title: Working with templates
//! sectionType: Example
//! topics:
//!   - templates
//! showPerDefault: true
//! ---
//! The markdown body becomes the section content.
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::debug;

use crate::help::cancel::Cancellation;
use crate::help::error::HelpError;
use crate::help::model::{Section, SectionType};
use crate::help::store::HelpStore;

/// Recognized front-matter keys; everything unlisted defaults.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrontMatter {
    slug: String,
    title: String,
    #[serde(default)]
    subtitle: String,
    #[serde(default)]
    short: String,
    #[serde(default)]
    section_type: SectionType,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    flags: Vec<String>,
    #[serde(default)]
    commands: Vec<String>,
    #[serde(default)]
    is_top_level: bool,
    #[serde(default)]
    is_template: bool,
    #[serde(default)]
    show_per_default: bool,
    #[serde(default)]
    order: i64,
}

/// Parse one markdown document into a section.
pub fn load_section_from_markdown(input: &str) -> Result<Section, HelpError> {
    parse_document(input, Utf8Path::new("<inline>"))
}

/// Load every `.md` file in a directory, in sorted name order, upserting
/// each into the store. Returns the number of sections loaded.
pub fn load_sections_from_dir(
    store: &HelpStore,
    dir: &Utf8Path,
    cancel: &Cancellation,
) -> Result<usize, HelpError> {
    let entries = std::fs::read_dir(dir.as_std_path()).map_err(|source| HelpError::Io {
        path: dir.to_owned(),
        source,
    })?;
    let mut paths: Vec<Utf8PathBuf> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| Utf8PathBuf::from_path_buf(entry.path()).ok())
        .filter(|path| path.extension() == Some("md"))
        .collect();
    paths.sort();

    let mut loaded = 0;
    for path in paths {
        cancel.check()?;
        let content = std::fs::read_to_string(path.as_std_path())
            .map_err(|source| HelpError::Io {
                path: path.clone(),
                source,
            })?;
        let mut section = parse_document(&content, &path)?;
        store.upsert(&mut section, cancel)?;
        debug!(slug = %section.slug, path = %path, "loaded help section");
        loaded += 1;
    }
    Ok(loaded)
}

fn parse_document(input: &str, path: &Utf8Path) -> Result<Section, HelpError> {
    let (front, body) = split_front_matter(input).ok_or_else(|| HelpError::FrontMatter {
        path: path.to_owned(),
        message: "missing '---' front-matter fences".to_owned(),
    })?;
    let matter: FrontMatter =
        serde_yaml::from_str(front).map_err(|err| HelpError::FrontMatter {
            path: path.to_owned(),
            message: err.to_string(),
        })?;
    Ok(Section {
        slug: matter.slug,
        section_type: matter.section_type,
        title: matter.title,
        subtitle: matter.subtitle,
        short: matter.short,
        content: body.trim().to_owned(),
        topics: matter.topics,
        flags: matter.flags,
        commands: matter.commands,
        is_top_level: matter.is_top_level,
        is_template: matter.is_template,
        show_per_default: matter.show_per_default,
        order: matter.order,
    })
}

/// Split a document at its `---` fences; `None` when they are missing.
fn split_front_matter(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix("---")?;
    let rest = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n"))?;
    for (offset, line) in line_spans(rest) {
        if line.trim_end() == "---" {
            let front = &rest[..offset];
            let body_start = offset + line.len();
            let body = rest.get(body_start..).unwrap_or("");
            return Some((front, body));
        }
    }
    None
}

/// Byte offsets and text of each line, newline included.
fn line_spans(input: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    input.split_inclusive('\n').map(move |line| {
        let span = (offset, line);
        offset += line.len();
        span
    })
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::{load_section_from_markdown, load_sections_from_dir};
    use crate::help::cancel::Cancellation;
    use crate::help::error::HelpError;
    use crate::help::model::SectionType;
    use crate::help::store::HelpStore;

    const DOC: &str = "\
---
slug: templates
title: Working with templates
sectionType: Example
topics:
  - templates
  - advanced
flags:
  - --template
showPerDefault: true
order: 5
---
Body text with a *template pipeline*.
";

    #[test]
    fn front_matter_maps_to_section_fields() {
        let section = load_section_from_markdown(DOC).unwrap();
        assert_eq!(section.slug, "templates");
        assert_eq!(section.section_type, SectionType::Example);
        assert_eq!(section.topics, ["templates", "advanced"]);
        assert_eq!(section.flags, ["--template"]);
        assert!(section.show_per_default);
        assert_eq!(section.order, 5);
        assert_eq!(section.content, "Body text with a *template pipeline*.");
    }

    #[test]
    fn defaults_apply_to_omitted_keys() {
        let section =
            load_section_from_markdown("---\nslug: s\ntitle: T\n---\nbody\n").unwrap();
        assert_eq!(section.section_type, SectionType::GeneralTopic);
        assert!(!section.is_top_level);
        assert_eq!(section.order, 0);
    }

    #[test]
    fn missing_fences_are_an_error() {
        let result = load_section_from_markdown("slug: s\ntitle: T\n");
        assert!(matches!(result, Err(HelpError::FrontMatter { .. })));
    }

    #[test]
    fn missing_slug_is_a_front_matter_error() {
        let result = load_section_from_markdown("---\ntitle: T\n---\nbody\n");
        assert!(matches!(result, Err(HelpError::FrontMatter { .. })));
    }

    #[test]
    fn directory_load_upserts_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        std::fs::write(
            dir_path.join("b.md"),
            "---\nslug: b\ntitle: B\n---\nsecond\n",
        )
        .unwrap();
        std::fs::write(
            dir_path.join("a.md"),
            "---\nslug: a\ntitle: A\n---\nfirst\n",
        )
        .unwrap();
        std::fs::write(dir_path.join("notes.txt"), "ignored").unwrap();

        let store = HelpStore::in_memory().unwrap();
        let cancel = Cancellation::none();
        let loaded = load_sections_from_dir(&store, &dir_path, &cancel).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(store.count(&cancel).unwrap(), 2);
        assert_eq!(store.get("a", &cancel).unwrap().content, "first");
    }
}
