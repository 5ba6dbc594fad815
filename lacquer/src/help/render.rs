//! Rendering query results into a composed markdown page.

use std::fmt::Write;

use crate::help::cancel::Cancellation;
use crate::help::error::HelpError;
use crate::help::model::{Section, SectionType};
use crate::help::store::query::{OrderBy, Predicate};
use crate::help::store::HelpStore;

/// How much of each section to render.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderOptions {
    /// Render sections that are not shown by default, too.
    pub show_all: bool,
    /// Titles and one-liners only, even for single sections.
    pub short_mode: bool,
    /// A bare listing of matching sections, no content.
    pub list_only: bool,
    /// Include full section content.
    pub long_help: bool,
}

/// The command a help page is being rendered for.
#[derive(Clone, Debug, Default)]
pub struct CommandContext {
    /// Space-joined path, e.g. `"app json"`.
    pub command_path: String,
    /// Whether this is the application's top-level help.
    pub is_top_level: bool,
    /// One-line command description.
    pub short_description: String,
    /// Full command description.
    pub long_description: String,
}

/// Execute a predicate and compose the markdown help page.
pub fn render_help(
    store: &HelpStore,
    predicate: &Predicate,
    context: Option<&CommandContext>,
    options: RenderOptions,
    cancel: &Cancellation,
) -> Result<String, HelpError> {
    let sections = store.find(predicate, cancel)?;
    let mut out = String::new();

    if let Some(context) = context {
        render_context(&mut out, context, options);
    }

    if sections.is_empty() {
        render_no_results(&mut out, store, context, cancel)?;
        return Ok(out);
    }

    for section_type in SectionType::ALL {
        let group: Vec<&Section> = sections
            .iter()
            .filter(|section| section.section_type == section_type)
            .collect();
        if group.is_empty() {
            continue;
        }
        push_heading(&mut out, 2, section_type.heading());
        if options.list_only {
            for section in &group {
                render_list_item(&mut out, section);
            }
            continue;
        }
        let (shown, others): (Vec<&&Section>, Vec<&&Section>) = group
            .iter()
            .partition(|section| section.show_per_default || options.show_all);
        for section in shown {
            render_section(&mut out, section, options);
        }
        if !others.is_empty() {
            push_heading(&mut out, 3, &format!("Other {}", section_type.heading().to_lowercase()));
            for section in others {
                render_list_item(&mut out, section);
            }
            out.push('\n');
        }
    }
    Ok(out.trim_end().to_owned() + "\n")
}

/// Completion entries for a `help` argument: `(slug, one-liner)` pairs in
/// ascending slug order.
pub fn help_completions(
    store: &HelpStore,
    cancel: &Cancellation,
) -> Result<Vec<(String, String)>, HelpError> {
    let sections = store.list(OrderBy::Slug, cancel)?;
    Ok(sections
        .into_iter()
        .map(|section| {
            let hint = if section.short.is_empty() {
                section.title
            } else {
                section.short
            };
            (section.slug, hint)
        })
        .collect())
}

fn render_context(out: &mut String, context: &CommandContext, options: RenderOptions) {
    if !context.command_path.is_empty() {
        push_heading(out, 1, &context.command_path);
    }
    if options.long_help && !context.long_description.is_empty() {
        out.push_str(&context.long_description);
        out.push_str("\n\n");
    } else if !context.short_description.is_empty() {
        out.push_str(&context.short_description);
        out.push_str("\n\n");
    }
}

fn render_no_results(
    out: &mut String,
    store: &HelpStore,
    context: Option<&CommandContext>,
    cancel: &Cancellation,
) -> Result<(), HelpError> {
    out.push_str("No help sections matched.\n");
    let available = match context {
        Some(context) if !context.is_top_level && !context.command_path.is_empty() => {
            store.find(&Predicate::has_command(&context.command_path), cancel)?
        }
        _ => store.list(OrderBy::Default, cancel)?,
    };
    if !available.is_empty() {
        out.push_str("\nAvailable sections:\n");
        for section in &available {
            render_list_item(out, section);
        }
    }
    Ok(())
}

fn render_section(out: &mut String, section: &Section, options: RenderOptions) {
    push_heading(out, 3, &section.title);
    if !section.subtitle.is_empty() {
        let _ = writeln!(out, "*{}*\n", section.subtitle);
    }
    if !section.short.is_empty() {
        out.push_str(&section.short);
        out.push_str("\n\n");
    }
    if options.long_help && !options.short_mode && !section.content.is_empty() {
        out.push_str(&section.content);
        out.push_str("\n\n");
    }
}

fn render_list_item(out: &mut String, section: &Section) {
    let _ = if section.short.is_empty() {
        writeln!(out, "- `{}` {}", section.slug, section.title)
    } else {
        writeln!(out, "- `{}` {} ({})", section.slug, section.title, section.short)
    };
}

fn push_heading(out: &mut String, level: usize, text: &str) {
    let _ = writeln!(out, "{} {}\n", "#".repeat(level), text);
}

#[cfg(test)]
mod tests {
    use super::{CommandContext, RenderOptions, help_completions, render_help};
    use crate::help::cancel::Cancellation;
    use crate::help::model::{Section, SectionType};
    use crate::help::store::HelpStore;
    use crate::help::store::query::Predicate;

    fn store() -> HelpStore {
        let store = HelpStore::in_memory().unwrap();
        let cancel = Cancellation::none();
        let sections = vec![
            Section::new("templates", "Working with templates")
                .with_type(SectionType::Example)
                .with_content("Long template walkthrough.")
                .shown_per_default(),
            Section::new("advanced", "Advanced usage").with_type(SectionType::Example),
            Section::new("intro", "Introduction")
                .with_type(SectionType::GeneralTopic)
                .shown_per_default(),
        ];
        for mut section in sections {
            store.insert(&mut section, &cancel).unwrap();
        }
        store
    }

    #[test]
    fn groups_follow_the_stable_type_order() {
        let page = render_help(
            &store(),
            &Predicate::match_all(),
            None,
            RenderOptions { show_all: true, ..RenderOptions::default() },
            &Cancellation::none(),
        )
        .unwrap();
        let topics = page.find("## Topics").unwrap();
        let examples = page.find("## Examples").unwrap();
        assert!(topics < examples);
    }

    #[test]
    fn non_default_sections_collapse_to_a_list() {
        let page = render_help(
            &store(),
            &Predicate::is_type(SectionType::Example),
            None,
            RenderOptions::default(),
            &Cancellation::none(),
        )
        .unwrap();
        assert!(page.contains("### Working with templates"));
        assert!(page.contains("### Other examples"));
        assert!(page.contains("- `advanced` Advanced usage"));
        assert!(!page.contains("### Advanced usage"));
    }

    #[test]
    fn long_help_includes_content() {
        let options = RenderOptions { long_help: true, ..RenderOptions::default() };
        let page = render_help(
            &store(),
            &Predicate::slug_is("templates"),
            None,
            options,
            &Cancellation::none(),
        )
        .unwrap();
        assert!(page.contains("Long template walkthrough."));
    }

    #[test]
    fn no_results_lists_available_sections() {
        let page = render_help(
            &store(),
            &Predicate::has_topic("nothing-here"),
            None,
            RenderOptions::default(),
            &Cancellation::none(),
        )
        .unwrap();
        assert!(page.starts_with("No help sections matched."));
        assert!(page.contains("- `intro` Introduction"));
    }

    #[test]
    fn command_context_renders_first() {
        let context = CommandContext {
            command_path: "app json".to_owned(),
            short_description: "Convert anything to JSON.".to_owned(),
            ..CommandContext::default()
        };
        let page = render_help(
            &store(),
            &Predicate::match_all(),
            Some(&context),
            RenderOptions::default(),
            &Cancellation::none(),
        )
        .unwrap();
        assert!(page.starts_with("# app json"));
        assert!(page.contains("Convert anything to JSON."));
    }

    #[test]
    fn completions_are_slug_ascending() {
        let slugs: Vec<String> = help_completions(&store(), &Cancellation::none())
            .unwrap()
            .into_iter()
            .map(|(slug, _)| slug)
            .collect();
        assert_eq!(slugs, ["advanced", "intro", "templates"]);
    }
}
