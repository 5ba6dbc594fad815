//! The `help` subcommand: flags in, rendered markdown out.
//!
//! Flag combinations are composed into a query-language string and sent
//! through the same parse/compile path as `--query`, so `--print-query`
//! shows exactly what will run.

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::help::cancel::Cancellation;
use crate::help::dsl::{self, parse_query};
use crate::help::render::{CommandContext, RenderOptions, render_help};
use crate::help::store::HelpStore;

/// Result of a help invocation: what to print and how to exit.
#[derive(Clone, Debug)]
pub struct HelpOutput {
    /// Rendered page or diagnostic.
    pub output: String,
    /// `0` on success, `1` on query errors.
    pub exit_code: i32,
}

/// Build the `help` subcommand.
#[must_use]
pub fn build_help_command() -> Command {
    let toggle = |name: &'static str, help: &'static str| {
        Arg::new(name).long(name).help(help).action(ArgAction::SetTrue)
    };
    Command::new("help")
        .about("Show help sections, examples, and tutorials")
        .arg(Arg::new("target").help("Topic slug or command name").num_args(0..=1))
        .arg(Arg::new("topic").long("topic").help("Sections tagged with a topic"))
        .arg(Arg::new("command").long("command").help("Sections for a command"))
        .arg(Arg::new("flag").long("flag").help("Sections documenting a flag"))
        .arg(Arg::new("query").long("query").help("Query expression"))
        .arg(toggle("list", "List matching sections without content"))
        .arg(toggle("topics", "Restrict to general topics"))
        .arg(toggle("examples", "Restrict to examples"))
        .arg(toggle("applications", "Restrict to applications"))
        .arg(toggle("tutorials", "Restrict to tutorials"))
        .arg(toggle("all", "Show sections that are hidden by default"))
        .arg(toggle("short", "One-line renderings only"))
        .arg(toggle("long-help", "Include full section content"))
        .arg(toggle("ui", "Open the interactive help browser"))
        .arg(toggle("print-query", "Print the effective query and exit"))
        .arg(toggle("print-sql", "Print the compiled SQL and exit"))
}

/// Run the `help` subcommand against a store.
#[must_use]
pub fn run_help_command(
    store: &HelpStore,
    matches: &ArgMatches,
    context: Option<&CommandContext>,
    cancel: &Cancellation,
) -> HelpOutput {
    if matches.get_flag("ui") {
        return HelpOutput {
            output: "The interactive help browser is not supported here.".to_owned(),
            exit_code: 0,
        };
    }

    let query = effective_query(matches);
    if matches.get_flag("print-query") {
        return HelpOutput {
            output: query,
            exit_code: 0,
        };
    }

    let predicate = match parse_query(&query) {
        Ok(predicate) => predicate,
        Err(err) => {
            return HelpOutput {
                output: format!("{err}\n{}", dsl::usage_reminder()),
                exit_code: 1,
            };
        }
    };
    if matches.get_flag("print-sql") {
        return HelpOutput {
            output: predicate.to_sql(),
            exit_code: 0,
        };
    }

    let options = RenderOptions {
        show_all: matches.get_flag("all"),
        short_mode: matches.get_flag("short"),
        list_only: matches.get_flag("list"),
        long_help: matches.get_flag("long-help"),
    };
    match render_help(store, &predicate, context, options, cancel) {
        Ok(output) => HelpOutput {
            output,
            exit_code: 0,
        },
        Err(err) => HelpOutput {
            output: err.to_string(),
            exit_code: 1,
        },
    }
}

/// Compose the query string from the subcommand's flags.
///
/// `--query` wins outright; otherwise restriction flags AND together and
/// the positional target matches a slug or a command name.
fn effective_query(matches: &ArgMatches) -> String {
    if let Some(query) = flag_value(matches, "query") {
        return query.clone();
    }
    let mut terms: Vec<String> = Vec::new();
    if let Some(target) = flag_value(matches, "target") {
        terms.push(format!(
            "(slug:{} OR command:{})",
            quote(target),
            quote(target)
        ));
    }
    if let Some(topic) = flag_value(matches, "topic") {
        terms.push(format!("topic:{}", quote(topic)));
    }
    if let Some(command) = flag_value(matches, "command") {
        terms.push(format!("command:{}", quote(command)));
    }
    if let Some(flag) = flag_value(matches, "flag") {
        terms.push(format!("flag:{}", quote(flag)));
    }
    let types: Vec<&str> = [
        ("topics", "topic"),
        ("examples", "example"),
        ("applications", "application"),
        ("tutorials", "tutorial"),
    ]
    .iter()
    .filter(|(flag, _)| matches.get_flag(flag))
    .map(|(_, token)| *token)
    .collect();
    match types.as_slice() {
        [] => {}
        [one] => terms.push(format!("type:{one}")),
        many => {
            let alternatives: Vec<String> =
                many.iter().map(|token| format!("type:{token}")).collect();
            terms.push(format!("({})", alternatives.join(" OR ")));
        }
    }
    terms.join(" AND ")
}

fn flag_value<'a>(matches: &'a ArgMatches, id: &str) -> Option<&'a String> {
    if matches.value_source(id) == Some(ValueSource::CommandLine) {
        matches.get_one::<String>(id)
    } else {
        None
    }
}

/// Quote a value when it has characters outside the bare-word charset.
fn quote(value: &str) -> String {
    let bare = value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-' | '/'));
    if bare && !value.is_empty() {
        value.to_owned()
    } else {
        format!("\"{}\"", value.replace('"', ""))
    }
}
