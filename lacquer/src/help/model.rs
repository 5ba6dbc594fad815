//! The help section model.

use serde::{Deserialize, Serialize};

use crate::help::error::HelpError;

/// The kind of a help section.
///
/// Serializes to the front-matter form (`GeneralTopic`, `Example`, ...);
/// the query DSL uses the shorter tokens from [`SectionType::dsl_token`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum SectionType {
    /// A conceptual topic page.
    #[default]
    GeneralTopic,
    /// A worked example.
    Example,
    /// A real-world application writeup.
    Application,
    /// A step-by-step tutorial.
    Tutorial,
}

impl SectionType {
    /// All types in their stable presentation order.
    pub const ALL: [Self; 4] = [
        Self::GeneralTopic,
        Self::Example,
        Self::Application,
        Self::Tutorial,
    ];

    /// Integer code used by the store.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::GeneralTopic => 0,
            Self::Example => 1,
            Self::Application => 2,
            Self::Tutorial => 3,
        }
    }

    /// Inverse of [`code`](Self::code).
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::GeneralTopic),
            1 => Some(Self::Example),
            2 => Some(Self::Application),
            3 => Some(Self::Tutorial),
            _ => None,
        }
    }

    /// The token the query DSL accepts for `type:`.
    #[must_use]
    pub fn dsl_token(self) -> &'static str {
        match self {
            Self::GeneralTopic => "topic",
            Self::Example => "example",
            Self::Application => "application",
            Self::Tutorial => "tutorial",
        }
    }

    /// Parse a DSL `type:` value.
    #[must_use]
    pub fn from_dsl_token(token: &str) -> Option<Self> {
        match token {
            "topic" => Some(Self::GeneralTopic),
            "example" => Some(Self::Example),
            "application" => Some(Self::Application),
            "tutorial" => Some(Self::Tutorial),
            _ => None,
        }
    }

    /// Plural heading used by the renderer.
    #[must_use]
    pub fn heading(self) -> &'static str {
        match self {
            Self::GeneralTopic => "Topics",
            Self::Example => "Examples",
            Self::Application => "Applications",
            Self::Tutorial => "Tutorials",
        }
    }
}

/// One help entry: metadata plus markdown content.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Section {
    /// Unique identifier, used for lookup and cross-references.
    pub slug: String,
    /// Kind of section.
    pub section_type: SectionType,
    /// Heading shown in listings and pages.
    pub title: String,
    /// Optional secondary heading.
    pub subtitle: String,
    /// One-line summary for listings.
    pub short: String,
    /// Markdown body.
    pub content: String,
    /// Topic tags the section is about.
    pub topics: Vec<String>,
    /// Flag names the section documents.
    pub flags: Vec<String>,
    /// Command names the section relates to.
    pub commands: Vec<String>,
    /// Shown on the application's top-level help page.
    pub is_top_level: bool,
    /// Content is a template to be expanded by the caller.
    pub is_template: bool,
    /// Listed without an explicit `--all`.
    pub show_per_default: bool,
    /// Tie-break in listings; lower sorts first.
    pub order: i64,
}

impl Section {
    /// Create a section with the given slug and title.
    #[must_use]
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the section type.
    #[must_use]
    pub fn with_type(mut self, section_type: SectionType) -> Self {
        self.section_type = section_type;
        self
    }

    /// Set the markdown body.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the topic tags.
    #[must_use]
    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Set the flag associations.
    #[must_use]
    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the command associations.
    #[must_use]
    pub fn with_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the section as top-level.
    #[must_use]
    pub fn top_level(mut self) -> Self {
        self.is_top_level = true;
        self
    }

    /// Mark the section as shown by default.
    #[must_use]
    pub fn shown_per_default(mut self) -> Self {
        self.show_per_default = true;
        self
    }

    /// Check invariants and deduplicate the association sets.
    ///
    /// Slug and title must be non-empty; duplicate topics, flags, and
    /// commands are dropped in place, keeping first occurrence order.
    pub fn validate(&mut self) -> Result<(), HelpError> {
        if self.slug.is_empty() {
            return Err(HelpError::invalid_section("", "slug must not be empty"));
        }
        if self.title.is_empty() {
            return Err(HelpError::invalid_section(
                &self.slug,
                "title must not be empty",
            ));
        }
        dedup_preserving(&mut self.topics);
        dedup_preserving(&mut self.flags);
        dedup_preserving(&mut self.commands);
        Ok(())
    }
}

fn dedup_preserving(values: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    values.retain(|value| seen.insert(value.clone()));
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{Section, SectionType};

    #[rstest]
    #[case(SectionType::GeneralTopic, 0, "topic")]
    #[case(SectionType::Example, 1, "example")]
    #[case(SectionType::Application, 2, "application")]
    #[case(SectionType::Tutorial, 3, "tutorial")]
    fn codes_and_tokens_round_trip(
        #[case] section_type: SectionType,
        #[case] code: i64,
        #[case] token: &str,
    ) {
        assert_eq!(section_type.code(), code);
        assert_eq!(SectionType::from_code(code), Some(section_type));
        assert_eq!(section_type.dsl_token(), token);
        assert_eq!(SectionType::from_dsl_token(token), Some(section_type));
    }

    #[test]
    fn front_matter_names_serialize() {
        let json = serde_json::to_string(&SectionType::GeneralTopic).unwrap();
        assert_eq!(json, "\"GeneralTopic\"");
    }

    #[test]
    fn validate_rejects_empty_slug() {
        let mut section = Section::new("", "Title");
        assert!(section.validate().is_err());
    }

    #[test]
    fn validate_deduplicates_associations() {
        let mut section =
            Section::new("s", "S").with_topics(["templates", "advanced", "templates"]);
        section.validate().unwrap();
        assert_eq!(section.topics, ["templates", "advanced"]);
    }
}
