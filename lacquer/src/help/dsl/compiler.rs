//! Compiles query ASTs into store predicates.

use crate::help::dsl::parser::Expr;
use crate::help::error::HelpError;
use crate::help::model::SectionType;
use crate::help::store::query::Predicate;

/// The closed set of queryable fields.
pub const FIELDS: [&str; 8] = [
    "type", "topic", "flag", "command", "slug", "toplevel", "default", "template",
];

/// Compile an AST into a [`Predicate`].
pub fn compile(expr: &Expr) -> Result<Predicate, HelpError> {
    match expr {
        Expr::Field { field, value, .. } => compile_field(field, value),
        Expr::Text(phrase) => Ok(Predicate::text_search(phrase)),
        Expr::Not(inner) => Ok(Predicate::not(compile(inner)?)),
        Expr::And(left, right) => Ok(Predicate::and(compile(left)?, compile(right)?)),
        Expr::Or(left, right) => Ok(Predicate::or(compile(left)?, compile(right)?)),
    }
}

fn compile_field(field: &str, value: &str) -> Result<Predicate, HelpError> {
    // Values match case-insensitively; errors carry the value as written.
    let lowered = value.to_ascii_lowercase();
    match field.to_ascii_lowercase().as_str() {
        "type" => SectionType::from_dsl_token(&lowered)
            .map(Predicate::is_type)
            .ok_or(HelpError::UnknownType {
                value: value.to_owned(),
            }),
        "topic" => Ok(Predicate::has_topic(lowered)),
        "flag" => Ok(compile_flag(&lowered)),
        "command" => Ok(Predicate::has_command(lowered)),
        "slug" => Ok(Predicate::slug_is(lowered)),
        "toplevel" => compile_boolean(field, value, Predicate::top_level()),
        "default" => compile_boolean(field, value, Predicate::shown_by_default()),
        "template" => compile_boolean(field, value, Predicate::is_template()),
        _ => Err(HelpError::UnknownField {
            field: field.to_owned(),
        }),
    }
}

/// Flags match with or without a `--` prefix.
fn compile_flag(value: &str) -> Predicate {
    if value.starts_with('-') {
        Predicate::has_flag(value)
    } else {
        Predicate::or(
            Predicate::has_flag(value),
            Predicate::has_flag(format!("--{value}")),
        )
    }
}

fn compile_boolean(field: &str, value: &str, when_true: Predicate) -> Result<Predicate, HelpError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(when_true),
        "false" | "no" | "0" => Ok(Predicate::not(when_true)),
        _ => Err(HelpError::InvalidBoolean {
            field: field.to_owned(),
            value: value.to_owned(),
        }),
    }
}

/// Valid fields and type tokens, for CLI diagnostics.
#[must_use]
pub fn suggestions() -> String {
    let types: Vec<&str> = SectionType::ALL
        .iter()
        .map(|section_type| section_type.dsl_token())
        .collect();
    format!(
        "valid fields: {}; valid types: {}",
        FIELDS.join(", "),
        types.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::{compile, suggestions};
    use crate::help::dsl::parser::parse;
    use crate::help::error::HelpError;

    fn compile_query(input: &str) -> Result<crate::help::store::query::Predicate, HelpError> {
        compile(&parse(input).unwrap().unwrap())
    }

    #[test]
    fn type_predicate_compiles_to_a_code_match() {
        let predicate = compile_query("type:example").unwrap();
        assert!(predicate.select_sql().contains("s.section_type = ?"));
    }

    #[test]
    fn unknown_type_carries_the_value() {
        let err = compile_query("type:essay").unwrap_err();
        assert!(matches!(err, HelpError::UnknownType { value } if value == "essay"));
    }

    #[test]
    fn unknown_field_carries_the_field() {
        let err = compile_query("color:red").unwrap_err();
        assert!(matches!(err, HelpError::UnknownField { field } if field == "color"));
    }

    #[test]
    fn field_values_match_case_insensitively() {
        for query in ["topic:TEMPLATES", "slug:Intro", "command:JSON", "type:Example"] {
            let upper = compile_query(query).unwrap();
            let lower = compile_query(&query.to_ascii_lowercase()).unwrap();
            assert_eq!(upper.params(), lower.params());
        }
    }

    #[test]
    fn boolean_fields_accept_all_tokens() {
        for value in ["true", "yes", "1", "false", "no", "0", "TRUE"] {
            assert!(compile_query(&format!("toplevel:{value}")).is_ok());
        }
        let err = compile_query("default:maybe").unwrap_err();
        assert!(matches!(err, HelpError::InvalidBoolean { field, .. } if field == "default"));
    }

    #[test]
    fn negated_boolean_compiles_to_not() {
        let predicate = compile_query("template:false").unwrap();
        assert!(predicate.select_sql().contains("NOT (s.is_template = 1)"));
    }

    #[test]
    fn bare_flag_matches_both_spellings() {
        let predicate = compile_query("flag:output").unwrap();
        let sql = predicate.select_sql();
        assert_eq!(sql.matches("section_flags").count(), 2);
    }

    #[test]
    fn prefixed_flag_matches_verbatim() {
        let predicate = compile_query("flag:--output").unwrap();
        assert_eq!(predicate.select_sql().matches("section_flags").count(), 1);
    }

    #[test]
    fn suggestions_name_fields_and_types() {
        let text = suggestions();
        assert!(text.contains("toplevel"));
        assert!(text.contains("tutorial"));
    }
}
