//! Recursive-descent parser for the help query language.
//!
//! Precedence, high to low: field predicates and phrases, `NOT`, `AND`,
//! `OR`. Adjacent bare words that are not field predicates merge into a
//! single text phrase.

use crate::help::dsl::lexer::{Token, TokenKind, tokenize};
use crate::help::error::HelpError;

/// Query AST.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// `field:value`, with the position of the field name.
    Field {
        /// Field name as written.
        field: String,
        /// Value as written.
        value: String,
        /// Line of the field name.
        line: u32,
        /// Column of the field name.
        column: u32,
    },
    /// A full-text phrase, quoted or a bare-word run.
    Text(String),
    /// Negation.
    Not(Box<Expr>),
    /// Conjunction.
    And(Box<Expr>, Box<Expr>),
    /// Disjunction.
    Or(Box<Expr>, Box<Expr>),
}

/// Parse a query into an AST; `None` for empty input.
pub fn parse(input: &str) -> Result<Option<Expr>, HelpError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    if parser.peek().kind == TokenKind::Eof {
        return Ok(None);
    }
    let expr = parser.parse_or()?;
    let trailing = parser.peek().clone();
    if trailing.kind != TokenKind::Eof {
        return Err(HelpError::parse(
            trailing.line,
            trailing.column,
            format!("unexpected '{}'", trailing.text),
        ));
    }
    Ok(Some(expr))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // tokenize always appends Eof, so pos stays in bounds.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_ahead(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Expr, HelpError> {
        let mut expr = self.parse_and()?;
        while self.peek().kind == TokenKind::Or {
            self.advance();
            let right = self.parse_and()?;
            expr = Expr::Or(Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, HelpError> {
        let mut expr = self.parse_not()?;
        while self.peek().kind == TokenKind::And {
            self.advance();
            let right = self.parse_not()?;
            expr = Expr::And(Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn parse_not(&mut self) -> Result<Expr, HelpError> {
        if self.peek().kind == TokenKind::Not {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, HelpError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_or()?;
                let close = self.advance();
                if close.kind != TokenKind::RParen {
                    return Err(HelpError::parse(
                        close.line,
                        close.column,
                        "expected ')'",
                    ));
                }
                Ok(expr)
            }
            TokenKind::Str => {
                self.advance();
                Ok(Expr::Text(token.text))
            }
            TokenKind::Ident => {
                if self.peek_ahead().kind == TokenKind::Colon {
                    self.advance();
                    self.advance();
                    let value = self.advance();
                    if !matches!(value.kind, TokenKind::Ident | TokenKind::Str) {
                        return Err(HelpError::parse(
                            value.line,
                            value.column,
                            format!("expected a value after '{}:'", token.text),
                        ));
                    }
                    return Ok(Expr::Field {
                        field: token.text,
                        value: value.text,
                        line: token.line,
                        column: token.column,
                    });
                }
                // A run of bare words is one phrase, stopping before any
                // word that starts its own field predicate.
                let mut words = vec![self.advance().text];
                while self.peek().kind == TokenKind::Ident
                    && self.peek_ahead().kind != TokenKind::Colon
                {
                    words.push(self.advance().text);
                }
                Ok(Expr::Text(words.join(" ")))
            }
            _ => Err(HelpError::parse(
                token.line,
                token.column,
                if token.kind == TokenKind::Eof {
                    "unexpected end of query".to_owned()
                } else {
                    format!("unexpected '{}'", token.text)
                },
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Expr, parse};
    use crate::help::error::HelpError;

    fn is_field(expr: &Expr, expected_field: &str, expected_value: &str) -> bool {
        matches!(
            expr,
            Expr::Field { field, value, .. } if field == expected_field && value == expected_value
        )
    }

    #[test]
    fn empty_input_parses_to_none() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn precedence_is_not_over_and_over_or() {
        let expr = parse("NOT type:example AND topic:a OR topic:b")
            .unwrap()
            .unwrap();
        let Expr::Or(left, right) = expr else {
            panic!("OR should bind loosest");
        };
        assert!(is_field(&right, "topic", "b"));
        let Expr::And(left, _) = *left else {
            panic!("AND should bind tighter than OR");
        };
        assert!(matches!(*left, Expr::Not(_)));
    }

    #[test]
    fn field_expressions_record_their_position() {
        let expr = parse("topic:a OR topic:b").unwrap().unwrap();
        let Expr::Or(_, right) = expr else {
            panic!("expected a disjunction");
        };
        assert!(matches!(*right, Expr::Field { line: 1, column: 12, .. }));
    }

    #[test]
    fn parentheses_override_precedence() {
        let expr = parse("(topic:a OR topic:b) AND type:example")
            .unwrap()
            .unwrap();
        assert!(matches!(expr, Expr::And(left, _) if matches!(*left, Expr::Or(_, _))));
    }

    #[test]
    fn bare_word_run_becomes_one_phrase() {
        let expr = parse("template pipeline").unwrap().unwrap();
        assert_eq!(expr, Expr::Text("template pipeline".into()));
    }

    #[test]
    fn bare_run_stops_before_a_field_predicate() {
        // The run merges words only; a predicate needs an explicit AND.
        let expr = parse("template pipeline AND type:example").unwrap().unwrap();
        let Expr::And(left, _) = expr else {
            panic!("expected a conjunction");
        };
        assert_eq!(*left, Expr::Text("template pipeline".into()));
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let err = parse("type:example type:tutorial").unwrap_err();
        assert!(matches!(err, HelpError::Parse { .. }));
    }

    #[test]
    fn missing_value_is_a_parse_error() {
        let err = parse("type:").unwrap_err();
        assert!(matches!(err, HelpError::Parse { .. }));
    }

    #[test]
    fn double_negation_nests() {
        let expr = parse("NOT NOT topic:a").unwrap().unwrap();
        assert!(matches!(expr, Expr::Not(inner) if matches!(*inner, Expr::Not(_))));
    }

    #[test]
    fn quoted_value_in_field_predicate() {
        let expr = parse("topic:\"machine learning\"").unwrap().unwrap();
        assert!(matches!(expr, Expr::Field { value, .. } if value == "machine learning"));
    }
}
