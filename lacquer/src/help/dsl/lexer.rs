//! Tokenizer for the help query language.

use crate::help::error::HelpError;

/// Kinds of token the query language knows.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenKind {
    /// A bare word: field name, value, or part of a phrase.
    Ident,
    /// A quoted phrase (quotes stripped).
    Str,
    /// `:` between a field name and its value.
    Colon,
    /// `AND`, case-insensitive.
    And,
    /// `OR`, case-insensitive.
    Or,
    /// `NOT`, case-insensitive.
    Not,
    /// `(`.
    LParen,
    /// `)`.
    RParen,
    /// End of input.
    Eof,
}

/// One lexed token with its position, 1-based.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// Kind of the token.
    pub kind: TokenKind,
    /// Token text; empty for `Eof`.
    pub text: String,
    /// Line of the first character.
    pub line: u32,
    /// Column of the first character.
    pub column: u32,
}

/// Characters legal in a bare word. Anything else must be quoted.
fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-' | '/')
}

/// Tokenize a query; the result always ends with an `Eof` token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, HelpError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line: u32 = 1;
    let mut column: u32 = 0;

    while let Some(ch) = chars.next() {
        if ch == '\n' {
            line += 1;
            column = 0;
            continue;
        }
        column += 1;
        if ch.is_whitespace() {
            continue;
        }
        let (start_line, start_column) = (line, column);
        match ch {
            ':' => tokens.push(token(TokenKind::Colon, ":", start_line, start_column)),
            '(' => tokens.push(token(TokenKind::LParen, "(", start_line, start_column)),
            ')' => tokens.push(token(TokenKind::RParen, ")", start_line, start_column)),
            '"' | '\'' => {
                let mut text = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == '\n' {
                        line += 1;
                        column = 0;
                    } else {
                        column += 1;
                    }
                    if next == ch {
                        closed = true;
                        break;
                    }
                    text.push(next);
                }
                if !closed {
                    return Err(HelpError::parse(
                        start_line,
                        start_column,
                        "unterminated quoted phrase",
                    ));
                }
                tokens.push(token(TokenKind::Str, text, start_line, start_column));
            }
            _ if is_word_char(ch) => {
                let mut text = String::from(ch);
                while let Some(&next) = chars.peek() {
                    if !is_word_char(next) {
                        break;
                    }
                    text.push(next);
                    chars.next();
                    column += 1;
                }
                let kind = match text.to_ascii_uppercase().as_str() {
                    "AND" => TokenKind::And,
                    "OR" => TokenKind::Or,
                    "NOT" => TokenKind::Not,
                    _ => TokenKind::Ident,
                };
                tokens.push(token(kind, text, start_line, start_column));
            }
            _ => {
                return Err(HelpError::parse(
                    start_line,
                    start_column,
                    format!("unexpected character '{ch}'"),
                ));
            }
        }
    }
    tokens.push(token(TokenKind::Eof, "", line, column + 1));
    Ok(tokens)
}

fn token(kind: TokenKind, text: impl Into<String>, line: u32, column: u32) -> Token {
    Token {
        kind,
        text: text.into(),
        line,
        column,
    }
}
