//! Tokenization for npcli expressions
//!
//! Tokens are the atomic elements of the expression syntax: numbers,
//! strings, names, operators and punctuation. Statements are separated by
//! `;` or newlines, and `#` starts a comment that runs to end of line.

use nom::{
    branch::alt,
    bytes::complete::{escaped, tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, none_of, one_of, space0},
    combinator::{map, map_res, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,     // +
    Minus,    // -
    Star,     // *
    Slash,    // /
    FloorDiv, // //
    Percent,  // %
    Power,    // **
    Eq,       // ==
    Ne,       // !=
    Lt,       // <
    Le,       // <=
    Gt,       // >
    Ge,       // >=
    Amp,      // &
    Bar,      // |
    Tilde,    // ~
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A numeric literal
    Number(f64),
    /// A single- or double-quoted string, escapes already resolved
    Str(String),
    /// A name or keyword (`d`, `np`, `and`, `True`)
    Ident(String),
    Operator(Operator),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Dot,
    /// Assignment: =
    Assign,
    /// Statement separator: `;` or newline
    Separator,
}

#[derive(Error, Debug)]
pub enum LexError {
    #[error("Unexpected character: {0}")]
    UnexpectedChar(char),
    #[error("Unterminated string")]
    UnterminatedString,
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Resolve backslash escapes inside a quoted string
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Parse a double-quoted string
fn double_quoted_string(input: &str) -> IResult<&str, Token> {
    let (input, content) = delimited(
        char('"'),
        map(
            opt(escaped(none_of("\"\\"), '\\', one_of("\"'\\nrt"))),
            |o| o.unwrap_or(""),
        ),
        char('"'),
    )(input)?;
    Ok((input, Token::Str(unescape(content))))
}

/// Parse a single-quoted string
fn single_quoted_string(input: &str) -> IResult<&str, Token> {
    let (input, content) = delimited(
        char('\''),
        map(
            opt(escaped(none_of("'\\"), '\\', one_of("\"'\\nrt"))),
            |o| o.unwrap_or(""),
        ),
        char('\''),
    )(input)?;
    Ok((input, Token::Str(unescape(content))))
}

/// Optional exponent part: e10, E-3
fn exponent(input: &str) -> IResult<&str, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

/// Parse a number: 12, 1.5, 1., .5, 1e-3
///
/// Signs are not part of the literal; `-1` is unary minus applied to `1`.
fn number(input: &str) -> IResult<&str, Token> {
    map_res(
        alt((
            recognize(tuple((
                digit1,
                opt(pair(char('.'), digit0)),
                opt(exponent),
            ))),
            recognize(tuple((char('.'), digit1, opt(exponent)))),
        )),
        |s: &str| s.parse::<f64>().map(Token::Number),
    )(input)
}

/// Parse a name: letters, digits and underscores, not starting with a digit
fn identifier(input: &str) -> IResult<&str, Token> {
    map(
        recognize(pair(
            take_while1(|c: char| c.is_alphabetic() || c == '_'),
            take_while(|c: char| c.is_alphanumeric() || c == '_'),
        )),
        |s: &str| Token::Ident(s.to_string()),
    )(input)
}

/// Operators of two characters, tried before their one-character prefixes
fn long_operator(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::Operator(Operator::Power), tag("**")),
        value(Token::Operator(Operator::FloorDiv), tag("//")),
        value(Token::Operator(Operator::Eq), tag("==")),
        value(Token::Operator(Operator::Ne), tag("!=")),
        value(Token::Operator(Operator::Le), tag("<=")),
        value(Token::Operator(Operator::Ge), tag(">=")),
    ))(input)
}

fn short_operator(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::Operator(Operator::Plus), char('+')),
        value(Token::Operator(Operator::Minus), char('-')),
        value(Token::Operator(Operator::Star), char('*')),
        value(Token::Operator(Operator::Slash), char('/')),
        value(Token::Operator(Operator::Percent), char('%')),
        value(Token::Operator(Operator::Lt), char('<')),
        value(Token::Operator(Operator::Gt), char('>')),
        value(Token::Operator(Operator::Amp), char('&')),
        value(Token::Operator(Operator::Bar), char('|')),
        value(Token::Operator(Operator::Tilde), char('~')),
        value(Token::Assign, char('=')),
    ))(input)
}

fn punctuation(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::LParen, char('(')),
        value(Token::RParen, char(')')),
        value(Token::LBracket, char('[')),
        value(Token::RBracket, char(']')),
        value(Token::Comma, char(',')),
        value(Token::Colon, char(':')),
        value(Token::Dot, char('.')),
        value(Token::Separator, one_of(";\n")),
    ))(input)
}

/// Parse any single token
fn token(input: &str) -> IResult<&str, Token> {
    preceded(
        space0,
        alt((
            // Numbers before punctuation so `.5` is not a Dot
            number,
            double_quoted_string,
            single_quoted_string,
            identifier,
            long_operator,
            short_operator,
            punctuation,
        )),
    )(input)
}

/// Strip comments from input (# to end of line, but not inside quotes)
fn strip_comments(input: &str) -> String {
    let mut result = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_single_quote || in_double_quote => {
                result.push(c);
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            }
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
                result.push(c);
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
                result.push(c);
            }
            '#' if !in_single_quote && !in_double_quote => {
                // Skip to end of line, keeping the newline as a separator
                for remaining in chars.by_ref() {
                    if remaining == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            _ => result.push(c),
        }
    }
    result
}

/// Tokenize a complete input string
pub fn lex(input: &str) -> Result<Vec<Token>, LexError> {
    let input = strip_comments(input).replace("\r\n", "\n");

    let (remaining, tokens) =
        many0(token)(&input).map_err(|e| LexError::ParseError(format!("{:?}", e)))?;

    // Check for any remaining unparsed content
    let remaining = remaining.trim_start_matches(|c: char| c == ' ' || c == '\t');
    match remaining.chars().next() {
        None => Ok(tokens),
        Some('"') | Some('\'') => Err(LexError::UnterminatedString),
        Some(c) => Err(LexError::UnexpectedChar(c)),
    }
}
