use nom::{
    IResult, Parser,
    bytes::complete::take_while1,
    character::complete::{char, digit1, multispace0, not_line_ending, satisfy},
    combinator::{cut, not, opt, recognize},
    error::ErrorKind,
    multi::many0,
    sequence::pair,
};
use tracing::debug;

use crate::MAX_PARSE_DEPTH;
use crate::ast::is_symbol_char;
use crate::reader::{ParseNode, Tag};
use crate::{Error, ParseError, ParseErrorKind};

/// Parser options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseConfig {
    /// Treat `;` up to the end of the line as a comment
    pub handle_comments: bool,
}

type ParseResult<'a> = IResult<&'a str, ParseNode>;

/// Character offset of `rest` within `input`, where `rest` is a suffix of `input`
fn offset_of(input: &str, rest: &str) -> usize {
    input[..input.len() - rest.len()].chars().count()
}

/// Convert nom parsing errors to user-facing parse errors
fn to_parse_error(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let offset = offset_of(input, e.input);
            match e.code {
                ErrorKind::TooLarge => ParseError::with_context(
                    ParseErrorKind::TooDeeplyNested,
                    format!("Expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                    input,
                    offset,
                ),
                _ if e.input.is_empty() => ParseError::with_context(
                    ParseErrorKind::Incomplete,
                    "Unexpected end of input",
                    input,
                    offset,
                ),
                _ => {
                    let near: String = e.input.chars().take(10).collect();
                    ParseError::with_context(
                        ParseErrorKind::InvalidSyntax,
                        format!("Invalid syntax near '{near}'"),
                        input,
                        offset,
                    )
                }
            }
        }
        nom::Err::Incomplete(_) => {
            ParseError::from_message(ParseErrorKind::Incomplete, "Incomplete input")
        }
    }
}

/// A `;` comment running to the end of the line
fn comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(char(';'), not_line_ending)).parse(input)
}

/// Skip whitespace, and comments when enabled
fn skip_space(input: &str, config: ParseConfig) -> IResult<&str, ()> {
    let (mut input, _) = multispace0.parse(input)?;
    if config.handle_comments {
        while let Ok((rest, _)) = comment(input) {
            (input, _) = multispace0.parse(rest)?;
        }
    }
    Ok((input, ()))
}

/// Parse an integer literal. Range is checked by the reader, not here.
fn parse_number(input: &str) -> ParseResult<'_> {
    let (rest, text) = recognize(pair(opt(char('-')), digit1)).parse(input)?;
    // "1abc" or "-1x" is a symbol, not a number followed by something
    let (rest, _) = not(satisfy(is_symbol_char)).parse(rest)?;
    Ok((rest, ParseNode::leaf(Tag::Number, text)))
}

fn parse_symbol(input: &str) -> ParseResult<'_> {
    let (rest, text) = take_while1(is_symbol_char).parse(input)?;
    Ok((rest, ParseNode::leaf(Tag::Symbol, text)))
}

/// Parse a bracketed group. Once the opening bracket is seen, a missing close is fatal.
fn parse_group(
    input: &str,
    tag: Tag,
    open: char,
    close: char,
    config: ParseConfig,
    depth: usize,
) -> ParseResult<'_> {
    let (input, open_token) = recognize(char(open)).parse(input)?;
    let (input, items) = many0(|input| parse_expr(input, config, depth + 1)).parse(input)?;
    let (input, _) = skip_space(input, config)?;
    let (input, close_token) = cut(recognize(char(close))).parse(input)?;

    let mut children = Vec::with_capacity(items.len() + 2);
    children.push(ParseNode::leaf(Tag::Char, open_token));
    children.extend(items);
    children.push(ParseNode::leaf(Tag::Char, close_token));
    Ok((input, ParseNode::branch(tag, children)))
}

/// Parse one expression, with leading whitespace
fn parse_expr(input: &str, config: ParseConfig, depth: usize) -> ParseResult<'_> {
    let (input, _) = skip_space(input, config)?;
    if depth >= MAX_PARSE_DEPTH {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }

    if let Ok(parsed) = parse_number(input) {
        return Ok(parsed);
    }
    match input.chars().next() {
        Some('(') => parse_group(input, Tag::SExpr, '(', ')', config, depth),
        Some('{') => parse_group(input, Tag::QExpr, '{', '}', config, depth),
        _ => parse_symbol(input),
    }
}

/// Parse a whole line of input as a program: any number of expressions,
/// grouped under a [`Tag::Root`] node framed by empty [`Tag::Regex`] anchors.
pub fn parse_program(input: &str) -> Result<ParseNode, Error> {
    parse_program_with_config(input, ParseConfig::default())
}

/// Parse a program with explicit configuration options
pub fn parse_program_with_config(input: &str, config: ParseConfig) -> Result<ParseNode, Error> {
    let parsed = many0(|i| parse_expr(i, config, 0))
        .parse(input)
        .and_then(|(rest, items)| Ok((skip_space(rest, config)?.0, items)));

    match parsed {
        Ok(("", items)) => {
            let mut children = Vec::with_capacity(items.len() + 2);
            children.push(ParseNode::leaf(Tag::Regex, ""));
            children.extend(items);
            children.push(ParseNode::leaf(Tag::Regex, ""));
            Ok(ParseNode::branch(Tag::Root, children))
        }
        Ok((rest, _)) => {
            let unexpected: String = rest.chars().take(1).collect();
            Err(fail(ParseError::with_context(
                ParseErrorKind::InvalidSyntax,
                format!("Unexpected '{unexpected}'"),
                input,
                offset_of(input, rest),
            )))
        }
        Err(e) => Err(fail(to_parse_error(input, e))),
    }
}

/// Parse exactly one expression, without the implicit top-level group.
pub fn parse_expression(input: &str) -> Result<ParseNode, Error> {
    let parsed = parse_expr(input, ParseConfig::default(), 0)
        .and_then(|(rest, node)| Ok((skip_space(rest, ParseConfig::default())?.0, node)));

    match parsed {
        Ok(("", node)) => Ok(node),
        Ok((rest, _)) => Err(fail(ParseError::with_context(
            ParseErrorKind::TrailingContent,
            format!("Unexpected remaining input: '{rest}'"),
            input,
            offset_of(input, rest),
        ))),
        Err(e) => Err(fail(to_parse_error(input, e))),
    }
}

fn fail(err: ParseError) -> Error {
    debug!(error = %err, "parse failed");
    Error::Parse(err)
}
