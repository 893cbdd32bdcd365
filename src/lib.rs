//! blisp - a small Lisp built around S-expressions and Q-expressions
//!
//! This crate reads a generic parse tree into tagged runtime values and reduces them
//! with a recursive, state-free evaluator. Errors are ordinary values: a malformed
//! expression evaluates to `[ERROR] ...` instead of aborting the caller.
//!
//! ## Expressions
//!
//! ```text
//! (+ 1 2 3)              ; arithmetic, evaluates to 6
//! (- 5)                  ; unary negation, evaluates to -5
//! {1 2 (+ 1 2)}          ; Q-expression, inert data
//! (head {1 2 3})         ; {1}
//! (eval (list + 1 2))    ; 3
//! (join {1 2} {3})       ; {1 2 3}
//! ```
//!
//! A line of input is an implicit S-expression, so `+ 1 2` evaluates the same as `(+ 1 2)`.
//!
//! ## Modules
//!
//! - `ast`: the [`ast::Value`] type, its constructors and printer
//! - `reader`: the parse tree consumed from the parser, and conversion into values
//! - `evaluator`: S-expression reduction and the environment stub
//! - `builtinops`: the closed table of builtin operations
//! - `parser`: text to parse tree (feature `parser`)

use thiserror::Error;

/// Maximum nesting depth accepted by the parser.
/// Evaluation recurses no deeper than the tree it is given, so this also bounds the evaluator.
pub const MAX_PARSE_DEPTH: usize = 64;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad tokens, malformed expressions)
    InvalidSyntax,
    /// Input ended before the expression was complete (unclosed brackets)
    Incomplete,
    /// Expression nesting exceeded [`MAX_PARSE_DEPTH`]
    TooDeeplyNested,
    /// Extra input found after a complete expression
    TrailingContent,
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
#[error("ParseError: {message}{}", describe_location(.found, .context))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 100 chars)
    pub context: Option<String>,
    /// The problematic token or character encountered, if identifiable
    pub found: Option<String>,
}

fn describe_location(found: &Option<String>, context: &Option<String>) -> String {
    let mut out = String::new();
    if let Some(found) = found {
        out.push_str(&format!("\nFound: {found}"));
    }
    if let Some(context) = context {
        out.push_str(&format!("\nContext: {context}"));
    }
    out
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        context: Option<String>,
        found: Option<String>,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context,
            found,
        }
    }

    /// Create a ParseError with a kind and message but no context
    pub fn from_message(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, None, None)
    }

    /// Create a ParseError with context extracted from `input` around `error_offset`.
    /// The token under the offset, if any, is reported as `found`.
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        const MAX_CONTEXT: usize = 100;

        let context_start = error_offset.saturating_sub(20);
        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.chars().count() < input.chars().count() {
            display_context.push_str("[...]");
        }
        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        let found = input
            .chars()
            .skip(error_offset)
            .find(|c| !c.is_whitespace())
            .map(String::from);

        Self::new(kind, message, Some(display_context), found)
    }
}

/// Errors surfaced to Rust callers of this crate.
///
/// Evaluation failures are not in here: those are [`ast::Value::Error`] values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A child was appended to a value that is not an S- or Q-expression.
    #[error("cannot append to {0}: not an S-expression or Q-expression")]
    NotAList(String),
}

/// Failure reasons produced while evaluating. Each one is turned into a
/// [`ast::Value::Error`] carrying its message, so these never escape evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Invalid number")]
    InvalidNumber,
    #[error("S-expression must start with a symbol")]
    NotASymbol,
    #[error("Unknown function")]
    UnknownFunction,
    #[error("Expected a numerical value to operate on")]
    NotANumber,
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Function '{0}' passed too many arguments")]
    TooManyArguments(&'static str),
    #[error("Function '{0}' passed no arguments")]
    NoArguments(&'static str),
    #[error("Function '{0}' passed incorrect type")]
    IncorrectType(&'static str),
    #[error("Function '{0}' passed {{}}")]
    EmptyList(&'static str),
}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod reader;

#[cfg(feature = "parser")]
pub mod parser;

use ast::Value;
use reader::ParseNode;

/// Read a parse tree and reduce it to a single value.
pub fn evaluate_top_level(root: &ParseNode) -> Value {
    evaluator::evaluate(reader::read(root))
}

/// Render a value the way the read loop prints it.
pub fn render(value: &Value) -> String {
    value.to_string()
}

/// Parse one line of input as a program and evaluate it.
///
/// ```
/// let result = blisp::run("+ 1 (* 2 3)").unwrap();
/// assert_eq!(blisp::render(&result), "7");
/// ```
#[cfg(feature = "parser")]
pub fn run(input: &str) -> Result<Value, Error> {
    let tree = parser::parse_program(input)?;
    Ok(evaluate_top_level(&tree))
}
