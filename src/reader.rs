//! The parse tree handed over by the parser, and its conversion into [`Value`]s.
//!
//! A [`ParseNode`] is a concrete syntax tree: it keeps bracket tokens and the
//! start/end anchors of a program as children, and [`read`] drops them while
//! building the value tree.

use crate::EvalError;
use crate::ast::{NumberType, Value};
use std::fmt;
use tracing::{debug, trace};

/// Classification of a parse tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// The whole input line, an implicit S-expression
    Root,
    /// Integer literal
    Number,
    /// Symbol literal
    Symbol,
    /// `( ... )` group
    SExpr,
    /// `{ ... }` group
    QExpr,
    /// Punctuation token such as `(` or `}`
    Char,
    /// Raw lexical match with no meaning of its own (input anchors)
    Regex,
}

impl Tag {
    pub fn label(self) -> &'static str {
        match self {
            Tag::Root => ">",
            Tag::Number => "number",
            Tag::Symbol => "symbol",
            Tag::SExpr => "sexpr",
            Tag::QExpr => "qexpr",
            Tag::Char => "char",
            Tag::Regex => "regex",
        }
    }
}

/// A node of the parse tree: a tag, the literal text for leaves, and ordered children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNode {
    pub tag: Tag,
    pub contents: String,
    pub children: Vec<ParseNode>,
}

impl ParseNode {
    pub fn leaf(tag: Tag, contents: impl Into<String>) -> Self {
        ParseNode {
            tag,
            contents: contents.into(),
            children: Vec::new(),
        }
    }

    pub fn branch(tag: Tag, children: Vec<ParseNode>) -> Self {
        ParseNode {
            tag,
            contents: String::new(),
            children,
        }
    }

    /// Bracket tokens and anchors carry no value
    fn is_noise(&self) -> bool {
        self.tag == Tag::Regex || matches!(self.contents.as_str(), "(" | ")" | "{" | "}")
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.tag.label(), indent = depth * 2)?;
        if self.children.is_empty() {
            writeln!(f, ": '{}'", self.contents)?;
        } else {
            writeln!(f)?;
            for child in &self.children {
                child.write_indented(f, depth + 1)?;
            }
        }
        Ok(())
    }
}

/// Indented dump of the tree, one node per line
impl fmt::Display for ParseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Convert a parse tree into a value tree.
///
/// Integer literals that do not fit a [`NumberType`] become `Error("Invalid number")`;
/// nothing else fails.
pub fn read(node: &ParseNode) -> Value {
    trace!(tag = node.tag.label(), contents = %node.contents, "read");
    match node.tag {
        Tag::Number => read_number(&node.contents),
        Tag::Symbol => Value::symbol(node.contents.as_str()),
        Tag::QExpr => read_children(node, Value::qexpr()),
        Tag::Root | Tag::SExpr | Tag::Char | Tag::Regex => read_children(node, Value::sexpr()),
    }
}

fn read_number(text: &str) -> Value {
    match text.parse::<NumberType>() {
        Ok(n) => Value::Number(n),
        Err(err) => {
            debug!(text, error = %err, "invalid number literal");
            EvalError::InvalidNumber.into()
        }
    }
}

/// Append every meaningful child of `node` to `list`, an empty S- or Q-expression
fn read_children(node: &ParseNode, list: Value) -> Value {
    node.children
        .iter()
        .filter(|child| !child.is_noise())
        .try_fold(list, |list, child| list.append(read(child)))
        .unwrap_or_else(|err| Value::error(err.to_string()))
}
