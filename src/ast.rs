//! This module defines the runtime value type of the interpreter. The main enum,
//! [`Value`], is a closed tagged union over numbers, errors, symbols, S-expressions,
//! Q-expressions and builtin function references. Values own their children outright:
//! moving a value into a container transfers ownership, [`Clone`] is a deep copy and
//! dropping a value recursively releases everything it holds. Ergonomic helpers such as
//! [`sym`], [`sexpr`] and [`qexpr`] exist for building values in tests, and `Display`
//! renders values in the same surface syntax the parser accepts.

use crate::EvalError;
use crate::builtinops::Builtin;

/// Type alias for number values in interpreter
pub type NumberType = i64;

/// Non-alphanumeric characters allowed in symbol names.
pub(crate) const SYMBOL_SPECIAL_CHARS: &str = "_+-*/\\=<>!&%^";

/// Check if a character may appear in a symbol name
pub(crate) fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c)
}

/// Core value type in interpreter
///
/// To build a value, use the constructors (`Value::number(42)`, `Value::sexpr()`, ...)
/// together with [`Value::append`], or in tests the helpers `sym("+")`,
/// `sexpr([sym("+"), val(1), val(2)])` and `qexpr([1, 2, 3])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Numbers (integers only)
    Number(NumberType),
    /// Evaluation failure; propagated, never recovered
    Error(String),
    /// Symbols (names of builtin operations)
    Symbol(String),
    /// Expression awaiting reduction
    SExpr(Vec<Value>),
    /// Quoted list, never evaluated automatically
    QExpr(Vec<Value>),
    /// Reference to a builtin operation
    Function(Builtin),
}

impl Value {
    pub fn number(n: NumberType) -> Self {
        Value::Number(n)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(message.into())
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    /// An empty S-expression
    pub fn sexpr() -> Self {
        Value::SExpr(Vec::new())
    }

    /// An empty Q-expression
    pub fn qexpr() -> Self {
        Value::QExpr(Vec::new())
    }

    pub fn function(builtin: Builtin) -> Self {
        Value::Function(builtin)
    }

    /// Short type label, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Error(_) => "Error",
            Value::Symbol(_) => "Symbol",
            Value::SExpr(_) => "S-Expression",
            Value::QExpr(_) => "Q-Expression",
            Value::Function(_) => "Function",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Children of an S- or Q-expression, `None` for leaves
    pub fn cells(&self) -> Option<&[Value]> {
        match self {
            Value::SExpr(cells) | Value::QExpr(cells) => Some(cells),
            _ => None,
        }
    }

    fn cells_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::SExpr(cells) | Value::QExpr(cells) => Some(cells),
            _ => None,
        }
    }

    /// Move `child` to the end of this container.
    ///
    /// Appending to anything but an S- or Q-expression is a caller bug, reported
    /// as [`crate::Error::NotAList`].
    pub fn append(mut self, child: Value) -> Result<Value, crate::Error> {
        match self.cells_mut() {
            Some(cells) => {
                cells.push(child);
                Ok(self)
            }
            None => Err(crate::Error::NotAList(self.kind_name().to_owned())),
        }
    }

    /// Remove the child at `index`, shifting the rest left.
    pub fn pop(&mut self, index: usize) -> Option<Value> {
        let cells = self.cells_mut()?;
        (index < cells.len()).then(|| cells.remove(index))
    }

    /// Extract the child at `index` and drop the container with everything else in it.
    pub fn take(mut self, index: usize) -> Option<Value> {
        self.pop(index)
    }

    /// Move every child of `other` onto the end of this container, in order.
    pub fn join(mut self, other: Value) -> Result<Value, crate::Error> {
        let other_kind = other.kind_name();
        let extra = match other {
            Value::SExpr(cells) | Value::QExpr(cells) => cells,
            _ => return Err(crate::Error::NotAList(other_kind.to_owned())),
        };
        match self.cells_mut() {
            Some(cells) => {
                cells.extend(extra);
                Ok(self)
            }
            None => Err(crate::Error::NotAList(self.kind_name().to_owned())),
        }
    }
}

impl From<EvalError> for Value {
    fn from(err: EvalError) -> Self {
        Value::Error(err.to_string())
    }
}

impl From<Builtin> for Value {
    fn from(builtin: Builtin) -> Self {
        Value::Function(builtin)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Number(n as NumberType)
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(NumberType); // Special case - no casting
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl TryFrom<Value> for NumberType {
    type Error = EvalError;

    fn try_from(value: Value) -> Result<NumberType, EvalError> {
        if let Value::Number(n) = value {
            Ok(n)
        } else {
            Err(EvalError::NotANumber)
        }
    }
}

/// Helper function for creating symbols
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating Values from anything convertible
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating S-expressions from convertible elements
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sexpr<T: Into<Value>, I: IntoIterator<Item = T>>(items: I) -> Value {
    Value::SExpr(items.into_iter().map(Into::into).collect())
}

/// Helper function for creating Q-expressions from convertible elements
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn qexpr<T: Into<Value>, I: IntoIterator<Item = T>>(items: I) -> Value {
    Value::QExpr(items.into_iter().map(Into::into).collect())
}

fn write_cells(
    f: &mut std::fmt::Formatter<'_>,
    cells: &[Value],
    open: char,
    close: char,
) -> std::fmt::Result {
    write!(f, "{open}")?;
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{cell}")?;
    }
    write!(f, "{close}")
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Error(message) => write!(f, "[ERROR] {message}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::SExpr(cells) => write_cells(f, cells, '(', ')'),
            Value::QExpr(cells) => write_cells(f, cells, '{', '}'),
            Value::Function(_) => write!(f, "<function>"),
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_helper_functions_data_driven() {
        let test_cases = vec![
            (val(42), Value::Number(42)),
            (val(-17), Value::Number(-17)),
            (val(255u8), Value::Number(255)),
            (val(-128i8), Value::Number(-128)),
            (val(4294967295u32), Value::Number(4294967295)),
            (val(NumberType::MAX), Value::Number(NumberType::MAX)),
            (val(NumberType::MIN), Value::Number(NumberType::MIN)),
            (sym("head"), Value::Symbol("head".to_owned())),
            (sym(String::from("+")), Value::Symbol("+".to_owned())),
            (val(Builtin::Join), Value::Function(Builtin::Join)),
            (sexpr(Vec::<Value>::new()), Value::SExpr(vec![])),
            (
                qexpr([1, 2, 3]),
                Value::QExpr(vec![Value::Number(1), Value::Number(2), Value::Number(3)]),
            ),
            (
                sexpr([sym("+"), val(1), qexpr([2])]),
                Value::SExpr(vec![
                    Value::Symbol("+".to_owned()),
                    Value::Number(1),
                    Value::QExpr(vec![Value::Number(2)]),
                ]),
            ),
        ];

        for (i, (actual, expected)) in test_cases.iter().enumerate() {
            assert_eq!(actual, expected, "Test case {} failed", i + 1);
        }
    }

    #[test]
    fn test_display() {
        let test_cases = vec![
            (val(42), "42"),
            (val(-7), "-7"),
            (Value::error("Division by zero"), "[ERROR] Division by zero"),
            (sym("join"), "join"),
            (Value::sexpr(), "()"),
            (Value::qexpr(), "{}"),
            (sexpr([sym("+"), val(1), sexpr([sym("*"), val(2), val(3)])]), "(+ 1 (* 2 3))"),
            (qexpr([val(1), qexpr([2, 3]), sym("x")]), "{1 {2 3} x}"),
            (Value::function(Builtin::Head), "<function>"),
            (Value::function(Builtin::Add), "<function>"),
        ];

        for (value, expected) in test_cases {
            assert_eq!(value.to_string(), expected);
        }
    }

    #[test]
    fn test_append_transfers_children_in_order() {
        let built = Value::sexpr()
            .append(sym("+"))
            .unwrap()
            .append(val(1))
            .unwrap()
            .append(Value::qexpr().append(val(2)).unwrap())
            .unwrap();
        assert_eq!(built, sexpr([sym("+"), val(1), qexpr([2])]));
    }

    #[test]
    fn test_append_to_leaf_is_contract_violation() {
        let test_cases = vec![
            val(1),
            sym("x"),
            Value::error("boom"),
            Value::function(Builtin::Eval),
        ];
        for leaf in test_cases {
            let kind = leaf.kind_name();
            assert_eq!(
                leaf.append(val(2)),
                Err(crate::Error::NotAList(kind.to_owned()))
            );
        }
    }

    #[test]
    fn test_pop_take_join() {
        let mut list = qexpr([1, 2, 3]);
        assert_eq!(list.pop(0), Some(val(1)));
        assert_eq!(list, qexpr([2, 3]));
        assert_eq!(list.pop(5), None);
        assert_eq!(val(1).pop(0), None);

        assert_eq!(qexpr([1, 2, 3]).take(1), Some(val(2)));
        assert_eq!(Value::qexpr().take(0), None);

        let joined = qexpr([1]).join(qexpr([2, 3])).unwrap();
        assert_eq!(joined, qexpr([1, 2, 3]));
        assert!(qexpr([1]).join(val(2)).is_err());
        assert!(val(1).join(qexpr([2])).is_err());
    }

    #[test]
    fn test_copy_is_independent() {
        let original = sexpr([sym("+"), val(1), qexpr([val(2), sym("x")])]);
        let mut copy = original.clone();
        if let Value::SExpr(cells) = &mut copy {
            cells.clear();
        }
        drop(copy);
        assert_eq!(original.to_string(), "(+ 1 {2 x})");
    }

    #[test]
    fn test_number_conversion() {
        assert_eq!(NumberType::try_from(val(5)), Ok(5));
        assert_eq!(
            NumberType::try_from(sym("five")),
            Err(EvalError::NotANumber)
        );
        assert_eq!(
            Value::from(EvalError::DivisionByZero),
            Value::error("Division by zero")
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(val(1).kind_name(), "Number");
        assert_eq!(Value::sexpr().kind_name(), "S-Expression");
        assert_eq!(Value::qexpr().kind_name(), "Q-Expression");
        assert!(Value::error("x").is_error());
        assert!(!val(1).is_error());
        assert_eq!(qexpr([1]).cells(), Some(&[val(1)][..]));
        assert_eq!(val(1).cells(), None);
    }
}
