//! Built-in operations registry.
//!
//! The set of builtins is closed: six arithmetic operators and five list
//! operations, each identified by the literal symbol that names it.
//!
//! ```text
//! (+ 1 2 3)          ; 6
//! (^ 2 10)           ; 1024
//! (head {1 2 3})     ; {1}
//! (tail {1 2 3})     ; {2 3}
//! (list 1 2 3)       ; {1 2 3}
//! (eval {+ 1 2})     ; 3
//! (join {1} {2 3})   ; {1 2 3}
//! ```
//!
//! ## Error Handling
//!
//! Builtins are written as `Result<Value, EvalError>` and [`call_builtin`] folds any
//! failure into a [`Value::Error`], so callers only ever see values. Each builtin owns
//! its argument list and drops whatever it does not return.
//!
//! - **Type Safety**: arithmetic rejects non-numbers, list operations reject non-Q-expressions
//! - **Wrapping Arithmetic**: `+ - * / %` and negation wrap on overflow, like machine integers
//! - **Arity Checking**: argument counts are validated against [`Arity`] before the call
//!
//! ## Adding New Operations
//!
//! 1. Add a variant to [`Builtin`] and its symbol to [`Builtin::symbol`]
//! 2. Implement the function with signature `fn(Vec<Value>) -> Result<Value, EvalError>`,
//!    or a pairwise `fn(NumberType, NumberType) -> Result<NumberType, EvalError>` for arithmetic
//! 3. Add a [`BuiltinOp`] entry to `BUILTIN_OPS`
//! 4. Add tests covering edge cases and error conditions

use crate::EvalError;
use crate::ast::{NumberType, Value};
use crate::evaluator::evaluate;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

/// Identifier of a builtin operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Head,
    Tail,
    List,
    Eval,
    Join,
}

impl Builtin {
    /// The symbol that names this builtin
    pub fn symbol(self) -> &'static str {
        match self {
            Builtin::Add => "+",
            Builtin::Sub => "-",
            Builtin::Mul => "*",
            Builtin::Div => "/",
            Builtin::Rem => "%",
            Builtin::Pow => "^",
            Builtin::Head => "head",
            Builtin::Tail => "tail",
            Builtin::List => "list",
            Builtin::Eval => "eval",
            Builtin::Join => "join",
        }
    }
}

/// Number of arguments a builtin accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    /// Check an argument count against this arity. `name` is used in the error message.
    pub(crate) fn validate(self, name: &'static str, got: usize) -> Result<(), EvalError> {
        match self {
            Arity::Exact(n) if got > n => Err(EvalError::TooManyArguments(name)),
            Arity::Exact(n) | Arity::AtLeast(n) if got < n => Err(EvalError::NoArguments(name)),
            _ => Ok(()),
        }
    }
}

/// Pairwise step of an arithmetic fold: `accumulator op operand`
pub type ArithmeticFn = fn(NumberType, NumberType) -> Result<NumberType, EvalError>;

/// Operation over the whole argument list
pub type ListFn = fn(Vec<Value>) -> Result<Value, EvalError>;

/// Represents the implementation of a builtin
#[derive(Clone, Copy)]
pub enum OpKind {
    /// Left fold over numeric arguments
    Arithmetic(ArithmeticFn),
    /// Function over the argument list as a whole
    List(ListFn),
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Arithmetic(_) => write!(f, "Arithmetic(<fn>)"),
            OpKind::List(_) => write!(f, "List(<fn>)"),
        }
    }
}

/// Definition of a builtin operation
#[derive(Debug, Clone)]
pub struct BuiltinOp {
    pub builtin: Builtin,
    pub op_kind: OpKind,
    pub arity: Arity,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        self.builtin == other.builtin
    }
}

impl BuiltinOp {
    pub fn symbol(&self) -> &'static str {
        self.builtin.symbol()
    }

    /// Validate arity and run the operation, consuming the arguments
    pub(crate) fn apply(&self, args: Vec<Value>) -> Result<Value, EvalError> {
        self.arity.validate(self.symbol(), args.len())?;
        match self.op_kind {
            OpKind::Arithmetic(step) => self.fold_numbers(step, args),
            OpKind::List(func) => func(args),
        }
    }

    fn fold_numbers(&self, step: ArithmeticFn, args: Vec<Value>) -> Result<Value, EvalError> {
        let numbers = args
            .into_iter()
            .map(NumberType::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut operands = numbers.into_iter();
        let Some(mut accumulator) = operands.next() else {
            return Err(EvalError::NoArguments(self.symbol()));
        };

        if self.builtin == Builtin::Sub && operands.len() == 0 {
            return Ok(Value::Number(accumulator.wrapping_neg()));
        }

        for operand in operands {
            accumulator = step(accumulator, operand)?;
        }
        Ok(Value::Number(accumulator))
    }
}

//
// Builtin Function Implementations
//

fn builtin_add(x: NumberType, y: NumberType) -> Result<NumberType, EvalError> {
    Ok(x.wrapping_add(y))
}

fn builtin_sub(x: NumberType, y: NumberType) -> Result<NumberType, EvalError> {
    Ok(x.wrapping_sub(y))
}

fn builtin_mul(x: NumberType, y: NumberType) -> Result<NumberType, EvalError> {
    Ok(x.wrapping_mul(y))
}

// Real-valued power truncated back to an integer; the cast saturates out-of-range results.
fn builtin_pow(x: NumberType, y: NumberType) -> Result<NumberType, EvalError> {
    Ok((x as f64).powf(y as f64) as NumberType)
}

fn builtin_div(x: NumberType, y: NumberType) -> Result<NumberType, EvalError> {
    if y == 0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(x.wrapping_div(y))
}

fn builtin_rem(x: NumberType, y: NumberType) -> Result<NumberType, EvalError> {
    if y == 0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(x.wrapping_rem(y))
}

/// The argument of a one-argument builtin. Arity is validated before the call.
fn single_arg(name: &'static str, args: Vec<Value>) -> Result<Value, EvalError> {
    Value::SExpr(args).take(0).ok_or(EvalError::NoArguments(name))
}

/// A single non-empty Q-expression argument
fn non_empty_qexpr(name: &'static str, args: Vec<Value>) -> Result<Value, EvalError> {
    match single_arg(name, args)? {
        Value::QExpr(cells) if cells.is_empty() => Err(EvalError::EmptyList(name)),
        list @ Value::QExpr(_) => Ok(list),
        _ => Err(EvalError::IncorrectType(name)),
    }
}

fn builtin_head(args: Vec<Value>) -> Result<Value, EvalError> {
    let mut list = non_empty_qexpr("head", args)?;
    while list.cells().is_some_and(|cells| cells.len() > 1) {
        list.pop(1);
    }
    Ok(list)
}

fn builtin_tail(args: Vec<Value>) -> Result<Value, EvalError> {
    let mut list = non_empty_qexpr("tail", args)?;
    list.pop(0);
    Ok(list)
}

fn builtin_list(args: Vec<Value>) -> Result<Value, EvalError> {
    Ok(Value::QExpr(args))
}

fn builtin_eval(args: Vec<Value>) -> Result<Value, EvalError> {
    match single_arg("eval", args)? {
        Value::QExpr(cells) => Ok(evaluate(Value::SExpr(cells))),
        _ => Err(EvalError::IncorrectType("eval")),
    }
}

fn builtin_join(args: Vec<Value>) -> Result<Value, EvalError> {
    if !args.iter().all(|arg| matches!(arg, Value::QExpr(_))) {
        return Err(EvalError::IncorrectType("join"));
    }

    let mut lists = args.into_iter();
    let first = lists.next().ok_or(EvalError::NoArguments("join"))?;
    lists.try_fold(first, |joined, next| {
        joined
            .join(next)
            .map_err(|_| EvalError::IncorrectType("join"))
    })
}

/// Global registry of all builtin operations, in dispatch-table order
static BUILTIN_OPS: &[BuiltinOp] = &[
    // List operations
    BuiltinOp {
        builtin: Builtin::Head,
        op_kind: OpKind::List(builtin_head),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        builtin: Builtin::Tail,
        op_kind: OpKind::List(builtin_tail),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        builtin: Builtin::List,
        op_kind: OpKind::List(builtin_list),
        arity: Arity::Any,
    },
    BuiltinOp {
        builtin: Builtin::Eval,
        op_kind: OpKind::List(builtin_eval),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        builtin: Builtin::Join,
        op_kind: OpKind::List(builtin_join),
        arity: Arity::AtLeast(1),
    },
    // Arithmetic operations
    BuiltinOp {
        builtin: Builtin::Add,
        op_kind: OpKind::Arithmetic(builtin_add),
        arity: Arity::AtLeast(1),
    },
    BuiltinOp {
        builtin: Builtin::Sub,
        op_kind: OpKind::Arithmetic(builtin_sub),
        arity: Arity::AtLeast(1),
    },
    BuiltinOp {
        builtin: Builtin::Mul,
        op_kind: OpKind::Arithmetic(builtin_mul),
        arity: Arity::AtLeast(1),
    },
    BuiltinOp {
        builtin: Builtin::Div,
        op_kind: OpKind::Arithmetic(builtin_div),
        arity: Arity::AtLeast(1),
    },
    BuiltinOp {
        builtin: Builtin::Rem,
        op_kind: OpKind::Arithmetic(builtin_rem),
        arity: Arity::AtLeast(1),
    },
    BuiltinOp {
        builtin: Builtin::Pow,
        op_kind: OpKind::Arithmetic(builtin_pow),
        arity: Arity::AtLeast(1),
    },
];

/// Lazy static map from symbol to BuiltinOp (private - use find_builtin_op)
static BUILTIN_TABLE: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| BUILTIN_OPS.iter().map(|op| (op.symbol(), op)).collect());

/// Get all builtin operations
pub fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS
}

/// Find a builtin operation by the symbol that names it
pub fn find_builtin_op(symbol: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_TABLE.get(symbol).copied()
}

/// Call the builtin named `symbol` with `args`.
///
/// Dispatch is purely syntactic on the symbol text. Unknown symbols, arity and type
/// mismatches all come back as [`Value::Error`].
pub fn call_builtin(symbol: &str, args: Vec<Value>) -> Value {
    let Some(op) = find_builtin_op(symbol) else {
        debug!(symbol, "unknown function");
        return EvalError::UnknownFunction.into();
    };

    debug!(builtin = op.symbol(), argc = args.len(), "dispatching builtin");
    op.apply(args).unwrap_or_else(|err| {
        debug!(builtin = op.symbol(), error = %err, "builtin failed");
        err.into()
    })
}
