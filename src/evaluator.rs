use crate::EvalError;
use crate::ast::Value;
use crate::builtinops::{call_builtin, get_builtin_ops};
use tracing::trace;

/// Symbol bindings, kept in insertion order.
///
/// The environment owns its values outright. The evaluator does not consult it;
/// builtin dispatch is purely on the literal symbol name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Environment {
    bindings: Vec<(String, Value)>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            bindings: Vec::new(),
        }
    }

    /// An environment binding every builtin symbol to its function value
    pub fn with_builtins() -> Self {
        Environment {
            bindings: get_builtin_ops()
                .iter()
                .map(|op| (op.symbol().to_owned(), Value::function(op.builtin)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

/// Evaluate a value (public API)
///
/// Only S-expressions reduce; every other value evaluates to itself.
pub fn evaluate(value: Value) -> Value {
    match value {
        Value::SExpr(cells) => evaluate_sexpr(cells),
        Value::Number(_)
        | Value::Error(_)
        | Value::Symbol(_)
        | Value::QExpr(_)
        | Value::Function(_) => value,
    }
}

/// Reduce the children of an S-expression
fn evaluate_sexpr(cells: Vec<Value>) -> Value {
    trace!(argc = cells.len(), "reducing s-expression");

    let mut cells: Vec<Value> = cells.into_iter().map(evaluate).collect();

    // First error wins; everything else is dropped
    if let Some(index) = cells.iter().position(Value::is_error) {
        return cells.swap_remove(index);
    }

    match cells.len() {
        0 => return Value::SExpr(cells),
        1 => return cells.remove(0),
        _ => {}
    }

    match cells.remove(0) {
        Value::Symbol(name) => call_builtin(&name, cells),
        _ => EvalError::NotASymbol.into(),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{NumberType, qexpr, sexpr, sym, val};
    use crate::builtinops::Builtin;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_self_evaluating_values() {
        let test_cases = vec![
            val(42),
            val(-1),
            sym("foo"),
            sym("+"),
            Value::error("already failed"),
            Value::qexpr(),
            qexpr([sym("+"), val(1), val(2)]),
            qexpr([sexpr([sym("/"), val(1), val(0)])]), // quoted, never reduced
            Value::function(Builtin::Tail),
        ];

        for value in test_cases {
            assert_eq!(evaluate(value.clone()), value);
        }
    }

    #[test]
    fn test_sexpr_reduction_data_driven() {
        let test_cases = vec![
            // Empty expression evaluates to itself
            (Value::sexpr(), Value::sexpr()),
            // Singleton collapse
            (sexpr([5]), val(5)),
            (sexpr([sym("+")]), sym("+")),
            (sexpr([qexpr([1, 2])]), qexpr([1, 2])),
            (sexpr([sexpr([sexpr([7])])]), val(7)),
            (sexpr([Value::sexpr()]), Value::sexpr()),
            // Arithmetic
            (sexpr([sym("+"), val(1), val(2)]), val(3)),
            (sexpr([sym("-"), val(4)]), val(-4)),
            (sexpr([sym("+"), val(NumberType::MAX), val(1)]), val(NumberType::MIN)),
            (
                sexpr([
                    sym("+"),
                    val(1),
                    sexpr([sym("*"), val(2), val(3)]),
                ]),
                val(7),
            ),
            // Builtin dispatch with nested list operations
            (sexpr([sym("head"), qexpr([1, 2, 3])]), qexpr([1])),
            (sexpr([sym("tail"), qexpr([1, 2, 3])]), qexpr([2, 3])),
            (sexpr([sym("join"), qexpr([1, 2]), qexpr([3])]), qexpr([1, 2, 3])),
            (
                sexpr([
                    sym("eval"),
                    sexpr([sym("list"), sym("+"), val(1), val(2)]),
                ]),
                val(3),
            ),
            // Non-symbol head
            (
                sexpr([1, 2, 3]),
                EvalError::NotASymbol.into(),
            ),
            (
                sexpr([qexpr([1]), val(2)]),
                EvalError::NotASymbol.into(),
            ),
            (
                sexpr([val(Builtin::Add), val(1), val(2)]),
                EvalError::NotASymbol.into(),
            ),
            // Unknown head
            (
                sexpr([sym("foo"), val(1)]),
                EvalError::UnknownFunction.into(),
            ),
            // Errors propagate, leftmost first
            (
                sexpr([
                    sym("+"),
                    sexpr([sym("/"), val(1), val(0)]),
                    sexpr([sym("foo"), val(1)]),
                ]),
                EvalError::DivisionByZero.into(),
            ),
            (
                sexpr([
                    sym("+"),
                    sexpr([sym("foo"), val(1)]),
                    sexpr([sym("/"), val(1), val(0)]),
                ]),
                EvalError::UnknownFunction.into(),
            ),
            (
                sexpr([sym("head"), Value::error("Invalid number")]),
                Value::error("Invalid number"),
            ),
            // An error in head position wins over the non-symbol check
            (
                sexpr([sexpr([sym("/"), val(1), val(0)]), val(2)]),
                EvalError::DivisionByZero.into(),
            ),
        ];

        for (i, (input, expected)) in test_cases.into_iter().enumerate() {
            let shown = input.to_string();
            assert_eq!(evaluate(input), expected, "#{} {shown}", i + 1);
        }
    }

    #[test]
    fn test_copy_isolation() {
        let shapes = vec![
            val(3),
            sym("head"),
            Value::error("boom"),
            Value::function(Builtin::Join),
            Value::sexpr(),
            qexpr([val(1), qexpr([2, 3])]),
            sexpr([sym("+"), val(1), sexpr([sym("*"), val(2), val(3)])]),
        ];

        for original in shapes {
            let printed = original.to_string();
            let expected = evaluate(original.clone());

            let copy = original.clone();
            drop(evaluate(copy.clone()));
            drop(copy);

            assert_eq!(original.to_string(), printed);
            assert_eq!(evaluate(original), expected);
        }
    }

    #[test]
    fn test_environment_stub() {
        let env = Environment::new();
        assert!(env.is_empty());
        assert_eq!(env.iter().count(), 0);
        assert_eq!(env, Environment::default());
    }

    #[test]
    fn test_environment_builtins_are_not_consulted() {
        let env = Environment::with_builtins();
        assert_eq!(env.len(), 11);

        let names: Vec<&str> = env.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec!["head", "tail", "list", "eval", "join", "+", "-", "*", "/", "%", "^"]
        );
        let lookup = |symbol: &str| {
            env.iter()
                .find(|(name, _)| *name == symbol)
                .map(|(_, value)| value.clone())
                .unwrap()
        };
        assert_eq!(lookup("head"), Value::function(Builtin::Head));
        assert_eq!(lookup("^"), Value::function(Builtin::Pow));

        // Dispatch stays syntactic: a function value in head position is not callable
        let call = sexpr([lookup("+"), val(1), val(2)]);
        assert_eq!(evaluate(call), EvalError::NotASymbol.into());
    }

    proptest! {
        #[test]
        fn prop_addition(a in any::<NumberType>(), b in any::<NumberType>()) {
            prop_assert_eq!(evaluate(sexpr([sym("+"), val(a), val(b)])), val(a.wrapping_add(b)));
        }

        #[test]
        fn prop_subtraction(a in any::<NumberType>(), b in any::<NumberType>()) {
            prop_assert_eq!(evaluate(sexpr([sym("-"), val(a), val(b)])), val(a.wrapping_sub(b)));
        }

        #[test]
        fn prop_multiplication(a in any::<NumberType>(), b in any::<NumberType>()) {
            prop_assert_eq!(evaluate(sexpr([sym("*"), val(a), val(b)])), val(a.wrapping_mul(b)));
        }

        #[test]
        fn prop_negation(a in any::<NumberType>()) {
            prop_assert_eq!(evaluate(sexpr([sym("-"), val(a)])), val(a.wrapping_neg()));
        }

        #[test]
        fn prop_division_by_zero(a in any::<NumberType>()) {
            prop_assert_eq!(
                evaluate(sexpr([sym("/"), val(a), val(0)])),
                Value::error("Division by zero")
            );
        }

        #[test]
        fn prop_list_eval_round_trip(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
            let listed = sexpr([sym("list"), sym("+"), val(a), val(b)]);
            prop_assert_eq!(evaluate(sexpr([sym("eval"), listed])), val(a + b));
        }

        #[test]
        fn prop_join_preserves_order(xs in proptest::collection::vec(any::<i32>(), 0..8), ys in proptest::collection::vec(any::<i32>(), 0..8)) {
            let expected: Vec<Value> = xs.iter().chain(ys.iter()).map(|&n| val(n)).collect();
            let joined = evaluate(sexpr([sym("join"), qexpr(xs), qexpr(ys)]));
            prop_assert_eq!(joined, Value::QExpr(expected));
        }
    }
}
