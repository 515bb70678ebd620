//! Built-in numeric functions. Always available, no import required.
//!
//! A call is checked in this order: the name must exist, the argument count
//! must fit the function's arity, then (after the arguments are evaluated)
//! every argument must be a Number.

pub mod math;

use crate::error::ExecutionError;
use crate::runtime::value::{Value, ValueType};

// ─── Arity ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Minimum and optional maximum, both inclusive.
    Range(usize, Option<usize>),
}

pub type BuiltinFn = fn(&'static str, &[f64]) -> Result<f64, ExecutionError>;

pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub func: BuiltinFn,
}

const fn b(name: &'static str, arity: Arity, func: BuiltinFn) -> Builtin {
    Builtin { name, arity, func }
}

pub static BUILTINS: &[Builtin] = &[
    b("mod",    Arity::Exact(2),             math::modulo),
    b("sin",    Arity::Exact(1),             math::sin),
    b("cos",    Arity::Exact(1),             math::cos),
    b("tan",    Arity::Exact(1),             math::tan),
    b("arcsin", Arity::Exact(1),             math::arcsin),
    b("arccos", Arity::Exact(1),             math::arccos),
    b("arctan", Arity::Exact(1),             math::arctan),
    b("floor",  Arity::Exact(1),             math::floor),
    b("ceil",   Arity::Exact(1),             math::ceil),
    b("round",  Arity::Range(1, Some(2)),    math::round),
    b("log",    Arity::Range(1, Some(2)),    math::log),
    b("sign",   Arity::Exact(1),             math::sign),
    b("sqrt",   Arity::Exact(1),             math::sqrt),
    b("root",   Arity::Exact(2),             math::root),
    b("max",    Arity::Range(1, None),       math::max),
    b("min",    Arity::Range(1, None),       math::min),
    b("abs",    Arity::Exact(1),             math::abs),
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

pub fn is_builtin(name: &str) -> bool {
    lookup(name).is_some()
}

pub fn unknown_function(name: &str) -> ExecutionError {
    ExecutionError::call("error.msg.unknown_func").with("func", name)
}

impl Builtin {
    pub fn check_argc(&self, received: usize) -> Result<(), ExecutionError> {
        let call = |msg| ExecutionError::call(msg).with("func", self.name).with("received", received);
        match self.arity {
            Arity::Exact(n) if received != n => {
                Err(call("error.msg.wrong_arg_count").with("expected", n))
            }
            Arity::Range(min, _) if received < min => {
                Err(call("error.msg.too_few_args").with("min", min))
            }
            Arity::Range(_, Some(max)) if received > max => {
                Err(call("error.msg.too_many_args").with("max", max))
            }
            _ => Ok(()),
        }
    }

    /// Type-check evaluated arguments and run the function.
    pub fn invoke(&self, args: &[Value]) -> Value {
        let mut nums = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            match arg {
                Value::Number(n) => nums.push(*n),
                Value::Error(_) => return arg.clone(),
                other => {
                    return Value::Error(
                        ExecutionError::type_err("error.msg.invalid_arg_type")
                            .with("func", self.name)
                            .with("arg_idx", i + 1)
                            .with("expected", ValueType::Number)
                            .with("received", other.value_type()),
                    );
                }
            }
        }
        match (self.func)(self.name, &nums) {
            Ok(n) => Value::Number(n),
            Err(e) => Value::Error(e),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn every_listed_name_resolves() {
        for name in [
            "mod", "sin", "cos", "tan", "arcsin", "arccos", "arctan", "floor", "ceil",
            "round", "log", "sign", "sqrt", "root", "max", "min", "abs",
        ] {
            assert!(is_builtin(name), "{name} missing");
        }
        assert!(!is_builtin("print"));
    }

    #[test]
    fn exact_arity() {
        let sin = lookup("sin").unwrap();
        assert!(sin.check_argc(1).is_ok());
        let e = sin.check_argc(2).unwrap_err();
        assert_eq!(e.name, ErrorKind::CallError);
        assert_eq!(e.msg, "error.msg.wrong_arg_count");
        assert_eq!(e.arg("func"), Some("sin"));
        assert_eq!(e.arg("expected"), Some("1"));
        assert_eq!(e.arg("received"), Some("2"));
    }

    #[test]
    fn range_arity() {
        let round = lookup("round").unwrap();
        assert!(round.check_argc(1).is_ok());
        assert!(round.check_argc(2).is_ok());
        assert_eq!(round.check_argc(0).unwrap_err().msg, "error.msg.too_few_args");
        let e = round.check_argc(3).unwrap_err();
        assert_eq!(e.msg, "error.msg.too_many_args");
        assert_eq!(e.arg("max"), Some("2"));

        let max = lookup("max").unwrap();
        assert!(max.check_argc(7).is_ok());
        assert_eq!(max.check_argc(0).unwrap_err().arg("min"), Some("1"));
    }

    #[test]
    fn argument_types_are_checked_with_index() {
        let v = lookup("max").unwrap().invoke(&[Value::Number(1.0), Value::from("2")]);
        let e = v.error().unwrap();
        assert_eq!(e.name, ErrorKind::TypeError);
        assert_eq!(e.msg, "error.msg.invalid_arg_type");
        assert_eq!(e.arg("arg_idx"), Some("2"));
        assert_eq!(e.arg("expected"), Some("Number"));
        assert_eq!(e.arg("received"), Some("String"));
    }

    #[test]
    fn invoke_runs_function() {
        assert_eq!(lookup("abs").unwrap().invoke(&[Value::Number(-4.0)]), Value::Number(4.0));
    }
}
