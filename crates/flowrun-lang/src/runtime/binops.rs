//! Binary operator table: maps (BinOp, lhs type, rhs type) to an
//! implementation. Logical `and`/`or` are not here; they short-circuit in the
//! interpreter.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::ExecutionError;
use crate::runtime::value::{Value, ValueType};
use crate::syntax::ast::BinOp;

// ─── Function pointer ─────────────────────────────────────────────────────────

pub type BinopFn = fn(Value, Value) -> Result<Value, ExecutionError>;

// ─── Registry ─────────────────────────────────────────────────────────────────

pub struct BinopRegistry {
    ops: HashMap<(BinOp, ValueType, ValueType), BinopFn>,
}

impl BinopRegistry {
    pub fn new() -> Self {
        Self { ops: HashMap::new() }
    }

    pub fn register(&mut self, op: BinOp, lhs: ValueType, rhs: ValueType, f: BinopFn) {
        self.ops.insert((op, lhs, rhs), f);
    }

    /// Evaluate `l op r`. An error operand is returned as-is, left side first.
    pub fn eval(&self, op: BinOp, l: Value, r: Value) -> Value {
        if l.is_error() { return l; }
        if r.is_error() { return r; }

        let (lt, rt) = (l.value_type(), r.value_type());

        if matches!(op, BinOp::Eq | BinOp::Ne) {
            if lt == ValueType::Empty || rt == ValueType::Empty {
                return Value::Error(invalid_op_types(op, lt, rt));
            }
            if lt != rt {
                return Value::Boolean(op == BinOp::Ne);
            }
        }

        match self.ops.get(&(op, lt, rt)) {
            Some(f) => f(l, r).unwrap_or_else(Value::Error),
            None => Value::Error(invalid_op_types(op, lt, rt)),
        }
    }
}

impl Default for BinopRegistry {
    fn default() -> Self {
        let mut r = Self::new();
        register_number(&mut r);
        register_string(&mut r);
        register_boolean(&mut r);
        register_concat(&mut r);
        r
    }
}

/// Shared process-wide table; built on first use.
pub fn standard() -> &'static BinopRegistry {
    static REGISTRY: OnceLock<BinopRegistry> = OnceLock::new();
    REGISTRY.get_or_init(BinopRegistry::default)
}

pub fn invalid_op_types(op: BinOp, lt: ValueType, rt: ValueType) -> ExecutionError {
    ExecutionError::type_err("error.msg.invalid_op_types")
        .with("left_type", lt)
        .with("right_type", rt)
        .with("operand", op.symbol())
}

// ─── Number ───────────────────────────────────────────────────────────────────

fn numbers(l: Value, r: Value) -> (f64, f64) {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => (a, b),
        _ => unreachable!("registered for Number × Number only"),
    }
}

fn register_number(r: &mut BinopRegistry) {
    use BinOp::*;
    const N: ValueType = ValueType::Number;

    r.register(Add, N, N, |l, r| { let (a, b) = numbers(l, r); Ok(Value::Number(a + b)) });
    r.register(Sub, N, N, |l, r| { let (a, b) = numbers(l, r); Ok(Value::Number(a - b)) });
    r.register(Mul, N, N, |l, r| { let (a, b) = numbers(l, r); Ok(Value::Number(a * b)) });
    r.register(Div, N, N, |l, r| {
        let (a, b) = numbers(l, r);
        if b == 0.0 { Err(ExecutionError::math("error.msg.division_by_zero")) }
        else { Ok(Value::Number(a / b)) }
    });
    r.register(Mod, N, N, |l, r| {
        let (a, b) = numbers(l, r);
        floor_mod(a, b).map(Value::Number)
    });
    r.register(Pow, N, N, |l, r| {
        let (a, b) = numbers(l, r);
        power(a, b).map(Value::Number)
    });

    r.register(Eq, N, N, |l, r| { let (a, b) = numbers(l, r); Ok(Value::Boolean(a == b)) });
    r.register(Ne, N, N, |l, r| { let (a, b) = numbers(l, r); Ok(Value::Boolean(a != b)) });
    r.register(Gt, N, N, |l, r| { let (a, b) = numbers(l, r); Ok(Value::Boolean(a > b)) });
    r.register(Lt, N, N, |l, r| { let (a, b) = numbers(l, r); Ok(Value::Boolean(a < b)) });
    r.register(Ge, N, N, |l, r| { let (a, b) = numbers(l, r); Ok(Value::Boolean(a >= b)) });
    r.register(Le, N, N, |l, r| { let (a, b) = numbers(l, r); Ok(Value::Boolean(a <= b)) });
}

/// Remainder with the sign of the divisor.
pub fn floor_mod(a: f64, b: f64) -> Result<f64, ExecutionError> {
    if b == 0.0 {
        return Err(ExecutionError::math("error.msg.modulo_by_zero"));
    }
    Ok(a - b * (a / b).floor())
}

pub fn power(a: f64, b: f64) -> Result<f64, ExecutionError> {
    if a == 0.0 && b < 0.0 {
        return Err(ExecutionError::math("error.msg.division_by_zero"));
    }
    let out = a.powf(b);
    if out.is_nan() {
        return Err(ExecutionError::math("error.msg.negative_root"));
    }
    Ok(out)
}

// ─── String ───────────────────────────────────────────────────────────────────

fn strings(l: Value, r: Value) -> (String, String) {
    match (l, r) {
        (Value::String(a), Value::String(b)) => (a, b),
        _ => unreachable!("registered for String × String only"),
    }
}

fn register_string(r: &mut BinopRegistry) {
    use BinOp::*;
    const S: ValueType = ValueType::String;

    r.register(Add, S, S, |l, r| { let (a, b) = strings(l, r); Ok(Value::String(a + &b)) });
    r.register(Eq,  S, S, |l, r| { let (a, b) = strings(l, r); Ok(Value::Boolean(a == b)) });
    r.register(Ne,  S, S, |l, r| { let (a, b) = strings(l, r); Ok(Value::Boolean(a != b)) });
    r.register(Gt,  S, S, |l, r| { let (a, b) = strings(l, r); Ok(Value::Boolean(a > b)) });
    r.register(Lt,  S, S, |l, r| { let (a, b) = strings(l, r); Ok(Value::Boolean(a < b)) });
    r.register(Ge,  S, S, |l, r| { let (a, b) = strings(l, r); Ok(Value::Boolean(a >= b)) });
    r.register(Le,  S, S, |l, r| { let (a, b) = strings(l, r); Ok(Value::Boolean(a <= b)) });
}

// ─── Boolean ──────────────────────────────────────────────────────────────────

fn register_boolean(r: &mut BinopRegistry) {
    use BinOp::*;
    const B: ValueType = ValueType::Boolean;

    r.register(Eq, B, B, |l, r| Ok(Value::Boolean(l == r)));
    r.register(Ne, B, B, |l, r| Ok(Value::Boolean(l != r)));
}

// ─── Mixed concatenation ─────────────────────────────────────────────────────

/// `+` with a String on either side joins the display forms.
fn register_concat(r: &mut BinopRegistry) {
    use ValueType::{Boolean, Number, String as S};

    let concat: BinopFn = |l, r| Ok(Value::String(format!("{l}{r}")));
    for other in [Number, Boolean] {
        r.register(BinOp::Add, S, other, concat);
        r.register(BinOp::Add, other, S, concat);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
