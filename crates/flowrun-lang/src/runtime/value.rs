use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;

/// Runtime type tag. The `Display` form is what error messages show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Empty,
    Number,
    String,
    Boolean,
    Error,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty   => "Empty",
            Self::Number  => "Number",
            Self::String  => "String",
            Self::Boolean => "Boolean",
            Self::Error   => "<error-type>",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────

/// A runtime value. Once a value is `Error`, every operation consuming it
/// returns it unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Number(f64),
    String(String),
    Boolean(bool),
    Error(ExecutionError),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Empty      => ValueType::Empty,
            Self::Number(_)  => ValueType::Number,
            Self::String(_)  => ValueType::String,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Error(_)   => ValueType::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn error(&self) -> Option<&ExecutionError> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    // ─── Casts ───────────────────────────────────────────────────────────────

    pub fn cast(self, ty: ValueType) -> Value {
        match ty {
            ValueType::Boolean => self.to_boolean(),
            ValueType::String  => self.to_string_value(),
            ValueType::Number  => self.to_number(),
            ValueType::Empty | ValueType::Error => invalid_cast(self.value_type(), ty),
        }
    }

    /// Numbers are true when non-zero, strings when non-empty.
    pub fn to_boolean(self) -> Value {
        match self {
            Self::Error(_)   => self,
            Self::Empty      => invalid_cast(ValueType::Empty, ValueType::Boolean),
            Self::Boolean(_) => self,
            Self::Number(n)  => Self::Boolean(n != 0.0),
            Self::String(s)  => Self::Boolean(!s.is_empty()),
        }
    }

    pub fn to_string_value(self) -> Value {
        match self {
            Self::Error(_)  => self,
            Self::Empty     => invalid_cast(ValueType::Empty, ValueType::String),
            Self::String(_) => self,
            other           => Self::String(other.to_string()),
        }
    }

    /// Strings are parsed as an integer first, then as a float.
    pub fn to_number(self) -> Value {
        match self {
            Self::Error(_)   => self,
            Self::Empty      => invalid_cast(ValueType::Empty, ValueType::Number),
            Self::Number(_)  => self,
            Self::Boolean(b) => Self::Number(if b { 1.0 } else { 0.0 }),
            Self::String(s)  => match parse_number(&s) {
                Some(n) => Self::Number(n),
                None => Self::Error(
                    ExecutionError::value("error.msg.bad_num_lit").with("literal", s),
                ),
            },
        }
    }

    // ─── Unary operators ─────────────────────────────────────────────────────

    pub fn not(self) -> Value {
        match self.to_boolean() {
            Self::Boolean(b) => Self::Boolean(!b),
            other => other,
        }
    }

    pub fn neg(self) -> Value {
        match self {
            Self::Error(_)  => self,
            Self::Number(n) => Self::Number(-n),
            other           => invalid_unary(&other, "-"),
        }
    }

    pub fn pos(self) -> Value {
        match self {
            Self::Error(_) | Self::Number(_) => self,
            other => invalid_unary(&other, "+"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty      => Ok(()),
            Self::Number(n)  => write!(f, "{n}"),
            Self::String(s)  => f.write_str(s),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Error(e)   => write!(f, "{e}"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Self::Number(n) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Self::Boolean(b) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Self::String(s.to_string()) }
}

impl From<ExecutionError> for Value {
    fn from(e: ExecutionError) -> Self { Self::Error(e) }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(i as f64);
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn invalid_cast(from: ValueType, to: ValueType) -> Value {
    Value::Error(
        ExecutionError::type_err("error.msg.invalid_cast")
            .with("op_type", from)
            .with("cast_type", to),
    )
}

fn invalid_unary(v: &Value, op: &'static str) -> Value {
    Value::Error(
        ExecutionError::type_err("error.msg.invalid_uni_op_types")
            .with("operand", op)
            .with("op_type", v.value_type()),
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn err_msg(v: &Value) -> &'static str {
        v.error().unwrap_or_else(|| panic!("expected error, got {v:?}")).msg
    }

    #[test]
    fn truthiness() {
        assert_eq!(Value::Number(0.0).to_boolean(), Value::Boolean(false));
        assert_eq!(Value::Number(-2.0).to_boolean(), Value::Boolean(true));
        assert_eq!(Value::from("").to_boolean(), Value::Boolean(false));
        assert_eq!(Value::from("no").to_boolean(), Value::Boolean(true));
    }

    #[test]
    fn empty_cannot_be_cast() {
        for ty in [ValueType::Boolean, ValueType::String, ValueType::Number] {
            let v = Value::Empty.cast(ty);
            assert_eq!(err_msg(&v), "error.msg.invalid_cast");
            let e = v.error().unwrap();
            assert_eq!(e.name, ErrorKind::TypeError);
            assert_eq!(e.arg("op_type"), Some("Empty"));
            assert_eq!(e.arg("cast_type"), Some(ty.name()));
        }
    }

    #[test]
    fn boolean_to_number() {
        assert_eq!(Value::Boolean(true).to_number(), Value::Number(1.0));
        assert_eq!(Value::Boolean(false).to_number(), Value::Number(0.0));
    }

    #[test]
    fn string_to_number() {
        assert_eq!(Value::from("42").to_number(), Value::Number(42.0));
        assert_eq!(Value::from(" 2.5 ").to_number(), Value::Number(2.5));
        assert_eq!(Value::from("-7").to_number(), Value::Number(-7.0));
    }

    #[test]
    fn bad_numeric_literal() {
        let v = Value::from("12a").to_number();
        assert_eq!(err_msg(&v), "error.msg.bad_num_lit");
        assert_eq!(v.error().unwrap().name, ErrorKind::ValueError);
        assert_eq!(v.error().unwrap().arg("literal"), Some("12a"));
        assert!(Value::from("inf").to_number().is_error());
    }

    #[test]
    fn numeric_literal_round_trip() {
        for lit in ["0", "7", "12.5", "0.001", "123456789", "3.14159"] {
            let n = Value::from(lit).to_number();
            let back = n.clone().to_string_value();
            let again = back.to_number();
            assert_eq!(n, again, "round trip of {lit}");
            assert_eq!(again, Value::Number(lit.parse().unwrap()));
        }
    }

    #[test]
    fn number_display() {
        assert_eq!(Value::Number(9.0).to_string(), "9");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(-0.5).to_string(), "-0.5");
        assert_eq!(Value::Boolean(true).to_string(), "true");
    }

    #[test]
    fn unary_ops() {
        assert_eq!(Value::Number(3.0).neg(), Value::Number(-3.0));
        assert_eq!(Value::Number(3.0).pos(), Value::Number(3.0));
        assert_eq!(Value::Boolean(true).not(), Value::Boolean(false));
        assert_eq!(Value::Number(0.0).not(), Value::Boolean(true));
    }

    #[test]
    fn unary_type_errors_name_operator() {
        let v = Value::from("x").neg();
        assert_eq!(err_msg(&v), "error.msg.invalid_uni_op_types");
        assert_eq!(v.error().unwrap().arg("operand"), Some("-"));
        assert_eq!(v.error().unwrap().arg("op_type"), Some("String"));

        let v = Value::Boolean(true).pos();
        assert_eq!(v.error().unwrap().arg("operand"), Some("+"));
        assert!(Value::Empty.not().is_error());
    }

    #[test]
    fn errors_pass_through_unchanged() {
        let e = Value::Error(ExecutionError::math("error.msg.division_by_zero"));
        assert_eq!(e.clone().neg(), e);
        assert_eq!(e.clone().pos(), e);
        assert_eq!(e.clone().not(), e);
        assert_eq!(e.clone().to_number(), e);
        assert_eq!(e.clone().cast(ValueType::String), e);
    }
}
