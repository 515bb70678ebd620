//! Tree-walking evaluator. Failures are carried as `Value::Error` and flow
//! upward unchanged; nothing here panics on user input.

use crate::builtins;
use crate::error::ExecutionError;
use crate::runtime::binops::{self, BinopRegistry};
use crate::runtime::console::Console;
use crate::runtime::environment::{Environment, not_defined};
use crate::runtime::value::{Value, ValueType};
use crate::syntax::ast::{BinOp, Node, UnOp};
use crate::syntax::token::FmtSegment;

pub struct Interpreter<'a> {
    env: &'a mut Environment,
    console: &'a mut dyn Console,
    binops: &'static BinopRegistry,
}

impl<'a> Interpreter<'a> {
    pub fn new(env: &'a mut Environment, console: &'a mut dyn Console) -> Self {
        Self { env, console, binops: binops::standard() }
    }

    pub fn eval(&mut self, node: &Node) -> Value {
        match node {
            Node::Value(v) => v.clone(),

            Node::BinaryOp { left, op, right } => self.eval_binop(left, *op, right),

            Node::UnaryOp { op, operand } => {
                let v = self.eval(operand);
                match op {
                    UnOp::Neg => v.neg(),
                    UnOp::Pos => v.pos(),
                    UnOp::Not => v.not(),
                }
            }

            Node::Cast { expr, ty } => self.eval(expr).cast(*ty),

            Node::FormatString(segments) => self.eval_format(segments),

            Node::GetVar(name) => match self.env.get(name) {
                Ok(v) => v.clone(),
                Err(e) => Value::Error(e),
            },

            Node::SetVar { name, value, is_declaration } => {
                self.eval_set(name, value, *is_declaration)
            }

            Node::Compound(nodes) => {
                let mut last = Value::Empty;
                for n in nodes {
                    last = self.eval(n);
                    if last.is_error() { break; }
                }
                last
            }

            Node::Write(expr) => match self.eval(expr).to_string_value() {
                Value::String(s) => {
                    self.console.write(s);
                    Value::Empty
                }
                other => other,
            },

            Node::Read { name, ty } => self.eval_read(name, *ty),

            Node::Call { name, args } => self.eval_call(name, args),
        }
    }

    // ─── Operators ───────────────────────────────────────────────────────────

    fn eval_binop(&mut self, left: &Node, op: BinOp, right: &Node) -> Value {
        match op {
            // The right side is skipped once the left side decides the result.
            BinOp::And | BinOp::Or => {
                match self.eval(left).to_boolean() {
                    Value::Boolean(b) if b == (op == BinOp::Or) => Value::Boolean(b),
                    Value::Boolean(_) => self.eval(right).to_boolean(),
                    other => other,
                }
            }
            _ => {
                let l = self.eval(left);
                let r = self.eval(right);
                self.binops.eval(op, l, r)
            }
        }
    }

    // ─── Variables ───────────────────────────────────────────────────────────

    /// Existence is checked before the right-hand side runs, so a failed
    /// declaration never triggers the side effects of its value (a `read`).
    fn eval_set(&mut self, name: &str, value: &Node, is_declaration: bool) -> Value {
        if is_declaration && self.env.contains(name) {
            return Value::Error(
                ExecutionError::var("error.msg.var_already_defined").with("var_name", name),
            );
        }
        if !is_declaration && !self.env.contains(name) {
            return Value::Error(not_defined(name));
        }

        let v = self.eval(value);
        if v.is_error() {
            return v;
        }
        let stored = if is_declaration {
            self.env.declare(name, v)
        } else {
            self.env.assign(name, v)
        };
        match stored {
            Ok(()) => Value::Empty,
            Err(e) => Value::Error(e),
        }
    }

    fn eval_format(&mut self, segments: &[FmtSegment]) -> Value {
        let mut out = String::new();
        for seg in segments {
            match seg {
                FmtSegment::Text(t) => out.push_str(t),
                FmtSegment::Var(name) => {
                    let v = match self.env.get(name) {
                        Ok(v) => v.clone().to_string_value(),
                        Err(e) => return Value::Error(e),
                    };
                    match v {
                        Value::String(s) => out.push_str(&s),
                        other => return other,
                    }
                }
            }
        }
        Value::String(out)
    }

    // ─── I/O ─────────────────────────────────────────────────────────────────

    fn eval_read(&mut self, name: &str, ty: ValueType) -> Value {
        let prompt = format!("{name} ({ty})");
        let line = match self.console.read(&prompt) {
            Ok(line) => line,
            Err(e) => return Value::Error(e),
        };
        match ty {
            ValueType::Boolean => match line.trim() {
                "true"  => Value::Boolean(true),
                "false" => Value::Boolean(false),
                _ => Value::Error(
                    ExecutionError::value("error.msg.bad_bool_lit").with("literal", line),
                ),
            },
            other => Value::String(line).cast(other),
        }
    }

    // ─── Calls ───────────────────────────────────────────────────────────────

    fn eval_call(&mut self, name: &str, args: &[Node]) -> Value {
        let Some(builtin) = builtins::lookup(name) else {
            return Value::Error(builtins::unknown_function(name));
        };
        if let Err(e) = builtin.check_argc(args.len()) {
            return Value::Error(e);
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let v = self.eval(arg);
            if v.is_error() {
                return v;
            }
            values.push(v);
        }
        builtin.invoke(&values)
    }
}

impl Node {
    /// Evaluate this tree against `env`, doing I/O through `console`.
    pub fn evaluate(&self, env: &mut Environment, console: &mut dyn Console) -> Value {
        Interpreter::new(env, console).eval(self)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::console::BufferConsole;

    fn eval_with(node: &Node, env: &mut Environment, console: &mut BufferConsole) -> Value {
        node.evaluate(env, console)
    }

    fn eval(node: &Node) -> Value {
        eval_with(node, &mut Environment::new(), &mut BufferConsole::new())
    }

    fn read_into(name: &str, ty: ValueType) -> Node {
        Node::SetVar {
            name: name.into(),
            value: Box::new(Node::Read { name: name.into(), ty }),
            is_declaration: true,
        }
    }

    #[test]
    fn and_or_short_circuit() {
        let mut console = BufferConsole::with_input(["true"]);
        let mut env = Environment::new();
        let node = Node::binary(Node::Value(false.into()), BinOp::And, read_into("x", ValueType::Boolean));
        assert_eq!(eval_with(&node, &mut env, &mut console), Value::Boolean(false));
        assert!(console.prompts.is_empty());

        let node = Node::binary(Node::Value(true.into()), BinOp::Or, read_into("x", ValueType::Boolean));
        assert_eq!(eval_with(&node, &mut env, &mut console), Value::Boolean(true));
        assert!(console.prompts.is_empty());
        assert!(!env.contains("x"));
    }

    #[test]
    fn logical_result_is_boolean() {
        let node = Node::binary(Node::number(1.0), BinOp::And, Node::Value("yes".into()));
        assert_eq!(eval(&node), Value::Boolean(true));
    }

    #[test]
    fn logical_left_cast_error_returned() {
        let node = Node::binary(Node::Value(Value::Empty), BinOp::Or, Node::number(1.0));
        assert_eq!(eval(&node).error().unwrap().msg, "error.msg.invalid_cast");
    }

    #[test]
    fn failed_declaration_skips_read() {
        let mut env = Environment::new();
        env.declare("n", Value::Number(1.0)).unwrap();
        let mut console = BufferConsole::with_input(["5"]);
        let v = eval_with(&read_into("n", ValueType::Number), &mut env, &mut console);
        assert_eq!(v.error().unwrap().msg, "error.msg.var_already_defined");
        assert!(console.prompts.is_empty());
    }

    #[test]
    fn read_conversions() {
        let mut env = Environment::new();
        let mut console = BufferConsole::with_input(["12", "hello", "false"]);
        let node = Node::Compound(vec![
            read_into("a", ValueType::Number),
            read_into("b", ValueType::String),
            read_into("c", ValueType::Boolean),
        ]);
        assert_eq!(eval_with(&node, &mut env, &mut console), Value::Empty);
        assert_eq!(env.get("a").unwrap(), &Value::Number(12.0));
        assert_eq!(env.get("b").unwrap(), &Value::from("hello"));
        assert_eq!(env.get("c").unwrap(), &Value::Boolean(false));
        assert_eq!(console.prompts, vec!["a (Number)", "b (String)", "c (Boolean)"]);
    }

    #[test]
    fn bad_read_input() {
        let mut console = BufferConsole::with_input(["yes"]);
        let v = eval_with(&read_into("c", ValueType::Boolean), &mut Environment::new(), &mut console);
        assert_eq!(v.error().unwrap().msg, "error.msg.bad_bool_lit");

        let mut console = BufferConsole::with_input(["abc"]);
        let v = eval_with(&read_into("n", ValueType::Number), &mut Environment::new(), &mut console);
        assert_eq!(v.error().unwrap().msg, "error.msg.bad_num_lit");
    }

    #[test]
    fn exhausted_input_is_interrupted() {
        let v = eval(&read_into("n", ValueType::Number));
        assert!(v.error().unwrap().is_interrupted());
    }

    #[test]
    fn compound_stops_at_first_error() {
        let mut console = BufferConsole::new();
        let node = Node::Compound(vec![
            Node::Write(Box::new(Node::Value("one".into()))),
            Node::GetVar("missing".into()),
            Node::Write(Box::new(Node::Value("two".into()))),
        ]);
        let v = eval_with(&node, &mut Environment::new(), &mut console);
        assert_eq!(v.error().unwrap().msg, "error.msg.var_not_defined");
        assert_eq!(console.output, vec!["one"]);
    }

    #[test]
    fn write_of_empty_is_error() {
        let v = eval(&Node::Write(Box::new(Node::Value(Value::Empty))));
        assert_eq!(v.error().unwrap().msg, "error.msg.invalid_cast");
    }

    #[test]
    fn format_string_reads_variables() {
        let mut env = Environment::new();
        env.declare("n", Value::Number(3.0)).unwrap();
        let node = Node::FormatString(vec![FmtSegment::Text("n is ".into()), FmtSegment::Var("n".into())]);
        assert_eq!(eval_with(&node, &mut env, &mut BufferConsole::new()), Value::from("n is 3"));

        let node = Node::FormatString(vec![FmtSegment::Var("q".into())]);
        assert_eq!(eval(&node).error().unwrap().arg("var_name"), Some("q"));
    }

    #[test]
    fn call_checks_name_then_arity_then_types() {
        let unknown = Node::Call { name: "frob".into(), args: vec![Node::GetVar("missing".into())] };
        assert_eq!(eval(&unknown).error().unwrap().msg, "error.msg.unknown_func");

        let arity = Node::Call { name: "sqrt".into(), args: vec![Node::GetVar("missing".into()); 2] };
        assert_eq!(eval(&arity).error().unwrap().msg, "error.msg.wrong_arg_count");

        let arg_err = Node::Call { name: "sqrt".into(), args: vec![Node::GetVar("missing".into())] };
        assert_eq!(eval(&arg_err).error().unwrap().msg, "error.msg.var_not_defined");

        let ok = Node::Call { name: "sqrt".into(), args: vec![Node::number(16.0)] };
        assert_eq!(eval(&ok), Value::Number(4.0));
    }
}
