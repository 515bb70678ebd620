use crate::runtime::value::{Value, ValueType};
use crate::syntax::token::FmtSegment;

// ─── Nodes ───────────────────────────────────────────────────────────────────

/// An evaluable tree compiled from one block's content. Blocks own their
/// trees exclusively; nothing is shared between blocks.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A literal constant.
    Value(Value),
    BinaryOp {
        left: Box<Node>,
        op: BinOp,
        right: Box<Node>,
    },
    UnaryOp {
        op: UnOp,
        operand: Box<Node>,
    },
    /// `expr as Type`
    Cast {
        expr: Box<Node>,
        ty: ValueType,
    },
    /// `"text $name text"`
    FormatString(Vec<FmtSegment>),
    GetVar(String),
    /// `name = value`; an Init block declares, a Calc block assigns.
    SetVar {
        name: String,
        value: Box<Node>,
        is_declaration: bool,
    },
    /// Sequence evaluated left to right; yields the last value.
    Compound(Vec<Node>),
    Write(Box<Node>),
    /// `read name as Type`
    Read {
        name: String,
        ty: ValueType,
    },
    Call {
        name: String,
        args: Vec<Node>,
    },
}

impl Node {
    pub fn number(n: f64) -> Self {
        Node::Value(Value::Number(n))
    }

    pub fn binary(left: Node, op: BinOp, right: Node) -> Self {
        Node::BinaryOp { left: Box::new(left), op, right: Box::new(right) }
    }

    pub fn unary(op: UnOp, operand: Node) -> Self {
        Node::UnaryOp { op, operand: Box::new(operand) }
    }
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add, Sub, Mul, Div, Mod, Pow,
    And, Or,
    Eq, Ne, Gt, Lt, Ge, Le,
}

impl BinOp {
    /// Operator as written in source; used in error arguments.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
            Self::And => "and",
            Self::Or  => "or",
            Self::Eq  => "==",
            Self::Ne  => "!=",
            Self::Gt  => ">",
            Self::Lt  => "<",
            Self::Ge  => ">=",
            Self::Le  => "<=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Pos,
    Not,
}
