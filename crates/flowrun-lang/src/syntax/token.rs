use crate::builtins;
use crate::runtime::value::ValueType;

/// One piece of an interpolated string: literal text or a `$name` reference.
#[derive(Debug, Clone, PartialEq)]
pub enum FmtSegment {
    Text(String),
    Var(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    Str(String),
    Bool(bool),
    FormatStr(Vec<FmtSegment>),

    Ident(String),
    /// Name of a built-in function (`sin`, `max`, ...).
    Func(String),

    // Keywords
    Read,
    As,
    And,
    Or,
    Not,

    // Type names
    Type(ValueType),

    // Operators
    Eq,         // =
    Comma,      // ,
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    Caret,      // ^
    LParen,     // (
    RParen,     // )
    EqEq,       // ==
    BangEq,     // !=
    Gt,         // >
    Lt,         // <
    GtEq,       // >=
    LtEq,       // <=

    Eof,
}

impl TokenKind {
    /// Short name used in `unexpected_token` errors.
    pub fn describe(&self) -> String {
        match self {
            Self::Number(n)    => format!("number `{n}`"),
            Self::Str(_)       => "string".into(),
            Self::Bool(b)      => format!("`{b}`"),
            Self::FormatStr(_) => "format string".into(),
            Self::Ident(s)     => format!("identifier `{s}`"),
            Self::Func(s)      => format!("function `{s}`"),
            Self::Read         => "`read`".into(),
            Self::As           => "`as`".into(),
            Self::And          => "`and`".into(),
            Self::Or           => "`or`".into(),
            Self::Not          => "`not`".into(),
            Self::Type(t)      => format!("type `{t}`"),
            Self::Eq           => "`=`".into(),
            Self::Comma        => "`,`".into(),
            Self::Plus         => "`+`".into(),
            Self::Minus        => "`-`".into(),
            Self::Star         => "`*`".into(),
            Self::Slash        => "`/`".into(),
            Self::Percent      => "`%`".into(),
            Self::Caret        => "`^`".into(),
            Self::LParen       => "`(`".into(),
            Self::RParen       => "`)`".into(),
            Self::EqEq         => "`==`".into(),
            Self::BangEq       => "`!=`".into(),
            Self::Gt           => "`>`".into(),
            Self::Lt           => "`<`".into(),
            Self::GtEq         => "`>=`".into(),
            Self::LtEq         => "`<=`".into(),
            Self::Eof          => "end of input".into(),
        }
    }
}

/// Classifies a scanned identifier: keyword, type name, constant, built-in
/// function name, or plain identifier.
pub fn keyword_or_ident(s: String) -> TokenKind {
    match s.as_str() {
        "read"    => TokenKind::Read,
        "as"      => TokenKind::As,
        "and"     => TokenKind::And,
        "or"      => TokenKind::Or,
        "not"     => TokenKind::Not,
        "Number"  => TokenKind::Type(ValueType::Number),
        "String"  => TokenKind::Type(ValueType::String),
        "Boolean" => TokenKind::Type(ValueType::Boolean),
        "true"    => TokenKind::Bool(true),
        "false"   => TokenKind::Bool(false),
        "_pi"     => TokenKind::Number(std::f64::consts::PI),
        "_e"      => TokenKind::Number(std::f64::consts::E),
        _ if builtins::is_builtin(&s) => TokenKind::Func(s),
        _         => TokenKind::Ident(s),
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based character column of the token's first character.
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, column: usize) -> Self {
        Self { kind, column }
    }
}
