use crate::error::ExecutionError;
use crate::runtime::value::{Value, ValueType};
use crate::syntax::ast::{BinOp, Node, UnOp};
use crate::syntax::token::{Token, TokenKind};

/// Recursive-descent parser with one entry point per block kind. Every entry
/// point consumes the whole token stream; leftover tokens are an error.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    // ─── Block grammars ──────────────────────────────────────────────────────

    /// `read a as Number, b as String`
    pub fn parse_input_block(mut self) -> Result<Node, ExecutionError> {
        self.expect_keyword(TokenKind::Read, "read")?;
        let mut nodes = Vec::new();
        loop {
            let name = self.expect_ident()?;
            self.expect_keyword(TokenKind::As, "as")?;
            let ty = self.expect_type()?;
            nodes.push(Node::SetVar {
                name: name.clone(),
                value: Box::new(Node::Read { name, ty }),
                is_declaration: true,
            });
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.finish(Node::Compound(nodes))
    }

    pub fn parse_output_block(mut self) -> Result<Node, ExecutionError> {
        let expr = self.parse_expr()?;
        self.finish(Node::Write(Box::new(expr)))
    }

    /// The condition is evaluated for its value only; nothing is written.
    pub fn parse_cond_block(mut self) -> Result<Node, ExecutionError> {
        let expr = self.parse_expr()?;
        self.finish(expr)
    }

    /// `a = 1, b = a * 2`, every name declared.
    pub fn parse_init_block(mut self) -> Result<Node, ExecutionError> {
        let node = self.parse_assignments(true)?;
        self.finish(node)
    }

    /// Same grammar as init, assigning to names that already exist.
    pub fn parse_calc_block(mut self) -> Result<Node, ExecutionError> {
        let node = self.parse_assignments(false)?;
        self.finish(node)
    }

    fn parse_assignments(&mut self, is_declaration: bool) -> Result<Node, ExecutionError> {
        let mut nodes = Vec::new();
        loop {
            let name = self.expect_ident()?;
            self.expect_sym(TokenKind::Eq, "=")?;
            let value = self.parse_expr()?;
            nodes.push(Node::SetVar { name, value: Box::new(value), is_declaration });
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok(Node::Compound(nodes))
    }

    fn finish(&self, node: Node) -> Result<Node, ExecutionError> {
        if self.check(&TokenKind::Eof) {
            Ok(node)
        } else {
            let tok = self.peek();
            Err(ExecutionError::syntax("error.msg.unexpected_token")
                .with("tok_type", tok.kind.describe())
                .with("column", tok.column))
        }
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    pub fn parse_expr(&mut self) -> Result<Node, ExecutionError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Node, ExecutionError> {
        let mut left = self.parse_and()?;
        while self.matches(TokenKind::Or) {
            let right = self.parse_and()?;
            left = Node::binary(left, BinOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Node, ExecutionError> {
        let mut left = self.parse_not()?;
        while self.matches(TokenKind::And) {
            let right = self.parse_not()?;
            left = Node::binary(left, BinOp::And, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Node, ExecutionError> {
        if self.matches(TokenKind::Not) {
            let operand = self.parse_not()?;
            return Ok(Node::unary(UnOp::Not, operand));
        }
        self.parse_relational()
    }

    fn parse_relational(&mut self) -> Result<Node, ExecutionError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq   => BinOp::Eq,
                TokenKind::BangEq => BinOp::Ne,
                TokenKind::Gt     => BinOp::Gt,
                TokenKind::Lt     => BinOp::Lt,
                TokenKind::GtEq   => BinOp::Ge,
                TokenKind::LtEq   => BinOp::Le,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Node::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Node, ExecutionError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus  => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Node::binary(left, op, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, ExecutionError> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star    => BinOp::Mul,
                TokenKind::Slash   => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_power()?;
            left = Node::binary(left, op, right);
        }
        Ok(left)
    }

    /// Left-folding like every other level: `2 ^ 3 ^ 2` is `(2 ^ 3) ^ 2`.
    fn parse_power(&mut self) -> Result<Node, ExecutionError> {
        let mut left = self.parse_cast()?;
        while self.matches(TokenKind::Caret) {
            let right = self.parse_cast()?;
            left = Node::binary(left, BinOp::Pow, right);
        }
        Ok(left)
    }

    fn parse_cast(&mut self) -> Result<Node, ExecutionError> {
        let mut expr = self.parse_primary()?;
        while self.matches(TokenKind::As) {
            let ty = self.expect_type()?;
            expr = Node::Cast { expr: Box::new(expr), ty };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Node, ExecutionError> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Number(n)    => Ok(Node::number(n)),
            TokenKind::Bool(b)      => Ok(Node::Value(Value::Boolean(b))),
            TokenKind::Str(s)       => Ok(Node::Value(Value::String(s))),
            TokenKind::FormatStr(s) => Ok(Node::FormatString(s)),

            // Unary signs bind to the primary directly: `-2 ^ 2` is `(-2) ^ 2`.
            TokenKind::Minus => Ok(Node::unary(UnOp::Neg, self.parse_primary()?)),
            TokenKind::Plus  => Ok(Node::unary(UnOp::Pos, self.parse_primary()?)),

            TokenKind::LParen => {
                let expr = self.parse_expr()?;
                self.expect_sym(TokenKind::RParen, ")")?;
                Ok(expr)
            }

            TokenKind::Func(name) => {
                self.expect_sym(TokenKind::LParen, "(")?;
                self.parse_call(name)
            }

            // An unknown name followed by `(` is still a call; it fails at
            // evaluation with `unknown_func`.
            TokenKind::Ident(name) => {
                if self.matches(TokenKind::LParen) {
                    self.parse_call(name)
                } else {
                    Ok(Node::GetVar(name))
                }
            }

            _ => Err(ExecutionError::syntax("error.msg.expected_value")
                .with("tok_type", tok.kind.describe())
                .with("column", tok.column)),
        }
    }

    /// Arguments after the opening `(`.
    fn parse_call(&mut self, name: String) -> Result<Node, ExecutionError> {
        let mut args = Vec::new();
        if !self.matches(TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.matches(TokenKind::Comma) { break; }
            }
            self.expect_sym(TokenKind::RParen, ")")?;
        }
        Ok(Node::Call { name, args })
    }

    // ─── Helpers ─────────────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(&kind) { self.advance(); true } else { false }
    }

    fn expect_sym(&mut self, kind: TokenKind, sym: &str) -> Result<(), ExecutionError> {
        if self.matches(kind) { return Ok(()); }
        Err(self.error_here("error.msg.expected_sym").with("string", sym))
    }

    fn expect_keyword(&mut self, kind: TokenKind, keyword: &str) -> Result<(), ExecutionError> {
        if self.matches(kind) { return Ok(()); }
        Err(self.error_here("error.msg.expected_keyword").with("keyword", keyword))
    }

    fn expect_ident(&mut self) -> Result<String, ExecutionError> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            return Ok(name);
        }
        Err(self.error_here("error.msg.expected_ident"))
    }

    fn expect_type(&mut self) -> Result<ValueType, ExecutionError> {
        if let TokenKind::Type(ty) = self.peek().kind {
            self.advance();
            return Ok(ty);
        }
        Err(self.error_here("error.msg.expected_type"))
    }

    fn error_here(&self, msg: &'static str) -> ExecutionError {
        let tok = self.peek();
        ExecutionError::syntax(msg)
            .with("tok_type", tok.kind.describe())
            .with("column", tok.column)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
