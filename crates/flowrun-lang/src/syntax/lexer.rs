use crate::error::ExecutionError;
use crate::syntax::token::{FmtSegment, Token, TokenKind, keyword_or_ident};

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self { source: source.chars().collect(), pos: 0 }
    }

    /// Tokenize the whole source. The first error aborts the pass; the
    /// returned list always ends with `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, ExecutionError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.column()));
                break;
            }

            tokens.push(self.next_token()?);
        }

        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, ExecutionError> {
        let col = self.column();
        let ch = self.advance();

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,

            '=' => {
                if self.peek() == '=' { self.advance(); TokenKind::EqEq }
                else { TokenKind::Eq }
            }
            '>' => {
                if self.peek() == '=' { self.advance(); TokenKind::GtEq }
                else { TokenKind::Gt }
            }
            '<' => {
                if self.peek() == '=' { self.advance(); TokenKind::LtEq }
                else { TokenKind::Lt }
            }
            '!' => {
                if self.peek() == '=' { self.advance(); TokenKind::BangEq }
                else {
                    let found = if self.is_at_end() { ch } else { self.peek() };
                    return Err(unexpected_char(found, self.column()));
                }
            }

            '"' => self.read_string(col)?,
            '0'..='9' => TokenKind::Number(self.read_number(ch)?),
            'a'..='z' | 'A'..='Z' | '_' => keyword_or_ident(self.read_ident(ch)),

            other => return Err(unexpected_char(other, col)),
        };

        Ok(Token::new(kind, col))
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> char {
        let ch = self.source[self.pos];
        self.pos += 1;
        ch
    }

    fn peek(&self) -> char {
        if self.is_at_end() { '\0' } else { self.source[self.pos] }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn column(&self) -> usize {
        self.pos + 1
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    fn read_number(&mut self, first: char) -> Result<f64, ExecutionError> {
        let mut s = String::new();
        s.push(first);
        while self.peek().is_ascii_digit() {
            s.push(self.advance());
        }

        if self.peek() == '.' {
            s.push(self.advance());
            if !self.peek().is_ascii_digit() {
                return Err(ExecutionError::syntax("error.msg.invalid_num_literal")
                    .with("literal", &s)
                    .with("column", self.column()));
            }
            while self.peek().is_ascii_digit() {
                s.push(self.advance());
            }
        }

        if is_ident_start(self.peek()) {
            return Err(ExecutionError::syntax("error.msg.ident_after_num")
                .with("column", self.column()));
        }

        s.parse().map_err(|_| {
            ExecutionError::syntax("error.msg.invalid_num_literal")
                .with("literal", &s)
                .with("column", self.column())
        })
    }

    fn read_ident(&mut self, first: char) -> String {
        let mut s = String::new();
        s.push(first);
        while is_ident_char(self.peek()) {
            s.push(self.advance());
        }
        s
    }

    /// Reads a double-quoted string. `$name` starts an interpolation, `$$` and
    /// `$"` escape a literal `$` or `"`. A `$` followed by anything else is
    /// kept as-is.
    fn read_string(&mut self, start_col: usize) -> Result<TokenKind, ExecutionError> {
        let mut segments = Vec::new();
        let mut text = String::new();

        loop {
            if self.is_at_end() {
                return Err(ExecutionError::syntax("error.msg.open_string")
                    .with("column", start_col));
            }
            let ch = self.advance();
            match ch {
                '"' => break,
                '$' => match self.peek() {
                    '$' | '"' => text.push(self.advance()),
                    c if is_ident_start(c) => {
                        let first = self.advance();
                        let name = self.read_ident(first);
                        segments.push(FmtSegment::Text(std::mem::take(&mut text)));
                        segments.push(FmtSegment::Var(name));
                    }
                    _ => text.push('$'),
                },
                _ => text.push(ch),
            }
        }

        if segments.is_empty() {
            Ok(TokenKind::Str(text))
        } else {
            segments.push(FmtSegment::Text(text));
            segments.retain(|s| !matches!(s, FmtSegment::Text(t) if t.is_empty()));
            Ok(TokenKind::FormatStr(segments))
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn unexpected_char(ch: char, column: usize) -> ExecutionError {
    ExecutionError::syntax("error.msg.unexpected_char")
        .with("char", ch)
        .with("column", column)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::value::ValueType;

    fn lex(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn lex_err(src: &str) -> ExecutionError {
        Lexer::new(src).tokenize().unwrap_err()
    }

    #[test]
    fn empty() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
        assert_eq!(lex("   \t "), vec![TokenKind::Eof]);
    }

    #[test]
    fn integer_literal() {
        assert_eq!(lex("42"), vec![TokenKind::Number(42.0), TokenKind::Eof]);
    }

    #[test]
    fn float_literal() {
        assert_eq!(lex("3.25"), vec![TokenKind::Number(3.25), TokenKind::Eof]);
    }

    #[test]
    fn trailing_dot_is_error() {
        let err = lex_err("3.");
        assert_eq!(err.msg, "error.msg.invalid_num_literal");
        let err = lex_err("3.x");
        assert_eq!(err.msg, "error.msg.invalid_num_literal");
    }

    #[test]
    fn ident_after_number_is_error() {
        let err = lex_err("12abc");
        assert_eq!(err.msg, "error.msg.ident_after_num");
        assert_eq!(lex_err("1_").msg, "error.msg.ident_after_num");
        assert_eq!(lex_err("1.5e").msg, "error.msg.ident_after_num");
    }

    #[test]
    fn keywords() {
        assert_eq!(lex("read"), vec![TokenKind::Read, TokenKind::Eof]);
        assert_eq!(lex("as"),   vec![TokenKind::As,   TokenKind::Eof]);
        assert_eq!(lex("and"),  vec![TokenKind::And,  TokenKind::Eof]);
        assert_eq!(lex("or"),   vec![TokenKind::Or,   TokenKind::Eof]);
        assert_eq!(lex("not"),  vec![TokenKind::Not,  TokenKind::Eof]);
    }

    #[test]
    fn type_names() {
        assert_eq!(lex("Number"),  vec![TokenKind::Type(ValueType::Number),  TokenKind::Eof]);
        assert_eq!(lex("String"),  vec![TokenKind::Type(ValueType::String),  TokenKind::Eof]);
        assert_eq!(lex("Boolean"), vec![TokenKind::Type(ValueType::Boolean), TokenKind::Eof]);
        // type names are case sensitive
        assert_eq!(lex("number"), vec![TokenKind::Ident("number".into()), TokenKind::Eof]);
    }

    #[test]
    fn constants_resolve_to_literals() {
        assert_eq!(lex("true"),  vec![TokenKind::Bool(true),  TokenKind::Eof]);
        assert_eq!(lex("false"), vec![TokenKind::Bool(false), TokenKind::Eof]);
        assert_eq!(lex("_pi"), vec![TokenKind::Number(std::f64::consts::PI), TokenKind::Eof]);
        assert_eq!(lex("_e"),  vec![TokenKind::Number(std::f64::consts::E),  TokenKind::Eof]);
    }

    #[test]
    fn builtin_names_are_functions() {
        assert_eq!(lex("sqrt"), vec![TokenKind::Func("sqrt".into()), TokenKind::Eof]);
        assert_eq!(lex("sqrt_x"), vec![TokenKind::Ident("sqrt_x".into()), TokenKind::Eof]);
    }

    #[test]
    fn operators() {
        assert_eq!(
            lex("+ - * / % ^ ( ) , ="),
            vec![
                TokenKind::Plus, TokenKind::Minus, TokenKind::Star, TokenKind::Slash,
                TokenKind::Percent, TokenKind::Caret, TokenKind::LParen, TokenKind::RParen,
                TokenKind::Comma, TokenKind::Eq, TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(lex("=="), vec![TokenKind::EqEq,   TokenKind::Eof]);
        assert_eq!(lex("!="), vec![TokenKind::BangEq, TokenKind::Eof]);
        assert_eq!(lex("<="), vec![TokenKind::LtEq,   TokenKind::Eof]);
        assert_eq!(lex(">="), vec![TokenKind::GtEq,   TokenKind::Eof]);
        assert_eq!(lex("< >"), vec![TokenKind::Lt, TokenKind::Gt, TokenKind::Eof]);
    }

    #[test]
    fn bare_bang_error() {
        let err = lex_err("!x");
        assert_eq!(err.msg, "error.msg.unexpected_char");
        assert_eq!(err.arg("char"), Some("x"));
    }

    #[test]
    fn unknown_character_error() {
        let err = lex_err("x = 1 # 2");
        assert_eq!(err.msg, "error.msg.unexpected_char");
        assert_eq!(err.arg("char"), Some("#"));
        assert_eq!(err.arg("column"), Some("7"));
    }

    #[test]
    fn string_literal() {
        assert_eq!(lex(r#""hello""#), vec![TokenKind::Str("hello".into()), TokenKind::Eof]);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(lex(r#""a$$b""#), vec![TokenKind::Str("a$b".into()), TokenKind::Eof]);
        assert_eq!(lex(r#""say $"hi$"""#), vec![TokenKind::Str("say \"hi\"".into()), TokenKind::Eof]);
        assert_eq!(lex(r#""cost: $ 5""#), vec![TokenKind::Str("cost: $ 5".into()), TokenKind::Eof]);
    }

    #[test]
    fn format_string() {
        assert_eq!(
            lex(r#""The volume is $vol!""#),
            vec![
                TokenKind::FormatStr(vec![
                    FmtSegment::Text("The volume is ".into()),
                    FmtSegment::Var("vol".into()),
                    FmtSegment::Text("!".into()),
                ]),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn format_string_adjacent_vars() {
        assert_eq!(
            lex(r#""$a$b""#),
            vec![
                TokenKind::FormatStr(vec![FmtSegment::Var("a".into()), FmtSegment::Var("b".into())]),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_error() {
        let err = lex_err(r#"x = "oops"#);
        assert_eq!(err.msg, "error.msg.open_string");
        assert_eq!(err.arg("column"), Some("5"));
    }

    #[test]
    fn first_error_wins() {
        let err = lex_err("3. + !");
        assert_eq!(err.msg, "error.msg.invalid_num_literal");
    }

    #[test]
    fn column_tracking() {
        let tokens = Lexer::new("ab = 1").tokenize().unwrap();
        let cols: Vec<usize> = tokens.iter().map(|t| t.column).collect();
        assert_eq!(cols, vec![1, 4, 6, 7]);
    }

    #[test]
    fn read_statement() {
        assert_eq!(
            lex("read side as Number"),
            vec![
                TokenKind::Read,
                TokenKind::Ident("side".into()),
                TokenKind::As,
                TokenKind::Type(ValueType::Number),
                TokenKind::Eof,
            ]
        );
    }
}
