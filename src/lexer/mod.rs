//! Byte-stream lexer for the openCypher dialect this crate accepts.
//!
//! Single-pass, one-token-lookahead scanner. UTF-8-safe: non-ASCII bytes are
//! only meaningful inside string literals and identifiers, so the scanner
//! walks `char`s there and bytes everywhere else.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Match,
    Optional,
    Create,
    Merge,
    With,
    Unwind,
    Where,
    Return,
    Order,
    By,
    Skip,
    Limit,
    Distinct,
    Union,
    All,
    Case,
    When,
    Then,
    Else,
    End,
    Starts,
    Ends,
    Contains,
    In,
    Is,
    Null,
    And,
    Or,
    Xor,
    Not,
    Detach,
    Asc,
    Desc,
    As,
    ShortestPath,
    AllShortestPaths,
    Set,
    Remove,
    Delete,
    Foreach,
    Call,
    Yield,
    Use,
    Count,
    Exists,

    // Identifiers / literals
    Identifier(String),
    StringLiteral(String),
    Integer(i64),
    Float(f64),

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Dot,
    DotDot,
    Comma,
    Colon,
    Semicolon,
    Pipe,
    Dollar,
    Ampersand,

    // Arrows
    ArrowRight, // ->
    ArrowLeft,  // <-
    ArrowBoth,  // <->
    Dash,       // -

    // Operators
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
    Plus,
    Minus, // disambiguated from Dash only by parser context; kept distinct token not needed
    Star,
    Slash,
    Percent,
    Caret,
    RegexMatch, // =~
    PlusEq,     // +=
    Bang,

    Eof,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?} at {}:{}", self.kind, self.lexeme, self.line, self.column)
    }
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    pub first_error: Option<(u32, u32, String)>,
}

fn keyword(word: &str) -> Option<TokenKind> {
    // Case-insensitive perfect map over the fixed Cypher keyword set.
    Some(match word.to_ascii_uppercase().as_str() {
        "MATCH" => TokenKind::Match,
        "OPTIONAL" => TokenKind::Optional,
        "CREATE" => TokenKind::Create,
        "MERGE" => TokenKind::Merge,
        "WITH" => TokenKind::With,
        "UNWIND" => TokenKind::Unwind,
        "WHERE" => TokenKind::Where,
        "RETURN" => TokenKind::Return,
        "ORDER" => TokenKind::Order,
        "BY" => TokenKind::By,
        "SKIP" => TokenKind::Skip,
        "LIMIT" => TokenKind::Limit,
        "DISTINCT" => TokenKind::Distinct,
        "UNION" => TokenKind::Union,
        "ALL" => TokenKind::All,
        "CASE" => TokenKind::Case,
        "WHEN" => TokenKind::When,
        "THEN" => TokenKind::Then,
        "ELSE" => TokenKind::Else,
        "END" => TokenKind::End,
        "STARTS" => TokenKind::Starts,
        "ENDS" => TokenKind::Ends,
        "CONTAINS" => TokenKind::Contains,
        "IN" => TokenKind::In,
        "IS" => TokenKind::Is,
        "NULL" => TokenKind::Null,
        "AND" => TokenKind::And,
        "OR" => TokenKind::Or,
        "XOR" => TokenKind::Xor,
        "NOT" => TokenKind::Not,
        "DETACH" => TokenKind::Detach,
        "ASC" | "ASCENDING" => TokenKind::Asc,
        "DESC" | "DESCENDING" => TokenKind::Desc,
        "AS" => TokenKind::As,
        "SHORTESTPATH" => TokenKind::ShortestPath,
        "ALLSHORTESTPATHS" => TokenKind::AllShortestPaths,
        "SET" => TokenKind::Set,
        "REMOVE" => TokenKind::Remove,
        "DELETE" => TokenKind::Delete,
        "FOREACH" => TokenKind::Foreach,
        "CALL" => TokenKind::Call,
        "YIELD" => TokenKind::Yield,
        "USE" => TokenKind::Use,
        "COUNT" => TokenKind::Count,
        "EXISTS" => TokenKind::Exists,
        _ => return None,
    })
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            first_error: None,
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn record_error(&mut self, line: u32, column: u32, msg: impl Into<String>) {
        if self.first_error.is_none() {
            self.first_error = Some((line, column, msg.into()));
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek_byte() {
                        if b == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek_byte() {
                            None => break,
                            Some(b'*') if self.peek_at(1) == Some(b'/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            _ => {
                                self.advance();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Produce the next token. Once a lexical error has been seen, keeps
    /// emitting `TokenKind::Error` tokens for the remainder of the input so
    /// the parser can still report a useful position, per spec.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        let (line, column) = (self.line, self.column);

        let Some(b) = self.peek_byte() else {
            return Token { kind: TokenKind::Eof, lexeme: String::new(), line, column };
        };

        if b.is_ascii_digit() {
            return self.lex_number(line, column);
        }
        if b == b'.' && self.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false) {
            return self.lex_number(line, column);
        }
        if b == b'\'' || b == b'"' {
            return self.lex_string(b, line, column);
        }
        if b == b'`' {
            return self.lex_backtick_identifier(line, column);
        }
        if is_ident_start(b) || b >= 0x80 {
            return self.lex_identifier_or_keyword(line, column);
        }

        self.lex_punctuation(line, column)
    }

    fn lex_number(&mut self, line: u32, column: u32) -> Token {
        let start = self.pos;

        // Special forms: Inf, Infinity, NaN (case-insensitive) are handled by
        // lex_identifier_or_keyword's caller only for alphabetic starts; here
        // we only handle digit/`.`-led numbers.
        if self.peek_byte() == Some(b'0') {
            match self.peek_at(1) {
                Some(b'x') | Some(b'X') => return self.lex_radix(start, line, column, 16, |c| c.is_ascii_hexdigit()),
                Some(b'o') | Some(b'O') => return self.lex_radix(start, line, column, 8, |c| (b'0'..=b'7').contains(&c)),
                Some(b'b') | Some(b'B') => return self.lex_radix(start, line, column, 2, |c| c == b'0' || c == b'1'),
                _ => {}
            }
        }

        let mut is_float = false;
        while self.peek_byte().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            self.advance();
        }
        if self.peek_byte() == Some(b'.') && self.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false) {
            is_float = true;
            self.advance();
            while self.peek_byte().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                self.advance();
            }
        }
        if matches!(self.peek_byte(), Some(b'e') | Some(b'E')) {
            let save = self.pos;
            let mut probe = self.pos + 1;
            if matches!(self.src.get(probe), Some(b'+') | Some(b'-')) {
                probe += 1;
            }
            if self.src.get(probe).map(|c| c.is_ascii_digit()).unwrap_or(false) {
                is_float = true;
                while self.pos < probe {
                    self.advance();
                }
                while self.peek_byte().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                    self.advance();
                }
            } else {
                let _ = save;
            }
        }

        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap().to_string();
        if is_float {
            match text.parse::<f64>() {
                Ok(v) => Token { kind: TokenKind::Float(v), lexeme: text, line, column },
                Err(_) => self.error_token(line, column, "malformed float literal"),
            }
        } else {
            match text.parse::<i64>() {
                Ok(v) => Token { kind: TokenKind::Integer(v), lexeme: text, line, column },
                Err(_) => self.error_token(line, column, "integer literal overflow"),
            }
        }
    }

    fn lex_radix(
        &mut self,
        start: usize,
        line: u32,
        column: u32,
        radix: u32,
        digit_ok: impl Fn(u8) -> bool,
    ) -> Token {
        self.advance(); // '0'
        self.advance(); // x/o/b
        let digits_start = self.pos;
        while self.peek_byte().map(|c| digit_ok(c)).unwrap_or(false) {
            self.advance();
        }
        if self.pos == digits_start {
            return self.error_token(line, column, "malformed numeric literal");
        }
        let digits = std::str::from_utf8(&self.src[digits_start..self.pos]).unwrap();
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap().to_string();
        match i64::from_str_radix(digits, radix) {
            Ok(v) => Token { kind: TokenKind::Integer(v), lexeme: text, line, column },
            Err(_) => self.error_token(line, column, "integer literal overflow"),
        }
    }

    fn lex_string(&mut self, quote: u8, line: u32, column: u32) -> Token {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek_byte() {
                None => {
                    self.record_error(line, column, "unterminated string literal");
                    return Token { kind: TokenKind::Error("unterminated string literal".into()), lexeme: value, line, column };
                }
                Some(b) if b == quote => {
                    self.advance();
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    match self.advance() {
                        Some(b'n') => value.push('\n'),
                        Some(b't') => value.push('\t'),
                        Some(b'r') => value.push('\r'),
                        Some(b'\\') => value.push('\\'),
                        Some(b'\'') => value.push('\''),
                        Some(b'"') => value.push('"'),
                        Some(b'b') => value.push('\u{8}'),
                        Some(b'f') => value.push('\u{c}'),
                        Some(b'u') => {
                            if self.peek_byte() == Some(b'{') {
                                self.advance();
                                let hex_start = self.pos;
                                while self.peek_byte().map(|c| c != b'}').unwrap_or(false) {
                                    self.advance();
                                }
                                let hex = std::str::from_utf8(&self.src[hex_start..self.pos]).unwrap_or("");
                                if self.peek_byte() == Some(b'}') {
                                    self.advance();
                                }
                                match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                                    Some(c) => value.push(c),
                                    None => {
                                        self.record_error(line, column, "invalid unicode escape");
                                        return Token { kind: TokenKind::Error("invalid unicode escape".into()), lexeme: value, line, column };
                                    }
                                }
                            }
                        }
                        Some(other) => value.push(other as char),
                        None => {
                            self.record_error(line, column, "unterminated string literal");
                            return Token { kind: TokenKind::Error("unterminated string literal".into()), lexeme: value, line, column };
                        }
                    }
                }
                Some(_) => {
                    // Walk a full UTF-8 char so multi-byte sequences survive intact.
                    let remaining = std::str::from_utf8(&self.src[self.pos..]).unwrap_or("");
                    if let Some(c) = remaining.chars().next() {
                        value.push(c);
                        for _ in 0..c.len_utf8() {
                            self.advance();
                        }
                    } else {
                        self.advance();
                    }
                }
            }
        }
        Token { kind: TokenKind::StringLiteral(value.clone()), lexeme: value, line, column }
    }

    fn lex_backtick_identifier(&mut self, line: u32, column: u32) -> Token {
        self.advance(); // opening backtick
        let start = self.pos;
        while self.peek_byte().map(|c| c != b'`').unwrap_or(false) {
            self.advance();
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("").to_string();
        if self.peek_byte() == Some(b'`') {
            self.advance();
            Token { kind: TokenKind::Identifier(text.clone()), lexeme: text, line, column }
        } else {
            self.record_error(line, column, "unterminated backtick identifier");
            Token { kind: TokenKind::Error("unterminated backtick identifier".into()), lexeme: text, line, column }
        }
    }

    fn lex_identifier_or_keyword(&mut self, line: u32, column: u32) -> Token {
        let start = self.pos;
        loop {
            match self.peek_byte() {
                Some(b) if is_ident_continue(b) => {
                    self.advance();
                }
                Some(b) if b >= 0x80 => {
                    let remaining = std::str::from_utf8(&self.src[self.pos..]).unwrap_or("");
                    if let Some(c) = remaining.chars().next() {
                        for _ in 0..c.len_utf8() {
                            self.advance();
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap().to_string();

        // Inf/Infinity/NaN are numeric literals, not identifiers, per spec.
        match text.to_ascii_lowercase().as_str() {
            "inf" | "infinity" => return Token { kind: TokenKind::Float(f64::INFINITY), lexeme: text, line, column },
            "nan" => return Token { kind: TokenKind::Float(f64::NAN), lexeme: text, line, column },
            _ => {}
        }

        if let Some(kind) = keyword(&text) {
            Token { kind, lexeme: text, line, column }
        } else {
            Token { kind: TokenKind::Identifier(text.clone()), lexeme: text, line, column }
        }
    }

    fn lex_punctuation(&mut self, line: u32, column: u32) -> Token {
        let b = self.advance().unwrap();
        let one = |k: TokenKind, lex: &str| Token { kind: k, lexeme: lex.to_string(), line, column };
        match b {
            b'(' => one(TokenKind::LParen, "("),
            b')' => one(TokenKind::RParen, ")"),
            b'{' => one(TokenKind::LBrace, "{"),
            b'}' => one(TokenKind::RBrace, "}"),
            b'[' => one(TokenKind::LBracket, "["),
            b']' => one(TokenKind::RBracket, "]"),
            b',' => one(TokenKind::Comma, ","),
            b':' => one(TokenKind::Colon, ":"),
            b';' => one(TokenKind::Semicolon, ";"),
            b'|' => one(TokenKind::Pipe, "|"),
            b'$' => one(TokenKind::Dollar, "$"),
            b'&' => one(TokenKind::Ampersand, "&"),
            b'^' => one(TokenKind::Caret, "^"),
            b'%' => one(TokenKind::Percent, "%"),
            b'*' => one(TokenKind::Star, "*"),
            b'/' => one(TokenKind::Slash, "/"),
            b'!' => one(TokenKind::Bang, "!"),
            b'.' => {
                if self.peek_byte() == Some(b'.') {
                    self.advance();
                    one(TokenKind::DotDot, "..")
                } else {
                    one(TokenKind::Dot, ".")
                }
            }
            b'+' => {
                if self.peek_byte() == Some(b'=') {
                    self.advance();
                    one(TokenKind::PlusEq, "+=")
                } else {
                    one(TokenKind::Plus, "+")
                }
            }
            b'=' => {
                if self.peek_byte() == Some(b'~') {
                    self.advance();
                    one(TokenKind::RegexMatch, "=~")
                } else {
                    one(TokenKind::Eq, "=")
                }
            }
            b'<' => {
                if self.peek_byte() == Some(b'-') {
                    self.advance();
                    if self.peek_byte() == Some(b'>') {
                        self.advance();
                        one(TokenKind::ArrowBoth, "<->")
                    } else {
                        one(TokenKind::ArrowLeft, "<-")
                    }
                } else if self.peek_byte() == Some(b'=') {
                    self.advance();
                    one(TokenKind::Le, "<=")
                } else if self.peek_byte() == Some(b'>') {
                    self.advance();
                    one(TokenKind::Neq, "<>")
                } else {
                    one(TokenKind::Lt, "<")
                }
            }
            b'>' => {
                if self.peek_byte() == Some(b'=') {
                    self.advance();
                    one(TokenKind::Ge, ">=")
                } else {
                    one(TokenKind::Gt, ">")
                }
            }
            b'-' => {
                if self.peek_byte() == Some(b'>') {
                    self.advance();
                    one(TokenKind::ArrowRight, "->")
                } else {
                    one(TokenKind::Dash, "-")
                }
            }
            _ => {
                let msg = format!("unknown character {:?}", b as char);
                self.record_error(line, column, msg.clone());
                Token { kind: TokenKind::Error(msg), lexeme: (b as char).to_string(), line, column }
            }
        }
    }

    fn error_token(&mut self, line: u32, column: u32, msg: &str) -> Token {
        self.record_error(line, column, msg);
        Token { kind: TokenKind::Error(msg.to_string()), lexeme: String::new(), line, column }
    }

    /// Tokenize the whole input, always terminating with an `Eof` token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
