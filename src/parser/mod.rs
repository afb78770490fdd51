//! Recursive-descent parser over the lexer's token stream.
//!
//! Hand-encoded operator-precedence parsing for expressions (see
//! `expression.rs`); clause parsing is straight recursive descent, one
//! function per clause kind, mirroring the clause grammar in spec.md §4.2.
//! On the first syntax error the parser stops and returns it — no recovery,
//! no partial AST is handed back.

pub mod ast;
mod clauses;
pub mod errors;
mod expression;
mod pattern;

use crate::lexer::{Lexer, Token, TokenKind};
pub use ast::*;
pub use errors::SyntaxError;

pub type ParseResult<T> = Result<T, SyntaxError>;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(src: &str) -> Self {
        let tokens = Lexer::new(src).tokenize();
        Parser { tokens, pos: 0 }
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    pub(crate) fn peek_n(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub(crate) fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, expected_desc: &str) -> ParseResult<Token> {
        if self.check(&kind) {
            Ok(self.bump())
        } else {
            Err(self.error(expected_desc))
        }
    }

    pub(crate) fn error(&self, expected: &str) -> SyntaxError {
        let tok = self.peek();
        SyntaxError {
            line: tok.line,
            column: tok.column,
            found: format!("{:?}", tok.kind),
            expected: expected.to_string(),
        }
    }

    /// Consume an identifier token (a plain identifier, or a keyword that
    /// spec.md requires to still be usable as a variable/alias/property
    /// name — e.g. `end`).
    pub(crate) fn expect_name(&mut self, expected_desc: &str) -> ParseResult<String> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(s) => {
                self.bump();
                Ok(s)
            }
            other => {
                if let Some(s) = keyword_as_name(&other) {
                    self.bump();
                    Ok(s)
                } else {
                    Err(self.error(expected_desc))
                }
            }
        }
    }

    /// True if the current token can be consumed by `expect_name` — either a
    /// plain identifier or one of the keywords spec.md requires to remain
    /// usable in variable/alias/property position (e.g. `end`).
    pub(crate) fn check_name(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Identifier(_)) || keyword_as_name(self.peek_kind()).is_some()
    }

    /// Cursor position, for re-deriving the source slice an expression
    /// spanned (`text_since`).
    pub(crate) fn mark(&self) -> usize {
        self.pos
    }

    /// Re-join the lexemes consumed since `start` with single spaces. Used
    /// to reconstruct the default column name for a RETURN/WITH item with no
    /// `AS` alias (spec.md's RETURN-lowering note: it must match the user's
    /// original spelling, not a generic render of the AST).
    pub(crate) fn text_since(&self, start: usize) -> String {
        self.tokens[start..self.pos].iter().map(|t| t.lexeme.as_str()).collect::<Vec<_>>().join(" ")
    }
}

/// Keywords that are also accepted in identifier position (variable name,
/// alias, property key, label name). This is the mechanism behind spec.md
/// §4.2's `end`-as-a-variable-name regression test: `END` closes a CASE but
/// is accepted here whenever the parser calls `expect_name` instead of
/// matching `TokenKind::End` directly.
pub(crate) fn keyword_as_name(kind: &TokenKind) -> Option<String> {
    let s = match kind {
        TokenKind::Match => "match",
        TokenKind::Optional => "optional",
        TokenKind::Create => "create",
        TokenKind::Merge => "merge",
        TokenKind::With => "with",
        TokenKind::Unwind => "unwind",
        TokenKind::Where => "where",
        TokenKind::Return => "return",
        TokenKind::Order => "order",
        TokenKind::By => "by",
        TokenKind::Skip => "skip",
        TokenKind::Limit => "limit",
        TokenKind::Distinct => "distinct",
        TokenKind::Union => "union",
        TokenKind::All => "all",
        TokenKind::Case => "case",
        TokenKind::When => "when",
        TokenKind::Then => "then",
        TokenKind::Else => "else",
        TokenKind::End => "end",
        TokenKind::Starts => "starts",
        TokenKind::Ends => "ends",
        TokenKind::Contains => "contains",
        TokenKind::Detach => "detach",
        TokenKind::Asc => "asc",
        TokenKind::Desc => "desc",
        TokenKind::As => "as",
        TokenKind::Set => "set",
        TokenKind::Remove => "remove",
        TokenKind::Delete => "delete",
        TokenKind::Foreach => "foreach",
        TokenKind::Call => "call",
        TokenKind::Yield => "yield",
        TokenKind::Use => "use",
        TokenKind::Count => "count",
        TokenKind::Exists => "exists",
        _ => return None,
    };
    Some(s.to_string())
}

/// Parse a full Cypher statement: a query plus any `UNION [ALL]` joins.
pub fn parse_query(src: &str) -> ParseResult<Query> {
    let mut p = Parser::new(src);
    let parts = clauses::parse_query_parts(&mut p)?;
    let mut unions = Vec::new();
    while p.eat(&TokenKind::Union) {
        let all = p.eat(&TokenKind::All);
        let union_parts = clauses::parse_query_parts(&mut p)?;
        unions.push(UnionPart { all, parts: union_parts });
    }
    p.eat(&TokenKind::Semicolon);
    if !p.at_eof() {
        return Err(p.error("end of query"));
    }
    Ok(Query { parts, unions })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_match_return() {
        let q = parse_query("MATCH (p:Person) WHERE p.age > 28 RETURN p.name AS n ORDER BY n").unwrap();
        let part = &q.parts[0];
        assert_eq!(part.reading_clauses.len(), 1);
        assert!(part.return_clause.is_some());
        let ret = part.return_clause.as_ref().unwrap();
        assert_eq!(ret.items.len(), 1);
        assert_eq!(ret.items[0].alias.as_deref(), Some("n"));
        assert!(ret.order_by.is_some());
    }

    #[test]
    fn end_usable_as_variable_name() {
        let q = parse_query("MATCH (end:Node) RETURN end").unwrap();
        let ret = q.parts[0].return_clause.as_ref().unwrap();
        assert_eq!(ret.items[0].expr, Expr::Variable("end".to_string()));
    }

    #[test]
    fn syntax_error_reports_position() {
        let err = parse_query("MATCH (n:Person RETURN n").unwrap_err();
        assert_eq!(err.found, "Return");
    }

    #[test]
    fn union_all_preserves_duplicates_marker() {
        let q = parse_query("MATCH (n) RETURN n UNION ALL MATCH (m) RETURN m").unwrap();
        assert_eq!(q.unions.len(), 1);
        assert!(q.unions[0].all);
    }
}
