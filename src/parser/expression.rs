//! Hand-encoded operator-precedence expression parsing.
//!
//! Precedence ladder (loose → tight), per spec.md §4.2:
//! OR, XOR, AND, NOT, comparison, STARTS/ENDS/CONTAINS/IN/=~,
//! IS NULL/IS NOT NULL, `+`/`-`, `*`/`/`/`%`, `^`, unary `-`/`+`, postfix
//! (property access, list index, list slice, function call, map
//! projection), atoms.

use super::ast::*;
use super::pattern::parse_path_pattern;
use super::{ParseResult, Parser};
use crate::lexer::TokenKind;

pub fn parse_expr(p: &mut Parser) -> ParseResult<Expr> {
    parse_or(p)
}

fn parse_or(p: &mut Parser) -> ParseResult<Expr> {
    let mut left = parse_xor(p)?;
    while p.eat(&TokenKind::Or) {
        let right = parse_xor(p)?;
        left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_xor(p: &mut Parser) -> ParseResult<Expr> {
    let mut left = parse_and(p)?;
    while p.eat(&TokenKind::Xor) {
        let right = parse_and(p)?;
        left = Expr::Binary(BinaryOp::Xor, Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_and(p: &mut Parser) -> ParseResult<Expr> {
    let mut left = parse_not(p)?;
    while p.eat(&TokenKind::And) {
        let right = parse_not(p)?;
        left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_not(p: &mut Parser) -> ParseResult<Expr> {
    if p.eat(&TokenKind::Not) {
        let operand = parse_not(p)?;
        return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)));
    }
    parse_comparison(p)
}

fn parse_comparison(p: &mut Parser) -> ParseResult<Expr> {
    let mut left = parse_starts_ends_in(p)?;
    loop {
        let op = match p.peek_kind() {
            TokenKind::Eq => BinaryOp::Eq,
            TokenKind::Neq => BinaryOp::Neq,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            _ => break,
        };
        p.bump();
        let right = parse_starts_ends_in(p)?;
        left = Expr::Binary(op, Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_starts_ends_in(p: &mut Parser) -> ParseResult<Expr> {
    let mut left = parse_is_null(p)?;
    loop {
        match p.peek_kind() {
            TokenKind::Starts => {
                p.bump();
                p.expect(TokenKind::With, "WITH")?;
                let right = parse_is_null(p)?;
                left = Expr::Binary(BinaryOp::StartsWith, Box::new(left), Box::new(right));
            }
            TokenKind::Ends => {
                p.bump();
                p.expect(TokenKind::With, "WITH")?;
                let right = parse_is_null(p)?;
                left = Expr::Binary(BinaryOp::EndsWith, Box::new(left), Box::new(right));
            }
            TokenKind::Contains => {
                p.bump();
                let right = parse_is_null(p)?;
                left = Expr::Binary(BinaryOp::Contains, Box::new(left), Box::new(right));
            }
            TokenKind::In => {
                p.bump();
                let right = parse_is_null(p)?;
                left = Expr::In(Box::new(left), Box::new(right));
            }
            TokenKind::RegexMatch => {
                p.bump();
                let right = parse_is_null(p)?;
                left = Expr::Binary(BinaryOp::RegexMatch, Box::new(left), Box::new(right));
            }
            _ => break,
        }
    }
    Ok(left)
}

fn parse_is_null(p: &mut Parser) -> ParseResult<Expr> {
    let mut left = parse_additive(p)?;
    loop {
        if p.check(&TokenKind::Is) {
            p.bump();
            let negated = p.eat(&TokenKind::Not);
            p.expect(TokenKind::Null, "NULL")?;
            left = if negated { Expr::IsNotNull(Box::new(left)) } else { Expr::IsNull(Box::new(left)) };
        } else {
            break;
        }
    }
    Ok(left)
}

fn parse_additive(p: &mut Parser) -> ParseResult<Expr> {
    let mut left = parse_multiplicative(p)?;
    loop {
        let op = match p.peek_kind() {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Dash => BinaryOp::Sub,
            _ => break,
        };
        p.bump();
        let right = parse_multiplicative(p)?;
        left = Expr::Binary(op, Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_multiplicative(p: &mut Parser) -> ParseResult<Expr> {
    let mut left = parse_power(p)?;
    loop {
        let op = match p.peek_kind() {
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            _ => break,
        };
        p.bump();
        let right = parse_power(p)?;
        left = Expr::Binary(op, Box::new(left), Box::new(right));
    }
    Ok(left)
}

fn parse_power(p: &mut Parser) -> ParseResult<Expr> {
    let left = parse_unary(p)?;
    if p.eat(&TokenKind::Caret) {
        // Right-associative.
        let right = parse_power(p)?;
        return Ok(Expr::Binary(BinaryOp::Pow, Box::new(left), Box::new(right)));
    }
    Ok(left)
}

fn parse_unary(p: &mut Parser) -> ParseResult<Expr> {
    if p.eat(&TokenKind::Dash) {
        let operand = parse_unary(p)?;
        return Ok(Expr::Unary(UnaryOp::Neg, Box::new(operand)));
    }
    if p.eat(&TokenKind::Plus) {
        let operand = parse_unary(p)?;
        return Ok(Expr::Unary(UnaryOp::Pos, Box::new(operand)));
    }
    parse_postfix(p)
}

fn parse_postfix(p: &mut Parser) -> ParseResult<Expr> {
    let mut expr = parse_atom(p)?;
    loop {
        if p.eat(&TokenKind::Dot) {
            let name = p.expect_name("property name")?;
            expr = Expr::Property(Box::new(expr), name);
        } else if p.eat(&TokenKind::LBracket) {
            if p.eat(&TokenKind::DotDot) {
                let hi = if p.check(&TokenKind::RBracket) { None } else { Some(Box::new(parse_expr(p)?)) };
                p.expect(TokenKind::RBracket, "]")?;
                expr = Expr::ListSlice(Box::new(expr), None, hi);
            } else {
                let first = parse_expr(p)?;
                if p.eat(&TokenKind::DotDot) {
                    let hi = if p.check(&TokenKind::RBracket) { None } else { Some(Box::new(parse_expr(p)?)) };
                    p.expect(TokenKind::RBracket, "]")?;
                    expr = Expr::ListSlice(Box::new(expr), Some(Box::new(first)), hi);
                } else {
                    p.expect(TokenKind::RBracket, "]")?;
                    expr = Expr::ListIndex(Box::new(expr), Box::new(first));
                }
            }
        } else if p.check(&TokenKind::LBrace) {
            if let Expr::Variable(name) = &expr {
                let name = name.clone();
                expr = parse_map_projection(p, name)?;
            } else {
                break;
            }
        } else {
            break;
        }
    }
    Ok(expr)
}

fn parse_map_projection(p: &mut Parser, variable: String) -> ParseResult<Expr> {
    p.expect(TokenKind::LBrace, "{")?;
    let mut items = Vec::new();
    if !p.check(&TokenKind::RBrace) {
        loop {
            if p.eat(&TokenKind::Dot) {
                if p.eat(&TokenKind::Star) {
                    items.push(MapProjectionItem::AllProperties);
                } else {
                    let key = p.expect_name("property name")?;
                    items.push(MapProjectionItem::Property(key));
                }
            } else {
                let key = p.expect_name("map projection key")?;
                p.expect(TokenKind::Colon, ":")?;
                let value = parse_expr(p)?;
                items.push(MapProjectionItem::Alias { key, expr: value });
            }
            if !p.eat(&TokenKind::Comma) {
                break;
            }
        }
    }
    p.expect(TokenKind::RBrace, "}")?;
    Ok(Expr::MapProjection { variable, items })
}

/// Parses a `{key: expr, ...}` map literal, used both as a map atom and as
/// inline pattern properties (`(n {k: v})`, `-[r {k: v}]->`).
pub(crate) fn parse_map_entries(p: &mut Parser) -> ParseResult<MapLiteral> {
    p.expect(TokenKind::LBrace, "{")?;
    let mut entries = Vec::new();
    if !p.check(&TokenKind::RBrace) {
        loop {
            let key = p.expect_name("map key")?;
            p.expect(TokenKind::Colon, ":")?;
            let value = parse_expr(p)?;
            entries.push((key, value));
            if !p.eat(&TokenKind::Comma) {
                break;
            }
        }
    }
    p.expect(TokenKind::RBrace, "}")?;
    Ok(entries)
}

fn parse_atom(p: &mut Parser) -> ParseResult<Expr> {
    match p.peek_kind().clone() {
        TokenKind::Integer(v) => {
            p.bump();
            Ok(Expr::Literal(Literal::Integer(v)))
        }
        TokenKind::Float(v) => {
            p.bump();
            Ok(Expr::Literal(Literal::Float(v)))
        }
        TokenKind::StringLiteral(s) => {
            p.bump();
            Ok(Expr::Literal(Literal::String(s)))
        }
        TokenKind::Null => {
            p.bump();
            Ok(Expr::Literal(Literal::Null))
        }
        TokenKind::Dollar => {
            p.bump();
            let name = p.expect_name("parameter name")?;
            Ok(Expr::Parameter(name))
        }
        TokenKind::LParen => {
            p.bump();
            let inner = parse_expr(p)?;
            p.expect(TokenKind::RParen, ")")?;
            Ok(Expr::Parenthesized(Box::new(inner)))
        }
        TokenKind::LBracket => {
            p.bump();
            let mut items = Vec::new();
            if !p.check(&TokenKind::RBracket) {
                loop {
                    items.push(parse_expr(p)?);
                    if !p.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            p.expect(TokenKind::RBracket, "]")?;
            Ok(Expr::List(items))
        }
        TokenKind::LBrace => Ok(Expr::Map(parse_map_entries(p)?)),
        TokenKind::Case => parse_case(p),
        TokenKind::ShortestPath | TokenKind::AllShortestPaths => parse_path_function_call(p),
        _ if p.check_name() => parse_identifier_or_call(p),
        _ => Err(p.error("an expression")),
    }
}

fn parse_path_function_call(p: &mut Parser) -> ParseResult<Expr> {
    let function = if p.eat(&TokenKind::ShortestPath) {
        PathFunction::ShortestPath
    } else {
        p.expect(TokenKind::AllShortestPaths, "allShortestPaths")?;
        PathFunction::AllShortestPaths
    };
    p.expect(TokenKind::LParen, "(")?;
    let pattern = parse_path_pattern(p)?;
    p.expect(TokenKind::RParen, ")")?;
    Ok(Expr::PathFunctionCall { function, pattern: Box::new(pattern) })
}

fn parse_identifier_or_call(p: &mut Parser) -> ParseResult<Expr> {
    let name = p.expect_name("an identifier")?;
    if p.check(&TokenKind::LParen) {
        p.bump();
        let distinct = p.eat(&TokenKind::Distinct);
        let mut args = Vec::new();
        if p.check(&TokenKind::Star) {
            // count(*)
            p.bump();
            args.push(Expr::Variable("*".to_string()));
        } else if !p.check(&TokenKind::RParen) {
            loop {
                args.push(parse_expr(p)?);
                if !p.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        p.expect(TokenKind::RParen, ")")?;
        return Ok(Expr::FunctionCall { name, distinct, args });
    }
    Ok(Expr::Variable(name))
}

fn parse_case(p: &mut Parser) -> ParseResult<Expr> {
    p.expect(TokenKind::Case, "CASE")?;
    let subject = if !p.check(&TokenKind::When) { Some(Box::new(parse_expr(p)?)) } else { None };
    let mut branches = Vec::new();
    while p.eat(&TokenKind::When) {
        let cond = parse_expr(p)?;
        p.expect(TokenKind::Then, "THEN")?;
        let result = parse_expr(p)?;
        branches.push((cond, result));
    }
    let else_branch = if p.eat(&TokenKind::Else) { Some(Box::new(parse_expr(p)?)) } else { None };
    p.expect(TokenKind::End, "END")?;
    Ok(match subject {
        Some(subject) => Expr::CaseSimple { subject, branches, else_branch },
        None => Expr::CaseSearched { branches, else_branch },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn expr(src: &str) -> Expr {
        let mut p = Parser::new(src);
        parse_expr(&mut p).unwrap()
    }

    #[test]
    fn precedence_and_before_or() {
        // a OR b AND c == a OR (b AND c)
        let e = expr("a OR b AND c");
        match e {
            Expr::Binary(BinaryOp::Or, _, right) => {
                assert!(matches!(*right, Expr::Binary(BinaryOp::And, _, _)));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn precedence_multiplicative_before_additive() {
        let e = expr("1 + 2 * 3");
        match e {
            Expr::Binary(BinaryOp::Add, left, right) => {
                assert_eq!(*left, Expr::Literal(Literal::Integer(1)));
                assert!(matches!(*right, Expr::Binary(BinaryOp::Mul, _, _)));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn power_is_right_associative() {
        // 2 ^ 3 ^ 2 == 2 ^ (3 ^ 2)
        let e = expr("2 ^ 3 ^ 2");
        match e {
            Expr::Binary(BinaryOp::Pow, left, right) => {
                assert_eq!(*left, Expr::Literal(Literal::Integer(2)));
                assert!(matches!(*right, Expr::Binary(BinaryOp::Pow, _, _)));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn is_null_and_not() {
        let e = expr("NOT n.age IS NULL");
        match e {
            Expr::Unary(UnaryOp::Not, inner) => assert!(matches!(*inner, Expr::IsNull(_))),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn list_index_and_slice() {
        assert!(matches!(expr("xs[0]"), Expr::ListIndex(_, _)));
        assert!(matches!(expr("xs[1..3]"), Expr::ListSlice(_, Some(_), Some(_))));
        assert!(matches!(expr("xs[..3]"), Expr::ListSlice(_, None, Some(_))));
    }

    #[test]
    fn function_call_with_distinct() {
        let e = expr("count(DISTINCT n.name)");
        match e {
            Expr::FunctionCall { name, distinct, args } => {
                assert_eq!(name, "count");
                assert!(distinct);
                assert_eq!(args.len(), 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn count_star() {
        let e = expr("count(*)");
        match e {
            Expr::FunctionCall { name, args, .. } => {
                assert_eq!(name, "count");
                assert_eq!(args, vec![Expr::Variable("*".to_string())]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn starts_with_ends_with_contains() {
        assert!(matches!(expr("a STARTS WITH 'x'"), Expr::Binary(BinaryOp::StartsWith, _, _)));
        assert!(matches!(expr("a ENDS WITH 'x'"), Expr::Binary(BinaryOp::EndsWith, _, _)));
        assert!(matches!(expr("a CONTAINS 'x'"), Expr::Binary(BinaryOp::Contains, _, _)));
    }
}
