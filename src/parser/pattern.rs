//! Pattern grammar: node patterns, relationship patterns (with
//! variable-length bounds and `shortestPath`/`allShortestPaths`), and the
//! path patterns they chain into.

use super::ast::*;
use super::expression::parse_map_entries;
use super::{ParseResult, Parser};
use crate::lexer::TokenKind;

pub fn parse_path_pattern(p: &mut Parser) -> ParseResult<PathPattern> {
    let variable = if p.check_name() && p.peek_n(1).kind == TokenKind::Eq {
        let name = p.expect_name("path variable")?;
        p.expect(TokenKind::Eq, "=")?;
        Some(name)
    } else {
        None
    };
    let element = parse_pattern_element(p)?;
    Ok(PathPattern { variable, element })
}

fn parse_pattern_element(p: &mut Parser) -> ParseResult<PatternElement> {
    let start = parse_node_pattern(p)?;
    let mut chain = Vec::new();
    loop {
        if !matches!(p.peek_kind(), TokenKind::Dash | TokenKind::ArrowLeft) {
            break;
        }
        let rel = parse_relationship_pattern(p)?;
        let node = parse_node_pattern(p)?;
        chain.push((rel, node));
    }
    Ok(PatternElement { start, chain })
}

pub(crate) fn parse_node_pattern(p: &mut Parser) -> ParseResult<NodePattern> {
    p.expect(TokenKind::LParen, "(")?;
    let variable = if p.check_name() { Some(p.expect_name("node variable")?) } else { None };
    let mut labels = Vec::new();
    while p.eat(&TokenKind::Colon) {
        loop {
            labels.push(p.expect_name("label")?);
            if !p.eat(&TokenKind::Ampersand) {
                break;
            }
        }
    }
    let properties = if p.check(&TokenKind::LBrace) { Some(parse_map_entries(p)?) } else { None };
    p.expect(TokenKind::RParen, ")")?;
    Ok(NodePattern { variable, labels, properties })
}

fn parse_relationship_pattern(p: &mut Parser) -> ParseResult<RelationshipPattern> {
    let before_left = p.eat(&TokenKind::ArrowLeft);
    if !before_left {
        p.expect(TokenKind::Dash, "-")?;
    }

    p.expect(TokenKind::LBracket, "[")?;

    let variable = if p.check_name() { Some(p.expect_name("relationship variable")?) } else { None };

    let path_function = None; // shortestPath()/allShortestPaths() are parsed as expression atoms, not here.

    let mut types = Vec::new();
    if p.eat(&TokenKind::Colon) {
        loop {
            types.push(p.expect_name("relationship type")?);
            if !p.eat(&TokenKind::Pipe) {
                break;
            }
        }
    }

    let var_length = parse_var_length_spec(p)?;

    let properties = if p.check(&TokenKind::LBrace) { Some(parse_map_entries(p)?) } else { None };

    p.expect(TokenKind::RBracket, "]")?;

    let after_right = p.eat(&TokenKind::ArrowRight);
    if !after_right {
        p.expect(TokenKind::Dash, "-")?;
    }

    let direction = match (before_left, after_right) {
        (false, true) => RelDirection::Right,
        (true, false) => RelDirection::Left,
        (true, true) => RelDirection::Both,
        (false, false) => RelDirection::Either,
    };

    Ok(RelationshipPattern { variable, types, direction, properties, var_length, path_function })
}

fn parse_var_length_spec(p: &mut Parser) -> ParseResult<Option<VarLengthSpec>> {
    if !p.eat(&TokenKind::Star) {
        return Ok(None);
    }
    let take_int = |p: &mut Parser| -> Option<u32> {
        if let TokenKind::Integer(v) = p.peek_kind().clone() {
            p.bump();
            Some(v as u32)
        } else {
            None
        }
    };
    let spec = if let Some(n) = take_int(p) {
        if p.eat(&TokenKind::DotDot) {
            VarLengthSpec { min: n, max: take_int(p) }
        } else {
            VarLengthSpec { min: n, max: Some(n) }
        }
    } else if p.eat(&TokenKind::DotDot) {
        VarLengthSpec { min: 1, max: take_int(p) }
    } else {
        VarLengthSpec { min: 1, max: None }
    };
    Ok(Some(spec))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(src: &str) -> PathPattern {
        let mut p = Parser::new(src);
        parse_path_pattern(&mut p).unwrap()
    }

    #[test]
    fn simple_right_relationship() {
        let pat = pattern("(a)-[r:KNOWS]->(b)");
        assert_eq!(pat.element.chain.len(), 1);
        assert_eq!(pat.element.chain[0].0.direction, RelDirection::Right);
        assert_eq!(pat.element.chain[0].0.types, vec!["KNOWS".to_string()]);
    }

    #[test]
    fn left_and_undirected() {
        let left = pattern("(a)<-[r]-(b)");
        assert_eq!(left.element.chain[0].0.direction, RelDirection::Left);

        let undirected = pattern("(a)-[r]-(b)");
        assert_eq!(undirected.element.chain[0].0.direction, RelDirection::Either);
    }

    #[test]
    fn multi_label_conjunction() {
        let pat = pattern("(a:A:B)");
        assert_eq!(pat.element.start.labels, vec!["A".to_string(), "B".to_string()]);
        let pat2 = pattern("(a:A&B)");
        assert_eq!(pat2.element.start.labels, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn multiple_relationship_types() {
        let pat = pattern("(a)-[r:T1|T2]->(b)");
        assert_eq!(pat.element.chain[0].0.types, vec!["T1".to_string(), "T2".to_string()]);
    }

    #[test]
    fn variable_length_bounds() {
        assert_eq!(pattern("(a)-[r*]->(b)").element.chain[0].0.var_length, Some(VarLengthSpec { min: 1, max: None }));
        assert_eq!(pattern("(a)-[r*3]->(b)").element.chain[0].0.var_length, Some(VarLengthSpec { min: 3, max: Some(3) }));
        assert_eq!(pattern("(a)-[r*2..]->(b)").element.chain[0].0.var_length, Some(VarLengthSpec { min: 2, max: None }));
        assert_eq!(pattern("(a)-[r*..5]->(b)").element.chain[0].0.var_length, Some(VarLengthSpec { min: 1, max: Some(5) }));
        assert_eq!(pattern("(a)-[r*2..5]->(b)").element.chain[0].0.var_length, Some(VarLengthSpec { min: 2, max: Some(5) }));
    }

    #[test]
    fn path_variable_assignment() {
        let pat = pattern("p = (a)-[r]->(b)");
        assert_eq!(pat.variable.as_deref(), Some("p"));
    }
}
