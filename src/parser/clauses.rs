//! Clause grammar: reading clauses (MATCH/OPTIONAL MATCH/UNWIND), updating
//! clauses (CREATE/MERGE/SET/REMOVE/DELETE/FOREACH), WITH, and the terminal
//! RETURN — composed into `SinglePartQuery`s chained at WITH boundaries.

use super::ast::*;
use super::expression::parse_expr;
use super::pattern::parse_path_pattern;
use super::{ParseResult, Parser};
use crate::lexer::TokenKind;

pub fn parse_query_parts(p: &mut Parser) -> ParseResult<Vec<SinglePartQuery>> {
    let mut parts = Vec::new();
    loop {
        let mut part = SinglePartQuery::default();
        loop {
            match p.peek_kind() {
                TokenKind::Match => part.reading_clauses.push(ReadingClause::Match(parse_match_clause(p)?)),
                TokenKind::Optional => part.reading_clauses.push(ReadingClause::OptionalMatch(parse_optional_match_clause(p)?)),
                TokenKind::Unwind => part.reading_clauses.push(ReadingClause::Unwind(parse_unwind_clause(p)?)),
                TokenKind::Call => part.reading_clauses.push(ReadingClause::Call(parse_call_clause(p)?)),
                TokenKind::Create => part.updating_clauses.push(UpdatingClause::Create(parse_create_clause(p)?)),
                TokenKind::Merge => part.updating_clauses.push(UpdatingClause::Merge(parse_merge_clause(p)?)),
                TokenKind::Set => part.updating_clauses.push(UpdatingClause::Set(parse_set_clause(p)?)),
                TokenKind::Remove => part.updating_clauses.push(UpdatingClause::Remove(parse_remove_clause(p)?)),
                TokenKind::Delete | TokenKind::Detach => part.updating_clauses.push(UpdatingClause::Delete(parse_delete_clause(p)?)),
                TokenKind::Foreach => part.updating_clauses.push(UpdatingClause::Foreach(parse_foreach_clause(p)?)),
                _ => break,
            }
        }

        if p.check(&TokenKind::With) {
            part.with = Some(parse_with_clause(p)?);
            parts.push(part);
            continue;
        }
        if p.check(&TokenKind::Return) {
            part.return_clause = Some(parse_return_clause(p)?);
        }
        parts.push(part);
        break;
    }
    Ok(parts)
}

fn parse_match_clause(p: &mut Parser) -> ParseResult<MatchClause> {
    p.expect(TokenKind::Match, "MATCH")?;
    let patterns = parse_pattern_list(p)?;
    let where_clause = parse_optional_where(p)?;
    Ok(MatchClause { patterns, where_clause })
}

fn parse_optional_match_clause(p: &mut Parser) -> ParseResult<MatchClause> {
    p.expect(TokenKind::Optional, "OPTIONAL")?;
    p.expect(TokenKind::Match, "MATCH")?;
    let patterns = parse_pattern_list(p)?;
    let where_clause = parse_optional_where(p)?;
    Ok(MatchClause { patterns, where_clause })
}

fn parse_pattern_list(p: &mut Parser) -> ParseResult<Vec<PathPattern>> {
    let mut patterns = vec![parse_path_pattern(p)?];
    while p.eat(&TokenKind::Comma) {
        patterns.push(parse_path_pattern(p)?);
    }
    Ok(patterns)
}

fn parse_optional_where(p: &mut Parser) -> ParseResult<Option<Expr>> {
    if p.eat(&TokenKind::Where) {
        Ok(Some(parse_expr(p)?))
    } else {
        Ok(None)
    }
}

fn parse_unwind_clause(p: &mut Parser) -> ParseResult<UnwindClause> {
    p.expect(TokenKind::Unwind, "UNWIND")?;
    let expr = parse_expr(p)?;
    p.expect(TokenKind::As, "AS")?;
    let alias = p.expect_name("UNWIND alias")?;
    Ok(UnwindClause { expr, alias })
}

fn parse_call_clause(p: &mut Parser) -> ParseResult<CallClause> {
    p.expect(TokenKind::Call, "CALL")?;
    let mut procedure_name = p.expect_name("procedure name")?;
    while p.eat(&TokenKind::Dot) {
        procedure_name.push('.');
        procedure_name.push_str(&p.expect_name("procedure name segment")?);
    }
    p.expect(TokenKind::LParen, "(")?;
    let mut arguments = Vec::new();
    if !p.check(&TokenKind::RParen) {
        loop {
            arguments.push(parse_expr(p)?);
            if !p.eat(&TokenKind::Comma) {
                break;
            }
        }
    }
    p.expect(TokenKind::RParen, ")")?;

    let yield_items = if p.eat(&TokenKind::Yield) {
        let mut items = vec![parse_yield_item(p)?];
        while p.eat(&TokenKind::Comma) {
            items.push(parse_yield_item(p)?);
        }
        Some(items)
    } else {
        None
    };

    Ok(CallClause { procedure_name, arguments, yield_items })
}

fn parse_yield_item(p: &mut Parser) -> ParseResult<YieldItem> {
    let name = p.expect_name("YIELD field")?;
    let alias = if p.eat(&TokenKind::As) { Some(p.expect_name("alias")?) } else { None };
    Ok(YieldItem { name, alias })
}

fn parse_create_clause(p: &mut Parser) -> ParseResult<CreateClause> {
    p.expect(TokenKind::Create, "CREATE")?;
    let patterns = parse_pattern_list(p)?;
    Ok(CreateClause { patterns })
}

fn parse_merge_clause(p: &mut Parser) -> ParseResult<MergeClause> {
    p.expect(TokenKind::Merge, "MERGE")?;
    let pattern = parse_path_pattern(p)?;
    let mut on_create = Vec::new();
    let mut on_match = Vec::new();
    loop {
        if is_on_keyword(p) {
            p.bump(); // ON
            if p.eat(&TokenKind::Create) {
                p.expect(TokenKind::Set, "SET")?;
                on_create.extend(parse_set_items(p)?);
            } else if is_match_like(p) {
                p.bump(); // MATCH
                p.expect(TokenKind::Set, "SET")?;
                on_match.extend(parse_set_items(p)?);
            } else {
                return Err(p.error("CREATE or MATCH"));
            }
        } else {
            break;
        }
    }
    Ok(MergeClause { pattern, on_create, on_match })
}

fn is_on_keyword(p: &Parser) -> bool {
    matches!(p.peek_kind(), TokenKind::Identifier(s) if s.eq_ignore_ascii_case("on"))
}

fn is_match_like(p: &Parser) -> bool {
    matches!(p.peek_kind(), TokenKind::Match)
}

fn parse_set_clause(p: &mut Parser) -> ParseResult<SetClause> {
    p.expect(TokenKind::Set, "SET")?;
    Ok(SetClause { items: parse_set_items(p)? })
}

fn parse_set_items(p: &mut Parser) -> ParseResult<Vec<SetItem>> {
    let mut items = vec![parse_set_item(p)?];
    while p.eat(&TokenKind::Comma) {
        items.push(parse_set_item(p)?);
    }
    Ok(items)
}

fn parse_set_item(p: &mut Parser) -> ParseResult<SetItem> {
    let variable = p.expect_name("variable")?;
    if p.eat(&TokenKind::PlusEq) {
        let map = parse_expr(p)?;
        return Ok(SetItem::MergeMap { variable, map });
    }
    if p.eat(&TokenKind::Colon) {
        let label = p.expect_name("label")?;
        return Ok(SetItem::Label { variable, label });
    }
    p.expect(TokenKind::Dot, ".")?;
    let key = p.expect_name("property name")?;
    p.expect(TokenKind::Eq, "=")?;
    let value = parse_expr(p)?;
    Ok(SetItem::Property { target: PropertyAccess { variable, key }, value })
}

fn parse_remove_clause(p: &mut Parser) -> ParseResult<RemoveClause> {
    p.expect(TokenKind::Remove, "REMOVE")?;
    let mut items = vec![parse_remove_item(p)?];
    while p.eat(&TokenKind::Comma) {
        items.push(parse_remove_item(p)?);
    }
    Ok(RemoveClause { items })
}

fn parse_remove_item(p: &mut Parser) -> ParseResult<RemoveItem> {
    let variable = p.expect_name("variable")?;
    if p.eat(&TokenKind::Colon) {
        let label = p.expect_name("label")?;
        return Ok(RemoveItem::Label { variable, label });
    }
    p.expect(TokenKind::Dot, ".")?;
    let key = p.expect_name("property name")?;
    Ok(RemoveItem::Property(PropertyAccess { variable, key }))
}

fn parse_delete_clause(p: &mut Parser) -> ParseResult<DeleteClause> {
    let detach = p.eat(&TokenKind::Detach);
    p.expect(TokenKind::Delete, "DELETE")?;
    let mut items = vec![parse_expr(p)?];
    while p.eat(&TokenKind::Comma) {
        items.push(parse_expr(p)?);
    }
    Ok(DeleteClause { detach, items })
}

fn parse_foreach_clause(p: &mut Parser) -> ParseResult<ForeachClause> {
    p.expect(TokenKind::Foreach, "FOREACH")?;
    p.expect(TokenKind::LParen, "(")?;
    let variable = p.expect_name("FOREACH variable")?;
    p.expect(TokenKind::In, "IN")?;
    // REDESIGN FLAG 4: only a list literal is accepted as the iteration
    // source (SPEC_FULL.md §12 keeps this Open Question open rather than
    // guessing at a wider grammar).
    let list = match p.peek_kind().clone() {
        TokenKind::LBracket => parse_expr(p)?,
        _ => return Err(p.error("a list literal")),
    };
    p.expect(TokenKind::Pipe, "|")?;
    let mut updates = Vec::new();
    loop {
        match p.peek_kind() {
            TokenKind::Create => updates.push(UpdatingClause::Create(parse_create_clause(p)?)),
            TokenKind::Merge => updates.push(UpdatingClause::Merge(parse_merge_clause(p)?)),
            TokenKind::Set => updates.push(UpdatingClause::Set(parse_set_clause(p)?)),
            TokenKind::Remove => updates.push(UpdatingClause::Remove(parse_remove_clause(p)?)),
            TokenKind::Delete | TokenKind::Detach => updates.push(UpdatingClause::Delete(parse_delete_clause(p)?)),
            TokenKind::Foreach => updates.push(UpdatingClause::Foreach(parse_foreach_clause(p)?)),
            _ => break,
        }
    }
    p.expect(TokenKind::RParen, ")")?;
    Ok(ForeachClause { variable, list, updates })
}

fn parse_with_clause(p: &mut Parser) -> ParseResult<WithClause> {
    p.expect(TokenKind::With, "WITH")?;
    let distinct = p.eat(&TokenKind::Distinct);
    let items = parse_projection_items(p)?;
    let where_clause = parse_optional_where(p)?;
    let order_by = parse_optional_order_by(p)?;
    let skip = parse_optional_skip(p)?;
    let limit = parse_optional_limit(p)?;
    Ok(WithClause { distinct, items, where_clause, order_by, skip, limit })
}

fn parse_return_clause(p: &mut Parser) -> ParseResult<ReturnClause> {
    p.expect(TokenKind::Return, "RETURN")?;
    let distinct = p.eat(&TokenKind::Distinct);
    let items = parse_projection_items(p)?;
    let order_by = parse_optional_order_by(p)?;
    let skip = parse_optional_skip(p)?;
    let limit = parse_optional_limit(p)?;
    Ok(ReturnClause { distinct, items, order_by, skip, limit })
}

fn parse_projection_items(p: &mut Parser) -> ParseResult<Vec<ProjectionItem>> {
    let mut items = vec![parse_projection_item(p)?];
    while p.eat(&TokenKind::Comma) {
        items.push(parse_projection_item(p)?);
    }
    Ok(items)
}

fn parse_projection_item(p: &mut Parser) -> ParseResult<ProjectionItem> {
    let start = p.mark();
    let expr = parse_expr(p)?;
    let original_text = p.text_since(start);
    let alias = if p.eat(&TokenKind::As) { Some(p.expect_name("alias")?) } else { None };
    Ok(ProjectionItem { expr, alias, original_text })
}

fn parse_optional_order_by(p: &mut Parser) -> ParseResult<Option<Vec<OrderByItem>>> {
    if !p.eat(&TokenKind::Order) {
        return Ok(None);
    }
    p.expect(TokenKind::By, "BY")?;
    let mut items = vec![parse_order_by_item(p)?];
    while p.eat(&TokenKind::Comma) {
        items.push(parse_order_by_item(p)?);
    }
    Ok(Some(items))
}

fn parse_order_by_item(p: &mut Parser) -> ParseResult<OrderByItem> {
    let expr = parse_expr(p)?;
    let descending = if p.eat(&TokenKind::Desc) {
        true
    } else {
        p.eat(&TokenKind::Asc);
        false
    };
    Ok(OrderByItem { expr, descending })
}

fn parse_optional_skip(p: &mut Parser) -> ParseResult<Option<Expr>> {
    if p.eat(&TokenKind::Skip) {
        Ok(Some(parse_expr(p)?))
    } else {
        Ok(None)
    }
}

fn parse_optional_limit(p: &mut Parser) -> ParseResult<Option<Expr>> {
    if p.eat(&TokenKind::Limit) {
        Ok(Some(parse_expr(p)?))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_query;

    #[test]
    fn with_chains_into_second_part() {
        let q = parse_query("MATCH (n:Person) WITH n WHERE n.age > 28 RETURN n.name").unwrap();
        assert_eq!(q.parts.len(), 2);
        assert!(q.parts[0].with.is_some());
        assert!(q.parts[1].return_clause.is_some());
        // WHERE after WITH binds to the *second* part's WHERE, not MATCH's.
        assert!(q.parts[0].reading_clauses.iter().all(|rc| matches!(rc, ReadingClause::Match(m) if m.where_clause.is_none())));
    }

    #[test]
    fn merge_on_create_on_match() {
        let q = parse_query("MERGE (n:Label {k: 1}) ON CREATE SET n.created = true ON MATCH SET n.seen = true").unwrap();
        let merge = q.parts[0]
            .updating_clauses
            .iter()
            .find_map(|c| if let UpdatingClause::Merge(m) = c { Some(m) } else { None })
            .unwrap();
        assert_eq!(merge.on_create.len(), 1);
        assert_eq!(merge.on_match.len(), 1);
    }

    #[test]
    fn set_plus_eq_merge_map() {
        let q = parse_query("MATCH (n) SET n += {a: 1, b: 2}").unwrap();
        let set = q.parts[0]
            .updating_clauses
            .iter()
            .find_map(|c| if let UpdatingClause::Set(s) = c { Some(s) } else { None })
            .unwrap();
        assert!(matches!(set.items[0], SetItem::MergeMap { .. }));
    }

    #[test]
    fn detach_delete() {
        let q = parse_query("MATCH (n) DETACH DELETE n").unwrap();
        let del = q.parts[0]
            .updating_clauses
            .iter()
            .find_map(|c| if let UpdatingClause::Delete(d) = c { Some(d) } else { None })
            .unwrap();
        assert!(del.detach);
    }

    #[test]
    fn foreach_rejects_non_literal_iteration_source() {
        let err = parse_query("FOREACH (x IN collect(n.name) | SET x.seen = true)").unwrap_err();
        assert_eq!(err.expected, "a list literal");
    }

    #[test]
    fn union_all_vs_union_distinct() {
        let q = parse_query("MATCH (n) RETURN n UNION MATCH (m) RETURN m").unwrap();
        assert!(!q.unions[0].all);
    }

    #[test]
    fn call_yield_clause() {
        let q = parse_query("CALL db.labels() YIELD label AS l RETURN l").unwrap();
        let call = q.parts[0]
            .reading_clauses
            .iter()
            .find_map(|c| if let ReadingClause::Call(c) = c { Some(c) } else { None })
            .unwrap();
        assert_eq!(call.procedure_name, "db.labels");
        let yields = call.yield_items.as_ref().unwrap();
        assert_eq!(yields[0].name, "label");
        assert_eq!(yields[0].alias.as_deref(), Some("l"));
    }

    #[test]
    fn default_column_name_is_original_source_text() {
        let q = parse_query("MATCH (n) RETURN n.age + 1").unwrap();
        let item = &q.parts[0].return_clause.as_ref().unwrap().items[0];
        assert_eq!(item.original_text, "n . age + 1");
    }
}
