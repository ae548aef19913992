//! `SELECT` grammar (§4.2, §4.3): `WITH`, query blocks, joins, `CONNECT
//! BY`/`START WITH`, set operators, `ORDER BY`.

use crate::grammar::expressions::parse_expr;
use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::syntax::SyntaxKind;

pub fn parse_select_stmt(p: &mut Parser) {
    p.start(SyntaxKind::SelectStmt);
    if p.at(TokenKind::WithKw) {
        parse_with_clause(p);
    }
    parse_query_expr(p);
    if p.at(TokenKind::OrderKw) {
        parse_order_clause(p);
    }
    p.finish();
}

fn parse_with_clause(p: &mut Parser) {
    p.start(SyntaxKind::WithClause);
    p.expect(TokenKind::WithKw);
    p.eat(TokenKind::RecursiveKw);
    // Oracle's "with clause function/procedure" extension lets one or more
    // inline PL/SQL routines precede the CTE list. §4.2 has no rewrite for
    // this shape, so the grammar only recognizes it well enough to let
    // `rewrite::query` reject it by name instead of failing to parse at all.
    while matches!(p.current(), TokenKind::FunctionKw | TokenKind::ProcedureKw) {
        parse_inline_routine_decl(p);
    }
    loop {
        parse_cte_definition(p);
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    p.finish();
}

/// Consumes an inline `FUNCTION`/`PROCEDURE` declaration well enough to skip
/// past it, tracking `BEGIN`/`IF`/`LOOP`/`CASE` vs. `END` nesting so the
/// routine's own terminating `END;` isn't mistaken for a nested block's.
fn parse_inline_routine_decl(p: &mut Parser) {
    p.start(SyntaxKind::InlineRoutineDecl);
    let is_function = p.at(TokenKind::FunctionKw);
    p.bump_any();
    p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);

    if p.eat(TokenKind::LParen) {
        let mut depth = 1;
        while depth > 0 && !p.at_end() {
            match p.current() {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth -= 1,
                _ => {}
            }
            p.bump_any();
        }
    }
    if is_function {
        p.expect(TokenKind::ReturnKw);
        while !matches!(p.current(), TokenKind::IsKw | TokenKind::AsKw) && !p.at_end() {
            p.bump_any();
        }
    }
    p.expect_one_of(&[TokenKind::IsKw, TokenKind::AsKw]);

    let mut block_depth = 0usize;
    loop {
        match p.current() {
            TokenKind::Eof => break,
            TokenKind::BeginKw | TokenKind::IfKw | TokenKind::LoopKw | TokenKind::CaseKw => {
                block_depth += 1;
                p.bump_any();
            }
            TokenKind::EndKw => {
                p.bump_any();
                p.eat_one_of(&[TokenKind::IfKw, TokenKind::LoopKw, TokenKind::CaseKw]);
                if block_depth <= 1 {
                    p.eat_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
                    p.expect(TokenKind::SemiColon);
                    break;
                }
                block_depth -= 1;
            }
            _ => p.bump_any(),
        }
    }
    p.finish();
}

fn parse_cte_definition(p: &mut Parser) {
    p.start(SyntaxKind::CteDefinition);
    p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    if p.eat(TokenKind::LParen) {
        loop {
            p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
        p.expect(TokenKind::RParen);
    }
    p.expect(TokenKind::AsKw);
    p.expect(TokenKind::LParen);
    parse_select_stmt(p);
    p.expect(TokenKind::RParen);
    p.finish();
}

/// A chain of query blocks joined by `UNION [ALL]`/`INTERSECT`/`MINUS`,
/// left-associative, wrapped in nested [`SyntaxKind::SetOp`] nodes exactly
/// like a binary arithmetic expression.
fn parse_query_expr(p: &mut Parser) {
    let cp = p.checkpoint();
    parse_query_operand(p);
    while matches!(
        p.current(),
        TokenKind::UnionKw | TokenKind::IntersectKw | TokenKind::MinusKw
    ) {
        p.bump_any();
        p.eat(TokenKind::AllKw);
        parse_query_operand(p);
        p.start_node_at(cp, SyntaxKind::SetOp);
        p.finish();
    }
}

fn parse_query_operand(p: &mut Parser) {
    if p.at(TokenKind::LParen) {
        p.bump_any();
        parse_select_stmt(p);
        p.expect(TokenKind::RParen);
    } else {
        parse_query_block(p);
    }
}

fn parse_query_block(p: &mut Parser) {
    p.start(SyntaxKind::QueryBlock);
    p.expect(TokenKind::SelectKw);
    p.eat_one_of(&[TokenKind::DistinctKw, TokenKind::AllKw]);
    parse_select_list(p);

    if p.eat(TokenKind::FromKw) {
        parse_from_list(p);
    }
    if p.at(TokenKind::WhereKw) {
        parse_where_clause(p);
    }
    // Oracle accepts START WITH/CONNECT BY in either order.
    for _ in 0..2 {
        if p.at(TokenKind::StartKw) {
            parse_start_with(p);
        } else if p.at(TokenKind::ConnectKw) {
            parse_connect_by(p);
        } else {
            break;
        }
    }
    if p.at(TokenKind::GroupKw) {
        parse_group_by(p);
    }
    if p.at(TokenKind::HavingKw) {
        parse_having(p);
    }
    p.finish();
}

fn parse_select_list(p: &mut Parser) {
    p.start(SyntaxKind::SelectList);
    if p.at(TokenKind::Asterisk) {
        p.bump_any();
    } else {
        loop {
            parse_select_item(p);
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
    }
    p.finish();
}

fn parse_select_item(p: &mut Parser) {
    p.start(SyntaxKind::SelectItem);
    parse_expr(p);
    p.eat(TokenKind::AsKw);
    if matches!(p.current(), TokenKind::Ident | TokenKind::DelimitedIdent) {
        p.bump_any();
    }
    p.finish();
}

fn parse_from_list(p: &mut Parser) {
    parse_table_reference(p);
    loop {
        if p.eat(TokenKind::Comma) {
            parse_table_reference(p);
            continue;
        }
        if matches!(
            p.current(),
            TokenKind::JoinKw
                | TokenKind::InnerKw
                | TokenKind::LeftKw
                | TokenKind::RightKw
                | TokenKind::FullKw
                | TokenKind::CrossKw
        ) {
            parse_join_clause(p);
            continue;
        }
        break;
    }
}

fn parse_table_reference(p: &mut Parser) {
    p.start(SyntaxKind::TableReference);
    if p.at(TokenKind::LParen) {
        p.bump_any();
        parse_select_stmt(p);
        p.expect(TokenKind::RParen);
    } else {
        p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
        while p.eat(TokenKind::Dot) {
            p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
        }
    }
    p.eat(TokenKind::AsKw);
    if matches!(p.current(), TokenKind::Ident | TokenKind::DelimitedIdent) {
        p.bump_any();
    }
    p.finish();
}

fn parse_join_clause(p: &mut Parser) {
    p.start(SyntaxKind::JoinClause);
    p.eat_one_of(&[
        TokenKind::InnerKw,
        TokenKind::LeftKw,
        TokenKind::RightKw,
        TokenKind::FullKw,
        TokenKind::CrossKw,
    ]);
    p.eat(TokenKind::OuterKw);
    p.expect(TokenKind::JoinKw);
    parse_table_reference(p);
    if p.eat(TokenKind::OnKw) {
        parse_expr(p);
    }
    p.finish();
}

fn parse_where_clause(p: &mut Parser) {
    p.start(SyntaxKind::WhereClause);
    p.expect(TokenKind::WhereKw);
    parse_expr(p);
    p.finish();
}

fn parse_start_with(p: &mut Parser) {
    p.start(SyntaxKind::StartWithClause);
    p.expect(TokenKind::StartKw);
    p.expect(TokenKind::WithKw);
    parse_expr(p);
    p.finish();
}

fn parse_connect_by(p: &mut Parser) {
    p.start(SyntaxKind::ConnectByClause);
    p.expect(TokenKind::ConnectKw);
    p.expect(TokenKind::ByKw);
    p.eat(TokenKind::NocycleKw);
    parse_expr(p);
    p.finish();
}

fn parse_group_by(p: &mut Parser) {
    p.start(SyntaxKind::GroupByClause);
    p.expect(TokenKind::GroupKw);
    p.expect(TokenKind::ByKw);
    loop {
        parse_expr(p);
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    p.finish();
}

fn parse_having(p: &mut Parser) {
    p.start(SyntaxKind::HavingClause);
    p.expect(TokenKind::HavingKw);
    parse_expr(p);
    p.finish();
}

/// Also reused by `grammar::expressions::parse_over_clause` for a window
/// function's `OVER (... ORDER BY ...)` portion (§4.1) -- the grammar is
/// identical, just nested one level deeper.
pub(crate) fn parse_order_clause(p: &mut Parser) {
    p.start(SyntaxKind::OrderClause);
    p.expect(TokenKind::OrderKw);
    p.expect(TokenKind::ByKw);
    loop {
        parse_order_item(p);
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }
    p.finish();
}

fn parse_order_item(p: &mut Parser) {
    p.start(SyntaxKind::OrderItem);
    parse_expr(p);
    p.eat_one_of(&[TokenKind::AscKw, TokenKind::DescKw]);
    if p.eat(TokenKind::NullsKw) {
        p.expect_one_of(&[TokenKind::FirstKw, TokenKind::LastKw]);
    }
    p.finish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstNode;
    use crate::syntax::SyntaxKind;

    fn parse(text: &str) -> crate::parser::Parse {
        let mut p = Parser::new(text);
        p.start(SyntaxKind::Root);
        parse_select_stmt(&mut p);
        p.finish();
        p.build()
    }

    #[test]
    fn select_from_dual() {
        let parse = parse("select 1 from dual");
        assert!(parse.ok(), "{:?}", parse.errors);
    }

    #[test]
    fn select_with_join_and_order() {
        let parse = parse(
            "select a.x, b.y from t1 a join t2 b on a.id = b.id where a.x > 1 order by a.x desc",
        );
        assert!(parse.ok(), "{:?}", parse.errors);
        assert!(parse
            .syntax()
            .descendants()
            .any(|n| n.kind() == SyntaxKind::JoinClause));
    }

    #[test]
    fn connect_by_and_start_with() {
        let parse = parse(
            "select employee_id from employees start with manager_id is null connect by prior employee_id = manager_id",
        );
        assert!(parse.ok(), "{:?}", parse.errors);
        assert!(parse
            .syntax()
            .descendants()
            .any(|n| n.kind() == SyntaxKind::ConnectByClause));
    }

    #[test]
    fn union_all_chain() {
        let parse = parse("select 1 from dual union all select 2 from dual");
        assert!(parse.ok(), "{:?}", parse.errors);
        assert!(parse.syntax().descendants().any(|n| n.kind() == SyntaxKind::SetOp));
    }

    #[test]
    fn recursive_with_cte() {
        let parse = parse(
            "with recursive r (id) as (select 1 from dual union all select id+1 from r) select * from r",
        );
        assert!(parse.ok(), "{:?}", parse.errors);
        let with = parse.syntax().descendants().find_map(crate::ast::WithClause::cast);
        assert!(with.is_some_and(|w| w.is_recursive()));
    }
}
