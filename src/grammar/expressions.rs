//! Expression grammar (§4.1 of the spec): a tiered recursive-descent parser
//! rather than a single generic Pratt loop, so that each precedence level
//! can shape its own node (`BetweenExpr`, `InList`, `LikeExpr`, `IsNullExpr`)
//! instead of a uniform binary-op tree. Binary/unary arithmetic, comparison
//! and concatenation all share the generic `Expression` node, distinguished
//! by their operator token child -- the rewriter matches on that token, not
//! on node kind.
//!
//! Precedence, loosest to tightest:
//! `or > and > not > comparison/between/in/like/is-null > concat (||) >
//! additive (+/-) > term (*, /, mod) > pow (**, right-assoc) > unary (+/-)`

use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::syntax::SyntaxKind;

pub fn parse_expr(p: &mut Parser) {
    parse_or(p);
}

fn parse_or(p: &mut Parser) {
    let cp = p.checkpoint();
    parse_and(p);
    while p.at(TokenKind::OrKw) {
        p.bump_any();
        parse_and(p);
        p.start_node_at(cp, SyntaxKind::LogicOp);
        p.finish();
    }
}

fn parse_and(p: &mut Parser) {
    let cp = p.checkpoint();
    parse_not(p);
    while p.at(TokenKind::AndKw) {
        p.bump_any();
        parse_not(p);
        p.start_node_at(cp, SyntaxKind::LogicOp);
        p.finish();
    }
}

/// Prefix `NOT`, e.g. `NOT (a = b)`. Infix `NOT` (`x NOT BETWEEN ...`) is
/// handled inside [`parse_comparison`], one level down.
fn parse_not(p: &mut Parser) {
    if p.at(TokenKind::NotKw) {
        let cp = p.checkpoint();
        p.bump_any();
        parse_not(p);
        p.start_node_at(cp, SyntaxKind::LogicOp);
        p.finish();
    } else {
        parse_comparison(p);
    }
}

fn parse_comparison(p: &mut Parser) {
    let cp = p.checkpoint();
    parse_concat(p);

    let negated = p.eat(TokenKind::NotKw);

    if p.at(TokenKind::BetweenKw) {
        p.bump_any();
        parse_concat(p);
        p.expect(TokenKind::AndKw);
        parse_concat(p);
        p.start_node_at(cp, SyntaxKind::BetweenExpr);
        p.finish();
    } else if p.at(TokenKind::InKw) {
        p.bump_any();
        p.expect(TokenKind::LParen);
        if !p.at(TokenKind::RParen) {
            loop {
                parse_expr(p);
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        p.expect(TokenKind::RParen);
        p.start_node_at(cp, SyntaxKind::InList);
        p.finish();
    } else if p.at(TokenKind::LikeKw) {
        p.bump_any();
        parse_concat(p);
        if p.eat(TokenKind::EscapeKw) {
            parse_concat(p);
        }
        p.start_node_at(cp, SyntaxKind::LikeExpr);
        p.finish();
    } else if negated {
        p.error(format!(
            "expected BETWEEN, IN or LIKE after NOT, found {:?}",
            p.current()
        ));
    } else if p.at(TokenKind::IsKw) {
        p.bump_any();
        p.eat(TokenKind::NotKw);
        p.expect(TokenKind::NullKw);
        p.start_node_at(cp, SyntaxKind::IsNullExpr);
        p.finish();
    } else if p.at(TokenKind::ComparisonOp) {
        p.bump_any();
        parse_concat(p);
        p.start_node_at(cp, SyntaxKind::Expression);
        p.finish();
    }
}

fn parse_concat(p: &mut Parser) {
    let cp = p.checkpoint();
    parse_additive(p);
    while p.at(TokenKind::DoublePipe) {
        p.bump_any();
        parse_additive(p);
        p.start_node_at(cp, SyntaxKind::Expression);
        p.finish();
    }
}

fn parse_additive(p: &mut Parser) {
    let cp = p.checkpoint();
    parse_term(p);
    while p.eat_one_of(&[TokenKind::Plus, TokenKind::Minus]) {
        parse_term(p);
        p.start_node_at(cp, SyntaxKind::Expression);
        p.finish();
    }
}

fn parse_term(p: &mut Parser) {
    let cp = p.checkpoint();
    parse_pow(p);
    while p.eat_one_of(&[TokenKind::Asterisk, TokenKind::Slash, TokenKind::ModKw]) {
        parse_pow(p);
        p.start_node_at(cp, SyntaxKind::Expression);
        p.finish();
    }
}

/// Right-associative: `2 ** 3 ** 2` parses as `2 ** (3 ** 2)`.
fn parse_pow(p: &mut Parser) {
    let cp = p.checkpoint();
    parse_unary(p);
    if p.at(TokenKind::StarStar) {
        p.bump_any();
        parse_pow(p);
        p.start_node_at(cp, SyntaxKind::Expression);
        p.finish();
    }
}

fn parse_unary(p: &mut Parser) {
    if matches!(p.current(), TokenKind::Plus | TokenKind::Minus | TokenKind::PriorKw) {
        let cp = p.checkpoint();
        p.bump_any();
        parse_unary(p);
        p.start_node_at(cp, SyntaxKind::Expression);
        p.finish();
    } else {
        parse_primary(p);
    }
}

fn parse_primary(p: &mut Parser) {
    match p.current() {
        TokenKind::Integer
        | TokenKind::Decimal
        | TokenKind::QuotedLiteral
        | TokenKind::NullKw
        | TokenKind::TrueKw
        | TokenKind::FalseKw => {
            p.start(SyntaxKind::Literal);
            p.bump_any();
            p.finish();
        }
        TokenKind::LParen => {
            p.start(SyntaxKind::Expression);
            p.bump_any();
            parse_expr(p);
            p.expect(TokenKind::RParen);
            p.finish();
        }
        TokenKind::CaseKw => parse_case_expression(p),
        TokenKind::Ident | TokenKind::DelimitedIdent => parse_name_or_call(p),
        other => {
            p.error(format!("expected an expression, found {other:?}"));
            p.start(SyntaxKind::Error);
            if !p.at_end() {
                p.bump_any();
            }
            p.finish();
        }
    }
}

/// A dotted identifier chain (`a`, `a.b`, `schema.pkg.func`), reinterpreted
/// as a [`SyntaxKind::FunctionCall`] if immediately followed by `(`, or a
/// [`SyntaxKind::ColumnRef`] otherwise. Which of element access, a plain
/// function call, or a member-method call this turns out to be is decided
/// later by the rewriter, which alone has catalog access (§4.5).
pub(crate) fn parse_name_or_call(p: &mut Parser) {
    let cp = p.checkpoint();
    let first_name = p.current_text().to_string();
    p.bump_any();
    let mut dotted = false;
    while p.at(TokenKind::Dot) {
        dotted = true;
        p.bump_any();
        p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    }
    if p.at(TokenKind::LParen) {
        p.start_node_at(cp, SyntaxKind::FunctionCall);
        if !dotted && first_name.eq_ignore_ascii_case("trim") {
            parse_trim_argument_list(p);
        } else {
            parse_argument_list(p);
        }
        if p.at(TokenKind::OverKw) {
            parse_over_clause(p);
        }
        p.finish();
    } else {
        p.start_node_at(cp, SyntaxKind::ColumnRef);
        p.finish();
    }
}

/// `TRIM([LEADING|TRAILING|BOTH] [chars] FROM s)` (§4.1, §4.4) doesn't fit
/// the generic comma-separated argument grammar: its `FROM` separator and
/// optional leading specifier keyword are SQL-standard syntax, not
/// ordinary expressions. Parsed into the same `ArgumentList` shape as a
/// plain call -- the specifier and `FROM` keyword tokens sit directly
/// under the node (not wrapped in an `Argument`) so `rewrite::functions`
/// can tell which of the four TRIM forms it is looking at via
/// `ArgumentList::keyword_tokens`.
fn parse_trim_argument_list(p: &mut Parser) {
    p.start(SyntaxKind::ArgumentList);
    p.expect(TokenKind::LParen);
    p.eat_one_of(&[TokenKind::LeadingKw, TokenKind::TrailingKw, TokenKind::BothKw]);
    if !p.at(TokenKind::FromKw) && !p.at(TokenKind::RParen) {
        p.start(SyntaxKind::Argument);
        parse_expr(p);
        p.finish();
    }
    if p.eat(TokenKind::FromKw) {
        p.start(SyntaxKind::Argument);
        parse_expr(p);
        p.finish();
    }
    p.expect(TokenKind::RParen);
    p.finish();
}

/// A window function's `OVER (PARTITION BY ... ORDER BY ...)` clause
/// (§4.1). Both the partition list and the `ORDER BY` are optional; an
/// empty `OVER ()` (Oracle's "over the whole result set" form, used by the
/// ROWNUM-as-row_number() rewrite) is legal too.
fn parse_over_clause(p: &mut Parser) {
    p.start(SyntaxKind::OverClause);
    p.expect(TokenKind::OverKw);
    p.expect(TokenKind::LParen);
    if p.eat(TokenKind::PartitionKw) {
        p.expect(TokenKind::ByKw);
        loop {
            parse_expr(p);
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
    }
    if p.at(TokenKind::OrderKw) {
        crate::grammar::query::parse_order_clause(p);
    }
    p.expect(TokenKind::RParen);
    p.finish();
}

fn parse_argument_list(p: &mut Parser) {
    p.start(SyntaxKind::ArgumentList);
    p.expect(TokenKind::LParen);
    if !p.at(TokenKind::RParen) {
        loop {
            p.start(SyntaxKind::Argument);
            p.eat_one_of(&[TokenKind::DistinctKw, TokenKind::AllKw]);
            if p.at(TokenKind::Asterisk) {
                p.bump_any();
            } else {
                parse_expr(p);
            }
            p.finish();
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
    }
    p.expect(TokenKind::RParen);
    p.finish();
}

fn parse_case_expression(p: &mut Parser) {
    p.start(SyntaxKind::CaseExpression);
    p.expect(TokenKind::CaseKw);
    if !p.at(TokenKind::WhenKw) {
        parse_expr(p);
    }
    while p.at(TokenKind::WhenKw) {
        p.start(SyntaxKind::WhenClause);
        p.bump_any();
        parse_expr(p);
        p.expect(TokenKind::ThenKw);
        parse_expr(p);
        p.finish();
    }
    if p.eat(TokenKind::ElseKw) {
        parse_expr(p);
    }
    p.expect(TokenKind::EndKw);
    p.eat(TokenKind::CaseKw);
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
        parse_expr(&mut p);
        p.finish();
        p.build()
    }

    #[test]
    fn concat_is_left_associative() {
        let parse = parse("a || b || c || d");
        assert!(parse.ok(), "{:?}", parse.errors);
        let root = parse.syntax();
        let count = root
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::Expression)
            .count();
        assert_eq!(count, 3);
    }

    #[test]
    fn between_wraps_three_operands() {
        let parse = parse("x between 1 and 10");
        assert!(parse.ok(), "{:?}", parse.errors);
        assert!(parse
            .syntax()
            .descendants()
            .any(|n| n.kind() == SyntaxKind::BetweenExpr));
    }

    #[test]
    fn function_call_vs_column_ref() {
        let call = parse("pkg.func(1, 2)");
        assert!(call
            .syntax()
            .descendants()
            .any(|n| n.kind() == SyntaxKind::FunctionCall));

        let col = parse("a.b.c");
        assert!(col
            .syntax()
            .descendants()
            .any(|n| n.kind() == SyntaxKind::ColumnRef));
    }

    #[test]
    fn trim_with_specifier_and_from_parses() {
        let parse = parse("trim(leading '0' from name)");
        assert!(parse.ok(), "{:?}", parse.errors);
        let call = parse.syntax().descendants().find_map(crate::ast::FunctionCall::cast).unwrap();
        let list = call.argument_list().unwrap();
        assert_eq!(list.arguments().len(), 2);
        assert!(list.keyword_tokens().iter().any(|t| t.text().eq_ignore_ascii_case("leading")));
        assert!(list.keyword_tokens().iter().any(|t| t.text().eq_ignore_ascii_case("from")));
    }

    #[test]
    fn trim_plain_form_has_one_argument_and_no_keywords() {
        let parse = parse("trim(name)");
        assert!(parse.ok(), "{:?}", parse.errors);
        let call = parse.syntax().descendants().find_map(crate::ast::FunctionCall::cast).unwrap();
        let list = call.argument_list().unwrap();
        assert_eq!(list.arguments().len(), 1);
        assert!(list.keyword_tokens().is_empty());
    }

    #[test]
    fn over_clause_with_partition_and_order_parses() {
        let parse = parse("rank() over (partition by dept_id order by salary desc)");
        assert!(parse.ok(), "{:?}", parse.errors);
        let call = parse.syntax().descendants().find_map(crate::ast::FunctionCall::cast).unwrap();
        let over = call.over_clause().unwrap();
        assert_eq!(over.partition_exprs().len(), 1);
        assert!(over.order_clause().is_some());
    }

    #[test]
    fn empty_over_clause_parses() {
        let parse = parse("row_number() over ()");
        assert!(parse.ok(), "{:?}", parse.errors);
        let call = parse.syntax().descendants().find_map(crate::ast::FunctionCall::cast).unwrap();
        let over = call.over_clause().unwrap();
        assert!(over.partition_exprs().is_empty());
        assert!(over.order_clause().is_none());
    }

    #[test]
    fn case_expression_parses() {
        let parse = parse("case when x = 1 then 'a' else 'b' end");
        assert!(parse.ok(), "{:?}", parse.errors);
        assert!(parse
            .syntax()
            .descendants()
            .any(|n| n.kind() == SyntaxKind::CaseExpression));
    }
}
