//! Typed AST nodes for `SELECT` statements (§4.2, §4.3 of the spec):
//! `WITH`, set operators, joins, `CONNECT BY`/`START WITH`, `ORDER BY`.

use crate::ast::{typed_syntax_node, AstNode};
use crate::syntax::{SyntaxKind, SyntaxNode};

typed_syntax_node!(
    SelectStmt,
    WithClause,
    CteDefinition,
    QueryBlock,
    SelectList,
    SelectItem,
    TableReference,
    JoinClause,
    WhereClause,
    GroupByClause,
    HavingClause,
    OrderClause,
    OrderItem,
    SetOp,
    ConnectByClause,
    StartWithClause,
);

impl SelectStmt {
    pub fn with_clause(&self) -> Option<WithClause> {
        self.syntax.children().find_map(WithClause::cast)
    }

    /// The top-level query block, or `None` if this statement is a bare
    /// [`SetOp`] chain with no further wrapping.
    pub fn query_block(&self) -> Option<QueryBlock> {
        self.syntax.children().find_map(QueryBlock::cast)
    }

    pub fn set_op(&self) -> Option<SetOp> {
        self.syntax.children().find_map(SetOp::cast)
    }

    pub fn order_clause(&self) -> Option<OrderClause> {
        self.syntax.children().find_map(OrderClause::cast)
    }
}

impl WithClause {
    pub fn is_recursive(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("recursive"))
    }

    pub fn ctes(&self) -> Vec<CteDefinition> {
        self.syntax.children().filter_map(CteDefinition::cast).collect()
    }

    /// `true` if this `WITH` clause declares an inline `FUNCTION`/`PROCEDURE`
    /// (Oracle's "with clause function" extension), which has no rewrite and
    /// must be rejected rather than translated (§4.2).
    pub fn has_inline_routines(&self) -> bool {
        self.syntax
            .children()
            .any(|n| n.kind() == SyntaxKind::InlineRoutineDecl)
    }
}

impl CteDefinition {
    pub fn name(&self) -> Option<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .find(|t| t.kind() == SyntaxKind::Ident)
            .map(|t| t.text().to_string())
    }

    pub fn body(&self) -> Option<SelectStmt> {
        self.syntax.children().find_map(SelectStmt::cast)
    }

    /// `true` if this CTE's body references its own name (a `CONNECT BY`
    /// query is rewritten into one of these, see §4.3).
    pub fn references_self(&self) -> bool {
        let Some(name) = self.name() else { return false };
        let Some(body) = self.body() else { return false };
        body.syntax()
            .descendants()
            .filter_map(TableReference::cast)
            .any(|t| t.name_parts().last().is_some_and(|n| n.eq_ignore_ascii_case(&name)))
    }
}

impl QueryBlock {
    pub fn is_distinct(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .take_while(|t| t.kind() != SyntaxKind::SelectList)
            .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("distinct"))
    }

    pub fn select_list(&self) -> Option<SelectList> {
        self.syntax.children().find_map(SelectList::cast)
    }

    pub fn from_items(&self) -> Vec<TableReference> {
        self.syntax.children().filter_map(TableReference::cast).collect()
    }

    pub fn joins(&self) -> Vec<JoinClause> {
        self.syntax.children().filter_map(JoinClause::cast).collect()
    }

    pub fn where_clause(&self) -> Option<WhereClause> {
        self.syntax.children().find_map(WhereClause::cast)
    }

    pub fn connect_by(&self) -> Option<ConnectByClause> {
        self.syntax.children().find_map(ConnectByClause::cast)
    }

    pub fn start_with(&self) -> Option<StartWithClause> {
        self.syntax.children().find_map(StartWithClause::cast)
    }

    pub fn group_by(&self) -> Option<GroupByClause> {
        self.syntax.children().find_map(GroupByClause::cast)
    }

    pub fn having(&self) -> Option<HavingClause> {
        self.syntax.children().find_map(HavingClause::cast)
    }

    /// `true` if this query block selects from no real table (`FROM dual`
    /// or no `FROM` at all), the condition under which `DUAL` is elided
    /// (§4.2).
    pub fn selects_from_dual_only(&self) -> bool {
        match self.from_items().as_slice() {
            [] => true,
            [single] => single.name_parts().last().is_some_and(|n| n.eq_ignore_ascii_case("dual")),
            _ => false,
        }
    }
}

impl SelectList {
    pub fn items(&self) -> Vec<SelectItem> {
        self.syntax.children().filter_map(SelectItem::cast).collect()
    }

    pub fn is_star(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .any(|t| t.kind() == SyntaxKind::ArithmeticOp && t.text() == "*")
    }
}

impl SelectItem {
    pub fn expr(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }

    pub fn alias(&self) -> Option<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .filter(|t| t.kind() == SyntaxKind::Ident)
            .last()
            .filter(|_| self.syntax.children().count() >= 1)
            .map(|t| t.text().to_string())
    }
}

/// Splits a flat `Ident [Dot Ident]* [Ident]?` token run into the dotted
/// name parts and a trailing alias. An `Ident` only extends the dotted name
/// when it immediately follows a `Dot`; any other trailing `Ident` (after
/// `AS` or bare) is the alias. Needed because a plain token-kind filter
/// can't tell `schema.table` (no alias) from `table alias` (no schema)
/// apart -- both are two `Ident` tokens.
fn split_name_and_alias(syntax: &SyntaxNode) -> (Vec<String>, Option<String>) {
    let tokens: Vec<_> = syntax
        .children_with_tokens()
        .filter_map(|el| el.into_token())
        .filter(|t| !t.kind().is_trivia())
        .collect();

    let mut name_parts = Vec::new();
    let mut alias = None;
    for (i, t) in tokens.iter().enumerate() {
        if t.kind() != SyntaxKind::Ident {
            continue;
        }
        let preceded_by_dot = i > 0 && tokens[i - 1].kind() == SyntaxKind::Dot;
        if name_parts.is_empty() || preceded_by_dot {
            name_parts.push(t.text().to_string());
        } else {
            alias = Some(t.text().to_string());
        }
    }
    (name_parts, alias)
}

impl TableReference {
    pub fn name_parts(&self) -> Vec<String> {
        split_name_and_alias(&self.syntax).0
    }

    /// The alias, if this reference carries one (the identifier following
    /// the dotted table name, with no `AS`/`.` in between).
    pub fn alias(&self) -> Option<String> {
        split_name_and_alias(&self.syntax).1
    }

    pub fn subquery(&self) -> Option<SelectStmt> {
        self.syntax.children().find_map(SelectStmt::cast)
    }
}

impl JoinClause {
    pub fn table(&self) -> Option<TableReference> {
        self.syntax.children().find_map(TableReference::cast)
    }

    pub fn on_condition(&self) -> Option<SyntaxNode> {
        self.syntax.children().find(|n| TableReference::cast(n.clone()).is_none())
    }

    pub fn is_outer(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .any(|t| {
                t.kind() == SyntaxKind::Keyword
                    && matches!(t.text().to_ascii_lowercase().as_str(), "left" | "right" | "full")
            })
    }
}

impl WhereClause {
    pub fn condition(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }
}

impl HavingClause {
    pub fn condition(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }
}

impl GroupByClause {
    pub fn items(&self) -> Vec<SyntaxNode> {
        self.syntax.children().collect()
    }
}

impl ConnectByClause {
    pub fn condition(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }

    pub fn is_nocycle(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("nocycle"))
    }
}

impl StartWithClause {
    pub fn condition(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }
}

impl OrderClause {
    pub fn items(&self) -> Vec<OrderItem> {
        self.syntax.children().filter_map(OrderItem::cast).collect()
    }
}

impl OrderItem {
    pub fn expr(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }

    pub fn is_desc(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("desc"))
    }

    /// Explicit `NULLS FIRST`/`NULLS LAST`, if written out (§4.2: Oracle's
    /// default differs from Postgres's and must be made explicit when
    /// absent).
    pub fn explicit_nulls(&self) -> Option<NullsOrder> {
        let kws: Vec<_> = self
            .syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .filter(|t| t.kind() == SyntaxKind::Keyword)
            .map(|t| t.text().to_ascii_lowercase())
            .collect();
        if kws.iter().any(|k| k == "first") {
            Some(NullsOrder::First)
        } else if kws.iter().any(|k| k == "last") {
            Some(NullsOrder::Last)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum NullsOrder {
    First,
    Last,
}

impl SetOp {
    pub fn operands(&self) -> Vec<SyntaxNode> {
        self.syntax.children().collect()
    }

    /// The set operator keyword, lowercased (`union`, `union all`,
    /// `intersect`, `minus`).
    pub fn operator(&self) -> String {
        let kws: Vec<_> = self
            .syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .filter(|t| t.kind() == SyntaxKind::Keyword)
            .map(|t| t.text().to_ascii_lowercase())
            .collect();
        kws.join(" ")
    }
}
