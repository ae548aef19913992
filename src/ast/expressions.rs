//! Typed AST nodes for the expression grammar (§4.1, §4.4 of the spec).

use crate::ast::{typed_syntax_node, typed_syntax_token, AstNode, AstToken};
use crate::syntax::{SyntaxKind, SyntaxNode, SyntaxToken};

typed_syntax_node!(
    Expression,
    LogicOp,
    BetweenExpr,
    InList,
    IsNullExpr,
    LikeExpr,
    CaseExpression,
    WhenClause,
    ColumnRef,
    Literal,
    FunctionCall,
    ArgumentList,
    Argument,
    OverClause,
);

typed_syntax_token!(Ident, ComparisonOp, ArithmeticOp, Concat);

impl Ident {
    pub fn name(&self) -> String {
        self.syntax.text().to_string()
    }
}

impl ColumnRef {
    /// The dot-separated identifier parts of this reference, e.g.
    /// `["a", "b", "c"]` for `a.b.c`, in source order and source casing.
    pub fn parts(&self) -> Vec<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .filter(|t| t.kind() == SyntaxKind::Ident)
            .map(|t| t.text().to_string())
            .collect()
    }

    pub fn first_ident_token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .find(|t| t.kind() == SyntaxKind::Ident)
    }
}

impl FunctionCall {
    /// The dot-separated name parts preceding the argument list, e.g.
    /// `["pkg", "func"]` for `pkg.func(...)`.
    pub fn name_parts(&self) -> Vec<String> {
        self.syntax
            .children_with_tokens()
            .take_while(|el| {
                el.as_node()
                    .map(|n| n.kind() != SyntaxKind::ArgumentList)
                    .unwrap_or(true)
            })
            .filter_map(|el| el.into_token())
            .filter(|t| t.kind() == SyntaxKind::Ident)
            .map(|t| t.text().to_string())
            .collect()
    }

    pub fn argument_list(&self) -> Option<ArgumentList> {
        self.syntax.children().find_map(ArgumentList::cast)
    }

    /// The raw, unparenthesized name as written in the source (used to
    /// recognize builtins like `NVL`/`DECODE`/`SUBSTR` case-insensitively).
    pub fn simple_name(&self) -> Option<String> {
        self.name_parts().last().cloned()
    }

    /// The trailing `OVER (...)` clause of a window function call, if any
    /// (§4.1).
    pub fn over_clause(&self) -> Option<OverClause> {
        self.syntax.children().find_map(OverClause::cast)
    }
}

impl OverClause {
    /// The `PARTITION BY` expressions, in source order. Direct `Expression`-
    /// shaped children of this node that precede the nested `OrderClause`
    /// (if any) are partition expressions; there is nothing else under this
    /// node besides those and the optional order clause.
    pub fn partition_exprs(&self) -> Vec<SyntaxNode> {
        self.syntax
            .children()
            .filter(|n| n.kind() != SyntaxKind::OrderClause)
            .collect()
    }

    pub fn order_clause(&self) -> Option<crate::ast::OrderClause> {
        self.syntax.children().find_map(crate::ast::OrderClause::cast)
    }
}

impl ArgumentList {
    pub fn arguments(&self) -> Vec<Argument> {
        self.syntax.children().filter_map(Argument::cast).collect()
    }

    /// Bare keyword tokens sitting directly under this node rather than
    /// inside an `Argument` -- currently only produced by TRIM's
    /// `[LEADING|TRAILING|BOTH] ... FROM` specifier grammar (§4.1).
    pub fn keyword_tokens(&self) -> Vec<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .filter(|t| t.kind() == SyntaxKind::Keyword)
            .collect()
    }
}

impl Argument {
    pub fn expr(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }
}

impl CaseExpression {
    /// The subject expression for a simple `CASE x WHEN ...`, or `None` for
    /// a searched `CASE WHEN cond THEN ...`.
    pub fn subject(&self) -> Option<SyntaxNode> {
        self.syntax
            .children()
            .take_while(|n| n.kind() != SyntaxKind::WhenClause)
            .find(|n| n.kind() != SyntaxKind::WhenClause)
    }

    pub fn when_clauses(&self) -> Vec<WhenClause> {
        self.syntax.children().filter_map(WhenClause::cast).collect()
    }

    /// The trailing `ELSE` expression, if any (the last child node after
    /// the last `WhenClause` that isn't itself a `WhenClause`).
    pub fn else_expr(&self) -> Option<SyntaxNode> {
        let whens: Vec<_> = self.syntax.children().collect();
        let last_when_idx = whens.iter().rposition(|n| n.kind() == SyntaxKind::WhenClause)?;
        whens.get(last_when_idx + 1).cloned()
    }
}

impl WhenClause {
    pub fn condition_or_value(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }

    pub fn result(&self) -> Option<SyntaxNode> {
        self.syntax.children().nth(1)
    }
}

