//! A typed AST layer over the lossless [`crate::syntax::SyntaxNode`] tree,
//! following the teacher's `typed_syntax!` macro pattern: every AST type is
//! a thin newtype around a [`SyntaxNode`]/[`SyntaxToken`], constructed by
//! `cast`-ing a node of the matching [`SyntaxKind`].
//!
//! Not every [`SyntaxKind`] gets a typed wrapper here -- per the design
//! note "node variants over inheritance", most of the rewriter dispatches
//! directly on `SyntaxKind` via `match`. Typed accessors are provided where
//! a rewrite needs to reshape structure (SELECT, CONNECT BY, PL/SQL
//! headers) rather than just substitute text for a single node.

mod expressions;
mod plsql;
mod query;

pub use expressions::*;
pub use plsql::*;
pub use query::*;

use crate::syntax::{SyntaxKind, SyntaxNode, SyntaxToken};

/// Interface for typed AST nodes, analogous to `rowan::ast::AstNode` but
/// specialized to our single [`crate::syntax::OraLang`] language.
pub trait AstNode {
    fn can_cast(kind: SyntaxKind) -> bool
    where
        Self: Sized;

    fn cast(syntax: SyntaxNode) -> Option<Self>
    where
        Self: Sized;

    fn syntax(&self) -> &SyntaxNode;
}

/// Interface for typed AST tokens, analogous to [`AstNode`].
pub trait AstToken {
    fn can_cast(kind: SyntaxKind) -> bool
    where
        Self: Sized;

    fn cast(token: SyntaxToken) -> Option<Self>
    where
        Self: Sized;

    fn syntax(&self) -> &SyntaxToken;

    fn text(&self) -> &str {
        self.syntax().text()
    }
}

macro_rules! typed_syntax_node {
    ($( $name:ident ),+ $(,)?) => {
        $(
            #[derive(Debug, Clone, Eq, PartialEq, Hash)]
            pub struct $name {
                pub(crate) syntax: crate::syntax::SyntaxNode,
            }

            impl crate::ast::AstNode for $name {
                fn can_cast(kind: crate::syntax::SyntaxKind) -> bool {
                    kind == crate::syntax::SyntaxKind::$name
                }

                fn cast(syntax: crate::syntax::SyntaxNode) -> Option<Self> {
                    if Self::can_cast(syntax.kind()) {
                        Some(Self { syntax })
                    } else {
                        None
                    }
                }

                fn syntax(&self) -> &crate::syntax::SyntaxNode {
                    &self.syntax
                }
            }
        )+
    };
}

macro_rules! typed_syntax_token {
    ($( $name:ident ),+ $(,)?) => {
        $(
            #[derive(Debug, Clone, Eq, PartialEq, Hash)]
            pub struct $name {
                pub(crate) syntax: crate::syntax::SyntaxToken,
            }

            impl crate::ast::AstToken for $name {
                fn can_cast(kind: crate::syntax::SyntaxKind) -> bool {
                    kind == crate::syntax::SyntaxKind::$name
                }

                fn cast(syntax: crate::syntax::SyntaxToken) -> Option<Self> {
                    if Self::can_cast(syntax.kind()) {
                        Some(Self { syntax })
                    } else {
                        None
                    }
                }

                fn syntax(&self) -> &crate::syntax::SyntaxToken {
                    &self.syntax
                }
            }
        )+
    };
}

pub(self) use {typed_syntax_node, typed_syntax_token};

typed_syntax_node!(Root);

impl Root {
    pub fn function(&self) -> Option<Function> {
        self.syntax.children().find_map(Function::cast)
    }

    pub fn procedure(&self) -> Option<Procedure> {
        self.syntax.children().find_map(Procedure::cast)
    }

    pub fn package(&self) -> Option<PackageSpec> {
        self.syntax.children().find_map(PackageSpec::cast)
    }

    pub fn package_body(&self) -> Option<PackageBody> {
        self.syntax.children().find_map(PackageBody::cast)
    }

    pub fn query(&self) -> Option<SelectStmt> {
        self.syntax.children().find_map(SelectStmt::cast)
    }
}

/// Returns the text of every token directly or transitively under `node`
/// for which `pred` holds, in document order. Used widely by rewrites that
/// just need to find/count particular tokens rather than reshape
/// structure (teacher's `Expression::filter_tokens`).
pub fn filter_tokens<'a>(
    node: &'a SyntaxNode,
    pred: impl Fn(&SyntaxToken) -> bool + 'a,
) -> impl Iterator<Item = SyntaxToken> + 'a {
    node.descendants_with_tokens()
        .filter_map(|el| el.into_token())
        .filter(move |t| pred(t))
}
