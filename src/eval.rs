//! The type evaluator (§4.3): assigns a conservative semantic type to an
//! expression node. Consulted wherever a rewrite's correctness depends on
//! knowing whether it's looking at text, a number, or something unknown.

use crate::ast::Expression;
use crate::context::Context;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TypeTag {
    Numeric,
    Text,
    DateTime,
    Boolean,
    Jsonb,
    /// A named user-defined object type, `schema.type`.
    Object(String),
    Unknown,
}

/// Given a context and an expression node, returns its semantic type. Must
/// be conservative: when uncertain, return [`TypeTag::Unknown`] rather than
/// guess -- the rewriter treats `Unknown` as "insert the safe cast" / "use
/// the NULL-safe form" (§4.3).
pub trait TypeEvaluator {
    fn eval(&self, ctx: &Context, node: &Expression) -> TypeTag;
}

/// The trivial evaluator exercised by tests (§6): always `Unknown`, which
/// is always a safe (if occasionally redundant) answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTypeEvaluator;

impl TypeEvaluator for DefaultTypeEvaluator {
    fn eval(&self, _ctx: &Context, _node: &Expression) -> TypeTag {
        TypeTag::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstNode;
    use crate::catalog::build_empty_indices;
    use crate::context::Context;

    #[test]
    fn default_evaluator_is_always_unknown() {
        let indices = build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        let parse = crate::parse_select("select 1 + 1 from dual").unwrap();
        let expr = parse
            .syntax()
            .descendants()
            .find_map(Expression::cast)
            .expect("`1 + 1` parses to a binary Expression node");
        assert_eq!(DefaultTypeEvaluator.eval(&ctx, &expr), TypeTag::Unknown);
    }
}
