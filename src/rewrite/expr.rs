//! Expression emission (§4.4): a recursive text-producing walk over the
//! generic `Expression` node plus the handful of shaped expression nodes
//! (`BetweenExpr`, `InList`, `LikeExpr`, `IsNullExpr`, `CaseExpression`,
//! `ColumnRef`, `Literal`, `FunctionCall`). The tree is never edited --
//! every function below returns the text to splice into its caller.

use crate::ast::{
    AstNode, AstToken, BetweenExpr, CaseExpression, ColumnRef, FunctionCall, Ident, InList,
    IsNullExpr, LikeExpr, LogicOp,
};
use crate::context::{Context, EmissionMode, InlineTypeKind};
use crate::error::TransformError;
use crate::rewrite::functions;
use crate::rewrite::names;
use crate::syntax::{SyntaxKind, SyntaxNode};
use crate::util::fold;

/// Emits the text for any expression-shaped node. Called both from SELECT
/// rewriting and from PL/SQL statement rewriting -- expressions are shared
/// grammar, but `ctx` carries enough (`current_package`, `local_names`,
/// `inline_types`) to disambiguate package-variable access and jsonb
/// element access in PL/SQL bodies without a separate code path.
pub fn rewrite_expr(node: &SyntaxNode, ctx: &Context) -> Result<String, TransformError> {
    match node.kind() {
        SyntaxKind::Literal => Ok(node.text().to_string()),
        SyntaxKind::ColumnRef => rewrite_column_ref(&ColumnRef::cast(node.clone()).unwrap(), ctx),
        SyntaxKind::FunctionCall => rewrite_function_call(&FunctionCall::cast(node.clone()).unwrap(), ctx),
        SyntaxKind::LogicOp => rewrite_logic_op(&LogicOp::cast(node.clone()).unwrap(), ctx),
        SyntaxKind::BetweenExpr => rewrite_between(&BetweenExpr::cast(node.clone()).unwrap(), ctx),
        SyntaxKind::InList => rewrite_in_list(&InList::cast(node.clone()).unwrap(), ctx),
        SyntaxKind::LikeExpr => rewrite_like(&LikeExpr::cast(node.clone()).unwrap(), ctx),
        SyntaxKind::IsNullExpr => rewrite_is_null(&IsNullExpr::cast(node.clone()).unwrap(), ctx),
        SyntaxKind::CaseExpression => rewrite_case(&CaseExpression::cast(node.clone()).unwrap(), ctx),
        SyntaxKind::Expression => rewrite_generic_expression(node, ctx),
        SyntaxKind::Error => Err(TransformError::unsupported("a malformed expression")),
        other => Err(TransformError::unsupported(format!("expression node {other:?}"))),
    }
}

fn child_nodes(node: &SyntaxNode) -> Vec<SyntaxNode> {
    node.children().collect()
}

fn operator_token(node: &SyntaxNode) -> Option<crate::syntax::SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|el| el.into_token())
        .find(|t| matches!(t.kind(), SyntaxKind::ComparisonOp | SyntaxKind::ArithmeticOp | SyntaxKind::Concat))
}

/// `Expression` covers parenthesized sub-expressions, binary comparison,
/// concatenation, arithmetic, and prefix unary/`PRIOR` -- all distinguished
/// by their operator token rather than by node kind (see the grammar's
/// module doc).
fn rewrite_generic_expression(node: &SyntaxNode, ctx: &Context) -> Result<String, TransformError> {
    let children = child_nodes(node);

    if children.len() == 1 {
        // Either `(expr)` or a prefix unary/`PRIOR` operator.
        let has_paren = node
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .any(|t| t.kind() == SyntaxKind::LParen);
        let inner = rewrite_expr(&children[0], ctx)?;
        if has_paren {
            return Ok(format!("({inner})"));
        }
        let prefix = node
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .find(|t| matches!(t.kind(), SyntaxKind::ArithmeticOp | SyntaxKind::Keyword));
        return match prefix {
            Some(t) if t.text().eq_ignore_ascii_case("prior") => {
                // `PRIOR` has no direct Postgres equivalent; the CONNECT BY
                // rewriter strips it entirely before emitting the join
                // condition, so reaching here means it's used outside a
                // CONNECT BY clause.
                Err(TransformError::unsupported_with_hint(
                    "PRIOR outside CONNECT BY",
                    "PRIOR is only meaningful inside a CONNECT BY condition",
                ))
            }
            Some(t) => Ok(format!("{}{inner}", t.text())),
            None => Ok(inner),
        };
    }

    if children.len() == 2 {
        let lhs = rewrite_expr(&children[0], ctx)?;
        let rhs = rewrite_expr(&children[1], ctx)?;
        let op = operator_token(node).map(|t| t.text().to_string()).unwrap_or_default();
        return Ok(match op.as_str() {
            "||" => format!("CONCAT({lhs}, {rhs})"),
            "**" => format!("({lhs} ^ {rhs})"),
            _ if op.eq_ignore_ascii_case("mod") => format!("MOD({lhs}, {rhs})"),
            _ => format!("{lhs} {op} {rhs}"),
        });
    }

    Err(TransformError::unsupported("expression shape"))
}

fn rewrite_logic_op(node: &LogicOp, ctx: &Context) -> Result<String, TransformError> {
    let syntax = node.syntax();
    let children = child_nodes(syntax);
    let keyword = syntax
        .children_with_tokens()
        .filter_map(|el| el.into_token())
        .find(|t| matches!(t.kind(), SyntaxKind::And | SyntaxKind::Or | SyntaxKind::Not))
        .map(|t| t.text().to_ascii_uppercase())
        .unwrap_or_default();

    if children.len() == 1 {
        let inner = rewrite_expr(&children[0], ctx)?;
        return Ok(format!("{keyword} {inner}"));
    }
    if children.len() == 2 {
        let lhs = rewrite_expr(&children[0], ctx)?;
        let rhs = rewrite_expr(&children[1], ctx)?;
        return Ok(format!("{lhs} {keyword} {rhs}"));
    }
    Err(TransformError::unsupported("logic expression shape"))
}

fn rewrite_between(node: &BetweenExpr, ctx: &Context) -> Result<String, TransformError> {
    let syntax = node.syntax();
    let children = child_nodes(syntax);
    if children.len() != 3 {
        return Err(TransformError::unsupported("BETWEEN expression shape"));
    }
    let negated = syntax
        .children_with_tokens()
        .filter_map(|el| el.into_token())
        .any(|t| t.kind() == SyntaxKind::Not);
    let subject = rewrite_expr(&children[0], ctx)?;
    let lo = rewrite_expr(&children[1], ctx)?;
    let hi = rewrite_expr(&children[2], ctx)?;
    let not = if negated { "NOT " } else { "" };
    Ok(format!("{subject} {not}BETWEEN {lo} AND {hi}"))
}

fn rewrite_in_list(node: &InList, ctx: &Context) -> Result<String, TransformError> {
    let syntax = node.syntax();
    let children = child_nodes(syntax);
    let negated = syntax
        .children_with_tokens()
        .filter_map(|el| el.into_token())
        .any(|t| t.kind() == SyntaxKind::Not);
    let Some((subject, rest)) = children.split_first() else {
        return Err(TransformError::unsupported("IN expression shape"));
    };
    let subject = rewrite_expr(subject, ctx)?;
    let items = rest
        .iter()
        .map(|n| rewrite_expr(n, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    let not = if negated { "NOT " } else { "" };
    Ok(format!("{subject} {not}IN ({})", items.join(", ")))
}

fn rewrite_like(node: &LikeExpr, ctx: &Context) -> Result<String, TransformError> {
    let syntax = node.syntax();
    let children = child_nodes(syntax);
    let negated = syntax
        .children_with_tokens()
        .filter_map(|el| el.into_token())
        .any(|t| t.kind() == SyntaxKind::Not);
    let not = if negated { "NOT " } else { "" };
    match children.as_slice() {
        [subject, pattern] => {
            let subject = rewrite_expr(subject, ctx)?;
            let pattern = rewrite_expr(pattern, ctx)?;
            Ok(format!("{subject} {not}LIKE {pattern}"))
        }
        [subject, pattern, escape] => {
            let subject = rewrite_expr(subject, ctx)?;
            let pattern = rewrite_expr(pattern, ctx)?;
            let escape = rewrite_expr(escape, ctx)?;
            Ok(format!("{subject} {not}LIKE {pattern} ESCAPE {escape}"))
        }
        _ => Err(TransformError::unsupported("LIKE expression shape")),
    }
}

fn rewrite_is_null(node: &IsNullExpr, ctx: &Context) -> Result<String, TransformError> {
    let syntax = node.syntax();
    let children = child_nodes(syntax);
    let Some(subject) = children.first() else {
        return Err(TransformError::unsupported("IS NULL expression shape"));
    };
    let negated = syntax
        .children_with_tokens()
        .filter_map(|el| el.into_token())
        .any(|t| t.kind() == SyntaxKind::Not);
    let subject = rewrite_expr(subject, ctx)?;
    let not = if negated { "NOT " } else { "" };
    Ok(format!("{subject} IS {not}NULL"))
}

fn rewrite_case(node: &CaseExpression, ctx: &Context) -> Result<String, TransformError> {
    let mut out = String::from("CASE");
    if let Some(subject) = node.subject() {
        out.push(' ');
        out.push_str(&rewrite_expr(&subject, ctx)?);
    }
    for when in node.when_clauses() {
        let cond = when
            .condition_or_value()
            .ok_or_else(|| TransformError::unsupported("CASE WHEN with no condition"))?;
        let result = when
            .result()
            .ok_or_else(|| TransformError::unsupported("CASE WHEN with no result"))?;
        out.push_str(" WHEN ");
        out.push_str(&rewrite_expr(&cond, ctx)?);
        out.push_str(" THEN ");
        out.push_str(&rewrite_expr(&result, ctx)?);
    }
    if let Some(else_expr) = node.else_expr() {
        out.push_str(" ELSE ");
        out.push_str(&rewrite_expr(&else_expr, ctx)?);
    }
    out.push_str(" END");
    Ok(out)
}

fn rewrite_column_ref(node: &ColumnRef, ctx: &Context) -> Result<String, TransformError> {
    let parts = node.parts();

    if let Some(seq) = names::resolve_sequence_pseudo_column(ctx, &parts) {
        return Ok(seq);
    }

    if parts.len() == 1 && parts[0].eq_ignore_ascii_case("sysdate") {
        return Ok("CURRENT_TIMESTAMP".to_string());
    }
    if is_level_reference(&parts) && ctx.connect_by_mode().is_some() {
        return Ok(level_replacement(ctx.connect_by_mode()).to_string());
    }
    if parts.len() == 1 && parts[0].eq_ignore_ascii_case("rownum") {
        // Handled structurally by the query rewriter (WHERE-clause LIMIT
        // form or SELECT-list `row_number()` form); reaching here means
        // ROWNUM appeared somewhere neither rewrite recognized.
        return Err(TransformError::unsupported_with_hint(
            "ROWNUM outside a WHERE clause or SELECT list",
            "rewrite the query into an explicit LIMIT or ROW_NUMBER() window",
        ));
    }

    // Package-variable access, in any of the three forms the design notes
    // (§4.5): bare `g_var`, `pkg.g_var`, `schema.pkg.g_var`. Locals shadow
    // package variables of the same name.
    if !parts.is_empty() && !ctx.is_local_name(&parts[0]) {
        if let Some(access) = package_variable_access(ctx, &parts) {
            return Ok(access);
        }
    }

    // In a CONNECT BY recursive arm the source table is aliased `t`, while
    // the hierarchy CTE itself is aliased `h` -- a bare, single-part column
    // shared by both would otherwise be ambiguous (§4.4).
    if parts.len() == 1 && ctx.connect_by_mode() == Some(EmissionMode::RecursiveArm) {
        return Ok(format!("t.{}", parts[0]));
    }

    // A plain column/local-variable reference: pass through verbatim,
    // preserving source casing (§3's casing invariant).
    Ok(parts.join("."))
}

fn package_variable_access(ctx: &Context, parts: &[String]) -> Option<String> {
    let (schema, package, var) = match parts {
        [var] => {
            let package = ctx.current_package.as_ref()?;
            (ctx.active_schema.clone(), package.clone(), var.clone())
        }
        [pkg, var] => {
            let current = ctx.current_package.as_ref()?;
            if !current.eq_ignore_ascii_case(pkg) {
                return None;
            }
            (ctx.active_schema.clone(), pkg.clone(), var.clone())
        }
        [schema, pkg, var] => (schema.clone(), pkg.clone(), var.clone()),
        _ => return None,
    };

    // Only rewrite when this really is a known package variable; otherwise
    // leave the name alone (it might be an ordinary qualified column).
    let key = crate::util::qualify(&schema, &package);
    ctx.package_variables?.get(&key)?.get(&fold(var))?;

    Some(format!("{}.{}__get_{}()", fold(&schema), fold(&package), fold(var)))
}

fn rewrite_function_call(node: &FunctionCall, ctx: &Context) -> Result<String, TransformError> {
    let parts = node.name_parts();
    let args = node
        .argument_list()
        .map(|al| al.arguments())
        .unwrap_or_default();

    let Some(simple_name) = node.simple_name() else {
        return Err(TransformError::unsupported("function call with no name"));
    };

    // `COUNT(*)` and friends: a bare `*` argument has no expr node.
    let is_star_only = args.len() == 1 && args[0].expr().is_none();

    // Element access into a locally-declared array/map (§4.5): a one-part
    // name matching a registered inline collection type, with exactly one
    // argument.
    if parts.len() == 1 && args.len() == 1 && !is_star_only {
        if let Some(info) = ctx.inline_type(&simple_name) {
            return rewrite_collection_element_access(ctx, &simple_name, &info, &args[0]);
        }
    }

    if functions::is_builtin(&simple_name) {
        return functions::rewrite_builtin(ctx, &simple_name, node);
    }

    let rendered_args = if is_star_only {
        "*".to_string()
    } else {
        args.iter()
            .map(|a| render_argument(a, ctx))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ")
    };

    // `alias.column.method(args)` where `column` is a table column declared
    // with a user-defined object type and `method` is in that type's method
    // set (§4.5). Syntactically identical to `schema.pkg.func(...)`, so it
    // is only recognized once the catalog actually backs it; otherwise the
    // ordinary three-part dispatch below applies.
    if let [alias, field, method] = parts.as_slice() {
        if let Some(call_text) = resolve_member_method_call(ctx, alias, field, method, &rendered_args) {
            return Ok(call_text);
        }
    }

    let call_text = match parts.as_slice() {
        [single] => format!("{}({rendered_args})", names::resolve_bare_function(ctx, single)),
        [pkg, func] => format!("{}({rendered_args})", names::resolve_package_function(ctx, pkg, func)),
        [schema, pkg, func] => format!("{}.{}__{}({rendered_args})", fold(schema), fold(pkg), fold(func)),
        _ => return Err(TransformError::unsupported("function call with unexpected name shape")),
    };

    match node.over_clause() {
        Some(over) => Ok(format!("{call_text} {}", rewrite_over_clause(&over, ctx)?)),
        None => Ok(call_text),
    }
}

/// Renders a window function's `OVER (PARTITION BY ... ORDER BY ...)` clause
/// (§4.1). An empty `OVER ()` (no partition, no order) is legal and renders
/// as-is.
fn rewrite_over_clause(over: &crate::ast::OverClause, ctx: &Context) -> Result<String, TransformError> {
    let mut parts = Vec::new();
    let partitions = over
        .partition_exprs()
        .iter()
        .map(|e| rewrite_expr(e, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    if !partitions.is_empty() {
        parts.push(format!("PARTITION BY {}", partitions.join(", ")));
    }
    if let Some(order) = over.order_clause() {
        parts.push(format!("ORDER BY {}", crate::rewrite::query::rewrite_order_clause(&order, ctx)?));
    }
    Ok(format!("OVER ({})", parts.join(" ")))
}

/// Resolves `alias.field.method(args)` into `type__method(alias.field,
/// args)` when `alias` is a registered `FROM`/join alias, `field` is one of
/// its table's columns, that column's declared type is a known object type,
/// and `method` is in that type's method set. Returns `None` the moment any
/// of those checks fails, letting the caller fall back to treating the call
/// as `schema.pkg.func(...)`.
fn resolve_member_method_call(ctx: &Context, alias: &str, field: &str, method: &str, rendered_args: &str) -> Option<String> {
    let (schema, table) = ctx.alias_table(alias)?;
    let cols = ctx.catalog.columns_of(&schema, &table)?;
    let info = cols.get(&fold(field))?;
    let type_schema = info.type_owner_schema.clone().unwrap_or(schema);
    if !ctx.catalog.is_object_type(&type_schema, &info.base_type) {
        return None;
    }
    let type_name = fold(&info.base_type);
    let methods = ctx.catalog.methods_of(&type_schema, &type_name)?;
    if !methods.contains(&fold(method)) {
        return None;
    }
    let instance = format!("{alias}.{field}");
    Some(if rendered_args.is_empty() {
        format!("{type_name}__{}({instance})", fold(method))
    } else {
        format!("{type_name}__{}({instance}, {rendered_args})", fold(method))
    })
}

fn render_argument(arg: &crate::ast::Argument, ctx: &Context) -> Result<String, TransformError> {
    let expr = arg
        .expr()
        .ok_or_else(|| TransformError::unsupported("empty function argument"))?;
    rewrite_expr(&expr, ctx)
}

fn rewrite_collection_element_access(
    ctx: &Context,
    var: &str,
    info: &crate::context::InlineTypeInfo,
    arg: &crate::ast::Argument,
) -> Result<String, TransformError> {
    let index_expr = arg
        .expr()
        .ok_or_else(|| TransformError::unsupported("empty collection index"))?;

    match info.kind {
        // `v('k')` reads the raw jsonb text value at key `k`; §4.5 gives no
        // outer cast for map reads (the element type of a `TABLE OF T INDEX
        // BY K` is not tracked for map values the way it is for arrays).
        InlineTypeKind::Map => {
            let key = rewrite_expr(&index_expr, ctx)?;
            Ok(format!("({var} ->> {key})"))
        }
        // `v(i)` casts the extracted text back to the array's declared
        // element type; an integer-literal index shifts at rewrite time,
        // a variable index shifts (and is cast to `int`) at runtime (§4.5).
        InlineTypeKind::Array => {
            let elem_type = info.element_type.as_deref().unwrap_or("numeric");
            if is_integer_literal(&index_expr) {
                let shifted = shift_index_to_zero_based(&index_expr, ctx)?;
                Ok(format!("({var} ->> {shifted})::{elem_type}"))
            } else {
                let rendered = rewrite_expr(&index_expr, ctx)?;
                Ok(format!("({var} ->> ({rendered} - 1)::int)::{elem_type}"))
            }
        }
        InlineTypeKind::Record => Err(TransformError::unsupported(
            "calling a record-typed local variable as if it were a collection",
        )),
    }
}

fn is_integer_literal(node: &SyntaxNode) -> bool {
    node.kind() == SyntaxKind::Literal
        && node
            .first_token()
            .is_some_and(|t| t.kind() == SyntaxKind::Integer)
}

/// Oracle arrays are 1-based; jsonb arrays are 0-based. A literal integer
/// index is shifted at rewrite time; a variable/expression index is
/// shifted at runtime with `(expr - 1)` (§4.5).
pub fn shift_index_to_zero_based(index: &SyntaxNode, ctx: &Context) -> Result<String, TransformError> {
    if index.kind() == SyntaxKind::Literal {
        if let Some(token) = index.first_token() {
            if token.kind() == SyntaxKind::Integer {
                let n: i64 = token.text().parse().map_err(|_| TransformError::unsupported("non-integer array index"))?;
                return Ok((n - 1).to_string());
            }
        }
    }
    let rendered = rewrite_expr(index, ctx)?;
    Ok(format!("({rendered} - 1)"))
}

/// Whether `node` resolves (syntactically) to a simple identifier token --
/// used by the PL/SQL statement rewriter to special-case assignment
/// targets that are package variables or collection elements.
pub fn ident_text(node: &SyntaxNode) -> Option<String> {
    Ident::cast(node.first_token()?).map(|t| t.name())
}

/// Determines which `EmissionMode` currently applies to `LEVEL`
/// references; used by [`rewrite_column_ref`]'s caller in the CONNECT BY
/// rewriter, kept here so both modules share the same keyword text match.
pub fn is_level_reference(parts: &[String]) -> bool {
    matches!(parts, [single] if single.eq_ignore_ascii_case("level"))
}

pub fn level_replacement(mode: Option<EmissionMode>) -> &'static str {
    match mode {
        Some(EmissionMode::BaseArm) => "1",
        Some(EmissionMode::RecursiveArm) => "h.level + 1",
        _ => "level",
    }
}
