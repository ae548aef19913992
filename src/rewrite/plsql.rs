//! PL/SQL body rewriting (§4.5): function/procedure signature synthesis,
//! `DECLARE` section emission (including the local `RECORD`/`TABLE OF`
//! types that become jsonb), and the statement language. Expression text
//! itself is always delegated to [`crate::rewrite::expr::rewrite_expr`] --
//! this module only knows the statement shapes around it.

use crate::ast::{
    AstNode, Assignment, ColumnRef, Datatype, DeclareSection, ExceptionHandler, ExitStmt,
    ForLoopStmt, Function, FunctionCall, IfStmt, LoopStmt, Param, ParamList, Procedure,
    ReturnStmt, SelectStmt, StatementList, WhileLoopStmt,
};
use crate::context::{Context, InlineTypeInfo, InlineTypeKind};
use crate::error::TransformError;
use crate::rewrite::expr::{rewrite_expr, shift_index_to_zero_based};
use crate::rewrite;
use crate::syntax::{SyntaxKind, SyntaxNode};
use crate::util::{fold, qualify};

pub fn rewrite_function(func: &Function, ctx: &Context) -> Result<String, TransformError> {
    let header = func
        .header()
        .ok_or_else(|| TransformError::unsupported("function with no header"))?;
    let name = header
        .name()
        .ok_or_else(|| TransformError::unsupported("function with no name"))?;
    let params_text = render_params(ctx, header.params())?;
    let return_dt = header
        .return_type()
        .ok_or_else(|| TransformError::unsupported("function with no return type"))?;
    let return_type = map_datatype(ctx, &return_dt);

    let body = func
        .body()
        .ok_or_else(|| TransformError::unsupported("function with no body"))?;
    register_param_locals(ctx, header.params());
    let body_text = render_body(
        ctx,
        &name,
        body.declare_section(),
        body.statements(),
        body.exception_handlers(),
    )?;

    Ok(format!(
        "CREATE OR REPLACE FUNCTION {}.{}({params_text}) RETURNS {return_type} LANGUAGE plpgsql AS $$\n{body_text}\n$$;",
        fold(&ctx.active_schema),
        fold(&name)
    ))
}

pub fn rewrite_procedure(proc: &Procedure, ctx: &Context) -> Result<String, TransformError> {
    let header = proc
        .header()
        .ok_or_else(|| TransformError::unsupported("procedure with no header"))?;
    let name = header
        .name()
        .ok_or_else(|| TransformError::unsupported("procedure with no name"))?;
    let params_text = render_params(ctx, header.params())?;

    let body = proc
        .body()
        .ok_or_else(|| TransformError::unsupported("procedure with no body"))?;
    register_param_locals(ctx, header.params());
    let body_text = render_body(
        ctx,
        &name,
        body.declare_section(),
        body.statements(),
        body.exception_handlers(),
    )?;

    Ok(format!(
        "CREATE OR REPLACE PROCEDURE {}.{}({params_text}) LANGUAGE plpgsql AS $$\n{body_text}\n$$;",
        fold(&ctx.active_schema),
        fold(&name)
    ))
}

fn register_param_locals(ctx: &Context, params: Option<ParamList>) {
    if let Some(params) = params {
        for p in params.params() {
            if let Some(name) = p.name() {
                ctx.register_local_name(&name);
            }
        }
    }
}

fn render_params(ctx: &Context, params: Option<ParamList>) -> Result<String, TransformError> {
    let Some(params) = params else {
        return Ok(String::new());
    };
    let rendered = params
        .params()
        .iter()
        .map(|p| render_param(ctx, p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rendered.join(", "))
}

fn render_param(ctx: &Context, param: &Param) -> Result<String, TransformError> {
    let name = param
        .name()
        .ok_or_else(|| TransformError::unsupported("parameter with no name"))?;
    let dt = param
        .datatype()
        .ok_or_else(|| TransformError::unsupported("parameter with no type"))?;
    let pg_type = map_datatype(ctx, &dt);
    let mode = match (param.is_in(), param.is_out()) {
        (true, true) => "INOUT",
        (_, true) => "OUT",
        _ => "IN",
    };
    Ok(format!("{mode} {name} {pg_type}"))
}

/// Assembles `DECLARE ... BEGIN ... [EXCEPTION ...] END;`, injecting the
/// package initializer call as the body's first statement whenever
/// `ctx.current_package` is set (§4.5) -- except inside the initializer
/// routine itself, which would otherwise call itself forever.
fn render_body(
    ctx: &Context,
    routine_name: &str,
    decl: Option<DeclareSection>,
    stmts: Option<StatementList>,
    handlers: Vec<ExceptionHandler>,
) -> Result<String, TransformError> {
    let decl_text = render_declare_section(ctx, decl.as_ref())?;
    let mut out = String::from("DECLARE\n");
    out.push_str(&decl_text);
    out.push_str("\nBEGIN\n");

    if let Some(pkg) = ctx.current_package.clone() {
        if !routine_name.eq_ignore_ascii_case("initialize") {
            out.push_str(&format!(
                "  PERFORM {}.{}__initialize();\n",
                fold(&ctx.active_schema),
                fold(&pkg)
            ));
        }
    }

    let stmts = stmts.ok_or_else(|| TransformError::unsupported("routine body with no statements"))?;
    out.push_str(&render_statement_list(ctx, &stmts)?);

    if !handlers.is_empty() {
        out.push_str("EXCEPTION\n");
        for h in &handlers {
            out.push_str(&render_exception_handler(ctx, h)?);
        }
    }
    out.push_str("END;");
    Ok(out)
}

/// Renders a `DECLARE` section: local `RECORD`/`TABLE OF` type declarations
/// are registered in `ctx` and commented out (neither has a direct plpgsql
/// equivalent -- the variables that use them become plain jsonb), and
/// ordinary variables are emitted with their mapped type (§4.5, §4.7).
fn render_declare_section(ctx: &Context, decl: Option<&DeclareSection>) -> Result<String, TransformError> {
    let Some(decl) = decl else { return Ok(String::new()) };
    let mut lines = Vec::new();

    for rt in decl.record_types() {
        if let Some(name) = rt.name() {
            ctx.register_inline_type(
                &name,
                InlineTypeInfo {
                    kind: InlineTypeKind::Record,
                    schema: ctx.active_schema.clone(),
                    element_type: None,
                },
            );
            lines.push(format!("  -- TYPE {name} IS RECORD (...): represented as jsonb"));
        }
    }
    for ct in decl.collection_types() {
        if let Some(name) = ct.name() {
            let kind = if ct.is_indexed() { InlineTypeKind::Map } else { InlineTypeKind::Array };
            let element_type = ct.element_type().map(|dt| map_datatype(ctx, &dt));
            ctx.register_inline_type(
                &name,
                InlineTypeInfo {
                    kind,
                    schema: ctx.active_schema.clone(),
                    element_type,
                },
            );
            lines.push(format!("  -- TYPE {name} IS TABLE OF ...: represented as jsonb"));
        }
    }
    for v in decl.variables() {
        let Some(name) = v.name() else { continue };
        ctx.register_local_name(&name);

        let raw_base = v.datatype().map(|dt| base_type_name(&dt.raw_name())).unwrap_or_default();
        if let Some(info) = ctx.inline_type(&raw_base) {
            let default_literal = match info.kind {
                InlineTypeKind::Record => "'{}'::jsonb",
                InlineTypeKind::Array => "'[]'::jsonb",
                InlineTypeKind::Map => "'{}'::jsonb",
            };
            lines.push(format!("  {name} jsonb := {default_literal};"));
            continue;
        }

        let pg_type = v
            .datatype()
            .map(|dt| map_datatype(ctx, &dt))
            .unwrap_or_else(|| "text".to_string());
        let mut line = format!("  {name} ");
        if v.is_constant() {
            line.push_str("CONSTANT ");
        }
        line.push_str(&pg_type);
        if let Some(init) = v.init_expr() {
            line.push_str(" := ");
            line.push_str(&rewrite_expr(&init, ctx)?);
        }
        line.push(';');
        lines.push(line);
    }

    Ok(lines.join("\n"))
}

fn render_statement_list(ctx: &Context, list: &StatementList) -> Result<String, TransformError> {
    let mut out = String::new();
    for stmt in list.statements() {
        out.push_str("  ");
        out.push_str(&render_statement(ctx, &stmt)?);
        out.push('\n');
    }
    Ok(out)
}

fn render_statement(ctx: &Context, node: &SyntaxNode) -> Result<String, TransformError> {
    match node.kind() {
        SyntaxKind::NullStmt => Ok("NULL;".to_string()),
        SyntaxKind::ExitStmt => render_exit(ctx, &ExitStmt::cast(node.clone()).unwrap()),
        SyntaxKind::ReturnStmt => render_return(ctx, &ReturnStmt::cast(node.clone()).unwrap()),
        SyntaxKind::IfStmt => render_if(ctx, &IfStmt::cast(node.clone()).unwrap()),
        SyntaxKind::LoopStmt => render_loop(ctx, &LoopStmt::cast(node.clone()).unwrap()),
        SyntaxKind::WhileLoopStmt => render_while(ctx, &WhileLoopStmt::cast(node.clone()).unwrap()),
        SyntaxKind::ForLoopStmt => render_for(ctx, &ForLoopStmt::cast(node.clone()).unwrap()),
        SyntaxKind::Assignment => render_assignment(ctx, &Assignment::cast(node.clone()).unwrap()),
        SyntaxKind::FunctionCall | SyntaxKind::ColumnRef => {
            Ok(format!("PERFORM {};", rewrite_expr(node, ctx)?))
        }
        SyntaxKind::Error => Err(TransformError::unsupported("a malformed statement")),
        other => Err(TransformError::unsupported(format!("statement node {other:?}"))),
    }
}

fn render_exit(ctx: &Context, node: &ExitStmt) -> Result<String, TransformError> {
    match node.condition() {
        Some(cond) => Ok(format!("EXIT WHEN {};", rewrite_expr(&cond, ctx)?)),
        None => Ok("EXIT;".to_string()),
    }
}

fn render_return(ctx: &Context, node: &ReturnStmt) -> Result<String, TransformError> {
    match node.value() {
        Some(v) => Ok(format!("RETURN {};", rewrite_expr(&v, ctx)?)),
        None => Ok("RETURN;".to_string()),
    }
}

fn render_if(ctx: &Context, node: &IfStmt) -> Result<String, TransformError> {
    let cond = node
        .condition()
        .ok_or_else(|| TransformError::unsupported("IF with no condition"))?;
    let then_branch = node
        .then_branch()
        .ok_or_else(|| TransformError::unsupported("IF with no THEN branch"))?;

    let mut out = format!("IF {} THEN\n", rewrite_expr(&cond, ctx)?);
    out.push_str(&render_statement_list(ctx, &then_branch)?);
    for elsif in node.elsif_branches() {
        let elsif_cond = elsif
            .condition()
            .ok_or_else(|| TransformError::unsupported("ELSIF with no condition"))?;
        let elsif_stmts = elsif
            .statements()
            .ok_or_else(|| TransformError::unsupported("ELSIF with no statements"))?;
        out.push_str(&format!("ELSIF {} THEN\n", rewrite_expr(&elsif_cond, ctx)?));
        out.push_str(&render_statement_list(ctx, &elsif_stmts)?);
    }
    if let Some(else_branch) = node.else_branch() {
        out.push_str("ELSE\n");
        out.push_str(&render_statement_list(ctx, &else_branch)?);
    }
    out.push_str("END IF;");
    Ok(out)
}

fn render_loop(ctx: &Context, node: &LoopStmt) -> Result<String, TransformError> {
    let stmts = node
        .statements()
        .ok_or_else(|| TransformError::unsupported("LOOP with no statements"))?;
    Ok(format!("LOOP\n{}END LOOP;", render_statement_list(ctx, &stmts)?))
}

fn render_while(ctx: &Context, node: &WhileLoopStmt) -> Result<String, TransformError> {
    let cond = node
        .condition()
        .ok_or_else(|| TransformError::unsupported("WHILE with no condition"))?;
    let stmts = node
        .statements()
        .ok_or_else(|| TransformError::unsupported("WHILE with no statements"))?;
    Ok(format!(
        "WHILE {} LOOP\n{}END LOOP;",
        rewrite_expr(&cond, ctx)?,
        render_statement_list(ctx, &stmts)?
    ))
}

fn render_for(ctx: &Context, node: &ForLoopStmt) -> Result<String, TransformError> {
    let loop_var = node
        .loop_var()
        .map(|i| i.name())
        .ok_or_else(|| TransformError::unsupported("FOR loop with no loop variable"))?;
    ctx.register_local_name(&loop_var);
    let bounds = node.bounds();
    let stmts = node
        .statements()
        .ok_or_else(|| TransformError::unsupported("FOR loop with no statements"))?;

    if let [single] = bounds.as_slice() {
        if single.kind() == SyntaxKind::SelectStmt {
            let select_stmt = SelectStmt::cast(single.clone()).unwrap();
            let query_text = rewrite::rewrite_select(&select_stmt, ctx)?;
            return Ok(format!(
                "FOR {loop_var} IN {query_text} LOOP\n{}END LOOP;",
                render_statement_list(ctx, &stmts)?
            ));
        }
    }

    let [lo, hi] = bounds.as_slice() else {
        return Err(TransformError::unsupported("numeric FOR loop with unexpected bounds"));
    };
    let reverse = if node.is_reverse() { "REVERSE " } else { "" };
    Ok(format!(
        "FOR {loop_var} IN {reverse}{}..{} LOOP\n{}END LOOP;",
        rewrite_expr(lo, ctx)?,
        rewrite_expr(hi, ctx)?,
        render_statement_list(ctx, &stmts)?
    ))
}

fn render_exception_handler(ctx: &Context, node: &ExceptionHandler) -> Result<String, TransformError> {
    let when = node
        .names()
        .iter()
        .map(|n| map_exception_name(n))
        .collect::<Vec<_>>()
        .join(" OR ");
    let stmts = node
        .statements()
        .ok_or_else(|| TransformError::unsupported("exception handler with no statements"))?;
    Ok(format!("  WHEN {when} THEN\n{}", render_statement_list(ctx, &stmts)?))
}

/// Oracle's handful of predefined exception names that have a direct
/// Postgres condition name counterpart; anything else passes through
/// lowercased as a user-defined condition name (§4.5 carries no exhaustive
/// mapping table, so this is a conservative best effort, not a full one).
fn map_exception_name(name: &str) -> String {
    match name.to_ascii_uppercase().as_str() {
        "OTHERS" => "OTHERS".to_string(),
        "NO_DATA_FOUND" => "NO_DATA_FOUND".to_string(),
        "TOO_MANY_ROWS" => "TOO_MANY_ROWS".to_string(),
        "DUP_VAL_ON_INDEX" => "unique_violation".to_string(),
        "VALUE_ERROR" => "data_exception".to_string(),
        "ZERO_DIVIDE" => "division_by_zero".to_string(),
        other => other.to_ascii_lowercase(),
    }
}

fn render_assignment(ctx: &Context, node: &Assignment) -> Result<String, TransformError> {
    let target = node
        .target()
        .ok_or_else(|| TransformError::unsupported("assignment with no target"))?;
    let value = node
        .value()
        .ok_or_else(|| TransformError::unsupported("assignment with no value"))?;

    match target.kind() {
        SyntaxKind::ColumnRef => render_column_assignment(ctx, &target, &value),
        SyntaxKind::FunctionCall => render_indexed_assignment(ctx, &target, &value),
        other => Err(TransformError::unsupported(format!("assignment target shape {other:?}"))),
    }
}

/// `v := expr` (plain/package-variable write) and `v.f := expr` /
/// `v.a.b := expr` (record field write, §4.5).
fn render_column_assignment(ctx: &Context, target: &SyntaxNode, value: &SyntaxNode) -> Result<String, TransformError> {
    let col = ColumnRef::cast(target.clone()).unwrap();
    let parts = col.parts();
    let Some((head, rest)) = parts.split_first() else {
        return Err(TransformError::unsupported("assignment with an empty target"));
    };

    if !rest.is_empty() {
        if let Some(info) = ctx.inline_type(head) {
            if info.kind == InlineTypeKind::Record {
                let value_text = rewrite_expr(value, ctx)?;
                let path = rest.join(",");
                return if rest.len() > 1 {
                    Ok(format!(
                        "{head} := jsonb_set({head}, '{{{path}}}', to_jsonb({value_text}), true);"
                    ))
                } else {
                    Ok(format!("{head} := jsonb_set({head}, '{{{path}}}', to_jsonb({value_text}));"))
                };
            }
        }
    }

    if !ctx.is_local_name(head) {
        if let Some(text) = package_variable_setter(ctx, &parts, value)? {
            return Ok(text);
        }
    }

    let lhs = parts.join(".");
    let rhs = rewrite_expr(value, ctx)?;
    Ok(format!("{lhs} := {rhs};"))
}

/// `v(i) := expr` for a locally declared array/map (§4.5).
fn render_indexed_assignment(ctx: &Context, target: &SyntaxNode, value: &SyntaxNode) -> Result<String, TransformError> {
    let call = FunctionCall::cast(target.clone()).unwrap();
    let parts = call.name_parts();
    let [var] = parts.as_slice() else {
        return Err(TransformError::unsupported("indexed assignment with an unexpected target shape"));
    };
    let info = ctx
        .inline_type(var)
        .ok_or_else(|| TransformError::unsupported("indexed assignment to an unregistered local variable"))?;
    let args = call.argument_list().map(|al| al.arguments()).unwrap_or_default();
    let [arg] = args.as_slice() else {
        return Err(TransformError::unsupported("indexed assignment with an unexpected argument count"));
    };
    let index_expr = arg
        .expr()
        .ok_or_else(|| TransformError::unsupported("empty index in indexed assignment"))?;
    let value_text = rewrite_expr(value, ctx)?;

    match info.kind {
        InlineTypeKind::Array => {
            let shifted = shift_index_to_zero_based(&index_expr, ctx)?;
            if shifted.parse::<i64>().is_ok() {
                Ok(format!("{var} := jsonb_set({var}, '{{{shifted}}}', to_jsonb({value_text}));"))
            } else {
                Ok(format!(
                    "{var} := jsonb_set({var}, '{{' || {shifted} || '}}', to_jsonb({value_text}));"
                ))
            }
        }
        InlineTypeKind::Map => {
            let key_text = rewrite_expr(&index_expr, ctx)?;
            let key = strip_quotes(&key_text).ok_or_else(|| {
                TransformError::unsupported_with_hint(
                    "a non-literal map key in an indexed assignment",
                    "only literal string keys (v('k') := ...) are supported",
                )
            })?;
            Ok(format!(
                "{var} := jsonb_set({var}, '{{{key}}}', to_jsonb(({value_text})::text));"
            ))
        }
        InlineTypeKind::Record => Err(TransformError::unsupported(
            "indexed assignment to a record-typed local variable",
        )),
    }
}

fn strip_quotes(text: &str) -> Option<String> {
    let t = text.trim();
    (t.len() >= 2 && t.starts_with('\'') && t.ends_with('\'')).then(|| t[1..t.len() - 1].to_string())
}

/// The write-side counterpart of `expr::package_variable_access`: resolves
/// `g_var` / `pkg.g_var` / `schema.pkg.g_var` against the known package
/// variables and, only when it really is one, emits the setter call.
fn package_variable_setter(ctx: &Context, parts: &[String], value: &SyntaxNode) -> Result<Option<String>, TransformError> {
    let (schema, package, var) = match parts {
        [var] => {
            let Some(package) = ctx.current_package.as_ref() else {
                return Ok(None);
            };
            (ctx.active_schema.clone(), package.clone(), var.clone())
        }
        [pkg, var] => {
            let Some(current) = ctx.current_package.as_ref() else {
                return Ok(None);
            };
            if !current.eq_ignore_ascii_case(pkg) {
                return Ok(None);
            }
            (ctx.active_schema.clone(), pkg.clone(), var.clone())
        }
        [schema, pkg, var] => (schema.clone(), pkg.clone(), var.clone()),
        _ => return Ok(None),
    };

    let key = qualify(&schema, &package);
    let Some(vars) = ctx.package_variables else {
        return Ok(None);
    };
    if vars.get(&key).and_then(|v| v.get(&fold(&var))).is_none() {
        return Ok(None);
    }

    let value_text = rewrite_expr(value, ctx)?;
    Ok(Some(format!(
        "PERFORM {}.{}__set_{}({value_text});",
        fold(&schema),
        fold(&package),
        fold(&var)
    )))
}

/// Maps an Oracle datatype to its Postgres equivalent (§4.7): the handful
/// of Oracle scalar types this crate knows get a fixed mapping; anything
/// else (a user-defined object type, most often) passes through lowercased
/// unchanged, on the assumption that the type itself was migrated under the
/// same name.
pub fn map_datatype(ctx: &Context, dt: &Datatype) -> String {
    let raw = dt.raw_name();
    if dt.is_anchored() {
        return map_anchored(ctx, &raw);
    }
    map_base_type_name(&base_type_name(&raw))
}

fn base_type_name(raw: &str) -> String {
    let before_paren = raw.split('(').next().unwrap_or(raw);
    before_paren
        .trim()
        .split('.')
        .next_back()
        .unwrap_or(before_paren)
        .trim()
        .to_string()
}

fn map_base_type_name(name: &str) -> String {
    match fold(name).as_str() {
        "number" | "integer" | "int" | "decimal" | "pls_integer" | "binary_integer" | "float" | "real" => {
            "numeric".to_string()
        }
        "varchar2" | "char" | "nvarchar2" | "nchar" | "long" | "clob" | "nclob" => "text".to_string(),
        "date" | "timestamp" => "timestamp".to_string(),
        "boolean" => "boolean".to_string(),
        _ => fold(name),
    }
}

/// `table.column%TYPE` resolves through the catalog when the table is
/// known; `%ROWTYPE` always becomes `jsonb` (a whole-row record has no
/// single scalar Postgres equivalent, and the rest of this module already
/// represents PL/SQL records as jsonb). An unresolvable `%TYPE` falls back
/// to `text`, the same conservative default used elsewhere for unknown
/// types (§4.3).
fn map_anchored(ctx: &Context, raw: &str) -> String {
    if raw.to_ascii_lowercase().ends_with("%rowtype") {
        return "jsonb".to_string();
    }
    let qualifier = raw.split('%').next().unwrap_or("").trim();
    let parts: Vec<&str> = qualifier.split('.').filter(|s| !s.is_empty()).collect();
    if let [table, col] = parts.as_slice() {
        if let Some(cols) = ctx.catalog.columns_of(&ctx.active_schema, table) {
            if let Some(info) = cols.get(&fold(col)) {
                return map_base_type_name(&info.base_type);
            }
        }
    }
    "text".to_string()
}

/// Also used by package-variable accessor generation (`rewrite::package`),
/// which has no `Datatype` node to work from -- only the raw type text
/// captured when the variable catalog was extracted.
pub fn map_datatype_text(raw: &str) -> String {
    map_base_type_name(&base_type_name(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_empty_indices;
    use crate::context::{Context, PackageVariableCatalog, PackageVariableInfo, PackageVariables};
    use crate::eval::DefaultTypeEvaluator;
    use crate::grammar;

    fn parse_function_body(text: &str) -> Function {
        let parse = grammar::parse_function_body(text);
        assert!(parse.ok(), "{:?}", parse.errors);
        parse
            .syntax()
            .children()
            .find_map(Function::cast)
            .expect("parsed a Function node")
    }

    fn parse_procedure_body(text: &str) -> Procedure {
        let parse = grammar::parse_procedure_body(text);
        assert!(parse.ok(), "{:?}", parse.errors);
        parse
            .syntax()
            .children()
            .find_map(Procedure::cast)
            .expect("parsed a Procedure node")
    }

    #[test]
    fn simple_function_signature_and_return() {
        let func = parse_function_body("create or replace function add_one(n in number) return number is begin return n + 1; end;");
        let indices = build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        let out = rewrite_function(&func, &ctx).unwrap();
        assert!(out.starts_with("CREATE OR REPLACE FUNCTION hr.add_one(IN n numeric) RETURNS numeric LANGUAGE plpgsql AS $$"));
        assert!(out.contains("RETURN n + 1;"));
        assert!(out.trim_end().ends_with("$$;"));
    }

    #[test]
    fn record_field_assignment_becomes_jsonb_set() {
        let proc = parse_procedure_body(
            "create procedure p is \
               type rec_t is record (id number, name varchar2(100)); \
               r rec_t; \
             begin \
               r.id := 1; \
               r.name := 'a'; \
             end;",
        );
        let indices = build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        let out = rewrite_procedure(&proc, &ctx).unwrap();
        assert!(out.contains("r jsonb := '{}'::jsonb;"));
        assert!(out.contains("r := jsonb_set(r, '{id}', to_jsonb(1));"));
        assert!(out.contains("r := jsonb_set(r, '{name}', to_jsonb('a'));"));
    }

    #[test]
    fn array_element_read_and_write() {
        let proc = parse_procedure_body(
            "create procedure p is \
               type tbl_t is table of number; \
               v tbl_t; \
               x number; \
             begin \
               v(1) := 10; \
               x := v(1); \
             end;",
        );
        let indices = build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        let out = rewrite_procedure(&proc, &ctx).unwrap();
        assert!(out.contains("v := jsonb_set(v, '{0}', to_jsonb(10));"));
        assert!(out.contains("x := (v ->> 0)::numeric;"));
    }

    #[test]
    fn package_variable_read_and_write_inside_package_body() {
        let proc = parse_procedure_body("create procedure incr is begin g_counter := g_counter + 1; end;");
        let indices = build_empty_indices();
        let mut vars = PackageVariables::new();
        vars.insert(
            "g_counter".to_string(),
            PackageVariableInfo {
                data_type: "number".to_string(),
                default_expression: Some("0".to_string()),
                is_constant: false,
            },
        );
        let mut catalog = PackageVariableCatalog::new();
        catalog.insert("hr.emp_pkg".to_string(), vars);

        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator).with_package("emp_pkg", &catalog);
        let out = rewrite_procedure(&proc, &ctx).unwrap();
        assert!(out.contains("PERFORM hr.emp_pkg__initialize();"));
        assert!(out.contains("PERFORM hr.emp_pkg__set_g_counter(hr.emp_pkg__get_g_counter() + 1);"));
    }

    #[test]
    fn initializer_routine_does_not_call_itself() {
        let proc = parse_procedure_body("create procedure initialize is begin g_counter := 0; end;");
        let indices = build_empty_indices();
        let mut vars = PackageVariables::new();
        vars.insert(
            "g_counter".to_string(),
            PackageVariableInfo {
                data_type: "number".to_string(),
                default_expression: Some("0".to_string()),
                is_constant: false,
            },
        );
        let mut catalog = PackageVariableCatalog::new();
        catalog.insert("hr.emp_pkg".to_string(), vars);

        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator).with_package("emp_pkg", &catalog);
        let out = rewrite_procedure(&proc, &ctx).unwrap();
        assert!(!out.contains("__initialize()"));
    }

    #[test]
    fn numeric_for_loop_renders_range() {
        let proc = parse_procedure_body("create procedure p is begin for i in reverse 1..10 loop null; end loop; end;");
        let indices = build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        let out = rewrite_procedure(&proc, &ctx).unwrap();
        assert!(out.contains("FOR i IN REVERSE 1..10 LOOP"));
        assert!(out.contains("NULL;"));
        assert!(out.contains("END LOOP;"));
    }

    #[test]
    fn exception_handler_maps_dup_val_on_index() {
        let proc = parse_procedure_body(
            "create procedure p is begin null; exception when dup_val_on_index then null; end;",
        );
        let indices = build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        let out = rewrite_procedure(&proc, &ctx).unwrap();
        assert!(out.contains("WHEN unique_violation THEN"));
    }
}
