//! Package-variable accessor generation (§4.8). The rest of the rewriter
//! only ever rewrites *call sites*: `rewrite::expr::package_variable_access`
//! turns a read into `schema.pkg__get_name()`, `rewrite::plsql`'s
//! `package_variable_setter` turns a write into `schema.pkg__set_name(val)`,
//! and `rewrite::plsql::render_body` injects a call to
//! `schema.pkg__initialize()` as the first statement of every routine but
//! the initializer itself. This module is what actually emits those three
//! functions, once per declared variable (plus the one shared initializer),
//! backed by a per-session table keyed by package name -- one row per
//! backend, found by `pg_backend_pid()`, so each session sees its own copy
//! of the package's state exactly as Oracle's per-session package state
//! would.

use crate::ast::{AstNode, Datatype, PackageBody, PackageSpec, VariableDecl};
use crate::catalog::build_empty_indices;
use crate::context::{Context, PackageVariableInfo, PackageVariables};
use crate::error::TransformError;
use crate::eval::DefaultTypeEvaluator;
use crate::rewrite::expr::rewrite_expr;
use crate::rewrite::plsql::{map_datatype_text, rewrite_function, rewrite_procedure};
use crate::util::fold;

/// Extracts a package spec's variables, in declaration order. Default
/// expressions are rewritten against a bare context carrying only the
/// active schema -- a default expression referencing another variable of
/// the same package is rare enough, and its initialization order ambiguous
/// enough, that it is left a plain passthrough rather than resolved to a
/// getter call (see DESIGN.md).
pub fn extract_from_spec(schema: &str, spec: &PackageSpec) -> Result<PackageVariables, TransformError> {
    extract(schema, spec.variables())
}

/// Extracts a package body's own variable declarations -- package-level
/// variables declared directly in the body rather than mirrored in the spec
/// (§4.8). Callers building the full catalog entry for a package should
/// extract the spec first and let these overwrite same-named entries, since
/// a body redeclaration is the more complete/authoritative one.
pub fn extract_from_body(schema: &str, body: &PackageBody) -> Result<PackageVariables, TransformError> {
    extract(schema, body.variables())
}

fn extract(schema: &str, decls: Vec<VariableDecl>) -> Result<PackageVariables, TransformError> {
    let indices = build_empty_indices();
    let ctx = Context::new(schema, &indices, &DefaultTypeEvaluator);

    let mut vars = PackageVariables::new();
    for decl in decls {
        let Some(name) = decl.name() else { continue };
        let data_type = decl
            .datatype()
            .as_ref()
            .map(Datatype::raw_name)
            .map(|raw| map_datatype_text(&raw))
            .unwrap_or_else(|| "text".to_string());
        let default_expression = decl.init_expr().map(|e| rewrite_expr(&e, &ctx)).transpose()?;
        vars.insert(
            fold(&name),
            PackageVariableInfo {
                data_type,
                default_expression,
                is_constant: decl.is_constant(),
            },
        );
    }
    Ok(vars)
}

/// The backing table's name for a package's variables, schema-qualified.
fn state_table(schema: &str, package: &str) -> String {
    format!("{}.{}__state", fold(schema), fold(package))
}

/// Emits the backing table, then the getter, setter (skipped for
/// `CONSTANT` variables), and shared initializer functions for every
/// variable of `schema.package`, in declaration order, joined by blank
/// lines. `vars` must be the exact entry [`crate::context::PackageVariableCatalog`]
/// holds for this package -- the one every call-site rewrite already
/// assumes exists.
pub fn rewrite_accessors(schema: &str, package: &str, vars: &PackageVariables) -> String {
    let schema = fold(schema);
    let package = fold(package);
    let table = state_table(&schema, &package);

    let mut parts = vec![format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n  session_id integer PRIMARY KEY,\n  vars jsonb NOT NULL DEFAULT '{{}}'::jsonb\n);"
    )];
    for (name, info) in vars {
        parts.push(render_getter(&schema, &package, &table, name, info));
        if !info.is_constant {
            parts.push(render_setter(&schema, &package, &table, name, info));
        }
    }
    parts.push(render_initializer(&schema, &package, &table, vars));
    parts.join("\n\n")
}

/// Extracts a package spec's variable catalog and emits its full accessor
/// surface (backing table, getters/setters, initializer). The package body
/// is rewritten separately by [`rewrite_package_body`], once its own
/// variable redeclarations (if any) have been folded into the catalog
/// [`extract_from_body`] produces.
pub fn rewrite_package_spec(schema: &str, spec: &PackageSpec) -> Result<String, TransformError> {
    let name = spec
        .header()
        .and_then(|h| h.name())
        .ok_or_else(|| TransformError::unsupported("package spec with no name"))?;
    let vars = extract_from_spec(schema, spec)?;
    Ok(rewrite_accessors(schema, &name, &vars))
}

/// Rewrites every function and procedure in a package body, in declaration
/// order, joined by blank lines. `ctx` must already carry
/// `current_package`/`package_variables` set to this package (§4.8) so that
/// each routine's body resolves package-variable reads/writes and gets its
/// initializer call injected.
pub fn rewrite_package_body(body: &PackageBody, ctx: &Context) -> Result<String, TransformError> {
    let mut parts = Vec::new();
    for f in body.functions() {
        parts.push(rewrite_function(&f, ctx)?);
    }
    for p in body.procedures() {
        parts.push(rewrite_procedure(&p, ctx)?);
    }
    Ok(parts.join("\n\n"))
}

fn render_getter(schema: &str, package: &str, table: &str, name: &str, info: &PackageVariableInfo) -> String {
    let ty = &info.data_type;
    format!(
        "CREATE OR REPLACE FUNCTION {schema}.{package}__get_{name}() RETURNS {ty} LANGUAGE plpgsql AS $$\n\
         BEGIN\n\
         \x20 RETURN (SELECT vars ->> '{name}' FROM {table} WHERE session_id = pg_backend_pid())::{ty};\n\
         END;\n\
         $$;"
    )
}

fn render_setter(schema: &str, package: &str, table: &str, name: &str, info: &PackageVariableInfo) -> String {
    let ty = &info.data_type;
    format!(
        "CREATE OR REPLACE FUNCTION {schema}.{package}__set_{name}(v {ty}) RETURNS void LANGUAGE plpgsql AS $$\n\
         BEGIN\n\
         \x20 UPDATE {table} SET vars = jsonb_set(vars, '{{{name}}}', to_jsonb(v)) WHERE session_id = pg_backend_pid();\n\
         END;\n\
         $$;"
    )
}

/// Ensures this session's row exists, resets it to empty, then seeds every
/// variable with its default expression -- through the setter for ordinary
/// variables, directly for `CONSTANT`s (which have no setter of their own).
fn render_initializer(schema: &str, package: &str, table: &str, vars: &PackageVariables) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "  INSERT INTO {table} (session_id, vars) VALUES (pg_backend_pid(), '{{}}'::jsonb)\n\
         \x20   ON CONFLICT (session_id) DO UPDATE SET vars = '{{}}'::jsonb;\n"
    ));
    for (name, info) in vars {
        let default = info.default_expression.as_deref().unwrap_or("NULL");
        if info.is_constant {
            body.push_str(&format!(
                "  UPDATE {table} SET vars = jsonb_set(vars, '{{{name}}}', to_jsonb(({default})::{ty})) WHERE session_id = pg_backend_pid();\n",
                ty = info.data_type,
            ));
        } else {
            body.push_str(&format!("  PERFORM {schema}.{package}__set_{name}({default});\n"));
        }
    }
    format!(
        "CREATE OR REPLACE FUNCTION {schema}.{package}__initialize() RETURNS void LANGUAGE plpgsql AS $$\n\
         BEGIN\n\
         {body}\
         END;\n\
         $$;"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar;

    fn parse_package_spec(text: &str) -> PackageSpec {
        let parse = grammar::parse_package_spec(text);
        assert!(parse.ok(), "{:?}", parse.errors);
        parse
            .syntax()
            .children()
            .find_map(PackageSpec::cast)
            .expect("parsed a PackageSpec node")
    }

    #[test]
    fn extracts_variables_in_order_with_defaults() {
        let spec = parse_package_spec(
            "create package emp_pkg is \
               g_counter number := 0; \
               g_name varchar2(100); \
             end;",
        );
        let vars = extract_from_spec("hr", &spec).unwrap();
        let names: Vec<_> = vars.keys().cloned().collect();
        assert_eq!(names, vec!["g_counter", "g_name"]);
        assert_eq!(vars["g_counter"].data_type, "numeric");
        assert_eq!(vars["g_counter"].default_expression.as_deref(), Some("0"));
        assert!(!vars["g_counter"].is_constant);
        assert_eq!(vars["g_name"].default_expression, None);
    }

    #[test]
    fn constant_variables_are_flagged() {
        let spec = parse_package_spec("create package emp_pkg is g_max constant number := 100; end;");
        let vars = extract_from_spec("hr", &spec).unwrap();
        assert!(vars["g_max"].is_constant);
    }

    #[test]
    fn accessors_name_getter_setter_and_initializer() {
        let spec = parse_package_spec("create package emp_pkg is g_counter number := 0; end;");
        let vars = extract_from_spec("hr", &spec).unwrap();
        let out = rewrite_accessors("hr", "emp_pkg", &vars);
        assert!(out.contains("CREATE OR REPLACE FUNCTION hr.emp_pkg__get_g_counter() RETURNS numeric"));
        assert!(out.contains("CREATE OR REPLACE FUNCTION hr.emp_pkg__set_g_counter(v numeric) RETURNS void"));
        assert!(out.contains("CREATE OR REPLACE FUNCTION hr.emp_pkg__initialize() RETURNS void"));
        assert!(out.contains("PERFORM hr.emp_pkg__set_g_counter(0);"));
    }

    #[test]
    fn constant_has_no_setter_but_initializes_directly() {
        let spec = parse_package_spec("create package emp_pkg is g_max constant number := 100; end;");
        let vars = extract_from_spec("hr", &spec).unwrap();
        let out = rewrite_accessors("hr", "emp_pkg", &vars);
        assert!(!out.contains("__set_g_max"));
        assert!(out.contains("jsonb_set(vars, '{g_max}', to_jsonb((100)::numeric))"));
    }

    #[test]
    fn package_spec_rewrite_includes_backing_table_and_name() {
        let spec = parse_package_spec("create package emp_pkg is g_counter number := 0; end;");
        let out = rewrite_package_spec("hr", &spec).unwrap();
        assert!(out.contains("CREATE TABLE IF NOT EXISTS hr.emp_pkg__state"));
        assert!(out.contains("hr.emp_pkg__get_g_counter"));
    }

    #[test]
    fn package_body_rewrite_joins_routines() {
        use crate::context::{PackageVariableCatalog, PackageVariableInfo};

        let parse = grammar::parse_package_body(
            "create package body emp_pkg is \
               procedure incr is begin g_counter := g_counter + 1; end; \
               function get_counter return number is begin return g_counter; end; \
             end emp_pkg;",
        );
        assert!(parse.ok(), "{:?}", parse.errors);
        let body = parse
            .syntax()
            .children()
            .find_map(PackageBody::cast)
            .expect("parsed a PackageBody node");

        let mut vars = PackageVariables::new();
        vars.insert(
            "g_counter".to_string(),
            PackageVariableInfo {
                data_type: "numeric".to_string(),
                default_expression: Some("0".to_string()),
                is_constant: false,
            },
        );
        let mut catalog = PackageVariableCatalog::new();
        catalog.insert("hr.emp_pkg".to_string(), vars);

        let ctx = Context::new("hr", &build_empty_indices(), &DefaultTypeEvaluator).with_package("emp_pkg", &catalog);
        let out = rewrite_package_body(&body, &ctx).unwrap();
        assert!(out.contains("CREATE OR REPLACE PROCEDURE hr.incr()"));
        assert!(out.contains("CREATE OR REPLACE FUNCTION hr.get_counter()"));
        assert!(out.contains("PERFORM hr.emp_pkg__initialize();"));
    }
}
