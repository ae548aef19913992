//! Oracle SQL/PL-SQL → PostgreSQL/PL-pgSQL source-to-source transpiler
//! (§1-§2 of the spec): four grammar entry points feed a lossless [`rowan`]
//! CST, a typed [`ast`] layer reads it, and [`rewrite`] walks it into
//! emitted PostgreSQL text, consulting a read-only [`catalog`] and
//! [`context`] at every step. This module wires the pieces together and
//! exposes the handful of entry points external callers need (§6): four
//! parse functions, one rewrite function, and the two catalog builders.
//!
//! No CLI, no file I/O, no network access anywhere in this crate -- a host
//! application owns fetching Oracle metadata and source text and decides
//! what to do with the emitted PostgreSQL text (§6: "a library, not a
//! tool").

pub mod ast;
pub mod catalog;
pub mod context;
pub mod error;
pub mod eval;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod rewrite;
pub mod syntax;
pub mod util;

use ast::{AstNode, PackageSpec, Root};
use parser::{Parse, ParseError};

pub use catalog::{build_empty_indices, build_indices, CatalogIndices, MetadataProvider};
pub use context::Context;
pub use error::TransformError;
pub use eval::{DefaultTypeEvaluator, TypeEvaluator};

/// Parses a standalone `SELECT` statement (§4.2, §4.3).
pub fn parse_select(text: &str) -> Result<Parse, Vec<ParseError>> {
    ok_or_errors(grammar::parse_select(text))
}

/// Parses a `CREATE [OR REPLACE] FUNCTION ... IS ... END;` (§4.5-§4.7).
pub fn parse_function_body(text: &str) -> Result<Parse, Vec<ParseError>> {
    ok_or_errors(grammar::parse_function_body(text))
}

/// Parses a `CREATE [OR REPLACE] PROCEDURE ... IS ... END;` (§4.5-§4.7).
pub fn parse_procedure_body(text: &str) -> Result<Parse, Vec<ParseError>> {
    ok_or_errors(grammar::parse_procedure_body(text))
}

/// Parses a `CREATE [OR REPLACE] PACKAGE ... IS ... END;` spec (§4.8),
/// wrapping the parse in a [`PackageContext`] so callers don't have to
/// re-`cast` the [`PackageSpec`] node themselves before extracting its
/// variable catalog via [`rewrite::package::extract_from_spec`].
pub fn parse_package_spec(text: &str) -> Result<PackageContext, Vec<ParseError>> {
    let parse = ok_or_errors(grammar::parse_package_spec(text))?;
    let name = parse
        .syntax()
        .children()
        .find_map(PackageSpec::cast)
        .and_then(|spec| spec.header())
        .and_then(|h| h.name());
    Ok(PackageContext { parse, name })
}

/// Parses a `CREATE [OR REPLACE] PACKAGE BODY ... IS ... END;` (§4.8).
/// Unlike [`parse_package_spec`] this has no dedicated wrapper -- a body's
/// rewrite needs a [`context::PackageVariableCatalog`] the caller built
/// from the spec, so there is no convenience this crate can add over a
/// plain [`Parse`].
pub fn parse_package_body(text: &str) -> Result<Parse, Vec<ParseError>> {
    ok_or_errors(grammar::parse_package_body(text))
}

fn ok_or_errors(parse: Parse) -> Result<Parse, Vec<ParseError>> {
    if parse.ok() {
        Ok(parse)
    } else {
        Err(parse.errors)
    }
}

/// A parsed package spec, plus its name pulled out for convenience (every
/// caller needs it immediately, to key the variable catalog and to name
/// the generated accessor functions).
pub struct PackageContext {
    pub parse: Parse,
    pub name: Option<String>,
}

impl PackageContext {
    /// The parsed [`PackageSpec`] node, re-cast from the tree root.
    pub fn package(&self) -> Option<PackageSpec> {
        self.parse.syntax().children().find_map(PackageSpec::cast)
    }
}

/// Rewrites a successfully parsed translation unit into PostgreSQL text
/// (§4). Dispatches on whichever of the five [`Root`] shapes the parse
/// actually holds -- a `Parse` only ever wraps one, since each grammar
/// entry point produces exactly one kind of root.
///
/// A package spec rewrites to its accessor surface (backing table,
/// getters, setters, shared initializer) via
/// [`rewrite::package::rewrite_package_spec`], using `ctx.active_schema`
/// as the target schema; a package body rewrites to its functions and
/// procedures via [`rewrite::package::rewrite_package_body`], which
/// expects `ctx` to already carry `current_package`/`package_variables`
/// set to match (built by the caller from the spec's extracted catalog,
/// merged with the body's own variable redeclarations if any).
pub fn rewrite(parse: &Parse, ctx: &Context) -> Result<String, TransformError> {
    let root = Root::cast(parse.syntax()).ok_or_else(|| TransformError::unsupported("empty parse tree"))?;

    if let Some(query) = root.query() {
        return rewrite::rewrite_select(&query, ctx);
    }
    if let Some(func) = root.function() {
        return rewrite::plsql::rewrite_function(&func, ctx);
    }
    if let Some(proc) = root.procedure() {
        return rewrite::plsql::rewrite_procedure(&proc, ctx);
    }
    if let Some(spec) = root.package() {
        return rewrite::package::rewrite_package_spec(&ctx.active_schema, &spec);
    }
    if let Some(body) = root.package_body() {
        return rewrite::package::rewrite_package_body(&body, ctx);
    }
    Err(TransformError::unsupported("a parse tree with no recognized root"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{PackageVariableCatalog, PackageVariableInfo, PackageVariables};

    #[test]
    fn parse_select_rejects_malformed_input() {
        assert!(parse_select("select from").is_err());
    }

    #[test]
    fn rewrite_select_round_trips_through_the_public_api() {
        let parse = parse_select("select 1 from dual").unwrap();
        let indices = build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        let out = rewrite(&parse, &ctx).unwrap();
        assert_eq!(out, "SELECT 1");
    }

    #[test]
    fn rewrite_function_round_trips_through_the_public_api() {
        let parse = parse_function_body("create function add_one(n in number) return number is begin return n + 1; end;").unwrap();
        let indices = build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        let out = rewrite(&parse, &ctx).unwrap();
        assert!(out.starts_with("CREATE OR REPLACE FUNCTION hr.add_one"));
    }

    #[test]
    fn package_spec_round_trip_produces_accessors_and_name() {
        let pkg = parse_package_spec("create package emp_pkg is g_counter number := 0; end;").unwrap();
        assert_eq!(pkg.name.as_deref(), Some("emp_pkg"));

        let indices = build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        let out = rewrite(&pkg.parse, &ctx).unwrap();
        assert!(out.contains("CREATE TABLE IF NOT EXISTS hr.emp_pkg__state"));
        assert!(out.contains("hr.emp_pkg__get_g_counter"));
    }

    #[test]
    fn package_body_rewrite_uses_the_caller_supplied_catalog() {
        let body_parse = parse_package_body(
            "create package body emp_pkg is \
               procedure incr is begin g_counter := g_counter + 1; end; \
             end emp_pkg;",
        )
        .unwrap();

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

        let indices = build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator).with_package("emp_pkg", &catalog);
        let out = rewrite(&body_parse, &ctx).unwrap();
        assert!(out.contains("CREATE OR REPLACE PROCEDURE hr.incr()"));
        assert!(out.contains("PERFORM hr.emp_pkg__set_g_counter(hr.emp_pkg__get_g_counter() + 1);"));
    }
}
