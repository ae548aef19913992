//! The four grammar entry points (§4.1): `SELECT`, function body, procedure
//! body, package spec, package body. Each wraps its production in a
//! [`SyntaxKind::Root`] and returns a [`crate::parser::Parse`].

mod expressions;
mod plsql;
mod query;

use crate::parser::{Parse, Parser};
use crate::syntax::SyntaxKind;

pub fn parse_select(text: &str) -> Parse {
    let mut p = Parser::new(text);
    p.start(SyntaxKind::Root);
    query::parse_select_stmt(&mut p);
    p.finish();
    p.build()
}

pub fn parse_function_body(text: &str) -> Parse {
    let mut p = Parser::new(text);
    p.start(SyntaxKind::Root);
    plsql::parse_function(&mut p);
    p.finish();
    p.build()
}

pub fn parse_procedure_body(text: &str) -> Parse {
    let mut p = Parser::new(text);
    p.start(SyntaxKind::Root);
    plsql::parse_procedure(&mut p);
    p.finish();
    p.build()
}

pub fn parse_package_spec(text: &str) -> Parse {
    let mut p = Parser::new(text);
    p.start(SyntaxKind::Root);
    plsql::parse_package_spec(&mut p);
    p.finish();
    p.build()
}

pub fn parse_package_body(text: &str) -> Parse {
    let mut p = Parser::new(text);
    p.start(SyntaxKind::Root);
    plsql::parse_package_body(&mut p);
    p.finish();
    p.build()
}
