//! Grammar for PL/SQL units: functions, procedures, packages, declare
//! sections, and the statement language (§4.6, §4.7, §4.8).

use crate::grammar::expressions::{parse_expr, parse_name_or_call};
use crate::grammar::query::parse_select_stmt;
use crate::lexer::TokenKind;
use crate::parser::Parser;
use crate::syntax::SyntaxKind;

fn eat_create_or_replace(p: &mut Parser) {
    p.expect(TokenKind::CreateKw);
    if p.eat(TokenKind::OrKw) {
        p.expect(TokenKind::ReplaceKw);
    }
}

pub fn parse_function(p: &mut Parser) {
    p.start(SyntaxKind::Function);
    eat_create_or_replace(p);
    parse_function_header(p);
    p.expect_one_of(&[TokenKind::IsKw, TokenKind::AsKw]);
    parse_function_body(p);
    p.expect(TokenKind::SemiColon);
    p.finish();
}

fn parse_function_header(p: &mut Parser) {
    p.start(SyntaxKind::FunctionHeader);
    p.expect(TokenKind::FunctionKw);
    p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    if p.at(TokenKind::LParen) {
        parse_param_list(p);
    }
    p.expect(TokenKind::ReturnKw);
    parse_datatype(p);
    p.finish();
}

fn parse_function_body(p: &mut Parser) {
    p.start(SyntaxKind::FunctionBody);
    parse_declare_section(p);
    p.expect(TokenKind::BeginKw);
    parse_statement_list(p, &[TokenKind::ExceptionKw, TokenKind::EndKw]);
    if p.eat(TokenKind::ExceptionKw) {
        while p.at(TokenKind::WhenKw) {
            parse_exception_handler(p);
        }
    }
    p.expect(TokenKind::EndKw);
    p.eat_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    p.finish();
}

pub fn parse_procedure(p: &mut Parser) {
    p.start(SyntaxKind::Procedure);
    eat_create_or_replace(p);
    parse_procedure_header(p);
    p.expect_one_of(&[TokenKind::IsKw, TokenKind::AsKw]);
    parse_procedure_body(p);
    p.expect(TokenKind::SemiColon);
    p.finish();
}

fn parse_procedure_header(p: &mut Parser) {
    p.start(SyntaxKind::ProcedureHeader);
    p.expect(TokenKind::ProcedureKw);
    p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    if p.at(TokenKind::LParen) {
        parse_param_list(p);
    }
    p.finish();
}

fn parse_procedure_body(p: &mut Parser) {
    p.start(SyntaxKind::ProcedureBody);
    parse_declare_section(p);
    p.expect(TokenKind::BeginKw);
    parse_statement_list(p, &[TokenKind::ExceptionKw, TokenKind::EndKw]);
    if p.eat(TokenKind::ExceptionKw) {
        while p.at(TokenKind::WhenKw) {
            parse_exception_handler(p);
        }
    }
    p.expect(TokenKind::EndKw);
    p.eat_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    p.finish();
}

pub fn parse_package_spec(p: &mut Parser) {
    p.start(SyntaxKind::PackageSpec);
    eat_create_or_replace(p);
    parse_package_header(p);
    p.expect_one_of(&[TokenKind::IsKw, TokenKind::AsKw]);
    while !p.at(TokenKind::EndKw) && !p.at_end() {
        if p.at(TokenKind::FunctionKw) {
            parse_function_header(p);
            p.expect(TokenKind::SemiColon);
        } else if p.at(TokenKind::ProcedureKw) {
            parse_procedure_header(p);
            p.expect(TokenKind::SemiColon);
        } else if p.at(TokenKind::TypeKw) {
            parse_type_decl(p);
        } else {
            parse_variable_decl(p);
        }
    }
    p.expect(TokenKind::EndKw);
    p.eat_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    p.expect(TokenKind::SemiColon);
    p.finish();
}

pub fn parse_package_body(p: &mut Parser) {
    p.start(SyntaxKind::PackageBody);
    eat_create_or_replace(p);
    p.expect(TokenKind::PackageKw);
    p.expect(TokenKind::BodyKw);
    parse_package_header_name(p);
    p.expect_one_of(&[TokenKind::IsKw, TokenKind::AsKw]);
    while !p.at(TokenKind::EndKw) && !p.at_end() {
        if p.at(TokenKind::FunctionKw) {
            p.start(SyntaxKind::Function);
            parse_function_header(p);
            p.expect_one_of(&[TokenKind::IsKw, TokenKind::AsKw]);
            parse_function_body(p);
            p.expect(TokenKind::SemiColon);
            p.finish();
        } else if p.at(TokenKind::ProcedureKw) {
            p.start(SyntaxKind::Procedure);
            parse_procedure_header(p);
            p.expect_one_of(&[TokenKind::IsKw, TokenKind::AsKw]);
            parse_procedure_body(p);
            p.expect(TokenKind::SemiColon);
            p.finish();
        } else if p.at(TokenKind::TypeKw) {
            parse_type_decl(p);
        } else {
            parse_variable_decl(p);
        }
    }
    p.expect(TokenKind::EndKw);
    p.eat_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    p.expect(TokenKind::SemiColon);
    p.finish();
}

fn parse_package_header(p: &mut Parser) {
    p.start(SyntaxKind::PackageHeader);
    p.expect(TokenKind::PackageKw);
    p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    p.finish();
}

/// The `PACKAGE BODY` keyword pair is consumed by the caller; this just
/// wraps the trailing name in its own [`SyntaxKind::PackageHeader`] so
/// `PackageBody::header` has the same shape as `PackageSpec::header`.
fn parse_package_header_name(p: &mut Parser) {
    p.start(SyntaxKind::PackageHeader);
    p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    p.finish();
}

fn parse_param_list(p: &mut Parser) {
    p.start(SyntaxKind::ParamList);
    p.expect(TokenKind::LParen);
    if !p.at(TokenKind::RParen) {
        loop {
            parse_param(p);
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
    }
    p.expect(TokenKind::RParen);
    p.finish();
}

fn parse_param(p: &mut Parser) {
    p.start(SyntaxKind::Param);
    p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    p.eat(TokenKind::InKw);
    p.eat(TokenKind::OutKw);
    p.eat(TokenKind::NocopyKw);
    parse_datatype(p);
    if p.eat(TokenKind::Assign) || p.eat(TokenKind::DefaultKw) {
        parse_expr(p);
    }
    p.finish();
}

/// A (possibly schema-qualified) Oracle type name, an optional `%TYPE`/
/// `%ROWTYPE` anchor, and an optional precision/length spec -- the latter
/// consumed token-for-token rather than structurally, since its shape
/// (`NUMBER(10,2)`, `VARCHAR2(100 CHAR)`) doesn't matter until the type
/// mapper (§4.7) inspects the raw text.
fn parse_datatype(p: &mut Parser) {
    p.start(SyntaxKind::Datatype);
    p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    while p.eat(TokenKind::Dot) {
        p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    }
    if p.eat(TokenKind::Percent) {
        p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    }
    if p.eat(TokenKind::LParen) {
        while !p.at(TokenKind::RParen) && !p.at_end() {
            p.bump_any();
        }
        p.expect(TokenKind::RParen);
    }
    p.finish();
}

fn parse_declare_section(p: &mut Parser) {
    p.start(SyntaxKind::DeclareSection);
    while !p.at(TokenKind::BeginKw) && !p.at_end() {
        if p.at(TokenKind::TypeKw) {
            parse_type_decl(p);
        } else {
            parse_variable_decl(p);
        }
    }
    p.finish();
}

fn parse_type_decl(p: &mut Parser) {
    let cp = p.checkpoint();
    p.expect(TokenKind::TypeKw);
    p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    p.expect(TokenKind::IsKw);
    if p.at(TokenKind::RecordKw) {
        p.bump_any();
        p.expect(TokenKind::LParen);
        loop {
            parse_record_field(p);
            if !p.eat(TokenKind::Comma) {
                break;
            }
        }
        p.expect(TokenKind::RParen);
        p.expect(TokenKind::SemiColon);
        p.start_node_at(cp, SyntaxKind::RecordTypeDecl);
        p.finish();
    } else if p.at(TokenKind::TableKw) {
        p.bump_any();
        p.expect(TokenKind::OfKw);
        parse_datatype(p);
        if p.eat(TokenKind::IndexKw) {
            p.expect(TokenKind::ByKw);
            parse_datatype(p);
        }
        p.expect(TokenKind::SemiColon);
        p.start_node_at(cp, SyntaxKind::CollectionTypeDecl);
        p.finish();
    } else {
        p.error(format!("expected RECORD or TABLE, found {:?}", p.current()));
        p.expect(TokenKind::SemiColon);
        p.start_node_at(cp, SyntaxKind::Error);
        p.finish();
    }
}

fn parse_record_field(p: &mut Parser) {
    p.start(SyntaxKind::RecordField);
    p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    parse_datatype(p);
    p.finish();
}

fn parse_variable_decl(p: &mut Parser) {
    p.start(SyntaxKind::VariableDecl);
    p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    p.eat(TokenKind::ConstantKw);
    parse_datatype(p);
    if p.eat(TokenKind::Assign) || p.eat(TokenKind::DefaultKw) {
        parse_expr(p);
    }
    p.expect(TokenKind::SemiColon);
    p.finish();
}

fn parse_statement_list(p: &mut Parser, stop: &[TokenKind]) {
    p.start(SyntaxKind::StatementList);
    while !p.at_end() && !stop.contains(&p.current()) {
        parse_statement(p);
    }
    p.finish();
}

fn parse_statement(p: &mut Parser) {
    match p.current() {
        TokenKind::NullKw => {
            p.start(SyntaxKind::NullStmt);
            p.bump_any();
            p.expect(TokenKind::SemiColon);
            p.finish();
        }
        TokenKind::ExitKw => {
            p.start(SyntaxKind::ExitStmt);
            p.bump_any();
            if p.eat(TokenKind::WhenKw) {
                parse_expr(p);
            }
            p.expect(TokenKind::SemiColon);
            p.finish();
        }
        TokenKind::ReturnKw => {
            p.start(SyntaxKind::ReturnStmt);
            p.bump_any();
            if !p.at(TokenKind::SemiColon) {
                parse_expr(p);
            }
            p.expect(TokenKind::SemiColon);
            p.finish();
        }
        TokenKind::IfKw => parse_if_stmt(p),
        TokenKind::LoopKw => parse_loop_stmt(p),
        TokenKind::WhileKw => parse_while_stmt(p),
        TokenKind::ForKw => parse_for_stmt(p),
        TokenKind::Ident | TokenKind::DelimitedIdent => parse_assignment_or_call(p),
        other => {
            p.error(format!("expected a statement, found {other:?}"));
            p.start(SyntaxKind::Error);
            if !p.at_end() {
                p.bump_any();
            }
            p.finish();
        }
    }
}

fn parse_if_stmt(p: &mut Parser) {
    p.start(SyntaxKind::IfStmt);
    p.expect(TokenKind::IfKw);
    parse_expr(p);
    p.expect(TokenKind::ThenKw);
    parse_statement_list(p, &[TokenKind::ElsifKw, TokenKind::ElseKw, TokenKind::EndKw]);
    while p.at(TokenKind::ElsifKw) {
        p.start(SyntaxKind::ElsifBranch);
        p.bump_any();
        parse_expr(p);
        p.expect(TokenKind::ThenKw);
        parse_statement_list(p, &[TokenKind::ElsifKw, TokenKind::ElseKw, TokenKind::EndKw]);
        p.finish();
    }
    if p.eat(TokenKind::ElseKw) {
        parse_statement_list(p, &[TokenKind::EndKw]);
    }
    p.expect(TokenKind::EndKw);
    p.expect(TokenKind::IfKw);
    p.expect(TokenKind::SemiColon);
    p.finish();
}

fn parse_loop_stmt(p: &mut Parser) {
    p.start(SyntaxKind::LoopStmt);
    p.expect(TokenKind::LoopKw);
    parse_statement_list(p, &[TokenKind::EndKw]);
    p.expect(TokenKind::EndKw);
    p.expect(TokenKind::LoopKw);
    p.expect(TokenKind::SemiColon);
    p.finish();
}

fn parse_while_stmt(p: &mut Parser) {
    p.start(SyntaxKind::WhileLoopStmt);
    p.expect(TokenKind::WhileKw);
    parse_expr(p);
    p.expect(TokenKind::LoopKw);
    parse_statement_list(p, &[TokenKind::EndKw]);
    p.expect(TokenKind::EndKw);
    p.expect(TokenKind::LoopKw);
    p.expect(TokenKind::SemiColon);
    p.finish();
}

/// Both the numeric (`FOR i IN [REVERSE] lo..hi`) and cursor
/// (`FOR rec IN (SELECT ...)`) forms (§4.6).
fn parse_for_stmt(p: &mut Parser) {
    p.start(SyntaxKind::ForLoopStmt);
    p.expect(TokenKind::ForKw);
    p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
    p.expect(TokenKind::InKw);
    p.eat(TokenKind::ReverseKw);
    if p.at(TokenKind::LParen) {
        p.bump_any();
        parse_select_stmt(p);
        p.expect(TokenKind::RParen);
    } else {
        parse_expr(p);
        p.expect(TokenKind::DotDot);
        parse_expr(p);
    }
    p.expect(TokenKind::LoopKw);
    parse_statement_list(p, &[TokenKind::EndKw]);
    p.expect(TokenKind::EndKw);
    p.expect(TokenKind::LoopKw);
    p.expect(TokenKind::SemiColon);
    p.finish();
}

fn parse_exception_handler(p: &mut Parser) {
    p.start(SyntaxKind::ExceptionHandler);
    p.expect(TokenKind::WhenKw);
    loop {
        p.expect_one_of(&[TokenKind::Ident, TokenKind::DelimitedIdent]);
        if !p.eat(TokenKind::OrKw) {
            break;
        }
    }
    p.expect(TokenKind::ThenKw);
    parse_statement_list(p, &[TokenKind::WhenKw, TokenKind::EndKw]);
    p.finish();
}

/// `target := value;` wraps the already-parsed target in an
/// [`SyntaxKind::Assignment`] retroactively; a bare call (`my_proc(1, 2);`,
/// a re-`RAISE`) is left as whatever [`parse_name_or_call`] produced,
/// directly as a [`SyntaxKind::StatementList`] child.
fn parse_assignment_or_call(p: &mut Parser) {
    let cp = p.checkpoint();
    parse_name_or_call(p);
    if p.eat(TokenKind::Assign) {
        parse_expr(p);
        p.start_node_at(cp, SyntaxKind::Assignment);
        p.finish();
    }
    p.expect(TokenKind::SemiColon);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SyntaxKind;

    fn parse_with(f: impl FnOnce(&mut Parser), text: &str) -> crate::parser::Parse {
        let mut p = Parser::new(text);
        p.start(SyntaxKind::Root);
        f(&mut p);
        p.finish();
        p.build()
    }

    #[test]
    fn simple_function() {
        let parse = parse_with(
            parse_function,
            "create or replace function add_one(n in number) return number is \
             begin return n + 1; end;",
        );
        assert!(parse.ok(), "{:?}", parse.errors);
        assert!(parse
            .syntax()
            .descendants()
            .any(|n| n.kind() == SyntaxKind::ReturnStmt));
    }

    #[test]
    fn procedure_with_if_and_exception() {
        let parse = parse_with(
            parse_procedure,
            "create procedure p(x in number) is \
             begin \
               if x > 0 then \
                 y := 1; \
               elsif x < 0 then \
                 y := -1; \
               else \
                 y := 0; \
               end if; \
             exception \
               when others then \
                 null; \
             end;",
        );
        assert!(parse.ok(), "{:?}", parse.errors);
        assert!(parse.syntax().descendants().any(|n| n.kind() == SyntaxKind::IfStmt));
        assert!(parse
            .syntax()
            .descendants()
            .any(|n| n.kind() == SyntaxKind::ExceptionHandler));
    }

    #[test]
    fn numeric_for_loop() {
        let parse = parse_with(
            parse_procedure,
            "create procedure p is begin for i in reverse 1..10 loop null; end loop; end;",
        );
        assert!(parse.ok(), "{:?}", parse.errors);
        assert!(parse
            .syntax()
            .descendants()
            .any(|n| n.kind() == SyntaxKind::ForLoopStmt));
    }

    #[test]
    fn package_spec_and_body() {
        let spec = parse_with(
            parse_package_spec,
            "create package pkg is function f(n in number) return number; end pkg;",
        );
        assert!(spec.ok(), "{:?}", spec.errors);

        let body = parse_with(
            parse_package_body,
            "create package body pkg is function f(n in number) return number is begin return n; end; end pkg;",
        );
        assert!(body.ok(), "{:?}", body.errors);
    }

    #[test]
    fn record_and_collection_type_decls() {
        let parse = parse_with(
            parse_procedure,
            "create procedure p is \
               type rec_t is record (id number, name varchar2(100)); \
               type tbl_t is table of number index by pls_integer; \
               r rec_t; \
             begin null; end;",
        );
        assert!(parse.ok(), "{:?}", parse.errors);
        assert!(parse
            .syntax()
            .descendants()
            .any(|n| n.kind() == SyntaxKind::RecordTypeDecl));
        assert!(parse
            .syntax()
            .descendants()
            .any(|n| n.kind() == SyntaxKind::CollectionTypeDecl));
    }
}
