//! Typed AST nodes for PL/SQL function/procedure/package bodies and
//! statements (§4.6, §4.7, §4.8 of the spec).

use crate::ast::{typed_syntax_node, AstNode, AstToken};
use crate::ast::expressions::Ident;
use crate::syntax::{SyntaxKind, SyntaxNode};

typed_syntax_node!(
    Function,
    FunctionHeader,
    FunctionBody,
    Procedure,
    ProcedureHeader,
    ProcedureBody,
    PackageSpec,
    PackageHeader,
    PackageBody,
    ParamList,
    Param,
    Datatype,
    DeclareSection,
    VariableDecl,
    RecordTypeDecl,
    RecordField,
    CollectionTypeDecl,
    StatementList,
    Assignment,
    IfStmt,
    ElsifBranch,
    LoopStmt,
    ForLoopStmt,
    WhileLoopStmt,
    ExceptionHandler,
    ReturnStmt,
    NullStmt,
    ExitStmt,
);

fn first_ident(node: &SyntaxNode) -> Option<String> {
    node.children_with_tokens()
        .filter_map(|el| el.into_token())
        .find(|t| t.kind() == SyntaxKind::Ident)
        .map(|t| t.text().to_string())
}

impl Function {
    pub fn header(&self) -> Option<FunctionHeader> {
        self.syntax.children().find_map(FunctionHeader::cast)
    }

    pub fn body(&self) -> Option<FunctionBody> {
        self.syntax.children().find_map(FunctionBody::cast)
    }
}

impl FunctionHeader {
    pub fn name(&self) -> Option<String> {
        first_ident(&self.syntax)
    }

    pub fn params(&self) -> Option<ParamList> {
        self.syntax.children().find_map(ParamList::cast)
    }

    pub fn return_type(&self) -> Option<Datatype> {
        self.syntax.children().find_map(Datatype::cast)
    }
}

impl FunctionBody {
    pub fn declare_section(&self) -> Option<DeclareSection> {
        self.syntax.children().find_map(DeclareSection::cast)
    }

    pub fn statements(&self) -> Option<StatementList> {
        self.syntax.children().find_map(StatementList::cast)
    }

    pub fn exception_handlers(&self) -> Vec<ExceptionHandler> {
        self.syntax.children().filter_map(ExceptionHandler::cast).collect()
    }
}

impl Procedure {
    pub fn header(&self) -> Option<ProcedureHeader> {
        self.syntax.children().find_map(ProcedureHeader::cast)
    }

    pub fn body(&self) -> Option<ProcedureBody> {
        self.syntax.children().find_map(ProcedureBody::cast)
    }
}

impl ProcedureHeader {
    pub fn name(&self) -> Option<String> {
        first_ident(&self.syntax)
    }

    pub fn params(&self) -> Option<ParamList> {
        self.syntax.children().find_map(ParamList::cast)
    }
}

impl ProcedureBody {
    pub fn declare_section(&self) -> Option<DeclareSection> {
        self.syntax.children().find_map(DeclareSection::cast)
    }

    pub fn statements(&self) -> Option<StatementList> {
        self.syntax.children().find_map(StatementList::cast)
    }

    pub fn exception_handlers(&self) -> Vec<ExceptionHandler> {
        self.syntax.children().filter_map(ExceptionHandler::cast).collect()
    }
}

/// A `CREATE [OR REPLACE] PACKAGE name IS ... END;` spec: a flat list of
/// subprogram *headers* (no bodies) plus shared declarations. Parsed as its
/// own translation unit, separate from the package body (§4.8).
impl PackageSpec {
    pub fn header(&self) -> Option<PackageHeader> {
        self.syntax.children().find_map(PackageHeader::cast)
    }

    pub fn function_headers(&self) -> Vec<FunctionHeader> {
        self.syntax.children().filter_map(FunctionHeader::cast).collect()
    }

    pub fn procedure_headers(&self) -> Vec<ProcedureHeader> {
        self.syntax.children().filter_map(ProcedureHeader::cast).collect()
    }

    pub fn variables(&self) -> Vec<VariableDecl> {
        self.syntax.children().filter_map(VariableDecl::cast).collect()
    }

    pub fn record_types(&self) -> Vec<RecordTypeDecl> {
        self.syntax.children().filter_map(RecordTypeDecl::cast).collect()
    }

    pub fn collection_types(&self) -> Vec<CollectionTypeDecl> {
        self.syntax.children().filter_map(CollectionTypeDecl::cast).collect()
    }
}

impl PackageHeader {
    pub fn name(&self) -> Option<String> {
        first_ident(&self.syntax)
    }
}

/// A `CREATE [OR REPLACE] PACKAGE BODY name IS ... END;`: the actual
/// subprogram bodies, plus any package-level variables declared directly in
/// the body (not mirrored in the spec). Also its own translation unit.
impl PackageBody {
    pub fn header(&self) -> Option<PackageHeader> {
        self.syntax.children().find_map(PackageHeader::cast)
    }

    pub fn functions(&self) -> Vec<Function> {
        self.syntax.children().filter_map(Function::cast).collect()
    }

    pub fn procedures(&self) -> Vec<Procedure> {
        self.syntax.children().filter_map(Procedure::cast).collect()
    }

    /// Package-level variable declarations, shared by every routine in the
    /// package (§4.8: emulated via a per-session table keyed by package
    /// name).
    pub fn variables(&self) -> Vec<VariableDecl> {
        self.syntax.children().filter_map(VariableDecl::cast).collect()
    }
}

impl ParamList {
    pub fn params(&self) -> Vec<Param> {
        self.syntax.children().filter_map(Param::cast).collect()
    }
}

impl Param {
    pub fn name(&self) -> Option<String> {
        first_ident(&self.syntax)
    }

    pub fn datatype(&self) -> Option<Datatype> {
        self.syntax.children().find_map(Datatype::cast)
    }

    pub fn is_out(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("out"))
    }

    pub fn is_in(&self) -> bool {
        !self.is_out()
            || self
                .syntax
                .children_with_tokens()
                .filter_map(|el| el.into_token())
                .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("in"))
    }

    pub fn default_expr(&self) -> Option<SyntaxNode> {
        self.syntax
            .children()
            .find(|n| Datatype::cast(n.clone()).is_none())
    }
}

impl Datatype {
    /// The raw Oracle type name as written (`VARCHAR2`, `PLS_INTEGER`,
    /// `schema.pkg.rec_type`, ...), before type-mapping by the rewriter.
    pub fn raw_name(&self) -> String {
        self.syntax.text().to_string()
    }

    /// `true` for a `%TYPE`/`%ROWTYPE` anchored declaration.
    pub fn is_anchored(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .any(|t| t.kind() == SyntaxKind::Percent)
    }
}

impl DeclareSection {
    pub fn variables(&self) -> Vec<VariableDecl> {
        self.syntax.children().filter_map(VariableDecl::cast).collect()
    }

    pub fn record_types(&self) -> Vec<RecordTypeDecl> {
        self.syntax.children().filter_map(RecordTypeDecl::cast).collect()
    }

    pub fn collection_types(&self) -> Vec<CollectionTypeDecl> {
        self.syntax.children().filter_map(CollectionTypeDecl::cast).collect()
    }
}

impl VariableDecl {
    pub fn name(&self) -> Option<String> {
        first_ident(&self.syntax)
    }

    pub fn datatype(&self) -> Option<Datatype> {
        self.syntax.children().find_map(Datatype::cast)
    }

    pub fn is_constant(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("constant"))
    }

    pub fn init_expr(&self) -> Option<SyntaxNode> {
        self.syntax
            .children()
            .find(|n| Datatype::cast(n.clone()).is_none())
    }
}

impl RecordTypeDecl {
    pub fn name(&self) -> Option<String> {
        first_ident(&self.syntax)
    }

    pub fn fields(&self) -> Vec<RecordField> {
        self.syntax.children().filter_map(RecordField::cast).collect()
    }
}

impl RecordField {
    pub fn name(&self) -> Option<String> {
        first_ident(&self.syntax)
    }

    pub fn datatype(&self) -> Option<Datatype> {
        self.syntax.children().find_map(Datatype::cast)
    }
}

impl CollectionTypeDecl {
    pub fn name(&self) -> Option<String> {
        first_ident(&self.syntax)
    }

    /// `true` for `TABLE OF ... INDEX BY ...` (an associative array / map);
    /// `false` for a plain `TABLE OF ...` (a dense, 1-based array).
    pub fn is_indexed(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("index"))
    }

    pub fn element_type(&self) -> Option<Datatype> {
        self.syntax.children().find_map(Datatype::cast)
    }
}

impl StatementList {
    pub fn statements(&self) -> Vec<SyntaxNode> {
        self.syntax.children().collect()
    }
}

impl Assignment {
    pub fn target(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }

    pub fn value(&self) -> Option<SyntaxNode> {
        self.syntax.children().nth(1)
    }
}

impl IfStmt {
    pub fn condition(&self) -> Option<SyntaxNode> {
        self.syntax.children().find(|n| StatementList::cast(n.clone()).is_none())
    }

    pub fn then_branch(&self) -> Option<StatementList> {
        self.syntax.children().filter_map(StatementList::cast).next()
    }

    pub fn elsif_branches(&self) -> Vec<ElsifBranch> {
        self.syntax.children().filter_map(ElsifBranch::cast).collect()
    }

    /// The final, unconditional `ELSE` block, if present (the last
    /// `StatementList` child, when there's more than one).
    pub fn else_branch(&self) -> Option<StatementList> {
        let lists: Vec<_> = self.syntax.children().filter_map(StatementList::cast).collect();
        if lists.len() > 1 {
            lists.into_iter().last()
        } else {
            None
        }
    }
}

impl ElsifBranch {
    pub fn condition(&self) -> Option<SyntaxNode> {
        self.syntax.children().find(|n| StatementList::cast(n.clone()).is_none())
    }

    pub fn statements(&self) -> Option<StatementList> {
        self.syntax.children().find_map(StatementList::cast)
    }
}

impl LoopStmt {
    pub fn statements(&self) -> Option<StatementList> {
        self.syntax.children().find_map(StatementList::cast)
    }
}

impl WhileLoopStmt {
    pub fn condition(&self) -> Option<SyntaxNode> {
        self.syntax.children().find(|n| StatementList::cast(n.clone()).is_none())
    }

    pub fn statements(&self) -> Option<StatementList> {
        self.syntax.children().find_map(StatementList::cast)
    }
}

impl ForLoopStmt {
    pub fn loop_var(&self) -> Option<Ident> {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .filter_map(Ident::cast)
            .next()
    }

    pub fn is_reverse(&self) -> bool {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .any(|t| t.kind() == SyntaxKind::Keyword && t.text().eq_ignore_ascii_case("reverse"))
    }

    /// The range bounds (`lo`, `hi`) for a numeric `FOR` loop, or the cursor
    /// query for a cursor `FOR` loop (in which case only the first element
    /// is populated).
    pub fn bounds(&self) -> Vec<SyntaxNode> {
        self.syntax
            .children()
            .filter(|n| StatementList::cast(n.clone()).is_none())
            .collect()
    }

    pub fn statements(&self) -> Option<StatementList> {
        self.syntax.children().find_map(StatementList::cast)
    }
}

impl ExceptionHandler {
    /// The exception name(s) this handler matches (`OTHERS`, a named
    /// exception, or several separated by `OR`).
    pub fn names(&self) -> Vec<String> {
        self.syntax
            .children_with_tokens()
            .filter_map(|el| el.into_token())
            .filter(|t| t.kind() == SyntaxKind::Ident || t.kind() == SyntaxKind::Keyword)
            .map(|t| t.text().to_string())
            .collect()
    }

    pub fn statements(&self) -> Option<StatementList> {
        self.syntax.children().find_map(StatementList::cast)
    }
}

impl ReturnStmt {
    pub fn value(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }
}

impl ExitStmt {
    /// The `WHEN` condition, if this is a conditional `EXIT WHEN ...;`.
    pub fn condition(&self) -> Option<SyntaxNode> {
        self.syntax.children().next()
    }
}
