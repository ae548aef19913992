//! Implements the syntax-level (lossless CST) representation of Oracle
//! source text, on top of which the typed [`crate::ast`] layer and the
//! rewriter both operate.
//!
//! Examples that shaped this module's layout:
//! * <https://blog.kiranshila.com/blog/easy_cst.md>
//! * <https://arzg.github.io/lang/10/>
//! * <https://github.com/rust-analyzer/rowan/blob/master/examples/s_expressions.rs>

use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};

use crate::lexer::TokenKind;

/// Every kind of node or token that can appear in the parse tree. A closed,
/// flat set dispatched on exhaustively by the grammar, the typed AST layer
/// and the rewriter -- there is no node-kind-specific subtyping beyond this
/// enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, FromPrimitive, ToPrimitive)]
#[repr(u16)]
pub enum SyntaxKind {
    // --- trivia & leaf tokens -------------------------------------------
    Whitespace,
    Comment,
    /// A keyword whose identity does not matter to the rewriter beyond its
    /// source text (e.g. `SELECT`, `ORDER`, `CASE`, `LOOP`, ...).
    Keyword,
    And,
    Or,
    Not,
    Ident,
    TypeName,
    Dot,
    /// The numeric range operator in `FOR i IN lo..hi LOOP` (§4.5). Kept
    /// distinct from [`Self::Dot`] rather than folded into it: unlike the
    /// reserved-word collapse into [`Self::Keyword`], merging the two would
    /// make this a lossy CST for `..` with no way to tell it apart from `.`
    /// by kind alone.
    DotDot,
    Comma,
    SemiColon,
    Colon,
    Percent,
    Assign,
    Concat,
    Integer,
    Decimal,
    QuotedLiteral,
    LParen,
    RParen,
    ArithmeticOp,
    ComparisonOp,
    Error,

    // --- expressions -------------------------------------------------------
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
    /// Syntactically also covers what the rewriter treats as element access
    /// (`v(i)`) or a member-method call (`alias.col.method(args)`) --
    /// those are the same shape as an ordinary call until the catalog
    /// resolves what `v`/`col` actually is (§4.5).
    FunctionCall,
    ArgumentList,
    Argument,
    /// A window function's `OVER (PARTITION BY ... ORDER BY ...)` clause
    /// (§4.1). Partition expressions sit directly under this node; the
    /// `ORDER BY` portion, if present, is a nested [`SyntaxKind::OrderClause`]
    /// reusing the same node the outer statement uses.
    OverClause,

    // --- SELECT / DML --------------------------------------------------
    SelectStmt,
    WithClause,
    CteDefinition,
    QueryBlock,
    SelectList,
    SelectItem,
    TableReference,
    JoinClause,
    WhereClause,
    GroupByClause,
    HavingClause,
    OrderClause,
    OrderItem,
    SetOp,
    ConnectByClause,
    StartWithClause,
    /// A `FUNCTION`/`PROCEDURE` declared inline inside a `WITH` clause
    /// (Oracle's "with clause function" extension). The grammar accepts
    /// its shape just well enough to skip past it; §4.2 requires it be
    /// rejected with a diagnostic, never rewritten.
    InlineRoutineDecl,

    // --- parameters & types ------------------------------------------------
    ParamList,
    Param,
    Datatype,

    // --- function / procedure -------------------------------------------
    Function,
    FunctionHeader,
    FunctionBody,
    Procedure,
    ProcedureHeader,
    ProcedureBody,

    // --- package ------------------------------------------------------
    PackageSpec,
    PackageHeader,
    PackageBody,

    // --- declarations & statements --------------------------------------
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

    /// The root node of every parse tree.
    Root,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        rowan::SyntaxKind(kind.to_u16().unwrap())
    }
}

impl From<TokenKind> for SyntaxKind {
    fn from(kind: TokenKind) -> Self {
        use TokenKind::*;

        match kind {
            Whitespace => SyntaxKind::Whitespace,
            Comment => SyntaxKind::Comment,
            AndKw => SyntaxKind::And,
            OrKw => SyntaxKind::Or,
            NotKw => SyntaxKind::Not,
            Ident | DelimitedIdent => SyntaxKind::Ident,
            QuotedLiteral => SyntaxKind::QuotedLiteral,
            Integer => SyntaxKind::Integer,
            Decimal => SyntaxKind::Decimal,
            Dot => SyntaxKind::Dot,
            DotDot => SyntaxKind::DotDot,
            Comma => SyntaxKind::Comma,
            SemiColon => SyntaxKind::SemiColon,
            Assign => SyntaxKind::Assign,
            LParen => SyntaxKind::LParen,
            RParen => SyntaxKind::RParen,
            Percent => SyntaxKind::Percent,
            Plus | Minus => SyntaxKind::ArithmeticOp,
            Asterisk => SyntaxKind::ArithmeticOp,
            Slash => SyntaxKind::ArithmeticOp,
            StarStar => SyntaxKind::ArithmeticOp,
            ModKw => SyntaxKind::ArithmeticOp,
            ComparisonOp => SyntaxKind::ComparisonOp,
            LikeKw => SyntaxKind::ComparisonOp,
            DoublePipe => SyntaxKind::Concat,
            Error => SyntaxKind::Error,
            Eof => unreachable!("Eof is a marker, never produced by the lexer"),
            // Every other token kind is a reserved word whose precise
            // identity only matters via its source text.
            _ => SyntaxKind::Keyword,
        }
    }
}

/// Dummy type tying [`SyntaxKind`] to `rowan`'s generic tree types.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum OraLang {}

impl rowan::Language for OraLang {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        Self::Kind::from_u16(raw.0).unwrap()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        rowan::SyntaxKind(kind.to_u16().unwrap())
    }
}

pub type SyntaxNode = rowan::SyntaxNode<OraLang>;
pub type SyntaxToken = rowan::SyntaxToken<OraLang>;
#[allow(unused)]
pub type SyntaxElement = rowan::SyntaxElement<OraLang>;
