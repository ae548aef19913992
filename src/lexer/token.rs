//! Token definitions for the [`logos`] lexer.

use std::fmt;

/// The tokens produced by the lexer, before being reinterpreted as
/// [`crate::syntax::SyntaxKind`] by the parser.
///
/// Keywords are matched case-insensitively (`ignore(case)`); identifiers and
/// numeric literals carry a lower `priority` so that an exact keyword token
/// wins a tie against the generic `Ident`/`Integer` regexes.
#[derive(logos::Logos, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    #[regex(r"[ \t\n\r]+")]
    Whitespace,
    #[regex("--.*")]
    Comment,

    #[token("select", ignore(case))]
    SelectKw,
    #[token("from", ignore(case))]
    FromKw,
    #[token("where", ignore(case))]
    WhereKw,
    #[token("group", ignore(case))]
    GroupKw,
    #[token("having", ignore(case))]
    HavingKw,
    #[token("order", ignore(case))]
    OrderKw,
    #[token("by", ignore(case))]
    ByKw,
    #[token("asc", ignore(case))]
    AscKw,
    #[token("desc", ignore(case))]
    DescKw,
    #[token("nulls", ignore(case))]
    NullsKw,
    #[token("first", ignore(case))]
    FirstKw,
    #[token("last", ignore(case))]
    LastKw,
    #[token("connect", ignore(case))]
    ConnectKw,
    #[token("start", ignore(case))]
    StartKw,
    #[token("with", ignore(case))]
    WithKw,
    #[token("recursive", ignore(case))]
    RecursiveKw,
    #[token("prior", ignore(case))]
    PriorKw,
    #[token("nocycle", ignore(case))]
    NocycleKw,
    #[token("union", ignore(case))]
    UnionKw,
    #[token("intersect", ignore(case))]
    IntersectKw,
    #[token("minus", ignore(case))]
    MinusKw,
    #[token("all", ignore(case))]
    AllKw,
    #[token("and", ignore(case))]
    AndKw,
    #[token("or", ignore(case))]
    OrKw,
    #[token("not", ignore(case))]
    NotKw,
    #[token("in", ignore(case))]
    InKw,
    #[token("out", ignore(case))]
    OutKw,
    #[token("nocopy", ignore(case))]
    NocopyKw,
    #[token("between", ignore(case))]
    BetweenKw,
    #[token("like", ignore(case))]
    LikeKw,
    #[token("escape", ignore(case))]
    EscapeKw,
    #[token("is", ignore(case))]
    IsKw,
    #[token("null", ignore(case))]
    NullKw,
    #[token("true", ignore(case))]
    TrueKw,
    #[token("false", ignore(case))]
    FalseKw,
    #[token("case", ignore(case))]
    CaseKw,
    #[token("when", ignore(case))]
    WhenKw,
    #[token("then", ignore(case))]
    ThenKw,
    #[token("else", ignore(case))]
    ElseKw,
    #[token("end", ignore(case))]
    EndKw,
    #[token("as", ignore(case))]
    AsKw,
    #[token("distinct", ignore(case))]
    DistinctKw,
    #[token("join", ignore(case))]
    JoinKw,
    #[token("inner", ignore(case))]
    InnerKw,
    #[token("left", ignore(case))]
    LeftKw,
    #[token("right", ignore(case))]
    RightKw,
    #[token("full", ignore(case))]
    FullKw,
    #[token("outer", ignore(case))]
    OuterKw,
    #[token("cross", ignore(case))]
    CrossKw,
    #[token("on", ignore(case))]
    OnKw,
    #[token("over", ignore(case))]
    OverKw,
    #[token("partition", ignore(case))]
    PartitionKw,
    #[token("leading", ignore(case))]
    LeadingKw,
    #[token("trailing", ignore(case))]
    TrailingKw,
    #[token("both", ignore(case))]
    BothKw,
    #[token("mod", ignore(case))]
    ModKw,
    #[token("create", ignore(case))]
    CreateKw,
    #[token("replace", ignore(case))]
    ReplaceKw,
    #[token("function", ignore(case))]
    FunctionKw,
    #[token("procedure", ignore(case))]
    ProcedureKw,
    #[token("package", ignore(case))]
    PackageKw,
    #[token("body", ignore(case))]
    BodyKw,
    #[token("return", ignore(case))]
    ReturnKw,
    #[token("begin", ignore(case))]
    BeginKw,
    #[token("if", ignore(case))]
    IfKw,
    #[token("elsif", ignore(case))]
    ElsifKw,
    #[token("loop", ignore(case))]
    LoopKw,
    #[token("while", ignore(case))]
    WhileKw,
    #[token("for", ignore(case))]
    ForKw,
    #[token("reverse", ignore(case))]
    ReverseKw,
    #[token("exit", ignore(case))]
    ExitKw,
    #[token("exception", ignore(case))]
    ExceptionKw,
    #[token("type", ignore(case))]
    TypeKw,
    #[token("record", ignore(case))]
    RecordKw,
    #[token("table", ignore(case))]
    TableKw,
    #[token("of", ignore(case))]
    OfKw,
    #[token("index", ignore(case))]
    IndexKw,
    #[token("constant", ignore(case))]
    ConstantKw,
    #[token("default", ignore(case))]
    DefaultKw,

    #[regex(r"\d+\.\d*|\.\d+", priority = 3)]
    Decimal,
    #[regex(r"\d+", priority = 2)]
    Integer,
    #[regex(r"(?i)[a-z_][a-z0-9_$#]*", priority = 1)]
    Ident,
    #[regex(r#""(?:[^"]|"")+""#)]
    DelimitedIdent,
    #[regex("'(?:[^']|'')*'")]
    QuotedLiteral,

    #[token(".")]
    Dot,
    #[token("..")]
    DotDot,
    #[token(",")]
    Comma,
    #[token(";")]
    SemiColon,
    #[token(":=")]
    Assign,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("%")]
    Percent,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("**")]
    StarStar,
    #[token("*")]
    Asterisk,
    #[token("/")]
    Slash,
    #[token("||")]
    DoublePipe,
    #[regex("<>|!=|<=|>=|=|<|>")]
    ComparisonOp,

    /// Produced by [`crate::lexer::Lexer`] for input `logos` could not match
    /// to any other variant; never emitted by a `#[token]`/`#[regex]` rule
    /// itself.
    Error,

    /// Marker token for end of input, never produced by the lexer itself.
    Eof,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
