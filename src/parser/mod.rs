//! The token-tree builder shared by every grammar entry point.
//!
//! Mirrors the small, consistent API the teacher's grammar modules are
//! written against (`start`/`finish`, `checkpoint`/`start_node_at` for
//! Pratt-parsing expressions, `bump`/`bump_any`/`eat`/`eat_one_of`,
//! `expect`/`expect_one_of`, `at`/`current`, `error`) on top of a
//! `rowan::GreenNodeBuilder` fed by the `logos`-based [`crate::lexer`].

use rowan::{Checkpoint, GreenNode, GreenNodeBuilder, Language};

use crate::lexer::{Lexer, Token, TokenKind};
use crate::syntax::{OraLang, SyntaxKind, SyntaxNode};

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// The result of parsing: an immutable syntax tree plus any diagnostics
/// collected along the way. A non-empty `errors` list means the tree is a
/// best-effort recovery attempt and must not be handed to the rewriter
/// (§7: "A parse error is fatal to that translation").
#[derive(Debug)]
pub struct Parse {
    green: GreenNode,
    pub errors: Vec<ParseError>,
}

impl Parse {
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// A debug dump of the tree, used by unit tests.
    pub fn debug_tree(&self) -> String {
        format!("{:#?}", self.syntax())
    }
}

pub struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            tokens: Lexer::new(text).collect(),
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
        }
    }

    pub fn build(self) -> Parse {
        Parse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    // --- node construction -----------------------------------------------

    pub fn start(&mut self, kind: SyntaxKind) {
        self.flush_trivia();
        self.builder.start_node(OraLang::kind_to_raw(kind));
    }

    pub fn finish(&mut self) {
        self.builder.finish_node();
    }

    pub fn checkpoint(&mut self) -> Checkpoint {
        self.flush_trivia();
        self.builder.checkpoint()
    }

    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder
            .start_node_at(checkpoint, OraLang::kind_to_raw(kind));
    }

    // --- token consumption -------------------------------------------------

    /// Flushes any buffered whitespace/comment tokens into the tree as
    /// children of whatever node is currently open.
    fn flush_trivia(&mut self) {
        while let Some(tok) = self.tokens.get(self.pos) {
            if !tok.kind.is_trivia() {
                break;
            }
            self.push_raw(self.pos);
            self.pos += 1;
        }
    }

    fn push_raw(&mut self, idx: usize) {
        let tok = &self.tokens[idx];
        self.builder
            .token(OraLang::kind_to_raw(SyntaxKind::from(tok.kind)), tok.text);
    }

    /// Consumes the next significant token unconditionally, along with any
    /// trivia preceding it.
    pub fn bump_any(&mut self) {
        self.flush_trivia();
        if self.pos < self.tokens.len() {
            self.push_raw(self.pos);
            self.pos += 1;
        }
    }

    /// Consumes the next significant token, which the caller has already
    /// verified (e.g. via [`Self::at`]) to be `kind`.
    pub fn bump(&mut self, kind: TokenKind) {
        debug_assert_eq!(self.current(), kind);
        self.bump_any();
    }

    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump_any();
            true
        } else {
            false
        }
    }

    pub fn eat_one_of(&mut self, kinds: &[TokenKind]) -> bool {
        if kinds.contains(&self.current()) {
            self.bump_any();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error(format!("expected {kind:?}, found {:?}", self.current()));
            false
        }
    }

    pub fn expect_one_of(&mut self, kinds: &[TokenKind]) -> bool {
        if self.eat_one_of(kinds) {
            true
        } else {
            self.error(format!("expected one of {kinds:?}, found {:?}", self.current()));
            false
        }
    }

    /// Explicitly flushes pending trivia. Most callers don't need this --
    /// [`Self::start`]/[`Self::bump_any`] already do it -- but it reads
    /// clearly at clause boundaries.
    pub fn eat_ws(&mut self) {
        self.flush_trivia();
    }

    /// Consumes every remaining significant token up to (but not including)
    /// the *last* occurrence of `kind` before end-of-input, wrapping them in
    /// an [`SyntaxKind::Error`] placeholder node. Used as a recovery
    /// fallback, never by a construct this crate actually rewrites.
    pub fn until_last(&mut self, kind: TokenKind) {
        let last = self
            .tokens
            .iter()
            .enumerate()
            .skip(self.pos)
            .filter(|(_, t)| !t.kind.is_trivia() && t.kind == kind)
            .map(|(idx, _)| idx)
            .last();

        let Some(last) = last else {
            while self.pos < self.tokens.len() {
                self.bump_any();
            }
            return;
        };

        self.start(SyntaxKind::Error);
        while self.significant_pos() < last {
            self.bump_any();
        }
        self.finish();
    }

    /// Index into `tokens` of the next *significant* (non-trivia) token,
    /// used by [`Self::until_last`] to compare positions irrespective of
    /// interleaved trivia.
    fn significant_pos(&self) -> usize {
        let mut idx = self.pos;
        while self.tokens.get(idx).is_some_and(|t| t.kind.is_trivia()) {
            idx += 1;
        }
        idx
    }

    /// The kind of the next significant token, or [`TokenKind::Eof`] past
    /// end of input.
    pub fn current(&self) -> TokenKind {
        self.nth(0)
    }

    pub fn nth(&self, n: usize) -> TokenKind {
        let mut idx = self.pos;
        let mut remaining = n;
        loop {
            match self.tokens.get(idx) {
                None => return TokenKind::Eof,
                Some(t) if t.kind.is_trivia() => idx += 1,
                Some(t) => {
                    if remaining == 0 {
                        return t.kind;
                    }
                    remaining -= 1;
                    idx += 1;
                }
            }
        }
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    pub fn at_end(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    /// The source text of the next significant token, without consuming it.
    pub fn current_text(&self) -> &'a str {
        let mut idx = self.pos;
        while let Some(t) = self.tokens.get(idx) {
            if !t.kind.is_trivia() {
                return t.text;
            }
            idx += 1;
        }
        ""
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let offset: usize = self
            .tokens
            .get(self.significant_pos())
            .map(|t| t.range.start().into())
            .unwrap_or(self.text.len());
        let (line, column) = line_col(self.text, offset);
        self.errors.push(ParseError {
            line,
            column,
            message: message.into(),
        });
    }
}

/// Converts a byte offset into a 1-based `(line, column)` pair.
fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for ch in text[..offset.min(text.len())].chars() {
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}
