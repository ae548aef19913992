//! The rewriter/emitter (§4 of the spec): a tree walk dispatched by node
//! shape, consulting [`crate::context::Context`] at every step. Split by
//! the grammar area each submodule covers, mirroring the teacher's
//! `src/rules/` split between `builtins` and `procedure`.

pub mod connect_by;
pub mod expr;
pub mod functions;
pub mod names;
pub mod package;
pub mod plsql;
pub mod query;

pub use query::rewrite_select;
