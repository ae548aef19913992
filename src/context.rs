//! The context layer (§3, §9): the per-translation bundle threaded through
//! every rewrite, plus the two pieces of rewrite-local scratch state the
//! design notes call out explicitly -- the CONNECT BY emission mode and
//! the per-routine inline type registry. Both are mutated during a single
//! rewrite call despite the context otherwise being treated as immutable,
//! hence the `RefCell`: callers see a `&Context`, not a `&mut Context`,
//! because the rewriter is a plain recursive tree walk, not a visitor that
//! threads `&mut` through every call.

use std::cell::RefCell;

use indexmap::IndexMap;

use crate::catalog::CatalogIndices;
use crate::eval::TypeEvaluator;
use crate::util::{fold, qualify};

/// Which arm of a `CONNECT BY` → recursive CTE rewrite is currently being
/// emitted, threaded alongside the context so `LEVEL` resolves to the
/// right replacement at each nesting depth (§9: "a small emission mode
/// value... rather than a mutable stack").
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EmissionMode {
    BaseArm,
    RecursiveArm,
    Outer,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InlineTypeKind {
    Record,
    Array,
    Map,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InlineTypeInfo {
    pub kind: InlineTypeKind,
    pub schema: String,
    /// The mapped PostgreSQL element type (`numeric`, `text`, ...), known
    /// only for `Array`/`Map` kinds whose `TABLE OF T [INDEX BY K]`
    /// declaration named a concrete `T` (§4.5: element reads cast to `T`).
    pub element_type: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PackageVariableInfo {
    pub data_type: String,
    pub default_expression: Option<String>,
    pub is_constant: bool,
}

/// `variable_name → info`, in declaration order.
pub type PackageVariables = IndexMap<String, PackageVariableInfo>;

/// `schema.package → variables`, extracted from parsed package-spec text
/// rather than relational metadata (§3).
pub type PackageVariableCatalog = IndexMap<String, PackageVariables>;

#[derive(Debug, Clone, Default)]
struct Scratch {
    connect_by_mode: Option<EmissionMode>,
    inline_types: IndexMap<String, InlineTypeInfo>,
    local_names: std::collections::HashSet<String>,
    alias_tables: IndexMap<String, (String, String)>,
}

pub struct Context<'a> {
    pub active_schema: String,
    pub catalog: &'a CatalogIndices,
    pub evaluator: &'a dyn TypeEvaluator,
    pub current_package: Option<String>,
    pub package_variables: Option<&'a PackageVariableCatalog>,
    scratch: RefCell<Scratch>,
}

impl<'a> Context<'a> {
    pub fn new(active_schema: impl Into<String>, catalog: &'a CatalogIndices, evaluator: &'a dyn TypeEvaluator) -> Self {
        Self {
            active_schema: active_schema.into(),
            catalog,
            evaluator,
            current_package: None,
            package_variables: None,
            scratch: RefCell::new(Scratch::default()),
        }
    }

    pub fn with_package(mut self, package: impl Into<String>, variables: &'a PackageVariableCatalog) -> Self {
        self.current_package = Some(package.into());
        self.package_variables = Some(variables);
        self
    }

    pub fn connect_by_mode(&self) -> Option<EmissionMode> {
        self.scratch.borrow().connect_by_mode
    }

    pub fn set_connect_by_mode(&self, mode: Option<EmissionMode>) {
        self.scratch.borrow_mut().connect_by_mode = mode;
    }

    pub fn register_inline_type(&self, name: &str, info: InlineTypeInfo) {
        self.scratch.borrow_mut().inline_types.insert(fold(name), info);
    }

    pub fn inline_type(&self, name: &str) -> Option<InlineTypeInfo> {
        self.scratch.borrow().inline_types.get(&fold(name)).cloned()
    }

    pub fn register_local_name(&self, name: &str) {
        self.scratch.borrow_mut().local_names.insert(fold(name));
    }

    /// `true` if `name` was declared locally in the current routine's
    /// DECLARE section; locals always win over package variables (§4.5).
    pub fn is_local_name(&self, name: &str) -> bool {
        self.scratch.borrow().local_names.contains(&fold(name))
    }

    /// Records that `alias` in the current `FROM`/join list refers to
    /// `schema.table`, so that expression rewriting can resolve member
    /// method calls (`alias.col.method(...)`, §4.5) without re-parsing the
    /// query block. Cleared implicitly by the next statement's `Context`
    /// (scratch never outlives a single top-level rewrite call).
    pub fn register_alias_table(&self, alias: &str, schema: impl Into<String>, table: impl Into<String>) {
        self.scratch
            .borrow_mut()
            .alias_tables
            .insert(fold(alias), (schema.into(), table.into()));
    }

    pub fn alias_table(&self, alias: &str) -> Option<(String, String)> {
        self.scratch.borrow().alias_tables.get(&fold(alias)).cloned()
    }

    /// The package-variable entry for `name` in the current package, if
    /// any; `None` whenever `current_package` is unset, matching §3's
    /// invariant that standalone routines see no package variables.
    pub fn package_variable(&self, name: &str) -> Option<PackageVariableInfo> {
        let package = self.current_package.as_ref()?;
        let variables = self.package_variables?;
        let key = qualify(&self.active_schema, package);
        variables.get(&key)?.get(&fold(name)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_empty_indices;
    use crate::eval::DefaultTypeEvaluator;

    #[test]
    fn no_package_variables_without_current_package() {
        let indices = build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        assert!(ctx.package_variable("g_counter").is_none());
    }

    #[test]
    fn package_variable_lookup_is_case_insensitive() {
        let indices = build_empty_indices();
        let mut vars = PackageVariables::new();
        vars.insert(
            "g_counter".to_string(),
            PackageVariableInfo {
                data_type: "number".to_string(),
                default_expression: None,
                is_constant: false,
            },
        );
        let mut catalog = PackageVariableCatalog::new();
        catalog.insert("hr.emp_pkg".to_string(), vars);

        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator).with_package("emp_pkg", &catalog);
        assert!(ctx.package_variable("G_COUNTER").is_some());
        assert!(ctx.package_variable("Emp_Pkg").is_none());
    }

    #[test]
    fn local_names_are_folded() {
        let indices = build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        ctx.register_local_name("G_Counter");
        assert!(ctx.is_local_name("g_counter"));
    }
}
