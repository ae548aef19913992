//! Identifier & table resolution (§4.4 "Identifier & table resolution",
//! "Synonym resolution policy", and the sequence pseudo-column rule).

use crate::context::Context;
use crate::util::fold;

pub fn is_dual(parts: &[String]) -> bool {
    match parts {
        [name] => name.eq_ignore_ascii_case("dual"),
        [schema, name] => schema.eq_ignore_ascii_case("sys") && name.eq_ignore_ascii_case("dual"),
        _ => false,
    }
}

/// Resolves a table reference's dotted name parts to the `schema.table`
/// text emitted in `FROM` (§4.4: synonym lookup in the active schema, then
/// public, then a bare `active_schema.name` qualification).
pub fn resolve_table_name(ctx: &Context, parts: &[String]) -> String {
    match parts {
        [name] => match ctx.catalog.resolve_synonym(&ctx.active_schema, name) {
            Some((owner, target)) => format!("{owner}.{target}"),
            None => format!("{}.{}", fold(&ctx.active_schema), fold(name)),
        },
        _ => parts.iter().map(|p| fold(p)).collect::<Vec<_>>().join("."),
    }
}

/// Resolves a two-part package function call `pkg.func` to the emitted
/// call target, after synonym resolution on `pkg` (§4.4).
pub fn resolve_package_function(ctx: &Context, pkg: &str, func: &str) -> String {
    let (owner, target_pkg) = ctx
        .catalog
        .resolve_synonym(&ctx.active_schema, pkg)
        .unwrap_or_else(|| (fold(&ctx.active_schema), fold(pkg)));

    if owner.eq_ignore_ascii_case(&ctx.active_schema) {
        format!("{}__{}", target_pkg, fold(func))
    } else {
        format!("{owner}.{target_pkg}__{}", fold(func))
    }
}

/// Resolves an unqualified single-part function name that matched no
/// built-in Oracle rewrite rule (§4.4 "unqualified function" policy): a
/// sibling call to a function in the *current* package resolves to that
/// package's emitted name; anything else is schema-qualified as a
/// pass-through.
pub fn resolve_bare_function(ctx: &Context, name: &str) -> String {
    if let Some(pkg) = &ctx.current_package {
        if ctx.catalog.is_package_function(&ctx.active_schema, pkg, name) {
            return format!("{}.{}__{}", fold(&ctx.active_schema), fold(pkg), fold(name));
        }
    }
    format!("{}.{}", fold(&ctx.active_schema), fold(name))
}

/// `seq.NEXTVAL` / `seq.CURRVAL` (optionally schema-qualified), parsed as a
/// plain dotted `ColumnRef` since they carry no parentheses. Returns the
/// emitted `nextval('schema.seq')`/`currval('schema.seq')` call, or `None`
/// if `parts` doesn't end in one of those two pseudo-columns.
pub fn resolve_sequence_pseudo_column(ctx: &Context, parts: &[String]) -> Option<String> {
    let (last, rest) = parts.split_last()?;
    let op = if last.eq_ignore_ascii_case("nextval") {
        "nextval"
    } else if last.eq_ignore_ascii_case("currval") {
        "currval"
    } else {
        return None;
    };

    let qualified = match rest {
        [seq] => format!("{}.{}", fold(&ctx.active_schema), fold(seq)),
        [schema, seq] => format!("{}.{}", fold(schema), fold(seq)),
        _ => return None,
    };
    Some(format!("{op}('{qualified}')"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{build_indices, MetadataProvider, PackageFunctionMetadata, SynonymMetadata};
    use crate::catalog::{TableMetadata, TypeMethodMetadata};
    use crate::eval::DefaultTypeEvaluator;

    struct FakeProvider {
        synonyms: Vec<SynonymMetadata>,
        package_functions: Vec<PackageFunctionMetadata>,
    }

    impl MetadataProvider for FakeProvider {
        fn tables(&self) -> Vec<TableMetadata> {
            vec![]
        }
        fn type_methods(&self) -> Vec<TypeMethodMetadata> {
            vec![]
        }
        fn package_functions(&self) -> Vec<PackageFunctionMetadata> {
            self.package_functions.clone()
        }
        fn synonyms(&self) -> Vec<SynonymMetadata> {
            self.synonyms.clone()
        }
    }

    #[test]
    fn bare_table_name_qualified_with_active_schema() {
        let indices = crate::catalog::build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        assert_eq!(resolve_table_name(&ctx, &["EMPLOYEES".to_string()]), "hr.employees");
    }

    #[test]
    fn synonym_resolves_table_name() {
        let provider = FakeProvider {
            synonyms: vec![SynonymMetadata {
                owner: "hr".into(),
                name: "syn".into(),
                target_owner: "t".into(),
                target_name: "t".into(),
            }],
            package_functions: vec![],
        };
        let indices = build_indices(&provider, &["hr".to_string()]);
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        assert_eq!(resolve_table_name(&ctx, &["syn".to_string()]), "t.t");
    }

    #[test]
    fn package_function_crossing_schema() {
        let provider = FakeProvider {
            synonyms: vec![SynonymMetadata {
                owner: "hr".into(),
                name: "pkg".into(),
                target_owner: "core".into(),
                target_name: "real_pkg".into(),
            }],
            package_functions: vec![],
        };
        let indices = build_indices(&provider, &["hr".to_string()]);
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        assert_eq!(resolve_package_function(&ctx, "pkg", "func"), "core.real_pkg__func");
    }

    #[test]
    fn sequence_nextval_without_schema() {
        let indices = crate::catalog::build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        assert_eq!(
            resolve_sequence_pseudo_column(&ctx, &["seq1".to_string(), "NEXTVAL".to_string()]),
            Some("nextval('hr.seq1')".to_string())
        );
    }

    #[test]
    fn sequence_currval_with_schema() {
        let indices = crate::catalog::build_empty_indices();
        let ctx = Context::new("hr", &indices, &DefaultTypeEvaluator);
        assert_eq!(
            resolve_sequence_pseudo_column(
                &ctx,
                &["other".to_string(), "seq1".to_string(), "CURRVAL".to_string()]
            ),
            Some("currval('other.seq1')".to_string())
        );
    }
}
