//! Small free functions shared across the catalog, context and rewriter:
//! case folding and fully-qualified-name joining. Every catalog lookup key
//! and every emitted schema-qualified identifier goes through [`fold`]
//! (§3: "Name folding is consistent everywhere").

/// Folds an Oracle identifier to the catalog's canonical comparison form:
/// lower case. Catalog keys, synonym lookups and emitted `schema.table`/
/// `schema.pkg__func` identifiers all use this; user-written column
/// identifiers are emitted with their source casing instead.
pub fn fold(name: &str) -> String {
    name.to_ascii_lowercase()
}

pub fn qualify(schema: &str, name: &str) -> String {
    format!("{}.{}", fold(schema), fold(name))
}

pub fn eq_folded(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_lowercases() {
        assert_eq!(fold("EMP_PKG"), "emp_pkg");
        assert_eq!(fold("Emp_Pkg"), "emp_pkg");
    }

    #[test]
    fn eq_folded_is_case_insensitive() {
        assert!(eq_folded("G_COUNTER", "g_counter"));
        assert!(!eq_folded("g_counter", "g_other"));
    }
}
