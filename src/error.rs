//! The transformation error model (§7): raised when a rewrite rule meets a
//! construct it cannot faithfully translate. Each variant names the Oracle
//! feature that triggered it (the test suite asserts on these names) and,
//! where the spec gives one, carries a hint at the workaround. Unlike
//! [`crate::parser::ParseError`], these are non-recoverable for the
//! current translation but never fatal to the process.

use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum TransformError {
    #[error("CONNECT BY without START WITH is not supported; use a recursive CTE with explicit depth limiting")]
    ConnectByMissingStartWith,

    #[error("CONNECT BY NOCYCLE is not supported; use a recursive CTE with explicit depth limiting")]
    ConnectByNocycle,

    #[error("CONNECT BY over multiple FROM tables is not supported")]
    ConnectByMultipleTables,

    #[error("CONNECT BY over a subquery is not supported")]
    ConnectByOverSubquery,

    #[error("CONNECT_BY_ROOT is not supported")]
    ConnectByRoot,

    #[error("SYS_CONNECT_BY_PATH is not supported")]
    SysConnectByPath,

    #[error("CONNECT BY without PRIOR is not supported")]
    ConnectByMissingPrior,

    #[error("inline PL/SQL function or procedure inside a WITH clause is not supported")]
    InlinePlsqlInWith,

    #[error("{feature} is not supported{}", hint.as_deref().map(|h| format!(": {h}")).unwrap_or_default())]
    Unsupported { feature: String, hint: Option<String> },
}

impl TransformError {
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported { feature: feature.into(), hint: None }
    }

    pub fn unsupported_with_hint(feature: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
            hint: Some(hint.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_feature() {
        let err = TransformError::unsupported_with_hint("use column check constraint", "foo");
        assert!(err.to_string().contains("foo"));
        assert!(err.to_string().contains("use column check constraint"));
    }

    #[test]
    fn connect_by_errors_name_connect_by() {
        assert!(TransformError::ConnectByMissingPrior.to_string().contains("PRIOR"));
        assert!(TransformError::ConnectByMultipleTables.to_string().contains("multiple FROM"));
    }
}
