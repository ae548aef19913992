//! Oracle built-in function rewrites (§4.4): `NVL`/`NVL2`/`DECODE` become
//! `COALESCE`/`CASE`, `SUBSTR` becomes `SUBSTRING`, `TO_CHAR`/`TO_DATE` get
//! their format strings and NLS argument rewritten, `SYSDATE` (handled as a
//! bare identifier, not here) becomes `CURRENT_TIMESTAMP`.

use crate::ast::{ArgumentList, FunctionCall};
use crate::context::Context;
use crate::error::TransformError;
use crate::rewrite::expr::rewrite_expr;

const BUILTINS: &[&str] = &["nvl", "nvl2", "decode", "substr", "to_char", "to_date", "trim"];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.iter().any(|b| name.eq_ignore_ascii_case(b))
}

pub fn rewrite_builtin(ctx: &Context, name: &str, node: &FunctionCall) -> Result<String, TransformError> {
    let lower = name.to_ascii_lowercase();
    let arg_list = node.argument_list();
    let args = arg_list.as_ref().map(|al| al.arguments()).unwrap_or_default();
    let rendered: Vec<String> = args
        .iter()
        .map(|a| {
            a.expr()
                .ok_or_else(|| TransformError::unsupported("empty function argument"))
                .and_then(|e| rewrite_expr(&e, ctx))
        })
        .collect::<Result<Vec<_>, _>>()?;

    match lower.as_str() {
        "nvl" => {
            let [a, b] = require_exact::<2>(&rendered, "NVL")?;
            Ok(format!("COALESCE({a}, {b})"))
        }
        "nvl2" => {
            let [a, b, c] = require_exact::<3>(&rendered, "NVL2")?;
            Ok(format!("CASE WHEN {a} IS NOT NULL THEN {b} ELSE {c} END"))
        }
        "decode" => rewrite_decode(&rendered),
        "substr" => rewrite_substr(&rendered),
        "to_char" => rewrite_to_char(&rendered),
        "to_date" => rewrite_to_date(&rendered),
        "trim" => rewrite_trim(&rendered, arg_list.as_ref()),
        _ => unreachable!("is_builtin gated this call"),
    }
}

/// `TRIM([LEADING|TRAILING|BOTH] [chars] FROM s)` passes through as-is
/// (§4.4); `TRIM(s)` with no specifier/`FROM` is the degenerate one-arg
/// form. The specifier and the presence of `FROM` are read off the bare
/// keyword tokens the trim-specific grammar leaves in the `ArgumentList`
/// (see `grammar::expressions::parse_trim_argument_list`), since neither
/// is itself an expression argument.
fn rewrite_trim(rendered: &[String], arg_list: Option<&ArgumentList>) -> Result<String, TransformError> {
    let keywords = arg_list.map(|al| al.keyword_tokens()).unwrap_or_default();
    let specifier = keywords
        .iter()
        .map(|t| t.text().to_ascii_uppercase())
        .find(|t| matches!(t.as_str(), "LEADING" | "TRAILING" | "BOTH"));
    let has_from = keywords.iter().any(|t| t.text().eq_ignore_ascii_case("from"));
    let prefix = specifier.map(|s| format!("{s} ")).unwrap_or_default();

    match rendered.len() {
        1 if !has_from => Ok(format!("TRIM({})", rendered[0])),
        1 => Ok(format!("TRIM({prefix}FROM {})", rendered[0])),
        2 => Ok(format!("TRIM({prefix}{} FROM {})", rendered[0], rendered[1])),
        _ => Err(TransformError::unsupported("TRIM with an unexpected argument count")),
    }
}

fn require_exact<const N: usize>(rendered: &[String], name: &str) -> Result<[String; N], TransformError> {
    <[String; N]>::try_from(rendered.to_vec())
        .map_err(|_| TransformError::unsupported(format!("{name} with an unexpected argument count")))
}

/// `DECODE(expr, s1, r1, s2, r2, ..., default?)` → a simple `CASE expr WHEN
/// s1 THEN r1 ... [ELSE default] END` (§4.4). DECODE's NULL-equality quirk
/// (`DECODE(x, NULL, ...)` matches `x IS NULL`) is not modeled; Postgres
/// `CASE`/`=` is NULL-safe in the same direction DECODE callers usually
/// rely on for non-NULL branches.
fn rewrite_decode(rendered: &[String]) -> Result<String, TransformError> {
    if rendered.len() < 3 {
        return Err(TransformError::unsupported("DECODE with fewer than 3 arguments"));
    }
    let subject = &rendered[0];
    let rest = &rendered[1..];
    let has_default = rest.len() % 2 == 1;
    let pairs_end = if has_default { rest.len() - 1 } else { rest.len() };

    let mut out = format!("CASE {subject}");
    for pair in rest[..pairs_end].chunks(2) {
        out.push_str(&format!(" WHEN {} THEN {}", pair[0], pair[1]));
    }
    if has_default {
        out.push_str(&format!(" ELSE {}", rest[pairs_end]));
    }
    out.push_str(" END");
    Ok(out)
}

fn rewrite_substr(rendered: &[String]) -> Result<String, TransformError> {
    match rendered.len() {
        2 => Ok(format!("SUBSTRING({} FROM {})", rendered[0], rendered[1])),
        3 => Ok(format!("SUBSTRING({} FROM {} FOR {})", rendered[0], rendered[1], rendered[2])),
        _ => Err(TransformError::unsupported("SUBSTR with an unexpected argument count")),
    }
}

/// `TO_CHAR(expr, fmt[, nlsparam])` → `TO_CHAR(expr, fmt)` with the format
/// string translated and the NLS argument dropped (§4.4).
fn rewrite_to_char(rendered: &[String]) -> Result<String, TransformError> {
    match rendered.len() {
        1 => Ok(format!("TO_CHAR({})", rendered[0])),
        2 | 3 => {
            let fmt = rewrite_format_literal(&rendered[1]);
            Ok(format!("TO_CHAR({}, {fmt})", rendered[0]))
        }
        _ => Err(TransformError::unsupported("TO_CHAR with an unexpected argument count")),
    }
}

/// `TO_DATE(expr, fmt[, nlsparam])` → `TO_TIMESTAMP(expr, fmt)`, same format
/// rules as `TO_CHAR`, NLS argument dropped (§4.4).
fn rewrite_to_date(rendered: &[String]) -> Result<String, TransformError> {
    match rendered.len() {
        1 => Ok(format!("TO_TIMESTAMP({})", rendered[0])),
        2 | 3 => {
            let fmt = rewrite_format_literal(&rendered[1]);
            Ok(format!("TO_TIMESTAMP({}, {fmt})", rendered[0]))
        }
        _ => Err(TransformError::unsupported("TO_DATE with an unexpected argument count")),
    }
}

/// Rewrites a quoted format-string literal, leaving the quotes in place.
/// Date-context formats get `RR`→`YY`, `RRRR`→`YYYY` (Postgres has no 2/4-
/// digit century-pivot equivalent to Oracle's `RR`, so the safer literal
/// substitution is used); number-context formats (no date component
/// tokens) get `G`→`,`, `D`→`.`. `DD` is never touched either way.
fn rewrite_format_literal(literal: &str) -> String {
    let Some(inner) = literal.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) else {
        return literal.to_string();
    };

    let is_date_format = ["yyyy", "yy", "mm", "hh", "mi", "ss", "mon", "dy", "rr"]
        .iter()
        .any(|tok| inner.to_ascii_lowercase().contains(tok));

    let rewritten = if is_date_format {
        replace_case_insensitive(&replace_case_insensitive(inner, "RRRR", "YYYY"), "RR", "YY")
    } else {
        inner.replace('G', ",").replace('D', ".")
    };

    format!("'{rewritten}'")
}

fn replace_case_insensitive(haystack: &str, needle: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(haystack.len());
    let lower_haystack = haystack.to_ascii_lowercase();
    let lower_needle = needle.to_ascii_lowercase();
    let mut rest = haystack;
    let mut lower_rest = lower_haystack.as_str();
    while let Some(idx) = lower_rest.find(&lower_needle) {
        out.push_str(&rest[..idx]);
        out.push_str(replacement);
        rest = &rest[idx + needle.len()..];
        lower_rest = &lower_rest[idx + needle.len()..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_without_default() {
        let rendered = vec!["x".to_string(), "1".to_string(), "'a'".to_string(), "2".to_string(), "'b'".to_string()];
        assert_eq!(rewrite_decode(&rendered).unwrap(), "CASE x WHEN 1 THEN 'a' WHEN 2 THEN 'b' END");
    }

    #[test]
    fn decode_with_default() {
        let rendered = vec!["x".to_string(), "1".to_string(), "'a'".to_string(), "'z'".to_string()];
        assert_eq!(rewrite_decode(&rendered).unwrap(), "CASE x WHEN 1 THEN 'a' ELSE 'z' END");
    }

    #[test]
    fn date_format_swaps_rr_for_yy() {
        assert_eq!(rewrite_format_literal("'DD-MON-RR'"), "'DD-MON-YY'");
        assert_eq!(rewrite_format_literal("'YYYY-MM-DD'"), "'YYYY-MM-DD'");
    }

    #[test]
    fn number_format_swaps_group_and_decimal() {
        assert_eq!(rewrite_format_literal("'999G999D99'"), "'999,999.99'");
    }

    #[test]
    fn trim_plain_form_has_no_specifier_or_from() {
        let rendered = vec!["s".to_string()];
        assert_eq!(rewrite_trim(&rendered, None).unwrap(), "TRIM(s)");
    }

    #[test]
    fn trim_chars_from_form() {
        let rendered = vec!["'x'".to_string(), "s".to_string()];
        assert_eq!(rewrite_trim(&rendered, None).unwrap(), "TRIM('x' FROM s)");
    }
}
