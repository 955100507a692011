//! Pure text rewrites from external notation into target-language syntax.
//!
//! No semantic simplification happens here; the rewrites are order-sensitive
//! (function names before bracket style, bracket style before `^`).

use crate::notation::{replace_greek_symbols, replace_symbol_constants};

/// Rewrite one term into Cython complex-arithmetic syntax: `Sqrt`/`Log`
/// become `csqrt`/`clog` from `libc.complex`, square-bracket calls become
/// parenthesis calls, `^` becomes `**`. Constant and Greek substitution are
/// reapplied; both are idempotent with the translator's pass, and term text
/// may be produced without a full-expression translation.
pub fn to_cython_syntax(term: &str) -> String {
    let term = term
        .replace("Sqrt", "csqrt")
        .replace("Log", "clog")
        .replace('[', "(")
        .replace(']', ")")
        .replace('^', "**");
    replace_greek_symbols(&replace_symbol_constants(&term))
}

/// Rewrite one expression into Python/numpy syntax for the diagonalization
/// glue: `Sqrt`/`Log` become `np.sqrt`/`np.log`.
pub fn to_numpy_syntax(expression: &str) -> String {
    let expression = expression
        .replace("Sqrt", "np.sqrt")
        .replace("Log", "np.log")
        .replace('[', "(")
        .replace(']', ")")
        .replace('^', "**");
    replace_greek_symbols(&replace_symbol_constants(&expression))
}

/// Parse the rows of a permutation-matrix file: one brace-delimited row per
/// line, entries split on commas.
pub fn parse_matrix_rows(lines: &[String]) -> Vec<Vec<String>> {
    lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.trim()
                .trim_end_matches(',')
                .trim_start_matches('{')
                .trim_end_matches('}')
                .split(',')
                .map(|entry| entry.trim().to_string())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cython_function_names() {
        assert_eq!(to_cython_syntax("Sqrt[lam]"), "csqrt(lam)");
        assert_eq!(to_cython_syntax("Log[mssq]"), "clog(mssq)");
    }

    #[test]
    fn test_cython_power_operator() {
        assert_eq!(to_cython_syntax("v3^2"), "v3**2");
    }

    #[test]
    fn test_cython_constants_and_greek() {
        assert_eq!(
            to_cython_syntax("λ * Pi"),
            "lam * 3.141592653589793"
        );
    }

    #[test]
    fn test_cython_idempotent_on_converted_text() {
        let once = to_cython_syntax("Sqrt[λ]^2 / Pi");
        assert_eq!(to_cython_syntax(&once), once);
    }

    #[test]
    fn test_numpy_function_names() {
        assert_eq!(to_numpy_syntax("Sqrt[x] + Log[y]"), "np.sqrt(x) + np.log(y)");
    }

    #[test]
    fn test_parse_matrix_rows() {
        let lines = vec!["{1, 0}".to_string(), "{0, 0}".to_string()];
        assert_eq!(
            parse_matrix_rows(&lines),
            vec![
                vec!["1".to_string(), "0".to_string()],
                vec!["0".to_string(), "0".to_string()],
            ]
        );
    }

    #[test]
    fn test_parse_matrix_rows_skips_blank_lines() {
        let lines = vec!["{1, 0},".to_string(), "".to_string(), "{0, 1}".to_string()];
        let rows = parse_matrix_rows(&lines);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["1", "0"]);
    }
}
