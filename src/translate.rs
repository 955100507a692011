//! Line-to-IR translation: one line of external notation becomes one
//! [`ParsedExpression`] record.

use serde::{Deserialize, Serialize};

use crate::algebra;
use crate::diagnostic::Diagnostic;
use crate::notation::{
    remove_suffices, replace_greek_symbols, replace_symbol_constants, SymbolTable,
};

/// Identifier used when a source line is a bare expression with no
/// assignment arrow.
pub const MISSING_IDENTIFIER: &str = "missing";

/// One IR record: canonical expression text plus its free-symbol set.
///
/// `symbols` is always the ascending free-symbol set of the canonical
/// expression before index substitution. When a symbol table is applied the
/// expression holds `params[i]` references while `symbols` keeps the
/// human-readable names for traceability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParsedExpression {
    pub identifier: String,
    pub expression: String,
    pub symbols: Vec<String>,
}

/// A fatal translation failure, carrying the offending line for rendering.
#[derive(Debug)]
pub struct TranslationError {
    pub line_index: usize,
    pub line: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Translate one line. The line splits on the first `->`: the left side (if
/// any) becomes the identifier, the right side is transliterated, constant
/// substituted, parsed, and printed canonically.
pub fn translate(
    line: &str,
    line_index: u32,
    table: Option<&SymbolTable>,
) -> Result<ParsedExpression, Vec<Diagnostic>> {
    let (identifier, body) = match line.split_once("->") {
        Some((lhs, rhs)) => (
            remove_suffices(&replace_greek_symbols(lhs.trim())),
            rhs.trim(),
        ),
        None => (MISSING_IDENTIFIER.to_string(), line.trim()),
    };

    let prepared = replace_symbol_constants(&replace_greek_symbols(body));
    let expr = algebra::parse(&prepared, line_index)?;

    let symbols: Vec<String> = expr.free_symbols().into_iter().collect();
    let canonical = expr.canonical();
    let expression = match table {
        Some(table) => table.substitute(&canonical),
        None => canonical,
    };

    Ok(ParsedExpression {
        identifier,
        expression,
        symbols,
    })
}

/// Translate a batch of lines in order, skipping blank lines.
///
/// Strictly sequential; the first malformed line aborts the whole batch
/// (there is no partial-success mode for a family).
pub fn translate_all(
    lines: &[String],
    table: Option<&SymbolTable>,
) -> Result<Vec<ParsedExpression>, TranslationError> {
    let mut out = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match translate(line, idx as u32, table) {
            Ok(parsed) => out.push(parsed),
            Err(diagnostics) => {
                return Err(TranslationError {
                    line_index: idx,
                    line: line.clone(),
                    diagnostics,
                })
            }
        }
    }
    Ok(out)
}
