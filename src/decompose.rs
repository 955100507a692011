//! Splits one very large additive expression into signed terms.
//!
//! The effective-potential expression files hold a single expression whose
//! top-level terms are separated by ` + ` / ` - ` tokens. A single forward
//! scan tracks parenthesis depth; spaces at depth zero are term boundaries.
//! Term order is preserved exactly: the generated accumulator must sum in
//! source order because floating-point addition is not associative.

use serde::{Deserialize, Serialize};

use crate::convert::to_cython_syntax;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    Plus,
    Minus,
}

/// One term of an additive expression, already converted to target syntax.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedTerm {
    pub sign: Sign,
    pub text: String,
}

/// Decompose an expression into its signed top-level terms.
///
/// A flushed token equal to `"+ "` or `"- "` sets the sign of the next term;
/// anything else is a term (the first term's sign is an implicit plus). Each
/// term is run through the notation-to-Cython converter before storage.
/// Unbalanced parentheses are a fatal format error.
pub fn decompose(expression: &str) -> Result<Vec<SignedTerm>, String> {
    let mut terms = Vec::new();
    let mut buffer = String::new();
    let mut depth: i64 = 0;
    let mut pending_sign = Sign::Plus;

    let flush = |buffer: &mut String, pending_sign: &mut Sign, terms: &mut Vec<SignedTerm>| {
        match buffer.as_str() {
            "+ " => *pending_sign = Sign::Plus,
            "- " => *pending_sign = Sign::Minus,
            token => {
                let trimmed = token.trim_end();
                if !trimmed.is_empty() {
                    terms.push(SignedTerm {
                        sign: *pending_sign,
                        text: to_cython_syntax(trimmed),
                    });
                    *pending_sign = Sign::Plus;
                }
            }
        }
        buffer.clear();
    };

    for ch in expression.chars() {
        buffer.push(ch);
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err("unbalanced parentheses: ')' without matching '('".to_string());
                }
            }
            ' ' if depth == 0 => flush(&mut buffer, &mut pending_sign, &mut terms),
            _ => {}
        }
    }
    flush(&mut buffer, &mut pending_sign, &mut terms);

    if depth != 0 {
        return Err(format!(
            "unbalanced parentheses: {} '(' left unclosed",
            depth
        ));
    }
    Ok(terms)
}
