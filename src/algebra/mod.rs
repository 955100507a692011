//! Parser for the external computer-algebra notation.
//!
//! The notation uses square-bracket function application (`Sqrt[x]`) and `^`
//! for exponentiation. Parsing yields a symbolic tree; numeric subtrees are
//! folded so purely numeric coefficients collapse into decimal literals
//! (`Sqrt[lam] / (4 * 3.141592653589793)` prints as
//! `0.07957747154594767*sqrt(lam)`). The whole module is stateless: repeated
//! calls with the same input produce the same tree, there is no global
//! symbol cache.

pub mod lexer;
mod parser;

use std::collections::BTreeSet;

use crate::diagnostic::Diagnostic;
use lexer::Lexer;
use parser::Parser;

/// A symbolic expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Symbol(String),
    Call(String, Vec<Expr>),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
}

/// Parse one expression in external notation into a folded symbolic tree.
///
/// `line` is the zero-based line index used for diagnostic spans. Input must
/// already be transliterated to Latin identifiers; Greek code points are a
/// lex error here.
pub fn parse(source: &str, line: u32) -> Result<Expr, Vec<Diagnostic>> {
    let (tokens, lex_errors) = Lexer::new(source, line).tokenize();
    if !lex_errors.is_empty() {
        return Err(lex_errors);
    }
    Parser::new(tokens).parse().map(Expr::fold)
}

/// A folded numeric value, preserving the integer/float distinction so
/// integer arithmetic stays exact (`4*2` prints `8`, not `8.0`).
#[derive(Clone, Copy, Debug, PartialEq)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(v) => v as f64,
            Num::Float(v) => v,
        }
    }

    fn to_expr(self) -> Expr {
        match self {
            Num::Int(v) => Expr::Int(v),
            Num::Float(v) => Expr::Float(v),
        }
    }
}

impl Expr {
    /// Collect the free symbols of the tree, sorted ascending.
    ///
    /// Function heads are not symbols; `sqrt(lam)` contributes only `lam`.
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Int(_) | Expr::Float(_) => {}
            Expr::Symbol(name) => {
                out.insert(name.clone());
            }
            Expr::Call(_, args) => {
                for arg in args {
                    arg.collect_symbols(out);
                }
            }
            Expr::Neg(inner) => inner.collect_symbols(out),
            Expr::Add(l, r)
            | Expr::Sub(l, r)
            | Expr::Mul(l, r)
            | Expr::Div(l, r)
            | Expr::Pow(l, r) => {
                l.collect_symbols(out);
                r.collect_symbols(out);
            }
        }
    }

    /// Fold numeric subtrees bottom-up.
    ///
    /// Division by a float denominator becomes multiplication by its
    /// reciprocal coefficient; division by an integer stays a division, so
    /// `x/4` keeps its exact form.
    pub fn fold(self) -> Expr {
        match self {
            Expr::Int(_) | Expr::Float(_) | Expr::Symbol(_) => self,
            Expr::Call(name, args) => {
                Expr::Call(name, args.into_iter().map(Expr::fold).collect())
            }
            Expr::Neg(inner) => {
                let inner = inner.fold();
                match as_num(&inner) {
                    Some(Num::Int(v)) => Expr::Int(-v),
                    Some(Num::Float(v)) => Expr::Float(-v),
                    None => Expr::Neg(Box::new(inner)),
                }
            }
            Expr::Add(l, r) => fold_binary(l.fold(), r.fold(), Expr::Add, |a, b| match (a, b) {
                (Num::Int(a), Num::Int(b)) => match a.checked_add(b) {
                    Some(v) => Num::Int(v),
                    None => Num::Float(a as f64 + b as f64),
                },
                (a, b) => Num::Float(a.as_f64() + b.as_f64()),
            }),
            Expr::Sub(l, r) => fold_binary(l.fold(), r.fold(), Expr::Sub, |a, b| match (a, b) {
                (Num::Int(a), Num::Int(b)) => match a.checked_sub(b) {
                    Some(v) => Num::Int(v),
                    None => Num::Float(a as f64 - b as f64),
                },
                (a, b) => Num::Float(a.as_f64() - b.as_f64()),
            }),
            Expr::Mul(l, r) => fold_binary(l.fold(), r.fold(), Expr::Mul, |a, b| match (a, b) {
                (Num::Int(a), Num::Int(b)) => match a.checked_mul(b) {
                    Some(v) => Num::Int(v),
                    None => Num::Float(a as f64 * b as f64),
                },
                (a, b) => Num::Float(a.as_f64() * b.as_f64()),
            }),
            Expr::Div(l, r) => {
                let l = l.fold();
                let r = r.fold();
                match (as_num(&l), as_num(&r)) {
                    (Some(a), Some(b)) => fold_div(a, b).to_expr(),
                    // Symbolic numerator over a float denominator: pull the
                    // reciprocal out as a leading coefficient
                    (None, Some(Num::Float(denominator))) => Expr::Mul(
                        Box::new(Expr::Float(1.0 / denominator)),
                        Box::new(l),
                    ),
                    _ => Expr::Div(Box::new(l), Box::new(r)),
                }
            }
            Expr::Pow(l, r) => {
                let l = l.fold();
                let r = r.fold();
                match (as_num(&l), as_num(&r)) {
                    (Some(Num::Int(base)), Some(Num::Int(exp))) if (0..=63).contains(&exp) => {
                        match base.checked_pow(exp as u32) {
                            Some(v) => Expr::Int(v),
                            None => Expr::Float((base as f64).powi(exp as i32)),
                        }
                    }
                    (Some(a), Some(b)) => Expr::Float(a.as_f64().powf(b.as_f64())),
                    _ => Expr::Pow(Box::new(l), Box::new(r)),
                }
            }
        }
    }

    /// Render the canonical text form: lowercase known function names,
    /// parenthesis calls, `**` power, source term order preserved.
    pub fn canonical(&self) -> String {
        self.print(1)
    }

    fn print(&self, min_prec: u8) -> String {
        let text = match self {
            Expr::Int(v) => v.to_string(),
            Expr::Float(v) => format_float(*v),
            Expr::Symbol(name) => name.clone(),
            Expr::Call(name, args) => {
                let rendered: Vec<String> = args.iter().map(|a| a.print(1)).collect();
                format!("{}({})", canonical_fn_name(name), rendered.join(", "))
            }
            Expr::Neg(inner) => format!("-{}", inner.print(2)),
            Expr::Add(l, r) => {
                // Additions of a negation print as subtraction
                if let Expr::Neg(negated) = r.as_ref() {
                    format!("{} - {}", l.print(1), negated.print(2))
                } else {
                    format!("{} + {}", l.print(1), r.print(2))
                }
            }
            Expr::Sub(l, r) => format!("{} - {}", l.print(1), r.print(2)),
            Expr::Mul(l, r) => format!("{}*{}", l.print(2), r.print(3)),
            Expr::Div(l, r) => format!("{}/{}", l.print(2), r.print(3)),
            Expr::Pow(l, r) => format!("{}**{}", l.print(4), r.print(3)),
        };
        if self.prec() < min_prec {
            format!("({})", text)
        } else {
            text
        }
    }

    fn prec(&self) -> u8 {
        match self {
            Expr::Add(_, _) | Expr::Sub(_, _) | Expr::Neg(_) => 1,
            Expr::Mul(_, _) | Expr::Div(_, _) => 2,
            Expr::Pow(_, _) => 3,
            // Negative literals parenthesize like a negation
            Expr::Int(v) if *v < 0 => 1,
            Expr::Float(v) if *v < 0.0 => 1,
            _ => 4,
        }
    }
}

fn as_num(expr: &Expr) -> Option<Num> {
    match expr {
        Expr::Int(v) => Some(Num::Int(*v)),
        Expr::Float(v) => Some(Num::Float(*v)),
        _ => None,
    }
}

fn fold_binary(
    l: Expr,
    r: Expr,
    rebuild: fn(Box<Expr>, Box<Expr>) -> Expr,
    combine: fn(Num, Num) -> Num,
) -> Expr {
    match (as_num(&l), as_num(&r)) {
        (Some(a), Some(b)) => combine(a, b).to_expr(),
        _ => rebuild(Box::new(l), Box::new(r)),
    }
}

fn fold_div(a: Num, b: Num) -> Num {
    match (a, b) {
        // Exact integer division keeps the integer form
        (Num::Int(a), Num::Int(b)) if b != 0 && a % b == 0 => Num::Int(a / b),
        (a, b) => Num::Float(a.as_f64() / b.as_f64()),
    }
}

/// Shortest round-trip float formatting, with an explicit `.0` for whole
/// values so float-ness survives in the canonical text.
fn format_float(value: f64) -> String {
    let text = format!("{}", value);
    if text.contains('.') || text.contains('e') || text.contains("inf") || text.contains("NaN") {
        text
    } else {
        format!("{}.0", text)
    }
}

fn canonical_fn_name(name: &str) -> &str {
    match name {
        "Sqrt" => "sqrt",
        "Log" => "log",
        "Exp" => "exp",
        "Sin" => "sin",
        "Cos" => "cos",
        "Tan" => "tan",
        "ArcSin" => "asin",
        "ArcCos" => "acos",
        "ArcTan" => "atan",
        other => other,
    }
}
