//! Code emission for the generated numeric package.
//!
//! Emitters are pure: each returns the full source text for exactly one
//! output file, and the pipeline writes it (whole-file overwrite). What to
//! emit is decided here; formatting goes through [`SourceBuilder`] so the
//! two stay separable.

pub mod diagonalize;

use crate::decompose::{Sign, SignedTerm};

/// Ordered line buffer for generated source.
pub struct SourceBuilder {
    lines: Vec<String>,
}

impl Default for SourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceBuilder {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn render(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// Emit one per-order Cython evaluator module (`lo.pyx`, `nlo.pyx`, ...).
///
/// The public entry point takes one `double complex` argument per parameter
/// in declared order and delegates to a private accumulator of identical
/// signature. The accumulator applies `+=`/`-=` per signed term in exact
/// decomposition order; reordering would change the floating-point sum.
pub fn emit_order_module(
    order_name: &str,
    parameters: &[String],
    terms: &[SignedTerm],
) -> String {
    let mut src = SourceBuilder::new();
    src.line("#cython: cdivision=False");
    src.line("from libc.complex cimport csqrt");
    src.line("from libc.complex cimport clog");
    src.blank();

    src.line(format!("cpdef double complex {}(", order_name));
    for parameter in parameters {
        src.line(format!("    double complex {},", parameter));
    }
    src.line("    ):");
    src.line(format!("    return _{}(", order_name));
    for parameter in parameters {
        src.line(format!("        {},", parameter));
    }
    src.line("    )");
    src.blank();

    src.line(format!("cdef double complex _{}(", order_name));
    for parameter in parameters {
        src.line(format!("    double complex {},", parameter));
    }
    src.line("    ):");
    src.line("    cdef double complex a = 0.0");
    for term in terms {
        let op = match term.sign {
            Sign::Plus => "+=",
            Sign::Minus => "-=",
        };
        src.line(format!("    a {} {}", op, term.text));
    }
    src.line("    return a");
    src.render()
}

/// Emit the aggregator (`veff.py`): imports each per-order module, calls
/// every order with the full parameter list, and returns the contributions
/// as an ordered tuple. With `loop_order < 2` the tuple has two elements,
/// otherwise three; callers rely on this arity.
pub fn emit_aggregator(parameters: &[String], loop_order: u32) -> String {
    let mut src = SourceBuilder::new();
    src.line("from .lo import lo");
    src.line("from .nlo import nlo");
    if loop_order > 1 {
        src.line("from .nnlo import nnlo");
    }
    src.blank();

    src.line("def Veff(");
    for parameter in parameters {
        src.line(format!("    {} = 1,", parameter));
    }
    src.line("    ):");

    let order_names: &[&str] = if loop_order > 1 {
        &["lo", "nlo", "nnlo"]
    } else {
        &["lo", "nlo"]
    };
    for order in order_names {
        src.line(format!("    val_{} = {}(", order, order));
        for parameter in parameters {
            src.line(format!("        {},", parameter));
        }
        src.line("    )");
    }

    if loop_order > 1 {
        src.line("    return (val_lo, val_nlo, val_nnlo)");
    } else {
        src.line("    return (val_lo, val_nlo)");
    }
    src.render()
}

/// Emit the package initializer re-exporting the aggregator's public names.
pub fn emit_init() -> String {
    let mut src = SourceBuilder::new();
    src.line("from .veff import *");
    src.render()
}

/// Emit the build description enumerating the generated Cython units for
/// ahead-of-time compilation.
pub fn emit_setup(loop_order: u32) -> String {
    let mut src = SourceBuilder::new();
    src.line("#!/usr/bin/env python3");
    src.line("# -*- coding: utf-8 -*-");
    src.line("from setuptools import setup, Extension");
    src.line("from Cython.Build import cythonize");
    src.blank();
    src.line("extensions = [Extension(\"lo\", [\"lo.pyx\"])]");
    if loop_order >= 1 {
        src.line("extensions.append(Extension(\"nlo\", [\"nlo.pyx\"]))");
    }
    if loop_order >= 2 {
        src.line("extensions.append(Extension(\"nnlo\", [\"nnlo.pyx\"]))");
    }
    src.blank();
    src.line("setup(");
    src.line("    name=\"Veff_cython\",");
    src.line("    ext_modules=cythonize(");
    src.line("        extensions, compiler_directives={\"language_level\": \"3\"}");
    src.line("    ),");
    src.line(")");
    src.render()
}

#[cfg(test)]
mod tests;
