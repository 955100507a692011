use super::*;
use crate::decompose::decompose;

fn parameters() -> Vec<String> {
    vec!["lam".to_string(), "mssq".to_string()]
}

#[test]
fn test_order_module_snapshot() {
    let terms = decompose("Sqrt[lam] - Log[mssq]").unwrap();
    let out = emit_order_module("lo", &parameters(), &terms);
    insta::assert_snapshot!(out.trim_end(), @r###"
#cython: cdivision=False
from libc.complex cimport csqrt
from libc.complex cimport clog

cpdef double complex lo(
    double complex lam,
    double complex mssq,
    ):
    return _lo(
        lam,
        mssq,
    )

cdef double complex _lo(
    double complex lam,
    double complex mssq,
    ):
    cdef double complex a = 0.0
    a += csqrt(lam)
    a -= clog(mssq)
    return a
"###);
}

#[test]
fn test_aggregator_snapshot_one_loop() {
    let out = emit_aggregator(&parameters(), 1);
    insta::assert_snapshot!(out.trim_end(), @r###"
from .lo import lo
from .nlo import nlo

def Veff(
    lam = 1,
    mssq = 1,
    ):
    val_lo = lo(
        lam,
        mssq,
    )
    val_nlo = nlo(
        lam,
        mssq,
    )
    return (val_lo, val_nlo)
"###);
}

#[test]
fn test_term_order_preserved_in_accumulator() {
    let terms = decompose("a - b + c").unwrap();
    let out = emit_order_module("nlo", &parameters(), &terms);
    let a_pos = out.find("a += a").unwrap();
    let b_pos = out.find("a -= b").unwrap();
    let c_pos = out.find("a += c").unwrap();
    assert!(a_pos < b_pos && b_pos < c_pos);
}

#[test]
fn test_aggregator_arity_contract() {
    let two = emit_aggregator(&parameters(), 1);
    assert!(two.contains("return (val_lo, val_nlo)"));
    assert!(!two.contains("nnlo"));

    let three = emit_aggregator(&parameters(), 2);
    assert!(three.contains("from .nnlo import nnlo"));
    assert!(three.contains("return (val_lo, val_nlo, val_nnlo)"));
}

#[test]
fn test_setup_lists_generated_units() {
    let setup = emit_setup(2);
    assert!(setup.contains("Extension(\"lo\", [\"lo.pyx\"])"));
    assert!(setup.contains("Extension(\"nlo\", [\"nlo.pyx\"])"));
    assert!(setup.contains("Extension(\"nnlo\", [\"nnlo.pyx\"])"));

    let setup_lo = emit_setup(1);
    assert!(!setup_lo.contains("nnlo"));
}

#[test]
fn test_init_reexports_aggregator() {
    assert_eq!(emit_init(), "from .veff import *\n");
}

#[test]
fn test_builder_renders_trailing_newline() {
    let mut src = SourceBuilder::new();
    src.line("a");
    src.blank();
    src.line("b");
    assert_eq!(src.render(), "a\n\nb\n");
}
