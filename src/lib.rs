//! veffgen: translates computer-algebra expression files describing a
//! dimensionally reduced effective potential into a canonical IR snapshot
//! and a compiled numeric evaluation package (Cython per-order evaluators,
//! a Python aggregator, and matrix-diagonalization glue).

pub mod algebra;
pub mod config;
pub mod convert;
pub mod decompose;
pub mod diagnostic;
pub mod emit;
pub mod ir;
pub mod notation;
pub mod pipeline;
pub mod span;
pub mod translate;

pub use config::GenerateConfig;
pub use pipeline::Pipeline;
