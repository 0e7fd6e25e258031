//! Static analysis of BPMN-style process models.
//!
//! Pipeline: `model` (declarative input) → `graph` (scoped, resolved graph)
//! → `validate` (local shape rules) → `soundness` (path analyses), plus
//! `conformance` of a concrete process against a reference process.
//! Every phase collects failures instead of stopping at the first one.

pub mod analyzer;
pub mod config;
pub mod conformance;
pub mod error;
pub mod graph;
pub mod model;
pub mod soundness;
pub mod validate;
pub mod wasm;

pub use analyzer::Analyzer;
pub use config::AnalysisOptions;
pub use error::{AnalysisError, Category, Failure, LoadError};
pub use graph::{GraphBuilder, ProcessGraph};

use model::{CompilationUnit, Process};

/// Build, validate and analyse one process with default options.
pub fn validate(process: &Process) -> Vec<Failure> {
    // Without a cancel flag the analyzer cannot fail.
    Analyzer::default().analyze(process).unwrap_or_default()
}

/// Like [`validate`] for every process of a compilation unit.
pub fn validate_unit(unit: &CompilationUnit) -> Vec<Failure> {
    Analyzer::default().analyze_unit(unit).unwrap_or_default()
}

/// Conformance failures of `concrete` against `reference`.
pub fn check_conformance(concrete: &Process, reference: &Process) -> Vec<Failure> {
    Analyzer::default().check_conformance(concrete, reference)
}
