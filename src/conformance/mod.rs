//! Conformance of a concrete process against a reference process.

pub mod checker;
pub mod incarnation;

pub use checker::ConformanceChecker;
pub use incarnation::IncarnationMap;

use crate::config::AnalysisOptions;
use crate::error::Failure;
use crate::graph::ProcessGraph;

pub fn check_graphs(
    concrete: &ProcessGraph,
    reference: &ProcessGraph,
    options: &AnalysisOptions,
) -> Vec<Failure> {
    ConformanceChecker::new(concrete, reference, &options.incarnation_stereotype).check()
}
