//! Orchestration: build → structural validation → soundness, per scope.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::info;

use crate::config::AnalysisOptions;
use crate::conformance;
use crate::error::{AnalysisError, Failure};
use crate::graph::{BuildOutput, GraphBuilder, ProcessGraph, Scope};
use crate::model::{CompilationUnit, Process};
use crate::soundness;
use crate::validate;

#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    options: AnalysisOptions,
    known_processes: Vec<String>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Analyzer {
    pub fn new(options: AnalysisOptions) -> Self {
        Analyzer {
            options,
            ..Self::default()
        }
    }

    /// Processes call activities may reference besides the one analysed.
    pub fn with_known_processes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_processes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Checked before each scope; once set, analysis stops with `Cancelled`.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn build(&self, process: &Process) -> BuildOutput {
        GraphBuilder::new()
            .with_known_processes(self.known_processes.iter().cloned())
            .build(process)
    }

    /// Build failures, then per scope (preorder) structural and soundness failures.
    pub fn analyze(&self, process: &Process) -> Result<Vec<Failure>, AnalysisError> {
        let BuildOutput { graph, mut failures } = self.build(process);
        failures.extend(self.analyze_graph(&graph)?);

        info!(
            process = %process.name,
            failures = failures.len(),
            "process analysed"
        );
        Ok(failures)
    }

    /// Structural and soundness failures of an already built graph.
    pub fn analyze_graph(&self, graph: &ProcessGraph) -> Result<Vec<Failure>, AnalysisError> {
        let scopes = graph.scopes();
        let per_scope: Vec<Option<Vec<Failure>>> = if self.options.parallel_scopes {
            scopes.par_iter().map(|scope| self.analyze_scope(graph, scope)).collect()
        } else {
            scopes.iter().map(|scope| self.analyze_scope(graph, scope)).collect()
        };

        let mut failures = Vec::new();
        for scope in per_scope {
            let Some(scope) = scope else {
                return Err(AnalysisError::Cancelled {
                    process: graph.name.clone(),
                });
            };
            failures.extend(scope);
        }
        Ok(failures)
    }

    /// Every process of the unit; call activities may target any of them.
    pub fn analyze_unit(&self, unit: &CompilationUnit) -> Result<Vec<Failure>, AnalysisError> {
        let analyzer = self
            .clone()
            .with_known_processes(unit.processes.iter().map(|p| p.name.clone()));

        let mut failures = Vec::new();
        for process in &unit.processes {
            failures.extend(analyzer.analyze(process)?);
        }
        Ok(failures)
    }

    /// Conformance failures only; build problems of either side are not repeated here.
    pub fn check_conformance(&self, concrete: &Process, reference: &Process) -> Vec<Failure> {
        let concrete = self.build(concrete).graph;
        let reference = self.build(reference).graph;
        conformance::check_graphs(&concrete, &reference, &self.options)
    }

    fn analyze_scope(&self, graph: &ProcessGraph, scope: &Scope) -> Option<Vec<Failure>> {
        if self.is_cancelled() {
            return None;
        }
        let mut failures = validate::validate_scope(graph, scope);
        failures.extend(soundness::analyze_scope(scope, &self.options));
        Some(failures)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}
