//! Soundness analysis over one scope at a time.
//!
//! Runs after structural validation but does not rely on it: every check
//! tolerates arbitrary graph shapes.

pub mod blocks;
pub mod loops;
pub mod reachability;
pub mod sync;

use std::collections::HashSet;

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::config::AnalysisOptions;
use crate::error::Failure;
use crate::graph::{ProcessGraph, Scope, ScopeKind};
use crate::model::SubProcessType;

pub fn analyze_graph(graph: &ProcessGraph, options: &AnalysisOptions) -> Vec<Failure> {
    graph
        .scopes()
        .iter()
        .flat_map(|scope| analyze_scope(scope, options))
        .collect()
}

/// Dead nodes, disconnected components, infinite loops, lack of sync,
/// sync deadlocks, then the scope rollup.
pub fn analyze_scope(scope: &Scope, options: &AnalysisOptions) -> Vec<Failure> {
    // Ad-hoc bodies have no sequence to analyse.
    if scope.kind == ScopeKind::SubProcess(SubProcessType::AdHoc) {
        return Vec::new();
    }

    let reached = reachability::reachable_from_starts(scope);
    let mut failures = reachability::dead_nodes(scope, &reached);
    failures.extend(reachability::disconnected_components(scope));
    failures.extend(loops::infinite_loops(scope));

    let walker = blocks::BlockWalker::new(scope);
    let lack = sync::lack_of_sync(&walker);
    let deadlocks = sync::sync_deadlocks(&walker, &lack);
    failures.extend(lack);
    failures.extend(deadlocks);

    if options.report_process_not_sound {
        if let Some(reason) = not_sound_reason(scope, &reached) {
            failures.push(Failure::ProcessNotSound {
                scope: scope.name.clone(),
                reason: reason.to_string(),
            });
        }
    }

    debug!(scope = %scope.name, failures = failures.len(), "scope analysed");
    failures
}

fn not_sound_reason(scope: &Scope, reached: &HashSet<NodeIndex>) -> Option<&'static str> {
    let has_flow_nodes = scope.nodes().any(|(_, node)| node.is_analyzed());
    let starts = scope.start_events();

    if starts.is_empty() {
        return has_flow_nodes.then_some("scope has no start event");
    }
    let end_reached = scope.end_events().iter().any(|end| reached.contains(end));
    (!end_reached).then_some("no end event is reachable from any start event")
}
