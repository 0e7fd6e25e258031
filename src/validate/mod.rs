//! Structural validation phase.
//!
//! Local context conditions over the resolved graph. Each rule reads one node
//! and its direct edges; nothing here walks paths.

pub mod node_rules;
pub mod structural;

use crate::error::Failure;
use crate::graph::{ProcessGraph, Scope};

/// Validate every scope of the graph, in scope preorder.
pub fn validate_graph(graph: &ProcessGraph) -> Vec<Failure> {
    graph
        .scopes()
        .iter()
        .flat_map(|scope| validate_scope(graph, scope))
        .collect()
}

/// Validate one scope: per-node rules in registration order, then scope rules.
pub fn validate_scope(graph: &ProcessGraph, scope: &Scope) -> Vec<Failure> {
    let mut failures = Vec::new();

    for idx in scope.indices() {
        structural::check_node(scope, idx, &mut failures);
        failures.extend(node_rules::check_node(graph, scope, idx));
    }
    structural::check_scope(scope, &mut failures);

    failures
}
