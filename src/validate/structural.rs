//! Degree rules for events and gateways.

use petgraph::graph::NodeIndex;

use crate::error::Failure;
use crate::graph::{EventNode, NodeKind, Scope};
use crate::model::EventDirection;

/// Run every degree rule for one node.
pub fn check_node(scope: &Scope, idx: NodeIndex, failures: &mut Vec<Failure>) {
    match &scope.node(idx).kind {
        NodeKind::StartEvent(event) => start_event(scope, idx, event, failures),
        NodeKind::EndEvent(event) => end_event(scope, idx, event, failures),
        NodeKind::BoundaryEvent(_) => boundary_event(scope, idx, failures),
        NodeKind::SplitGateway(_) => split_gateway(scope, idx, failures),
        NodeKind::MergeGateway(_) => merge_gateway(scope, idx, failures),
        _ => {}
    }
}

/// A scope that can start must also be able to finish.
pub fn check_scope(scope: &Scope, failures: &mut Vec<Failure>) {
    if !scope.start_events().is_empty() && scope.end_events().is_empty() {
        failures.push(Failure::NoEndEventWithStartEvent {
            scope: scope.name.clone(),
        });
    }
}

fn start_event(scope: &Scope, idx: NodeIndex, event: &EventNode, failures: &mut Vec<Failure>) {
    let incoming = scope.in_degree(idx);
    if incoming > 0 {
        failures.push(Failure::StartEventHasIncomingFlow {
            node: scope.qualified(idx),
            count: incoming,
        });
    }
    if event.direction == EventDirection::Throw {
        failures.push(Failure::StartEventIsThrowing {
            node: scope.qualified(idx),
        });
    }
}

fn end_event(scope: &Scope, idx: NodeIndex, event: &EventNode, failures: &mut Vec<Failure>) {
    let outgoing = scope.out_degree(idx);
    if outgoing > 0 {
        failures.push(Failure::EndEventHasOutgoingFlow {
            node: scope.qualified(idx),
            count: outgoing,
        });
    }
    if event.direction == EventDirection::Catch {
        failures.push(Failure::EndEventIsCatching {
            node: scope.qualified(idx),
        });
    }
}

fn boundary_event(scope: &Scope, idx: NodeIndex, failures: &mut Vec<Failure>) {
    let incoming = scope.in_degree(idx);
    if incoming > 0 {
        failures.push(Failure::BoundaryEventHasIncomingFlow {
            node: scope.qualified(idx),
            count: incoming,
        });
    }
}

fn split_gateway(scope: &Scope, idx: NodeIndex, failures: &mut Vec<Failure>) {
    let incoming = scope.in_degree(idx);
    let outgoing = scope.out_degree(idx);
    if incoming > 1 || outgoing < 2 {
        failures.push(Failure::SplitGatewayTooFewOutgoingFlows {
            node: scope.qualified(idx),
            incoming,
            outgoing,
        });
    }
}

fn merge_gateway(scope: &Scope, idx: NodeIndex, failures: &mut Vec<Failure>) {
    let incoming = scope.in_degree(idx);
    let outgoing = scope.out_degree(idx);
    if incoming < 2 || outgoing > 1 {
        failures.push(Failure::MergeGatewayTooFewIncomingFlows {
            node: scope.qualified(idx),
            incoming,
            outgoing,
        });
    }
}
