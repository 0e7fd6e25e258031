//! Shape rules per node kind: event gateways, subprocess flavours,
//! compensation, loop cardinality and cancel events.

use petgraph::graph::NodeIndex;

use crate::error::Failure;
use crate::graph::{ActivityNode, BoundaryNode, EventNode, NodeKind, ProcessGraph, Scope, ScopeKind};
use crate::model::{EventDirection, EventTrigger, SubProcessType, TaskType};

/// Validate a single node's shape. Returns all failures found.
pub fn check_node(graph: &ProcessGraph, scope: &Scope, idx: NodeIndex) -> Vec<Failure> {
    let mut failures = Vec::new();
    let node = scope.node(idx);

    match &node.kind {
        NodeKind::SplitGateway(kind) if kind.is_event_based() => {
            event_gateway_targets(scope, idx, &mut failures);
        }
        NodeKind::MergeGateway(kind) if kind.is_event_based() => {
            failures.push(Failure::EventGatewayIsNotSplit {
                node: scope.qualified(idx),
            });
        }
        NodeKind::SubProcess {
            sub_process_type: SubProcessType::AdHoc,
            ..
        } => {
            if let Some(body) = graph.body_of(scope.id, idx) {
                ad_hoc_body(scope, idx, body, &mut failures);
            }
        }
        NodeKind::SubProcess {
            sub_process_type: SubProcessType::Event,
            ..
        } => {
            if scope.in_degree(idx) + scope.out_degree(idx) > 0 {
                failures.push(Failure::EventSubProcessHasFlow {
                    node: scope.qualified(idx),
                });
            }
            let count = graph
                .body_of(scope.id, idx)
                .map_or(0, |body| body.start_events().len());
            if count != 1 {
                failures.push(Failure::EventSubProcessStartEventCount {
                    node: scope.qualified(idx),
                    count,
                });
            }
        }
        NodeKind::EndEvent(EventNode {
            trigger: EventTrigger::Cancel,
            ..
        }) if scope.kind != ScopeKind::SubProcess(SubProcessType::Transaction) => {
            failures.push(Failure::CancelEventOutsideTransaction {
                node: scope.qualified(idx),
            });
        }
        NodeKind::BoundaryEvent(boundary) => {
            boundary_trigger(scope, idx, boundary, &mut failures);
        }
        _ => {}
    }

    if let Some(activity) = node.kind.activity() {
        activity_rules(scope, idx, activity, &mut failures);
    }

    failures
}

fn event_gateway_targets(scope: &Scope, idx: NodeIndex, failures: &mut Vec<Failure>) {
    let mut events = false;
    let mut receive_tasks = false;

    for target in scope.successors(idx) {
        match &scope.node(target).kind {
            NodeKind::IntermediateEvent(EventNode {
                direction: EventDirection::Catch,
                trigger:
                    EventTrigger::Message { .. }
                    | EventTrigger::Timer { .. }
                    | EventTrigger::Signal { .. }
                    | EventTrigger::Conditional { .. },
            }) => events = true,
            NodeKind::Task {
                task_type: TaskType::Receive,
                ..
            } => receive_tasks = true,
            _ => failures.push(Failure::EventGatewayInvalidTarget {
                node: scope.qualified(idx),
                target: scope.qualified(target),
            }),
        }
    }

    if events && receive_tasks {
        failures.push(Failure::EventGatewayMixedTargetTypes {
            node: scope.qualified(idx),
        });
    }
}

fn ad_hoc_body(scope: &Scope, idx: NodeIndex, body: &Scope, failures: &mut Vec<Failure>) {
    if !body.nodes().any(|(_, node)| node.kind.is_activity()) {
        failures.push(Failure::AdHocSubProcessEmpty {
            node: scope.qualified(idx),
        });
    }
    for (event, node) in body.nodes() {
        if node.kind.is_start() || node.kind.is_end() {
            failures.push(Failure::AdHocSubProcessHasStartOrEndEvent {
                node: scope.qualified(idx),
                event: body.qualified(event),
            });
        }
    }
}

fn boundary_trigger(
    scope: &Scope,
    idx: NodeIndex,
    boundary: &BoundaryNode,
    failures: &mut Vec<Failure>,
) {
    match boundary.trigger {
        EventTrigger::None | EventTrigger::Link { .. } | EventTrigger::Terminate => {
            failures.push(Failure::BoundaryEventInvalidTrigger {
                node: scope.qualified(idx),
                trigger: boundary.trigger.name().to_string(),
            });
        }
        EventTrigger::Cancel => {
            let on_transaction = scope.node(idx).attached_to.is_some_and(|host| {
                matches!(
                    scope.node(host).kind,
                    NodeKind::SubProcess {
                        sub_process_type: SubProcessType::Transaction,
                        ..
                    }
                )
            });
            if !on_transaction {
                failures.push(Failure::CancelEventOutsideTransaction {
                    node: scope.qualified(idx),
                });
            }
        }
        _ => {}
    }
}

fn activity_rules(
    scope: &Scope,
    idx: NodeIndex,
    activity: &ActivityNode,
    failures: &mut Vec<Failure>,
) {
    if activity.for_compensation && scope.in_degree(idx) + scope.out_degree(idx) > 0 {
        failures.push(Failure::CompensationActivityHasFlow {
            node: scope.qualified(idx),
        });
    }
    if let Some(expression) = activity.loop_count() {
        if !looks_like_integer(expression) {
            failures.push(Failure::LoopCountNotInteger {
                node: scope.qualified(idx),
                expression: expression.to_string(),
            });
        }
    }
}

/// Syntactic check only: literals must be non-negative integers, anything
/// else that is not an obvious non-integer literal is left to runtime.
pub fn looks_like_integer(expression: &str) -> bool {
    let expr = expression.trim();
    if expr.is_empty() || matches!(expr, "true" | "false" | "null") {
        return false;
    }
    if expr.starts_with('"') || expr.starts_with('\'') || expr.starts_with('-') {
        return false;
    }
    if expr.starts_with(|c: char| c.is_ascii_digit()) {
        return expr.chars().all(|c| c.is_ascii_digit());
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_literals() {
        assert!(looks_like_integer("3"));
        assert!(looks_like_integer(" 12 "));
        assert!(looks_like_integer("reviewers.size()"));
        assert!(looks_like_integer("n"));
    }

    #[test]
    fn non_integer_literals() {
        assert!(!looks_like_integer(""));
        assert!(!looks_like_integer("2.5"));
        assert!(!looks_like_integer("-1"));
        assert!(!looks_like_integer("\"three\""));
        assert!(!looks_like_integer("true"));
        assert!(!looks_like_integer("3x"));
    }
}
