//! Split/merge matching: lack of synchronisation and sync deadlocks.

use std::collections::HashSet;

use super::blocks::{BlockWalker, Origin};
use crate::error::Failure;
use crate::model::GatewayKind;

/// Parallel splits whose branches are joined by an exclusive merge.
pub fn lack_of_sync(walker: &BlockWalker<'_>) -> Vec<Failure> {
    let scope = walker.scope();
    let mut failures = Vec::new();

    for (idx, node) in scope.nodes() {
        if node.kind.split_kind() != Some(GatewayKind::And) {
            continue;
        }
        let branches = scope.successors(idx);
        if branches.len() < 2 {
            continue;
        }
        let Some(merge) = walker.nearest_common_merge(&branches) else {
            continue;
        };
        if scope.node(merge).kind.merge_kind() == Some(GatewayKind::Xor) {
            failures.push(Failure::LackOfSync {
                split: scope.qualified(idx),
                merge: scope.qualified(merge),
            });
        }
    }

    failures
}

/// Parallel merges waiting on a branch that is only produced conditionally.
/// Gateways already reported by `lack_of_sync` are left alone.
pub fn sync_deadlocks(walker: &BlockWalker<'_>, lack_of_sync: &[Failure]) -> Vec<Failure> {
    let scope = walker.scope();
    let involved: HashSet<&str> = lack_of_sync
        .iter()
        .flat_map(|failure| failure.node_ids())
        .collect();
    let mut failures = Vec::new();

    for (idx, node) in scope.nodes() {
        if node.kind.merge_kind() != Some(GatewayKind::And) {
            continue;
        }
        let merge = scope.qualified(idx);
        let conditional = scope
            .incoming(idx)
            .into_iter()
            .filter_map(|edge| walker.branch_origin(edge))
            .find_map(|origin| match origin {
                Origin::Conditional(split) => Some(split),
                Origin::Unconditional(_) => None,
            });

        if let Some(split) = conditional {
            let split = scope.qualified(split);
            if involved.contains(merge.as_str()) || involved.contains(split.as_str()) {
                continue;
            }
            failures.push(Failure::SyncDeadlock { merge, split });
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphBuilder, ProcessGraph};
    use crate::model::*;

    fn gateway(id: &str, kind: GatewayKind, direction: GatewayDirection) -> FlowElement {
        FlowElement::Gateway(Gateway {
            id: id.into(),
            kind,
            direction,
        })
    }

    fn diamond(split: GatewayKind, merge: GatewayKind) -> ProcessGraph {
        let mut p = Process::new("P");
        p.body.elements = vec![
            FlowElement::StartEvent(Event::new("S")),
            gateway("G1", split, GatewayDirection::Split),
            FlowElement::Task(Task::new("X")),
            FlowElement::Task(Task::new("Y")),
            gateway("G2", merge, GatewayDirection::Merge),
            FlowElement::EndEvent(Event::new("E")),
        ];
        p.body.flows = vec![
            SequenceFlow::chain(["S", "G1", "X", "G2", "E"]),
            SequenceFlow::chain(["G1", "Y", "G2"]),
        ];
        GraphBuilder::new().build(&p).into_result().unwrap()
    }

    #[test]
    fn parallel_split_exclusive_merge() {
        let graph = diamond(GatewayKind::And, GatewayKind::Xor);
        let walker = BlockWalker::new(graph.root());
        let lack = lack_of_sync(&walker);
        assert_eq!(
            lack,
            vec![Failure::LackOfSync {
                split: "G1".into(),
                merge: "G2".into()
            }]
        );
        assert!(sync_deadlocks(&walker, &lack).is_empty());
    }

    #[test]
    fn exclusive_split_parallel_merge() {
        let graph = diamond(GatewayKind::Xor, GatewayKind::And);
        let walker = BlockWalker::new(graph.root());
        let lack = lack_of_sync(&walker);
        assert!(lack.is_empty());
        assert_eq!(
            sync_deadlocks(&walker, &lack),
            vec![Failure::SyncDeadlock {
                merge: "G2".into(),
                split: "G1".into()
            }]
        );
    }

    #[test]
    fn matched_gateways_are_sound() {
        for kind in [GatewayKind::And, GatewayKind::Xor] {
            let graph = diamond(kind, kind);
            let walker = BlockWalker::new(graph.root());
            let lack = lack_of_sync(&walker);
            assert!(lack.is_empty());
            assert!(sync_deadlocks(&walker, &lack).is_empty());
        }
    }
}
