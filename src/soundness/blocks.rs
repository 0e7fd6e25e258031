//! Block-structure walks shared by the sync checks and conformance.
//!
//! Both walks count gateway nesting: a split opens a block and a merge closes
//! one. Forward walks look for the merge that closes the block a branch
//! starts in; backward walks look for the split that produced a branch.
//! Loops are not blocks. Back edges are never followed, and loop headers and
//! loop exits are passed through without changing the nesting depth.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::NodeIndex;

use super::loops::LoopNest;
use crate::graph::{FlowRef, NodeKind, Scope};

/// Where the token on a branch comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Always produced: a parallel split or a start event.
    Unconditional(NodeIndex),
    /// Produced only on some runs: an exclusive or inclusive choice, or a guarded edge.
    Conditional(NodeIndex),
}

impl Origin {
    pub fn node(self) -> NodeIndex {
        match self {
            Origin::Unconditional(idx) | Origin::Conditional(idx) => idx,
        }
    }
}

pub struct BlockWalker<'a> {
    scope: &'a Scope,
    loops: LoopNest,
}

impl<'a> BlockWalker<'a> {
    pub fn new(scope: &'a Scope) -> Self {
        BlockWalker {
            scope,
            loops: LoopNest::of(scope),
        }
    }

    pub fn scope(&self) -> &'a Scope {
        self.scope
    }

    fn forward(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut targets = Vec::new();
        for edge in self.scope.outgoing(idx) {
            if !self.loops.is_back_edge(idx, edge.target) && !targets.contains(&edge.target) {
                targets.push(edge.target);
            }
        }
        targets
    }

    fn backward(&self, idx: NodeIndex) -> Vec<FlowRef<'a>> {
        self.scope
            .incoming(idx)
            .into_iter()
            .filter(|edge| !self.loops.is_back_edge(edge.source, idx))
            .collect()
    }

    /// A loop header joins the loop's way in with its back edges only.
    fn enters_loop(&self, idx: NodeIndex) -> bool {
        self.loops.is_header(idx) && self.backward(idx).len() <= 1
    }

    /// Merges that close the block `from` sits in, with their distance from `from`.
    pub fn closure_candidates(&self, from: NodeIndex) -> HashMap<NodeIndex, usize> {
        let cap = self.scope.node_count();
        let mut candidates = HashMap::new();
        let mut visited = HashSet::from([(from, 0)]);
        let mut queue = VecDeque::from([(from, 0usize, 0usize)]);

        while let Some((idx, depth, distance)) = queue.pop_front() {
            let next_depth = match &self.scope.node(idx).kind {
                NodeKind::MergeGateway(_) if self.enters_loop(idx) => depth,
                NodeKind::MergeGateway(_) if depth == 0 => {
                    candidates.entry(idx).or_insert(distance);
                    continue;
                }
                NodeKind::MergeGateway(_) => depth - 1,
                NodeKind::SplitGateway(_) if self.loops.is_exit(idx) => depth,
                NodeKind::SplitGateway(_) => depth + 1,
                _ => depth,
            };
            if next_depth > cap {
                continue;
            }
            for next in self.forward(idx) {
                if visited.insert((next, next_depth)) {
                    queue.push_back((next, next_depth, distance + 1));
                }
            }
        }

        candidates
    }

    /// The merge every branch reaches first. Ties go to the earlier declared node.
    pub fn nearest_common_merge(&self, branches: &[NodeIndex]) -> Option<NodeIndex> {
        let (first, rest) = branches.split_first()?;
        let walks: Vec<_> = rest.iter().map(|&b| self.closure_candidates(b)).collect();

        self.closure_candidates(*first)
            .into_iter()
            .filter_map(|(merge, distance)| {
                let mut furthest = distance;
                for walk in &walks {
                    furthest = furthest.max(*walk.get(&merge)?);
                }
                Some((furthest, merge))
            })
            .min()
            .map(|(_, merge)| merge)
    }

    /// Trace an edge back to the gateway or start event that produced its token.
    pub fn branch_origin(&self, edge: FlowRef<'_>) -> Option<Origin> {
        let cap = self.scope.node_count();
        let mut visited = HashSet::new();
        let mut stack = vec![(edge.source, edge.flow.is_guarded(), 0usize)];

        while let Some((idx, guarded, depth)) = stack.pop() {
            let leaves_loop = self.loops.is_exit(idx);
            if guarded && depth == 0 && !leaves_loop {
                return Some(Origin::Conditional(idx));
            }
            if depth > cap || !visited.insert((idx, depth)) {
                continue;
            }
            let next_depth = match &self.scope.node(idx).kind {
                NodeKind::SplitGateway(_) if leaves_loop => depth,
                NodeKind::SplitGateway(kind) if depth == 0 => {
                    return Some(if kind.is_parallel() {
                        Origin::Unconditional(idx)
                    } else {
                        Origin::Conditional(idx)
                    });
                }
                NodeKind::SplitGateway(_) => depth - 1,
                NodeKind::MergeGateway(_) if self.enters_loop(idx) => depth,
                NodeKind::MergeGateway(_) => depth + 1,
                NodeKind::StartEvent(_) => return Some(Origin::Unconditional(idx)),
                NodeKind::BoundaryEvent(_) if depth == 0 => {
                    return Some(Origin::Conditional(idx));
                }
                _ => depth,
            };
            // Reversed so the first declared incoming edge is explored first.
            for incoming in self.backward(idx).into_iter().rev() {
                stack.push((incoming.source, incoming.flow.is_guarded(), next_depth));
            }
        }

        None
    }
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

    fn nested() -> ProcessGraph {
        // PS -> A -> XS -> {B, C} -> XM -> PM ; PS -> D -> PM
        let mut p = Process::new("P");
        p.body.elements = vec![
            FlowElement::StartEvent(Event::new("S")),
            gateway("PS", GatewayKind::And, GatewayDirection::Split),
            FlowElement::Task(Task::new("A")),
            gateway("XS", GatewayKind::Xor, GatewayDirection::Split),
            FlowElement::Task(Task::new("B")),
            FlowElement::Task(Task::new("C")),
            gateway("XM", GatewayKind::Xor, GatewayDirection::Merge),
            FlowElement::Task(Task::new("D")),
            gateway("PM", GatewayKind::And, GatewayDirection::Merge),
            FlowElement::EndEvent(Event::new("E")),
        ];
        p.body.flows = vec![
            SequenceFlow::chain(["S", "PS", "A", "XS", "B", "XM", "PM", "E"]),
            SequenceFlow::chain(["XS", "C", "XM"]),
            SequenceFlow::chain(["PS", "D", "PM"]),
        ];
        GraphBuilder::new().build(&p).into_result().unwrap()
    }

    #[test]
    fn nested_block_is_skipped_by_closure_walk() {
        let graph = nested();
        let root = graph.root();
        let a = root.lookup("A").unwrap();
        let d = root.lookup("D").unwrap();
        assert_eq!(BlockWalker::new(root).nearest_common_merge(&[a, d]), root.lookup("PM"));
    }

    #[test]
    fn inner_branches_close_at_inner_merge() {
        let graph = nested();
        let root = graph.root();
        let b = root.lookup("B").unwrap();
        let c = root.lookup("C").unwrap();
        assert_eq!(BlockWalker::new(root).nearest_common_merge(&[b, c]), root.lookup("XM"));
    }

    #[test]
    fn origin_skips_nested_exclusive_block() {
        let graph = nested();
        let root = graph.root();
        let pm = root.lookup("PM").unwrap();
        let ps = root.lookup("PS").unwrap();
        let walker = BlockWalker::new(root);
        for edge in root.incoming(pm) {
            assert_eq!(walker.branch_origin(edge), Some(Origin::Unconditional(ps)));
        }
    }
}
