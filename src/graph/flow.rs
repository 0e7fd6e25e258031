//! Sequence-flow path expansion.
//!
//! `A -> B -> { [c1] C; [_] D }` becomes `A→B`, `B→C [c1]`, `B→D [default]`.
//! Inline gateways become synthetic nodes so they are analysed like named ones.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::NodeIndex;

use super::builder::qualify;
use super::{Flow, Node, NodeKind, Scope};
use crate::error::Failure;
use crate::model::{FlowCondition, FlowStep, GatewayKind, SequenceFlow};

/// Open edge ends waiting for the next node, with the guard for that edge.
type Pending = Vec<(NodeIndex, Option<FlowCondition>)>;

pub(super) struct FlowExpander<'a> {
    scope: &'a mut Scope,
    declared: &'a HashMap<String, String>,
    failures: &'a mut Vec<Failure>,
    next_gateway: usize,
    /// Flows refused because they target a boundary event, per event.
    refused: BTreeMap<NodeIndex, usize>,
}

impl<'a> FlowExpander<'a> {
    pub(super) fn new(
        scope: &'a mut Scope,
        declared: &'a HashMap<String, String>,
        failures: &'a mut Vec<Failure>,
    ) -> Self {
        FlowExpander {
            scope,
            declared,
            failures,
            next_gateway: 1,
            refused: BTreeMap::new(),
        }
    }

    pub(super) fn expand(&mut self, flow: &SequenceFlow) {
        self.expand_steps(&flow.path, Vec::new());
    }

    /// Report the boundary events that flows tried to enter.
    pub(super) fn finish(self) {
        for (event, count) in self.refused {
            self.failures.push(Failure::BoundaryEventHasIncomingFlow {
                node: self.scope.qualified(event),
                count,
            });
        }
    }

    fn expand_steps(&mut self, steps: &[FlowStep], mut pending: Pending) -> Pending {
        let mut broken = false;

        for (i, step) in steps.iter().enumerate() {
            match step {
                FlowStep::Ref { element_ref } => match self.resolve(element_ref) {
                    Some(target) => {
                        self.connect(&pending, target);
                        pending = vec![(target, None)];
                        broken = false;
                    }
                    None => {
                        broken = true;
                        pending = Vec::new();
                    }
                },
                FlowStep::Gateway { kind } => {
                    let splits = matches!(steps.get(i + 1), Some(FlowStep::Block { .. }));
                    let gateway = self.synthesize_gateway(*kind, splits);
                    self.connect(&pending, gateway);
                    pending = vec![(gateway, None)];
                    broken = false;
                }
                FlowStep::Block { branches } => {
                    let branch_point = match pending.as_slice() {
                        [(node, None)] => Some(*node),
                        _ => None,
                    };
                    if branch_point.is_none() && !(broken && pending.is_empty()) {
                        self.failures.push(Failure::FlowBlockWithoutBranchPoint {
                            scope: self.scope.name.clone(),
                        });
                    }

                    let mut exits = Vec::new();
                    for branch in branches {
                        let entry = match branch_point {
                            Some(bp) => vec![(bp, branch.condition.clone())],
                            None => Vec::new(),
                        };
                        exits.extend(self.expand_steps(&branch.steps, entry));
                    }
                    pending = exits;
                    broken = false;
                }
            }
        }

        pending
    }

    fn resolve(&mut self, element_ref: &str) -> Option<NodeIndex> {
        if let Some(idx) = self.scope.lookup(element_ref) {
            return Some(idx);
        }
        let failure = match self.declared.get(element_ref) {
            Some(other) => Failure::FlowCrossesScopeBoundary {
                element_ref: element_ref.to_string(),
                scope: self.scope.name.clone(),
                target_scope: other.clone(),
            },
            None => Failure::UnresolvedNodeReference {
                element_ref: element_ref.to_string(),
                scope: self.scope.name.clone(),
            },
        };
        self.failures.push(failure);
        None
    }

    fn connect(&mut self, pending: &Pending, target: NodeIndex) {
        if matches!(self.scope.node(target).kind, NodeKind::BoundaryEvent(_)) {
            if !pending.is_empty() {
                *self.refused.entry(target).or_default() += pending.len();
            }
            return;
        }
        for (source, condition) in pending {
            self.scope.graph_mut().add_edge(
                *source,
                target,
                Flow {
                    condition: condition.clone(),
                },
            );
        }
    }

    fn synthesize_gateway(&mut self, kind: GatewayKind, splits: bool) -> NodeIndex {
        let id = loop {
            let candidate = format!("gateway#{}", self.next_gateway);
            self.next_gateway += 1;
            if self.scope.lookup(&candidate).is_none() {
                break candidate;
            }
        };
        let kind = if splits {
            NodeKind::SplitGateway(kind)
        } else {
            NodeKind::MergeGateway(kind)
        };
        self.scope.register(Node {
            qualified_id: qualify(&self.scope.path, &id),
            id,
            kind,
            lane: None,
            attached_to: None,
            synthetic: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::GraphBuilder;
    use crate::model::*;

    fn elements(ids: &[&str]) -> Vec<FlowElement> {
        ids.iter().map(|id| FlowElement::Task(Task::new(*id))).collect()
    }

    fn build(ids: &[&str], flows: Vec<SequenceFlow>) -> crate::graph::BuildOutput {
        let mut p = Process::new("P");
        p.body.elements = elements(ids);
        p.body.flows = flows;
        GraphBuilder::new().build(&p)
    }

    #[test]
    fn block_expands_to_guarded_edges() {
        let out = build(
            &["A", "B", "C", "D"],
            vec![SequenceFlow::path(vec![
                FlowStep::to("A"),
                FlowStep::to("B"),
                FlowStep::block(vec![
                    Branch::when("c1", vec![FlowStep::to("C")]),
                    Branch::otherwise(vec![FlowStep::to("D")]),
                ]),
            ])],
        );
        assert!(out.failures.is_empty(), "{:?}", out.failures);
        let root = out.graph.root();
        let b = root.lookup("B").unwrap();
        let edges = root.outgoing(b);
        assert_eq!(edges.len(), 2);
        assert_eq!(root.node(edges[0].target).id, "C");
        assert_eq!(
            edges[0].flow.condition,
            Some(FlowCondition::Expression {
                expression: "c1".into()
            })
        );
        assert!(edges[1].flow.is_default());
        assert_eq!(root.in_degree(root.lookup("A").unwrap()), 0);
    }

    #[test]
    fn inline_gateway_is_synthesized() {
        let out = build(
            &["A", "X", "Y", "E"],
            vec![SequenceFlow::path(vec![
                FlowStep::to("A"),
                FlowStep::Gateway {
                    kind: GatewayKind::And,
                },
                FlowStep::block(vec![
                    Branch::plain(vec![FlowStep::to("X")]),
                    Branch::plain(vec![FlowStep::to("Y")]),
                ]),
                FlowStep::Gateway {
                    kind: GatewayKind::And,
                },
                FlowStep::to("E"),
            ])],
        );
        assert!(out.failures.is_empty(), "{:?}", out.failures);
        let root = out.graph.root();
        let split = root.node_by_id("gateway#1").unwrap();
        let merge = root.node_by_id("gateway#2").unwrap();
        assert!(split.synthetic);
        assert_eq!(split.kind.split_kind(), Some(GatewayKind::And));
        assert_eq!(merge.kind.merge_kind(), Some(GatewayKind::And));
        assert_eq!(root.in_degree(root.lookup("gateway#2").unwrap()), 2);
    }

    #[test]
    fn unresolved_reference_breaks_chain() {
        let out = build(&["A", "C"], vec![SequenceFlow::chain(["A", "B", "C"])]);
        assert_eq!(
            out.failures,
            vec![crate::error::Failure::UnresolvedNodeReference {
                element_ref: "B".into(),
                scope: "P".into()
            }]
        );
        let root = out.graph.root();
        assert_eq!(root.graph().edge_count(), 0);
    }

    #[test]
    fn block_at_path_start_has_no_branch_point() {
        let out = build(
            &["A"],
            vec![SequenceFlow::path(vec![FlowStep::block(vec![Branch::plain(
                vec![FlowStep::to("A")],
            )])])],
        );
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].kind(), "FlowBlockWithoutBranchPoint");
    }

    #[test]
    fn multiple_defaults_reported_once() {
        let out = build(
            &["A", "B", "C", "D"],
            vec![SequenceFlow::path(vec![
                FlowStep::to("A"),
                FlowStep::block(vec![
                    Branch::otherwise(vec![FlowStep::to("B")]),
                    Branch::otherwise(vec![FlowStep::to("C")]),
                    Branch::when("x", vec![FlowStep::to("D")]),
                ]),
            ])],
        );
        let kinds: Vec<_> = out.failures.iter().map(|f| f.kind()).collect();
        assert_eq!(kinds, vec!["MultipleDefaultBranches"]);
    }

    #[test]
    fn default_not_last() {
        let out = build(
            &["A", "B", "C"],
            vec![SequenceFlow::path(vec![
                FlowStep::to("A"),
                FlowStep::block(vec![
                    Branch::otherwise(vec![FlowStep::to("B")]),
                    Branch::when("x", vec![FlowStep::to("C")]),
                ]),
            ])],
        );
        let kinds: Vec<_> = out.failures.iter().map(|f| f.kind()).collect();
        assert_eq!(kinds, vec!["DefaultBranchNotLast"]);
    }

    #[test]
    fn block_after_block_is_reported_after_a_broken_reference() {
        let out = build(
            &["A", "C", "D", "F"],
            vec![SequenceFlow::path(vec![
                FlowStep::to("A"),
                FlowStep::to("Missing"),
                FlowStep::block(vec![
                    Branch::plain(vec![FlowStep::to("C")]),
                    Branch::plain(vec![FlowStep::to("D")]),
                ]),
                FlowStep::block(vec![Branch::plain(vec![FlowStep::to("F")])]),
            ])],
        );
        let kinds: Vec<_> = out.failures.iter().map(|f| f.kind()).collect();
        assert_eq!(kinds, vec!["UnresolvedNodeReference", "FlowBlockWithoutBranchPoint"]);
    }

    #[test]
    fn flows_into_boundary_events_are_refused() {
        let mut t = Task::new("T");
        t.boundary_events.push(BoundaryEvent {
            id: "Late".into(),
            trigger: EventTrigger::Timer {
                expression: "PT1H".into(),
            },
            interrupting: true,
        });
        let mut p = Process::new("P");
        p.body.elements = vec![FlowElement::Task(t), FlowElement::Task(Task::new("A"))];
        p.body.flows = vec![SequenceFlow::chain(["A", "Late"]), SequenceFlow::chain(["T", "Late"])];
        let out = GraphBuilder::new().build(&p);

        assert_eq!(
            out.failures,
            vec![crate::error::Failure::BoundaryEventHasIncomingFlow {
                node: "Late".into(),
                count: 2
            }]
        );
        let root = out.graph.root();
        assert_eq!(root.in_degree(root.lookup("Late").unwrap()), 0);
    }
}
