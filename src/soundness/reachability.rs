//! Dead nodes and disconnected components.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::NodeIndex;
use petgraph::unionfind::UnionFind;

use crate::error::Failure;
use crate::graph::Scope;

/// Host → attached boundary events. Attachment acts as a virtual edge.
pub fn attachments(scope: &Scope) -> HashMap<NodeIndex, Vec<NodeIndex>> {
    let mut map: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
    for (idx, node) in scope.nodes() {
        if let Some(host) = node.attached_to {
            map.entry(host).or_default().push(idx);
        }
    }
    map
}

/// Every node reachable from a start event over edges and attachments.
pub fn reachable_from_starts(scope: &Scope) -> HashSet<NodeIndex> {
    let attached = attachments(scope);
    let mut seen: HashSet<NodeIndex> = HashSet::new();
    let mut queue: VecDeque<NodeIndex> = VecDeque::new();

    for start in scope.start_events() {
        if seen.insert(start) {
            queue.push_back(start);
        }
    }

    while let Some(idx) = queue.pop_front() {
        let boundary = attached.get(&idx).into_iter().flatten().copied();
        for next in scope.successors(idx).into_iter().chain(boundary) {
            if seen.insert(next) {
                queue.push_back(next);
            }
        }
    }

    seen
}

pub fn dead_nodes(scope: &Scope, reached: &HashSet<NodeIndex>) -> Vec<Failure> {
    scope
        .nodes()
        .filter(|(idx, node)| node.is_analyzed() && !reached.contains(idx))
        .map(|(idx, _)| Failure::DeadNode {
            node: scope.qualified(idx),
        })
        .collect()
}

/// Weak components of two or more analysed nodes that contain no start event.
pub fn disconnected_components(scope: &Scope) -> Vec<Failure> {
    let analysed = |idx: NodeIndex| scope.node(idx).is_analyzed();
    let mut components = UnionFind::<usize>::new(scope.node_count());

    for edge in scope.graph().edge_indices() {
        if let Some((a, b)) = scope.graph().edge_endpoints(edge) {
            if analysed(a) && analysed(b) {
                components.union(a.index(), b.index());
            }
        }
    }
    for (idx, node) in scope.nodes() {
        if let Some(host) = node.attached_to {
            if analysed(idx) && analysed(host) {
                components.union(idx.index(), host.index());
            }
        }
    }

    let labels = components.into_labeling();
    // Grouped in order of each component's lowest index.
    let mut order: Vec<usize> = Vec::new();
    let mut members: HashMap<usize, Vec<NodeIndex>> = HashMap::new();
    for idx in scope.indices().filter(|&idx| analysed(idx)) {
        let label = labels[idx.index()];
        let group = members.entry(label).or_insert_with(|| {
            order.push(label);
            Vec::new()
        });
        group.push(idx);
    }

    order
        .into_iter()
        .filter_map(|label| members.remove(&label))
        .filter(|group| group.len() > 1)
        .filter(|group| !group.iter().any(|&idx| scope.node(idx).kind.is_start()))
        .map(|group| Failure::DisconnectedComponent {
            nodes: group.into_iter().map(|idx| scope.qualified(idx)).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use crate::model::*;

    fn scope_of(
        elements: Vec<FlowElement>,
        flows: Vec<SequenceFlow>,
    ) -> crate::graph::ProcessGraph {
        let mut p = Process::new("P");
        p.body.elements = elements;
        p.body.flows = flows;
        GraphBuilder::new().build(&p).graph
    }

    #[test]
    fn isolated_task_is_dead_but_not_a_component() {
        let graph = scope_of(
            vec![
                FlowElement::StartEvent(Event::new("S")),
                FlowElement::EndEvent(Event::new("E")),
                FlowElement::Task(Task::new("T")),
            ],
            vec![SequenceFlow::chain(["S", "E"])],
        );
        let root = graph.root();
        let reached = reachable_from_starts(root);
        assert_eq!(dead_nodes(root, &reached), vec![Failure::DeadNode { node: "T".into() }]);
        assert!(disconnected_components(root).is_empty());
    }

    #[test]
    fn island_without_start() {
        let graph = scope_of(
            vec![
                FlowElement::StartEvent(Event::new("S")),
                FlowElement::EndEvent(Event::new("E")),
                FlowElement::Task(Task::new("A")),
                FlowElement::Task(Task::new("B")),
            ],
            vec![SequenceFlow::chain(["S", "E"]), SequenceFlow::chain(["A", "B"])],
        );
        assert_eq!(
            disconnected_components(graph.root()),
            vec![Failure::DisconnectedComponent {
                nodes: vec!["A".into(), "B".into()]
            }]
        );
    }

    #[test]
    fn boundary_event_reached_through_host() {
        let mut task = Task::new("T");
        task.boundary_events.push(BoundaryEvent {
            id: "Late".into(),
            trigger: EventTrigger::Timer {
                expression: "PT1H".into(),
            },
            interrupting: true,
        });
        let graph = scope_of(
            vec![
                FlowElement::StartEvent(Event::new("S")),
                FlowElement::Task(task),
                FlowElement::EndEvent(Event::new("E")),
                FlowElement::EndEvent(Event::new("Escalated")),
            ],
            vec![
                SequenceFlow::chain(["S", "T", "E"]),
                SequenceFlow::chain(["Late", "Escalated"]),
            ],
        );
        let root = graph.root();
        let reached = reachable_from_starts(root);
        assert!(dead_nodes(root, &reached).is_empty());
        assert!(disconnected_components(root).is_empty());
    }
}
