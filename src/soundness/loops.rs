//! Cycles without a way out.
//!
//! A nontrivial strongly connected component is an infinite loop unless some
//! edge leaves it through a choice: an edge out of a split gateway, a guarded
//! edge, or an interrupting boundary event on one of its members.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use super::reachability::attachments;
use crate::error::Failure;
use crate::graph::{NodeKind, Scope};

pub fn infinite_loops(scope: &Scope) -> Vec<Failure> {
    let attached = attachments(scope);

    let mut components: Vec<Vec<NodeIndex>> = tarjan_scc(scope.graph())
        .into_iter()
        .filter(|component| is_cycle(scope, component))
        .map(|mut component| {
            component.sort();
            component
        })
        .collect();
    components.sort_by_key(|component| component[0]);

    components
        .into_iter()
        .filter(|component| !has_exit(scope, component, &attached))
        .filter_map(|component| representative_cycle(scope, &component))
        .map(|cycle| Failure::InfiniteLoop {
            cycle: cycle.into_iter().map(|idx| scope.qualified(idx)).collect(),
        })
        .collect()
}

fn is_cycle(scope: &Scope, component: &[NodeIndex]) -> bool {
    match component {
        [] => false,
        [only] => scope.successors(*only).contains(only),
        _ => true,
    }
}

fn has_exit(
    scope: &Scope,
    component: &[NodeIndex],
    attached: &HashMap<NodeIndex, Vec<NodeIndex>>,
) -> bool {
    let members: HashSet<NodeIndex> = component.iter().copied().collect();

    component.iter().any(|&idx| {
        let from_split = scope.node(idx).kind.split_kind().is_some();
        let leaves = scope
            .outgoing(idx)
            .into_iter()
            .any(|edge| {
                !members.contains(&edge.target) && (from_split || edge.flow.is_guarded())
            });

        let interrupted = attached.get(&idx).is_some_and(|events| {
            events.iter().any(|&event| {
                matches!(&scope.node(event).kind, NodeKind::BoundaryEvent(b) if b.interrupting)
            })
        });

        leaves || interrupted
    })
}

/// Shortest cycle through the component's lowest node, closed by repeating it.
fn representative_cycle(scope: &Scope, component: &[NodeIndex]) -> Option<Vec<NodeIndex>> {
    let members: HashSet<NodeIndex> = component.iter().copied().collect();
    let root = *component.first()?;

    let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut queue = VecDeque::from([root]);

    while let Some(idx) = queue.pop_front() {
        for next in scope.successors(idx) {
            if !members.contains(&next) {
                continue;
            }
            if next == root {
                let mut path = vec![root];
                let mut cursor = idx;
                while cursor != root {
                    path.push(cursor);
                    cursor = *parent.get(&cursor)?;
                }
                path.push(root);
                // Collected back to front; the root sits at both ends.
                path.reverse();
                return Some(path);
            }
            if !parent.contains_key(&next) {
                parent.insert(next, idx);
                queue.push_back(next);
            }
        }
    }

    None
}

/// Loop structure of a scope, nested loops included.
///
/// Each round runs `tarjan_scc` over the edges not yet classified. In every
/// nontrivial component the nodes entered from outside are loop headers, and
/// the edges from inside the component back to a header are back edges.
/// Removing them exposes the next level of nesting.
#[derive(Debug, Default)]
pub struct LoopNest {
    back_edges: HashSet<(NodeIndex, NodeIndex)>,
    headers: HashSet<NodeIndex>,
    exits: HashSet<NodeIndex>,
}

impl LoopNest {
    pub fn of(scope: &Scope) -> Self {
        let mut nest = LoopNest::default();

        loop {
            let view: DiGraph<(), ()> = scope.graph().filter_map(
                |_, _| Some(()),
                |edge, _| {
                    let (source, target) = scope.graph().edge_endpoints(edge)?;
                    (!nest.back_edges.contains(&(source, target))).then_some(())
                },
            );
            let components: Vec<Vec<NodeIndex>> = tarjan_scc(&view)
                .into_iter()
                .filter(|component| match component.as_slice() {
                    [only] => view.find_edge(*only, *only).is_some(),
                    _ => true,
                })
                .collect();
            if components.is_empty() {
                break;
            }

            for component in components {
                let members: HashSet<NodeIndex> = component.iter().copied().collect();
                let entered_from_outside = |idx: NodeIndex| {
                    view.neighbors_directed(idx, Direction::Incoming)
                        .any(|pred| !members.contains(&pred))
                };
                let mut headers: Vec<NodeIndex> =
                    component.iter().copied().filter(|&idx| entered_from_outside(idx)).collect();
                if headers.is_empty() {
                    headers.extend(component.iter().copied().min());
                }

                for header in headers {
                    for pred in view.neighbors_directed(header, Direction::Incoming) {
                        if members.contains(&pred) {
                            nest.back_edges.insert((pred, header));
                        }
                    }
                    nest.headers.insert(header);
                }
                for &idx in &component {
                    if scope.successors(idx).iter().any(|next| !members.contains(next)) {
                        nest.exits.insert(idx);
                    }
                }
            }
        }

        nest
    }

    /// Whether `source → target` closes a loop.
    pub fn is_back_edge(&self, source: NodeIndex, target: NodeIndex) -> bool {
        self.back_edges.contains(&(source, target))
    }

    /// First node of a loop body, reached from outside the loop.
    pub fn is_header(&self, idx: NodeIndex) -> bool {
        self.headers.contains(&idx)
    }

    /// Loop member with an edge leaving its loop.
    pub fn is_exit(&self, idx: NodeIndex) -> bool {
        self.exits.contains(&idx)
    }
}
