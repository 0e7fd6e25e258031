//! Graph builder: declarative model → scoped `ProcessGraph`.
//!
//! Building never stops at the first problem. Duplicate ids, dangling
//! references and malformed branch sets are recorded and the partial graph
//! is still returned so later phases can report more.

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;
use tracing::{debug, info};

use super::flow::FlowExpander;
use super::{
    ActivityNode, BoundaryNode, EventNode, Node, NodeKind, ProcessGraph, Scope, ScopeId, ScopeKind,
    ScopeParent,
};
use crate::error::Failure;
use crate::model::{
    BoundaryEvent, EventDirection, FlowElement, GatewayDirection, Lane, Process, ProcessBody,
    SubProcess,
};

/// Graph plus everything that went wrong while building it.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub graph: ProcessGraph,
    pub failures: Vec<Failure>,
}

impl BuildOutput {
    /// Strict view: the graph only if nothing was reported.
    pub fn into_result(self) -> Result<ProcessGraph, Vec<Failure>> {
        if self.failures.is_empty() {
            Ok(self.graph)
        } else {
            Err(self.failures)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    known_processes: HashSet<String>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes a call activity may name, besides the one being built.
    pub fn with_known_processes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_processes.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn build(&self, process: &Process) -> BuildOutput {
        let mut state = BuildState {
            known_processes: &self.known_processes,
            own_name: &process.name,
            scopes: Vec::new(),
            bodies: Vec::new(),
            failures: Vec::new(),
        };

        // 1. Register every scope's node table.
        state.register_scope(
            &process.body,
            String::new(),
            process.name.clone(),
            ScopeKind::Process,
            None,
        );

        // 2. Expand flows now that every scope is known.
        let declared = state.declaration_index();
        for id in 0..state.scopes.len() {
            let body = state.bodies[id];
            let mut expander =
                FlowExpander::new(&mut state.scopes[id], &declared, &mut state.failures);
            for flow in &body.flows {
                expander.expand(flow);
            }
            expander.finish();
        }

        // 3. Branch-set rules over the final edge lists.
        for scope in &state.scopes {
            check_default_branches(scope, &mut state.failures);
        }

        info!(
            process = %process.name,
            scopes = state.scopes.len(),
            failures = state.failures.len(),
            "process graph built"
        );

        BuildOutput {
            graph: ProcessGraph::new(process.name.clone(), state.scopes),
            failures: state.failures,
        }
    }
}

struct BuildState<'a> {
    known_processes: &'a HashSet<String>,
    own_name: &'a str,
    scopes: Vec<Scope>,
    bodies: Vec<&'a ProcessBody>,
    failures: Vec<Failure>,
}

impl<'a> BuildState<'a> {
    fn register_scope(
        &mut self,
        body: &'a ProcessBody,
        path: String,
        name: String,
        kind: ScopeKind,
        parent: Option<ScopeParent>,
    ) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope::new(id, path, name, kind, parent));
        self.bodies.push(body);

        let mut subprocesses = Vec::new();
        for lane in &body.lanes {
            self.register_lane(id, lane, &mut subprocesses);
        }
        for element in &body.elements {
            self.register_element(id, element, None, &mut subprocesses);
        }

        debug!(
            scope = %self.scopes[id].name,
            nodes = self.scopes[id].node_count(),
            "scope registered"
        );

        for (node, sub) in subprocesses {
            let child_path = self.scopes[id].qualified(node);
            let child = self.register_scope(
                &sub.body,
                child_path.clone(),
                child_path,
                ScopeKind::SubProcess(sub.sub_process_type),
                Some(ScopeParent { scope: id, node }),
            );
            self.scopes[id].children.push(child);
        }

        id
    }

    fn register_lane(
        &mut self,
        scope: ScopeId,
        lane: &'a Lane,
        subprocesses: &mut Vec<(NodeIndex, &'a SubProcess)>,
    ) {
        self.add_node(scope, &lane.name, NodeKind::Lane, None, None);
        for element in &lane.elements {
            self.register_element(scope, element, Some(lane.name.as_str()), subprocesses);
        }
        for nested in &lane.lanes {
            self.register_lane(scope, nested, subprocesses);
        }
    }

    fn register_element(
        &mut self,
        scope: ScopeId,
        element: &'a FlowElement,
        lane: Option<&str>,
        subprocesses: &mut Vec<(NodeIndex, &'a SubProcess)>,
    ) {
        let Some(host) = self.add_node(scope, element.id(), node_kind(element), lane, None) else {
            return;
        };

        match element {
            FlowElement::CallActivity(call) => {
                let known = call.called_element == self.own_name
                    || self.known_processes.contains(&call.called_element);
                if !known {
                    self.failures.push(Failure::CalledElementNotFound {
                        node: self.scopes[scope].qualified(host),
                        called_element: call.called_element.clone(),
                    });
                }
            }
            FlowElement::SubProcess(sub) => subprocesses.push((host, sub)),
            _ => {}
        }

        // Boundary events hang off their host by containment, never by edge.
        for boundary in element.boundary_events() {
            self.add_node(scope, &boundary.id, boundary_kind(boundary), lane, Some(host));
        }
    }

    fn add_node(
        &mut self,
        scope: ScopeId,
        id: &str,
        kind: NodeKind,
        lane: Option<&str>,
        attached_to: Option<NodeIndex>,
    ) -> Option<NodeIndex> {
        let target = &mut self.scopes[scope];
        if target.lookup(id).is_some() {
            self.failures.push(Failure::DuplicateIdentifier {
                id: id.to_string(),
                scope: target.name.clone(),
            });
            return None;
        }
        let node = Node {
            id: id.to_string(),
            qualified_id: qualify(&target.path, id),
            kind,
            lane: lane.map(str::to_string),
            attached_to,
            synthetic: false,
        };
        Some(target.register(node))
    }

    /// Local id → name of the first scope declaring it.
    fn declaration_index(&self) -> HashMap<String, String> {
        let mut index = HashMap::new();
        for scope in &self.scopes {
            for (_, node) in scope.nodes() {
                index
                    .entry(node.id.clone())
                    .or_insert_with(|| scope.name.clone());
            }
        }
        index
    }
}

pub(crate) fn qualify(path: &str, id: &str) -> String {
    if path.is_empty() {
        id.to_string()
    } else {
        format!("{path}/{id}")
    }
}

fn node_kind(element: &FlowElement) -> NodeKind {
    match element {
        FlowElement::StartEvent(e) => NodeKind::StartEvent(EventNode {
            direction: e.direction.unwrap_or(EventDirection::Catch),
            trigger: e.trigger.clone(),
        }),
        FlowElement::EndEvent(e) => NodeKind::EndEvent(EventNode {
            direction: e.direction.unwrap_or(EventDirection::Throw),
            trigger: e.trigger.clone(),
        }),
        FlowElement::IntermediateEvent(e) => NodeKind::IntermediateEvent(EventNode {
            direction: e.direction.unwrap_or(EventDirection::Catch),
            trigger: e.trigger.clone(),
        }),
        FlowElement::Task(t) => NodeKind::Task {
            task_type: t.task_type,
            activity: ActivityNode {
                loop_characteristic: t.loop_characteristic.clone(),
                stereotypes: t.stereotypes.clone(),
                for_compensation: t.for_compensation,
            },
            attributes: t.attributes.clone(),
        },
        FlowElement::SubProcess(s) => NodeKind::SubProcess {
            sub_process_type: s.sub_process_type,
            activity: ActivityNode {
                loop_characteristic: s.loop_characteristic.clone(),
                stereotypes: s.stereotypes.clone(),
                for_compensation: s.for_compensation,
            },
        },
        FlowElement::CallActivity(c) => NodeKind::CallActivity {
            called_element: c.called_element.clone(),
            activity: ActivityNode {
                loop_characteristic: c.loop_characteristic.clone(),
                stereotypes: c.stereotypes.clone(),
                for_compensation: false,
            },
        },
        FlowElement::Gateway(g) => match g.direction {
            GatewayDirection::Split => NodeKind::SplitGateway(g.kind),
            GatewayDirection::Merge => NodeKind::MergeGateway(g.kind),
        },
        FlowElement::DataObject(d) => NodeKind::DataObject(d.clone()),
        FlowElement::Notification(n) => NodeKind::Notification(n.clone()),
        FlowElement::Operation(o) => NodeKind::Operation(o.clone()),
    }
}

fn boundary_kind(boundary: &BoundaryEvent) -> NodeKind {
    NodeKind::BoundaryEvent(BoundaryNode {
        trigger: boundary.trigger.clone(),
        interrupting: boundary.interrupting,
    })
}

/// At most one default edge per branching node, and it must come last.
fn check_default_branches(scope: &Scope, failures: &mut Vec<Failure>) {
    for idx in scope.indices() {
        let outgoing = scope.outgoing(idx);
        let defaults: Vec<usize> = outgoing
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.flow.is_default())
            .map(|(i, _)| i)
            .collect();
        match defaults.as_slice() {
            [] => {}
            [only] => {
                if *only + 1 != outgoing.len() {
                    failures.push(Failure::DefaultBranchNotLast {
                        node: scope.qualified(idx),
                    });
                }
            }
            many => failures.push(Failure::MultipleDefaultBranches {
                node: scope.qualified(idx),
                count: many.len(),
            }),
        }
    }
}
