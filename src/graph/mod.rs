//! Resolved process graph: a tree of scopes, each owning a petgraph arena.
//!
//! Every process and subprocess body is its own `Scope` with an independent
//! `DiGraph`, so no edge can cross a subprocess boundary. Child scopes keep a
//! back-reference (scope id + owning node index) to their parent instead of
//! owning it.

pub mod builder;
mod flow;

use std::collections::{BTreeMap, HashMap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

pub use builder::{BuildOutput, GraphBuilder};

use crate::model::{
    Cardinality, DataObject, EventDirection, EventTrigger, FlowCondition, GatewayKind,
    LoopCharacteristic, Notification, Operation, Stereotype, SubProcessType, TaskType,
};

pub type ScopeId = usize;

// =============================================================================
// NODES AND FLOWS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventNode {
    pub direction: EventDirection,
    pub trigger: EventTrigger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryNode {
    pub trigger: EventTrigger,
    pub interrupting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityNode {
    pub loop_characteristic: Option<LoopCharacteristic>,
    pub stereotypes: Vec<Stereotype>,
    pub for_compensation: bool,
}

impl ActivityNode {
    /// Loop-count expression of a multi-instance activity, if any.
    pub fn loop_count(&self) -> Option<&str> {
        match &self.loop_characteristic {
            Some(LoopCharacteristic::MultiInstance {
                cardinality: Cardinality::Count(expr),
                ..
            }) => Some(expr.as_str()),
            _ => None,
        }
    }
}

/// Closed set of vertex kinds. Payload is carried over from the model unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    StartEvent(EventNode),
    EndEvent(EventNode),
    IntermediateEvent(EventNode),
    BoundaryEvent(BoundaryNode),
    Task {
        task_type: TaskType,
        activity: ActivityNode,
        attributes: BTreeMap<String, String>,
    },
    SubProcess {
        sub_process_type: SubProcessType,
        activity: ActivityNode,
    },
    CallActivity {
        called_element: String,
        activity: ActivityNode,
    },
    SplitGateway(GatewayKind),
    MergeGateway(GatewayKind),
    DataObject(DataObject),
    Notification(Notification),
    Operation(Operation),
    Lane,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::StartEvent(_) => "start event",
            NodeKind::EndEvent(_) => "end event",
            NodeKind::IntermediateEvent(_) => "intermediate event",
            NodeKind::BoundaryEvent(_) => "boundary event",
            NodeKind::Task { .. } => "task",
            NodeKind::SubProcess { .. } => "subprocess",
            NodeKind::CallActivity { .. } => "call activity",
            NodeKind::SplitGateway(_) => "split gateway",
            NodeKind::MergeGateway(_) => "merge gateway",
            NodeKind::DataObject(_) => "data object",
            NodeKind::Notification(_) => "notification",
            NodeKind::Operation(_) => "operation",
            NodeKind::Lane => "lane",
        }
    }

    pub fn activity(&self) -> Option<&ActivityNode> {
        match self {
            NodeKind::Task { activity, .. }
            | NodeKind::SubProcess { activity, .. }
            | NodeKind::CallActivity { activity, .. } => Some(activity),
            _ => None,
        }
    }

    pub fn is_activity(&self) -> bool {
        self.activity().is_some()
    }

    pub fn is_task(&self) -> bool {
        matches!(self, NodeKind::Task { .. })
    }

    pub fn is_start(&self) -> bool {
        matches!(self, NodeKind::StartEvent(_))
    }

    pub fn is_end(&self) -> bool {
        matches!(self, NodeKind::EndEvent(_))
    }

    pub fn split_kind(&self) -> Option<GatewayKind> {
        match self {
            NodeKind::SplitGateway(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn merge_kind(&self) -> Option<GatewayKind> {
        match self {
            NodeKind::MergeGateway(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Events, activities and gateways: everything that can carry a token.
    pub fn is_flow_node(&self) -> bool {
        !matches!(
            self,
            NodeKind::DataObject(_)
                | NodeKind::Notification(_)
                | NodeKind::Operation(_)
                | NodeKind::Lane
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Identifier as declared, unique within its scope.
    pub id: String,
    /// `parent/child/id`; root-scope nodes are unprefixed.
    pub qualified_id: String,
    pub kind: NodeKind,
    pub lane: Option<String>,
    /// Host activity of a boundary event.
    pub attached_to: Option<NodeIndex>,
    /// Inline gateways get generated ids.
    pub synthetic: bool,
}

impl Node {
    /// Nodes that never take part in sequence-flow soundness.
    pub fn is_analyzed(&self) -> bool {
        if !self.kind.is_flow_node() {
            return false;
        }
        if let Some(activity) = self.kind.activity() {
            if activity.for_compensation {
                return false;
            }
        }
        !matches!(
            self.kind,
            NodeKind::SubProcess {
                sub_process_type: SubProcessType::Event,
                ..
            }
        )
    }
}

/// Edge weight. Edge indices follow declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Flow {
    pub condition: Option<FlowCondition>,
}

impl Flow {
    pub fn is_guarded(&self) -> bool {
        self.condition.is_some()
    }

    pub fn is_default(&self) -> bool {
        matches!(self.condition, Some(FlowCondition::Default))
    }
}

/// A borrowed edge in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct FlowRef<'a> {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub flow: &'a Flow,
}

// =============================================================================
// SCOPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Process,
    SubProcess(SubProcessType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeParent {
    pub scope: ScopeId,
    /// The subprocess node in the parent scope that owns this body.
    pub node: NodeIndex,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    /// Qualified id of the owning subprocess; empty for the process itself.
    pub path: String,
    /// Display name: the process name or the subprocess path.
    pub name: String,
    pub kind: ScopeKind,
    pub parent: Option<ScopeParent>,
    pub children: Vec<ScopeId>,
    graph: DiGraph<Node, Flow>,
    node_indices: HashMap<String, NodeIndex>,
}

impl Scope {
    pub(crate) fn new(
        id: ScopeId,
        path: String,
        name: String,
        kind: ScopeKind,
        parent: Option<ScopeParent>,
    ) -> Self {
        Scope {
            id,
            path,
            name,
            kind,
            parent,
            children: Vec::new(),
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
        }
    }

    pub fn graph(&self) -> &DiGraph<Node, Flow> {
        &self.graph
    }

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.graph[idx]
    }

    pub fn lookup(&self, id: &str) -> Option<NodeIndex> {
        self.node_indices.get(id).copied()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.lookup(id).map(|idx| &self.graph[idx])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Node indices in registration order.
    pub fn indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &Node)> + '_ {
        self.graph.node_indices().map(move |idx| (idx, &self.graph[idx]))
    }

    pub fn qualified(&self, idx: NodeIndex) -> String {
        self.graph[idx].qualified_id.clone()
    }

    fn edges(&self, idx: NodeIndex, dir: Direction) -> Vec<FlowRef<'_>> {
        let mut edges: Vec<_> = self.graph.edges_directed(idx, dir).collect();
        // petgraph walks adjacency lists newest first.
        edges.sort_by_key(|e| e.id());
        edges
            .into_iter()
            .map(|e| FlowRef {
                source: e.source(),
                target: e.target(),
                flow: e.weight(),
            })
            .collect()
    }

    pub fn outgoing(&self, idx: NodeIndex) -> Vec<FlowRef<'_>> {
        self.edges(idx, Direction::Outgoing)
    }

    pub fn incoming(&self, idx: NodeIndex) -> Vec<FlowRef<'_>> {
        self.edges(idx, Direction::Incoming)
    }

    pub fn in_degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Incoming).count()
    }

    pub fn out_degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges_directed(idx, Direction::Outgoing).count()
    }

    /// Distinct successors in declaration order.
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut seen = Vec::new();
        for edge in self.outgoing(idx) {
            if !seen.contains(&edge.target) {
                seen.push(edge.target);
            }
        }
        seen
    }

    pub fn boundary_events_of(&self, host: NodeIndex) -> Vec<NodeIndex> {
        self.indices()
            .filter(|&idx| self.graph[idx].attached_to == Some(host))
            .collect()
    }

    pub fn start_events(&self) -> Vec<NodeIndex> {
        self.indices().filter(|&idx| self.graph[idx].kind.is_start()).collect()
    }

    pub fn end_events(&self) -> Vec<NodeIndex> {
        self.indices().filter(|&idx| self.graph[idx].kind.is_end()).collect()
    }

    pub(crate) fn graph_mut(&mut self) -> &mut DiGraph<Node, Flow> {
        &mut self.graph
    }

    pub(crate) fn register(&mut self, node: Node) -> NodeIndex {
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_indices.insert(id, idx);
        idx
    }
}

// =============================================================================
// PROCESS GRAPH
// =============================================================================

/// Immutable once built; shareable across analysis threads.
#[derive(Debug, Clone)]
pub struct ProcessGraph {
    pub name: String,
    scopes: Vec<Scope>,
}

impl ProcessGraph {
    pub(crate) fn new(name: String, scopes: Vec<Scope>) -> Self {
        ProcessGraph { name, scopes }
    }

    /// Scopes in declaration preorder; index 0 is the process itself.
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn root(&self) -> &Scope {
        &self.scopes[0]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// Body scope of a subprocess node.
    pub fn body_of(&self, scope: ScopeId, node: NodeIndex) -> Option<&Scope> {
        self.scopes[scope]
            .children
            .iter()
            .map(|&child| &self.scopes[child])
            .find(|child| child.parent.map(|p| p.node) == Some(node))
    }

    /// Resolve a scope-qualified id (`Sub/Task`) or a plain root-scope id.
    pub fn find(&self, qualified_id: &str) -> Option<(ScopeId, NodeIndex)> {
        let (path, local) = match qualified_id.rsplit_once('/') {
            Some((path, local)) => (path, local),
            None => ("", qualified_id),
        };
        let scope = self.scopes.iter().find(|s| s.path == path)?;
        scope.lookup(local).map(|idx| (scope.id, idx))
    }

    /// All nodes across every scope, in scope preorder.
    pub fn nodes(&self) -> impl Iterator<Item = (&Scope, NodeIndex, &Node)> + '_ {
        self.scopes
            .iter()
            .flat_map(|scope| scope.nodes().map(move |(idx, node)| (scope, idx, node)))
    }
}
