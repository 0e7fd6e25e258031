//! Failure taxonomy shared by every analysis phase.
//!
//! Failures are plain values collected into ordered lists; nothing here is
//! raised as control flow. `LoadError` and `AnalysisError` are the only
//! `Err` types the public API returns.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Structural,
    Reference,
    Soundness,
    Conformance,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Structural => write!(f, "Structural"),
            Category::Reference => write!(f, "Reference"),
            Category::Soundness => write!(f, "Soundness"),
            Category::Conformance => write!(f, "Conformance"),
        }
    }
}

/// One violated invariant. Node ids are scope-qualified (`Sub/Task`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Failure {
    // Reference
    #[error("identifier '{id}' is declared more than once in scope '{scope}'")]
    DuplicateIdentifier { id: String, scope: String },

    #[error("sequence flow references unknown element '{element_ref}' in scope '{scope}'")]
    UnresolvedNodeReference { element_ref: String, scope: String },

    #[error(
        "sequence flow in scope '{scope}' references '{element_ref}' which is declared in scope '{target_scope}'"
    )]
    FlowCrossesScopeBoundary {
        element_ref: String,
        scope: String,
        target_scope: String,
    },

    #[error("call activity '{node}' calls unknown process '{called_element}'")]
    CalledElementNotFound { node: String, called_element: String },

    // Structural (builder)
    #[error("'{node}' has {count} default branches, at most one is allowed")]
    MultipleDefaultBranches { node: String, count: usize },

    #[error("default branch leaving '{node}' must be the last branch")]
    DefaultBranchNotLast { node: String },

    #[error("flow block in scope '{scope}' has no single element to branch from")]
    FlowBlockWithoutBranchPoint { scope: String },

    // Structural (validator)
    #[error("start event '{node}' must not have incoming flows, found {count}")]
    StartEventHasIncomingFlow { node: String, count: usize },

    #[error("start event '{node}' must be catching")]
    StartEventIsThrowing { node: String },

    #[error("end event '{node}' must be throwing")]
    EndEventIsCatching { node: String },

    #[error("end event '{node}' must not have outgoing flows, found {count}")]
    EndEventHasOutgoingFlow { node: String, count: usize },

    #[error("scope '{scope}' has a start event but no end event")]
    NoEndEventWithStartEvent { scope: String },

    #[error("boundary event '{node}' must not have incoming flows, found {count}")]
    BoundaryEventHasIncomingFlow { node: String, count: usize },

    #[error("boundary event '{node}' cannot use a {trigger} trigger")]
    BoundaryEventInvalidTrigger { node: String, trigger: String },

    #[error(
        "split gateway '{node}' needs at most 1 incoming and at least 2 outgoing flows, found {incoming} incoming and {outgoing} outgoing"
    )]
    SplitGatewayTooFewOutgoingFlows {
        node: String,
        incoming: usize,
        outgoing: usize,
    },

    #[error(
        "merge gateway '{node}' needs at least 2 incoming and at most 1 outgoing flows, found {incoming} incoming and {outgoing} outgoing"
    )]
    MergeGatewayTooFewIncomingFlows {
        node: String,
        incoming: usize,
        outgoing: usize,
    },

    #[error("event-based gateway '{node}' must be a split")]
    EventGatewayIsNotSplit { node: String },

    #[error("event-based gateway '{node}' mixes catching events and receive tasks as targets")]
    EventGatewayMixedTargetTypes { node: String },

    #[error(
        "event-based gateway '{node}' targets '{target}', which is neither a catching event nor a receive task"
    )]
    EventGatewayInvalidTarget { node: String, target: String },

    #[error("ad-hoc subprocess '{node}' contains no activity")]
    AdHocSubProcessEmpty { node: String },

    #[error("ad-hoc subprocess '{node}' must not contain start or end event '{event}'")]
    AdHocSubProcessHasStartOrEndEvent { node: String, event: String },

    #[error("event subprocess '{node}' must not be connected by sequence flows")]
    EventSubProcessHasFlow { node: String },

    #[error("event subprocess '{node}' must have exactly one start event, found {count}")]
    EventSubProcessStartEventCount { node: String, count: usize },

    #[error("compensation activity '{node}' must not be connected by sequence flows")]
    CompensationActivityHasFlow { node: String },

    #[error("loop count '{expression}' of '{node}' does not denote an integer")]
    LoopCountNotInteger { node: String, expression: String },

    #[error("cancel event '{node}' is only allowed inside a transaction")]
    CancelEventOutsideTransaction { node: String },

    // Soundness
    #[error("node '{node}' is not reachable from any start event")]
    DeadNode { node: String },

    #[error("nodes [{}] are not connected to any start event", .nodes.join(", "))]
    DisconnectedComponent { nodes: Vec<String> },

    #[error("infinite loop without exit: {}", .cycle.join(" -> "))]
    InfiniteLoop { cycle: Vec<String> },

    #[error("parallel branches of '{split}' are joined by exclusive merge '{merge}'")]
    LackOfSync { split: String, merge: String },

    #[error("parallel merge '{merge}' waits for a branch that '{split}' only produces conditionally")]
    SyncDeadlock { merge: String, split: String },

    #[error("process scope '{scope}' is not sound: {reason}")]
    ProcessNotSound { scope: String, reason: String },

    // Conformance
    #[error("{}", incarnation_message(.task, .reference.as_deref()))]
    TaskNotIncarnated {
        task: String,
        reference: Option<String>,
    },

    #[error(
        "parallel branches of reference split '{reference_split}' are closed by exclusive merge '{concrete_merge}': {}",
        render_branches(.branch_paths)
    )]
    ParallelBranchesClosedWithXor {
        reference_split: String,
        concrete_merge: String,
        branch_paths: Vec<Vec<String>>,
    },
}

fn incarnation_message(task: &str, reference: Option<&str>) -> String {
    match reference {
        Some(r) => format!("task '{task}' incarnates unknown reference activity '{r}'"),
        None => format!("task '{task}' does not incarnate any reference activity"),
    }
}

fn render_branches(paths: &[Vec<String>]) -> String {
    paths
        .iter()
        .map(|p| p.join(" -> "))
        .collect::<Vec<_>>()
        .join(" | ")
}

impl Failure {
    /// Stable tag for programmatic matching.
    pub fn kind(&self) -> &'static str {
        match self {
            Failure::DuplicateIdentifier { .. } => "DuplicateIdentifier",
            Failure::UnresolvedNodeReference { .. } => "UnresolvedNodeReference",
            Failure::FlowCrossesScopeBoundary { .. } => "FlowCrossesScopeBoundary",
            Failure::CalledElementNotFound { .. } => "CalledElementNotFound",
            Failure::MultipleDefaultBranches { .. } => "MultipleDefaultBranches",
            Failure::DefaultBranchNotLast { .. } => "DefaultBranchNotLast",
            Failure::FlowBlockWithoutBranchPoint { .. } => "FlowBlockWithoutBranchPoint",
            Failure::StartEventHasIncomingFlow { .. } => "StartEventHasIncomingFlow",
            Failure::StartEventIsThrowing { .. } => "StartEventIsThrowing",
            Failure::EndEventIsCatching { .. } => "EndEventIsCatching",
            Failure::EndEventHasOutgoingFlow { .. } => "EndEventHasOutgoingFlow",
            Failure::NoEndEventWithStartEvent { .. } => "NoEndEventWithStartEvent",
            Failure::BoundaryEventHasIncomingFlow { .. } => "BoundaryEventHasIncomingFlow",
            Failure::BoundaryEventInvalidTrigger { .. } => "BoundaryEventInvalidTrigger",
            Failure::SplitGatewayTooFewOutgoingFlows { .. } => "SplitGatewayTooFewOutgoingFlows",
            Failure::MergeGatewayTooFewIncomingFlows { .. } => "MergeGatewayTooFewIncomingFlows",
            Failure::EventGatewayIsNotSplit { .. } => "EventGatewayIsNotSplit",
            Failure::EventGatewayMixedTargetTypes { .. } => "EventGatewayMixedTargetTypes",
            Failure::EventGatewayInvalidTarget { .. } => "EventGatewayInvalidTarget",
            Failure::AdHocSubProcessEmpty { .. } => "AdHocSubProcessEmpty",
            Failure::AdHocSubProcessHasStartOrEndEvent { .. } => {
                "AdHocSubProcessHasStartOrEndEvent"
            }
            Failure::EventSubProcessHasFlow { .. } => "EventSubProcessHasFlow",
            Failure::EventSubProcessStartEventCount { .. } => "EventSubProcessStartEventCount",
            Failure::CompensationActivityHasFlow { .. } => "CompensationActivityHasFlow",
            Failure::LoopCountNotInteger { .. } => "LoopCountNotInteger",
            Failure::CancelEventOutsideTransaction { .. } => "CancelEventOutsideTransaction",
            Failure::DeadNode { .. } => "DeadNode",
            Failure::DisconnectedComponent { .. } => "DisconnectedComponent",
            Failure::InfiniteLoop { .. } => "InfiniteLoop",
            Failure::LackOfSync { .. } => "LackOfSync",
            Failure::SyncDeadlock { .. } => "SyncDeadlock",
            Failure::ProcessNotSound { .. } => "ProcessNotSound",
            Failure::TaskNotIncarnated { .. } => "TaskNotIncarnated",
            Failure::ParallelBranchesClosedWithXor { .. } => "ParallelBranchesClosedWithXor",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Failure::DuplicateIdentifier { .. }
            | Failure::UnresolvedNodeReference { .. }
            | Failure::FlowCrossesScopeBoundary { .. }
            | Failure::CalledElementNotFound { .. } => Category::Reference,

            Failure::DeadNode { .. }
            | Failure::DisconnectedComponent { .. }
            | Failure::InfiniteLoop { .. }
            | Failure::LackOfSync { .. }
            | Failure::SyncDeadlock { .. }
            | Failure::ProcessNotSound { .. } => Category::Soundness,

            Failure::TaskNotIncarnated { .. } | Failure::ParallelBranchesClosedWithXor { .. } => {
                Category::Conformance
            }

            _ => Category::Structural,
        }
    }

    /// Node ids a tool can highlight for this failure. Scope-level failures return none.
    pub fn node_ids(&self) -> Vec<&str> {
        match self {
            Failure::DuplicateIdentifier { .. }
            | Failure::UnresolvedNodeReference { .. }
            | Failure::FlowCrossesScopeBoundary { .. }
            | Failure::FlowBlockWithoutBranchPoint { .. }
            | Failure::NoEndEventWithStartEvent { .. }
            | Failure::ProcessNotSound { .. } => vec![],

            Failure::CalledElementNotFound { node, .. }
            | Failure::MultipleDefaultBranches { node, .. }
            | Failure::DefaultBranchNotLast { node }
            | Failure::StartEventHasIncomingFlow { node, .. }
            | Failure::StartEventIsThrowing { node }
            | Failure::EndEventIsCatching { node }
            | Failure::EndEventHasOutgoingFlow { node, .. }
            | Failure::BoundaryEventHasIncomingFlow { node, .. }
            | Failure::BoundaryEventInvalidTrigger { node, .. }
            | Failure::SplitGatewayTooFewOutgoingFlows { node, .. }
            | Failure::MergeGatewayTooFewIncomingFlows { node, .. }
            | Failure::EventGatewayIsNotSplit { node }
            | Failure::EventGatewayMixedTargetTypes { node }
            | Failure::AdHocSubProcessEmpty { node }
            | Failure::EventSubProcessHasFlow { node }
            | Failure::EventSubProcessStartEventCount { node, .. }
            | Failure::CompensationActivityHasFlow { node }
            | Failure::LoopCountNotInteger { node, .. }
            | Failure::CancelEventOutsideTransaction { node }
            | Failure::DeadNode { node } => vec![node.as_str()],

            Failure::EventGatewayInvalidTarget { node, target } => {
                vec![node.as_str(), target.as_str()]
            }
            Failure::AdHocSubProcessHasStartOrEndEvent { node, event } => {
                vec![node.as_str(), event.as_str()]
            }
            Failure::DisconnectedComponent { nodes } => nodes.iter().map(String::as_str).collect(),
            Failure::InfiniteLoop { cycle } => {
                // The closing node repeats the first one.
                let open = cycle.len().saturating_sub(1);
                cycle[..open].iter().map(String::as_str).collect()
            }
            Failure::LackOfSync { split, merge } | Failure::SyncDeadlock { merge, split } => {
                vec![merge.as_str(), split.as_str()]
            }
            Failure::TaskNotIncarnated { task, .. } => vec![task.as_str()],
            Failure::ParallelBranchesClosedWithXor { concrete_merge, .. } => {
                vec![concrete_merge.as_str()]
            }
        }
    }

    /// One-line diagnostic: `[Category:Kind] message`.
    pub fn render(&self) -> String {
        format!("[{}:{}] {}", self.category(), self.kind(), self)
    }
}

/// Failure to load the declarative model handed over by the parser layer.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to parse {what} JSON: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("analysis of process '{process}' was cancelled")]
    Cancelled { process: String },
}
