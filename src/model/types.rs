//! Declarative process model, as handed over by the DSL parser.
//!
//! These types are the serde target for the parser's JSON output. They are
//! flat lists of declared elements; names are resolved by the graph builder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// TOP LEVEL
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationUnit {
    #[serde(default)]
    pub processes: Vec<Process>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub name: String,
    #[serde(flatten)]
    pub body: ProcessBody,
}

/// Contents of a process or subprocess.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessBody {
    #[serde(default)]
    pub lanes: Vec<Lane>,
    #[serde(default)]
    pub elements: Vec<FlowElement>,
    #[serde(default)]
    pub flows: Vec<SequenceFlow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lane {
    pub name: String,
    #[serde(default)]
    pub elements: Vec<FlowElement>,
    #[serde(default)]
    pub lanes: Vec<Lane>,
}

// =============================================================================
// FLOW ELEMENTS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "camelCase")]
pub enum FlowElement {
    StartEvent(Event),
    EndEvent(Event),
    IntermediateEvent(Event),
    Task(Task),
    SubProcess(SubProcess),
    CallActivity(CallActivity),
    Gateway(Gateway),
    DataObject(DataObject),
    Notification(Notification),
    Operation(Operation),
}

impl FlowElement {
    pub fn id(&self) -> &str {
        match self {
            FlowElement::StartEvent(e)
            | FlowElement::EndEvent(e)
            | FlowElement::IntermediateEvent(e) => &e.id,
            FlowElement::Task(t) => &t.id,
            FlowElement::SubProcess(s) => &s.id,
            FlowElement::CallActivity(c) => &c.id,
            FlowElement::Gateway(g) => &g.id,
            FlowElement::DataObject(d) => &d.id,
            FlowElement::Notification(n) => &n.id,
            FlowElement::Operation(o) => &o.id,
        }
    }

    pub fn boundary_events(&self) -> &[BoundaryEvent] {
        match self {
            FlowElement::Task(t) => &t.boundary_events,
            FlowElement::SubProcess(s) => &s.boundary_events,
            FlowElement::CallActivity(c) => &c.boundary_events,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventDirection {
    Catch,
    Throw,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventTrigger {
    #[default]
    None,
    Message {
        #[serde(default)]
        message: Option<String>,
    },
    Timer {
        expression: String,
    },
    Signal {
        #[serde(default)]
        signal: Option<String>,
    },
    Error {
        #[serde(default)]
        code: Option<String>,
    },
    Escalation {
        #[serde(default)]
        code: Option<String>,
    },
    Compensation {
        #[serde(default)]
        activity: Option<String>,
    },
    Conditional {
        condition: String,
    },
    Link {
        name: String,
    },
    Cancel,
    Terminate,
}

impl EventTrigger {
    pub fn name(&self) -> &'static str {
        match self {
            EventTrigger::None => "none",
            EventTrigger::Message { .. } => "message",
            EventTrigger::Timer { .. } => "timer",
            EventTrigger::Signal { .. } => "signal",
            EventTrigger::Error { .. } => "error",
            EventTrigger::Escalation { .. } => "escalation",
            EventTrigger::Compensation { .. } => "compensation",
            EventTrigger::Conditional { .. } => "conditional",
            EventTrigger::Link { .. } => "link",
            EventTrigger::Cancel => "cancel",
            EventTrigger::Terminate => "terminate",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    /// Defaults to catch for start/intermediate events and throw for end events.
    #[serde(default)]
    pub direction: Option<EventDirection>,
    #[serde(default)]
    pub trigger: EventTrigger,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryEvent {
    pub id: String,
    #[serde(default)]
    pub trigger: EventTrigger,
    #[serde(default = "default_true")]
    pub interrupting: bool,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// ACTIVITIES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskType {
    #[default]
    Abstract,
    User,
    Manual,
    Service,
    Script,
    Send,
    Receive,
    BusinessRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stereotype {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LoopCharacteristic {
    #[serde(rename_all = "camelCase")]
    Standard {
        #[serde(default)]
        condition: Option<String>,
        #[serde(default)]
        maximum: Option<u32>,
        #[serde(default)]
        test_before: bool,
    },
    #[serde(rename_all = "camelCase")]
    MultiInstance {
        #[serde(default)]
        sequential: bool,
        cardinality: Cardinality,
        #[serde(default)]
        completion_condition: Option<String>,
    },
}

/// How many instances a multi-instance activity spawns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cardinality {
    /// One instance per element of the named collection.
    Collection(String),
    /// A literal instance count expression.
    Count(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub loop_characteristic: Option<LoopCharacteristic>,
    #[serde(default)]
    pub stereotypes: Vec<Stereotype>,
    #[serde(default)]
    pub for_compensation: bool,
    #[serde(default)]
    pub boundary_events: Vec<BoundaryEvent>,
    /// Task-type specific attributes (script, implementation, message ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubProcessType {
    #[default]
    Embedded,
    Event,
    Transaction,
    AdHoc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubProcess {
    pub id: String,
    #[serde(default)]
    pub sub_process_type: SubProcessType,
    #[serde(default)]
    pub body: ProcessBody,
    #[serde(default)]
    pub loop_characteristic: Option<LoopCharacteristic>,
    #[serde(default)]
    pub stereotypes: Vec<Stereotype>,
    #[serde(default)]
    pub for_compensation: bool,
    #[serde(default)]
    pub boundary_events: Vec<BoundaryEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallActivity {
    pub id: String,
    pub called_element: String,
    #[serde(default)]
    pub loop_characteristic: Option<LoopCharacteristic>,
    #[serde(default)]
    pub stereotypes: Vec<Stereotype>,
    #[serde(default)]
    pub boundary_events: Vec<BoundaryEvent>,
}

// =============================================================================
// GATEWAYS AND DATA
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GatewayKind {
    Xor,
    And,
    Or,
    Complex,
    /// Exclusive event-based gateway.
    ReceiveFirst,
    /// Parallel event-based gateway.
    ReceiveAll,
}

impl GatewayKind {
    pub fn is_event_based(self) -> bool {
        matches!(self, GatewayKind::ReceiveFirst | GatewayKind::ReceiveAll)
    }

    /// Whether every outgoing branch of a split of this kind receives a token.
    pub fn is_parallel(self) -> bool {
        matches!(self, GatewayKind::And | GatewayKind::ReceiveAll)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GatewayDirection {
    Split,
    Merge,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    pub id: String,
    pub kind: GatewayKind,
    pub direction: GatewayDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataObject {
    pub id: String,
    /// Name of a class-diagram type; resolved (or not) by the type layer.
    #[serde(default)]
    pub type_ref: Option<String>,
    #[serde(default)]
    pub collection: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub result: Option<String>,
}

// =============================================================================
// SEQUENCE FLOWS
// =============================================================================

/// A declared flow path such as `A -> B -> { [c1] C; [_] D }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceFlow {
    #[serde(default)]
    pub id: Option<String>,
    pub path: Vec<FlowStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum FlowStep {
    #[serde(rename_all = "camelCase")]
    Ref { element_ref: String },
    /// Anonymous inline gateway.
    Gateway { kind: GatewayKind },
    Block { branches: Vec<Branch> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    #[serde(default)]
    pub condition: Option<FlowCondition>,
    #[serde(default)]
    pub steps: Vec<FlowStep>,
}

/// Guard on an edge. Expressions are opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FlowCondition {
    Expression { expression: String },
    Default,
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

impl SequenceFlow {
    /// Plain chain of element references: `a -> b -> c`.
    pub fn chain<I, S>(refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SequenceFlow {
            id: None,
            path: refs.into_iter().map(FlowStep::to).collect(),
        }
    }

    pub fn path(path: Vec<FlowStep>) -> Self {
        SequenceFlow { id: None, path }
    }
}

impl FlowStep {
    pub fn to(element_ref: impl Into<String>) -> Self {
        FlowStep::Ref {
            element_ref: element_ref.into(),
        }
    }

    pub fn block(branches: Vec<Branch>) -> Self {
        FlowStep::Block { branches }
    }
}

impl Branch {
    pub fn plain(steps: Vec<FlowStep>) -> Self {
        Branch {
            condition: None,
            steps,
        }
    }

    pub fn when(expression: impl Into<String>, steps: Vec<FlowStep>) -> Self {
        Branch {
            condition: Some(FlowCondition::Expression {
                expression: expression.into(),
            }),
            steps,
        }
    }

    pub fn otherwise(steps: Vec<FlowStep>) -> Self {
        Branch {
            condition: Some(FlowCondition::Default),
            steps,
        }
    }
}

impl Event {
    pub fn new(id: impl Into<String>) -> Self {
        Event {
            id: id.into(),
            direction: None,
            trigger: EventTrigger::None,
        }
    }
}

impl Task {
    pub fn new(id: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            task_type: TaskType::Abstract,
            loop_characteristic: None,
            stereotypes: vec![],
            for_compensation: false,
            boundary_events: vec![],
            attributes: BTreeMap::new(),
        }
    }
}

impl Process {
    pub fn new(name: impl Into<String>) -> Self {
        Process {
            name: name.into(),
            body: ProcessBody::default(),
        }
    }
}
