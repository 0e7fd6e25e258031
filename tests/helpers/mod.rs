use bpmn_check::Failure;
use bpmn_check::model::*;

// =============================================================================
// Element builders
// =============================================================================

pub fn start(id: &str) -> FlowElement {
    FlowElement::StartEvent(Event::new(id))
}

pub fn end(id: &str) -> FlowElement {
    FlowElement::EndEvent(Event::new(id))
}

pub fn end_with(id: &str, trigger: EventTrigger) -> FlowElement {
    let mut event = Event::new(id);
    event.trigger = trigger;
    FlowElement::EndEvent(event)
}

pub fn catch_event(id: &str, trigger: EventTrigger) -> FlowElement {
    let mut event = Event::new(id);
    event.trigger = trigger;
    FlowElement::IntermediateEvent(event)
}

pub fn message(id: &str) -> FlowElement {
    catch_event(id, EventTrigger::Message { message: None })
}

pub fn task(id: &str) -> FlowElement {
    FlowElement::Task(Task::new(id))
}

pub fn typed_task(id: &str, task_type: TaskType) -> FlowElement {
    let mut task = Task::new(id);
    task.task_type = task_type;
    FlowElement::Task(task)
}

pub fn tasks(ids: &[&str]) -> Vec<FlowElement> {
    ids.iter().map(|id| task(id)).collect()
}

/// Task carrying an `incarnates` stereotype.
pub fn incarnating(id: &str, reference: &str) -> FlowElement {
    let mut task = Task::new(id);
    task.stereotypes.push(Stereotype {
        name: "incarnates".into(),
        value: Some(reference.into()),
    });
    FlowElement::Task(task)
}

pub fn with_boundary(
    element: FlowElement,
    id: &str,
    trigger: EventTrigger,
    interrupting: bool,
) -> FlowElement {
    let boundary = BoundaryEvent {
        id: id.into(),
        trigger,
        interrupting,
    };
    match element {
        FlowElement::Task(mut t) => {
            t.boundary_events.push(boundary);
            FlowElement::Task(t)
        }
        FlowElement::SubProcess(mut s) => {
            s.boundary_events.push(boundary);
            FlowElement::SubProcess(s)
        }
        other => panic!("cannot attach a boundary event to {}", other.id()),
    }
}

pub fn split(id: &str, kind: GatewayKind) -> FlowElement {
    FlowElement::Gateway(Gateway {
        id: id.into(),
        kind,
        direction: GatewayDirection::Split,
    })
}

pub fn merge(id: &str, kind: GatewayKind) -> FlowElement {
    FlowElement::Gateway(Gateway {
        id: id.into(),
        kind,
        direction: GatewayDirection::Merge,
    })
}

pub fn subprocess(
    id: &str,
    sub_process_type: SubProcessType,
    elements: Vec<FlowElement>,
    flows: Vec<SequenceFlow>,
) -> FlowElement {
    FlowElement::SubProcess(SubProcess {
        id: id.into(),
        sub_process_type,
        body: ProcessBody {
            lanes: vec![],
            elements,
            flows,
        },
        loop_characteristic: None,
        stereotypes: vec![],
        for_compensation: false,
        boundary_events: vec![],
    })
}

// =============================================================================
// Process builders
// =============================================================================

pub fn chain(ids: &[&str]) -> SequenceFlow {
    SequenceFlow::chain(ids.iter().copied())
}

pub fn process(name: &str, elements: Vec<FlowElement>, flows: Vec<SequenceFlow>) -> Process {
    let mut p = Process::new(name);
    p.body.elements = elements;
    p.body.flows = flows;
    p
}

/// `S -> split -> {X, Y} -> merge -> E`.
pub fn diamond(split_kind: GatewayKind, merge_kind: GatewayKind) -> Process {
    process(
        "Diamond",
        vec![
            start("S"),
            split("PS", split_kind),
            task("X"),
            task("Y"),
            merge("M", merge_kind),
            end("E"),
        ],
        vec![chain(&["S", "PS", "X", "M", "E"]), chain(&["PS", "Y", "M"])],
    )
}

// =============================================================================
// Assertions
// =============================================================================

pub fn kinds(failures: &[Failure]) -> Vec<&'static str> {
    failures.iter().map(|f| f.kind()).collect()
}

pub fn count(failures: &[Failure], kind: &str) -> usize {
    failures.iter().filter(|f| f.kind() == kind).count()
}
