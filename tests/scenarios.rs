//! End-to-end scenarios through the public entry points.

mod helpers;

use bpmn_check::model::*;
use bpmn_check::{Failure, check_conformance, validate};
use helpers::*;

#[test]
fn minimal_process_is_clean() {
    let p = process("Minimal", vec![start("S"), end("E")], vec![chain(&["S", "E"])]);
    let failures = validate(&p);
    assert!(failures.is_empty(), "Expected no failures, got: {:?}", failures);
}

#[test]
fn isolated_task_is_a_dead_node_only() {
    let p = process(
        "Isolated",
        vec![start("S"), end("E"), task("T")],
        vec![chain(&["S", "E"])],
    );
    assert_eq!(validate(&p), vec![Failure::DeadNode { node: "T".into() }]);
}

#[test]
fn parallel_split_closed_by_exclusive_merge() {
    let failures = validate(&diamond(GatewayKind::And, GatewayKind::Xor));
    assert_eq!(
        failures,
        vec![Failure::LackOfSync {
            split: "PS".into(),
            merge: "M".into()
        }]
    );
}

#[test]
fn cycle_without_exit() {
    let mut elements = vec![start("S"), end("E")];
    elements.extend(tasks(&["A", "B", "C"]));
    let p = process("Loop", elements, vec![chain(&["S", "A", "B", "C", "A"])]);
    let failures = validate(&p);

    let loops: Vec<_> = failures
        .iter()
        .filter(|f| matches!(f, Failure::InfiniteLoop { .. }))
        .collect();
    assert_eq!(
        loops,
        vec![&Failure::InfiniteLoop {
            cycle: vec!["A".into(), "B".into(), "C".into(), "A".into()]
        }]
    );
    // E can never be reached, which is also reported.
    assert!(failures.contains(&Failure::DeadNode { node: "E".into() }));
    assert_eq!(count(&failures, "ProcessNotSound"), 1);
}

#[test]
fn unmapped_concrete_task() {
    let reference = process("Reference", vec![task("Research")], vec![]);
    let concrete = process("Concrete", vec![task("LiteratureReview")], vec![]);
    assert_eq!(
        check_conformance(&concrete, &reference),
        vec![Failure::TaskNotIncarnated {
            task: "LiteratureReview".into(),
            reference: None
        }]
    );
}

#[test]
fn literature_review_is_not_incarnated() {
    let reference =
        load_process(include_str!("fixtures/thesis_reference.json")).expect("Should load");
    let concrete =
        load_process(include_str!("fixtures/thesis_concrete.json")).expect("Should load");
    assert_eq!(
        check_conformance(&concrete, &reference),
        vec![Failure::TaskNotIncarnated {
            task: "LiteratureReview".into(),
            reference: None
        }]
    );
}

#[test]
fn order_fixture_passes_every_phase() {
    let process = load_process(include_str!("fixtures/order_process.json")).expect("Should load");
    let failures = validate(&process);
    assert!(failures.is_empty(), "Expected no failures, got: {:?}", failures);
}

#[test]
fn rendered_diagnostics() {
    let failures = validate(&diamond(GatewayKind::Xor, GatewayKind::And));
    let rendered: Vec<String> = failures.iter().map(Failure::render).collect();
    insta::assert_snapshot!(rendered.join("\n"), @"[Soundness:SyncDeadlock] parallel merge 'M' waits for a branch that 'PS' only produces conditionally");
}
