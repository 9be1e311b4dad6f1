//! Ordered Sequencing Tests
//!
//! Drives the sequencer through the fake control plane and a scripted event
//! source: start order, terminal states, acknowledgement discipline and group
//! handling.

use ordered_startup::mock::{event, process_state_event, tick_event};
use ordered_startup::{
    Decision, FakeControlPlane, FinishReason, OrderingPolicy, ProcessState, Program,
    ScriptedEvents, Sequencer, SequencerError, StartupPlan,
};

fn ordered(after: ProcessState) -> OrderingPolicy {
    OrderingPolicy {
        autostart: false,
        start_in_order: true,
        start_next: true,
        start_next_after: after,
    }
}

/// P1 (10, ordered), P2 (20, ordered), P3 (30, not ordered)
fn chain_plan() -> StartupPlan {
    StartupPlan::new(vec![
        Program::new("p1", 10, ordered(ProcessState::Running)),
        Program::new("p2", 20, ordered(ProcessState::Running)),
        Program::new("p3", 30, OrderingPolicy::default()),
    ])
}

// =============================================================================
// Happy path: each RUNNING event starts exactly the next program
// =============================================================================

#[test]
fn test_chain_starts_each_next_program_once() {
    let mut sequencer = Sequencer::new(chain_plan(), FakeControlPlane::new());
    sequencer.bootstrap().unwrap();

    let mut events = ScriptedEvents::new(vec![
        process_state_event("p1", "p1", ProcessState::Starting),
        process_state_event("p1", "p1", ProcessState::Running),
        process_state_event("p2", "p2", ProcessState::Starting),
        process_state_event("p2", "p2", ProcessState::Running),
        process_state_event("p3", "p3", ProcessState::Running),
        process_state_event("p1", "p1", ProcessState::Running),
    ]);
    let report = sequencer.run(&mut events).unwrap();

    assert_eq!(
        sequencer.control().starts(),
        vec![
            ("p1".to_string(), false),
            ("p2".to_string(), true),
            ("p3".to_string(), true),
        ]
    );
    assert_eq!(report.started, vec!["p2", "p3"]);
    // p3 is not ordered: starting it completes the sequence
    assert_eq!(
        sequencer.state().finish_reason(),
        Some(&FinishReason::SequenceComplete { program: "p3".to_string() })
    );
    assert_eq!(report.received, 6);
    assert_eq!(report.acknowledged, 6);
}

#[test]
fn test_last_ordered_program_finishes_sequence() {
    let plan = StartupPlan::new(vec![
        Program::new("p1", 10, ordered(ProcessState::Running)),
        Program::new("p2", 20, ordered(ProcessState::Running)),
    ]);
    let mut sequencer = Sequencer::new(plan, FakeControlPlane::new());
    sequencer.bootstrap().unwrap();

    let mut events = ScriptedEvents::new(vec![
        process_state_event("p1", "p1", ProcessState::Running),
        process_state_event("p2", "p2", ProcessState::Running),
        process_state_event("p1", "p1", ProcessState::Running),
    ]);
    let report = sequencer.run(&mut events).unwrap();

    assert_eq!(report.started, vec!["p2"]);
    assert_eq!(
        sequencer.state().finish_reason(),
        Some(&FinishReason::LastProgramReached { program: "p2".to_string() })
    );
    assert_eq!(events.acknowledged(), 3);
}

// =============================================================================
// startnext=false ends the sequence
// =============================================================================

#[test]
fn test_startnext_false_ends_sequence_on_exit() {
    let mut migrate = ordered(ProcessState::Exited);
    migrate.start_next = false;
    let plan = StartupPlan::new(vec![
        Program::new("migrate", 1, migrate),
        Program::new("api", 2, ordered(ProcessState::Running)),
        Program::new("worker", 3, OrderingPolicy::default()),
    ]);
    let mut sequencer = Sequencer::new(plan, FakeControlPlane::new());
    sequencer.bootstrap().unwrap();

    let mut events = ScriptedEvents::new(vec![
        process_state_event("migrate", "migrate", ProcessState::Running),
        process_state_event("migrate", "migrate", ProcessState::Exited),
        process_state_event("api", "api", ProcessState::Running),
        tick_event(),
    ]);
    let report = sequencer.run(&mut events).unwrap();

    assert!(report.started.is_empty());
    assert_eq!(sequencer.control().started_names(), vec!["migrate"]);
    assert!(sequencer.is_finished());
    assert_eq!(
        sequencer.state().finish_reason(),
        Some(&FinishReason::EndOfSequence { program: "migrate".to_string() })
    );
    assert_eq!(report.acknowledged, 4);
}

// =============================================================================
// Acknowledgement discipline
// =============================================================================

#[test]
fn test_every_event_acknowledged_once() {
    let mut sequencer = Sequencer::new(chain_plan(), FakeControlPlane::new());
    let mut events = ScriptedEvents::new(vec![
        tick_event(),
        event("SUPERVISOR_STATE_CHANGE_RUNNING", ""),
        process_state_event("unknown", "unknown", ProcessState::Fatal),
        event("PROCESS_STATE_SOMETHING_NEW", "processname:p1 groupname:p1"),
        process_state_event("p1", "p1", ProcessState::Running),
        process_state_event("p2", "p2", ProcessState::Running),
        process_state_event("p3", "p3", ProcessState::Running),
        tick_event(),
    ]);

    let report = sequencer.run(&mut events).unwrap();
    assert_eq!(events.delivered(), 8);
    assert_eq!(events.acknowledged(), 8);
    assert_eq!(events.remaining(), 0);
    assert_eq!(report.received, report.acknowledged);
}

#[test]
fn test_finished_sequencer_still_acknowledges() {
    let plan = StartupPlan::new(vec![Program::new("only", 1, ordered(ProcessState::Running))]);
    let mut sequencer = Sequencer::new(plan, FakeControlPlane::new());
    let mut events = ScriptedEvents::new(vec![
        process_state_event("only", "only", ProcessState::Running),
        process_state_event("only", "only", ProcessState::Running),
        process_state_event("only", "only", ProcessState::Stopped),
    ]);

    sequencer.run(&mut events).unwrap();
    assert!(sequencer.is_finished());
    assert_eq!(events.acknowledged(), 3);
    assert!(sequencer.control().starts().is_empty());
}

#[test]
fn test_fault_stops_before_acknowledging() {
    let control = FakeControlPlane::new().fail_start("p2");
    let mut sequencer = Sequencer::new(chain_plan(), control);
    let mut events = ScriptedEvents::new(vec![
        tick_event(),
        process_state_event("p1", "p1", ProcessState::Running),
        process_state_event("p2", "p2", ProcessState::Running),
    ]);

    let err = sequencer.run(&mut events).unwrap_err();
    assert!(matches!(err, SequencerError::Control(_)));
    assert_eq!(events.delivered(), 2);
    assert_eq!(events.acknowledged(), 1);
    assert_eq!(events.remaining(), 1);
}

#[test]
fn test_listing_failure_aborts_bootstrap() {
    let mut sequencer = Sequencer::new(chain_plan(), FakeControlPlane::new().fail_listing());
    assert!(matches!(sequencer.bootstrap(), Err(SequencerError::Control(_))));
    assert!(sequencer.control().starts().is_empty());
}

// =============================================================================
// Group handling
// =============================================================================

#[test]
fn test_grouped_programs_use_composite_name_except_bootstrap() {
    let control = FakeControlPlane::new()
        .with_process("db", "backend")
        .with_process("api", "web")
        .with_process("worker", "worker");
    let plan = StartupPlan::new(vec![
        Program::new("db", 1, ordered(ProcessState::Running)),
        Program::new("api", 2, ordered(ProcessState::Running)),
        Program::new("worker", 3, OrderingPolicy::default()),
    ]);
    let mut sequencer = Sequencer::new(plan, control);

    assert_eq!(sequencer.bootstrap().unwrap(), Some("db".to_string()));
    assert_eq!(sequencer.plan().get("db").unwrap().procname, "backend:db");

    let mut events = ScriptedEvents::new(vec![
        process_state_event("db", "backend", ProcessState::Running),
        process_state_event("api", "web", ProcessState::Running),
    ]);
    sequencer.run(&mut events).unwrap();

    assert_eq!(
        sequencer.control().starts(),
        vec![
            ("db".to_string(), false),
            ("web:api".to_string(), true),
            ("worker".to_string(), true),
        ]
    );
}

#[test]
fn test_trigger_matches_bare_process_name_only() {
    let control = FakeControlPlane::new().with_process("api", "web");
    let plan = StartupPlan::new(vec![
        Program::new("api", 1, ordered(ProcessState::Running)),
        Program::new("worker", 2, OrderingPolicy::default()),
    ]);
    let mut sequencer = Sequencer::new(plan, control);
    sequencer.bootstrap().unwrap();

    let decision = sequencer
        .handle(&process_state_event("web:api", "web", ProcessState::Running))
        .unwrap();
    assert_eq!(decision, Decision::NoMatch);
}

// =============================================================================
// Trigger state selection
// =============================================================================

#[test]
fn test_trigger_waits_for_configured_state() {
    let plan = StartupPlan::new(vec![
        Program::new("setup", 1, ordered(ProcessState::Exited)),
        Program::new("app", 2, OrderingPolicy::default()),
    ]);
    let mut sequencer = Sequencer::new(plan, FakeControlPlane::new());

    for state in [ProcessState::Starting, ProcessState::Running, ProcessState::Stopping] {
        let decision = sequencer.handle(&process_state_event("setup", "setup", state)).unwrap();
        assert_eq!(decision, Decision::NoMatch, "state {state} must not trigger");
    }
    let decision = sequencer
        .handle(&process_state_event("setup", "setup", ProcessState::Exited))
        .unwrap();
    assert_eq!(decision, Decision::Started { procname: "app".to_string() });
}

#[test]
fn test_unordered_program_never_triggers() {
    let plan = StartupPlan::new(vec![
        Program::new("a", 1, OrderingPolicy::default()),
        Program::new("b", 2, ordered(ProcessState::Running)),
    ]);
    let mut sequencer = Sequencer::new(plan, FakeControlPlane::new());
    let decision = sequencer
        .handle(&process_state_event("a", "a", ProcessState::Running))
        .unwrap();
    assert_eq!(decision, Decision::NoMatch);
}
