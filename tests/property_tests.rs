//! Randomized invariant checks for the reconciliation pipeline.
//!
//! Feeds randomly generated event sequences (including orphan results,
//! empty-input calls, and duplicate ids) through the buffer and the guard
//! and asserts that no produced message ever carries a resolved tool part
//! without input.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use weir::reconcile::guard::{guard_message, satisfies_invariant};
use weir::reconcile::ReconcileBuffer;
use weir::types::{ContentPart, FinishReason, ToolState, TurnEvent, Usage};

fn random_input(rng: &mut StdRng) -> serde_json::Value {
    match rng.random_range(0..4) {
        0 => json!({}),
        1 => serde_json::Value::Null,
        2 => json!({"query": "x"}),
        _ => json!({"n": rng.random_range(0..100)}),
    }
}

fn random_event(rng: &mut StdRng) -> TurnEvent {
    let call_id = format!("c{}", rng.random_range(0..6));
    match rng.random_range(0..5) {
        0 => TurnEvent::TextDelta {
            text: format!("t{} ", rng.random_range(0..100)),
        },
        1 => TurnEvent::ToolCallStarted {
            tool_call_id: call_id,
            tool_name: "lookup".into(),
            input: random_input(rng),
        },
        2 => TurnEvent::ToolCallCompleted {
            tool_call_id: call_id,
            output: json!({"ok": true}),
            is_error: rng.random_bool(0.2),
        },
        3 => TurnEvent::ToolCallProgress {
            tool_call_id: call_id,
            tool_name: "lookup".into(),
            payload: json!({"pct": rng.random_range(0..100)}),
        },
        _ => TurnEvent::ToolCallCompleted {
            // Orphan: an id no started event ever uses.
            tool_call_id: format!("orphan-{}", rng.random_range(0..1000)),
            output: json!({"ok": true}),
            is_error: false,
        },
    }
}

fn random_terminal(rng: &mut StdRng) -> TurnEvent {
    if rng.random_bool(0.3) {
        TurnEvent::Failed {
            error: "cut short".into(),
        }
    } else {
        TurnEvent::Finished {
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        }
    }
}

#[test]
fn no_message_ever_violates_the_input_invariant() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..500 {
        let mut buf = ReconcileBuffer::new("t1", "m1");
        let len = rng.random_range(0..30);
        for _ in 0..len {
            buf.observe(&random_event(&mut rng));
            // Checkpoints are taken mid-stream; pending parts are allowed
            // but resolved empty-input parts are not.
            let snapshot = guard_message(buf.snapshot());
            assert!(satisfies_invariant(&snapshot));
        }
        buf.observe(&random_terminal(&mut rng));

        let message = guard_message(buf.finalize());
        assert!(satisfies_invariant(&message));

        for part in message.tool_parts() {
            if let ContentPart::Tool { state, input, .. } = part {
                // Finalized messages carry no pending leftovers either.
                assert_ne!(*state, ToolState::PendingCall);
                assert!(!weir::types::empty_input(input));
            }
        }
    }
}

#[test]
fn orphan_results_never_materialize_parts() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..200 {
        let mut buf = ReconcileBuffer::new("t1", "m1");
        let mut started = Vec::new();
        for _ in 0..rng.random_range(0..20) {
            let event = random_event(&mut rng);
            if let TurnEvent::ToolCallStarted { tool_call_id, .. } = &event {
                started.push(tool_call_id.clone());
            }
            buf.observe(&event);
        }
        buf.observe(&random_terminal(&mut rng));

        for part in buf.finalize().tool_parts() {
            if let ContentPart::Tool { tool_call_id, .. } = part {
                assert!(started.contains(tool_call_id));
            }
        }
    }
}

#[test]
fn text_order_is_stable_across_tool_noise() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..200 {
        let mut buf = ReconcileBuffer::new("t1", "m1");
        let mut expected = String::new();
        for _ in 0..rng.random_range(1..25) {
            let event = random_event(&mut rng);
            if let TurnEvent::TextDelta { text } = &event {
                expected.push_str(text);
            }
            buf.observe(&event);
        }
        buf.observe(&TurnEvent::Finished {
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        });

        assert_eq!(buf.finalize().text(), expected);
    }
}
