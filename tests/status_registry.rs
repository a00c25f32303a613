// tests/status_registry.rs

mod common;
use crate::common::init_tracing;

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use proptest::prelude::*;
use serde_json::Value;

use kapo::status::{Attempt, Shape, Snapshot, StatusRegistry};
use kapo::types::{Mode, RunState};

fn attempt(mode: Mode) -> Attempt {
    Attempt::new(mode, "/bin/true", vec!["--flag".to_string()])
        .ttl(Duration::from_secs(3))
        .wait(Duration::from_secs(5))
        .pid(Some(4242))
}

#[test]
fn begin_then_finish_moves_record_to_terminal_state_once() {
    init_tracing();
    let registry = StatusRegistry::for_mode(Mode::Supervise, None);

    let id = registry.begin(attempt(Mode::Supervise));
    let running = registry.last().unwrap();
    assert_eq!(running.state, RunState::Running);
    assert_eq!(running.end_time, None);
    assert_eq!(running.exit_code, None);

    assert!(registry.finish(id, 3, RunState::Stopped));
    let done = registry.last().unwrap();
    assert_eq!(done.state, RunState::Stopped);
    assert_eq!(done.exit_code, Some(3));
    assert!(done.end_time.unwrap() >= done.start_time);

    // A terminal record is never rewritten.
    assert!(!registry.finish(id, 9, RunState::Killed));
    assert_eq!(registry.last().unwrap(), done);
}

#[test]
fn finish_refuses_running_state() {
    let registry = StatusRegistry::for_mode(Mode::Supervise, None);
    let id = registry.begin(attempt(Mode::Supervise));
    assert!(!registry.finish(id, 0, RunState::Running));
    assert!(registry.last().unwrap().is_running());
}

#[test]
fn end_time_is_clamped_to_start_time() {
    let registry = StatusRegistry::for_mode(Mode::Supervise, None);
    let start = Utc::now();
    let id = registry.begin(attempt(Mode::Supervise).started_at(start));

    let earlier = start - TimeDelta::seconds(30);
    assert!(registry.finish_at(id, 0, RunState::Stopped, earlier));
    assert_eq!(registry.last().unwrap().end_time, Some(start));
}

#[test]
fn run_mode_renders_single_object_or_null() {
    let registry = StatusRegistry::for_mode(Mode::Run, Some(100));
    assert_eq!(registry.shape(), Shape::Single);

    let json: Value = serde_json::from_slice(&registry.view().to_json().unwrap()).unwrap();
    assert!(json.is_null());

    let first = registry.begin(attempt(Mode::Run));
    registry.finish(first, 0, RunState::Stopped);
    registry.begin(attempt(Mode::Run));

    assert_eq!(registry.len(), 1, "run mode retains only the current attempt");
    let json: Value = serde_json::from_slice(&registry.view().to_json().unwrap()).unwrap();
    assert!(json.is_object());
    assert_eq!(json["state"], "running");
}

#[test]
fn history_modes_render_arrays_in_attempt_order() {
    let registry = StatusRegistry::for_mode(Mode::Supervise, None);
    for code in 0..3 {
        let id = registry.begin(attempt(Mode::Supervise));
        registry.finish(id, code, RunState::Stopped);
    }

    match registry.view().snapshot() {
        Snapshot::History(records) => {
            let codes: Vec<_> = records.iter().map(|s| s.exit_code).collect();
            assert_eq!(codes, vec![Some(0), Some(1), Some(2)]);
        }
        other => panic!("expected history snapshot, got {other:?}"),
    }
}

#[test]
fn json_uses_camel_case_fields_and_seconds() {
    let registry = StatusRegistry::for_mode(Mode::Supervise, None);
    let id = registry.begin(attempt(Mode::Supervise));
    registry.finish(id, 9, RunState::Killed);

    let json: Value = serde_json::from_slice(&registry.view().to_json().unwrap()).unwrap();
    let record = &json[0];
    assert_eq!(record["command"], "/bin/true");
    assert_eq!(record["arguments"], serde_json::json!(["--flag"]));
    assert!(record["startTime"].is_string());
    assert!(record["endTime"].is_string());
    assert_eq!(record["ttl"], 3);
    assert_eq!(record["wait"], 5);
    assert_eq!(record["exitCode"], 9);
    assert_eq!(record["state"], "killed");
    assert_eq!(record["mode"], "supervise");
    assert_eq!(record["pid"], 4242);
}

#[test]
fn repeated_renders_are_byte_identical() {
    let registry = StatusRegistry::for_mode(Mode::Watch, None);
    registry.begin(attempt(Mode::Watch));
    let view = registry.view();
    assert_eq!(view.to_json().unwrap(), view.to_json().unwrap());
}

#[test]
fn updates_to_evicted_records_are_dropped() {
    let registry = StatusRegistry::new(Shape::History, Some(2));
    let first = registry.begin(attempt(Mode::Supervise));
    registry.begin(attempt(Mode::Supervise));
    registry.begin(attempt(Mode::Supervise));

    assert_eq!(registry.len(), 2);
    assert!(!registry.finish(first, 0, RunState::Stopped));
    assert!(registry.records().iter().all(|s| s.is_running()));
}

#[test]
fn terminal_records_have_matching_start_and_end() {
    let registry = StatusRegistry::for_mode(Mode::Watch, None);
    registry.record_terminal(attempt(Mode::Watch), -1, RunState::Stopped);
    let record = registry.last().unwrap();
    assert_eq!(record.end_time, Some(record.start_time));
    assert_eq!(record.exit_code, Some(-1));
}

proptest! {
    #[test]
    fn history_never_exceeds_max_records(
        max in 1usize..8,
        ops in proptest::collection::vec(any::<bool>(), 0..64),
    ) {
        let registry = StatusRegistry::new(Shape::History, Some(max));
        let mut appended = 0usize;

        for finish_last in ops {
            if finish_last {
                if let Some(id) = registry.last_id() {
                    registry.finish(id, 0, RunState::Stopped);
                }
            } else {
                registry.begin(attempt(Mode::Supervise));
                appended += 1;
            }
            prop_assert!(registry.len() <= max);
            prop_assert_eq!(registry.len(), appended.min(max));
        }

        for record in registry.records() {
            prop_assert_eq!(record.end_time.is_none(), record.exit_code.is_none());
            prop_assert_eq!(record.end_time.is_none(), record.is_running());
            if let Some(end) = record.end_time {
                prop_assert!(record.start_time <= end);
            }
        }
    }
}
