use showbridge_core::{Executor, ExecutorType, RuntimeState, ShowSnapshot};
use std::collections::BTreeMap;

fn snapshot(entries: &[(u32, ExecutorType)]) -> ShowSnapshot {
    let executors: BTreeMap<u32, Executor> = entries
        .iter()
        .map(|(number, kind)| {
            let mut exec = Executor::new(*number);
            exec.kind = *kind;
            exec.name = Some(format!("Exec {}", number));
            (*number, exec)
        })
        .collect();
    ShowSnapshot::new(Some("Test Show".to_string()), executors)
}

#[test]
fn test_reload_forces_types_and_keeps_values() {
    let mut state = RuntimeState::new();
    state.set_value(3, 1.0);

    state.reconcile(&snapshot(&[(3, ExecutorType::Flash), (50, ExecutorType::Toggle)]));

    assert_eq!(state.get(3).unwrap().kind, ExecutorType::Flash);
    assert_eq!(state.get(3).unwrap().value, 1.0);
    assert_eq!(state.get(50).unwrap().kind, ExecutorType::Fader);
    assert_eq!(state.get(50).unwrap().value, 0.0);
}

#[test]
fn test_second_reload_replaces_types() {
    let mut state = RuntimeState::new();
    state.reconcile(&snapshot(&[(2, ExecutorType::Toggle)]));
    state.set_value(2, 1.0);
    state.reconcile(&snapshot(&[(2, ExecutorType::Flash)]));

    let two = state.get(2).unwrap();
    assert_eq!(two.kind, ExecutorType::Flash);
    assert_eq!(two.value, 1.0);
}

#[test]
fn test_unnamed_executor_stays_addressable() {
    let mut state = RuntimeState::new();
    state.reconcile(&snapshot(&[(1, ExecutorType::Toggle)]));

    // Referenced by feedback but never scraped
    state.set_value(17, 0.25);
    state.reconcile(&snapshot(&[(1, ExecutorType::Toggle)]));

    assert_eq!(state.get(17).unwrap().value, 0.25);
    assert_eq!(state.len(), 2);
}

#[test]
fn test_runtime_state_serializes_as_map() {
    let mut state = RuntimeState::new();
    state.set_value(4, 0.5);

    let json = serde_json::to_value(&state).unwrap();
    assert_eq!(json["4"]["type"], "toggle");
    assert_eq!(json["4"]["value"], 0.5);
}
