//! Executor runtime state
//!
//! Owned exclusively by the hub. Seeded from the latest [`ShowSnapshot`] and
//! mutated by console feedback and hardware input. Entries are created lazily
//! on first reference and never removed, so an executor missing from the
//! snapshot stays addressable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::executor::{ExecutorNumber, ExecutorType, ShowSnapshot};

/// Live state of one executor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecutorState {
    /// Command semantics
    #[serde(rename = "type")]
    pub kind: ExecutorType,
    /// Normalized value in `[0, 1]`
    pub value: f32,
}

impl ExecutorState {
    /// Fresh state for an executor never seen before
    pub fn unseen(number: ExecutorNumber) -> Self {
        Self {
            kind: ExecutorType::default_for(number),
            value: 0.0,
        }
    }
}

/// Runtime state for all known executors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeState {
    executors: BTreeMap<ExecutorNumber, ExecutorState>,
}

impl RuntimeState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an executor without creating it
    pub fn get(&self, number: ExecutorNumber) -> Option<&ExecutorState> {
        self.executors.get(&number)
    }

    /// Get the state for an executor, creating it on first reference
    pub fn entry(&mut self, number: ExecutorNumber) -> &mut ExecutorState {
        self.executors
            .entry(number)
            .or_insert_with(|| ExecutorState::unseen(number))
    }

    /// Store a new value, creating the executor if needed
    pub fn set_value(&mut self, number: ExecutorNumber, value: f32) {
        self.entry(number).value = value;
    }

    /// Reconcile with a freshly scraped snapshot.
    ///
    /// Every executor in the snapshot takes its type from the snapshot
    /// (coerced to fader above the threshold) and keeps any value it already
    /// had. Executors absent from the snapshot are left untouched.
    pub fn reconcile(&mut self, snapshot: &ShowSnapshot) {
        for (&number, executor) in &snapshot.executors {
            let kind = executor.kind.coerce(number);
            let state = self.executors.entry(number).or_insert(ExecutorState {
                kind,
                value: 0.0,
            });
            state.kind = kind;
        }
    }

    /// Number of known executors
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    /// True when no executor has been referenced yet
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Executor;

    #[test]
    fn test_lazy_entry_defaults() {
        let mut state = RuntimeState::new();
        assert!(state.is_empty());

        assert_eq!(state.entry(5).kind, ExecutorType::Toggle);
        assert_eq!(state.entry(45).kind, ExecutorType::Fader);
        assert_eq!(state.entry(45).value, 0.0);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_set_value_creates_entry() {
        let mut state = RuntimeState::new();
        state.set_value(7, 0.5);
        assert_eq!(state.get(7).map(|s| s.value), Some(0.5));
    }

    #[test]
    fn test_reconcile_preserves_values() {
        let mut state = RuntimeState::new();
        state.set_value(1, 1.0);
        state.set_value(99, 0.3);

        let mut executors = BTreeMap::new();
        let mut flash = Executor::new(1);
        flash.kind = ExecutorType::Flash;
        executors.insert(1, flash);
        let mut high = Executor::new(42);
        high.kind = ExecutorType::Toggle;
        executors.insert(42, high);

        state.reconcile(&ShowSnapshot::new(None, executors));

        let one = state.get(1).unwrap();
        assert_eq!(one.kind, ExecutorType::Flash);
        assert_eq!(one.value, 1.0);

        let forty_two = state.get(42).unwrap();
        assert_eq!(forty_two.kind, ExecutorType::Fader);
        assert_eq!(forty_two.value, 0.0);

        // Not in the snapshot, still known
        assert_eq!(state.get(99).map(|s| s.value), Some(0.3));
    }
}
