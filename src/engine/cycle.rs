//! Update-cycle state machine with the deferred dispatch queue.

use std::collections::VecDeque;

use crate::action::Dispatchable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePhase {
    /// No update in flight; dispatches apply immediately.
    #[default]
    Idle,
    /// An update is being committed; dispatches are queued.
    Committing,
}

/// Tracks the in-flight window and the dispatches deferred during it.
#[derive(Debug, Default)]
pub struct UpdateCycle {
    phase: CyclePhase,
    queue: VecDeque<Dispatchable>,
}

impl UpdateCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn is_committing(&self) -> bool {
        self.phase == CyclePhase::Committing
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Open the in-flight window.
    pub fn begin(&mut self) {
        self.phase = CyclePhase::Committing;
    }

    /// Queue `payload` while committing; hand it back when idle.
    pub fn defer(&mut self, payload: Dispatchable) -> Option<Dispatchable> {
        match self.phase {
            CyclePhase::Committing => {
                self.queue.push_back(payload);
                None
            }
            CyclePhase::Idle => Some(payload),
        }
    }

    /// Close the window and take everything queued during it, in order.
    ///
    /// The queue is empty afterwards, so anything dispatched while the taken
    /// entries replay belongs to the next window.
    pub fn finish(&mut self) -> Vec<Dispatchable> {
        self.phase = CyclePhase::Idle;
        std::mem::take(&mut self.queue).into()
    }

    /// Close the window without draining; queued entries wait for the next one.
    pub fn abort(&mut self) {
        self.phase = CyclePhase::Idle;
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use serde_json::Value;

    fn action(name: &str) -> Dispatchable {
        Action::new("store", name, Value::Null).into()
    }

    fn name_of(payload: &Dispatchable) -> &str {
        match payload {
            Dispatchable::Single(action) => &action.name,
            Dispatchable::Chain(_) => "chain",
        }
    }

    #[test]
    fn idle_hands_payload_back() {
        let mut cycle = UpdateCycle::new();
        assert!(cycle.defer(action("a")).is_some());
        assert_eq!(cycle.pending(), 0);
    }

    #[test]
    fn committing_queues_in_order() {
        let mut cycle = UpdateCycle::new();
        cycle.begin();
        assert!(cycle.defer(action("a")).is_none());
        assert!(cycle.defer(action("b")).is_none());
        assert_eq!(cycle.pending(), 2);

        let drained = cycle.finish();
        assert_eq!(cycle.phase(), CyclePhase::Idle);
        assert_eq!(cycle.pending(), 0);
        let names: Vec<_> = drained.iter().map(name_of).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn abort_keeps_queue() {
        let mut cycle = UpdateCycle::new();
        cycle.begin();
        cycle.defer(action("a"));
        cycle.abort();
        assert!(!cycle.is_committing());
        assert_eq!(cycle.pending(), 1);
    }
}
