//! Per-automation run gating: a tick arriving while a run for the same
//! automation is in flight must not start a second one.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Default, Clone)]
pub struct RunGate {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Held for the duration of a run; releases the automation id on drop.
pub struct RunPermit {
    id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the run slot for an automation, or `None` when a run for
    /// that id is already in flight. Different ids never contend.
    pub fn try_acquire(&self, id: &str) -> Option<RunPermit> {
        let mut in_flight = self.in_flight.lock().unwrap();
        if in_flight.insert(id.to_string()) {
            Some(RunPermit {
                id: id.to_string(),
                in_flight: Arc::clone(&self.in_flight),
            })
        } else {
            None
        }
    }
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_refused_while_held() {
        let gate = RunGate::new();
        let permit = gate.try_acquire("a1");
        assert!(permit.is_some());
        assert!(gate.try_acquire("a1").is_none());
    }

    #[test]
    fn test_released_on_drop() {
        let gate = RunGate::new();
        drop(gate.try_acquire("a1"));
        assert!(gate.try_acquire("a1").is_some());
    }

    #[test]
    fn test_distinct_ids_do_not_contend() {
        let gate = RunGate::new();
        let _p1 = gate.try_acquire("a1");
        assert!(gate.try_acquire("a2").is_some());
    }
}
