//! Outstanding-work counters driving termination
//!
//! Two non-negative integers behind one mutex: prefixes waiting for (or
//! undergoing) pagination, and objects handed to the forwarder but not yet
//! delivered to the consumer. The engine is quiescent exactly when both are
//! zero at the same observation.
//!
//! Counting discipline: work is counted BEFORE it is handed off and
//! decremented AFTER it is fully processed. Any prefix or object still in
//! the pipeline therefore keeps one of the counters non-zero, which makes a
//! quiescent observation authoritative.

use std::sync::Mutex;

#[derive(Debug, Default)]
struct Counts {
    pending_prefixes: u64,
    in_flight_objects: u64,
}

/// Shared counts of outstanding prefixes and in-flight objects.
#[derive(Debug, Default)]
pub struct WorkCounters {
    counts: Mutex<Counts>,
}

impl WorkCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `n` prefixes about to enter the pending queue.
    pub fn add_prefixes(&self, n: u64) {
        let mut counts = self.counts.lock().unwrap();
        counts.pending_prefixes += n;
    }

    /// A prefix has been paginated to exhaustion.
    pub fn finish_prefix(&self) {
        let mut counts = self.counts.lock().unwrap();
        debug_assert!(counts.pending_prefixes > 0, "prefix counter underflow");
        counts.pending_prefixes = counts.pending_prefixes.saturating_sub(1);
    }

    /// Count `n` objects about to be forwarded to the consumer.
    pub fn add_objects(&self, n: u64) {
        let mut counts = self.counts.lock().unwrap();
        counts.in_flight_objects += n;
    }

    /// An object has been delivered to the output stream.
    pub fn finish_object(&self) {
        let mut counts = self.counts.lock().unwrap();
        debug_assert!(counts.in_flight_objects > 0, "object counter underflow");
        counts.in_flight_objects = counts.in_flight_objects.saturating_sub(1);
    }

    /// True when no prefix and no object is outstanding anywhere.
    pub fn is_quiescent(&self) -> bool {
        let counts = self.counts.lock().unwrap();
        counts.pending_prefixes == 0 && counts.in_flight_objects == 0
    }

    /// Current (pending_prefixes, in_flight_objects), for logging.
    pub fn snapshot(&self) -> (u64, u64) {
        let counts = self.counts.lock().unwrap();
        (counts.pending_prefixes, counts.in_flight_objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_quiescent() {
        let counters = WorkCounters::new();
        assert!(counters.is_quiescent());
    }

    #[test]
    fn test_quiescence_requires_both_zero() {
        let counters = WorkCounters::new();

        counters.add_prefixes(1);
        assert!(!counters.is_quiescent());

        counters.add_objects(2);
        counters.finish_prefix();
        assert!(!counters.is_quiescent());

        counters.finish_object();
        counters.finish_object();
        assert!(counters.is_quiescent());
    }

    #[test]
    fn test_snapshot() {
        let counters = WorkCounters::new();
        counters.add_prefixes(3);
        counters.add_objects(5);
        counters.finish_prefix();
        assert_eq!(counters.snapshot(), (2, 5));
    }
}
