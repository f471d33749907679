//! Time-ordered event queue.
//!
//! Events come out earliest first. Events scheduled for the same time come
//! out in the order they were inserted, so a run is reproducible no matter
//! how the underlying heap arranges equal keys.

use crate::types::Event;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry: an event plus its insertion sequence number.
#[derive(Debug)]
struct Scheduled {
    event: Event,
    seq: u64,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: reverse both keys.
        other
            .event
            .time
            .total_cmp(&self.event.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Priority queue of pending events.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl EventQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules an event.
    pub fn insert(&mut self, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled { event, seq });
    }

    /// Removes and returns the earliest event, or `None` if the queue is empty.
    pub fn extract_min(&mut self) -> Option<Event> {
        self.heap.pop().map(|s| s.event)
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventKind, SystemId};

    fn sys(i: usize) -> SystemId {
        SystemId::from_index(i)
    }

    #[test]
    fn test_extracts_in_time_order() {
        let mut queue = EventQueue::new();
        queue.insert(Event::external_arrival(3.0, sys(0)));
        queue.insert(Event::external_arrival(1.0, sys(0)));
        queue.insert(Event::external_arrival(2.0, sys(0)));

        assert_eq!(queue.len(), 3);
        let times: Vec<f64> = std::iter::from_fn(|| queue.extract_min())
            .map(|e| e.time)
            .collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
        assert!(queue.extract_min().is_none());
    }

    #[test]
    fn test_equal_times_are_fifo() {
        let mut queue = EventQueue::new();
        queue.insert(Event::departure(5.0, sys(0), 0));
        queue.insert(Event::departure(5.0, sys(0), 1));
        queue.insert(Event::departure(5.0, sys(0), 2));
        queue.insert(Event::departure(4.0, sys(1), 9));

        assert_eq!(queue.extract_min().map(|e| e.target), Some(sys(1)));
        for expected in 0..3 {
            let event = queue.extract_min().unwrap();
            assert_eq!(event.kind, EventKind::Departure { processor: expected });
        }
    }

    #[test]
    fn test_fifo_survives_interleaved_inserts() {
        let mut queue = EventQueue::new();
        queue.insert(Event::external_arrival(1.0, sys(0)));
        queue.insert(Event::external_arrival(2.0, sys(1)));
        assert_eq!(queue.extract_min().unwrap().target, sys(0));

        // Inserted after sys(1) at the same time: must come out after it.
        queue.insert(Event::external_arrival(2.0, sys(2)));
        queue.insert(Event::external_arrival(0.5, sys(3)));

        let order: Vec<SystemId> = std::iter::from_fn(|| queue.extract_min())
            .map(|e| e.target)
            .collect();
        assert_eq!(order, vec![sys(3), sys(1), sys(2)]);
    }

    #[test]
    fn test_empty_queue() {
        let mut queue = EventQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.extract_min().is_none());
    }
}
