use super::event::Event;
use super::types::Tick;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Error raised by [`EventScheduler::pop_min`] on an empty queue.
///
/// The simulation loop only pops while the queue reports non-empty, so hitting
/// this indicates a defect in the caller, not a user error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    EmptyQueue,
}

impl std::fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::EmptyQueue => write!(f, "pop_min called on an empty event queue"),
        }
    }
}

impl std::error::Error for SchedulerError {}

#[derive(Debug)]
struct ScheduledEvent {
    timestamp: Tick,
    sequence: u64,
    event: Event,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp && self.sequence == other.sequence
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default).
        // Equal timestamps fall back to insertion order, so pops are FIFO
        // among ties and runs are reproducible from a seed.
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Min-priority queue of simulation events keyed by timestamp.
pub struct EventScheduler {
    event_queue: BinaryHeap<ScheduledEvent>,
    sequence_counter: u64,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self {
            event_queue: BinaryHeap::new(),
            sequence_counter: 0,
        }
    }

    /// Insert an event, keyed by its own timestamp. O(log n).
    pub fn push(&mut self, event: Event) {
        let scheduled = ScheduledEvent {
            timestamp: event.timestamp(),
            sequence: self.sequence_counter,
            event,
        };
        self.event_queue.push(scheduled);
        self.sequence_counter += 1;
    }

    /// Remove and return the earliest event; ties break in insertion order.
    pub fn pop_min(&mut self) -> Result<Event, SchedulerError> {
        self.event_queue
            .pop()
            .map(|scheduled| scheduled.event)
            .ok_or(SchedulerError::EmptyQueue)
    }

    pub fn is_empty(&self) -> bool {
        self.event_queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.event_queue.len()
    }

    /// Iterate the queued events in unspecified (heap) order.
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.event_queue.iter().map(|scheduled| &scheduled.event)
    }
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Customer;

    fn arrival(timestamp: Tick, id: u64) -> Event {
        Event::Arrival {
            timestamp,
            customer: Customer {
                id,
                arrived_at: timestamp,
                service_time: 1,
            },
        }
    }

    #[test]
    fn pops_in_timestamp_order() {
        let mut scheduler = EventScheduler::new();
        for &t in &[50, 3, 17, 99, 3, 0, 42] {
            scheduler.push(arrival(t, t));
        }

        let mut last = 0;
        while !scheduler.is_empty() {
            let event = scheduler.pop_min().unwrap();
            assert!(event.timestamp() >= last);
            last = event.timestamp();
        }
    }

    #[test]
    fn equal_timestamps_pop_in_insertion_order() {
        let mut scheduler = EventScheduler::new();
        scheduler.push(arrival(10, 1));
        scheduler.push(arrival(10, 2));
        scheduler.push(arrival(10, 3));

        for expected_id in 1..=3 {
            match scheduler.pop_min().unwrap() {
                Event::Arrival { customer, .. } => assert_eq!(customer.id, expected_id),
                other => panic!("unexpected event: {:?}", other),
            }
        }
    }

    #[test]
    fn pop_on_empty_queue_is_an_error() {
        let mut scheduler = EventScheduler::new();
        assert_eq!(scheduler.pop_min(), Err(SchedulerError::EmptyQueue));
    }
}
