use super::types::{Customer, Tick};

/// A timestamped simulation event.
///
/// The variant set is closed: the dispatch loop matches exhaustively and no
/// other event kind can ever enter the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A customer enters the store and joins a checkout lane.
    Arrival { timestamp: Tick, customer: Customer },
    /// The customer at the head of `lane` finishes checkout and leaves.
    Departure { timestamp: Tick, lane: usize },
}

impl Event {
    pub fn timestamp(&self) -> Tick {
        match self {
            Event::Arrival { timestamp, .. } => *timestamp,
            Event::Departure { timestamp, .. } => *timestamp,
        }
    }
}
