use super::types::CustomerId;
use std::collections::VecDeque;

/// Errors raised by lane operations.
///
/// An underflow means a departure was scheduled against a lane nothing ever
/// joined, which is a scheduling defect rather than a user error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaneError {
    Underflow { lane: usize },
}

impl std::fmt::Display for LaneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaneError::Underflow { lane } => {
                write!(f, "dequeue from empty checkout lane {}", lane)
            }
        }
    }
}

impl std::error::Error for LaneError {}

/// The store's parallel FIFO checkout lanes.
///
/// Mutated only by the simulation engine through `enqueue`/`dequeue`; the
/// lane count is fixed at construction.
#[derive(Debug, Clone)]
pub struct LaneSet {
    lanes: Vec<VecDeque<CustomerId>>,
}

impl LaneSet {
    pub fn new(lane_count: usize) -> Self {
        Self {
            lanes: vec![VecDeque::new(); lane_count],
        }
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Index of the lane with the fewest customers; ties go to the lowest
    /// index. Plain O(N) scan, lane counts are tens at most.
    pub fn shortest_lane(&self) -> usize {
        let mut shortest = 0;
        let mut least = usize::MAX;
        for (index, lane) in self.lanes.iter().enumerate() {
            if lane.len() < least {
                least = lane.len();
                shortest = index;
            }
        }
        shortest
    }

    pub fn enqueue(&mut self, lane: usize, customer: CustomerId) {
        self.lanes[lane].push_back(customer);
    }

    /// Remove and return the customer at the head of `lane`.
    pub fn dequeue(&mut self, lane: usize) -> Result<CustomerId, LaneError> {
        self.lanes[lane]
            .pop_front()
            .ok_or(LaneError::Underflow { lane })
    }

    /// Current occupancy of every lane, in lane order.
    pub fn lengths(&self) -> Vec<usize> {
        self.lanes.iter().map(|lane| lane.len()).collect()
    }

    /// Occupancy of the fullest lane right now.
    pub fn max_length(&self) -> usize {
        self.lanes.iter().map(|lane| lane.len()).max().unwrap_or(0)
    }

    /// Total customers currently waiting across all lanes.
    pub fn total_waiting(&self) -> usize {
        self.lanes.iter().map(|lane| lane.len()).sum()
    }
}
