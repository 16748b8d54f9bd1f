/// Simulation timestamp, in seconds since midnight of the day the store opens.
///
/// A run whose closing time wraps past midnight keeps counting upward rather
/// than reducing modulo a day, so timestamps stay monotone within a run.
pub type Tick = u64;

/// Seconds in one day, used to resolve closing times that wrap past midnight.
pub const SECONDS_PER_DAY: Tick = 86_400;

/// Unique per-run customer identifier, assigned monotonically starting at 1.
pub type CustomerId = u64;

/// A customer generated during arrival generation.
///
/// Owned by the lane that currently holds it; conceptually destroyed when its
/// departure event is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Customer {
    pub id: CustomerId,
    /// When the customer enters the store and joins a lane.
    pub arrived_at: Tick,
    /// How long the customer occupies the head of its lane.
    pub service_time: Tick,
}

/// Allocates customer ids for a single run.
///
/// Scoped to one engine instance so parallel runs never share counter state.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: CustomerId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn next_id(&mut self) -> CustomerId {
        self.next += 1;
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotone_from_one() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.next_id(), 1);
        assert_eq!(alloc.next_id(), 2);
        assert_eq!(alloc.next_id(), 3);
    }
}
