use super::config::{ConfigError, SimulationConfig};
use super::event::Event;
use super::event_scheduler::{EventScheduler, SchedulerError};
use super::lanes::{LaneError, LaneSet};
use super::types::{Customer, IdAllocator, Tick};
use super::variates;
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fatal defects detected during a run.
///
/// Unlike [`ConfigError`] these are not user-recoverable: they mean the
/// engine itself scheduled something impossible, and they carry the counters
/// and lane state at the moment of failure for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    /// A departure fired against an empty lane.
    LaneUnderflow {
        source: LaneError,
        snapshot: Snapshot,
    },
    /// The event queue was drained out from under the run loop.
    Scheduler(SchedulerError),
    /// One of the bookkeeping invariants failed at termination.
    InvariantViolation {
        invariant: &'static str,
        snapshot: Snapshot,
    },
    /// `run` was called before arrivals were generated, or twice.
    WrongPhase { operation: &'static str },
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::LaneUnderflow { source, snapshot } => {
                write!(f, "{} (state: {:?})", source, snapshot)
            }
            SimulationError::Scheduler(source) => write!(f, "{}", source),
            SimulationError::InvariantViolation {
                invariant,
                snapshot,
            } => {
                write!(f, "invariant violated: {} (state: {:?})", invariant, snapshot)
            }
            SimulationError::WrongPhase { operation } => {
                write!(f, "'{}' called in the wrong engine phase", operation)
            }
        }
    }
}

impl std::error::Error for SimulationError {}

/// Point-in-time view of the run, handed to the `on_step` observer after
/// every processed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub events_processed: u64,
    pub total_events: u64,
    pub arrivals_processed: u64,
    pub departures_processed: u64,
    /// Current occupancy of each lane, in lane order.
    pub lane_lengths: Vec<usize>,
    /// Longest any lane has been at any point so far.
    pub longest_line: usize,
}

/// Final counters returned once the event queue drains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    /// Size of the customer population this run drew.
    pub customer_count: u64,
    pub events_processed: u64,
    pub arrivals_processed: u64,
    pub departures_processed: u64,
    pub longest_line: usize,
}

/// Lifecycle of one engine instance. Transitions are one-directional; an
/// engine runs exactly one simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Configured,
    ArrivalsGenerated,
    Running,
    Completed,
}

/// The discrete-event simulation engine for one store run.
///
/// Owns the event scheduler, the lane set and the id allocator exclusively;
/// the random source stays with the caller so identically seeded runs are
/// reproducible and concurrent runs never interfere.
pub struct Engine {
    config: SimulationConfig,
    phase: Phase,
    scheduler: EventScheduler,
    lanes: LaneSet,
    ids: IdAllocator,
    customer_count: u64,
    events_processed: u64,
    arrivals_processed: u64,
    departures_processed: u64,
    longest_line: usize,
}

impl Engine {
    /// Validate `config` and build an engine in the `Configured` phase.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let lanes = LaneSet::new(config.lanes);
        Ok(Self {
            config,
            phase: Phase::Configured,
            scheduler: EventScheduler::new(),
            lanes,
            ids: IdAllocator::new(),
            customer_count: 0,
            events_processed: 0,
            arrivals_processed: 0,
            departures_processed: 0,
            longest_line: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Events still waiting in the scheduler, in unspecified order.
    pub fn pending_events(&self) -> impl Iterator<Item = &Event> {
        self.scheduler.iter()
    }

    /// Draw the customer population and pre-schedule every arrival.
    ///
    /// The population size is Poisson with the configured expected count;
    /// each customer gets a uniform arrival tick within store hours and a
    /// service duration from the configured model.
    pub fn generate_arrivals<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), ConfigError> {
        if self.phase != Phase::Configured {
            return Err(ConfigError::WrongPhase {
                operation: "generate_arrivals",
            });
        }

        let opening = self.config.opening_time;
        let closing = self.config.effective_closing();
        let count = variates::poisson(rng, self.config.expected_customers as f64);

        for _ in 0..count {
            let arrived_at = rng.gen_range(opening..closing);
            debug_assert!((opening..closing).contains(&arrived_at));
            let service_time = variates::service_duration(
                rng,
                self.config.expected_service_time,
                self.config.service_model,
            );
            let customer = Customer {
                id: self.ids.next_id(),
                arrived_at,
                service_time,
            };
            self.scheduler.push(Event::Arrival {
                timestamp: arrived_at,
                customer,
            });
        }

        self.customer_count = count;
        self.phase = Phase::ArrivalsGenerated;
        debug!(
            "generated {} arrivals in [{}, {})",
            count, opening, closing
        );
        Ok(())
    }

    /// Pre-schedule one arrival with a fixed timestamp and service duration.
    ///
    /// Bypasses the variate generators; this is the seam deterministic tests
    /// and replay tooling use instead of [`Engine::generate_arrivals`].
    pub fn push_arrival(&mut self, timestamp: Tick, service_time: Tick) -> Result<(), ConfigError> {
        if !matches!(self.phase, Phase::Configured | Phase::ArrivalsGenerated) {
            return Err(ConfigError::WrongPhase {
                operation: "push_arrival",
            });
        }
        let customer = Customer {
            id: self.ids.next_id(),
            arrived_at: timestamp,
            service_time,
        };
        self.scheduler.push(Event::Arrival {
            timestamp,
            customer,
        });
        self.customer_count += 1;
        self.phase = Phase::ArrivalsGenerated;
        Ok(())
    }

    /// Drain the event queue in timestamp order.
    ///
    /// `on_step` runs synchronously after every processed event and is the
    /// only coupling point to any presentation layer; whatever pacing it
    /// imposes is invisible to the simulation's logic. Verifies the
    /// bookkeeping invariants before returning the final statistics.
    pub fn run<F>(&mut self, mut on_step: F) -> Result<Statistics, SimulationError>
    where
        F: FnMut(&Snapshot),
    {
        if self.phase != Phase::ArrivalsGenerated {
            return Err(SimulationError::WrongPhase { operation: "run" });
        }
        self.phase = Phase::Running;

        while !self.scheduler.is_empty() {
            let event = self.scheduler.pop_min().map_err(SimulationError::Scheduler)?;
            self.events_processed += 1;

            match event {
                Event::Arrival { timestamp, customer } => {
                    self.process_arrival(timestamp, customer);
                    self.longest_line = self.longest_line.max(self.lanes.max_length());
                }
                Event::Departure { timestamp, lane } => {
                    self.process_departure(timestamp, lane)?;
                }
            }

            debug_assert!(self.arrivals_processed >= self.departures_processed);
            debug_assert_eq!(
                self.lanes.total_waiting() as u64,
                self.arrivals_processed - self.departures_processed
            );

            on_step(&self.snapshot());
        }

        self.verify_invariants()?;
        self.phase = Phase::Completed;

        let stats = self.statistics();
        info!(
            "run complete: {} customers, {} events, longest line {}",
            stats.customer_count, stats.events_processed, stats.longest_line
        );
        Ok(stats)
    }

    /// Route the customer to the shortest lane and schedule its departure.
    fn process_arrival(&mut self, timestamp: Tick, customer: Customer) {
        self.arrivals_processed += 1;

        let lane = self.lanes.shortest_lane();
        self.lanes.enqueue(lane, customer.id);

        let departs_at = timestamp + customer.service_time;
        self.scheduler.push(Event::Departure {
            timestamp: departs_at,
            lane,
        });
        debug!(
            "t={}: customer {} joins lane {}, departs at {}",
            timestamp, customer.id, lane, departs_at
        );
    }

    /// Remove the head customer from the departing lane.
    fn process_departure(&mut self, timestamp: Tick, lane: usize) -> Result<(), SimulationError> {
        let customer = self
            .lanes
            .dequeue(lane)
            .map_err(|source| SimulationError::LaneUnderflow {
                source,
                snapshot: self.snapshot(),
            })?;
        self.departures_processed += 1;
        debug!("t={}: customer {} leaves lane {}", timestamp, customer, lane);
        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            events_processed: self.events_processed,
            total_events: 2 * self.customer_count,
            arrivals_processed: self.arrivals_processed,
            departures_processed: self.departures_processed,
            lane_lengths: self.lanes.lengths(),
            longest_line: self.longest_line,
        }
    }

    fn statistics(&self) -> Statistics {
        Statistics {
            customer_count: self.customer_count,
            events_processed: self.events_processed,
            arrivals_processed: self.arrivals_processed,
            departures_processed: self.departures_processed,
            longest_line: self.longest_line,
        }
    }

    /// Termination bookkeeping: every arrival matched by a departure, the
    /// expected event total reached, and every lane drained.
    fn verify_invariants(&self) -> Result<(), SimulationError> {
        let violated = if self.arrivals_processed != self.customer_count {
            Some("arrivals processed != customer count")
        } else if self.departures_processed != self.customer_count {
            Some("departures processed != customer count")
        } else if self.events_processed != 2 * self.customer_count {
            Some("events processed != 2 x customer count")
        } else if self.events_processed != self.arrivals_processed + self.departures_processed {
            Some("events processed != arrivals + departures")
        } else if self.lanes.total_waiting() != 0 {
            Some("customers left waiting after the queue drained")
        } else {
            None
        };

        match violated {
            Some(invariant) => Err(SimulationError::InvariantViolation {
                invariant,
                snapshot: self.snapshot(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_config() -> SimulationConfig {
        SimulationConfig::new(8 * 3600, 20 * 3600, 300, 50, 3)
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = SimulationConfig::new(0, 100, 60, 10, 0);
        assert!(matches!(Engine::new(config), Err(ConfigError::NoLanes)));
    }

    #[test]
    fn run_before_generate_is_a_phase_error() {
        let mut engine = Engine::new(small_config()).unwrap();
        let result = engine.run(|_| {});
        assert!(matches!(
            result,
            Err(SimulationError::WrongPhase { operation: "run" })
        ));
    }

    #[test]
    fn generate_arrivals_twice_is_a_phase_error() {
        let mut engine = Engine::new(small_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        engine.generate_arrivals(&mut rng).unwrap();
        assert!(matches!(
            engine.generate_arrivals(&mut rng),
            Err(ConfigError::WrongPhase { .. })
        ));
    }

    #[test]
    fn run_terminates_with_matched_counters() {
        let mut engine = Engine::new(small_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        engine.generate_arrivals(&mut rng).unwrap();

        let stats = engine.run(|_| {}).unwrap();
        assert_eq!(stats.arrivals_processed, stats.customer_count);
        assert_eq!(stats.departures_processed, stats.customer_count);
        assert_eq!(stats.events_processed, 2 * stats.customer_count);
    }

    #[test]
    fn conservation_holds_after_every_event() {
        let mut engine = Engine::new(small_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        engine.generate_arrivals(&mut rng).unwrap();

        engine
            .run(|snapshot| {
                let waiting: usize = snapshot.lane_lengths.iter().sum();
                assert_eq!(
                    waiting as u64,
                    snapshot.arrivals_processed - snapshot.departures_processed
                );
            })
            .unwrap();
    }

    #[test]
    fn second_run_is_rejected() {
        let mut engine = Engine::new(small_config()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        engine.generate_arrivals(&mut rng).unwrap();
        engine.run(|_| {}).unwrap();
        assert!(matches!(
            engine.run(|_| {}),
            Err(SimulationError::WrongPhase { .. })
        ));
    }
}
