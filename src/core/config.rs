use super::types::{Tick, SECONDS_PER_DAY};
use super::variates::ServiceTimeModel;
use serde::{Deserialize, Serialize};

/// User-facing configuration errors.
///
/// These are recoverable: the caller can re-prompt and configure again, and a
/// rejected configuration never touches engine state. Defects inside a run
/// are a separate taxonomy, see
/// [`SimulationError`](super::simulation_engine::SimulationError).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The store needs at least one checkout lane.
    NoLanes,
    /// Expected service duration must be positive.
    ZeroServiceTime,
    /// Opening and closing times must be valid times of day.
    TimeOutOfRange { tick: Tick },
    /// An engine method was called outside its phase, e.g. `run` before
    /// `generate_arrivals` or `generate_arrivals` twice.
    WrongPhase { operation: &'static str },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NoLanes => write!(f, "lane count must be at least 1"),
            ConfigError::ZeroServiceTime => {
                write!(f, "expected service duration must be positive")
            }
            ConfigError::TimeOutOfRange { tick } => {
                write!(f, "{} is not a valid time of day in seconds", tick)
            }
            ConfigError::WrongPhase { operation } => {
                write!(f, "'{}' called in the wrong engine phase", operation)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for one simulation run.
///
/// Times are [`Tick`]s, seconds since midnight. A `closing_time` at or before
/// `opening_time` means the store closes after midnight (say, open 8:00,
/// close 0:00): the effective close used for arrival
/// generation is `closing_time + SECONDS_PER_DAY`, and timestamps past
/// midnight keep counting up rather than wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// When the store opens, seconds since midnight.
    pub opening_time: Tick,
    /// When the store closes, seconds since midnight; may wrap past midnight.
    pub closing_time: Tick,
    /// Mean of the service-duration distribution, in ticks.
    pub expected_service_time: Tick,
    /// Mean of the Poisson draw that sizes the customer population.
    pub expected_customers: u64,
    /// Number of parallel checkout lanes.
    pub lanes: usize,
    /// Which service-duration sampler to use.
    pub service_model: ServiceTimeModel,
}

impl SimulationConfig {
    pub fn new(
        opening_time: Tick,
        closing_time: Tick,
        expected_service_time: Tick,
        expected_customers: u64,
        lanes: usize,
    ) -> Self {
        Self {
            opening_time,
            closing_time,
            expected_service_time,
            expected_customers,
            lanes,
            service_model: ServiceTimeModel::default(),
        }
    }

    pub fn with_service_model(mut self, model: ServiceTimeModel) -> Self {
        self.service_model = model;
        self
    }

    /// Closing tick with the past-midnight wrap applied.
    pub fn effective_closing(&self) -> Tick {
        if self.closing_time > self.opening_time {
            self.closing_time
        } else {
            self.closing_time + SECONDS_PER_DAY
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lanes < 1 {
            return Err(ConfigError::NoLanes);
        }
        if self.expected_service_time == 0 {
            return Err(ConfigError::ZeroServiceTime);
        }
        for tick in [self.opening_time, self.closing_time] {
            if tick >= SECONDS_PER_DAY {
                return Err(ConfigError::TimeOutOfRange { tick });
            }
        }
        Ok(())
    }
}
