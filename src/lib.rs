pub mod core;

// Re-export commonly used types
pub use crate::core::config::{ConfigError, SimulationConfig};
pub use crate::core::event::Event;
pub use crate::core::event_scheduler::{EventScheduler, SchedulerError};
pub use crate::core::lanes::{LaneError, LaneSet};
pub use crate::core::simulation_engine::{Engine, SimulationError, Snapshot, Statistics};
pub use crate::core::types::{Customer, CustomerId, Tick, SECONDS_PER_DAY};
pub use crate::core::variates::ServiceTimeModel;
