pub mod config;
pub mod event;
pub mod event_scheduler;
pub mod lanes;
pub mod simulation_engine;
pub mod types;
pub mod variates;
