//! Job tracking engine.
//!
//! - [`JobRegistry`]: in-memory table of jobs still in flight.
//! - [`JobTracker`]: submits jobs to the provider and runs one poll loop
//!   per job until it reaches a terminal status.

pub mod registry;
pub mod tracker;

pub use registry::JobRegistry;
pub use tracker::{JobTracker, PollSettings, DEFAULT_POLL_INTERVAL};
