//! Job driver - per-event generation loop
//!
//! See `engine.rs` for the attempt loop and state machine.

pub mod config;
pub mod engine;
pub mod error;
pub mod max_path;

pub use config::{DriverSettings, RunConfiguration, RunContext};
pub use engine::{DriverState, DriverStats, JobDriver, RunSummary};
pub use error::{ConfigError, DriverError};
pub use max_path::{
    compute_geometry_hash, load_max_path_lengths, write_max_path_lengths, MaxPathEntry, MaxPathLengthCache,
};
