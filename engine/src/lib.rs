//! MC Job Driver Core - Rust Engine
//!
//! Generates simulated neutrino-interaction events by propagating a flux of
//! incoming particles through a detector geometry, deciding by rejection
//! sampling whether and where each particle interacts, selecting the struck
//! material and handing back a full interaction record.
//!
//! # Architecture
//!
//! - **models**: Domain types (flux particle, path-length ledger, record, retry signal, event log)
//! - **interfaces**: Capability traits of the flux, geometry and cross-section collaborators
//! - **probability**: Interaction probabilities, `P_max` normalization, cross-section tables
//! - **selection**: Target material selection
//! - **pool**: Sub-generators keyed by initial state
//! - **driver**: Configuration and the per-event generation loop
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. The acceptance ratio `P_total / P_max` is never clamped: `P_total > P_max` is reported
//! 2. All randomness is deterministic (seeded RNG, one stream per driver)
//! 3. Every flux particle is used for exactly one attempt
//! 4. Retry handling is bounded

// Module declarations
pub mod driver;
pub mod interfaces;
pub mod models;
pub mod pool;
pub mod probability;
pub mod rng;
pub mod selection;

// Re-exports for convenience
pub use driver::{
    ConfigError, DriverError, DriverSettings, DriverState, DriverStats, JobDriver, RunConfiguration, RunContext,
    RunSummary,
};
pub use interfaces::{CrossSectionModel, FluxSource, GeometryAnalyzer};
pub use models::{
    pdg, DriverEvent, EventLog, FluxParticle, FourVector, InteractionRecord, KinematicVar, Kinematics, LedgerError,
    MaterialId, ParticleCatalog, PathLengthEntry, PathLengthLedger, PdgCode, ResumeAction, RetrySignal,
    TargetMaterial, UnphysicalMask, ValidityFlags, NO_STEP_BACK, UNBOUNDED_PATH_LENGTH,
};
pub use pool::{GeneratorPool, PoolError, SubGenerator};
pub use probability::{EstimationPolicy, ProbabilityError, ProbabilityEvaluator, ProbabilityMode, ProbabilityTable};
pub use rng::RngManager;
pub use selection::{Selection, TargetSelector};
