//! Domain models of the job driver

pub mod event;
pub mod particle;
pub mod path_length;
pub mod record;
pub mod retry;

// Re-exports
pub use event::{DriverEvent, EventLog};
pub use particle::{pdg, FluxParticle, FourVector, MaterialId, ParticleCatalog, PdgCode, TargetMaterial};
pub use path_length::{LedgerError, PathLengthEntry, PathLengthLedger, UNBOUNDED_PATH_LENGTH};
pub use record::{InteractionRecord, KinematicVar, Kinematics, UnphysicalMask, ValidityFlags};
pub use retry::{ResumeAction, RetrySignal, NO_STEP_BACK};
