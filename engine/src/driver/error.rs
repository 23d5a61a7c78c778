//! Error taxonomy of the job driver
//!
//! - [`ConfigError`]: fatal, reported by `configure` before any attempt (or,
//!   for problems only visible once generation runs, at the attempt that hits them)
//! - [`ProbabilityError`]: estimation inconsistencies, re-estimated once or fatal
//!   depending on [`EstimationPolicy`](crate::probability::EstimationPolicy)
//! - retry exhaustion: fatal once a sub-generator keeps stepping back
//! - [`DriverError::AttemptBudgetExhausted`]: the only recoverable error; the
//!   caller may simply ask for the next event again
//!
//! Unphysical records and flux exhaustion are not errors: the former count as
//! rejections, the latter ends the run with `Ok(None)`.

use crate::models::particle::{MaterialId, PdgCode};
use crate::pool::PoolError;
use crate::probability::ProbabilityError;
use thiserror::Error;

/// Configuration errors (always fatal)
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("No flux driver configured")]
    MissingFlux,

    #[error("No geometry analyzer configured")]
    MissingGeometry,

    #[error("Driver used before configure()")]
    NotConfigured,

    #[error("Driver is already configured")]
    AlreadyConfigured,

    #[error("No neutrino species configured")]
    NoSpecies,

    #[error("No target materials declared")]
    NoTargets,

    #[error("Species {species} is not a known neutrino")]
    UnknownSpecies { species: PdgCode },

    #[error("Flux produced species {species} which is not in the run's species list")]
    UndeclaredSpecies { species: PdgCode },

    #[error("Target material {material} declared twice")]
    DuplicateTarget { material: MaterialId },

    #[error("Invalid number density {density} for material {material}")]
    InvalidDensity { material: MaterialId, density: f64 },

    #[error("Geometry material {material} is not a declared target material")]
    UndeclaredGeometryMaterial { material: MaterialId },

    #[error("Invalid flux maximum energy {value}")]
    InvalidFluxEnergy { value: f64 },

    #[error("No sub-generator for species {species} on material {material}")]
    MissingGenerator { species: PdgCode, material: MaterialId },

    #[error("Invalid recursion settings: {0}")]
    InvalidRecursionSettings(String),

    #[error("Invalid driver settings: {0}")]
    InvalidSettings(String),

    #[error("Recursive mode not allowed, sub-generator at attempt {attempt} signalled {signal}")]
    RecursionNotAllowed { attempt: u64, signal: String },

    #[error("Max path length cache: {0}")]
    MaxPathCache(String),
}

impl From<PoolError> for ConfigError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::MissingGenerator { species, material } => {
                ConfigError::MissingGenerator { species, material }
            }
        }
    }
}

/// Errors returned by the job driver
#[derive(Debug, Error, PartialEq)]
pub enum DriverError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Interaction probability error at attempt {attempt}: {source}")]
    Estimation {
        attempt: u64,
        source: ProbabilityError,
    },

    #[error("Retry limit {limit} exceeded at attempt {attempt} (last signal: {reason})")]
    RetryLimitExceeded {
        attempt: u64,
        limit: u32,
        reason: String,
    },

    #[error("Invalid retry signal at attempt {attempt}: {signal}")]
    InvalidRetrySignal { attempt: u64, signal: String },

    #[error("Geometry placed no vertex in material {material} at attempt {attempt}")]
    VertexPlacement { attempt: u64, material: MaterialId },

    #[error("No event accepted within {limit} attempts")]
    AttemptBudgetExhausted { limit: u64 },

    #[error("Driver stopped after a fatal error")]
    DriverFailed,
}

impl DriverError {
    /// True when the run cannot continue
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DriverError::AttemptBudgetExhausted { .. })
    }

    /// True for configuration-class failures
    pub fn is_configuration(&self) -> bool {
        matches!(self, DriverError::Configuration(_))
    }
}
