//! Run configuration
//!
//! A run is described by three layers:
//!
//! - [`RunContext`]: read-only objects shared by every driver of the run
//!   (particle catalog, cross-section models, sub-generator pool)
//! - [`DriverSettings`]: serializable tunables with sensible defaults
//! - [`RunConfiguration`]: the per-driver handles (flux, geometry) plus the
//!   target and species lists, assembled with chained `use_*` calls
//!
//! # Example
//!
//! ```rust,ignore
//! let config = RunConfiguration::new(context)
//!     .use_flux_driver(Box::new(flux))
//!     .use_geom_analyzer(geometry)
//!     .with_targets(vec![TargetMaterial::new(MaterialId::ion(8, 16), 1.0)])
//!     .with_species(vec![pdg::NU_MU])
//!     .use_splines(true)
//!     .allow_recursive_mode(true);
//!
//! let mut driver = JobDriver::new();
//! driver.configure(config)?;
//! ```

use crate::interfaces::{CrossSectionModel, FluxSource, GeometryAnalyzer};
use crate::models::particle::{ParticleCatalog, PdgCode, TargetMaterial};
use crate::models::record::UnphysicalMask;
use crate::pool::GeneratorPool;
use crate::probability::{EnergySpacing, EstimationPolicy, ProbabilityMode, ProbabilityTable};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read-only objects shared by all drivers of a run
pub struct RunContext {
    particles: ParticleCatalog,
    models: Arc<dyn CrossSectionModel>,
    generators: GeneratorPool,
}

impl RunContext {
    pub fn new(particles: ParticleCatalog, models: Arc<dyn CrossSectionModel>, generators: GeneratorPool) -> Self {
        Self {
            particles,
            models,
            generators,
        }
    }

    pub fn particles(&self) -> &ParticleCatalog {
        &self.particles
    }

    pub fn models(&self) -> &Arc<dyn CrossSectionModel> {
        &self.models
    }

    pub fn generators(&self) -> &GeneratorPool {
        &self.generators
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("particles", &self.particles)
            .field("generators", &self.generators)
            .finish_non_exhaustive()
    }
}

/// Driver tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSettings {
    /// Probability law used for `P_m`
    pub probability_mode: ProbabilityMode,

    /// Reaction to `P_total > P_max`
    pub estimation_policy: EstimationPolicy,

    /// Energy points of the `P_max` scan when cross sections are not tabulated
    pub pmax_scan_points: usize,

    /// Multiplier applied to the scanned `P_max` (must be >= 1)
    pub pmax_safety_factor: f64,

    /// Knots per cross-section table
    pub table_knots: usize,

    /// Step-backs allowed within one attempt before the run fails
    pub max_retries: u32,

    /// Flux draws allowed per `generate_event` call (None = unbounded)
    pub max_attempts_per_call: Option<u64>,

    /// Seed of the driver's random stream
    pub rng_seed: u64,

    /// Stream id, for drivers sharing a seed across threads
    pub stream_id: u64,

    /// Keep a [`DriverEvent`](crate::models::DriverEvent) log
    pub record_events: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            probability_mode: ProbabilityMode::Attenuation,
            estimation_policy: EstimationPolicy::ReEstimateOnce,
            pmax_scan_points: 100,
            pmax_safety_factor: 1.0,
            table_knots: 200,
            max_retries: 10,
            max_attempts_per_call: None,
            rng_seed: 12345,
            stream_id: 0,
            record_events: false,
        }
    }
}

/// Complete configuration of one driver
///
/// Consumed by [`JobDriver::configure`](crate::driver::JobDriver::configure);
/// immutable once generation starts.
pub struct RunConfiguration {
    pub(crate) context: Arc<RunContext>,
    pub(crate) flux: Option<Box<dyn FluxSource>>,
    pub(crate) geometry: Option<Arc<dyn GeometryAnalyzer>>,
    pub(crate) targets: Vec<TargetMaterial>,
    pub(crate) species: Vec<PdgCode>,
    pub(crate) unphysical_mask: UnphysicalMask,
    pub(crate) allow_recursive_mode: bool,
    pub(crate) splines: Option<EnergySpacing>,
    pub(crate) shared_table: Option<Arc<ProbabilityTable>>,
    pub(crate) max_path_lengths_file: Option<PathBuf>,
    pub(crate) settings: DriverSettings,
}

impl RunConfiguration {
    /// Empty configuration bound to a shared run context
    pub fn new(context: Arc<RunContext>) -> Self {
        Self {
            context,
            flux: None,
            geometry: None,
            targets: Vec::new(),
            species: Vec::new(),
            unphysical_mask: UnphysicalMask::default(),
            allow_recursive_mode: false,
            splines: None,
            shared_table: None,
            max_path_lengths_file: None,
            settings: DriverSettings::default(),
        }
    }

    pub fn use_flux_driver(mut self, flux: Box<dyn FluxSource>) -> Self {
        self.flux = Some(flux);
        self
    }

    pub fn use_geom_analyzer(mut self, geometry: Arc<dyn GeometryAnalyzer>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Declared target materials, in selection order
    pub fn with_targets(mut self, targets: Vec<TargetMaterial>) -> Self {
        self.targets = targets;
        self
    }

    /// Neutrino species the flux can produce
    pub fn with_species(mut self, species: Vec<PdgCode>) -> Self {
        self.species = species;
        self
    }

    /// Tabulate cross sections at configuration time (log-spaced when `log_e`)
    pub fn use_splines(mut self, log_e: bool) -> Self {
        self.splines = Some(if log_e {
            EnergySpacing::Logarithmic
        } else {
            EnergySpacing::Linear
        });
        self
    }

    /// Reuse tables built elsewhere (typically shared by parallel drivers)
    pub fn use_probability_table(mut self, table: Arc<ProbabilityTable>) -> Self {
        self.shared_table = Some(table);
        self
    }

    /// Read max path lengths from a cache file instead of asking the geometry
    pub fn use_max_path_lengths(mut self, path: impl AsRef<Path>) -> Self {
        self.max_path_lengths_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn allow_recursive_mode(mut self, allow: bool) -> Self {
        self.allow_recursive_mode = allow;
        self
    }

    /// Let records with whitelisted unphysical flags through
    pub fn filter_unphysical(mut self, mask: UnphysicalMask) -> Self {
        self.unphysical_mask = mask;
        self
    }

    pub fn with_settings(mut self, settings: DriverSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    pub fn context(&self) -> &Arc<RunContext> {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = DriverSettings::default();
        assert_eq!(settings.probability_mode, ProbabilityMode::Attenuation);
        assert_eq!(settings.estimation_policy, EstimationPolicy::ReEstimateOnce);
        assert_eq!(settings.pmax_safety_factor, 1.0);
        assert!(settings.max_attempts_per_call.is_none());
        assert!(!settings.record_events);
    }

    #[test]
    fn test_settings_json_round_trip() {
        let settings = DriverSettings {
            max_retries: 3,
            max_attempts_per_call: Some(1000),
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let restored: DriverSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, settings);
    }
}
