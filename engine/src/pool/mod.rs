//! Event-generation pool
//!
//! Maps each `(species, target material)` initial state onto the sub-generator
//! that produces full kinematics once the driver has accepted an interaction.
//!
//! The pool is assembled once, before generation starts, and is read-only
//! afterwards. A sampled pair with no registered sub-generator is a
//! configuration error; the driver never retries it.

use crate::models::particle::{FluxParticle, FourVector, MaterialId, PdgCode};
use crate::models::record::InteractionRecord;
use crate::models::retry::RetrySignal;
use crate::rng::RngManager;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by pool lookups
#[derive(Debug, Error, PartialEq)]
pub enum PoolError {
    #[error("No sub-generator registered for species {species} on material {material}")]
    MissingGenerator { species: PdgCode, material: MaterialId },
}

/// Generator of full interaction kinematics for one initial state
///
/// Returns a [`RetrySignal`] instead of a record when it cannot complete the
/// interaction. Implementations draw all their randomness from `rng`, the
/// stream of the driver that called them.
pub trait SubGenerator: Send + Sync {
    fn generate(
        &self,
        particle: &FluxParticle,
        target: MaterialId,
        vertex: &FourVector,
        rng: &mut RngManager,
    ) -> Result<InteractionRecord, RetrySignal>;
}

/// Pool of sub-generators keyed by initial state
///
/// # Example
/// ```
/// use mc_job_driver_core_rs::pool::{GeneratorPool, SubGenerator};
/// use mc_job_driver_core_rs::{
///     FluxParticle, FourVector, InteractionRecord, Kinematics, MaterialId, RetrySignal, RngManager,
/// };
/// use std::sync::Arc;
///
/// struct Elastic;
///
/// impl SubGenerator for Elastic {
///     fn generate(
///         &self,
///         particle: &FluxParticle,
///         target: MaterialId,
///         vertex: &FourVector,
///         _rng: &mut RngManager,
///     ) -> Result<InteractionRecord, RetrySignal> {
///         Ok(InteractionRecord::new(particle.clone(), target, Kinematics::new(), *vertex))
///     }
/// }
///
/// let c12 = MaterialId::ion(6, 12);
/// let mut pool = GeneratorPool::new();
/// pool.register(14, c12, Arc::new(Elastic));
///
/// assert!(pool.get(14, c12).is_ok());
/// assert!(pool.get(-14, c12).is_err());
/// ```
#[derive(Clone, Default)]
pub struct GeneratorPool {
    generators: BTreeMap<(PdgCode, MaterialId), Arc<dyn SubGenerator>>,
}

impl GeneratorPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the sub-generator of one initial state
    pub fn register(&mut self, species: PdgCode, material: MaterialId, generator: Arc<dyn SubGenerator>) {
        self.generators.insert((species, material), generator);
    }

    /// Register one sub-generator for every `species × materials` pair
    pub fn register_all(
        &mut self,
        species: &[PdgCode],
        materials: &[MaterialId],
        generator: Arc<dyn SubGenerator>,
    ) {
        for &s in species {
            for &m in materials {
                self.register(s, m, Arc::clone(&generator));
            }
        }
    }

    /// Sub-generator of one initial state
    pub fn get(&self, species: PdgCode, material: MaterialId) -> Result<&Arc<dyn SubGenerator>, PoolError> {
        self.generators
            .get(&(species, material))
            .ok_or(PoolError::MissingGenerator { species, material })
    }

    pub fn contains(&self, species: PdgCode, material: MaterialId) -> bool {
        self.generators.contains_key(&(species, material))
    }

    /// Pairs of `species × materials` without a sub-generator, in sorted order
    pub fn missing_pairs(&self, species: &[PdgCode], materials: &[MaterialId]) -> Vec<(PdgCode, MaterialId)> {
        let mut missing = Vec::new();
        for &s in species {
            for &m in materials {
                if !self.contains(s, m) {
                    missing.push((s, m));
                }
            }
        }
        missing.sort();
        missing.dedup();
        missing
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl std::fmt::Debug for GeneratorPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorPool")
            .field("pairs", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}
