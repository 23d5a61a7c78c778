//! Interaction-probability evaluator
//!
//! For a material `m` crossed over a length `L_m`, with number density `rho_m`
//! and cross section `sigma`:
//!
//! ```text
//! Attenuation:  P_m = 1 - exp(-rho_m * sigma * L_m)
//! Linear:       P_m = rho_m * sigma * L_m          (fast, may exceed 1)
//! ```
//!
//! The driver accepts an attempt with probability `P_total / P_max`, where
//! `P_total = sum_m P_m` and `P_max` is the worst case over the run (largest
//! cross section up to the flux maximum energy, longest path through every
//! material). `P_total > P_max` means the normalization was underestimated and
//! is reported as [`ProbabilityError::Inconsistent`]; the ratio is never clamped.

use crate::interfaces::CrossSectionModel;
use crate::models::particle::{FluxParticle, FourVector, MaterialId, PdgCode, TargetMaterial};
use crate::models::path_length::PathLengthLedger;
use crate::probability::table::{ProbabilityTable, ENERGY_FLOOR_FRACTION};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Probability law applied to `rho * sigma * L`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProbabilityMode {
    /// Exact attenuation law
    #[default]
    Attenuation,
    /// First-order approximation, not bounded by 1
    Linear,
}

/// What to do when an attempt exceeds `P_max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EstimationPolicy {
    /// Rebuild `P_max` once per run, fail on the next inconsistency
    #[default]
    ReEstimateOnce,
    /// Fail immediately
    Fatal,
}

/// Errors raised while evaluating probabilities
#[derive(Debug, Error, PartialEq)]
pub enum ProbabilityError {
    #[error("Path length reported for undeclared material {material}")]
    UndeclaredMaterial { material: MaterialId },

    #[error("Interaction probability {p_total} exceeds P_max {p_max} at E = {energy}")]
    Inconsistent { p_total: f64, p_max: f64, energy: f64 },

    #[error("Invalid maximum interaction probability {value}")]
    InvalidMaximum { value: f64 },
}

/// Per-material interaction probabilities of one attempt
///
/// Entries follow the declaration order of the run's target materials.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionProbabilities {
    entries: Vec<(MaterialId, f64)>,
    total: f64,
}

impl InteractionProbabilities {
    /// Build from `(material, P_m)` pairs in declaration order
    pub fn from_entries(entries: Vec<(MaterialId, f64)>) -> Self {
        let total = entries.iter().map(|(_, p)| p).sum();
        Self { entries, total }
    }

    pub fn get(&self, material: MaterialId) -> f64 {
        self.entries
            .iter()
            .find(|(m, _)| *m == material)
            .map_or(0.0, |(_, p)| *p)
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn entries(&self) -> &[(MaterialId, f64)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.total <= 0.0
    }
}

/// Evaluates interaction probabilities for one run configuration
#[derive(Clone)]
pub struct ProbabilityEvaluator {
    mode: ProbabilityMode,
    materials: Vec<TargetMaterial>,
    models: Arc<dyn CrossSectionModel>,
    table: Option<Arc<ProbabilityTable>>,
    scan_points: usize,
    safety_factor: f64,
}

impl ProbabilityEvaluator {
    /// Evaluator calling the model bank directly
    pub fn new(mode: ProbabilityMode, materials: Vec<TargetMaterial>, models: Arc<dyn CrossSectionModel>) -> Self {
        Self {
            mode,
            materials,
            models,
            table: None,
            scan_points: 100,
            safety_factor: 1.0,
        }
    }

    /// Interpolate cross sections from `table` where it covers the energy
    pub fn with_table(mut self, table: Arc<ProbabilityTable>) -> Self {
        self.table = Some(table);
        self
    }

    /// Energy points of the `P_max` scan and multiplicative safety margin
    pub fn with_scan(mut self, scan_points: usize, safety_factor: f64) -> Self {
        self.scan_points = scan_points.max(1);
        self.safety_factor = safety_factor;
        self
    }

    pub fn mode(&self) -> ProbabilityMode {
        self.mode
    }

    pub fn uses_table(&self) -> bool {
        self.table.is_some()
    }

    pub fn table(&self) -> Option<&Arc<ProbabilityTable>> {
        self.table.as_ref()
    }

    pub fn materials(&self) -> &[TargetMaterial] {
        &self.materials
    }

    pub fn number_density(&self, material: MaterialId) -> Option<f64> {
        self.materials
            .iter()
            .find(|t| t.id == material)
            .map(|t| t.number_density)
    }

    /// Cross section from the table if it covers `momentum`, else from the models
    ///
    /// Negative or NaN model output reads as zero.
    pub fn cross_section(&self, species: PdgCode, material: MaterialId, momentum: &FourVector) -> f64 {
        let tabulated = self
            .table
            .as_ref()
            .and_then(|t| t.evaluate(species, material, momentum.energy()));
        let sigma = match tabulated {
            Some(sigma) => sigma,
            None => self.models.cross_section(species, material, momentum),
        };
        sigma.max(0.0)
    }

    /// Probability of interacting over `length` in the active mode
    pub fn interaction_probability(&self, sigma: f64, density: f64, length: f64) -> f64 {
        self.apply_law(density * sigma * length)
    }

    fn apply_law(&self, exponent: f64) -> f64 {
        match self.mode {
            ProbabilityMode::Attenuation => -(-exponent).exp_m1(),
            ProbabilityMode::Linear => exponent,
        }
    }

    /// Per-material probabilities for one particle and its ledger
    pub fn evaluate(
        &self,
        particle: &FluxParticle,
        ledger: &PathLengthLedger,
    ) -> Result<InteractionProbabilities, ProbabilityError> {
        if let Some(material) = ledger.materials().find(|m| self.number_density(*m).is_none()) {
            return Err(ProbabilityError::UndeclaredMaterial { material });
        }

        // column densities rho_m * L_m, in ledger order
        let mut columns: Vec<(MaterialId, f64)> = Vec::with_capacity(self.materials.len());
        ledger.for_each_weighted(
            |m| self.number_density(m).unwrap_or(0.0),
            |m, column| columns.push((m, column)),
        );

        let entries = self
            .materials
            .iter()
            .map(|target| {
                let column = columns
                    .iter()
                    .find(|(m, _)| *m == target.id)
                    .map_or(0.0, |(_, c)| *c);
                let p = if column > 0.0 {
                    let sigma = self.cross_section(particle.pdg(), target.id, particle.momentum());
                    self.apply_law(sigma * column)
                } else {
                    0.0
                };
                (target.id, p)
            })
            .collect();

        Ok(InteractionProbabilities::from_entries(entries))
    }

    /// Worst-case interaction probability of the run
    ///
    /// For every species, sums `P(sigma_max, rho_m, L_max)` over the declared
    /// materials and keeps the largest sum, scaled by the safety factor.
    pub fn compute_max_interaction_probability(
        &self,
        species: &[PdgCode],
        max_lengths: &PathLengthLedger,
        max_energy: f64,
    ) -> Result<f64, ProbabilityError> {
        self.scan_max(species, max_lengths, max_energy, None)
    }

    /// Rebuild `P_max` so that it covers `particle` and its `ledger`
    ///
    /// Path-length maxima are widened to the attempt's lengths and the cross
    /// section at the particle's momentum joins the scan, so the result bounds
    /// the attempt that triggered the re-estimation.
    pub fn reestimate_max_interaction_probability(
        &self,
        species: &[PdgCode],
        max_lengths: &PathLengthLedger,
        max_energy: f64,
        particle: &FluxParticle,
        ledger: &PathLengthLedger,
    ) -> Result<(f64, PathLengthLedger), ProbabilityError> {
        let mut widened = max_lengths.clone();
        for entry in ledger.iter() {
            if entry.length > widened.get(entry.material) {
                widened
                    .set(entry.material, entry.length)
                    .map_err(|_| ProbabilityError::InvalidMaximum { value: entry.length })?;
            }
        }
        let energy = max_energy.max(particle.energy());
        let p_max = self.scan_max(species, &widened, energy, Some(particle))?;
        Ok((p_max, widened))
    }

    /// Acceptance probability `p_total / p_max` of one attempt
    ///
    /// # Example
    /// ```
    /// use mc_job_driver_core_rs::probability::{ProbabilityError, ProbabilityEvaluator};
    ///
    /// assert_eq!(ProbabilityEvaluator::acceptance_ratio(0.25, 0.5, 1.0), Ok(0.5));
    /// assert!(matches!(
    ///     ProbabilityEvaluator::acceptance_ratio(0.6, 0.5, 1.0),
    ///     Err(ProbabilityError::Inconsistent { .. })
    /// ));
    /// ```
    pub fn acceptance_ratio(p_total: f64, p_max: f64, energy: f64) -> Result<f64, ProbabilityError> {
        if !(p_max.is_finite() && p_max > 0.0) {
            return Err(ProbabilityError::InvalidMaximum { value: p_max });
        }
        if p_total > p_max {
            return Err(ProbabilityError::Inconsistent {
                p_total,
                p_max,
                energy,
            });
        }
        Ok(p_total / p_max)
    }

    fn scan_max(
        &self,
        species: &[PdgCode],
        max_lengths: &PathLengthLedger,
        max_energy: f64,
        extra: Option<&FluxParticle>,
    ) -> Result<f64, ProbabilityError> {
        let mut p_max: f64 = 0.0;

        for &s in species {
            let mut p_sum = 0.0;
            for target in &self.materials {
                let length = max_lengths.get(target.id);
                if length <= 0.0 {
                    continue;
                }
                let mut sigma_max = self.max_cross_section(s, target.id, max_energy);
                if let Some(particle) = extra.filter(|p| p.pdg() == s) {
                    sigma_max = sigma_max.max(self.cross_section(s, target.id, particle.momentum()));
                }
                p_sum += self.interaction_probability(sigma_max, target.number_density, length);
            }
            p_max = p_max.max(p_sum);
        }

        let p_max = p_max * self.safety_factor;
        if !(p_max.is_finite() && p_max > 0.0) {
            return Err(ProbabilityError::InvalidMaximum { value: p_max });
        }
        Ok(p_max)
    }

    /// Largest cross section over `[floor, max_energy]`
    ///
    /// A table spanning the whole range answers directly. Otherwise the
    /// models are scanned on a linear grid, which resolves the top of the
    /// range, and on a log grid down to the energy floor, which resolves
    /// cross sections rising towards low energy.
    fn max_cross_section(&self, species: PdgCode, material: MaterialId, max_energy: f64) -> f64 {
        let floor = max_energy * ENERGY_FLOOR_FRACTION;
        let table = self.table.as_ref().and_then(|t| t.get(species, material));
        if let Some(table) = table {
            if table.covers(floor, max_energy) {
                return table.max_value();
            }
        }

        let n = self.scan_points;
        let linear = (1..=n).map(|i| max_energy * i as f64 / n as f64);
        let (low, high) = (floor.ln(), max_energy.ln());
        let logarithmic = (0..n).map(move |i| {
            let step = if n > 1 { i as f64 / (n - 1) as f64 } else { 1.0 };
            (low + (high - low) * step).exp()
        });
        let lowest_knot = table
            .map(|t| t.min_energy())
            .filter(|e| *e > 0.0 && *e <= max_energy);

        linear
            .chain(logarithmic)
            .chain(lowest_knot)
            .chain(std::iter::once(floor))
            .map(|energy| self.cross_section(species, material, &FourVector::along_z(energy)))
            .fold(0.0, f64::max)
    }
}

impl std::fmt::Debug for ProbabilityEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbabilityEvaluator")
            .field("mode", &self.mode)
            .field("materials", &self.materials)
            .field("uses_table", &self.table.is_some())
            .field("scan_points", &self.scan_points)
            .field("safety_factor", &self.safety_factor)
            .finish()
    }
}
