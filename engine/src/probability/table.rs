//! Tabulated cross sections
//!
//! When table usage is switched on, the driver evaluates the opaque cross-section
//! models once per `(species, material)` pair on an energy grid reaching the flux
//! maximum, then interpolates instead of calling the model for every attempt.
//! The table is built before generation and is read-only afterwards, so it can
//! be shared between drivers behind an `Arc`.

use crate::interfaces::CrossSectionModel;
use crate::models::particle::{FourVector, MaterialId, PdgCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lowest energy considered by tables and the `P_max` scan, as a fraction of the flux maximum
///
/// Log-spaced tables start here, and the scan's log grid reaches down to it.
/// Particles below the floor are only covered through re-estimation.
pub const ENERGY_FLOOR_FRACTION: f64 = 1.0e-6;

/// Spacing of the energy knots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnergySpacing {
    #[default]
    Linear,
    /// Knots evenly spaced in log E, interpolated in log E
    Logarithmic,
}

/// Cross section of one initial state sampled on an energy grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionTable {
    spacing: EnergySpacing,
    energies: Vec<f64>,
    values: Vec<f64>,
    max_value: f64,
}

impl CrossSectionTable {
    /// Sample `sigma(E)` at `knots` points up to `max_energy`
    ///
    /// Fewer than two knots cannot be interpolated and are raised to two.
    pub fn sample<F>(spacing: EnergySpacing, max_energy: f64, knots: usize, sigma: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        let knots = knots.max(2);

        let mut energies: Vec<f64> = match spacing {
            EnergySpacing::Linear => (1..=knots)
                .map(|i| max_energy * i as f64 / knots as f64)
                .collect(),
            EnergySpacing::Logarithmic => {
                let low = (max_energy * ENERGY_FLOOR_FRACTION).ln();
                let high = max_energy.ln();
                (0..knots)
                    .map(|i| (low + (high - low) * i as f64 / (knots - 1) as f64).exp())
                    .collect()
            }
        };
        // exp(ln(x)) may miss x by an ulp; pin the grid ends
        if spacing == EnergySpacing::Logarithmic {
            energies[0] = max_energy * ENERGY_FLOOR_FRACTION;
            energies[knots - 1] = max_energy;
        }
        let values: Vec<f64> = energies.iter().map(|&e| sigma(e).max(0.0)).collect();
        let max_value = values.iter().copied().fold(0.0, f64::max);

        Self {
            spacing,
            energies,
            values,
            max_value,
        }
    }

    /// Interpolated cross section, `None` outside the tabulated range
    pub fn evaluate(&self, energy: f64) -> Option<f64> {
        let first = *self.energies.first()?;
        let last = *self.energies.last()?;
        if !(first..=last).contains(&energy) {
            return None;
        }

        // index of the first knot >= energy
        let upper = self.energies.partition_point(|&e| e < energy);
        if upper == 0 {
            return Some(self.values[0]);
        }
        let lower = upper - 1;

        let (x, x0, x1) = match self.spacing {
            EnergySpacing::Linear => (energy, self.energies[lower], self.energies[upper]),
            EnergySpacing::Logarithmic => (
                energy.ln(),
                self.energies[lower].ln(),
                self.energies[upper].ln(),
            ),
        };
        let (y0, y1) = (self.values[lower], self.values[upper]);
        if x1 == x0 {
            return Some(y0);
        }
        Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
    }

    /// Largest tabulated value
    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    pub fn max_energy(&self) -> f64 {
        self.energies.last().copied().unwrap_or(0.0)
    }

    pub fn min_energy(&self) -> f64 {
        self.energies.first().copied().unwrap_or(0.0)
    }

    /// True when the grid spans `[low, high]`
    pub fn covers(&self, low: f64, high: f64) -> bool {
        !self.energies.is_empty() && self.min_energy() <= low && self.max_energy() >= high
    }

    pub fn knots(&self) -> usize {
        self.energies.len()
    }
}

/// Per-initial-state cross-section tables of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityTable {
    spacing: EnergySpacing,
    tables: BTreeMap<(PdgCode, MaterialId), CrossSectionTable>,
}

impl ProbabilityTable {
    /// Tabulate every `species × materials` pair from the model bank
    pub fn build(
        models: &dyn CrossSectionModel,
        species: &[PdgCode],
        materials: &[MaterialId],
        max_energy: f64,
        knots: usize,
        spacing: EnergySpacing,
    ) -> Self {
        let mut tables = BTreeMap::new();
        for &s in species {
            for &m in materials {
                let table = CrossSectionTable::sample(spacing, max_energy, knots, |e| {
                    models.cross_section(s, m, &FourVector::along_z(e))
                });
                tables.insert((s, m), table);
            }
        }
        log::debug!(
            "Tabulated {} cross sections up to E = {} ({:?} spacing, {} knots)",
            tables.len(),
            max_energy,
            spacing,
            knots
        );
        Self { spacing, tables }
    }

    pub fn get(&self, species: PdgCode, material: MaterialId) -> Option<&CrossSectionTable> {
        self.tables.get(&(species, material))
    }

    /// Interpolated cross section, `None` if the pair is missing or out of range
    pub fn evaluate(&self, species: PdgCode, material: MaterialId, energy: f64) -> Option<f64> {
        self.get(species, material)?.evaluate(energy)
    }

    pub fn spacing(&self) -> EnergySpacing {
        self.spacing
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_interpolation_is_exact_for_lines() {
        let table = CrossSectionTable::sample(EnergySpacing::Linear, 10.0, 11, |e| 2.0 * e);
        assert_eq!(table.knots(), 11);
        let value = table.evaluate(4.5).unwrap();
        assert!((value - 9.0).abs() < 1e-12);
        assert!((table.max_value() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_log_interpolation_is_exact_for_log_e() {
        let table = CrossSectionTable::sample(EnergySpacing::Logarithmic, 100.0, 31, |e| e.ln() + 10.0);
        let value = table.evaluate(7.0).unwrap();
        assert!((value - (7.0f64.ln() + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_is_none() {
        let table = CrossSectionTable::sample(EnergySpacing::Linear, 10.0, 10, |_| 1.0);
        assert_eq!(table.evaluate(10.5), None);
        assert_eq!(table.evaluate(0.5), None);
        assert_eq!(table.evaluate(1.0), Some(1.0));
    }

    #[test]
    fn test_too_few_knots_raised_to_two() {
        let table = CrossSectionTable::sample(EnergySpacing::Linear, 4.0, 0, |e| e);
        assert_eq!(table.knots(), 2);
        assert_eq!(table.evaluate(3.0), Some(3.0));
    }

    #[test]
    fn test_log_grid_reaches_energy_floor() {
        let table = CrossSectionTable::sample(EnergySpacing::Logarithmic, 5.0, 50, |e| 1.0 / e);
        assert_eq!(table.min_energy(), 5.0 * ENERGY_FLOOR_FRACTION);
        assert_eq!(table.max_energy(), 5.0);
        assert!(table.covers(5.0 * ENERGY_FLOOR_FRACTION, 5.0));

        let linear = CrossSectionTable::sample(EnergySpacing::Linear, 5.0, 50, |e| 1.0 / e);
        assert!(!linear.covers(5.0 * ENERGY_FLOOR_FRACTION, 5.0));
    }

    #[test]
    fn test_negative_model_values_clamped() {
        let table = CrossSectionTable::sample(EnergySpacing::Linear, 4.0, 4, |e| e - 2.5);
        assert_eq!(table.evaluate(1.0), Some(0.0));
        assert_eq!(table.max_value(), 1.5);
    }
}
