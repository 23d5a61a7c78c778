//! Path-length ledger
//!
//! Records, per target material, the distance a ray travels through it. The
//! driver rebuilds a ledger from scratch for every flux particle; nothing is
//! carried over between attempts.
//!
//! # Invariants
//!
//! 1. Path lengths are finite and non-negative (zero means the ray misses the material)
//! 2. Iteration order is the material-id order (deterministic)
//! 3. A missing material reads as length 0 and max length `+inf`

use crate::models::particle::MaterialId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Max-length sentinel returned for materials without a recorded bound
pub const UNBOUNDED_PATH_LENGTH: f64 = f64::INFINITY;

/// Errors raised while filling a ledger
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("Negative path length {length} for material {material}")]
    NegativeLength { material: MaterialId, length: f64 },

    #[error("Non-finite path length for material {material}")]
    NonFiniteLength { material: MaterialId },
}

/// One row of the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathLengthEntry {
    pub material: MaterialId,
    pub length: f64,
    /// Geometry-wide upper bound for this material, if known
    pub max_length: Option<f64>,
}

/// Ordered mapping material → path length
///
/// # Example
/// ```
/// use mc_job_driver_core_rs::{MaterialId, PathLengthLedger};
///
/// let water = MaterialId::ion(8, 16);
/// let mut ledger = PathLengthLedger::new();
/// ledger.set(water, 2.0).unwrap();
///
/// assert_eq!(ledger.get(water), 2.0);
/// assert_eq!(ledger.get(MaterialId::ion(26, 56)), 0.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathLengthLedger {
    entries: BTreeMap<MaterialId, PathLengthEntry>,
}

fn check_length(material: MaterialId, length: f64) -> Result<(), LedgerError> {
    if !length.is_finite() {
        return Err(LedgerError::NonFiniteLength { material });
    }
    if length < 0.0 {
        return Err(LedgerError::NegativeLength { material, length });
    }
    Ok(())
}

impl PathLengthLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) the path length through `material`
    pub fn set(&mut self, material: MaterialId, length: f64) -> Result<(), LedgerError> {
        check_length(material, length)?;
        self.entries
            .entry(material)
            .and_modify(|e| e.length = length)
            .or_insert(PathLengthEntry {
                material,
                length,
                max_length: None,
            });
        Ok(())
    }

    /// Record the maximum path length through `material`
    ///
    /// Adds a zero-length entry if the material is not present yet.
    pub fn set_max(&mut self, material: MaterialId, max_length: f64) -> Result<(), LedgerError> {
        check_length(material, max_length)?;
        self.entries
            .entry(material)
            .and_modify(|e| e.max_length = Some(max_length))
            .or_insert(PathLengthEntry {
                material,
                length: 0.0,
                max_length: Some(max_length),
            });
        Ok(())
    }

    /// Path length through `material`, 0 when absent
    pub fn get(&self, material: MaterialId) -> f64 {
        self.entries.get(&material).map_or(0.0, |e| e.length)
    }

    /// Maximum path length through `material`, [`UNBOUNDED_PATH_LENGTH`] when unknown
    pub fn max_length(&self, material: MaterialId) -> f64 {
        self.entries
            .get(&material)
            .and_then(|e| e.max_length)
            .unwrap_or(UNBOUNDED_PATH_LENGTH)
    }

    pub fn entry(&self, material: MaterialId) -> Option<&PathLengthEntry> {
        self.entries.get(&material)
    }

    pub fn contains(&self, material: MaterialId) -> bool {
        self.entries.contains_key(&material)
    }

    /// Copy the `length` column of `maxima` into this ledger's max-length column
    pub fn attach_max_lengths(&mut self, maxima: &PathLengthLedger) {
        for (material, entry) in self.entries.iter_mut() {
            if let Some(max) = maxima.entries.get(material) {
                entry.max_length = Some(max.length);
            }
        }
    }

    /// Visit every material with its path length scaled by `weight(material)`
    ///
    /// Used to fold per-material densities and cross sections into the
    /// path lengths without materializing an intermediate map.
    pub fn for_each_weighted<W, F>(&self, weight: W, mut callback: F)
    where
        W: Fn(MaterialId) -> f64,
        F: FnMut(MaterialId, f64),
    {
        for (material, entry) in &self.entries {
            callback(*material, entry.length * weight(*material));
        }
    }

    /// True when every recorded length is zero (the ray missed the detector)
    pub fn is_all_zero(&self) -> bool {
        self.entries.values().all(|e| e.length == 0.0)
    }

    /// Sum of path lengths over all materials
    pub fn total_length(&self) -> f64 {
        self.entries.values().map(|e| e.length).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathLengthEntry> {
        self.entries.values()
    }

    pub fn materials(&self) -> impl Iterator<Item = MaterialId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
