//! Max Path Lengths - external cache file
//!
//! Scanning a detector geometry for the longest path through each material is
//! expensive, so the result can be written once and read back at configuration
//! time. The file is JSON; it records a fingerprint of the geometry's material
//! list and is rejected when loaded against a different geometry.
//!
//! # Critical Invariants
//!
//! - **Geometry Matching**: fingerprint must match the configured geometry
//! - **Completeness**: every geometry material has an entry
//! - **Validity**: all lengths finite and non-negative

use crate::driver::error::ConfigError;
use crate::interfaces::GeometryAnalyzer;
use crate::models::particle::MaterialId;
use crate::models::path_length::PathLengthLedger;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

// ============================================================================
// Cache Structures
// ============================================================================

/// Serialized max path lengths of one geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxPathLengthCache {
    /// SHA256 fingerprint of the sorted geometry material list
    pub geometry_hash: String,

    /// One entry per material, sorted by material id
    pub entries: Vec<MaxPathEntry>,
}

/// Max path length through one material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaxPathEntry {
    pub material: MaterialId,
    pub max_length: f64,
}

impl MaxPathLengthCache {
    /// Capture `maxima` for a geometry made of `materials`
    pub fn from_ledger(materials: &[MaterialId], maxima: &PathLengthLedger) -> Result<Self, ConfigError> {
        let entries = maxima
            .iter()
            .map(|e| MaxPathEntry {
                material: e.material,
                max_length: e.length,
            })
            .collect();

        Ok(Self {
            geometry_hash: compute_geometry_hash(materials)?,
            entries,
        })
    }

    /// Rebuild the ledger (max lengths in the `length` column)
    pub fn to_ledger(&self) -> Result<PathLengthLedger, ConfigError> {
        let mut ledger = PathLengthLedger::new();
        for entry in &self.entries {
            ledger
                .set(entry.material, entry.max_length)
                .map_err(|e| ConfigError::MaxPathCache(e.to_string()))?;
        }
        Ok(ledger)
    }

    /// Check the cache belongs to a geometry made of `materials`
    pub fn validate(&self, materials: &[MaterialId]) -> Result<(), ConfigError> {
        let expected = compute_geometry_hash(materials)?;
        if expected != self.geometry_hash {
            return Err(ConfigError::MaxPathCache(format!(
                "geometry fingerprint mismatch: cache {}, geometry {}",
                self.geometry_hash, expected
            )));
        }

        for material in materials {
            if !self.entries.iter().any(|e| e.material == *material) {
                return Err(ConfigError::MaxPathCache(format!(
                    "no entry for material {}",
                    material
                )));
            }
        }

        Ok(())
    }

    /// Read a cache file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| {
            ConfigError::MaxPathCache(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&json).map_err(|e| {
            ConfigError::MaxPathCache(format!("cannot parse {}: {}", path.display(), e))
        })
    }

    /// Write a cache file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::MaxPathCache(format!("serialization failed: {}", e)))?;
        fs::write(path, json).map_err(|e| {
            ConfigError::MaxPathCache(format!("cannot write {}: {}", path.display(), e))
        })
    }
}

/// Compute the geometry's max path lengths and write them to `path`
pub fn write_max_path_lengths(geometry: &dyn GeometryAnalyzer, path: &Path) -> Result<MaxPathLengthCache, ConfigError> {
    let materials = geometry.target_materials();
    let cache = MaxPathLengthCache::from_ledger(&materials, &geometry.max_path_lengths())?;
    cache.save(path)?;
    log::info!(
        "Wrote max path lengths for {} materials to {}",
        cache.entries.len(),
        path.display()
    );
    Ok(cache)
}

/// Load and validate a cache file against a geometry's material list
pub fn load_max_path_lengths(path: &Path, materials: &[MaterialId]) -> Result<PathLengthLedger, ConfigError> {
    let cache = MaxPathLengthCache::load(path)?;
    cache.validate(materials)?;
    cache.to_ledger()
}

// ============================================================================
// Geometry Fingerprint
// ============================================================================

/// Compute deterministic SHA256 fingerprint of a material list
///
/// The list is sorted and deduplicated first, so the fingerprint does not
/// depend on the order the geometry reports its materials in.
pub fn compute_geometry_hash(materials: &[MaterialId]) -> Result<String, ConfigError> {
    let mut sorted: Vec<MaterialId> = materials.to_vec();
    sorted.sort();
    sorted.dedup();

    let json = serde_json::to_string(&sorted)
        .map_err(|e| ConfigError::MaxPathCache(format!("fingerprint serialization failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    let result = hasher.finalize();

    Ok(format!("{:x}", result))
}
