//! Capability interfaces of the external collaborators
//!
//! The driver consumes three collaborators it does not implement:
//!
//! - a [`FluxSource`] lazily yielding incoming particles
//! - a [`GeometryAnalyzer`] turning a ray into per-material path lengths and vertices
//! - a [`CrossSectionModel`] bank supplying opaque cross sections
//!
//! Each is a single trait layer with swappable implementations. Geometry and
//! cross-section models are read-only (`&self`) and `Send + Sync`, so one instance
//! can serve several drivers running in parallel threads. A flux source is owned
//! by exactly one driver.

use crate::models::particle::{FluxParticle, FourVector, MaterialId, PdgCode};
use crate::models::path_length::PathLengthLedger;

/// Source of incoming flux particles
///
/// # Example
///
/// ```rust
/// use mc_job_driver_core_rs::interfaces::FluxSource;
/// use mc_job_driver_core_rs::{FluxParticle, FourVector};
///
/// struct MonoEnergetic { left: usize }
///
/// impl FluxSource for MonoEnergetic {
///     fn next_particle(&mut self) -> Option<FluxParticle> {
///         if self.left == 0 {
///             return None;
///         }
///         self.left -= 1;
///         Some(FluxParticle::new(14, FourVector::along_z(2.0), FourVector::default(), 2.0))
///     }
///
///     fn max_energy(&self) -> f64 {
///         2.0
///     }
/// }
/// ```
pub trait FluxSource: Send {
    /// Draw the next particle, `None` once the source is exhausted
    ///
    /// The driver never rewinds a source; restarting is up to the caller.
    fn next_particle(&mut self) -> Option<FluxParticle>;

    /// Highest energy any particle of this run can carry
    fn max_energy(&self) -> f64;
}

/// Detector geometry analyzer
pub trait GeometryAnalyzer: Send + Sync {
    /// Materials present in the geometry
    fn target_materials(&self) -> Vec<MaterialId>;

    /// Energy-independent upper bound of the path length through each material
    fn max_path_lengths(&self) -> PathLengthLedger;

    /// Path lengths along the ray starting at `position` with direction `momentum`
    fn path_lengths(&self, position: &FourVector, momentum: &FourVector) -> PathLengthLedger;

    /// Interaction vertex inside `material` along the ray
    ///
    /// `None` when the ray does not cross the material.
    fn vertex(
        &self,
        position: &FourVector,
        momentum: &FourVector,
        material: MaterialId,
    ) -> Option<FourVector>;
}

/// Bank of cross-section models
///
/// Opaque to the driver: it only ever asks for a number.
pub trait CrossSectionModel: Send + Sync {
    /// Total cross section for `species` on `material` at four-momentum `momentum`
    fn cross_section(&self, species: PdgCode, material: MaterialId, momentum: &FourVector) -> f64;
}
