//! Particle and material identifiers, four-vectors and flux particles
//!
//! Species are identified by PDG integer codes. Target materials are nuclei and
//! use the PDG ion convention `10LZZZAAAI`, wrapped in [`MaterialId`] so a
//! species code can never be passed where a material is expected.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// PDG particle code
pub type PdgCode = i32;

/// Well-known neutrino species codes
pub mod pdg {
    use super::PdgCode;

    pub const NU_E: PdgCode = 12;
    pub const NU_E_BAR: PdgCode = -12;
    pub const NU_MU: PdgCode = 14;
    pub const NU_MU_BAR: PdgCode = -14;
    pub const NU_TAU: PdgCode = 16;
    pub const NU_TAU_BAR: PdgCode = -16;
}

/// Target material identifier (PDG ion code `10LZZZAAAI`)
///
/// # Example
/// ```
/// use mc_job_driver_core_rs::MaterialId;
///
/// let o16 = MaterialId::ion(8, 16);
/// assert_eq!(o16.code(), 1000080160);
/// assert_eq!(o16.z(), 8);
/// assert_eq!(o16.a(), 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MaterialId(i32);

impl MaterialId {
    /// Wrap a raw ion code
    pub const fn from_code(code: i32) -> Self {
        Self(code)
    }

    /// Build the ion code for a nucleus with `z` protons and `a` nucleons
    pub const fn ion(z: i32, a: i32) -> Self {
        Self(1_000_000_000 + z * 10_000 + a * 10)
    }

    pub const fn code(self) -> i32 {
        self.0
    }

    /// Proton number
    pub const fn z(self) -> i32 {
        (self.0 / 10_000) % 1_000
    }

    /// Mass number
    pub const fn a(self) -> i32 {
        (self.0 / 10) % 1_000
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lorentz four-vector `(x, y, z, t)` used for both momenta and positions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FourVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub t: f64,
}

impl FourVector {
    pub const fn new(x: f64, y: f64, z: f64, t: f64) -> Self {
        Self { x, y, z, t }
    }

    /// Massless momentum of energy `energy` travelling along +z
    pub const fn along_z(energy: f64) -> Self {
        Self::new(0.0, 0.0, energy, energy)
    }

    /// Energy component of a momentum four-vector
    pub fn energy(&self) -> f64 {
        self.t
    }

    /// Magnitude of the spatial part
    pub fn spatial_magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// One incoming particle drawn from the flux source
///
/// Immutable once drawn; the driver makes exactly one generation attempt with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxParticle {
    pdg: PdgCode,
    momentum: FourVector,
    position: FourVector,
    max_energy: f64,
}

impl FluxParticle {
    /// Create a flux particle
    ///
    /// `max_energy` records the source's maximum energy at the time of the draw.
    /// It is informational only: the driver normalizes `P_max` with the value
    /// read from the flux source when the run is configured.
    pub fn new(pdg: PdgCode, momentum: FourVector, position: FourVector, max_energy: f64) -> Self {
        Self {
            pdg,
            momentum,
            position,
            max_energy,
        }
    }

    pub fn pdg(&self) -> PdgCode {
        self.pdg
    }

    pub fn momentum(&self) -> &FourVector {
        &self.momentum
    }

    pub fn position(&self) -> &FourVector {
        &self.position
    }

    pub fn energy(&self) -> f64 {
        self.momentum.energy()
    }

    pub fn max_energy(&self) -> f64 {
        self.max_energy
    }
}

/// Read-only particle database shared by every driver of a run
///
/// Replaces a process-wide particle table: it is built once, wrapped in the
/// run context and passed explicitly to whoever needs a lookup.
#[derive(Debug, Clone, Default)]
pub struct ParticleCatalog {
    names: BTreeMap<PdgCode, String>,
    neutrinos: Vec<PdgCode>,
}

impl ParticleCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-filled with the six neutrino species
    pub fn with_neutrinos() -> Self {
        let mut catalog = Self::new();
        catalog.add_neutrino(pdg::NU_E, "nu_e");
        catalog.add_neutrino(pdg::NU_E_BAR, "nu_e_bar");
        catalog.add_neutrino(pdg::NU_MU, "nu_mu");
        catalog.add_neutrino(pdg::NU_MU_BAR, "nu_mu_bar");
        catalog.add_neutrino(pdg::NU_TAU, "nu_tau");
        catalog.add_neutrino(pdg::NU_TAU_BAR, "nu_tau_bar");
        catalog
    }

    /// Register a neutrino species
    pub fn add_neutrino(&mut self, code: PdgCode, name: &str) {
        self.names.insert(code, name.to_string());
        if !self.neutrinos.contains(&code) {
            self.neutrinos.push(code);
        }
    }

    /// Register any other particle
    pub fn add_particle(&mut self, code: PdgCode, name: &str) {
        self.names.insert(code, name.to_string());
    }

    pub fn contains(&self, code: PdgCode) -> bool {
        self.names.contains_key(&code)
    }

    pub fn is_neutrino(&self, code: PdgCode) -> bool {
        self.neutrinos.contains(&code)
    }

    /// Human-readable name, falling back to the numeric code
    pub fn name(&self, code: PdgCode) -> String {
        self.names
            .get(&code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

/// A declared target material of the run
///
/// Declaration order is significant: the target selector walks materials in
/// exactly this order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetMaterial {
    pub id: MaterialId,
    /// Scattering centres per unit volume, in the units the cross sections and
    /// path lengths are expressed in (so that `density * sigma * length` is dimensionless)
    pub number_density: f64,
}

impl TargetMaterial {
    pub const fn new(id: MaterialId, number_density: f64) -> Self {
        Self { id, number_density }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ion_code_round_trip_z_a() {
        let fe56 = MaterialId::ion(26, 56);
        assert_eq!(fe56.code(), 1000260560);
        assert_eq!(fe56.z(), 26);
        assert_eq!(fe56.a(), 56);
    }

    #[test]
    fn test_along_z_momentum() {
        let p = FourVector::along_z(3.0);
        assert_eq!(p.energy(), 3.0);
        assert_eq!(p.spatial_magnitude(), 3.0);
    }

    #[test]
    fn test_catalog_knows_neutrinos() {
        let catalog = ParticleCatalog::with_neutrinos();
        assert!(catalog.is_neutrino(pdg::NU_MU));
        assert!(catalog.is_neutrino(pdg::NU_TAU_BAR));
        assert!(!catalog.is_neutrino(2212));
        assert_eq!(catalog.name(pdg::NU_E), "nu_e");
        assert_eq!(catalog.name(2212), "2212");
    }
}
