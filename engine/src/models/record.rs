//! Interaction record produced for every accepted attempt
//!
//! A record is created only after the acceptance test passes and is handed to
//! the caller by value; the driver keeps no reference to it afterwards.

use crate::models::particle::{FluxParticle, FourVector, MaterialId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kinematic variable names a sub-generator may fill in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KinematicVar {
    /// Bjorken x
    X,
    /// Inelasticity y
    Y,
    /// Momentum transfer Q²
    Q2,
    /// Hadronic invariant mass W
    W,
    /// Squared four-momentum transfer to the nucleus t
    T,
}

/// Kinematic variables of one interaction
///
/// Opaque to the driver: only sub-generators write it, only callers read it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    values: BTreeMap<KinematicVar, f64>,
}

impl Kinematics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, var: KinematicVar, value: f64) -> Self {
        self.set(var, value);
        self
    }

    pub fn set(&mut self, var: KinematicVar, value: f64) {
        self.values.insert(var, value);
    }

    pub fn get(&self, var: KinematicVar) -> Option<f64> {
        self.values.get(&var).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Bit set of reasons a generated record is unphysical
///
/// # Example
/// ```
/// use mc_job_driver_core_rs::ValidityFlags;
///
/// let flags = ValidityFlags::KINEMATICS | ValidityFlags::PAULI_BLOCKED;
/// assert!(flags.contains(ValidityFlags::PAULI_BLOCKED));
/// assert!(!flags.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ValidityFlags(u32);

impl ValidityFlags {
    pub const NONE: ValidityFlags = ValidityFlags(0);
    pub const GENERIC: ValidityFlags = ValidityFlags(1 << 0);
    pub const HADRONIC_SYSTEM: ValidityFlags = ValidityFlags(1 << 1);
    pub const KINEMATICS: ValidityFlags = ValidityFlags(1 << 2);
    pub const NO_PHASE_SPACE: ValidityFlags = ValidityFlags(1 << 3);
    pub const NO_TARGET_REMNANT: ValidityFlags = ValidityFlags(1 << 4);
    pub const PAULI_BLOCKED: ValidityFlags = ValidityFlags(1 << 5);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: ValidityFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: ValidityFlags) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for ValidityFlags {
    type Output = ValidityFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        ValidityFlags(self.0 | rhs.0)
    }
}

impl fmt::Display for ValidityFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#08b}", self.0)
    }
}

/// Whitelist of unphysical-event flags allowed through the filter
///
/// The default mask whitelists nothing: every unphysical record is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnphysicalMask(ValidityFlags);

impl UnphysicalMask {
    pub const fn none() -> Self {
        Self(ValidityFlags::NONE)
    }

    pub const fn allowing(flags: ValidityFlags) -> Self {
        Self(flags)
    }

    pub fn allowed(&self) -> ValidityFlags {
        self.0
    }

    /// True when every flag raised on the record is whitelisted
    pub fn passes(&self, flags: ValidityFlags) -> bool {
        flags.bits() & !self.0.bits() == 0
    }
}

/// One generated interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    particle: FluxParticle,
    target: MaterialId,
    kinematics: Kinematics,
    vertex: FourVector,
    flags: ValidityFlags,
    fast_forwarded: bool,
    /// Interaction probability of the struck material
    probability: f64,
    /// Summed interaction probability over all materials on the ray
    total_probability: f64,
}

impl InteractionRecord {
    /// New physical record; probabilities are filled in by the driver
    pub fn new(
        particle: FluxParticle,
        target: MaterialId,
        kinematics: Kinematics,
        vertex: FourVector,
    ) -> Self {
        Self {
            particle,
            target,
            kinematics,
            vertex,
            flags: ValidityFlags::NONE,
            fast_forwarded: false,
            probability: 0.0,
            total_probability: 0.0,
        }
    }

    /// Minimal record for an attempt abandoned by a fast-forward signal
    pub fn fast_forwarded(particle: FluxParticle, target: MaterialId, vertex: FourVector) -> Self {
        let mut record = Self::new(particle, target, Kinematics::new(), vertex);
        record.flags = ValidityFlags::GENERIC;
        record.fast_forwarded = true;
        record
    }

    pub fn with_flags(mut self, flags: ValidityFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn set_vertex(&mut self, vertex: FourVector) {
        self.vertex = vertex;
    }

    pub(crate) fn set_probabilities(&mut self, probability: f64, total: f64) {
        self.probability = probability;
        self.total_probability = total;
    }

    pub fn particle(&self) -> &FluxParticle {
        &self.particle
    }

    pub fn target(&self) -> MaterialId {
        self.target
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    pub fn vertex(&self) -> &FourVector {
        &self.vertex
    }

    pub fn flags(&self) -> ValidityFlags {
        self.flags
    }

    pub fn is_unphysical(&self) -> bool {
        !self.flags.is_empty()
    }

    /// Valid = physical and fully generated
    pub fn is_valid(&self) -> bool {
        !self.fast_forwarded && self.flags.is_empty()
    }

    pub fn is_fast_forwarded(&self) -> bool {
        self.fast_forwarded
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn total_probability(&self) -> f64 {
        self.total_probability
    }
}
