//! Mock collaborators shared by the integration tests

#![allow(dead_code)]

use mc_job_driver_core_rs::{
    pdg, CrossSectionModel, DriverSettings, FluxParticle, FluxSource, FourVector, GeneratorPool, GeometryAnalyzer,
    InteractionRecord, KinematicVar, Kinematics, MaterialId, ParticleCatalog, PathLengthLedger, PdgCode,
    RetrySignal, RngManager, RunConfiguration, RunContext, SubGenerator, TargetMaterial, ValidityFlags,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const C12: MaterialId = MaterialId::ion(6, 12);
pub const O16: MaterialId = MaterialId::ion(8, 16);
pub const AR40: MaterialId = MaterialId::ion(18, 40);

// ============================================================================
// Flux
// ============================================================================

/// Replays a fixed list of particles, counting draws
pub struct VecFlux {
    particles: VecDeque<FluxParticle>,
    max_energy: f64,
    draws: Arc<AtomicUsize>,
}

impl VecFlux {
    pub fn new(particles: Vec<FluxParticle>, max_energy: f64) -> Self {
        Self {
            particles: particles.into(),
            max_energy,
            draws: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// `count` identical particles of `species` through the detector centre
    pub fn mono(species: PdgCode, energy: f64, count: usize) -> Self {
        let particles = (0..count)
            .map(|_| FluxParticle::new(species, FourVector::along_z(energy), FourVector::default(), energy))
            .collect();
        Self::new(particles, energy)
    }

    pub fn draw_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.draws)
    }
}

impl FluxSource for VecFlux {
    fn next_particle(&mut self) -> Option<FluxParticle> {
        let particle = self.particles.pop_front()?;
        self.draws.fetch_add(1, Ordering::SeqCst);
        Some(particle)
    }

    fn max_energy(&self) -> f64 {
        self.max_energy
    }
}

/// Particle at transverse position `x` (the slab geometry misses |x| > 1)
pub fn particle_at(species: PdgCode, energy: f64, x: f64, max_energy: f64) -> FluxParticle {
    FluxParticle::new(
        species,
        FourVector::along_z(energy),
        FourVector::new(x, 0.0, -10.0, 0.0),
        max_energy,
    )
}

// ============================================================================
// Geometry
// ============================================================================

/// Stack of slabs crossed along z by every ray with |x| <= 1
pub struct SlabGeometry {
    lengths: Vec<(MaterialId, f64)>,
    max_lengths: Vec<(MaterialId, f64)>,
    vertex_calls: AtomicUsize,
}

impl SlabGeometry {
    /// Max lengths equal to the lengths of a central ray
    pub fn new(lengths: Vec<(MaterialId, f64)>) -> Self {
        Self::with_max_lengths(lengths.clone(), lengths)
    }

    pub fn with_max_lengths(lengths: Vec<(MaterialId, f64)>, max_lengths: Vec<(MaterialId, f64)>) -> Self {
        Self {
            lengths,
            max_lengths,
            vertex_calls: AtomicUsize::new(0),
        }
    }

    pub fn vertex_calls(&self) -> usize {
        self.vertex_calls.load(Ordering::SeqCst)
    }
}

impl GeometryAnalyzer for SlabGeometry {
    fn target_materials(&self) -> Vec<MaterialId> {
        self.lengths.iter().map(|(m, _)| *m).collect()
    }

    fn max_path_lengths(&self) -> PathLengthLedger {
        let mut ledger = PathLengthLedger::new();
        for &(m, l) in &self.max_lengths {
            ledger.set(m, l).unwrap();
        }
        ledger
    }

    fn path_lengths(&self, position: &FourVector, _momentum: &FourVector) -> PathLengthLedger {
        let inside = position.x.abs() <= 1.0;
        let mut ledger = PathLengthLedger::new();
        for &(m, l) in &self.lengths {
            ledger.set(m, if inside { l } else { 0.0 }).unwrap();
        }
        ledger
    }

    fn vertex(&self, position: &FourVector, _momentum: &FourVector, material: MaterialId) -> Option<FourVector> {
        self.vertex_calls.fetch_add(1, Ordering::SeqCst);
        let index = self.lengths.iter().position(|(m, l)| *m == material && *l > 0.0)?;
        Some(FourVector::new(position.x, position.y, index as f64, position.t))
    }
}

// ============================================================================
// Cross sections
// ============================================================================

/// Energy-independent cross section per material
pub struct FlatXSec {
    values: HashMap<MaterialId, f64>,
}

impl FlatXSec {
    pub fn new(values: Vec<(MaterialId, f64)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl CrossSectionModel for FlatXSec {
    fn cross_section(&self, _species: PdgCode, material: MaterialId, _momentum: &FourVector) -> f64 {
        self.values.get(&material).copied().unwrap_or(0.0)
    }
}

/// Cross section rising linearly with energy
pub struct LinearXSec {
    pub slope: f64,
}

impl CrossSectionModel for LinearXSec {
    fn cross_section(&self, _species: PdgCode, _material: MaterialId, momentum: &FourVector) -> f64 {
        self.slope * momentum.energy()
    }
}

/// Cross section falling as `scale / E`, largest at low energy
pub struct InverseXSec {
    pub scale: f64,
}

impl CrossSectionModel for InverseXSec {
    fn cross_section(&self, _species: PdgCode, _material: MaterialId, momentum: &FourVector) -> f64 {
        self.scale / momentum.energy()
    }
}

// ============================================================================
// Sub-generators
// ============================================================================

/// Always succeeds, drawing one uniform for y
#[derive(Default)]
pub struct Elastic {
    pub calls: AtomicUsize,
}

impl SubGenerator for Elastic {
    fn generate(
        &self,
        particle: &FluxParticle,
        target: MaterialId,
        vertex: &FourVector,
        rng: &mut RngManager,
    ) -> Result<InteractionRecord, RetrySignal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let kinematics = Kinematics::new().with(KinematicVar::Y, rng.next_f64());
        Ok(InteractionRecord::new(particle.clone(), target, kinematics, *vertex))
    }
}

/// Flags every `period`-th record with `flags`
pub struct Flagging {
    pub period: usize,
    pub flags: ValidityFlags,
    calls: AtomicUsize,
}

impl Flagging {
    pub fn new(period: usize, flags: ValidityFlags) -> Self {
        Self {
            period,
            flags,
            calls: AtomicUsize::new(0),
        }
    }
}

impl SubGenerator for Flagging {
    fn generate(
        &self,
        particle: &FluxParticle,
        target: MaterialId,
        vertex: &FourVector,
        _rng: &mut RngManager,
    ) -> Result<InteractionRecord, RetrySignal> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let record = InteractionRecord::new(particle.clone(), target, Kinematics::new(), *vertex);
        if call % self.period == 0 {
            Ok(record.with_flags(self.flags))
        } else {
            Ok(record)
        }
    }
}

/// Plays back scripted signals, then succeeds
pub struct Scripted {
    script: Mutex<VecDeque<RetrySignal>>,
    pub calls: AtomicUsize,
}

impl Scripted {
    pub fn new(signals: Vec<RetrySignal>) -> Self {
        Self {
            script: Mutex::new(signals.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SubGenerator for Scripted {
    fn generate(
        &self,
        particle: &FluxParticle,
        target: MaterialId,
        vertex: &FourVector,
        _rng: &mut RngManager,
    ) -> Result<InteractionRecord, RetrySignal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(signal) => Err(signal),
            None => Ok(InteractionRecord::new(
                particle.clone(),
                target,
                Kinematics::new().with(KinematicVar::Q2, 0.5),
                *vertex,
            )),
        }
    }
}

/// Never completes: steps back `depth` on every call
pub struct AlwaysStepBack {
    pub depth: usize,
    pub calls: AtomicUsize,
}

impl AlwaysStepBack {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SubGenerator for AlwaysStepBack {
    fn generate(
        &self,
        _particle: &FluxParticle,
        _target: MaterialId,
        _vertex: &FourVector,
        _rng: &mut RngManager,
    ) -> Result<InteractionRecord, RetrySignal> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RetrySignal::step_back("no phase space", self.depth))
    }
}

// ============================================================================
// Assembly helpers
// ============================================================================

/// Context with one generator serving every `species × materials` pair
pub fn context_with(
    models: Arc<dyn CrossSectionModel>,
    species: &[PdgCode],
    materials: &[MaterialId],
    generator: Arc<dyn SubGenerator>,
) -> Arc<RunContext> {
    let mut pool = GeneratorPool::new();
    pool.register_all(species, materials, generator);
    Arc::new(RunContext::new(ParticleCatalog::with_neutrinos(), models, pool))
}

/// Unit-density targets in the given order
pub fn unit_targets(materials: &[MaterialId]) -> Vec<TargetMaterial> {
    materials.iter().map(|m| TargetMaterial::new(*m, 1.0)).collect()
}

/// Configuration with every handle set; settings record events
pub fn full_config(
    context: Arc<RunContext>,
    flux: Box<dyn FluxSource>,
    geometry: Arc<dyn GeometryAnalyzer>,
    materials: &[MaterialId],
) -> RunConfiguration {
    RunConfiguration::new(context)
        .use_flux_driver(flux)
        .use_geom_analyzer(geometry)
        .with_targets(unit_targets(materials))
        .with_species(vec![pdg::NU_MU])
        .with_settings(DriverSettings {
            record_events: true,
            ..Default::default()
        })
}
