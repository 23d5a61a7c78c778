//! Job Driver Engine
//!
//! Turns a flux source, a detector geometry and a bank of cross-section models
//! into an unbiased sample of interaction records.
//!
//! # Architecture
//!
//! Every call to [`JobDriver::generate_event`] runs attempts until one produces
//! a record or the flux runs dry:
//!
//! ```text
//! For each attempt:
//! 1. Draw the next flux particle            (exhausted → DONE)
//! 2. Path lengths along its ray             (total miss → REJECTED)
//! 3. P_total, acceptance test P_total/P_max (failed → REJECTED)
//! 4. Select target, place vertex, generate kinematics
//! 5. Handle retry signals                   (fast-forward / step-back N)
//! 6. Filter unphysical records              (not whitelisted → REJECTED)
//! 7. Hand the record to the caller          (ACCEPTED)
//! ```
//!
//! # State machine
//!
//! ```text
//! UNCONFIGURED → CONFIGURED → ATTEMPTING → {ACCEPTED, REJECTED} → (ATTEMPTING | DONE)
//!                                   any fatal error → FAILED
//! ```
//!
//! # Determinism
//!
//! All randomness goes through one seeded [`RngManager`]: the acceptance test
//! and the target draw each take one uniform, sub-generators draw from the
//! same stream. Same seed + same collaborators = identical sample.

use crate::driver::config::{DriverSettings, RunConfiguration, RunContext};
use crate::driver::error::{ConfigError, DriverError};
use crate::driver::max_path::load_max_path_lengths;
use crate::interfaces::{FluxSource, GeometryAnalyzer};
use crate::models::event::{DriverEvent, EventLog};
use crate::models::particle::{FluxParticle, FourVector, MaterialId, PdgCode, TargetMaterial};
use crate::models::path_length::PathLengthLedger;
use crate::models::record::{InteractionRecord, UnphysicalMask};
use crate::models::retry::ResumeAction;
use crate::probability::{
    EstimationPolicy, InteractionProbabilities, ProbabilityError, ProbabilityEvaluator, ProbabilityMode,
    ProbabilityTable,
};
use crate::rng::RngManager;
use crate::selection::{Selection, TargetSelector};
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Public State & Diagnostics
// ============================================================================

/// Driver state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverState {
    Unconfigured,
    Configured,
    Attempting,
    Accepted,
    Rejected,
    /// Flux exhausted (terminal, success)
    Done,
    /// A fatal error stopped the run (terminal)
    Failed,
}

/// Diagnostic counters
///
/// After running to the end of the flux:
/// `flux_draws == accepted + rejected()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverStats {
    /// Particles drawn from the flux (one attempt each)
    pub flux_draws: u64,

    /// Attempts whose ray missed the detector
    pub geometry_misses: u64,

    /// Attempts failing the acceptance test
    pub probability_rejections: u64,

    /// Attempts whose record was filtered as unphysical
    pub unphysical_rejections: u64,

    /// Records handed to the caller (fast-forwarded ones included)
    pub accepted: u64,

    /// Records produced by a fast-forward signal
    pub fast_forwards: u64,

    /// Step-back retries performed
    pub step_backs: u64,

    /// Times P_max was rebuilt
    pub reestimations: u64,
}

impl DriverStats {
    /// Total rejected attempts
    pub fn rejected(&self) -> u64 {
        self.geometry_misses + self.probability_rejections + self.unphysical_rejections
    }
}

/// Serializable run bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub state: DriverState,
    pub rng_seed: u64,
    pub stream_id: u64,
    pub probability_mode: Option<ProbabilityMode>,
    pub uses_tables: bool,
    pub p_max: Option<f64>,
    pub max_energy: Option<f64>,
    pub stats: DriverStats,
}

/// Counters plus the optional event log
#[derive(Debug, Default)]
struct Diagnostics {
    stats: DriverStats,
    events: EventLog,
    record_events: bool,
}

impl Diagnostics {
    fn log(&mut self, event: DriverEvent) {
        if self.record_events {
            self.events.log(event);
        }
    }
}

// ============================================================================
// Attempt Internals
// ============================================================================

/// Sub-steps of an accepted attempt, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    SelectTarget = 0,
    PlaceVertex = 1,
    GenerateKinematics = 2,
}

impl Stage {
    /// Stage to resume from after discarding the last `depth` sub-steps
    ///
    /// The failing stage counts as the first discarded one; deeper requests
    /// stop at target selection.
    fn rewind(self, depth: usize) -> Stage {
        match (self as usize + 1).saturating_sub(depth) {
            0 => Stage::SelectTarget,
            1 => Stage::PlaceVertex,
            _ => Stage::GenerateKinematics,
        }
    }
}

enum AttemptOutcome {
    Accepted(InteractionRecord),
    Rejected,
}

enum Generation {
    Generated(InteractionRecord),
    FastForwarded(InteractionRecord),
    NoInteraction,
}

/// Everything fixed by `configure`, plus the per-driver random stream
struct ConfiguredRun {
    context: Arc<RunContext>,
    flux: Box<dyn FluxSource>,
    geometry: Arc<dyn GeometryAnalyzer>,
    evaluator: ProbabilityEvaluator,
    selector: TargetSelector,
    species: Vec<PdgCode>,
    max_path_lengths: PathLengthLedger,
    max_energy: f64,
    p_max: f64,
    reestimated: bool,
    unphysical_mask: UnphysicalMask,
    allow_recursive_mode: bool,
    settings: DriverSettings,
    rng: RngManager,
}

impl ConfiguredRun {
    /// Run attempts until a record is produced or the flux is exhausted
    fn next_record(
        &mut self,
        diag: &mut Diagnostics,
        state: &mut DriverState,
    ) -> Result<Option<InteractionRecord>, DriverError> {
        let mut attempts_this_call: u64 = 0;

        loop {
            if let Some(limit) = self.settings.max_attempts_per_call {
                if attempts_this_call >= limit {
                    return Err(DriverError::AttemptBudgetExhausted { limit });
                }
            }
            *state = DriverState::Attempting;

            // STEP 1: FLUX
            let particle = match self.flux.next_particle() {
                Some(particle) => particle,
                None => {
                    diag.log(DriverEvent::FluxExhausted {
                        attempt: diag.stats.flux_draws,
                    });
                    info!(
                        "Flux exhausted after {} draws ({} records, {} rejections)",
                        diag.stats.flux_draws,
                        diag.stats.accepted,
                        diag.stats.rejected()
                    );
                    return Ok(None);
                }
            };
            attempts_this_call += 1;
            diag.stats.flux_draws += 1;
            let attempt = diag.stats.flux_draws;

            diag.log(DriverEvent::FluxDraw {
                attempt,
                pdg: particle.pdg(),
                energy: particle.energy(),
            });

            if !self.species.contains(&particle.pdg()) {
                return Err(ConfigError::UndeclaredSpecies {
                    species: particle.pdg(),
                }
                .into());
            }

            match self.attempt(attempt, particle, diag)? {
                AttemptOutcome::Accepted(record) => return Ok(Some(record)),
                AttemptOutcome::Rejected => *state = DriverState::Rejected,
            }
        }
    }

    /// One attempt with an already drawn particle
    fn attempt(
        &mut self,
        attempt: u64,
        particle: FluxParticle,
        diag: &mut Diagnostics,
    ) -> Result<AttemptOutcome, DriverError> {
        // STEP 2: PATH LENGTHS
        let mut ledger = self.geometry.path_lengths(particle.position(), particle.momentum());
        if ledger.is_all_zero() {
            diag.stats.geometry_misses += 1;
            diag.log(DriverEvent::GeometryMiss { attempt });
            trace!("Attempt {}: ray misses the detector", attempt);
            return Ok(AttemptOutcome::Rejected);
        }
        ledger.attach_max_lengths(&self.max_path_lengths);

        // STEP 3: ACCEPTANCE TEST
        let probabilities = self
            .evaluator
            .evaluate(&particle, &ledger)
            .map_err(|source| DriverError::Estimation { attempt, source })?;
        let ratio = self.acceptance_ratio(attempt, &particle, &ledger, &probabilities, diag)?;

        let u = self.rng.next_f64();
        if u >= ratio {
            diag.stats.probability_rejections += 1;
            diag.log(DriverEvent::ProbabilityRejection {
                attempt,
                p_total: probabilities.total(),
                p_max: self.p_max,
            });
            trace!(
                "Attempt {}: rejected (P_total = {:.6e}, P_max = {:.6e})",
                attempt,
                probabilities.total(),
                self.p_max
            );
            return Ok(AttemptOutcome::Rejected);
        }

        // STEPS 4-5: TARGET, VERTEX, KINEMATICS
        let record = match self.generate_interaction(attempt, &particle, &probabilities, diag)? {
            Generation::NoInteraction => {
                diag.stats.probability_rejections += 1;
                diag.log(DriverEvent::ProbabilityRejection {
                    attempt,
                    p_total: probabilities.total(),
                    p_max: self.p_max,
                });
                return Ok(AttemptOutcome::Rejected);
            }
            Generation::FastForwarded(record) => {
                diag.stats.fast_forwards += 1;
                record
            }
            Generation::Generated(record) => {
                // STEP 6: UNPHYSICAL FILTER
                if record.is_unphysical() && !self.unphysical_mask.passes(record.flags()) {
                    diag.stats.unphysical_rejections += 1;
                    diag.log(DriverEvent::UnphysicalDiscard {
                        attempt,
                        target: record.target(),
                        flags: record.flags(),
                    });
                    debug!(
                        "Attempt {}: discarding unphysical record on {} (flags {})",
                        attempt,
                        record.target(),
                        record.flags()
                    );
                    return Ok(AttemptOutcome::Rejected);
                }
                record
            }
        };

        // STEP 7: HAND OFF
        diag.stats.accepted += 1;
        diag.log(DriverEvent::RecordEmitted {
            attempt,
            target: record.target(),
            valid: record.is_valid(),
        });
        Ok(AttemptOutcome::Accepted(record))
    }

    /// `P_total / P_max`, applying the estimation policy on inconsistency
    fn acceptance_ratio(
        &mut self,
        attempt: u64,
        particle: &FluxParticle,
        ledger: &PathLengthLedger,
        probabilities: &InteractionProbabilities,
        diag: &mut Diagnostics,
    ) -> Result<f64, DriverError> {
        let p_total = probabilities.total();
        let energy = particle.energy();

        match ProbabilityEvaluator::acceptance_ratio(p_total, self.p_max, energy) {
            Ok(ratio) => Ok(ratio),
            Err(ProbabilityError::Inconsistent { .. })
                if self.settings.estimation_policy == EstimationPolicy::ReEstimateOnce && !self.reestimated =>
            {
                let (p_max, widened) = self
                    .evaluator
                    .reestimate_max_interaction_probability(
                        &self.species,
                        &self.max_path_lengths,
                        self.max_energy,
                        particle,
                        ledger,
                    )
                    .map_err(|source| DriverError::Estimation { attempt, source })?;

                warn!(
                    "Attempt {}: P_total = {:.6e} exceeds P_max = {:.6e} at E = {}; P_max re-estimated to {:.6e}",
                    attempt, p_total, self.p_max, energy, p_max
                );
                diag.stats.reestimations += 1;
                diag.log(DriverEvent::PmaxReestimated {
                    attempt,
                    old_p_max: self.p_max,
                    new_p_max: p_max,
                });

                self.reestimated = true;
                self.p_max = p_max;
                self.max_path_lengths = widened;
                self.max_energy = self.max_energy.max(energy);

                ProbabilityEvaluator::acceptance_ratio(p_total, self.p_max, energy)
                    .map_err(|source| DriverError::Estimation { attempt, source })
            }
            Err(source) => {
                error!("Attempt {}: {}", attempt, source);
                Err(DriverError::Estimation { attempt, source })
            }
        }
    }

    /// Select target, place vertex and generate kinematics, honouring retry signals
    fn generate_interaction(
        &mut self,
        attempt: u64,
        particle: &FluxParticle,
        probabilities: &InteractionProbabilities,
        diag: &mut Diagnostics,
    ) -> Result<Generation, DriverError> {
        let mut stage = Stage::SelectTarget;
        let mut retries: u32 = 0;
        let mut target: Option<(MaterialId, f64)> = None;
        let mut vertex: Option<FourVector> = None;

        loop {
            match stage {
                Stage::SelectTarget => {
                    match self.selector.select(probabilities, &mut self.rng) {
                        Selection::Target {
                            material,
                            probability,
                        } => {
                            target = Some((material, probability));
                            diag.log(DriverEvent::Accepted {
                                attempt,
                                target: material,
                                probability,
                                p_total: probabilities.total(),
                            });
                        }
                        Selection::NoInteraction => return Ok(Generation::NoInteraction),
                    }
                    stage = Stage::PlaceVertex;
                }

                Stage::PlaceVertex => {
                    let (material, _) = Self::selected(target)?;
                    let placed = self
                        .geometry
                        .vertex(particle.position(), particle.momentum(), material)
                        .ok_or(DriverError::VertexPlacement { attempt, material })?;
                    vertex = Some(placed);
                    stage = Stage::GenerateKinematics;
                }

                Stage::GenerateKinematics => {
                    let (material, probability) = Self::selected(target)?;
                    let placed = vertex.ok_or(DriverError::VertexPlacement { attempt, material })?;
                    let generator = self
                        .context
                        .generators()
                        .get(particle.pdg(), material)
                        .map_err(ConfigError::from)?;

                    let signal = match generator.generate(particle, material, &placed, &mut self.rng) {
                        Ok(mut record) => {
                            record.set_probabilities(probability, probabilities.total());
                            return Ok(Generation::Generated(record));
                        }
                        Err(signal) => signal,
                    };

                    if !self.allow_recursive_mode {
                        error!(
                            "Attempt {}: sub-generator signalled {} but recursive mode is off",
                            attempt, signal
                        );
                        return Err(ConfigError::RecursionNotAllowed {
                            attempt,
                            signal: signal.to_string(),
                        }
                        .into());
                    }

                    match signal.action() {
                        ResumeAction::FastForward => {
                            diag.log(DriverEvent::FastForward {
                                attempt,
                                target: material,
                                reason: signal.reason().to_string(),
                            });
                            debug!("Attempt {}: fast-forward ({})", attempt, signal.reason());
                            let mut record =
                                InteractionRecord::fast_forwarded(particle.clone(), material, placed);
                            record.set_probabilities(probability, probabilities.total());
                            return Ok(Generation::FastForwarded(record));
                        }
                        ResumeAction::StepBack { depth: 0 } => {
                            return Err(DriverError::InvalidRetrySignal {
                                attempt,
                                signal: signal.to_string(),
                            });
                        }
                        ResumeAction::StepBack { depth } => {
                            retries += 1;
                            if retries > self.settings.max_retries {
                                error!(
                                    "Attempt {}: {} step-backs exceed the limit of {}",
                                    attempt, retries, self.settings.max_retries
                                );
                                return Err(DriverError::RetryLimitExceeded {
                                    attempt,
                                    limit: self.settings.max_retries,
                                    reason: signal.reason().to_string(),
                                });
                            }
                            diag.stats.step_backs += 1;
                            diag.log(DriverEvent::StepBack {
                                attempt,
                                depth,
                                retry: retries,
                                reason: signal.reason().to_string(),
                            });

                            stage = stage.rewind(depth);
                            if stage <= Stage::PlaceVertex {
                                vertex = None;
                            }
                            if stage == Stage::SelectTarget {
                                target = None;
                            }
                            debug!(
                                "Attempt {}: step-back({}) to {:?} ({})",
                                attempt,
                                depth,
                                stage,
                                signal.reason()
                            );
                        }
                    }
                }
            }
        }
    }

    fn selected(target: Option<(MaterialId, f64)>) -> Result<(MaterialId, f64), DriverError> {
        // stages only run in order, so a target is always set past selection
        target.ok_or(DriverError::DriverFailed)
    }
}

// ============================================================================
// Job Driver
// ============================================================================

/// Monte-Carlo job driver
///
/// # Example
///
/// ```rust,ignore
/// let mut driver = JobDriver::new();
/// driver.configure(config)?;
///
/// while let Some(record) = driver.generate_event()? {
///     println!("{} on {}", record.particle().pdg(), record.target());
/// }
/// println!("{:?}", driver.stats());
/// ```
pub struct JobDriver {
    state: DriverState,
    run: Option<ConfiguredRun>,
    diagnostics: Diagnostics,
    run_id: Uuid,
    rng_seed: u64,
    stream_id: u64,
}

impl Default for JobDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl JobDriver {
    /// Unconfigured driver
    pub fn new() -> Self {
        Self {
            state: DriverState::Unconfigured,
            run: None,
            diagnostics: Diagnostics::default(),
            run_id: Uuid::new_v4(),
            rng_seed: 0,
            stream_id: 0,
        }
    }

    /// Validate `config` and prepare the run
    ///
    /// Resolves max path lengths, checks the sub-generator pool covers every
    /// initial state, builds cross-section tables if requested and computes
    /// `P_max`. Any problem is reported here, before the first attempt, and
    /// leaves the driver unconfigured.
    pub fn configure(&mut self, config: RunConfiguration) -> Result<(), DriverError> {
        if self.state != DriverState::Unconfigured {
            return Err(ConfigError::AlreadyConfigured.into());
        }

        let run = Self::prepare(config)?;

        info!(
            "Run {} configured: {} species, {} targets, E_max = {}, P_max = {:.6e}, mode {:?}, tables {}",
            self.run_id,
            run.species.len(),
            run.evaluator.materials().len(),
            run.max_energy,
            run.p_max,
            run.evaluator.mode(),
            if run.evaluator.uses_table() { "on" } else { "off" }
        );

        self.diagnostics = Diagnostics {
            record_events: run.settings.record_events,
            ..Diagnostics::default()
        };
        self.rng_seed = run.settings.rng_seed;
        self.stream_id = run.settings.stream_id;
        self.run = Some(run);
        self.state = DriverState::Configured;
        Ok(())
    }

    /// Produce the next interaction record
    ///
    /// Returns `Ok(None)` once the flux is exhausted, and on every later call.
    /// A fatal error moves the driver to [`DriverState::Failed`]; later calls
    /// then return [`DriverError::DriverFailed`].
    pub fn generate_event(&mut self) -> Result<Option<InteractionRecord>, DriverError> {
        match self.state {
            DriverState::Unconfigured => return Err(ConfigError::NotConfigured.into()),
            DriverState::Failed => return Err(DriverError::DriverFailed),
            DriverState::Done => return Ok(None),
            _ => {}
        }

        let run = self.run.as_mut().ok_or(ConfigError::NotConfigured)?;
        let result = run.next_record(&mut self.diagnostics, &mut self.state);

        match &result {
            Ok(Some(_)) => self.state = DriverState::Accepted,
            Ok(None) => self.state = DriverState::Done,
            Err(err) if err.is_fatal() => {
                error!("Run {} failed: {}", self.run_id, err);
                self.state = DriverState::Failed;
            }
            Err(err) => {
                warn!("Run {}: {}", self.run_id, err);
                self.state = DriverState::Configured;
            }
        }
        result
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn stats(&self) -> &DriverStats {
        &self.diagnostics.stats
    }

    /// Event log (empty unless `record_events` is set)
    pub fn event_log(&self) -> &EventLog {
        &self.diagnostics.events
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Current normalization of the acceptance test
    pub fn p_max(&self) -> Option<f64> {
        self.run.as_ref().map(|r| r.p_max)
    }

    pub fn max_energy(&self) -> Option<f64> {
        self.run.as_ref().map(|r| r.max_energy)
    }

    pub fn probability_mode(&self) -> Option<ProbabilityMode> {
        self.run.as_ref().map(|r| r.evaluator.mode())
    }

    pub fn max_path_lengths(&self) -> Option<&PathLengthLedger> {
        self.run.as_ref().map(|r| &r.max_path_lengths)
    }

    /// Cross-section tables in use, if any (shareable with other drivers)
    pub fn probability_table(&self) -> Option<&Arc<ProbabilityTable>> {
        self.run.as_ref().and_then(|r| r.evaluator.table())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id,
            state: self.state,
            rng_seed: self.rng_seed,
            stream_id: self.stream_id,
            probability_mode: self.probability_mode(),
            uses_tables: self.probability_table().is_some(),
            p_max: self.p_max(),
            max_energy: self.max_energy(),
            stats: self.diagnostics.stats.clone(),
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    fn prepare(config: RunConfiguration) -> Result<ConfiguredRun, DriverError> {
        let RunConfiguration {
            context,
            flux,
            geometry,
            targets,
            species,
            unphysical_mask,
            allow_recursive_mode,
            splines,
            shared_table,
            max_path_lengths_file,
            settings,
        } = config;

        Self::validate_settings(&settings, allow_recursive_mode, splines.is_some())?;

        let flux = flux.ok_or(ConfigError::MissingFlux)?;
        let geometry = geometry.ok_or(ConfigError::MissingGeometry)?;

        Self::validate_species(&context, &species)?;
        Self::validate_targets(&targets)?;

        // Every geometry material must be declared
        let geometry_materials = geometry.target_materials();
        for material in &geometry_materials {
            if !targets.iter().any(|t| t.id == *material) {
                return Err(ConfigError::UndeclaredGeometryMaterial {
                    material: *material,
                }
                .into());
            }
        }

        let max_energy = flux.max_energy();
        if !(max_energy.is_finite() && max_energy > 0.0) {
            return Err(ConfigError::InvalidFluxEnergy { value: max_energy }.into());
        }

        let max_path_lengths = match &max_path_lengths_file {
            Some(path) => {
                debug!("Reading max path lengths from {}", path.display());
                load_max_path_lengths(path, &geometry_materials)?
            }
            None => geometry.max_path_lengths(),
        };
        for material in max_path_lengths.materials() {
            if !targets.iter().any(|t| t.id == material) {
                return Err(ConfigError::UndeclaredGeometryMaterial { material }.into());
            }
        }

        // Pool must cover every initial state the geometry can produce
        let missing = context.generators().missing_pairs(&species, &geometry_materials);
        if let Some(&(species, material)) = missing.first() {
            error!(
                "{} initial states have no sub-generator, first: {} on {}",
                missing.len(),
                context.particles().name(species),
                material
            );
            return Err(ConfigError::MissingGenerator { species, material }.into());
        }

        let target_ids: Vec<MaterialId> = targets.iter().map(|t| t.id).collect();
        let table = match (shared_table, splines) {
            (Some(table), _) => Some(table),
            (None, Some(spacing)) => Some(Arc::new(ProbabilityTable::build(
                context.models().as_ref(),
                &species,
                &target_ids,
                max_energy,
                settings.table_knots,
                spacing,
            ))),
            (None, None) => None,
        };

        let mut evaluator =
            ProbabilityEvaluator::new(settings.probability_mode, targets, Arc::clone(context.models()))
                .with_scan(settings.pmax_scan_points, settings.pmax_safety_factor);
        if let Some(table) = table {
            evaluator = evaluator.with_table(table);
        }

        let p_max = evaluator
            .compute_max_interaction_probability(&species, &max_path_lengths, max_energy)
            .map_err(|source| DriverError::Estimation { attempt: 0, source })?;

        let rng = RngManager::for_stream(settings.rng_seed, settings.stream_id);

        Ok(ConfiguredRun {
            context,
            flux,
            geometry,
            evaluator,
            selector: TargetSelector::new(),
            species,
            max_path_lengths,
            max_energy,
            p_max,
            reestimated: false,
            unphysical_mask,
            allow_recursive_mode,
            settings,
            rng,
        })
    }

    fn validate_settings(
        settings: &DriverSettings,
        allow_recursive_mode: bool,
        use_splines: bool,
    ) -> Result<(), ConfigError> {
        if allow_recursive_mode && settings.max_retries == 0 {
            return Err(ConfigError::InvalidRecursionSettings(
                "recursive mode needs max_retries > 0".to_string(),
            ));
        }

        if !(settings.pmax_safety_factor.is_finite() && settings.pmax_safety_factor >= 1.0) {
            return Err(ConfigError::InvalidSettings(format!(
                "pmax_safety_factor must be >= 1, got {}",
                settings.pmax_safety_factor
            )));
        }

        if settings.pmax_scan_points == 0 {
            return Err(ConfigError::InvalidSettings(
                "pmax_scan_points must be > 0".to_string(),
            ));
        }

        if use_splines && settings.table_knots < 2 {
            return Err(ConfigError::InvalidSettings(
                "table_knots must be >= 2".to_string(),
            ));
        }

        if settings.max_attempts_per_call == Some(0) {
            return Err(ConfigError::InvalidSettings(
                "max_attempts_per_call must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_species(context: &RunContext, species: &[PdgCode]) -> Result<(), ConfigError> {
        if species.is_empty() {
            return Err(ConfigError::NoSpecies);
        }
        for &s in species {
            if !context.particles().is_neutrino(s) {
                return Err(ConfigError::UnknownSpecies { species: s });
            }
        }
        Ok(())
    }

    fn validate_targets(targets: &[TargetMaterial]) -> Result<(), ConfigError> {
        if targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }

        let mut ids = HashSet::new();
        for target in targets {
            if !ids.insert(target.id) {
                return Err(ConfigError::DuplicateTarget { material: target.id });
            }
            if !(target.number_density.is_finite() && target.number_density > 0.0) {
                return Err(ConfigError::InvalidDensity {
                    material: target.id,
                    density: target.number_density,
                });
            }
        }

        Ok(())
    }
}
