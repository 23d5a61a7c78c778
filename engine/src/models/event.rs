//! Event logging for generation auditing.
//!
//! This module defines the [`DriverEvent`] enum which captures every significant
//! decision the job driver takes while producing a sample. The log enables:
//! - Debugging (why was a particle rejected, which sub-step was retried)
//! - Auditing (flux draws = accepted + rejected attempts)
//! - Analysis (target composition, retry rates)
//!
//! # Event Types
//!
//! Events follow the per-attempt flow:
//! - **FluxDraw**: a new flux particle starts an attempt
//! - **GeometryMiss / ProbabilityRejection / UnphysicalDiscard**: attempt rejected
//! - **StepBack / FastForward**: a sub-generator asked the driver to resume differently
//! - **Accepted**: interaction accepted, target chosen
//! - **RecordEmitted**: record handed to the caller
//! - **PmaxReestimated**: normalization was found too small and rebuilt
//! - **FluxExhausted**: end of run
//!
//! # Example
//!
//! ```rust
//! use mc_job_driver_core_rs::models::DriverEvent;
//!
//! let event = DriverEvent::GeometryMiss { attempt: 7 };
//! assert_eq!(event.attempt(), 7);
//! assert_eq!(event.event_type(), "GeometryMiss");
//! ```

use crate::models::particle::{MaterialId, PdgCode};
use crate::models::record::ValidityFlags;

/// Driver event capturing one decision.
///
/// Every event carries the 1-based number of the flux draw it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    /// New flux particle drawn
    FluxDraw {
        attempt: u64,
        pdg: PdgCode,
        energy: f64,
    },

    /// Ray missed every material
    GeometryMiss { attempt: u64 },

    /// Acceptance test failed
    ProbabilityRejection {
        attempt: u64,
        p_total: f64,
        p_max: f64,
    },

    /// Acceptance test passed and a target was selected
    Accepted {
        attempt: u64,
        target: MaterialId,
        probability: f64,
        p_total: f64,
    },

    /// Sub-generator requested a step-back
    StepBack {
        attempt: u64,
        depth: usize,
        retry: u32,
        reason: String,
    },

    /// Sub-generator requested a fast-forward
    FastForward {
        attempt: u64,
        target: MaterialId,
        reason: String,
    },

    /// Unphysical record filtered out
    UnphysicalDiscard {
        attempt: u64,
        target: MaterialId,
        flags: ValidityFlags,
    },

    /// Record returned to the caller
    RecordEmitted {
        attempt: u64,
        target: MaterialId,
        valid: bool,
    },

    /// P_max rebuilt after an estimation inconsistency
    PmaxReestimated {
        attempt: u64,
        old_p_max: f64,
        new_p_max: f64,
    },

    /// Flux source ran dry
    FluxExhausted { attempt: u64 },
}

impl DriverEvent {
    /// Attempt number this event belongs to
    pub fn attempt(&self) -> u64 {
        match self {
            DriverEvent::FluxDraw { attempt, .. } => *attempt,
            DriverEvent::GeometryMiss { attempt } => *attempt,
            DriverEvent::ProbabilityRejection { attempt, .. } => *attempt,
            DriverEvent::Accepted { attempt, .. } => *attempt,
            DriverEvent::StepBack { attempt, .. } => *attempt,
            DriverEvent::FastForward { attempt, .. } => *attempt,
            DriverEvent::UnphysicalDiscard { attempt, .. } => *attempt,
            DriverEvent::RecordEmitted { attempt, .. } => *attempt,
            DriverEvent::PmaxReestimated { attempt, .. } => *attempt,
            DriverEvent::FluxExhausted { attempt } => *attempt,
        }
    }

    /// Short name of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            DriverEvent::FluxDraw { .. } => "FluxDraw",
            DriverEvent::GeometryMiss { .. } => "GeometryMiss",
            DriverEvent::ProbabilityRejection { .. } => "ProbabilityRejection",
            DriverEvent::Accepted { .. } => "Accepted",
            DriverEvent::StepBack { .. } => "StepBack",
            DriverEvent::FastForward { .. } => "FastForward",
            DriverEvent::UnphysicalDiscard { .. } => "UnphysicalDiscard",
            DriverEvent::RecordEmitted { .. } => "RecordEmitted",
            DriverEvent::PmaxReestimated { .. } => "PmaxReestimated",
            DriverEvent::FluxExhausted { .. } => "FluxExhausted",
        }
    }

    /// Target material if the event concerns one
    pub fn target(&self) -> Option<MaterialId> {
        match self {
            DriverEvent::Accepted { target, .. } => Some(*target),
            DriverEvent::FastForward { target, .. } => Some(*target),
            DriverEvent::UnphysicalDiscard { target, .. } => Some(*target),
            DriverEvent::RecordEmitted { target, .. } => Some(*target),
            _ => None,
        }
    }
}

/// Event log for storing and querying driver events.
///
/// This is a simple wrapper around `Vec<DriverEvent>` with convenience methods.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<DriverEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: DriverEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[DriverEvent] {
        &self.events
    }

    /// Events of a single attempt, in the order they happened
    pub fn events_for_attempt(&self, attempt: u64) -> Vec<&DriverEvent> {
        self.events.iter().filter(|e| e.attempt() == attempt).collect()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&DriverEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_target(&self, target: MaterialId) -> Vec<&DriverEvent> {
        self.events
            .iter()
            .filter(|e| e.target() == Some(target))
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
