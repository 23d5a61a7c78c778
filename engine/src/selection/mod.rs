//! Target material selection
//!
//! Discrete inverse-CDF sampling over the per-material interaction
//! probabilities of an accepted attempt:
//!
//! 1. draw `r` uniformly in `[0, P_total)`
//! 2. walk the materials in declaration order, accumulating `P_m`
//! 3. pick the first material whose running sum exceeds `r`
//!
//! One uniform per draw, fixed order: the same random stream always selects the
//! same material. Materials with `P_m = 0` can never be selected, wherever they
//! sit in the order.

use crate::models::particle::MaterialId;
use crate::probability::InteractionProbabilities;
use crate::rng::RngManager;

/// Outcome of a target draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// Struck material and its interaction probability
    Target { material: MaterialId, probability: f64 },
    /// Every material has zero probability
    NoInteraction,
}

/// Selects the struck material of an accepted attempt
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetSelector;

impl TargetSelector {
    pub fn new() -> Self {
        Self
    }

    /// Draw a material using one uniform from `rng`
    ///
    /// Consumes no randomness when there is nothing to select.
    pub fn select(&self, probabilities: &InteractionProbabilities, rng: &mut RngManager) -> Selection {
        if probabilities.is_zero() {
            return Selection::NoInteraction;
        }
        self.select_with_uniform(probabilities, rng.next_f64())
    }

    /// Draw a material for a given uniform `u` in `[0, 1)`
    ///
    /// # Example
    /// ```
    /// use mc_job_driver_core_rs::probability::InteractionProbabilities;
    /// use mc_job_driver_core_rs::selection::{Selection, TargetSelector};
    /// use mc_job_driver_core_rs::MaterialId;
    ///
    /// let a = MaterialId::ion(6, 12);
    /// let b = MaterialId::ion(8, 16);
    /// let probs = InteractionProbabilities::from_entries(vec![(a, 0.25), (b, 0.75)]);
    ///
    /// let selector = TargetSelector::new();
    /// assert!(matches!(selector.select_with_uniform(&probs, 0.2), Selection::Target { material, .. } if material == a));
    /// assert!(matches!(selector.select_with_uniform(&probs, 0.3), Selection::Target { material, .. } if material == b));
    /// ```
    pub fn select_with_uniform(&self, probabilities: &InteractionProbabilities, u: f64) -> Selection {
        let total = probabilities.total();
        if total <= 0.0 {
            return Selection::NoInteraction;
        }

        let r = u * total;
        let mut cumulative = 0.0;
        let mut last_positive = None;

        for &(material, probability) in probabilities.entries() {
            if probability <= 0.0 {
                continue;
            }
            cumulative += probability;
            last_positive = Some((material, probability));
            if cumulative > r {
                return Selection::Target {
                    material,
                    probability,
                };
            }
        }

        // rounding in the running sum can leave r just above the final cumulative value
        match last_positive {
            Some((material, probability)) => Selection::Target {
                material,
                probability,
            },
            None => Selection::NoInteraction,
        }
    }
}
