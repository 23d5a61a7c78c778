//! Interaction probabilities
//!
//! - [`table`]: tabulated cross sections built once per run
//! - [`evaluator`]: per-attempt probabilities and the `P_max` normalization of
//!   the rejection-sampling step

pub mod evaluator;
pub mod table;

pub use evaluator::{
    EstimationPolicy, InteractionProbabilities, ProbabilityError, ProbabilityEvaluator, ProbabilityMode,
};
pub use table::{CrossSectionTable, EnergySpacing, ProbabilityTable, ENERGY_FLOOR_FRACTION};
