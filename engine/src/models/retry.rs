//! Retry signal raised by generation sub-stages
//!
//! A sub-generator that cannot finish an interaction returns a [`RetrySignal`]
//! instead of a record, telling the driver how to resume:
//!
//! - **fast-forward**: give up on the remaining sub-steps and hand back a
//!   minimal record flagged invalid
//! - **step-back(N)**: discard the last N sub-steps of the attempt and run them again
//!
//! Signals live only inside one attempt's control flow and are never stored.

use std::fmt;

/// Step-back depth reported by signals that do not request a step-back
pub const NO_STEP_BACK: usize = 999_999;

/// How the driver should resume the current attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeAction {
    FastForward,
    StepBack { depth: usize },
}

/// Structured resume instruction
///
/// # Example
/// ```
/// use mc_job_driver_core_rs::{RetrySignal, NO_STEP_BACK};
///
/// let signal = RetrySignal::step_back("no phase space for W", 2);
/// assert!(signal.is_step_back());
/// assert_eq!(signal.step_back_depth(), 2);
///
/// let ff = RetrySignal::fast_forward("hadronization failed");
/// assert_eq!(ff.step_back_depth(), NO_STEP_BACK);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySignal {
    reason: String,
    action: ResumeAction,
}

impl RetrySignal {
    pub fn fast_forward(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            action: ResumeAction::FastForward,
        }
    }

    pub fn step_back(reason: impl Into<String>, depth: usize) -> Self {
        Self {
            reason: reason.into(),
            action: ResumeAction::StepBack { depth },
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn action(&self) -> ResumeAction {
        self.action
    }

    pub fn is_fast_forward(&self) -> bool {
        matches!(self.action, ResumeAction::FastForward)
    }

    pub fn is_step_back(&self) -> bool {
        matches!(self.action, ResumeAction::StepBack { .. })
    }

    /// Requested depth, or [`NO_STEP_BACK`]
    pub fn step_back_depth(&self) -> usize {
        match self.action {
            ResumeAction::StepBack { depth } => depth,
            ResumeAction::FastForward => NO_STEP_BACK,
        }
    }
}

impl fmt::Display for RetrySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            ResumeAction::FastForward => write!(f, "fast-forward: {}", self.reason),
            ResumeAction::StepBack { depth } => {
                write!(f, "step-back({}): {}", depth, self.reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_forward_flags() {
        let signal = RetrySignal::fast_forward("bad remnant");
        assert!(signal.is_fast_forward());
        assert!(!signal.is_step_back());
        assert_eq!(signal.reason(), "bad remnant");
    }

    #[test]
    fn test_display_names_action() {
        let signal = RetrySignal::step_back("pauli", 1);
        assert_eq!(signal.to_string(), "step-back(1): pauli");
    }
}
