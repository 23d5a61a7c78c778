//! Deterministic random number generation
//!
//! Uses xorshift64* for fast, reproducible sampling.
//! CRITICAL: Every random decision the driver makes (acceptance test, target
//! draw, sub-generator sampling) MUST go through this module.

mod xorshift;

pub use xorshift::RngManager;
