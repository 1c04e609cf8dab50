//! cellsift-stats - Statistical function library for cellsift
//!
//! This crate provides the fixed set of functions available inside filter
//! expressions:
//!
//! - **Aggregates**: mean, std, var, min, max, median, sum, count, percentile
//! - **Elementwise transforms**: abs, sqrt, log, log10
//!
//! # Design Philosophy
//!
//! Measurement tables routinely contain degenerate values (zero-area objects,
//! missing intensities stored as NaN). Every function here is tolerant of
//! them: aggregates skip non-finite entries instead of failing, and the
//! elementwise transforms clamp their inputs so `sqrt` and `log` never
//! produce NaN or -inf for real measurement data.
//!
//! The registry in [`registry`] is the closed, compile-time-populated list of
//! everything an expression is allowed to call.

pub mod aggregate;
pub mod elementwise;
pub mod registry;

pub use aggregate::*;
pub use elementwise::*;
pub use registry::*;

// Setup UniFFI when the feature is enabled
#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
