//! Emission-time validation.
//!
//! Dependency rules live on `jobs::JobGraph`; this module owns the
//! step-ordering rules applied to each emitted job.

pub mod steps;

pub use steps::{ArtifactRecord, OrderingViolation, StepOrderValidator};
