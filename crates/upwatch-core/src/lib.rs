//! upwatch-core — domain types for the upwatch monitoring service.
//!
//! Holds the shared vocabulary of the system: registered health checks,
//! probe reports (the wire form of one probe's outcome), persisted result
//! records, and the pure acceptance evaluator that classifies a probe
//! outcome against a check's rules.
//!
//! Everything here is serializable and free of I/O; the storage, probing,
//! and transport crates all depend on this one.

pub mod check;
pub mod evaluate;
pub mod patch;
pub mod report;
pub mod result;

pub use check::{AlarmState, CheckList, CheckOwner, HealthCheck, NewHealthCheck};
pub use evaluate::evaluate;
pub use patch::{CheckPatch, Field};
pub use report::{HttpOutcome, HttpResponseData, ProbeReport};
pub use result::{DailyErrorDay, HealthCheckResult, NewResult};

/// Header carrying the pre-shared token on the internal API surface.
pub const AUTH_TOKEN_HEADER: &str = "x-upwatch-token";
