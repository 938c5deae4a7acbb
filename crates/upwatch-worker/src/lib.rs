//! upwatch-worker — drives probe cycles against the active check set.
//!
//! A single long-lived runner loop triggers one cycle per interval (with an
//! immediate cycle at startup). Within a cycle, probes fan out as one task
//! per check; each task probes its endpoint and submits the report to the
//! control plane. The control plane is an abstract seam: an HTTP client for
//! workers deployed apart from storage, or an in-process wrapper around the
//! store and pipeline for standalone deployments.

pub mod control_plane;
pub mod error;
pub mod runner;

pub use control_plane::{ControlPlane, HttpControlPlane, LocalControlPlane};
pub use error::{WorkerError, WorkerResult};
pub use runner::Runner;
