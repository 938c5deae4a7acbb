//! upwatch-probe — executes HTTP probes against registered checks.
//!
//! One probe is one request built from a check's method, URL, headers, and
//! body, issued under a hard timeout and the check's redirect policy. Any
//! received status code is a valid response outcome; only network-level
//! failures (DNS, connect, TLS, timeout) become transport-failure reports.

pub mod prober;

pub use prober::ProbeClient;
