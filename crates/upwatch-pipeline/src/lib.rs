//! upwatch-pipeline — the single result-ingestion pipeline.
//!
//! Every probe report, whatever transport it arrived by, flows through one
//! component: evaluate against the check's rules, persist the result
//! record, drive the two-state alarm machine, and notify the owner on
//! transition edges only. Keeping one pipeline prevents the evaluation and
//! notification logic from drifting between entry points.

pub mod alarm;
pub mod error;
pub mod notify;
pub mod pipeline;

pub use alarm::{AlarmEvent, transition};
pub use error::{PipelineError, PipelineResult};
pub use notify::{AlarmNotice, LogNotifier, Notifier, NotifyError};
pub use pipeline::{IngestOutcome, ResultPipeline};
