//! upwatch-state — embedded state store for upwatch.
//!
//! Backed by [redb](https://docs.rs/redb), persists health checks, their
//! immutable result records, and check owners. All values are
//! JSON-serialized into redb's `&[u8]` value columns; result keys embed the
//! creation timestamp so a prefix scan yields chronological order.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks. An in-memory backend exists for
//! testing.

pub mod error;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::StateStore;
