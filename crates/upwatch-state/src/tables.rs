//! redb table definitions for the upwatch state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain
//! types).

use redb::TableDefinition;

/// Health checks keyed by `{check_id}`.
pub const CHECKS: TableDefinition<&str, &[u8]> = TableDefinition::new("checks");

/// Result records keyed by `{health_check_id}:{created_at:020}:{result_id}`.
///
/// The zero-padded timestamp makes a per-check prefix scan chronological.
pub const RESULTS: TableDefinition<&str, &[u8]> = TableDefinition::new("results");

/// Check owners keyed by `{owner_id}`.
pub const OWNERS: TableDefinition<&str, &[u8]> = TableDefinition::new("owners");
