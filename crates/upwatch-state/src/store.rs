//! StateStore — redb-backed persistence for checks, results, and owners.
//!
//! Checks are keyed by id; result records are keyed by
//! `{health_check_id}:{created_at:020}:{result_id}` so a prefix scan per
//! check comes back in chronological order. Results are append-only; the
//! alarm state of a check only moves through [`StateStore::update_alarm_state`].

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, FixedOffset};
use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;
use uuid::Uuid;

use upwatch_core::{
    CheckOwner, CheckPatch, DailyErrorDay, HealthCheck, HealthCheckResult, NewHealthCheck,
    NewResult,
};

use crate::error::{StateError, StateResult};
use crate::tables::{CHECKS, OWNERS, RESULTS};

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(CHECKS).map_err(map_err!(Table))?;
        txn.open_table(RESULTS).map_err(map_err!(Table))?;
        txn.open_table(OWNERS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Checks ─────────────────────────────────────────────────────

    /// Create a health check with a fresh id and audit timestamps.
    pub fn create_check(&self, input: NewHealthCheck) -> StateResult<HealthCheck> {
        if input.accepted_status_codes.is_empty() {
            return Err(StateError::Invalid(
                "accepted_status_codes must not be empty".to_string(),
            ));
        }

        let now = epoch_secs();
        let check = HealthCheck {
            id: Uuid::new_v4().to_string(),
            user_id: input.user_id,
            name: input.name,
            url: input.url,
            http_method: input.http_method,
            request_body: input.request_body,
            request_headers: input.request_headers,
            content_type: input.content_type,
            follow_redirects: input.follow_redirects,
            accepted_status_codes: input.accepted_status_codes,
            auth_type: input.auth_type,
            auth: input.auth,
            alarm_state: Default::default(),
            created_at: now,
            created_by: input.created_by.clone(),
            updated_at: now,
            updated_by: input.created_by,
        };

        self.write_check(&check)?;
        debug!(check_id = %check.id, url = %check.url, "health check created");
        Ok(check)
    }

    /// Get a check by id.
    pub fn fetch_check(&self, id: &str) -> StateResult<Option<HealthCheck>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CHECKS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let check: HealthCheck =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(check))
            }
            None => Ok(None),
        }
    }

    /// List checks, optionally filtered by owner, newest-created first.
    pub fn list_checks(&self, user_id: Option<&str>) -> StateResult<Vec<HealthCheck>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CHECKS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let check: HealthCheck =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if user_id.is_none_or(|owner| check.user_id == owner) {
                results.push(check);
            }
        }
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(results)
    }

    /// Apply a partial update to a check.
    ///
    /// Unset fields keep their stored values; `updated_at`/`updated_by` are
    /// always refreshed. Fails with `NotFound` for an unknown id and with
    /// `Invalid` if the patch would empty the accepted status list.
    pub fn update_check(&self, patch: CheckPatch) -> StateResult<HealthCheck> {
        let mut check = self
            .fetch_check(&patch.id)?
            .ok_or_else(|| StateError::NotFound(format!("health check {}", patch.id)))?;

        patch.name.apply(&mut check.name);
        patch.url.apply(&mut check.url);
        patch.http_method.apply(&mut check.http_method);
        patch.request_body.apply(&mut check.request_body);
        patch.request_headers.apply(&mut check.request_headers);
        patch.content_type.apply(&mut check.content_type);
        patch.follow_redirects.apply(&mut check.follow_redirects);
        patch
            .accepted_status_codes
            .apply(&mut check.accepted_status_codes);
        patch.auth_type.apply(&mut check.auth_type);
        patch.auth.apply(&mut check.auth);
        patch.alarm_state.apply(&mut check.alarm_state);
        check.updated_at = epoch_secs();
        check.updated_by = patch.updated_by;

        if check.accepted_status_codes.is_empty() {
            return Err(StateError::Invalid(
                "accepted_status_codes must not be empty".to_string(),
            ));
        }

        self.write_check(&check)?;
        debug!(check_id = %check.id, "health check updated");
        Ok(check)
    }

    /// Move a check's alarm state, attributed to `actor`.
    ///
    /// This is the only mutation path for `alarm_state`; rule edits go
    /// through [`StateStore::update_check`] without touching it.
    pub fn update_alarm_state(
        &self,
        id: &str,
        state: upwatch_core::AlarmState,
        actor: &str,
    ) -> StateResult<HealthCheck> {
        self.update_check(CheckPatch::alarm(id, state, actor))
    }

    fn write_check(&self, check: &HealthCheck) -> StateResult<()> {
        let value = serde_json::to_vec(check).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(CHECKS).map_err(map_err!(Table))?;
            table
                .insert(check.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Results ────────────────────────────────────────────────────

    /// Persist one result record. Append-only; records are never mutated.
    pub fn create_result(&self, input: NewResult) -> StateResult<HealthCheckResult> {
        self.insert_result(input, epoch_secs())
    }

    fn insert_result(&self, input: NewResult, created_at: u64) -> StateResult<HealthCheckResult> {
        let result = HealthCheckResult {
            id: Uuid::new_v4().to_string(),
            health_check_id: input.health_check_id,
            status: input.status,
            status_code: input.status_code,
            response_time_ms: input.response_time_ms,
            response_body: input.response_body,
            response_headers: input.response_headers,
            error: input.error,
            created_at,
        };

        let key = result_key(&result.health_check_id, created_at, &result.id);
        let value = serde_json::to_vec(&result).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(RESULTS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(check_id = %result.health_check_id, failed = result.error.is_some(), "result stored");
        Ok(result)
    }

    /// List result records for a check, newest first.
    pub fn list_results(
        &self,
        check_id: &str,
        limit: Option<usize>,
    ) -> StateResult<Vec<HealthCheckResult>> {
        let mut results = self.scan_results(check_id)?;
        results.reverse();
        if let Some(limit) = limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    /// Aggregate results into local-calendar days, newest day first.
    ///
    /// A day has `has_error = true` iff any result created that day (in the
    /// given UTC offset, e.g. `+02:00`) carries a non-null error.
    pub fn daily_error_aggregate(
        &self,
        check_id: &str,
        utc_offset: &str,
    ) -> StateResult<Vec<DailyErrorDay>> {
        let offset = parse_utc_offset(utc_offset)?;
        let mut days: BTreeMap<String, bool> = BTreeMap::new();

        for result in self.scan_results(check_id)? {
            let Some(timestamp) = DateTime::from_timestamp(result.created_at as i64, 0) else {
                continue;
            };
            let day = timestamp
                .with_timezone(&offset)
                .format("%Y-%m-%d")
                .to_string();
            *days.entry(day).or_insert(false) |= result.error.is_some();
        }

        // BTreeMap iterates oldest day first; the aggregate is newest first.
        Ok(days
            .into_iter()
            .rev()
            .map(|(day, has_error)| DailyErrorDay { day, has_error })
            .collect())
    }

    /// Prefix scan of a check's results in chronological order.
    fn scan_results(&self, check_id: &str) -> StateResult<Vec<HealthCheckResult>> {
        let prefix = format!("{check_id}:");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RESULTS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(&prefix) {
                let result: HealthCheckResult =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push(result);
            }
        }
        Ok(results)
    }

    // ── Owners ─────────────────────────────────────────────────────

    /// Insert or update an owner record.
    pub fn put_owner(&self, owner: &CheckOwner) -> StateResult<()> {
        let value = serde_json::to_vec(owner).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(OWNERS).map_err(map_err!(Table))?;
            table
                .insert(owner.id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get an owner by id.
    pub fn fetch_owner(&self, owner_id: &str) -> StateResult<Option<CheckOwner>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(OWNERS).map_err(map_err!(Table))?;
        match table.get(owner_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let owner: CheckOwner =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(owner))
            }
            None => Ok(None),
        }
    }
}

/// Build the composite key for the results table.
fn result_key(check_id: &str, created_at: u64, result_id: &str) -> String {
    format!("{check_id}:{created_at:020}:{result_id}")
}

/// Parse a timezone given as a fixed UTC offset: `UTC`, `Z`, or `±HH:MM`.
fn parse_utc_offset(s: &str) -> StateResult<FixedOffset> {
    let s = s.trim();
    let invalid = || StateError::Invalid(format!("invalid UTC offset '{s}'"));

    let secs = if s.is_empty() || s.eq_ignore_ascii_case("utc") || s == "Z" {
        0
    } else {
        let (sign, rest) = if let Some(rest) = s.strip_prefix('+') {
            (1i32, rest)
        } else if let Some(rest) = s.strip_prefix('-') {
            (-1i32, rest)
        } else {
            return Err(invalid());
        };
        let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if hours > 23 || minutes > 59 {
            return Err(invalid());
        }
        sign * (hours * 3600 + minutes * 60)
    };

    FixedOffset::east_opt(secs).ok_or_else(invalid)
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
