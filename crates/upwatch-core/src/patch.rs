//! Partial updates to a health check.
//!
//! Each optional field carries an explicit presence marker so that
//! "leave unchanged" and "set to null" are distinct operations. The state
//! store translates a patch into the actual record mutation.

use std::collections::HashMap;

use crate::check::{AlarmState, CheckId};

/// Presence marker for one patched field.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Field<T> {
    /// Leave the stored value unchanged.
    #[default]
    Keep,
    /// Replace the stored value.
    Set(T),
}

impl<T> Field<T> {
    /// Apply this field to a mutable slot, replacing it only when set.
    pub fn apply(self, slot: &mut T) {
        if let Field::Set(value) = self {
            *slot = value;
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Field::Set(_))
    }
}

/// A partial update to one health check. Unset fields keep their stored
/// values; `updated_by` is always recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckPatch {
    pub id: CheckId,
    pub name: Field<Option<String>>,
    pub url: Field<String>,
    pub http_method: Field<String>,
    pub request_body: Field<Option<String>>,
    pub request_headers: Field<Option<HashMap<String, String>>>,
    pub content_type: Field<Option<String>>,
    pub follow_redirects: Field<bool>,
    pub accepted_status_codes: Field<Vec<String>>,
    pub auth_type: Field<Option<String>>,
    pub auth: Field<Option<serde_json::Value>>,
    pub alarm_state: Field<AlarmState>,
    pub updated_by: String,
}

impl CheckPatch {
    /// An empty patch for the given check (no fields set).
    pub fn new(id: impl Into<CheckId>, updated_by: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            updated_by: updated_by.into(),
            ..Default::default()
        }
    }

    /// A patch that only moves the alarm state, attributed to `actor`.
    pub fn alarm(
        id: impl Into<CheckId>,
        state: AlarmState,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            alarm_state: Field::Set(state),
            ..Self::new(id, actor)
        }
    }
}
