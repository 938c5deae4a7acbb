//! The alarm state machine.
//!
//! Two states, `ok` and `alarm`, re-evaluated once per probe cycle per
//! check. Transitions happen only on edges — a check that keeps failing
//! stays in `alarm` without producing further events, so notifications fire
//! exactly once per transition, never once per failing probe.

use upwatch_core::AlarmState;

/// A state transition produced by one evaluated probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmEvent {
    /// `ok` → `alarm`: the check started failing.
    Raised,
    /// `alarm` → `ok`: the check recovered.
    Resolved,
}

impl AlarmEvent {
    /// The state this event moves the check into.
    pub fn target_state(self) -> AlarmState {
        match self {
            AlarmEvent::Raised => AlarmState::Alarm,
            AlarmEvent::Resolved => AlarmState::Ok,
        }
    }
}

/// Decide whether an evaluated probe transitions the alarm state.
///
/// `failed` is whether the evaluator produced a failure reason. Returns
/// `None` when the probe confirms the current state.
pub fn transition(current: AlarmState, failed: bool) -> Option<AlarmEvent> {
    match (current, failed) {
        (AlarmState::Ok, true) => Some(AlarmEvent::Raised),
        (AlarmState::Alarm, false) => Some(AlarmEvent::Resolved),
        (AlarmState::Ok, false) | (AlarmState::Alarm, true) => None,
    }
}
