//! Condition records and the idempotent in-place upsert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named observation about an object's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition kind, e.g. `"ContentValid"`. Unique within one object.
    pub condition_type: String,

    /// Whether the condition currently holds.
    pub status: bool,

    /// Short machine-readable reason code.
    pub reason: String,

    /// Human-readable diagnostic.
    pub message: String,

    /// When `status` last flipped.
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    #[inline]
    #[must_use]
    pub fn new(
        condition_type: impl Into<String>,
        status: bool,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            condition_type: condition_type.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Utc::now(),
        }
    }
}

/// Upsert a condition by type, reporting whether anything changed.
///
/// Matching conditions are updated in place. The transition time is kept
/// when the boolean status did not flip, so repeated reconciliations with
/// the same outcome produce no net change and no status write.
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) -> bool {
    match conditions
        .iter_mut()
        .find(|c| c.condition_type == condition.condition_type)
    {
        None => {
            conditions.push(condition);
            true
        }
        Some(existing) => {
            if existing.status == condition.status
                && existing.reason == condition.reason
                && existing.message == condition.message
            {
                return false;
            }
            let transition_time = if existing.status == condition.status {
                existing.last_transition_time
            } else {
                condition.last_transition_time
            };
            *existing = Condition {
                last_transition_time: transition_time,
                ..condition
            };
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_condition_inserts_new() {
        let mut conditions = Vec::new();
        assert!(set_condition(
            &mut conditions,
            Condition::new("ContentValid", true, "Ok", "fine")
        ));
        assert_eq!(conditions.len(), 1);
    }

    #[test]
    fn set_condition_is_idempotent() {
        let mut conditions = Vec::new();
        set_condition(
            &mut conditions,
            Condition::new("ContentValid", true, "Ok", "fine"),
        );
        assert!(!set_condition(
            &mut conditions,
            Condition::new("ContentValid", true, "Ok", "fine")
        ));
        assert_eq!(conditions.len(), 1);
    }

    #[test]
    fn set_condition_keeps_transition_time_without_flip() {
        let mut conditions = Vec::new();
        set_condition(
            &mut conditions,
            Condition::new("ContentValid", true, "Ok", "fine"),
        );
        let original = conditions[0].last_transition_time;

        // Same status, new message: updated in place, time preserved.
        assert!(set_condition(
            &mut conditions,
            Condition::new("ContentValid", true, "Ok", "still fine")
        ));
        assert_eq!(conditions[0].last_transition_time, original);
        assert_eq!(conditions[0].message, "still fine");
    }

    #[test]
    fn set_condition_updates_transition_time_on_flip() {
        let mut conditions = Vec::new();
        let mut first = Condition::new("ContentValid", true, "Ok", "fine");
        first.last_transition_time = Utc::now() - chrono::Duration::hours(1);
        let original = first.last_transition_time;
        set_condition(&mut conditions, first);

        assert!(set_condition(
            &mut conditions,
            Condition::new("ContentValid", false, "Bad", "broken")
        ));
        assert!(conditions[0].last_transition_time > original);
        assert!(!conditions[0].status);
    }

    #[test]
    fn set_condition_tracks_types_independently() {
        let mut conditions = Vec::new();
        set_condition(
            &mut conditions,
            Condition::new("ContentValid", true, "Ok", ""),
        );
        set_condition(
            &mut conditions,
            Condition::new("ArtifactReady", false, "Converging", ""),
        );
        assert_eq!(conditions.len(), 2);
    }
}
