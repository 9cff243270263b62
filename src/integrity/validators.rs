//! Pluggable record validators
//!
//! Callers can register extra predicates that run during the anti-copy
//! check. All registered validators must pass for a load to be considered
//! clean; a validator that panics counts as that validator failing, not
//! as a hard error of the whole check.

use chrono::Utc;

use crate::record::SaveRecord;

use super::fields;

/// Ambient facts handed to every validator.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Identity of the device doing the load.
    pub device_id: String,
    /// Account of the current player, if the game tracks accounts.
    pub user_account: Option<String>,
    /// Wall-clock millis at check time.
    pub now_millis: i64,
}

impl ValidationContext {
    pub fn new(device_id: impl Into<String>, user_account: Option<String>) -> Self {
        Self {
            device_id: device_id.into(),
            user_account,
            now_millis: Utc::now().timestamp_millis(),
        }
    }
}

/// A custom anti-cheat predicate.
///
/// Validators may mutate the record; the account validator below uses
/// that to bind legacy saves to the current account on first sight.
pub trait Validator: Send + Sync {
    /// Short human-readable name for log lines.
    fn name(&self) -> &str;

    /// Message logged when this validator rejects a record.
    fn error_message(&self) -> String;

    /// Returns `true` when the record passes.
    fn validate(&self, record: &mut SaveRecord, context: &ValidationContext) -> bool;
}

/// Rejects records bound to a different user account.
///
/// Records with no bound account are bound to the current one and pass.
pub struct UserAccountValidator;

impl Validator for UserAccountValidator {
    fn name(&self) -> &str {
        "user_account"
    }

    fn error_message(&self) -> String {
        "user account does not match the account bound to the save".to_string()
    }

    fn validate(&self, record: &mut SaveRecord, context: &ValidationContext) -> bool {
        let Some(current) = context.user_account.as_deref() else {
            // No current account to compare against
            return true;
        };

        match record.get_str(fields::USER_ACCOUNT) {
            None | Some("") => {
                // Legacy save: bind it now
                record.set(fields::USER_ACCOUNT, current);
                true
            }
            Some(bound) => bound == current,
        }
    }
}

/// Rejects records whose modify timestamp drifts too far from now,
/// in either direction. Catches clock rollbacks around save scumming.
pub struct TimestampDriftValidator {
    max_drift_millis: i64,
}

impl TimestampDriftValidator {
    pub fn new(max_drift_millis: i64) -> Self {
        Self { max_drift_millis }
    }
}

impl Validator for TimestampDriftValidator {
    fn name(&self) -> &str {
        "timestamp_drift"
    }

    fn error_message(&self) -> String {
        format!(
            "save modify time drifts more than {}ms from the current clock",
            self.max_drift_millis
        )
    }

    fn validate(&self, record: &mut SaveRecord, context: &ValidationContext) -> bool {
        let modify_time = record.get_i64_or(fields::MODIFY_TIME, 0);
        (context.now_millis - modify_time).abs() <= self.max_drift_millis
    }
}
