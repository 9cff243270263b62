//! Anti-copy integrity guard
//!
//! Saves are bound to a device identity and, optionally, a user account
//! via underscore-prefixed metadata fields stamped into every record on
//! write. On load the guard inspects those fields for signs the file was
//! copied from another installation or rolled back, and runs any custom
//! validators the game registered.
//!
//! The verdict is advisory. The guard reports suspicion and the vault
//! logs it; whether to reject the save is the caller's policy.

pub mod device;
mod validators;

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::logging::SaveLogger;
use crate::record::SaveRecord;

pub use validators::{TimestampDriftValidator, UserAccountValidator, ValidationContext, Validator};

/// Metadata field names stamped into records.
pub mod fields {
    pub const DEVICE_ID: &str = "_deviceId";
    pub const USER_ACCOUNT: &str = "_userAccount";
    pub const CREATE_TIME: &str = "_createTime";
    pub const MODIFY_TIME: &str = "_modifyTime";
    pub const MODIFY_COUNT: &str = "_modifyCount";
}

/// Outcome of an anti-copy check.
#[derive(Debug, Clone, Default)]
pub struct CopyCheck {
    /// True when at least one signal fired.
    pub suspected: bool,
    /// One entry per signal that fired.
    pub reasons: Vec<String>,
}

impl CopyCheck {
    fn flag(&mut self, reason: impl Into<String>) {
        self.suspected = true;
        self.reasons.push(reason.into());
    }
}

/// Last-seen state per save id, for detecting rollbacks within a session.
#[derive(Debug, Clone, Default)]
struct SeenState {
    modify_count: i64,
    modify_time: i64,
}

/// Stamps ownership metadata on write and audits it on load.
pub struct IntegrityGuard {
    device_id: String,
    user_account: Mutex<Option<String>>,
    seen: Mutex<HashMap<String, SeenState>>,
    validators: Mutex<Vec<Arc<dyn Validator>>>,
    logger: Arc<dyn SaveLogger>,
}

impl IntegrityGuard {
    pub fn new(device_id: impl Into<String>, logger: Arc<dyn SaveLogger>) -> Self {
        Self {
            device_id: device_id.into(),
            user_account: Mutex::new(None),
            seen: Mutex::new(HashMap::new()),
            validators: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// The device identity saves are bound to.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Binds subsequent writes and checks to a player account.
    pub fn set_user_account(&self, account: Option<String>) {
        if let Ok(mut guard) = self.user_account.lock() {
            *guard = account;
        }
    }

    pub fn user_account(&self) -> Option<String> {
        self.user_account.lock().ok().and_then(|guard| (*guard).clone())
    }

    /// Registers a custom validator to run on every check.
    pub fn register_validator(&self, validator: Arc<dyn Validator>) {
        if let Ok(mut guard) = self.validators.lock() {
            guard.push(validator);
        }
    }

    pub fn validator_count(&self) -> usize {
        self.validators.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Stamps ownership metadata into a record about to be persisted.
    ///
    /// First write sets the create time; every write bumps the modify
    /// count and refreshes the modify time and device binding.
    pub fn stamp_metadata(&self, record: &mut SaveRecord) {
        let now = Utc::now().timestamp_millis();

        if record.get_i64(fields::CREATE_TIME).is_none() {
            record.set(fields::CREATE_TIME, now);
        }
        let count = record.get_i64_or(fields::MODIFY_COUNT, 0);
        record.set(fields::MODIFY_COUNT, count + 1);
        record.set(fields::MODIFY_TIME, now);
        record.set(fields::DEVICE_ID, self.device_id.clone());

        if let Some(account) = self.user_account() {
            record.set(fields::USER_ACCOUNT, account);
        }

        if let Ok(mut seen) = self.seen.lock() {
            seen.insert(
                record.id().to_string(),
                SeenState {
                    modify_count: count + 1,
                    modify_time: now,
                },
            );
        }
    }

    /// Audits a freshly loaded record for copy and rollback signals.
    ///
    /// Records with no device binding are treated as legacy saves: they
    /// are bound to this device and pass. Suspicion never mutates the
    /// record beyond that healing.
    pub fn check_copy(&self, record: &mut SaveRecord) -> CopyCheck {
        let mut check = CopyCheck::default();

        match record.get_str(fields::DEVICE_ID) {
            None | Some("") => {
                // Legacy save, adopt it
                record.set(fields::DEVICE_ID, self.device_id.clone());
            }
            Some(bound) if bound != self.device_id => {
                check.flag(format!(
                    "save {} is bound to device {}, loaded on {}",
                    record.id(),
                    bound,
                    self.device_id
                ));
            }
            Some(_) => {}
        }

        let create_time = record.get_i64_or(fields::CREATE_TIME, 0);
        let modify_time = record.get_i64_or(fields::MODIFY_TIME, 0);
        if create_time > 0 && modify_time > 0 && modify_time < create_time {
            check.flag(format!(
                "save {} was modified before it was created",
                record.id()
            ));
        }

        let modify_count = record.get_i64_or(fields::MODIFY_COUNT, 0);
        if let Ok(seen) = self.seen.lock() {
            if let Some(state) = seen.get(record.id()) {
                if modify_count < state.modify_count {
                    check.flag(format!(
                        "save {} modify count went backwards ({} < {})",
                        record.id(),
                        modify_count,
                        state.modify_count
                    ));
                }
            }
        }

        self.run_validators(record, &mut check);

        if check.suspected {
            for reason in &check.reasons {
                self.logger.warn("IntegrityGuard", reason);
            }
        }
        check
    }

    fn run_validators(&self, record: &mut SaveRecord, check: &mut CopyCheck) {
        let validators: Vec<Arc<dyn Validator>> = match self.validators.lock() {
            Ok(guard) => (*guard).clone(),
            Err(_) => return,
        };
        let context = ValidationContext::new(self.device_id.clone(), self.user_account());

        for validator in validators {
            // A panicking validator fails that validator, nothing else
            let passed = panic::catch_unwind(AssertUnwindSafe(|| {
                validator.validate(record, &context)
            }))
            .unwrap_or(false);

            if !passed {
                check.flag(format!(
                    "validator {} rejected save {}: {}",
                    validator.name(),
                    record.id(),
                    validator.error_message()
                ));
            }
        }
    }

    /// Forgets all per-save rollback state.
    pub fn reset_seen(&self) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::noop_logger;

    fn guard() -> IntegrityGuard {
        IntegrityGuard::new("device-a", noop_logger())
    }

    #[test]
    fn test_stamp_sets_all_metadata() {
        let guard = guard();
        guard.set_user_account(Some("alice".to_string()));
        let mut record = SaveRecord::new("slot1");

        guard.stamp_metadata(&mut record);

        assert_eq!(record.get_str(fields::DEVICE_ID), Some("device-a"));
        assert_eq!(record.get_str(fields::USER_ACCOUNT), Some("alice"));
        assert_eq!(record.get_i64(fields::MODIFY_COUNT), Some(1));
        assert!(record.get_i64(fields::CREATE_TIME).is_some());
        assert!(record.get_i64(fields::MODIFY_TIME).is_some());
    }

    #[test]
    fn test_stamp_preserves_create_time_and_bumps_count() {
        let guard = guard();
        let mut record = SaveRecord::new("slot1");
        guard.stamp_metadata(&mut record);
        let created = record.get_i64(fields::CREATE_TIME).unwrap();

        guard.stamp_metadata(&mut record);
        assert_eq!(record.get_i64(fields::CREATE_TIME), Some(created));
        assert_eq!(record.get_i64(fields::MODIFY_COUNT), Some(2));
    }

    #[test]
    fn test_clean_save_passes() {
        let guard = guard();
        let mut record = SaveRecord::new("slot1");
        guard.stamp_metadata(&mut record);

        let check = guard.check_copy(&mut record);
        assert!(!check.suspected);
        assert!(check.reasons.is_empty());
    }

    #[test]
    fn test_legacy_save_is_adopted() {
        let guard = guard();
        let mut record = SaveRecord::new("slot1");
        record.set("gold", 100);

        let check = guard.check_copy(&mut record);
        assert!(!check.suspected);
        assert_eq!(record.get_str(fields::DEVICE_ID), Some("device-a"));
    }

    #[test]
    fn test_foreign_device_is_suspected() {
        let guard = guard();
        let mut record = SaveRecord::new("slot1");
        record.set(fields::DEVICE_ID, "device-b");

        let check = guard.check_copy(&mut record);
        assert!(check.suspected);
        assert!(check.reasons[0].contains("device-b"));
    }

    #[test]
    fn test_modify_before_create_is_suspected() {
        let guard = guard();
        let mut record = SaveRecord::new("slot1");
        record.set(fields::DEVICE_ID, "device-a");
        record.set(fields::CREATE_TIME, 2_000);
        record.set(fields::MODIFY_TIME, 1_000);

        let check = guard.check_copy(&mut record);
        assert!(check.suspected);
    }

    #[test]
    fn test_modify_count_rollback_is_suspected() {
        let guard = guard();
        let mut record = SaveRecord::new("slot1");
        guard.stamp_metadata(&mut record);
        guard.stamp_metadata(&mut record);
        guard.stamp_metadata(&mut record);

        // Simulate restoring an older copy of the file
        record.set(fields::MODIFY_COUNT, 1);
        let check = guard.check_copy(&mut record);
        assert!(check.suspected);
        assert!(check.reasons[0].contains("backwards"));
    }

    #[test]
    fn test_account_validator_rejects_foreign_account() {
        let guard = guard();
        guard.set_user_account(Some("alice".to_string()));
        guard.register_validator(Arc::new(UserAccountValidator));

        let mut record = SaveRecord::new("slot1");
        record.set(fields::DEVICE_ID, "device-a");
        record.set(fields::USER_ACCOUNT, "mallory");

        let check = guard.check_copy(&mut record);
        assert!(check.suspected);
    }

    #[test]
    fn test_panicking_validator_only_fails_itself() {
        struct Bomb;
        impl Validator for Bomb {
            fn name(&self) -> &str {
                "bomb"
            }
            fn error_message(&self) -> String {
                "boom".to_string()
            }
            fn validate(&self, _: &mut SaveRecord, _: &ValidationContext) -> bool {
                panic!("boom");
            }
        }

        let guard = guard();
        guard.register_validator(Arc::new(Bomb));

        let mut record = SaveRecord::new("slot1");
        record.set(fields::DEVICE_ID, "device-a");

        let check = guard.check_copy(&mut record);
        assert!(check.suspected);
        assert_eq!(check.reasons.len(), 1);
        assert!(check.reasons[0].contains("bomb"));
    }

    #[test]
    fn test_reset_seen_forgets_rollback_state() {
        let guard = guard();
        let mut record = SaveRecord::new("slot1");
        guard.stamp_metadata(&mut record);
        guard.stamp_metadata(&mut record);

        guard.reset_seen();
        record.set(fields::MODIFY_COUNT, 1);
        let check = guard.check_copy(&mut record);
        assert!(!check.suspected);
    }
}
