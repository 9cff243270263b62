//! Persistent device identity
//!
//! A UUID generated once per installation and read thereafter, stored
//! outside the shard directory so `clear_all` never wipes it. Saves are
//! bound to this id; a save opened under a different id is a suspected
//! copy.

use std::fs;
use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

/// Default file name for the device identity, sibling of the store dir.
pub const DEVICE_ID_FILE: &str = ".device_id";

/// Reads the device id from `path`, generating and persisting a fresh
/// UUID v4 on first use.
///
/// Never fails: if the file cannot be read or written a process-unique
/// fallback id is returned so loads still work, they just will not bind
/// across restarts.
pub fn load_or_create(path: &Path) -> String {
    if let Ok(existing) = fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let device_id = Uuid::new_v4().to_string();
    if fs::write(path, &device_id).is_ok() {
        return device_id;
    }
    format!("unknown_device_{}", Utc::now().timestamp_millis())
}
