//! Deterministic shard-to-file naming
//!
//! The reserved main shard maps to one fixed path; every other shard name
//! maps through a fixed injective transform, so create/read/delete are
//! idempotent and order-independent:
//!
//! ```text
//! main                  -> main.save
//! <name>                -> table_<name>.save
//! backup of main        -> backup_main_<unix-millis>.save
//! backup of <name>      -> backup_table_<name>_<unix-millis>.save
//! ```
//!
//! Backups carry their own prefix so the three namespaces stay disjoint:
//! a backup file can never parse as a shard, whatever the shard is named.

use std::path::{Path, PathBuf};

use super::errors::{StoreError, StoreResult};

/// Reserved name of the primary shard.
pub const MAIN_SHARD: &str = "main";

/// Extension shared by every shard and backup file.
pub const SHARD_EXT: &str = "save";

const TABLE_PREFIX: &str = "table_";
const BACKUP_PREFIX: &str = "backup_";

/// Validates that a shard name maps to a safe, collision-free file name.
pub fn validate_name(name: &str) -> StoreResult<()> {
    let invalid = |reason| StoreError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid("must not contain path separators"));
    }
    if name.contains('.') {
        return Err(invalid("must not contain dots"));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("must not contain control characters"));
    }
    Ok(())
}

/// Resolves a shard name to its on-disk path inside `dir`.
pub fn shard_path(dir: &Path, name: &str) -> PathBuf {
    if name == MAIN_SHARD {
        dir.join(format!("{}.{}", MAIN_SHARD, SHARD_EXT))
    } else {
        dir.join(format!("{}{}.{}", TABLE_PREFIX, name, SHARD_EXT))
    }
}

/// File name for a point-in-time backup taken at `unix_millis`. The
/// backup prefix wraps the shard's full file stem, keeping backups out
/// of the shard namespace.
pub fn backup_file_name(name: &str, unix_millis: i64) -> String {
    let stem = if name == MAIN_SHARD {
        MAIN_SHARD.to_string()
    } else {
        format!("{}{}", TABLE_PREFIX, name)
    };
    format!("{}{}_{}.{}", BACKUP_PREFIX, stem, unix_millis, SHARD_EXT)
}

/// Extracts the shard name from a `table_*.save` file name, if it is one.
pub fn table_name_from_file(file_name: &str) -> Option<String> {
    if file_name.starts_with(BACKUP_PREFIX) {
        return None;
    }
    let stem = file_name
        .strip_prefix(TABLE_PREFIX)?
        .strip_suffix(&format!(".{}", SHARD_EXT))?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_string())
}

/// Whether a file name belongs to the store (shard or backup).
pub fn is_store_file(file_name: &str) -> bool {
    file_name.ends_with(&format!(".{}", SHARD_EXT))
}
