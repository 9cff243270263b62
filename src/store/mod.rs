//! File-backed shard store with write-through LRU caching
//!
//! Each logical shard ("table") is one file inside the store directory.
//! Reads consult the cache before touching disk; writes replace the whole
//! file under the write lock and then update the cache, so a cached entry
//! always equals what the store itself last wrote.
//!
//! # Invariants Enforced
//!
//! - All writes to one store are serialized by a single reader/writer lock
//! - Cache hits never take the lock
//! - Delete removes the file and evicts the cache entry under the same
//!   write lock, so no concurrent read can observe a half-deleted shard
//!
//! Files mutated behind the store's back can leave the cache stale; that
//! is an accepted boundary condition, not something this layer detects.

mod errors;
mod paths;

pub use errors::{StoreError, StoreResult};
pub use paths::{
    backup_file_name, shard_path, table_name_from_file, validate_name, MAIN_SHARD, SHARD_EXT,
};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;

use crate::cache::{CacheStats, LruCache};

/// Default number of shard payloads kept in the cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 50;

/// Maps shard names to files on disk, with a write-through payload cache.
pub struct ShardStore {
    dir: PathBuf,
    lock: RwLock<()>,
    /// `None` when caching is disabled (capacity 0 at construction).
    cache: Option<LruCache<String, Vec<u8>>>,
}

impl ShardStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    ///
    /// `cache_capacity` of 0 disables the payload cache entirely.
    pub fn open(dir: &Path, cache_capacity: usize) -> StoreResult<Self> {
        fs::create_dir_all(dir).map_err(|e| StoreError::io("<store dir>", e))?;
        let cache = if cache_capacity > 0 {
            Some(LruCache::new(cache_capacity))
        } else {
            None
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            lock: RwLock::new(()),
            cache,
        })
    }

    /// Store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads the full payload of a shard.
    ///
    /// A cache hit returns immediately without locking. On a miss the
    /// read lock is taken, the file is loaded whole, and the cache is
    /// filled for the next reader.
    pub fn read(&self, name: &str) -> StoreResult<Vec<u8>> {
        validate_name(name)?;

        if let Some(cache) = &self.cache {
            if let Some(bytes) = cache.get(&name.to_string()) {
                return Ok(bytes);
            }
        }

        let _guard = self.lock.read().unwrap();
        let path = shard_path(&self.dir, name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => return Err(StoreError::io(name, e)),
        };

        if let Some(cache) = &self.cache {
            cache.put(name.to_string(), bytes.clone());
        }
        Ok(bytes)
    }

    /// Replaces the full payload of a shard, then updates the cache.
    pub fn write(&self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        validate_name(name)?;

        let _guard = self.lock.write().unwrap();
        let path = shard_path(&self.dir, name);
        fs::write(&path, bytes).map_err(|e| StoreError::io(name, e))?;

        if let Some(cache) = &self.cache {
            cache.put(name.to_string(), bytes.to_vec());
        }
        Ok(())
    }

    /// Deletes a shard file and evicts its cache entry.
    ///
    /// Returns `false` when the shard did not exist.
    pub fn delete(&self, name: &str) -> StoreResult<bool> {
        validate_name(name)?;

        let _guard = self.lock.write().unwrap();
        let path = shard_path(&self.dir, name);
        match fs::remove_file(&path) {
            Ok(()) => {
                if let Some(cache) = &self.cache {
                    cache.remove(&name.to_string());
                }
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(name, e)),
        }
    }

    /// Creates an empty shard file if one does not already exist.
    ///
    /// Returns `true` when the file was created by this call.
    pub fn create(&self, name: &str) -> StoreResult<bool> {
        validate_name(name)?;

        let _guard = self.lock.write().unwrap();
        let path = shard_path(&self.dir, name);
        if path.exists() {
            return Ok(false);
        }
        fs::write(&path, b"").map_err(|e| StoreError::io(name, e))?;
        Ok(true)
    }

    /// Whether a shard file exists on disk.
    pub fn exists(&self, name: &str) -> bool {
        shard_path(&self.dir, name).exists()
    }

    /// Names of all named shards present on disk, sorted.
    ///
    /// The reserved main shard and backup files are not listed.
    pub fn list(&self) -> Vec<String> {
        let _guard = self.lock.read().unwrap();
        let mut names: Vec<String> = match fs::read_dir(&self.dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| {
                    table_name_from_file(&entry.file_name().to_string_lossy())
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Byte size of a shard file, 0 when absent.
    pub fn size(&self, name: &str) -> u64 {
        shard_path(&self.dir, name)
            .metadata()
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// Total bytes across every store file, backups included.
    pub fn total_size(&self) -> u64 {
        match fs::read_dir(&self.dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| paths::is_store_file(&entry.file_name().to_string_lossy()))
                .filter_map(|entry| entry.metadata().ok())
                .map(|m| m.len())
                .sum(),
            Err(_) => 0,
        }
    }

    /// Takes a point-in-time plain file copy of a shard.
    ///
    /// Returns the backup file name. The copy is byte-identical, not
    /// re-encrypted.
    pub fn backup(&self, name: &str) -> StoreResult<String> {
        validate_name(name)?;

        let _guard = self.lock.read().unwrap();
        let source = shard_path(&self.dir, name);
        if !source.exists() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        let backup_name = backup_file_name(name, Utc::now().timestamp_millis());
        fs::copy(&source, self.dir.join(&backup_name)).map_err(|e| StoreError::io(name, e))?;
        Ok(backup_name)
    }

    /// Deletes every store file and clears the cache.
    pub fn clear_all(&self) -> StoreResult<()> {
        let _guard = self.lock.write().unwrap();
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io("<store dir>", e))?;
        for entry in entries.filter_map(|entry| entry.ok()) {
            let file_name = entry.file_name().to_string_lossy().to_string();
            if paths::is_store_file(&file_name) {
                fs::remove_file(entry.path()).map_err(|e| StoreError::io(&file_name, e))?;
            }
        }
        if let Some(cache) = &self.cache {
            cache.clear();
        }
        Ok(())
    }

    /// Drops cached payloads without touching disk.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Cache counters, `None` when caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }

    /// Cache hit rate, 0.0 when caching is disabled or unused.
    pub fn cache_hit_rate(&self) -> f64 {
        self.cache
            .as_ref()
            .map(|cache| cache.hit_rate())
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> ShardStore {
        ShardStore::open(dir.path(), DEFAULT_CACHE_CAPACITY).unwrap()
    }

    #[test]
    fn test_open_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("saves");
        assert!(!nested.exists());
        let _store = ShardStore::open(&nested, 8).unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        store.write("main", b"payload").unwrap();
        assert_eq!(store.read("main").unwrap(), b"payload");
    }

    #[test]
    fn test_read_after_write_with_cold_cache() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = open_store(&temp_dir);
            store.write("inventory", b"items").unwrap();
        }
        // Fresh store instance, cold cache, same directory
        let store = open_store(&temp_dir);
        assert_eq!(store.read("inventory").unwrap(), b"items");
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        assert!(matches!(
            store.read("ghost"),
            Err(StoreError::NotFound(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_write_replaces_whole_content() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        store.write("main", b"first version, quite long").unwrap();
        store.write("main", b"v2").unwrap();
        assert_eq!(store.read("main").unwrap(), b"v2");
    }

    #[test]
    fn test_cache_hit_after_miss() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        store.write("main", b"payload").unwrap();

        store.clear_cache();
        store.read("main").unwrap(); // miss, fills cache
        store.read("main").unwrap(); // hit

        let stats = store.cache_stats().unwrap();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_delete_evicts_cache() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        store.write("inventory", b"items").unwrap();

        assert!(store.delete("inventory").unwrap());
        assert!(!store.delete("inventory").unwrap());
        assert!(matches!(
            store.read("inventory"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_names_only_tables() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        store.write("main", b"m").unwrap();
        store.write("quest", b"q").unwrap();
        store.write("inventory", b"i").unwrap();
        store.backup("quest").unwrap();

        assert_eq!(store.list(), vec!["inventory", "quest"]);
    }

    #[test]
    fn test_backup_of_shard_named_table_stays_out_of_the_listing() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        store.write("table", b"rows").unwrap();
        let backup_name = store.backup("table").unwrap();

        // The backup must not surface as a shard, so nothing can delete
        // it through the shard namespace either.
        assert_eq!(store.list(), vec!["table"]);
        assert!(temp_dir.path().join(&backup_name).exists());
    }

    #[test]
    fn test_create_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        assert!(store.create("quest").unwrap());
        assert!(!store.create("quest").unwrap());
        assert!(store.exists("quest"));
    }

    #[test]
    fn test_size_and_total_size() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);

        store.write("main", b"12345").unwrap();
        store.write("quest", b"123").unwrap();
        assert_eq!(store.size("main"), 5);
        assert_eq!(store.size("ghost"), 0);
        assert_eq!(store.total_size(), 8);
    }

    #[test]
    fn test_backup_is_plain_copy() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        store.write("main", b"snapshot me").unwrap();

        let backup_name = store.backup("main").unwrap();
        let copied = fs::read(temp_dir.path().join(&backup_name)).unwrap();
        assert_eq!(copied, b"snapshot me");
        assert!(backup_name.starts_with("backup_main_"));
    }

    #[test]
    fn test_backup_missing_shard_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        assert!(store.backup("ghost").is_err());
    }

    #[test]
    fn test_clear_all_removes_files_and_cache() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        store.write("main", b"m").unwrap();
        store.write("quest", b"q").unwrap();

        store.clear_all().unwrap();
        assert!(store.list().is_empty());
        assert!(!store.exists("main"));
        assert_eq!(store.cache_stats().unwrap().size, 0);
    }

    #[test]
    fn test_disabled_cache() {
        let temp_dir = TempDir::new().unwrap();
        let store = ShardStore::open(temp_dir.path(), 0).unwrap();
        store.write("main", b"payload").unwrap();
        assert_eq!(store.read("main").unwrap(), b"payload");
        assert!(store.cache_stats().is_none());
        assert_eq!(store.cache_hit_rate(), 0.0);
    }

    #[test]
    fn test_invalid_names_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        assert!(store.write("../escape", b"x").is_err());
        assert!(store.read("").is_err());
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        use std::sync::Arc;
        use std::thread;

        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(open_store(&temp_dir));
        store.write("shared", b"seed").unwrap();

        let mut handles = vec![];
        for t in 0..4 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for i in 0..50 {
                    let payload = format!("writer-{}-{}", t, i);
                    store.write("shared", payload.as_bytes()).unwrap();
                    let read = store.read("shared").unwrap();
                    assert!(read.starts_with(b"writer-"));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
