//! Save vault orchestrator
//!
//! [`SaveVault`] wires the shard store, the integrity envelope, the
//! anti-copy guard, and the background executor into one surface a game
//! talks to. Every pipeline error is converted to a bool or `Option` at
//! this boundary and the cause is logged, so a corrupt or hostile save
//! file can never panic the caller.
//!
//! Write pipeline: stamp anti-copy metadata, serialize, stamp checksum,
//! optionally compress, seal, store. Reads reverse it and fail closed.

mod errors;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;
use crate::codec::{
    self, open, seal, stamp_checksum, unwrap_envelope, verify_checksum, wrap_envelope,
    CHECKSUM_FIELD,
};
use crate::executor::{BatchResult, TaskExecutor, TaskHandle};
use crate::import::{self, SplitPolicy};
use crate::integrity::{device, IntegrityGuard, Validator};
use crate::logging::{default_logger, LogLevel, SaveLogger};
use crate::metrics::{MetricsCollector, OperationKind};
use crate::probe::EnvironmentProbe;
use crate::record::SaveRecord;
use crate::store::{ShardStore, StoreError, DEFAULT_CACHE_CAPACITY, MAIN_SHARD};

pub use errors::{VaultError, VaultResult};

/// Payloads below this size are stored uncompressed by default.
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 512;

/// Construction options for a [`SaveVault`].
pub struct VaultConfig {
    pub dir: PathBuf,
    pub secret: String,
    pub cache_capacity: usize,
    pub compression: bool,
    pub compression_threshold: usize,
    /// 0 sizes the pool to the machine's parallelism.
    pub workers: usize,
    pub logging: bool,
    pub logger: Option<Arc<dyn SaveLogger>>,
    pub probe: Option<Arc<dyn EnvironmentProbe>>,
}

impl VaultConfig {
    pub fn new(dir: impl Into<PathBuf>, secret: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            secret: secret.into(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            compression: true,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            workers: 0,
            logging: true,
            logger: None,
            probe: None,
        }
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    pub fn compression_threshold(mut self, threshold: usize) -> Self {
        self.compression_threshold = threshold;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn logger(mut self, logger: Arc<dyn SaveLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn quiet(mut self) -> Self {
        self.logging = false;
        self
    }

    pub fn probe(mut self, probe: Arc<dyn EnvironmentProbe>) -> Self {
        self.probe = Some(probe);
        self
    }
}

/// Point-in-time view of the vault for dashboards and debugging.
#[derive(Debug, Clone, Serialize)]
pub struct VaultStats {
    pub shard_count: usize,
    pub total_size: u64,
    pub device_id: String,
    pub cache: Option<CacheStats>,
    pub cache_hit_rate: f64,
    pub pending_tasks: u64,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
}

/// Outcome of importing one external JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub total_keys: usize,
    pub main_keys: usize,
    pub shard_count: usize,
    pub success: bool,
    pub errors: Vec<String>,
}

/// Logger wrapper behind the vault's global log toggle.
struct ToggleLogger {
    inner: Arc<dyn SaveLogger>,
    enabled: Arc<AtomicBool>,
}

impl SaveLogger for ToggleLogger {
    fn log(&self, level: LogLevel, tag: &str, message: &str) {
        if self.enabled.load(Ordering::Relaxed) {
            self.inner.log(level, tag, message);
        }
    }
}

const TAG: &str = "SaveVault";

/// The save-store facade. One instance per save directory.
pub struct SaveVault {
    store: ShardStore,
    integrity: IntegrityGuard,
    executor: TaskExecutor,
    metrics: MetricsCollector,
    logger: Arc<dyn SaveLogger>,
    probe: RwLock<Option<Arc<dyn EnvironmentProbe>>>,
    secret: RwLock<String>,
    compression: AtomicBool,
    compression_threshold: AtomicUsize,
    log_enabled: Arc<AtomicBool>,
}

impl SaveVault {
    /// Opens (creating if needed) a vault rooted at the configured
    /// directory. The device identity file lives in the directory's
    /// parent so `clear_all` never erases it.
    pub fn open(config: VaultConfig) -> VaultResult<Arc<Self>> {
        let log_enabled = Arc::new(AtomicBool::new(config.logging));
        let base_logger = config.logger.unwrap_or_else(default_logger);
        let logger: Arc<dyn SaveLogger> = Arc::new(ToggleLogger {
            inner: base_logger,
            enabled: Arc::clone(&log_enabled),
        });

        let store = ShardStore::open(&config.dir, config.cache_capacity)?;
        let device_path = config
            .dir
            .parent()
            .unwrap_or(&config.dir)
            .join(device::DEVICE_ID_FILE);
        let device_id = device::load_or_create(&device_path);

        let integrity = IntegrityGuard::new(device_id, Arc::clone(&logger));
        let executor = if config.workers == 0 {
            TaskExecutor::new(Arc::clone(&logger))
        } else {
            TaskExecutor::with_workers(config.workers, Arc::clone(&logger))
        };

        logger.info(TAG, &format!("vault opened at {}", config.dir.display()));
        Ok(Arc::new(Self {
            store,
            integrity,
            executor,
            metrics: MetricsCollector::new(),
            logger,
            probe: RwLock::new(config.probe),
            secret: RwLock::new(config.secret),
            compression: AtomicBool::new(config.compression),
            compression_threshold: AtomicUsize::new(config.compression_threshold),
            log_enabled,
        }))
    }

    // Core pipeline

    /// Persists a record into a shard. The record is mutated in place:
    /// anti-copy metadata is stamped when `with_integrity` is set, and
    /// the computed checksum is written back.
    pub fn save(&self, shard: &str, record: &mut SaveRecord, with_integrity: bool) -> bool {
        let timer = self.metrics.start_timer();
        let ok = match self.save_inner(shard, record, with_integrity) {
            Ok(()) => {
                self.logger
                    .debug(TAG, &format!("saved shard {shard} ({} fields)", record.len()));
                true
            }
            Err(e) => {
                self.logger.error(TAG, &format!("save {shard} failed: {e}"));
                false
            }
        };
        self.metrics.end_timer(OperationKind::Write, timer, ok);
        ok
    }

    fn save_inner(
        &self,
        shard: &str,
        record: &mut SaveRecord,
        with_integrity: bool,
    ) -> VaultResult<()> {
        if with_integrity {
            self.integrity.stamp_metadata(record);
        }

        let stamped = stamp_checksum(record.to_value());
        if let Some(sum) = stamped.get(CHECKSUM_FIELD).and_then(Value::as_str) {
            record.set_checksum(sum);
        }

        let plaintext = serde_json::to_vec(&stamped)?;
        let should_compress = self.compression.load(Ordering::Relaxed)
            && plaintext.len() > self.compression_threshold.load(Ordering::Relaxed);
        let wrapped = wrap_envelope(&plaintext, should_compress)?;

        let sealed = seal(&wrapped, &self.current_secret())?;
        self.store.write(shard, &sealed)?;
        Ok(())
    }

    /// Loads a record from a shard, or `None` when the shard is absent,
    /// empty, or fails any envelope check. Failures are logged, never
    /// surfaced as panics.
    pub fn load(&self, shard: &str, with_integrity: bool) -> Option<SaveRecord> {
        let timer = self.metrics.start_timer();
        let result = self.load_inner(shard, with_integrity);
        let ok = result.is_ok();
        self.metrics.end_timer(OperationKind::Read, timer, ok);
        match result {
            Ok(record) => record,
            Err(e) => {
                self.logger.error(TAG, &format!("load {shard} failed: {e}"));
                None
            }
        }
    }

    fn load_inner(&self, shard: &str, with_integrity: bool) -> VaultResult<Option<SaveRecord>> {
        let Some(value) = self.load_value(shard)? else {
            return Ok(None);
        };

        let id = value
            .get("saveId")
            .and_then(Value::as_str)
            .unwrap_or(shard)
            .to_string();
        let mut record = SaveRecord::from_value(id, &value)?;
        if let Some(sum) = value.get(CHECKSUM_FIELD).and_then(Value::as_str) {
            record.set_checksum(sum);
        }

        if with_integrity {
            let check = self.integrity.check_copy(&mut record);
            if check.suspected {
                self.logger.warn(
                    TAG,
                    &format!(
                        "shard {shard} flagged as suspected copy ({} signal(s))",
                        check.reasons.len()
                    ),
                );
            }
            self.probe_advisory();
        }
        Ok(Some(record))
    }

    /// Decrypts and verifies a shard down to its wire-shape JSON value.
    fn load_value(&self, shard: &str) -> VaultResult<Option<Value>> {
        let bytes = match self.store.read(shard) {
            Ok(bytes) => bytes,
            Err(StoreError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        // A shard created but never saved to
        if bytes.is_empty() {
            return Ok(None);
        }

        let opened = open(&bytes, &self.current_secret())?;
        let payload = unwrap_envelope(&opened)?;
        let value: Value = serde_json::from_slice(&payload)?;

        if !verify_checksum(&value) {
            return Err(codec::mismatch_error(&value).into());
        }
        Ok(Some(value))
    }

    /// Environment findings are advisory: logged, never enforced.
    fn probe_advisory(&self) {
        let probe = match self.probe.read() {
            Ok(guard) => (*guard).clone(),
            Err(_) => None,
        };
        let Some(probe) = probe else { return };
        let score = probe.risk_score();
        if score > 0 {
            self.logger
                .warn(TAG, &format!("environment risk score {score}"));
            for finding in probe.findings() {
                self.logger.warn(
                    TAG,
                    &format!(
                        "environment finding [{}] level {}: {}",
                        finding.kind, finding.risk_level, finding.description
                    ),
                );
            }
        }
    }

    /// Applies `mutate` to a shard's record and persists the result.
    ///
    /// A shard that exists on disk but fails to load cleanly refuses the
    /// update and keeps the file untouched, so a transient decrypt or
    /// checksum failure can never be papered over with a fresh record.
    /// A truly absent shard starts from an empty record.
    pub fn update<F>(&self, shard: &str, mutate: F, with_integrity: bool) -> bool
    where
        F: FnOnce(&mut SaveRecord),
    {
        let timer = self.metrics.start_timer();
        let ok = self.update_inner(shard, mutate, with_integrity);
        self.metrics.end_timer(OperationKind::Update, timer, ok);
        ok
    }

    fn update_inner<F>(&self, shard: &str, mutate: F, with_integrity: bool) -> bool
    where
        F: FnOnce(&mut SaveRecord),
    {
        let mut record = if self.store.exists(shard) {
            match self.load_inner(shard, with_integrity) {
                Ok(Some(record)) => record,
                // Created but never written to
                Ok(None) => SaveRecord::new(shard),
                Err(e) => {
                    self.logger.warn(
                        TAG,
                        &format!("refusing update of unreadable shard {shard}: {e}"),
                    );
                    return false;
                }
            }
        } else {
            SaveRecord::new(shard)
        };

        mutate(&mut record);
        record.bump_version();

        match self.save_inner(shard, &mut record, with_integrity) {
            Ok(()) => true,
            Err(e) => {
                self.logger
                    .error(TAG, &format!("update {shard} failed to persist: {e}"));
                false
            }
        }
    }

    /// Deletes a shard. Returns `false` when it did not exist or the
    /// delete failed.
    pub fn delete(&self, shard: &str) -> bool {
        let timer = self.metrics.start_timer();
        let ok = match self.store.delete(shard) {
            Ok(existed) => existed,
            Err(e) => {
                self.logger.error(TAG, &format!("delete {shard} failed: {e}"));
                false
            }
        };
        self.metrics.end_timer(OperationKind::Delete, timer, ok);
        ok
    }

    /// Creates an empty shard. Returns `false` when it already existed.
    pub fn create_shard(&self, shard: &str) -> bool {
        match self.store.create(shard) {
            Ok(created) => created,
            Err(e) => {
                self.logger
                    .error(TAG, &format!("create shard {shard} failed: {e}"));
                false
            }
        }
    }

    /// Named shards present on disk, sorted. The main shard is implied
    /// and not listed.
    pub fn list_shards(&self) -> Vec<String> {
        self.store.list()
    }

    pub fn shard_exists(&self, shard: &str) -> bool {
        self.store.exists(shard)
    }

    pub fn shard_size(&self, shard: &str) -> u64 {
        self.store.size(shard)
    }

    pub fn total_size(&self) -> u64 {
        self.store.total_size()
    }

    /// Takes a timestamped file copy of a shard. Returns the backup file
    /// name, or `None` when the shard is absent or the copy failed.
    pub fn backup_shard(&self, shard: &str) -> Option<String> {
        match self.store.backup(shard) {
            Ok(name) => {
                self.logger
                    .info(TAG, &format!("backed up shard {shard} to {name}"));
                Some(name)
            }
            Err(e) => {
                self.logger.error(TAG, &format!("backup {shard} failed: {e}"));
                None
            }
        }
    }

    /// Deletes every save file in the vault directory. The device
    /// identity survives.
    pub fn clear_all(&self) -> bool {
        match self.store.clear_all() {
            Ok(()) => {
                self.integrity.reset_seen();
                self.logger.info(TAG, "cleared all shards");
                true
            }
            Err(e) => {
                self.logger.error(TAG, &format!("clear_all failed: {e}"));
                false
            }
        }
    }

    // Export surface

    /// Decrypted wire-shape JSON of a shard, pretty-printed.
    pub fn load_raw_json(&self, shard: &str) -> Option<String> {
        let timer = self.metrics.start_timer();
        let result = self.load_value(shard);
        let ok = result.is_ok();
        self.metrics.end_timer(OperationKind::Export, timer, ok);
        match result {
            Ok(value) => {
                value.and_then(|v| serde_json::to_string_pretty(&v).ok())
            }
            Err(e) => {
                self.logger
                    .error(TAG, &format!("raw export of {shard} failed: {e}"));
                None
            }
        }
    }

    /// User-visible fields of a shard, metadata stripped.
    pub fn export_plain(&self, shard: &str) -> Option<Value> {
        let timer = self.metrics.start_timer();
        let record = self.load_inner(shard, false);
        let ok = record.is_ok();
        self.metrics.end_timer(OperationKind::Export, timer, ok);
        match record {
            Ok(record) => record.map(|r| r.export_plain()),
            Err(e) => {
                self.logger
                    .error(TAG, &format!("plain export of {shard} failed: {e}"));
                None
            }
        }
    }

    /// Merges the main shard and every named shard into one flat JSON
    /// document, shard values winning on key collisions. Unreadable
    /// shards are skipped with a logged warning.
    pub fn load_all_shards_json(&self) -> Option<String> {
        let timer = self.metrics.start_timer();

        let main = match self.load_inner(MAIN_SHARD, false) {
            Ok(Some(record)) => record,
            Ok(None) => SaveRecord::new(MAIN_SHARD),
            Err(e) => {
                self.logger
                    .error(TAG, &format!("merged export failed on main shard: {e}"));
                self.metrics
                    .end_timer(OperationKind::Export, timer, false);
                return None;
            }
        };

        let mut shards = Vec::new();
        for name in self.store.list() {
            match self.load_inner(&name, false) {
                Ok(Some(record)) => shards.push(record),
                Ok(None) => {}
                Err(e) => {
                    self.logger
                        .warn(TAG, &format!("merged export skipping shard {name}: {e}"));
                }
            }
        }

        let merged = import::merge_shards(&main, shards.iter());
        self.metrics.end_timer(OperationKind::Export, timer, true);
        serde_json::to_string_pretty(&merged).ok()
    }

    // Import surface

    /// Splits an external flat JSON document per `policy` and persists
    /// the pieces: the main part under the main shard, each routed group
    /// under its own named shard. A failure on any piece is recorded and
    /// the remaining pieces still proceed.
    pub fn import_json(
        &self,
        save_id: &str,
        json: &str,
        policy: Option<&dyn SplitPolicy>,
    ) -> ImportReport {
        let timer = self.metrics.start_timer();
        let outcome = match import::split(save_id, json, policy) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.logger.error(TAG, &format!("import of {save_id} failed: {e}"));
                self.metrics
                    .end_timer(OperationKind::Import, timer, false);
                return ImportReport {
                    total_keys: 0,
                    main_keys: 0,
                    shard_count: 0,
                    success: false,
                    errors: vec![e.to_string()],
                };
            }
        };

        let mut errors = Vec::new();
        let shard_count = outcome.shards.len();
        let mut main = outcome.main;
        if let Err(e) = self.save_inner(MAIN_SHARD, &mut main, true) {
            errors.push(format!("main: {e}"));
        }
        for (name, mut record) in outcome.shards {
            if !self.store.exists(&name) {
                let _ = self.store.create(&name);
            }
            if let Err(e) = self.save_inner(&name, &mut record, true) {
                errors.push(format!("{name}: {e}"));
            }
        }

        let success = errors.is_empty();
        self.metrics.end_timer(OperationKind::Import, timer, success);
        self.logger.info(
            TAG,
            &format!(
                "imported {save_id}: {} keys, {} in main, {shard_count} shard(s), success={success}",
                outcome.total_keys, outcome.main_keys
            ),
        );
        ImportReport {
            total_keys: outcome.total_keys,
            main_keys: outcome.main_keys,
            shard_count,
            success,
            errors,
        }
    }

    /// Imports many `(shard, flat json)` documents, one record per
    /// shard. Items are independent: a malformed document is recorded in
    /// `failed_ids` and never rolls back its neighbors.
    pub fn import_batch(&self, items: &[(String, String)]) -> BatchResult {
        let started = Instant::now();
        let mut failed_ids = Vec::new();

        for (shard, json) in items {
            let timer = self.metrics.start_timer();
            let ok = self.import_one(shard, json);
            self.metrics.end_timer(OperationKind::Import, timer, ok);
            if !ok {
                failed_ids.push(shard.clone());
            }
        }

        let result = BatchResult {
            total: items.len(),
            success: items.len() - failed_ids.len(),
            failed: failed_ids.len(),
            failed_ids,
            duration: started.elapsed(),
        };
        self.logger.info(
            TAG,
            &format!(
                "batch import: {}/{} succeeded in {:?}",
                result.success, result.total, result.duration
            ),
        );
        result
    }

    fn import_one(&self, shard: &str, json: &str) -> bool {
        let parsed: Value = match serde_json::from_str(json) {
            Ok(value) => value,
            Err(e) => {
                self.logger
                    .warn(TAG, &format!("batch item {shard} malformed: {e}"));
                return false;
            }
        };
        if !parsed.is_object() {
            self.logger
                .warn(TAG, &format!("batch item {shard} is not a JSON object"));
            return false;
        }
        let mut record = match SaveRecord::from_value(shard, &serde_json::json!({ "data": parsed }))
        {
            Ok(record) => record,
            Err(e) => {
                self.logger
                    .warn(TAG, &format!("batch item {shard} rejected: {e}"));
                return false;
            }
        };
        match self.save_inner(shard, &mut record, true) {
            Ok(()) => true,
            Err(e) => {
                self.logger
                    .error(TAG, &format!("batch item {shard} failed: {e}"));
                false
            }
        }
    }

    // Async facade

    /// Persists a record on the worker pool. The handle resolves once
    /// the write hit disk.
    pub fn save_async(
        self: &Arc<Self>,
        shard: impl Into<String>,
        record: SaveRecord,
    ) -> TaskHandle<()> {
        let vault = Arc::clone(self);
        let shard = shard.into();
        self.executor.submit(move || {
            let mut record = record;
            if vault.save(&shard, &mut record, true) {
                Ok(())
            } else {
                Err(format!("async save of shard {shard} failed"))
            }
        })
    }

    /// Loads a record on the worker pool.
    pub fn load_async(self: &Arc<Self>, shard: impl Into<String>) -> TaskHandle<Option<SaveRecord>> {
        let vault = Arc::clone(self);
        let shard = shard.into();
        self.executor
            .submit(move || Ok(vault.load(&shard, true)))
    }

    /// Saves many records in parallel and waits for all of them.
    /// Failures are collected per shard; nothing rolls back.
    pub fn batch_save(self: &Arc<Self>, items: Vec<(String, SaveRecord)>) -> BatchResult {
        let started = Instant::now();
        let total = items.len();

        let handles: Vec<(String, TaskHandle<()>)> = items
            .into_iter()
            .map(|(shard, record)| {
                let handle = self.save_async(shard.clone(), record);
                (shard, handle)
            })
            .collect();

        let mut failed_ids = Vec::new();
        for (shard, handle) in handles {
            if handle.wait().is_err() {
                failed_ids.push(shard);
            }
        }

        BatchResult {
            total,
            success: total - failed_ids.len(),
            failed: failed_ids.len(),
            failed_ids,
            duration: started.elapsed(),
        }
    }

    /// Loads many shards in parallel. Absent or unreadable shards are
    /// reported as failures; the rest still load.
    pub fn batch_load(
        self: &Arc<Self>,
        shards: Vec<String>,
    ) -> (Vec<(String, SaveRecord)>, BatchResult) {
        let started = Instant::now();
        let total = shards.len();

        let handles: Vec<(String, TaskHandle<Option<SaveRecord>>)> = shards
            .into_iter()
            .map(|shard| {
                let handle = self.load_async(shard.clone());
                (shard, handle)
            })
            .collect();

        let mut loaded = Vec::new();
        let mut failed_ids = Vec::new();
        for (shard, handle) in handles {
            match handle.wait() {
                Ok(Some(record)) => loaded.push((shard, record)),
                _ => failed_ids.push(shard),
            }
        }

        let result = BatchResult {
            total,
            success: total - failed_ids.len(),
            failed: failed_ids.len(),
            failed_ids,
            duration: started.elapsed(),
        };
        (loaded, result)
    }

    /// Blocks until background work drains or `timeout` elapses.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.executor.wait_idle(timeout)
    }

    /// Drains the executor and stops accepting background work.
    pub fn shutdown(&self) {
        self.executor.shutdown();
    }

    // Runtime options

    pub fn set_compression(&self, enabled: bool) {
        self.compression.store(enabled, Ordering::Relaxed);
    }

    pub fn set_compression_threshold(&self, threshold: usize) {
        self.compression_threshold
            .store(threshold, Ordering::Relaxed);
    }

    /// Globally mutes or unmutes every log line the vault and its
    /// subsystems emit.
    pub fn set_logging(&self, enabled: bool) {
        self.log_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Replaces the sealing secret for subsequent writes and reads.
    /// Shards sealed under the old secret become unreadable until it is
    /// restored.
    pub fn set_secret(&self, secret: impl Into<String>) {
        let secret = secret.into();
        match self.secret.write() {
            Ok(mut guard) => *guard = secret,
            Err(poisoned) => *poisoned.into_inner() = secret,
        }
    }

    fn current_secret(&self) -> String {
        match self.secret.read() {
            Ok(guard) => (*guard).clone(),
            Err(poisoned) => (*poisoned.into_inner()).clone(),
        }
    }

    pub fn set_user_account(&self, account: Option<String>) {
        self.integrity.set_user_account(account);
    }

    pub fn register_validator(&self, validator: Arc<dyn Validator>) {
        self.integrity.register_validator(validator);
    }

    pub fn set_probe(&self, probe: Option<Arc<dyn EnvironmentProbe>>) {
        if let Ok(mut guard) = self.probe.write() {
            *guard = probe;
        }
    }

    // Introspection

    pub fn device_id(&self) -> &str {
        self.integrity.device_id()
    }

    pub fn stats(&self) -> VaultStats {
        VaultStats {
            shard_count: self.store.list().len(),
            total_size: self.store.total_size(),
            device_id: self.integrity.device_id().to_string(),
            cache: self.store.cache_stats(),
            cache_hit_rate: self.store.cache_hit_rate(),
            pending_tasks: self.executor.pending_count(),
            completed_tasks: self.executor.completed_count(),
            failed_tasks: self.executor.failed_count(),
        }
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn metrics_report(&self) -> String {
        self.metrics.report()
    }

    pub fn metrics_json(&self) -> String {
        self.metrics.to_json()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.store.cache_stats()
    }

    pub fn cache_hit_rate(&self) -> f64 {
        self.store.cache_hit_rate()
    }

    pub fn clear_cache(&self) {
        self.store.clear_cache();
    }
}
