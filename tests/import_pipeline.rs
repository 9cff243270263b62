//! Import and split behavior through the vault: key-set partitioning,
//! persisted shard layout, merged export, and batch independence.

use std::sync::Arc;

use tempfile::TempDir;

use savevault::import::PrefixPolicy;
use savevault::record::SaveRecord;
use savevault::store::MAIN_SHARD;
use savevault::vault::{SaveVault, VaultConfig};

fn open_vault(dir: &TempDir) -> Arc<SaveVault> {
    SaveVault::open(
        VaultConfig::new(dir.path().join("saves"), "import-secret")
            .quiet()
            .workers(2),
    )
    .unwrap()
}

#[test]
fn prefix_import_partitions_the_key_set() {
    let dir = TempDir::new().unwrap();
    let vault = open_vault(&dir);

    let policy = PrefixPolicy::new().add_rule("inventory_", "inventory");
    let json = r#"{
        "player_name": "Alice",
        "level": 10,
        "inventory_sword": {"atk": 5}
    }"#;

    let report = vault.import_json("main", json, Some(&policy));
    assert!(report.success, "errors: {:?}", report.errors);
    assert_eq!(report.total_keys, 3);
    assert_eq!(report.main_keys, 2);
    assert_eq!(report.shard_count, 1);

    // Main part landed in the main shard
    let main = vault.load(MAIN_SHARD, true).unwrap();
    assert_eq!(main.get_str("player_name"), Some("Alice"));
    assert_eq!(main.get_i64("level"), Some(10));
    assert!(main.get("inventory_sword").is_none());

    // Routed part landed in its own shard
    assert_eq!(vault.list_shards(), vec!["inventory".to_string()]);
    let inventory = vault.load("inventory", true).unwrap();
    assert_eq!(inventory.get_object("inventory_sword").unwrap()["atk"], 5);
}

#[test]
fn merged_export_reassembles_the_original_document() {
    let dir = TempDir::new().unwrap();
    let vault = open_vault(&dir);

    let policy = PrefixPolicy::new()
        .add_rule("inv_", "inventory")
        .add_rule("quest_", "quests");
    let json = r#"{"gold": 7, "inv_sword": 1, "inv_shield": 2, "quest_main": "act2"}"#;
    assert!(vault.import_json("main", json, Some(&policy)).success);

    let merged: serde_json::Value =
        serde_json::from_str(&vault.load_all_shards_json().unwrap()).unwrap();
    assert_eq!(merged["gold"], 7);
    assert_eq!(merged["inv_sword"], 1);
    assert_eq!(merged["inv_shield"], 2);
    assert_eq!(merged["quest_main"], "act2");
}

#[test]
fn malformed_import_reports_failure_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let vault = open_vault(&dir);

    let report = vault.import_json("main", "{broken", None);
    assert!(!report.success);
    assert_eq!(report.errors.len(), 1);
    assert!(vault.load(MAIN_SHARD, true).is_none());
    assert!(vault.list_shards().is_empty());
}

#[test]
fn batch_import_items_are_independent() {
    let dir = TempDir::new().unwrap();
    let vault = open_vault(&dir);

    let items = vec![
        ("alpha".to_string(), r#"{"gold": 1}"#.to_string()),
        ("beta".to_string(), "{not json".to_string()),
        ("gamma".to_string(), r#"{"gold": 3}"#.to_string()),
    ];
    let result = vault.import_batch(&items);

    assert_eq!(result.total, 3);
    assert_eq!(result.success, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.failed_ids, vec!["beta".to_string()]);

    // The failure did not roll back its neighbors
    assert_eq!(vault.load("alpha", true).unwrap().get_i64("gold"), Some(1));
    assert_eq!(vault.load("gamma", true).unwrap().get_i64("gold"), Some(3));
    assert!(vault.load("beta", true).is_none());
}

#[test]
fn plain_export_strips_internal_metadata() {
    let dir = TempDir::new().unwrap();
    let vault = open_vault(&dir);

    let mut record = SaveRecord::new("slot1");
    record.set("gold", 100);
    assert!(vault.save(MAIN_SHARD, &mut record, true));

    let plain = vault.export_plain(MAIN_SHARD).unwrap();
    let object = plain.as_object().unwrap();
    assert_eq!(object["gold"], 100);
    assert!(object.keys().all(|key| !key.starts_with('_')));
}

#[test]
fn raw_export_exposes_the_wire_shape() {
    let dir = TempDir::new().unwrap();
    let vault = open_vault(&dir);

    let mut record = SaveRecord::new("slot1");
    record.set("gold", 100);
    assert!(vault.save(MAIN_SHARD, &mut record, true));

    let raw: serde_json::Value =
        serde_json::from_str(&vault.load_raw_json(MAIN_SHARD).unwrap()).unwrap();
    assert_eq!(raw["saveId"], "slot1");
    assert_eq!(raw["data"]["gold"], 100);
    assert!(raw["_checksum"].as_str().is_some());
}
