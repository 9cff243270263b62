//! External JSON import
//!
//! Games migrating from a single flat JSON save feed that document in
//! here. The splitter parses it, routes each top-level key through a
//! [`SplitPolicy`], and produces one main record plus zero or more side
//! shard records ready for persistence. The inverse, [`merge_shards`],
//! folds shard records back over the main record into one flat document.

mod errors;
mod policy;

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::record::SaveRecord;

pub use errors::{ImportError, ImportResult};
pub use policy::{CompositePolicy, PrefixPolicy, SizePolicy, SplitPolicy};

/// Result of splitting one imported document.
#[derive(Debug)]
pub struct SplitOutcome {
    /// Record destined for the main shard, id = the save id.
    pub main: SaveRecord,
    /// Side shard records keyed by shard name, ids = `<save_id>_<shard>`.
    pub shards: BTreeMap<String, SaveRecord>,
    /// Top-level keys seen in the input.
    pub total_keys: usize,
    /// Keys kept in the main record.
    pub main_keys: usize,
}

impl SplitOutcome {
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}

/// Splits a flat JSON document into main and side shard records.
///
/// Keys the policy does not claim stay in the main record; claimed keys
/// move to their shard's record. With no policy everything lands in the
/// main record. Key order inside each record follows the canonical map
/// ordering, so splitting is deterministic.
pub fn split(
    save_id: &str,
    json: &str,
    policy: Option<&dyn SplitPolicy>,
) -> ImportResult<SplitOutcome> {
    let document: Value = serde_json::from_str(json)?;
    let Value::Object(object) = document else {
        return Err(ImportError::NotAnObject(json_type_name(&document)));
    };

    let total_keys = object.len();
    let mut main = SaveRecord::new(save_id);
    let mut shards: BTreeMap<String, SaveRecord> = BTreeMap::new();

    for (key, value) in object {
        let routed = policy.and_then(|policy| policy.route(&key, &value));
        match routed {
            Some(shard_name) => {
                let record = shards.entry(shard_name.clone()).or_insert_with(|| {
                    SaveRecord::new(format!("{save_id}_{shard_name}"))
                });
                record.set(key, value);
            }
            None => main.set(key, value),
        }
    }

    let main_keys = main.len();
    Ok(SplitOutcome {
        main,
        shards,
        total_keys,
        main_keys,
    })
}

/// Folds side shard records back over a main record into one flat
/// document. Shards are applied in name order; on key collisions the
/// shard value wins over the main value.
pub fn merge_shards<'a>(
    main: &SaveRecord,
    shards: impl IntoIterator<Item = &'a SaveRecord>,
) -> Value {
    let mut merged: Map<String, Value> = main.fields().clone();
    for shard in shards {
        for (key, value) in shard.fields() {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_without_policy_keeps_everything_in_main() {
        let outcome = split("slot1", r#"{"a": 1, "b": 2}"#, None).unwrap();
        assert_eq!(outcome.total_keys, 2);
        assert_eq!(outcome.main_keys, 2);
        assert_eq!(outcome.shard_count(), 0);
        assert_eq!(outcome.main.get_i64("a"), Some(1));
    }

    #[test]
    fn test_split_routes_by_prefix() {
        let policy = PrefixPolicy::new().add_rule("inventory_", "inventory");
        let json = r#"{"player_name": "Alice", "level": 10, "inventory_sword": {"atk": 5}}"#;

        let outcome = split("slot1", json, Some(&policy)).unwrap();
        assert_eq!(outcome.total_keys, 3);
        assert_eq!(outcome.main_keys, 2);
        assert_eq!(outcome.shard_count(), 1);

        let inventory = &outcome.shards["inventory"];
        assert_eq!(inventory.id(), "slot1_inventory");
        assert_eq!(inventory.get_object("inventory_sword").unwrap()["atk"], 5);
        assert!(outcome.main.get("inventory_sword").is_none());
        assert_eq!(outcome.main.get_str("player_name"), Some("Alice"));
    }

    #[test]
    fn test_split_groups_keys_per_shard() {
        let policy = PrefixPolicy::new()
            .add_rule("inv_", "inventory")
            .add_rule("quest_", "quests");
        let json = r#"{"inv_a": 1, "inv_b": 2, "quest_x": 3, "gold": 4}"#;

        let outcome = split("slot1", json, Some(&policy)).unwrap();
        assert_eq!(outcome.shard_count(), 2);
        assert_eq!(outcome.shards["inventory"].len(), 2);
        assert_eq!(outcome.shards["quests"].len(), 1);
        assert_eq!(outcome.main_keys, 1);
    }

    #[test]
    fn test_split_rejects_malformed_json() {
        let err = split("slot1", "{not json", None).unwrap_err();
        assert!(matches!(err, ImportError::MalformedJson(_)));
    }

    #[test]
    fn test_split_rejects_non_object_root() {
        let err = split("slot1", "[1, 2, 3]", None).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_merge_reverses_split() {
        let policy = PrefixPolicy::new().add_rule("inv_", "inventory");
        let json = r#"{"gold": 10, "inv_sword": 1, "inv_shield": 2}"#;
        let outcome = split("slot1", json, Some(&policy)).unwrap();

        let merged = merge_shards(&outcome.main, outcome.shards.values());
        assert_eq!(merged["gold"], 10);
        assert_eq!(merged["inv_sword"], 1);
        assert_eq!(merged["inv_shield"], 2);
        assert_eq!(merged.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_merge_shard_value_wins_on_collision() {
        let mut main = SaveRecord::new("slot1");
        main.set("gold", 1);
        let mut shard = SaveRecord::new("slot1_x");
        shard.set("gold", 99);

        let merged = merge_shards(&main, [&shard]);
        assert_eq!(merged["gold"], 99);
    }
}
