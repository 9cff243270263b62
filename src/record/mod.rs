//! In-memory save document model
//!
//! A [`SaveRecord`] is an ordered map of string keys to JSON-typed values
//! plus the metadata the envelope layers stamp on it: id, version,
//! last-mutation timestamp, and the checksum carried through from disk.
//!
//! Field values are `serde_json::Value`, so every consumer pattern-matches
//! the tagged union instead of downcasting. Internal metadata keys carry a
//! leading underscore and are skipped by [`SaveRecord::export_plain`].

use chrono::Utc;
use serde_json::{Map, Value};
use thiserror::Error;

/// Result type for record conversions
pub type RecordResult<T> = Result<T, RecordError>;

/// Failures converting between JSON and [`SaveRecord`].
#[derive(Debug, Error)]
pub enum RecordError {
    /// The root of a save document must be a JSON object.
    #[error("save record must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// One logical save document.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRecord {
    id: String,
    timestamp: i64,
    version: u64,
    checksum: String,
    fields: Map<String, Value>,
}

impl SaveRecord {
    /// Creates an empty record with version 1 and the current timestamp.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp: Utc::now().timestamp_millis(),
            version: 1,
            checksum: String::new(),
            fields: Map::new(),
        }
    }

    /// Rebuilds a record from its wire shape.
    ///
    /// Metadata fields are optional so legacy documents load cleanly;
    /// only a non-object root is rejected.
    pub fn from_value(id: impl Into<String>, value: &Value) -> RecordResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| RecordError::NotAnObject(json_type_name(value)))?;

        let timestamp = object
            .get("timestamp")
            .and_then(Value::as_i64)
            .unwrap_or_else(|| Utc::now().timestamp_millis());
        let version = object.get("version").and_then(Value::as_u64).unwrap_or(1);
        let checksum = object
            .get("checksum")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let fields = object
            .get("data")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            id: id.into(),
            timestamp,
            version,
            checksum,
            fields,
        })
    }

    /// Serializes to the wire shape:
    /// `{"saveId", "timestamp", "version", "checksum", "data": {...}}`.
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("saveId".to_string(), Value::String(self.id.clone()));
        object.insert("timestamp".to_string(), Value::from(self.timestamp));
        object.insert("version".to_string(), Value::from(self.version));
        object.insert("checksum".to_string(), Value::String(self.checksum.clone()));
        object.insert("data".to_string(), Value::Object(self.fields.clone()));
        Value::Object(object)
    }

    /// Pretty-printed JSON of the wire shape.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_else(|_| "{}".to_string())
    }

    // Identity and metadata

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Millisecond timestamp of the last mutation.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Increments the version, for callers tracking material changes.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn set_checksum(&mut self, checksum: impl Into<String>) {
        self.checksum = checksum.into();
    }

    // Field access

    /// Sets a field and refreshes the mutation timestamp.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
        self.timestamp = Utc::now().timestamp_millis();
    }

    /// Removes a field and refreshes the mutation timestamp.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.fields.remove(key);
        if removed.is_some() {
            self.timestamp = Utc::now().timestamp_millis();
        }
        removed
    }

    /// Drops all fields.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.timestamp = Utc::now().timestamp_millis();
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    // Typed accessors

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_str(key).unwrap_or(default)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    pub fn get_i64_or(&self, key: &str, default: i64) -> i64 {
        self.get_i64(key).unwrap_or(default)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    pub fn get_object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.fields.get(key).and_then(Value::as_object)
    }

    pub fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.fields.get(key).and_then(Value::as_array)
    }

    /// Exports the user-visible fields, skipping `_`-prefixed metadata.
    pub fn export_plain(&self) -> Value {
        let plain: Map<String, Value> = self
            .fields
            .iter()
            .filter(|(key, _)| !key.starts_with('_'))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Value::Object(plain)
    }
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
    fn test_new_record_defaults() {
        let record = SaveRecord::new("slot1");
        assert_eq!(record.id(), "slot1");
        assert_eq!(record.version(), 1);
        assert!(record.is_empty());
        assert!(record.checksum().is_empty());
    }

    #[test]
    fn test_wire_shape_round_trip() {
        let mut record = SaveRecord::new("slot1");
        record.set("player_name", "Alice");
        record.set("level", 10);
        record.set("inventory", json!(["sword", "shield"]));

        let value = record.to_value();
        assert_eq!(value["saveId"], "slot1");
        assert_eq!(value["data"]["level"], 10);

        let rebuilt = SaveRecord::from_value("slot1", &value).unwrap();
        assert_eq!(rebuilt, record);
    }

    #[test]
    fn test_from_value_tolerates_missing_metadata() {
        let record = SaveRecord::from_value("legacy", &json!({"data": {"gold": 5}})).unwrap();
        assert_eq!(record.version(), 1);
        assert_eq!(record.get_i64("gold"), Some(5));
        assert!(record.checksum().is_empty());
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        let err = SaveRecord::from_value("bad", &json!([1, 2, 3])).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_set_refreshes_timestamp() {
        let mut record = SaveRecord::new("slot1");
        record.set_timestamp(0);
        record.set("gold", 100);
        assert!(record.timestamp() > 0);
    }

    #[test]
    fn test_typed_accessors() {
        let mut record = SaveRecord::new("slot1");
        record.set("name", "Alice");
        record.set("level", 10);
        record.set("ratio", 0.5);
        record.set("hardcore", true);
        record.set("stats", json!({"hp": 30}));
        record.set("bag", json!([1, 2]));

        assert_eq!(record.get_str("name"), Some("Alice"));
        assert_eq!(record.get_i64("level"), Some(10));
        assert_eq!(record.get_f64("ratio"), Some(0.5));
        assert_eq!(record.get_bool("hardcore"), Some(true));
        assert_eq!(record.get_object("stats").unwrap()["hp"], 30);
        assert_eq!(record.get_array("bag").unwrap().len(), 2);

        // Type mismatches come back as None, not panics
        assert_eq!(record.get_i64("name"), None);
        assert_eq!(record.get_str("level"), None);
        assert_eq!(record.get_str_or("missing", "fallback"), "fallback");
        assert_eq!(record.get_i64_or("missing", -1), -1);
    }

    #[test]
    fn test_export_plain_skips_metadata() {
        let mut record = SaveRecord::new("slot1");
        record.set("gold", 100);
        record.set("_deviceId", "abc");
        record.set("_modifyCount", 3);

        let plain = record.export_plain();
        let object = plain.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(object["gold"], 100);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut record = SaveRecord::new("slot1");
        record.set("a", 1);
        record.set("b", 2);
        assert_eq!(record.remove("a"), Some(json!(1)));
        assert_eq!(record.remove("a"), None);
        record.clear();
        assert!(record.is_empty());
    }

    #[test]
    fn test_bump_version() {
        let mut record = SaveRecord::new("slot1");
        record.bump_version();
        assert_eq!(record.version(), 2);
    }
}
