//! Shard routing policies
//!
//! A [`SplitPolicy`] decides, key by key, whether a top-level field of an
//! imported document stays in the main shard or moves to a named side
//! shard. Policies are pure routing: they never see the store.

use serde_json::Value;

/// Routes one top-level key of an imported document.
pub trait SplitPolicy: Send + Sync {
    /// Returns the shard name for this key, or `None` to keep it in the
    /// main shard.
    fn route(&self, key: &str, value: &Value) -> Option<String>;
}

/// Routes keys by prefix. Rules are checked in registration order and
/// the first matching prefix wins, so overlapping prefixes behave
/// predictably ("inventory_weapon_" before "inventory_").
#[derive(Default)]
pub struct PrefixPolicy {
    rules: Vec<(String, String)>,
}

impl PrefixPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a prefix rule. Keys starting with `prefix` go to `shard`.
    pub fn add_rule(mut self, prefix: impl Into<String>, shard: impl Into<String>) -> Self {
        self.rules.push((prefix.into(), shard.into()));
        self
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl SplitPolicy for PrefixPolicy {
    fn route(&self, key: &str, _value: &Value) -> Option<String> {
        self.rules
            .iter()
            .find(|(prefix, _)| key.starts_with(prefix.as_str()))
            .map(|(_, shard)| shard.clone())
    }
}

/// Routes oversized values into per-key shards named `large_<key>`.
///
/// Size is measured on the compact JSON serialization of the value.
pub struct SizePolicy {
    threshold_bytes: usize,
}

impl SizePolicy {
    pub fn new(threshold_bytes: usize) -> Self {
        Self { threshold_bytes }
    }
}

impl SplitPolicy for SizePolicy {
    fn route(&self, key: &str, value: &Value) -> Option<String> {
        let serialized = serde_json::to_string(value).unwrap_or_default();
        if serialized.len() > self.threshold_bytes {
            Some(format!("large_{key}"))
        } else {
            None
        }
    }
}

/// Chains policies; the first one to claim a key wins.
#[derive(Default)]
pub struct CompositePolicy {
    policies: Vec<Box<dyn SplitPolicy>>,
}

impl CompositePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, policy: Box<dyn SplitPolicy>) -> Self {
        self.policies.push(policy);
        self
    }
}

impl SplitPolicy for CompositePolicy {
    fn route(&self, key: &str, value: &Value) -> Option<String> {
        self.policies
            .iter()
            .find_map(|policy| policy.route(key, value))
    }
}
