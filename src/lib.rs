//! savevault - an encrypted, sharded, tamper-resistant save-store
//!
//! A logical save is split across independently addressable shards
//! ("tables"): one reserved `main` shard plus zero or more named shards.
//! Every shard payload travels through the same envelope on its way to
//! disk: checksum stamp, optional compression, authenticated encryption.
//! Reads reverse the path and fail closed on any tamper signal.

pub mod cache;
pub mod codec;
pub mod executor;
pub mod import;
pub mod integrity;
pub mod logging;
pub mod metrics;
pub mod probe;
pub mod record;
pub mod store;
pub mod vault;
