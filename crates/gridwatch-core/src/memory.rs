//! Deterministic in-memory key-value store.
//!
//! This backend is thread-safe and supports every [`StoreCommand`] with
//! predictable behavior, giving both gridwatch crates a store to test
//! against without external infrastructure. Production deployments are
//! expected to put a transactional remote store behind the same trait.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::KeyValueStoreError;
use crate::kv::BatchRequest;
use crate::kv::BatchResult;
use crate::kv::CommandOutput;
use crate::kv::StoreCommand;
use crate::kv::validate_batch;
use crate::time::now_unix_ms;
use crate::traits::KeyValueStore;

/// A stored structure: sorted set (member -> score) or hash (field -> value).
#[derive(Clone)]
enum StoredValue {
    SortedSet(BTreeMap<String, f64>),
    Hash(BTreeMap<String, String>),
}

impl StoredValue {
    fn type_name(&self) -> &'static str {
        match self {
            StoredValue::SortedSet(_) => "sorted set",
            StoredValue::Hash(_) => "hash",
        }
    }
}

/// A value with an optional expiry deadline.
#[derive(Clone)]
struct StoredEntry {
    value: StoredValue,
    expires_at_ms: Option<u64>,
}

/// Deterministic in-memory store with atomic batch execution.
///
/// Batches take the write lock for their whole duration, so no two
/// batches interleave. Commands are applied to a staged copy of the
/// tree that replaces the live tree only when every command succeeded;
/// a failed batch leaves no partial effects.
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, StoredEntry>>,
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

impl MemoryKeyValueStore {
    /// Create a new store wrapped in Arc.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

fn wrong_type(key: &str, expected: &'static str, actual: &'static str) -> KeyValueStoreError {
    KeyValueStoreError::WrongType {
        key: key.to_string(),
        expected,
        actual,
    }
}

fn apply(
    entries: &mut BTreeMap<String, StoredEntry>,
    command: &StoreCommand,
    now_ms: u64,
) -> Result<CommandOutput, KeyValueStoreError> {
    match command {
        StoreCommand::SortedSetAdd { key, score, member } => {
            let entry = entries.entry(key.clone()).or_insert_with(|| StoredEntry {
                value: StoredValue::SortedSet(BTreeMap::new()),
                expires_at_ms: None,
            });
            match &mut entry.value {
                StoredValue::SortedSet(members) => {
                    let inserted = members.insert(member.clone(), *score).is_none();
                    Ok(CommandOutput::Integer(i64::from(inserted)))
                }
                other => Err(wrong_type(key, "sorted set", other.type_name())),
            }
        }
        StoreCommand::SortedSetRemoveRangeByScore { key, min, max } => {
            let Some(entry) = entries.get_mut(key) else {
                return Ok(CommandOutput::Integer(0));
            };
            match &mut entry.value {
                StoredValue::SortedSet(members) => {
                    let before = members.len();
                    members.retain(|_, score| *score < *min || *score > *max);
                    let removed = before - members.len();
                    if members.is_empty() {
                        entries.remove(key);
                    }
                    Ok(CommandOutput::Integer(removed as i64))
                }
                other => Err(wrong_type(key, "sorted set", other.type_name())),
            }
        }
        StoreCommand::SortedSetCard { key } => match entries.get(key) {
            None => Ok(CommandOutput::Integer(0)),
            Some(entry) => match &entry.value {
                StoredValue::SortedSet(members) => Ok(CommandOutput::Integer(members.len() as i64)),
                other => Err(wrong_type(key, "sorted set", other.type_name())),
            },
        },
        StoreCommand::HashSet { key, field, value } => {
            let entry = entries.entry(key.clone()).or_insert_with(|| StoredEntry {
                value: StoredValue::Hash(BTreeMap::new()),
                expires_at_ms: None,
            });
            match &mut entry.value {
                StoredValue::Hash(fields) => {
                    let created = fields.insert(field.clone(), value.clone()).is_none();
                    Ok(CommandOutput::Integer(i64::from(created)))
                }
                other => Err(wrong_type(key, "hash", other.type_name())),
            }
        }
        StoreCommand::HashGet { key, field } => match entries.get(key) {
            None => Ok(CommandOutput::Value(None)),
            Some(entry) => match &entry.value {
                StoredValue::Hash(fields) => Ok(CommandOutput::Value(fields.get(field).cloned())),
                other => Err(wrong_type(key, "hash", other.type_name())),
            },
        },
        StoreCommand::HashGetAll { key } => match entries.get(key) {
            None => Ok(CommandOutput::Fields(BTreeMap::new())),
            Some(entry) => match &entry.value {
                StoredValue::Hash(fields) => Ok(CommandOutput::Fields(fields.clone())),
                other => Err(wrong_type(key, "hash", other.type_name())),
            },
        },
        StoreCommand::HashIncrBy { key, field, delta } => {
            let entry = entries.entry(key.clone()).or_insert_with(|| StoredEntry {
                value: StoredValue::Hash(BTreeMap::new()),
                expires_at_ms: None,
            });
            match &mut entry.value {
                StoredValue::Hash(fields) => {
                    let current: i64 = match fields.get(field) {
                        None => 0,
                        Some(raw) => raw.parse().map_err(|_| KeyValueStoreError::Failed {
                            reason: format!("hash field '{field}' of key '{key}' is not an integer"),
                        })?,
                    };
                    let next = current.checked_add(*delta).ok_or_else(|| KeyValueStoreError::Failed {
                        reason: format!("hash field '{field}' of key '{key}' overflowed"),
                    })?;
                    fields.insert(field.clone(), next.to_string());
                    Ok(CommandOutput::Integer(next))
                }
                other => Err(wrong_type(key, "hash", other.type_name())),
            }
        }
        StoreCommand::Expire { key, ttl_seconds } => match entries.get_mut(key) {
            None => Ok(CommandOutput::Integer(0)),
            Some(entry) => {
                entry.expires_at_ms = Some(now_ms + u64::from(*ttl_seconds) * 1000);
                Ok(CommandOutput::Integer(1))
            }
        },
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn execute(&self, request: BatchRequest) -> Result<BatchResult, KeyValueStoreError> {
        validate_batch(&request)?;

        let now_ms = now_unix_ms();
        let mut entries = self.entries.write().await;

        let mut staged = entries.clone();
        staged.retain(|_, entry| entry.expires_at_ms.is_none_or(|deadline| deadline > now_ms));

        let mut outputs = Vec::with_capacity(request.commands.len());
        for command in &request.commands {
            outputs.push(apply(&mut staged, command, now_ms)?);
        }

        *entries = staged;
        Ok(BatchResult { outputs })
    }
}
