//! Key-value batch command types.
//!
//! Commands are issued in batches that the store executes as one
//! indivisible unit; per-command outputs become visible only after the
//! whole batch is acknowledged.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::MAX_BATCH_COMMANDS;
use crate::constants::MAX_KEY_SIZE;
use crate::constants::MAX_VALUE_SIZE;
use crate::error::KeyValueStoreError;

/// A single command within an atomic batch.
///
/// Sorted-set commands operate on score-ordered sets with unique string
/// members; hash commands operate on field/value records. `Expire`
/// attaches or refreshes a time-to-live on a whole key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum StoreCommand {
    /// Add a member with the given score to a sorted set.
    SortedSetAdd { key: String, score: f64, member: String },
    /// Remove all members whose score lies in `[min, max]` (inclusive).
    SortedSetRemoveRangeByScore { key: String, min: f64, max: f64 },
    /// Count the members of a sorted set.
    SortedSetCard { key: String },
    /// Set a single field of a hash.
    HashSet { key: String, field: String, value: String },
    /// Read a single field of a hash.
    HashGet { key: String, field: String },
    /// Read all fields of a hash.
    HashGetAll { key: String },
    /// Increment an integer hash field by a signed delta.
    HashIncrBy { key: String, field: String, delta: i64 },
    /// Set or refresh a key's time-to-live.
    Expire { key: String, ttl_seconds: u32 },
}

impl StoreCommand {
    /// The key this command addresses.
    pub fn key(&self) -> &str {
        match self {
            StoreCommand::SortedSetAdd { key, .. }
            | StoreCommand::SortedSetRemoveRangeByScore { key, .. }
            | StoreCommand::SortedSetCard { key }
            | StoreCommand::HashSet { key, .. }
            | StoreCommand::HashGet { key, .. }
            | StoreCommand::HashGetAll { key }
            | StoreCommand::HashIncrBy { key, .. }
            | StoreCommand::Expire { key, .. } => key,
        }
    }
}

/// Output of a single command, positionally aligned with its batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CommandOutput {
    /// Integer reply: cardinality, members removed, fields newly
    /// created, post-increment value, or expiry acknowledgement (1/0).
    Integer(i64),
    /// Single-field read; `None` when the field or key is absent.
    Value(Option<String>),
    /// Whole-hash read; empty when the key is absent.
    Fields(BTreeMap<String, String>),
}

/// Request to execute a batch of commands as one indivisible unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchRequest {
    pub commands: Vec<StoreCommand>,
}

impl BatchRequest {
    /// Create a batch from a list of commands.
    pub fn new(commands: Vec<StoreCommand>) -> Self {
        Self { commands }
    }

    /// Create a batch holding a single command.
    pub fn single(command: StoreCommand) -> Self {
        Self {
            commands: vec![command],
        }
    }
}

/// Per-command outputs of an acknowledged batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchResult {
    pub outputs: Vec<CommandOutput>,
}

impl BatchResult {
    /// Integer output at `index`, if the command produced one.
    pub fn integer(&self, index: usize) -> Option<i64> {
        match self.outputs.get(index) {
            Some(CommandOutput::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    /// Single-field read output at `index`, if the command produced one.
    ///
    /// The outer `Option` is reply-shape presence; the inner one is
    /// field absence.
    pub fn value(&self, index: usize) -> Option<Option<&str>> {
        match self.outputs.get(index) {
            Some(CommandOutput::Value(v)) => Some(v.as_deref()),
            _ => None,
        }
    }

    /// Whole-hash read output at `index`, if the command produced one.
    pub fn fields(&self, index: usize) -> Option<&BTreeMap<String, String>> {
        match self.outputs.get(index) {
            Some(CommandOutput::Fields(fields)) => Some(fields),
            _ => None,
        }
    }
}

/// Validate a batch against fixed size limits.
///
/// Run before submission so that no command of an invalid batch ever
/// reaches the store.
pub fn validate_batch(request: &BatchRequest) -> Result<(), KeyValueStoreError> {
    if request.commands.is_empty() {
        return Err(KeyValueStoreError::EmptyBatch);
    }
    if request.commands.len() > MAX_BATCH_COMMANDS as usize {
        return Err(KeyValueStoreError::BatchTooLarge {
            size: request.commands.len() as u32,
            max: MAX_BATCH_COMMANDS,
        });
    }

    let check_key = |key: &str| {
        if key.is_empty() {
            return Err(KeyValueStoreError::EmptyKey);
        }
        let len = key.len();
        if len > MAX_KEY_SIZE as usize {
            Err(KeyValueStoreError::KeyTooLarge {
                size: len as u32,
                max: MAX_KEY_SIZE,
            })
        } else {
            Ok(())
        }
    };

    let check_value = |value: &str| {
        let len = value.len();
        if len > MAX_VALUE_SIZE as usize {
            Err(KeyValueStoreError::ValueTooLarge {
                size: len as u32,
                max: MAX_VALUE_SIZE,
            })
        } else {
            Ok(())
        }
    };

    let check_score = |key: &str, score: f64| {
        if score.is_finite() {
            Ok(())
        } else {
            Err(KeyValueStoreError::NonFiniteScore { key: key.to_string() })
        }
    };

    for command in &request.commands {
        check_key(command.key())?;
        match command {
            StoreCommand::SortedSetAdd { key, score, member } => {
                check_score(key, *score)?;
                check_key(member)?;
            }
            StoreCommand::SortedSetRemoveRangeByScore { .. } => {
                // Range bounds may be infinite: open-ended pruning.
            }
            StoreCommand::SortedSetCard { .. } => {}
            StoreCommand::HashSet { field, value, .. } => {
                check_key(field)?;
                check_value(value)?;
            }
            StoreCommand::HashGet { field, .. } | StoreCommand::HashIncrBy { field, .. } => {
                check_key(field)?;
            }
            StoreCommand::HashGetAll { .. } => {}
            StoreCommand::Expire { .. } => {}
        }
    }

    Ok(())
}
