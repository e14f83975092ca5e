//! # In-memory database
//!
//! The core of this project. Keys are sharded across a fixed number of
//! buckets so that unrelated keys rarely contend on the same lock.
//!
//! Versions are tracked in a map kept separate from the values themselves:
//! a key's version survives deletion and recreation, which is what lets
//! `WATCH` detect "this key was touched, even if it no longer holds the
//! same value" instead of just "this key now holds a different value".
pub mod pool;
pub mod utils;

use crate::{error::Error, value::Value};
use bytes::Bytes;
use glob::Pattern;
use parking_lot::RwLock;
use seahash::hash;
use std::collections::HashMap;

const DEFAULT_SLOTS: usize = 256;

#[derive(Debug, Default)]
struct Shard {
    values: HashMap<Bytes, Value>,
    versions: HashMap<Bytes, u32>,
}

/// A single logical Redis database (what `SELECT` switches between).
#[derive(Debug)]
pub struct Db {
    shards: Vec<RwLock<Shard>>,
}

impl Db {
    /// Creates an empty database with the default number of shards.
    pub fn new() -> Self {
        Self::with_slots(DEFAULT_SLOTS)
    }

    /// Creates an empty database with a specific number of shards, mainly
    /// useful to keep tests deterministic.
    pub fn with_slots(slots: usize) -> Self {
        let mut shards = Vec::with_capacity(slots);
        shards.resize_with(slots, RwLock::default);
        Self { shards }
    }

    #[inline]
    fn slot(&self, key: &Bytes) -> &RwLock<Shard> {
        &self.shards[(hash(key) as usize) % self.shards.len()]
    }

    /// Current version counter for `key`. Keys never seen before are at
    /// version 0.
    pub fn get_version(&self, key: &Bytes) -> u32 {
        self.slot(key).read().versions.get(key).copied().unwrap_or(0)
    }

    /// Bumps and returns the version counter for `key`. Called once per
    /// write-key before a command runs, regardless of whether the command
    /// ends up creating, mutating or deleting the key.
    pub fn bump_version(&self, key: &Bytes) -> u32 {
        let mut shard = self.slot(key).write();
        let version = shard.versions.entry(key.clone()).or_insert(0);
        *version += 1;
        *version
    }

    /// Returns a clone of the value stored at `key`, or `Value::Null`.
    pub fn get(&self, key: &Bytes) -> Value {
        self.slot(key)
            .read()
            .values
            .get(key)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Runs `found` with a reference to the value at `key` while the shard
    /// lock is held, or `not_found` if the key is absent. Avoids cloning
    /// non-scalar values just to inspect them.
    pub fn get_map_or<F1, F2>(&self, key: &Bytes, found: F1, not_found: F2) -> Result<Value, Error>
    where
        F1: FnOnce(&Value) -> Result<Value, Error>,
        F2: FnOnce() -> Result<Value, Error>,
    {
        let shard = self.slot(key).read();
        match shard.values.get(key) {
            Some(value) => found(value),
            None => {
                drop(shard);
                not_found()
            }
        }
    }

    /// Mutates the value at `key` in place via `f`, inserting `default()`
    /// first if the key is absent. `f` returns the reply.
    pub fn with_entry_or_insert<F, D>(
        &self,
        key: &Bytes,
        default: D,
        f: F,
    ) -> Result<Value, Error>
    where
        F: FnOnce(&mut Value) -> Result<Value, Error>,
        D: FnOnce() -> Value,
    {
        let mut shard = self.slot(key).write();
        let entry = shard.values.entry(key.clone()).or_insert_with(default);
        f(entry)
    }

    /// Stores `value` at `key`, unconditionally replacing anything there.
    pub fn set(&self, key: &Bytes, value: Value) {
        self.slot(key).write().values.insert(key.clone(), value);
    }

    /// `SET` honoring `NX`/`XX`/unconditional semantics. Returns whether the
    /// write happened.
    pub fn set_with_override(
        &self,
        key: &Bytes,
        value: Value,
        over: utils::Override,
    ) -> bool {
        let mut shard = self.slot(key).write();
        let exists = shard.values.contains_key(key);
        let allowed = match over {
            utils::Override::Yes => true,
            utils::Override::No => !exists,
            utils::Override::Only => exists,
        };
        if allowed {
            shard.values.insert(key.clone(), value);
        }
        allowed
    }

    /// Stores `value` at `key` and returns the previous value, if any.
    pub fn getset(&self, key: &Bytes, value: Value) -> Value {
        self.slot(key)
            .write()
            .values
            .insert(key.clone(), value)
            .unwrap_or(Value::Null)
    }

    /// Removes `key`, returning its value, if any.
    pub fn remove(&self, key: &Bytes) -> Option<Value> {
        self.slot(key).write().values.remove(key)
    }

    /// Removes every key in `keys`, returning how many existed.
    pub fn del(&self, keys: &[Bytes]) -> usize {
        keys.iter()
            .filter(|key| self.remove(key).is_some())
            .count()
    }

    /// Counts how many of `keys` exist, counting duplicates.
    pub fn exists(&self, keys: &[Bytes]) -> usize {
        keys.iter()
            .filter(|key| self.slot(key).read().values.contains_key(key.as_ref()))
            .count()
    }

    /// Renames `src` into `dst`, failing if `src` does not exist.
    pub fn rename(&self, src: &Bytes, dst: &Bytes) -> Result<(), Error> {
        let value = self.remove(src).ok_or(Error::NoSuchKey)?;
        self.set(dst, value);
        Ok(())
    }

    /// Renames `src` into `dst` only if `dst` does not exist yet. Returns
    /// whether the rename happened.
    pub fn rename_nx(&self, src: &Bytes, dst: &Bytes) -> Result<bool, Error> {
        if self.exists(std::slice::from_ref(src)) == 0 {
            return Err(Error::NoSuchKey);
        }
        if self.exists(std::slice::from_ref(dst)) > 0 {
            return Ok(false);
        }
        self.rename(src, dst)?;
        Ok(true)
    }

    /// Returns all keys matching a glob pattern.
    pub fn keys(&self, pattern: &str) -> Result<Vec<Bytes>, Error> {
        let pattern = Pattern::new(pattern).map_err(|_| Error::InvalidPattern(pattern.into()))?;
        let mut out = vec![];
        for shard in self.shards.iter() {
            let shard = shard.read();
            for key in shard.values.keys() {
                if pattern.matches(&String::from_utf8_lossy(key)) {
                    out.push(key.clone());
                }
            }
        }
        Ok(out)
    }

    /// Drops every key and its version history.
    pub fn flush(&self) {
        for shard in self.shards.iter() {
            let mut shard = shard.write();
            shard.values.clear();
            shard.versions.clear();
        }
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}
