//! Ordered property map backed by a single arena.
//!
//! # Data Flow
//! ```text
//! loader / caller
//!     → add (append, duplicates allowed) or put (replace-or-insert)
//!     → name copied into the arena, checksum computed, value stored as given
//!
//! hosting agent
//!     → get / typed accessors (first match in insertion order)
//!     → name_at / value_at enumeration
//! ```
//!
//! # Design Decisions
//! - Linear scan with a four byte checksum pre-filter; full string
//!   equality is authoritative
//! - Insertion order is enumeration order; there is no per-entry delete
//! - Entry table grows in steps of 50 slots
//! - Not thread-safe: share resolved maps through [`shared::SharedProperties`]

pub mod accessors;
pub mod entry;
pub mod shared;

pub use entry::{key_checksum, Value};

use serde::Serialize;

use crate::arena::{Arena, ArenaStats, DEFAULT_PRIMARY_SIZE};
use crate::config::schema::MapConfig;
use crate::error::{PropertyError, Result};
use entry::Entry;

/// Slots added to the entry table each time it fills up.
pub const CAPACITY_INC_SIZE: usize = 50;

/// Longest physical line the loader accepts.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 8192;

/// Ceiling on nested reference resolution.
pub const DEFAULT_RECURSION_LIMIT: usize = 20;

/// Ceiling on `$(name)` expansions per value.
pub const DEFAULT_SUBSTITUTION_LIMIT: usize = 20;

/// Static bounds applied by the loader and resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_line_length: usize,
    pub recursion_limit: usize,
    pub substitution_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            substitution_limit: DEFAULT_SUBSTITUTION_LIMIT,
        }
    }
}

/// A name/value pair copied out of a map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyPair {
    pub name: String,
    pub value: String,
}

/// Ordered name → value store.
#[derive(Debug)]
pub struct PropertyMap {
    arena: Arena,
    entries: Vec<Entry>,
    capacity: usize,
    limits: Limits,
}

impl PropertyMap {
    /// Open an empty map with a default-sized arena.
    pub fn new() -> Self {
        Self::with_arena(Arena::new(DEFAULT_PRIMARY_SIZE), Limits::default())
    }

    /// Open an empty map over the given arena.
    pub fn with_arena(arena: Arena, limits: Limits) -> Self {
        Self {
            arena,
            entries: Vec::new(),
            capacity: 0,
            limits,
        }
    }

    /// Open an empty map sized and bounded by `config`.
    pub fn from_config(config: &MapConfig) -> Self {
        let arena = Arena::new(config.arena_bytes).with_overflow_limit(config.overflow_limit_bytes);
        Self::with_arena(arena, config.limits())
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn arena_stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    /// Copy `text` into this map's arena.
    pub fn intern(&mut self, text: &str) -> Result<Value> {
        self.arena
            .dup_str(text)
            .map(Value::Text)
            .ok_or(PropertyError::ArenaExhausted(text.len()))
    }

    /// Resolve a value to text.
    ///
    /// Returns `None` for arena text that no longer belongs to this map's
    /// current generation.
    pub fn text<'a>(&'a self, value: &'a Value) -> Option<&'a str> {
        match value {
            Value::Text(s) => self.arena.str(*s),
            Value::Shared(s) => Some(s.as_ref()),
        }
    }

    fn entry_name(&self, entry: &Entry) -> &str {
        self.arena.str(entry.name).unwrap_or("")
    }

    /// Index of the first entry named `name`.
    pub fn get_id(&self, name: &str) -> Option<usize> {
        let checksum = key_checksum(name);
        self.entries
            .iter()
            .position(|e| e.checksum == checksum && self.entry_name(e) == name)
    }

    /// Value of the first entry named `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.get_id(name).map(|i| &self.entries[i].value)
    }

    /// Text of the first entry named `name`.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| self.text(v))
    }

    /// Text of the first entry named `name`, or `default`.
    pub fn get_string<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get_str(name).unwrap_or(default)
    }

    fn grow(&mut self) -> Result<()> {
        if self.entries.len() < self.capacity {
            return Ok(());
        }
        let capacity = self.capacity + CAPACITY_INC_SIZE;
        self.entries
            .try_reserve_exact(capacity - self.entries.len())
            .map_err(|_| PropertyError::CapacityExhausted(self.capacity))?;
        self.capacity = capacity;
        Ok(())
    }

    fn check_owned(&self, name: &str, value: &Value) -> Result<()> {
        match value {
            Value::Text(s) => match s.allocation() {
                Some(block) if !self.arena.owns(block) => {
                    tracing::error!(name, "Rejecting arena value from another map");
                    Err(PropertyError::ForeignValue(name.to_string()))
                }
                _ => Ok(()),
            },
            Value::Shared(_) => Ok(()),
        }
    }

    /// Append an entry without checking for an existing name.
    ///
    /// `Text` values must come from this map's [`intern`](Self::intern).
    pub fn add(&mut self, name: &str, value: Value) -> Result<()> {
        self.check_owned(name, &value)?;
        self.grow()?;
        let stored = self
            .arena
            .dup_str(name)
            .ok_or(PropertyError::ArenaExhausted(name.len()))?;
        self.entries.push(Entry {
            checksum: key_checksum(name),
            name: stored,
            value,
        });
        Ok(())
    }

    /// Replace the value of `name` in place, or append it.
    ///
    /// Returns the previous value when one was replaced.
    pub fn put(&mut self, name: &str, value: Value) -> Result<Option<Value>> {
        self.check_owned(name, &value)?;
        match self.get_id(name) {
            Some(i) => Ok(Some(std::mem::replace(&mut self.entries[i].value, value))),
            None => self.add(name, value).map(|()| None),
        }
    }

    /// Intern `value` and [`add`](Self::add) it.
    pub fn add_str(&mut self, name: &str, value: &str) -> Result<()> {
        let value = self.intern(value)?;
        self.add(name, value)
    }

    /// Intern `value` and [`put`](Self::put) it.
    pub fn put_str(&mut self, name: &str, value: &str) -> Result<Option<Value>> {
        let value = self.intern(value)?;
        self.put(name, value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| self.entry_name(e))
    }

    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.entries.get(index).map(|e| &e.value)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.entries.iter().map(|e| (self.entry_name(e), &e.value))
    }

    /// Owned copy of every entry, in insertion order.
    pub fn to_pairs(&self) -> Vec<PropertyPair> {
        self.iter()
            .map(|(name, value)| PropertyPair {
                name: name.to_string(),
                value: self.text(value).unwrap_or_default().to_string(),
            })
            .collect()
    }

    /// Log suspicious entries, and every entry at debug level.
    pub fn dump(&self) {
        for (index, (name, value)) in self.iter().enumerate() {
            let text = self.text(value);
            if name.is_empty() {
                tracing::warn!(index, "Map contains empty name");
            }
            if text.map_or(true, str::is_empty) {
                tracing::warn!(name, index, "Map contains empty value");
            }
            tracing::debug!(name, value = text.unwrap_or("(null)"), "Dump of map");
        }
    }

    /// Merge `src` into `dst`, keeping every entry `dst` already has.
    ///
    /// Copied values are duplicated into `dst`'s arena. A failure leaves the
    /// entries copied so far in place.
    pub fn copy(src: &PropertyMap, dst: &mut PropertyMap) -> Result<()> {
        for (name, _) in src.iter() {
            if dst.get(name).is_some() {
                continue;
            }
            let text = src.get_str(name).unwrap_or_default();
            dst.put_str(name, text)?;
        }
        Ok(())
    }

    /// Drop every entry and reset the arena.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.arena.reset();
    }

    /// Release the map and its arena.
    pub fn close(self) {
        self.arena.close();
    }
}

impl Default for PropertyMap {
    fn default() -> Self {
        Self::new()
    }
}
