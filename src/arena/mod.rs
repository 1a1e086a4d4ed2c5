//! Bump-pointer arena with tracked overflow allocations.
//!
//! # Data Flow
//! ```text
//! alloc(n)
//!     → round n up to 8 bytes
//!     → primary buffer has room?  bump offset, return Primary handle
//!     → else                      heap block pushed on overflow list
//!
//! reset()
//!     → drop every overflow block, rewind offset, bump generation
//!     → every handle from the previous generation now reads as None
//! ```
//!
//! # Design Decisions
//! - Handles (arena id + generation + region) instead of raw pointers: a
//!   handle kept across `reset`, or handed to another arena, cannot reach
//!   foreign or recycled storage
//! - Exhaustion is reported as `None`, never a panic or abort
//! - The overflow index grows by `2 * slots + 10`; an optional byte limit
//!   caps total overflow so exhaustion can be configured
//! - Not thread-safe; callers serialize access (`&mut self` for writes)

pub mod handle;

pub use handle::{Allocation, ArenaStr, Region};

use std::sync::atomic::{AtomicU32, Ordering};

use serde::Serialize;

/// Allocation granularity in bytes.
pub const ALIGNMENT: usize = 8;

/// Default primary buffer size: 512 eight-byte atoms.
pub const DEFAULT_PRIMARY_SIZE: usize = 512 * ALIGNMENT;

/// Fixed increment applied when the overflow index grows.
const OVERFLOW_SLOT_INC: usize = 10;

/// Source of per-arena ids stamped into every handle.
static NEXT_ARENA_ID: AtomicU32 = AtomicU32::new(0);

/// Round `size` up to the next multiple of [`ALIGNMENT`].
pub fn align_up(size: usize) -> Option<usize> {
    size.checked_add(ALIGNMENT - 1).map(|s| s & !(ALIGNMENT - 1))
}

/// Point-in-time view of arena usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArenaStats {
    pub primary_size: usize,
    pub bump_offset: usize,
    pub overflow_count: usize,
    pub overflow_slots: usize,
    pub overflow_bytes: usize,
    pub generation: u64,
}

/// A bump allocator over a fixed primary buffer plus heap overflow.
#[derive(Debug)]
pub struct Arena {
    id: u32,
    primary: Box<[u8]>,
    offset: usize,
    overflow: Vec<Box<[u8]>>,
    overflow_slots: usize,
    overflow_bytes: usize,
    overflow_limit: Option<usize>,
    generation: u64,
}

impl Arena {
    /// Open an arena with a zeroed primary buffer of `primary_size` bytes.
    pub fn new(primary_size: usize) -> Self {
        Self::with_buffer(vec![0u8; primary_size].into_boxed_slice())
    }

    /// Open an arena over caller-supplied primary storage.
    pub fn with_buffer(buffer: Box<[u8]>) -> Self {
        Self {
            id: NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed),
            primary: buffer,
            offset: 0,
            overflow: Vec::new(),
            overflow_slots: 0,
            overflow_bytes: 0,
            overflow_limit: None,
            generation: 0,
        }
    }

    /// Cap the total number of bytes the overflow list may hold.
    pub fn with_overflow_limit(mut self, limit: Option<usize>) -> Self {
        self.overflow_limit = limit;
        self
    }

    /// Allocate `size` bytes, rounded up to the arena alignment.
    ///
    /// Returns `None` when neither the primary buffer nor the heap can
    /// satisfy the request.
    pub fn alloc(&mut self, size: usize) -> Option<Allocation> {
        let rounded = align_up(size)?;
        if self.primary.len() - self.offset >= rounded {
            let offset = self.offset;
            self.offset += rounded;
            return Some(Allocation {
                arena: self.id,
                generation: self.generation,
                region: Region::Primary { offset },
                len: size,
            });
        }
        self.overflow_alloc(size, rounded)
    }

    fn overflow_alloc(&mut self, size: usize, rounded: usize) -> Option<Allocation> {
        if let Some(limit) = self.overflow_limit {
            if self.overflow_bytes.checked_add(rounded)? > limit {
                tracing::debug!(
                    requested = rounded,
                    overflow_bytes = self.overflow_bytes,
                    limit,
                    "Arena overflow limit reached"
                );
                return None;
            }
        }

        if self.overflow.len() == self.overflow_slots {
            let slots = self
                .overflow_slots
                .checked_mul(2)?
                .checked_add(OVERFLOW_SLOT_INC)?;
            if self
                .overflow
                .try_reserve_exact(slots - self.overflow.len())
                .is_err()
            {
                tracing::error!(slots, "Failed to grow arena overflow index");
                return None;
            }
            self.overflow_slots = slots;
        }

        let mut block = Vec::new();
        if block.try_reserve_exact(rounded).is_err() {
            tracing::error!(size = rounded, "Arena overflow allocation failed");
            return None;
        }
        block.resize(rounded, 0);

        let slot = self.overflow.len();
        self.overflow.push(block.into_boxed_slice());
        self.overflow_bytes += rounded;

        Some(Allocation {
            arena: self.id,
            generation: self.generation,
            region: Region::Overflow { slot },
            len: size,
        })
    }

    /// Allocate a block and fill it with `data`.
    pub fn alloc_bytes(&mut self, data: &[u8]) -> Option<Allocation> {
        let block = self.alloc(data.len())?;
        self.bytes_mut(block)?.copy_from_slice(data);
        Some(block)
    }

    /// Allocate `new_size` bytes and copy `old_size` bytes from `old`.
    ///
    /// Never grows in place. `old` stays readable until the next reset.
    pub fn realloc_copy(
        &mut self,
        new_size: usize,
        old: Option<Allocation>,
        old_size: usize,
    ) -> Option<Allocation> {
        let carried = match old {
            Some(block) => {
                let bytes = self.bytes(block)?;
                let n = old_size.min(bytes.len()).min(new_size);
                bytes[..n].to_vec()
            }
            None if old_size > 0 => return None,
            None => Vec::new(),
        };

        let fresh = self.alloc(new_size)?;
        self.bytes_mut(fresh)?[..carried.len()].copy_from_slice(&carried);
        Some(fresh)
    }

    /// Copy `s` into the arena.
    ///
    /// The empty string is returned as [`ArenaStr::EMPTY`] without
    /// allocating.
    pub fn dup_str(&mut self, s: &str) -> Option<ArenaStr> {
        if s.is_empty() {
            return Some(ArenaStr::EMPTY);
        }
        self.alloc_bytes(s.as_bytes()).map(|a| ArenaStr(Some(a)))
    }

    /// Whether `block` came from this arena in its current generation.
    pub fn owns(&self, block: Allocation) -> bool {
        block.arena == self.id && block.generation == self.generation
    }

    /// Borrow the bytes of a live allocation.
    pub fn bytes(&self, block: Allocation) -> Option<&[u8]> {
        if !self.owns(block) {
            return None;
        }
        match block.region {
            Region::Primary { offset } => self.primary.get(offset..offset.checked_add(block.len)?),
            Region::Overflow { slot } => self.overflow.get(slot)?.get(..block.len),
        }
    }

    /// Mutably borrow the bytes of a live allocation.
    pub fn bytes_mut(&mut self, block: Allocation) -> Option<&mut [u8]> {
        if !self.owns(block) {
            return None;
        }
        match block.region {
            Region::Primary { offset } => self
                .primary
                .get_mut(offset..offset.checked_add(block.len)?),
            Region::Overflow { slot } => self.overflow.get_mut(slot)?.get_mut(..block.len),
        }
    }

    /// Borrow text previously stored with [`dup_str`](Self::dup_str).
    pub fn str(&self, s: ArenaStr) -> Option<&str> {
        match s.0 {
            None => Some(""),
            Some(block) => std::str::from_utf8(self.bytes(block)?).ok(),
        }
    }

    /// Free every overflow block and rewind the bump offset.
    ///
    /// All handles issued before the reset become unreadable.
    pub fn reset(&mut self) {
        self.primary[..self.offset].fill(0);
        self.offset = 0;
        self.overflow.clear();
        self.overflow_bytes = 0;
        self.generation += 1;
    }

    /// Reset, then release the overflow index itself.
    pub fn close(mut self) {
        self.reset();
        self.overflow = Vec::new();
        self.overflow_slots = 0;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            primary_size: self.primary.len(),
            bump_offset: self.offset,
            overflow_count: self.overflow.len(),
            overflow_slots: self.overflow_slots,
            overflow_bytes: self.overflow_bytes,
            generation: self.generation,
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(DEFAULT_PRIMARY_SIZE)
    }
}
