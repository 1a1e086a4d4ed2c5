//! Handles returned by the arena.
//!
//! A handle records which arena produced it and in which generation. Once
//! the arena is reset the generation moves on and every older handle
//! resolves to `None`; a handle presented to a different arena never
//! resolves at all.

/// Where an allocation lives inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Offset into the primary (inline) buffer.
    Primary { offset: usize },
    /// Index into the overflow list.
    Overflow { slot: usize },
}

/// A block of bytes handed out by [`Arena::alloc`](super::Arena::alloc).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Allocation {
    pub(crate) arena: u32,
    pub(crate) generation: u64,
    pub(crate) region: Region,
    pub(crate) len: usize,
}

impl Allocation {
    /// Requested size in bytes (before alignment).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Location of the block.
    pub fn region(&self) -> Region {
        self.region
    }

    /// Offset into the primary buffer, if the block lives there.
    pub fn primary_offset(&self) -> Option<usize> {
        match self.region {
            Region::Primary { offset } => Some(offset),
            Region::Overflow { .. } => None,
        }
    }

    /// Generation of the arena that produced this block.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Id of the arena that produced this block.
    pub fn arena_id(&self) -> u32 {
        self.arena
    }
}

/// UTF-8 text duplicated into an arena.
///
/// The empty string is a distinguished value that owns no storage and
/// stays readable across resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArenaStr(pub(crate) Option<Allocation>);

impl ArenaStr {
    /// The shared empty string.
    pub const EMPTY: ArenaStr = ArenaStr(None);

    /// Length of the text in bytes.
    pub fn len(&self) -> usize {
        self.0.map_or(0, |a| a.len)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Underlying allocation, `None` for the empty string.
    pub fn allocation(&self) -> Option<Allocation> {
        self.0
    }
}

impl Default for ArenaStr {
    fn default() -> Self {
        Self::EMPTY
    }
}
