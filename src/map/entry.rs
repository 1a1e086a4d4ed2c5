//! Map entries and stored values.

use std::sync::Arc;

use crate::arena::ArenaStr;

/// Pack the first four bytes of `name` into an integer.
///
/// Used as a cheap pre-filter before comparing full names; distinct names
/// sharing a four byte prefix collide, so equality is always confirmed on
/// the full string.
pub fn key_checksum(name: &str) -> u32 {
    let mut bytes = name.bytes();
    let mut checksum = 0u32;
    for _ in 0..4 {
        checksum = (checksum << 8) | bytes.next().map_or(0, u32::from);
    }
    checksum
}

/// A value stored in a [`PropertyMap`](super::PropertyMap).
///
/// The map owns key storage; value storage belongs to whoever built the
/// value. `Text` lives in the map's arena (see
/// [`PropertyMap::intern`](super::PropertyMap::intern)), `Shared` is owned by
/// the caller and only reference-counted by the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Text held in the owning map's arena.
    Text(ArenaStr),
    /// Caller-owned text.
    Shared(Arc<str>),
}

impl Value {
    pub fn shared(text: impl Into<Arc<str>>) -> Self {
        Value::Shared(text.into())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) checksum: u32,
    pub(crate) name: ArenaStr,
    pub(crate) value: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_packs_prefix() {
        assert_eq!(key_checksum(""), 0);
        assert_eq!(key_checksum("a"), 0x6100_0000);
        assert_eq!(key_checksum("ab"), 0x6162_0000);
        assert_eq!(key_checksum("abcd"), 0x6162_6364);
        assert_eq!(key_checksum("abcdef"), key_checksum("abcdxy"));
    }
}
