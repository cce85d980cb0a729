//! Shared scalar types used across the unique table, cache, and every DD flavor.

use std::hash::BuildHasherDefault;
use wyhash::WyHash;

/// Identifies a variable (its fixed, creation-order identity — not its
/// current position in the order; see [`Level`]).
pub type HeaderId = u32;

/// A stable index into the node arena. Indices are never reused for a live
/// identity while referenced: once a slot is freed it may be recycled by
/// the allocator, but every `Handle` pointing at the old occupant is gone
/// with it (the unique table is the only thing that hands out handles).
pub type NodeId = u32;

/// Position of a variable in the *current* order. Reordering changes levels
/// without changing `HeaderId`s or the functions represented.
pub type Level = u32;

/// Sentinel terminating a unique-table collision chain. Chosen instead of
/// `Option<NodeId>` so the inner probe loop has a single exit condition.
pub const SENTINEL: NodeId = NodeId::MAX;

/// Reserved variable index for constant (leaf) nodes.
pub const MAX_INDEX: HeaderId = HeaderId::MAX;

/// Saturation ceiling for node reference counts.
pub const MAX_REF: u16 = u16::MAX;

/// Number of node-sized cells carved out of each arena chunk. Recovered from
/// the original CUDD implementation's `DD_MEM_CHUNK` constant.
pub const MEM_CHUNK: usize = 1022;

pub type HashMap<T, U> = std::collections::HashMap<T, U, BuildHasherDefault<WyHash>>;
pub type HashSet<T> = std::collections::HashSet<T, BuildHasherDefault<WyHash>>;

/// A hashable, totally-ordered wrapper around `f64` used as the leaf value
/// of ADD nodes and as the constant-table key. NaN is rejected before a
/// value ever reaches this type (see `DdError::InvalidArg`).
#[derive(Debug, Clone, Copy)]
pub struct OrderedF64(pub f64);

impl OrderedF64 {
    #[inline]
    pub fn new(v: f64) -> Option<Self> {
        if v.is_nan() {
            None
        } else {
            Some(Self(v))
        }
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }

    #[inline]
    fn bits(self) -> u64 {
        // -0.0 and 0.0 must hash and compare equal.
        if self.0 == 0.0 {
            0u64
        } else {
            self.0.to_bits()
        }
    }
}

impl PartialEq for OrderedF64 {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for OrderedF64 {}

impl std::hash::Hash for OrderedF64 {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl std::fmt::Display for OrderedF64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
