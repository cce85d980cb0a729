//! Tagged node handles. Bit 0 of the packed representation is the
//! complement edge (BDD only, clear for ADD/ZDD); the remaining bits are a
//! regular `NodeId`. Two handles represent the same function iff they are
//! bit-equal, which is the invariant the whole unique-table design leans on.

use crate::common::NodeId;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    #[inline]
    pub fn regular(node: NodeId) -> Self {
        debug_assert!(node <= (NodeId::MAX >> 1), "node id does not fit the tagged handle");
        Handle(node << 1)
    }

    #[inline]
    pub fn tagged(node: NodeId, complement: bool) -> Self {
        let h = Self::regular(node);
        if complement {
            h.complemented()
        } else {
            h
        }
    }

    #[inline]
    pub fn is_complement(self) -> bool {
        self.0 & 1 == 1
    }

    #[inline]
    pub fn node_id(self) -> NodeId {
        self.0 >> 1
    }

    /// Strips the complement bit, returning the underlying regular handle.
    #[inline]
    pub fn regularized(self) -> Self {
        Handle(self.0 & !1)
    }

    /// Flips the complement bit.
    #[inline]
    pub fn complemented(self) -> Self {
        Handle(self.0 ^ 1)
    }

    /// Raw packed representation, used as a cache/unique-table key component.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_complement() {
            write!(f, "!n{}", self.node_id())
        } else {
            write!(f, "n{}", self.node_id())
        }
    }
}
