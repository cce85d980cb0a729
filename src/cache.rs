//! The computed/memoization cache: a flat, direct-mapped table keyed by
//! `(tag, up to three operands)`. Tags are a plain `u8` enum field, never
//! packed into operand pointer bits — DESIGN NOTES calls that pattern out
//! explicitly as something to avoid in a non-C rendition.

use crate::handle::Handle;
use std::hash::{Hash, Hasher};
use wyhash::WyHash;

/// Operator identity. Values are grouped by two-hex-digit range the way the
/// original's `DD_*_TAG` constants were, purely as a documentation aid —
/// nothing in this implementation relies on the grouping for correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    BddNot = 0x01,
    BddAnd = 0x02,
    BddOr = 0x03,
    BddXor = 0x04,
    BddExistAbstract = 0x05,
    BddUnivAbstract = 0x06,
    BddBooleanDiff = 0x07,
    BddIteConstant = 0x08,
    BddLeq = 0x09,

    BddIte = 0x11,
    XorExistAbstract = 0x12,
    AddApply = 0x13,
    AddIte = 0x14,
    AddCompose = 0x15,

    ZddUnion = 0x21,
    ZddIntersect = 0x22,
    ZddDiff = 0x23,
    ZddProduct = 0x24,
    ZddWeakDiv = 0x25,
    ZddDivide = 0x26,
    ZddUnateProduct = 0x27,
    ZddChange = 0x28,
    ZddSubset0 = 0x29,
    ZddSubset1 = 0x2a,
}

/// `op` distinguishes between otherwise-identical `(Tag, f, g)` triples
/// coming from distinct ADD leaf operators (plus/times/min/max/threshold),
/// since they all route through the shared `AddApply` tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    tag: Tag,
    op: u8,
    f: Handle,
    g: Handle,
    h: Handle,
}

#[derive(Clone, Copy)]
struct Slot {
    valid: bool,
    key: Key,
    result: Handle,
}

pub struct ComputedCache {
    slots: Vec<Slot>,
    hits: u64,
    lookups: u64,
}

// Placeholder operand for unused key slots. `valid` gates every real read,
// so this never needs to be distinguishable from a legitimate handle.
fn empty_handle() -> Handle {
    Handle::regular(0)
}

impl ComputedCache {
    pub fn new(initial_slots: usize) -> Self {
        let n = initial_slots.next_power_of_two().max(16);
        Self {
            slots: vec![
                Slot {
                    valid: false,
                    key: Key {
                        tag: Tag::BddNot,
                        op: 0,
                        f: empty_handle(),
                        g: empty_handle(),
                        h: empty_handle(),
                    },
                    result: empty_handle(),
                };
                n
            ],
            hits: 0,
            lookups: 0,
        }
    }

    #[inline]
    fn hash_key(&self, key: &Key) -> usize {
        let mut hasher = WyHash::default();
        key.tag.hash(&mut hasher);
        key.op.hash(&mut hasher);
        key.f.hash(&mut hasher);
        key.g.hash(&mut hasher);
        key.h.hash(&mut hasher);
        (hasher.finish() as usize) & (self.slots.len() - 1)
    }

    fn lookup_raw(&mut self, key: Key) -> Option<Handle> {
        self.lookups += 1;
        let idx = self.hash_key(&key);
        let slot = &self.slots[idx];
        if slot.valid && slot.key == key {
            self.hits += 1;
            Some(slot.result)
        } else {
            None
        }
    }

    fn insert_raw(&mut self, key: Key, result: Handle) {
        let idx = self.hash_key(&key);
        self.slots[idx] = Slot {
            valid: true,
            key,
            result,
        };
    }

    pub fn lookup1(&mut self, tag: Tag, f: Handle) -> Option<Handle> {
        self.lookup_raw(Key {
            tag,
            op: 0,
            f,
            g: empty_handle(),
            h: empty_handle(),
        })
    }

    pub fn insert1(&mut self, tag: Tag, f: Handle, result: Handle) {
        self.insert_raw(
            Key {
                tag,
                op: 0,
                f,
                g: empty_handle(),
                h: empty_handle(),
            },
            result,
        );
    }

    pub fn lookup2(&mut self, tag: Tag, f: Handle, g: Handle) -> Option<Handle> {
        self.lookup_raw(Key {
            tag,
            op: 0,
            f,
            g,
            h: empty_handle(),
        })
    }

    pub fn insert2(&mut self, tag: Tag, f: Handle, g: Handle, result: Handle) {
        self.insert_raw(
            Key {
                tag,
                op: 0,
                f,
                g,
                h: empty_handle(),
            },
            result,
        );
    }

    pub fn lookup2_op(&mut self, tag: Tag, op: u8, f: Handle, g: Handle) -> Option<Handle> {
        self.lookup_raw(Key {
            tag,
            op,
            f,
            g,
            h: empty_handle(),
        })
    }

    pub fn insert2_op(&mut self, tag: Tag, op: u8, f: Handle, g: Handle, result: Handle) {
        self.insert_raw(
            Key {
                tag,
                op,
                f,
                g,
                h: empty_handle(),
            },
            result,
        );
    }

    pub fn lookup3(&mut self, tag: Tag, f: Handle, g: Handle, h: Handle) -> Option<Handle> {
        self.lookup_raw(Key { tag, op: 0, f, g, h })
    }

    pub fn insert3(&mut self, tag: Tag, f: Handle, g: Handle, h: Handle, result: Handle) {
        self.insert_raw(Key { tag, op: 0, f, g, h }, result);
    }

    pub fn len_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn hit_ratio(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }

    /// Unconditional flush, used before any reordering pass.
    pub fn flush(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.valid = false;
        }
        self.hits = 0;
        self.lookups = 0;
    }

    /// Doubles capacity. No entry is preserved verbatim (a straight rehash
    /// would just scatter them again); callers re-populate organically as
    /// operators re-run.
    pub fn grow(&mut self) {
        let n = self.slots.len() * 2;
        self.slots = vec![
            Slot {
                valid: false,
                key: Key {
                    tag: Tag::BddNot,
                    op: 0,
                    f: empty_handle(),
                    g: empty_handle(),
                    h: empty_handle(),
                },
                result: empty_handle(),
            };
            n
        ];
        self.hits = 0;
        self.lookups = 0;
    }

    /// Invalidates every slot whose operands or result are reported dead by
    /// `is_dead`. Called once per GC sweep.
    pub fn scrub(&mut self, is_dead: impl Fn(Handle) -> bool) {
        for slot in self.slots.iter_mut() {
            if !slot.valid {
                continue;
            }
            let k = &slot.key;
            if is_dead(k.f) || is_dead(k.g) || is_dead(k.h) || is_dead(slot.result) {
                slot.valid = false;
            }
        }
    }
}
