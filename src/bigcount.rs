//! Arbitrary-precision counting. A BDD or ZDD over a few hundred variables
//! can represent more satisfying assignments/combinations than fit in a
//! fixed-width integer, so the count is abstracted behind the [`BigCount`]
//! trait instead of hard-coding one representation. [`U128Count`] is the
//! default implementation: good enough for any diagram whose count fits in
//! 128 bits, which covers every documented scenario here. A caller who
//! needs wider counts can implement the trait over `num-bigint` or similar
//! without touching the traversal code below.

use crate::common::{HashMap, Level};
use crate::handle::Handle;
use crate::manager::Manager;

pub trait BigCount: Clone {
    fn zero() -> Self;
    fn one() -> Self;
    fn add(&self, other: &Self) -> Self;
    /// Multiply by `2^bits` — how a skipped, don't-care BDD level folds into
    /// the running count.
    fn shl(&self, bits: u32) -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct U128Count(pub u128);

impl BigCount for U128Count {
    fn zero() -> Self {
        U128Count(0)
    }

    fn one() -> Self {
        U128Count(1)
    }

    fn add(&self, other: &Self) -> Self {
        U128Count(self.0.checked_add(other.0).expect("minterm count overflowed u128"))
    }

    fn shl(&self, bits: u32) -> Self {
        U128Count(self.0.checked_shl(bits).expect("minterm count overflowed u128"))
    }
}

/// Number of variable assignments that make `f` true, counted over all of
/// `manager.num_bdd_vars()` variables (not just the ones `f` actually reads
/// — a skipped variable is a don't-care, counted on both sides).
pub fn count_bdd<C: BigCount>(manager: &Manager, f: Handle) -> C {
    let n = manager.num_bdd_vars() as u32;
    let mut memo = HashMap::default();
    let below = count_bdd_below::<C>(manager, f, n, &mut memo);
    below.shl(root_gap(manager, f, n))
}

fn root_gap(manager: &Manager, f: Handle, n: u32) -> u32 {
    let level = manager.bdd_level_of_handle(f);
    if level == Level::MAX {
        n
    } else {
        level
    }
}

/// Satisfying-assignment count for the variables from `h`'s own level down
/// to the last one, not yet scaled for any don't-care levels strictly above
/// `h` (the caller's job, since those depend on where `h` sits in its
/// parent's recursion, not on `h` itself).
fn count_bdd_below<C: BigCount>(manager: &Manager, h: Handle, n: u32, memo: &mut HashMap<Handle, C>) -> C {
    if let Some(v) = manager.leaf_value(h) {
        return if v != 0.0 { C::one() } else { C::zero() };
    }
    if let Some(cached) = memo.get(&h) {
        return cached.clone();
    }
    let my_level = manager.bdd_level_of_handle(h);
    let index = manager.node(h).index;
    let (then_, else_) = manager.bdd_cofactors(h, index);
    let then_count = count_bdd_below::<C>(manager, then_, n, memo).shl(level_gap(manager, then_, my_level, n));
    let else_count = count_bdd_below::<C>(manager, else_, n, memo).shl(level_gap(manager, else_, my_level, n));
    let total = then_count.add(&else_count);
    memo.insert(h, total.clone());
    total
}

fn level_gap(manager: &Manager, child: Handle, parent_level: u32, n: u32) -> u32 {
    let child_level = manager.bdd_level_of_handle(child);
    let child_level = if child_level == Level::MAX { n } else { child_level };
    child_level - parent_level - 1
}

/// Number of combinations represented by `f` — the count of distinct sets
/// in the family, with no doubling for skipped levels. A ZDD node absent
/// from a path means that variable is excluded from every set on it, a
/// single choice rather than a don't-care, unlike the BDD case above.
pub fn count_zdd<C: BigCount>(manager: &Manager, f: Handle) -> C {
    let mut memo = HashMap::default();
    count_zdd_rec::<C>(manager, f, &mut memo)
}

fn count_zdd_rec<C: BigCount>(manager: &Manager, h: Handle, memo: &mut HashMap<Handle, C>) -> C {
    if h == manager.zdd_zero() {
        return C::zero();
    }
    if h == manager.zdd_one() {
        return C::one();
    }
    if let Some(cached) = memo.get(&h) {
        return cached.clone();
    }
    let (then_, else_) = manager.node(h).children().expect("non-terminal ZDD node");
    let total = count_zdd_rec::<C>(manager, then_, memo).add(&count_zdd_rec::<C>(manager, else_, memo));
    memo.insert(h, total.clone());
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u128count_shl_matches_repeated_doubling() {
        let one = U128Count::one();
        let doubled = one.shl(3);
        assert_eq!(doubled.0, 8);
    }

    #[test]
    fn bdd_count_treats_a_skipped_level_as_a_dont_care() {
        let mut dd = Manager::new();
        let _x0 = dd.create_bdd_var("x0");
        let x1 = dd.create_bdd_var("x1");
        let _x2 = dd.create_bdd_var("x2");

        // x1 alone, with x0 and x2 both don't-cares, is true on 1/2 of the
        // assignments to x1 times all 4 combinations of x0/x2: 4 minterms.
        let count: U128Count = dd.bdd_count(x1);
        assert_eq!(count.0, 4);
    }

    #[test]
    fn zdd_count_treats_a_skipped_level_as_absent() {
        let mut dd = Manager::new();
        let a = dd.create_zdd_var("a");
        let _b = dd.create_zdd_var("b");
        let one = dd.zdd_one();
        let zero = dd.zdd_zero();
        let singleton_a = match dd.unique_inter_zdd(a, one, zero) {
            crate::error::Outcome::Value(h) => h,
            _ => panic!("reorder/error building a singleton"),
        };
        // {a} is one combination, regardless of how many other variables
        // exist in the manager and are simply absent from it.
        let count: U128Count = dd.zdd_count(singleton_a);
        assert_eq!(count.0, 1);
    }
}
