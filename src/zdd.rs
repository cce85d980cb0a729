//! ZDD (Zero-suppressed Decision Diagram) operators. Every node obeys the
//! elimination rule (`unique_inter_zdd` applies it at the call site: a
//! then-child equal to the ZDD zero collapses the node away instead of
//! being created), so the `cofactor`/`decompose` helpers below hand back
//! `(zero, f)` for any variable `f` does not mention, not `(f, f)` the way
//! the BDD side does.

use crate::cache::Tag;
use crate::common::HeaderId;
use crate::error::{try_outcome, DdResult, Outcome};
use crate::handle::Handle;
use crate::manager::Manager;

impl Manager {
    /// `(f1, f0)`: the sets that contain `var` (with `var` itself removed)
    /// and the sets that don't. If `f` does not depend on `var`, `f1` is
    /// the ZDD zero and `f0` is `f` unchanged.
    fn zdd_decompose(&self, f: Handle, var: HeaderId) -> (Handle, Handle) {
        let node = self.node(f);
        if node.is_constant() || node.index != var {
            (self.zdd_zero(), f)
        } else {
            node.children().unwrap()
        }
    }

    pub fn zdd_union(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        loop {
            match self.union_step(Tag::ZddUnion, f, g) {
                Outcome::Value(r) => return Ok(r),
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(e) => return Err(e),
            }
        }
    }

    pub fn zdd_intersect(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        loop {
            match self.intersect_step(Tag::ZddIntersect, f, g) {
                Outcome::Value(r) => return Ok(r),
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(e) => return Err(e),
            }
        }
    }

    pub fn zdd_diff(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        loop {
            match self.diff_step(Tag::ZddDiff, f, g) {
                Outcome::Value(r) => return Ok(r),
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(e) => return Err(e),
            }
        }
    }

    pub fn zdd_product(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        loop {
            match self.product_step(Tag::ZddProduct, f, g) {
                Outcome::Value(r) => return Ok(r),
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(e) => return Err(e),
            }
        }
    }

    pub fn zdd_weak_div(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        loop {
            match self.weak_div_step(Tag::ZddWeakDiv, f, g) {
                Outcome::Value(r) => return Ok(r),
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(e) => return Err(e),
            }
        }
    }

    pub fn zdd_divide(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        loop {
            match self.divide_step(Tag::ZddDivide, f, g) {
                Outcome::Value(r) => return Ok(r),
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(e) => return Err(e),
            }
        }
    }

    fn union_step(&mut self, tag: Tag, f: Handle, g: Handle) -> Outcome<Handle> {
        let zero = self.zdd_zero();
        if f == zero {
            return Outcome::Value(g);
        }
        if g == zero || f == g {
            return Outcome::Value(f);
        }
        if let Some(cached) = self.cache.lookup2(tag, f, g) {
            return Outcome::Value(cached);
        }
        let split = self.zdd_top(&[f, g]).expect("f != g and neither is zero");
        let (f1, f0) = self.zdd_decompose(f, split);
        let (g1, g0) = self.zdd_decompose(g, split);
        let then_ = try_outcome!(self.union_step(tag, f1, g1));
        let else_ = try_outcome!(self.union_step(tag, f0, g0));
        let result = try_outcome!(self.unique_inter_zdd(split, then_, else_));
        self.cache.insert2(tag, f, g, result);
        Outcome::Value(result)
    }

    fn intersect_step(&mut self, tag: Tag, f: Handle, g: Handle) -> Outcome<Handle> {
        let zero = self.zdd_zero();
        if f == zero || g == zero {
            return Outcome::Value(zero);
        }
        if f == g {
            return Outcome::Value(f);
        }
        if let Some(cached) = self.cache.lookup2(tag, f, g) {
            return Outcome::Value(cached);
        }
        let f_level = self.zdd_level_of_handle(f);
        let g_level = self.zdd_level_of_handle(g);
        let result = if f_level != g_level {
            // The deeper operand cannot contain the shallower one's top
            // variable, so no set agreeing on it survives intersection.
            let (shallow, deep) = if f_level < g_level { (f, g) } else { (g, f) };
            let split = self.node(shallow).index;
            let (_s1, s0) = self.zdd_decompose(shallow, split);
            try_outcome!(self.intersect_step(tag, s0, deep))
        } else {
            let split = self.node(f).index;
            let (f1, f0) = self.zdd_decompose(f, split);
            let (g1, g0) = self.zdd_decompose(g, split);
            let then_ = try_outcome!(self.intersect_step(tag, f1, g1));
            let else_ = try_outcome!(self.intersect_step(tag, f0, g0));
            try_outcome!(self.unique_inter_zdd(split, then_, else_))
        };
        self.cache.insert2(tag, f, g, result);
        Outcome::Value(result)
    }

    fn diff_step(&mut self, tag: Tag, f: Handle, g: Handle) -> Outcome<Handle> {
        let zero = self.zdd_zero();
        if f == zero || f == g {
            return Outcome::Value(zero);
        }
        if g == zero {
            return Outcome::Value(f);
        }
        if let Some(cached) = self.cache.lookup2(tag, f, g) {
            return Outcome::Value(cached);
        }
        let f_level = self.zdd_level_of_handle(f);
        let g_level = self.zdd_level_of_handle(g);
        let result = if f_level < g_level {
            let split = self.node(f).index;
            let (f1, f0) = self.zdd_decompose(f, split);
            let then_ = f1;
            let else_ = try_outcome!(self.diff_step(tag, f0, g));
            try_outcome!(self.unique_inter_zdd(split, then_, else_))
        } else if f_level > g_level {
            let split = self.node(g).index;
            let (_g1, g0) = self.zdd_decompose(g, split);
            try_outcome!(self.diff_step(tag, f, g0))
        } else {
            let split = self.node(f).index;
            let (f1, f0) = self.zdd_decompose(f, split);
            let (g1, g0) = self.zdd_decompose(g, split);
            let then_ = try_outcome!(self.diff_step(tag, f1, g1));
            let else_ = try_outcome!(self.diff_step(tag, f0, g0));
            try_outcome!(self.unique_inter_zdd(split, then_, else_))
        };
        self.cache.insert2(tag, f, g, result);
        Outcome::Value(result)
    }

    /// Minato's cover product: `{ a ∪ b | a ∈ F, b ∈ G }`.
    fn product_step(&mut self, tag: Tag, f: Handle, g: Handle) -> Outcome<Handle> {
        let zero = self.zdd_zero();
        let one = self.zdd_one();
        if f == zero || g == zero {
            return Outcome::Value(zero);
        }
        if f == one {
            return Outcome::Value(g);
        }
        if g == one {
            return Outcome::Value(f);
        }
        if let Some(cached) = self.cache.lookup2(tag, f, g) {
            return Outcome::Value(cached);
        }
        let split = self.zdd_top(&[f, g]).unwrap();
        let (f1, f0) = self.zdd_decompose(f, split);
        let (g1, g0) = self.zdd_decompose(g, split);

        let p11 = try_outcome!(self.product_step(tag, f1, g1));
        let p10 = try_outcome!(self.product_step(tag, f1, g0));
        let p01 = try_outcome!(self.product_step(tag, f0, g1));
        let p00 = try_outcome!(self.product_step(tag, f0, g0));

        let with_var = try_outcome!(self.union_step(Tag::ZddUnion, p11, p10));
        let with_var = try_outcome!(self.union_step(Tag::ZddUnion, with_var, p01));
        let result = try_outcome!(self.unique_inter_zdd(split, with_var, p00));
        self.cache.insert2(tag, f, g, result);
        Outcome::Value(result)
    }

    /// Weak division: an upper bound on exact `divide`, cheap to compute and
    /// exact whenever `g` is a single combination (a cube).
    fn weak_div_step(&mut self, tag: Tag, f: Handle, g: Handle) -> Outcome<Handle> {
        let zero = self.zdd_zero();
        let one = self.zdd_one();
        if g == one {
            return Outcome::Value(f);
        }
        if f == zero || g == zero {
            return Outcome::Value(zero);
        }
        if let Some(cached) = self.cache.lookup2(tag, f, g) {
            return Outcome::Value(cached);
        }
        let f_level = self.zdd_level_of_handle(f);
        let g_level = self.zdd_level_of_handle(g);
        if f_level > g_level {
            let result = zero;
            self.cache.insert2(tag, f, g, result);
            return Outcome::Value(result);
        }
        let result = if f_level < g_level {
            let split = self.node(f).index;
            let (_f1, f0) = self.zdd_decompose(f, split);
            try_outcome!(self.weak_div_step(tag, f0, g))
        } else {
            let split = self.node(f).index;
            let (f1, f0) = self.zdd_decompose(f, split);
            let (g1, g0) = self.zdd_decompose(g, split);
            if g0 == zero {
                let q1 = try_outcome!(self.weak_div_step(tag, f1, g1));
                let q0 = try_outcome!(self.weak_div_step(tag, f0, g));
                try_outcome!(self.union_step(Tag::ZddUnion, q1, q0))
            } else {
                let q1 = try_outcome!(self.weak_div_step(tag, f1, g1));
                let q0 = try_outcome!(self.weak_div_step(tag, f0, g0));
                try_outcome!(self.intersect_step(Tag::ZddIntersect, q1, q0))
            }
        };
        self.cache.insert2(tag, f, g, result);
        Outcome::Value(result)
    }

    /// Exact division: the largest `Q` such that `Q * G` is a subset of `F`.
    fn divide_step(&mut self, tag: Tag, f: Handle, g: Handle) -> Outcome<Handle> {
        let zero = self.zdd_zero();
        let one = self.zdd_one();
        if g == one {
            return Outcome::Value(f);
        }
        if f == zero {
            return Outcome::Value(zero);
        }
        if let Some(cached) = self.cache.lookup2(tag, f, g) {
            return Outcome::Value(cached);
        }
        let f_level = self.zdd_level_of_handle(f);
        let g_level = self.zdd_level_of_handle(g);
        if f_level > g_level {
            let result = zero;
            self.cache.insert2(tag, f, g, result);
            return Outcome::Value(result);
        }
        let result = if f_level < g_level {
            let split = self.node(f).index;
            let (_f1, f0) = self.zdd_decompose(f, split);
            try_outcome!(self.divide_step(tag, f0, g))
        } else {
            let split = self.node(f).index;
            let (f1, f0) = self.zdd_decompose(f, split);
            let (g1, g0) = self.zdd_decompose(g, split);
            let q1 = try_outcome!(self.divide_step(tag, f1, g1));
            let q0 = if g0 == zero {
                try_outcome!(self.divide_step(tag, f0, g))
            } else {
                try_outcome!(self.divide_step(tag, f0, g0))
            };
            try_outcome!(self.intersect_step(Tag::ZddIntersect, q1, q0))
        };
        self.cache.insert2(tag, f, g, result);
        Outcome::Value(result)
    }

    /// `change`: toggles membership of `var` in every combination of `f`
    /// (`cuddZddChange`'s swap of the then/else roles at `var`'s level).
    pub fn zdd_change(&mut self, f: Handle, var: HeaderId) -> DdResult<Handle> {
        loop {
            match self.change_step(f, var) {
                Outcome::Value(r) => return Ok(r),
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(e) => return Err(e),
            }
        }
    }

    fn change_step(&mut self, f: Handle, var: HeaderId) -> Outcome<Handle> {
        let var_level = self.zdd_index_to_level[var as usize];
        let f_level = self.zdd_level_of_handle(f);
        if f_level > var_level {
            let zero = self.zdd_zero();
            return self.unique_inter_zdd(var, f, zero);
        }
        // Keyed on both `f` and `var`: unlike most unary ops, `change`'s
        // result depends on which variable is being toggled, so `var` has to
        // be folded into the cache key (via a synthetic handle, there being
        // no ZDD projection-function handle to reuse the way `bdd_var` is).
        let var_key = Handle::regular(var);
        if let Some(cached) = self.cache.lookup2_op(Tag::ZddChange, 0, f, var_key) {
            return Outcome::Value(cached);
        }
        let split = self.node(f).index;
        let (f1, f0) = self.zdd_decompose(f, split);
        let result = if f_level == var_level {
            try_outcome!(self.unique_inter_zdd(split, f0, f1))
        } else {
            let then_ = try_outcome!(self.change_step(f1, var));
            let else_ = try_outcome!(self.change_step(f0, var));
            try_outcome!(self.unique_inter_zdd(split, then_, else_))
        };
        self.cache.insert2_op(Tag::ZddChange, 0, f, var_key, result);
        Outcome::Value(result)
    }

    /// Subset of `f`'s combinations that contain `var`, with `var` removed.
    pub fn zdd_subset1(&mut self, f: Handle, var: HeaderId) -> Handle {
        let (f1, _f0) = self.zdd_decompose(f, var);
        f1
    }

    /// Subset of `f`'s combinations that do not contain `var`.
    pub fn zdd_subset0(&mut self, f: Handle, var: HeaderId) -> Handle {
        let (_f1, f0) = self.zdd_decompose(f, var);
        f0
    }

    /// Number of combinations represented by `f`, as an arbitrary-precision
    /// count (see [`crate::bigcount`]); a plain `u64` overflows long before
    /// a ZDD with a few hundred variables does.
    pub fn zdd_count(&self, f: Handle) -> crate::bigcount::U128Count {
        crate::bigcount::count_zdd(self, f)
    }

    /// Builds the BDD whose true-set is exactly `f`'s set of combinations,
    /// by folding an indicator function bottom-up: each ZDD node becomes
    /// `ite(var, bdd(then), bdd(else))`, the one place ZDD operators reach
    /// across into BDD territory (`complement` in the distilled vocabulary:
    /// read literally it asks for the combination-set complement, which is
    /// this same cross into boolean space followed by `bdd_not`).
    pub fn zdd_complement(&mut self, f: Handle) -> DdResult<Handle> {
        let as_bdd = self.zdd_to_bdd(f)?;
        Ok(self.bdd_not(as_bdd))
    }

    pub fn zdd_to_bdd(&mut self, f: Handle) -> DdResult<Handle> {
        let zero = self.zdd_zero();
        let one = self.zdd_one();
        if f == zero {
            return Ok(self.bdd_zero());
        }
        if f == one {
            return Ok(self.bdd_one());
        }
        let split = self.node(f).index;
        let (f1, f0) = self.zdd_decompose(f, split);
        let then_bdd = self.zdd_to_bdd(f1)?;
        let else_bdd = self.zdd_to_bdd(f0)?;
        let var = self.bdd_var(split);
        self.bdd_ite(var, then_bdd, else_bdd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn singleton(dd: &mut Manager, v: HeaderId) -> Handle {
        let one = dd.zdd_one();
        let zero = dd.zdd_zero();
        match dd.unique_inter_zdd(v, one, zero) {
            Outcome::Value(h) => h,
            _ => panic!("reorder/error building a singleton"),
        }
    }

    #[test]
    fn product_identities() {
        let mut dd = Manager::new();
        let v = dd.create_zdd_var("a");
        let f = singleton(&mut dd, v);
        let zero = dd.zdd_zero();
        let one = dd.zdd_one();

        assert_eq!(dd.zdd_product(f, one).unwrap(), f);
        assert_eq!(dd.zdd_product(f, zero).unwrap(), zero);
    }

    #[test]
    fn weak_div_by_self_is_one() {
        let mut dd = Manager::new();
        let v = dd.create_zdd_var("a");
        let f = singleton(&mut dd, v);
        let one = dd.zdd_one();
        assert_eq!(dd.zdd_weak_div(f, f).unwrap(), one);
    }

    #[test]
    fn divide_undoes_product() {
        let mut dd = Manager::new();
        let a = dd.create_zdd_var("a");
        let b = dd.create_zdd_var("b");
        let sa = singleton(&mut dd, a);
        let sb = singleton(&mut dd, b);

        let f = dd.zdd_product(sa, sb).unwrap();
        let quotient = dd.zdd_divide(f, sb).unwrap();
        let rebuilt = dd.zdd_product(quotient, sb).unwrap();

        // Product(Divide(f, g), g) subset f: every combination rebuilt this
        // way must also be a combination of f, checked here via intersection
        // being the rebuilt set itself.
        let intersection = dd.zdd_intersect(rebuilt, f).unwrap();
        assert_eq!(intersection, rebuilt);
    }

    #[test]
    fn change_toggles_only_the_named_variable() {
        let mut dd = Manager::new();
        let a = dd.create_zdd_var("a");
        let b = dd.create_zdd_var("b");
        let sa = singleton(&mut dd, a);

        let toggled_b = dd.zdd_change(sa, b).unwrap();
        let toggled_back = dd.zdd_change(toggled_b, b).unwrap();
        assert_eq!(toggled_back, sa);

        let toggled_a = dd.zdd_change(sa, a).unwrap();
        let one = dd.zdd_one();
        // toggling membership of `a` in the single combination {a} removes
        // it, leaving the family containing only the empty combination.
        assert_eq!(toggled_a, one);
    }
}
