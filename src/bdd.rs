//! BDD operators: `ite` is the single recursive primitive every boolean
//! connective reduces to, following the complement-edge normal form (top
//! handle regular, `then` child regular, complement pushed onto `else`).
//!
//! Every public entry point loops on `Outcome::Retry`: a nested call that
//! crossed the live-node threshold asks for a reordering pass before the
//! whole operator recomputes from the same top-level arguments. Handle
//! identity survives reordering (only levels move), so recomputing from
//! scratch is always safe, if occasionally wasteful.

use crate::cache::Tag;
use crate::error::{try_outcome, DdResult, Outcome};
use crate::handle::Handle;
use crate::manager::Manager;

impl Manager {
    pub fn bdd_not(&mut self, f: Handle) -> Handle {
        f.complemented()
    }

    pub fn bdd_and(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        self.run_ite(f, g, self.bdd_zero())
    }

    pub fn bdd_or(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        self.run_ite(f, self.bdd_one(), g)
    }

    pub fn bdd_xor(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        self.run_ite(f, g.complemented(), g)
    }

    pub fn bdd_xnor(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        self.run_ite(f, g, g.complemented())
    }

    pub fn bdd_nand(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        self.bdd_and(f, g).map(Handle::complemented)
    }

    pub fn bdd_nor(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        self.bdd_or(f, g).map(Handle::complemented)
    }

    pub fn bdd_imp(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        self.run_ite(f, g, self.bdd_one())
    }

    pub fn bdd_ite(&mut self, f: Handle, g: Handle, h: Handle) -> DdResult<Handle> {
        self.run_ite(f, g, h)
    }

    fn run_ite(&mut self, f: Handle, g: Handle, h: Handle) -> DdResult<Handle> {
        loop {
            match self.ite_step(f, g, h) {
                Outcome::Value(r) => return Ok(r),
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(e) => return Err(e),
            }
        }
    }

    fn ite_step(&mut self, f: Handle, g: Handle, h: Handle) -> Outcome<Handle> {
        let one = self.bdd_one();
        let zero = self.bdd_zero();
        let (mut f, mut g, mut h) = (f, g, h);

        if g == h {
            return Outcome::Value(g);
        }
        if f == one {
            return Outcome::Value(g);
        }
        if f == zero {
            return Outcome::Value(h);
        }
        if g == one && h == zero {
            return Outcome::Value(f);
        }
        if g == zero && h == one {
            return Outcome::Value(f.complemented());
        }
        if g == f {
            g = one;
        } else if g == f.complemented() {
            g = zero;
        }
        if h == f {
            h = zero;
        } else if h == f.complemented() {
            h = one;
        }
        if g == h {
            return Outcome::Value(g);
        }

        // Canonicalize the cache key: top handle regular, then-arm regular.
        let mut invert = false;
        if f.is_complement() {
            f = f.complemented();
            std::mem::swap(&mut g, &mut h);
        }
        if g.is_complement() {
            g = g.complemented();
            h = h.complemented();
            invert = true;
        }

        if let Some(cached) = self.cache.lookup3(Tag::BddIte, f, g, h) {
            return Outcome::Value(if invert { cached.complemented() } else { cached });
        }

        let split = match self.bdd_top(&[f, g, h]) {
            Some(idx) => idx,
            None => unreachable!("f, g, h cannot all be constant here"),
        };
        let (f1, f0) = self.bdd_cofactors(f, split);
        let (g1, g0) = self.bdd_cofactors(g, split);
        let (h1, h0) = self.bdd_cofactors(h, split);

        let then_raw = try_outcome!(self.ite_step(f1, g1, h1));
        let else_raw = try_outcome!(self.ite_step(f0, g0, h0));

        let (then_reg, else_reg, node_inverted) = if then_raw.is_complement() {
            (then_raw.complemented(), else_raw.complemented(), true)
        } else {
            (then_raw, else_raw, false)
        };
        let node = try_outcome!(self.unique_inter(split, then_reg, else_reg));
        let result = if node_inverted { node.complemented() } else { node };

        self.cache.insert3(Tag::BddIte, f, g, h, result);
        Outcome::Value(if invert { result.complemented() } else { result })
    }

    /// `bddIteConstant`: like `ite` but only ever returns one of the three
    /// terminal nodes, or fails fast with `None` the moment the partial
    /// result can no longer be constant. Cheaper than `ite` because it never
    /// builds new nodes.
    pub fn bdd_ite_constant(&mut self, f: Handle, g: Handle, h: Handle) -> Option<Handle> {
        let one = self.bdd_one();
        let zero = self.bdd_zero();
        if f == one {
            return self.constant_or_none(g);
        }
        if f == zero {
            return self.constant_or_none(h);
        }
        if g == h {
            return self.constant_or_none(g);
        }
        if self.is_constant(f) {
            return None;
        }

        let (mut f, mut g, mut h) = (f, g, h);
        let mut invert = false;
        if f.is_complement() {
            f = f.complemented();
            std::mem::swap(&mut g, &mut h);
        }
        if g.is_complement() {
            g = g.complemented();
            h = h.complemented();
            invert = true;
        }
        if let Some(cached) = self.cache.lookup3(Tag::BddIteConstant, f, g, h) {
            return Some(if invert { cached.complemented() } else { cached });
        }

        let split = self.bdd_top(&[f, g, h])?;
        let (f1, f0) = self.bdd_cofactors(f, split);
        let (g1, g0) = self.bdd_cofactors(g, split);
        let (h1, h0) = self.bdd_cofactors(h, split);

        let t = self.bdd_ite_constant(f1, g1, h1)?;
        let e = self.bdd_ite_constant(f0, g0, h0)?;
        if t != e {
            return None;
        }
        self.cache.insert3(Tag::BddIteConstant, f, g, h, t);
        Some(if invert { t.complemented() } else { t })
    }

    fn constant_or_none(&self, h: Handle) -> Option<Handle> {
        if self.is_constant(h) {
            Some(h)
        } else {
            None
        }
    }

    /// `f <= g`, decided without constructing the quotient BDD: equivalent
    /// to `ite(f, g, 1) == 1` but implemented as its own recursive walk so a
    /// "no" answer can short-circuit without normalizing `f` and `g` first.
    pub fn bdd_leq(&mut self, f: Handle, g: Handle) -> bool {
        loop {
            match self.leq_step(f, g) {
                Outcome::Value(v) => return v,
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(_) => return false,
            }
        }
    }

    fn leq_step(&mut self, f: Handle, g: Handle) -> Outcome<bool> {
        let one = self.bdd_one();
        let zero = self.bdd_zero();
        if f == zero || g == one || f == g {
            return Outcome::Value(true);
        }
        if f == one || g == zero {
            return Outcome::Value(false);
        }
        if let Some(cached) = self.cache.lookup2(Tag::BddLeq, f, g) {
            return Outcome::Value(cached == one);
        }
        let split = self.bdd_top(&[f, g]).expect("non-terminal handles must have a top var");
        let (f1, f0) = self.bdd_cofactors(f, split);
        let (g1, g0) = self.bdd_cofactors(g, split);
        let result = try_outcome!(self.leq_step(f1, g1)) && try_outcome!(self.leq_step(f0, g0));
        let sentinel = if result { one } else { zero };
        self.cache.insert2(Tag::BddLeq, f, g, sentinel);
        Outcome::Value(result)
    }

    /// Existential abstraction of `f` over every variable set in `cube`
    /// (`cube` is itself a BDD, a conjunction of positive literals).
    pub fn bdd_exist_abstract(&mut self, f: Handle, cube: Handle) -> DdResult<Handle> {
        loop {
            match self.exist_step(f, cube) {
                Outcome::Value(r) => return Ok(r),
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(e) => return Err(e),
            }
        }
    }

    fn exist_step(&mut self, f: Handle, cube: Handle) -> Outcome<Handle> {
        let one = self.bdd_one();
        if cube == one || self.is_constant(f) {
            return Outcome::Value(f);
        }
        if let Some(cached) = self.cache.lookup2(Tag::BddExistAbstract, f, cube) {
            return Outcome::Value(cached);
        }

        let f_index = self.node(f).index;
        let cube_index = self.node(cube).index;
        let f_level = self.bdd_level_of_handle(f);
        let cube_level = self.bdd_level_of_handle(cube);

        let result = if cube_level < f_level {
            // `f` does not depend on the topmost cube variable: skip it.
            let (next_cube, _zero_child) = self.node(cube).children().unwrap();
            try_outcome!(self.exist_step(f, next_cube))
        } else if cube_level == f_level {
            // `f`'s top variable is the one being abstracted: OR the cofactors.
            let (f1, f0) = self.bdd_cofactors(f, f_index);
            let next_cube = self.node(cube).children().unwrap().0;
            let t = try_outcome!(self.exist_step(f1, next_cube));
            let e = try_outcome!(self.exist_step(f0, next_cube));
            try_outcome!(self.bdd_or_step(t, e))
        } else {
            // `f`'s top variable is not in the cube (some deeper cube variable
            // still is): it must be retained, not abstracted away — rebuild a
            // node over it instead of ORing the cofactors.
            let (f1, f0) = self.bdd_cofactors(f, f_index);
            let then_raw = try_outcome!(self.exist_step(f1, cube));
            let else_raw = try_outcome!(self.exist_step(f0, cube));
            let (then_reg, else_reg, inv) = if then_raw.is_complement() {
                (then_raw.complemented(), else_raw.complemented(), true)
            } else {
                (then_raw, else_raw, false)
            };
            let node = try_outcome!(self.unique_inter(f_index, then_reg, else_reg));
            if inv {
                node.complemented()
            } else {
                node
            }
        };
        let _ = cube_index;
        self.cache.insert2(Tag::BddExistAbstract, f, cube, result);
        Outcome::Value(result)
    }

    pub fn bdd_univ_abstract(&mut self, f: Handle, cube: Handle) -> DdResult<Handle> {
        let notf = self.bdd_not(f);
        let exist_not = self.bdd_exist_abstract(notf, cube)?;
        Ok(self.bdd_not(exist_not))
    }

    /// `xorExistAbstract`: existentially abstracts `f XOR g` in one pass,
    /// avoiding the need to ever materialize the full `xor`.
    pub fn bdd_xor_exist_abstract(&mut self, f: Handle, g: Handle, cube: Handle) -> DdResult<Handle> {
        loop {
            match self.xor_exist_step(f, g, cube) {
                Outcome::Value(r) => return Ok(r),
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(e) => return Err(e),
            }
        }
    }

    fn xor_exist_step(&mut self, f: Handle, g: Handle, cube: Handle) -> Outcome<Handle> {
        let one = self.bdd_one();
        if f == g {
            return Outcome::Value(self.bdd_zero());
        }
        if f == g.complemented() {
            return Outcome::Value(one);
        }
        if cube == one {
            return self.ite_step(f, g.complemented(), g);
        }
        if let Some(cached) = self.cache.lookup3(Tag::XorExistAbstract, f, g, cube) {
            return Outcome::Value(cached);
        }

        let split = self
            .bdd_top(&[f, g, cube])
            .expect("non-terminal handles must have a top var");
        let f_level = self.bdd_level_of_handle(f);
        let g_level = self.bdd_level_of_handle(g);
        let cube_level = self.bdd_level_of_handle(cube);
        let split_level = self.bdd_index_to_level[split as usize];
        let top_is_quantified = cube_level == split_level;
        let _ = (f_level, g_level);

        let (f1, f0) = self.bdd_cofactors(f, split);
        let (g1, g0) = self.bdd_cofactors(g, split);
        let next_cube = if top_is_quantified {
            self.node(cube).children().unwrap().0
        } else {
            cube
        };

        let t = try_outcome!(self.xor_exist_step(f1, g1, next_cube));
        let e = try_outcome!(self.xor_exist_step(f0, g0, next_cube));
        let result = if top_is_quantified {
            try_outcome!(self.bdd_or_step(t, e))
        } else {
            let then_raw = t;
            let else_raw = e;
            let (then_reg, else_reg, inv) = if then_raw.is_complement() {
                (then_raw.complemented(), else_raw.complemented(), true)
            } else {
                (then_raw, else_raw, false)
            };
            let node = try_outcome!(self.unique_inter(split, then_reg, else_reg));
            if inv {
                node.complemented()
            } else {
                node
            }
        };
        self.cache.insert3(Tag::XorExistAbstract, f, g, cube, result);
        Outcome::Value(result)
    }

    /// `f` restricted to the region where its value differs according to
    /// whether `x` is 0 or 1 — the boolean derivative, `f|x=1 XOR f|x=0`.
    pub fn bdd_boolean_diff(&mut self, f: Handle, x: crate::common::HeaderId) -> DdResult<Handle> {
        loop {
            match self.boolean_diff_step(f, x) {
                Outcome::Value(r) => return Ok(r),
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(e) => return Err(e),
            }
        }
    }

    fn boolean_diff_step(&mut self, f: Handle, x: crate::common::HeaderId) -> Outcome<Handle> {
        if self.is_constant(f) {
            return Outcome::Value(self.bdd_zero());
        }
        if let Some(cached) = self.cache.lookup2_op(Tag::BddBooleanDiff, 0, f, self.bdd_var(x)) {
            return Outcome::Value(cached);
        }
        let f_index = self.node(f).index;
        let f_level = self.bdd_level_of_handle(f);
        let x_level = self.bdd_index_to_level[x as usize];
        let result = if f_level > x_level {
            self.bdd_zero()
        } else if f_level == x_level {
            let (f1, f0) = self.bdd_cofactors(f, f_index);
            try_outcome!(self.xor_step(f1, f0))
        } else {
            let (f1, f0) = self.bdd_cofactors(f, f_index);
            let t = try_outcome!(self.boolean_diff_step(f1, x));
            let e = try_outcome!(self.boolean_diff_step(f0, x));
            let (then_reg, else_reg, inv) = if t.is_complement() {
                (t.complemented(), e.complemented(), true)
            } else {
                (t, e, false)
            };
            let node = try_outcome!(self.unique_inter(f_index, then_reg, else_reg));
            if inv {
                node.complemented()
            } else {
                node
            }
        };
        self.cache.insert2_op(Tag::BddBooleanDiff, 0, f, self.bdd_var(x), result);
        Outcome::Value(result)
    }

    fn bdd_or_step(&mut self, f: Handle, g: Handle) -> Outcome<Handle> {
        let one = self.bdd_one();
        self.ite_step(f, one, g)
    }

    fn xor_step(&mut self, f: Handle, g: Handle) -> Outcome<Handle> {
        self.ite_step(f, g.complemented(), g)
    }

    /// Number of satisfying assignments over all `num_bdd_vars()` variables.
    pub fn bdd_count<C: crate::bigcount::BigCount>(&self, f: Handle) -> C {
        crate::bigcount::count_bdd(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigcount::U128Count;

    #[test]
    fn ite_identities() {
        let mut dd = Manager::new();
        let f = dd.create_bdd_var("f");
        let g = dd.create_bdd_var("g");
        let zero = dd.bdd_zero();

        assert_eq!(dd.bdd_ite(f, f, zero).unwrap(), f);
        assert_eq!(dd.bdd_ite(f, dd.bdd_one(), g).unwrap(), dd.bdd_or(f, g).unwrap());
        assert_eq!(dd.bdd_ite(f, g, dd.bdd_not(g)).unwrap(), dd.bdd_xnor(f, g).unwrap());
        assert_eq!(dd.bdd_ite(dd.bdd_not(f), g, zero.complemented()).unwrap(), dd.bdd_ite(f, zero.complemented(), g).unwrap());
    }

    #[test]
    fn and_is_commutative_and_associative() {
        let mut dd = Manager::new();
        let x = dd.create_bdd_var("x");
        let y = dd.create_bdd_var("y");
        let z = dd.create_bdd_var("z");

        assert_eq!(dd.bdd_and(x, y).unwrap(), dd.bdd_and(y, x).unwrap());
        let xy_z = dd.bdd_and(dd.bdd_and(x, y).unwrap(), z).unwrap();
        let x_yz = dd.bdd_and(x, dd.bdd_and(y, z).unwrap()).unwrap();
        assert_eq!(xy_z, x_yz);
    }

    #[test]
    fn xor_is_associative_and_self_inverse() {
        let mut dd = Manager::new();
        let x = dd.create_bdd_var("x");
        let y = dd.create_bdd_var("y");
        let z = dd.create_bdd_var("z");

        let xy_z = dd.bdd_xor(dd.bdd_xor(x, y).unwrap(), z).unwrap();
        let x_yz = dd.bdd_xor(x, dd.bdd_xor(y, z).unwrap()).unwrap();
        assert_eq!(xy_z, x_yz);
        assert_eq!(dd.bdd_xor(x, x).unwrap(), dd.bdd_zero());
    }

    #[test]
    fn exist_abstract_of_and_factors_out_an_independent_conjunct() {
        // vars(g) ∩ cube = ∅, so ∃cube(f ∧ g) == g ∧ ∃cube(f).
        let mut dd = Manager::new();
        let f = dd.create_bdd_var("f");
        let g = dd.create_bdd_var("g");
        let cube = f;

        let lhs = dd.bdd_exist_abstract(dd.bdd_and(f, g).unwrap(), cube).unwrap();
        let exist_f = dd.bdd_exist_abstract(f, cube).unwrap();
        let rhs = dd.bdd_and(g, exist_f).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn exist_abstract_retains_a_variable_not_in_the_cube() {
        let mut dd = Manager::new();
        let x0 = dd.create_bdd_var("x0");
        let x2 = dd.create_bdd_var("x2");
        let f = dd.bdd_and(x0, x2).unwrap();

        // x2 sits below x0 in the order but is the only cube variable: x0
        // must be retained, not quantified away.
        let result = dd.bdd_exist_abstract(f, x2).unwrap();
        assert_eq!(result, x0);
    }

    #[test]
    fn new_variable_is_a_projection_function() {
        let mut dd = Manager::new();
        let _x0 = dd.create_bdd_var("x0");
        let _x1 = dd.create_bdd_var("x1");
        let x2 = dd.create_bdd_var("x2");

        let count: U128Count = dd.bdd_count(x2);
        assert_eq!(count.0, 1u128 << (dd.num_bdd_vars() - 1));
    }

    #[test]
    fn internal_node_invariants_hold_after_apply() {
        let mut dd = Manager::new();
        let x0 = dd.create_bdd_var("x0");
        let x1 = dd.create_bdd_var("x1");
        let x2 = dd.create_bdd_var("x2");
        let f = dd.bdd_or(dd.bdd_and(x0, x1).unwrap(), dd.bdd_and(dd.bdd_not(x0), x2).unwrap()).unwrap();

        let mut stack = vec![f.regularized()];
        let mut seen = crate::common::HashSet::default();
        while let Some(h) = stack.pop() {
            if !seen.insert(h) || dd.is_constant(h) {
                continue;
            }
            let (then_, else_) = dd.node(h).children().unwrap();
            assert!(!then_.is_complement(), "U3: then-child handle carries no complement bit");
            assert_ne!(then_, else_, "U2: reduced node cannot have equal children");
            let my_level = dd.bdd_level_of_handle(h);
            if !dd.is_constant(then_) {
                assert!(my_level < dd.bdd_level_of_handle(then_), "U4: child strictly deeper");
            }
            if !dd.is_constant(else_.regularized()) {
                assert!(my_level < dd.bdd_level_of_handle(else_.regularized()), "U4: child strictly deeper");
            }
            stack.push(then_);
            stack.push(else_.regularized());
        }
    }
}
