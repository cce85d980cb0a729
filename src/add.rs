//! ADD (Algebraic Decision Diagram) operators: the same unique table and
//! order as the BDD side, numeric leaves instead of two booleans, no
//! complement edges. `apply` is the one recursive primitive; `plus`/`times`/
//! `min`/`max`/`threshold` are instances of it distinguished by the `op`
//! byte the cache already carries for exactly this purpose.

use crate::cache::Tag;
use crate::common::{HashMap, HashSet, HeaderId};
use crate::error::{try_outcome, DdResult, Outcome};
use crate::handle::Handle;
use crate::manager::Manager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AddOp {
    Plus = 0,
    Times = 1,
    Min = 2,
    Max = 3,
    /// Threshold(c): maps a leaf `v` to `1.0` if `v >= c`, else `0.0`. Unlike
    /// the other four, this is a unary transform smuggled through the
    /// binary `apply` machinery by passing `g` as a constant ADD holding
    /// `c` — kept here rather than as its own recursive walk so it shares
    /// `apply`'s cache entries and short-circuit rules.
    Threshold = 4,
}

impl AddOp {
    #[inline]
    fn eval(self, f: f64, g: f64) -> f64 {
        match self {
            AddOp::Plus => f + g,
            AddOp::Times => f * g,
            AddOp::Min => f.min(g),
            AddOp::Max => f.max(g),
            AddOp::Threshold => {
                if f >= g {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Fast terminal-case shortcuts that avoid a recursive walk entirely
    /// (`0 * f == 0`, `0 + f == f`, and so on). `None` means no shortcut
    /// applies and the caller must recurse.
    fn identity(self, f: Handle, g: Handle, fv: Option<f64>, gv: Option<f64>, zero: Handle, one: Handle) -> Option<Handle> {
        match self {
            AddOp::Plus => {
                if fv == Some(0.0) {
                    Some(g)
                } else if gv == Some(0.0) {
                    Some(f)
                } else {
                    None
                }
            }
            AddOp::Times => {
                if fv == Some(0.0) || gv == Some(0.0) {
                    Some(zero)
                } else if fv == Some(1.0) {
                    Some(g)
                } else if gv == Some(1.0) {
                    Some(f)
                } else {
                    None
                }
            }
            AddOp::Min => {
                if f == g {
                    Some(f)
                } else {
                    None
                }
            }
            AddOp::Max => {
                if f == g {
                    Some(f)
                } else {
                    None
                }
            }
            AddOp::Threshold => {
                let _ = one;
                None
            }
        }
    }
}

impl Manager {
    pub fn add_const(&mut self, value: f64) -> DdResult<Handle> {
        match self.unique_const(value) {
            Outcome::Value(h) => Ok(h),
            Outcome::Retry => {
                self.reorder_if_due();
                self.add_const(value)
            }
            Outcome::Err(e) => Err(e),
        }
    }

    pub fn add_plus(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        self.run_apply(AddOp::Plus, f, g)
    }

    pub fn add_times(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        self.run_apply(AddOp::Times, f, g)
    }

    pub fn add_min(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        self.run_apply(AddOp::Min, f, g)
    }

    pub fn add_max(&mut self, f: Handle, g: Handle) -> DdResult<Handle> {
        self.run_apply(AddOp::Max, f, g)
    }

    pub fn add_threshold(&mut self, f: Handle, cutoff: f64) -> DdResult<Handle> {
        let c = self.add_const(cutoff)?;
        self.run_apply(AddOp::Threshold, f, c)
    }

    fn run_apply(&mut self, op: AddOp, f: Handle, g: Handle) -> DdResult<Handle> {
        loop {
            match self.apply_step(op, f, g) {
                Outcome::Value(r) => return Ok(r),
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(e) => return Err(e),
            }
        }
    }

    fn apply_step(&mut self, op: AddOp, f: Handle, g: Handle) -> Outcome<Handle> {
        let zero = self.add_zero();
        let one = self.add_one();
        let fv = self.leaf_value(f);
        let gv = self.leaf_value(g);

        if let (Some(fv), Some(gv)) = (fv, gv) {
            let result = try_outcome!(self.add_const_step(op.eval(fv, gv)));
            return Outcome::Value(result);
        }
        if let Some(result) = op.identity(f, g, fv, gv, zero, one) {
            return Outcome::Value(result);
        }

        if let Some(cached) = self.cache.lookup2_op(Tag::AddApply, op as u8, f, g) {
            return Outcome::Value(cached);
        }

        let split = self
            .bdd_top(&[f, g])
            .expect("at least one operand is non-constant here");
        let (f1, f0) = self.bdd_cofactors(f, split);
        let (g1, g0) = self.bdd_cofactors(g, split);
        let then_ = try_outcome!(self.apply_step(op, f1, g1));
        let else_ = try_outcome!(self.apply_step(op, f0, g0));
        let result = try_outcome!(self.unique_inter(split, then_, else_));

        self.cache.insert2_op(Tag::AddApply, op as u8, f, g, result);
        Outcome::Value(result)
    }

    fn add_const_step(&mut self, value: f64) -> Outcome<Handle> {
        self.unique_const(value)
    }

    /// `addIte`: `f` selects between `g` and `h` leaf-wise; `f` is assumed
    /// 0/1-valued (the ADD produced by `bdd_to_add` or `add_threshold`).
    pub fn add_ite(&mut self, f: Handle, g: Handle, h: Handle) -> DdResult<Handle> {
        loop {
            match self.add_ite_step(f, g, h) {
                Outcome::Value(r) => return Ok(r),
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(e) => return Err(e),
            }
        }
    }

    fn add_ite_step(&mut self, f: Handle, g: Handle, h: Handle) -> Outcome<Handle> {
        if let Some(fv) = self.leaf_value(f) {
            return Outcome::Value(if fv != 0.0 { g } else { h });
        }
        if g == h {
            return Outcome::Value(g);
        }
        if let Some(cached) = self.cache.lookup3(Tag::AddIte, f, g, h) {
            return Outcome::Value(cached);
        }
        let split = self
            .bdd_top(&[f, g, h])
            .expect("f is non-constant here, so some operand has a top var");
        let (f1, f0) = self.bdd_cofactors(f, split);
        let (g1, g0) = self.bdd_cofactors(g, split);
        let (h1, h0) = self.bdd_cofactors(h, split);
        let then_ = try_outcome!(self.add_ite_step(f1, g1, h1));
        let else_ = try_outcome!(self.add_ite_step(f0, g0, h0));
        let result = try_outcome!(self.unique_inter(split, then_, else_));
        self.cache.insert3(Tag::AddIte, f, g, h, result);
        Outcome::Value(result)
    }

    /// `addCompose`: substitutes `g` for variable `index` everywhere in `f`
    /// (the generalized cofactor). `g` need not be 0/1-valued.
    pub fn add_compose(&mut self, f: Handle, index: HeaderId, g: Handle) -> DdResult<Handle> {
        let mut memo = HashMap::default();
        loop {
            match self.compose_step(f, index, g, &mut memo) {
                Outcome::Value(r) => return Ok(r),
                Outcome::Retry => {
                    self.reorder_if_due();
                    memo.clear();
                }
                Outcome::Err(e) => return Err(e),
            }
        }
    }

    fn compose_step(
        &mut self,
        f: Handle,
        index: HeaderId,
        g: Handle,
        memo: &mut HashMap<Handle, Handle>,
    ) -> Outcome<Handle> {
        if self.is_constant(f) {
            return Outcome::Value(f);
        }
        let f_level = self.bdd_level_of_handle(f);
        let index_level = self.bdd_index_to_level[index as usize];
        if f_level > index_level {
            return Outcome::Value(f);
        }
        if let Some(&cached) = memo.get(&f) {
            return Outcome::Value(cached);
        }
        let f_index = self.node(f).index;
        let (f1, f0) = self.bdd_cofactors(f, f_index);
        let result = if f_index == index {
            try_outcome!(self.add_ite_step(g, f1, f0))
        } else {
            let then_ = try_outcome!(self.compose_step(f1, index, g, memo));
            let else_ = try_outcome!(self.compose_step(f0, index, g, memo));
            try_outcome!(self.unique_inter(f_index, then_, else_))
        };
        memo.insert(f, result);
        Outcome::Value(result)
    }

    /// Largest leaf value reachable from `f`.
    pub fn add_find_max(&self, f: Handle) -> f64 {
        self.fold_leaves(f, f64::NEG_INFINITY, f64::max)
    }

    /// Smallest leaf value reachable from `f`.
    pub fn add_find_min(&self, f: Handle) -> f64 {
        self.fold_leaves(f, f64::INFINITY, f64::min)
    }

    fn fold_leaves(&self, f: Handle, init: f64, combine: impl Fn(f64, f64) -> f64 + Copy) -> f64 {
        let mut seen: HashSet<Handle> = HashSet::default();
        let mut acc = init;
        let mut stack = vec![f];
        while let Some(h) = stack.pop() {
            if seen.contains(&h) {
                continue;
            }
            seen.insert(h);
            if let Some(v) = self.leaf_value(h) {
                acc = combine(acc, v);
            } else {
                let (t, e) = self.node(h).children().unwrap();
                stack.push(t);
                stack.push(e);
            }
        }
        acc
    }

    /// Lifts a BDD into the shared arena's ADD form: `1.0` where the BDD is
    /// true, `0.0` where it is false. Since BDD/ADD share one unique table
    /// and order, this walks the BDD replacing each complemented edge with
    /// an explicit `1 - child` computed via `apply`, bottoming out at the
    /// already-shared constant nodes.
    pub fn bdd_to_add(&mut self, f: Handle) -> DdResult<Handle> {
        if !f.is_complement() {
            return Ok(f);
        }
        let regular = self.bdd_to_add(f.regularized())?;
        self.add_one_minus(regular)
    }

    /// `1 - x`, computed by direct recursion rather than through `apply`
    /// (every leaf and every internal node's children invert arithmetically
    /// in one pass; there is no need for the general two-operand walk).
    fn add_one_minus(&mut self, x: Handle) -> DdResult<Handle> {
        if let Some(v) = self.leaf_value(x) {
            return self.add_const(1.0 - v);
        }
        let (t, e) = self.node(x).children().unwrap();
        let nt = self.add_one_minus(t)?;
        let ne = self.add_one_minus(e)?;
        let index = self.node(x).index;
        match self.unique_inter(index, nt, ne) {
            Outcome::Value(h) => Ok(h),
            Outcome::Retry => {
                self.reorder_if_due();
                self.add_one_minus(x)
            }
            Outcome::Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_and_times_identities() {
        let mut dd = Manager::new();
        let v = dd.create_bdd_var("v");
        let f = dd.bdd_to_add(v).unwrap();
        let zero = dd.add_const(0.0).unwrap();
        let one = dd.add_const(1.0).unwrap();

        assert_eq!(dd.add_plus(f, zero).unwrap(), f);
        assert_eq!(dd.add_times(f, one).unwrap(), f);
        assert_eq!(dd.add_times(f, zero).unwrap(), zero);
    }

    #[test]
    fn find_max_and_min_over_a_threshold() {
        let mut dd = Manager::new();
        let v = dd.create_bdd_var("v");
        let f = dd.bdd_to_add(v).unwrap();
        let scaled = dd.add_times(f, dd.add_const(5.0).unwrap()).unwrap();

        assert_eq!(dd.add_find_max(scaled), 5.0);
        assert_eq!(dd.add_find_min(scaled), 0.0);

        let above_one = dd.add_threshold(scaled, 1.0).unwrap();
        assert_eq!(dd.add_find_max(above_one), 1.0);
    }
}
