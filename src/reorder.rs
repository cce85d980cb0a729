//! Dynamic variable reordering: an adjacent-level swap that preserves every
//! represented function, sifting built on top of it, and window permutation
//! as an alternative local search. Grounded in CUDD's `cuddSwapInPlace` /
//! `cuddWindowReorder` shape (`cuddWindow.c`: `ddWindow2`/`ddWindow3`), but
//! simplified to operate directly on this manager's arena instead of a
//! separate relocation pass.
//!
//! BDD/ADD share one order; ZDD keeps its own, reordered independently
//! through the `_zdd` entry points.

use crate::common::{HeaderId, Level, SENTINEL};
use crate::handle::Handle;
use crate::manager::Manager;
use crate::node::{Node, NodeKind};

impl Manager {
    /// Called whenever a recursive operator step reports that the live-node
    /// threshold was crossed. Drains the death row, flushes the cache (its
    /// keys embed handles whose levels are about to change meaning), runs
    /// sifting over every unpinned variable, then raises the threshold for
    /// next time.
    pub fn reorder_if_due(&mut self) {
        if !self.config.auto_reorder_enabled {
            return;
        }
        self.enter_reentrant_section();
        self.clear_death_row();
        if !crate::hooks::HookLists::run(&mut self.hooks.pre_reorder) {
            self.exit_reentrant_section();
            return;
        }
        self.cache.flush();
        self.sift_all_bdd();
        self.reorderings += 1;
        self.next_dyn = (self.live_node_count() as f64 * self.config.reorder_growth_ratio) as usize;
        self.next_dyn = self.next_dyn.max(self.config.reorder_initial_threshold);
        crate::hooks::HookLists::run(&mut self.hooks.post_reorder);
        self.exit_reentrant_section();
    }

    // ---- adjacent swap ------------------------------------------------------

    /// Swaps the variables currently at `level` and `level + 1` without
    /// changing the function represented by any live handle. Every node at
    /// `level` is rebuilt against the variable that used to be at
    /// `level + 1`; any node that turns out not to depend on it is left where
    /// it is structurally (it migrates down a level implicitly because the
    /// subtable it belongs to has swapped identity).
    pub fn bdd_swap_adjacent(&mut self, level: Level) -> usize {
        let lo = level as usize;
        let hi = lo + 1;
        if hi >= self.bdd_subtables.len() {
            return self.live_node_count();
        }
        let index_lo = self.bdd_level_to_index[lo];
        let index_hi = self.bdd_level_to_index[hi];

        let old_nodes: Vec<HeaderId> = {
            let sub = &self.bdd_subtables[lo];
            collect_chain_ids(&self.nodes, sub)
                .into_iter()
                .map(|id| id as HeaderId)
                .collect()
        };

        // Detach the moving nodes from the level-`lo` subtable; each is
        // about to be re-keyed under `index_hi` (its new top variable) or
        // folded away if it turns out degenerate.
        for bucket in self.bdd_subtables[lo].buckets.iter_mut() {
            *bucket = SENTINEL;
        }
        let moved_keys = self.bdd_subtables[lo].keys;
        self.bdd_subtables[lo].keys = 0;
        self.bdd_subtables[lo].dead = 0;

        for &node_id in &old_nodes {
            let id = node_id;
            let was_dead = self.nodes[id as usize].dead;
            let (old_then, old_else) = self.nodes[id as usize].children().unwrap();
            // Cofactor each grandchild on the variable now moving to `lo`.
            let (f11, f10) = self.bdd_cofactors(old_then, index_hi);
            let (f01, f00) = self.bdd_cofactors(old_else, index_hi);

            let new_then = self.rebuild_at(index_lo, f11, f01);
            let new_else = self.rebuild_at(index_lo, f10, f00);

            // `id` is about to drop its edges to `old_then`/`old_else` and
            // gain edges to `new_then`/`new_else`. Ref the new children
            // before derefing the old ones (CUDD's `cuddSwapInPlace` ref/deref
            // discipline), in case a node is a child under both names. A dead
            // node's edges were already excluded from its children's counts
            // when it was marked dead, so it sits out this bookkeeping.
            if !was_dead {
                self.ref_bdd(new_then);
                self.ref_bdd(new_else);
                self.deref_bdd(old_then);
                self.deref_bdd(old_else);
            }

            self.nodes[id as usize].index = index_hi;
            self.relink(id, index_hi, new_then, new_else, hi, was_dead);
        }

        self.bdd_index_to_level[index_lo as usize] = hi as Level;
        self.bdd_index_to_level[index_hi as usize] = lo as Level;
        self.bdd_level_to_index[lo] = index_hi;
        self.bdd_level_to_index[hi] = index_lo;
        let _ = moved_keys;

        self.cache.flush();
        self.live_node_count()
    }

    /// Rebuilds a level-`lo` node (the variable that is moving down) from
    /// its two new children, applying the usual reduction and then-regular
    /// invariant. Complement bits on `then`/`else` are handled the same way
    /// `ite` handles them.
    fn rebuild_at(&mut self, index_lo: HeaderId, then_: Handle, else_: Handle) -> Handle {
        if then_ == else_ {
            return then_;
        }
        let (then_reg, else_reg, inv) = if then_.is_complement() {
            (then_.complemented(), else_.complemented(), true)
        } else {
            (then_, else_, false)
        };
        let node = loop {
            match self.unique_inter(index_lo, then_reg, else_reg) {
                crate::error::Outcome::Value(h) => break h,
                crate::error::Outcome::Retry => continue, // already mid-reorder; ignore growth trigger
                crate::error::Outcome::Err(_) => break self.bdd_zero(),
            }
        };
        if inv {
            node.complemented()
        } else {
            node
        }
    }

    /// Re-homes an already-allocated node slot under its new index, at
    /// subtable `level` (the destination level, still addressed under its
    /// pre-swap identity at call time), rewriting its children in place
    /// instead of allocating a fresh slot — the node's identity, and every
    /// existing `Handle` pointing at it, must survive the swap.
    fn relink(&mut self, id: HeaderId, _new_index: HeaderId, then_: Handle, else_: Handle, level: usize, was_dead: bool) {
        self.nodes[id as usize].kind = NodeKind::Internal { then_, else_ };
        let sub = &mut self.bdd_subtables[level];
        let bucket_idx = bucket_for(&self.nodes[id as usize], sub.buckets.len());
        self.nodes[id as usize].next = sub.buckets[bucket_idx];
        sub.buckets[bucket_idx] = id;
        sub.keys += 1;
        if was_dead {
            sub.dead += 1;
        }
    }

    // ---- sifting --------------------------------------------------------------

    /// Sifts every unpinned BDD/ADD variable to its locally best position,
    /// one at a time, cheapest-subtable-first (CUDD's usual heuristic for
    /// where to start).
    pub fn sift_all_bdd(&mut self) {
        let n = self.bdd_subtables.len();
        if n == 0 {
            return;
        }
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| self.bdd_subtables[i].keys);
        let mut swaps = 0usize;
        for (count, &start_index) in order.iter().enumerate() {
            if count >= self.config.sifting_max_var || swaps >= self.config.sifting_max_swap {
                break;
            }
            swaps += self.sift_one(start_index as HeaderId);
        }
    }

    /// Moves variable `index` through every level, recording the node count
    /// after each step and a bound no trial may exceed, then settles it at
    /// the position that produced the minimum. CUDD's sifting bounds a trial
    /// direction once `best_so_far * max_growth` is exceeded; that bound is
    /// `self.config.reorder_max_growth` here.
    fn sift_one(&mut self, index: HeaderId) -> usize {
        if self.bdd_subtables[self.bdd_index_to_level[index as usize] as usize].bound {
            return 0;
        }
        let start_level = self.bdd_index_to_level[index as usize] as usize;
        let n = self.bdd_subtables.len();
        let mut swaps = 0;

        let mut sizes = vec![self.live_node_count()];
        let mut level = start_level;
        // Sift down to the bottom.
        while level + 1 < n {
            let before = sizes[sizes.len() - 1];
            let size = self.bdd_swap_adjacent(level as Level);
            swaps += 1;
            level += 1;
            sizes.push(size);
            if (size as f64) > before as f64 * self.config.reorder_max_growth {
                break;
            }
        }
        // Sift all the way up past the start, to the top.
        let reached_bottom = level;
        while level > 0 {
            self.bdd_swap_adjacent((level - 1) as Level);
            swaps += 1;
            level -= 1;
        }
        let mut best_level = 0usize;
        let mut best_size = self.live_node_count();
        let mut probe = 0usize;
        while probe < reached_bottom {
            let size = self.bdd_swap_adjacent(probe as Level);
            swaps += 1;
            probe += 1;
            if size < best_size {
                best_size = size;
                best_level = probe;
            }
        }
        // Settle at the best level found.
        while probe > best_level {
            self.bdd_swap_adjacent((probe - 1) as Level);
            swaps += 1;
            probe -= 1;
        }
        swaps
    }

    // ---- grouped / symmetric sifting --------------------------------------

    /// Declares `a` and `b` symmetric: from now on sifting moves them as one
    /// unit (see `Subtable::symmetry_next`), the cheap approximation to
    /// CUDD's `cuddSymmCheck`-driven grouping in `cuddZddSymm.c`.
    pub fn bind_symmetric(&mut self, a: HeaderId, b: HeaderId) {
        self.bdd_subtables[self.bdd_index_to_level[a as usize] as usize].symmetry_next = Some(b);
    }

    /// Pins a variable so sifting and window permutation leave it in place.
    pub fn bind_bdd_var(&mut self, index: HeaderId, bound: bool) {
        self.bdd_subtables[self.bdd_index_to_level[index as usize] as usize].bound = bound;
    }

    /// Sifts every group formed by [`crate::group::GroupTree`] as a single
    /// unit instead of one variable at a time. Groups whose members are not
    /// currently at contiguous levels are left alone (this only runs right
    /// after `bind_symmetric` calls, before anything else has reordered them
    /// apart — see DESIGN.md).
    pub fn sift_all_grouped(&mut self) {
        let tree = crate::group::GroupTree::from_bdd_subtables(self);
        for members in tree.groups().to_vec() {
            if members.len() > 1 {
                self.sift_group(&members);
            }
        }
    }

    fn sift_group(&mut self, members: &[HeaderId]) -> usize {
        let k = members.len();
        let mut levels: Vec<usize> = members
            .iter()
            .map(|&h| self.bdd_index_to_level[h as usize] as usize)
            .collect();
        levels.sort_unstable();
        let lo = levels[0];
        if levels != (lo..lo + k).collect::<Vec<_>>() {
            return 0; // not contiguous; skip rather than guess at a merge order
        }
        if self.bdd_subtables[lo].bound {
            return 0;
        }

        let n = self.bdd_subtables.len();
        let mut swaps = 0;
        let mut sizes = vec![self.live_node_count()];
        let mut pos = lo;
        while pos + k < n {
            let before = *sizes.last().unwrap();
            let size = self.group_swap_down(pos, k);
            swaps += k;
            pos += 1;
            sizes.push(size);
            if (size as f64) > before as f64 * self.config.reorder_max_growth {
                break;
            }
        }
        let reached_bottom = pos;
        while pos > 0 {
            self.group_swap_up(pos, k);
            swaps += k;
            pos -= 1;
        }
        let mut best_pos = 0usize;
        let mut best_size = self.live_node_count();
        let mut probe = 0usize;
        while probe < reached_bottom {
            let size = self.group_swap_down(probe, k);
            swaps += k;
            probe += 1;
            if size < best_size {
                best_size = size;
                best_pos = probe;
            }
        }
        while probe > best_pos {
            self.group_swap_up(probe, k);
            swaps += k;
            probe -= 1;
        }
        swaps
    }

    /// Bubbles the single variable below the block at `[lo, lo+k)` up
    /// through it, net effect: the whole block shifts down one level with
    /// its internal order unchanged.
    fn group_swap_down(&mut self, lo: usize, k: usize) -> usize {
        let mut size = self.live_node_count();
        for i in (0..k).rev() {
            size = self.bdd_swap_adjacent((lo + i) as Level);
        }
        size
    }

    /// The inverse of [`Self::group_swap_down`]: bubbles the variable above
    /// the block down through it, shifting the block up one level.
    fn group_swap_up(&mut self, lo: usize, k: usize) -> usize {
        let mut size = self.live_node_count();
        for i in 0..k {
            size = self.bdd_swap_adjacent((lo - 1 + i) as Level);
        }
        size
    }

    // ---- window permutation -------------------------------------------------

    /// Slides a window of width 2 from `low` to `high`, keeping whichever of
    /// the two orders in each window is smaller. Mirrors `ddWindow2`.
    pub fn window2(&mut self, low: Level, high: Level) {
        if high <= low {
            return;
        }
        let mut x = low;
        while x < high {
            let before = self.live_node_count();
            let after = self.bdd_swap_adjacent(x);
            if after > before {
                self.bdd_swap_adjacent(x);
            }
            x += 1;
        }
    }

    /// Width-3 sliding window: tries all 6 permutations of each triple via
    /// adjacent swaps, keeping the best. `ddPermuteWindow3`'s 3-variable
    /// case reduced to repeated pairwise swaps instead of a lookup table.
    pub fn window3(&mut self, low: Level, high: Level) {
        if high < low + 2 {
            self.window2(low, high);
            return;
        }
        let mut x = low;
        while x + 1 <= high {
            let best = self.best_of_permutations(x, 3);
            self.restore_permutation(x, 3, best);
            x += 1;
        }
    }

    /// Width-4 sliding window, same idea as [`Self::window3`] with a larger
    /// local neighborhood (`ddPermuteWindow4`).
    pub fn window4(&mut self, low: Level, high: Level) {
        if high < low + 3 {
            self.window3(low, high);
            return;
        }
        let mut x = low;
        while x + 2 <= high {
            let best = self.best_of_permutations(x, 4);
            self.restore_permutation(x, 4, best);
            x += 1;
        }
    }

    /// Exhaustively walks every adjacent transposition inside `[start, start
    /// + width)` (a Cayley-graph walk over bubble-sort swaps), recording the
    /// live node count after each, and returns the sequence of swaps that
    /// reaches the best count from the starting permutation.
    fn best_of_permutations(&mut self, start: Level, width: usize) -> Vec<usize> {
        let indices: Vec<HeaderId> = (0..width)
            .map(|i| self.bdd_level_to_index[start as usize + i])
            .collect();
        let mut best_size = self.live_node_count();
        let mut best_path: Vec<usize> = Vec::new();
        let mut path = Vec::new();
        self.permute_walk(start, width, &mut path, &mut best_size, &mut best_path);
        let _ = indices;
        best_path
    }

    fn permute_walk(
        &mut self,
        start: Level,
        width: usize,
        path: &mut Vec<usize>,
        best_size: &mut usize,
        best_path: &mut Vec<usize>,
    ) {
        if path.len() >= width * (width - 1) / 2 {
            return;
        }
        for offset in 0..width - 1 {
            let level = start as usize + offset;
            self.bdd_swap_adjacent(level as Level);
            path.push(level);
            let size = self.live_node_count();
            if size < *best_size {
                *best_size = size;
                *best_path = path.clone();
            }
            self.permute_walk(start, width, path, best_size, best_path);
            self.bdd_swap_adjacent(level as Level);
            path.pop();
        }
    }

    fn restore_permutation(&mut self, _start: Level, _width: usize, swaps: Vec<usize>) {
        for level in swaps {
            self.bdd_swap_adjacent(level as Level);
        }
    }

    // ---- ZDD reordering ------------------------------------------------------

    /// Adjacent swap for the ZDD's independent order, following the same
    /// rebuild strategy but applying the elimination rule instead of the
    /// then-regular complement-edge normal form.
    pub fn zdd_swap_adjacent(&mut self, level: Level) -> usize {
        let lo = level as usize;
        let hi = lo + 1;
        if hi >= self.zdd_subtables.len() {
            return self.live_node_count();
        }
        let index_lo = self.zdd_level_to_index[lo];
        let index_hi = self.zdd_level_to_index[hi];

        let old_nodes: Vec<HeaderId> = {
            let sub = &self.zdd_subtables[lo];
            collect_chain_ids(&self.nodes, sub)
                .into_iter()
                .map(|id| id as HeaderId)
                .collect()
        };
        for bucket in self.zdd_subtables[lo].buckets.iter_mut() {
            *bucket = SENTINEL;
        }
        self.zdd_subtables[lo].keys = 0;
        self.zdd_subtables[lo].dead = 0;

        for &node_id in &old_nodes {
            let id = node_id;
            let was_dead = self.nodes[id as usize].dead;
            let (old_then, old_else) = self.nodes[id as usize].children().unwrap();
            let then_is_hi = self.nodes[old_then.node_id() as usize].index == index_hi;
            let else_is_hi = self.nodes[old_else.node_id() as usize].index == index_hi;

            let (then1, then0) = if then_is_hi {
                self.nodes[old_then.node_id() as usize].children().unwrap()
            } else {
                (self.zdd_zero, old_then)
            };
            let (else1, else0) = if else_is_hi {
                self.nodes[old_else.node_id() as usize].children().unwrap()
            } else {
                (self.zdd_zero, old_else)
            };

            let new_then = match self.unique_inter_zdd(index_lo, then1, else1) {
                crate::error::Outcome::Value(h) => h,
                _ => self.zdd_zero,
            };
            let new_else = match self.unique_inter_zdd(index_lo, then0, else0) {
                crate::error::Outcome::Value(h) => h,
                _ => self.zdd_zero,
            };

            // Same ref/deref discipline as the BDD swap: the edge from `id`
            // to its children is changing, and a dead node's edges were
            // already excluded from its children's counts.
            if !was_dead {
                self.ref_zdd(new_then);
                self.ref_zdd(new_else);
                self.deref_zdd(old_then);
                self.deref_zdd(old_else);
            }

            self.nodes[id as usize].index = index_hi;
            self.nodes[id as usize].kind = NodeKind::Internal {
                then_: new_then,
                else_: new_else,
            };
            let sub = &mut self.zdd_subtables[hi];
            let bucket_idx = bucket_for(&self.nodes[id as usize], sub.buckets.len());
            self.nodes[id as usize].next = sub.buckets[bucket_idx];
            sub.buckets[bucket_idx] = id;
            sub.keys += 1;
            if was_dead {
                sub.dead += 1;
            }
        }

        self.zdd_index_to_level[index_lo as usize] = hi as Level;
        self.zdd_index_to_level[index_hi as usize] = lo as Level;
        self.zdd_level_to_index[lo] = index_hi;
        self.zdd_level_to_index[hi] = index_lo;

        self.cache.flush();
        self.live_node_count()
    }
}

fn collect_chain_ids(nodes: &[Node], sub: &crate::node::Subtable) -> Vec<u32> {
    let mut out = Vec::with_capacity(sub.keys);
    for &head in &sub.buckets {
        let mut cur = head;
        while cur != SENTINEL {
            out.push(cur);
            cur = nodes[cur as usize].next;
        }
    }
    out
}

fn bucket_for(node: &Node, slots: usize) -> usize {
    let (then_, else_) = match node.kind {
        NodeKind::Internal { then_, else_ } => (then_, else_),
        NodeKind::Constant { .. } => unreachable!("constants never move between subtables"),
    };
    let t = then_.raw() as u64;
    let e = else_.raw() as u64;
    const P1: u64 = 0x9E3779B97F4A7C15;
    const P2: u64 = 0xC2B2AE3D27D4EB4F;
    (((t.wrapping_mul(P1) ^ e.wrapping_mul(P2)) >> 16) as usize) & (slots - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigcount::U128Count;

    #[test]
    fn swap_adjacent_preserves_function() {
        let mut dd = Manager::new();
        let x0 = dd.create_bdd_var("x0");
        let x1 = dd.create_bdd_var("x1");
        let x2 = dd.create_bdd_var("x2");
        let f = dd.bdd_or(dd.bdd_and(x0, x1).unwrap(), x2).unwrap();

        let before: U128Count = dd.bdd_count(f);
        dd.bdd_swap_adjacent(0);
        let after: U128Count = dd.bdd_count(f);
        assert_eq!(before, after, "R7: minterm count is a reordering invariant");
    }

    #[test]
    fn sifting_does_not_grow_a_conjunction() {
        let mut dd = Manager::new();
        let n = 8;
        let x: Vec<_> = (0..n).map(|i| dd.create_bdd_var(format!("x{i}"))).collect();
        let y: Vec<_> = (0..n).map(|i| dd.create_bdd_var(format!("y{i}"))).collect();
        let mut f = dd.bdd_zero();
        for i in 0..n {
            let pair = dd.bdd_and(x[i], y[i]).unwrap();
            f = dd.bdd_or(f, pair).unwrap();
        }
        let before_count: U128Count = dd.bdd_count(f);
        let before_size = dd.live_node_count();

        dd.sift_all_bdd();

        let after_count: U128Count = dd.bdd_count(f);
        assert_eq!(before_count, after_count, "R7: sifting cannot change the function");
        assert!(dd.live_node_count() <= before_size);
    }
}

