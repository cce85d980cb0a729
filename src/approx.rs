//! Approximation / subsetting: shrinks a BDD to a smaller one that over- or
//! under-approximates the original (every minterm of `f` is also a minterm
//! of `remap_overapprox(f, ..)`; every minterm of `remap_underapprox(f, ..)`
//! is also a minterm of `f`). A single profile pass (`top_dist`/`bottom_dist`
//! /minterm counts per node) feeds both directions, rather than CUDD's
//! separate family of shortest-path/hard-limit subsetting routines — the
//! quality/threshold knob below stands in for that whole family. See
//! DESIGN.md for the scope call this collapses.

use crate::common::HashMap;
use crate::error::DdResult;
use crate::handle::Handle;
use crate::manager::Manager;

/// Per-node profile gathered by one BFS pass over a BDD, keyed by the
/// regular (non-complemented) handle: the complement bit only flips which
/// terminal a path reaches, not the node's position in the graph.
#[derive(Debug, Clone, Copy)]
struct Profile {
    /// Shortest distance (in levels) from the root to this node.
    top_dist: u32,
    /// Shortest distance from this node down to either terminal.
    bottom_dist: u32,
    /// Number of minterms (over the variables below this node) that reach
    /// the `1` terminal from here, saturating at `u64::MAX` rather than
    /// overflowing — this pass only needs relative magnitude, not an exact
    /// count (exact counting is `bdd_count`'s job).
    minterms_to_one: u64,
}

/// How aggressively to shrink. `threshold` bounds how small a subtree's
/// minterm share must be, relative to its sibling, before that subtree is
/// collapsed to a terminal; `quality` (0.0-1.0) scales how far down the
/// diagram the pass is willing to look before giving up and keeping a node
/// as-is. Replaces CUDD's separate `BddApproxConjDecomp`/`...Remap...`/
/// shortest-path variants with one tunable pass.
#[derive(Debug, Clone, Copy)]
pub struct ApproxConfig {
    pub threshold: f64,
    pub quality: f64,
}

impl Default for ApproxConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            quality: 1.0,
        }
    }
}

impl Manager {
    /// Over-approximates `f`: the result's true-set is a superset of `f`'s.
    /// Collapses low-minterm-share subtrees toward `1` instead of `0`.
    pub fn remap_overapprox(&mut self, f: Handle, cfg: ApproxConfig) -> DdResult<Handle> {
        let one = self.bdd_one();
        self.remap(f, cfg, one)
    }

    /// Under-approximates `f`: the result's true-set is a subset of `f`'s.
    /// Collapses low-minterm-share subtrees toward `0` instead of `1`.
    pub fn remap_underapprox(&mut self, f: Handle, cfg: ApproxConfig) -> DdResult<Handle> {
        let zero = self.bdd_zero();
        self.remap(f, cfg, zero)
    }

    fn remap(&mut self, f: Handle, cfg: ApproxConfig, collapse_to: Handle) -> DdResult<Handle> {
        if self.is_constant(f) {
            return Ok(f);
        }
        let profiles = self.profile_bfs(f);
        let max_bottom = profiles.values().map(|p| p.bottom_dist).max().unwrap_or(0);
        let depth_cutoff = (max_bottom as f64 * cfg.quality).round() as u32;
        let root_total = profiles[&f.regularized()].minterms_to_one.max(1);
        let mut memo = HashMap::default();
        self.remap_step(f, cfg, collapse_to, depth_cutoff, root_total, &profiles, &mut memo)
    }

    /// One BFS pass from `f`, computing `top_dist`/`bottom_dist`/minterm
    /// share per regular node reachable from it.
    fn profile_bfs(&self, f: Handle) -> HashMap<Handle, Profile> {
        let mut profiles: HashMap<Handle, Profile> = HashMap::default();
        let mut order: Vec<Handle> = Vec::new();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((f.regularized(), 0u32));
        while let Some((h, dist)) = queue.pop_front() {
            if let Some(p) = profiles.get_mut(&h) {
                p.top_dist = p.top_dist.min(dist);
                continue;
            }
            profiles.insert(
                h,
                Profile {
                    top_dist: dist,
                    bottom_dist: 0,
                    minterms_to_one: 0,
                },
            );
            order.push(h);
            if let Some((t, e)) = self.node(h).children() {
                queue.push_back((t.regularized(), dist + 1));
                queue.push_back((e.regularized(), dist + 1));
            }
        }
        // bottom_dist / minterm share: fold bottom-up (reverse BFS order is
        // not quite topological, so just iterate until stable on this small
        // pass — any DAG this size converges in at most its depth rounds).
        for _ in 0..order.len() {
            let mut changed = false;
            for &h in order.iter().rev() {
                if self.is_constant(h) {
                    let p = profiles.get_mut(&h).unwrap();
                    if p.bottom_dist != 0 || p.minterms_to_one != leaf_weight(self, h) {
                        p.bottom_dist = 0;
                        p.minterms_to_one = leaf_weight(self, h);
                        changed = true;
                    }
                    continue;
                }
                let (t, e) = self.node(h).children().unwrap();
                let tp = profiles[&t.regularized()];
                let ep = profiles[&e.regularized()];
                let new_bottom = 1 + tp.bottom_dist.max(ep.bottom_dist);
                let new_minterms = tp.minterms_to_one.saturating_add(ep.minterms_to_one);
                let p = profiles.get_mut(&h).unwrap();
                if p.bottom_dist != new_bottom || p.minterms_to_one != new_minterms {
                    p.bottom_dist = new_bottom;
                    p.minterms_to_one = new_minterms;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        profiles
    }

    fn remap_step(
        &mut self,
        h: Handle,
        cfg: ApproxConfig,
        collapse_to: Handle,
        depth_cutoff: u32,
        root_total: u64,
        profiles: &HashMap<Handle, Profile>,
        memo: &mut HashMap<Handle, Handle>,
    ) -> DdResult<Handle> {
        if self.is_constant(h) {
            return Ok(h);
        }
        let regular = h.regularized();
        if let Some(&cached) = memo.get(&regular) {
            return Ok(apply_complement(cached, h));
        }
        let p = profiles[&regular];
        if p.top_dist >= depth_cutoff {
            // Only collapse when this subtree's own share of the whole
            // diagram's minterms is below `threshold`. The canonical
            // (non-complemented) node always collapses toward the same
            // `collapse_to` constant; the caller's complement bit is folded
            // back in on return, not here.
            let share = p.minterms_to_one as f64 / root_total as f64;
            if share <= cfg.threshold {
                memo.insert(regular, collapse_to);
                return Ok(apply_complement(collapse_to, h));
            }
        }
        let (t, e) = self.node(regular).children().unwrap();
        let nt = self.remap_step(t, cfg, collapse_to, depth_cutoff, root_total, profiles, memo)?;
        let ne = self.remap_step(e, cfg, collapse_to, depth_cutoff, root_total, profiles, memo)?;
        let index = self.node(regular).index;
        let result = self.bdd_ite(self.bdd_var(index), nt, ne)?;
        memo.insert(regular, result);
        Ok(apply_complement(result, h))
    }
}

fn leaf_weight(manager: &Manager, h: Handle) -> u64 {
    if manager.leaf_value(h) == Some(0.0) {
        0
    } else {
        1
    }
}

fn apply_complement(built_from_regular: Handle, original: Handle) -> Handle {
    if original.is_complement() {
        built_from_regular.complemented()
    } else {
        built_from_regular
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigcount::U128Count;

    #[test]
    fn overapprox_is_a_superset_and_underapprox_is_a_subset() {
        let mut dd = Manager::new();
        let x0 = dd.create_bdd_var("x0");
        let x1 = dd.create_bdd_var("x1");
        let x2 = dd.create_bdd_var("x2");
        let f = dd.bdd_or(dd.bdd_and(x0, x1).unwrap(), dd.bdd_and(dd.bdd_not(x0), x2).unwrap()).unwrap();

        let cfg = ApproxConfig { threshold: 1.0, quality: 1.0 };
        let over = dd.remap_overapprox(f, cfg).unwrap();
        let under = dd.remap_underapprox(f, cfg).unwrap();

        // f => over: f AND NOT over has no minterms.
        let not_over = dd.bdd_not(over);
        let diff = dd.bdd_and(f, not_over).unwrap();
        assert_eq!(diff, dd.bdd_zero());

        // under => f: under AND NOT f has no minterms.
        let not_f = dd.bdd_not(f);
        let diff2 = dd.bdd_and(under, not_f).unwrap();
        assert_eq!(diff2, dd.bdd_zero());
    }

    #[test]
    fn a_constant_is_its_own_approximation() {
        let mut dd = Manager::new();
        let one = dd.bdd_one();
        let cfg = ApproxConfig::default();
        assert_eq!(dd.remap_overapprox(one, cfg).unwrap(), one);
        assert_eq!(dd.remap_underapprox(one, cfg).unwrap(), one);
    }

    #[test]
    fn zero_threshold_keeps_the_function_unchanged() {
        let mut dd = Manager::new();
        let x0 = dd.create_bdd_var("x0");
        let x1 = dd.create_bdd_var("x1");
        let f = dd.bdd_and(x0, x1).unwrap();
        let cfg = ApproxConfig { threshold: 0.0, quality: 1.0 };

        let over = dd.remap_overapprox(f, cfg).unwrap();
        let count_f: U128Count = dd.bdd_count(f);
        let count_over: U128Count = dd.bdd_count(over);
        assert_eq!(count_f, count_over, "nothing has a strictly-below-zero minterm share to collapse");
    }
}
