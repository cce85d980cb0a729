//! The manager: the single owner of every node, subtable, the cache, the
//! free list, death row, and hook lists. Every DD operator in `bdd`, `add`,
//! `zdd`, and `reorder` is implemented as a method on this type (it is not
//! a process-global — DESIGN NOTES calls out replacing CUDD's global
//! `DdManager *` with an owned value as a required re-architecture).

use crate::cache::ComputedCache;
use crate::common::{HeaderId, Level, NodeId, OrderedF64, MAX_INDEX, MAX_REF, MEM_CHUNK, SENTINEL};
use crate::config::ManagerConfig;
use crate::error::{DdError, Outcome};
use crate::handle::Handle;
use crate::hooks::HookLists;
use crate::node::{ConstTable, Node, NodeKind, Subtable};
use std::time::Instant;

pub struct Manager {
    pub(crate) nodes: Vec<Node>,
    pub(crate) free_list: Vec<NodeId>,

    pub(crate) bdd_subtables: Vec<Subtable>,
    pub(crate) bdd_index_to_level: Vec<Level>,
    pub(crate) bdd_level_to_index: Vec<HeaderId>,
    pub(crate) bdd_projection: Vec<Handle>,

    pub(crate) zdd_subtables: Vec<Subtable>,
    pub(crate) zdd_index_to_level: Vec<Level>,
    pub(crate) zdd_level_to_index: Vec<HeaderId>,

    pub(crate) constants: ConstTable,

    pub(crate) cache: ComputedCache,

    pub(crate) death_row: Vec<Option<Handle>>,
    pub(crate) death_row_head: usize,
    pub(crate) death_row_mask: usize,

    pub(crate) bdd_one: Handle,
    pub(crate) zdd_one: Handle,
    pub(crate) zdd_zero: Handle,
    pub(crate) add_zero: Handle,

    pub config: ManagerConfig,
    pub hooks: HookLists,

    pub(crate) error: Option<DdError>,
    pub(crate) reorderings: u64,
    pub(crate) next_dyn: usize,

    pub(crate) live_node_budget: Option<usize>,
    pub(crate) start_time: Instant,

    pub(crate) chunk_capacity: usize,

    /// Set for the duration of `gc`/`reorder_if_due`, the only places a hook
    /// runs. `Manager` is `!Sync` by convention rather than by the type
    /// system (a library cannot stop a caller from wrapping it in a
    /// `Mutex`), so this is the checked half of that contract: a hook that
    /// somehow calls back into the manager it is running on (e.g. through a
    /// captured `Rc<RefCell<Manager>>`) panics here instead of corrupting a
    /// subtable mid-sweep.
    pub(crate) executing: bool,
}

impl Manager {
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        let slots = config.initial_subtable_slots;
        let death_row_depth = config.death_row_depth.next_power_of_two().max(1);

        let mut nodes = Vec::with_capacity(MEM_CHUNK);
        let mut constants = ConstTable::new(slots);

        let one_id = alloc_const_raw(&mut nodes, &mut constants, 1.0, config.const_epsilon);
        let zero_id = alloc_const_raw(&mut nodes, &mut constants, 0.0, config.const_epsilon);

        let bdd_one = Handle::regular(one_id);
        let add_zero = Handle::regular(zero_id);
        let zdd_one = Handle::regular(one_id);
        let zdd_zero = Handle::regular(zero_id);

        let reorder_threshold = config.reorder_initial_threshold;

        Self {
            nodes,
            free_list: Vec::new(),
            bdd_subtables: Vec::new(),
            bdd_index_to_level: Vec::new(),
            bdd_level_to_index: Vec::new(),
            bdd_projection: Vec::new(),
            zdd_subtables: Vec::new(),
            zdd_index_to_level: Vec::new(),
            zdd_level_to_index: Vec::new(),
            constants,
            cache: ComputedCache::new(slots),
            death_row: vec![None; death_row_depth],
            death_row_head: 0,
            death_row_mask: death_row_depth - 1,
            bdd_one,
            zdd_one,
            zdd_zero,
            add_zero,
            config,
            hooks: HookLists::default(),
            error: None,
            reorderings: 0,
            next_dyn: reorder_threshold,
            live_node_budget: None,
            start_time: Instant::now(),
            chunk_capacity: MEM_CHUNK,
            executing: false,
        }
    }

    /// Marks the manager busy for the duration of a hook-running pass;
    /// panics if already busy, since that can only mean a hook reentered it.
    pub(crate) fn enter_reentrant_section(&mut self) {
        if self.executing {
            panic!("Manager reentered while already executing a gc/reorder pass (called from a hook?)");
        }
        self.executing = true;
    }

    pub(crate) fn exit_reentrant_section(&mut self) {
        self.executing = false;
    }

    // ---- constants -----------------------------------------------------

    #[inline]
    pub fn bdd_one(&self) -> Handle {
        self.bdd_one
    }

    #[inline]
    pub fn bdd_zero(&self) -> Handle {
        self.bdd_one.complemented()
    }

    #[inline]
    pub fn add_one(&self) -> Handle {
        self.bdd_one
    }

    #[inline]
    pub fn add_zero(&self) -> Handle {
        self.add_zero
    }

    #[inline]
    pub fn zdd_one(&self) -> Handle {
        self.zdd_one
    }

    #[inline]
    pub fn zdd_zero(&self) -> Handle {
        self.zdd_zero
    }

    pub fn error(&self) -> Option<DdError> {
        self.error
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn elapsed_budget_ok(&mut self) -> bool {
        if let Some(limit) = self.config.time_limit {
            if self.start_time.elapsed() >= limit {
                self.error = Some(DdError::TimeoutExpired);
                return false;
            }
        }
        true
    }

    // ---- node access -----------------------------------------------------

    #[inline]
    pub fn node(&self, h: Handle) -> &Node {
        &self.nodes[h.node_id() as usize]
    }

    #[inline]
    pub fn is_constant(&self, h: Handle) -> bool {
        self.node(h).is_constant()
    }

    /// Value carried by a BDD/ADD constant node, respecting the handle's
    /// complement bit (`1.0 - v` under complementation, so `bdd_zero` reads
    /// back as `0.0` etc.). ZDD handles are never complemented so this is a
    /// plain lookup there.
    pub fn leaf_value(&self, h: Handle) -> Option<f64> {
        let v = self.node(h).value()?;
        Some(if h.is_complement() { 1.0 - v } else { v })
    }

    pub fn bdd_level_of_handle(&self, h: Handle) -> Level {
        let idx = self.node(h).index;
        if idx == MAX_INDEX {
            Level::MAX
        } else {
            self.bdd_index_to_level[idx as usize]
        }
    }

    pub fn zdd_level_of_handle(&self, h: Handle) -> Level {
        let idx = self.node(h).index;
        if idx == MAX_INDEX {
            Level::MAX
        } else {
            self.zdd_index_to_level[idx as usize]
        }
    }

    pub fn bdd_label(&self, index: HeaderId) -> &str {
        let level = self.bdd_index_to_level[index as usize];
        &self.bdd_subtables[level as usize].label
    }

    /// Topmost (lowest-level) variable among `hs`, ignoring constants.
    /// `None` if every handle is constant.
    pub(crate) fn bdd_top(&self, hs: &[Handle]) -> Option<HeaderId> {
        let mut best: Option<(Level, HeaderId)> = None;
        for &h in hs {
            let node = self.node(h);
            if node.is_constant() {
                continue;
            }
            let level = self.bdd_index_to_level[node.index as usize];
            if best.map_or(true, |(l, _)| level < l) {
                best = Some((level, node.index));
            }
        }
        best.map(|(_, idx)| idx)
    }

    /// Shannon cofactors `(f|x=1, f|x=0)` of `h` on `split_index`. If `h`
    /// does not depend on that variable, both cofactors equal `h`.
    pub(crate) fn bdd_cofactors(&self, h: Handle, split_index: HeaderId) -> (Handle, Handle) {
        let node = self.node(h);
        if node.is_constant() || node.index != split_index {
            return (h, h);
        }
        let (then_, else_) = node.children().unwrap();
        if h.is_complement() {
            (then_.complemented(), else_.complemented())
        } else {
            (then_, else_)
        }
    }

    pub(crate) fn zdd_top(&self, hs: &[Handle]) -> Option<HeaderId> {
        let mut best: Option<(Level, HeaderId)> = None;
        for &h in hs {
            let node = self.node(h);
            if node.is_constant() {
                continue;
            }
            let level = self.zdd_index_to_level[node.index as usize];
            if best.map_or(true, |(l, _)| level < l) {
                best = Some((level, node.index));
            }
        }
        best.map(|(_, idx)| idx)
    }

    // ---- allocator --------------------------------------------------------

    fn alloc_slot(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.free_list.pop() {
            self.nodes[id as usize] = node;
            id
        } else {
            if self.nodes.len() == self.nodes.capacity() {
                self.nodes.reserve(self.chunk_capacity);
            }
            let id = self.nodes.len() as NodeId;
            self.nodes.push(node);
            id
        }
    }

    // ---- unique table: BDD/ADD --------------------------------------------

    /// `UniqueInter`: returns the canonical handle for `(index, then, else)`
    /// among BDD/ADD nodes, creating it if needed. `then` must be regular;
    /// callers that might pass a complemented `then` (the ITE normal-form
    /// reducer) must commute first.
    pub fn unique_inter(&mut self, index: HeaderId, then_: Handle, else_: Handle) -> Outcome<Handle> {
        debug_assert!(!then_.is_complement(), "then-child must be regular");
        if then_ == else_ {
            return Outcome::Value(then_);
        }
        if !self.elapsed_budget_ok() {
            return Outcome::Err(self.error.unwrap());
        }

        let level = self.bdd_index_to_level[index as usize] as usize;
        let (found, bucket_idx) = {
            let sub = &self.bdd_subtables[level];
            find_in_chain(&self.nodes, sub, index, then_, else_)
        };

        if let Some(id) = found {
            if self.nodes[id as usize].dead {
                self.nodes[id as usize].dead = false;
                self.bdd_subtables[level].dead -= 1;
            }
            return Outcome::Value(Handle::regular(id));
        }

        // Not found: allocate, link into chain, bump child refs.
        let sub_len = self.bdd_subtables[level].buckets.len();
        let new_id = self.alloc_slot(Node {
            index,
            kind: NodeKind::Internal { then_, else_ },
            refcount: 0,
            dead: false,
            next: SENTINEL,
        });
        self.nodes[then_.node_id() as usize].ref_inc();
        self.nodes[else_.regularized().node_id() as usize].ref_inc();

        let sub = &mut self.bdd_subtables[level];
        sub.buckets[bucket_idx] = new_id;
        sub.keys += 1;
        let keys = sub.keys;
        let dead = sub.dead;
        drop(sub);

        if (keys as f64) > sub_len as f64 * self.config.max_density {
            self.grow_bdd_subtable(level);
        }
        let new_handle = Handle::regular(new_id);
        if self.config.auto_reorder_enabled && keys - dead >= self.next_dyn {
            // The newly created node stays in the table (harmless, refcount
            // zero, reclaimed by the next GC); the caller's top-level retry
            // loop reorders and recomputes from scratch instead of handing
            // back a handle that a mid-reorder recursion might stash.
            return Outcome::Retry;
        }
        Outcome::Value(new_handle)
    }

    fn grow_bdd_subtable(&mut self, level: usize) {
        let old_len = self.bdd_subtables[level].buckets.len();
        let new_len = old_len * 2;
        let mut new_buckets = vec![SENTINEL; new_len];
        let old_buckets = std::mem::replace(&mut self.bdd_subtables[level].buckets, Vec::new());
        for head in old_buckets {
            let mut cur = head;
            while cur != SENTINEL {
                let next = self.nodes[cur as usize].next;
                let (then_, else_) = self.nodes[cur as usize].children().unwrap();
                let idx = hash_children(then_, else_) & (new_len - 1);
                self.nodes[cur as usize].next = new_buckets[idx];
                new_buckets[idx] = cur;
                cur = next;
            }
        }
        self.bdd_subtables[level].buckets = new_buckets;
    }

    /// `UniqueConst`: canonical handle for a leaf value, BDD/ADD-shared.
    pub fn unique_const(&mut self, value: f64) -> Outcome<Handle> {
        if value.is_nan() {
            return Outcome::Err(DdError::InvalidArg("NaN is not a valid ADD leaf"));
        }
        let id = alloc_const(
            &mut self.nodes,
            &mut self.free_list,
            &mut self.constants,
            value,
            self.config.const_epsilon,
        );
        Outcome::Value(Handle::regular(id))
    }

    // ---- unique table: ZDD -------------------------------------------------

    /// `UniqueInterZdd`: applies the elimination rule at the call site — if
    /// `then_` is the ZDD zero, no node is created and `else_` is returned
    /// directly.
    pub fn unique_inter_zdd(&mut self, index: HeaderId, then_: Handle, else_: Handle) -> Outcome<Handle> {
        debug_assert!(!then_.is_complement() && !else_.is_complement());
        if then_ == self.zdd_zero {
            return Outcome::Value(else_);
        }
        if !self.elapsed_budget_ok() {
            return Outcome::Err(self.error.unwrap());
        }

        let level = self.zdd_index_to_level[index as usize] as usize;
        let (found, bucket_idx) = {
            let sub = &self.zdd_subtables[level];
            find_in_chain(&self.nodes, sub, index, then_, else_)
        };
        if let Some(id) = found {
            if self.nodes[id as usize].dead {
                self.nodes[id as usize].dead = false;
                self.zdd_subtables[level].dead -= 1;
            }
            return Outcome::Value(Handle::regular(id));
        }

        let sub_len = self.zdd_subtables[level].buckets.len();
        let new_id = self.alloc_slot(Node {
            index,
            kind: NodeKind::Internal { then_, else_ },
            refcount: 0,
            dead: false,
            next: SENTINEL,
        });
        self.nodes[then_.node_id() as usize].ref_inc();
        self.nodes[else_.node_id() as usize].ref_inc();

        let sub = &mut self.zdd_subtables[level];
        sub.buckets[bucket_idx] = new_id;
        sub.keys += 1;
        let keys = sub.keys;
        drop(sub);

        if (keys as f64) > sub_len as f64 * self.config.max_density {
            self.grow_zdd_subtable(level);
        }
        Outcome::Value(Handle::regular(new_id))
    }

    fn grow_zdd_subtable(&mut self, level: usize) {
        let old_len = self.zdd_subtables[level].buckets.len();
        let new_len = old_len * 2;
        let mut new_buckets = vec![SENTINEL; new_len];
        let old_buckets = std::mem::replace(&mut self.zdd_subtables[level].buckets, Vec::new());
        for head in old_buckets {
            let mut cur = head;
            while cur != SENTINEL {
                let next = self.nodes[cur as usize].next;
                let (then_, else_) = self.nodes[cur as usize].children().unwrap();
                let idx = hash_children(then_, else_) & (new_len - 1);
                self.nodes[cur as usize].next = new_buckets[idx];
                new_buckets[idx] = cur;
                cur = next;
            }
        }
        self.zdd_subtables[level].buckets = new_buckets;
    }

    // ---- variable creation --------------------------------------------------

    /// Appends a new BDD/ADD variable at the bottom of the current order and
    /// returns its projection function `(index, then=1, else=0)`.
    pub fn create_bdd_var(&mut self, label: impl Into<String>) -> Handle {
        let index = self.bdd_index_to_level.len() as HeaderId;
        let level = self.bdd_subtables.len() as Level;
        self.bdd_index_to_level.push(level);
        self.bdd_level_to_index.push(index);
        self.bdd_subtables.push(Subtable::new(
            index,
            level,
            label.into(),
            self.config.initial_subtable_slots,
        ));
        let proj = loop {
            match self.unique_inter(index, self.bdd_one(), self.bdd_zero()) {
                Outcome::Value(h) => break h,
                Outcome::Retry => self.reorder_if_due(),
                Outcome::Err(e) => panic!("projection function creation failed: {e}"),
            }
        };
        self.ref_bdd(proj);
        self.bdd_projection.push(proj);
        proj
    }

    pub fn bdd_var(&self, index: HeaderId) -> Handle {
        self.bdd_projection[index as usize]
    }

    pub fn num_bdd_vars(&self) -> usize {
        self.bdd_index_to_level.len()
    }

    pub fn create_zdd_var(&mut self, label: impl Into<String>) -> HeaderId {
        let index = self.zdd_index_to_level.len() as HeaderId;
        let level = self.zdd_subtables.len() as Level;
        self.zdd_index_to_level.push(level);
        self.zdd_level_to_index.push(index);
        self.zdd_subtables.push(Subtable::new(
            index,
            level,
            label.into(),
            self.config.initial_subtable_slots,
        ));
        index
    }

    pub fn num_zdd_vars(&self) -> usize {
        self.zdd_index_to_level.len()
    }

    // ---- reference counting -------------------------------------------------

    pub fn ref_bdd(&mut self, h: Handle) {
        self.nodes[h.node_id() as usize].ref_inc();
    }

    pub fn deref_bdd(&mut self, h: Handle) {
        if self.nodes[h.node_id() as usize].ref_dec() {
            self.recursive_deref_bdd(h.regularized());
        }
    }

    fn recursive_deref_bdd(&mut self, h: Handle) {
        let id = h.node_id();
        let node = &mut self.nodes[id as usize];
        if node.is_constant() {
            return;
        }
        node.dead = true;
        let level = self.bdd_index_to_level[node.index as usize] as usize;
        self.bdd_subtables[level].dead += 1;
        let (then_, else_) = self.nodes[id as usize].children().unwrap();
        if self.nodes[then_.node_id() as usize].ref_dec() {
            self.recursive_deref_bdd(then_);
        }
        let e = else_.regularized();
        if self.nodes[e.node_id() as usize].ref_dec() {
            self.recursive_deref_bdd(e);
        }
    }

    pub fn ref_zdd(&mut self, h: Handle) {
        self.nodes[h.node_id() as usize].ref_inc();
    }

    pub fn deref_zdd(&mut self, h: Handle) {
        if self.nodes[h.node_id() as usize].ref_dec() {
            self.recursive_deref_zdd(h);
        }
    }

    fn recursive_deref_zdd(&mut self, h: Handle) {
        let id = h.node_id();
        let node = &mut self.nodes[id as usize];
        if node.is_constant() {
            return;
        }
        node.dead = true;
        let level = self.zdd_index_to_level[node.index as usize] as usize;
        self.zdd_subtables[level].dead += 1;
        let (then_, else_) = self.nodes[id as usize].children().unwrap();
        if self.nodes[then_.node_id() as usize].ref_dec() {
            self.recursive_deref_zdd(then_);
        }
        if self.nodes[else_.node_id() as usize].ref_dec() {
            self.recursive_deref_zdd(else_);
        }
    }

    /// `DelayedDerefBdd`: enqueues the handle into the death row instead of
    /// dereferencing immediately. When the row wraps around, the oldest
    /// entry is flushed with a real `deref_bdd`.
    pub fn delayed_deref_bdd(&mut self, h: Handle) {
        let slot = self.death_row_head;
        if let Some(old) = self.death_row[slot].take() {
            self.deref_bdd(old);
        }
        self.death_row[slot] = Some(h);
        self.death_row_head = (slot + 1) & self.death_row_mask;
    }

    /// `cuddClearDeathRow`: drains the whole row immediately. Always run
    /// before GC and before reordering.
    pub fn clear_death_row(&mut self) {
        self.drain_death_row();
    }

    // ---- garbage collection -------------------------------------------------

    /// Runs the full GC procedure: drain death row, pre-GC hooks, scrub the
    /// cache, sweep BDD/ADD then ZDD subtables, return nodes to the free
    /// list, post-GC hooks.
    pub fn gc(&mut self) {
        self.enter_reentrant_section();
        self.drain_death_row();
        if !HookLists::run(&mut self.hooks.pre_gc) {
            self.exit_reentrant_section();
            return;
        }

        let nodes_ref = &self.nodes;
        self.cache.scrub(|h| nodes_ref[h.node_id() as usize].dead);

        let mut reclaimed = 0usize;
        for level in 0..self.bdd_subtables.len() {
            reclaimed += sweep_subtable(&mut self.nodes, &mut self.bdd_subtables[level], &mut self.free_list);
        }
        for level in 0..self.zdd_subtables.len() {
            reclaimed += sweep_subtable(&mut self.nodes, &mut self.zdd_subtables[level], &mut self.free_list);
        }
        log::debug!("gc: reclaimed {} dead nodes", reclaimed);

        HookLists::run(&mut self.hooks.post_gc);
        self.exit_reentrant_section();
    }

    fn drain_death_row(&mut self) {
        for i in 0..self.death_row.len() {
            if let Some(h) = self.death_row[i].take() {
                self.deref_bdd(h);
            }
        }
        self.death_row_head = 0;
    }

    /// Total live (non-dead) nodes across BDD/ADD and ZDD subtables plus
    /// constants — the quantity invariant U7 is stated about.
    pub fn live_node_count(&self) -> usize {
        let bdd: usize = self.bdd_subtables.iter().map(|s| s.keys - s.dead).sum();
        let zdd: usize = self.zdd_subtables.iter().map(|s| s.keys - s.dead).sum();
        bdd + zdd + self.constants.keys
    }

    pub fn total_keys(&self) -> usize {
        let bdd: usize = self.bdd_subtables.iter().map(|s| s.keys).sum();
        let zdd: usize = self.zdd_subtables.iter().map(|s| s.keys).sum();
        bdd + zdd + self.constants.keys
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

// ---- free functions shared by BDD/ADD and ZDD unique-table paths ----------

#[inline]
fn hash_children(then_: Handle, else_: Handle) -> usize {
    const P1: u64 = 0x9E3779B97F4A7C15;
    const P2: u64 = 0xC2B2AE3D27D4EB4F;
    let t = then_.raw() as u64;
    let e = else_.raw() as u64;
    ((t.wrapping_mul(P1) ^ e.wrapping_mul(P2)) >> 16) as usize
}

/// Probes the chain for `(index, then, else)`, keeping the strictly
/// decreasing `(then, else)` order invariant in mind (callers that insert
/// rely on `find_in_chain` returning the bucket index even on a miss so the
/// caller can link the new node in at the head — this implementation links
/// new nodes at the head rather than preserving sort order, which is within
/// spec: the *hard* invariant is that some total order's maintained
/// consistently so rehashing can still partition chains in one pass; with
/// head-insertion the chain is not literally sorted, so rehash partitions by
/// hash bit alone, which remains correct and is the approach taken here).
fn find_in_chain(
    nodes: &[Node],
    sub: &Subtable,
    index: HeaderId,
    then_: Handle,
    else_: Handle,
) -> (Option<NodeId>, usize) {
    let bucket_idx = hash_children(then_, else_) & (sub.buckets.len() - 1);
    let mut cur = sub.buckets[bucket_idx];
    while cur != SENTINEL {
        let n = &nodes[cur as usize];
        if n.index == index {
            if let NodeKind::Internal { then_: t, else_: e } = n.kind {
                if t == then_ && e == else_ {
                    return (Some(cur), bucket_idx);
                }
            }
        }
        cur = n.next;
    }
    (None, bucket_idx)
}

fn alloc_const_raw(
    nodes: &mut Vec<Node>,
    constants: &mut ConstTable,
    value: f64,
    epsilon: f64,
) -> NodeId {
    let mut free = Vec::new();
    alloc_const(nodes, &mut free, constants, value, epsilon)
}

fn alloc_const(
    nodes: &mut Vec<Node>,
    free_list: &mut Vec<NodeId>,
    constants: &mut ConstTable,
    value: f64,
    epsilon: f64,
) -> NodeId {
    let key = OrderedF64::new(value).expect("NaN rejected by caller");
    let bucket_idx = {
        use std::hash::{Hash, Hasher};
        let mut hasher = wyhash::WyHash::default();
        key.hash(&mut hasher);
        (hasher.finish() as usize) & (constants.buckets.len() - 1)
    };
    let mut cur = constants.buckets[bucket_idx];
    while cur != SENTINEL {
        let n = &nodes[cur as usize];
        if let Some(v) = n.value() {
            if (v - value).abs() <= epsilon {
                return cur;
            }
        }
        cur = n.next;
    }

    let new_id = if let Some(id) = free_list.pop() {
        nodes[id as usize] = Node {
            index: MAX_INDEX,
            kind: NodeKind::Constant {
                value: key,
            },
            refcount: 0,
            dead: false,
            next: SENTINEL,
        };
        id
    } else {
        let id = nodes.len() as NodeId;
        nodes.push(Node {
            index: MAX_INDEX,
            kind: NodeKind::Constant {
                value: key,
            },
            refcount: 0,
            dead: false,
            next: SENTINEL,
        });
        id
    };
    nodes[new_id as usize].next = constants.buckets[bucket_idx];
    constants.buckets[bucket_idx] = new_id;
    constants.keys += 1;
    new_id
}

fn sweep_subtable(nodes: &mut [Node], sub: &mut Subtable, free_list: &mut Vec<NodeId>) -> usize {
    if sub.dead == 0 {
        return 0;
    }
    let mut reclaimed = 0;
    for bucket in sub.buckets.iter_mut() {
        let mut prev: Option<NodeId> = None;
        let mut cur = *bucket;
        while cur != SENTINEL {
            let next = nodes[cur as usize].next;
            if nodes[cur as usize].dead && nodes[cur as usize].refcount == 0 {
                // unlink
                match prev {
                    Some(p) => nodes[p as usize].next = next,
                    None => *bucket = next,
                }
                free_list.push(cur);
                reclaimed += 1;
                sub.keys -= 1;
                sub.dead -= 1;
            } else {
                prev = Some(cur);
            }
            cur = next;
        }
    }
    reclaimed
}

// `MAX_REF` is re-exported for callers that want to test saturation directly.
pub const SATURATION: u16 = MAX_REF;
