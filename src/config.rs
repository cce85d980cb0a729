//! Every documented, application-visible knob, collected in one place with
//! the defaults named in the external-interface section of the design.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Initial bucket count for a freshly created subtable.
    pub initial_subtable_slots: usize,
    /// Maximum keys-per-slot density before a subtable doubles.
    pub max_density: f64,
    /// Rolling cache hit ratio above which the cache is grown.
    pub cache_hit_resize_threshold: f64,
    /// Below this keys/maxDensity fraction, GC never runs.
    pub gc_dead_fraction_lo: f64,
    /// Above this fraction, GC is forced regardless of savings heuristics.
    pub gc_dead_fraction_hi: f64,
    /// Minimum fraction of `max_density` considered under memory pressure.
    pub gc_dead_fraction_min: f64,
    /// Sifting/window abort bound: a trial direction is abandoned once its
    /// running node count exceeds `best_so_far * max_growth`.
    pub reorder_max_growth: f64,
    /// Hard cap on the number of variables sifted in one reordering pass.
    pub sifting_max_var: usize,
    /// Hard cap on the number of adjacent swaps performed while sifting.
    pub sifting_max_swap: usize,
    /// Live-node count at which the first automatic reordering triggers.
    pub reorder_initial_threshold: usize,
    /// Growth ratio between one reordering and the next automatic one.
    pub reorder_growth_ratio: f64,
    /// Whether automatic reordering is allowed to trigger inside operators.
    pub auto_reorder_enabled: bool,
    /// Hard memory cap across the whole manager, in bytes. `None` = unbounded.
    pub max_memory: Option<usize>,
    /// Wall/CPU time budget for a single top-level operator call.
    pub time_limit: Option<Duration>,
    /// Death-row circular buffer length (rounded up to a power of two,
    /// clamped to at least 1 — see DESIGN.md's resolution of the original
    /// open question about a zero-length buffer).
    pub death_row_depth: usize,
    /// Tolerance used when uniquing ADD constant leaves: two values within
    /// this absolute distance of each other are treated as the same node.
    /// `0.0` means bitwise-exact uniquing.
    pub const_epsilon: f64,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            initial_subtable_slots: 128,
            max_density: 4.0,
            cache_hit_resize_threshold: 0.30,
            gc_dead_fraction_lo: 1.0,
            gc_dead_fraction_hi: 4.0,
            gc_dead_fraction_min: 0.2,
            reorder_max_growth: 1.2,
            sifting_max_var: 1000,
            sifting_max_swap: 2_000_000,
            reorder_initial_threshold: 4004,
            reorder_growth_ratio: 2.0,
            auto_reorder_enabled: true,
            max_memory: None,
            time_limit: None,
            death_row_depth: 16,
            const_epsilon: 0.0,
        }
    }
}
