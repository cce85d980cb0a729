//! Hook lists invoked synchronously at well-defined points around GC and
//! reordering. A hook returns `true` to continue, `false` to request abort
//! of the enclosing GC/reorder pass. Hooks are forbidden from reentering the
//! manager; since Rust cannot express that statically for a `Box<dyn FnMut>`
//! closure without unsafe aliasing, the manager enforces it by temporarily
//! `mem::take`-ing the relevant list before running it and restoring it
//! afterwards, so a hook that tries to register another hook just mutates a
//! list nobody is iterating.

pub type Hook = Box<dyn FnMut() -> bool>;

#[derive(Default)]
pub struct HookLists {
    pub pre_gc: Vec<Hook>,
    pub post_gc: Vec<Hook>,
    pub pre_reorder: Vec<Hook>,
    pub post_reorder: Vec<Hook>,
}

impl HookLists {
    /// Runs every hook in `list`, short-circuiting (but still running the
    /// rest — hooks are advisory, not gates, except for the all-abort
    /// convention: if *any* hook returns `false` the caller should not
    /// proceed with the irreversible part of the pass).
    pub fn run(list: &mut Vec<Hook>) -> bool {
        let mut hooks = std::mem::take(list);
        let mut proceed = true;
        for hook in hooks.iter_mut() {
            if !hook() {
                proceed = false;
            }
        }
        *list = hooks;
        proceed
    }
}
