//! Variable groups for grouped reordering: a read-only view over the
//! `symmetry_next` links `Manager::bind_symmetric` lays down in the BDD/ADD
//! subtables. Sifting normally moves one variable at a time; once variables
//! are grouped, [`GroupTree`] lets a caller move every member together as a
//! single unit instead (their relative order is frozen, only the whole
//! block's position changes).
//!
//! A simple union-find: groups never merge or split mid-pass in this
//! design (binding happens before reordering, not interleaved with it), so
//! the tree is built once from the current `symmetry_next` chains and
//! consulted read-only by the reordering pass.

use crate::common::{HashMap, HeaderId};
use crate::manager::Manager;

pub struct GroupTree {
    /// Every group's members, in the order they appear along the
    /// `symmetry_next` chain (the order sifting should try to preserve when
    /// it relocates the group).
    groups: Vec<Vec<HeaderId>>,
    /// Which entry in `groups` a given variable belongs to.
    member_of: HashMap<HeaderId, usize>,
}

impl GroupTree {
    /// Walks every BDD/ADD subtable's `symmetry_next` link to recover the
    /// groups currently bound via `bind_symmetric`. A variable with no link
    /// and not targeted by one is its own singleton group.
    pub fn from_bdd_subtables(manager: &Manager) -> Self {
        let n = manager.num_bdd_vars();
        let mut is_head = vec![true; n];
        let next: Vec<Option<HeaderId>> = (0..n)
            .map(|index| manager.bdd_subtables[manager.bdd_index_to_level[index] as usize].symmetry_next)
            .collect();
        for &maybe_target in &next {
            if let Some(target) = maybe_target {
                is_head[target as usize] = false;
            }
        }

        let mut groups = Vec::new();
        let mut member_of = HashMap::default();
        for index in 0..n {
            if !is_head[index] {
                continue;
            }
            let group_id = groups.len();
            let mut members = Vec::new();
            let mut cur = Some(index as HeaderId);
            let mut seen = std::collections::HashSet::new();
            while let Some(v) = cur {
                if !seen.insert(v) {
                    break; // defensive: a cycle would otherwise loop forever
                }
                members.push(v);
                member_of.insert(v, group_id);
                cur = next[v as usize];
            }
            groups.push(members);
        }
        Self { groups, member_of }
    }

    pub fn group_of(&self, index: HeaderId) -> &[HeaderId] {
        &self.groups[self.member_of[&index]]
    }

    pub fn same_group(&self, a: HeaderId, b: HeaderId) -> bool {
        self.member_of.get(&a) == self.member_of.get(&b)
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> &[Vec<HeaderId>] {
        &self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigcount::U128Count;

    #[test]
    fn bound_pair_forms_one_group() {
        let mut dd = Manager::new();
        let a = dd.create_bdd_var("a");
        let b = dd.create_bdd_var("b");
        let _c = dd.create_bdd_var("c");
        dd.bind_symmetric(a, b);

        let tree = GroupTree::from_bdd_subtables(&dd);
        assert_eq!(tree.num_groups(), 2);
        assert!(tree.same_group(a, b));
        assert_eq!(tree.group_of(a), &[a, b]);
    }

    #[test]
    fn grouped_sift_preserves_function() {
        let mut dd = Manager::new();
        let a = dd.create_bdd_var("a");
        let b = dd.create_bdd_var("b");
        let c = dd.create_bdd_var("c");
        let f = dd.bdd_xor(dd.bdd_and(a, b).unwrap(), c).unwrap();
        dd.bind_symmetric(a, b);

        let before: U128Count = dd.bdd_count(f);
        dd.sift_all_grouped();
        let after: U128Count = dd.bdd_count(f);
        assert_eq!(before, after);
    }
}
