//! Per-agent index of overlapping pairs.
//!
//! Each pair is stored under both agents, so dropping every pair of one
//! agent costs its own number of partners rather than a scan of all pairs.

use std::collections::{BTreeMap, BTreeSet};

use crate::agent::AgentId;

/// Symmetric adjacency of agents whose rectangles overlap.
#[derive(Debug, Clone, Default)]
pub(crate) struct OverlapIndex {
    partners: BTreeMap<AgentId, BTreeSet<AgentId>>,
}

impl OverlapIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record a pair. Returns `true` if it was not recorded before.
    pub(crate) fn link(&mut self, a: AgentId, b: AgentId) -> bool {
        let inserted = self.partners.entry(a).or_default().insert(b);
        self.partners.entry(b).or_default().insert(a);
        inserted
    }

    /// Forget every pair `id` belongs to.
    pub(crate) fn unlink_all(&mut self, id: AgentId) {
        let Some(partners) = self.partners.remove(&id) else {
            return;
        };
        for partner in partners {
            if let Some(set) = self.partners.get_mut(&partner) {
                set.remove(&id);
                if set.is_empty() {
                    self.partners.remove(&partner);
                }
            }
        }
    }

    pub(crate) fn contains(&self, a: AgentId, b: AgentId) -> bool {
        self.partners.get(&a).is_some_and(|set| set.contains(&b))
    }

    /// Agents recorded as overlapping `id`, in id order.
    pub(crate) fn partners_of(&self, id: AgentId) -> impl Iterator<Item = AgentId> + '_ {
        self.partners.get(&id).into_iter().flatten().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> AgentId {
        AgentId::new(raw)
    }

    #[test]
    fn link_is_symmetric_and_reports_novelty() {
        let mut index = OverlapIndex::new();
        assert!(index.link(id(1), id(2)));
        assert!(!index.link(id(2), id(1)));
        assert!(index.contains(id(1), id(2)));
        assert!(index.contains(id(2), id(1)));
        assert_eq!(index.partners_of(id(1)).collect::<Vec<_>>(), vec![id(2)]);
    }

    #[test]
    fn unlink_clears_both_sides_only_for_that_agent() {
        let mut index = OverlapIndex::new();
        index.link(id(1), id(2));
        index.link(id(1), id(3));
        index.link(id(2), id(3));

        index.unlink_all(id(1));
        assert!(!index.contains(id(2), id(1)));
        assert!(!index.contains(id(3), id(1)));
        assert!(index.contains(id(2), id(3)));
        assert_eq!(index.partners_of(id(1)).count(), 0);
        assert_eq!(index.partners_of(id(3)).collect::<Vec<_>>(), vec![id(2)]);

        // Unknown ids are a no-op
        index.unlink_all(id(9));
        assert!(index.contains(id(3), id(2)));
    }
}
