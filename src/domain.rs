use bit_set::BitSet;

use crate::geometry::Geometry;
use crate::vocabulary::Vocabulary;
use crate::{SlotId, WordId};

/// The current candidate words for every slot, as sets of word ids. Only the consistency engine
/// mutates this; search reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    by_slot: Vec<BitSet>,
}

impl Domains {
    /// Give every slot the full vocabulary as its candidate set.
    pub fn initialize(geometry: &Geometry, vocabulary: &Vocabulary) -> Domains {
        let full: BitSet = (0..vocabulary.len()).collect();

        Domains {
            by_slot: (0..geometry.slot_count()).map(|_| full.clone()).collect(),
        }
    }

    /// Remove every word whose length differs from its slot's length. Slots may end up empty;
    /// that's left for propagation and search to report.
    pub fn enforce_node_consistency(&mut self, geometry: &Geometry, vocabulary: &Vocabulary) {
        for (slot_id, domain) in self.by_slot.iter_mut().enumerate() {
            let length = geometry.slot(slot_id).length;
            let mismatched: Vec<WordId> =
                domain.iter().filter(|&word_id| vocabulary.word(word_id).len() != length).collect();

            for word_id in mismatched {
                domain.remove(word_id);
            }
        }
    }

    pub fn len(&self, slot_id: SlotId) -> usize {
        self.by_slot[slot_id].len()
    }

    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.by_slot[slot_id].is_empty()
    }

    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.by_slot[slot_id].contains(word_id)
    }

    /// Candidate word ids for a slot, in ascending order.
    pub fn words(&self, slot_id: SlotId) -> impl Iterator<Item=WordId> + '_ {
        self.by_slot[slot_id].iter()
    }

    /// The first slot whose domain is empty, if any.
    pub fn first_empty(&self) -> Option<SlotId> {
        self.by_slot.iter().position(|domain| domain.is_empty())
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.by_slot.iter().map(|domain| domain.len()).collect()
    }

    pub(crate) fn domain_mut(&mut self, slot_id: SlotId) -> &mut BitSet {
        &mut self.by_slot[slot_id]
    }
}
