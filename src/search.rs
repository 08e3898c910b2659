use std::cmp::Reverse;

use log::trace;

use crate::consistency::is_consistent;
use crate::domain::Domains;
use crate::geometry::Geometry;
use crate::vocabulary::Vocabulary;
use crate::{SlotId, Statistics, WordId};

/// A struct recording a slot assignment made during the filling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// A partial mapping from slots to words. Choices are kept as a stack: `unbind` always removes the
/// most recent one, so a slot can only be cleared by whoever bound it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    choices: Vec<Choice>,
    words_by_slot: Vec<Option<WordId>>,
}

impl Assignment {
    /// An empty assignment for a grid with `slot_count` slots.
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            choices: Vec::with_capacity(slot_count),
            words_by_slot: vec![None; slot_count],
        }
    }

    /// Bind `word_id` to an unbound slot.
    pub fn bind(&mut self, slot_id: SlotId, word_id: WordId) {
        assert!(self.words_by_slot[slot_id].is_none(), "slot {} is already bound", slot_id);

        self.words_by_slot[slot_id] = Some(word_id);
        self.choices.push(Choice { slot_id, word_id });
    }

    /// Remove the most recent choice.
    pub fn unbind(&mut self) -> Option<Choice> {
        let choice = self.choices.pop()?;
        self.words_by_slot[choice.slot_id] = None;
        Some(choice)
    }

    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words_by_slot[slot_id]
    }

    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.words_by_slot[slot_id].is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.choices.len() == self.words_by_slot.len()
    }

    /// Choices in the order they were made.
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// The text of the word bound to a slot.
    pub fn word<'a>(&self, vocabulary: &'a Vocabulary, slot_id: SlotId) -> Option<&'a str> {
        self.get(slot_id).map(|word_id| vocabulary.word(word_id).string.as_str())
    }
}

/// Depth-first backtracking search over a fixed set of domains. Domains are only read here; all
/// pruning happens before search starts.
pub struct Search<'a> {
    geometry: &'a Geometry,
    vocabulary: &'a Vocabulary,
    domains: &'a Domains,
    statistics: Statistics,
}

impl<'a> Search<'a> {
    pub fn new(geometry: &'a Geometry, vocabulary: &'a Vocabulary, domains: &'a Domains) -> Search<'a> {
        Search { geometry, vocabulary, domains, statistics: Statistics::default() }
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn into_statistics(self) -> Statistics {
        self.statistics
    }

    /// Choose the unassigned slot with the fewest remaining candidates, preferring the slot with
    /// the most neighbors on a tie and then the lowest slot id.
    pub fn select_unassigned_slot(&self, assignment: &Assignment) -> Option<SlotId> {
        (0..self.geometry.slot_count())
            .filter(|&slot_id| !assignment.is_assigned(slot_id))
            .min_by_key(|&slot_id| {
                (self.domains.len(slot_id), Reverse(self.geometry.degree(slot_id)), slot_id)
            })
    }

    /// Return the candidates for `slot_id` ordered by how many candidates each would rule out in
    /// the unassigned neighboring slots, fewest first. Ties keep ascending word id order.
    pub fn order_domain_values(&self, slot_id: SlotId, assignment: &Assignment) -> Vec<WordId> {
        // For each unassigned neighbor: our cell at the crossing, how many of its candidates put
        // each glyph at the crossing, and its total candidate count.
        let crossings: Vec<(usize, Vec<usize>, usize)> = self.geometry.neighbors(slot_id).iter()
            .filter(|&&neighbor| !assignment.is_assigned(neighbor))
            .filter_map(|&neighbor| {
                let (cell, neighbor_cell) = self.geometry.overlap(slot_id, neighbor)?;
                let mut glyph_counts = vec![0; self.vocabulary.glyph_count()];
                for word_id in self.domains.words(neighbor) {
                    if let Some(&glyph) = self.vocabulary.word(word_id).glyphs.get(neighbor_cell) {
                        glyph_counts[glyph] += 1;
                    }
                }
                Some((cell, glyph_counts, self.domains.len(neighbor)))
            })
            .collect();

        let mut word_ids: Vec<WordId> = self.domains.words(slot_id).collect();

        word_ids.sort_by_cached_key(|&word_id| {
            let word = self.vocabulary.word(word_id);

            crossings.iter().map(|(cell, glyph_counts, total)| {
                match word.glyphs.get(*cell) {
                    Some(&glyph) => total - glyph_counts[glyph],
                    None => *total,
                }
            }).sum::<usize>()
        });

        word_ids
    }

    /// Extend `assignment` until every slot is bound. Returns true with the complete assignment
    /// left in place, or false with `assignment` restored to how it was passed in.
    pub fn backtrack(&mut self, assignment: &mut Assignment) -> bool {
        if assignment.is_complete() {
            return true;
        }

        let Some(slot_id) = self.select_unassigned_slot(assignment) else {
            return true;
        };
        self.statistics.states += 1;

        for word_id in self.order_domain_values(slot_id, assignment) {
            assignment.bind(slot_id, word_id);
            trace!("slot {} <- {}", slot_id, self.vocabulary.word(word_id).string);

            if is_consistent(self.geometry, self.vocabulary, assignment) && self.backtrack(assignment) {
                return true;
            }

            assignment.unbind();
            self.statistics.backtracks += 1;
        }

        false
    }
}
