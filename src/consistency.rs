use std::collections::VecDeque;

use bit_set::BitSet;
use log::trace;
use thiserror::Error;

use crate::domain::Domains;
use crate::geometry::Geometry;
use crate::search::Assignment;
use crate::vocabulary::Vocabulary;
use crate::{SlotId, WordId};

/// A directed constraint `(x, y)`: the domain of `x` must stay consistent with the domain of `y`.
pub type Arc = (SlotId, SlotId);

/// Make slot `x` arc-consistent with slot `y` by removing every candidate for `x` whose character
/// at the shared cell doesn't appear at that cell in any candidate for `y`. Returns whether the
/// domain of `x` changed. Slots that don't cross are left alone.
pub fn revise(
    geometry: &Geometry,
    vocabulary: &Vocabulary,
    domains: &mut Domains,
    x: SlotId,
    y: SlotId,
) -> bool {
    let Some((x_cell, y_cell)) = geometry.overlap(x, y) else {
        return false;
    };

    // Every glyph that some candidate for `y` places in the shared cell. This is gathered up front
    // so the scan of `x` is against a fixed view of `y`.
    let mut supported_glyphs = BitSet::with_capacity(vocabulary.glyph_count());
    for word_id in domains.words(y) {
        if let Some(&glyph) = vocabulary.word(word_id).glyphs.get(y_cell) {
            supported_glyphs.insert(glyph);
        }
    }

    let unsupported: Vec<WordId> = domains.words(x).filter(|&word_id| {
        vocabulary.word(word_id).glyphs.get(x_cell)
            .map_or(true, |&glyph| !supported_glyphs.contains(glyph))
    }).collect();

    let domain = domains.domain_mut(x);
    for &word_id in &unsupported {
        domain.remove(word_id);
    }

    !unsupported.is_empty()
}

/// Worklist of arcs still to be revised. An arc is never queued twice at the same time.
#[derive(Debug)]
struct ArcQueue {
    slot_count: usize,
    queue: VecDeque<Arc>,
    queued: BitSet,
}

impl ArcQueue {
    fn new(slot_count: usize) -> ArcQueue {
        ArcQueue {
            slot_count,
            queue: VecDeque::new(),
            queued: BitSet::with_capacity(slot_count * slot_count),
        }
    }

    fn pop_front(&mut self) -> Option<Arc> {
        let arc = self.queue.pop_front()?;
        self.queued.remove(arc.0 * self.slot_count + arc.1);
        Some(arc)
    }

    fn enqueue(&mut self, arc: Arc) {
        if self.queued.insert(arc.0 * self.slot_count + arc.1) {
            self.queue.push_back(arc);
        }
    }
}

/// Results from a call to `ac3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arcs were revised.
    pub revisions: u64,
    /// How many candidate words were removed across all slots.
    pub eliminations: u64,
}

/// Why `ac3` stopped before reaching a fixed point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArcConsistencyFailure {
    /// Propagation emptied the domain of `slot_id`, so no assignment can exist under these domains.
    #[error("slot {slot_id} has no options left after {revisions} revisions")]
    EmptyDomain { slot_id: SlotId, revisions: u64 },

    /// A supplied arc names a slot the geometry doesn't have. Nothing was revised.
    #[error("arc ({x}, {y}) references unknown slot {slot_id}")]
    UnknownSlot { slot_id: SlotId, x: SlotId, y: SlotId },
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Enforce arc consistency across the grid with AC-3. If `arcs` is `None`, start from every
/// ordered pair of crossing slots; otherwise start from just the given arcs. Whenever a revision
/// shrinks a slot's domain, every other neighbor's arc into that slot is queued again. Gives up as
/// soon as any domain is empty, including a domain that was already empty on entry. Supplied arcs
/// are checked against the geometry before anything is revised.
pub fn ac3(
    geometry: &Geometry,
    vocabulary: &Vocabulary,
    domains: &mut Domains,
    arcs: Option<Vec<Arc>>,
) -> ArcConsistencyResult {
    if let Some(arcs) = &arcs {
        for &(x, y) in arcs {
            let slot_id = x.max(y);
            if slot_id >= geometry.slot_count() {
                return Err(ArcConsistencyFailure::UnknownSlot { slot_id, x, y });
            }
        }
    }

    // Slots emptied before propagation (by node consistency, say) may have no arcs to catch them.
    if let Some(slot_id) = domains.first_empty() {
        return Err(ArcConsistencyFailure::EmptyDomain { slot_id, revisions: 0 });
    }

    let mut queue = ArcQueue::new(geometry.slot_count());

    match arcs {
        Some(arcs) => arcs.into_iter().for_each(|arc| queue.enqueue(arc)),
        None => {
            for x in 0..geometry.slot_count() {
                for &y in geometry.neighbors(x) {
                    queue.enqueue((x, y));
                }
            }
        }
    }

    let mut revisions: u64 = 0;
    let mut eliminations: u64 = 0;

    while let Some((x, y)) = queue.pop_front() {
        let before = domains.len(x);
        revisions += 1;

        if !revise(geometry, vocabulary, domains, x, y) {
            continue;
        }

        eliminations += (before - domains.len(x)) as u64;
        trace!("revised slot {} against slot {}: {} -> {} options", x, y, before, domains.len(x));

        if domains.is_empty(x) {
            return Err(ArcConsistencyFailure::EmptyDomain { slot_id: x, revisions });
        }

        for &z in geometry.neighbors(x) {
            if z != y {
                queue.enqueue((z, x));
            }
        }
    }

    Ok(ArcConsistencySuccess { revisions, eliminations })
}

/// Check that a partial or complete assignment fits the grid: every word has its slot's length, no
/// word is used twice, and crossing slots agree on their shared cell.
pub fn is_consistent(geometry: &Geometry, vocabulary: &Vocabulary, assignment: &Assignment) -> bool {
    let choices = assignment.choices();

    let lengths_match = choices.iter().all(|choice| {
        vocabulary.word(choice.word_id).len() == geometry.slot(choice.slot_id).length
    });
    if !lengths_match {
        return false;
    }

    for (idx, a) in choices.iter().enumerate() {
        for b in &choices[idx + 1..] {
            if a.word_id == b.word_id {
                return false;
            }
            if let Some((a_cell, b_cell)) = geometry.overlap(a.slot_id, b.slot_id) {
                let a_glyph = vocabulary.word(a.word_id).glyphs[a_cell];
                let b_glyph = vocabulary.word(b.word_id).glyphs[b_cell];
                if a_glyph != b_glyph {
                    return false;
                }
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Direction::*;
    use crate::geometry::Slot;

    /// An across slot whose last cell starts a down slot.
    fn corner_geometry() -> Geometry {
        Geometry::from_template_string(
            "
            ___
            ##_
            ##_
            ",
        ).unwrap()
    }

    fn ring_geometry() -> Geometry {
        Geometry::from_template_string(
            "
            ____
            _##_
            _##_
            ____
            ",
        ).unwrap()
    }

    fn prepared(geometry: &Geometry, vocabulary: &Vocabulary) -> Domains {
        let mut domains = Domains::initialize(geometry, vocabulary);
        domains.enforce_node_consistency(geometry, vocabulary);
        domains
    }

    #[test]
    fn test_revise_without_overlap_is_noop() {
        let geometry = ring_geometry();
        let vocabulary = Vocabulary::new(["snap", "many", "zzzz"]);
        let mut domains = prepared(&geometry, &vocabulary);
        let before = domains.clone();

        assert_eq!(geometry.overlap(0, 1), None);
        assert!(!revise(&geometry, &vocabulary, &mut domains, 0, 1));
        assert_eq!(domains, before);
    }

    #[test]
    fn test_revise_removes_unsupported_words_only_from_x() {
        let geometry = corner_geometry();
        let vocabulary = Vocabulary::new(["abc", "xyz", "cat"]);
        let mut domains = prepared(&geometry, &vocabulary);

        // Across ends where down starts, and only ABC ends with a letter some word starts with.
        assert!(revise(&geometry, &vocabulary, &mut domains, 0, 1));
        let across: Vec<WordId> = domains.words(0).collect();
        assert_eq!(across, vec![vocabulary.find("abc").unwrap()]);
        assert_eq!(domains.len(1), 3);

        assert!(!revise(&geometry, &vocabulary, &mut domains, 0, 1));
    }

    #[test]
    fn test_ac3_failure_leaves_empty_domain() {
        let geometry = corner_geometry();
        let vocabulary = Vocabulary::new(["abc", "xyz"]);
        let mut domains = prepared(&geometry, &vocabulary);

        match ac3(&geometry, &vocabulary, &mut domains, None) {
            Err(ArcConsistencyFailure::EmptyDomain { slot_id, .. }) => {
                assert!(domains.is_empty(slot_id));
                assert_eq!(domains.first_empty(), Some(slot_id));
            }
            other => panic!("Expected an emptied domain, got {:?}", other),
        }
    }

    #[test]
    fn test_ac3_fails_on_isolated_empty_slot() {
        let geometry = Geometry::from_template_string(
            "
            ___
            ###
            ____
            ",
        ).unwrap();
        let vocabulary = Vocabulary::new(["cat", "dog"]);
        let mut domains = prepared(&geometry, &vocabulary);

        let failure = ac3(&geometry, &vocabulary, &mut domains, None).unwrap_err();

        assert_eq!(failure, ArcConsistencyFailure::EmptyDomain { slot_id: 1, revisions: 0 });
    }

    #[test]
    fn test_ac3_success_leaves_every_word_supported() {
        let geometry = ring_geometry();
        let vocabulary = Vocabulary::new([
            "snap", "stem", "play", "many", "code", "tree", "blue", "none", "swim", "echo",
        ]);
        let mut domains = prepared(&geometry, &vocabulary);

        ac3(&geometry, &vocabulary, &mut domains, None).unwrap();

        assert_eq!(domains.first_empty(), None);
        for x in 0..geometry.slot_count() {
            for &y in geometry.neighbors(x) {
                let (x_cell, y_cell) = geometry.overlap(x, y).unwrap();
                for word_id in domains.words(x) {
                    let glyph = vocabulary.word(word_id).glyphs[x_cell];
                    assert!(domains.words(y).any(|other| vocabulary.word(other).glyphs[y_cell] == glyph));
                }
            }
        }
    }

    #[test]
    fn test_ac3_is_idempotent() {
        let geometry = ring_geometry();
        let vocabulary = Vocabulary::new([
            "snap", "stem", "play", "many", "code", "tree", "blue", "none", "swim", "echo",
        ]);
        let mut domains = prepared(&geometry, &vocabulary);

        ac3(&geometry, &vocabulary, &mut domains, None).unwrap();
        let once = domains.clone();
        let second = ac3(&geometry, &vocabulary, &mut domains, None).unwrap();

        assert_eq!(domains, once);
        assert_eq!(second.eliminations, 0);
    }

    #[test]
    fn test_ac3_with_explicit_arcs_only_touches_those_arcs() {
        let geometry = corner_geometry();
        let vocabulary = Vocabulary::new(["abc", "cat", "xyz"]);
        let mut domains = prepared(&geometry, &vocabulary);

        // Revising down against across leaves only words starting with a letter some across word
        // ends with. Across itself isn't revised because down has no other neighbor to requeue.
        let result = ac3(&geometry, &vocabulary, &mut domains, Some(vec![(1, 0)])).unwrap();

        assert_eq!(result.revisions, 1);
        assert_eq!(domains.words(1).collect::<Vec<_>>(), vec![vocabulary.find("cat").unwrap()]);
        assert_eq!(domains.len(0), 3);
    }

    /// Slot 0 crosses slot 1, slot 1 crosses slot 2, and slots 0 and 2 don't touch.
    fn chain_geometry() -> Geometry {
        Geometry::from_slots(3, 3, vec![
            Slot::new(0, 0, Across, 3),
            Slot::new(0, 2, Down, 3),
            Slot::new(2, 0, Across, 3),
        ]).unwrap()
    }

    fn restrict(domains: &mut Domains, vocabulary: &Vocabulary, slot_id: SlotId, keep: &[&str]) {
        let keep: Vec<WordId> = keep.iter().map(|word| vocabulary.find(word).unwrap()).collect();
        let drop: Vec<WordId> = domains.words(slot_id).filter(|word_id| !keep.contains(word_id)).collect();
        for word_id in drop {
            domains.domain_mut(slot_id).remove(word_id);
        }
    }

    #[test]
    fn test_ac3_requeues_arcs_into_shrunk_slot() {
        let geometry = chain_geometry();
        assert_eq!(geometry.overlap(0, 2), None);

        let vocabulary = Vocabulary::new(["abc", "abd", "cxp", "dxq", "zzp"]);
        let mut domains = prepared(&geometry, &vocabulary);
        restrict(&mut domains, &vocabulary, 0, &["abc", "abd"]);
        restrict(&mut domains, &vocabulary, 1, &["cxp", "dxq"]);
        restrict(&mut domains, &vocabulary, 2, &["zzp"]);
        let abd = vocabulary.find("abd").unwrap();

        // One pass over the initial arcs: ABD still has DXQ as a partner when (0, 1) is revised,
        // and DXQ only loses its support when (1, 2) runs afterwards.
        let mut single_pass = domains.clone();
        for (x, y) in [(0, 1), (1, 0), (1, 2), (2, 1)] {
            revise(&geometry, &vocabulary, &mut single_pass, x, y);
        }
        assert!(single_pass.contains(0, abd));
        assert!(!single_pass.contains(1, vocabulary.find("dxq").unwrap()));

        ac3(&geometry, &vocabulary, &mut domains, None).unwrap();

        assert!(!domains.contains(0, abd));
        assert_eq!(domains.words(0).collect::<Vec<_>>(), vec![vocabulary.find("abc").unwrap()]);
        assert_eq!(domains.words(1).collect::<Vec<_>>(), vec![vocabulary.find("cxp").unwrap()]);
    }

    #[test]
    fn test_ac3_rejects_arcs_with_unknown_slots() {
        let geometry = corner_geometry();
        let vocabulary = Vocabulary::new(["abc", "cat", "xyz"]);
        let mut domains = prepared(&geometry, &vocabulary);
        let before = domains.clone();

        let failure = ac3(&geometry, &vocabulary, &mut domains, Some(vec![(1, 0), (0, 2)])).unwrap_err();

        assert_eq!(failure, ArcConsistencyFailure::UnknownSlot { slot_id: 2, x: 0, y: 2 });
        assert_eq!(domains, before);
    }

    #[test]
    fn test_is_consistent() {
        let geometry = corner_geometry();
        let vocabulary = Vocabulary::new(["abc", "cat", "xyz", "at"]);
        let id = |word: &str| vocabulary.find(word).unwrap();

        let mut assignment = Assignment::new(geometry.slot_count());
        assert!(is_consistent(&geometry, &vocabulary, &assignment));

        assignment.bind(0, id("abc"));
        assert!(is_consistent(&geometry, &vocabulary, &assignment));

        assignment.bind(1, id("cat"));
        assert!(is_consistent(&geometry, &vocabulary, &assignment));

        assignment.unbind();
        assignment.bind(1, id("xyz"));
        assert!(!is_consistent(&geometry, &vocabulary, &assignment), "crossing letters disagree");

        assignment.unbind();
        assignment.bind(1, id("abc"));
        assert!(!is_consistent(&geometry, &vocabulary, &assignment), "word used twice");

        assignment.unbind();
        assignment.bind(1, id("at"));
        assert!(!is_consistent(&geometry, &vocabulary, &assignment), "wrong length");
    }
}
