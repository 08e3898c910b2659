use instant::{Duration, Instant};
use log::{debug, info};

pub mod consistency;
pub mod domain;
pub mod geometry;
pub mod render;
pub mod search;
pub mod vocabulary;

pub use consistency::{ac3, is_consistent, revise, Arc, ArcConsistencyFailure, ArcConsistencySuccess};
pub use domain::Domains;
pub use geometry::{Direction, Geometry, GeometryError, Slot};
pub use render::{letter_grid, render_grid};
pub use search::{Assignment, Choice, Search};
pub use vocabulary::{Vocabulary, Word};

/// The expected maximum length for a single slot. Longer slots still work, they just spill the
/// inline buffers onto the heap.
pub const MAX_SLOT_LENGTH: usize = 21;

/// An identifier for a given letter or whatever, based on its index in the vocabulary's glyph
/// table.
pub type GlyphId = usize;

/// An identifier for a given slot, based on its index in the geometry's slot list.
pub type SlotId = usize;

/// An identifier for a given word, based on its index in the vocabulary.
pub type WordId = usize;

/// Zero-indexed (row, column) coords for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Slots selected for assignment during search.
    pub states: u64,
    /// Words bound during search and later withdrawn.
    pub backtracks: u64,
    /// Arc revisions performed during propagation.
    pub revisions: u64,
    /// Candidate words removed during propagation.
    pub eliminations: u64,
    pub duration: Duration,
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

/// Why a grid couldn't be filled. Neither case is a fault; both mean no fill exists for this
/// vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillFailure {
    /// Consistency enforcement left this slot with no candidate words.
    Unsatisfiable { slot_id: SlotId },
    /// Every branch of the search was tried.
    Exhausted { statistics: Statistics },
}

/// Search for a valid fill: start every slot with the whole vocabulary, filter by length, make the
/// grid arc-consistent, then backtrack over the remaining candidates.
pub fn find_fill(geometry: &Geometry, vocabulary: &Vocabulary) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();

    info!("filling {} slots from {} words", geometry.slot_count(), vocabulary.len());

    let mut domains = Domains::initialize(geometry, vocabulary);
    domains.enforce_node_consistency(geometry, vocabulary);
    debug!("options after node consistency: {:?}", domains.sizes());

    let propagation = match ac3(geometry, vocabulary, &mut domains, None) {
        Ok(success) => success,
        Err(ArcConsistencyFailure::EmptyDomain { slot_id, revisions }) => {
            info!("slot {} has no options left after {} revisions", slot_id, revisions);
            return Err(FillFailure::Unsatisfiable { slot_id });
        }
        Err(failure @ ArcConsistencyFailure::UnknownSlot { .. }) => {
            unreachable!("arcs seeded from the geometry were rejected: {}", failure);
        }
    };
    debug!(
        "options after arc consistency: {:?} ({} revisions, {} eliminations)",
        domains.sizes(), propagation.revisions, propagation.eliminations,
    );

    let mut assignment = Assignment::new(geometry.slot_count());
    let mut search = Search::new(geometry, vocabulary, &domains);
    let found = search.backtrack(&mut assignment);

    let mut statistics = search.into_statistics();
    statistics.revisions = propagation.revisions;
    statistics.eliminations = propagation.eliminations;
    statistics.duration = start.elapsed();

    if found {
        info!("found a fill: {:?}", statistics);
        Ok(FillSuccess { statistics, assignment })
    } else {
        info!("search exhausted: {:?}", statistics);
        Err(FillFailure::Exhausted { statistics })
    }
}

/// Fill the grid, returning a complete consistent assignment or `None` if there isn't one.
pub fn solve(geometry: &Geometry, vocabulary: &Vocabulary) -> Option<Assignment> {
    find_fill(geometry, vocabulary).ok().map(|result| result.assignment)
}
