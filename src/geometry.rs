use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use smallvec::SmallVec;
use thiserror::Error;

use crate::{GridCoord, SlotId, MAX_SLOT_LENGTH};

/// Direction that a slot is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

/// A maximal run of fillable cells that will hold a single word. Two slots are the same slot iff
/// all four fields match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub row: usize,
    pub column: usize,
    pub direction: Direction,
    pub length: usize,
}

impl Slot {
    pub fn new(row: usize, column: usize, direction: Direction, length: usize) -> Slot {
        Slot { row, column, direction, length }
    }

    /// Generate the coords for each cell of this slot.
    pub fn cells(&self) -> impl Iterator<Item=GridCoord> + '_ {
        (0..self.length).map(move |cell_idx| {
            match self.direction {
                Direction::Across => (self.row, self.column + cell_idx),
                Direction::Down => (self.row + cell_idx, self.column),
            }
        })
    }
}

/// Problems with a puzzle's structure that make it impossible to search. These are detected while
/// building a `Geometry`, so nothing downstream ever sees a malformed grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("structure has no rows")]
    EmptyStructure,

    #[error("slot {slot} has zero length")]
    ZeroLengthSlot { slot: SlotId },

    #[error("slot {slot} extends past the {height}x{width} grid")]
    SlotOutOfBounds { slot: SlotId, height: usize, width: usize },

    #[error("slots {first} and {second} are identical")]
    DuplicateSlot { first: SlotId, second: SlotId },

    #[error("slots {first} and {second} share more than one cell")]
    AmbiguousOverlap { first: SlotId, second: SlotId },

    #[error("overlap entry references unknown slot {slot}")]
    UnknownSlot { slot: SlotId },

    #[error("slot {slot} is listed as overlapping itself")]
    SelfOverlap { slot: SlotId },

    #[error("overlap offset {offset} is outside slot {slot} (length {length})")]
    OverlapOutOfBounds { slot: SlotId, offset: usize, length: usize },

    #[error("overlap between slots {first} and {second} is not symmetric")]
    AsymmetricOverlap { first: SlotId, second: SlotId },

    #[error("overlap between slots {first} and {second} does not match the cells they share")]
    InconsistentOverlap { first: SlotId, second: SlotId },
}

/// The static shape of a puzzle: which cells can hold letters, which slots exist, and where the
/// slots cross each other. Slots are identified by their index in `slots`, and the overlap and
/// neighbor tables are precomputed against those ids.
pub struct Geometry {
    height: usize,
    width: usize,
    fillable: Vec<Vec<bool>>,
    slots: Vec<Slot>,

    /// Dense `slot_count * slot_count` table. Entry `a * n + b` holds the offsets into slot `a`
    /// and slot `b` of their shared cell, if any.
    overlaps: Vec<Option<(usize, usize)>>,

    /// Neighbors of each slot in ascending id order.
    neighbors: Vec<SmallVec<[SlotId; MAX_SLOT_LENGTH]>>,
}

impl Debug for Geometry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geometry")
            .field("height", &self.height)
            .field("width", &self.width)
            .field("slots", &self.slots)
            .field("neighbors", &self.neighbors)
            .finish()
    }
}

impl Geometry {
    /// Build a geometry from a fillability matrix, deriving every across and down run of two or
    /// more fillable cells as a slot. Across slots come first, then down slots, each in row-major
    /// order of their starting cell.
    pub fn from_structure(structure: Vec<Vec<bool>>) -> Result<Geometry, GeometryError> {
        let height = structure.len();
        let width = structure.iter().map(|row| row.len()).max().unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(GeometryError::EmptyStructure);
        }

        let fillable: Vec<Vec<bool>> = structure.into_iter().map(|mut row| {
            row.resize(width, false);
            row
        }).collect();

        let mut slots: Vec<Slot> = vec![];

        for (row, line) in fillable.iter().enumerate() {
            let mut column = 0;
            while column < width {
                if !line[column] {
                    column += 1;
                    continue;
                }
                let start = column;
                while column < width && line[column] {
                    column += 1;
                }
                if column - start > 1 {
                    slots.push(Slot::new(row, start, Direction::Across, column - start));
                }
            }
        }

        for row in 0..height {
            for column in 0..width {
                let starts_down_run = fillable[row][column] && (row == 0 || !fillable[row - 1][column]);
                if !starts_down_run {
                    continue;
                }
                let length = (row..height).take_while(|&r| fillable[r][column]).count();
                if length > 1 {
                    slots.push(Slot::new(row, column, Direction::Down, length));
                }
            }
        }

        let overlaps = compute_overlaps(&slots)?;
        Ok(Geometry::assemble(height, width, fillable, slots, overlaps))
    }

    /// Build a geometry from a template string, with `_` or `.` representing fillable cells and
    /// anything else representing blocks. Blank lines are ignored and each line is trimmed, so
    /// templates can be indented.
    pub fn from_template_string(template: &str) -> Result<Geometry, GeometryError> {
        let structure: Vec<Vec<bool>> =
            template.lines().filter_map(|line| {
                let line = line.trim();
                if line.is_empty() {
                    None
                } else {
                    Some(line.chars().map(|c| c == '_' || c == '.').collect())
                }
            }).collect();

        Geometry::from_structure(structure)
    }

    /// Build a geometry from an explicit slot list. The fillable cells are exactly the cells the
    /// slots cover, and overlaps are computed from the cells they share.
    pub fn from_slots(height: usize, width: usize, slots: Vec<Slot>) -> Result<Geometry, GeometryError> {
        let fillable = fillable_cells(height, width, &slots)?;
        let overlaps = compute_overlaps(&slots)?;
        Ok(Geometry::assemble(height, width, fillable, slots, overlaps))
    }

    /// Build a geometry from an explicit slot list and a caller-supplied overlap table. Each entry
    /// `(a, b, (i, j))` says that cell `i` of slot `a` is cell `j` of slot `b`; the mirrored entry
    /// is implied. The table must agree with the cells the slots actually share.
    pub fn with_overlaps(
        height: usize,
        width: usize,
        slots: Vec<Slot>,
        entries: &[(SlotId, SlotId, (usize, usize))],
    ) -> Result<Geometry, GeometryError> {
        let fillable = fillable_cells(height, width, &slots)?;
        let slot_count = slots.len();
        let mut overlaps: Vec<Option<(usize, usize)>> = vec![None; slot_count * slot_count];

        for &(a, b, (i, j)) in entries {
            for slot in [a, b] {
                if slot >= slot_count {
                    return Err(GeometryError::UnknownSlot { slot });
                }
            }
            if a == b {
                return Err(GeometryError::SelfOverlap { slot: a });
            }
            for (slot, offset) in [(a, i), (b, j)] {
                if offset >= slots[slot].length {
                    return Err(GeometryError::OverlapOutOfBounds {
                        slot,
                        offset,
                        length: slots[slot].length,
                    });
                }
            }

            for (key, value) in [(a * slot_count + b, (i, j)), (b * slot_count + a, (j, i))] {
                match overlaps[key] {
                    Some(existing) if existing != value => {
                        return Err(GeometryError::AsymmetricOverlap { first: a, second: b });
                    }
                    _ => overlaps[key] = Some(value),
                }
            }
        }

        let shared_cells = compute_overlaps(&slots)?;
        if overlaps != shared_cells {
            let (first, second) = first_mismatch(&overlaps, &shared_cells, slot_count);
            return Err(GeometryError::InconsistentOverlap { first, second });
        }

        Ok(Geometry::assemble(height, width, fillable, slots, overlaps))
    }

    fn assemble(
        height: usize,
        width: usize,
        fillable: Vec<Vec<bool>>,
        slots: Vec<Slot>,
        overlaps: Vec<Option<(usize, usize)>>,
    ) -> Geometry {
        let slot_count = slots.len();
        let neighbors = (0..slot_count).map(|a| {
            (0..slot_count).filter(|&b| overlaps[a * slot_count + b].is_some()).collect()
        }).collect();

        Geometry { height, width, fillable, slots, overlaps, neighbors }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_fillable(&self, row: usize, column: usize) -> bool {
        self.fillable.get(row).and_then(|line| line.get(column)).copied().unwrap_or(false)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, slot_id: SlotId) -> &Slot {
        &self.slots[slot_id]
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Offsets `(i, j)` such that character `i` of slot `a` must equal character `j` of slot `b`.
    ///
    /// Panics if either id isn't a slot in this geometry.
    pub fn overlap(&self, a: SlotId, b: SlotId) -> Option<(usize, usize)> {
        let slot_count = self.slots.len();
        assert!(
            a < slot_count && b < slot_count,
            "overlap({}, {}) references a slot outside 0..{}", a, b, slot_count,
        );
        self.overlaps[a * slot_count + b]
    }

    pub fn neighbors(&self, slot_id: SlotId) -> &[SlotId] {
        &self.neighbors[slot_id]
    }

    pub fn degree(&self, slot_id: SlotId) -> usize {
        self.neighbors[slot_id].len()
    }
}

/// Check each slot's bounds and build the fillability matrix covered by the slots.
fn fillable_cells(height: usize, width: usize, slots: &[Slot]) -> Result<Vec<Vec<bool>>, GeometryError> {
    let mut fillable = vec![vec![false; width]; height];

    for (slot_id, slot) in slots.iter().enumerate() {
        if slot.length == 0 {
            return Err(GeometryError::ZeroLengthSlot { slot: slot_id });
        }
        for (row, column) in slot.cells() {
            if row >= height || column >= width {
                return Err(GeometryError::SlotOutOfBounds { slot: slot_id, height, width });
            }
            fillable[row][column] = true;
        }
    }

    Ok(fillable)
}

/// Build the dense overlap table from the cells each pair of slots has in common.
fn compute_overlaps(slots: &[Slot]) -> Result<Vec<Option<(usize, usize)>>, GeometryError> {
    let slot_count = slots.len();

    // (slot id, cell index within slot) for every slot touching a cell.
    let mut entries_by_cell: HashMap<GridCoord, Vec<(SlotId, usize)>> = HashMap::new();

    for (slot_id, slot) in slots.iter().enumerate() {
        if slot.length == 0 {
            return Err(GeometryError::ZeroLengthSlot { slot: slot_id });
        }
        if let Some(first) = slots[..slot_id].iter().position(|other| other == slot) {
            return Err(GeometryError::DuplicateSlot { first, second: slot_id });
        }
        for (cell_idx, cell) in slot.cells().enumerate() {
            entries_by_cell.entry(cell).or_default().push((slot_id, cell_idx));
        }
    }

    let mut overlaps: Vec<Option<(usize, usize)>> = vec![None; slot_count * slot_count];

    for entries in entries_by_cell.values() {
        for &(a, i) in entries {
            for &(b, j) in entries {
                if a == b {
                    continue;
                }
                if overlaps[a * slot_count + b].is_some() {
                    return Err(GeometryError::AmbiguousOverlap { first: a.min(b), second: a.max(b) });
                }
                overlaps[a * slot_count + b] = Some((i, j));
            }
        }
    }

    Ok(overlaps)
}

fn first_mismatch(
    given: &[Option<(usize, usize)>],
    actual: &[Option<(usize, usize)>],
    slot_count: usize,
) -> (SlotId, SlotId) {
    let key = given.iter().zip(actual).position(|(g, a)| g != a).unwrap_or(0);
    let (a, b) = (key / slot_count, key % slot_count);
    (a.min(b), a.max(b))
}
