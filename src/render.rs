use crate::geometry::Geometry;
use crate::search::Assignment;
use crate::vocabulary::Vocabulary;

/// Character drawn for cells that can't hold a letter.
pub const BLOCK: char = '█';

/// Lay the assigned words out on the grid. Cells not covered by any assigned word are `None`.
pub fn letter_grid(geometry: &Geometry, vocabulary: &Vocabulary, assignment: &Assignment) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; geometry.width()]; geometry.height()];

    for choice in assignment.choices() {
        let word = vocabulary.word(choice.word_id);

        for ((row, column), &glyph) in geometry.slot(choice.slot_id).cells().zip(&word.glyphs) {
            letters[row][column] = Some(vocabulary.glyph(glyph));
        }
    }

    letters
}

/// Turn the given grid and assignment into a rendered string, one line per row.
pub fn render_grid(geometry: &Geometry, vocabulary: &Vocabulary, assignment: &Assignment) -> String {
    let letters = letter_grid(geometry, vocabulary, assignment);

    letters.iter().enumerate().map(|(row, line)| {
        line.iter().enumerate().map(|(column, letter)| {
            if !geometry.is_fillable(row, column) {
                BLOCK
            } else {
                letter.unwrap_or(' ')
            }
        }).collect::<String>()
    }).collect::<Vec<_>>().join("\n")
}
