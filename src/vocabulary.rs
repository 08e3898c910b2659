use std::collections::{BTreeSet, HashMap};
use std::fmt::{Debug, Formatter};

use smallvec::SmallVec;

use crate::{GlyphId, WordId, MAX_SLOT_LENGTH};

/// A candidate word, stored both as text and as a sequence of glyph ids so that crossings can be
/// compared without touching the string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[GlyphId; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// Length in characters, which is what a slot's length is measured in.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// The finite set of candidate words. Entries are trimmed, uppercased and deduplicated, and kept in
/// sorted order so that every `WordId` is reproducible for a given input.
pub struct Vocabulary {
    glyphs: Vec<char>,
    words: Vec<Word>,
    ids_by_string: HashMap<String, WordId>,
}

impl Debug for Vocabulary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vocabulary")
            .field("glyphs", &self.glyphs)
            .field("words", &(["(", &self.words.len().to_string(), " entries)"].join("")))
            .finish()
    }
}

impl Vocabulary {
    pub fn new<I, S>(word_list: I) -> Vocabulary
        where
            I: IntoIterator<Item=S>,
            S: AsRef<str>,
    {
        let strings: BTreeSet<String> = word_list.into_iter().filter_map(|word| {
            let word = word.as_ref().trim();
            if word.is_empty() { None } else { Some(word.to_uppercase()) }
        }).collect();

        // The set of all chars that appear in any entry, in sorted order.
        let glyphs: Vec<char> = strings.iter()
            .flat_map(|string| string.chars())
            .collect::<BTreeSet<char>>()
            .into_iter()
            .collect();

        let glyph_ids_by_char: HashMap<char, GlyphId> =
            glyphs.iter().enumerate().map(|(id, &glyph)| (glyph, id)).collect();

        let words: Vec<Word> = strings.into_iter().map(|string| {
            let glyphs = string.chars().map(|c| glyph_ids_by_char[&c]).collect();
            Word { string, glyphs }
        }).collect();

        let ids_by_string = words.iter().enumerate()
            .map(|(word_id, word)| (word.string.clone(), word_id))
            .collect();

        Vocabulary { glyphs, words, ids_by_string }
    }

    /// Parse a word list with one entry per line.
    pub fn from_word_list_string(word_list: &str) -> Vocabulary {
        Vocabulary::new(word_list.lines())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Look up a word by text, ignoring case and surrounding whitespace.
    pub fn find(&self, word: &str) -> Option<WordId> {
        self.ids_by_string.get(&word.trim().to_uppercase()).copied()
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn glyph(&self, glyph_id: GlyphId) -> char {
        self.glyphs[glyph_id]
    }
}
