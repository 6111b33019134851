use std::{fmt, ops::RangeInclusive};

use crate::{
    usfm::verse::{expand_verses, is_pseudo_verse},
    utility::parse_number,
};

/// `chapter:verse` of Scripture notes or `story:frame` of OBS notes.
///
/// `front` (chapter) and `intro`/`front` (verse) are position 0. A verse range
/// `3-5` covers frames 3, 4 and 5.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub chapter: u32,
    pub first_verse: u32,
    pub last_verse: u32,

    // Kept as written, used when rendering back
    chapter_label: String,
    verse_label: String,
}

impl Reference {
    pub fn parse(reference: &str) -> Option<Self> {
        let (chapter, verse) = reference.trim().split_once(':')?;
        Self::from_parts(chapter, verse)
    }

    // Separate chapter and verse columns of the 9-column form
    pub fn from_parts(chapter: &str, verse: &str) -> Option<Self> {
        let chapter = chapter.trim();
        let verse = verse.trim();

        let chapter_number = if chapter == "front" {
            0
        } else {
            parse_number(chapter)?
        };

        let verses = expand_verses(verse).ok()?;
        let first_verse = *verses.first()?;
        let last_verse = *verses.last()?;

        Some(Self {
            chapter: chapter_number,
            first_verse,
            last_verse,
            chapter_label: chapter.to_owned(),
            verse_label: verse.to_owned(),
        })
    }

    pub fn new(chapter: u32, verse: u32) -> Self {
        Self {
            chapter,
            first_verse: verse,
            last_verse: verse,
            chapter_label: if chapter == 0 {
                "front".to_owned()
            } else {
                chapter.to_string()
            },
            verse_label: if verse == 0 {
                "intro".to_owned()
            } else {
                verse.to_string()
            },
        }
    }

    pub fn verses(&self) -> RangeInclusive<u32> {
        self.first_verse..=self.last_verse
    }

    pub fn is_range(&self) -> bool {
        self.first_verse != self.last_verse
    }

    pub fn is_intro(&self) -> bool {
        is_pseudo_verse(&self.verse_label)
    }

    pub fn chapter_label(&self) -> &str {
        &self.chapter_label
    }

    pub fn verse_label(&self) -> &str {
        &self.verse_label
    }

    // Sort key of the traversal order: chapter then verse
    pub fn position(&self) -> (u32, u32) {
        (self.chapter, self.first_verse)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chapter_label, self.verse_label)
    }
}
