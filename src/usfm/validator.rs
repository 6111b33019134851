use std::fmt;

use serde::Serialize;

use crate::usfm::{tokenizer::UsfmToken, verse::expand_verses, UsfmError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum UsfmDefect {
    MissingBookId { reference: String },
    DuplicateBookId { reference: String, id: String },
    VerseBeforeChapter { reference: String },
    ChapterOutOfOrder { reference: String, previous: u32 },
    DuplicateVerse { reference: String },
    VerseOutOfOrder { reference: String, previous: u32 },
    UnterminatedFootnote { reference: String },
    UnmatchedFootnoteEnd { reference: String },
    MalformedReference { reference: String, error: UsfmError },
}

impl UsfmDefect {
    pub fn reference(&self) -> &str {
        match self {
            UsfmDefect::MissingBookId { reference }
            | UsfmDefect::DuplicateBookId { reference, .. }
            | UsfmDefect::VerseBeforeChapter { reference }
            | UsfmDefect::ChapterOutOfOrder { reference, .. }
            | UsfmDefect::DuplicateVerse { reference }
            | UsfmDefect::VerseOutOfOrder { reference, .. }
            | UsfmDefect::UnterminatedFootnote { reference }
            | UsfmDefect::UnmatchedFootnoteEnd { reference }
            | UsfmDefect::MalformedReference { reference, .. } => reference,
        }
    }
}

impl fmt::Display for UsfmDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsfmDefect::MissingBookId { reference } => {
                write!(f, "Missing book ID: {}", reference)
            }
            UsfmDefect::DuplicateBookId { reference, id } => {
                write!(f, "Duplicate ID {}: {}", id, reference)
            }
            UsfmDefect::VerseBeforeChapter { reference } => {
                write!(f, "Verse marker before first chapter: {}", reference)
            }
            UsfmDefect::ChapterOutOfOrder {
                reference,
                previous,
            } => write!(f, "Chapter out of order: {} after chapter {}", reference, previous),
            UsfmDefect::DuplicateVerse { reference } => {
                write!(f, "Duplicated verse: {}", reference)
            }
            UsfmDefect::VerseOutOfOrder {
                reference,
                previous,
            } => write!(f, "Verse out of order: {} after verse {}", reference, previous),
            UsfmDefect::UnterminatedFootnote { reference } => {
                write!(f, "Unterminated footnote: {}", reference)
            }
            UsfmDefect::UnmatchedFootnoteEnd { reference } => {
                write!(f, "Footnote end without start: {}", reference)
            }
            UsfmDefect::MalformedReference { reference, error } => {
                write!(f, "{} near {}", error, reference)
            }
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub book_id: Option<String>,
    pub defects: Vec<UsfmDefect>,
    // Each reference containing a footnote start, once, in document order
    pub footnoted_verses: Vec<String>,
}

// Stand-ins in references for a book or chapter that is not known
const UNKNOWN_BOOK: &str = "???";
const UNKNOWN_CHAPTER: &str = "?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValidatorState {
    NoBook,
    HaveId,
    HaveChapter,
    HaveVerse,
}

/// Walks a token stream and collects every verse-order and footnote defect.
///
/// Nothing is fatal: the point is a complete report for one document.
pub struct UsfmValidator {
    state: ValidatorState,
    book: String,
    chapter: u32,
    chapter_label: String,
    last_verse: Option<u32>,
    reference: String,
    open_footnotes: Vec<String>,
    report: ValidationReport,
}

impl UsfmValidator {
    pub fn new() -> Self {
        Self {
            state: ValidatorState::NoBook,
            book: UNKNOWN_BOOK.to_owned(),
            chapter: 0,
            chapter_label: UNKNOWN_CHAPTER.to_owned(),
            last_verse: None,
            reference: String::new(),
            open_footnotes: Vec::new(),
            report: ValidationReport::default(),
        }
    }

    pub fn take(&mut self, token: Result<UsfmToken, UsfmError>) {
        let token = match token {
            Ok(token) => token,
            Err(error) => {
                let is_chapter = matches!(
                    &error,
                    UsfmError::MalformedReference { marker, .. } if marker == "c"
                );
                self.report.defects.push(UsfmDefect::MalformedReference {
                    reference: self.reference.clone(),
                    error,
                });
                if is_chapter {
                    self.take_unknown_chapter();
                }
                return;
            }
        };

        match token {
            UsfmToken::Id(value) => self.take_id(&value),
            UsfmToken::Chapter(value) => self.take_chapter(&value),
            UsfmToken::Verse(value) => self.take_verse(&value),

            UsfmToken::FootnoteStart { .. } => {
                if !self.report.footnoted_verses.contains(&self.reference) {
                    self.report.footnoted_verses.push(self.reference.clone());
                }
                self.open_footnotes.push(self.reference.clone());
            }
            UsfmToken::FootnoteEnd { .. } => {
                if self.open_footnotes.pop().is_none() {
                    self.report.defects.push(UsfmDefect::UnmatchedFootnoteEnd {
                        reference: self.reference.clone(),
                    });
                }
            }

            UsfmToken::Paragraph { .. } | UsfmToken::Other { .. } | UsfmToken::Text(_) => {}
        }
    }

    pub fn finish(mut self) -> ValidationReport {
        self.close_footnotes();
        self.report
    }

    fn take_id(&mut self, value: &str) {
        let id: String = value.chars().take(3).collect::<String>().to_uppercase();

        if self.report.book_id.is_some() {
            self.report.defects.push(UsfmDefect::DuplicateBookId {
                reference: self.reference.clone(),
                id: id.clone(),
            });
        }

        self.close_footnotes();

        self.state = ValidatorState::HaveId;
        self.book = id.clone();
        self.chapter = 0;
        self.chapter_label = UNKNOWN_CHAPTER.to_owned();
        self.last_verse = None;
        self.reference = id.clone();

        if self.report.book_id.is_none() {
            self.report.book_id = Some(id);
        }
    }

    fn take_chapter(&mut self, value: &str) {
        self.close_footnotes();

        let chapter: u32 = value.parse().unwrap_or(0);
        self.reference = format!("{} {}", self.book, value);

        if self.state == ValidatorState::NoBook {
            self.report.defects.push(UsfmDefect::MissingBookId {
                reference: self.reference.clone(),
            });
        } else if chapter <= self.chapter {
            self.report.defects.push(UsfmDefect::ChapterOutOfOrder {
                reference: self.reference.clone(),
                previous: self.chapter,
            });
        }

        self.state = ValidatorState::HaveChapter;
        self.chapter = chapter;
        self.chapter_label = value.to_owned();
        self.last_verse = None;
    }

    // Verses after an unreadable \c start over; the chapter number stays for
    // the ordering check of the next \c
    fn take_unknown_chapter(&mut self) {
        self.close_footnotes();

        self.reference = format!("{} {}", self.book, UNKNOWN_CHAPTER);
        if self.state != ValidatorState::NoBook {
            self.state = ValidatorState::HaveChapter;
        }
        self.chapter_label = UNKNOWN_CHAPTER.to_owned();
        self.last_verse = None;
    }

    fn take_verse(&mut self, value: &str) {
        self.close_footnotes();

        let verses = match expand_verses(value) {
            Ok(verses) => verses,
            Err(error) => {
                self.report.defects.push(UsfmDefect::MalformedReference {
                    reference: self.reference.clone(),
                    error,
                });
                return;
            }
        };

        let reference = format!("{} {}:{}", self.book, self.chapter_label, value);
        match self.state {
            ValidatorState::NoBook => self
                .report
                .defects
                .push(UsfmDefect::MissingBookId { reference }),
            ValidatorState::HaveId => self
                .report
                .defects
                .push(UsfmDefect::VerseBeforeChapter { reference }),
            ValidatorState::HaveChapter | ValidatorState::HaveVerse => {}
        }

        for verse in verses {
            self.reference = format!(
                "{} {}:{}",
                self.book,
                self.chapter_label,
                verse_label(verse, value)
            );

            // Gaps are legal (combined or omitted verses)
            if let Some(last) = self.last_verse {
                if verse == last {
                    self.report.defects.push(UsfmDefect::DuplicateVerse {
                        reference: self.reference.clone(),
                    });
                } else if verse < last {
                    self.report.defects.push(UsfmDefect::VerseOutOfOrder {
                        reference: self.reference.clone(),
                        previous: last,
                    });
                }
            }

            self.last_verse = Some(verse);
        }

        if self.state != ValidatorState::NoBook && self.state != ValidatorState::HaveId {
            self.state = ValidatorState::HaveVerse;
        }
    }

    // A footnote must end before the next chapter or verse
    fn close_footnotes(&mut self) {
        for reference in self.open_footnotes.drain(..) {
            self.report
                .defects
                .push(UsfmDefect::UnterminatedFootnote { reference });
        }
    }
}

impl Default for UsfmValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn verse_label(verse: u32, value: &str) -> String {
    if verse == 0 {
        value.to_owned()
    } else {
        verse.to_string()
    }
}

pub fn validate_usfm<I>(tokens: I) -> ValidationReport
where
    I: IntoIterator<Item = Result<UsfmToken, UsfmError>>,
{
    let mut validator = UsfmValidator::new();
    for token in tokens {
        validator.take(token);
    }
    validator.finish()
}
