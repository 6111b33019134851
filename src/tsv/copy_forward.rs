use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{ConsistencyWarning, LookupError},
    tsv::{
        note_row::TSV9_COLUMNS,
        table::{index_rows, make_key, TsvRow},
    },
    utility::parse_number,
};

const CHAPTER: usize = 1;
const VERSE: usize = 2;
const ID: usize = 3;
const ORIG_QUOTE: usize = 5;
const OCCURRENCE: usize = 6;
const OCCURRENCE_NOTE: usize = 8;

static REGEX_BAD_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"#[^# ]").unwrap());

// ID, Verse, Chapter
const KEY_COLUMNS: [usize; 3] = [ID, VERSE, CHAPTER];

const HEADER_KEY: &str = "ID.Verse.Chapter";

#[derive(Debug, Default)]
pub struct CopyForwardReport {
    pub copied: usize,
    pub lookups: Vec<LookupError>,
    pub warnings: Vec<ConsistencyWarning>,
}

// Book and chapter seen so far in the target table
#[derive(Debug, Default)]
struct RowSequence {
    book: Option<String>,
    chapter: u32,
}

impl RowSequence {
    fn check(&mut self, row: &[String], line: usize, warnings: &mut Vec<ConsistencyWarning>) {
        let location = format!("line {}", line);
        let mut warn = |message: String| warnings.push(ConsistencyWarning::new(&location, message));

        if row.len() != TSV9_COLUMNS {
            warn(format!("wrong number of columns: {}", row.len()));
        }
        let field = |i: usize| row.get(i).map(String::as_str).unwrap_or_default();

        let book = field(0);
        match &self.book {
            Some(first) if first != book => warn(format!("bad book name {:?}", book)),
            Some(_) => {}
            None => self.book = Some(book.to_owned()),
        }

        let chapter = field(CHAPTER);
        if chapter != "front" {
            match parse_number(chapter) {
                Some(c) if c == self.chapter || Some(c) == self.chapter.checked_add(1) => {
                    self.chapter = c
                }
                Some(c) => {
                    warn(format!("non-sequential chapter number {}", c));
                    self.chapter = c;
                }
                None => warn(format!("invalid chapter number {:?}", chapter)),
            }
        }

        let verse = field(VERSE);
        if verse != "intro" && parse_number(verse).is_none() {
            warn(format!("invalid verse number {:?}", verse));
        }

        let id = field(ID);
        if id.chars().count() != 4 {
            warn(format!("invalid ID {:?}", id));
        }
    }
}

fn neighbour_verses(verse: &str) -> Vec<String> {
    match parse_number(verse) {
        Some(v) => v
            .checked_add(1)
            .into_iter()
            .chain(v.checked_sub(1))
            .map(|v| v.to_string())
            .collect(),
        None => Vec::new(),
    }
}

/// Copies `OrigQuote` and `Occurrence` of the English 9-column table into the
/// rows of a translated one.
///
/// Both tables include their header row, which is left alone. Rows are
/// matched by (ID, verse, chapter). Verse numbering sometimes differs between
/// the two by one, so a miss is retried with verse+1 and then verse-1; a row
/// matched that way takes the English verse. A row that still has no match
/// gets an empty `OrigQuote` and a `LookupError`.
///
/// The target table is also checked as it is read: its header, the column
/// count, one book throughout, chapters in sequence, verse numbers and
/// 4-character ids. Problems become warnings.
pub fn copy_quotes_forward(
    target: &mut [TsvRow],
    english: &[TsvRow],
    language_code: &str,
) -> CopyForwardReport {
    let mut report = CopyForwardReport::default();
    let index = index_rows(english.get(1..).unwrap_or_default(), &KEY_COLUMNS);
    let link_prefix = format!("rc://{}/", language_code);

    if let Some(header) = target.first() {
        if make_key(header, &KEY_COLUMNS) != HEADER_KEY {
            report.warnings.push(ConsistencyWarning::new("line 1", "bad header"));
        }
        if header.len() != TSV9_COLUMNS {
            report.warnings.push(ConsistencyWarning::new(
                "line 1",
                format!("wrong number of columns in header: {}", header.len()),
            ));
        }
    }
    let mut sequence = RowSequence::default();

    for (i, row) in target.iter_mut().enumerate().skip(1) {
        let line = i + 1;
        sequence.check(row, line, &mut report.warnings);
        if row.len() < TSV9_COLUMNS {
            row.resize(TSV9_COLUMNS, String::new());
        }

        let key = make_key(row, &KEY_COLUMNS);
        let original_verse = row[VERSE].clone();

        let mut found = index.get(&key);
        if found.is_none() {
            for verse in neighbour_verses(&original_verse) {
                row[VERSE] = verse;
                found = index.get(&make_key(row, &KEY_COLUMNS));
                if found.is_some() {
                    break;
                }
            }
        }

        match found {
            Some(english_row) => {
                if row[VERSE] != original_verse {
                    report.warnings.push(ConsistencyWarning::new(
                        format!("line {}", line),
                        format!(
                            "verse {} changed to {} to match English",
                            original_verse, row[VERSE]
                        ),
                    ));
                }
                row[ORIG_QUOTE] = english_row.get(ORIG_QUOTE).cloned().unwrap_or_default();
                row[OCCURRENCE] = english_row.get(OCCURRENCE).cloned().unwrap_or_default();
                report.copied += 1;
            }
            None => {
                debug!("line {}: no English row for {}", line, key);
                row[VERSE] = original_verse;
                row[ORIG_QUOTE].clear();
                report.lookups.push(LookupError { line, key });
            }
        }

        if REGEX_BAD_HEADING.is_match(&row[OCCURRENCE_NOTE]) {
            report.warnings.push(ConsistencyWarning::new(
                format!("line {}", line),
                "missing space after hash mark(s)",
            ));
        }

        if language_code != "en" {
            row[OCCURRENCE_NOTE] = row[OCCURRENCE_NOTE].replace("rc://en/", &link_prefix);
        }
    }

    report
}
