use std::collections::HashMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConsistencyWarning, FormatError},
    tsv::{reference::Reference, table::TsvRow},
    utility::text::find_unbalanced_brackets,
};

pub const TSV7_COLUMNS: usize = 7;
pub const TSV9_COLUMNS: usize = 9;

pub const TSV9_HEADER: [&str; TSV9_COLUMNS] = [
    "Book",
    "Chapter",
    "Verse",
    "ID",
    "SupportReference",
    "OrigQuote",
    "Occurrence",
    "GLQuote",
    "OccurrenceNote",
];

// Label of the last 7-column header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoteFamily {
    Note,       // translation notes
    Annotation, // study notes
    Response,   // translation questions
}

impl NoteFamily {
    pub fn of(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "note" | "tn" | "sn" => Ok(Self::Note),
            "annotation" => Ok(Self::Annotation),
            "response" | "tq" | "sq" => Ok(Self::Response),
            name => bail!("Unknown note family: {}", name),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Note => "Note",
            Self::Annotation => "Annotation",
            Self::Response => "Response",
        }
    }

    pub fn header(&self) -> TsvRow {
        [
            "Reference",
            "ID",
            "Tags",
            "SupportReference",
            "Quote",
            "Occurrence",
            self.label(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

pub fn tsv9_header() -> TsvRow {
    TSV9_HEADER.iter().map(|s| s.to_string()).collect()
}

pub fn check_header(header: &[String], expected: usize, line: usize) -> Result<(), FormatError> {
    if header.len() != expected {
        return Err(FormatError::Header {
            line,
            expected,
            found: header.to_vec(),
        });
    }
    Ok(())
}

/// One row of a 7-column table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRow {
    pub reference: String,
    pub id: String,
    pub tags: String,
    pub support_reference: String,
    pub quote: String,
    pub occurrence: String,
    pub note: String, // `\n` escaped
}

impl NoteRow {
    pub fn from_fields(fields: &[String], line: usize) -> Result<Self, FormatError> {
        let [reference, id, tags, support_reference, quote, occurrence, note] = fields else {
            return Err(FormatError::RowArity {
                line,
                expected: TSV7_COLUMNS,
                found: fields.len(),
            });
        };

        if reference.is_empty() {
            return Err(FormatError::MissingReference { line });
        }
        if Reference::parse(reference).is_none() {
            return Err(FormatError::Reference {
                line,
                value: reference.clone(),
            });
        }

        Ok(Self {
            reference: reference.clone(),
            id: id.clone(),
            tags: tags.clone(),
            support_reference: support_reference.clone(),
            quote: quote.clone(),
            occurrence: occurrence.clone(),
            note: note.clone(),
        })
    }

    pub fn to_fields(&self) -> TsvRow {
        vec![
            self.reference.clone(),
            self.id.clone(),
            self.tags.clone(),
            self.support_reference.clone(),
            self.quote.clone(),
            self.occurrence.clone(),
            self.note.clone(),
        ]
    }

    pub fn parse_reference(&self, line: usize) -> Result<Reference, FormatError> {
        Reference::parse(&self.reference).ok_or_else(|| FormatError::Reference {
            line,
            value: self.reference.clone(),
        })
    }
}

/// One row of a 9-column table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tsv9Row {
    pub book: String,
    pub chapter: String,
    pub verse: String,
    pub id: String,
    pub support_reference: String,
    pub orig_quote: String,
    pub occurrence: String,
    pub gl_quote: String,
    pub occurrence_note: String, // `<br>` separated
}

impl Tsv9Row {
    pub fn from_fields(fields: &[String], line: usize) -> Result<Self, FormatError> {
        let [book, chapter, verse, id, support_reference, orig_quote, occurrence, gl_quote, occurrence_note] =
            fields
        else {
            return Err(FormatError::RowArity {
                line,
                expected: TSV9_COLUMNS,
                found: fields.len(),
            });
        };

        if chapter.is_empty() || verse.is_empty() {
            return Err(FormatError::MissingReference { line });
        }

        Ok(Self {
            book: book.clone(),
            chapter: chapter.clone(),
            verse: verse.clone(),
            id: id.clone(),
            support_reference: support_reference.clone(),
            orig_quote: orig_quote.clone(),
            occurrence: occurrence.clone(),
            gl_quote: gl_quote.clone(),
            occurrence_note: occurrence_note.clone(),
        })
    }

    pub fn to_fields(&self) -> TsvRow {
        vec![
            self.book.clone(),
            self.chapter.clone(),
            self.verse.clone(),
            self.id.clone(),
            self.support_reference.clone(),
            self.orig_quote.clone(),
            self.occurrence.clone(),
            self.gl_quote.clone(),
            self.occurrence_note.clone(),
        ]
    }
}

/// Header row plus body rows as `NoteRow`s. Line numbers count the header as line 1.
pub fn note_rows_from_table(table: &[TsvRow]) -> Result<Vec<NoteRow>, FormatError> {
    let (header, body) = table.split_first().ok_or(FormatError::EmptyTable)?;
    check_header(header, TSV7_COLUMNS, 1)?;

    body.iter()
        .enumerate()
        .map(|(i, fields)| NoteRow::from_fields(fields, i + 2))
        .collect()
}

pub fn tsv9_rows_from_table(table: &[TsvRow]) -> Result<Vec<Tsv9Row>, FormatError> {
    let (header, body) = table.split_first().ok_or(FormatError::EmptyTable)?;
    check_header(header, TSV9_COLUMNS, 1)?;

    body.iter()
        .enumerate()
        .map(|(i, fields)| Tsv9Row::from_fields(fields, i + 2))
        .collect()
}

pub fn table_from_note_rows(family: NoteFamily, rows: &[NoteRow]) -> Vec<TsvRow> {
    std::iter::once(family.header())
        .chain(rows.iter().map(NoteRow::to_fields))
        .collect()
}

pub fn table_from_tsv9_rows(rows: &[Tsv9Row]) -> Vec<TsvRow> {
    std::iter::once(tsv9_header())
        .chain(rows.iter().map(Tsv9Row::to_fields))
        .collect()
}

fn has_occurrence(occurrence: &str) -> bool {
    !occurrence.is_empty() && occurrence != "0"
}

/// Problems a converter should surface but not block on: duplicate ids,
/// references going backwards, quote/occurrence pairs with one half missing,
/// unbalanced brackets in notes.
pub fn check_note_rows(rows: &[NoteRow]) -> Vec<ConsistencyWarning> {
    let mut warnings = Vec::new();
    let mut seen_ids: HashMap<&str, usize> = HashMap::new();
    let mut previous: Option<(u32, u32)> = None;

    for (i, row) in rows.iter().enumerate() {
        let line = i + 2;
        let location = format!("line {} ({})", line, row.reference);

        if !row.id.is_empty() {
            let first_line = *seen_ids.entry(row.id.as_str()).or_insert(line);
            if first_line != line {
                warnings.push(ConsistencyWarning::new(
                    &location,
                    format!("duplicate ID {} (first on line {})", row.id, first_line),
                ));
            }
        }

        match Reference::parse(&row.reference) {
            Some(reference) => {
                let position = reference.position();
                if let Some(previous) = previous {
                    if position < previous {
                        warnings.push(ConsistencyWarning::new(
                            &location,
                            "reference out of order",
                        ));
                    }
                }
                previous = Some(position);
            }
            None => warnings.push(ConsistencyWarning::new(&location, "unparsable reference")),
        }

        if row.quote.is_empty() == has_occurrence(&row.occurrence) {
            warnings.push(ConsistencyWarning::new(
                &location,
                format!(
                    "quote {:?} does not match occurrence {:?}",
                    row.quote, row.occurrence
                ),
            ));
        }

        if let Some(bracket) = find_unbalanced_brackets(&row.note) {
            warnings.push(ConsistencyWarning::new(
                &location,
                format!("unbalanced {:?} in note", bracket),
            ));
        }
    }

    warnings
}
