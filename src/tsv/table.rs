use std::{collections::HashMap, path::Path};

use crate::{
    error::{FormatError, NotesError},
    utility::fs::{read_text, write_text},
};

pub type TsvRow = Vec<String>;

// Longer values are cut so that a pathological cell cannot blow up the key
const KEY_PART_MAX_CHARS: usize = 10;

pub fn read_tsv(path: &Path) -> Result<Vec<TsvRow>, NotesError> {
    let text = read_text(path)?;
    parse_tsv(&text).map_err(|e| NotesError::format(path, e))
}

/// Splits on raw tabs first, then trims every field.
///
/// The first row is the header and fixes the arity of the table. Blank lines
/// are skipped.
pub fn parse_tsv(text: &str) -> Result<Vec<TsvRow>, FormatError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows: Vec<TsvRow> = Vec::new();
    let mut record = csv::StringRecord::new();

    loop {
        let line = reader.position().line() as usize;
        let more = reader.read_record(&mut record).map_err(|e| FormatError::Row {
            line: e.position().map_or(line, |p| p.line() as usize),
            message: e.to_string(),
        })?;
        if !more {
            break;
        }

        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }

        let line = record.position().map_or(line, |p| p.line() as usize);
        let row: TsvRow = record.iter().map(|field| field.trim().to_owned()).collect();

        if let Some(header) = rows.first() {
            if header.len() != row.len() {
                return Err(FormatError::RowArity {
                    line,
                    expected: header.len(),
                    found: row.len(),
                });
            }
        }

        rows.push(row);
    }

    Ok(rows)
}

pub fn to_tsv_string(rows: &[TsvRow]) -> Result<String, NotesError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;

    // Every field came from a String, so the output is valid UTF-8
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// Always '\n' line endings
pub fn write_tsv(rows: &[TsvRow], path: &Path) -> Result<(), NotesError> {
    let text = to_tsv_string(rows)?;
    write_text(path, &text)
}

/// Joins the values of `columns` with `.`, each cut to 10 characters.
///
/// `make_key(row, &[3, 2, 1])` on a 9-column row gives `"<ID>.<verse>.<chapter>"`.
/// Columns missing from `row` contribute an empty part.
pub fn make_key(row: &[String], columns: &[usize]) -> String {
    columns
        .iter()
        .map(|&i| {
            row.get(i)
                .map(|value| value.chars().take(KEY_PART_MAX_CHARS).collect::<String>())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(".")
}

// Later rows win when two rows share a key
pub fn index_rows(rows: &[TsvRow], columns: &[usize]) -> HashMap<String, TsvRow> {
    rows.iter()
        .map(|row| (make_key(row, columns), row.clone()))
        .collect()
}
