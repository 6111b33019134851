use std::collections::HashMap;

use serde::Serialize;
use unicode_script::{Script, UnicodeScript};

use crate::{
    error::{ConsistencyWarning, FormatError},
    tsv::{
        note_row::{NoteRow, Tsv9Row},
        row_id::{is_valid_row_id, repair_row_id},
    },
    utility::text::{normalize_ellipsis, quote_from_tsv, quote_to_tsv},
};

const SUPPORT_REFERENCE_PREFIX: &str = "rc://*/ta/man/translate/";

/// Writing system of a quote, used to decide between `OrigQuote` and `GLQuote`.
///
/// Hebrew and Greek are the original languages. Latin and Cyrillic cover the
/// gateway languages the 9-column tables were published in (English, Russian).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteScript {
    Hebrew,
    Greek,
    Latin,
    Cyrillic,
    Unrecognized,
}

impl QuoteScript {
    pub fn is_original_language(&self) -> bool {
        matches!(self, Self::Hebrew | Self::Greek)
    }

    pub fn is_gateway_language(&self) -> bool {
        matches!(self, Self::Latin | Self::Cyrillic)
    }
}

// Majority script of the letters; punctuation and combining marks do not count
pub fn classify_quote(quote: &str) -> QuoteScript {
    let mut counts: HashMap<QuoteScript, usize> = HashMap::new();

    for c in quote.chars() {
        let script = match c.script() {
            Script::Common | Script::Inherited | Script::Unknown => continue,
            Script::Hebrew => QuoteScript::Hebrew,
            Script::Greek => QuoteScript::Greek,
            Script::Latin => QuoteScript::Latin,
            Script::Cyrillic => QuoteScript::Cyrillic,
            _ => QuoteScript::Unrecognized,
        };
        *counts.entry(script).or_default() += 1;
    }

    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    match counts.as_slice() {
        [] => QuoteScript::Unrecognized,
        [(script, _)] => *script,
        [(first, n), (_, m), ..] if n > m => *first,
        // A tie is not a decision
        _ => QuoteScript::Unrecognized,
    }
}

fn clean_quote(quote: &str) -> String {
    let quote = quote.replace('\u{00a0}', " ").replace('\u{200b}', "");
    let quote = normalize_ellipsis(&quote);
    // An ellipsis only belongs between words
    quote_to_tsv(quote.trim_matches('…').trim())
}

fn last_path_segment(support_reference: &str) -> &str {
    support_reference
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(support_reference)
}

fn note_from_tsv9(occurrence_note: &str) -> String {
    let mut note = occurrence_note.trim().replace("<BR>", "<br>");
    while let Some(rest) = note.strip_prefix("<br>") {
        note = rest.to_owned();
    }
    while let Some(rest) = note.strip_suffix("<br>") {
        note = rest.to_owned();
    }
    note.replace("<br>", "\\n")
        .replace("rc://en/", "rc://*/")
        .trim()
        .to_owned()
}

fn note_to_tsv9(note: &str) -> String {
    note.replace("\\n", "<br>").replace("rc://*/", "rc://en/")
}

/// 9 columns to 7 columns. This direction is authoritative.
///
/// `OrigQuote` becomes the quote; `GLQuote` is used only when there is no
/// `OrigQuote`. Digit-first ids are repaired and reported.
pub fn tsv9_to_tsv7(rows: &[Tsv9Row]) -> (Vec<NoteRow>, Vec<ConsistencyWarning>) {
    let mut warnings = Vec::new();

    let rows = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let reference = format!("{}:{}", row.chapter.trim(), row.verse.trim());
            let location = format!("line {} ({} {})", i + 2, row.book, reference);

            let mut id = row.id.trim().to_owned();
            if !is_valid_row_id(&id) {
                match repair_row_id(&id).filter(|repaired| is_valid_row_id(repaired)) {
                    Some(repaired) => {
                        warnings.push(ConsistencyWarning::new(
                            &location,
                            format!("bad ID {:?} changed to {:?}", id, repaired),
                        ));
                        id = repaired;
                    }
                    None => warnings.push(ConsistencyWarning::new(
                        &location,
                        format!("bad ID {:?}", id),
                    )),
                }
            }

            let support_reference = match row.support_reference.trim() {
                "" => String::new(),
                slug => format!("{}{}", SUPPORT_REFERENCE_PREFIX, last_path_segment(slug)),
            };

            let quote = if row.orig_quote.trim().is_empty() {
                clean_quote(&row.gl_quote)
            } else {
                clean_quote(&row.orig_quote)
            };

            let note = note_from_tsv9(&row.occurrence_note);
            if note.contains("  ") {
                warnings.push(ConsistencyWarning::new(&location, "note has double spaces"));
            }

            NoteRow {
                reference,
                id,
                tags: String::new(),
                support_reference,
                quote,
                occurrence: row.occurrence.trim().to_owned(),
                note,
            }
        })
        .collect();

    (rows, warnings)
}

/// 7 columns to 9 columns, best effort.
///
/// The 7-column form does not say which quote column a quote came from, so
/// its script decides: Hebrew/Greek to `OrigQuote`, Latin/Cyrillic to
/// `GLQuote`. Anything else goes to `OrigQuote` and is flagged for review.
pub fn tsv7_to_tsv9(
    rows: &[NoteRow],
    book: &str,
) -> Result<(Vec<Tsv9Row>, Vec<ConsistencyWarning>), FormatError> {
    let mut warnings = Vec::new();
    let mut converted = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let line = i + 2;
        let reference = row.parse_reference(line)?;
        let location = format!("line {} ({} {})", line, book, reference);

        let quote = quote_from_tsv(&row.quote);
        let (orig_quote, gl_quote) = if quote.is_empty() {
            (String::new(), String::new())
        } else {
            let script = classify_quote(&quote);
            if script.is_original_language() {
                (quote, String::new())
            } else if script.is_gateway_language() {
                (String::new(), quote)
            } else {
                warnings.push(ConsistencyWarning::new(
                    &location,
                    format!("language of quote {:?} not recognized, kept as OrigQuote", quote),
                ));
                (quote, String::new())
            }
        };

        converted.push(Tsv9Row {
            book: book.to_owned(),
            chapter: reference.chapter_label().to_owned(),
            verse: reference.verse_label().to_owned(),
            id: row.id.clone(),
            support_reference: last_path_segment(&row.support_reference).to_owned(),
            orig_quote,
            occurrence: row.occurrence.clone(),
            gl_quote,
            occurrence_note: note_to_tsv9(&row.note),
        });
    }

    Ok((converted, warnings))
}

// "tn_TIT.tsv" or "en_tn_57-TIT.tsv" -> "TIT"
pub fn book_from_file_name(file_stem: &str) -> Option<String> {
    let candidate = file_stem.rsplit(['_', '-']).next()?;
    let valid = candidate.len() == 3
        && candidate
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    valid.then(|| candidate.to_owned())
}
