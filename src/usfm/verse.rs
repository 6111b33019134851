use crate::{usfm::UsfmError, utility::parse_number};

/// Expands a verse value into the verse numbers it covers.
///
/// `"3"` is `[3]`, `"3-5"` is `[3, 4, 5]`. The pseudo-verses `front` and
/// `intro` come before verse 1 and are numbered 0.
pub fn expand_verses(value: &str) -> Result<Vec<u32>, UsfmError> {
    let invalid = || UsfmError::VerseRange {
        value: value.to_owned(),
    };

    if is_pseudo_verse(value) {
        return Ok(vec![0]);
    }

    match value.split_once('-') {
        None => parse_number(value).map(|v| vec![v]).ok_or_else(invalid),
        Some((start, end)) => {
            let start = parse_number(start).ok_or_else(invalid)?;
            let end = parse_number(end).ok_or_else(invalid)?;
            if end < start {
                return Err(invalid());
            }
            Ok((start..=end).collect())
        }
    }
}

pub fn is_pseudo_verse(value: &str) -> bool {
    matches!(value, "front" | "intro")
}
