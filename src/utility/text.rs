use encoding_rs::{Encoding, UTF_8};

use crate::error::FormatError;

const UTF32_LE_BOM: [u8; 4] = [0xff, 0xfe, 0x00, 0x00];
const UTF32_BE_BOM: [u8; 4] = [0x00, 0x00, 0xfe, 0xff];

/// Decodes a whole file, choosing the encoding from its byte-order mark.
///
/// UTF-8 (with or without BOM), UTF-16 LE/BE and UTF-32 LE/BE are accepted.
/// The BOM itself is not part of the returned text.
pub fn decode_text(bytes: &[u8]) -> Result<String, FormatError> {
    // UTF-32 LE starts with the UTF-16 LE BOM, so it has to be checked first
    if bytes.starts_with(&UTF32_LE_BOM) {
        return decode_utf32(&bytes[4..], u32::from_le_bytes);
    }
    if bytes.starts_with(&UTF32_BE_BOM) {
        return decode_utf32(&bytes[4..], u32::from_be_bytes);
    }

    let (encoding, bom_length): (&'static Encoding, usize) =
        Encoding::for_bom(bytes).unwrap_or((UTF_8, 0));

    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_length..])
        .map(|text| text.into_owned())
        .ok_or(FormatError::Encoding {
            encoding: encoding.name(),
        })
}

fn decode_utf32(bytes: &[u8], from_bytes: fn([u8; 4]) -> u32) -> Result<String, FormatError> {
    let malformed = FormatError::Encoding { encoding: "UTF-32" };

    if bytes.len() % 4 != 0 {
        return Err(malformed);
    }

    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let code = from_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            char::from_u32(code)
        })
        .collect::<Option<String>>()
        .ok_or(malformed)
}

/// `"..."` becomes `"…"` and spaces next to an ellipsis are removed.
pub fn normalize_ellipsis(quote: &str) -> String {
    let mut quote = quote.trim().replace("...", "…");
    while quote.contains(" …") || quote.contains("… ") {
        quote = quote.replace(" …", "…").replace("… ", "…");
    }
    quote
}

// 7-column tables write a discontinuity as " & "
pub fn quote_to_tsv(quote: &str) -> String {
    normalize_ellipsis(quote).replace('…', " & ")
}

pub fn quote_from_tsv(quote: &str) -> String {
    quote.replace(" & ", "…")
}

pub fn escape_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\\n")
}

pub fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

// Parentheses and brackets in hand-translated notes are often left unclosed
pub fn find_unbalanced_brackets(text: &str) -> Option<char> {
    let mut stack = Vec::new();
    for c in text.chars() {
        match c {
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let open = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(open) {
                    return Some(c);
                }
            }
            _ => {}
        }
    }
    stack.pop()
}
