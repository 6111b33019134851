use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::usfm::UsfmError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type", content = "content")]
pub enum UsfmToken {
    Id(String),      // \id GEN ...
    Chapter(String), // \c 1
    Verse(String),   // \v 1, \v 3-5 (unexpanded)

    FootnoteStart { marker: String }, // \f, \fe
    FootnoteEnd { marker: String },   // \f*, \fe*

    // \p \m \q1 ...
    Paragraph { marker: String },

    // Any other marker, end markers keep their '*'
    Other { marker: String },

    Text(String),
}

static CHAPTER_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

static VERSE_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+(-[0-9]+)?|front|intro)$").unwrap());

static PARAGRAPH_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(p|m|po|pr|pc|pmo|pm|pmc|pmr|pi[0-9]*|mi|nb|cls|li[0-9]*|ph[0-9]*|b|q[0-9]*|qr|qc|qa|qm[0-9]*)$")
        .unwrap()
});

/// Splits a USFM document into tokens.
///
/// The returned iterator is lazy and cannot be restarted; scan twice by calling
/// this again on the same text. A malformed `\c` or `\v` value is yielded as an
/// error in place of its token and tokenizing continues after it.
pub fn tokenize_usfm(usfm: &str) -> UsfmTokenizer<'_> {
    UsfmTokenizer {
        rest: usfm,
        line: 1,
    }
}

pub struct UsfmTokenizer<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> UsfmTokenizer<'a> {
    // Line number of the next unread character
    pub fn line(&self) -> usize {
        self.line
    }

    fn advance(&mut self, len: usize) -> &'a str {
        let (taken, rest) = self.rest.split_at(len);
        self.line += taken.matches('\n').count();
        self.rest = rest;
        taken
    }

    fn take_while(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        let len = self
            .rest
            .char_indices()
            .find(|&(_, c)| !f(c))
            .map_or(self.rest.len(), |(i, _)| i);
        self.advance(len)
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    // Marker name after the backslash, including the '*' of end markers
    fn take_marker_name(&mut self) -> &'a str {
        let mut len = self
            .rest
            .char_indices()
            .find(|&(i, c)| !(c.is_alphanumeric() || c == '-' || (i == 0 && c == '+')))
            .map_or(self.rest.len(), |(i, _)| i);
        if self.rest[len..].starts_with('*') {
            len += 1;
        }
        self.advance(len)
    }

    // \c and \v take one word on the same line
    fn take_value(&mut self) -> &'a str {
        self.take_while(|c| c == ' ' || c == '\t');
        self.take_while(|c| !c.is_whitespace() && c != '\\')
    }

    fn take_number_token(
        &mut self,
        marker: &str,
        pattern: &Regex,
        token: fn(String) -> UsfmToken,
    ) -> Result<UsfmToken, UsfmError> {
        let line = self.line;
        let value = self.take_value();

        if !pattern.is_match(value) {
            return Err(UsfmError::MalformedReference {
                marker: marker.to_owned(),
                value: value.to_owned(),
                line,
            });
        }

        Ok(token(value.to_owned()))
    }
}

impl<'a> Iterator for UsfmTokenizer<'a> {
    type Item = Result<UsfmToken, UsfmError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.skip_whitespace();

            let first = self.rest.chars().next()?;

            if first != '\\' {
                let text = self.take_while(|c| c != '\\').trim();
                if text.is_empty() {
                    continue;
                }
                return Some(Ok(UsfmToken::Text(text.to_owned())));
            }

            self.advance(1);
            let marker = self.take_marker_name();

            let token = match marker {
                "id" => {
                    self.take_while(|c| c == ' ' || c == '\t');
                    let value = self.take_while(|c| c != '\n' && c != '\r' && c != '\\');
                    Ok(UsfmToken::Id(value.trim().to_owned()))
                }

                "c" => self.take_number_token(marker, &CHAPTER_VALUE, UsfmToken::Chapter),
                "v" => self.take_number_token(marker, &VERSE_VALUE, UsfmToken::Verse),

                "f" | "fe" => Ok(UsfmToken::FootnoteStart {
                    marker: marker.to_owned(),
                }),
                "f*" | "fe*" => Ok(UsfmToken::FootnoteEnd {
                    marker: marker.to_owned(),
                }),

                m if PARAGRAPH_MARKER.is_match(m) => Ok(UsfmToken::Paragraph {
                    marker: m.to_owned(),
                }),

                // A lone backslash is kept as an empty marker so that it can be reported
                m => Ok(UsfmToken::Other {
                    marker: m.to_owned(),
                }),
            };

            return Some(token);
        }
    }
}
