// USFM (Unified Standard Format Markers) https://ubsicap.github.io/usfm/
//
// Every validator consumes the token stream of `tokenizer`; none of them
// match markers in the raw text on their own. USFM 3 alignment markup is
// removed by `prepass` before tokenizing rather than understood by the
// tokenizer.

pub mod prepass;
pub mod tokenizer;
pub mod validator;
pub mod verse;
pub mod widow;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum UsfmError {
    #[error("line {line}: malformed \\{marker} value {value:?}")]
    MalformedReference {
        marker: String,
        value: String,
        line: usize,
    },

    #[error("invalid verse range {value:?}")]
    VerseRange { value: String },
}
