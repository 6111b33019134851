pub mod convert;
pub mod error;
pub mod tsv;
pub mod usfm;
pub mod utility;
