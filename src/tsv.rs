// Translation notes as tab-separated tables
//
// 7 columns: Reference ID Tags SupportReference Quote Occurrence Note
// 9 columns: Book Chapter Verse ID SupportReference OrigQuote Occurrence GLQuote OccurrenceNote
//
// Column count and order are the contract; the label of the last 7-column
// header differs between resource families (Note, Annotation, Response).

pub mod copy_forward;
pub mod markdown;
pub mod note_row;
pub mod reference;
pub mod remap;
pub mod row_id;
pub mod table;
