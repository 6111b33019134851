use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use rand::Rng;

use crate::{
    error::{ConsistencyWarning, FormatError, NotesError},
    tsv::{
        note_row::NoteRow,
        reference::Reference,
        row_id::IdGenerator,
    },
    utility::{
        fs::{read_text, write_text},
        parse_number,
        text::{escape_newlines, quote_from_tsv, quote_to_tsv, unescape_newlines},
    },
};

/// Shape of a legacy Markdown note tree under `content/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeLayout {
    Chaptered, // content/<story>/<frame>.md
    Flat,      // content/<story>.md
}

pub fn note_file_path(content_dir: &Path, story: u32, frame: u32) -> PathBuf {
    content_dir
        .join(format!("{:02}", story))
        .join(format!("{:02}.md", frame))
}

// One `# quote` block, already unescaped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownEntry {
    pub story: u32,
    pub frame: u32,
    pub quote: String,
    pub note: String,
}

/// Buffers consecutive entries of the same frame and writes them as one file.
///
/// The buffer is written when an entry for another frame arrives, and once
/// more by `finish`; grouping is decided by comparing with the previous
/// entry only. A frame written earlier in the same run is appended to.
pub struct MarkdownTreeWriter {
    content_dir: PathBuf,
    current: Option<(u32, u32)>,
    buffer: String,
    written: HashSet<PathBuf>,
}

impl MarkdownTreeWriter {
    pub fn new(target_dir: &Path) -> Self {
        Self {
            content_dir: target_dir.join("content"),
            current: None,
            buffer: String::new(),
            written: HashSet::new(),
        }
    }

    /// Returns the number of files written by this call.
    pub fn push(&mut self, entry: Option<&MarkdownEntry>) -> Result<usize, NotesError> {
        let mut files_written = 0;

        let Some(entry) = entry else {
            files_written += self.flush()?;
            return Ok(files_written);
        };

        if self.current != Some((entry.story, entry.frame)) {
            files_written += self.flush()?;
        }

        self.current = Some((entry.story, entry.frame));
        if !self.buffer.is_empty() {
            // Blank line between notes
            self.buffer.push('\n');
        }
        self.buffer
            .push_str(&format!("# {}\n\n{}\n", entry.quote, entry.note));

        Ok(files_written)
    }

    pub fn finish(mut self) -> Result<usize, NotesError> {
        self.push(None)
    }

    fn flush(&mut self) -> Result<usize, NotesError> {
        let Some((story, frame)) = self.current else {
            return Ok(0);
        };
        if self.buffer.is_empty() {
            return Ok(0);
        }

        let path = note_file_path(&self.content_dir, story, frame);

        let text = if self.written.contains(&path) {
            let previous = fs::read_to_string(&path).map_err(|e| NotesError::io(&path, e))?;
            format!("{}\n{}", previous, self.buffer)
        } else {
            self.buffer.clone()
        };

        write_text(&path, &text)?;
        debug!("Wrote {} bytes to {}", text.len(), path.display());

        self.written.insert(path);
        self.buffer.clear();

        Ok(1)
    }
}

#[derive(Debug, Default)]
pub struct MarkdownExport {
    pub files_written: usize,
    pub warnings: Vec<ConsistencyWarning>,
}

/// Writes 7-column rows as `content/<story>/<frame>.md` files under `target_dir`.
///
/// A range reference writes the same note into every frame it covers;
/// `intro` goes to `00.md`. Ids, tags and support references are dropped, the
/// legacy layout cannot hold them.
pub fn tsv_to_markdown(rows: &[NoteRow], target_dir: &Path) -> Result<MarkdownExport, NotesError> {
    let mut export = MarkdownExport::default();
    let mut writer = MarkdownTreeWriter::new(target_dir);

    for (i, row) in rows.iter().enumerate() {
        let line = i + 2;
        let reference = row.parse_reference(line)?;

        // Import gives "0" to an empty quote and "1" to any other
        let kept = if row.quote.is_empty() { "0" } else { "1" };
        if row.occurrence != kept && !row.occurrence.is_empty() {
            let message = format!(
                "occurrence {} of {:?} cannot be kept in markdown",
                row.occurrence, row.quote
            );
            warn!("{}: {}", reference, message);
            export
                .warnings
                .push(ConsistencyWarning::new(format!("line {} ({})", line, reference), message));
        }

        for frame in reference.verses() {
            let entry = MarkdownEntry {
                story: reference.chapter,
                frame,
                quote: quote_from_tsv(&unescape_newlines(&row.quote)),
                note: unescape_newlines(&row.note),
            };
            export.files_written += writer.push(Some(&entry))?;
        }
    }

    export.files_written += writer.finish()?;

    Ok(export)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkdownBlock {
    Note { quote: String, note: String },
    // Body text before the first heading of a file belongs to the previous note
    Continuation(String),
}

/// Splits one note file into heading/body blocks.
///
/// Body lines are joined with `\n` escapes, one per line break, so that blank
/// lines inside a note survive. `<br>` counts as a line break.
pub fn parse_note_markdown(text: &str) -> Result<Vec<MarkdownBlock>, FormatError> {
    let mut blocks = Vec::new();

    let mut quote: Option<(usize, String)> = None;
    let mut body: Option<String> = None;
    let mut blank_lines = 0;

    let finish = |blocks: &mut Vec<MarkdownBlock>, quote: Option<(usize, String)>, body: Option<String>| {
        match (quote, body) {
            (Some((_, quote)), Some(note)) => blocks.push(MarkdownBlock::Note { quote, note }),
            (None, Some(note)) => blocks.push(MarkdownBlock::Continuation(note)),
            (Some((line, quote)), None) => {
                return Err(FormatError::Markdown {
                    line,
                    message: format!("heading {:?} has no note", quote),
                })
            }
            (None, None) => {}
        }
        Ok(())
    };

    for (i, line) in text.lines().enumerate() {
        let line_number = i + 1;
        let line = line.trim_end();

        if line.trim().is_empty() {
            blank_lines += 1;
            continue;
        }

        // "# " loses its space to trim_end when the quote is empty
        if line == "#" || line.starts_with("# ") {
            finish(&mut blocks, quote.take(), body.take())?;
            quote = Some((line_number, line[1..].trim().to_owned()));
            blank_lines = 0;
            continue;
        }

        let content = escape_newlines(&line.replace("<br>", "\n"));
        body = Some(match body.take() {
            Some(mut body) => {
                body.push_str(&"\\n".repeat(blank_lines + 1));
                body.push_str(&content);
                body
            }
            None => content,
        });
        blank_lines = 0;
    }

    finish(&mut blocks, quote.take(), body.take())?;

    Ok(blocks)
}

#[derive(Debug, Default)]
pub struct MarkdownImport {
    pub rows: Vec<NoteRow>,
    pub files_read: usize,
    pub warnings: Vec<ConsistencyWarning>,
    pub failures: Vec<NotesError>,
}

// Content of a row without its id, to find the id a previous table gave it
type RowContent = (String, String, String, String);

fn row_content(row: &NoteRow) -> RowContent {
    (
        row.reference.clone(),
        row.quote.clone(),
        row.occurrence.clone(),
        row.note.clone(),
    )
}

/// Reads a Markdown note tree (`<source_dir>/content/...`) into 7-column rows.
///
/// A file that does not parse is recorded in `failures` and skipped; the
/// other files are still converted. Ids come from `previous` when a row with
/// the same content exists there, otherwise from `ids`.
pub fn markdown_to_tsv<R: Rng>(
    source_dir: &Path,
    layout: TreeLayout,
    previous: &[NoteRow],
    ids: &mut IdGenerator<R>,
) -> Result<MarkdownImport, NotesError> {
    let content_dir = source_dir.join("content");
    let mut import = MarkdownImport::default();

    let mut previous_ids: HashMap<RowContent, String> = HashMap::new();
    for row in previous {
        previous_ids
            .entry(row_content(row))
            .or_insert_with(|| row.id.clone());
    }

    for (path, reference) in list_note_files(&content_dir, layout)? {
        let blocks = read_text(&path).and_then(|text| {
            parse_note_markdown(&text).map_err(|e| NotesError::format(&path, e))
        });
        let blocks = match blocks {
            Ok(blocks) => blocks,
            Err(e) => {
                warn!("{}", e);
                import.failures.push(e);
                continue;
            }
        };
        import.files_read += 1;

        for block in blocks {
            match block {
                MarkdownBlock::Note { quote, note } => {
                    let quote = quote_to_tsv(&quote);
                    let occurrence = if quote.is_empty() { "0" } else { "1" };
                    let mut row = NoteRow {
                        reference: reference.to_string(),
                        quote,
                        occurrence: occurrence.to_owned(),
                        note,
                        ..NoteRow::default()
                    };
                    row.id = match previous_ids.get(&row_content(&row)) {
                        Some(id) if ids.reserve(id) => id.clone(),
                        _ => ids.generate(),
                    };
                    import.rows.push(row);
                }

                MarkdownBlock::Continuation(note) => match import.rows.last_mut() {
                    Some(last) => {
                        import.warnings.push(ConsistencyWarning::new(
                            path.display().to_string(),
                            format!("text before first heading appended to {}", last.reference),
                        ));
                        last.note.push_str("\\n\\n");
                        last.note.push_str(&note);
                    }
                    None => {
                        let e = NotesError::format(
                            &path,
                            FormatError::Markdown {
                                line: 1,
                                message: "text before first heading".to_owned(),
                            },
                        );
                        warn!("{}", e);
                        import.failures.push(e);
                    }
                },
            }
        }
    }

    Ok(import)
}

// Numbered entries of `dir` in numeric order: "01" -> 1, "intro" -> 0
fn numbered_entries(dir: &Path, extension: Option<&str>) -> Result<Vec<(u32, PathBuf)>, NotesError> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| NotesError::io(dir, e))? {
        let path = entry.map_err(|e| NotesError::io(dir, e))?.path();

        let matches_kind = match extension {
            Some(extension) => path.is_file() && path.extension().map_or(false, |e| e == extension),
            None => path.is_dir(),
        };
        if !matches_kind {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let number = match stem {
            "intro" | "front" => Some(0),
            stem => parse_number(stem),
        };
        if let Some(number) = number {
            entries.push((number, path));
        }
    }

    entries.sort();
    Ok(entries)
}

fn list_note_files(content_dir: &Path, layout: TreeLayout) -> Result<Vec<(PathBuf, Reference)>, NotesError> {
    let mut files = Vec::new();

    match layout {
        TreeLayout::Chaptered => {
            for (story, story_dir) in numbered_entries(content_dir, None)? {
                for (frame, path) in numbered_entries(&story_dir, Some("md"))? {
                    files.push((path, Reference::new(story, frame)));
                }
            }
        }
        TreeLayout::Flat => {
            for (story, path) in numbered_entries(content_dir, Some("md"))? {
                files.push((path, Reference::new(story, 0)));
            }
        }
    }

    Ok(files)
}
