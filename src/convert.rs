use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, ensure, Context, Result};
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use log::{error, info, warn};
use rand::Rng;

use crate::{
    error::{ConsistencyWarning, LookupError, NotesError},
    tsv::{
        copy_forward::copy_quotes_forward,
        markdown::{markdown_to_tsv, tsv_to_markdown, TreeLayout},
        note_row::{
            check_note_rows, note_rows_from_table, table_from_note_rows, table_from_tsv9_rows,
            tsv9_rows_from_table, NoteFamily, NoteRow,
        },
        remap::{book_from_file_name, tsv7_to_tsv9, tsv9_to_tsv7},
        row_id::IdGenerator,
        table::{read_tsv, to_tsv_string},
    },
    usfm::{
        prepass::normalize_usfm3, tokenizer::tokenize_usfm, validator::validate_usfm,
        widow::remove_duplicate_verses,
    },
    utility::fs::{backup_and_write, collect_files, has_extension, read_text, write_text},
};

const USFM_EXTENSIONS: [&str; 2] = ["usfm", "sfm"];
const TSV_EXTENSIONS: [&str; 1] = ["tsv"];

/// Everything one run needs. Built from command line arguments.
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    pub source: PathBuf,
    pub target: Option<PathBuf>,
    // English reference tables for the quote copy-forward
    pub english: Option<PathBuf>,
    pub language_code: String,
    pub book: Option<String>,
    pub family: NoteFamily,
    pub layout: TreeLayout,
    // Strip USFM 3 alignment markup before validating
    pub usfm3: bool,
}

impl ConversionConfig {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: None,
            english: None,
            language_code: "en".to_owned(),
            book: None,
            family: NoteFamily::Note,
            layout: TreeLayout::Chaptered,
            usfm3: false,
        }
    }

    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }

    fn target(&self) -> Result<&Path> {
        self.target
            .as_deref()
            .context("target path is required")
    }
}

#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

/// Outcome of one run. Failed files are listed here rather than ending the run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub files_read: usize,
    pub files_written: usize,
    pub rows: usize,
    pub warnings: Vec<ConsistencyWarning>,
    pub lookups: Vec<LookupError>,
    pub failures: Vec<FileFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, path: &Path, error: anyhow::Error) {
        error!("{}: {:#}", path.display(), error);
        self.failures.push(FileFailure {
            path: path.to_path_buf(),
            error,
        });
    }

    fn warn_all(&mut self, warnings: Vec<ConsistencyWarning>) {
        for warning in &warnings {
            warn!("{}", warning);
        }
        self.warnings.extend(warnings);
    }

    pub fn log_summary(&self) {
        info!(
            "{} file(s) read, {} file(s) written, {} row(s)",
            self.files_read, self.files_written, self.rows
        );
        if !self.warnings.is_empty() {
            info!("{} warning(s)", self.warnings.len());
        }
        if !self.lookups.is_empty() {
            info!("{} row(s) without a match", self.lookups.len());
        }
        if !self.failures.is_empty() {
            error!("{} file(s) failed", self.failures.len());
        }
    }
}

pub fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template(
            "{percent:>3}% [{wide_bar:.cyan/blue}] {pos}/{len} [{elapsed_precise} < {eta_precise}]",
        )
        .unwrap()
        .progress_chars("#-"),
    );
    pb
}

fn files_with_extension(root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let files = collect_files(root, &|path: &Path| has_extension(path, extensions))?;
    Ok(files)
}

// Where the output for `file` goes when `source` may be a file or a directory
fn output_path(source: &Path, target: &Path, file: &Path) -> PathBuf {
    match file.strip_prefix(source) {
        Ok(relative) if !relative.as_os_str().is_empty() => target.join(relative),
        _ => target.to_path_buf(),
    }
}

/// Validates one USFM file or every `.usfm`/`.sfm` file under a directory.
///
/// Defects become warnings located at the file. A book id seen in two files
/// is reported too. With a target path, the footnoted verses of all files
/// are written there as a JSON list.
pub fn check_usfm(config: &ConversionConfig) -> Result<RunReport> {
    let mut report = RunReport::default();
    let mut books: HashMap<String, PathBuf> = HashMap::new();
    let mut footnoted_verses = Vec::new();

    let files = files_with_extension(&config.source, &USFM_EXTENSIONS)?;
    info!("Checking {} USFM file(s)...", files.len());

    let pb = create_progress_bar(files.len() as u64);
    for path in files.iter().progress_with(pb) {
        let validated = (|| {
            let text = read_text(path)?;
            let text = if config.usfm3 {
                normalize_usfm3(&text)
            } else {
                text
            };
            Ok::<_, anyhow::Error>(validate_usfm(tokenize_usfm(&text)))
        })()
        .with_context(|| format!("Failed to check {}", path.display()));

        let validation = match validated {
            Ok(validation) => validation,
            Err(e) => {
                report.fail(path, e);
                continue;
            }
        };
        report.files_read += 1;

        let location = path.display().to_string();
        let mut warnings: Vec<_> = validation
            .defects
            .iter()
            .map(|defect| ConsistencyWarning::new(&location, defect.to_string()))
            .collect();

        if let Some(book_id) = &validation.book_id {
            if let Some(first) = books.get(book_id) {
                warnings.push(ConsistencyWarning::new(
                    &location,
                    format!("book {} is also in {}", book_id, first.display()),
                ));
            } else {
                books.insert(book_id.clone(), path.clone());
            }
        }

        report.warn_all(warnings);
        footnoted_verses.extend(validation.footnoted_verses);
    }

    if let Some(target) = &config.target {
        let json = serde_json::to_string(&footnoted_verses)?;
        write_text(target, &json)?;
        info!(
            "Wrote {} footnoted verse(s) to {}",
            footnoted_verses.len(),
            target.display()
        );
        report.files_written += 1;
    }

    Ok(report)
}

/// Rewrites every USFM file that has widow verse markers, keeping `.orig` backups.
pub fn remove_duplicate_verses_in(config: &ConversionConfig) -> Result<RunReport> {
    let mut report = RunReport::default();

    let files = files_with_extension(&config.source, &USFM_EXTENSIONS)?;

    for path in &files {
        let result = (|| {
            let text = read_text(path)?;
            report.files_read += 1;

            if let Some(fixed) = remove_duplicate_verses(&text) {
                backup_and_write(path, &fixed)?;
                info!("Removed widow verse(s) from {}", path.display());
                report.files_written += 1;
            }
            Ok::<_, anyhow::Error>(())
        })();

        if let Err(e) = result {
            report.fail(path, e);
        }
    }

    Ok(report)
}

fn read_note_rows(path: &Path) -> Result<Vec<NoteRow>> {
    let table = read_tsv(path)?;
    note_rows_from_table(&table).with_context(|| format!("Failed to read {}", path.display()))
}

/// 7-column table to a Markdown tree under `target/content`.
pub fn convert_tsv_to_markdown(config: &ConversionConfig) -> Result<RunReport> {
    let mut report = RunReport::default();
    let target = config.target()?;

    let result = (|| {
        let rows = read_note_rows(&config.source)?;
        report.files_read += 1;
        report.rows += rows.len();
        report.warn_all(check_note_rows(&rows));

        let export = tsv_to_markdown(&rows, target)?;
        report.files_written += export.files_written;
        report.warn_all(export.warnings);
        Ok::<_, anyhow::Error>(())
    })();

    if let Err(e) = result {
        report.fail(&config.source, e);
    }

    Ok(report)
}

pub fn convert_markdown_to_tsv(config: &ConversionConfig) -> Result<RunReport> {
    convert_markdown_to_tsv_with(config, &mut IdGenerator::new())
}

/// Markdown tree to a 7-column table.
///
/// When the target table already exists, its ids are reused for rows whose
/// content did not change. The old table is kept as `.orig`.
pub fn convert_markdown_to_tsv_with<R: Rng>(
    config: &ConversionConfig,
    ids: &mut IdGenerator<R>,
) -> Result<RunReport> {
    let mut report = RunReport::default();
    let target = config.target()?;

    ensure!(
        config.source.join("content").is_dir(),
        "No content directory in {}",
        config.source.display()
    );

    let previous = if target.is_file() {
        match read_note_rows(target) {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Not reusing ids of {}: {:#}", target.display(), e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let import = markdown_to_tsv(&config.source, config.layout, &previous, ids)?;
    report.files_read += import.files_read;
    report.rows += import.rows.len();
    report.warn_all(import.warnings);
    for failure in import.failures {
        let path = match &failure {
            NotesError::Format { path, .. } | NotesError::Io { path, .. } => path.clone(),
            _ => config.source.clone(),
        };
        report.fail(&path, failure.into());
    }

    report.warn_all(check_note_rows(&import.rows));

    let text = to_tsv_string(&table_from_note_rows(config.family, &import.rows))?;
    if backup_and_write(target, &text)? {
        info!("Previous table kept as {}.orig", target.display());
    }
    report.files_written += 1;

    Ok(report)
}

/// 9-column tables to 7-column tables. `source` may be a file or a directory.
pub fn convert_tsv9_to_tsv7(config: &ConversionConfig) -> Result<RunReport> {
    let mut report = RunReport::default();
    let target = config.target()?;

    let files = files_with_extension(&config.source, &TSV_EXTENSIONS)?;

    for path in &files {
        let result = (|| {
            let table = read_tsv(path)?;
            let rows = tsv9_rows_from_table(&table)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            report.files_read += 1;

            let (rows, warnings) = tsv9_to_tsv7(&rows);
            report.rows += rows.len();
            report.warn_all(warnings);
            report.warn_all(check_note_rows(&rows));

            let output = output_path(&config.source, target, path);
            let text = to_tsv_string(&table_from_note_rows(config.family, &rows))?;
            write_text(&output, &text)?;
            report.files_written += 1;
            Ok::<_, anyhow::Error>(())
        })();

        if let Err(e) = result {
            report.fail(path, e);
        }
    }

    Ok(report)
}

/// 7-column tables to 9-column tables.
///
/// The book column comes from the configuration or, failing that, from the
/// file name (`tn_TIT.tsv`).
pub fn convert_tsv7_to_tsv9(config: &ConversionConfig) -> Result<RunReport> {
    let mut report = RunReport::default();
    let target = config.target()?;

    let files = files_with_extension(&config.source, &TSV_EXTENSIONS)?;

    for path in &files {
        let result = (|| {
            let book = match &config.book {
                Some(book) => book.to_uppercase(),
                None => path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(book_from_file_name)
                    .ok_or_else(|| anyhow!("cannot tell the book from the file name"))?,
            };

            let rows = read_note_rows(path)?;
            report.files_read += 1;

            let (rows, warnings) = tsv7_to_tsv9(&rows, &book)?;
            report.rows += rows.len();
            report.warn_all(warnings);

            let output = output_path(&config.source, target, path);
            let text = to_tsv_string(&table_from_tsv9_rows(&rows))?;
            write_text(&output, &text)?;
            report.files_written += 1;
            Ok::<_, anyhow::Error>(())
        })();

        if let Err(e) = result {
            report.fail(path, e);
        }
    }

    Ok(report)
}

// "kn_tn_57-TIT.tsv" -> "en_tn_57-TIT.tsv"
fn english_file_name(file_name: &str, language_code: &str) -> String {
    file_name.replacen(language_code, "en", 1)
}

/// Copies quotes from English 9-column tables into translated ones.
///
/// `source` holds the translated tables, `english` the English ones with the
/// same names (language code swapped for `en`). Results go to `target`.
pub fn copy_quotes(config: &ConversionConfig) -> Result<RunReport> {
    let mut report = RunReport::default();
    let target = config.target()?;
    let english_dir = config
        .english
        .as_deref()
        .context("English table directory is required")?;

    let files = files_with_extension(&config.source, &TSV_EXTENSIONS)?;

    for path in &files {
        let result = (|| {
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .context("file name is not UTF-8")?;
            let english_path = english_dir.join(english_file_name(file_name, &config.language_code));
            ensure!(
                english_path.is_file(),
                "No such file: {}",
                english_path.display()
            );

            let english = read_tsv(&english_path)?;
            let mut rows = read_tsv(path)?;
            report.files_read += 2;

            let copied = copy_quotes_forward(&mut rows, &english, &config.language_code);
            report.rows += rows.len().saturating_sub(1);
            report.warn_all(copied.warnings);
            for lookup in &copied.lookups {
                warn!("{}: {}", path.display(), lookup);
            }
            report.lookups.extend(copied.lookups);

            write_text(&target.join(file_name), &to_tsv_string(&rows)?)?;
            report.files_written += 1;
            Ok::<_, anyhow::Error>(())
        })();

        if let Err(e) = result {
            report.fail(path, e);
        }
    }

    Ok(report)
}
