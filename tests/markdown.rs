use std::{collections::HashSet, fs, path::Path};

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};

use scripture_notes::tsv::{
    markdown::{
        markdown_to_tsv, parse_note_markdown, tsv_to_markdown, MarkdownBlock, TreeLayout,
    },
    note_row::{note_rows_from_table, NoteRow},
    row_id::{is_valid_row_id, IdGenerator},
    table::parse_tsv,
};

const HEADER: &str = "Reference\tID\tTags\tSupportReference\tQuote\tOccurrence\tNote\n";

fn rows_of(body: &str) -> Result<Vec<NoteRow>> {
    let table = parse_tsv(&format!("{}{}", HEADER, body))?;
    Ok(note_rows_from_table(&table)?)
}

fn seeded_ids() -> IdGenerator<StdRng> {
    IdGenerator::with_rng(StdRng::seed_from_u64(42))
}

fn read(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

#[test]
fn test_tsv_to_markdown_single_row() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let rows = rows_of("1:3\tab12\t\t\tHello\t1\tThis is a note\n")?;

    let export = tsv_to_markdown(&rows, dir.path())?;

    assert_eq!(export.files_written, 1);
    assert!(export.warnings.is_empty());
    assert_eq!(
        read(&dir.path().join("content/01/03.md"))?,
        "# Hello\n\nThis is a note\n"
    );

    // The id comes back from the previous table
    let import = markdown_to_tsv(dir.path(), TreeLayout::Chaptered, &rows, &mut seeded_ids())?;
    assert_eq!(import.rows, rows);
    assert_eq!(import.files_read, 1);
    assert!(import.failures.is_empty());

    Ok(())
}

#[test]
fn test_tsv_to_markdown_range() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let rows = rows_of("2:3-5\tab12\t\t\tword\t1\tNote\n")?;

    let export = tsv_to_markdown(&rows, dir.path())?;

    assert_eq!(export.files_written, 3);
    for frame in ["03", "04", "05"] {
        let path = dir.path().join("content/02").join(format!("{}.md", frame));
        assert_eq!(read(&path)?, "# word\n\nNote\n");
    }
    assert!(!dir.path().join("content/02/06.md").exists());

    Ok(())
}

#[test]
fn test_tsv_to_markdown_groups_frames() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let rows = rows_of(
        "1:1\taaaa\t\t\tA\t1\tnote a\n\
         1:1\tbbbb\t\t\tB\t2\tnote b\n\
         1:2\tcccc\t\t\tC\t1\tnote c\n\
         1:1\tdddd\t\t\tD\t1\tnote d\n",
    )?;

    let export = tsv_to_markdown(&rows, dir.path())?;

    assert_eq!(export.files_written, 3);
    assert_eq!(export.warnings.len(), 1);
    assert_eq!(
        read(&dir.path().join("content/01/01.md"))?,
        "# A\n\nnote a\n\n# B\n\nnote b\n\n# D\n\nnote d\n"
    );
    assert_eq!(read(&dir.path().join("content/01/02.md"))?, "# C\n\nnote c\n");

    Ok(())
}

#[test]
fn test_markdown_round_trip_keeps_paragraphs() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let rows = rows_of(
        "1:intro\tab12\t\t\tTitle\t1\tFirst paragraph\\n\\nSecond paragraph\n\
         1:1\tcd34\t\t\tthe word...of God\t1\tline one\\nline two\n",
    )?;

    tsv_to_markdown(&rows, dir.path())?;
    assert_eq!(
        read(&dir.path().join("content/01/00.md"))?,
        "# Title\n\nFirst paragraph\n\nSecond paragraph\n"
    );

    let import = markdown_to_tsv(dir.path(), TreeLayout::Chaptered, &[], &mut seeded_ids())?;

    let triples: Vec<_> = import
        .rows
        .iter()
        .map(|row| (row.reference.as_str(), row.quote.as_str(), row.note.as_str()))
        .collect();
    assert_eq!(
        triples,
        vec![
            ("1:intro", "Title", "First paragraph\\n\\nSecond paragraph"),
            ("1:1", "the word & of God", "line one\\nline two"),
        ]
    );
    assert!(import.rows.iter().all(|row| is_valid_row_id(&row.id)));

    Ok(())
}

#[test]
fn test_markdown_round_trip_keeps_empty_quote() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let rows = rows_of(
        "1:intro\tab12\t\t\t\t0\tGeneral notes\n\
         2:1\tcd34\t\t\tHello\t1\tnote\n",
    )?;

    let export = tsv_to_markdown(&rows, dir.path())?;
    assert!(export.warnings.is_empty());
    assert_eq!(
        read(&dir.path().join("content/01/00.md"))?,
        "# \n\nGeneral notes\n"
    );

    let import = markdown_to_tsv(dir.path(), TreeLayout::Chaptered, &rows, &mut seeded_ids())?;
    assert!(import.failures.is_empty());
    assert_eq!(import.rows, rows);

    Ok(())
}

#[test]
fn test_markdown_round_trip_front_matter() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let rows = rows_of("front:intro\tab12\t\t\tTitus\t1\tIntroduction\n")?;

    tsv_to_markdown(&rows, dir.path())?;
    assert_eq!(
        read(&dir.path().join("content/00/00.md"))?,
        "# Titus\n\nIntroduction\n"
    );

    let import = markdown_to_tsv(dir.path(), TreeLayout::Chaptered, &rows, &mut seeded_ids())?;
    assert_eq!(import.rows, rows);
    assert_eq!(import.rows[0].reference, "front:intro");

    Ok(())
}

#[test]
fn test_markdown_discontinuous_quote() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let rows = rows_of("1:1\tab12\t\t\tΠαῦλος & Θεοῦ\t1\tPaul of God\n")?;

    tsv_to_markdown(&rows, dir.path())?;
    assert_eq!(
        read(&dir.path().join("content/01/01.md"))?,
        "# Παῦλος…Θεοῦ\n\nPaul of God\n"
    );

    let import = markdown_to_tsv(dir.path(), TreeLayout::Chaptered, &[], &mut seeded_ids())?;
    assert_eq!(import.rows[0].quote, "Παῦλος & Θεοῦ");

    Ok(())
}

#[test]
fn test_parse_note_markdown() -> Result<()> {
    let blocks = parse_note_markdown("text first\n# Q1\n\nA<br>B\n\n\n# Q2\nC\n")?;

    assert_eq!(
        blocks,
        vec![
            MarkdownBlock::Continuation("text first".to_owned()),
            MarkdownBlock::Note {
                quote: "Q1".to_owned(),
                note: "A\\nB".to_owned(),
            },
            MarkdownBlock::Note {
                quote: "Q2".to_owned(),
                note: "C".to_owned(),
            },
        ]
    );

    assert!(parse_note_markdown("# Q1\n\n# Q2\nC\n").is_err());

    assert_eq!(
        parse_note_markdown("#\n\nGeneral\n")?,
        vec![MarkdownBlock::Note {
            quote: String::new(),
            note: "General".to_owned(),
        }]
    );

    Ok(())
}

#[test]
fn test_markdown_to_tsv_isolates_bad_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let content = dir.path().join("content");
    fs::create_dir_all(content.join("01"))?;
    fs::create_dir_all(content.join("02"))?;
    fs::write(content.join("01/01.md"), "# one\n\nfirst\n")?;
    fs::write(content.join("01/02.md"), "more of the first note\n")?;
    fs::write(content.join("01/10.md"), "# ten\n\ntenth\n")?;
    fs::write(content.join("02/01.md"), "# heading without note\n")?;
    fs::write(content.join("02/02.md"), "# two\n\nsecond\n")?;
    fs::write(content.join("02/notes.txt"), "ignored")?;

    let import = markdown_to_tsv(dir.path(), TreeLayout::Chaptered, &[], &mut seeded_ids())?;

    let references: Vec<_> = import.rows.iter().map(|r| r.reference.as_str()).collect();
    assert_eq!(references, vec!["1:1", "1:10", "2:2"]);
    assert_eq!(import.rows[0].note, "first\\n\\nmore of the first note");
    assert_eq!(import.files_read, 4);
    assert_eq!(import.failures.len(), 1);
    assert_eq!(import.warnings.len(), 1);

    Ok(())
}

#[test]
fn test_markdown_to_tsv_flat_layout() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let content = dir.path().join("content");
    fs::create_dir_all(&content)?;
    fs::write(content.join("01.md"), "# Who?\n\nGod.\n")?;
    fs::write(content.join("02.md"), "# Why?\n\nLove.\n")?;

    let import = markdown_to_tsv(dir.path(), TreeLayout::Flat, &[], &mut seeded_ids())?;

    let references: Vec<_> = import.rows.iter().map(|r| r.reference.as_str()).collect();
    assert_eq!(references, vec!["1:intro", "2:intro"]);

    Ok(())
}

#[test]
fn test_reused_id_is_not_issued_twice() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let rows = rows_of("1:1\tab12\t\t\tA\t1\tsame\n1:1\tab12\t\t\tA\t1\tsame\n")?;
    tsv_to_markdown(&rows, dir.path())?;

    let import = markdown_to_tsv(dir.path(), TreeLayout::Chaptered, &rows, &mut seeded_ids())?;

    assert_eq!(import.rows.len(), 2);
    assert_eq!(import.rows[0].id, "ab12");
    assert_ne!(import.rows[1].id, "ab12");

    Ok(())
}

#[test]
fn test_generated_ids_are_unique() {
    let mut ids = seeded_ids();
    ids.reserve("ab12");

    let generated: HashSet<_> = (0..5000).map(|_| ids.generate()).collect();

    assert_eq!(generated.len(), 5000);
    assert!(!generated.contains("ab12"));
    assert!(generated.iter().all(|id| is_valid_row_id(id)));
    assert!(generated
        .iter()
        .all(|id| !id.contains('0') && !id.contains('o')));
    assert_eq!(ids.len(), 5001);
}
