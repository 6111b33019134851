use std::fs;

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};

use scripture_notes::{
    convert::{
        check_usfm, convert_markdown_to_tsv_with, convert_tsv7_to_tsv9, convert_tsv9_to_tsv7,
        convert_tsv_to_markdown, copy_quotes, remove_duplicate_verses_in, ConversionConfig,
    },
    tsv::{row_id::IdGenerator, table::read_tsv},
    utility::fs::{backup_and_write, backup_path},
};

const TSV7_HEADER: &str = "Reference\tID\tTags\tSupportReference\tQuote\tOccurrence\tNote\n";
const TSV9_HEADER: &str =
    "Book\tChapter\tVerse\tID\tSupportReference\tOrigQuote\tOccurrence\tGLQuote\tOccurrenceNote\n";

#[test]
fn test_backup_never_overwrites_orig() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("01-GEN.usfm");

    assert!(!backup_and_write(&path, "first")?);
    assert!(!backup_path(&path).exists());

    assert!(backup_and_write(&path, "second")?);
    assert_eq!(fs::read_to_string(backup_path(&path))?, "first");

    assert!(!backup_and_write(&path, "third")?);
    assert_eq!(fs::read_to_string(backup_path(&path))?, "first");
    assert_eq!(fs::read_to_string(&path)?, "third");

    Ok(())
}

#[test]
fn test_check_usfm_directory() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let usfm_dir = dir.path().join("usfm");
    fs::create_dir_all(&usfm_dir)?;
    fs::write(
        usfm_dir.join("57-TIT.usfm"),
        "\\id TIT\n\\c 1\n\\v 1 Paul\\f + \\ft note\\f*\n\\v 2 hope\n\\v 2 again\n",
    )?;
    fs::write(usfm_dir.join("58-TIT.sfm"), "\\id TIT copy\n\\c 1\n\\v 1 a\n")?;
    fs::write(usfm_dir.join("bad.usfm"), b"\xc3\x28")?;
    fs::write(usfm_dir.join("readme.md"), "not usfm")?;

    let footnotes = dir.path().join("footnotedVerses.json");
    let config = ConversionConfig::new(&usfm_dir).with_target(&footnotes);
    let report = check_usfm(&config)?;

    assert_eq!(report.files_read, 2);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.ends_with("bad.usfm"));
    assert!(!report.is_success());

    // One duplicate verse, one book seen twice
    assert_eq!(report.warnings.len(), 2);

    let listed: Vec<String> = serde_json::from_str(&fs::read_to_string(&footnotes)?)?;
    assert_eq!(listed, vec!["TIT 1:1".to_owned()]);

    Ok(())
}

#[test]
fn test_check_usfm3() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tit.usfm");
    fs::write(
        &path,
        "\\id TIT\n\\c 1\n\\v 1 \\zaln-s |x-strong=\"G39720\"\\*\\w Paul|x-occurrence=\"1\"\\w*\\zaln-e\\*\n",
    )?;

    let mut config = ConversionConfig::new(&path);
    config.usfm3 = true;
    let report = check_usfm(&config)?;

    assert!(report.is_success());
    assert!(report.warnings.is_empty());
    assert_eq!(report.files_written, 0);

    Ok(())
}

#[test]
fn test_remove_duplicate_verses_in() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let widow = dir.path().join("a.usfm");
    let clean = dir.path().join("b.usfm");
    fs::write(&widow, "\\c 1\n\\v 3\n\\v 3 text\n\\v 4 more\n")?;
    fs::write(&clean, "\\c 1\n\\v 1 text\n")?;

    let report = remove_duplicate_verses_in(&ConversionConfig::new(dir.path()))?;

    assert_eq!(report.files_read, 2);
    assert_eq!(report.files_written, 1);
    assert_eq!(fs::read_to_string(&widow)?, "\\c 1\n\\v 3 text\n\\v 4 more\n");
    assert!(backup_path(&widow).exists());
    assert!(!backup_path(&clean).exists());

    Ok(())
}

#[test]
fn test_tsv_markdown_tsv_driver_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("tn_OBS.tsv");
    let tree = dir.path().join("obs-tn");
    let output = dir.path().join("out.tsv");

    let body = "1:1\tab12\t\t\tGod\t1\tThe Creator\n1:2-3\tcd34\t\t\tdark\t1\tNo light\n";
    fs::write(&source, format!("{}{}", TSV7_HEADER, body))?;

    let report = convert_tsv_to_markdown(&ConversionConfig::new(&source).with_target(&tree))?;
    assert!(report.is_success());
    assert_eq!(report.rows, 2);
    assert_eq!(report.files_written, 3);

    // An existing table gives its ids to unchanged rows and is kept as .orig
    fs::copy(&source, &output)?;
    let mut ids = IdGenerator::with_rng(StdRng::seed_from_u64(1));
    let report = convert_markdown_to_tsv_with(&ConversionConfig::new(&tree).with_target(&output), &mut ids)?;

    assert!(report.is_success());
    assert_eq!(report.files_read, 3);
    assert!(backup_path(&output).exists());

    let table = read_tsv(&output)?;
    assert_eq!(table.len(), 4);
    assert_eq!(table[1][1], "ab12");
    assert_eq!(table[2][0], "1:2");
    assert_eq!(table[3][0], "1:3");
    assert_eq!(table[2][6], "No light");

    Ok(())
}

#[test]
fn test_markdown_to_tsv_needs_content() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = ConversionConfig::new(dir.path()).with_target(dir.path().join("out.tsv"));
    let mut ids = IdGenerator::with_rng(StdRng::seed_from_u64(1));

    assert!(convert_markdown_to_tsv_with(&config, &mut ids).is_err());

    Ok(())
}

#[test]
fn test_tsv9_to_tsv7_directory_isolates_failures() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("tsv9");
    let target = dir.path().join("tsv7");
    fs::create_dir_all(&source)?;
    fs::write(
        source.join("en_tn_57-TIT.tsv"),
        format!("{}TIT\t1\t1\tab12\tfigs-metaphor\tΠαῦλος\t1\tPaul\tnote\n", TSV9_HEADER),
    )?;
    fs::write(
        source.join("en_tn_58-PHM.tsv"),
        format!("{}PHM\t1\t1\tcd34\n", TSV9_HEADER),
    )?;

    let report = convert_tsv9_to_tsv7(&ConversionConfig::new(&source).with_target(&target))?;

    assert_eq!(report.files_written, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.ends_with("en_tn_58-PHM.tsv"));

    let table = read_tsv(&target.join("en_tn_57-TIT.tsv"))?;
    assert_eq!(table[0][6], "Note");
    assert_eq!(table[1][0], "1:1");
    assert_eq!(table[1][4], "Παῦλος");
    assert!(!target.join("en_tn_58-PHM.tsv").exists());

    Ok(())
}

#[test]
fn test_tsv7_to_tsv9_book_from_file_name() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let source = dir.path().join("tn_TIT.tsv");
    let target = dir.path().join("en_tn_57-TIT.tsv");
    fs::write(
        &source,
        format!("{}1:1\tab12\t\trc://*/ta/man/translate/figs-metaphor\tΠαῦλος\t1\tnote\n", TSV7_HEADER),
    )?;

    let report = convert_tsv7_to_tsv9(&ConversionConfig::new(&source).with_target(&target))?;
    assert!(report.is_success());

    let table = read_tsv(&target)?;
    assert_eq!(
        table[1],
        vec!["TIT", "1", "1", "ab12", "figs-metaphor", "Παῦλος", "1", "", "note"]
    );

    // No book in the name and none configured
    let unnamed = dir.path().join("notes.tsv");
    fs::copy(&source, &unnamed)?;
    let report = convert_tsv7_to_tsv9(&ConversionConfig::new(&unnamed).with_target(dir.path().join("x.tsv")))?;
    assert_eq!(report.failures.len(), 1);

    Ok(())
}

#[test]
fn test_copy_quotes_driver() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let english = dir.path().join("en_tn");
    let translated = dir.path().join("kn_tn");
    let output = dir.path().join("out");
    fs::create_dir_all(&english)?;
    fs::create_dir_all(&translated)?;

    fs::write(
        english.join("en_tn_57-TIT.tsv"),
        format!("{}TIT\t1\t1\tab12\t\tΠαῦλος\t1\tPaul\t\n", TSV9_HEADER),
    )?;
    fs::write(
        translated.join("kn_tn_57-TIT.tsv"),
        format!("{}TIT\t1\t1\tab12\t\t\t\tಪೌಲನು\t[[rc://en/ta/man/translate/figs-you]]\n", TSV9_HEADER),
    )?;
    fs::write(
        translated.join("kn_tn_58-PHM.tsv"),
        format!("{}PHM\t1\t1\tcd34\t\t\t\tx\t\n", TSV9_HEADER),
    )?;

    let mut config = ConversionConfig::new(&translated).with_target(&output);
    config.english = Some(english);
    config.language_code = "kn".to_owned();
    let report = copy_quotes(&config)?;

    assert_eq!(report.files_written, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.lookups.is_empty());

    let table = read_tsv(&output.join("kn_tn_57-TIT.tsv"))?;
    assert_eq!(table[1][5], "Παῦλος");
    assert_eq!(table[1][8], "[[rc://kn/ta/man/translate/figs-you]]");

    Ok(())
}
