use anyhow::{bail, Context, Result};
use std::{env, path::PathBuf, process};

use scripture_notes::{
    convert::{
        check_usfm, convert_markdown_to_tsv, convert_tsv7_to_tsv9, convert_tsv9_to_tsv7,
        convert_tsv_to_markdown, copy_quotes, remove_duplicate_verses_in, ConversionConfig,
        RunReport,
    },
    tsv::{markdown::TreeLayout, note_row::NoteFamily},
};

const USAGE: &str = "\
Usage:
    scripture-notes check-usfm [--usfm3] [--footnotes OUT] <path>
    scripture-notes remove-duplicate-verses <path>
    scripture-notes tsv2md [--family NAME] <source.tsv> <target_dir>
    scripture-notes md2tsv [--family NAME] [--flat] <source_dir> <target.tsv>
    scripture-notes tsv9to7 [--family NAME] <source.tsv> <target.tsv>
    scripture-notes tsv7to9 [--book BBB] <source.tsv> <target.tsv>
    scripture-notes copy-quotes --lang CODE <english_dir> <target_dir> <out_dir>";

#[derive(Debug, Clone, Copy)]
enum Command {
    CheckUsfm,
    RemoveDuplicateVerses,
    TsvToMarkdown,
    MarkdownToTsv,
    Tsv9To7,
    Tsv7To9,
    CopyQuotes,
}

impl Command {
    fn of(name: &str) -> Result<Self> {
        match name {
            "check-usfm" => Ok(Self::CheckUsfm),
            "remove-duplicate-verses" => Ok(Self::RemoveDuplicateVerses),
            "tsv2md" => Ok(Self::TsvToMarkdown),
            "md2tsv" => Ok(Self::MarkdownToTsv),
            "tsv9to7" => Ok(Self::Tsv9To7),
            "tsv7to9" => Ok(Self::Tsv7To9),
            "copy-quotes" => Ok(Self::CopyQuotes),
            name => bail!("Unknown command: {}", name),
        }
    }

    // Number of free arguments after the command name
    fn arity(&self) -> usize {
        match self {
            Self::CheckUsfm | Self::RemoveDuplicateVerses => 1,
            Self::CopyQuotes => 3,
            _ => 2,
        }
    }
}

struct Args {
    command: Command,
    config: ConversionConfig,
}

fn get_args() -> Result<Args> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut opts = getopts::Options::new();
    opts.optflag("", "usfm3", "strip USFM 3 alignment markup before checking");
    opts.optopt("", "footnotes", "write footnoted verses as JSON", "OUT");
    opts.optopt("", "family", "note, annotation or response", "NAME");
    opts.optflag("", "flat", "Markdown tree has one file per story");
    opts.optopt("", "book", "book id of the 9-column output", "BBB");
    opts.optopt("", "lang", "language code of the translated tables", "CODE");

    let matches = match opts.parse(&args) {
        Ok(m) => m,
        Err(f) => bail!(f),
    };

    let (name, free) = matches
        .free
        .split_first()
        .context("command is required")?;
    let command = Command::of(name)?;

    if free.len() != command.arity() {
        bail!(
            "{} takes {} path argument(s) but {} given",
            name,
            command.arity(),
            free.len()
        );
    }

    let mut config = match command {
        Command::CopyQuotes => {
            let mut config = ConversionConfig::new(&free[1]).with_target(&free[2]);
            config.english = Some(PathBuf::from(&free[0]));
            config.language_code = matches
                .opt_str("lang")
                .context("--lang is required for copy-quotes")?;
            config
        }
        Command::CheckUsfm => {
            let mut config = ConversionConfig::new(&free[0]);
            config.target = matches.opt_str("footnotes").map(PathBuf::from);
            config
        }
        Command::RemoveDuplicateVerses => ConversionConfig::new(&free[0]),
        _ => ConversionConfig::new(&free[0]).with_target(&free[1]),
    };

    if let Some(family) = matches.opt_str("family") {
        config.family = NoteFamily::of(&family)?;
    }
    if matches.opt_present("flat") {
        config.layout = TreeLayout::Flat;
    }
    config.book = matches.opt_str("book");
    config.usfm3 = matches.opt_present("usfm3");

    Ok(Args { command, config })
}

fn run(args: &Args) -> Result<RunReport> {
    let config = &args.config;

    if !config.source.exists() {
        bail!("File not found: {}", config.source.display());
    }

    match args.command {
        Command::CheckUsfm => check_usfm(config),
        Command::RemoveDuplicateVerses => remove_duplicate_verses_in(config),
        Command::TsvToMarkdown => convert_tsv_to_markdown(config),
        Command::MarkdownToTsv => convert_markdown_to_tsv(config),
        Command::Tsv9To7 => convert_tsv9_to_tsv7(config),
        Command::Tsv7To9 => convert_tsv7_to_tsv9(config),
        Command::CopyQuotes => copy_quotes(config),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match get_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            process::exit(2);
        }
    };

    let report = run(&args).with_context(|| format!("Failed to run {:?}", args.command))?;
    report.log_summary();

    if !report.is_success() {
        process::exit(1);
    }

    Ok(())
}
