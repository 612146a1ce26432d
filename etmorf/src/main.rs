//! Command-line front end.
//!
//! Reads whitespace-separated tokens from stdin and writes analysis
//! records to stdout. The mode switches mirror the library flags; exit
//! code is 0 on success and 1 on any uncaught error.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use etmorf::Engine;
use etmorf_core::{Flags, Lyli};

#[derive(Parser, Debug)]
#[command(name = "etmorf", about = "Estonian morphological analyzer")]
struct Args {
    /// Directory holding et.dct (and optionally et3.dct, et.usr.dct)
    #[arg(long, default_value = "data")]
    dict: PathBuf,

    /// Load flags from a TOML file instead of the switches below
    #[arg(long)]
    flags: Option<PathBuf>,

    /// Disambiguate sentences (input must carry <s> ... </s> markers)
    #[arg(long)]
    disambiguate: bool,

    /// Spell-check words instead of analyzing
    #[arg(long)]
    spell: bool,

    /// Syllabify words instead of analyzing
    #[arg(long)]
    syllabify: bool,

    /// Generate forms: each input line is `lemma pos form`
    #[arg(long)]
    generate: bool,

    /// Disable the out-of-vocabulary guesser
    #[arg(long)]
    no_guess: bool,

    /// Attach dictionary headwords
    #[arg(long)]
    lemmas: bool,

    /// Attach compact disambiguation tags
    #[arg(long)]
    tags: bool,

    /// Recognize roman numerals
    #[arg(long)]
    roman: bool,

    /// Recognize web addresses
    #[arg(long)]
    urls: bool,

    /// Merge multi-word expressions
    #[arg(long)]
    mwe: bool,

    /// One line of output per word
    #[arg(long)]
    one_line: bool,
}

impl Args {
    fn flags(&self) -> Result<Flags> {
        let mut flags = match &self.flags {
            Some(path) => Flags::load_toml(path)
                .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?,
            None if self.disambiguate => Flags::disambiguator(),
            None => Flags::default(),
        };
        if self.disambiguate {
            flags.disambiguate = true;
            flags.tag_with_dtag = true;
        }
        if self.generate {
            flags.generate = true;
        }
        if self.no_guess {
            flags.guess = false;
        }
        if self.lemmas {
            flags.add_lemmas = true;
        }
        if self.tags {
            flags.tag_with_dtag = true;
        }
        if self.roman {
            flags.allow_roman = true;
        }
        if self.urls {
            flags.allow_urls = true;
        }
        if self.mwe {
            flags.merge_mwe = true;
        }
        if self.one_line {
            flags.one_line_output = true;
        }
        Ok(flags)
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("etmorf: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let flags = args.flags()?;
    let one_line = flags.one_line_output;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.syllabify {
        for line in stdin.lock().lines() {
            let line = line.context("reading stdin")?;
            for word in line.split_whitespace() {
                let syllables = etmorf_core::syllabify(word);
                let rendered: Vec<String> = syllables
                    .iter()
                    .map(|s| format!("{}/{}{}", s.text, s.quantity, if s.stress { "*" } else { "" }))
                    .collect();
                writeln!(out, "{word}\t{}", rendered.join("-"))?;
            }
        }
        return Ok(());
    }

    let engine =
        Engine::open(&args.dict, flags).with_context(|| format!("opening {}", args.dict.display()))?;

    if args.spell {
        for line in stdin.lock().lines() {
            let line = line.context("reading stdin")?;
            for word in line.split_whitespace() {
                if engine.spell(word) {
                    writeln!(out, "{word}\tok")?;
                } else {
                    let suggestions = engine.suggest(word, 5);
                    writeln!(out, "{word}\t{}", suggestions.join(" "))?;
                }
            }
        }
        return Ok(());
    }

    if args.generate {
        let synth = engine.synthesizer()?;
        for line in stdin.lock().lines() {
            let line = line.context("reading stdin")?;
            let mut parts = line.split_whitespace();
            let (Some(lemma), Some(pos)) = (parts.next(), parts.next()) else {
                continue;
            };
            let pos = pos.chars().next().unwrap_or('S');
            let form = parts.collect::<Vec<_>>().join(" ");
            let sets = synth.synthesize(lemma, pos, &form, "", engine.flags());
            if sets.is_empty() {
                writeln!(out, "{lemma}\t####")?;
            } else {
                let words: Vec<&str> = sets.iter().map(|s| s.word.as_str()).collect();
                writeln!(out, "{lemma}\t{}", words.join(" "))?;
            }
        }
        return Ok(());
    }

    let mut pipeline = engine.pipeline();
    let mut emit = |lyli: Lyli, out: &mut dyn Write| -> Result<()> {
        match lyli {
            Lyli::Analysis(set) => write!(out, "{}", set.serialize(one_line))?,
            Lyli::StringTag(text, _) | Lyli::StringWithId(text, _) => writeln!(out, "{text}")?,
            Lyli::Word(text) => writeln!(out, "{text}")?,
            Lyli::IntTag(n) => writeln!(out, "<{n}>")?,
        }
        Ok(())
    };

    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        for token in line.split_whitespace() {
            pipeline.set(token)?;
            while let Some(lyli) = pipeline.get()? {
                emit(lyli, &mut out)?;
            }
        }
    }
    for lyli in pipeline.flush()? {
        emit(lyli, &mut out)?;
    }
    Ok(())
}
