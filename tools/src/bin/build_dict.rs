//! Compile a JSON lexicon source into the binary dictionary.
//!
//! The source format is the flattened view of the dictionary tables:
//!
//! ```json
//! {
//!   "groups": [ { "pairs": [["0", "sg n,"], ["le", "sg all,"]] } ],
//!   "stems":  [ { "stem": "kass", "pos": "S", "group": 0 } ],
//!   "suffixes": [], "prefixes": [], "taboo": [], "mwe": []
//! }
//! ```
//!
//! Group ids are positions in the `groups` array.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;

use etmorf_core::dictionary::{DictionaryBuilder, StemRecord, COMPOUND_LEAD, COMPOUND_TAIL};
use etmorf_core::{GuessRecord, PrefixInfo, SuffixInfo};

#[derive(Parser, Debug)]
#[command(name = "build_dict", about = "Compile a JSON lexicon into et.dct")]
struct Args {
    /// JSON source file
    source: PathBuf,
    /// Output dictionary path
    #[arg(short, long, default_value = "et.dct")]
    out: PathBuf,
    /// Stems per compressed block
    #[arg(long, default_value_t = 32)]
    block_size: usize,
}

#[derive(Deserialize)]
struct Source {
    groups: Vec<GroupSrc>,
    stems: Vec<StemSrc>,
    #[serde(default)]
    suffixes: Vec<SuffixSrc>,
    #[serde(default)]
    prefixes: Vec<PrefixSrc>,
    #[serde(default)]
    taboo: Vec<String>,
    #[serde(default)]
    mwe: Vec<String>,
    #[serde(default)]
    guess_endings: Vec<GuessSrc>,
    #[serde(default)]
    guess_stems: Vec<GuessSrc>,
    #[serde(default)]
    bad_stems: Vec<String>,
    #[serde(default)]
    bad_suffixes: Vec<String>,
    #[serde(default)]
    bad_sg_nom: Vec<String>,
}

#[derive(Deserialize)]
struct GroupSrc {
    pairs: Vec<(String, String)>,
}

#[derive(Deserialize)]
struct StemSrc {
    stem: String,
    pos: char,
    group: u16,
    #[serde(default)]
    root: Option<String>,
    #[serde(default)]
    stem_class: u16,
    #[serde(default)]
    paradigm: u16,
    #[serde(default)]
    junction: u8,
    #[serde(default)]
    stress: u8,
    /// "l", "t" or "lt" for lead/tail compound positions.
    #[serde(default)]
    compound: String,
}

#[derive(Deserialize)]
struct SuffixSrc {
    suffix: String,
    pos: char,
    groups: Vec<u16>,
    #[serde(default)]
    stem_class: u16,
}

#[derive(Deserialize)]
struct PrefixSrc {
    prefix: String,
    #[serde(default)]
    stem_class: u16,
    #[serde(default)]
    markers: u8,
}

#[derive(Deserialize)]
struct GuessSrc {
    key: String,
    pos: char,
    ending: String,
    form: String,
    #[serde(default)]
    stem_suffix: String,
    #[serde(default)]
    phonotype: String,
    #[serde(default = "one")]
    min_syllables: u8,
    #[serde(default = "five")]
    max_syllables: u8,
    #[serde(default)]
    type_word: String,
}

fn one() -> u8 {
    1
}

fn five() -> u8 {
    5
}

impl GuessSrc {
    fn into_record(self) -> GuessRecord {
        GuessRecord {
            key: self.key,
            pos: self.pos,
            ending: self.ending,
            form: self.form,
            stem_suffix: self.stem_suffix,
            phonotype: self.phonotype,
            min_syllables: self.min_syllables,
            max_syllables: self.max_syllables,
            type_word: self.type_word,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let text = std::fs::read_to_string(&args.source)
        .with_context(|| format!("reading {}", args.source.display()))?;
    let source: Source = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", args.source.display()))?;

    let mut b = DictionaryBuilder::new();
    b.block_size(args.block_size);

    let mut group_ids = Vec::with_capacity(source.groups.len());
    for group in &source.groups {
        let pairs: Vec<(&str, &str)> = group
            .pairs
            .iter()
            .map(|(e, f)| (e.as_str(), f.as_str()))
            .collect();
        group_ids.push(b.group(&pairs));
    }

    for s in &source.stems {
        let Some(&group) = group_ids.get(s.group as usize) else {
            bail!("stem {} references unknown group {}", s.stem, s.group);
        };
        let mut compound_flags = 0;
        if s.compound.contains('l') {
            compound_flags |= COMPOUND_LEAD;
        }
        if s.compound.contains('t') {
            compound_flags |= COMPOUND_TAIL;
        }
        b.stem(
            &s.stem,
            StemRecord {
                pos: s.pos,
                ending_group: group,
                stem_class: s.stem_class,
                junction: s.junction,
                stress: s.stress,
                paradigm: s.paradigm,
                compound_flags,
                root: s.root.clone(),
            },
        );
    }

    for s in source.suffixes {
        let mut groups = Vec::with_capacity(s.groups.len());
        for g in &s.groups {
            let Some(&id) = group_ids.get(*g as usize) else {
                bail!("suffix {} references unknown group {g}", s.suffix);
            };
            groups.push(id);
        }
        b.suffixes.push(SuffixInfo {
            suffix: s.suffix,
            required_stem_class: s.stem_class,
            result_pos: s.pos,
            ending_groups: groups,
        });
    }
    for p in source.prefixes {
        b.prefixes.push(PrefixInfo {
            prefix: p.prefix,
            allowed_stem_class: p.stem_class,
            markers: p.markers,
        });
    }

    b.taboo = source.taboo;
    b.mwe_keys = source.mwe;
    b.bad_stems = source.bad_stems;
    b.bad_suffixes = source.bad_suffixes;
    b.bad_sg_nom = source.bad_sg_nom;
    b.guess_endings = source.guess_endings.into_iter().map(GuessSrc::into_record).collect();
    b.guess_stems = source.guess_stems.into_iter().map(GuessSrc::into_record).collect();

    b.write_all(&args.out)
        .with_context(|| format!("writing {}", args.out.display()))?;
    println!("wrote {}", args.out.display());
    Ok(())
}
