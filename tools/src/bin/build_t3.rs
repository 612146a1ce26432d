//! Compile a JSON trigram-model source into the binary model file.
//!
//! Source format:
//!
//! ```json
//! {
//!   "unigrams": { "NCSN": 100, "VON": 90 },
//!   "trigrams": [ ["NCSN", "###", "###", -0.4] ],
//!   "lexicon":  { "on": [["VON", -0.1]] },
//!   "classes":  [ [["NCSN", -0.6], ["VM3", -0.9]] ]
//! }
//! ```
//!
//! The boundary tag `###` owns index 0; the `X` tag is added when the
//! source leaves it out.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use etmorf_core::TrigramModelBuilder;

#[derive(Parser, Debug)]
#[command(name = "build_t3", about = "Compile a JSON trigram model into et3.dct")]
struct Args {
    /// JSON source file
    source: PathBuf,
    /// Output model path
    #[arg(short, long, default_value = "et3.dct")]
    out: PathBuf,
}

#[derive(Deserialize)]
struct Source {
    /// Tag -> corpus count; ordered map so tag indices are stable.
    unigrams: BTreeMap<String, u32>,
    #[serde(default)]
    trigrams: Vec<(String, String, String, f32)>,
    #[serde(default)]
    lexicon: BTreeMap<String, Vec<(String, f32)>>,
    #[serde(default)]
    classes: Vec<Vec<(String, f32)>>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let text = std::fs::read_to_string(&args.source)
        .with_context(|| format!("reading {}", args.source.display()))?;
    let source: Source = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", args.source.display()))?;

    let mut b = TrigramModelBuilder::new();
    for (tag, count) in &source.unigrams {
        b.unigram_count(tag, *count);
    }
    b.tag("X");
    for (t3, t1, t2, p) in &source.trigrams {
        b.trigram(t3, t1, t2, *p);
    }
    for (form, probs) in &source.lexicon {
        let probs: Vec<(&str, f32)> = probs.iter().map(|(t, p)| (t.as_str(), *p)).collect();
        b.lexical(form, &probs);
    }
    for class in &source.classes {
        let probs: Vec<(&str, f32)> = class.iter().map(|(t, p)| (t.as_str(), *p)).collect();
        b.class(&probs);
    }

    b.write_all(&args.out)
        .with_context(|| format!("writing {}", args.out.display()))?;
    println!("wrote {}", args.out.display());
    Ok(())
}
