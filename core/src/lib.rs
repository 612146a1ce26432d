//! etmorf-core
//!
//! Core dictionary, analyzer, guesser, synthesizer, speller and trigram
//! disambiguator for Estonian morphology, shared by the `etmorf` pipeline
//! crate and the offline tools.
//!
//! Public API:
//! - `Dictionary` / `DictionaryBuilder` - binary dictionary read/write
//! - `Analysis` / `AnalysisSet` - candidate readings of a word form
//! - `Pipeline` - token stream in, analyzed (optionally disambiguated)
//!   stream out
//! - `TrigramModel` / `TrigramModelBuilder` - disambiguation model I/O
//! - `Synthesizer`, `speller`, `syllable` - the further consumers of the
//!   same tables
//! - `Flags` - named behavior switches with TOML round-trip

pub mod analysis;
pub use analysis::{parse_line, parse_set, Analysis, AnalysisSet, Provenance};

pub mod analyzer;
pub use analyzer::{analyze, try_mwe};

pub mod chars;

pub mod dictionary;
pub use dictionary::{Dictionary, DictionaryBuilder, GuessRecord, PrefixInfo, StemRecord, SuffixInfo};

pub mod disambiguator;
pub use disambiguator::disambiguate;

pub mod error;
pub use error::{BadDictionaryReason, BadInputReason, EtmorfError, Result};

pub mod flags;
pub use flags::{Flags, STEMLEN};

pub mod guesser;
pub use guesser::guess;

pub mod lexicon;
pub use lexicon::Compat;

pub mod pipeline;
pub use pipeline::Pipeline;

pub mod propername;

pub mod speller;

pub mod syllable;
pub use syllable::{syllabify, Syllable};

pub mod synth;
pub use synth::Synthesizer;

pub mod tags;

pub mod token;
pub use token::{Lyli, TagKind};

pub mod trigram;
pub use trigram::{TrigramModel, TrigramModelBuilder};

pub mod userdict;
pub use userdict::UserDict;

/// Utility helpers shared by the binaries.
pub mod utils {
    use unicode_normalization::UnicodeNormalization;

    /// Normalize input strings (NFC) and trim whitespace.
    pub fn normalize(s: &str) -> String {
        s.nfc().collect::<String>().trim().to_string()
    }
}
