//! Caller-visible configuration flags.
//!
//! One struct of named booleans selects the pipeline behavior: what to
//! run (analysis, generation, disambiguation), how the analyzer treats
//! compounds, guesses, proper names and special tokens, and how output is
//! rendered. Serializable to and from TOML so a configuration can ship
//! next to the dictionaries.

use serde::{Deserialize, Serialize};

/// Longest word (in scalar values) the analyzer accepts under
/// [`Flags::strict_length`].
pub const STEMLEN: usize = 64;

/// Behavior switches for a pipeline instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flags {
    /// Run morphological analysis.
    pub analyze: bool,
    /// Run the synthesizer instead of the analyzer.
    pub generate: bool,
    /// Invoke the guesser for words the dictionaries do not know.
    pub guess: bool,
    /// Add proper-name analyses to capitalized words in sentence context.
    pub propername_inject: bool,
    /// Keep phonetic/stress markup in output stems.
    pub stem_phonetic_markup: bool,
    /// Attempt compound-word decomposition.
    pub split_compounds: bool,
    /// Output only the lemma, not the full analysis.
    pub lemma_only: bool,
    /// Attach dictionary headwords to every analysis.
    pub add_lemmas: bool,
    /// Keep only the first (best) analysis per word.
    pub first_only: bool,
    /// Reject words longer than [`STEMLEN`] outright.
    pub strict_length: bool,
    /// Strict abbreviation handling.
    pub strict_abbrev: bool,
    /// Strict proper-name handling.
    pub strict_name: bool,
    /// Let taboo lemmas through.
    pub allow_taboo: bool,
    /// Disable derivation inside compounds.
    pub no_compound_derivation: bool,
    /// Recognize roman numerals as ordinals.
    pub allow_roman: bool,
    /// Recognize URL- and e-mail-like tokens as abbreviations.
    pub allow_urls: bool,
    /// Run the trigram disambiguator over complete sentences.
    pub disambiguate: bool,
    /// Pass `<ignoreeri>` blocks through untouched.
    pub ignore_blocks: bool,
    /// Pass `<...>` tokens through as tags.
    pub ignore_tags: bool,
    /// Input is XML: tags pass through, words outside `<s>` are not
    /// analyzed, markup is stripped before lookup.
    pub xml_input: bool,
    /// Split tokens on commas before analysis.
    pub split_on_comma: bool,
    /// Merge multi-word expressions into one analysis token.
    pub merge_mwe: bool,
    /// Never use learned ambiguity classes.
    pub disambiguation_no_classes: bool,
    /// Never use lexical emission probabilities.
    pub disambiguation_no_lex: bool,
    /// Fallback emission by tag frequency instead of the uniform one.
    pub disambiguation_freq_fallback: bool,
    /// Attach compact disambiguation tags to analyses.
    pub tag_with_dtag: bool,
    /// Serialize each word's analyses on a single line.
    pub one_line_output: bool,
    /// Capacity of the per-pipeline analysis cache.
    pub cache_capacity: usize,
}

impl Default for Flags {
    fn default() -> Self {
        Flags {
            analyze: true,
            generate: false,
            guess: true,
            propername_inject: false,
            stem_phonetic_markup: false,
            split_compounds: true,
            lemma_only: false,
            add_lemmas: false,
            first_only: false,
            strict_length: false,
            strict_abbrev: false,
            strict_name: false,
            allow_taboo: false,
            no_compound_derivation: false,
            allow_roman: false,
            allow_urls: false,
            disambiguate: false,
            ignore_blocks: false,
            ignore_tags: false,
            xml_input: false,
            split_on_comma: false,
            merge_mwe: false,
            disambiguation_no_classes: false,
            disambiguation_no_lex: false,
            disambiguation_freq_fallback: false,
            tag_with_dtag: false,
            one_line_output: false,
            cache_capacity: 1000,
        }
    }
}

impl Flags {
    /// The analyze+guess+compounds configuration most callers start from.
    pub fn analyzer() -> Self {
        Flags::default()
    }

    /// Configuration for the full analyze-then-disambiguate pipeline.
    pub fn disambiguator() -> Self {
        Flags {
            disambiguate: true,
            tag_with_dtag: true,
            propername_inject: true,
            merge_mwe: true,
            ..Flags::default()
        }
    }

    /// Load flags from a TOML file.
    pub fn load_toml(path: impl AsRef<std::path::Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save flags to a TOML file.
    pub fn save_toml(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Parse flags from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize flags to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_run_the_analyzer() {
        let f = Flags::default();
        assert!(f.analyze);
        assert!(f.guess);
        assert!(f.split_compounds);
        assert!(!f.disambiguate);
    }

    #[test]
    fn toml_round_trip() {
        let mut f = Flags::disambiguator();
        f.allow_roman = true;
        let text = f.to_toml_string().unwrap();
        let back = Flags::from_toml_str(&text).unwrap();
        assert_eq!(f, back);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let f = Flags::from_toml_str("disambiguate = true\n").unwrap();
        assert!(f.disambiguate);
        assert!(f.analyze);
        assert_eq!(f.cache_capacity, 1000);
    }
}
