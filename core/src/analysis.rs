//! Morphological analysis records.
//!
//! An [`Analysis`] is one plausible parse of a word form; an
//! [`AnalysisSet`] carries the word, its candidate list and bookkeeping
//! (provenance, multi-word span, reversed verb order). Candidates are
//! plain values owned by the set's vector; dictionary data is referenced
//! by index only, so no candidate chain ever owns a pointer graph.
//!
//! The text serialization is the fixed grammar
//!
//! ```text
//! kassgi
//!     kass+0gi //_S_ sg n, //
//! ```
//!
//! one candidate per line after a header line with the surface word, an
//! optional `//TAG//` field before the `_P_` part-of-speech, and `####`
//! for a word with no candidates. [`parse_set`] round-trips the output of
//! [`AnalysisSet::serialize`].

use std::cmp::Ordering;
use std::fmt::Write as _;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// Compound-boundary marker inside a stem.
pub const COMPOUND_SEP: char = '=';

/// Compound-like boundary marker (e.g. multi-word lemmas keep `_`).
pub const WEAK_SEP: char = '_';

/// The zero ending.
pub const ZERO_ENDING: &str = "0";

/// One morphological reading of a word form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Analysis {
    /// Stem, possibly with `=`/`_` junction markers and phonetic marks.
    pub root: String,
    /// Inflectional ending, `"0"` for the zero ending.
    pub ending: String,
    /// `""`, `"ki"` or `"gi"`.
    pub clitic: String,
    /// Single-character part of speech (`S`, `V`, `H`, …).
    pub pos: String,
    /// Comma-separated grammatical feature codes, e.g. `"sg n,"`.
    pub form: String,
    /// Dictionary headword, when requested.
    pub lemma: Option<String>,
    /// Compact disambiguation tag, when requested.
    pub tag: Option<String>,
}

impl Analysis {
    /// Build a plain analysis without lemma or tag.
    pub fn new(
        root: impl Into<String>,
        ending: impl Into<String>,
        clitic: impl Into<String>,
        pos: impl Into<String>,
        form: impl Into<String>,
    ) -> Self {
        Analysis {
            root: root.into(),
            ending: ending.into(),
            clitic: clitic.into(),
            pos: pos.into(),
            form: form.into(),
            lemma: None,
            tag: None,
        }
    }

    /// Number of compound boundaries in the root.
    pub fn compound_boundaries(&self) -> usize {
        self.root.chars().filter(|&c| c == COMPOUND_SEP).count()
    }

    /// The stem after the last compound boundary.
    pub fn final_stem(&self) -> &str {
        match self.root.rfind(COMPOUND_SEP) {
            Some(i) => &self.root[i + COMPOUND_SEP.len_utf8()..],
            None => &self.root,
        }
    }

    /// Root with junction and phonetic markup removed.
    pub fn plain_root(&self) -> String {
        self.root
            .chars()
            .filter(|c| !matches!(c, '=' | '?' | '<' | ']' | '~'))
            .collect()
    }

    /// Canonical ordering: fewest compound boundaries, then longest
    /// final stem. Candidates tied on both keep the order they were
    /// generated in (dictionary order), so the sort must stay stable.
    fn sort_key_cmp(&self, other: &Analysis) -> Ordering {
        self.compound_boundaries()
            .cmp(&other.compound_boundaries())
            .then_with(|| {
                other
                    .final_stem()
                    .chars()
                    .count()
                    .cmp(&self.final_stem().chars().count())
            })
    }

    /// Render one candidate line without the leading indentation.
    fn render(&self) -> String {
        let mut line = String::new();
        let _ = write!(line, "{}+{}{} //", self.root, self.ending, self.clitic);
        if let Some(tag) = &self.tag {
            let _ = write!(line, "{tag}//");
        }
        let _ = write!(line, "_{}_ {} //", self.pos, self.form);
        line
    }
}

/// Where the candidate set of a word came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    /// No analysis attempted or nothing found.
    None,
    /// Main dictionary.
    MainDict,
    /// User dictionary.
    UserDict,
    /// Out-of-vocabulary guesser.
    Guesser,
    /// Tag-only pass-through (e.g. markup under the XML flag).
    TagOnly,
}

/// All candidate analyses of one input word (or merged expression).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSet {
    /// Surface form as seen in the input (multi-word forms keep spaces).
    pub word: String,
    /// Candidate readings; empty means "no result".
    pub analyses: Vec<Analysis>,
    /// Which component produced the candidates.
    pub provenance: Provenance,
    /// How many input tokens this set consumed (≥ 1; > 1 for multi-word).
    pub span_count: usize,
    /// Verb expressions stored particle-first set this when the surface
    /// order was the other way round.
    pub reversed: bool,
    /// Set by the proper-name pass for words in a position that behaves
    /// like a sentence start (e.g. after direct speech).
    pub sentence_initial: bool,
}

impl AnalysisSet {
    /// Empty set for a word.
    pub fn empty(word: impl Into<String>) -> Self {
        AnalysisSet {
            word: word.into(),
            analyses: Vec::new(),
            provenance: Provenance::None,
            span_count: 1,
            reversed: false,
            sentence_initial: false,
        }
    }

    /// Set with candidates and a provenance code.
    pub fn with(word: impl Into<String>, analyses: Vec<Analysis>, provenance: Provenance) -> Self {
        AnalysisSet {
            word: word.into(),
            analyses,
            provenance,
            span_count: 1,
            reversed: false,
            sentence_initial: false,
        }
    }

    /// True when at least one candidate exists.
    pub fn has_result(&self) -> bool {
        !self.analyses.is_empty()
    }

    /// Sort into canonical order and drop exact duplicates, keeping the
    /// first occurrence of each.
    pub fn sort_unique(&mut self) {
        self.analyses.sort_by(|a, b| a.sort_key_cmp(b));
        let mut seen: AHashSet<Analysis> = AHashSet::with_capacity(self.analyses.len());
        self.analyses.retain(|a| seen.insert(a.clone()));
    }

    /// Push a candidate unless an identical one is already present.
    pub fn push_unique(&mut self, analysis: Analysis) {
        if !self.analyses.contains(&analysis) {
            self.analyses.push(analysis);
        }
    }

    /// Fill each candidate's lemma from its root and ending class.
    ///
    /// The lemma is the markup-free root; verbs get the `ma` infinitive
    /// marker appended.
    pub fn fill_lemmas(&mut self) {
        for a in &mut self.analyses {
            let mut lemma = a.plain_root();
            if a.pos == "V" && !lemma.ends_with("ma") {
                lemma.push_str("ma");
            }
            a.lemma = Some(lemma);
        }
    }

    /// Serialize: header line plus one indented line per candidate, or
    /// `    ####` when empty. `one_line` joins everything on the header
    /// line instead.
    pub fn serialize(&self, one_line: bool) -> String {
        let mut out = String::new();
        out.push_str(&self.word);
        if one_line {
            if self.analyses.is_empty() {
                out.push_str("    ####");
            } else {
                for a in &self.analyses {
                    out.push_str("    ");
                    out.push_str(&a.render());
                }
            }
            out.push('\n');
            return out;
        }
        out.push('\n');
        if self.analyses.is_empty() {
            out.push_str("    ####\n");
        } else {
            for a in &self.analyses {
                out.push_str("    ");
                out.push_str(&a.render());
                out.push('\n');
            }
        }
        out
    }
}

/// Parse one candidate line (indentation already stripped).
///
/// Returns `None` for the `####` no-result marker and malformed lines.
pub fn parse_line(line: &str) -> Option<Analysis> {
    let line = line.trim();
    if line == "####" || line.is_empty() {
        return None;
    }
    // root+ending[clitic] //[TAG//]_P_ form //
    let (head, rest) = line.split_once(" //")?;
    let plus = head.rfind('+')?;
    let root = head[..plus].to_string();
    let mut ending = head[plus + 1..].to_string();
    let mut clitic = String::new();
    for suffix in ["ki", "gi"] {
        if ending.len() > suffix.len() && ending.ends_with(suffix) {
            clitic = suffix.to_string();
            ending.truncate(ending.len() - suffix.len());
            break;
        }
    }
    let mut rest = rest.trim_start();
    let mut tag = None;
    if !rest.starts_with('_') {
        let (t, r) = rest.split_once("//")?;
        tag = Some(t.to_string());
        rest = r;
    }
    // _P_ form //
    let rest = rest.strip_prefix('_')?;
    let (pos, rest) = rest.split_once('_')?;
    let form = rest.trim_end_matches("//").trim();
    let mut a = Analysis::new(root, ending, clitic, pos, form);
    a.tag = tag;
    Some(a)
}

/// Parse a serialized block back into a set (header word + candidates).
pub fn parse_set(text: &str) -> Option<AnalysisSet> {
    let mut lines = text.lines();
    let word = lines.next()?.trim_end();
    if word.is_empty() {
        return None;
    }
    let mut set = AnalysisSet::empty(word);
    for line in lines {
        if let Some(a) = parse_line(line) {
            set.analyses.push(a);
        }
    }
    if set.has_result() {
        set.provenance = Provenance::MainDict;
    }
    Some(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_matches_reference_shape() {
        let mut set = AnalysisSet::empty("peeti");
        set.analyses.push(Analysis::new("peet", "0", "", "S", "adt, sg p,"));
        set.analyses.push(Analysis::new("pida", "ti", "", "V", "ti,"));
        let text = set.serialize(false);
        assert_eq!(
            text,
            "peeti\n    peet+0 //_S_ adt, sg p, //\n    pida+ti //_V_ ti, //\n"
        );
    }

    #[test]
    fn no_result_serializes_as_hashes() {
        let set = AnalysisSet::empty("qwrtp");
        assert_eq!(set.serialize(false), "qwrtp\n    ####\n");
    }

    #[test]
    fn round_trip_with_clitic_and_tag() {
        let mut a = Analysis::new("maja", "0", "gi", "S", "sg n,");
        a.tag = Some("NCSN".into());
        let mut set = AnalysisSet::empty("majagi");
        set.analyses.push(a.clone());
        let parsed = parse_set(&set.serialize(false)).unwrap();
        assert_eq!(parsed.word, "majagi");
        assert_eq!(parsed.analyses, vec![a]);
    }

    #[test]
    fn round_trip_zero_ending_without_tag() {
        let a = Analysis::new("kass", "0", "", "S", "sg n,");
        let mut set = AnalysisSet::empty("kass");
        set.analyses.push(a.clone());
        let parsed = parse_set(&set.serialize(false)).unwrap();
        assert_eq!(parsed.analyses, vec![a]);
    }

    #[test]
    fn canonical_order_prefers_fewer_compounds_then_longer_stem() {
        let mut set = AnalysisSet::empty("x");
        set.analyses.push(Analysis::new("va=rinne", "0", "", "S", "sg n,"));
        set.analyses.push(Analysis::new("varinne", "0", "", "S", "sg n,"));
        set.analyses.push(Analysis::new("varin", "ne", "", "S", "sg n,"));
        set.sort_unique();
        assert_eq!(set.analyses[0].root, "varinne");
        assert_eq!(set.analyses[1].root, "varin");
        assert_eq!(set.analyses[2].root, "va=rinne");
    }

    #[test]
    fn sort_unique_merges_duplicates() {
        let mut set = AnalysisSet::empty("x");
        let a = Analysis::new("kass", "0", "", "S", "sg n,");
        set.analyses.push(a.clone());
        set.analyses.push(a);
        set.sort_unique();
        assert_eq!(set.analyses.len(), 1);
    }

    #[test]
    fn full_ties_keep_discovery_order() {
        // Same boundary count, same final-stem length; alphabetical
        // order would put "peet" first, dictionary order must not.
        let mut set = AnalysisSet::empty("peeti");
        set.analyses.push(Analysis::new("pida", "ti", "", "V", "ti,"));
        set.analyses.push(Analysis::new("peet", "0", "", "S", "adt, sg p,"));
        set.sort_unique();
        assert_eq!(set.analyses[0].root, "pida");
        assert_eq!(set.analyses[1].root, "peet");
    }

    #[test]
    fn non_adjacent_duplicates_merge_keeping_first() {
        let dup = Analysis::new("pida", "ti", "", "V", "ti,");
        let mut set = AnalysisSet::empty("peeti");
        set.analyses.push(dup.clone());
        set.analyses.push(Analysis::new("peet", "0", "", "S", "adt, sg p,"));
        set.analyses.push(dup.clone());
        set.sort_unique();
        assert_eq!(set.analyses.len(), 2);
        assert_eq!(set.analyses[0], dup);
    }

    #[test]
    fn final_stem_and_boundaries() {
        let a = Analysis::new("raud=tee", "0", "", "S", "sg n,");
        assert_eq!(a.compound_boundaries(), 1);
        assert_eq!(a.final_stem(), "tee");
        assert_eq!(a.plain_root(), "raudtee");
    }

    #[test]
    fn verb_lemma_gets_ma() {
        let mut set = AnalysisSet::empty("peeti");
        set.analyses.push(Analysis::new("pida", "ti", "", "V", "ti,"));
        set.fill_lemmas();
        assert_eq!(set.analyses[0].lemma.as_deref(), Some("pidama"));
    }
}
