//! Trigram-HMM disambiguation over one sentence.
//!
//! Takes the chain of tokens between sentence markers, computes per-word
//! emission log-probabilities over the tag inventory, runs Viterbi over
//! tag pairs and prunes every word's candidate list down to the single
//! analysis carrying the winning tag. Tag index 0 serves as the sentence
//! boundary on both ends.

use tracing::debug;

use crate::analysis::{Analysis, AnalysisSet};
use crate::flags::Flags;
use crate::tags::UNKNOWN_TAG;
use crate::token::Lyli;
use crate::trigram::{TrigramModel, LOG_ZERO};

/// Beam window in natural-log space. Transitions are skipped from states
/// scoring below the previous column's maximum minus this constant; wide
/// enough that no reachable winner is ever cut.
const PRUNE_WINDOW: f32 = 100.0;

/// Disambiguate one sentence chain in place.
///
/// Every `Lyli::Analysis` in the slice is treated as one word of the
/// sentence; other tokens pass through untouched.
pub fn disambiguate(chain: &mut [Lyli], model: &TrigramModel, flags: &Flags) {
    let word_idx: Vec<usize> = chain
        .iter()
        .enumerate()
        .filter(|(_, l)| l.is_analysis())
        .map(|(i, _)| i)
        .collect();
    let n_words = word_idx.len();
    if n_words == 0 {
        return;
    }
    let n_tags = model.tag_count();

    // Emission matrix: one row of tag log-probs per word.
    let mut emissions: Vec<Vec<f32>> = Vec::with_capacity(n_words);
    for &idx in &word_idx {
        let set = chain[idx].analysis_mut().unwrap_or_else(|| unreachable!());
        ensure_candidates(set);
        emissions.push(emission_row(set, model, flags));
    }

    // Viterbi over (previous, current) tag pairs, parity-buffered.
    let plane = n_tags * n_tags;
    let mut a = vec![LOG_ZERO; 2 * plane];
    let mut back = vec![0u8; n_words * plane];
    a[0] = 0.0; // a[parity 0][boundary][boundary]
    let mut column_max = 0.0f32;
    let mut parity = 0usize;

    for (i, row) in emissions.iter().enumerate() {
        let cur = parity;
        let next = 1 - parity;
        a[next * plane..(next + 1) * plane].fill(LOG_ZERO);
        let mut new_max = LOG_ZERO;

        for (l, &sprob) in row.iter().enumerate() {
            if sprob == LOG_ZERO {
                continue;
            }
            for j in 0..n_tags {
                for k in 0..n_tags {
                    let prev = a[cur * plane + j * n_tags + k];
                    if prev < column_max - PRUNE_WINDOW {
                        continue;
                    }
                    let prob = prev + model.trigram(l as u8, j as u8, k as u8) + sprob;
                    let cell = next * plane + k * n_tags + l;
                    if prob > a[cell] {
                        a[cell] = prob;
                        back[i * plane + k * n_tags + l] = j as u8;
                        if prob > new_max {
                            new_max = prob;
                        }
                    }
                }
            }
        }
        column_max = new_max;
        parity = next;
    }

    // Close the sentence against the boundary tag and pick the best pair.
    let mut best = LOG_ZERO;
    let mut bi = 1usize;
    let mut bj = 1usize;
    for i in 0..n_tags {
        for j in 0..n_tags {
            let prob = a[parity * plane + i * n_tags + j] + model.trigram(0, i as u8, j as u8);
            if prob > best {
                best = prob;
                bi = i;
                bj = j;
            }
        }
    }

    // Walk the back-pointers right to left.
    let mut winners: Vec<u8> = vec![0; n_words];
    for i in (0..n_words).rev() {
        winners[i] = bj as u8;
        let prev = back[i * plane + bi * n_tags + bj];
        bj = bi;
        bi = prev as usize;
    }

    // Prune each word to the single analysis with the winning tag.
    for (w, &idx) in word_idx.iter().enumerate() {
        let set = chain[idx].analysis_mut().unwrap_or_else(|| unreachable!());
        let winner = model.tag(winners[w]).to_string();
        let had: Vec<Analysis> = set.analyses.clone();
        set.analyses.retain(|a| a.tag.as_deref() == Some(winner.as_str()));
        if set.analyses.is_empty() {
            debug!(word = %set.word, tag = %winner, "winning tag absent, keeping candidates");
            set.analyses = had;
        }
        set.sort_unique();
        set.analyses.truncate(1);
    }
}

/// Give an empty candidate list its synthetic unknown analysis.
fn ensure_candidates(set: &mut AnalysisSet) {
    if set.analyses.is_empty() {
        let mut a = Analysis::new(set.word.clone(), "0", "", "T", "");
        a.tag = Some(UNKNOWN_TAG.to_string());
        set.analyses.push(a);
    }
}

/// Emission log-probabilities for one word over the whole tag inventory.
fn emission_row(set: &mut AnalysisSet, model: &TrigramModel, flags: &Flags) -> Vec<f32> {
    let n_tags = model.tag_count();
    let mut row = vec![LOG_ZERO; n_tags];

    // The emission lexicon stores multi-word forms with underscores and
    // no markup.
    let mut form = set.word.clone();
    if flags.xml_input {
        form = strip_markup(&form);
    }
    let form = form.replace(' ', "_");

    if !flags.disambiguation_no_lex {
        if let Some(lex) = model.lexical(&form) {
            // Lexical probabilities apply only when every lexicon tag is
            // among the morphological candidates.
            let subset = lex.iter().all(|(tag_idx, _)| {
                let tag = model.tag(*tag_idx);
                set.analyses.iter().any(|a| a.tag.as_deref() == Some(tag))
            });
            if subset {
                for (tag_idx, p) in lex {
                    row[*tag_idx as usize] = *p;
                }
                return row;
            }
        }
    }

    // Candidate tag indices known to the model; unknown candidates are
    // rewritten to X so the word always has a usable distribution.
    let mut indices = candidate_indices(set, model);
    if indices.is_empty() {
        let x = UNKNOWN_TAG.to_string();
        for a in &mut set.analyses {
            a.tag = Some(x.clone());
        }
        indices = candidate_indices(set, model);
    }
    indices.sort_unstable();
    indices.dedup();

    if !flags.disambiguation_no_classes {
        if let Some(class) = model.ambiguity_class(&indices) {
            for (tag_idx, p) in class {
                row[*tag_idx as usize] = *p;
            }
            return row;
        }
    }

    if flags.disambiguation_freq_fallback {
        let total: f64 = indices.iter().map(|&t| model.unigram_count(t) as f64).sum();
        if total > 0.0 {
            for &t in &indices {
                let count = model.unigram_count(t) as f64;
                if count > 0.0 {
                    row[t as usize] = (count / total).ln() as f32;
                }
            }
            return row;
        }
    }

    let uniform = (1.0 / indices.len() as f64).ln() as f32;
    for &t in &indices {
        row[t as usize] = uniform;
    }
    row
}

fn candidate_indices(set: &AnalysisSet, model: &TrigramModel) -> Vec<u8> {
    set.analyses
        .iter()
        .filter_map(|a| a.tag.as_deref())
        .filter_map(|t| model.tag_index(t))
        .collect()
}

/// Remove `<...>` spans from a surface form.
fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Provenance;
    use crate::trigram::TrigramModelBuilder;

    fn model() -> TrigramModel {
        let mut b = TrigramModelBuilder::new();
        for t in ["PP3SN", "VON", "NCSA", "NCSN", "WCP", "X"] {
            b.tag(t);
        }
        b.unigram_count("PP3SN", 50)
            .unigram_count("VON", 90)
            .unigram_count("NCSA", 40)
            .unigram_count("NCSN", 100)
            .unigram_count("WCP", 70)
            .unigram_count("X", 3)
            // Pronoun opens, verb follows, locative noun, period closes.
            .trigram("PP3SN", "###", "###", -0.5)
            .trigram("NCSN", "###", "###", -1.5)
            .trigram("VON", "###", "PP3SN", -0.4)
            .trigram("VON", "###", "NCSN", -2.0)
            .trigram("NCSA", "PP3SN", "VON", -0.6)
            .trigram("NCSN", "PP3SN", "VON", -1.8)
            .trigram("WCP", "VON", "NCSA", -0.3)
            .trigram("WCP", "VON", "NCSN", -1.2)
            .trigram("###", "NCSA", "WCP", -0.2)
            .trigram("###", "NCSN", "WCP", -0.9);
        TrigramModel::from_bytes(&b.to_bytes()).unwrap()
    }

    fn word(text: &str, candidates: &[(&str, &str, &str)]) -> Lyli {
        let mut set = AnalysisSet::empty(text);
        for (root, pos, tag) in candidates {
            let mut a = Analysis::new(*root, "0", "", *pos, "sg n,");
            a.tag = Some(tag.to_string());
            set.analyses.push(a);
        }
        set.provenance = Provenance::MainDict;
        Lyli::Analysis(set)
    }

    #[test]
    fn picks_context_appropriate_tags() {
        let m = model();
        let mut chain = vec![
            Lyli::tag("<s>"),
            word("Ta", &[("tema", "P", "PP3SN"), ("ta", "S", "NCSN")]),
            word("on", &[("ole", "V", "VON")]),
            word("kodus", &[("kodu", "S", "NCSA"), ("kodu", "S", "NCSN")]),
            word(".", &[(".", "Z", "WCP")]),
            Lyli::tag("</s>"),
        ];
        disambiguate(&mut chain, &m, &Flags::default());
        let tags: Vec<String> = chain
            .iter()
            .filter_map(|l| l.analysis())
            .map(|s| s.analyses[0].tag.clone().unwrap())
            .collect();
        assert_eq!(tags, vec!["PP3SN", "VON", "NCSA", "WCP"]);
    }

    #[test]
    fn every_word_keeps_exactly_one_analysis() {
        let m = model();
        let mut chain = vec![
            word("Ta", &[("tema", "P", "PP3SN"), ("ta", "S", "NCSN")]),
            word("on", &[("ole", "V", "VON")]),
        ];
        disambiguate(&mut chain, &m, &Flags::default());
        for l in &chain {
            assert_eq!(l.analysis().unwrap().analyses.len(), 1);
        }
    }

    #[test]
    fn empty_candidate_list_gets_unknown_analysis() {
        let m = model();
        let mut chain = vec![
            word("on", &[("ole", "V", "VON")]),
            Lyli::Analysis(AnalysisSet::empty("qwzx")),
        ];
        disambiguate(&mut chain, &m, &Flags::default());
        let set = chain[1].analysis().unwrap();
        assert_eq!(set.analyses.len(), 1);
        assert_eq!(set.analyses[0].pos, "T");
        assert_eq!(set.analyses[0].tag.as_deref(), Some("X"));
    }

    #[test]
    fn unknown_candidate_tags_become_x() {
        let m = model();
        let mut chain = vec![word("blarg", &[("blarg", "S", "NOSUCH")])];
        disambiguate(&mut chain, &m, &Flags::default());
        let set = chain[0].analysis().unwrap();
        assert_eq!(set.analyses[0].tag.as_deref(), Some("X"));
    }

    #[test]
    fn no_lex_flag_bypasses_lexical_probs() {
        let mut b = TrigramModelBuilder::new();
        b.tag("NCSN");
        b.tag("VM3");
        b.tag("X");
        // The lexicon strongly prefers VM3 but candidates say NCSN only,
        // so the subset check already rejects it; with the flag off the
        // path is not even consulted.
        b.lexical("peeti", &[("VM3", -0.01)]);
        b.trigram("NCSN", "###", "###", -0.5);
        b.trigram("###", "###", "NCSN", -0.5);
        let m = TrigramModel::from_bytes(&b.to_bytes()).unwrap();

        let flags = Flags { disambiguation_no_lex: true, ..Flags::default() };
        let mut chain = vec![word("peeti", &[("peet", "S", "NCSN")])];
        disambiguate(&mut chain, &m, &flags);
        assert_eq!(
            chain[0].analysis().unwrap().analyses[0].tag.as_deref(),
            Some("NCSN")
        );
    }

    #[test]
    fn markup_is_stripped_from_emission_forms() {
        assert_eq!(strip_markup("a<b>c</b>d"), "acd");
        assert_eq!(strip_markup("plain"), "plain");
    }

    #[test]
    fn determinism_same_input_same_output() {
        let m = model();
        let make = || {
            vec![
                word("Ta", &[("tema", "P", "PP3SN"), ("ta", "S", "NCSN")]),
                word("on", &[("ole", "V", "VON")]),
                word("kodus", &[("kodu", "S", "NCSA"), ("kodu", "S", "NCSN")]),
            ]
        };
        let mut c1 = make();
        let mut c2 = make();
        disambiguate(&mut c1, &m, &Flags::default());
        disambiguate(&mut c2, &m, &Flags::default());
        assert_eq!(c1, c2);
    }
}
