//! Morphological analyzer.
//!
//! Decomposes a word into every lawful
//! `prefix · stem(·join·stem)* · suffix · ending [· clitic]` chain the
//! dictionary supports and turns each into a candidate [`Analysis`].
//! Compounds are found by recursive left-segmentation; a clitic is split
//! off and re-attached only when its phonological environment allows it;
//! special token classes (punctuation, numbers, roman numerals, web
//! addresses) short-circuit the decomposition search.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::analysis::{Analysis, AnalysisSet, Provenance, ZERO_ENDING};
use crate::chars;
use crate::dictionary::{Dictionary, StemRecord, SuffixInfo};
use crate::flags::{Flags, STEMLEN};
use crate::lexicon::Compat;

/// Web addresses and e-mail-like tokens, tagged `Y` under `allow_urls`.
static URL_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:https?://\S+|www\.\S+|\S+@\S+\.\S+|\S+\.(?:ee|com|org|net|info)(?:/\S*)?)$")
        .unwrap_or_else(|e| panic!("url regex: {e}"))
});

/// Most components a compound decomposition may have.
const MAX_COMPOUND_PARTS: usize = 3;

/// Analyze one word against the main dictionary.
pub fn analyze(dict: &Dictionary, word: &str, flags: &Flags) -> AnalysisSet {
    let mut set = AnalysisSet::empty(word);
    if word.is_empty() {
        return set;
    }
    if flags.strict_length && word.chars().count() > STEMLEN {
        trace!(word, "word too long");
        return set;
    }

    if let Some(special) = classify_special(word, flags) {
        return special;
    }

    // Probe sequence over casing/trim variants; first hit wins.
    let lowered = chars::lowercase(word);
    let trimmed = chars::strip_outer_punct(word);
    let mut variants: Vec<String> = vec![lowered.clone()];
    if trimmed != word && !trimmed.is_empty() {
        variants.push(chars::lowercase(trimmed));
    }
    for variant in variants {
        let mut analyses = decompose_with_clitic(dict, &variant, flags);
        if analyses.is_empty() {
            continue;
        }
        if chars::starts_upper(word) {
            for a in &mut analyses {
                if a.pos == "H" {
                    a.root = chars::capitalize_first(&a.root);
                }
            }
        }
        set.analyses = analyses;
        set.provenance = Provenance::MainDict;
        break;
    }

    finish(&mut set, flags);
    set
}

/// Non-word token classes handled without the dictionary.
fn classify_special(word: &str, flags: &Flags) -> Option<AnalysisSet> {
    let mut set = AnalysisSet::empty(word);
    if chars::all_in(word, chars::PUNCT) {
        set.analyses.push(Analysis::new(word, ZERO_ENDING, "", "Z", ""));
        set.provenance = Provenance::MainDict;
        return Some(set);
    }
    if word.chars().any(|c| c.is_ascii_digit()) && chars::all_in(word, "0123456789.,:-%") {
        set.analyses.push(Analysis::new(word, ZERO_ENDING, "", "N", "?,"));
        set.provenance = Provenance::MainDict;
        return Some(set);
    }
    if flags.allow_roman && chars::is_roman_numeral(word) {
        set.analyses.push(Analysis::new(word, ZERO_ENDING, "", "O", "?,"));
        set.provenance = Provenance::MainDict;
        return Some(set);
    }
    if flags.allow_urls && URL_LIKE.is_match(word) {
        set.analyses.push(Analysis::new(word, ZERO_ENDING, "", "Y", "?,"));
        set.provenance = Provenance::MainDict;
        return Some(set);
    }
    None
}

/// Decompose, retrying without a lawful trailing clitic.
fn decompose_with_clitic(dict: &Dictionary, word: &str, flags: &Flags) -> Vec<Analysis> {
    let direct = decompose(dict, word, flags);
    if !direct.is_empty() {
        return direct;
    }
    if let Some((base, clitic)) = split_clitic(word) {
        let mut analyses = decompose(dict, base, flags);
        for a in &mut analyses {
            a.clitic = clitic.to_string();
        }
        return analyses;
    }
    Vec::new()
}

/// Split a trailing `ki`/`gi` when the environment allows it.
///
/// `ki` is lawful after a voiceless final, `gi` after a voiced one; both
/// attach after `š`/`ž`.
pub fn split_clitic(word: &str) -> Option<(&str, &str)> {
    let clitic = if word.len() > 2 && (word.ends_with("ki") || word.ends_with("gi")) {
        &word[word.len() - 2..]
    } else {
        return None;
    };
    let base = &word[..word.len() - 2];
    let last = base.chars().last()?;
    let lawful = if chars::is_sibilant_caron(last) {
        true
    } else if clitic == "ki" {
        chars::is_voiceless(last)
    } else {
        !chars::is_voiceless(last)
    };
    lawful.then_some((base, clitic))
}

/// All lawful decompositions of a lowercase word.
fn decompose(dict: &Dictionary, word: &str, flags: &Flags) -> Vec<Analysis> {
    let mut out: Vec<Analysis> = Vec::new();

    // Empty prefix first, then every dictionary prefix that matches.
    let mut prefix_splits: Vec<(&str, &str)> = vec![("", word)];
    for p in &dict.prefixes {
        if let Some(rest) = word.strip_prefix(p.prefix.as_str()) {
            if !rest.is_empty() {
                prefix_splits.push((p.prefix.as_str(), rest));
            }
        }
    }

    for (prefix, body) in prefix_splits {
        let body_chars: Vec<(usize, char)> = body.char_indices().collect();
        // Longest stem first so canonical order falls out of the sort.
        for ci in (1..=body_chars.len()).rev() {
            let stem_end = body_chars
                .get(ci)
                .map(|(o, _)| *o)
                .unwrap_or(body.len());
            let stem_part = &body[..stem_end];
            let tail = &body[stem_end..];

            for (root, record, parts) in stem_candidates(dict, stem_part, flags, 1) {
                if !prefix.is_empty() {
                    match dict.prefix_info(prefix) {
                        Some(info)
                            if info.allowed_stem_class == 0
                                || info.allowed_stem_class == record.stem_class => {}
                        _ => continue,
                    }
                }
                for split in tail_splits(dict, tail) {
                    match split {
                        TailSplit::Plain(ending) => {
                            if dict.ending_compat(&record, &ending) == Compat::No {
                                continue;
                            }
                            for form in dict.forms_for(record.ending_group, &ending) {
                                let root = decorate_root(dict, prefix, &root, &record, flags);
                                out.push(Analysis::new(
                                    root,
                                    ending.clone(),
                                    "",
                                    record.pos.to_string(),
                                    form,
                                ));
                            }
                        }
                        TailSplit::Derived(suffix, ending) => {
                            if flags.no_compound_derivation && parts > 1 {
                                continue;
                            }
                            if suffix.required_stem_class != 0
                                && suffix.required_stem_class != record.stem_class
                            {
                                continue;
                            }
                            for group in &suffix.ending_groups {
                                if !dict.group_has_ending(*group, &ending) {
                                    continue;
                                }
                                for form in dict.forms_for(*group, &ending) {
                                    let base = decorate_root(dict, prefix, &root, &record, flags);
                                    out.push(Analysis::new(
                                        format!("{base}={}", suffix.suffix),
                                        ending.clone(),
                                        "",
                                        suffix.result_pos.to_string(),
                                        form,
                                    ));
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    if !flags.allow_taboo {
        out.retain(|a| !dict.is_taboo(&chars::lowercase(&a.plain_root())));
    }
    out
}

enum TailSplit<'d> {
    /// No suffix; the whole tail is the ending (`"0"` when empty).
    Plain(String),
    /// Derivational suffix plus the remaining ending.
    Derived(&'d SuffixInfo, String),
}

fn tail_splits<'d>(dict: &'d Dictionary, tail: &str) -> Vec<TailSplit<'d>> {
    let mut out = Vec::new();
    let plain = if tail.is_empty() { ZERO_ENDING.to_string() } else { tail.to_string() };
    out.push(TailSplit::Plain(plain));
    for suffix in &dict.suffixes {
        if let Some(rest) = tail.strip_prefix(suffix.suffix.as_str()) {
            let ending = if rest.is_empty() { ZERO_ENDING.to_string() } else { rest.to_string() };
            out.push(TailSplit::Derived(suffix, ending));
        }
    }
    out
}

/// Stems matching `text`, alone or as a compound; returns the marked-up
/// root, the record governing inflection (the final component) and the
/// number of components.
fn stem_candidates(
    dict: &Dictionary,
    text: &str,
    flags: &Flags,
    depth: usize,
) -> Vec<(String, StemRecord, usize)> {
    let mut out: Vec<(String, StemRecord, usize)> = Vec::new();
    for record in dict.lookup_stem(text) {
        let root = record.root_for(text).to_string();
        out.push((root, record, 1));
    }
    if !flags.split_compounds || depth >= MAX_COMPOUND_PARTS {
        return out;
    }
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(o, _)| o)
        .filter(|&o| o >= 2 && text.len() - o >= 2)
        .collect();
    for split in boundaries {
        let lead = &text[..split];
        let rest = &text[split..];
        for lead_rec in dict.lookup_stem(lead) {
            if !lead_rec.can_lead_compound() {
                continue;
            }
            let marker = dict.junction_marker(lead_rec.junction).to_string();
            let lead_root = lead_rec.root_for(lead).to_string();
            for (sub_root, final_rec, parts) in stem_candidates(dict, rest, flags, depth + 1) {
                if !final_rec.can_tail_compound() {
                    continue;
                }
                out.push((format!("{lead_root}{marker}{sub_root}"), final_rec, parts + 1));
            }
        }
    }
    out
}

/// Assemble the output root: prefix, compound root, optional stress mark.
fn decorate_root(
    dict: &Dictionary,
    prefix: &str,
    root: &str,
    record: &StemRecord,
    flags: &Flags,
) -> String {
    let mut out = String::with_capacity(prefix.len() + root.len() + 2);
    out.push_str(prefix);
    if flags.stem_phonetic_markup && record.stress != 0 {
        // The mark sits before the last vowel of the final component.
        let final_start = root.rfind('=').map(|i| i + 1).unwrap_or(0);
        let mark = dict
            .stress_marks
            .get(record.stress as usize - 1)
            .map(String::as_str)
            .unwrap_or("");
        let tail = &root[final_start..];
        if let Some((vowel_off, _)) = tail
            .char_indices()
            .filter(|(_, c)| chars::is_vowel(*c))
            .next_back()
        {
            out.push_str(&root[..final_start + vowel_off]);
            out.push_str(mark);
            out.push_str(&root[final_start + vowel_off..]);
            return out;
        }
    }
    out.push_str(root);
    out
}

/// Final ordering, dedup and per-flag trimming shared by all entry paths.
fn finish(set: &mut AnalysisSet, flags: &Flags) {
    set.sort_unique();
    if flags.first_only && set.analyses.len() > 1 {
        set.analyses.truncate(1);
    }
    if flags.add_lemmas || flags.lemma_only {
        set.fill_lemmas();
    }
}

// ---------------------------------------------------------------------------
// Multi-word expressions
// ---------------------------------------------------------------------------

/// Try to merge `words[0..n]` (n = 2 or 3) into one dictionary expression.
///
/// Returns the merged set with its `span_count`; verb expressions stored
/// particle-first match the swapped surface order and set `reversed`.
pub fn try_mwe(dict: &Dictionary, words: &[&str], flags: &Flags) -> Option<AnalysisSet> {
    if !flags.merge_mwe || words.len() < 2 {
        return None;
    }
    for n in (2..=words.len().min(3)).rev() {
        let surface = words[..n].join(" ");
        let direct: Vec<String> = words[..n].iter().map(|w| chars::lowercase(w)).collect();
        if let Some(set) = mwe_lookup(dict, &direct, &surface, false, flags) {
            return Some(set);
        }
        if n == 2 {
            let swapped = vec![direct[1].clone(), direct[0].clone()];
            if let Some(mut set) = mwe_lookup(dict, &swapped, &surface, true, flags) {
                // Only verb expressions may match in swapped order.
                set.analyses.retain(|a| a.pos == "V");
                if set.has_result() {
                    return Some(set);
                }
            }
        }
    }
    None
}

fn mwe_lookup(
    dict: &Dictionary,
    parts: &[String],
    surface: &str,
    reversed: bool,
    flags: &Flags,
) -> Option<AnalysisSet> {
    let (key, ending_surface, clitic) = find_mwe_key(dict, parts)?;
    let records = dict.lookup_stem(&key);
    if records.is_empty() {
        return None;
    }
    let ending = if ending_surface.is_empty() {
        ZERO_ENDING.to_string()
    } else {
        ending_surface
    };
    let body = key.replace('_', " ");
    let mut set = AnalysisSet::empty(surface);
    for record in records {
        if !dict.group_has_ending(record.ending_group, &ending) {
            continue;
        }
        for form in dict.forms_for(record.ending_group, &ending) {
            let normalized = record.root_for(&key).replace('_', " ");
            let root = mwe_root(surface, if record.root.is_some() { &normalized } else { &body }, record.pos);
            set.push_unique(Analysis::new(
                root,
                ending.clone(),
                clitic.clone(),
                record.pos.to_string(),
                form,
            ));
        }
    }
    if !set.has_result() {
        return None;
    }
    set.reversed = reversed;
    set.provenance = Provenance::MainDict;
    finish(&mut set, flags);
    set.span_count = parts.len();
    Some(set)
}

/// Find the expression key for the joined parts, peeling a clitic and an
/// inflectional ending off the final part.
fn find_mwe_key(dict: &Dictionary, parts: &[String]) -> Option<(String, String, String)> {
    let last = parts.last()?;
    let head = &parts[..parts.len() - 1];
    let mut variants: Vec<(String, String)> = vec![(last.clone(), String::new())];
    if let Some((base, clitic)) = split_clitic(last) {
        variants.push((base.to_string(), clitic.to_string()));
    }
    for (base, clitic) in variants {
        let mut cuts: Vec<usize> = base
            .char_indices()
            .map(|(o, _)| o)
            .filter(|&o| o > 0)
            .collect();
        cuts.push(base.len());
        for cut in cuts.into_iter().rev() {
            let stem_part = &base[..cut];
            let mut key = head.join("_");
            key.push('_');
            key.push_str(stem_part);
            if dict.is_mwe_key(&key) {
                return Some((key, base[cut..].to_string(), clitic));
            }
        }
    }
    None
}

/// Root of a merged expression: the stored stem with spaces, capitalized
/// per part for proper names.
fn mwe_root(surface: &str, body: &str, pos: char) -> String {
    if pos == 'H' && chars::starts_upper(surface) {
        body.split(' ')
            .map(chars::capitalize_first)
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        body.to_string()
    }
}
