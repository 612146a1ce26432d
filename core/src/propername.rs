//! Proper-name pass over an analyzed sentence.
//!
//! Runs between morphological analysis and disambiguation. First marks
//! the words standing in a position that behaves like a sentence start
//! (the capitalization there proves nothing); then adds proper-name
//! (`H`) analyses to capitalized words that lack one, either by re-typing
//! an existing nominal reading or by guessing against an `X`-prefixed
//! copy of the word.

use crate::analysis::Analysis;
use crate::chars;
use crate::dictionary::Dictionary;
use crate::flags::{Flags, STEMLEN};
use crate::guesser;
use crate::tags;
use crate::token::Lyli;

/// Nominal classes whose readings may be re-typed as proper names.
const RETYPABLE: &str = "SACU";

/// Declinable classes; capitalization of other readings is only trusted
/// away from sentence starts.
const DECLINABLE: &str = "SACUHPNO";

/// Classes that make a proper-name reading unlikely.
const UNLIKELY: &str = "PYN";

/// Run both passes over one sentence chain.
pub fn add_proper_names(chain: &mut [Lyli], dict: &Dictionary, flags: &Flags) {
    if !flags.propername_inject {
        return;
    }
    mark_sentence_starts(chain);
    for i in 0..chain.len() {
        if chain[i].is_analysis() {
            inject(chain, i, dict, flags);
        }
    }
}

/// Flag words whose position explains a capital letter.
pub fn mark_sentence_starts(chain: &mut [Lyli]) {
    let word_idx: Vec<usize> = chain
        .iter()
        .enumerate()
        .filter(|(_, l)| l.is_analysis())
        .map(|(i, _)| i)
        .collect();

    for (w, &idx) in word_idx.iter().enumerate() {
        let word = match chain[idx].analysis() {
            Some(set) => set.word.clone(),
            None => continue,
        };
        if !chars::starts_upper(&word) {
            continue;
        }
        let initial = if w == 0 {
            true
        } else {
            let prev = chain[word_idx[w - 1]].analysis();
            match prev.and_then(|s| s.analyses.first()) {
                Some(first) if first.pos == "Z" => {
                    sentence_start_after_punct(chain, &word_idx[..w], &first.root)
                }
                _ => false,
            }
        };
        if initial {
            if let Some(set) = chain[idx].analysis_mut() {
                set.sentence_initial = true;
            }
        }
    }
}

/// Decide whether punctuation before a word opens a sentence-like
/// position.
fn sentence_start_after_punct(chain: &[Lyli], preceding: &[usize], punct: &str) -> bool {
    match punct {
        "," | ";" => false,
        "." | ")" => {
            // A period after a possible abbreviation does not end a
            // sentence.
            if punct == "." && preceding.len() >= 2 {
                let before = chain[preceding[preceding.len() - 2]].analysis();
                if before.is_some_and(|s| s.analyses.iter().any(|a| a.pos == "Y")) {
                    return false;
                }
            }
            // A list item: nothing but numbers and brackets so far.
            let listy = preceding[..preceding.len() - 1].iter().all(|&i| {
                chain[i]
                    .analysis()
                    .map(|s| chars::all_in(&s.word, "1234567890.()"))
                    .unwrap_or(false)
            });
            !listy || preceding.len() == 1
        }
        _ => true,
    }
}

fn inject(chain: &mut [Lyli], idx: usize, dict: &Dictionary, flags: &Flags) {
    let (word, sentence_initial, eligible) = {
        let Some(set) = chain[idx].analysis() else { return };
        let eligible = set.provenance == crate::analysis::Provenance::MainDict
            && set.word.chars().count() < STEMLEN
            && chars::starts_upper(&set.word)
            && set.has_result();
        (set.word.clone(), set.sentence_initial, eligible)
    };
    if !eligible {
        return;
    }

    // Hyphenated words only qualify when the part after the hyphen is
    // itself capitalized (Vana-Kuuse, not Dudajevi-meelne).
    let hyphen = word.rfind(['-', '/']).filter(|&i| i + 1 < word.len());
    let (head, tail) = match hyphen {
        Some(i) => {
            let tail = &word[i + 1..];
            if !chars::starts_upper(tail) {
                return;
            }
            (&word[..i + 1], tail)
        }
        None => ("", word.as_str()),
    };

    let Some(set) = chain[idx].analysis_mut() else { return };
    if hyphen.is_none() && set.analyses.iter().any(|a| a.pos == "H") {
        return;
    }
    // Participles and consonant-only stems never become names.
    for a in &set.analyses {
        if a.ending == "nud" || a.ending == "tud" {
            return;
        }
        if a.root.ends_with("=nud") || a.root.ends_with("=tud") || a.root.ends_with("=dud") {
            return;
        }
        if chars::all_in(&chars::lowercase(&a.plain_root()), chars::CONSONANTS) {
            return;
        }
    }

    let mut added: Vec<Analysis> = Vec::new();
    let all_caps = word
        .chars()
        .all(|c| chars::is_upper(c) || c.is_ascii_digit() || matches!(c, '-' | '/'));

    let mut want_guess = false;
    for a in &set.analyses {
        let pos = a.pos.chars().next().unwrap_or('X');
        if !DECLINABLE.contains(pos) && (sentence_initial || all_caps) {
            continue;
        }
        if UNLIKELY.contains(pos) {
            continue;
        }
        if RETYPABLE.contains(pos) {
            let mut clone = a.clone();
            clone.root = chars::capitalize_first(&clone.root);
            clone.pos = "H".to_string();
            clone.tag = None;
            added.push(clone);
        }
        want_guess = true;
    }

    if want_guess {
        // Guess against an X-prefixed copy so the table sees a plain
        // word shape, then strip the X back off.
        let probe = format!("X{tail}");
        let guessed = guesser::guess(dict, &probe, flags);
        for mut g in guessed.analyses {
            let root = chars::lowercase(&g.root);
            let Some(stripped) = root.strip_prefix('x') else { continue };
            if stripped.contains('=') {
                continue;
            }
            g.root = format!("{head}{}", chars::capitalize_first(stripped));
            g.pos = "H".to_string();
            g.tag = None;
            added.push(g);
        }
    }

    if added.is_empty() {
        return;
    }
    for a in added {
        set.push_unique(a);
    }
    if flags.tag_with_dtag {
        tags::attach_tags(set);
    }
    if flags.add_lemmas || flags.lemma_only {
        set.fill_lemmas();
    }
    set.sort_unique();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisSet, Provenance};
    use crate::dictionary::DictionaryBuilder;

    fn dict() -> Dictionary {
        Dictionary::from_bytes(&DictionaryBuilder::new().to_bytes()).unwrap()
    }

    fn analyzed(word: &str, candidates: &[(&str, &str, &str, &str)]) -> Lyli {
        let mut set = AnalysisSet::empty(word);
        for (root, ending, pos, form) in candidates {
            set.analyses.push(Analysis::new(*root, *ending, "", *pos, *form));
        }
        set.provenance = Provenance::MainDict;
        Lyli::Analysis(set)
    }

    #[test]
    fn first_word_is_marked_sentence_initial() {
        let mut chain = vec![
            analyzed("Mets", &[("mets", "0", "S", "sg n,")]),
            analyzed("kasvab", &[("kasva", "b", "V", "b,")]),
        ];
        mark_sentence_starts(&mut chain);
        assert!(chain[0].analysis().unwrap().sentence_initial);
        assert!(!chain[1].analysis().unwrap().sentence_initial);
    }

    #[test]
    fn capital_after_comma_is_not_sentence_initial() {
        let mut chain = vec![
            analyzed("tere", &[("tere", "0", "I", "")]),
            analyzed(",", &[(",", "0", "Z", "")]),
            analyzed("Mets", &[("mets", "0", "S", "sg n,")]),
        ];
        mark_sentence_starts(&mut chain);
        assert!(!chain[2].analysis().unwrap().sentence_initial);
    }

    #[test]
    fn capital_after_plain_period_is_sentence_initial() {
        let mut chain = vec![
            analyzed("tuli", &[("tule", "i", "V", "s,")]),
            analyzed(".", &[(".", "0", "Z", "")]),
            analyzed("Mets", &[("mets", "0", "S", "sg n,")]),
        ];
        mark_sentence_starts(&mut chain);
        assert!(chain[2].analysis().unwrap().sentence_initial);
    }

    #[test]
    fn capital_after_abbreviation_period_is_not_initial() {
        let mut chain = vec![
            analyzed("jne", &[("jne", "0", "Y", "?,")]),
            analyzed(".", &[(".", "0", "Z", "")]),
            analyzed("Mets", &[("mets", "0", "S", "sg n,")]),
        ];
        mark_sentence_starts(&mut chain);
        assert!(!chain[2].analysis().unwrap().sentence_initial);
    }

    #[test]
    fn nominal_reading_is_retyped_as_proper_name() {
        let d = dict();
        let flags = Flags { propername_inject: true, ..Flags::default() };
        let mut chain = vec![
            analyzed("tema", &[("tema", "0", "P", "sg n,")]),
            analyzed("Metsale", &[("mets", "le", "S", "sg all,")]),
        ];
        add_proper_names(&mut chain, &d, &flags);
        let set = chain[1].analysis().unwrap();
        assert!(
            set.analyses.iter().any(|a| a.pos == "H" && a.root == "Mets"),
            "{:?}",
            set.analyses
        );
        // The original nominal reading survives alongside.
        assert!(set.analyses.iter().any(|a| a.pos == "S" && a.root == "mets"));
    }

    #[test]
    fn existing_h_reading_blocks_injection() {
        let d = dict();
        let flags = Flags { propername_inject: true, ..Flags::default() };
        let mut chain = vec![analyzed(
            "Tartu",
            &[("tartu", "0", "H", "sg n,"), ("tartu", "0", "S", "sg n,")],
        )];
        let before = chain[0].analysis().unwrap().analyses.len();
        add_proper_names(&mut chain, &d, &flags);
        assert_eq!(chain[0].analysis().unwrap().analyses.len(), before);
    }

    #[test]
    fn lowercase_word_is_left_alone() {
        let d = dict();
        let flags = Flags { propername_inject: true, ..Flags::default() };
        let mut chain = vec![analyzed("mets", &[("mets", "0", "S", "sg n,")])];
        add_proper_names(&mut chain, &d, &flags);
        assert!(chain[0].analysis().unwrap().analyses.iter().all(|a| a.pos != "H"));
    }

    #[test]
    fn participle_never_becomes_a_name() {
        let d = dict();
        let flags = Flags { propername_inject: true, ..Flags::default() };
        let mut chain = vec![analyzed("Lugenud", &[("luge", "nud", "V", "nud,")])];
        add_proper_names(&mut chain, &d, &flags);
        assert!(chain[0].analysis().unwrap().analyses.iter().all(|a| a.pos != "H"));
    }
}
