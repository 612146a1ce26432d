//! Spell checking and correction suggestions.
//!
//! A word is correctly spelled when the user dictionary, the main
//! dictionary or one of the non-word token classes recognizes it; the
//! guesser is never consulted here. Suggestions are single-edit variants
//! over the Estonian alphabet plus casing fixes, filtered through the
//! same recognition and ranked by edit class.

use crate::analyzer;
use crate::chars;
use crate::dictionary::Dictionary;
use crate::flags::Flags;
use crate::userdict::UserDict;

/// Alphabet used for replacements and insertions.
const ALPHABET: &str = "abcdefghijklmnopqrsšzžtuvwõäöüxy";

/// Recognition check; `user` analyses win over the main dictionary.
pub fn spell(dict: &Dictionary, user: Option<&UserDict>, word: &str, flags: &Flags) -> bool {
    if word.is_empty() {
        return false;
    }
    if let Some(ud) = user {
        if ud.lookup(word).is_some() {
            return true;
        }
    }
    let check_flags = Flags { guess: false, ..flags.clone() };
    analyzer::analyze(dict, word, &check_flags).has_result()
}

/// Correction suggestions, best first, at most `limit`.
pub fn suggest(
    dict: &Dictionary,
    user: Option<&UserDict>,
    word: &str,
    limit: usize,
    flags: &Flags,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    if limit == 0 || word.is_empty() {
        return out;
    }
    let mut push = |candidate: String, out: &mut Vec<String>| {
        if candidate != word
            && !out.contains(&candidate)
            && spell(dict, user, &candidate, flags)
        {
            out.push(candidate);
        }
    };

    // Casing fixes come first: they are the most common slip.
    push(chars::lowercase(word), &mut out);
    push(chars::capitalize_first(&chars::lowercase(word)), &mut out);

    let cs: Vec<char> = word.chars().collect();

    // Deletions.
    for i in 0..cs.len() {
        let mut v: Vec<char> = cs.clone();
        v.remove(i);
        push(v.into_iter().collect(), &mut out);
    }
    // Transpositions.
    for i in 0..cs.len().saturating_sub(1) {
        let mut v = cs.clone();
        v.swap(i, i + 1);
        push(v.into_iter().collect(), &mut out);
    }
    // Replacements.
    for i in 0..cs.len() {
        for c in ALPHABET.chars() {
            if cs[i] == c {
                continue;
            }
            let mut v = cs.clone();
            v[i] = c;
            push(v.into_iter().collect(), &mut out);
        }
    }
    // Insertions.
    for i in 0..=cs.len() {
        for c in ALPHABET.chars() {
            let mut v = cs.clone();
            v.insert(i, c);
            push(v.into_iter().collect(), &mut out);
        }
    }

    out.truncate(limit);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::{DictionaryBuilder, StemRecord};

    fn build() -> Dictionary {
        let mut b = DictionaryBuilder::new();
        let g = b.group(&[("0", "sg n,"), ("le", "sg all,")]);
        for stem in ["kass", "kask", "maja"] {
            b.stem(
                stem,
                StemRecord {
                    pos: 'S',
                    ending_group: g,
                    stem_class: 1,
                    junction: 0,
                    stress: 0,
                    paradigm: 0,
                    compound_flags: 0,
                    root: None,
                },
            );
        }
        Dictionary::from_bytes(&b.to_bytes()).unwrap()
    }

    #[test]
    fn known_word_spells_ok_unknown_does_not() {
        let dict = build();
        let flags = Flags::default();
        assert!(spell(&dict, None, "kass", &flags));
        assert!(spell(&dict, None, "majale", &flags));
        assert!(!spell(&dict, None, "kxss", &flags));
    }

    #[test]
    fn guesser_is_never_consulted() {
        let dict = build();
        // Guessable shape, but spelling must still fail.
        let flags = Flags { guess: true, ..Flags::default() };
        assert!(!spell(&dict, None, "krokodillile", &flags));
    }

    #[test]
    fn suggestions_contain_the_single_edit_fix() {
        let dict = build();
        let flags = Flags::default();
        let s = suggest(&dict, None, "kxss", 5, &flags);
        assert!(s.contains(&"kass".to_string()), "{s:?}");
    }

    #[test]
    fn casing_fix_ranks_first() {
        let dict = build();
        let flags = Flags::default();
        let s = suggest(&dict, None, "KASS", 5, &flags);
        assert_eq!(s.first().map(String::as_str), Some("kass"));
    }

    #[test]
    fn user_dictionary_words_spell_ok() {
        let dict = build();
        let ud = UserDict::from_text("sahkerdis\n    sahkerdis+0 //_S_ sg n, //\n");
        let flags = Flags::default();
        assert!(spell(&dict, Some(&ud), "sahkerdis", &flags));
        assert!(!spell(&dict, None, "sahkerdis", &flags));
    }

    #[test]
    fn limit_is_respected() {
        let dict = build();
        let flags = Flags::default();
        let s = suggest(&dict, None, "kasss", 1, &flags);
        assert!(s.len() <= 1);
    }
}
