//! Syllabifier properties over a word list: totality, the monosyllable
//! rule, and concatenation (syllables reassemble the processed word).

use etmorf_core::chars;
use etmorf_core::syllable::{syllabify, split_syllables};

const WORDS: &[&str] = &[
    "maa", "tee", "öö", "maja", "kala", "kassa", "linna", "lauldes", "laulu", "leiba",
    "raudtee", "kodus", "peeti", "krokodill", "ämblik", "õpetaja", "ülikool", "šokolaad",
    "žanr", "vanaema", "kuulsus", "aaria", "euroopa", "spioon", "muuseum", "idealist",
    "monstrum", "tallinn", "tartu", "pärnu", "viljandi",
];

#[test]
fn every_word_yields_at_least_one_syllable() {
    for word in WORDS {
        let syls = syllabify(word);
        assert!(!syls.is_empty(), "{word} yielded no syllables");
        for s in &syls {
            assert!((1..=3).contains(&s.quantity), "{word}: bad quantity {}", s.quantity);
        }
    }
}

#[test]
fn single_syllable_is_always_overlong_and_stressed() {
    for word in WORDS {
        let syls = syllabify(word);
        if syls.len() == 1 {
            assert_eq!(syls[0].quantity, 3, "{word}");
            assert!(syls[0].stress, "{word}");
        }
    }
}

#[test]
fn syllables_reassemble_the_word() {
    for word in WORDS {
        let joined: String = split_syllables(word).concat();
        assert_eq!(joined, chars::lowercase_keep_initial(word), "{word}");
    }
}

#[test]
fn exactly_one_primary_stress_per_word() {
    for word in WORDS {
        let syls = syllabify(word);
        let stressed = syls.iter().filter(|s| s.stress).count();
        assert!(stressed >= 1, "{word} has no stress");
    }
}

#[test]
fn each_syllable_has_a_nucleus_or_is_the_whole_word() {
    for word in WORDS {
        let syls = syllabify(word);
        if syls.len() == 1 {
            continue;
        }
        for s in &syls {
            assert!(
                s.text.chars().any(|c| chars::is_vowel(c) || c == 'y'),
                "{word}: syllable {} lacks a vowel",
                s.text
            );
        }
    }
}
